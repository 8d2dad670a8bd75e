use glam::{Mat4, Vec2, Vec3};

/// Perspective camera looking at `target`.
#[derive(Debug, Clone)]
pub struct Camera {
    pub fov_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

/// A world point after projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projected {
    /// Normalized device coordinates, both axes in [-1, 1] when on screen.
    pub ndc: Vec2,
    /// Distance along the view axis.
    pub depth: f32,
}

impl Camera {
    pub fn new(fov_degrees: f32, distance: f32) -> Self {
        Self {
            fov_degrees,
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
            position: Vec3::new(0.0, 0.0, distance),
            target: Vec3::ZERO,
        }
    }

    pub fn set_viewport(&mut self, width: usize, height: usize) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_degrees.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }

    /// Returns `None` for points behind the near plane.
    pub fn project(&self, point: Vec3) -> Option<Projected> {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w <= self.near {
            return None;
        }
        Some(Projected {
            ndc: Vec2::new(clip.x / clip.w, clip.y / clip.w),
            depth: clip.w,
        })
    }

    /// Screen pixels covered by one world unit at `depth`.
    pub fn pixels_per_unit(&self, depth: f32, viewport_height: usize) -> f32 {
        let half_fov = (self.fov_degrees.to_radians() * 0.5).tan();
        viewport_height as f32 * 0.5 / (half_fov * depth.max(self.near))
    }

    /// Casts a ray through `ndc` and returns where it crosses the z = 0 plane.
    pub fn unproject_to_plane(&self, ndc: Vec2) -> Vec3 {
        let inverse = self.view_projection().inverse();
        let point = inverse.project_point3(Vec3::new(ndc.x, ndc.y, 0.5));
        let dir = (point - self.position).normalize_or_zero();
        if dir.z.abs() < f32::EPSILON {
            return Vec3::new(point.x, point.y, 0.0);
        }

        let distance = -self.position.z / dir.z;
        let hit = self.position + dir * distance;
        Vec3::new(hit.x, hit.y, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewport_sets_aspect() {
        let mut camera = Camera::new(75.0, 30.0);
        camera.set_viewport(400, 300);
        assert!((camera.aspect - 400.0 / 300.0).abs() < 1e-6);

        camera.set_viewport(0, 300);
        assert!((camera.aspect - 400.0 / 300.0).abs() < 1e-6);
    }

    #[test]
    fn target_projects_to_center() {
        let camera = Camera::new(60.0, 30.0);
        let projected = camera.project(Vec3::ZERO).unwrap();
        assert!(projected.ndc.length() < 1e-5);
        assert!((projected.depth - 30.0).abs() < 1e-3);
    }

    #[test]
    fn points_behind_camera_are_culled() {
        let camera = Camera::new(60.0, 30.0);
        assert!(camera.project(Vec3::new(0.0, 0.0, 40.0)).is_none());
    }

    #[test]
    fn unproject_inverts_project_on_the_plane() {
        let mut camera = Camera::new(75.0, 30.0);
        camera.set_viewport(160, 90);
        let world = Vec3::new(4.0, -2.5, 0.0);
        let ndc = camera.project(world).unwrap().ndc;
        let back = camera.unproject_to_plane(ndc);
        assert!((back - world).length() < 1e-3, "got {back:?}");
    }

    #[test]
    fn pixels_per_unit_shrinks_with_depth() {
        let camera = Camera::new(60.0, 30.0);
        assert!(camera.pixels_per_unit(10.0, 100) > camera.pixels_per_unit(40.0, 100));
    }
}
