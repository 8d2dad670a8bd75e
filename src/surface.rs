use crate::camera::Camera;
use crate::palette::Rgb;
use glam::{EulerRot, Quat, Vec2, Vec3};
use std::io::Write;

/// Opaque handle to a sprite owned by a [`Surface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteId(usize);

#[derive(Debug, Clone)]
pub enum Shape {
    /// Soft radial blob. Radius is in world units before `scale`.
    Glow { radius: f32 },
    /// Line strips in local XY space, rotated and scaled about the sprite origin.
    Outline { paths: Vec<Path> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub points: Vec<Vec2>,
    pub closed: bool,
}

impl Path {
    pub fn closed(points: Vec<Vec2>) -> Self {
        Self { points, closed: true }
    }

    pub fn open(points: Vec<Vec2>) -> Self {
        Self { points, closed: false }
    }
}

#[derive(Debug, Clone)]
pub struct Sprite {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: f32,
    pub opacity: f32,
    pub color: Rgb,
    pub shape: Shape,
}

impl Sprite {
    pub fn glow(position: Vec3, radius: f32, color: Rgb, opacity: f32) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            scale: 1.0,
            opacity,
            color,
            shape: Shape::Glow { radius },
        }
    }

    pub fn outline(position: Vec3, paths: Vec<Path>, color: Rgb, opacity: f32) -> Self {
        Self {
            position,
            rotation: Vec3::ZERO,
            scale: 1.0,
            opacity,
            color,
            shape: Shape::Outline { paths },
        }
    }
}

/// Pixel grid plus the sprites composited onto it every frame.
///
/// Height is in half-block pixels, so a terminal with `rows` rows has a
/// surface `rows * 2` pixels tall.
pub struct Surface {
    width: usize,
    height: usize,
    pub camera: Camera,
    background: Rgb,
    sprites: Vec<Option<Sprite>>,
    free: Vec<usize>,
    live: usize,
    frame: Vec<(f32, f32, f32)>,
    output_buf: Vec<u8>,
}

impl Surface {
    pub fn new(width: usize, height: usize, mut camera: Camera, background: Rgb) -> Self {
        camera.set_viewport(width, height);
        Self {
            width,
            height,
            camera,
            background,
            sprites: Vec::new(),
            free: Vec::new(),
            live: 0,
            frame: vec![Self::bg_f32(background); width * height],
            output_buf: Vec::with_capacity(width * height * 25),
        }
    }

    fn bg_f32(bg: Rgb) -> (f32, f32, f32) {
        (bg.0 as f32, bg.1 as f32, bg.2 as f32)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Resizes the pixel grid and keeps the camera aspect in step with it.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.camera.set_viewport(width, height);
        self.frame = vec![Self::bg_f32(self.background); width * height];
        self.output_buf = Vec::with_capacity(width * height * 25);
    }

    pub fn insert(&mut self, sprite: Sprite) -> SpriteId {
        self.live += 1;
        match self.free.pop() {
            Some(slot) => {
                self.sprites[slot] = Some(sprite);
                SpriteId(slot)
            }
            None => {
                self.sprites.push(Some(sprite));
                SpriteId(self.sprites.len() - 1)
            }
        }
    }

    pub fn remove(&mut self, id: SpriteId) -> Option<Sprite> {
        let removed = self.sprites.get_mut(id.0)?.take()?;
        self.free.push(id.0);
        self.live -= 1;
        Some(removed)
    }

    pub fn get(&self, id: SpriteId) -> Option<&Sprite> {
        self.sprites.get(id.0)?.as_ref()
    }

    pub fn get_mut(&mut self, id: SpriteId) -> Option<&mut Sprite> {
        self.sprites.get_mut(id.0)?.as_mut()
    }

    /// Drops every sprite. Handles issued before the call are dead.
    pub fn clear_sprites(&mut self) {
        self.sprites.clear();
        self.free.clear();
        self.live = 0;
    }

    #[cfg(test)]
    pub fn contains(&self, id: SpriteId) -> bool {
        self.get(id).is_some()
    }

    /// Number of live sprites.
    pub fn len(&self) -> usize {
        self.live
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Projects a world point to pixel coordinates plus pixels-per-unit at its depth.
    pub fn to_pixel(&self, point: Vec3) -> Option<(Vec2, f32)> {
        let projected = self.camera.project(point)?;
        let px = (projected.ndc.x + 1.0) * 0.5 * self.width as f32;
        let py = (1.0 - projected.ndc.y) * 0.5 * self.height as f32;
        let ppu = self.camera.pixels_per_unit(projected.depth, self.height);
        Some((Vec2::new(px, py), ppu))
    }

    /// Pixel coordinates to normalized device coordinates.
    pub fn to_ndc(&self, px: f32, py: f32) -> Vec2 {
        if self.width == 0 || self.height == 0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            (px / self.width as f32) * 2.0 - 1.0,
            -(py / self.height as f32) * 2.0 + 1.0,
        )
    }

    pub fn clear(&mut self) {
        let bg = Self::bg_f32(self.background);
        self.frame.fill(bg);
    }

    /// Additive blend of `color` at `intensity` into one pixel.
    pub fn plot(&mut self, x: isize, y: isize, color: Rgb, intensity: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = y as usize * self.width + x as usize;
        let px = &mut self.frame[idx];
        px.0 = (px.0 + color.0 as f32 * intensity).min(255.0);
        px.1 = (px.1 + color.1 as f32 * intensity).min(255.0);
        px.2 = (px.2 + color.2 as f32 * intensity).min(255.0);
    }

    /// Additive blend of a color given as 0..1 channels.
    pub fn blend(&mut self, x: usize, y: usize, color: (f32, f32, f32), alpha: f32) {
        if x >= self.width || y >= self.height || alpha <= 0.0 {
            return;
        }
        let idx = y * self.width + x;
        let px = &mut self.frame[idx];
        px.0 = (px.0 + color.0 * 255.0 * alpha).clamp(0.0, 255.0);
        px.1 = (px.1 + color.1 * 255.0 * alpha).clamp(0.0, 255.0);
        px.2 = (px.2 + color.2 * 255.0 * alpha).clamp(0.0, 255.0);
    }

    #[cfg(test)]
    pub fn pixel(&self, x: usize, y: usize) -> Option<(f32, f32, f32)> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.frame[y * self.width + x])
    }

    pub fn add_glow(&mut self, x: f32, y: f32, radius: f32, intensity: f32, color: Rgb) {
        if radius < 1.0 {
            self.plot(x.round() as isize, y.round() as isize, color, intensity);
            return;
        }

        let x_min = (x - radius).floor().max(0.0) as isize;
        let x_max = (x + radius).ceil().min(self.width as f32 - 1.0) as isize;
        let y_min = (y - radius).floor().max(0.0) as isize;
        let y_max = (y + radius).ceil().min(self.height as f32 - 1.0) as isize;

        for py in y_min..=y_max {
            for px in x_min..=x_max {
                let dx = px as f32 - x;
                let dy = py as f32 - y;
                let dist = (dx * dx + dy * dy).sqrt();

                if dist < radius {
                    let falloff = (1.0 - (dist / radius)).powf(2.0);
                    let contribution = intensity * falloff;
                    if contribution > 0.02 {
                        self.plot(px, py, color, contribution);
                    }
                }
            }
        }
    }

    pub fn draw_line(&mut self, from: Vec2, to: Vec2, color: Rgb, intensity: f32) {
        let delta = to - from;
        let steps = delta.x.abs().max(delta.y.abs()).ceil().max(1.0) as usize;
        // Lines far outside the viewport are not worth walking.
        if steps > (self.width + self.height) * 4 {
            return;
        }
        for i in 0..=steps {
            let p = from + delta * (i as f32 / steps as f32);
            self.plot(p.x.round() as isize, p.y.round() as isize, color, intensity);
        }
    }

    /// Draws every live sprite into the pixel grid.
    pub fn composite(&mut self) {
        let sprites = std::mem::take(&mut self.sprites);
        for sprite in sprites.iter().flatten() {
            if sprite.opacity <= 0.0 {
                continue;
            }
            match &sprite.shape {
                Shape::Glow { radius } => {
                    if let Some((pixel, ppu)) = self.to_pixel(sprite.position) {
                        let radius_px = radius * sprite.scale * ppu;
                        self.add_glow(pixel.x, pixel.y, radius_px, sprite.opacity, sprite.color);
                    }
                }
                Shape::Outline { paths } => {
                    let rotation = Quat::from_euler(
                        EulerRot::XYZ,
                        sprite.rotation.x,
                        sprite.rotation.y,
                        sprite.rotation.z,
                    );
                    for path in paths {
                        let projected: Vec<Option<Vec2>> = path
                            .points
                            .iter()
                            .map(|p| {
                                let world = sprite.position + rotation * (p.extend(0.0) * sprite.scale);
                                self.to_pixel(world).map(|(pixel, _)| pixel)
                            })
                            .collect();

                        let count = projected.len();
                        let segments = if path.closed { count } else { count.saturating_sub(1) };
                        for i in 0..segments {
                            if let (Some(a), Some(b)) = (projected[i], projected[(i + 1) % count]) {
                                self.draw_line(a, b, sprite.color, sprite.opacity);
                            }
                        }
                    }
                }
            }
        }
        self.sprites = sprites;
    }

    /// Writes the frame as half-block cells with 24-bit color escapes.
    pub fn present<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        self.output_buf.clear();
        self.output_buf.extend_from_slice(b"\x1b[H");

        let mut prev_top: Rgb = (255, 255, 255);
        let mut prev_bot: Rgb = (255, 255, 255);

        for y in (0..self.height).step_by(2) {
            for x in 0..self.width {
                let top_idx = y * self.width + x;
                let bot_idx = if y + 1 < self.height {
                    (y + 1) * self.width + x
                } else {
                    top_idx
                };

                let top = Self::to_rgb(self.frame[top_idx]);
                let bot = Self::to_rgb(self.frame[bot_idx]);

                // Only emit color codes if changed
                if top != prev_top {
                    write!(self.output_buf, "\x1b[48;2;{};{};{}m", top.0, top.1, top.2)?;
                    prev_top = top;
                }
                if bot != prev_bot {
                    write!(self.output_buf, "\x1b[38;2;{};{};{}m", bot.0, bot.1, bot.2)?;
                    prev_bot = bot;
                }
                self.output_buf.extend_from_slice("▄".as_bytes());
            }
            self.output_buf.extend_from_slice(b"\x1b[0m");
            prev_top = (255, 255, 255);
            prev_bot = (255, 255, 255);
            if y + 2 < self.height {
                self.output_buf.extend_from_slice(b"\r\n");
            }
        }

        out.write_all(&self.output_buf)?;
        out.flush()
    }

    fn to_rgb(px: (f32, f32, f32)) -> Rgb {
        (
            px.0.round().clamp(0.0, 255.0) as u8,
            px.1.round().clamp(0.0, 255.0) as u8,
            px.2.round().clamp(0.0, 255.0) as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> Surface {
        Surface::new(40, 20, Camera::new(60.0, 30.0), (0, 0, 0))
    }

    #[test]
    fn insert_and_remove_track_live_count() {
        let mut s = surface();
        let a = s.insert(Sprite::glow(Vec3::ZERO, 1.0, (255, 0, 0), 1.0));
        let b = s.insert(Sprite::glow(Vec3::ZERO, 1.0, (0, 255, 0), 1.0));
        assert_eq!(s.len(), 2);

        assert!(s.remove(a).is_some());
        assert!(!s.contains(a));
        assert!(s.contains(b));
        assert_eq!(s.len(), 1);

        // Removing twice is a no-op.
        assert!(s.remove(a).is_none());
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn freed_slots_are_reused() {
        let mut s = surface();
        let a = s.insert(Sprite::glow(Vec3::ZERO, 1.0, (255, 0, 0), 1.0));
        s.remove(a);
        let b = s.insert(Sprite::glow(Vec3::ZERO, 1.0, (0, 0, 255), 1.0));
        assert_eq!(a, b);
        assert_eq!(s.get(b).unwrap().color, (0, 0, 255));
    }

    #[test]
    fn clear_sprites_empties_the_store() {
        let mut s = surface();
        let a = s.insert(Sprite::glow(Vec3::ZERO, 1.0, (255, 0, 0), 1.0));
        let b = s.insert(Sprite::glow(Vec3::ZERO, 1.0, (0, 255, 0), 1.0));
        s.remove(b);
        s.clear_sprites();
        assert!(s.is_empty());
        assert!(!s.contains(a));

        s.composite();
        assert_eq!(s.pixel(20, 10), Some((0.0, 0.0, 0.0)));

        let c = s.insert(Sprite::glow(Vec3::ZERO, 1.0, (0, 0, 255), 1.0));
        assert_eq!(s.len(), 1);
        assert!(s.contains(c));
    }

    #[test]
    fn resize_keeps_aspect_in_step() {
        let mut s = surface();
        s.resize(400, 300);
        assert_eq!((s.width(), s.height()), (400, 300));
        assert!((s.camera.aspect - 400.0 / 300.0).abs() < 1e-6);
    }

    #[test]
    fn glow_at_origin_lights_the_center() {
        let mut s = surface();
        s.insert(Sprite::glow(Vec3::ZERO, 2.0, (200, 0, 0), 1.0));
        s.composite();
        let center = s.pixel(20, 10).unwrap();
        assert!(center.0 > 100.0);
        assert_eq!(s.pixel(0, 0).unwrap(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn outline_draws_pixels() {
        let mut s = surface();
        let path = Path::open(vec![Vec2::new(-5.0, 0.0), Vec2::new(5.0, 0.0)]);
        s.insert(Sprite::outline(Vec3::ZERO, vec![path], (0, 200, 0), 1.0));
        s.composite();
        let lit = (0..40).filter(|&x| s.pixel(x, 10).unwrap().1 > 0.0).count();
        assert!(lit > 3);
    }

    #[test]
    fn present_emits_one_row_per_cell_pair() {
        let mut s = Surface::new(4, 4, Camera::new(60.0, 30.0), (10, 20, 30));
        let mut out = Vec::new();
        s.present(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("\x1b[H"));
        assert_eq!(text.matches("▄").count(), 8);
        assert_eq!(text.matches("\r\n").count(), 1);
        assert!(text.contains("48;2;10;20;30"));
    }

    #[test]
    fn ndc_maps_corners() {
        let s = surface();
        assert_eq!(s.to_ndc(0.0, 0.0), Vec2::new(-1.0, 1.0));
        assert_eq!(s.to_ndc(40.0, 20.0), Vec2::new(1.0, -1.0));
    }
}
