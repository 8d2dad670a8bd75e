//! Small per-pixel helpers for the painted layers.

use crate::palette::Rgb;
use crate::surface::Surface;
use glam::{Vec2, Vec3};

pub type Color = (f32, f32, f32);

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge0 == edge1 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn mix(a: Color, b: Color, t: f32) -> Color {
    (
        a.0 + (b.0 - a.0) * t,
        a.1 + (b.1 - a.1) * t,
        a.2 + (b.2 - a.2) * t,
    )
}

pub fn scale(c: Color, k: f32) -> Color {
    (c.0 * k, c.1 * k, c.2 * k)
}

pub fn unit(c: Rgb) -> Color {
    (c.0 as f32 / 255.0, c.1 as f32 / 255.0, c.2 as f32 / 255.0)
}

/// A screen-space disc a painted layer covers.
#[derive(Debug, Clone, Copy)]
pub struct Footprint {
    pub center: Vec2,
    /// Horizontal and vertical radius in pixels.
    pub radius: Vec2,
}

impl Footprint {
    /// Projects a world-space disc of `radius` centred at `center`, squashed by
    /// the cosine of its tilt so it reads as turned toward the viewer.
    pub fn project(surface: &Surface, center: Vec3, radius: f32, tilt: Vec2) -> Option<Self> {
        let (pixel, ppu) = surface.to_pixel(center)?;
        let r = radius * ppu;
        Some(Self {
            center: pixel,
            radius: Vec2::new(r * tilt.y.cos().abs().max(0.2), r * tilt.x.cos().abs().max(0.2)),
        })
    }

    /// Calls `shade` with texture coordinates in [0, 1] for every covered pixel.
    /// `shade` returns a color and alpha to blend in.
    pub fn paint(&self, surface: &mut Surface, mut shade: impl FnMut(Vec2) -> Option<(Color, f32)>) {
        if self.radius.x < 0.5 || self.radius.y < 0.5 {
            return;
        }
        let x_min = (self.center.x - self.radius.x).floor().max(0.0) as usize;
        let y_min = (self.center.y - self.radius.y).floor().max(0.0) as usize;
        let x_max = (self.center.x + self.radius.x).ceil().min(surface.width() as f32 - 1.0);
        let y_max = (self.center.y + self.radius.y).ceil().min(surface.height() as f32 - 1.0);
        if x_max < 0.0 || y_max < 0.0 {
            return;
        }

        for py in y_min..=y_max as usize {
            for px in x_min..=x_max as usize {
                let uv = Vec2::new(
                    0.5 + (px as f32 - self.center.x) / (2.0 * self.radius.x),
                    0.5 - (py as f32 - self.center.y) / (2.0 * self.radius.y),
                );
                if let Some((color, alpha)) = shade(uv) {
                    surface.blend(px, py, color, alpha);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smoothstep_clamps_and_handles_reversed_edges() {
        assert_eq!(smoothstep(0.0, 1.0, -1.0), 0.0);
        assert_eq!(smoothstep(0.0, 1.0, 2.0), 1.0);
        assert_eq!(smoothstep(0.0, 1.0, 0.5), 0.5);
        // Reversed edges fade out instead of in.
        assert_eq!(smoothstep(0.5, 0.0, 0.0), 1.0);
        assert_eq!(smoothstep(0.5, 0.0, 0.5), 0.0);
    }

    #[test]
    fn mix_interpolates_channels() {
        assert_eq!(mix((0.0, 0.0, 0.0), (1.0, 0.5, 0.2), 0.5), (0.5, 0.25, 0.1));
    }
}
