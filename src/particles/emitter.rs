use super::lifecycle::{Ambient, Pulse};
use super::{between, spread};
use crate::palette::{Rgb, SHADOW_PAIR};
use crate::surface::{Shape, Sprite, Surface};
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

/// Where new primitives are placed.
#[derive(Debug, Clone, Copy)]
pub enum Region {
    /// Axis-aligned box around `center`.
    Box { center: Vec3, half: Vec3 },
    /// Random angle and radius in the XY plane, random depth in `[-depth, depth)`.
    Ring { radius: (f32, f32), depth: f32 },
    /// Uniform over the sphere, radius drawn from the range.
    Shell { radius: (f32, f32) },
}

impl Region {
    #[cfg(test)]
    pub fn cube(half: f32) -> Self {
        Region::Box {
            center: Vec3::ZERO,
            half: Vec3::splat(half),
        }
    }

    pub fn sample(&self, rng: &mut fastrand::Rng) -> Vec3 {
        match *self {
            Region::Box { center, half } => {
                center + Vec3::new(spread(rng, half.x), spread(rng, half.y), spread(rng, half.z))
            }
            Region::Ring { radius, depth } => {
                let angle = rng.f32() * TAU;
                let r = between(rng, radius);
                Vec3::new(angle.cos() * r, angle.sin() * r, spread(rng, depth))
            }
            Region::Shell { radius } => {
                let theta = rng.f32() * TAU;
                let phi = (2.0 * rng.f32() - 1.0).acos();
                let r = between(rng, radius);
                Vec3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.sin() * theta.sin(),
                    r * phi.cos(),
                )
            }
        }
    }
}

/// Parameter ranges every creation draws from independently.
#[derive(Debug, Clone)]
pub struct EmitterRanges {
    pub region: Region,
    pub size: (f32, f32),
    pub speed: (f32, f32),
    pub amplitude: (f32, f32),
    /// Per-axis mask applied to the drawn amplitude.
    pub amplitude_axes: Vec3,
    pub frequency: Vec3,
    pub pulse_speed: (f32, f32),
    pub scale_pulse: Pulse,
    pub opacity_pulse: Pulse,
    pub opacity_floor: f32,
    /// Spin drawn per axis from `[-spin, spin)` radians per second.
    pub spin: Vec3,
    /// Drift drawn per axis from `[-drift, drift)` world units per second.
    pub drift: Option<Vec3>,
    pub wrap: Option<f32>,
    pub palette: Vec<Rgb>,
    pub shapes: Vec<Shape>,
    pub random_orientation: bool,
}

impl EmitterRanges {
    /// Small round glows with gentle float and pulse.
    pub fn motes(region: Region) -> Self {
        Self {
            region,
            size: (0.5, 1.0),
            speed: (0.3, 0.9),
            amplitude: (0.0, 0.6),
            amplitude_axes: Vec3::new(1.0, 1.0, 0.0),
            frequency: Vec3::ONE,
            pulse_speed: (0.5, 1.5),
            scale_pulse: Pulse::new(0.8, 0.2, 1.0),
            opacity_pulse: Pulse::new(0.35, 0.15, 2.0),
            opacity_floor: 0.1,
            spin: Vec3::ZERO,
            drift: None,
            wrap: None,
            palette: SHADOW_PAIR.to_vec(),
            shapes: vec![Shape::Glow { radius: 0.35 }],
            random_orientation: false,
        }
    }
}

/// Creates ambient primitives and enforces the creation budget.
#[derive(Debug, Clone)]
pub struct Emitter {
    pub ranges: EmitterRanges,
    budget: usize,
    created: usize,
}

impl Emitter {
    pub fn new(ranges: EmitterRanges, budget: usize) -> Self {
        Self {
            ranges,
            budget,
            created: 0,
        }
    }

    #[cfg(test)]
    pub fn created(&self) -> usize {
        self.created
    }

    pub fn remaining(&self) -> usize {
        self.budget - self.created
    }

    /// Creates up to `count` primitives, never past the budget.
    pub fn create(&mut self, surface: &mut Surface, rng: &mut fastrand::Rng, count: usize) -> Vec<Ambient> {
        let count = count.min(self.remaining());
        let mut out = Vec::with_capacity(count);
        for _ in 0..count {
            out.push(self.create_one(surface, rng));
        }
        self.created += count;
        out
    }

    /// Creates whatever is left of the budget.
    pub fn fill(&mut self, surface: &mut Surface, rng: &mut fastrand::Rng) -> Vec<Ambient> {
        let remaining = self.remaining();
        self.create(surface, rng, remaining)
    }

    fn create_one(&self, surface: &mut Surface, rng: &mut fastrand::Rng) -> Ambient {
        let r = &self.ranges;
        let base = r.region.sample(rng);
        let size = between(rng, r.size);
        let color = if r.palette.is_empty() {
            (255, 255, 255)
        } else {
            r.palette[rng.usize(0..r.palette.len())]
        };
        let shape = if r.shapes.is_empty() {
            Shape::Glow { radius: 0.35 }
        } else {
            r.shapes[rng.usize(0..r.shapes.len())].clone()
        };
        let initial_rotation = if r.random_orientation {
            Vec3::new(rng.f32() * TAU, rng.f32() * TAU, rng.f32() * TAU)
        } else {
            Vec3::ZERO
        };

        let amplitude = r.amplitude_axes
            * Vec3::new(
                between(rng, r.amplitude),
                between(rng, r.amplitude),
                between(rng, r.amplitude),
            );

        let ambient_opacity = r.opacity_pulse.mid.clamp(r.opacity_floor, 1.0);
        let mut sprite = match shape {
            Shape::Glow { radius } => Sprite::glow(base, radius, color, ambient_opacity),
            Shape::Outline { paths } => Sprite::outline(base, paths, color, ambient_opacity),
        };
        sprite.scale = size;
        sprite.rotation = initial_rotation;
        let handle = surface.insert(sprite);

        Ambient {
            handle,
            base,
            amplitude,
            frequency: r.frequency,
            speed: between(rng, r.speed),
            phase: rng.f32() * PI * 2.0,
            size,
            pulse_speed: between(rng, r.pulse_speed),
            scale_pulse: r.scale_pulse,
            opacity_pulse: r.opacity_pulse,
            opacity_floor: r.opacity_floor,
            spin: Vec3::new(spread(rng, r.spin.x), spread(rng, r.spin.y), spread(rng, r.spin.z)),
            initial_rotation,
            velocity: r
                .drift
                .map(|d| Vec3::new(spread(rng, d.x), spread(rng, d.y), spread(rng, d.z))),
            wrap: r.wrap,
        }
    }
}

/// Regular polygon outline of `sides` vertices, first vertex at 12 o'clock.
pub fn polygon(sides: usize, radius: f32) -> Vec<Vec2> {
    (0..sides)
        .map(|i| {
            let angle = i as f32 / sides as f32 * TAU;
            Vec2::new(angle.sin() * radius, angle.cos() * radius)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::Camera;

    fn surface() -> Surface {
        Surface::new(400, 300, Camera::new(75.0, 30.0), (0, 0, 0))
    }

    #[test]
    fn create_respects_budget() {
        let mut s = surface();
        let mut rng = fastrand::Rng::with_seed(7);
        let mut emitter = Emitter::new(EmitterRanges::motes(Region::cube(5.0)), 20);

        assert_eq!(emitter.create(&mut s, &mut rng, 15).len(), 15);
        assert_eq!(emitter.create(&mut s, &mut rng, 15).len(), 5);
        assert!(emitter.fill(&mut s, &mut rng).is_empty());
        assert_eq!(emitter.created(), 20);
        assert_eq!(s.len(), 20);
    }

    #[test]
    fn draws_stay_inside_ranges() {
        let mut s = surface();
        let mut rng = fastrand::Rng::with_seed(99);
        let mut ranges = EmitterRanges::motes(Region::Box {
            center: Vec3::new(1.0, 2.0, 0.0),
            half: Vec3::new(3.0, 4.0, 5.0),
        });
        ranges.palette = vec![(1, 2, 3), (4, 5, 6)];
        let mut emitter = Emitter::new(ranges, 200);

        for a in emitter.fill(&mut s, &mut rng) {
            assert!((a.base.x - 1.0).abs() <= 3.0);
            assert!((a.base.y - 2.0).abs() <= 4.0);
            assert!(a.base.z.abs() <= 5.0);
            assert!((0.5..1.0).contains(&a.size));
            assert!((0.0..TAU).contains(&a.phase));
            assert_eq!(a.amplitude.z, 0.0);
            let color = s.get(a.handle).unwrap().color;
            assert!(color == (1, 2, 3) || color == (4, 5, 6));
        }
    }

    #[test]
    fn shell_samples_lie_between_radii() {
        let mut rng = fastrand::Rng::with_seed(3);
        let region = Region::Shell { radius: (2.0, 4.0) };
        for _ in 0..500 {
            let len = region.sample(&mut rng).length();
            assert!((2.0 - 1e-4..=4.0 + 1e-4).contains(&len), "radius {len}");
        }
    }

    #[test]
    fn same_seed_same_pool() {
        let mut a = surface();
        let mut b = surface();
        let mut ea = Emitter::new(EmitterRanges::motes(Region::cube(5.0)), 10);
        let mut eb = ea.clone();
        let pa = ea.fill(&mut a, &mut fastrand::Rng::with_seed(11));
        let pb = eb.fill(&mut b, &mut fastrand::Rng::with_seed(11));
        for (x, y) in pa.iter().zip(&pb) {
            assert_eq!(x.base, y.base);
            assert_eq!(x.phase, y.phase);
        }
    }

    #[test]
    fn polygon_has_requested_vertices() {
        let pts = polygon(5, 2.0);
        assert_eq!(pts.len(), 5);
        assert!((pts[0] - Vec2::new(0.0, 2.0)).length() < 1e-6);
    }
}
