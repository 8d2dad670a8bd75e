use super::{Effect, Pointer};
use crate::camera::Camera;
use crate::config::Tuning;
use crate::palette::{BLUE, Rgb, hex};
use crate::particles::emitter::polygon;
use crate::particles::lifecycle::tick_ambient;
use crate::particles::{Ambient, Emitter, EmitterRanges, Frame, Pulse, Region, Smoothed, between, spread};
use crate::shader::{self, Footprint};
use crate::surface::{Path, Shape, Surface};
use glam::{Vec2, Vec3};
use std::f32::consts::{PI, TAU};

const FOG: Rgb = hex(0x640096);
const SHAPE_GLOW: Rgb = hex(0x9900ff);
const SHAFT_PURPLE: Rgb = hex(0x7c0aff);
const FOG_WRAP: f32 = 60.0;
const SHAPE_COUNT: usize = 15;
const SHAFT_COUNT: usize = 6;
const SHAFT_RADIUS: f32 = 5.0;
const SHAFT_LENGTH: f32 = 40.0;
const CAMERA_DISTANCE: f32 = 50.0;

fn crystal_shard() -> Shape {
    let mut paths = vec![Path::closed(vec![
        Vec2::new(0.0, 2.0),
        Vec2::new(-1.0, -2.0),
        Vec2::new(1.0, -2.0),
    ])];
    let base: Vec<Vec2> = polygon(5, 1.0).into_iter().map(|p| Vec2::new(p.x, -2.0 + p.y * 0.3)).collect();
    paths.push(Path::closed(base));
    Shape::Outline { paths }
}

fn rock() -> Shape {
    let outer = polygon(10, 1.5);
    let inner: Vec<Vec2> = polygon(5, 0.9).into_iter().map(|p| -p).collect();
    let mut paths = vec![Path::closed(outer.clone()), Path::closed(inner.clone())];
    for (i, p) in inner.iter().enumerate() {
        paths.push(Path::open(vec![*p, outer[i * 2 + 1]]));
    }
    Shape::Outline { paths }
}

fn skull() -> Shape {
    let equator: Vec<Vec2> = polygon(16, 1.2).into_iter().map(|p| Vec2::new(p.x, p.y * 0.3)).collect();
    let meridian: Vec<Vec2> = polygon(16, 1.2).into_iter().map(|p| Vec2::new(p.x * 0.3, p.y)).collect();
    Shape::Outline {
        paths: vec![Path::closed(polygon(16, 1.2)), Path::closed(equator), Path::closed(meridian)],
    }
}

/// (2, 3) torus knot seen along its axis.
fn twisted_fragment() -> Shape {
    let (p, q) = (2.0_f32, 3.0_f32);
    let points = (0..96)
        .map(|i| {
            let u = i as f32 / 96.0 * p * TAU;
            let r = (2.0 + (q / p * u).cos()) * 0.5;
            Vec2::new(r * u.cos(), r * u.sin())
        })
        .collect();
    Shape::Outline {
        paths: vec![Path::closed(points)],
    }
}

fn orb() -> Shape {
    let hexagon = polygon(6, 1.0);
    let triangle = polygon(3, 0.6);
    let mut paths = vec![Path::closed(hexagon.clone()), Path::closed(triangle.clone())];
    for (i, t) in triangle.iter().enumerate() {
        paths.push(Path::open(vec![*t, hexagon[i * 2]]));
        paths.push(Path::open(vec![*t, hexagon[(i * 2 + 1) % 6]]));
        paths.push(Path::open(vec![*t, hexagon[(i * 2 + 5) % 6]]));
    }
    Shape::Outline { paths }
}

/// A cone of light pointing at the viewer.
#[derive(Debug, Clone)]
pub struct LightShaft {
    pub position: Vec3,
    pub color: Rgb,
    pulse_speed: f32,
    offset: f32,
}

impl LightShaft {
    fn new(rng: &mut fastrand::Rng) -> Self {
        Self {
            position: Vec3::new(spread(rng, 50.0), -30.0 + rng.f32() * 20.0, spread(rng, 20.0) - 30.0),
            color: if rng.f32() > 0.5 { BLUE } else { SHAFT_PURPLE },
            pulse_speed: between(rng, (0.005, 0.015)),
            offset: rng.f32() * TAU,
        }
    }

    /// Always within `[0.4, 1.0]`.
    pub fn opacity_at(&self, t: f32) -> f32 {
        0.7 + (t * self.pulse_speed + self.offset).sin() * 0.3
    }

    fn paint(&self, t: f32, surface: &mut Surface) {
        let base = self.position - Vec3::new(0.0, 0.0, SHAFT_LENGTH * 0.5);
        let Some(footprint) = Footprint::project(surface, base, SHAFT_RADIUS, Vec2::ZERO) else {
            return;
        };
        let color = shader::unit(self.color);
        let opacity = self.opacity_at(t);
        footprint.paint(surface, |uv| {
            let d = uv - Vec2::splat(0.5);
            let dist = d.length();
            if dist > 0.5 {
                return None;
            }
            // Around the cone and along it, tip at the centre.
            let around = (d.y.atan2(d.x) + PI) / TAU;
            let along = 1.0 - dist * 2.0;
            let mut noise = ((around * 10.0) + (along * 20.0) + t).sin() * 0.5 + 0.5;
            noise *= ((around * 5.0) - (along * 10.0) + t * 0.7).sin() * 0.5 + 0.5;
            let edge = (1.0 - (around - 0.5).abs() * 2.0) * 0.5;
            let alpha = (1.0 - along) * 0.4 * noise * edge * 0.5 * opacity;
            let tinted = shader::mix(color, shader::scale(color, 1.5), noise * 0.3);
            Some((tinted, alpha))
        });
    }
}

/// Drifting fog, slowly tumbling shadow shapes and light shafts, seen
/// through a camera that sways with the pointer.
pub struct RealmEffect {
    fog: Vec<Ambient>,
    shapes: Vec<Ambient>,
    shafts: Vec<LightShaft>,
    mouse: Smoothed,
}

impl RealmEffect {
    #[cfg(test)]
    pub fn fog(&self) -> &[Ambient] {
        &self.fog
    }

    #[cfg(test)]
    pub fn shapes(&self) -> &[Ambient] {
        &self.shapes
    }

    #[cfg(test)]
    pub fn shafts(&self) -> &[LightShaft] {
        &self.shafts
    }

    fn fog_ranges() -> EmitterRanges {
        let mut ranges = EmitterRanges::motes(Region::Box {
            center: Vec3::new(0.0, 0.0, -10.0),
            half: Vec3::new(50.0, 50.0, 25.0),
        });
        ranges.palette = vec![FOG];
        ranges.shapes = vec![Shape::Glow { radius: 6.0 }];
        ranges.size = (0.5, 2.5);
        ranges.amplitude = (0.0, 0.0);
        ranges.pulse_speed = (0.005, 0.015);
        ranges.scale_pulse = Pulse::new(0.8, 0.2, 1.0);
        ranges.opacity_pulse = Pulse::new(0.12, 0.0, 0.0);
        ranges.opacity_floor = 0.0;
        ranges.drift = Some(Vec3::new(1.5, 1.5, 0.6));
        ranges.wrap = Some(FOG_WRAP);
        ranges
    }

    fn shape_ranges() -> EmitterRanges {
        let mut ranges = EmitterRanges::motes(Region::Box {
            center: Vec3::new(0.0, 0.0, -20.0),
            half: Vec3::new(40.0, 40.0, 20.0),
        });
        ranges.palette = vec![SHAPE_GLOW];
        ranges.shapes = vec![crystal_shard(), rock(), skull(), twisted_fragment(), orb()];
        ranges.size = (1.0, 4.0);
        ranges.speed = (1.0, 1.0);
        ranges.amplitude = (1.0, 1.0);
        ranges.amplitude_axes = Vec3::new(2.0, 2.0, 1.0);
        ranges.frequency = Vec3::new(0.5, 0.3, 0.7);
        ranges.pulse_speed = (1.0, 1.0);
        ranges.scale_pulse = Pulse::new(1.0, 0.0, 0.0);
        ranges.opacity_pulse = Pulse::new(0.6, 0.3, 0.5);
        ranges.opacity_floor = 0.3;
        ranges.spin = Vec3::splat(0.3);
        ranges.random_orientation = true;
        ranges
    }
}

impl Effect for RealmEffect {
    fn camera() -> Camera {
        Camera::new(60.0, CAMERA_DISTANCE)
    }

    fn new(surface: &mut Surface, mut rng: fastrand::Rng, tuning: &Tuning) -> Self {
        let fog = Emitter::new(Self::fog_ranges(), tuning.count).fill(surface, &mut rng);
        let shapes = Emitter::new(Self::shape_ranges(), SHAPE_COUNT).fill(surface, &mut rng);
        let shafts = (0..SHAFT_COUNT).map(|_| LightShaft::new(&mut rng)).collect();
        tracing::debug!(fog = fog.len(), shapes = shapes.len(), shafts = SHAFT_COUNT, "realm created");

        Self {
            fog,
            shapes,
            shafts,
            mouse: Smoothed::default(),
        }
    }

    fn update(&mut self, frame: Frame, pointer: &Pointer, surface: &mut Surface) {
        self.mouse.target = pointer.ndc;
        let m = self.mouse.step(0.05);
        surface.camera.position = Vec3::new(m.x * 10.0, m.y * 5.0, CAMERA_DISTANCE);
        surface.camera.target = Vec3::ZERO;

        tick_ambient(&mut self.fog, surface, frame);
        tick_ambient(&mut self.shapes, surface, frame);
    }

    fn paint(&self, elapsed: f32, surface: &mut Surface) {
        for shaft in &self.shafts {
            shaft.paint(elapsed, surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::motion::FIXED_DT;

    fn setup() -> (Surface, RealmEffect) {
        let mut surface = Surface::new(200, 120, RealmEffect::camera(), (0, 0, 0));
        let effect = RealmEffect::new(&mut surface, fastrand::Rng::with_seed(13), &Tuning::defaults_for("realm"));
        (surface, effect)
    }

    fn run(effect: &mut RealmEffect, surface: &mut Surface, pointer: &Pointer, ticks: usize) {
        for i in 1..=ticks {
            let frame = Frame {
                elapsed: i as f32 * FIXED_DT,
                dt: FIXED_DT,
            };
            effect.update(frame, pointer, surface);
        }
    }

    #[test]
    fn creates_every_layer() {
        let (surface, effect) = setup();
        assert_eq!(effect.fog().len(), 100);
        assert_eq!(effect.shapes().len(), SHAPE_COUNT);
        assert_eq!(effect.shafts().len(), SHAFT_COUNT);
        assert_eq!(surface.len(), 100 + SHAPE_COUNT);
    }

    #[test]
    fn fog_wraps_inside_the_visible_square() {
        let (mut surface, mut effect) = setup();
        run(&mut effect, &mut surface, &Pointer::default(), 60 * 60);
        for puff in effect.fog() {
            assert!(puff.base.x.abs() <= FOG_WRAP + 0.1);
            assert!(puff.base.y.abs() <= FOG_WRAP + 0.1);
        }
    }

    #[test]
    fn fog_drifts_slowly() {
        let (_, effect) = setup();
        for puff in effect.fog() {
            let velocity = puff.velocity.unwrap();
            assert!(velocity.x.abs() <= 1.5 && velocity.y.abs() <= 1.5);
            assert!(velocity.z.abs() <= 0.6);
        }
    }

    #[test]
    fn shapes_float_on_their_own_axes() {
        let (mut surface, mut effect) = setup();
        run(&mut effect, &mut surface, &Pointer::default(), 90);
        let t = 90.0 * FIXED_DT;
        for shape in effect.shapes() {
            let at = surface.get(shape.handle).unwrap().position;
            let expected = shape.base
                + Vec3::new(
                    (t * 0.5 + shape.phase).sin() * 2.0,
                    (t * 0.3 + shape.phase).cos() * 2.0,
                    (t * 0.7 + shape.phase).sin(),
                );
            assert!((at - expected).length() < 1e-3);
        }
    }

    #[test]
    fn camera_sways_with_the_pointer() {
        let (mut surface, mut effect) = setup();
        let pointer = Pointer {
            ndc: Vec2::new(1.0, -1.0),
            ..Default::default()
        };
        run(&mut effect, &mut surface, &pointer, 400);
        let position = surface.camera.position;
        assert!((position.x - 10.0).abs() < 0.01);
        assert!((position.y + 5.0).abs() < 0.01);
        assert_eq!(position.z, CAMERA_DISTANCE);
    }

    #[test]
    fn shaft_opacity_pulses_in_range() {
        let (_, effect) = setup();
        for shaft in effect.shafts() {
            for i in 0..1000 {
                let o = shaft.opacity_at(i as f32 * 0.37);
                assert!((0.4 - 1e-6..=1.0 + 1e-6).contains(&o));
            }
        }
    }

    #[test]
    fn knot_outline_is_closed() {
        let Shape::Outline { paths } = twisted_fragment() else {
            panic!("knot is an outline");
        };
        assert!(paths[0].closed);
        assert_eq!(paths[0].points.len(), 96);
    }
}
