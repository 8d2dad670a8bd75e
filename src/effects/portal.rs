use super::{Effect, Pointer};
use crate::camera::Camera;
use crate::config::Tuning;
use crate::palette::SHADOW_PAIR;
use crate::particles::{Emitter, EmitterRanges, Frame, Pulse, Region, Smoothed, Swarm};
use crate::shader::{self, Color, Footprint};
use crate::surface::{Shape, Surface};
use glam::{Vec2, Vec3};
use noise::{NoiseFn, Perlin};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

const RING_RADIUS: f32 = 10.0;
const VOID_RADIUS: f32 = 8.0;
const GLOW_RADIUS: f32 = 15.0;
const FIELD_RADIUS: f32 = 20.0;
const TILT: f32 = 0.2;
const SPARKLE: f32 = 0.75;

const VIOLET_LIGHT: Color = (0.6, 0.0, 1.0);
const CYAN_LIGHT: Color = (0.0, 0.7, 1.0);

/// A swirling void framed by a glowing ring, wrapped in a rippling field and
/// circled by wisps. The whole portal leans toward the pointer.
pub struct PortalEffect {
    swarm: Swarm,
    perlin: Perlin,
    mouse: Smoothed,
}

impl PortalEffect {
    #[cfg(test)]
    pub fn wisps(&self) -> &[crate::particles::Ambient] {
        &self.swarm.ambient
    }

    /// Current ring rotation about X and Y.
    pub fn tilt(&self) -> Vec2 {
        Vec2::new(self.mouse.current.y, self.mouse.current.x) * TILT
    }

    fn wisp_ranges() -> EmitterRanges {
        let mut ranges = EmitterRanges::motes(Region::Ring {
            radius: (0.0, RING_RADIUS),
            depth: 2.5,
        });
        ranges.palette = SHADOW_PAIR.to_vec();
        ranges.shapes = vec![Shape::Glow { radius: 0.5 }];
        ranges.size = (1.0, 3.0);
        ranges.speed = (0.6, 1.8);
        ranges.pulse_speed = (0.01, 0.04);
        ranges.scale_pulse = Pulse::new(0.8, 0.2, 2.0);
        ranges.opacity_pulse = Pulse::new(0.3, 0.2, 1.0);
        ranges.opacity_floor = 0.1;
        ranges.spin = Vec3::new(0.0, 0.0, 0.6);
        ranges
    }

    fn noise(&self, p: Vec2, t: f32) -> f32 {
        let v = self.perlin.get([p.x as f64, p.y as f64, t as f64]) as f32;
        (0.5 + 0.5 * v).clamp(0.0, 1.0)
    }

    fn paint_field(&self, t: f32, surface: &mut Surface) {
        let Some(footprint) = Footprint::project(surface, Vec3::new(0.0, 0.0, -0.3), FIELD_RADIUS, self.tilt()) else {
            return;
        };
        footprint.paint(surface, |uv| {
            // The field disc maps its full radius to uv distance 0.5.
            let dist = (uv - Vec2::splat(0.5)).length() * 2.0;
            if dist > 1.0 {
                return None;
            }
            let distortion = self.noise(uv * 5.0, t * 0.2);
            let ripple = ((dist * 40.0 - t * 2.0).sin() * 0.5 + 0.5)
                * shader::smoothstep(0.5, 0.8, dist)
                * (1.0 - shader::smoothstep(0.8, 1.0, dist));
            let alpha = shader::smoothstep(0.4, 0.5, dist)
                * (1.0 - shader::smoothstep(0.8, 1.0, dist))
                * 0.15
                * (distortion * 0.5 + ripple * 0.5);
            Some((shader::mix(VIOLET_LIGHT, CYAN_LIGHT, distortion), alpha))
        });
    }

    fn paint_glow(&self, t: f32, surface: &mut Surface) {
        let Some(footprint) = Footprint::project(surface, Vec3::new(0.0, 0.0, -0.2), GLOW_RADIUS, self.tilt()) else {
            return;
        };
        let pulse = 0.7 + 0.3 * t.sin();
        footprint.paint(surface, |uv| {
            let dist = (uv - Vec2::splat(0.5)).length();
            if dist > 0.5 {
                return None;
            }
            let alpha = shader::smoothstep(0.0, 1.0, 1.0 - dist).powi(3) * 0.15 * pulse;
            let color = shader::mix(VIOLET_LIGHT, CYAN_LIGHT, (dist * 10.0 + t * 0.5).sin() * 0.5 + 0.5);
            Some((color, alpha))
        });
    }

    fn paint_void(&self, t: f32, surface: &mut Surface) {
        let Some(footprint) = Footprint::project(surface, Vec3::new(0.0, 0.0, -0.1), VOID_RADIUS, self.tilt()) else {
            return;
        };
        footprint.paint(surface, |uv| {
            let d = uv - Vec2::splat(0.5);
            let dist = d.length();
            if dist > 0.5 {
                return None;
            }
            let angle = d.y.atan2(d.x);
            let swirl = (angle * 5.0 + t).sin() * 0.1;
            let sparkle_noise = self.noise(uv * 10.0, t * 0.2);
            let dark_noise = self.noise(uv * 5.0, -t * 0.1);

            let edge = shader::smoothstep(0.35, 0.5, dist);
            let purple = shader::scale((0.6, 0.0, 0.8), sparkle_noise * 0.4 + 0.2);
            let blue = shader::scale((0.0, 0.4, 0.8), dark_noise * 0.4 + 0.2);
            let dark = shader::scale((0.05, 0.02, 0.1), 1.0 - edge);

            let mut color = shader::mix(shader::mix(dark, purple, swirl + 0.5), blue, edge);
            if sparkle_noise > SPARKLE && dist < 0.3 {
                let boost = (sparkle_noise - SPARKLE) * 4.0;
                color = (color.0 + 0.8 * boost, color.1 + 0.8 * boost, color.2 + boost);
            }
            Some((color, 0.9 - edge * 0.5))
        });
    }

    fn paint_ring(&self, t: f32, surface: &mut Surface) {
        let Some(footprint) = Footprint::project(surface, Vec3::ZERO, RING_RADIUS, self.tilt()) else {
            return;
        };
        let (c1, c2) = (shader::unit(SHADOW_PAIR[0]), shader::unit(SHADOW_PAIR[1]));
        let inner = VOID_RADIUS / RING_RADIUS * 0.5;
        footprint.paint(surface, |uv| {
            let d = uv - Vec2::splat(0.5);
            let dist = d.length();
            if !(inner..=0.5).contains(&dist) {
                return None;
            }
            let around = (d.y.atan2(d.x) + PI) / TAU;
            let flow = (around + t * 0.1).fract();
            let edge = shader::smoothstep(0.45, 0.5, dist) * (1.0 - shader::smoothstep(0.5, 0.55, dist));
            let shimmer = 0.5 + 0.5 * (t * 2.0 + around * 20.0).sin();
            Some((shader::mix(c1, c2, flow), edge * shimmer * 0.8))
        });
    }
}

impl Effect for PortalEffect {
    fn camera() -> Camera {
        Camera::new(60.0, 30.0)
    }

    fn new(surface: &mut Surface, mut rng: fastrand::Rng, tuning: &Tuning) -> Self {
        let mut swarm = Swarm::new(Emitter::new(Self::wisp_ranges(), tuning.count), 0);
        swarm.populate(surface, &mut rng);

        // Each wisp circles its start point counter-clockwise at a fifth of its
        // distance from the centre, starting at its own spawn angle.
        for wisp in &mut swarm.ambient {
            let start = wisp.base.truncate();
            let reach = start.length() * 0.2;
            wisp.amplitude = Vec3::new(reach, -reach, 0.0);
            wisp.phase = start.y.atan2(start.x) + FRAC_PI_2;
        }

        Self {
            swarm,
            perlin: Perlin::new(rng.u32(..)),
            mouse: Smoothed::default(),
        }
    }

    fn update(&mut self, frame: Frame, pointer: &Pointer, surface: &mut Surface) {
        self.mouse.target = pointer.ndc;
        self.mouse.step(0.05);
        self.swarm.tick(surface, frame);
    }

    fn paint(&self, elapsed: f32, surface: &mut Surface) {
        self.paint_field(elapsed, surface);
        self.paint_glow(elapsed, surface);
        self.paint_void(elapsed, surface);
        self.paint_ring(elapsed, surface);
    }
}
