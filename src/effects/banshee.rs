use super::{Effect, Pointer};
use crate::camera::Camera;
use crate::config::Tuning;
use crate::palette::{AZURE, BLUE, MAGENTA, PURPLE, VIOLET};
use crate::particles::lifecycle::DecaySpec;
use crate::particles::{Emitter, EmitterRanges, Frame, Pulse, Region, Swarm, between, spread};
use crate::shader::{self, Footprint};
use crate::surface::{Shape, Surface};
use glam::{Vec2, Vec3};

const MOTE_COLORS: [(u8, u8, u8); 5] = [PURPLE, BLUE, VIOLET, AZURE, MAGENTA];
const WISP_CAPACITY: usize = 64;
// How far (world units) the focus travels toward the pointer at the screen edge.
const FOCUS_REACH: f32 = 6.0;

/// Ghostly motes around a central focus that follows the pointer; pointer
/// movement sheds short-lived wisps.
pub struct BansheeEffect {
    rng: fastrand::Rng,
    swarm: Swarm,
    spawn_threshold: f32,
    focus_position: Vec2,
    focus_scale: f32,
}

impl BansheeEffect {
    #[cfg(test)]
    pub fn motes(&self) -> &[crate::particles::Ambient] {
        &self.swarm.ambient
    }

    #[cfg(test)]
    pub fn wisps(&self) -> &[crate::particles::lifecycle::Decaying] {
        &self.swarm.decaying
    }

    #[cfg(test)]
    pub fn focus(&self) -> (Vec2, f32) {
        (self.focus_position, self.focus_scale)
    }

    fn mote_ranges(surface: &Surface) -> EmitterRanges {
        let mut ranges = EmitterRanges::motes(Region::Box {
            center: Vec3::ZERO,
            half: Vec3::new(
                (surface.width() as f32 * 0.025).max(8.0),
                (surface.height() as f32 * 0.025).max(6.0),
                5.0,
            ),
        });
        ranges.palette = MOTE_COLORS.to_vec();
        ranges.shapes = vec![Shape::Glow { radius: 0.6 }];
        ranges.size = (0.5, 1.0);
        ranges.speed = (0.6, 1.8);
        ranges.amplitude = (0.0, 1.2);
        ranges.pulse_speed = (0.3, 0.9);
        ranges.scale_pulse = Pulse::new(0.8, 0.2, 1.0);
        ranges.opacity_pulse = Pulse::new(0.35, 0.15, 2.0);
        ranges.opacity_floor = 0.1;
        ranges.spin = Vec3::new(0.0, 0.0, 0.6);
        ranges
    }

    /// Spawns one wisp where the pointer ray meets the focal plane.
    pub fn spawn_wisp(&mut self, ndc: Vec2, surface: &mut Surface) -> bool {
        let position = surface.camera.unproject_to_plane(ndc);
        let color = if self.rng.f32() > 0.5 { PURPLE } else { BLUE };
        let spec = DecaySpec {
            radius: 0.5,
            size: 1.0,
            decay: between(&mut self.rng, (0.01, 0.03)),
            velocity: Vec3::new(spread(&mut self.rng, 0.05), spread(&mut self.rng, 0.05) + 0.05, 0.0),
            peak_opacity: 0.7,
        };
        let spawned = self.swarm.spawn(surface, position, color, spec).is_some();
        if spawned {
            tracing::debug!(x = position.x, y = position.y, live = self.swarm.decaying.len(), "wisp spawned");
        }
        spawned
    }
}

impl Effect for BansheeEffect {
    fn camera() -> Camera {
        Camera::new(75.0, 30.0)
    }

    fn new(surface: &mut Surface, mut rng: fastrand::Rng, tuning: &Tuning) -> Self {
        let emitter = Emitter::new(Self::mote_ranges(surface), tuning.count);
        let mut swarm = Swarm::new(emitter, WISP_CAPACITY);
        swarm.populate(surface, &mut rng);

        Self {
            rng,
            swarm,
            spawn_threshold: tuning.spawn_threshold,
            focus_position: Vec2::ZERO,
            focus_scale: 1.0,
        }
    }

    fn update(&mut self, frame: Frame, pointer: &Pointer, surface: &mut Surface) {
        self.swarm.tick(surface, frame);

        let target = pointer.ndc * FOCUS_REACH;
        self.focus_position += (target - self.focus_position) * 0.02;

        // Swell while the focus is still catching up with the pointer.
        let lag = (target - self.focus_position).length();
        let target_scale = 1.0 + lag * 0.5;
        self.focus_scale += (target_scale - self.focus_scale) * 0.05;
    }

    fn paint(&self, elapsed: f32, surface: &mut Surface) {
        let center = self.focus_position.extend(0.0);
        let Some(footprint) = Footprint::project(surface, center, 2.0 * self.focus_scale, Vec2::ZERO) else {
            return;
        };
        let c1 = shader::unit(PURPLE);
        let c2 = shader::unit(BLUE);
        let pulse = 0.7 + 0.3 * (elapsed * 2.0).sin();

        footprint.paint(surface, |uv| {
            let dist = (uv - Vec2::splat(0.5)).length();
            if dist > 0.5 {
                return None;
            }
            let alpha = shader::smoothstep(0.5, 0.0, dist) * pulse * shader::smoothstep(0.5, 0.45, dist);
            let color = shader::mix(c1, c2, (elapsed + dist * 10.0).sin() * 0.5 + 0.5);
            Some((color, alpha))
        });
    }

    fn pointer_moved(&mut self, pointer: &Pointer, draw: f32, surface: &mut Surface) {
        if draw > self.spawn_threshold {
            self.spawn_wisp(pointer.ndc, surface);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::motion::FIXED_DT;

    fn setup(count: usize) -> (Surface, BansheeEffect) {
        let mut surface = Surface::new(400, 300, BansheeEffect::camera(), (0, 0, 0));
        let tuning = Tuning { count, spawn_threshold: 0.7 };
        let effect = BansheeEffect::new(&mut surface, fastrand::Rng::with_seed(5), &tuning);
        (surface, effect)
    }

    #[test]
    fn creates_exactly_the_budget() {
        let (surface, effect) = setup(100);
        assert_eq!(effect.motes().len(), 100);
        assert!(effect.wisps().is_empty());
        assert_eq!(surface.len(), 100);
    }

    #[test]
    fn threshold_gates_wisps() {
        let (mut surface, mut effect) = setup(10);
        let pointer = Pointer::default();
        effect.pointer_moved(&pointer, 0.7, &mut surface);
        assert!(effect.wisps().is_empty());
        effect.pointer_moved(&pointer, 0.71, &mut surface);
        assert_eq!(effect.wisps().len(), 1);
    }

    #[test]
    fn wisp_lands_under_the_pointer() {
        let (mut surface, mut effect) = setup(0);
        let ndc = Vec2::new(0.5, -0.25);
        assert!(effect.spawn_wisp(ndc, &mut surface));
        let handle = effect.wisps()[0].handle;
        let position = surface.get(handle).unwrap().position;
        let projected = surface.camera.project(position).unwrap().ndc;
        assert!((projected - ndc).length() < 1e-3);
    }

    #[test]
    fn wisps_are_capped() {
        let (mut surface, mut effect) = setup(0);
        for _ in 0..WISP_CAPACITY + 10 {
            effect.spawn_wisp(Vec2::ZERO, &mut surface);
        }
        assert_eq!(effect.wisps().len(), WISP_CAPACITY);
    }

    #[test]
    fn focus_eases_toward_pointer() {
        let (mut surface, mut effect) = setup(0);
        let pointer = Pointer {
            ndc: Vec2::new(1.0, 0.0),
            ..Default::default()
        };
        for i in 0..600 {
            let frame = Frame { elapsed: i as f32 * FIXED_DT, dt: FIXED_DT };
            effect.update(frame, &pointer, &mut surface);
        }
        let (position, scale) = effect.focus();
        assert!((position.x - FOCUS_REACH).abs() < 0.1);
        assert!((scale - 1.0).abs() < 0.1);
    }

    #[test]
    fn focus_is_painted_at_center() {
        let (mut surface, effect) = setup(0);
        effect.paint(0.3, &mut surface);
        let center = surface.pixel(200, 150).unwrap();
        assert!(center.0 + center.2 > 0.0);
        assert_eq!(surface.pixel(0, 0).unwrap(), (0.0, 0.0, 0.0));
    }
}
