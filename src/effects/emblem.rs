use super::{Effect, Pointer};
use crate::camera::Camera;
use crate::config::Tuning;
use crate::palette::{GOLD, Rgb, hex};
use crate::particles::lifecycle::tick_ambient;
use crate::particles::{Ambient, Emitter, EmitterRanges, Frame, Pulse, Region, between};
use crate::shader::{self, Color, Footprint};
use crate::site::{ClassInfo, ClassSelector};
use crate::surface::{Shape, Surface};
use crossterm::event::{Event, KeyCode, KeyEvent};
use glam::{EulerRot, Quat, Vec2, Vec3};

const HERO_CENTER: Vec3 = Vec3::new(-5.0, 0.0, 0.0);
const EMBLEM_CENTER: Vec3 = Vec3::new(5.0, 0.0, 0.0);
const HERO_RADIUS: f32 = 2.0;
const DISC_RADIUS: f32 = 1.5;
const RING_RADIUS: f32 = 1.7;
const PLATE_HALF: f32 = 0.5;
const HERO_CLOUD: Rgb = hex(0x69ccf0);

const DEEP_BLUE: Color = (0.1, 0.2, 0.7);
const ORCHID: Color = (0.7, 0.2, 0.8);
const BRIGHT_GOLD: Color = (1.0, 0.8, 0.1);

/// A shell of points around `center` that turns about Y and shimmers up and down.
struct ShellCloud {
    center: Vec3,
    spin: f32,
    points: Vec<Ambient>,
    /// Per-point brightness in `[0.5, 1)` for each channel.
    tints: Vec<Vec3>,
}

impl ShellCloud {
    fn new(
        surface: &mut Surface,
        rng: &mut fastrand::Rng,
        center: Vec3,
        count: usize,
        spin: f32,
        shimmer: f32,
        color: Rgb,
    ) -> Self {
        let mut ranges = EmitterRanges::motes(Region::Shell { radius: (2.0, 4.0) });
        ranges.shapes = vec![Shape::Glow { radius: 0.05 }];
        ranges.palette = vec![color];
        ranges.size = (1.0, 1.0);
        ranges.speed = (1.0, 1.0);
        ranges.amplitude = (shimmer, shimmer);
        ranges.amplitude_axes = Vec3::Y;
        ranges.scale_pulse = Pulse::new(1.0, 0.0, 0.0);
        ranges.opacity_pulse = Pulse::new(0.7, 0.0, 0.0);
        ranges.opacity_floor = 0.0;
        let points = Emitter::new(ranges, count).fill(surface, rng);
        let tints = points
            .iter()
            .map(|_| Vec3::new(between(rng, (0.5, 1.0)), between(rng, (0.5, 1.0)), between(rng, (0.5, 1.0))))
            .collect();

        let mut cloud = Self {
            center,
            spin,
            points,
            tints,
        };
        cloud.tint(surface, color);
        cloud
    }

    fn tint(&mut self, surface: &mut Surface, color: Rgb) {
        for (point, tint) in self.points.iter().zip(&self.tints) {
            if let Some(sprite) = surface.get_mut(point.handle) {
                sprite.color = (
                    (color.0 as f32 * tint.x) as u8,
                    (color.1 as f32 * tint.y) as u8,
                    (color.2 as f32 * tint.z) as u8,
                );
            }
        }
    }

    fn update(&mut self, surface: &mut Surface, frame: Frame) {
        tick_ambient(&mut self.points, surface, frame);
        let turn = Quat::from_rotation_y(frame.elapsed * self.spin);
        for point in &self.points {
            if let Some(sprite) = surface.get_mut(point.handle) {
                sprite.position = self.center + turn * point.position_at(frame.elapsed);
            }
        }
    }
}

/// The hero orb with its particle halo beside the emblem of the selected
/// class. Left and right arrows step through the classes. `Tuning::count`
/// sizes each of the two clouds.
pub struct EmblemEffect {
    selector: ClassSelector,
    hero_cloud: ShellCloud,
    class_cloud: ShellCloud,
}

impl EmblemEffect {
    pub fn class(&self) -> &'static ClassInfo {
        self.selector.active()
    }

    /// Activates a class by id; unknown ids change nothing.
    #[cfg(test)]
    pub fn select(&mut self, id: &str, surface: &mut Surface) -> bool {
        let Some(class) = self.selector.select(id) else {
            return false;
        };
        self.class_cloud.tint(surface, class.rgb());
        true
    }

    fn step_class(&mut self, forward: bool, surface: &mut Surface) {
        let class = if forward { self.selector.next() } else { self.selector.prev() };
        tracing::debug!(class = class.id, "emblem class changed");
        self.class_cloud.tint(surface, class.rgb());
    }

    /// Emblem turn about Y and vertical bob at time `t`.
    pub fn emblem_pose(t: f32) -> (f32, f32) {
        ((t * 0.5).sin() * 0.3, t.sin() * 0.1)
    }

    fn paint_hero(&self, t: f32, surface: &mut Surface) {
        let Some(footprint) = Footprint::project(surface, HERO_CENTER, HERO_RADIUS, Vec2::ZERO) else {
            return;
        };
        let spin = Quat::from_euler(EulerRot::XYZ, 0.0, t * 0.3, t * 0.1).inverse();
        footprint.paint(surface, |uv| {
            let p = (uv - Vec2::splat(0.5)) * 2.0 * HERO_RADIUS;
            let depth2 = HERO_RADIUS * HERO_RADIUS - p.length_squared();
            if depth2 < 0.0 {
                return None;
            }
            // Surface point facing the camera, back in the sphere's own frame.
            let local = spin * Vec3::new(p.x, p.y, depth2.sqrt());
            let r = local.truncate().length();
            let theta = local.y.atan2(local.x);
            let pattern = (10.0 * theta + t * 2.0).sin() * 0.5 + 0.5;
            let color = shader::mix(
                shader::mix(DEEP_BLUE, ORCHID, pattern),
                BRIGHT_GOLD,
                (r * 3.0 + t).sin() * 0.5 + 0.5,
            );
            let alpha = 0.7 + 0.3 * (r * 5.0 - t * 3.0).sin();
            Some((color, alpha))
        });
    }

    fn paint_emblem(&self, t: f32, surface: &mut Surface) {
        let (turn, bob) = Self::emblem_pose(t);
        let center = EMBLEM_CENTER + Vec3::new(0.0, bob, 0.0);
        let Some(footprint) = Footprint::project(surface, center, RING_RADIUS, Vec2::new(0.0, turn)) else {
            return;
        };
        let class = shader::unit(self.class().rgb());
        let gold = shader::unit(GOLD);
        footprint.paint(surface, |uv| {
            let p = (uv - Vec2::splat(0.5)) * 2.0 * RING_RADIUS;
            let r = p.length();
            if r > RING_RADIUS {
                None
            } else if r > DISC_RADIUS {
                Some((gold, 1.0))
            } else if p.x.abs() < PLATE_HALF && p.y.abs() < PLATE_HALF {
                Some(((1.0, 1.0, 1.0), 0.7))
            } else {
                Some((class, 0.8))
            }
        });
    }
}

impl Effect for EmblemEffect {
    fn camera() -> Camera {
        Camera::new(75.0, 10.0)
    }

    fn new(surface: &mut Surface, mut rng: fastrand::Rng, tuning: &Tuning) -> Self {
        let selector = ClassSelector::new();
        let hero_cloud = ShellCloud::new(surface, &mut rng, HERO_CENTER, tuning.count, 0.1, 0.6, HERO_CLOUD);
        let class_cloud = ShellCloud::new(
            surface,
            &mut rng,
            EMBLEM_CENTER,
            tuning.count,
            0.2,
            0.3,
            selector.active().rgb(),
        );
        Self {
            selector,
            hero_cloud,
            class_cloud,
        }
    }

    fn update(&mut self, frame: Frame, _pointer: &Pointer, surface: &mut Surface) {
        self.hero_cloud.update(surface, frame);
        self.class_cloud.update(surface, frame);
    }

    fn paint(&self, elapsed: f32, surface: &mut Surface) {
        self.paint_hero(elapsed, surface);
        self.paint_emblem(elapsed, surface);
    }

    fn handle_event(&mut self, event: &Event, surface: &mut Surface) {
        match event {
            Event::Key(KeyEvent { code: KeyCode::Right, .. }) => self.step_class(true, surface),
            Event::Key(KeyEvent { code: KeyCode::Left, .. }) => self.step_class(false, surface),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::motion::FIXED_DT;
    use crossterm::event::KeyModifiers;

    fn setup() -> (Surface, EmblemEffect) {
        let mut surface = Surface::new(240, 120, EmblemEffect::camera(), (0, 0, 0));
        let effect = EmblemEffect::new(&mut surface, fastrand::Rng::with_seed(4), &Tuning::defaults_for("emblem"));
        (surface, effect)
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn two_clouds_of_five_hundred() {
        let (surface, effect) = setup();
        assert_eq!(surface.len(), 1000);
        assert_eq!(effect.class().id, "mage");
        for point in &effect.hero_cloud.points {
            let r = point.base.length();
            assert!((2.0 - 1e-4..=4.0 + 1e-4).contains(&r));
        }
    }

    #[test]
    fn count_sizes_each_cloud() {
        let mut surface = Surface::new(240, 120, EmblemEffect::camera(), (0, 0, 0));
        let tuning = Tuning {
            count: 40,
            spawn_threshold: 1.0,
        };
        let effect = EmblemEffect::new(&mut surface, fastrand::Rng::with_seed(4), &tuning);
        assert_eq!(effect.hero_cloud.points.len(), 40);
        assert_eq!(effect.class_cloud.points.len(), 40);
        assert_eq!(surface.len(), 80);
    }

    #[test]
    fn clouds_stay_on_their_centres() {
        let (mut surface, mut effect) = setup();
        for i in 1..=120 {
            let frame = Frame {
                elapsed: i as f32 * FIXED_DT,
                dt: FIXED_DT,
            };
            effect.update(frame, &Pointer::default(), &mut surface);
        }
        for point in &effect.class_cloud.points {
            let at = surface.get(point.handle).unwrap().position;
            let r = (at - EMBLEM_CENTER).length();
            assert!(r <= 4.0 + 0.3 + 1e-3);
        }
    }

    #[test]
    fn arrows_cycle_classes_and_retint_the_cloud() {
        let (mut surface, mut effect) = setup();
        effect.handle_event(&key(KeyCode::Right), &mut surface);
        assert_eq!(effect.class().id, "warlock");
        effect.handle_event(&key(KeyCode::Left), &mut surface);
        effect.handle_event(&key(KeyCode::Left), &mut surface);
        assert_eq!(effect.class().id, "shaman");

        assert!(effect.select("death-knight", &mut surface));
        assert!(!effect.select("bard", &mut surface));
        let red = effect.class().rgb();
        for (point, tint) in effect.class_cloud.points.iter().zip(&effect.class_cloud.tints) {
            let color = surface.get(point.handle).unwrap().color;
            assert_eq!(color.0, (red.0 as f32 * tint.x) as u8);
            assert!(color.0 >= color.2);
        }
    }

    #[test]
    fn emblem_wobbles_gently() {
        for i in 0..500 {
            let (turn, bob) = EmblemEffect::emblem_pose(i as f32 * 0.05);
            assert!(turn.abs() <= 0.3);
            assert!(bob.abs() <= 0.1);
        }
    }

    #[test]
    fn painting_lights_both_models() {
        let (mut surface, effect) = setup();
        effect.paint(0.5, &mut surface);
        for center in [HERO_CENTER, EMBLEM_CENTER] {
            let (pixel, _) = surface.to_pixel(center).unwrap();
            let lit = surface.pixel(pixel.x as usize, pixel.y as usize).unwrap();
            assert!(lit.0 + lit.1 + lit.2 > 0.0);
        }
    }
}
