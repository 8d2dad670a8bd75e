use super::{Effect, Pointer};
use crate::camera::Camera;
use crate::config::Tuning;
use crate::palette::{BLUE, PURPLE, Rgb, SHADOW_PAIR, hex};
use crate::particles::emitter::polygon;
use crate::particles::lifecycle::DecaySpec;
use crate::particles::motion::Ease;
use crate::particles::{Emitter, EmitterRanges, Frame, Pulse, Region, Smoothed, Swarm, Tween, spread};
use crate::surface::{Path, Shape, Sprite, SpriteId, Surface};
use crossterm::event::{Event, KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use glam::{EulerRot, Quat, Vec2, Vec3};
use std::f32::consts::PI;

const BOW_WOOD: Rgb = hex(0x6600cc);
const BOW_STRING: Rgb = hex(0x9f00ff);
const NOCK: Vec3 = Vec3::new(3.0, 0.0, 0.0);
const FLIGHT_END_X: f32 = 50.0;
const FLIGHT_SECONDS: f32 = 1.5;
const TRAIL_POINTS: usize = 100;
const TRAIL_SECONDS: f32 = 2.0;
const TRAIL_FADE: f32 = 0.95;
const SPARK_CHANCE: f32 = 0.7;
const SPARK_CAPACITY: usize = 128;
const ORBS: [(f32, f32); 4] = [(-3.0, -8.0), (-5.0, -4.0), (-5.0, 4.0), (-3.0, 8.0)];

/// Point `t` of the way along a cubic Bezier.
pub fn bezier(p: [Vec2; 4], t: f32) -> Vec2 {
    let u = 1.0 - t;
    p[0] * u * u * u + p[1] * 3.0 * u * u * t + p[2] * 3.0 * u * t * t + p[3] * t * t * t
}

fn limb() -> Vec<Vec2> {
    let control = [
        Vec2::new(0.0, -10.0),
        Vec2::new(-10.0, -5.0),
        Vec2::new(-10.0, 5.0),
        Vec2::new(0.0, 10.0),
    ];
    (0..=50).map(|i| bezier(control, i as f32 / 50.0)).collect()
}

/// Cone silhouette at `y` with its tip toward the grip.
fn finial(y: f32) -> Path {
    let tip = if y > 0.0 { -1.0 } else { 1.0 };
    Path::closed(vec![
        Vec2::new(0.0, y + tip),
        Vec2::new(-1.0, y - tip),
        Vec2::new(1.0, y - tip),
    ])
}

/// Shaft, head and fletching, pointing along +X.
fn arrow_outline() -> Vec<Path> {
    vec![
        Path::open(vec![Vec2::new(-7.5, 0.0), Vec2::new(7.5, 0.0)]),
        Path::closed(vec![Vec2::new(9.0, 0.0), Vec2::new(7.5, 0.4), Vec2::new(7.5, -0.4)]),
        Path::open(vec![Vec2::new(-7.0, 0.5), Vec2::new(-5.0, 0.0), Vec2::new(-7.0, -0.5)]),
    ]
}

/// Fixed pieces of the bow, all expressed in the bow's own frame.
struct BowPart {
    handle: SpriteId,
    local: Vec3,
}

struct Arrow {
    handle: SpriteId,
    flight: Tween,
    fade: Tween,
    aim: Vec2,
    tilt: Vec2,
}

/// Recent arrow positions, newest first, each fading by a fixed factor per tick.
pub struct Trail {
    handles: Vec<SpriteId>,
    points: Vec<Vec3>,
    alphas: Vec<f32>,
}

impl Trail {
    fn new(surface: &mut Surface, at: Vec3) -> Self {
        let handles = (0..TRAIL_POINTS)
            .map(|_| surface.insert(Sprite::glow(at, 0.25, PURPLE, 0.8)))
            .collect();
        Self {
            handles,
            points: vec![at; TRAIL_POINTS],
            alphas: vec![1.0; TRAIL_POINTS],
        }
    }

    #[cfg(test)]
    pub fn alphas(&self) -> &[f32] {
        &self.alphas
    }

    fn push(&mut self, head: Vec3, surface: &mut Surface) {
        for i in (1..TRAIL_POINTS).rev() {
            self.points[i] = self.points[i - 1];
            self.alphas[i] *= TRAIL_FADE;
        }
        self.points[0] = head;
        self.alphas[0] = 1.0;
        for ((handle, point), alpha) in self.handles.iter().zip(&self.points).zip(&self.alphas) {
            if let Some(sprite) = surface.get_mut(*handle) {
                sprite.position = *point;
                sprite.opacity = alpha * 0.8;
            }
        }
    }

    fn clear(&mut self, surface: &mut Surface) {
        for handle in self.handles.drain(..) {
            surface.remove(handle);
        }
    }
}

/// One loosed arrow and the trail it drags. The trail outlives the arrow.
pub struct Shot {
    arrow: Option<Arrow>,
    trail: Trail,
    age: f32,
    head: Vec3,
}

impl Shot {
    #[cfg(test)]
    pub fn in_flight(&self) -> bool {
        self.arrow.is_some()
    }

    #[cfg(test)]
    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    #[cfg(test)]
    pub fn head(&self) -> Vec3 {
        self.head
    }
}

/// A shadow bow that tracks the pointer and periodically looses arrows
/// trailing sparks.
pub struct BowEffect {
    rng: fastrand::Rng,
    swarm: Swarm,
    parts: Vec<BowPart>,
    shots: Vec<Shot>,
    mouse: Smoothed,
    fire_threshold: f32,
}

impl BowEffect {
    #[cfg(test)]
    pub fn wisps(&self) -> &[crate::particles::Ambient] {
        &self.swarm.ambient
    }

    #[cfg(test)]
    pub fn sparks(&self) -> &[crate::particles::lifecycle::Decaying] {
        &self.swarm.decaying
    }

    #[cfg(test)]
    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    /// Bow rotation about X and Y.
    pub fn rotation(&self) -> Vec2 {
        let m = self.mouse.current;
        Vec2::new(m.y * 0.3, PI * 0.1 + m.x * 0.3)
    }

    fn orientation(&self) -> Quat {
        let r = self.rotation();
        Quat::from_euler(EulerRot::XYZ, r.x, r.y, 0.0)
    }

    fn wisp_ranges() -> EmitterRanges {
        let mut ranges = EmitterRanges::motes(Region::Box {
            center: Vec3::ZERO,
            half: Vec3::new(15.0, 15.0, 10.0),
        });
        ranges.palette = SHADOW_PAIR.to_vec();
        ranges.shapes = vec![Shape::Glow { radius: 0.6 }];
        ranges.size = (1.0, 3.0);
        ranges.speed = (1.0, 1.0);
        ranges.amplitude = (0.0, 1.5);
        ranges.amplitude_axes = Vec3::Y;
        ranges.pulse_speed = (1.0, 1.0);
        ranges.scale_pulse = Pulse::new(0.8, 0.2, 0.5);
        ranges.opacity_pulse = Pulse::new(0.25, 0.15, 0.5);
        ranges.opacity_floor = 0.05;
        ranges.spin = Vec3::new(0.6, 0.0, 0.42);
        ranges.random_orientation = true;
        ranges
    }

    fn build_bow(surface: &mut Surface) -> Vec<BowPart> {
        let mut parts = Vec::new();
        let mut outline = |paths: Vec<Path>, color: Rgb, opacity: f32| {
            let handle = surface.insert(Sprite::outline(Vec3::ZERO, paths, color, opacity));
            BowPart {
                handle,
                local: Vec3::ZERO,
            }
        };
        parts.push(outline(vec![Path::open(limb())], BOW_WOOD, 1.0));
        parts.push(outline(
            vec![Path::open(vec![Vec2::new(0.0, -10.0), Vec2::new(0.0, 10.0)])],
            BOW_STRING,
            0.7,
        ));
        parts.push(outline(vec![finial(11.0), finial(-11.0)], PURPLE, 1.0));
        parts.push(outline(
            vec![Path::closed(polygon(6, 1.2)), Path::closed(polygon(3, 0.7))],
            BLUE,
            1.0,
        ));

        for (x, y) in ORBS {
            let local = Vec3::new(x, y, 0.0);
            let handle = surface.insert(Sprite::glow(local, 0.3, BLUE, 0.8));
            parts.push(BowPart { handle, local });
        }
        parts
    }

    /// Looses an arrow toward where the pointer currently is.
    pub fn fire_arrow(&mut self, surface: &mut Surface) {
        let orientation = self.orientation();
        let start = orientation * NOCK;
        let mut sprite = Sprite::outline(start, arrow_outline(), PURPLE, 0.9);
        sprite.rotation = self.rotation().extend(0.0);
        let handle = surface.insert(sprite);

        let target = self.mouse.target;
        let arrow = Arrow {
            handle,
            flight: Tween::new(0.0, 1.0, FLIGHT_SECONDS, Ease::Power2In),
            fade: Tween::new(0.9, 0.0, 0.8, Ease::Power1In).delayed(0.7),
            aim: Vec2::new(target.y * 0.3, target.x * 0.3),
            tilt: Vec2::new(self.rng.f32() * 0.1, self.rng.f32() * 0.1),
        };
        self.shots.push(Shot {
            arrow: Some(arrow),
            trail: Trail::new(surface, start),
            age: 0.0,
            head: start,
        });
        tracing::debug!(shots = self.shots.len(), "arrow loosed");
    }

    fn fly(&mut self, dt: f32, surface: &mut Surface) {
        let orientation = self.orientation();
        let rotation = self.rotation();

        for shot in &mut self.shots {
            shot.age += dt;
            let mut landed = false;
            if let Some(arrow) = &shot.arrow {
                let progress = arrow.flight.sample(shot.age);
                let end = Vec3::new(FLIGHT_END_X, arrow.aim.x, arrow.aim.y);
                let local = NOCK.lerp(end, progress);
                shot.head = orientation * local;
                if let Some(sprite) = surface.get_mut(arrow.handle) {
                    sprite.position = shot.head;
                    sprite.rotation = (rotation + arrow.tilt * progress).extend(0.0);
                    sprite.opacity = arrow.fade.sample(shot.age);
                }

                if self.rng.f32() > SPARK_CHANCE {
                    let jitter = Vec3::new(
                        spread(&mut self.rng, 0.25),
                        spread(&mut self.rng, 0.25),
                        spread(&mut self.rng, 0.25),
                    );
                    let color = if self.rng.f32() > 0.5 { PURPLE } else { BLUE };
                    let spec = DecaySpec {
                        radius: 0.2,
                        size: 1.0,
                        decay: 0.02,
                        velocity: Vec3::new(
                            spread(&mut self.rng, 0.1),
                            spread(&mut self.rng, 0.1),
                            spread(&mut self.rng, 0.1),
                        ),
                        peak_opacity: 0.8,
                    };
                    self.swarm.spawn(surface, shot.head + jitter, color, spec);
                }
                landed = arrow.flight.finished(shot.age);
            }
            if landed {
                if let Some(arrow) = shot.arrow.take() {
                    surface.remove(arrow.handle);
                }
            }
            shot.trail.push(shot.head, surface);
        }

        self.shots.retain_mut(|shot| {
            if shot.age >= TRAIL_SECONDS {
                shot.trail.clear(surface);
                false
            } else {
                true
            }
        });
    }
}

impl Effect for BowEffect {
    fn camera() -> Camera {
        Camera::new(75.0, 30.0)
    }

    fn new(surface: &mut Surface, mut rng: fastrand::Rng, tuning: &Tuning) -> Self {
        let parts = Self::build_bow(surface);
        let mut swarm = Swarm::new(Emitter::new(Self::wisp_ranges(), tuning.count), SPARK_CAPACITY);
        swarm.populate(surface, &mut rng);

        let effect = Self {
            rng,
            swarm,
            parts,
            shots: Vec::new(),
            mouse: Smoothed::default(),
            fire_threshold: tuning.spawn_threshold,
        };
        effect.pose(surface);
        effect
    }

    fn update(&mut self, frame: Frame, pointer: &Pointer, surface: &mut Surface) {
        self.mouse.target = pointer.ndc;
        self.mouse.step(0.05);
        self.pose(surface);

        self.swarm.tick(surface, frame);
        self.fly(frame.dt, surface);

        if self.rng.f32() > self.fire_threshold {
            self.fire_arrow(surface);
        }
    }

    fn handle_event(&mut self, event: &Event, surface: &mut Surface) {
        match event {
            Event::Mouse(MouseEvent { kind: MouseEventKind::Down(_), .. })
            | Event::Key(KeyEvent { code: KeyCode::Char(' ') | KeyCode::Enter, .. }) => self.fire_arrow(surface),
            _ => {}
        }
    }
}

impl BowEffect {
    fn pose(&self, surface: &mut Surface) {
        let orientation = self.orientation();
        let rotation = self.rotation().extend(0.0);
        for part in &self.parts {
            if let Some(sprite) = surface.get_mut(part.handle) {
                sprite.position = orientation * part.local;
                sprite.rotation = rotation;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::motion::FIXED_DT;
    use crossterm::event::{KeyModifiers, MouseButton};

    const PARTS: usize = 4 + ORBS.len();

    fn setup() -> (Surface, BowEffect) {
        let mut surface = Surface::new(200, 120, BowEffect::camera(), (0, 0, 0));
        let tuning = Tuning {
            count: 20,
            spawn_threshold: 1.0,
        };
        let effect = BowEffect::new(&mut surface, fastrand::Rng::with_seed(17), &tuning);
        (surface, effect)
    }

    fn run(effect: &mut BowEffect, surface: &mut Surface, pointer: &Pointer, ticks: usize) {
        for i in 1..=ticks {
            let frame = Frame {
                elapsed: i as f32 * FIXED_DT,
                dt: FIXED_DT,
            };
            effect.update(frame, pointer, surface);
        }
    }

    #[test]
    fn builds_bow_and_wisps() {
        let (surface, effect) = setup();
        assert_eq!(effect.wisps().len(), 20);
        assert!(effect.shots().is_empty());
        assert_eq!(surface.len(), 20 + PARTS);
    }

    #[test]
    fn limb_follows_the_bezier() {
        let points = limb();
        assert_eq!(points.first(), Some(&Vec2::new(0.0, -10.0)));
        assert!((points[50] - Vec2::new(0.0, 10.0)).length() < 1e-5);
        assert!((points[25] - Vec2::new(-7.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn bow_turns_toward_the_eased_pointer() {
        let (mut surface, mut effect) = setup();
        let pointer = Pointer {
            ndc: Vec2::new(1.0, 0.5),
            ..Default::default()
        };
        run(&mut effect, &mut surface, &pointer, 400);
        let r = effect.rotation();
        assert!((r.y - (PI * 0.1 + 0.3)).abs() < 1e-3);
        assert!((r.x - 0.15).abs() < 1e-3);
    }

    #[test]
    fn arrow_flies_fades_and_leaves_nothing_behind() {
        let (mut surface, mut effect) = setup();
        let baseline = surface.len();
        let still = Pointer::default();
        effect.fire_arrow(&mut surface);
        assert_eq!(surface.len(), baseline + 1 + TRAIL_POINTS);

        run(&mut effect, &mut surface, &still, 42);
        let shot = &effect.shots()[0];
        assert!(shot.in_flight());
        let opacity = surface.get(shot.arrow.as_ref().unwrap().handle).unwrap().opacity;
        assert!((opacity - 0.9).abs() < 1e-4);
        assert!(!effect.sparks().is_empty());

        // Flight ends at 1.5 s, the trail lingers until 2 s.
        run(&mut effect, &mut surface, &still, 50);
        let shot = &effect.shots()[0];
        assert!(!shot.in_flight());
        assert!(shot.head().x > 40.0);

        run(&mut effect, &mut surface, &still, 120);
        assert!(effect.shots().is_empty());
        assert!(effect.sparks().is_empty());
        assert_eq!(surface.len(), baseline);
    }

    #[test]
    fn trail_fades_geometrically() {
        let (mut surface, mut effect) = setup();
        effect.fire_arrow(&mut surface);
        run(&mut effect, &mut surface, &Pointer::default(), 3);
        let alphas = effect.shots()[0].trail().alphas();
        // Every older slot fades once per push, in place.
        assert_eq!(alphas[0], 1.0);
        for alpha in &alphas[1..=3] {
            assert!((alpha - 0.95_f32.powi(3)).abs() < 1e-6);
        }
        assert!((alphas[TRAIL_POINTS - 1] - 0.95_f32.powi(3)).abs() < 1e-6);
    }

    #[test]
    fn click_and_space_loose_arrows() {
        let (mut surface, mut effect) = setup();
        let click = Event::Mouse(MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 10,
            row: 5,
            modifiers: KeyModifiers::NONE,
        });
        effect.handle_event(&click, &mut surface);
        effect.handle_event(&Event::Key(KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)), &mut surface);
        assert_eq!(effect.shots().len(), 2);
    }

    #[test]
    fn fire_chance_comes_from_tuning() {
        let mut surface = Surface::new(200, 120, BowEffect::camera(), (0, 0, 0));
        let tuning = Tuning {
            count: 0,
            spawn_threshold: 0.0,
        };
        let mut effect = BowEffect::new(&mut surface, fastrand::Rng::with_seed(2), &tuning);
        run(&mut effect, &mut surface, &Pointer::default(), 5);
        assert!(effect.shots().len() >= 4);
    }
}
