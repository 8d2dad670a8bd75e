use super::{Effect, Pointer};
use crate::camera::Camera;
use crate::config::Tuning;
use crate::palette::{BLUE, PURPLE, ROSE};
use crate::particles::emitter::polygon;
use crate::particles::lifecycle::tick_ambient;
use crate::particles::{Ambient, Emitter, EmitterRanges, Frame, Pulse, Region, between, spread};
use crate::surface::{Path, Shape, Sprite, SpriteId, Surface};
use crossterm::event::{Event, KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use glam::{Quat, Vec2, Vec3};
use std::f32::consts::TAU;

const RUNE_COLORS: [(u8, u8, u8); 5] = [PURPLE, BLUE, PURPLE, BLUE, ROSE];
const DEPTH_LIMIT: f32 = 30.0;
const SCROLL_STEP: f32 = 40.0;
const HOVER_SCALE: f32 = 1.5;
const HOVER_OPACITY: f32 = 0.8;
const REST_OPACITY: f32 = 0.5;
const DUST_COUNT: usize = 100;

fn pentagon() -> Shape {
    Shape::Outline {
        paths: vec![Path::closed(polygon(5, 2.0)), Path::closed(polygon(5, 1.2))],
    }
}

fn triangle() -> Shape {
    Shape::Outline {
        paths: vec![
            Path::closed(vec![Vec2::new(0.0, 2.0), Vec2::new(-2.0, -1.5), Vec2::new(2.0, -1.5)]),
            Path::open(vec![Vec2::new(-1.0, -0.5), Vec2::new(1.0, -0.5)]),
        ],
    }
}

fn star() -> Shape {
    let tips = [
        (0.0, 3.0),
        (1.0, 1.0),
        (3.0, 0.0),
        (1.0, -1.0),
        (0.0, -3.0),
        (-1.0, -1.0),
        (-3.0, 0.0),
        (-1.0, 1.0),
    ];
    Shape::Outline {
        paths: vec![
            Path::closed(tips.iter().map(|&(x, y)| Vec2::new(x, y)).collect()),
            Path::closed(polygon(16, 0.8)),
        ],
    }
}

fn hexagram() -> Shape {
    Shape::Outline {
        paths: vec![
            Path::closed(vec![Vec2::new(0.0, 2.0), Vec2::new(-1.7, -1.0), Vec2::new(1.7, -1.0)]),
            Path::closed(vec![Vec2::new(0.0, -2.0), Vec2::new(-1.7, 1.0), Vec2::new(1.7, 1.0)]),
        ],
    }
}

fn arcane_wheel() -> Shape {
    let mut paths = vec![Path::closed(polygon(24, 2.0)), Path::closed(polygon(24, 1.5))];
    for i in 0..8 {
        let angle = i as f32 / 8.0 * TAU;
        let dir = Vec2::new(angle.sin(), angle.cos());
        paths.push(Path::open(vec![dir * 0.5, dir * 2.5]));
    }
    Shape::Outline { paths }
}

/// Per-rune state layered over the ambient float and spin.
#[derive(Debug, Clone)]
struct RuneState {
    home_depth: f32,
    depth_speed: f32,
    pulse_speed: f32,
    scale: f32,
    opacity: f32,
}

/// One point cloud that turns about Y as a whole.
struct DustLayer {
    points: Vec<(SpriteId, Vec3)>,
    spin: f32,
    angle: f32,
}

impl DustLayer {
    fn new(surface: &mut Surface, positions: &[Vec3], color: (u8, u8, u8), radius: f32) -> Self {
        let points = positions
            .iter()
            .map(|&p| (surface.insert(Sprite::glow(p, radius, color, 0.6)), p))
            .collect();
        Self {
            points,
            spin: 0.06,
            angle: 0.0,
        }
    }

    fn update(&mut self, dt: f32, lift: f32, surface: &mut Surface) {
        self.angle += self.spin * dt;
        let turn = Quat::from_rotation_y(self.angle);
        for &(handle, local) in &self.points {
            if let Some(sprite) = surface.get_mut(handle) {
                sprite.position = turn * local + Vec3::new(0.0, lift, 0.0);
            }
        }
    }
}

/// Arcane runes tumbling in depth; scrolling pushes them through the scene
/// and the rune under the pointer swells and brightens.
pub struct RunesEffect {
    runes: Vec<Ambient>,
    states: Vec<RuneState>,
    dust: [DustLayer; 2],
    hovered: Option<usize>,
    scroll: f32,
    scroll_target: f32,
}

impl RunesEffect {
    #[cfg(test)]
    pub fn runes(&self) -> &[Ambient] {
        &self.runes
    }

    #[cfg(test)]
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    #[cfg(test)]
    pub fn scroll(&self) -> (f32, f32) {
        (self.scroll, self.scroll_target)
    }

    /// Scrolls by `delta` page pixels; the page cannot scroll above its top.
    pub fn scroll_by(&mut self, delta: f32) {
        self.scroll_target = (self.scroll_target + delta).max(0.0);
    }

    fn rune_ranges(surface: &Surface) -> EmitterRanges {
        let mut ranges = EmitterRanges::motes(Region::Box {
            center: Vec3::ZERO,
            half: Vec3::new(
                (surface.width() as f32 / 20.0).max(18.0),
                (surface.height() as f32 / 20.0).max(12.0),
                20.0,
            ),
        });
        ranges.palette = RUNE_COLORS.to_vec();
        ranges.shapes = vec![pentagon(), triangle(), star(), hexagram(), arcane_wheel()];
        ranges.size = (0.5, 2.0);
        ranges.speed = (0.3, 0.9);
        ranges.amplitude = (0.3, 0.8);
        ranges.amplitude_axes = Vec3::Y;
        ranges.scale_pulse = Pulse::new(1.0, 0.0, 0.0);
        ranges.opacity_pulse = Pulse::new(REST_OPACITY, 0.0, 0.0);
        ranges.opacity_floor = 0.0;
        ranges.spin = Vec3::splat(0.3);
        ranges.random_orientation = true;
        ranges
    }

    /// Marks the nearest rune whose projected outline covers `pixel`.
    fn pick(&mut self, pixel: Vec2, surface: &Surface) {
        let mut best: Option<(usize, f32)> = None;
        for (i, rune) in self.runes.iter().enumerate() {
            let Some(sprite) = surface.get(rune.handle) else {
                continue;
            };
            let Some(projected) = surface.camera.project(sprite.position) else {
                continue;
            };
            let Some((center, ppu)) = surface.to_pixel(sprite.position) else {
                continue;
            };
            let reach = 2.0 * sprite.scale * ppu;
            if center.distance(pixel) > reach {
                continue;
            }
            if best.is_none_or(|(_, depth)| projected.depth < depth) {
                best = Some((i, projected.depth));
            }
        }
        self.hovered = best.map(|(i, _)| i);
    }
}

impl Effect for RunesEffect {
    fn camera() -> Camera {
        Camera::new(45.0, 50.0)
    }

    fn new(surface: &mut Surface, mut rng: fastrand::Rng, tuning: &Tuning) -> Self {
        let mut emitter = Emitter::new(Self::rune_ranges(surface), tuning.count);
        let runes = emitter.fill(surface, &mut rng);
        let states = runes
            .iter()
            .map(|rune| RuneState {
                home_depth: rune.base.z,
                depth_speed: between(&mut rng, (0.1, 0.4)),
                pulse_speed: between(&mut rng, (0.3, 0.9)),
                scale: 1.0,
                opacity: between(&mut rng, (0.3, 0.8)),
            })
            .collect();

        let half = Vec2::new(
            (surface.width() as f32 / 10.0).max(30.0),
            (surface.height() as f32 / 10.0).max(20.0),
        );
        let positions: Vec<Vec3> = (0..DUST_COUNT)
            .map(|_| Vec3::new(spread(&mut rng, half.x), spread(&mut rng, half.y), spread(&mut rng, 25.0)))
            .collect();
        let dust = [
            DustLayer::new(surface, &positions, PURPLE, 0.2),
            DustLayer::new(surface, &positions, BLUE, 0.15),
        ];

        tracing::debug!(runes = runes.len(), dust = DUST_COUNT * 2, "runes created");
        Self {
            runes,
            states,
            dust,
            hovered: None,
            scroll: 0.0,
            scroll_target: 0.0,
        }
    }

    fn update(&mut self, frame: Frame, _pointer: &Pointer, surface: &mut Surface) {
        self.scroll += (self.scroll_target - self.scroll) * 0.1;

        for (rune, state) in self.runes.iter_mut().zip(&mut self.states) {
            let mut z = state.home_depth - self.scroll * 0.01 * state.depth_speed;
            if z > DEPTH_LIMIT {
                state.home_depth -= DEPTH_LIMIT * 2.0;
                z -= DEPTH_LIMIT * 2.0;
            } else if z < -DEPTH_LIMIT {
                state.home_depth += DEPTH_LIMIT * 2.0;
                z += DEPTH_LIMIT * 2.0;
            }
            rune.base.z = z;
        }

        tick_ambient(&mut self.runes, surface, frame);

        for (i, (rune, state)) in self.runes.iter().zip(&mut self.states).enumerate() {
            if self.hovered == Some(i) {
                state.scale = state.scale * 0.95 + HOVER_SCALE * 0.05;
                state.opacity = state.opacity * 0.9 + HOVER_OPACITY * 0.1;
            } else {
                let pulse = 1.0 + (frame.elapsed * state.pulse_speed * 2.0).sin() * 0.1;
                state.scale = state.scale * 0.95 + pulse * 0.05;
                state.opacity = state.opacity * 0.95 + REST_OPACITY * 0.05;
            }
            if let Some(sprite) = surface.get_mut(rune.handle) {
                sprite.scale = rune.size * state.scale;
                sprite.opacity = state.opacity;
            }
        }

        let lift = -self.scroll * 0.003;
        for layer in &mut self.dust {
            layer.update(frame.dt, lift, surface);
        }
    }

    fn pointer_moved(&mut self, pointer: &Pointer, _draw: f32, surface: &mut Surface) {
        self.pick(pointer.pixel, surface);
    }

    fn handle_event(&mut self, event: &Event, _surface: &mut Surface) {
        match event {
            Event::Mouse(MouseEvent { kind: MouseEventKind::ScrollDown, .. })
            | Event::Key(KeyEvent { code: KeyCode::PageDown, .. }) => self.scroll_by(SCROLL_STEP),
            Event::Mouse(MouseEvent { kind: MouseEventKind::ScrollUp, .. })
            | Event::Key(KeyEvent { code: KeyCode::PageUp, .. }) => self.scroll_by(-SCROLL_STEP),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particles::motion::FIXED_DT;

    fn setup() -> (Surface, RunesEffect) {
        let mut surface = Surface::new(400, 300, RunesEffect::camera(), (0, 0, 0));
        let effect = RunesEffect::new(&mut surface, fastrand::Rng::with_seed(21), &Tuning::defaults_for("runes"));
        (surface, effect)
    }

    fn run(effect: &mut RunesEffect, surface: &mut Surface, from: usize, ticks: usize) {
        let pointer = Pointer::default();
        for i in from..from + ticks {
            let frame = Frame {
                elapsed: (i + 1) as f32 * FIXED_DT,
                dt: FIXED_DT,
            };
            effect.update(frame, &pointer, surface);
        }
    }

    #[test]
    fn creates_runes_and_two_dust_layers() {
        let (surface, effect) = setup();
        assert_eq!(effect.runes().len(), 15);
        assert_eq!(surface.len(), 15 + DUST_COUNT * 2);
    }

    #[test]
    fn every_shape_has_paths() {
        for shape in [pentagon(), triangle(), star(), hexagram(), arcane_wheel()] {
            let Shape::Outline { paths } = shape else {
                panic!("rune shapes are outlines");
            };
            assert!(paths.len() >= 2);
        }
    }

    #[test]
    fn scroll_is_smoothed_and_depth_stays_wrapped() {
        let (mut surface, mut effect) = setup();
        for _ in 0..50 {
            effect.scroll_by(SCROLL_STEP);
        }
        run(&mut effect, &mut surface, 0, 1);
        let (scroll, target) = effect.scroll();
        assert!((scroll - target * 0.1).abs() < 1e-3);

        run(&mut effect, &mut surface, 1, 600);
        for rune in effect.runes() {
            assert!(rune.base.z.abs() <= DEPTH_LIMIT + 1e-3, "z {}", rune.base.z);
        }
    }

    #[test]
    fn scroll_never_goes_above_top() {
        let (_, mut effect) = setup();
        effect.scroll_by(-100.0);
        assert_eq!(effect.scroll().1, 0.0);
    }

    #[test]
    fn hovered_rune_swells() {
        let (mut surface, mut effect) = setup();
        run(&mut effect, &mut surface, 0, 1);

        let handle = effect.runes()[0].handle;
        let position = surface.get(handle).unwrap().position;
        let (pixel, _) = surface.to_pixel(position).unwrap();
        let pointer = Pointer {
            pixel,
            ndc: surface.to_ndc(pixel.x, pixel.y),
            seen: true,
        };
        effect.pointer_moved(&pointer, 0.0, &mut surface);
        let hovered = effect.hovered().expect("pointer is over a rune");

        run(&mut effect, &mut surface, 1, 300);
        let state = &effect.states[hovered];
        assert!((state.scale - HOVER_SCALE).abs() < 0.01);
        assert!((state.opacity - HOVER_OPACITY).abs() < 0.01);
    }

    #[test]
    fn pointer_in_empty_space_clears_hover() {
        let (mut surface, mut effect) = setup();
        effect.hovered = Some(0);
        let pointer = Pointer {
            pixel: Vec2::new(-1000.0, -1000.0),
            ..Default::default()
        };
        effect.pointer_moved(&pointer, 0.0, &mut surface);
        assert_eq!(effect.hovered(), None);
    }
}
