use crate::camera::Camera;
use crate::config::Tuning;
use crate::particles::Frame;
use crate::surface::Surface;
use crossterm::event::Event;
use glam::Vec2;

pub mod banshee;
pub mod bow;
pub mod emblem;
pub mod portal;
pub mod realm;
pub mod runes;

/// Latest pointer position over the surface.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Pointer {
    /// Surface pixel coordinates.
    pub pixel: Vec2,
    /// Normalized device coordinates, y up.
    pub ndc: Vec2,
    pub seen: bool,
}

pub trait Effect {
    /// Camera the effect's scene is framed with.
    fn camera() -> Camera
    where
        Self: Sized;

    /// Creates the effect's primitives on a freshly sized surface.
    fn new(surface: &mut Surface, rng: fastrand::Rng, tuning: &Tuning) -> Self
    where
        Self: Sized;

    fn update(&mut self, frame: Frame, pointer: &Pointer, surface: &mut Surface);

    /// Shader-like layers painted before sprites are composited.
    fn paint(&self, _elapsed: f32, _surface: &mut Surface) {}

    /// `draw` is a uniform sample in [0, 1) used for spawn decisions.
    fn pointer_moved(&mut self, _pointer: &Pointer, _draw: f32, _surface: &mut Surface) {}

    fn resized(&mut self, _surface: &mut Surface) {}

    fn handle_event(&mut self, _event: &Event, _surface: &mut Surface) {}
}

/// Names accepted on the command line, in display order.
pub const NAMES: [(&str, &str); 6] = [
    ("banshee", "Ghostly motes with a pointer-following focus and wisp trails"),
    ("runes", "Tumbling arcane runes with scroll parallax and hover glow"),
    ("portal", "Swirling shadow portal ringed by orbiting wisps"),
    ("realm", "Drifting fog, floating shadow shapes and light shafts"),
    ("bow", "Shadow bow that looses glowing arrows (click to fire)"),
    ("emblem", "Hero orb and class emblem (left/right to change class)"),
];
