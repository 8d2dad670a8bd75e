use crate::config::Tuning;
use crate::effects::{Effect, Pointer};
use crate::palette::Rgb;
use crate::particles::Clock;
use crate::particles::motion::FIXED_DT;
use crate::surface::Surface;
use crossterm::event::Event;
use glam::Vec2;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Size of the area an effect binds to, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Container {
    pub width: usize,
    pub height: usize,
}

impl Container {
    /// A terminal of `cols` x `rows` cells, two pixels per cell vertically.
    /// Returns `None` when either side is zero.
    pub fn from_terminal(cols: u16, rows: u16) -> Option<Self> {
        if cols == 0 || rows == 0 {
            return None;
        }
        Some(Self {
            width: cols as usize,
            height: rows as usize * 2,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Cloneable stop flag checked at the top of every frame.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Owns one effect instance with its surface, camera and clock, and drives
/// the update/render cycle.
pub struct Controller<E: Effect> {
    surface: Surface,
    effect: Option<E>,
    clock: Clock,
    pointer: Pointer,
    state: LoopState,
    token: CancelToken,
    tuning: Tuning,
    seeder: fastrand::Rng,
    spawn_rng: fastrand::Rng,
    accumulator: f32,
}

impl<E: Effect> Controller<E> {
    pub fn new(tuning: Tuning, seed: u64, background: Rgb) -> Self {
        let mut seeder = fastrand::Rng::with_seed(seed);
        let spawn_rng = seeder.fork();
        Self {
            surface: Surface::new(0, 0, E::camera(), background),
            effect: None,
            clock: Clock::new(),
            pointer: Pointer::default(),
            state: LoopState::Stopped,
            token: CancelToken::new(),
            tuning,
            seeder,
            spawn_rng,
            accumulator: 0.0,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Handle to cancel the current run. Each `start` issues a fresh token,
    /// so handles taken before it no longer reach the controller.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    #[cfg(test)]
    pub fn effect(&self) -> Option<&E> {
        self.effect.as_ref()
    }

    pub fn elapsed(&self) -> f32 {
        self.clock.elapsed()
    }

    /// Binds to `container` and starts running with a fresh effect. Sprites
    /// left by an earlier run are dropped first. An absent container leaves
    /// the controller stopped.
    pub fn start(&mut self, container: Option<Container>) -> bool {
        let Some(container) = container else {
            tracing::warn!("no container to bind to, effect not started");
            return false;
        };
        if self.state == LoopState::Running {
            return true;
        }

        self.surface.clear_sprites();
        self.surface.resize(container.width, container.height);
        self.token = CancelToken::new();
        self.pointer = Pointer::default();
        self.clock.reset();
        self.accumulator = 0.0;
        let rng = self.seeder.fork();
        self.effect = Some(E::new(&mut self.surface, rng, &self.tuning));
        self.state = LoopState::Running;
        tracing::info!(
            width = container.width,
            height = container.height,
            sprites = self.surface.len(),
            "effect started"
        );
        true
    }

    pub fn stop(&mut self) {
        if self.state == LoopState::Running {
            tracing::info!(elapsed = self.clock.elapsed(), "effect stopped");
        }
        self.state = LoopState::Stopped;
    }

    /// Advances the fixed-step simulation by `frame_time` seconds of wall time.
    /// Returns `false` once the loop has stopped.
    pub fn advance(&mut self, frame_time: f32) -> bool {
        if self.token.is_cancelled() {
            self.stop();
        }
        if self.state != LoopState::Running {
            return false;
        }
        let Some(effect) = self.effect.as_mut() else {
            return false;
        };

        self.accumulator += frame_time;
        if self.accumulator > FIXED_DT * 3.0 {
            self.accumulator = FIXED_DT * 3.0;
        }

        let steps = ((self.accumulator + 1e-6) / FIXED_DT) as u32;
        for _ in 0..steps {
            let frame = self.clock.advance(FIXED_DT);
            effect.update(frame, &self.pointer, &mut self.surface);
        }
        self.accumulator = (self.accumulator - steps as f32 * FIXED_DT).max(0.0);
        true
    }

    /// Runs exactly one fixed update step.
    #[cfg(test)]
    pub fn step(&mut self) -> bool {
        self.accumulator = 0.0;
        self.advance(FIXED_DT)
    }

    pub fn render<W: Write>(&mut self, out: &mut W) -> std::io::Result<()> {
        if self.state != LoopState::Running {
            return Ok(());
        }
        let Some(effect) = self.effect.as_ref() else {
            return Ok(());
        };
        self.surface.clear();
        effect.paint(self.clock.elapsed(), &mut self.surface);
        self.surface.composite();
        self.surface.present(out)
    }

    pub fn on_resize(&mut self, width: usize, height: usize) {
        self.surface.resize(width, height);
        if let Some(effect) = self.effect.as_mut() {
            effect.resized(&mut self.surface);
        }
        tracing::debug!(width, height, aspect = self.surface.camera.aspect, "resized");
    }

    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        let draw = self.spawn_rng.f32();
        self.on_pointer_move_with_draw(x, y, draw);
    }

    /// Pointer move with an explicit spawn draw.
    pub fn on_pointer_move_with_draw(&mut self, x: f32, y: f32, draw: f32) {
        self.pointer = Pointer {
            pixel: Vec2::new(x, y),
            ndc: self.surface.to_ndc(x, y),
            seen: true,
        };
        if self.state != LoopState::Running {
            return;
        }
        if let Some(effect) = self.effect.as_mut() {
            effect.pointer_moved(&self.pointer, draw, &mut self.surface);
        }
    }

    pub fn handle_event(&mut self, event: &Event) {
        if let Some(effect) = self.effect.as_mut() {
            effect.handle_event(event, &mut self.surface);
        }
    }
}
