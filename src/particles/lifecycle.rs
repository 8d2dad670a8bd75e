use super::emitter::Emitter;
use super::motion::Frame;
use crate::palette::Rgb;
use crate::surface::{Sprite, SpriteId, Surface};
use glam::Vec3;

/// Sinusoidal envelope: `mid + swing * sin(t * rate)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pulse {
    pub mid: f32,
    pub swing: f32,
    pub rate: f32,
}

impl Pulse {
    pub const fn new(mid: f32, swing: f32, rate: f32) -> Self {
        Self { mid, swing, rate }
    }

    pub fn at(&self, t: f32) -> f32 {
        self.mid + self.swing * (t * self.rate).sin()
    }
}

/// A primitive that loops forever and never decays.
#[derive(Debug, Clone)]
pub struct Ambient {
    pub handle: SpriteId,
    pub base: Vec3,
    pub amplitude: Vec3,
    /// Per-axis multipliers applied to `speed`.
    pub frequency: Vec3,
    pub speed: f32,
    pub phase: f32,
    pub size: f32,
    pub pulse_speed: f32,
    pub scale_pulse: Pulse,
    pub opacity_pulse: Pulse,
    pub opacity_floor: f32,
    pub spin: Vec3,
    pub initial_rotation: Vec3,
    /// Drift of `base` in world units per second.
    pub velocity: Option<Vec3>,
    /// Half-extent of the square `base` wraps inside when drifting.
    pub wrap: Option<f32>,
}

impl Ambient {
    pub fn position_at(&self, elapsed: f32) -> Vec3 {
        let theta = elapsed * self.speed;
        Vec3::new(
            self.base.x + self.amplitude.x * (theta * self.frequency.x + self.phase).sin(),
            self.base.y + self.amplitude.y * (theta * self.frequency.y + self.phase).cos(),
            self.base.z + self.amplitude.z * (theta * self.frequency.z + self.phase).sin(),
        )
    }

    pub fn scale_at(&self, elapsed: f32) -> f32 {
        (self.size * self.scale_pulse.at(elapsed * self.pulse_speed)).max(0.0)
    }

    /// Always within `[opacity_floor, 1]`.
    pub fn opacity_at(&self, elapsed: f32) -> f32 {
        let raw = self.opacity_pulse.at(elapsed * self.pulse_speed + self.phase);
        raw.clamp(self.opacity_floor, 1.0)
    }

    pub fn rotation_at(&self, elapsed: f32) -> Vec3 {
        self.initial_rotation + self.spin * elapsed
    }

    fn drift(&mut self, dt: f32) {
        let Some(velocity) = self.velocity else {
            return;
        };
        self.base += velocity * dt;
        if let Some(half) = self.wrap {
            for axis in [&mut self.base.x, &mut self.base.y] {
                if *axis > half {
                    *axis = -half;
                } else if *axis < -half {
                    *axis = half;
                }
            }
        }
    }
}

/// A primitive with finite life that fades and is removed.
#[derive(Debug, Clone)]
pub struct Decaying {
    pub handle: SpriteId,
    pub remaining_life: f32,
    /// Life lost per fixed tick.
    pub decay: f32,
    /// World units moved per fixed tick.
    pub velocity: Vec3,
    pub size: f32,
    pub peak_opacity: f32,
}

/// Advances ambient primitives and writes the result into their sprites.
pub fn tick_ambient(ambient: &mut [Ambient], surface: &mut Surface, frame: Frame) {
    for primitive in ambient.iter_mut() {
        primitive.drift(frame.dt);
        let Some(sprite) = surface.get_mut(primitive.handle) else {
            continue;
        };
        sprite.position = primitive.position_at(frame.elapsed);
        sprite.scale = primitive.scale_at(frame.elapsed);
        sprite.opacity = primitive.opacity_at(frame.elapsed);
        sprite.rotation = primitive.rotation_at(frame.elapsed);
    }
}

/// Decays every primitive by one tick. Expired primitives leave the surface and
/// the collection in the same call. Returns how many were removed.
pub fn tick_decaying(decaying: &mut Vec<Decaying>, surface: &mut Surface) -> usize {
    let mut removed = 0;
    // Highest index first so `remove` never shifts an element we have yet to visit.
    for i in (0..decaying.len()).rev() {
        let primitive = &mut decaying[i];
        primitive.remaining_life -= primitive.decay;

        if primitive.remaining_life <= 0.0 {
            surface.remove(primitive.handle);
            decaying.remove(i);
            removed += 1;
            continue;
        }

        if let Some(sprite) = surface.get_mut(primitive.handle) {
            sprite.position += primitive.velocity;
            sprite.scale = primitive.size * primitive.remaining_life;
            sprite.opacity = primitive.remaining_life * primitive.peak_opacity;
        }
    }
    removed
}

/// An effect's ambient pool plus its trigger-spawned decaying primitives.
pub struct Swarm {
    pub emitter: Emitter,
    pub ambient: Vec<Ambient>,
    pub decaying: Vec<Decaying>,
    decaying_capacity: usize,
}

impl Swarm {
    pub fn new(emitter: Emitter, decaying_capacity: usize) -> Self {
        Self {
            emitter,
            ambient: Vec::new(),
            decaying: Vec::with_capacity(decaying_capacity),
            decaying_capacity,
        }
    }

    /// Creates the ambient pool up to the emitter's budget.
    pub fn populate(&mut self, surface: &mut Surface, rng: &mut fastrand::Rng) {
        let created = self.emitter.fill(surface, rng);
        tracing::debug!(count = created.len(), "populated ambient pool");
        self.ambient.extend(created);
    }

    /// Spawns one decaying primitive unless the pool is full.
    pub fn spawn(
        &mut self,
        surface: &mut Surface,
        position: Vec3,
        color: Rgb,
        spec: DecaySpec,
    ) -> Option<SpriteId> {
        if self.decaying.len() >= self.decaying_capacity {
            tracing::trace!("decaying pool full, spawn dropped");
            return None;
        }
        let mut sprite = Sprite::glow(position, spec.radius, color, spec.peak_opacity);
        sprite.scale = spec.size;
        let handle = surface.insert(sprite);
        self.decaying.push(Decaying {
            handle,
            remaining_life: 1.0,
            decay: spec.decay,
            velocity: spec.velocity,
            size: spec.size,
            peak_opacity: spec.peak_opacity,
        });
        Some(handle)
    }

    pub fn tick(&mut self, surface: &mut Surface, frame: Frame) {
        tick_ambient(&mut self.ambient, surface, frame);
        let removed = tick_decaying(&mut self.decaying, surface);
        if removed > 0 {
            tracing::trace!(removed, remaining = self.decaying.len(), "expired decaying primitives");
        }
    }
}

/// Parameters for one decaying spawn.
#[derive(Debug, Clone, Copy)]
pub struct DecaySpec {
    pub radius: f32,
    pub size: f32,
    pub decay: f32,
    pub velocity: Vec3,
    pub peak_opacity: f32,
}
