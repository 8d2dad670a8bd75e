//! Shared primitive pool: creation with randomized parameters and the
//! per-tick lifecycle that every effect runs its primitives through.

pub mod emitter;
pub mod lifecycle;
pub mod motion;

pub use emitter::{Emitter, EmitterRanges, Region};
pub use lifecycle::{Ambient, Pulse, Swarm};
pub use motion::{Clock, Frame, Smoothed, Tween};

/// Uniform draw in `[lo, hi)`.
pub fn between(rng: &mut fastrand::Rng, (lo, hi): (f32, f32)) -> f32 {
    lo + rng.f32() * (hi - lo)
}

/// Uniform draw in `[-half, half)`.
pub fn spread(rng: &mut fastrand::Rng, half: f32) -> f32 {
    (rng.f32() - 0.5) * 2.0 * half
}
