use glam::Vec2;

/// Seconds per fixed update step.
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// Timing for one update step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Seconds since the effect started.
    pub elapsed: f32,
    /// Seconds covered by this step.
    pub dt: f32,
}

/// Monotonic effect clock advanced by the frame loop.
#[derive(Debug, Default, Clone)]
pub struct Clock {
    elapsed: f64,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, dt: f32) -> Frame {
        self.elapsed += dt as f64;
        Frame {
            elapsed: self.elapsed as f32,
            dt,
        }
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed as f32
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

/// A value that eases toward a target by a fixed fraction per step.
#[derive(Debug, Default, Clone, Copy)]
pub struct Smoothed {
    pub current: Vec2,
    pub target: Vec2,
}

impl Smoothed {
    pub fn step(&mut self, factor: f32) -> Vec2 {
        self.current += (self.target - self.current) * factor;
        self.current
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    /// Quadratic ease-in.
    Power1In,
    /// Cubic ease-in.
    Power2In,
}

impl Ease {
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Ease::Power1In => t * t,
            Ease::Power2In => t * t * t,
        }
    }
}

/// Interpolates from `from` to `to` over `duration` seconds after an optional delay.
#[derive(Debug, Clone, Copy)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub delay: f32,
    pub duration: f32,
    pub ease: Ease,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            delay: 0.0,
            duration,
            ease,
        }
    }

    pub fn delayed(mut self, delay: f32) -> Self {
        self.delay = delay;
        self
    }

    /// Value `age` seconds after the tween was created.
    pub fn sample(&self, age: f32) -> f32 {
        let t = if self.duration <= 0.0 {
            1.0
        } else {
            (age - self.delay) / self.duration
        };
        self.from + (self.to - self.from) * self.ease.apply(t)
    }

    pub fn finished(&self, age: f32) -> bool {
        age >= self.delay + self.duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_accumulates_steps() {
        let mut clock = Clock::new();
        for _ in 0..60 {
            clock.advance(FIXED_DT);
        }
        assert!((clock.elapsed() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn smoothed_converges_on_target() {
        let mut s = Smoothed {
            target: Vec2::new(1.0, -1.0),
            ..Default::default()
        };
        for _ in 0..500 {
            s.step(0.05);
        }
        assert!((s.current - s.target).length() < 1e-3);
    }

    #[test]
    fn tween_respects_delay_and_ends() {
        let fade = Tween::new(1.0, 0.0, 0.8, Ease::Power1In).delayed(0.7);
        assert_eq!(fade.sample(0.0), 1.0);
        assert_eq!(fade.sample(0.7), 1.0);
        assert!(fade.sample(1.1) < 1.0);
        assert_eq!(fade.sample(2.0), 0.0);
        assert!(!fade.finished(1.4));
        assert!(fade.finished(1.5));
    }

    #[test]
    fn ease_in_starts_slow() {
        assert!(Ease::Power2In.apply(0.5) < Ease::Power1In.apply(0.5));
        assert!(Ease::Power1In.apply(0.5) < 0.5);
        assert_eq!(Ease::Power2In.apply(1.0), 1.0);
    }
}
