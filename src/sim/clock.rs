//! Fixed timestep clock
//!
//! Turns variable wall-clock frame durations into a whole number of fixed
//! simulation steps plus a blend factor for rendering between them.

use thiserror::Error;

use crate::consts::MAX_FRAME_TIME;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClockError {
    #[error("physics rate must be positive, got {0} Hz")]
    NonPositiveRate(u32),
}

/// Result of advancing the clock by one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStep {
    /// Fixed updates executed this frame
    pub steps: u32,
    /// How far into the next unexecuted step the frame ends, in `[0, 1)`
    pub alpha: f64,
}

/// Accumulator-based fixed step driver
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    hz: u32,
    dt: f64,
    accumulator: f64,
    max_frame_time: f64,
}

impl FixedStepClock {
    pub fn new(hz: u32) -> Result<Self, ClockError> {
        if hz == 0 {
            return Err(ClockError::NonPositiveRate(hz));
        }
        Ok(Self {
            hz,
            dt: 1.0 / hz as f64,
            accumulator: 0.0,
            max_frame_time: MAX_FRAME_TIME,
        })
    }

    /// Fixed step length in seconds
    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn hz(&self) -> u32 {
        self.hz
    }

    /// Feed one frame of wall time and run `update` once per whole step.
    ///
    /// Negative frame times are treated as zero; frame times above the clamp
    /// are truncated so a stall never queues an unbounded number of steps.
    pub fn advance<F: FnMut(f64)>(&mut self, frame_time: f64, mut update: F) -> FrameStep {
        let frame_time = frame_time.clamp(0.0, self.max_frame_time);
        self.accumulator += frame_time;

        let mut steps = 0;
        while self.accumulator >= self.dt {
            update(self.dt);
            self.accumulator -= self.dt;
            steps += 1;
        }

        FrameStep {
            steps,
            alpha: self.alpha(),
        }
    }

    /// Current blend factor between the last and next step
    pub fn alpha(&self) -> f64 {
        (self.accumulator / self.dt).clamp(0.0, 1.0 - f64::EPSILON)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_rate_rejected() {
        assert_eq!(
            FixedStepClock::new(0).unwrap_err(),
            ClockError::NonPositiveRate(0)
        );
    }

    #[test]
    fn test_accumulates_across_frames() {
        let mut clock = FixedStepClock::new(60).unwrap();
        let mut ticks = 0;

        // Half a step: nothing runs yet
        let step = clock.advance(0.5 / 60.0, |_| ticks += 1);
        assert_eq!(step.steps, 0);
        assert!((step.alpha - 0.5).abs() < 1e-9);

        // Another 0.75 step: one update, quarter step left over
        let step = clock.advance(0.75 / 60.0, |_| ticks += 1);
        assert_eq!(step.steps, 1);
        assert_eq!(ticks, 1);
        assert!((step.alpha - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_update_always_sees_fixed_dt() {
        let mut clock = FixedStepClock::new(120).unwrap();
        let mut seen = Vec::new();
        for frame in [0.013, 0.021, 0.004, 0.05] {
            clock.advance(frame, |dt| seen.push(dt));
        }
        assert!(!seen.is_empty());
        assert!(seen.iter().all(|&dt| dt == 1.0 / 120.0));
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut stalled = FixedStepClock::new(60).unwrap();
        let mut reference = FixedStepClock::new(60).unwrap();
        let step = stalled.advance(10.0, |_| {});
        let expected = reference.advance(MAX_FRAME_TIME, |_| {});
        assert_eq!(step, expected);
        assert!(step.steps >= 14 && step.steps <= 15);
        assert!(step.alpha >= 0.0 && step.alpha < 1.0);
    }

    #[test]
    fn test_negative_frame_ignored() {
        let mut clock = FixedStepClock::new(60).unwrap();
        let step = clock.advance(-1.0, |_| panic!("no step expected"));
        assert_eq!(step.steps, 0);
        assert_eq!(step.alpha, 0.0);
    }
}
