//! Simulation clock
//!
//! Turns raw frame timestamps into a bounded delta. One dt unit is one
//! nominal 60 Hz frame.

use serde::{Deserialize, Serialize};

use crate::config::ClockConfig;

/// Output of one clock advance
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Step {
    /// Clamped and time-scaled frame units (world motion)
    pub dt: f32,
    /// Clamped frame units, ignoring time dilation (player control)
    pub raw_dt: f32,
    /// Clamped real milliseconds added to elapsed time
    pub real_ms: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimClock {
    /// Monotonic elapsed simulation milliseconds
    pub elapsed_ms: f64,
    /// Last scaled dt produced
    pub dt: f32,
    pub time_scale: f32,
    last_frame_ms: Option<f64>,
    frame_ms: f64,
    max_dt: f32,
}

impl SimClock {
    pub fn new(config: &ClockConfig) -> Self {
        Self {
            elapsed_ms: 0.0,
            dt: 0.0,
            time_scale: 1.0,
            last_frame_ms: None,
            frame_ms: config.frame_ms,
            max_dt: config.max_dt,
        }
    }

    /// Advance to the frame timestamp `frame_ms`
    pub fn advance(&mut self, frame_ms: f64, time_scale: f32) -> Step {
        let gap = match self.last_frame_ms {
            Some(last) => frame_ms - last,
            None => 0.0,
        };
        if frame_ms.is_finite() {
            self.last_frame_ms = Some(frame_ms);
        }
        self.advance_by(gap, time_scale)
    }

    /// Advance by an explicit gap in milliseconds
    pub fn advance_by(&mut self, gap_ms: f64, time_scale: f32) -> Step {
        let gap_ms = if gap_ms.is_finite() && gap_ms > 0.0 {
            gap_ms
        } else {
            0.0
        };
        let raw_dt = ((gap_ms / self.frame_ms) as f32).min(self.max_dt);
        let scale = if time_scale.is_finite() {
            time_scale.max(0.0)
        } else {
            1.0
        };
        let real_ms = raw_dt as f64 * self.frame_ms;

        self.time_scale = scale;
        self.dt = raw_dt * scale;
        self.elapsed_ms += real_ms;

        Step {
            dt: self.dt,
            raw_dt,
            real_ms,
        }
    }

    /// Record a frame timestamp without advancing time
    pub fn hold(&mut self, frame_ms: f64) {
        if frame_ms.is_finite() {
            self.last_frame_ms = Some(frame_ms);
        }
        self.dt = 0.0;
    }

    pub fn now(&self) -> f64 {
        self.elapsed_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{FRAME_MS, MAX_DT_UNITS};
    use proptest::prelude::*;

    fn clock() -> SimClock {
        SimClock::new(&ClockConfig::default())
    }

    #[test]
    fn test_first_frame_is_zero() {
        let mut clock = clock();
        let step = clock.advance(12_345.0, 1.0);
        assert_eq!(step.dt, 0.0);
        assert_eq!(clock.now(), 0.0);

        let step = clock.advance(12_345.0 + FRAME_MS, 1.0);
        assert!((step.dt - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_stall_is_clamped() {
        let mut clock = clock();
        clock.advance(0.0, 1.0);
        let step = clock.advance(10_000.0, 1.0);
        assert_eq!(step.raw_dt, MAX_DT_UNITS);
        assert!((clock.now() - MAX_DT_UNITS as f64 * FRAME_MS).abs() < 1e-6);
    }

    #[test]
    fn test_backwards_and_nan_produce_zero() {
        let mut clock = clock();
        clock.advance(1000.0, 1.0);
        assert_eq!(clock.advance(900.0, 1.0).dt, 0.0);
        assert_eq!(clock.advance(f64::NAN, 1.0).dt, 0.0);
        assert_eq!(clock.now(), 0.0);
    }

    #[test]
    fn test_slow_time_scales_world_only() {
        let mut clock = clock();
        clock.advance(0.0, 0.5);
        let step = clock.advance(FRAME_MS * 2.0, 0.5);
        assert!((step.raw_dt - 2.0).abs() < 1e-4);
        assert!((step.dt - 1.0).abs() < 1e-4);
        // Elapsed time is unscaled
        assert!((clock.now() - FRAME_MS * 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_hold_prevents_resume_spike() {
        let mut clock = clock();
        clock.advance(0.0, 1.0);
        for i in 1..=100 {
            clock.hold(i as f64 * 1000.0);
        }
        let step = clock.advance(100_000.0 + FRAME_MS, 1.0);
        assert!((step.dt - 1.0).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_dt_bounded(
            gaps in proptest::collection::vec(-1_000.0f64..100_000.0, 1..50),
            scale in 0.0f32..2.0,
        ) {
            let mut clock = clock();
            let mut t = 0.0;
            clock.advance(t, scale);
            let mut last_elapsed = clock.now();
            for gap in gaps {
                t += gap;
                let step = clock.advance(t, scale);
                prop_assert!(step.raw_dt >= 0.0 && step.raw_dt <= MAX_DT_UNITS);
                prop_assert!(step.dt >= 0.0 && step.dt <= MAX_DT_UNITS * scale + 1e-4);
                prop_assert!(clock.now() >= last_elapsed);
                last_elapsed = clock.now();
            }
        }
    }
}
