use std::time::{Duration, Instant};

/// Smoothing factor for the displayed frame time.
const SMOOTHING: f32 = 0.1;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Clamped time since the previous tick, in seconds.
    pub dt: f32,
    /// Milliseconds since the first tick. Feeds the `u_time` uniform.
    pub elapsed_ms: f32,
    pub frame_index: u64,
}

/// Per-loop frame clock.
///
/// Delta time is clamped so a stalled or minimised window does not produce
/// huge steps. Elapsed time is measured from the first tick, unclamped.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Option<Instant>,
    last: Option<Instant>,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
    smoothed_dt: f32,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            start: None,
            last: None,
            frame_index: 0,
            dt_min,
            dt_max,
            smoothed_dt: 0.0,
        }
    }

    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    /// Advances the clock to `now`.
    pub fn tick_at(&mut self, now: Instant) -> FrameTime {
        let start = *self.start.get_or_insert(now);
        let dt = match self.last {
            Some(last) => now
                .saturating_duration_since(last)
                .clamp(self.dt_min, self.dt_max),
            // First frame: nothing to measure yet.
            None => self.dt_min,
        };
        self.last = Some(now);

        let dt = dt.as_secs_f32();
        self.smoothed_dt = if self.frame_index == 0 {
            dt
        } else {
            self.smoothed_dt + (dt - self.smoothed_dt) * SMOOTHING
        };

        let ft = FrameTime {
            dt,
            elapsed_ms: now.saturating_duration_since(start).as_secs_f32() * 1000.0,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }

    /// Exponentially smoothed frame time in seconds.
    #[inline]
    pub fn smoothed_dt(&self) -> f32 {
        self.smoothed_dt
    }

    pub fn fps(&self) -> f32 {
        if self.smoothed_dt > 0.0 {
            1.0 / self.smoothed_dt
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn elapsed_counts_from_first_tick() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new();

        let first = clock.tick_at(t0);
        assert_eq!(first.frame_index, 0);
        assert_eq!(first.elapsed_ms, 0.0);

        let second = clock.tick_at(t0 + Duration::from_millis(16));
        assert_eq!(second.frame_index, 1);
        assert_abs_diff_eq!(second.elapsed_ms, 16.0, epsilon = 1e-3);
        assert_abs_diff_eq!(second.dt, 0.016, epsilon = 1e-6);
    }

    #[test]
    fn dt_is_clamped_but_elapsed_is_not() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new();
        clock.tick_at(t0);

        let stalled = clock.tick_at(t0 + Duration::from_secs(3));
        assert_abs_diff_eq!(stalled.dt, 0.25, epsilon = 1e-6);
        assert_abs_diff_eq!(stalled.elapsed_ms, 3000.0, epsilon = 1e-2);

        let tight = clock.tick_at(t0 + Duration::from_secs(3));
        assert_abs_diff_eq!(tight.dt, 0.0001, epsilon = 1e-7);
    }

    #[test]
    fn smoothing_converges_to_steady_rate() {
        let t0 = Instant::now();
        let mut clock = FrameClock::new();
        for i in 0..200 {
            clock.tick_at(t0 + Duration::from_millis(20 * i));
        }
        assert_abs_diff_eq!(clock.smoothed_dt(), 0.020, epsilon = 1e-4);
        assert_abs_diff_eq!(clock.fps(), 50.0, epsilon = 0.5);
    }
}
