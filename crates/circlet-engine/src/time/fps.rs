use std::time::{Duration, Instant};

/// Frames-per-second counter.
///
/// Counts presented frames and reports the count once at least `window` has
/// elapsed, then starts a new window.
#[derive(Debug, Clone)]
pub struct FpsCounter {
    window: Duration,
    started: Option<Instant>,
    frames: u32,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::with_window(Duration::from_secs(1))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            started: None,
            frames: 0,
        }
    }

    /// Records one frame presented at `now`.
    ///
    /// Returns frames per second when a measurement window closes.
    pub fn frame(&mut self, now: Instant) -> Option<f32> {
        let started = *self.started.get_or_insert(now);
        self.frames += 1;

        let elapsed = now.saturating_duration_since(started);
        if elapsed < self.window {
            return None;
        }

        let fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.started = Some(now);
        Some(fps)
    }
}

impl Default for FpsCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_window() {
        let mut fps = FpsCounter::new();
        let t0 = Instant::now();
        let step = Duration::from_millis(10);

        let mut reports = Vec::new();
        for i in 0..=100u32 {
            if let Some(v) = fps.frame(t0 + step * i) {
                reports.push(v);
            }
        }

        // Frame 0 opens the window at t0; frame 100 lands on t0 + 1s.
        assert_eq!(reports.len(), 1);
        assert!((reports[0] - 101.0).abs() < 1e-3);
    }

    #[test]
    fn nothing_before_the_first_window_closes() {
        let mut fps = FpsCounter::with_window(Duration::from_secs(2));
        let t0 = Instant::now();
        assert_eq!(fps.frame(t0), None);
        assert_eq!(fps.frame(t0 + Duration::from_secs(1)), None);
        assert!(fps.frame(t0 + Duration::from_secs(2)).is_some());
    }
}
