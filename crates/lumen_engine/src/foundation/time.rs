//! Frame timing

use std::time::{Duration, Instant};

/// Measures how long each frame takes to render.
///
/// The engine brackets every frame with [`FrameTimer::begin_frame`] and
/// [`FrameTimer::end_frame`]; the accumulated statistics are logged when the
/// render loop finishes.
#[derive(Debug, Default)]
pub struct FrameTimer {
    frame_start: Option<Instant>,
    last_frame: Duration,
    total: Duration,
    frame_count: u64,
}

impl FrameTimer {
    /// Create a timer with no recorded frames
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the start of a frame
    pub fn begin_frame(&mut self) {
        self.frame_start = Some(Instant::now());
    }

    /// Mark the end of the current frame and return its duration.
    ///
    /// Without a matching `begin_frame` this records nothing and returns zero.
    pub fn end_frame(&mut self) -> Duration {
        let Some(start) = self.frame_start.take() else {
            return Duration::ZERO;
        };
        self.record(start.elapsed())
    }

    fn record(&mut self, elapsed: Duration) -> Duration {
        self.last_frame = elapsed;
        self.total += elapsed;
        self.frame_count += 1;
        elapsed
    }

    /// Duration of the most recently completed frame
    pub fn last_frame_time(&self) -> Duration {
        self.last_frame
    }

    /// Number of completed frames
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Mean frame duration, zero before the first frame
    pub fn average_frame_time(&self) -> Duration {
        match u32::try_from(self.frame_count) {
            Ok(0) => Duration::ZERO,
            Ok(count) => self.total / count,
            Err(_) => Duration::from_secs_f64(self.total.as_secs_f64() / self.frame_count as f64),
        }
    }

    /// Frames per second derived from the mean frame duration
    pub fn average_fps(&self) -> f32 {
        let average = self.average_frame_time().as_secs_f32();
        if average > 0.0 {
            1.0 / average
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_without_begin_records_nothing() {
        let mut timer = FrameTimer::new();
        assert_eq!(timer.end_frame(), Duration::ZERO);
        assert_eq!(timer.frame_count(), 0);
        assert_eq!(timer.average_fps(), 0.0);
    }

    #[test]
    fn test_average_over_recorded_frames() {
        let mut timer = FrameTimer::new();
        timer.record(Duration::from_millis(10));
        timer.record(Duration::from_millis(30));

        assert_eq!(timer.frame_count(), 2);
        assert_eq!(timer.last_frame_time(), Duration::from_millis(30));
        assert_eq!(timer.average_frame_time(), Duration::from_millis(20));
        assert!((timer.average_fps() - 50.0).abs() < 0.01);
    }

    #[test]
    fn test_begin_end_counts_frame() {
        let mut timer = FrameTimer::new();
        timer.begin_frame();
        timer.end_frame();
        assert_eq!(timer.frame_count(), 1);
    }
}
