//! # Frame Pacer
//!
//! Fixed-rate loop controller for the client's UI-affine thread.
//!
//! The loop drains the session, applies render ops and prints, then sleeps
//! until the next frame is due. Frames that run late are counted, never
//! made up: a client that stalls for a second does one catch-up frame,
//! not thirty.

use std::time::{Duration, Instant};

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStats {
    /// Shortest frame observed, in microseconds.
    pub min_frame_us: u64,
    /// Longest frame observed, in microseconds.
    pub max_frame_us: u64,
    /// Rolling average, in microseconds.
    pub avg_frame_us: u64,
    /// Frames that overran their budget.
    pub late_frames: u64,
    /// Frames measured.
    pub total_frames: u64,
}

impl FrameStats {
    fn fresh(budget: Duration) -> Self {
        Self {
            min_frame_us: u64::MAX,
            max_frame_us: 0,
            avg_frame_us: budget.as_micros() as u64,
            late_frames: 0,
            total_frames: 0,
        }
    }
}

/// Fixed-rate frame controller.
#[derive(Debug)]
pub struct FramePacer {
    frame_duration: Duration,
    last_frame: Instant,
    frame_count: u64,
    stats: FrameStats,
}

impl FramePacer {
    /// Pacer for `rate` frames per second. A rate of zero is treated as one.
    #[must_use]
    pub fn new(rate: u32) -> Self {
        let frame_duration = Duration::from_micros(1_000_000 / u64::from(rate.max(1)));
        Self {
            frame_duration,
            last_frame: Instant::now(),
            frame_count: 0,
            stats: FrameStats::fresh(frame_duration),
        }
    }

    /// True once a full frame period has passed since the last frame began.
    #[must_use]
    pub fn should_run(&self) -> bool {
        self.last_frame.elapsed() >= self.frame_duration
    }

    /// Marks the start of a frame and returns its start time.
    #[must_use]
    pub fn begin_frame(&mut self) -> Instant {
        let now = Instant::now();
        self.last_frame = now;
        self.frame_count += 1;
        now
    }

    /// Marks the end of a frame started at `start`.
    pub fn end_frame(&mut self, start: Instant) {
        let duration = start.elapsed();
        let us = duration.as_micros() as u64;

        self.stats.total_frames += 1;
        self.stats.min_frame_us = self.stats.min_frame_us.min(us);
        self.stats.max_frame_us = self.stats.max_frame_us.max(us);
        self.stats.avg_frame_us = (self.stats.avg_frame_us * 15 + us) / 16;

        if duration > self.frame_duration {
            self.stats.late_frames += 1;
            tracing::trace!(frame = self.frame_count, us, "late frame");
        }
    }

    /// Sleeps until the next frame is due. Returns at once if it already is.
    pub fn wait_for_next_frame(&self) {
        let elapsed = self.last_frame.elapsed();
        if elapsed < self.frame_duration {
            std::thread::sleep(self.frame_duration - elapsed);
        }
    }

    /// Frames begun so far.
    #[inline]
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Timing statistics.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &FrameStats {
        &self.stats
    }

    /// Target frame period.
    #[inline]
    #[must_use]
    pub const fn frame_duration(&self) -> Duration {
        self.frame_duration
    }

    /// Clears statistics.
    pub fn reset_stats(&mut self) {
        self.stats = FrameStats::fresh(self.frame_duration);
    }
}

impl Default for FramePacer {
    fn default() -> Self {
        Self::new(crate::FRAME_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pacer_creation() {
        let pacer = FramePacer::default();
        assert_eq!(pacer.frame_count(), 0);
        assert_eq!(pacer.frame_duration(), Duration::from_micros(33_333));
        assert_eq!(FramePacer::new(0).frame_duration(), Duration::from_secs(1));
    }

    #[test]
    fn test_frame_execution() {
        let mut pacer = FramePacer::new(1000);
        std::thread::sleep(Duration::from_millis(3));
        assert!(pacer.should_run());

        let start = pacer.begin_frame();
        assert!(!pacer.should_run());
        pacer.end_frame(start);

        assert_eq!(pacer.frame_count(), 1);
        assert_eq!(pacer.stats().total_frames, 1);
    }

    #[test]
    fn test_wait_reaches_next_frame() {
        let mut pacer = FramePacer::new(200);
        let start = pacer.begin_frame();
        pacer.end_frame(start);
        pacer.wait_for_next_frame();
        assert!(pacer.should_run());
    }

    #[test]
    fn test_late_frame_counted() {
        let mut pacer = FramePacer::new(1000);
        let start = pacer.begin_frame();
        std::thread::sleep(Duration::from_millis(3));
        pacer.end_frame(start);
        assert_eq!(pacer.stats().late_frames, 1);

        pacer.reset_stats();
        assert_eq!(pacer.stats().late_frames, 0);
        assert_eq!(pacer.stats().min_frame_us, u64::MAX);
    }
}
