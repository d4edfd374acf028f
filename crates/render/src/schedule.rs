//! Frame-rate independent timing: the fixed tick and the FPS counter.

use std::time::Duration;

/// Fixed update rate for discrete state changes.
pub const FIXED_TICK_HZ: u32 = 50;

/// Fires at most one fixed tick per frame.
///
/// Time accumulates between frames. When a frame finds more than one
/// interval elapsed, it consumes one tick and drops the rest, so a long
/// stall never causes a burst of catch-up ticks.
#[derive(Debug, Clone)]
pub struct FixedTicker {
    interval: Duration,
    since_last: Duration,
    ticks: u64,
    dropped: u64,
}

impl Default for FixedTicker {
    fn default() -> Self {
        Self::new(FIXED_TICK_HZ)
    }
}

impl FixedTicker {
    pub fn new(hz: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / hz.max(1),
            since_last: Duration::ZERO,
            ticks: 0,
            dropped: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Advance by one frame's elapsed time. Returns whether a tick fires.
    pub fn advance(&mut self, frame_time: Duration) -> bool {
        self.since_last += frame_time;
        if self.since_last < self.interval {
            return false;
        }
        let elapsed = self.since_last.as_nanos() / self.interval.as_nanos();
        let surplus = elapsed as u64 - 1;
        if surplus > 0 {
            self.dropped += surplus;
            tracing::debug!(surplus, total = self.dropped, "fixed ticks dropped");
        }
        self.since_last = Duration::from_nanos((self.since_last.as_nanos() % self.interval.as_nanos()) as u64);
        self.ticks += 1;
        true
    }

    /// Ticks fired so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks skipped because a frame took longer than one interval.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Counts frames over one-second windows.
#[derive(Debug, Clone, Default)]
pub struct FpsCounter {
    window: Duration,
    frames: u32,
    last: Option<u32>,
}

impl FpsCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame. Returns the frame count of a window that just
    /// completed.
    pub fn frame(&mut self, frame_time: Duration) -> Option<u32> {
        self.frames += 1;
        self.window += frame_time;
        if self.window < Duration::from_secs(1) {
            return None;
        }
        let fps = self.frames;
        self.frames = 0;
        self.window = Duration::ZERO;
        self.last = Some(fps);
        Some(fps)
    }

    /// Most recent completed measurement.
    pub fn last(&self) -> Option<u32> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn fifty_hertz_interval() {
        assert_eq!(FixedTicker::default().interval(), 20 * MS);
    }

    #[test]
    fn short_frames_accumulate_to_one_tick() {
        let mut ticker = FixedTicker::default();
        assert!(!ticker.advance(8 * MS));
        assert!(!ticker.advance(8 * MS));
        assert!(ticker.advance(8 * MS));
        assert_eq!(ticker.ticks(), 1);
        assert_eq!(ticker.dropped(), 0);
        // 4 ms carried over.
        assert!(!ticker.advance(15 * MS));
        assert!(ticker.advance(MS));
    }

    #[test]
    fn long_frame_fires_once_and_drops_surplus() {
        let mut ticker = FixedTicker::default();
        assert!(ticker.advance(105 * MS));
        assert_eq!(ticker.ticks(), 1);
        assert_eq!(ticker.dropped(), 4);
        // The remainder is kept, the dropped ticks are not replayed.
        assert!(!ticker.advance(10 * MS));
        assert!(ticker.advance(5 * MS));
        assert_eq!(ticker.ticks(), 2);
        assert_eq!(ticker.dropped(), 4);
    }

    #[test]
    fn fps_reports_once_per_second() {
        let mut fps = FpsCounter::new();
        for _ in 0..59 {
            assert_eq!(fps.frame(Duration::from_micros(16_667)), None);
        }
        assert_eq!(fps.frame(Duration::from_micros(16_667)), Some(60));
        assert_eq!(fps.last(), Some(60));
        assert_eq!(fps.frame(Duration::from_micros(16_667)), None);
    }
}
