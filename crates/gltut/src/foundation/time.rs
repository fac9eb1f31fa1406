//! Time management utilities

use std::time::Instant;

/// Where a [`FrameClock`] reads its time from
#[derive(Debug, Clone, Copy)]
enum ClockSource {
    /// Wall clock, measured from creation
    Realtime(Instant),
    /// Advanced explicitly by the caller
    Manual(f64),
}

/// Frame clock for tutorial scenes
///
/// The animated shaders take the elapsed time since program start as the
/// `time` uniform. A realtime clock reads the wall clock; a manual clock only
/// moves when [`FrameClock::advance`] is called, which keeps headless runs and
/// tests deterministic.
#[derive(Debug, Clone)]
pub struct FrameClock {
    source: ClockSource,
    last_elapsed: f64,
    delta_time: f32,
    frame_count: u64,
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::realtime()
    }
}

impl FrameClock {
    /// Create a clock that follows the wall clock
    #[must_use]
    pub fn realtime() -> Self {
        Self {
            source: ClockSource::Realtime(Instant::now()),
            last_elapsed: 0.0,
            delta_time: 0.0,
            frame_count: 0,
        }
    }

    /// Create a clock that starts at zero and only moves on [`advance`](Self::advance)
    #[must_use]
    pub fn manual() -> Self {
        Self {
            source: ClockSource::Manual(0.0),
            last_elapsed: 0.0,
            delta_time: 0.0,
            frame_count: 0,
        }
    }

    /// Move a manual clock forward by `seconds`. Ignored for realtime clocks.
    pub fn advance(&mut self, seconds: f64) {
        if let ClockSource::Manual(elapsed) = &mut self.source {
            *elapsed += seconds.max(0.0);
        }
    }

    /// Seconds elapsed since the clock started
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        match self.source {
            ClockSource::Realtime(start) => start.elapsed().as_secs_f64(),
            ClockSource::Manual(elapsed) => elapsed,
        }
    }

    /// Mark the start of a new frame and update the delta time
    pub fn tick(&mut self) {
        let now = self.elapsed();
        self.delta_time = (now - self.last_elapsed) as f32;
        self.last_elapsed = now;
        self.frame_count += 1;
    }

    /// Time between the last two ticks in seconds
    #[must_use]
    pub const fn delta_time(&self) -> f32 {
        self.delta_time
    }

    /// Number of ticks so far
    #[must_use]
    pub const fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Whether the clock is driven manually
    #[must_use]
    pub const fn is_manual(&self) -> bool {
        matches!(self.source, ClockSource::Manual(_))
    }
}
