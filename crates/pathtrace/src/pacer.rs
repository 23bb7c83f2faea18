use std::time::{Duration, Instant};

/// Fixed-rate redraw gate for the event loop.
///
/// The loop asks `ready_for_frame` when it is about to wait, requests a redraw
/// when it returns true and otherwise sleeps until `next_deadline`.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Duration,
    last_frame: Option<Instant>,
}

impl FramePacer {
    pub fn new(target_fps: f32) -> Self {
        let fps = if target_fps.is_finite() && target_fps > 0.0 {
            target_fps
        } else {
            1.0
        };
        Self {
            interval: Duration::from_secs_f32(1.0 / fps),
            last_frame: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match self.last_frame {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.last_frame.map(|last| last + self.interval)
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }
}

/// Rolling counters behind the once-per-second render stats line.
#[derive(Debug, Clone)]
pub struct RenderStats {
    window_start: Instant,
    presented: u32,
    skipped: u32,
}

/// Snapshot emitted when a stats window closes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsReport {
    pub fps: f32,
    pub skipped: u32,
}

impl RenderStats {
    const WINDOW: Duration = Duration::from_secs(1);

    pub fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            presented: 0,
            skipped: 0,
        }
    }

    pub fn record(&mut self, presented: bool) {
        if presented {
            self.presented += 1;
        } else {
            self.skipped += 1;
        }
    }

    /// Closes the current window once a second has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<StatsReport> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Self::WINDOW {
            return None;
        }
        let report = StatsReport {
            fps: self.presented as f32 / elapsed.as_secs_f32(),
            skipped: self.skipped,
        };
        *self = Self::new(now);
        Some(report)
    }
}
