use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LoopMetricsSnapshot {
    /// Accepted ticks per wall-clock second.
    pub fps: f32,
    /// Mean time spent updating and drawing one accepted tick.
    pub frame_time_ms: f32,
    /// Host callbacks per second, accepted or not.
    pub callbacks_per_second: f32,
}

#[derive(Debug)]
pub(crate) struct FpsCounter {
    interval_start: Instant,
    interval: Duration,
    ticks: u32,
    callbacks: u32,
    frame_time_sum: Duration,
}

impl FpsCounter {
    pub(crate) fn new(now: Instant, interval: Duration) -> Self {
        Self {
            interval_start: now,
            interval,
            ticks: 0,
            callbacks: 0,
            frame_time_sum: Duration::ZERO,
        }
    }

    pub(crate) fn record_callback(&mut self) {
        self.callbacks = self.callbacks.saturating_add(1);
    }

    pub(crate) fn record_tick(&mut self, frame_time: Duration) {
        self.ticks = self.ticks.saturating_add(1);
        self.frame_time_sum = self.frame_time_sum.saturating_add(frame_time);
    }

    pub(crate) fn maybe_snapshot(&mut self, now: Instant) -> Option<LoopMetricsSnapshot> {
        let elapsed = now.saturating_duration_since(self.interval_start);
        if elapsed < self.interval {
            return None;
        }

        let elapsed_seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let frame_time_ms = if self.ticks == 0 {
            0.0
        } else {
            (self.frame_time_sum.as_secs_f32() / self.ticks as f32) * 1000.0
        };

        let snapshot = LoopMetricsSnapshot {
            fps: self.ticks as f32 / elapsed_seconds,
            frame_time_ms,
            callbacks_per_second: self.callbacks as f32 / elapsed_seconds,
        };

        self.interval_start = now;
        self.ticks = 0;
        self.callbacks = 0;
        self.frame_time_sum = Duration::ZERO;

        Some(snapshot)
    }
}
