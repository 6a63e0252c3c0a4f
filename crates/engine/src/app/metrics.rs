use std::time::{Duration, Instant};

use super::clock::FrameBudget;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct LoopReport {
    pub(crate) fps: f32,
    pub(crate) tps: f32,
    pub(crate) mean_frame_ms: f32,
    pub(crate) worst_frame_ms: f32,
    pub(crate) dropped_ms: f32,
}

/// Aggregates frame budgets into one report per interval.
#[derive(Debug)]
pub(crate) struct LoopMetrics {
    window_start: Instant,
    interval: Duration,
    frames: u32,
    ticks: u32,
    frame_total: Duration,
    worst_frame: Duration,
    dropped: Duration,
}

impl LoopMetrics {
    pub(crate) fn new(interval: Duration) -> Self {
        let interval = if interval.is_zero() {
            Duration::from_secs(1)
        } else {
            interval
        };
        Self::window_at(Instant::now(), interval)
    }

    fn window_at(window_start: Instant, interval: Duration) -> Self {
        Self {
            window_start,
            interval,
            frames: 0,
            ticks: 0,
            frame_total: Duration::ZERO,
            worst_frame: Duration::ZERO,
            dropped: Duration::ZERO,
        }
    }

    /// `ticks_run` can fall short of the budget when a tick ends the session.
    pub(crate) fn record(&mut self, budget: &FrameBudget, ticks_run: u32) {
        self.frames = self.frames.saturating_add(1);
        self.ticks = self.ticks.saturating_add(ticks_run);
        self.frame_total = self.frame_total.saturating_add(budget.raw_frame);
        self.worst_frame = self.worst_frame.max(budget.raw_frame);
        self.dropped = self.dropped.saturating_add(budget.dropped);
    }

    pub(crate) fn report_due(&mut self, now: Instant) -> Option<LoopReport> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < self.interval {
            return None;
        }
        let seconds = elapsed.as_secs_f32().max(f32::EPSILON);
        let mean_frame_ms = match self.frames {
            0 => 0.0,
            frames => millis(self.frame_total) / frames as f32,
        };
        let report = LoopReport {
            fps: self.frames as f32 / seconds,
            tps: self.ticks as f32 / seconds,
            mean_frame_ms,
            worst_frame_ms: millis(self.worst_frame),
            dropped_ms: millis(self.dropped),
        };
        *self = Self::window_at(now, self.interval);
        Some(report)
    }
}

fn millis(duration: Duration) -> f32 {
    duration.as_secs_f32() * 1000.0
}
