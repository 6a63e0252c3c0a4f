use std::time::{Duration, Instant};

const FALLBACK_MAX_FRAME: Duration = Duration::from_millis(250);

/// Ticks owed for one rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FrameBudget {
    pub(crate) raw_frame: Duration,
    pub(crate) ticks: u32,
    pub(crate) dropped: Duration,
}

/// Fixed-step pacing. Wall time accrues into a backlog that is paid out in
/// whole ticks, capped per frame; whatever the cap leaves over is dropped.
#[derive(Debug)]
pub(crate) struct FrameClock {
    step: Duration,
    max_frame: Duration,
    max_ticks: u32,
    backlog: Duration,
    last_frame: Instant,
}

impl FrameClock {
    pub(crate) fn new(ticks_per_second: u32, max_frame: Duration, max_ticks: u32) -> Self {
        Self::starting_at(Instant::now(), ticks_per_second, max_frame, max_ticks)
    }

    fn starting_at(
        now: Instant,
        ticks_per_second: u32,
        max_frame: Duration,
        max_ticks: u32,
    ) -> Self {
        Self {
            step: Duration::from_secs_f64(1.0 / f64::from(ticks_per_second.max(1))),
            max_frame: if max_frame.is_zero() {
                FALLBACK_MAX_FRAME
            } else {
                max_frame
            },
            max_ticks: max_ticks.max(1),
            backlog: Duration::ZERO,
            last_frame: now,
        }
    }

    pub(crate) fn step(&self) -> Duration {
        self.step
    }

    pub(crate) fn max_ticks(&self) -> u32 {
        self.max_ticks
    }

    pub(crate) fn begin_frame(&mut self, now: Instant) -> FrameBudget {
        let raw_frame = now.saturating_duration_since(self.last_frame);
        self.last_frame = now;
        self.backlog = self.backlog.saturating_add(raw_frame.min(self.max_frame));

        let owed = self.backlog.as_nanos() / self.step.as_nanos().max(1);
        let ticks = u32::try_from(owed).unwrap_or(u32::MAX).min(self.max_ticks);
        self.backlog = self.backlog.saturating_sub(self.step * ticks);

        let dropped = if self.backlog >= self.step {
            std::mem::take(&mut self.backlog)
        } else {
            Duration::ZERO
        };
        FrameBudget {
            raw_frame,
            ticks,
            dropped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_at(base: Instant, max_ticks: u32) -> FrameClock {
        FrameClock::starting_at(base, 50, Duration::from_millis(250), max_ticks)
    }

    #[test]
    fn leftover_time_carries_into_next_frame() {
        let base = Instant::now();
        let mut clock = clock_at(base, 5);

        let first = clock.begin_frame(base + Duration::from_millis(50));
        assert_eq!(first.ticks, 2);
        assert_eq!(first.dropped, Duration::ZERO);

        let second = clock.begin_frame(base + Duration::from_millis(60));
        assert_eq!(second.ticks, 1);
    }

    #[test]
    fn backlog_beyond_tick_cap_is_dropped() {
        let base = Instant::now();
        let mut clock = clock_at(base, 3);

        let budget = clock.begin_frame(base + Duration::from_millis(130));
        assert_eq!(budget.ticks, 3);
        assert_eq!(budget.dropped, Duration::from_millis(70));

        let next = clock.begin_frame(base + Duration::from_millis(135));
        assert_eq!(next.ticks, 0);
    }

    #[test]
    fn long_stall_is_clamped_before_paying_out() {
        let base = Instant::now();
        let mut clock = clock_at(base, 100);

        let budget = clock.begin_frame(base + Duration::from_secs(3));
        assert_eq!(budget.raw_frame, Duration::from_secs(3));
        assert_eq!(budget.ticks, 12);
        assert_eq!(budget.dropped, Duration::ZERO);
    }

    #[test]
    fn zero_settings_fall_back_to_sane_values() {
        let base = Instant::now();
        let clock = FrameClock::starting_at(base, 0, Duration::ZERO, 0);
        assert_eq!(clock.step(), Duration::from_secs(1));
        assert_eq!(clock.max_ticks(), 1);
        assert_eq!(clock.max_frame, FALLBACK_MAX_FRAME);
    }
}
