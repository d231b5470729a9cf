use std::time::Duration;

use super::Parity;

/// Lifecycle of the frame loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    /// No frame callback has run yet.
    Idle,
    /// Steady loop; `last_advanced` is the timestamp of the last advanced frame.
    Rendering { last_advanced: Duration },
}

/// A frame the scheduler decided to advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStep {
    /// Number of frames advanced before this one.
    pub step: u64,
    pub parity: Parity,
}

/// Decides, once per display refresh, whether the simulation advances.
///
/// The host calls [`FrameScheduler::advance_frame`] on every refresh tick and
/// re-arms itself regardless of the result. The scheduler only owns timing and
/// the step counter; recording and submitting commands happens elsewhere.
#[derive(Clone, Debug)]
pub struct FrameScheduler {
    state: SchedulerState,
    /// `None` advances on every callback.
    interval: Option<Duration>,
    steps: u64,
}

impl FrameScheduler {
    pub fn throttled(interval: Duration) -> Self {
        Self {
            state: SchedulerState::Idle,
            interval: Some(interval),
            steps: 0,
        }
    }

    pub fn unthrottled() -> Self {
        Self {
            state: SchedulerState::Idle,
            interval: None,
            steps: 0,
        }
    }

    /// Returns the frame to record if `now` is due, committing the timestamp
    /// and bumping the step counter.
    ///
    /// Elapsed time is measured from the last advanced frame, not the last
    /// callback, so skipped callbacks do not push the next generation back.
    pub fn advance_frame(&mut self, now: Duration) -> Option<FrameStep> {
        let due = match (self.state, self.interval) {
            (SchedulerState::Idle, _) | (_, None) => true,
            (SchedulerState::Rendering { last_advanced }, Some(interval)) => {
                now.saturating_sub(last_advanced) >= interval
            }
        };
        if !due {
            return None;
        }

        self.state = SchedulerState::Rendering { last_advanced: now };
        let frame = FrameStep {
            step: self.steps,
            parity: Parity::of_step(self.steps),
        };
        self.steps += 1;
        Some(frame)
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Frames advanced so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Parity the next advanced frame will use.
    pub fn next_parity(&self) -> Parity {
        Parity::of_step(self.steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn first_callback_always_advances() {
        let mut s = FrameScheduler::throttled(ms(100));
        assert_eq!(s.state(), SchedulerState::Idle);
        let frame = s.advance_frame(ms(0)).expect("first frame advances");
        assert_eq!(frame.step, 0);
        assert_eq!(frame.parity, Parity::Even);
        assert_eq!(
            s.state(),
            SchedulerState::Rendering {
                last_advanced: ms(0)
            }
        );
    }

    #[test]
    fn throttle_measures_from_last_advanced_frame() {
        let mut s = FrameScheduler::throttled(ms(100));
        assert!(s.advance_frame(ms(5)).is_some());
        assert!(s.advance_frame(ms(21)).is_none());
        assert!(s.advance_frame(ms(88)).is_none());
        assert!(s.advance_frame(ms(104)).is_none());
        assert!(s.advance_frame(ms(105)).is_some());
        assert!(s.advance_frame(ms(204)).is_none());
        assert_eq!(s.steps(), 2);
    }

    #[test]
    fn advanced_count_matches_gap_rule() {
        let threshold = ms(100);
        let stamps: Vec<Duration> = (0..500u64).map(|i| ms(i * 17 + i % 5)).collect();

        let mut expected = 0;
        let mut last: Option<Duration> = None;
        for &t in &stamps {
            match last {
                None => {
                    expected += 1;
                    last = Some(t);
                }
                Some(l) if t - l >= threshold => {
                    expected += 1;
                    last = Some(t);
                }
                Some(_) => {}
            }
        }

        let mut s = FrameScheduler::throttled(threshold);
        let advanced = stamps
            .iter()
            .filter(|&&t| s.advance_frame(t).is_some())
            .count();
        assert_eq!(advanced, expected);
        assert_eq!(s.steps(), expected as u64);
    }

    #[test]
    fn parity_follows_step_count() {
        let mut s = FrameScheduler::throttled(ms(100));
        let frames: Vec<FrameStep> = (0..20u64)
            .filter_map(|i| s.advance_frame(ms(i * 100)))
            .collect();
        assert_eq!(frames.len(), 20);
        for (n, frame) in frames.iter().enumerate() {
            assert_eq!(frame.step, n as u64);
            assert_eq!(frame.parity, Parity::of_step(n as u64));
        }
        for w in frames.windows(2) {
            assert_ne!(w[0].parity, w[1].parity);
        }
        assert_eq!(s.next_parity(), Parity::Even);
    }

    #[test]
    fn unthrottled_advances_every_callback() {
        let mut s = FrameScheduler::unthrottled();
        for t in [0, 0, 1, 1, 2] {
            assert!(s.advance_frame(ms(t)).is_some());
        }
        assert_eq!(s.steps(), 5);
    }

    #[test]
    fn clock_going_backwards_does_not_advance() {
        let mut s = FrameScheduler::throttled(ms(100));
        assert!(s.advance_frame(ms(1000)).is_some());
        assert!(s.advance_frame(ms(10)).is_none());
    }
}
