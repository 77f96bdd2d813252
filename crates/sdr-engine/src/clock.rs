//! Clock & Scheduler (C1): the monotonic media clock that schedules each
//! decoded [`AudioFrame`](sdr_core::AudioFrame) to play back-to-back,
//! recovering from underruns and sample-rate changes without audible clicks.

use sdr_core::{AudioFrame, DiagnosticEvent, MediaTime};

/// Priming offset before the very first frame starts (§4.1).
pub const DEFAULT_PRIMING_OFFSET_SECS: f64 = 0.200;
/// Fade-in duration applied to the first frame.
pub const DEFAULT_FADE_IN_SECS: f64 = 0.500;
/// Below this much buffer-ahead, an underrun reset fires.
pub const DEFAULT_CRITICAL_LOW_SECS: f64 = 0.050;
/// Duration of the underrun fade-out/fade-in.
pub const DEFAULT_RESET_FADE_SECS: f64 = 0.010;
/// Extra padding added to the clock after an underrun reset.
pub const DEFAULT_BUFFER_PAD_SECS: f64 = 0.050;
/// Number of frames scheduled before underrun recovery starts watching.
const UNDERRUN_GRACE_FRAMES: u32 = 3;

/// One decision returned by [`Clock::schedule`]: when a frame should start,
/// and what fade envelope (if any) must be applied to avoid a click.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleDecision {
    pub start_time: MediaTime,
    pub fade: Option<FadeEnvelope>,
    pub diagnostic: Option<DiagnosticKind>,
}

/// A linear fade the audio task must apply starting at `start_time`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FadeEnvelope {
    pub from_gain: f64,
    pub to_gain: f64,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Underrun,
}

impl DiagnosticKind {
    pub fn into_event(self) -> DiagnosticEvent {
        match self {
            DiagnosticKind::Underrun => DiagnosticEvent::Underrun,
        }
    }
}

/// Exclusively owned by the clock/scheduler; mirrors §3's `ClockState`.
#[derive(Debug, Clone, Copy)]
struct ClockState {
    next_play_time: MediaTime,
    last_buffer_count: u32,
    start_reference_time: MediaTime,
    /// Set by an underrun reset; consumed by the next `schedule` call to
    /// deliver the fade-in half of the reset's fade-out-then-fade-in.
    pending_fade_in: bool,
}

/// The media clock. One per active playback sink; torn down and rebuilt on
/// sample-rate change (§4.1).
pub struct Clock {
    state: Option<ClockState>,
    sample_rate: u32,
    priming_offset_secs: f64,
    fade_in_secs: f64,
    critical_low_secs: f64,
    reset_fade_secs: f64,
    buffer_pad_secs: f64,
}

impl Clock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            state: None,
            sample_rate,
            priming_offset_secs: DEFAULT_PRIMING_OFFSET_SECS,
            fade_in_secs: DEFAULT_FADE_IN_SECS,
            critical_low_secs: DEFAULT_CRITICAL_LOW_SECS,
            reset_fade_secs: DEFAULT_RESET_FADE_SECS,
            buffer_pad_secs: DEFAULT_BUFFER_PAD_SECS,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Tear down and reinitialise the clock for a new sample rate. The next
    /// scheduled frame goes through the first-frame fade-in policy again.
    pub fn reset_for_sample_rate(&mut self, sample_rate: u32) {
        self.sample_rate = sample_rate;
        self.state = None;
    }

    /// Schedule one decoded frame against the current media-clock time.
    /// `current_time` is the audio task's notion of "now" on the media
    /// clock (monotonic, non-decreasing between calls).
    pub fn schedule(&mut self, frame: &AudioFrame, current_time: MediaTime) -> ScheduleDecision {
        let duration = frame.duration_secs();

        let Some(state) = &mut self.state else {
            let start_time = current_time.plus_seconds(self.priming_offset_secs);
            self.state = Some(ClockState {
                next_play_time: start_time.plus_seconds(duration),
                last_buffer_count: 1,
                start_reference_time: current_time,
                pending_fade_in: false,
            });
            return ScheduleDecision {
                start_time,
                fade: Some(FadeEnvelope {
                    from_gain: 0.0,
                    to_gain: 1.0,
                    duration_secs: self.fade_in_secs,
                }),
                diagnostic: None,
            };
        };

        state.last_buffer_count += 1;
        let start_time = state.next_play_time;

        let buffer_ahead = state.next_play_time - current_time;
        let past_grace = state.last_buffer_count > UNDERRUN_GRACE_FRAMES;
        let underrun = past_grace && (buffer_ahead < 0.0 || buffer_ahead < self.critical_low_secs);

        if underrun {
            let reset_start = current_time;
            state.next_play_time =
                reset_start.plus_seconds(self.reset_fade_secs + self.buffer_pad_secs);
            state.pending_fade_in = true;
            return ScheduleDecision {
                start_time: reset_start,
                fade: Some(FadeEnvelope {
                    from_gain: 1.0,
                    to_gain: 0.0,
                    duration_secs: self.reset_fade_secs,
                }),
                diagnostic: Some(DiagnosticKind::Underrun),
            };
        }

        // The frame immediately after a reset carries the fade-in half of
        // §4.1's "brief fade-out-then-fade-in of resetFade" (the fade-out
        // happened on the frame that triggered the underrun, above).
        let fade = if state.pending_fade_in {
            state.pending_fade_in = false;
            Some(FadeEnvelope {
                from_gain: 0.0,
                to_gain: 1.0,
                duration_secs: self.reset_fade_secs,
            })
        } else {
            None
        };

        state.next_play_time = state.next_play_time.plus_seconds(duration);
        ScheduleDecision {
            start_time,
            fade,
            diagnostic: None,
        }
    }

    /// Current buffer-ahead, for UI display. `None` before the first frame.
    pub fn buffer_ahead_secs(&self, current_time: MediaTime) -> Option<f64> {
        self.state.map(|s| s.next_play_time - current_time)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdr_core::PcmDecoder;

    fn frame(sample_rate: u32, n_samples: usize) -> AudioFrame {
        let mut dec = PcmDecoder::new();
        let bytes = vec![0u8; n_samples * 2];
        dec.decode(&bytes, sample_rate).unwrap()
    }

    #[test]
    fn first_frame_primes_and_fades_in() {
        let mut clock = Clock::new(12000);
        let f = frame(12000, 1200); // 0.1s
        let decision = clock.schedule(&f, MediaTime::ZERO);
        assert!((decision.start_time.seconds() - 0.2).abs() < 1e-9);
        let fade = decision.fade.unwrap();
        assert_eq!(fade.from_gain, 0.0);
        assert_eq!(fade.to_gain, 1.0);
        assert!((fade.duration_secs - 0.5).abs() < 1e-9);
    }

    #[test]
    fn subsequent_frames_stack_back_to_back() {
        let mut clock = Clock::new(12000);
        let f = frame(12000, 1200); // 0.1s
        let d0 = clock.schedule(&f, MediaTime::ZERO);
        let d1 = clock.schedule(&f, MediaTime(0.05));
        assert!((d1.start_time.seconds() - (d0.start_time.seconds() + 0.1)).abs() < 1e-9);
        assert!(d1.diagnostic.is_none());
    }

    #[test]
    fn scenario_s4_underrun_recovery() {
        let mut clock = Clock::new(12000);
        let f = frame(12000, 1200); // 0.1s

        // Scheduled at t=0 (priming 0.2s), then 3 grace frames pass so the
        // underrun watchdog is armed for the 5th call.
        clock.schedule(&f, MediaTime(0.0));
        clock.schedule(&f, MediaTime(0.0));
        clock.schedule(&f, MediaTime(0.0));
        clock.schedule(&f, MediaTime(0.0));

        // Starved: feed a frame very late, well past next_play_time.
        let decision = clock.schedule(&f, MediaTime(10.0));
        assert!(decision.diagnostic.is_some());
        let fade = decision.fade.unwrap();
        assert!((fade.duration_secs - 0.01).abs() < 1e-9);
        assert_eq!(fade.from_gain, 1.0);
        assert_eq!(fade.to_gain, 0.0);
        assert!((decision.start_time.seconds() - 10.0).abs() < 1e-9);

        // next_play_time should now be 10 + 0.01 + 0.05
        let ahead = clock.buffer_ahead_secs(MediaTime(10.0)).unwrap();
        assert!((ahead - 0.06).abs() < 1e-9);

        // The next frame, arriving on schedule (well ahead of the 10.06
        // next_play_time so it isn't itself treated as an underrun),
        // carries the fade-in half of the reset, ramping back to volume.
        let fade_in_decision = clock.schedule(&f, MediaTime(10.0));
        assert!(fade_in_decision.diagnostic.is_none());
        let fade_in = fade_in_decision.fade.unwrap();
        assert_eq!(fade_in.from_gain, 0.0);
        assert_eq!(fade_in.to_gain, 1.0);
        assert!((fade_in.duration_secs - 0.01).abs() < 1e-9);

        // A further frame after that has no fade attached.
        let settled = clock.schedule(&f, MediaTime(10.1));
        assert!(settled.fade.is_none());
    }

    #[test]
    fn reset_for_sample_rate_rearms_first_frame_policy() {
        let mut clock = Clock::new(12000);
        let f = frame(12000, 1200);
        clock.schedule(&f, MediaTime::ZERO);
        clock.reset_for_sample_rate(24000);
        let f2 = frame(24000, 2400);
        let decision = clock.schedule(&f2, MediaTime(1.0));
        assert!(decision.fade.is_some());
        assert!((decision.start_time.seconds() - 1.2).abs() < 1e-9);
    }
}
