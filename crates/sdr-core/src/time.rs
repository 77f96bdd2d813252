//! Time-related types for the audio pipeline's media clock.

use serde::{Deserialize, Serialize};

/// Sample position in the timeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SamplePosition(pub u64);

impl SamplePosition {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub fn from_seconds(seconds: f64, sample_rate: f64) -> Self {
        Self((seconds * sample_rate) as u64)
    }

    #[inline]
    pub fn to_seconds(self, sample_rate: f64) -> f64 {
        self.0 as f64 / sample_rate
    }

    #[inline]
    pub fn advance(&mut self, samples: u64) {
        self.0 += samples;
    }
}

impl std::ops::Add<u64> for SamplePosition {
    type Output = Self;

    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl std::ops::Sub for SamplePosition {
    type Output = u64;

    fn sub(self, rhs: Self) -> Self::Output {
        self.0.saturating_sub(rhs.0)
    }
}

/// Time duration in samples
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SampleDuration(pub u64);

impl SampleDuration {
    pub const ZERO: Self = Self(0);

    #[inline]
    pub fn from_seconds(seconds: f64, sample_rate: f64) -> Self {
        Self((seconds * sample_rate) as u64)
    }

    #[inline]
    pub fn from_ms(ms: f64, sample_rate: f64) -> Self {
        Self::from_seconds(ms / 1000.0, sample_rate)
    }

    #[inline]
    pub fn to_seconds(self, sample_rate: f64) -> f64 {
        self.0 as f64 / sample_rate
    }

    #[inline]
    pub fn to_ms(self, sample_rate: f64) -> f64 {
        self.to_seconds(sample_rate) * 1000.0
    }
}

/// A point on the media clock, in fractional seconds since the session's
/// clock was started. The clock and graph assembler schedule entirely in
/// this unit so scheduling logic doesn't need to track any one frame's
/// sample rate directly.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct MediaTime(pub f64);

impl MediaTime {
    pub const ZERO: Self = Self(0.0);

    #[inline]
    pub fn seconds(self) -> f64 {
        self.0
    }

    #[inline]
    pub fn plus_seconds(self, seconds: f64) -> Self {
        Self(self.0 + seconds)
    }
}

impl std::ops::Sub for MediaTime {
    type Output = f64;

    fn sub(self, rhs: Self) -> f64 {
        self.0 - rhs.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_position_round_trips_through_seconds() {
        let pos = SamplePosition::from_seconds(1.5, 48_000.0);
        assert_eq!(pos.0, 72_000);
        assert!((pos.to_seconds(48_000.0) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn sample_duration_from_ms() {
        let dur = SampleDuration::from_ms(250.0, 48_000.0);
        assert_eq!(dur.0, 12_000);
        assert!((dur.to_ms(48_000.0) - 250.0).abs() < 1e-6);
    }

    #[test]
    fn media_time_advances_monotonically() {
        let t0 = MediaTime::ZERO;
        let t1 = t0.plus_seconds(0.02);
        assert!(t1 - t0 > 0.0);
    }
}
