//! Lock-free parameter types shared by every effect node.
//!
//! Every tunable knob on an effect (threshold, frequency, gain, ...) is
//! backed by an [`AtomicParam`]: the control plane writes it from the
//! session/UI thread, and the audio callback reads it each block. Single
//! writer, single reader, no lock, no torn reads (`f64` round-trips through
//! `AtomicU64` bit patterns).

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Parameter value (normalized 0.0-1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedValue(f64);

impl NormalizedValue {
    pub const ZERO: Self = Self(0.0);
    pub const ONE: Self = Self(1.0);
    pub const HALF: Self = Self(0.5);

    #[inline]
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 1.0))
    }

    #[inline]
    pub fn get(self) -> f64 {
        self.0
    }

    /// Map to a range
    #[inline]
    pub fn map(self, min: f64, max: f64) -> f64 {
        min + self.0 * (max - min)
    }

    /// Map logarithmically (for frequency, etc.)
    #[inline]
    pub fn map_log(self, min: f64, max: f64) -> f64 {
        let log_min = min.ln();
        let log_max = max.ln();
        (log_min + self.0 * (log_max - log_min)).exp()
    }

    /// Map exponentially (for volume, etc.)
    #[inline]
    pub fn map_exp(self, min: f64, max: f64, exponent: f64) -> f64 {
        min + self.0.powf(exponent) * (max - min)
    }
}

impl Default for NormalizedValue {
    fn default() -> Self {
        Self::HALF
    }
}

/// Atomic parameter for lock-free access
pub struct AtomicParam {
    bits: AtomicU64,
}

impl AtomicParam {
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
    }

    /// Smoothly transition to new value
    #[inline]
    pub fn smooth_set(&self, target: f64, smoothing: f64) {
        let current = self.get();
        let new_value = current + (target - current) * smoothing;
        self.set(new_value);
    }
}

impl Default for AtomicParam {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Parameter range specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub skew: ParamSkew,
}

impl ParamRange {
    pub fn linear(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            skew: ParamSkew::Linear,
        }
    }

    pub fn logarithmic(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            skew: ParamSkew::Logarithmic,
        }
    }

    /// Denormalize a 0-1 value to actual value
    pub fn denormalize(&self, normalized: f64) -> f64 {
        match self.skew {
            ParamSkew::Linear => self.min + normalized * (self.max - self.min),
            ParamSkew::Logarithmic => {
                let log_min = self.min.ln();
                let log_max = self.max.ln();
                (log_min + normalized * (log_max - log_min)).exp()
            }
            ParamSkew::Exponential(exp) => self.min + normalized.powf(exp) * (self.max - self.min),
        }
    }

    /// Normalize an actual value to 0-1
    pub fn normalize(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        match self.skew {
            ParamSkew::Linear => (clamped - self.min) / (self.max - self.min),
            ParamSkew::Logarithmic => {
                let log_min = self.min.ln();
                let log_max = self.max.ln();
                (clamped.ln() - log_min) / (log_max - log_min)
            }
            ParamSkew::Exponential(exp) => {
                ((clamped - self.min) / (self.max - self.min)).powf(1.0 / exp)
            }
        }
    }
}

/// Parameter skew type
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum ParamSkew {
    Linear,
    Logarithmic,
    Exponential(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atomic_param_round_trips() {
        let p = AtomicParam::new(0.25);
        assert!((p.get() - 0.25).abs() < 1e-12);
        p.set(0.75);
        assert!((p.get() - 0.75).abs() < 1e-12);
    }

    #[test]
    fn normalized_value_clamps() {
        assert_eq!(NormalizedValue::new(1.5).get(), 1.0);
        assert_eq!(NormalizedValue::new(-0.5).get(), 0.0);
    }

    #[test]
    fn param_range_normalize_denormalize_round_trips() {
        let range = ParamRange::logarithmic(100.0, 8000.0, 1000.0);
        let value = 1000.0;
        let n = range.normalize(value);
        let back = range.denormalize(n);
        assert!((back - value).abs() < 1e-6);
    }
}
