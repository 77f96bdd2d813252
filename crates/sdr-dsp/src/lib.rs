//! sdr-dsp: the client-side effect chain for the tuned-audio pipeline.
//!
//! ## Effect nodes (§4.3)
//! - `eq` - 12-band peaking EQ with voice/CW presets
//! - `bandpass` - cascaded bandpass with automatic/manual Q
//! - `notch` - up to 5 independent 6-stage notches
//! - `dynamics` - soft-knee compressor with makeup gain
//! - `spectral` - FFT overlap-add noise reduction
//! - `squelch` - RMS level-gated ramp
//! - `stereo` - stereo virtualiser
//! - `gain` - volume/mute
//! - `effect` - the closed-set dispatch tying the above into one chain
//!
//! ## Shared building blocks
//! - `biquad` - TDF-II biquad filter, used by `eq`/`bandpass`/`notch`
//! - `delay` - mono delay line, used by `stereo`
//! - `clip` - the post-effect clip tap (§7's Clip error kind)
//!
//! ## Analysis and metering (C5, C10)
//! - `analysis` - tuned spectrum/VU FFT taps and oscilloscope buffer
//! - `metering` - dBFS/SNR signal meter

pub mod analysis;
pub mod bandpass;
pub mod biquad;
pub mod clip;
pub mod delay;
pub mod dynamics;
pub mod effect;
pub mod eq;
pub mod gain;
pub mod metering;
pub mod notch;
pub mod spectral;
pub mod squelch;
pub mod stereo;

pub use analysis::{FftTap, Oscilloscope};
pub use bandpass::Bandpass;
pub use biquad::{BiquadCascade, BiquadCoeffs, BiquadTdf2, FilterType};
pub use clip::ClipTap;
pub use delay::Delay;
pub use dynamics::Compressor;
pub use effect::{EffectNode, ParamValue, StereoNode};
pub use eq::{EqPreset, PeakingEq};
pub use gain::VolumeMute;
pub use metering::{MeterColor, MeterMode, SignalMeter};
pub use notch::{Notch, NotchSet};
pub use spectral::NoiseReduction;
pub use squelch::{GateState, Squelch};
pub use stereo::StereoVirtualiser;
