//! Volume/Mute (§4.3): the tail-of-chain scalar gain. Zero when muted
//! regardless of the stored volume, so un-muting restores the prior level.

use sdr_core::Sample;

pub struct VolumeMute {
    volume: f64,
    muted: bool,
}

impl Default for VolumeMute {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
        }
    }
}

impl VolumeMute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    #[inline]
    pub fn gain(&self) -> f64 {
        if self.muted {
            0.0
        } else {
            self.volume
        }
    }

    #[inline]
    pub fn process(&mut self, input: Sample) -> Sample {
        input * self.gain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mute_overrides_volume() {
        let mut vm = VolumeMute::new();
        vm.set_volume(0.8);
        vm.set_muted(true);
        assert_eq!(vm.process(1.0), 0.0);
        vm.set_muted(false);
        assert!((vm.process(1.0) - 0.8).abs() < 1e-9);
    }

    #[test]
    fn volume_clamps_to_unit_range() {
        let mut vm = VolumeMute::new();
        vm.set_volume(2.0);
        assert_eq!(vm.gain(), 1.0);
        vm.set_volume(-1.0);
        assert_eq!(vm.gain(), 0.0);
    }
}
