//! Lock-free ring buffers carrying audio and metering data between the
//! real-time audio thread and the UI-facing threads (decode/engine,
//! visualisation). The audio thread must never block: every operation
//! here is wait-free.

use std::sync::atomic::{AtomicUsize, Ordering};

use sdr_core::Sample;

// ═══════════════════════════════════════════════════════════════════════════════
// SPSC AUDIO RING BUFFER
// ═══════════════════════════════════════════════════════════════════════════════

/// Single-producer single-consumer ring buffer for audio samples.
#[repr(align(64))]
pub struct AudioRingBuffer {
    buffer: Box<[Sample]>,
    capacity: usize,
    mask: usize,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
}

impl AudioRingBuffer {
    pub fn new(min_capacity: usize) -> Self {
        let capacity = min_capacity.next_power_of_two();
        let buffer = vec![0.0; capacity].into_boxed_slice();

        Self {
            buffer,
            capacity,
            mask: capacity - 1,
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
        }
    }

    #[inline]
    pub fn available_write(&self) -> usize {
        let write = self.write_pos.load(Ordering::Relaxed);
        let read = self.read_pos.load(Ordering::Acquire);
        self.capacity - (write.wrapping_sub(read))
    }

    #[inline]
    pub fn available_read(&self) -> usize {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Relaxed);
        write.wrapping_sub(read)
    }

    /// Push samples (producer side). Returns the number actually written.
    #[inline]
    pub fn push(&self, samples: &[Sample]) -> usize {
        let available = self.available_write();
        let to_write = samples.len().min(available);
        if to_write == 0 {
            return 0;
        }

        let write = self.write_pos.load(Ordering::Relaxed);
        for (i, &sample) in samples[..to_write].iter().enumerate() {
            let idx = (write + i) & self.mask;
            // SAFETY: single producer, idx always in bounds.
            unsafe {
                let ptr = self.buffer.as_ptr() as *mut Sample;
                ptr.add(idx).write(sample);
            }
        }
        self.write_pos
            .store(write.wrapping_add(to_write), Ordering::Release);
        to_write
    }

    /// Pop samples (consumer side). Returns the number actually read.
    #[inline]
    pub fn pop(&self, output: &mut [Sample]) -> usize {
        let available = self.available_read();
        let to_read = output.len().min(available);
        if to_read == 0 {
            return 0;
        }

        let read = self.read_pos.load(Ordering::Relaxed);
        for (i, sample) in output[..to_read].iter_mut().enumerate() {
            let idx = (read + i) & self.mask;
            *sample = self.buffer[idx];
        }
        self.read_pos
            .store(read.wrapping_add(to_read), Ordering::Release);
        to_read
    }

    pub fn clear(&self) {
        let write = self.write_pos.load(Ordering::Relaxed);
        self.read_pos.store(write, Ordering::Release);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.available_read() == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.available_write() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// STEREO AUDIO RING BUFFER
// ═══════════════════════════════════════════════════════════════════════════════

/// Stereo ring buffer (independent L/R channels), used when the stereo
/// virtualiser is engaged and the sink opens a 2-channel stream.
pub struct StereoRingBuffer {
    left: AudioRingBuffer,
    right: AudioRingBuffer,
}

impl StereoRingBuffer {
    pub fn new(min_capacity: usize) -> Self {
        Self {
            left: AudioRingBuffer::new(min_capacity),
            right: AudioRingBuffer::new(min_capacity),
        }
    }

    pub fn push_stereo(&self, left: &[Sample], right: &[Sample]) -> usize {
        let len = left.len().min(right.len());
        let written_l = self.left.push(&left[..len]);
        let written_r = self.right.push(&right[..len]);
        written_l.min(written_r)
    }

    pub fn pop_interleaved(&self, output: &mut [Sample]) -> usize {
        let frames = output.len() / 2;
        let available = self.left.available_read().min(self.right.available_read());
        let to_read = frames.min(available);
        if to_read == 0 {
            return 0;
        }

        let mut left_buf = vec![0.0; to_read];
        let mut right_buf = vec![0.0; to_read];
        self.left.pop(&mut left_buf);
        self.right.pop(&mut right_buf);

        for i in 0..to_read {
            output[i * 2] = left_buf[i];
            output[i * 2 + 1] = right_buf[i];
        }
        to_read
    }

    pub fn available_read(&self) -> usize {
        self.left.available_read().min(self.right.available_read())
    }

    pub fn available_write(&self) -> usize {
        self.left
            .available_write()
            .min(self.right.available_write())
    }

    pub fn clear(&self) {
        self.left.clear();
        self.right.clear();
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// METERING RING BUFFER (audio thread -> UI)
// ═══════════════════════════════════════════════════════════════════════════════

/// One signal-meter reading (§4.10), pushed by the audio thread once per
/// analysis frame and consumed by the UI at its own refresh rate. The UI
/// only ever wants the latest value, so a push always overwrites.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeterSnapshot {
    pub dbfs: f64,
    pub snr_db: f64,
    pub noise_floor_db: f64,
    pub timestamp: u64,
}

pub struct MeterRingBuffer {
    snapshots: Box<[MeterSnapshot]>,
    capacity: usize,
    mask: usize,
    write_pos: AtomicUsize,
    read_pos: AtomicUsize,
}

impl MeterRingBuffer {
    pub fn new(min_capacity: usize) -> Self {
        let capacity = min_capacity.next_power_of_two();
        let snapshots = vec![MeterSnapshot::default(); capacity].into_boxed_slice();

        Self {
            snapshots,
            capacity,
            mask: capacity - 1,
            write_pos: AtomicUsize::new(0),
            read_pos: AtomicUsize::new(0),
        }
    }

    /// Push a snapshot (audio thread). Always succeeds: if the UI has
    /// fallen behind, it only ever reads the newest value anyway.
    pub fn push(&self, snapshot: MeterSnapshot) {
        let write = self.write_pos.load(Ordering::Relaxed);
        let idx = write & self.mask;

        // SAFETY: single producer.
        unsafe {
            let ptr = self.snapshots.as_ptr() as *mut MeterSnapshot;
            ptr.add(idx).write(snapshot);
        }
        self.write_pos
            .store(write.wrapping_add(1), Ordering::Release);
    }

    /// Returns the latest snapshot, if any has arrived since the last
    /// read (UI thread).
    pub fn latest(&self) -> Option<MeterSnapshot> {
        let write = self.write_pos.load(Ordering::Acquire);
        let read = self.read_pos.load(Ordering::Relaxed);
        if write == read {
            return None;
        }
        let idx = write.wrapping_sub(1) & self.mask;
        let snapshot = self.snapshots[idx];
        self.read_pos.store(write, Ordering::Release);
        Some(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audio_ring_buffer_basic_roundtrip() {
        let buffer = AudioRingBuffer::new(1024);
        assert!(buffer.is_empty());

        let samples = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(buffer.push(&samples), 4);

        let mut output = [0.0; 4];
        assert_eq!(buffer.pop(&mut output), 4);
        assert_eq!(output, samples);
    }

    #[test]
    fn audio_ring_buffer_wraps() {
        let buffer = AudioRingBuffer::new(8);
        let samples: Vec<Sample> = (0..8).map(|i| i as f64).collect();
        buffer.push(&samples);

        let mut output = [0.0; 4];
        buffer.pop(&mut output);

        let more = [10.0, 11.0, 12.0, 13.0];
        assert_eq!(buffer.push(&more), 4);

        let mut all = [0.0; 8];
        buffer.pop(&mut all);
        assert_eq!(&all[..4], &[4.0, 5.0, 6.0, 7.0]);
        assert_eq!(&all[4..], &[10.0, 11.0, 12.0, 13.0]);
    }

    #[test]
    fn stereo_ring_buffer_interleaves_on_pop() {
        let buffer = StereoRingBuffer::new(1024);
        buffer.push_stereo(&[1.0, 2.0], &[5.0, 6.0]);

        let mut out = [0.0; 4];
        assert_eq!(buffer.pop_interleaved(&mut out), 2);
        assert_eq!(out, [1.0, 5.0, 2.0, 6.0]);
    }

    #[test]
    fn meter_ring_buffer_keeps_only_latest() {
        let buffer = MeterRingBuffer::new(32);
        buffer.push(MeterSnapshot {
            dbfs: -40.0,
            snr_db: 20.0,
            noise_floor_db: -90.0,
            timestamp: 1000,
        });
        buffer.push(MeterSnapshot {
            dbfs: -20.0,
            snr_db: 35.0,
            noise_floor_db: -90.0,
            timestamp: 2000,
        });

        let latest = buffer.latest().unwrap();
        assert_eq!(latest.timestamp, 2000);
        assert!(buffer.latest().is_none());
    }
}
