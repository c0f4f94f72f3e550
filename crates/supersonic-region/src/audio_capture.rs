//! Optional interleaved-float capture ring (§6.3 `audio_capture` toggle).
//!
//! Audio decoding and host buffer mechanics are out of scope; this is just
//! enough of a capture surface for tests to assert that something was
//! written, mirroring how the engine would expose a debug tap.

use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU32, Ordering};

pub struct AudioCaptureRing {
    write_pos: AtomicU32,
    channels: u32,
    frames: u32,
    buffer: UnsafeCell<Box<[f32]>>,
}

unsafe impl Send for AudioCaptureRing {}
unsafe impl Sync for AudioCaptureRing {}

impl AudioCaptureRing {
    #[must_use]
    pub fn new(channels: u32, frames: u32) -> Self {
        let len = (channels * frames) as usize;
        Self {
            write_pos: AtomicU32::new(0),
            channels,
            frames,
            buffer: UnsafeCell::new(vec![0.0f32; len].into_boxed_slice()),
        }
    }

    #[must_use]
    pub fn channels(&self) -> u32 {
        self.channels
    }

    #[must_use]
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Writes one interleaved frame, wrapping at `frames`. Single-writer:
    /// only the host's audio-capture tap calls this.
    pub fn write_frame(&self, samples: &[f32]) {
        debug_assert_eq!(samples.len() as u32, self.channels, "INV-CAP-01: frame width matches channel count");
        let pos = self.write_pos.load(Ordering::Relaxed);
        let base = (pos * self.channels) as usize;
        // Safety: sole writer; `base` is always in-bounds by construction.
        unsafe {
            let buf = &mut *self.buffer.get();
            buf[base..base + self.channels as usize].copy_from_slice(samples);
        }
        let next = (pos + 1) % self.frames;
        self.write_pos.store(next, Ordering::Release);
    }

    #[must_use]
    pub fn write_pos(&self) -> u32 {
        self.write_pos.load(Ordering::Acquire)
    }

    /// Copies out the full buffer for inspection in tests.
    #[must_use]
    pub fn snapshot(&self) -> Vec<f32> {
        // Safety: read-only copy; torn reads against an in-flight write are
        // acceptable for this debug-only surface.
        unsafe { (*self.buffer.get()).to_vec() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_frame_wraps_at_capacity() {
        let ring = AudioCaptureRing::new(2, 2);
        ring.write_frame(&[1.0, 2.0]);
        ring.write_frame(&[3.0, 4.0]);
        assert_eq!(ring.write_pos(), 0);
        ring.write_frame(&[5.0, 6.0]);
        let snap = ring.snapshot();
        assert_eq!(snap, vec![5.0, 6.0, 3.0, 4.0]);
    }
}
