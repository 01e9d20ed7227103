//! Queue of PCM buffers handed from the PSG to the host audio device.
//!
//! The PSG offers its whole output buffer once per frame. The queue
//! refuses anything shorter than [`MIN_SUBMIT_BYTES`], so samples
//! accumulate in the PSG until a few frames' worth can be played in one
//! go. If the host stops draining, older buffers are dropped rather than
//! letting the queue grow.

use std::collections::VecDeque;

use emu_core::AudioSink;
use gi_ay_3_8910::{BYTES_PER_SAMPLE, SAMPLE_RATE};

use crate::cpc::FRAMES_PER_SECOND;

/// Smallest submission accepted: four video frames of stereo samples.
pub const MIN_SUBMIT_BYTES: usize =
    SAMPLE_RATE as usize * BYTES_PER_SAMPLE * 4 / FRAMES_PER_SECOND as usize;

/// Pending buffers allowed before the queue is flushed.
pub const MAX_PENDING: usize = 4;

/// Audio sink that buffers submissions for a host to pop.
#[derive(Debug, Default)]
pub struct AudioQueue {
    buffers: VecDeque<Vec<u8>>,
}

impl AudioQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Oldest buffer, if any.
    pub fn pop(&mut self) -> Option<Vec<u8>> {
        self.buffers.pop_front()
    }

    pub fn clear(&mut self) {
        self.buffers.clear();
    }
}

impl AudioSink for AudioQueue {
    fn submit(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() < MIN_SUBMIT_BYTES {
            return false;
        }
        if self.buffers.len() > MAX_PENDING {
            log::trace!("audio queue overrun, dropping {} buffers", self.buffers.len());
            self.buffers.clear();
        }
        self.buffers.push_back(bytes.to_vec());
        true
    }

    fn pending(&self) -> usize {
        self.buffers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn min_submit_is_four_frames() {
        assert_eq!(MIN_SUBMIT_BYTES, 13_312);
    }

    #[test]
    fn short_buffers_rejected() {
        let mut queue = AudioQueue::new();
        assert!(!queue.submit(&vec![0; MIN_SUBMIT_BYTES - 1]));
        assert_eq!(queue.pending(), 0);
    }

    #[test]
    fn accepted_buffers_pop_in_order() {
        let mut queue = AudioQueue::new();
        assert!(queue.submit(&vec![1; MIN_SUBMIT_BYTES]));
        assert!(queue.submit(&vec![2; MIN_SUBMIT_BYTES + 4]));
        assert_eq!(queue.pending(), 2);
        assert_eq!(queue.pop().map(|b| b[0]), Some(1));
        assert_eq!(queue.pop().map(|b| b.len()), Some(MIN_SUBMIT_BYTES + 4));
        assert!(queue.pop().is_none());
    }

    #[test]
    fn overrun_flushes_before_accepting() {
        let mut queue = AudioQueue::new();
        for _ in 0..=MAX_PENDING {
            assert!(queue.submit(&vec![0; MIN_SUBMIT_BYTES]));
        }
        assert_eq!(queue.pending(), MAX_PENDING + 1);

        assert!(queue.submit(&vec![9; MIN_SUBMIT_BYTES]));
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.pop().map(|b| b[0]), Some(9));
    }
}
