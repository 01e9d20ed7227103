//! Host audio device contract.

/// A real-time audio device fed one buffer per video frame.
///
/// Rejection is backpressure, not an error: the producer keeps its samples
/// and offers them again (plus whatever accumulated since) next frame.
pub trait AudioSink {
    /// Offer a buffer of interleaved stereo samples. Returns `true` if the
    /// whole buffer was taken.
    fn submit(&mut self, bytes: &[u8]) -> bool;

    /// Number of earlier submissions the device has not finished playing.
    fn pending(&self) -> usize;
}
