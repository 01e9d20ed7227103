//! Double-buffered ARGB frame output.
//!
//! The renderer draws into the back buffer; completing a frame swaps it to
//! the front, where the host picks it up. The back buffer is never the one
//! handed to the host.

/// Output width in pixels (mode 2 resolution).
pub const WIDTH: usize = 640;

/// Output height in pixels.
pub const HEIGHT: usize = 200;

/// Pixels per buffer.
pub const BUFFER_SIZE: usize = WIDTH * HEIGHT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    Drawing,
    /// A frame was completed and no new one has started.
    VSync,
}

pub struct FrameBuffers {
    front: Vec<u32>,
    back: Vec<u32>,
    state: FrameState,
    display_pending: bool,
}

impl FrameBuffers {
    #[must_use]
    pub fn new() -> Self {
        Self {
            front: vec![0; BUFFER_SIZE],
            back: vec![0; BUFFER_SIZE],
            state: FrameState::Idle,
            display_pending: false,
        }
    }

    pub fn reset(&mut self) {
        self.state = FrameState::Idle;
        self.display_pending = false;
    }

    /// Start a new frame and return the back buffer. Restarting a frame
    /// that is still being drawn reuses the same buffer.
    pub fn acquire_back_buffer(&mut self) -> &mut [u32] {
        self.state = FrameState::Drawing;
        &mut self.back
    }

    /// The back buffer, while a frame is being drawn.
    pub fn drawing_buffer(&mut self) -> Option<&mut [u32]> {
        match self.state {
            FrameState::Drawing => Some(&mut self.back),
            FrameState::Idle | FrameState::VSync => None,
        }
    }

    /// Finish the frame being drawn and swap it to the front.
    pub fn complete_buffer(&mut self) {
        if self.state != FrameState::Drawing {
            return;
        }
        std::mem::swap(&mut self.front, &mut self.back);
        self.state = FrameState::VSync;
        self.display_pending = true;
    }

    /// The front buffer, once per completed frame.
    pub fn push_to_display(&mut self) -> Option<&[u32]> {
        if self.display_pending {
            self.display_pending = false;
            Some(&self.front)
        } else {
            None
        }
    }

    /// The most recently completed frame.
    #[must_use]
    pub fn front(&self) -> &[u32] {
        &self.front
    }

    #[must_use]
    pub fn state(&self) -> FrameState {
        self.state
    }
}

impl Default for FrameBuffers {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_to_draw_until_acquired() {
        let mut frames = FrameBuffers::new();
        assert!(frames.drawing_buffer().is_none());
        assert!(frames.push_to_display().is_none());
    }

    #[test]
    fn complete_swaps_drawn_frame_to_front() {
        let mut frames = FrameBuffers::new();
        frames.acquire_back_buffer()[0] = 0xFF12_3456;
        frames.complete_buffer();

        assert_eq!(frames.state(), FrameState::VSync);
        assert_eq!(frames.front()[0], 0xFF12_3456);
        assert!(frames.drawing_buffer().is_none());
    }

    #[test]
    fn push_to_display_once_per_swap() {
        let mut frames = FrameBuffers::new();
        frames.acquire_back_buffer();
        frames.complete_buffer();
        assert!(frames.push_to_display().is_some());
        assert!(frames.push_to_display().is_none());
    }

    #[test]
    fn back_buffer_never_aliases_front() {
        let mut frames = FrameBuffers::new();
        frames.acquire_back_buffer().fill(1);
        frames.complete_buffer();
        frames.acquire_back_buffer().fill(2);
        assert!(frames.front().iter().all(|&p| p == 1));
    }

    #[test]
    fn complete_without_drawing_is_ignored() {
        let mut frames = FrameBuffers::new();
        frames.complete_buffer();
        assert_eq!(frames.state(), FrameState::Idle);
        assert!(frames.push_to_display().is_none());
    }
}
