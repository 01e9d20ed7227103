//! Scanline renderer.
//!
//! Paints one scanline into the back frame buffer on every CRTC hsync and
//! completes the frame on vsync. Screen memory is fetched the way the
//! CPC's video hardware addresses it: the display start address supplies
//! a 16K page and an offset, each character row advances the offset by
//! the row width, and each scanline within a row adds 2K. The offset wraps
//! at 2K.
//!
//! The border is not rastered. Border areas are filled with zero-alpha
//! pixels and the border colour is cached once per frame for the host.

use motorola_6845::{Crtc6845, Register};

use crate::framebuffer::{BUFFER_SIZE, FrameBuffers, HEIGHT, WIDTH};
use crate::gate_array::{GateArray, NUM_PENS};
use crate::memory::Memory;

/// Zero-alpha filler for border areas.
pub const BORDER_FILLER: u32 = 0x0000_0000;

/// Output pixels per screen byte in every mode.
const PIXELS_PER_BYTE: usize = 8;

const LOOKUP_LEN: usize = 256 * PIXELS_PER_BYTE;

/// Pen index for each output pixel of each screen byte, per mode.
static PEN_LOOKUP: [[u8; LOOKUP_LEN]; 4] = [
    build_lookup(0),
    build_lookup(1),
    build_lookup(2),
    build_lookup(3),
];

/// Mode 0 (and the undocumented mode 3): two 4bpp pixels, bits
/// interleaved 1-5-3-7 and 0-4-2-6.
const fn mode0_pens(b: u8) -> [u8; 2] {
    [
        ((b & 0x80) >> 7) | ((b & 0x08) >> 2) | ((b & 0x20) >> 3) | ((b & 0x02) << 2),
        ((b & 0x40) >> 6) | ((b & 0x04) >> 1) | ((b & 0x10) >> 2) | ((b & 0x01) << 3),
    ]
}

/// Mode 1: four 2bpp pixels, bit pairs 7/3, 6/2, 5/1, 4/0.
const fn mode1_pens(b: u8) -> [u8; 4] {
    [
        ((b & 0x80) >> 7) | ((b & 0x08) >> 2),
        ((b & 0x40) >> 6) | ((b & 0x04) >> 1),
        ((b & 0x20) >> 5) | (b & 0x02),
        ((b & 0x10) >> 4) | ((b & 0x01) << 1),
    ]
}

const fn build_lookup(mode: u8) -> [u8; LOOKUP_LEN] {
    let mut table = [0u8; LOOKUP_LEN];
    let mut byte = 0;
    while byte < 256 {
        let b = byte as u8;
        let base = byte * PIXELS_PER_BYTE;
        let mut i = 0;
        while i < PIXELS_PER_BYTE {
            table[base + i] = match mode {
                1 => mode1_pens(b)[i / 2],
                2 => (b >> (7 - i)) & 1,
                _ => mode0_pens(b)[i / 4],
            };
            i += 1;
        }
        byte += 1;
    }
    table
}

pub struct Monitor {
    frames: FrameBuffers,
    /// Write position in the back buffer.
    position: usize,
    pens: [u32; NUM_PENS],
    mode: u8,
    mode_update_pending: bool,
    border_colour: u32,
    skip_next_frame: bool,
    skip_this_frame: bool,
}

impl Monitor {
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames: FrameBuffers::new(),
            position: 0,
            pens: [0; NUM_PENS],
            mode: 0,
            mode_update_pending: false,
            border_colour: 0,
            skip_next_frame: false,
            skip_this_frame: false,
        }
    }

    pub fn reset(&mut self) {
        self.frames.reset();
        self.position = 0;
        self.pens = [0; NUM_PENS];
        self.mode = 0;
        self.mode_update_pending = false;
        self.border_colour = 0;
        self.skip_next_frame = false;
        self.skip_this_frame = false;
    }

    /// Emulate the next frame fully but leave the frame buffers untouched.
    pub fn skip_next_frame(&mut self) {
        self.skip_next_frame = true;
    }

    /// Pick up the gate array's screen mode at the next character row.
    pub fn on_interrupt_acknowledge(&mut self) {
        self.mode_update_pending = true;
    }

    fn update_pens(&mut self, gate_array: &GateArray) {
        for (pen, colour) in self.pens.iter_mut().enumerate() {
            *colour = gate_array.pen_colour(pen);
        }
    }

    /// Render the scanline the CRTC is on.
    pub fn on_hsync<L>(&mut self, crtc: &Crtc6845<L>, gate_array: &GateArray, memory: &Memory) {
        if self.skip_this_frame {
            return;
        }

        let row = usize::from(crtc.row());
        let scanline = usize::from(crtc.scanline());

        if scanline == 0 {
            self.update_pens(gate_array);
            if self.mode_update_pending {
                self.mode_update_pending = false;
                self.mode = gate_array.mode();
            }
        }

        let mut width_bytes = usize::from(crtc.reg(Register::HorizontalDisplayed)) * 2;
        let height_rows = usize::from(crtc.reg(Register::VerticalDisplayed));
        let start_address = usize::from(crtc.display_start_address());

        if row == 0 && scanline == 0 {
            if self.skip_next_frame {
                self.skip_this_frame = true;
                self.skip_next_frame = false;
                return;
            }
            self.update_pens(gate_array);
            self.mode = gate_array.mode();

            let raster_height = usize::from(crtc.reg(Register::MaximumRasterAddress)) + 1;
            let top_border = HEIGHT.saturating_sub(height_rows * raster_height) / 2;
            self.position = top_border * WIDTH;
            self.frames.acquire_back_buffer()[..self.position].fill(BORDER_FILLER);
        }

        let Some(buffer) = self.frames.drawing_buffer() else {
            return;
        };
        if row >= height_rows || self.position >= BUFFER_SIZE {
            return;
        }

        let side_border = WIDTH.saturating_sub(width_bytes * PIXELS_PER_BYTE) / 2;
        let available = WIDTH - side_border;
        if width_bytes * PIXELS_PER_BYTE > available {
            width_bytes = available / PIXELS_PER_BYTE;
        }

        let page = (start_address << 2) & 0xF000;
        let offset = (start_address * 2) & 0x7FF;
        let mut address_x = offset + ((row * width_bytes) & 0x7FF);
        let address_y = page + 2048 * scanline;

        let lookup = &PEN_LOOKUP[usize::from(self.mode & 3)];
        let line = &mut buffer[self.position..self.position + WIDTH];
        line[..side_border].fill(BORDER_FILLER);

        let mut x = side_border;
        for _ in 0..width_bytes {
            let byte = usize::from(memory.video_peek(address_y + address_x));
            let pens = &lookup[byte * PIXELS_PER_BYTE..][..PIXELS_PER_BYTE];
            for (pixel, &pen) in line[x..x + PIXELS_PER_BYTE].iter_mut().zip(pens) {
                *pixel = self.pens[usize::from(pen)];
            }
            x += PIXELS_PER_BYTE;
            address_x = (address_x + 1) & 0x7FF;
        }

        line[x..].fill(BORDER_FILLER);
        self.position += WIDTH;
    }

    /// Finish the frame: cache the border colour, pad and swap.
    pub fn on_vsync(&mut self, gate_array: &GateArray) {
        if let Some(buffer) = self.frames.drawing_buffer() {
            buffer[self.position.min(BUFFER_SIZE)..].fill(BORDER_FILLER);
            self.border_colour = gate_array.border_colour();
            self.frames.complete_buffer();
        }
        self.skip_this_frame = false;
    }

    /// Border colour sampled at the last vsync.
    #[must_use]
    pub fn border_colour(&self) -> u32 {
        self.border_colour
    }

    /// Screen mode used for rendering.
    #[must_use]
    pub fn mode(&self) -> u8 {
        self.mode
    }

    #[must_use]
    pub fn frames(&self) -> &FrameBuffers {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut FrameBuffers {
        &mut self.frames
    }
}

impl Default for Monitor {
    fn default() -> Self {
        Self::new()
    }
}
