//! Gate array: palette, screen mode, ROM enables and the raster interrupt.
//!
//! The CPU writes a single byte to the gate array; the top two bits pick
//! the function:
//!
//! | Bits 7-6 | Function                               |
//! |----------|----------------------------------------|
//! | `00`     | Select pen (bit 4 selects the border)  |
//! | `01`     | Set colour of the selected pen         |
//! | `10`     | Screen mode, ROM enables, delay irq    |
//! | `11`     | RAM bank setup                         |
//!
//! The raster interrupt counts hsyncs. Every 52nd hsync raises the
//! interrupt line; a vsync delays the count by two hsyncs and then
//! resynchronises it.

use crate::memory::Memory;
use crate::palette::PALETTE;

/// Pens 0–15 plus the border.
pub const NUM_PENS: usize = 17;

/// Pen index of the border.
pub const BORDER_PEN: usize = 16;

/// Hardware colour numbers.
pub const NUM_COLOURS: usize = 32;

/// Hsyncs between raster interrupts.
pub const SCANLINES_PER_INTERRUPT: u8 = 52;

/// Hsyncs the interrupt counter waits after a vsync.
pub const VSYNC_DELAY: u8 = 2;

const MODE_MASK: u8 = 0x03;
const LOWER_ROM_DISABLE: u8 = 0x04;
const UPPER_ROM_DISABLE: u8 = 0x08;
const DELAY_INTERRUPT: u8 = 0x10;

pub struct GateArray {
    pens: [u8; NUM_PENS],
    current_pen: usize,
    mode: u8,
    scanline_counter: u8,
    vsync_delay: u8,
    interrupt_request: bool,
}

impl GateArray {
    #[must_use]
    pub fn new() -> Self {
        Self {
            pens: [0; NUM_PENS],
            current_pen: 0,
            mode: 1,
            scanline_counter: 0,
            vsync_delay: 0,
            interrupt_request: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Handle a CPU write to the gate array port.
    pub fn write(&mut self, value: u8, memory: &mut Memory) {
        match value >> 6 {
            0 => {
                if value & 0x10 != 0 {
                    self.set_current_pen(BORDER_PEN);
                } else {
                    self.set_current_pen((value & 0x0F) as usize);
                }
            }
            1 => self.set_pen_colour(self.current_pen, value & 0x1F),
            2 => self.write_mode_and_rom(value, memory),
            _ => memory.select_bank(value & 0x07),
        }
    }

    /// Apply a mode/ROM control byte. Snapshot restore comes through here
    /// too.
    pub fn write_mode_and_rom(&mut self, value: u8, memory: &mut Memory) {
        self.mode = value & MODE_MASK;
        memory.set_upper_rom_enabled(value & UPPER_ROM_DISABLE == 0);
        memory.set_lower_rom_enabled(value & LOWER_ROM_DISABLE == 0);
        if value & DELAY_INTERRUPT != 0 {
            self.interrupt_request = false;
            self.scanline_counter = 0;
        }
    }

    pub fn on_hsync(&mut self) {
        self.scanline_counter += 1;

        if self.vsync_delay == 0 {
            if self.scanline_counter == SCANLINES_PER_INTERRUPT {
                self.interrupt_request = true;
                self.scanline_counter = 0;
            }
        } else {
            self.vsync_delay -= 1;
            if self.vsync_delay == 0 {
                // Only fire if the last interrupt is at least 32 lines back.
                if self.scanline_counter >= 32 {
                    self.interrupt_request = true;
                }
                self.scanline_counter = 0;
            }
        }
    }

    pub fn on_vsync(&mut self) {
        self.vsync_delay = VSYNC_DELAY;
    }

    /// The CPU took the interrupt: clear bit 5 of the counter so the next
    /// interrupt cannot come within 32 lines.
    pub fn on_interrupt_acknowledge(&mut self) {
        self.scanline_counter &= 0x1F;
    }

    /// # Panics
    ///
    /// Panics if `pen` is not below 17.
    pub fn set_current_pen(&mut self, pen: usize) {
        assert!(pen < NUM_PENS, "pen {pen} out of range");
        self.current_pen = pen;
    }

    /// # Panics
    ///
    /// Panics if `pen` is not below 17 or `colour` is not below 32.
    pub fn set_pen_colour(&mut self, pen: usize, colour: u8) {
        assert!(pen < NUM_PENS, "pen {pen} out of range");
        assert!((colour as usize) < NUM_COLOURS, "colour {colour} out of range");
        self.pens[pen] = colour;
    }

    /// Force the interrupt counters, for snapshot restore.
    ///
    /// # Panics
    ///
    /// Panics if `scanline_counter` is 52 or more, or `vsync_delay` is above 2.
    pub fn set_counters(&mut self, scanline_counter: u8, vsync_delay: u8) {
        assert!(
            scanline_counter < SCANLINES_PER_INTERRUPT,
            "scanline counter {scanline_counter} out of range"
        );
        assert!(vsync_delay <= VSYNC_DELAY, "vsync delay {vsync_delay} out of range");
        self.scanline_counter = scanline_counter;
        self.vsync_delay = vsync_delay;
    }

    pub fn set_interrupt_request(&mut self, active: bool) {
        self.interrupt_request = active;
    }

    /// Interrupt line state.
    #[must_use]
    pub fn int_active(&self) -> bool {
        self.interrupt_request
    }

    /// ARGB colour of a pen.
    ///
    /// # Panics
    ///
    /// Panics if `pen` is not below 17.
    #[must_use]
    pub fn pen_colour(&self, pen: usize) -> u32 {
        assert!(pen < NUM_PENS, "pen {pen} out of range");
        PALETTE[self.pens[pen] as usize]
    }

    /// Hardware colour number assigned to a pen.
    #[must_use]
    pub fn pen_hardware_colour(&self, pen: usize) -> u8 {
        self.pens[pen]
    }

    #[must_use]
    pub fn border_colour(&self) -> u32 {
        self.pen_colour(BORDER_PEN)
    }

    #[must_use]
    pub fn current_pen(&self) -> usize {
        self.current_pen
    }

    #[must_use]
    pub fn mode(&self) -> u8 {
        self.mode
    }

    #[must_use]
    pub fn scanline_counter(&self) -> u8 {
        self.scanline_counter
    }

    #[must_use]
    pub fn vsync_delay(&self) -> u8 {
        self.vsync_delay
    }
}

impl Default for GateArray {
    fn default() -> Self {
        Self::new()
    }
}
