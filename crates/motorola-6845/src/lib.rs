//! Motorola 6845 CRT Controller.
//!
//! The CRTC counts character columns, scanlines within a character row, and
//! character rows. It generates horizontal and vertical sync pulses, and
//! supplies the display start address and geometry used by the video
//! circuitry. It knows nothing about pixels or memory.
//!
//! # Register map (18 registers)
//!
//! | Reg | Name                        | Mask | Readable |
//! |-----|-----------------------------|------|----------|
//! | R0  | Horizontal total            | $FF  | no       |
//! | R1  | Horizontal displayed        | $FF  | no       |
//! | R2  | Horizontal sync position    | $FF  | no       |
//! | R3  | Sync widths (V hi, H lo)    | $FF  | no       |
//! | R4  | Vertical total              | $7F  | no       |
//! | R5  | Vertical total adjust       | $1F  | no       |
//! | R6  | Vertical displayed          | $7F  | no       |
//! | R7  | Vertical sync position      | $7F  | no       |
//! | R8  | Interlace and skew          | $03  | no       |
//! | R9  | Maximum raster address      | $1F  | no       |
//! | R10 | Cursor start raster         | $1F  | no       |
//! | R11 | Cursor end raster           | $1F  | no       |
//! | R12 | Display start address high  | $3F  | yes      |
//! | R13 | Display start address low   | $FF  | yes      |
//! | R14 | Cursor address high         | $3F  | yes      |
//! | R15 | Cursor address low          | $FF  | yes      |
//! | R16 | Light pen address high      | $3F  | yes      |
//! | R17 | Light pen address low       | $FF  | yes      |
//!
//! Write-only registers read back as 0, as on the CPC's type 0 and type 1
//! parts.
//!
//! # Sync listeners
//!
//! Other chips subscribe to sync pulses with a listener handle of type `L`.
//! [`Crtc6845::clock`] reports which pulse started; the owner then walks
//! [`Crtc6845::listeners`] and notifies each handle in subscription order.
//! Subscription order is the notification order.

/// Number of addressable registers.
pub const NUM_REGISTERS: usize = 18;

/// First register that can be read back.
const FIRST_READABLE_REGISTER: u8 = 12;

/// A raw sync width nibble of 0 means 16.
const SYNC_WIDTH_FOR_ZERO: u8 = 16;

const COLUMN_MASK: u16 = 0xFF;
const SCANLINE_MASK: u8 = 0x1F;
const ROW_MASK: u8 = 0x7F;

/// CRTC register names, in register-index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Register {
    HorizontalTotal = 0,
    HorizontalDisplayed,
    HorizontalSyncPosition,
    SyncWidths,
    VerticalTotal,
    VerticalTotalAdjust,
    VerticalDisplayed,
    VerticalSyncPosition,
    InterlaceAndSkew,
    MaximumRasterAddress,
    CursorStartRaster,
    CursorEndRaster,
    DisplayStartAddressHigh,
    DisplayStartAddressLow,
    CursorAddressHigh,
    CursorAddressLow,
    LightPenAddressHigh,
    LightPenAddressLow,
}

/// Power-on register values (a standard 50 Hz CPC screen).
const REGISTER_DEFAULTS: [u8; NUM_REGISTERS] = [
    0x3F, 0x28, 0x34, 0x34, 0x14, 0x08, 0x10, 0x13, 0x00, 0x0B, 0x49, 0x0A, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00,
];

/// Implemented bits per register.
const REGISTER_MASKS: [u8; NUM_REGISTERS] = [
    0xFF, 0xFF, 0xFF, 0xFF, 0x7F, 0x1F, 0x7F, 0x7F, 0x03, 0x1F, 0x1F, 0x1F, 0x3F, 0xFF, 0x3F,
    0xFF, 0x3F, 0xFF,
];

/// A sync pulse that started on this clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncEvent {
    HSync,
    VSync,
}

/// Motorola 6845 CRT Controller.
pub struct Crtc6845<L = ()> {
    registers: [u8; NUM_REGISTERS],
    /// Address register (5 bits). May name a non-existent register 18–31.
    selected: u8,

    /// Derived from R3 bits 0–3 (0 means 16).
    hsync_width: u8,
    /// Derived from R3 bits 4–7 (0 means 16).
    vsync_width: u8,

    column: u16,
    scanline: u8,
    row: u8,

    in_hsync: bool,
    in_vsync: bool,
    /// Character clocks left in the active hsync pulse.
    hsync_counter: u8,
    /// Scanlines left in the active vsync pulse.
    vsync_counter: u8,

    hsync_listeners: Vec<L>,
    vsync_listeners: Vec<L>,
}

impl<L> Crtc6845<L> {
    /// Create a CRTC with power-on register values and no listeners.
    #[must_use]
    pub fn new() -> Self {
        let mut crtc = Self {
            registers: [0; NUM_REGISTERS],
            selected: 0,
            hsync_width: SYNC_WIDTH_FOR_ZERO,
            vsync_width: SYNC_WIDTH_FOR_ZERO,
            column: 0,
            scanline: 0,
            row: 0,
            in_hsync: false,
            in_vsync: false,
            hsync_counter: 0,
            vsync_counter: 0,
            hsync_listeners: Vec::new(),
            vsync_listeners: Vec::new(),
        };
        crtc.reset();
        crtc
    }

    /// Restore power-on registers and counters. Listeners stay subscribed.
    pub fn reset(&mut self) {
        for (index, &value) in REGISTER_DEFAULTS.iter().enumerate() {
            self.store(index, value);
        }
        self.selected = 0;

        self.column = 0;
        self.scanline = 0;
        self.row = 0;

        self.in_hsync = false;
        self.in_vsync = false;
        self.hsync_counter = 0;
        self.vsync_counter = 0;
    }

    /// Subscribe a listener to horizontal sync starts.
    pub fn add_hsync_listener(&mut self, listener: L) {
        self.hsync_listeners.push(listener);
    }

    /// Subscribe a listener to vertical sync starts.
    pub fn add_vsync_listener(&mut self, listener: L) {
        self.vsync_listeners.push(listener);
    }

    /// Listeners for `event`, in notification order.
    #[must_use]
    pub fn listeners(&self, event: SyncEvent) -> &[L] {
        match event {
            SyncEvent::HSync => &self.hsync_listeners,
            SyncEvent::VSync => &self.vsync_listeners,
        }
    }

    /// Advance one character clock.
    ///
    /// Returns the sync pulse that started on this clock, if any. A vsync
    /// can only start at the end of a scanline, an hsync only mid-scanline,
    /// so at most one event fires per clock.
    pub fn clock(&mut self) -> Option<SyncEvent> {
        if self.hsync_counter > 0 {
            self.hsync_counter -= 1;
            if self.hsync_counter == 0 {
                self.in_hsync = false;
            }
        }

        // Counters are 8 (column), 5 (scanline) and 7 (row) bits wide. One
        // already past its total after a register write runs on to the wrap.
        if self.column == u16::from(self.reg(Register::HorizontalTotal)) {
            self.column = 0;

            if self.vsync_counter > 0 {
                self.vsync_counter -= 1;
                if self.vsync_counter == 0 {
                    self.in_vsync = false;
                }
            }

            if self.scanline == self.reg(Register::MaximumRasterAddress) {
                self.scanline = 0;
                self.row = if self.row == self.reg(Register::VerticalTotal) {
                    0
                } else {
                    (self.row + 1) & ROW_MASK
                };
            } else {
                self.scanline = (self.scanline + 1) & SCANLINE_MASK;
            }

            if !self.in_vsync && self.row == self.reg(Register::VerticalSyncPosition) {
                self.in_vsync = true;
                self.vsync_counter = self.vsync_width;
                return Some(SyncEvent::VSync);
            }
        } else {
            self.column = (self.column + 1) & COLUMN_MASK;
            if !self.in_hsync
                && self.column == u16::from(self.reg(Register::HorizontalSyncPosition))
            {
                self.in_hsync = true;
                self.hsync_counter = self.hsync_width;
                return Some(SyncEvent::HSync);
            }
        }

        None
    }

    /// Handle a CPU write. `function` is port address bits 9–8.
    pub fn io_write(&mut self, function: u8, value: u8) {
        match function & 0x03 {
            0 => self.select_register(value),
            1 => self.write_selected(value),
            _ => {}
        }
    }

    /// Handle a CPU read. Only function 3 (read selected register) drives
    /// the bus.
    #[must_use]
    pub fn io_read(&self, function: u8) -> u8 {
        if function & 0x03 == 3 {
            self.read_selected()
        } else {
            0xFF
        }
    }

    /// Load the address register. Only 5 bits exist.
    pub fn select_register(&mut self, index: u8) {
        self.selected = index & 0x1F;
    }

    /// Currently selected register index (0–31).
    #[must_use]
    pub fn selected_register(&self) -> u8 {
        self.selected
    }

    /// Write the selected register. Writes to indices 18–31 go nowhere.
    pub fn write_selected(&mut self, value: u8) {
        let index = self.selected as usize;
        if index < NUM_REGISTERS {
            self.store(index, value);
        }
    }

    /// Read the selected register. Write-only and non-existent registers
    /// read as 0.
    #[must_use]
    pub fn read_selected(&self) -> u8 {
        let index = self.selected as usize;
        if self.selected < FIRST_READABLE_REGISTER || index >= NUM_REGISTERS {
            return 0;
        }
        self.registers[index]
    }

    /// Stored (masked) value of a register.
    #[must_use]
    pub fn reg(&self, register: Register) -> u8 {
        self.registers[register as usize]
    }

    /// Stored value of a register by index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a valid register index.
    #[must_use]
    pub fn register_at(&self, index: usize) -> u8 {
        assert!(index < NUM_REGISTERS, "CRTC register index {index} out of range");
        self.registers[index]
    }

    /// Write a register directly, bypassing the address register.
    pub fn set_register(&mut self, register: Register, value: u8) {
        self.store(register as usize, value);
    }

    fn store(&mut self, index: usize, value: u8) {
        self.registers[index] = value & REGISTER_MASKS[index];

        if index == Register::SyncWidths as usize {
            let widths = self.registers[index];
            self.hsync_width = match widths & 0x0F {
                0 => SYNC_WIDTH_FOR_ZERO,
                w => w,
            };
            self.vsync_width = match widths >> 4 {
                0 => SYNC_WIDTH_FOR_ZERO,
                w => w,
            };
        }
    }

    /// Force the beam position and sync state (snapshot restore).
    ///
    /// Sync counts are given counting up from the start of the pulse, as
    /// snapshots store them; they are converted to the remaining length.
    ///
    /// # Panics
    ///
    /// Panics if any position or count is outside what the current
    /// registers allow.
    pub fn set_timing(
        &mut self,
        column: u8,
        row: u8,
        scanline: u8,
        hsync_count: u8,
        vsync_count: u8,
        hsync_on: bool,
        vsync_on: bool,
    ) {
        assert!(
            column <= self.reg(Register::HorizontalTotal),
            "column {column} beyond horizontal total"
        );
        assert!(
            row <= self.reg(Register::VerticalTotal),
            "row {row} beyond vertical total"
        );
        assert!(
            scanline <= self.reg(Register::MaximumRasterAddress),
            "scanline {scanline} beyond maximum raster address"
        );

        self.column = u16::from(column);
        self.row = row;
        self.scanline = scanline;

        if hsync_on {
            assert!(hsync_count <= self.hsync_width, "hsync count {hsync_count} beyond width");
            self.hsync_counter = self.hsync_width - hsync_count;
            self.in_hsync = true;
        } else {
            self.hsync_counter = 0;
            self.in_hsync = false;
        }

        if vsync_on {
            assert!(vsync_count <= self.vsync_width, "vsync count {vsync_count} beyond width");
            self.vsync_counter = self.vsync_width - vsync_count;
            self.in_vsync = true;
        } else {
            self.vsync_counter = 0;
            self.in_vsync = false;
        }
    }

    /// Character column within the scanline.
    #[must_use]
    pub fn column(&self) -> u16 {
        self.column
    }

    /// Scanline within the current character row.
    #[must_use]
    pub fn scanline(&self) -> u8 {
        self.scanline
    }

    /// Character row.
    #[must_use]
    pub fn row(&self) -> u8 {
        self.row
    }

    #[must_use]
    pub fn in_hsync(&self) -> bool {
        self.in_hsync
    }

    #[must_use]
    pub fn in_vsync(&self) -> bool {
        self.in_vsync
    }

    /// Horizontal sync pulse width in character clocks (1–16).
    #[must_use]
    pub fn hsync_width(&self) -> u8 {
        self.hsync_width
    }

    /// Vertical sync pulse width in scanlines (1–16).
    #[must_use]
    pub fn vsync_width(&self) -> u8 {
        self.vsync_width
    }

    /// 14-bit display start address from R12/R13.
    #[must_use]
    pub fn display_start_address(&self) -> u16 {
        (u16::from(self.reg(Register::DisplayStartAddressHigh)) << 8)
            | u16::from(self.reg(Register::DisplayStartAddressLow))
    }
}

impl<L> Default for Crtc6845<L> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn crtc() -> Crtc6845 {
        Crtc6845::new()
    }

    fn frame_clocks(crtc: &Crtc6845) -> usize {
        (crtc.reg(Register::HorizontalTotal) as usize + 1)
            * (crtc.reg(Register::MaximumRasterAddress) as usize + 1)
            * (crtc.reg(Register::VerticalTotal) as usize + 1)
    }

    #[test]
    fn power_on_defaults() {
        let crtc = crtc();
        assert_eq!(crtc.reg(Register::HorizontalTotal), 0x3F);
        assert_eq!(crtc.reg(Register::VerticalSyncPosition), 0x13);
        assert_eq!(crtc.hsync_width(), 4);
        assert_eq!(crtc.vsync_width(), 3);
        assert_eq!((crtc.column(), crtc.scanline(), crtc.row()), (0, 0, 0));
    }

    #[test]
    fn write_only_registers_read_zero() {
        let mut crtc = crtc();
        crtc.select_register(1);
        crtc.write_selected(0x55);
        assert_eq!(crtc.read_selected(), 0);
        assert_eq!(crtc.reg(Register::HorizontalDisplayed), 0x55);

        crtc.select_register(12);
        crtc.write_selected(0xFF);
        assert_eq!(crtc.read_selected(), 0x3F);
    }

    #[test]
    fn nonexistent_register_is_inert() {
        let mut crtc = crtc();
        crtc.select_register(0x1F);
        crtc.write_selected(0xAA);
        assert_eq!(crtc.read_selected(), 0);
        assert_eq!(crtc.selected_register(), 0x1F);
    }

    #[test]
    fn io_functions_route_to_address_and_data() {
        let mut crtc = crtc();
        crtc.io_write(0, 0xED); // only 5 bits latch: register 13
        assert_eq!(crtc.selected_register(), 13);
        crtc.io_write(1, 0x80);
        assert_eq!(crtc.io_read(3), 0x80);
        assert_eq!(crtc.io_read(2), 0xFF);
        assert_eq!(crtc.display_start_address(), 0x0080);
    }

    #[test]
    fn full_frame_wraps_to_origin() {
        let mut crtc = crtc();
        for _ in 0..frame_clocks(&crtc) {
            crtc.clock();
        }
        assert_eq!((crtc.column(), crtc.scanline(), crtc.row()), (0, 0, 0));
    }

    #[test]
    fn hsync_fires_at_sync_position() {
        let mut crtc = crtc();
        let mut fired_at = None;
        for n in 1..=64 {
            if crtc.clock() == Some(SyncEvent::HSync) {
                fired_at = Some(n);
                break;
            }
        }
        assert_eq!(fired_at, Some(0x34));
        assert!(crtc.in_hsync());
    }

    #[test]
    fn zero_width_nibble_means_sixteen() {
        let mut crtc = crtc();
        crtc.set_register(Register::SyncWidths, 0x00);
        assert_eq!(crtc.hsync_width(), 16);
        assert_eq!(crtc.vsync_width(), 16);

        while crtc.clock() != Some(SyncEvent::HSync) {}
        let mut high_clocks = 0;
        while crtc.in_hsync() {
            crtc.clock();
            high_clocks += 1;
        }
        assert_eq!(high_clocks, 16);
    }

    #[test]
    fn vsync_lasts_width_scanlines() {
        let mut crtc = crtc();
        crtc.set_register(Register::SyncWidths, 0x84);
        crtc.set_register(Register::MaximumRasterAddress, 7);
        while crtc.clock() != Some(SyncEvent::VSync) {}
        assert_eq!(crtc.row(), 0x13);
        let mut scanlines = 0;
        while crtc.in_vsync() {
            for _ in 0..64 {
                crtc.clock();
            }
            scanlines += 1;
        }
        assert_eq!(scanlines, 8);
    }

    #[test]
    fn vsync_covering_the_row_fires_once_per_frame() {
        let mut crtc = crtc();
        crtc.set_register(Register::SyncWidths, 0xC4);
        let mut vsyncs = 0;
        let mut hsyncs = 0;
        for _ in 0..frame_clocks(&crtc) * 3 {
            match crtc.clock() {
                Some(SyncEvent::VSync) => vsyncs += 1,
                Some(SyncEvent::HSync) => hsyncs += 1,
                None => {}
            }
        }
        assert_eq!(vsyncs, 3);
        // 21 rows of 12 scanlines, one hsync each
        assert_eq!(hsyncs, 3 * 252);
    }

    #[test]
    fn short_vsync_restarts_while_still_on_sync_row() {
        // 3-line pulse on a 12-line row: pulses start on lines 0, 3, 6 and 9
        let mut crtc = crtc();
        let mut vsyncs = 0;
        for _ in 0..frame_clocks(&crtc) {
            if crtc.clock() == Some(SyncEvent::VSync) {
                vsyncs += 1;
            }
        }
        assert_eq!(vsyncs, 4);
    }

    #[test]
    fn listeners_keep_subscription_order() {
        let mut crtc: Crtc6845<&str> = Crtc6845::new();
        crtc.add_hsync_listener("gate array");
        crtc.add_hsync_listener("monitor");
        crtc.add_vsync_listener("gate array");
        crtc.add_vsync_listener("monitor");
        assert_eq!(crtc.listeners(SyncEvent::HSync), &["gate array", "monitor"]);
        assert_eq!(crtc.listeners(SyncEvent::VSync), &["gate array", "monitor"]);

        crtc.reset();
        assert_eq!(crtc.listeners(SyncEvent::HSync).len(), 2);
    }

    #[test]
    fn set_timing_converts_counts_to_remaining() {
        let mut crtc = crtc();
        crtc.set_timing(10, 5, 3, 1, 2, true, true);
        assert_eq!((crtc.column(), crtc.row(), crtc.scanline()), (10, 5, 3));
        assert!(crtc.in_hsync());
        assert!(crtc.in_vsync());

        // 4-wide hsync with 1 already elapsed: 3 more clocks
        for _ in 0..2 {
            crtc.clock();
            assert!(crtc.in_hsync());
        }
        crtc.clock();
        assert!(!crtc.in_hsync());
    }

    #[test]
    fn column_past_total_runs_to_eight_bit_wrap() {
        let mut crtc = crtc();
        crtc.set_timing(0x30, 0, 0, 0, 0, false, false);
        crtc.set_register(Register::HorizontalTotal, 0x10);

        for _ in 0..(0xFF - 0x30) {
            crtc.clock();
        }
        assert_eq!(crtc.column(), 0xFF);
        crtc.clock();
        assert_eq!((crtc.column(), crtc.scanline()), (0, 0));

        for _ in 0..=0x10 {
            crtc.clock();
        }
        assert_eq!((crtc.column(), crtc.scanline()), (0, 1));
    }

    #[test]
    fn scanline_past_maximum_runs_to_five_bit_wrap() {
        let mut crtc = crtc();
        crtc.set_timing(0, 0, 5, 0, 0, false, false);
        crtc.set_register(Register::MaximumRasterAddress, 2);
        let line = usize::from(crtc.reg(Register::HorizontalTotal)) + 1;

        for _ in 0..(32 - 5) * line {
            crtc.clock();
        }
        assert_eq!((crtc.scanline(), crtc.row()), (0, 0));

        for _ in 0..3 * line {
            crtc.clock();
        }
        assert_eq!((crtc.scanline(), crtc.row()), (0, 1));
    }

    #[test]
    #[should_panic(expected = "beyond horizontal total")]
    fn set_timing_rejects_column_past_total() {
        let mut crtc = crtc();
        crtc.set_timing(0x40, 0, 0, 0, 0, false, false);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn register_at_rejects_bad_index() {
        let crtc = crtc();
        let _ = crtc.register_at(18);
    }

    proptest! {
        #[test]
        fn writes_are_masked(index in 0u8..18, value in any::<u8>()) {
            let mut crtc = crtc();
            crtc.select_register(index);
            crtc.write_selected(value);
            prop_assert_eq!(crtc.register_at(index as usize), value & REGISTER_MASKS[index as usize]);
        }

        #[test]
        fn any_geometry_wraps_after_one_frame(ht in 0u8..=80, mra in 0u8..8, vt in 0u8..40) {
            let mut crtc = crtc();
            crtc.set_register(Register::HorizontalTotal, ht);
            crtc.set_register(Register::MaximumRasterAddress, mra);
            crtc.set_register(Register::VerticalTotal, vt);
            for _ in 0..frame_clocks(&crtc) {
                crtc.clock();
            }
            prop_assert_eq!((crtc.column(), crtc.scanline(), crtc.row()), (0, 0, 0));
        }
    }
}
