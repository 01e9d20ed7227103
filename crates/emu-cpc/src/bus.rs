//! CPC bus: memory, I/O routing and the peripheral clock.
//!
//! The bus owns every chip the Z80 can reach. The CPU calls
//! [`Bus::clock`] once per 4 T-states (the 1 MHz peripheral clock); each
//! tick clocks the CRTC, delivers any sync pulse it raised to its
//! listeners in subscription order, then clocks the PSG.
//!
//! # Wiring
//!
//! - CRTC hsync/vsync → gate array (raster interrupt), then monitor
//! - PPI port A ↔ PSG data bus
//! - PPI port B ← status byte (vsync from the CRTC)
//! - PPI port C low nibble → keyboard row select
//! - PPI port C bits 7–6 → PSG bus function
//! - PSG I/O port A ← selected keyboard row

use emu_core::Bus;
use gi_ay_3_8910::Ay3_8910;
use intel_8255::{Ppi8255, PpiPorts};
use motorola_6845::{Crtc6845, SyncEvent};

use crate::config::RamSize;
use crate::gate_array::GateArray;
use crate::io::{IoDevice, port_b_status};
use crate::keyboard::KeyboardMatrix;
use crate::memory::Memory;
use crate::monitor::Monitor;

/// Chips subscribed to CRTC sync pulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncListener {
    GateArray,
    Monitor,
}

/// The CPC bus, implementing `emu_core::Bus`.
pub struct CpcBus {
    pub memory: Memory,
    pub crtc: Crtc6845<SyncListener>,
    pub gate_array: GateArray,
    pub ppi: Ppi8255,
    pub psg: Ay3_8910,
    pub monitor: Monitor,
    pub keyboard: KeyboardMatrix,
}

impl CpcBus {
    #[must_use]
    pub fn new(ram_size: RamSize) -> Self {
        let mut crtc = Crtc6845::new();
        // The gate array must see each pulse before the monitor renders.
        crtc.add_hsync_listener(SyncListener::GateArray);
        crtc.add_vsync_listener(SyncListener::GateArray);
        crtc.add_hsync_listener(SyncListener::Monitor);
        crtc.add_vsync_listener(SyncListener::Monitor);

        Self {
            memory: Memory::new(ram_size),
            crtc,
            gate_array: GateArray::new(),
            ppi: Ppi8255::new(),
            psg: Ay3_8910::new(),
            monitor: Monitor::new(),
            keyboard: KeyboardMatrix::new(),
        }
    }

    /// Reset every peripheral: monitor, keyboard, PSG, CRTC, gate array,
    /// PPI, then memory.
    pub fn reset(&mut self) {
        self.monitor.reset();
        self.keyboard.reset();
        self.psg.reset();
        self.crtc.reset();
        self.gate_array.reset();
        self.ppi.reset();
        self.memory.reset();
    }

    fn notify(&mut self, listener: SyncListener, event: SyncEvent) {
        match (listener, event) {
            (SyncListener::GateArray, SyncEvent::HSync) => self.gate_array.on_hsync(),
            (SyncListener::GateArray, SyncEvent::VSync) => self.gate_array.on_vsync(),
            (SyncListener::Monitor, SyncEvent::HSync) => {
                self.monitor
                    .on_hsync(&self.crtc, &self.gate_array, &self.memory);
            }
            (SyncListener::Monitor, SyncEvent::VSync) => self.monitor.on_vsync(&self.gate_array),
        }
    }

    /// PPI pin wiring for one access.
    fn ppi_lines(&mut self) -> (&mut Ppi8255, PpiLines<'_>) {
        let lines = PpiLines {
            psg: &mut self.psg,
            keyboard: &mut self.keyboard,
            vsync: self.crtc.in_vsync(),
        };
        (&mut self.ppi, lines)
    }

    /// Write a PPI function, as the CPU would.
    pub fn ppi_write(&mut self, function: u8, value: u8) {
        let (ppi, mut lines) = self.ppi_lines();
        ppi.write(function, value, &mut lines);
        if function == 3 && value & 0x80 != 0 && ppi.modes() != (0, 0) {
            log::trace!("PPI control {value:#04X} selects an unsupported mode");
        }
    }

    /// Read a PPI function, as the CPU would.
    pub fn ppi_read(&mut self, function: u8) -> u8 {
        let (ppi, mut lines) = self.ppi_lines();
        ppi.read(function, &mut lines)
    }
}

/// What the PPI's pins are connected to on the CPC.
struct PpiLines<'a> {
    psg: &'a mut Ay3_8910,
    keyboard: &'a mut KeyboardMatrix,
    vsync: bool,
}

impl PpiPorts for PpiLines<'_> {
    fn port_a_read(&mut self, latch: u8) -> u8 {
        self.psg.read_bus(latch, self.keyboard.read_row())
    }

    fn port_a_write(&mut self, value: u8) {
        self.psg.write_bus(value);
    }

    fn port_b_read(&mut self) -> u8 {
        port_b_status(self.vsync)
    }

    fn port_c_lower_write(&mut self, nibble: u8) {
        self.keyboard.select_row(nibble);
    }

    fn port_c_upper_write(&mut self, value: u8, port_a: u8) {
        self.psg.set_bus_control(value);
        self.psg.write_bus(port_a);
    }
}

impl Bus for CpcBus {
    fn read(&mut self, address: u16) -> u8 {
        self.memory.read(address)
    }

    fn write(&mut self, address: u16, value: u8) {
        self.memory.write(address, value);
    }

    fn io_read(&mut self, port: u16) -> u8 {
        match IoDevice::decode(port) {
            IoDevice::Ppi(function) => self.ppi_read(function),
            IoDevice::Crtc(function) => self.crtc.io_read(function),
            _ => 0xFF,
        }
    }

    fn io_write(&mut self, port: u16, value: u8) {
        match IoDevice::decode(port) {
            IoDevice::GateArray => self.gate_array.write(value, &mut self.memory),
            IoDevice::RamConfig => self.memory.select_bank(value & 0x07),
            IoDevice::Crtc(function) => self.crtc.io_write(function, value),
            IoDevice::RomSelect => self.memory.select_upper_rom(value),
            IoDevice::Ppi(function) => self.ppi_write(function, value),
            device @ (IoDevice::PrinterPort | IoDevice::Expansion | IoDevice::Unknown) => {
                log::trace!("unhandled write {value:#04X} to port {port:#06X} ({device:?})");
            }
        }
    }

    fn interrupt_pending(&self) -> bool {
        self.gate_array.int_active()
    }

    fn interrupt_acknowledge(&mut self) {
        self.gate_array.set_interrupt_request(false);
        self.gate_array.on_interrupt_acknowledge();
        self.monitor.on_interrupt_acknowledge();
    }

    fn clock(&mut self) {
        if let Some(event) = self.crtc.clock() {
            for index in 0..self.crtc.listeners(event).len() {
                let listener = self.crtc.listeners(event)[index];
                self.notify(listener, event);
            }
        }
        self.psg.clock();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::CpcKey;
    use crate::memory::{BANK_SIZE, BASIC_ROM_SLOT};

    const PPI_PORT_A: u16 = 0xF400;
    const PPI_PORT_B: u16 = 0xF500;
    const PPI_PORT_C: u16 = 0xF600;
    const PPI_CONTROL: u16 = 0xF700;

    fn make_bus() -> CpcBus {
        CpcBus::new(RamSize::Ram128K)
    }

    /// Firmware-style PSG register write through the PPI.
    fn psg_write(bus: &mut CpcBus, reg: u8, value: u8) {
        bus.io_write(PPI_CONTROL, 0x82);
        bus.io_write(PPI_PORT_A, reg);
        bus.io_write(PPI_PORT_C, 0xC0);
        bus.io_write(PPI_PORT_C, 0x00);
        bus.io_write(PPI_PORT_A, value);
        bus.io_write(PPI_PORT_C, 0x80);
        bus.io_write(PPI_PORT_C, 0x00);
    }

    /// Firmware-style keyboard scan of one row.
    fn scan_row(bus: &mut CpcBus, row: u8) -> u8 {
        bus.io_write(PPI_CONTROL, 0x82);
        bus.io_write(PPI_PORT_A, 14);
        bus.io_write(PPI_PORT_C, 0xC0);
        bus.io_write(PPI_PORT_C, 0x00);
        bus.io_write(PPI_CONTROL, 0x92);
        bus.io_write(PPI_PORT_C, 0x40 | row);
        let value = bus.io_read(PPI_PORT_A);
        bus.io_write(PPI_CONTROL, 0x82);
        bus.io_write(PPI_PORT_C, 0x00);
        value
    }

    #[test]
    fn listeners_registered_gate_array_first() {
        let bus = make_bus();
        for event in [SyncEvent::HSync, SyncEvent::VSync] {
            assert_eq!(
                bus.crtc.listeners(event),
                &[SyncListener::GateArray, SyncListener::Monitor]
            );
        }
    }

    #[test]
    fn memory_access_goes_through_banking() {
        let mut bus = make_bus();
        bus.io_write(0x7F00, 0xC1);
        bus.write(0xC000, 0x77);
        assert_eq!(bus.memory.ram()[7 * BANK_SIZE], 0x77);
        assert_eq!(bus.read(0xC000), 0x77);
    }

    #[test]
    fn ram_config_port_selects_bank() {
        let mut bus = make_bus();
        bus.io_write(0x3F00, 0xC2);
        assert_eq!(bus.memory.bank_setup(), 2);
    }

    #[test]
    fn rom_select_port() {
        let mut bus = make_bus();
        bus.memory.load_rom(BASIC_ROM_SLOT, &[0x22; BANK_SIZE]);
        bus.memory.load_rom(7, &[0x77; BANK_SIZE]);
        bus.io_write(0xDF00, 7);
        assert_eq!(bus.read(0xC000), 0x77);
        bus.io_write(0xDF00, 5);
        assert_eq!(bus.read(0xC000), 0x22);
    }

    #[test]
    fn crtc_registers_via_ports() {
        let mut bus = make_bus();
        bus.io_write(0xBC00, 12);
        bus.io_write(0xBD00, 0x30);
        assert_eq!(bus.io_read(0xBF00), 0x30);
        // Horizontal total is write-only.
        bus.io_write(0xBC00, 0);
        assert_eq!(bus.io_read(0xBF00), 0x00);
    }

    #[test]
    fn psg_register_written_via_ppi() {
        let mut bus = make_bus();
        psg_write(&mut bus, 8, 0x0F);
        psg_write(&mut bus, 0, 0xAB);
        assert_eq!(bus.psg.register(8), 0x0F);
        assert_eq!(bus.psg.register(0), 0xAB);
    }

    #[test]
    fn keyboard_scanned_via_psg_port_a() {
        let mut bus = make_bus();
        bus.keyboard.set_key(CpcKey::Space, true);
        assert_eq!(scan_row(&mut bus, 5), 0x7F);
        assert_eq!(scan_row(&mut bus, 4), 0xFF);
        assert_eq!(bus.keyboard.selected_row(), 0);
    }

    #[test]
    fn port_b_reports_status() {
        let mut bus = make_bus();
        assert_eq!(bus.io_read(PPI_PORT_B), 0x5E);
    }

    #[test]
    fn unmapped_ports_read_ff() {
        let mut bus = make_bus();
        assert_eq!(bus.io_read(0x7F00), 0xFF);
        assert_eq!(bus.io_read(0xFF00), 0xFF);
        bus.io_write(0xFF00, 0x12);
        bus.io_write(0xEF00, 0x12);
    }

    #[test]
    fn raster_interrupt_after_fifty_two_hsyncs() {
        let mut bus = make_bus();
        // Default geometry: 64 clocks per scanline, hsync at column 52.
        for _ in 0..51 * 64 + 51 {
            bus.clock();
        }
        assert!(!bus.interrupt_pending());
        bus.clock();
        assert!(bus.interrupt_pending());

        bus.interrupt_acknowledge();
        assert!(!bus.interrupt_pending());
    }

    #[test]
    fn vsync_reported_on_port_b() {
        let mut bus = make_bus();
        while !bus.crtc.in_vsync() {
            bus.clock();
        }
        assert_eq!(bus.io_read(PPI_PORT_B) & 0x01, 0x01);
    }

    #[test]
    fn reset_keeps_listeners_and_roms() {
        let mut bus = make_bus();
        bus.memory.load_rom(BASIC_ROM_SLOT, &[0x22; BANK_SIZE]);
        bus.io_write(0x7F00, 0x8D);
        bus.reset();
        assert_eq!(bus.crtc.listeners(SyncEvent::HSync).len(), 2);
        assert_eq!(bus.read(0xC000), 0x22);
        assert_eq!(bus.gate_array.mode(), 1);
    }
}
