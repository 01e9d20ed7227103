//! Top-level CPC system.
//!
//! The Z80 runs at 3.9936 MHz (4 MHz less wait-state stretching) and
//! clocks the peripherals every 4 T-states, giving the 1 MHz CRTC/PSG
//! clock. The processor core is supplied by the host through
//! [`emu_core::Cpu`].
//!
//! # Frame loop
//!
//! [`Cpc::update`] executes one frame of T-states (79,872 at 50 Hz), then
//! offers the PSG's accumulated samples to the audio sink. Video frames
//! complete on their own whenever the CRTC raises vsync.

use emu_core::{AudioSink, Cpu, MasterClock, Observable, Value};

use crate::bus::CpcBus;
use crate::config::CpcConfig;
use crate::framebuffer::FrameBuffers;
use crate::input::{CpcKey, JoystickButton};
use crate::memory::{BASIC_ROM_SLOT, LOWER_ROM_SLOT};
use crate::registers::Z80Registers;

/// Z80 T-states per second.
pub const TSTATES_PER_SECOND: u32 = 3_993_600;

pub const FRAMES_PER_SECOND: u32 = 50;

/// T-states per peripheral clock tick.
pub const TSTATES_PER_CLOCK: u32 = 4;

pub const TIMING: MasterClock =
    MasterClock::new(TSTATES_PER_SECOND, FRAMES_PER_SECOND, TSTATES_PER_CLOCK);

pub const TSTATES_PER_FRAME: u32 = TIMING.tstates_per_frame();

/// Burst length for the pre-snapshot catch-up.
const PRE_SNAPSHOT_TSTATES: u32 = 15_600;

/// Give up the catch-up after this many bursts (about five frames).
const PRE_SNAPSHOT_MAX_BURSTS: u32 = 64;

/// Amstrad CPC system.
pub struct Cpc<C: Cpu<Registers = Z80Registers>> {
    cpu: C,
    bus: CpcBus,
    /// Completed `update` calls.
    frame_count: u64,
}

impl<C: Cpu<Registers = Z80Registers>> Cpc<C> {
    /// Create a CPC around `cpu`, with ROMs loaded from `config`.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty ROM image is shorter than 16K.
    #[must_use]
    pub fn new(cpu: C, config: &CpcConfig) -> Self {
        let mut bus = CpcBus::new(config.ram_kb);
        if !config.lower_rom.is_empty() {
            bus.memory.load_rom(LOWER_ROM_SLOT, &config.lower_rom);
        }
        if !config.basic_rom.is_empty() {
            bus.memory.load_rom(BASIC_ROM_SLOT, &config.basic_rom);
        }
        for (slot, image) in &config.expansion_roms {
            bus.memory.load_rom(*slot, image);
        }

        let mut cpc = Self {
            cpu,
            bus,
            frame_count: 0,
        };
        cpc.reset();
        cpc
    }

    /// Run one frame's worth of T-states, then hand the PSG's samples to
    /// `audio`. A sink that refuses them leaves the samples queued in the
    /// PSG for the next frame.
    ///
    /// Returns the number of T-states executed.
    pub fn update(&mut self, audio: &mut impl AudioSink) -> u32 {
        let dropped = self.bus.psg.dropped_samples();
        let executed = self.cpu.execute(TSTATES_PER_FRAME, &mut self.bus);
        let overflow = self.bus.psg.dropped_samples() - dropped;
        if overflow > 0 {
            log::trace!("PSG output buffer full, dropped {overflow} samples");
        }
        if !self.bus.psg.on_frame(|bytes| audio.submit(bytes)) {
            log::trace!(
                "audio sink deferred {} bytes ({} pending)",
                self.bus.psg.output().len(),
                audio.pending()
            );
        }
        self.frame_count += 1;
        executed
    }

    /// Reset the processor, then every peripheral. ROMs stay loaded.
    pub fn reset(&mut self) {
        self.cpu.reset();
        self.bus.reset();
        log::info!("CPC reset ({} banks of RAM)", self.bus.memory.banks());
    }

    /// Emulate the next video frame without drawing it.
    pub fn skip_next_frame(&mut self) {
        self.bus.monitor.skip_next_frame();
    }

    /// Run the machine in short bursts, undrawn, until the CRTC is in
    /// vsync. Snapshots without timing state expect to resume there.
    pub fn pre_snapshot_hack(&mut self) {
        let mut bursts = 0;
        while !self.bus.crtc.in_vsync() {
            if bursts == PRE_SNAPSHOT_MAX_BURSTS {
                log::warn!("no vsync after {bursts} catch-up bursts, loading snapshot anyway");
                return;
            }
            self.skip_next_frame();
            self.cpu.execute(PRE_SNAPSHOT_TSTATES, &mut self.bus);
            bursts += 1;
        }
        log::debug!("pre-snapshot catch-up reached vsync after {bursts} bursts");
    }

    /// Drive the interrupt request line directly.
    pub fn set_interrupt_request(&mut self, active: bool) {
        self.bus.gate_array.set_interrupt_request(active);
    }

    /// Frame output for the host.
    pub fn frame_buffers(&mut self) -> &mut FrameBuffers {
        self.bus.monitor.frames_mut()
    }

    /// Border colour (ARGB) sampled at the last vsync.
    #[must_use]
    pub fn border_colour(&self) -> u32 {
        self.bus.monitor.border_colour()
    }

    pub fn press_key(&mut self, key: CpcKey) {
        self.bus.keyboard.set_key(key, true);
    }

    pub fn release_key(&mut self, key: CpcKey) {
        self.bus.keyboard.set_key(key, false);
    }

    pub fn release_all_keys(&mut self) {
        self.bus.keyboard.release_all();
    }

    /// Set a switch on joystick 0 or 1.
    pub fn set_joystick(&mut self, joystick: usize, button: JoystickButton, pressed: bool) {
        self.bus.keyboard.set_joystick(joystick, button, pressed);
    }

    #[must_use]
    pub fn cpu(&self) -> &C {
        &self.cpu
    }

    pub fn cpu_mut(&mut self) -> &mut C {
        &mut self.cpu
    }

    #[must_use]
    pub fn bus(&self) -> &CpcBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut CpcBus {
        &mut self.bus
    }

    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

fn parse_address(text: &str) -> Option<u16> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).ok()
    } else if let Some(hex) = text.strip_prefix('$') {
        u16::from_str_radix(hex, 16).ok()
    } else {
        text.parse().ok()
    }
}

impl<C: Cpu<Registers = Z80Registers>> Observable for Cpc<C> {
    fn query(&self, path: &str) -> Option<Value> {
        let bus = &self.bus;
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.cpu.registers().query(rest)
        } else if let Some(rest) = path.strip_prefix("crtc.") {
            if let Some(index) = rest.strip_prefix("reg.") {
                let index: usize = index.parse().ok()?;
                return (index < motorola_6845::NUM_REGISTERS)
                    .then(|| bus.crtc.register_at(index).into());
            }
            match rest {
                "row" => Some(bus.crtc.row().into()),
                "scanline" => Some(bus.crtc.scanline().into()),
                "column" => Some(bus.crtc.column().into()),
                "hsync" => Some(bus.crtc.in_hsync().into()),
                "vsync" => Some(bus.crtc.in_vsync().into()),
                "selected" => Some(bus.crtc.selected_register().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("ga.") {
            match rest {
                "mode" => Some(bus.gate_array.mode().into()),
                "pen" => Some((bus.gate_array.current_pen() as u8).into()),
                "scanline_counter" => Some(bus.gate_array.scanline_counter().into()),
                "vsync_delay" => Some(bus.gate_array.vsync_delay().into()),
                "irq" => Some(bus.gate_array.int_active().into()),
                "border" => Some(self.border_colour().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("psg.") {
            if let Some(index) = rest.strip_prefix("reg.") {
                let index: u8 = index.parse().ok()?;
                return (usize::from(index) < gi_ay_3_8910::NUM_REGISTERS)
                    .then(|| bus.psg.register(index).into());
            }
            match rest {
                "selected" => Some(bus.psg.selected_register().into()),
                "envelope" => Some(bus.psg.envelope_level().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("ppi.") {
            match rest {
                "a" => Some(bus.ppi.port_a_latch().into()),
                "b" => Some(bus.ppi.port_b_latch().into()),
                "c" => Some(bus.ppi.port_c_latch().into()),
                _ => None,
            }
        } else if let Some(rest) = path.strip_prefix("memory.") {
            match rest {
                "bank_setup" => Some(bus.memory.bank_setup().into()),
                "upper_rom" => Some(bus.memory.upper_rom_select().into()),
                _ => parse_address(rest).map(|address| bus.memory.read(address).into()),
            }
        } else {
            match path {
                "frame_count" => Some(self.frame_count.into()),
                "keyboard.row" => Some(bus.keyboard.selected_row().into()),
                _ => None,
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &[
            "cpu.<register>",
            "crtc.row",
            "crtc.scanline",
            "crtc.column",
            "crtc.hsync",
            "crtc.vsync",
            "crtc.selected",
            "crtc.reg.<n>",
            "ga.mode",
            "ga.pen",
            "ga.scanline_counter",
            "ga.vsync_delay",
            "ga.irq",
            "ga.border",
            "psg.reg.<n>",
            "psg.selected",
            "psg.envelope",
            "ppi.a",
            "ppi.b",
            "ppi.c",
            "memory.<address>",
            "memory.bank_setup",
            "memory.upper_rom",
            "keyboard.row",
            "frame_count",
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RamSize;
    use crate::memory::BANK_SIZE;
    use crate::stub_cpu::StubCpu;
    use emu_core::Bus;

    /// Sink that records what it was offered.
    #[derive(Default)]
    struct RecordingSink {
        accept: bool,
        offered: Vec<usize>,
        accepted: usize,
    }

    impl AudioSink for RecordingSink {
        fn submit(&mut self, bytes: &[u8]) -> bool {
            self.offered.push(bytes.len());
            if self.accept {
                self.accepted += 1;
            }
            self.accept
        }

        fn pending(&self) -> usize {
            self.accepted
        }
    }

    fn make_cpc() -> Cpc<StubCpu> {
        let config = CpcConfig {
            lower_rom: vec![0x11; BANK_SIZE],
            basic_rom: vec![0x22; BANK_SIZE],
            expansion_roms: vec![(7, vec![0x77; BANK_SIZE])],
            ram_kb: RamSize::Ram128K,
        };
        Cpc::new(StubCpu::new(), &config)
    }

    #[test]
    fn frame_timing() {
        assert_eq!(TSTATES_PER_FRAME, 79_872);
        assert_eq!(TIMING.clock_hz(), gi_ay_3_8910::CLOCK_HZ);
    }

    #[test]
    fn roms_loaded_from_config() {
        let mut cpc = make_cpc();
        assert_eq!(cpc.query("memory.0x0000"), Some(Value::U8(0x11)));
        assert_eq!(cpc.query("memory.$C000"), Some(Value::U8(0x22)));
        cpc.bus_mut().memory.select_upper_rom(7);
        assert_eq!(cpc.query("memory.49152"), Some(Value::U8(0x77)));
    }

    #[test]
    fn update_runs_one_frame() {
        let mut cpc = make_cpc();
        let mut sink = RecordingSink {
            accept: true,
            ..RecordingSink::default()
        };
        let executed = cpc.update(&mut sink);
        assert_eq!(executed, TSTATES_PER_FRAME);
        assert_eq!(cpc.cpu().executed(), u64::from(TSTATES_PER_FRAME));
        assert_eq!(cpc.frame_count(), 1);
        // 79,872 T-states → 19,968 clocks → 2,496 tone updates → 832 samples.
        assert_eq!(sink.offered, vec![832 * 4]);
        assert!(cpc.bus().psg.output().is_empty());
    }

    #[test]
    fn rejected_audio_stays_queued() {
        let mut cpc = make_cpc();
        let mut sink = RecordingSink::default();
        cpc.update(&mut sink);
        cpc.update(&mut sink);
        assert_eq!(sink.offered, vec![832 * 4, 2 * 832 * 4]);
        assert_eq!(cpc.bus().psg.output().len(), 2 * 832 * 4);
    }

    #[test]
    fn frame_completes_during_update() {
        let mut cpc = make_cpc();
        let mut sink = RecordingSink::default();
        cpc.update(&mut sink);
        cpc.update(&mut sink);
        assert!(cpc.frame_buffers().push_to_display().is_some());
    }

    #[test]
    fn raster_interrupts_reach_the_cpu() {
        let mut cpc = make_cpc();
        let mut registers = Z80Registers::default();
        registers.iff1 = true;
        cpc.cpu_mut().set_registers(&registers);

        let mut sink = RecordingSink::default();
        cpc.update(&mut sink);
        // 312 hsyncs per update, one interrupt per 52 unless a vsync
        // resynchronises the counter first.
        let taken = cpc.cpu().interrupts_taken();
        assert!((5..=7).contains(&taken), "took {taken} interrupts");
    }

    #[test]
    fn pre_snapshot_hack_stops_in_vsync() {
        let mut cpc = make_cpc();
        cpc.pre_snapshot_hack();
        assert!(cpc.bus().crtc.in_vsync());
        assert!(cpc.cpu().executed() > 0);
    }

    #[test]
    fn reset_restores_power_on_state() {
        let mut cpc = make_cpc();
        cpc.bus_mut().io_write(0x7F00, 0x8C);
        cpc.bus_mut().memory.write(0x8000, 0x55);
        cpc.reset();
        assert_eq!(cpc.query("ga.mode"), Some(Value::U8(1)));
        assert_eq!(cpc.query("memory.0x8000"), Some(Value::U8(0)));
        assert_eq!(cpc.query("memory.0x0000"), Some(Value::U8(0x11)));
    }

    #[test]
    fn keys_reach_the_matrix() {
        let mut cpc = make_cpc();
        cpc.press_key(CpcKey::Esc);
        cpc.bus_mut().keyboard.select_row(8);
        assert_eq!(cpc.bus().keyboard.read_row(), !0x04);
        cpc.release_all_keys();
        assert_eq!(cpc.bus().keyboard.read_row(), 0xFF);
    }

    #[test]
    fn observable_paths() {
        let cpc = make_cpc();
        assert_eq!(cpc.query("cpu.pc"), Some(Value::U16(0)));
        assert_eq!(cpc.query("crtc.reg.1"), Some(Value::U8(0x28)));
        assert_eq!(cpc.query("crtc.reg.18"), None);
        assert_eq!(cpc.query("ga.irq"), Some(Value::Bool(false)));
        assert_eq!(cpc.query("psg.reg.7"), Some(Value::U8(0)));
        assert_eq!(cpc.query("frame_count"), Some(Value::U64(0)));
        assert_eq!(cpc.query("nonsense"), None);
        assert!(cpc.query_paths().contains(&"memory.<address>"));
    }
}
