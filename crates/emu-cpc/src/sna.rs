//! SNA snapshot loader.
//!
//! A snapshot is a 256-byte header followed by a raw RAM dump:
//!
//! | Offset      | Contents                                          |
//! |-------------|---------------------------------------------------|
//! | $00-$07     | `"MV - SNA"`                                      |
//! | $10         | version (1, 2 or 3)                               |
//! | $11-$2D     | Z80 registers                                     |
//! | $2E         | gate array selected pen                           |
//! | $2F-$3F     | gate array pen colours (16 inks + border)         |
//! | $40         | gate array mode / ROM configuration               |
//! | $41         | RAM bank setup                                    |
//! | $42         | CRTC selected register                            |
//! | $43-$54     | CRTC registers 0-17                               |
//! | $55         | upper ROM select                                  |
//! | $56-$59     | PPI ports A, B, C and control                     |
//! | $5A         | PSG selected register                             |
//! | $5B-$6A     | PSG registers 0-15                                |
//! | $6B-$6C     | RAM dump size in KB (64 or 128)                   |
//! | $A9-$B4     | v3 only: CRTC counters, gate array counters, IRQ  |
//! | $100        | RAM dump                                          |
//!
//! Version 1 and 2 snapshots carry no raster position, so the machine is
//! first run up to a vsync, where such snapshots expect to resume.
//!
//! The whole header is validated before anything is applied: a load
//! either succeeds completely or leaves the machine untouched.

use emu_core::Cpu;
use motorola_6845::{Crtc6845, Register};
use thiserror::Error;

use crate::cpc::Cpc;
use crate::gate_array::{BORDER_PEN, SCANLINES_PER_INTERRUPT, VSYNC_DELAY};
use crate::memory::BANK_SIZE;
use crate::registers::Z80Registers;

const MAGIC: &[u8; 8] = b"MV - SNA";

mod offset {
    pub const VERSION: usize = 0x10;
    pub const REGISTERS: usize = 0x11;
    pub const GA_PEN: usize = 0x2E;
    pub const GA_COLOURS: usize = 0x2F;
    pub const GA_CONFIG: usize = 0x40;
    pub const RAM_CONFIG: usize = 0x41;
    pub const CRTC_SELECTED: usize = 0x42;
    pub const CRTC_REGISTERS: usize = 0x43;
    pub const ROM_SELECT: usize = 0x55;
    pub const PPI_A: usize = 0x56;
    pub const PPI_B: usize = 0x57;
    pub const PPI_C: usize = 0x58;
    pub const PPI_CONTROL: usize = 0x59;
    pub const PSG_SELECTED: usize = 0x5A;
    pub const PSG_REGISTERS: usize = 0x5B;
    pub const RAM_SIZE: usize = 0x6B;

    pub const CRTC_COLUMN: usize = 0xA9;
    pub const CRTC_ROW: usize = 0xAB;
    pub const CRTC_SCANLINE: usize = 0xAC;
    pub const CRTC_HSYNC_COUNT: usize = 0xAE;
    pub const CRTC_VSYNC_COUNT: usize = 0xAF;
    pub const CRTC_FLAGS: usize = 0xB0;
    pub const GA_VSYNC_DELAY: usize = 0xB2;
    pub const GA_SCANLINE_COUNT: usize = 0xB3;
    pub const IRQ: usize = 0xB4;

    pub const RAM: usize = 0x100;
}

/// Size of the fixed header.
pub const HEADER_SIZE: usize = offset::RAM;

/// First version carrying raster timing.
const TIMING_VERSION: u8 = 3;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SnaError {
    #[error("not an SNA snapshot (bad magic)")]
    BadMagic,

    #[error("snapshot truncated: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },

    #[error("unsupported RAM dump size {0}K")]
    UnsupportedRamSize(u16),

    #[error("snapshot {field} {value} is outside the saved CRTC/gate array geometry")]
    TimingOutOfRange { field: &'static str, value: u8 },
}

/// Raster state stored by version 3 snapshots.
struct Timing {
    column: u8,
    row: u8,
    scanline: u8,
    hsync_count: u8,
    vsync_count: u8,
    hsync_on: bool,
    vsync_on: bool,
    ga_scanline_count: u8,
    ga_vsync_delay: u8,
    irq: bool,
}

fn word(data: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([data[at], data[at + 1]])
}

fn out_of_range(field: &'static str, value: u8) -> SnaError {
    SnaError::TimingOutOfRange { field, value }
}

/// Check the v3 raster state against the snapshot's own CRTC registers.
fn validate_timing(data: &[u8]) -> Result<Timing, SnaError> {
    let flags = data[offset::CRTC_FLAGS];
    let timing = Timing {
        column: data[offset::CRTC_COLUMN],
        row: data[offset::CRTC_ROW],
        scanline: data[offset::CRTC_SCANLINE],
        hsync_count: data[offset::CRTC_HSYNC_COUNT],
        vsync_count: data[offset::CRTC_VSYNC_COUNT],
        hsync_on: flags & 0x02 != 0,
        vsync_on: flags & 0x01 != 0,
        ga_scanline_count: data[offset::GA_SCANLINE_COUNT],
        ga_vsync_delay: data[offset::GA_VSYNC_DELAY],
        irq: data[offset::IRQ] != 0,
    };

    let mut crtc: Crtc6845 = Crtc6845::new();
    for (index, &value) in data[offset::CRTC_REGISTERS..][..motorola_6845::NUM_REGISTERS]
        .iter()
        .enumerate()
    {
        crtc.select_register(index as u8);
        crtc.write_selected(value);
    }

    if timing.column > crtc.reg(Register::HorizontalTotal) {
        return Err(out_of_range("column", timing.column));
    }
    if timing.row > crtc.reg(Register::VerticalTotal) {
        return Err(out_of_range("row", timing.row));
    }
    if timing.scanline > crtc.reg(Register::MaximumRasterAddress) {
        return Err(out_of_range("scanline", timing.scanline));
    }
    if timing.hsync_on && timing.hsync_count > crtc.hsync_width() {
        return Err(out_of_range("hsync count", timing.hsync_count));
    }
    if timing.vsync_on && timing.vsync_count > crtc.vsync_width() {
        return Err(out_of_range("vsync count", timing.vsync_count));
    }
    if timing.ga_scanline_count >= SCANLINES_PER_INTERRUPT {
        return Err(out_of_range("interrupt scanline count", timing.ga_scanline_count));
    }
    if timing.ga_vsync_delay > VSYNC_DELAY {
        return Err(out_of_range("vsync delay", timing.ga_vsync_delay));
    }
    Ok(timing)
}

fn read_registers(data: &[u8]) -> Z80Registers {
    let r = &data[offset::REGISTERS..];
    let mut registers = Z80Registers {
        f: r[0],
        a: r[1],
        c: r[2],
        b: r[3],
        e: r[4],
        d: r[5],
        l: r[6],
        h: r[7],
        r: r[8],
        i: r[9],
        iff1: r[10] != 0,
        iff2: r[11] != 0,
        ix: word(r, 12),
        iy: word(r, 14),
        sp: word(r, 16),
        pc: word(r, 18),
        im: r[20],
        ..Z80Registers::default()
    };
    registers.set_af_alt(word(r, 21));
    registers.set_bc_alt(word(r, 23));
    registers.set_de_alt(word(r, 25));
    registers.set_hl_alt(word(r, 27));
    registers
}

/// Load an SNA snapshot into `cpc`.
///
/// # Errors
///
/// Returns an error, with the machine untouched, if the magic is wrong,
/// the data is shorter than its header and declared RAM dump, the RAM
/// size is not 64K (or 128K on a machine with the expansion), or v3 timing
/// fields don't fit the saved CRTC geometry.
pub fn load_sna<C: Cpu<Registers = Z80Registers>>(
    cpc: &mut Cpc<C>,
    data: &[u8],
) -> Result<(), SnaError> {
    if !data.starts_with(MAGIC) {
        return Err(SnaError::BadMagic);
    }
    if data.len() < HEADER_SIZE {
        return Err(SnaError::Truncated {
            needed: HEADER_SIZE,
            actual: data.len(),
        });
    }

    let version = data[offset::VERSION];
    let ram_kb = word(data, offset::RAM_SIZE);
    let banks = match ram_kb {
        64 => 4,
        128 if cpc.bus().memory.banks() >= 8 => 8,
        _ => return Err(SnaError::UnsupportedRamSize(ram_kb)),
    };
    let needed = HEADER_SIZE + banks * BANK_SIZE;
    if data.len() < needed {
        return Err(SnaError::Truncated {
            needed,
            actual: data.len(),
        });
    }
    let timing = if version >= TIMING_VERSION {
        Some(validate_timing(data)?)
    } else {
        None
    };

    if timing.is_none() {
        cpc.pre_snapshot_hack();
    }

    cpc.cpu_mut().set_registers(&read_registers(data));

    let bus = cpc.bus_mut();

    let pen = data[offset::GA_PEN];
    bus.gate_array.set_current_pen(if pen & 0x10 != 0 {
        BORDER_PEN
    } else {
        usize::from(pen & 0x0F)
    });
    for (pen, &colour) in data[offset::GA_COLOURS..][..=BORDER_PEN].iter().enumerate() {
        bus.gate_array.set_pen_colour(pen, colour & 0x1F);
    }
    bus.gate_array
        .write_mode_and_rom(data[offset::GA_CONFIG], &mut bus.memory);
    bus.memory.select_bank(data[offset::RAM_CONFIG] & 0x07);

    for (index, &value) in data[offset::CRTC_REGISTERS..][..motorola_6845::NUM_REGISTERS]
        .iter()
        .enumerate()
    {
        bus.crtc.select_register(index as u8);
        bus.crtc.write_selected(value);
    }
    bus.crtc.select_register(data[offset::CRTC_SELECTED]);

    bus.memory.select_upper_rom(data[offset::ROM_SELECT]);

    // Data after control: a mode set clears the latches. Port C drives the
    // keyboard row and PSG bus function as a CPU write would; the PSG
    // registers are restored below.
    bus.ppi_write(3, data[offset::PPI_CONTROL] | 0x80);
    bus.ppi_write(0, data[offset::PPI_A]);
    bus.ppi_write(1, data[offset::PPI_B]);
    bus.ppi_write(2, data[offset::PPI_C]);

    for (index, &value) in data[offset::PSG_REGISTERS..][..gi_ay_3_8910::NUM_REGISTERS]
        .iter()
        .enumerate()
    {
        bus.psg.write_register(index as u8, value);
    }
    bus.psg.select_register(data[offset::PSG_SELECTED]);

    if let Some(timing) = timing {
        bus.crtc.set_timing(
            timing.column,
            timing.row,
            timing.scanline,
            timing.hsync_count,
            timing.vsync_count,
            timing.hsync_on,
            timing.vsync_on,
        );
        bus.gate_array
            .set_counters(timing.ga_scanline_count, timing.ga_vsync_delay);
        bus.gate_array.set_interrupt_request(timing.irq);
    }

    bus.memory.bulk_load_ram(&data[offset::RAM..], banks);

    log::info!("loaded SNA v{version} snapshot ({ram_kb}K RAM)");
    Ok(())
}
