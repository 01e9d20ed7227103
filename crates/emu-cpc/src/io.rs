//! CPC I/O port decoding.
//!
//! Devices are selected by individual low-active address lines in the
//! high byte of the port. The first matching line wins:
//!
//! | Condition              | Device                      |
//! |------------------------|-----------------------------|
//! | A15=0, A14=1           | Gate array                  |
//! | A15=0, A14=0           | RAM configuration           |
//! | A14=0                  | CRTC (function = A9-A8)     |
//! | A13=0                  | Upper ROM select            |
//! | A12=0                  | Printer port                |
//! | A11=0                  | PPI (function = A9-A8)      |
//! | A10=0                  | Expansion peripherals       |

/// Device addressed by an I/O port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoDevice {
    GateArray,
    RamConfig,
    /// CRTC with function 0–3.
    Crtc(u8),
    RomSelect,
    PrinterPort,
    /// PPI with function 0–3.
    Ppi(u8),
    Expansion,
    Unknown,
}

impl IoDevice {
    #[must_use]
    pub fn decode(port: u16) -> Self {
        let function = ((port >> 8) & 0x03) as u8;
        if port & 0x8000 == 0 {
            if port & 0x4000 != 0 {
                Self::GateArray
            } else {
                Self::RamConfig
            }
        } else if port & 0x4000 == 0 {
            Self::Crtc(function)
        } else if port & 0x2000 == 0 {
            Self::RomSelect
        } else if port & 0x1000 == 0 {
            Self::PrinterPort
        } else if port & 0x0800 == 0 {
            Self::Ppi(function)
        } else if port & 0x0400 == 0 {
            Self::Expansion
        } else {
            Self::Unknown
        }
    }
}

/// Manufacturer code on PPI port B bits 3–1.
pub const MANUFACTURER_AMSTRAD: u8 = 7;

/// PPI port B input: cassette in, printer ready, expansion, 50 Hz,
/// manufacturer, vsync.
#[must_use]
pub fn port_b_status(vsync: bool) -> u8 {
    let cassette_read = 0;
    let printer_ready = 1;
    let expansion = 0;
    let refresh_50hz = 1;
    (cassette_read << 7)
        | (printer_ready << 6)
        | (expansion << 5)
        | (refresh_50hz << 4)
        | (MANUFACTURER_AMSTRAD << 1)
        | u8::from(vsync)
}
