//! CPC machine configuration.

use crate::memory::{BANK_SIZE, BASE_BANKS, TOTAL_BANKS};

/// Fitted RAM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RamSize {
    /// Stock 464: banks 0–3 only.
    Ram64K,
    /// 464 with the 64K expansion, or a 6128.
    #[default]
    Ram128K,
}

impl RamSize {
    /// 16K banks fitted.
    #[must_use]
    pub const fn banks(self) -> usize {
        match self {
            Self::Ram64K => BASE_BANKS,
            Self::Ram128K => TOTAL_BANKS,
        }
    }

    /// Size in kilobytes, as stored in snapshots.
    #[must_use]
    pub const fn kilobytes(self) -> u16 {
        (self.banks() * BANK_SIZE / 1024) as u16
    }
}

/// Configuration for creating a [`Cpc`](crate::Cpc).
#[derive(Debug, Clone, Default)]
pub struct CpcConfig {
    /// OS ROM, loaded into slot 255 unless empty. At least 16,384 bytes.
    pub lower_rom: Vec<u8>,
    /// BASIC, loaded into upper ROM slot 0. Left empty, slot 0 stays
    /// unloaded.
    pub basic_rom: Vec<u8>,
    /// Extra upper ROMs as (slot, image).
    pub expansion_roms: Vec<(u8, Vec<u8>)>,
    pub ram_kb: RamSize,
}

impl CpcConfig {
    /// Configuration from a combined 32K OS + BASIC image, as shipped in
    /// `cpc464.rom`. Returns `None` if the image is shorter than 32K.
    #[must_use]
    pub fn cpc464(rom_image: &[u8]) -> Option<Self> {
        if rom_image.len() < 2 * BANK_SIZE {
            return None;
        }
        let (lower, basic) = rom_image.split_at(BANK_SIZE);
        Some(Self {
            lower_rom: lower.to_vec(),
            basic_rom: basic[..BANK_SIZE].to_vec(),
            expansion_roms: Vec::new(),
            ram_kb: RamSize::Ram128K,
        })
    }
}
