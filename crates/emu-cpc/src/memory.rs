//! CPC memory: banked RAM with lower and upper ROM overlays.
//!
//! The 64K address space is four 16K windows. Each window maps to a
//! physical RAM bank through one of eight fixed bank setups (selected by
//! the gate array's RAM register). ROMs overlay reads only:
//!
//! | Window        | Read (ROM enabled)          | Write |
//! |---------------|-----------------------------|-------|
//! | $0000-$3FFF   | lower ROM (slot 255)        | RAM   |
//! | $4000-$BFFF   | RAM                         | RAM   |
//! | $C000-$FFFF   | selected upper ROM          | RAM   |
//!
//! Writes always land in RAM, which is how the firmware builds the screen
//! under the BASIC ROM.

use crate::config::RamSize;

/// Size of a RAM bank and of a ROM image.
pub const BANK_SIZE: usize = 0x4000;

/// Banks in the base 64K.
pub const BASE_BANKS: usize = 4;

/// Banks with the 64K expansion fitted.
pub const TOTAL_BANKS: usize = 8;

/// Number of addressable ROM slots.
pub const NUM_ROM_SLOTS: usize = 256;

/// Slot holding the always-present lower (OS) ROM.
pub const LOWER_ROM_SLOT: u8 = 255;

/// Upper ROM used when the selected slot is empty.
pub const BASIC_ROM_SLOT: u8 = 0;

/// Number of RAM bank setups.
pub const NUM_BANK_SETUPS: usize = 8;

/// Physical bank for each 16K window, per setup.
const BANK_SETUPS: [[usize; 4]; NUM_BANK_SETUPS] = [
    [0, 1, 2, 3],
    [0, 1, 2, 7],
    [4, 5, 6, 7],
    [0, 3, 2, 7],
    [0, 4, 2, 3],
    [0, 5, 2, 3],
    [0, 6, 2, 3],
    [0, 7, 2, 3],
];

type RomImage = Box<[u8; BANK_SIZE]>;

/// Banked RAM plus the 256-slot ROM table.
pub struct Memory {
    ram: Vec<u8>,
    roms: Vec<Option<RomImage>>,
    bank_setup: u8,
    upper_rom_enabled: bool,
    lower_rom_enabled: bool,
    upper_rom_select: u8,
}

impl Memory {
    #[must_use]
    pub fn new(ram_size: RamSize) -> Self {
        let mut memory = Self {
            ram: vec![0; ram_size.banks() * BANK_SIZE],
            roms: (0..NUM_ROM_SLOTS).map(|_| None).collect(),
            bank_setup: 0,
            upper_rom_enabled: true,
            lower_rom_enabled: true,
            upper_rom_select: BASIC_ROM_SLOT,
        };
        memory.reset();
        memory
    }

    /// Clear RAM and restore power-on banking. Loaded ROMs are kept.
    pub fn reset(&mut self) {
        self.ram.fill(0);
        self.bank_setup = 0;
        self.upper_rom_enabled = true;
        self.lower_rom_enabled = true;
        self.upper_rom_select = BASIC_ROM_SLOT;
    }

    /// Install a ROM image. Only the first 16K of `image` is used.
    ///
    /// # Panics
    ///
    /// Panics if `image` is shorter than 16K.
    pub fn load_rom(&mut self, slot: u8, image: &[u8]) {
        assert!(
            image.len() >= BANK_SIZE,
            "ROM image for slot {slot} is {} bytes, need {BANK_SIZE}",
            image.len()
        );
        let mut rom = Box::new([0u8; BANK_SIZE]);
        rom.copy_from_slice(&image[..BANK_SIZE]);
        self.roms[slot as usize] = Some(rom);
        log::debug!("loaded ROM into slot {slot}");
    }

    pub fn unload_rom(&mut self, slot: u8) {
        if self.roms[slot as usize].take().is_some() {
            log::debug!("unloaded ROM from slot {slot}");
        }
    }

    #[must_use]
    pub fn has_rom(&self, slot: u8) -> bool {
        self.roms[slot as usize].is_some()
    }

    /// Select the upper ROM. Empty slots select BASIC instead.
    pub fn select_upper_rom(&mut self, slot: u8) {
        if self.has_rom(slot) {
            self.upper_rom_select = slot;
        } else {
            log::debug!("upper ROM slot {slot} empty, using slot {BASIC_ROM_SLOT}");
            self.upper_rom_select = BASIC_ROM_SLOT;
        }
    }

    #[must_use]
    pub fn upper_rom_select(&self) -> u8 {
        self.upper_rom_select
    }

    pub fn set_upper_rom_enabled(&mut self, enabled: bool) {
        self.upper_rom_enabled = enabled;
    }

    pub fn set_lower_rom_enabled(&mut self, enabled: bool) {
        self.lower_rom_enabled = enabled;
    }

    #[must_use]
    pub fn upper_rom_enabled(&self) -> bool {
        self.upper_rom_enabled
    }

    #[must_use]
    pub fn lower_rom_enabled(&self) -> bool {
        self.lower_rom_enabled
    }

    /// Switch to one of the eight bank setups.
    ///
    /// Without the expansion fitted, setups that name banks 4–7 have no
    /// effect.
    ///
    /// # Panics
    ///
    /// Panics if `setup` is not below 8.
    pub fn select_bank(&mut self, setup: u8) {
        assert!(
            (setup as usize) < NUM_BANK_SETUPS,
            "bank setup {setup} out of range"
        );
        let fits = BANK_SETUPS[setup as usize]
            .iter()
            .all(|&bank| bank < self.banks());
        if fits {
            self.bank_setup = setup;
        } else {
            log::trace!("bank setup {setup} needs expansion RAM, ignored");
        }
    }

    #[must_use]
    pub fn bank_setup(&self) -> u8 {
        self.bank_setup
    }

    /// Physical RAM banks fitted.
    #[must_use]
    pub fn banks(&self) -> usize {
        self.ram.len() / BANK_SIZE
    }

    fn ram_offset(&self, address: u16) -> usize {
        let window = (address >> 14) as usize;
        let bank = BANK_SETUPS[self.bank_setup as usize][window];
        bank * BANK_SIZE + (address as usize & (BANK_SIZE - 1))
    }

    /// CPU read, honouring the ROM overlays.
    #[must_use]
    pub fn read(&self, address: u16) -> u8 {
        let offset = address as usize & (BANK_SIZE - 1);
        if address < 0x4000 && self.lower_rom_enabled {
            if let Some(rom) = &self.roms[LOWER_ROM_SLOT as usize] {
                return rom[offset];
            }
        } else if address >= 0xC000 && self.upper_rom_enabled {
            let rom = self.roms[self.upper_rom_select as usize]
                .as_ref()
                .or(self.roms[BASIC_ROM_SLOT as usize].as_ref());
            if let Some(rom) = rom {
                return rom[offset];
            }
        }
        self.ram[self.ram_offset(address)]
    }

    /// CPU write. Always goes to RAM.
    pub fn write(&mut self, address: u16, value: u8) {
        let offset = self.ram_offset(address);
        self.ram[offset] = value;
    }

    /// Overwrite the first `bank_count` banks from `bytes`.
    ///
    /// # Panics
    ///
    /// Panics if `bank_count` is not 4 or 8, exceeds the fitted RAM, or
    /// `bytes` is too short.
    pub fn bulk_load_ram(&mut self, bytes: &[u8], bank_count: usize) {
        assert!(
            bank_count == BASE_BANKS || bank_count == TOTAL_BANKS,
            "bulk RAM load must be 4 or 8 banks, got {bank_count}"
        );
        assert!(bank_count <= self.banks(), "only {} banks fitted", self.banks());
        let len = bank_count * BANK_SIZE;
        self.ram[..len].copy_from_slice(&bytes[..len]);
    }

    /// Read physical RAM for the video fetch. `offset` wraps at the RAM
    /// size.
    #[must_use]
    pub fn video_peek(&self, offset: usize) -> u8 {
        self.ram[offset & (self.ram.len() - 1)]
    }

    /// All physical RAM, bank 0 first.
    #[must_use]
    pub fn ram(&self) -> &[u8] {
        &self.ram
    }
}
