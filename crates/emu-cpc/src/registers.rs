//! Z80 register block exchanged with the processor core.

#![allow(clippy::cast_possible_truncation)] // Intentional truncation for low byte extraction.

use emu_core::Value;

/// Every Z80 register and interrupt flag.
///
/// The processor core is external; this is the shape the machine uses to
/// read its state and to restore it from a snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Z80Registers {
    pub a: u8,
    pub f: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub h: u8,
    pub l: u8,

    pub a_alt: u8,
    pub f_alt: u8,
    pub b_alt: u8,
    pub c_alt: u8,
    pub d_alt: u8,
    pub e_alt: u8,
    pub h_alt: u8,
    pub l_alt: u8,

    pub ix: u16,
    pub iy: u16,
    pub sp: u16,
    pub pc: u16,
    pub i: u8,
    pub r: u8,

    pub iff1: bool,
    pub iff2: bool,
    pub im: u8,
}

impl Z80Registers {
    #[must_use]
    pub const fn af(&self) -> u16 {
        (self.a as u16) << 8 | self.f as u16
    }

    #[must_use]
    pub const fn bc(&self) -> u16 {
        (self.b as u16) << 8 | self.c as u16
    }

    #[must_use]
    pub const fn de(&self) -> u16 {
        (self.d as u16) << 8 | self.e as u16
    }

    #[must_use]
    pub const fn hl(&self) -> u16 {
        (self.h as u16) << 8 | self.l as u16
    }

    pub fn set_af_alt(&mut self, value: u16) {
        self.a_alt = (value >> 8) as u8;
        self.f_alt = value as u8;
    }

    pub fn set_bc_alt(&mut self, value: u16) {
        self.b_alt = (value >> 8) as u8;
        self.c_alt = value as u8;
    }

    pub fn set_de_alt(&mut self, value: u16) {
        self.d_alt = (value >> 8) as u8;
        self.e_alt = value as u8;
    }

    pub fn set_hl_alt(&mut self, value: u16) {
        self.h_alt = (value >> 8) as u8;
        self.l_alt = value as u8;
    }

    /// Look up a register by name (`a`, `hl`, `bc'`, `pc`, `iff1`, ...).
    #[must_use]
    pub fn query(&self, name: &str) -> Option<Value> {
        let pair = |hi: u8, lo: u8| (u16::from(hi) << 8) | u16::from(lo);
        match name {
            "a" => Some(self.a.into()),
            "f" => Some(self.f.into()),
            "b" => Some(self.b.into()),
            "c" => Some(self.c.into()),
            "d" => Some(self.d.into()),
            "e" => Some(self.e.into()),
            "h" => Some(self.h.into()),
            "l" => Some(self.l.into()),

            "af" => Some(self.af().into()),
            "bc" => Some(self.bc().into()),
            "de" => Some(self.de().into()),
            "hl" => Some(self.hl().into()),

            "af'" => Some(pair(self.a_alt, self.f_alt).into()),
            "bc'" => Some(pair(self.b_alt, self.c_alt).into()),
            "de'" => Some(pair(self.d_alt, self.e_alt).into()),
            "hl'" => Some(pair(self.h_alt, self.l_alt).into()),

            "ix" => Some(self.ix.into()),
            "iy" => Some(self.iy.into()),
            "sp" => Some(self.sp.into()),
            "pc" => Some(self.pc.into()),
            "i" => Some(self.i.into()),
            "r" => Some(self.r.into()),

            "iff1" => Some(self.iff1.into()),
            "iff2" => Some(self.iff2.into()),
            "im" => Some(self.im.into()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_combine_high_and_low() {
        let regs = Z80Registers {
            a: 0x12,
            f: 0x34,
            h: 0xC0,
            l: 0x01,
            ..Z80Registers::default()
        };
        assert_eq!(regs.af(), 0x1234);
        assert_eq!(regs.hl(), 0xC001);
    }

    #[test]
    fn alternate_pair_setters_split_bytes() {
        let mut regs = Z80Registers::default();
        regs.set_af_alt(0xABCD);
        regs.set_hl_alt(0x0102);
        assert_eq!((regs.a_alt, regs.f_alt), (0xAB, 0xCD));
        assert_eq!((regs.h_alt, regs.l_alt), (0x01, 0x02));
    }

    #[test]
    fn query_by_name() {
        let mut regs = Z80Registers {
            pc: 0x4000,
            iff1: true,
            ..Z80Registers::default()
        };
        regs.set_de_alt(0x1234);
        assert_eq!(regs.query("pc"), Some(Value::U16(0x4000)));
        assert_eq!(regs.query("de'"), Some(Value::U16(0x1234)));
        assert_eq!(regs.query("iff1"), Some(Value::Bool(true)));
        assert_eq!(regs.query("xyz"), None);
    }
}
