//! CPC hardware palette.
//!
//! The gate array drives each RGB gun at one of three levels (off, half,
//! full), giving 27 distinct colours. The 5-bit hardware colour number
//! carries five duplicates, so the table has 32 entries.

/// ARGB32 colour for each hardware colour number (0–31).
pub const PALETTE: [u32; 32] = [
    0xFF80_8080, // 0: White
    0xFF80_8080, // 1: White (duplicate)
    0xFF00_FF80, // 2: Sea green
    0xFFFF_FF80, // 3: Pastel yellow
    0xFF00_0080, // 4: Blue
    0xFFFF_0080, // 5: Purple
    0xFF00_8080, // 6: Cyan
    0xFFFF_8080, // 7: Pink
    0xFFFF_0080, // 8: Purple (duplicate)
    0xFFFF_FF80, // 9: Pastel yellow (duplicate)
    0xFFFF_FF00, // 10: Bright yellow
    0xFFFF_FFFF, // 11: Bright white
    0xFFFF_0000, // 12: Bright red
    0xFFFF_00FF, // 13: Bright magenta
    0xFFFF_8000, // 14: Orange
    0xFFFF_80FF, // 15: Pastel magenta
    0xFF00_0080, // 16: Blue (duplicate)
    0xFF00_FF80, // 17: Sea green (duplicate)
    0xFF00_FF00, // 18: Bright green
    0xFF00_FFFF, // 19: Bright cyan
    0xFF00_0000, // 20: Black
    0xFF00_00FF, // 21: Bright blue
    0xFF00_8000, // 22: Green
    0xFF00_80FF, // 23: Sky blue
    0xFF80_0080, // 24: Magenta
    0xFF80_FF80, // 25: Pastel green
    0xFF80_FF00, // 26: Lime
    0xFF80_FFFF, // 27: Pastel cyan
    0xFF80_0000, // 28: Red
    0xFF80_00FF, // 29: Mauve
    0xFF80_8000, // 30: Yellow
    0xFF80_80FF, // 31: Pastel blue
];
