//! CPC keyboard matrix.
//!
//! Ten rows of eight keys. The PPI's port C low nibble selects a row and
//! the PSG reads it back through its I/O port A. A pressed key reads as 0.
//!
//! | Row | Keys (bit 0-7)                                        |
//! |-----|-------------------------------------------------------|
//! | 0   | Up, Right, Down, f9, f6, f3, Enter, f.                |
//! | 1   | Left, Copy, f7, f8, f5, f1, f2, f0                    |
//! | 2   | Clr, [, Return, ], f4, Shift, \, Control              |
//! | 3   | ^, -, @, P, ;, :, /, .                                |
//! | 4   | 0, 9, O, I, L, K, M, ,                                |
//! | 5   | 8, 7, U, Y, H, J, N, Space                            |
//! | 6   | 6, 5, R, T, G, F, B, V (joystick 1)                   |
//! | 7   | 4, 3, E, W, S, D, C, X                                |
//! | 8   | 1, 2, Esc, Q, Tab, A, Caps Lock, Z                    |
//! | 9   | joystick 0 up, down, left, right, fire 1, fire 2, -, Del |
//!
//! Selecting rows 10–15 reads `0xFF`.

use crate::input::{CpcKey, JoystickButton};

pub const NUM_ROWS: usize = 10;

/// Keyboard rows shared by each joystick port.
pub const JOYSTICK_ROWS: [usize; 2] = [9, 6];

pub struct KeyboardMatrix {
    /// 1 = key held.
    rows: [u8; NUM_ROWS],
    /// 1 = switch closed, bits 0–5.
    joysticks: [u8; 2],
    selected_row: u8,
}

impl KeyboardMatrix {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rows: [0; NUM_ROWS],
            joysticks: [0; 2],
            selected_row: 0,
        }
    }

    /// Select row 0. Held keys stay held; the host owns them.
    pub fn reset(&mut self) {
        self.selected_row = 0;
    }

    /// Select the row to scan, from the low nibble of `value`.
    pub fn select_row(&mut self, value: u8) {
        self.selected_row = value & 0x0F;
    }

    #[must_use]
    pub fn selected_row(&self) -> u8 {
        self.selected_row
    }

    /// Active-low state of the selected row, joysticks included.
    #[must_use]
    pub fn read_row(&self) -> u8 {
        let row = self.selected_row as usize;
        if row >= NUM_ROWS {
            return 0xFF;
        }
        let mut held = self.rows[row];
        for (joystick, &joystick_row) in JOYSTICK_ROWS.iter().enumerate() {
            if joystick_row == row {
                held |= self.joysticks[joystick];
            }
        }
        !held
    }

    pub fn set_key(&mut self, key: CpcKey, pressed: bool) {
        let (row, bit) = key.matrix();
        if pressed {
            self.rows[row] |= 1 << bit;
        } else {
            self.rows[row] &= !(1 << bit);
        }
    }

    /// Set one switch of joystick 0 or 1. Other indices are ignored.
    pub fn set_joystick(&mut self, joystick: usize, button: JoystickButton, pressed: bool) {
        let Some(state) = self.joysticks.get_mut(joystick) else {
            return;
        };
        if pressed {
            *state |= 1 << button.bit();
        } else {
            *state &= !(1 << button.bit());
        }
    }

    /// Release every key and joystick switch.
    pub fn release_all(&mut self) {
        self.rows = [0; NUM_ROWS];
        self.joysticks = [0; 2];
    }
}

impl Default for KeyboardMatrix {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_rows_read_all_ones() {
        let mut keyboard = KeyboardMatrix::new();
        for row in 0..16 {
            keyboard.select_row(row);
            assert_eq!(keyboard.read_row(), 0xFF);
        }
    }

    #[test]
    fn pressed_key_pulls_its_bit_low() {
        let mut keyboard = KeyboardMatrix::new();
        keyboard.set_key(CpcKey::Space, true);
        keyboard.select_row(5);
        assert_eq!(keyboard.read_row(), 0x7F);
        keyboard.select_row(4);
        assert_eq!(keyboard.read_row(), 0xFF);

        keyboard.set_key(CpcKey::Space, false);
        keyboard.select_row(5);
        assert_eq!(keyboard.read_row(), 0xFF);
    }

    #[test]
    fn select_uses_low_nibble() {
        let mut keyboard = KeyboardMatrix::new();
        keyboard.select_row(0xF8);
        assert_eq!(keyboard.selected_row(), 8);
    }

    #[test]
    fn rows_past_nine_ignore_keys() {
        let mut keyboard = KeyboardMatrix::new();
        keyboard.set_key(CpcKey::Del, true);
        keyboard.select_row(10);
        assert_eq!(keyboard.read_row(), 0xFF);
    }

    #[test]
    fn joysticks_share_rows_with_keys() {
        let mut keyboard = KeyboardMatrix::new();
        keyboard.set_joystick(0, JoystickButton::Fire1, true);
        keyboard.set_key(CpcKey::Del, true);
        keyboard.select_row(9);
        assert_eq!(keyboard.read_row(), !0x90);

        keyboard.set_joystick(1, JoystickButton::Left, true);
        keyboard.select_row(6);
        assert_eq!(keyboard.read_row(), !0x04);
    }

    #[test]
    fn out_of_range_joystick_ignored() {
        let mut keyboard = KeyboardMatrix::new();
        keyboard.set_joystick(2, JoystickButton::Up, true);
        keyboard.select_row(9);
        assert_eq!(keyboard.read_row(), 0xFF);
    }

    #[test]
    fn release_all_clears_everything() {
        let mut keyboard = KeyboardMatrix::new();
        keyboard.set_key(CpcKey::A, true);
        keyboard.set_joystick(0, JoystickButton::Up, true);
        keyboard.release_all();
        keyboard.select_row(8);
        assert_eq!(keyboard.read_row(), 0xFF);
        keyboard.select_row(9);
        assert_eq!(keyboard.read_row(), 0xFF);
    }
}
