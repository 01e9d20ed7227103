//! Logical CPC keys and joystick buttons.
//!
//! Every key maps to a (row, bit) position in the 10×8 keyboard matrix.
//! Row 9 doubles as joystick 0; joystick 1 shares row 6 with keys.

/// Logical key on the CPC 464 keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CpcKey {
    // Row 0
    CursorUp,
    CursorRight,
    CursorDown,
    F9,
    F6,
    F3,
    SmallEnter,
    FDot,
    // Row 1
    CursorLeft,
    Copy,
    F7,
    F8,
    F5,
    F1,
    F2,
    F0,
    // Row 2
    Clr,
    LeftBracket,
    Return,
    RightBracket,
    F4,
    Shift,
    Backslash,
    Control,
    // Row 3
    Caret,
    Minus,
    At,
    P,
    Semicolon,
    Colon,
    Slash,
    Period,
    // Row 4
    N0,
    N9,
    O,
    I,
    L,
    K,
    M,
    Comma,
    // Row 5
    N8,
    N7,
    U,
    Y,
    H,
    J,
    N,
    Space,
    // Row 6
    N6,
    N5,
    R,
    T,
    G,
    F,
    B,
    V,
    // Row 7
    N4,
    N3,
    E,
    W,
    S,
    D,
    C,
    X,
    // Row 8
    N1,
    N2,
    Esc,
    Q,
    Tab,
    A,
    CapsLock,
    Z,
    // Row 9 (bit 6 unused)
    Joy0Up,
    Joy0Down,
    Joy0Left,
    Joy0Right,
    Joy0Fire1,
    Joy0Fire2,
    Del,
}

impl CpcKey {
    /// Matrix position: (row, bit).
    #[must_use]
    pub const fn matrix(self) -> (usize, u8) {
        match self {
            Self::CursorUp => (0, 0),
            Self::CursorRight => (0, 1),
            Self::CursorDown => (0, 2),
            Self::F9 => (0, 3),
            Self::F6 => (0, 4),
            Self::F3 => (0, 5),
            Self::SmallEnter => (0, 6),
            Self::FDot => (0, 7),

            Self::CursorLeft => (1, 0),
            Self::Copy => (1, 1),
            Self::F7 => (1, 2),
            Self::F8 => (1, 3),
            Self::F5 => (1, 4),
            Self::F1 => (1, 5),
            Self::F2 => (1, 6),
            Self::F0 => (1, 7),

            Self::Clr => (2, 0),
            Self::LeftBracket => (2, 1),
            Self::Return => (2, 2),
            Self::RightBracket => (2, 3),
            Self::F4 => (2, 4),
            Self::Shift => (2, 5),
            Self::Backslash => (2, 6),
            Self::Control => (2, 7),

            Self::Caret => (3, 0),
            Self::Minus => (3, 1),
            Self::At => (3, 2),
            Self::P => (3, 3),
            Self::Semicolon => (3, 4),
            Self::Colon => (3, 5),
            Self::Slash => (3, 6),
            Self::Period => (3, 7),

            Self::N0 => (4, 0),
            Self::N9 => (4, 1),
            Self::O => (4, 2),
            Self::I => (4, 3),
            Self::L => (4, 4),
            Self::K => (4, 5),
            Self::M => (4, 6),
            Self::Comma => (4, 7),

            Self::N8 => (5, 0),
            Self::N7 => (5, 1),
            Self::U => (5, 2),
            Self::Y => (5, 3),
            Self::H => (5, 4),
            Self::J => (5, 5),
            Self::N => (5, 6),
            Self::Space => (5, 7),

            Self::N6 => (6, 0),
            Self::N5 => (6, 1),
            Self::R => (6, 2),
            Self::T => (6, 3),
            Self::G => (6, 4),
            Self::F => (6, 5),
            Self::B => (6, 6),
            Self::V => (6, 7),

            Self::N4 => (7, 0),
            Self::N3 => (7, 1),
            Self::E => (7, 2),
            Self::W => (7, 3),
            Self::S => (7, 4),
            Self::D => (7, 5),
            Self::C => (7, 6),
            Self::X => (7, 7),

            Self::N1 => (8, 0),
            Self::N2 => (8, 1),
            Self::Esc => (8, 2),
            Self::Q => (8, 3),
            Self::Tab => (8, 4),
            Self::A => (8, 5),
            Self::CapsLock => (8, 6),
            Self::Z => (8, 7),

            Self::Joy0Up => (9, 0),
            Self::Joy0Down => (9, 1),
            Self::Joy0Left => (9, 2),
            Self::Joy0Right => (9, 3),
            Self::Joy0Fire1 => (9, 4),
            Self::Joy0Fire2 => (9, 5),
            Self::Del => (9, 7),
        }
    }
}

/// Digital joystick switch. The discriminant is the matrix bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoystickButton {
    Up = 0,
    Down = 1,
    Left = 2,
    Right = 3,
    Fire1 = 4,
    Fire2 = 5,
}

impl JoystickButton {
    #[must_use]
    pub const fn bit(self) -> u8 {
        self as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_matrix_rows() {
        assert_eq!(CpcKey::CursorUp.matrix(), (0, 0));
        assert_eq!(CpcKey::Return.matrix(), (2, 2));
        assert_eq!(CpcKey::Space.matrix(), (5, 7));
        assert_eq!(CpcKey::Z.matrix(), (8, 7));
        assert_eq!(CpcKey::Del.matrix(), (9, 7));
    }

    #[test]
    fn joystick_zero_keys_match_buttons() {
        assert_eq!(CpcKey::Joy0Up.matrix(), (9, JoystickButton::Up.bit()));
        assert_eq!(CpcKey::Joy0Fire2.matrix(), (9, JoystickButton::Fire2.bit()));
    }
}
