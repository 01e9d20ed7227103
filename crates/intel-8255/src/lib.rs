//! Intel 8255 Programmable Peripheral Interface.
//!
//! Three 8-bit ports and a write-only control register. Port C is split
//! into two nibbles with independent direction. Only mode 0 (basic I/O)
//! is modelled; other modes are latched but behave as mode 0.
//!
//! # Functions (address bits 9–8 on the CPC)
//!
//! | Fn | Name    | Read               | Write                    |
//! |----|---------|--------------------|--------------------------|
//! | 0  | Port A  | pins or latch      | latch (+ pins if output) |
//! | 1  | Port B  | pins or latch      | latch                    |
//! | 2  | Port C  | latch, inputs high | latch (+ pins if output) |
//! | 3  | Control | $FF                | mode set / bit set-reset |
//!
//! # Control word
//!
//! Bit 7 set (mode set):
//! - bits 6–5: port A / C-upper mode
//! - bit 4: port A input
//! - bit 3: port C upper input
//! - bit 2: port B / C-lower mode
//! - bit 1: port B input
//! - bit 0: port C lower input
//!
//! A mode set clears all three port latches to $00.
//!
//! Bit 7 clear (bit set/reset): bits 3–1 name a port C bit, bit 0 is the
//! new level.
//!
//! The chip has no view of what is wired to its pins. Reads of input
//! ports and writes to output ports go through a [`PpiPorts`]
//! implementation supplied by the owner on every access.

/// What the PPI's pins are connected to.
pub trait PpiPorts {
    /// Level on the port A pins while port A is an input. `latch` is the
    /// port A output latch, for devices that leave the bus undriven.
    fn port_a_read(&mut self, latch: u8) -> u8;

    /// Port A was written while configured as an output.
    fn port_a_write(&mut self, value: u8);

    /// Level on the port B pins while port B is an input.
    fn port_b_read(&mut self) -> u8;

    /// Port C lower nibble changed while configured as an output.
    fn port_c_lower_write(&mut self, nibble: u8);

    /// Port C upper half changed while configured as an output. `value` is
    /// the full port C latch; `port_a` is the current port A latch.
    fn port_c_upper_write(&mut self, value: u8, port_a: u8);
}

/// Direction, mode and latch of one port (or half-port).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PortState {
    input: bool,
    mode: u8,
    data: u8,
}

impl PortState {
    const RESET: Self = Self {
        input: true,
        mode: 0,
        data: 0xFF,
    };
}

/// Intel 8255 PPI.
#[derive(Debug, Clone)]
pub struct Ppi8255 {
    port_a: PortState,
    port_b: PortState,
    port_c_lower: PortState,
    port_c_upper: PortState,
}

impl Ppi8255 {
    /// Create a PPI in its reset state: all ports input, latches $FF.
    #[must_use]
    pub fn new() -> Self {
        Self {
            port_a: PortState::RESET,
            port_b: PortState::RESET,
            port_c_lower: PortState::RESET,
            port_c_upper: PortState::RESET,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// CPU write. `function` selects port A, B, C or control.
    pub fn write(&mut self, function: u8, value: u8, ports: &mut impl PpiPorts) {
        match function & 0x03 {
            0 => {
                self.port_a.data = value;
                if !self.port_a.input {
                    ports.port_a_write(value);
                }
            }
            1 => self.port_b.data = value,
            2 => {
                self.port_c_lower.data = value;
                self.port_c_upper.data = value;
                self.drive_port_c(value, ports);
            }
            _ => self.write_control(value, ports),
        }
    }

    /// CPU read.
    pub fn read(&mut self, function: u8, ports: &mut impl PpiPorts) -> u8 {
        match function & 0x03 {
            0 => {
                if self.port_a.input {
                    ports.port_a_read(self.port_a.data)
                } else {
                    self.port_a.data
                }
            }
            1 => {
                if self.port_b.input {
                    ports.port_b_read()
                } else {
                    self.port_b.data
                }
            }
            2 => {
                let mut value = self.port_c_upper.data;
                if self.port_c_upper.input {
                    value |= 0xF0;
                }
                if self.port_c_lower.input {
                    value |= 0x0F;
                }
                value
            }
            // Control register is write-only
            _ => 0xFF,
        }
    }

    fn write_control(&mut self, value: u8, ports: &mut impl PpiPorts) {
        if value & 0x80 != 0 {
            let mode_a = (value >> 5) & 0x03;
            self.port_a.mode = mode_a;
            self.port_c_upper.mode = mode_a;
            self.port_a.input = value & 0x10 != 0;
            self.port_c_upper.input = value & 0x08 != 0;

            let mode_b = (value >> 2) & 0x01;
            self.port_b.mode = mode_b;
            self.port_c_lower.mode = mode_b;
            self.port_b.input = value & 0x02 != 0;
            self.port_c_lower.input = value & 0x01 != 0;

            self.port_a.data = 0;
            self.port_b.data = 0;
            self.port_c_lower.data = 0;
            self.port_c_upper.data = 0;
        } else {
            let mask = 1u8 << ((value >> 1) & 0x07);
            if value & 0x01 != 0 {
                self.port_c_lower.data |= mask;
                self.port_c_upper.data |= mask;
            } else {
                self.port_c_lower.data &= !mask;
                self.port_c_upper.data &= !mask;
            }
            self.drive_port_c(self.port_c_upper.data, ports);
        }
    }

    fn drive_port_c(&self, value: u8, ports: &mut impl PpiPorts) {
        if !self.port_c_lower.input {
            ports.port_c_lower_write(self.port_c_lower.data & 0x0F);
        }
        if !self.port_c_upper.input {
            ports.port_c_upper_write(value, self.port_a.data);
        }
    }

    #[must_use]
    pub fn port_a_latch(&self) -> u8 {
        self.port_a.data
    }

    #[must_use]
    pub fn port_b_latch(&self) -> u8 {
        self.port_b.data
    }

    #[must_use]
    pub fn port_c_latch(&self) -> u8 {
        self.port_c_upper.data
    }

    #[must_use]
    pub fn port_a_input(&self) -> bool {
        self.port_a.input
    }

    #[must_use]
    pub fn port_b_input(&self) -> bool {
        self.port_b.input
    }

    #[must_use]
    pub fn port_c_lower_input(&self) -> bool {
        self.port_c_lower.input
    }

    #[must_use]
    pub fn port_c_upper_input(&self) -> bool {
        self.port_c_upper.input
    }

    /// Operation modes from the last mode set: (group A, group B).
    #[must_use]
    pub fn modes(&self) -> (u8, u8) {
        (self.port_a.mode, self.port_b.mode)
    }
}

impl Default for Ppi8255 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Event {
        AWrite(u8),
        CLower(u8),
        CUpper(u8, u8),
    }

    #[derive(Default)]
    struct Recorder {
        events: Vec<Event>,
        a_pins: u8,
        b_pins: u8,
    }

    impl PpiPorts for Recorder {
        fn port_a_read(&mut self, _latch: u8) -> u8 {
            self.a_pins
        }

        fn port_a_write(&mut self, value: u8) {
            self.events.push(Event::AWrite(value));
        }

        fn port_b_read(&mut self) -> u8 {
            self.b_pins
        }

        fn port_c_lower_write(&mut self, nibble: u8) {
            self.events.push(Event::CLower(nibble));
        }

        fn port_c_upper_write(&mut self, value: u8, port_a: u8) {
            self.events.push(Event::CUpper(value, port_a));
        }
    }

    /// CPC firmware setup: A out, B in, C out.
    const CPC_CONTROL: u8 = 0x82;

    #[test]
    fn reset_state_is_all_input() {
        let ppi = Ppi8255::new();
        assert!(ppi.port_a_input());
        assert!(ppi.port_b_input());
        assert!(ppi.port_c_lower_input());
        assert!(ppi.port_c_upper_input());
        assert_eq!(ppi.port_a_latch(), 0xFF);
    }

    #[test]
    fn mode_set_configures_directions_and_clears_latches() {
        let mut ppi = Ppi8255::new();
        let mut pins = Recorder::default();
        ppi.write(3, CPC_CONTROL, &mut pins);

        assert!(!ppi.port_a_input());
        assert!(ppi.port_b_input());
        assert!(!ppi.port_c_lower_input());
        assert!(!ppi.port_c_upper_input());
        assert_eq!(ppi.port_a_latch(), 0);
        assert_eq!(ppi.port_b_latch(), 0);
        assert_eq!(ppi.port_c_latch(), 0);
        assert!(pins.events.is_empty());
    }

    #[test]
    fn port_a_output_drives_pins() {
        let mut ppi = Ppi8255::new();
        let mut pins = Recorder::default();
        ppi.write(0, 0x11, &mut pins);
        assert!(pins.events.is_empty(), "input port must not drive");

        ppi.write(3, CPC_CONTROL, &mut pins);
        ppi.write(0, 0x22, &mut pins);
        assert_eq!(pins.events, vec![Event::AWrite(0x22)]);
        assert_eq!(ppi.read(0, &mut pins), 0x22);
    }

    #[test]
    fn port_a_input_reads_pins() {
        let mut ppi = Ppi8255::new();
        let mut pins = Recorder {
            a_pins: 0x5A,
            ..Recorder::default()
        };
        ppi.write(3, 0x92, &mut pins);
        assert_eq!(ppi.read(0, &mut pins), 0x5A);
    }

    #[test]
    fn port_b_input_reads_pins() {
        let mut ppi = Ppi8255::new();
        let mut pins = Recorder {
            b_pins: 0x5E,
            ..Recorder::default()
        };
        ppi.write(3, CPC_CONTROL, &mut pins);
        assert_eq!(ppi.read(1, &mut pins), 0x5E);

        ppi.write(3, 0x80, &mut pins);
        ppi.write(1, 0x33, &mut pins);
        assert_eq!(ppi.read(1, &mut pins), 0x33);
    }

    #[test]
    fn port_c_write_drives_both_halves() {
        let mut ppi = Ppi8255::new();
        let mut pins = Recorder::default();
        ppi.write(3, CPC_CONTROL, &mut pins);
        ppi.write(0, 0x07, &mut pins);
        pins.events.clear();

        ppi.write(2, 0xC5, &mut pins);
        assert_eq!(
            pins.events,
            vec![Event::CLower(0x05), Event::CUpper(0xC5, 0x07)]
        );
        assert_eq!(ppi.read(2, &mut pins), 0xC5);
    }

    #[test]
    fn port_c_read_pulls_input_halves_high() {
        let mut ppi = Ppi8255::new();
        let mut pins = Recorder::default();
        ppi.write(3, 0x81, &mut pins); // lower input, upper output
        ppi.write(2, 0x40, &mut pins);
        assert_eq!(ppi.read(2, &mut pins), 0x4F);
        assert_eq!(pins.events, vec![Event::CUpper(0x40, 0x00)]);
    }

    #[test]
    fn bit_set_reset_uses_resulting_latch() {
        let mut ppi = Ppi8255::new();
        let mut pins = Recorder::default();
        ppi.write(3, CPC_CONTROL, &mut pins);
        pins.events.clear();

        ppi.write(3, 0x0F, &mut pins); // set bit 7
        assert_eq!(ppi.port_c_latch(), 0x80);
        ppi.write(3, 0x05, &mut pins); // set bit 2
        assert_eq!(ppi.port_c_latch(), 0x84);
        ppi.write(3, 0x0E, &mut pins); // clear bit 7
        assert_eq!(ppi.port_c_latch(), 0x04);

        assert_eq!(
            pins.events,
            vec![
                Event::CLower(0x00),
                Event::CUpper(0x80, 0x00),
                Event::CLower(0x04),
                Event::CUpper(0x84, 0x00),
                Event::CLower(0x04),
                Event::CUpper(0x04, 0x00),
            ]
        );
    }

    #[test]
    fn control_reads_ff() {
        let mut ppi = Ppi8255::new();
        let mut pins = Recorder::default();
        assert_eq!(ppi.read(3, &mut pins), 0xFF);
    }

    #[test]
    fn modes_are_latched() {
        let mut ppi = Ppi8255::new();
        let mut pins = Recorder::default();
        ppi.write(3, 0xC4, &mut pins);
        assert_eq!(ppi.modes(), (2, 1));
    }
}
