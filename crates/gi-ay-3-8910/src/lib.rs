//! General Instrument AY-3-8910 Programmable Sound Generator.
//!
//! Three square-wave tone channels, a shared noise generator and a shared
//! envelope generator. The chip is clocked at 1 MHz (every fourth CPU
//! T-state on the CPC). Tone and noise advance every 8 clocks, the envelope
//! every 16. Every [`SAMPLE_PERIOD`] tone updates the three channel mixes
//! are folded into one signed 16-bit stereo sample:
//!
//! - left  = C + B
//! - right = A + B
//!
//! Samples are packed little-endian (left, right) into a one-second output
//! buffer which the machine hands to an audio sink once per frame.
//!
//! # Register map
//!
//! | Reg | Name         | Mask |
//! |-----|--------------|------|
//! | R0  | A fine       | $FF  |
//! | R1  | A coarse     | $0F  |
//! | R2  | B fine       | $FF  |
//! | R3  | B coarse     | $0F  |
//! | R4  | C fine       | $FF  |
//! | R5  | C coarse     | $0F  |
//! | R6  | Noise period | $1F  |
//! | R7  | Mixer        | $FF  |
//! | R8  | A volume     | $1F  |
//! | R9  | B volume     | $1F  |
//! | R10 | C volume     | $1F  |
//! | R11 | Env fine     | $FF  |
//! | R12 | Env coarse   | $FF  |
//! | R13 | Env shape    | $0F  |
//! | R14 | Port A       | $FF  |
//! | R15 | Port B       | $FF  |
//!
//! # Bus control
//!
//! On the CPC the chip's BDIR/BC1 lines are driven from PPI port C bits 7–6
//! and its data bus from PPI port A. [`Ay3_8910::set_bus_control`] latches
//! the function, [`Ay3_8910::write_bus`] and [`Ay3_8910::read_bus`] move
//! data according to it.

#![allow(clippy::cast_possible_truncation)]

/// Number of registers.
pub const NUM_REGISTERS: usize = 16;

/// Input clock, in Hz.
pub const CLOCK_HZ: u32 = 998_400;

/// Tone and noise update rate: one update every 8 clocks.
pub const TONE_UPDATE_HZ: u32 = CLOCK_HZ / 8;

/// Output sample rate.
pub const SAMPLE_RATE: u32 = 41_600;

/// Tone updates per output sample.
pub const SAMPLE_PERIOD: u32 = TONE_UPDATE_HZ / SAMPLE_RATE;

const _: () = assert!(SAMPLE_RATE * SAMPLE_PERIOD == TONE_UPDATE_HZ);

/// Bytes per stereo 16-bit sample.
pub const BYTES_PER_SAMPLE: usize = 4;

/// Output buffer capacity: one second of audio.
pub const BUFFER_SIZE: usize = BYTES_PER_SAMPLE * SAMPLE_RATE as usize;

const TONE_UPDATE_MASK: u32 = 0x07;
const ENVELOPE_UPDATE_MASK: u32 = 0x0F;

const REGISTER_MASKS: [u8; NUM_REGISTERS] = [
    0xFF, 0x0F, 0xFF, 0x0F, 0xFF, 0x0F, 0x1F, 0xFF, 0x1F, 0x1F, 0x1F, 0xFF, 0xFF, 0x0F, 0xFF,
    0xFF,
];

const MIXER: usize = 7;
const ENVELOPE_FINE: usize = 11;
const ENVELOPE_COARSE: usize = 12;
const ENVELOPE_SHAPE: usize = 13;
const PORT_A: usize = 14;

/// Channel B sits in the middle of the stereo image.
const MIDDLE_CHANNEL: usize = 1;

/// Function latched from the BDIR/BC1 lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusFunction {
    Inactive,
    Read,
    Write,
    Select,
}

impl BusFunction {
    fn from_bits(bits: u8) -> Self {
        match bits & 0x03 {
            0 => Self::Inactive,
            1 => Self::Read,
            2 => Self::Write,
            _ => Self::Select,
        }
    }
}

/// Per-channel amplitude tables: `[side, middle]`, indexed by 4-bit level.
///
/// Amplitude is `32767 / sqrt(2)^(15 - level)`. Side channels get two
/// thirds of it and the middle channel one third, since B reaches both
/// speakers. Both are divided by the sample period because each sample
/// sums that many updates.
fn volume_tables() -> [[i32; 16]; 2] {
    let mut tables = [[0; 16]; 2];
    for level in 0..16 {
        let amplitude =
            (f64::from(i16::MAX) / std::f64::consts::SQRT_2.powi(15 - level as i32)) as i32;
        tables[0][level] = (amplitude * 2 / 3) / SAMPLE_PERIOD as i32;
        tables[1][level] = (amplitude / 3) / SAMPLE_PERIOD as i32;
    }
    tables
}

/// One tone channel.
#[derive(Debug, Clone, Copy, Default)]
struct Channel {
    tone_enabled: bool,
    noise_enabled: bool,
    use_envelope: bool,
    volume: u8,
    period: u32,
    counter: u32,
    output_high: bool,
    /// Sum of contributions since the last output sample.
    mix: i32,
}

impl Channel {
    fn reset(&mut self) {
        *self = Self {
            period: 1,
            ..Self::default()
        };
    }

    fn set_period(&mut self, coarse: u8, fine: u8) {
        self.period = (u32::from(coarse) << 8) + u32::from(fine);
        if self.period == 0 {
            self.period = 1;
        }
        let cycle = self.period * 2;
        if self.counter >= cycle {
            self.counter %= cycle;
        }
    }

    fn update(&mut self, envelope_level: u8, noise_high: bool, volumes: &[i32; 16]) {
        self.counter += 1;
        if self.counter >= self.period {
            self.output_high = !self.output_high;
            self.counter = 0;
        }

        let high = (self.noise_enabled && noise_high) || (self.tone_enabled && self.output_high);
        let level = if self.use_envelope {
            envelope_level
        } else {
            self.volume
        };
        let amplitude = volumes[level as usize];
        if high {
            self.mix += amplitude;
        } else {
            self.mix -= amplitude;
        }
    }
}

/// 17-bit Galois LFSR noise source.
#[derive(Debug, Clone, Copy)]
struct Noise {
    output_high: bool,
    period: u32,
    counter: u32,
    rng: u32,
}

impl Noise {
    const fn new() -> Self {
        Self {
            output_high: true,
            period: 0,
            counter: 0,
            rng: 1,
        }
    }

    fn update(&mut self) {
        self.counter += 1;
        if self.counter >= self.period {
            // Output changes when bit 0 differs from bit 1.
            if (self.rng + 1) & 2 != 0 {
                self.output_high = !self.output_high;
            }
            // Tap at bit 0 XOR bit 3, folded into bit 16 in Galois form.
            if self.rng & 1 != 0 {
                self.rng ^= 0x24000;
            }
            self.rng >>= 1;
            self.counter = 0;
        }
    }
}

const DECAY: [u8; 16] = [15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0];
const ATTACK: [u8; 16] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15];
const ATTACK_THEN_OFF: [u8; 17] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 0];
const DECAY_THEN_MAX: [u8; 17] = [15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 15];
const DECAY_ATTACK: [u8; 32] = [
    15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5, 4, 3, 2, 1, 0, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11,
    12, 13, 14, 15,
];
const ATTACK_DECAY: [u8; 32] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 15, 14, 13, 12, 11, 10, 9, 8, 7, 6, 5,
    4, 3, 2, 1, 0,
];

/// Level sequence for each of the 16 shape values.
const SHAPES: [&[u8]; 16] = [
    &DECAY,
    &DECAY,
    &DECAY,
    &DECAY,
    &ATTACK_THEN_OFF,
    &ATTACK_THEN_OFF,
    &ATTACK_THEN_OFF,
    &ATTACK_THEN_OFF,
    &DECAY,
    &DECAY,
    &DECAY_ATTACK,
    &DECAY_THEN_MAX,
    &ATTACK,
    &ATTACK,
    &ATTACK_DECAY,
    &ATTACK_THEN_OFF,
];

/// Shared envelope generator.
#[derive(Debug, Clone, Copy)]
struct Envelope {
    level: u8,
    period: u32,
    counter: u32,
    position: usize,
    shape: &'static [u8],
    hold: bool,
}

impl Envelope {
    const fn new() -> Self {
        Self {
            level: 0,
            period: 1,
            counter: 0,
            position: 0,
            shape: SHAPES[0],
            hold: true,
        }
    }

    fn set_period(&mut self, coarse: u8, fine: u8) {
        self.period = (u32::from(coarse) << 8) + u32::from(fine);
    }

    fn set_shape(&mut self, shape: u8) {
        let shape = shape & 0x0F;
        self.shape = SHAPES[shape as usize];
        self.position = 0;
        // Shapes 0-7 always hold; above that, odd shapes hold.
        self.hold = shape < 8 || shape & 0x01 != 0;
        self.level = self.shape[0];
    }

    fn update(&mut self) {
        self.counter += 1;
        if self.counter >= self.period {
            self.counter = 0;
            self.level = self.shape[self.position];
            self.position += 1;
            if self.position == self.shape.len() {
                if self.hold {
                    self.position -= 1;
                } else {
                    self.position = 0;
                }
            }
        }
    }
}

/// AY-3-8910 Programmable Sound Generator.
pub struct Ay3_8910 {
    regs: [u8; NUM_REGISTERS],
    selected: u8,
    function: BusFunction,

    port_a_input: bool,
    port_b_input: bool,

    channels: [Channel; 3],
    noise: Noise,
    envelope: Envelope,

    clock_count: u32,
    sampling_counter: u32,
    volumes: [[i32; 16]; 2],

    output: Box<[u8]>,
    output_len: usize,
    dropped_samples: u64,
}

impl Ay3_8910 {
    #[must_use]
    pub fn new() -> Self {
        let mut psg = Self {
            regs: [0; NUM_REGISTERS],
            selected: 0,
            function: BusFunction::Inactive,
            port_a_input: true,
            port_b_input: true,
            channels: [Channel::default(); 3],
            noise: Noise::new(),
            envelope: Envelope::new(),
            clock_count: 0,
            sampling_counter: 0,
            volumes: volume_tables(),
            output: vec![0; BUFFER_SIZE].into_boxed_slice(),
            output_len: 0,
            dropped_samples: 0,
        };
        psg.reset();
        psg
    }

    /// Clear registers, generators and the output buffer.
    pub fn reset(&mut self) {
        self.regs = [0; NUM_REGISTERS];
        self.selected = 0;
        self.function = BusFunction::Inactive;
        self.port_a_input = true;
        self.port_b_input = true;

        for channel in &mut self.channels {
            channel.reset();
        }
        self.noise = Noise::new();
        self.envelope = Envelope::new();

        self.clock_count = 0;
        self.sampling_counter = 0;
        self.output_len = 0;
    }

    /// Select a register by index (low 4 bits).
    pub fn select_register(&mut self, reg: u8) {
        self.selected = reg & 0x0F;
    }

    #[must_use]
    pub fn selected_register(&self) -> u8 {
        self.selected
    }

    /// Write a value to the currently selected register.
    pub fn write_data(&mut self, value: u8) {
        self.write_register(self.selected, value);
    }

    /// Write a register, masking the value to its implemented bits.
    pub fn write_register(&mut self, reg: u8, value: u8) {
        let reg = (reg & 0x0F) as usize;
        let value = value & REGISTER_MASKS[reg];
        self.regs[reg] = value;

        match reg {
            0..=5 => {
                let ch = reg / 2;
                self.channels[ch].set_period(self.regs[ch * 2 + 1], self.regs[ch * 2]);
            }
            6 => self.noise.period = u32::from(value),
            MIXER => {
                for (ch, channel) in self.channels.iter_mut().enumerate() {
                    channel.tone_enabled = value & (1 << ch) == 0;
                    channel.noise_enabled = value & (0x08 << ch) == 0;
                }
                self.port_a_input = value & 0x40 == 0;
                self.port_b_input = value & 0x80 == 0;
            }
            8..=10 => {
                let channel = &mut self.channels[reg - 8];
                channel.volume = value & 0x0F;
                channel.use_envelope = value & 0x10 != 0;
            }
            ENVELOPE_FINE | ENVELOPE_COARSE => {
                self.envelope
                    .set_period(self.regs[ENVELOPE_COARSE], self.regs[ENVELOPE_FINE]);
            }
            ENVELOPE_SHAPE => self.envelope.set_shape(value),
            _ => {}
        }
    }

    /// Stored (masked) register value.
    #[must_use]
    pub fn register(&self, reg: u8) -> u8 {
        self.regs[(reg & 0x0F) as usize]
    }

    /// Read the selected register as the CPU sees it.
    ///
    /// `port_a_lines` is the level on the chip's I/O port A pins (the
    /// selected keyboard row on the CPC). With port A set to output the
    /// pins and the output latch are ANDed.
    #[must_use]
    pub fn read_selected(&self, port_a_lines: u8) -> u8 {
        let reg = self.selected as usize;
        if reg == PORT_A {
            if self.port_a_input {
                port_a_lines
            } else {
                port_a_lines & self.regs[PORT_A]
            }
        } else {
            self.regs[reg]
        }
    }

    /// Latch the bus function from bits 7–6 of `value`.
    pub fn set_bus_control(&mut self, value: u8) {
        self.function = BusFunction::from_bits(value >> 6);
    }

    #[must_use]
    pub fn bus_function(&self) -> BusFunction {
        self.function
    }

    /// Data bus write, interpreted by the latched function.
    pub fn write_bus(&mut self, value: u8) {
        match self.function {
            BusFunction::Write => self.write_data(value),
            BusFunction::Select => self.select_register(value & 0x0F),
            BusFunction::Inactive | BusFunction::Read => {}
        }
    }

    /// Data bus read. Unless the latched function is a register read, the
    /// chip does not drive the bus and `bus_value` is returned unchanged.
    #[must_use]
    pub fn read_bus(&self, bus_value: u8, port_a_lines: u8) -> u8 {
        if self.function == BusFunction::Read {
            self.read_selected(port_a_lines)
        } else {
            bus_value
        }
    }

    #[must_use]
    pub fn port_a_input(&self) -> bool {
        self.port_a_input
    }

    #[must_use]
    pub fn port_b_input(&self) -> bool {
        self.port_b_input
    }

    /// Current envelope output level (0–15).
    #[must_use]
    pub fn envelope_level(&self) -> u8 {
        self.envelope.level
    }

    /// Advance one input clock.
    pub fn clock(&mut self) {
        self.clock_count = self.clock_count.wrapping_add(1);
        if self.clock_count & TONE_UPDATE_MASK != 0 {
            return;
        }

        if self.clock_count & ENVELOPE_UPDATE_MASK == 0 {
            self.envelope.update();
        }
        self.noise.update();

        let envelope_level = self.envelope.level;
        let noise_high = self.noise.output_high;
        for (ch, channel) in self.channels.iter_mut().enumerate() {
            let table = usize::from(ch == MIDDLE_CHANNEL);
            channel.update(envelope_level, noise_high, &self.volumes[table]);
        }

        self.sampling_counter += 1;
        if self.sampling_counter >= SAMPLE_PERIOD {
            self.sampling_counter = 0;
            self.emit_sample();
        }
    }

    fn emit_sample(&mut self) {
        let [a, b, c] = self.channels.map(|channel| channel.mix);
        for channel in &mut self.channels {
            channel.mix = 0;
        }

        let left = (c + b).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;
        let right = (a + b).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;

        let end = self.output_len + BYTES_PER_SAMPLE;
        if end > self.output.len() {
            self.dropped_samples += 1;
            return;
        }
        let slot = &mut self.output[self.output_len..end];
        slot[..2].copy_from_slice(&left.to_le_bytes());
        slot[2..].copy_from_slice(&right.to_le_bytes());
        self.output_len = end;
    }

    /// Offer the buffered samples to `submit`. The buffer is emptied only
    /// if `submit` accepts it; otherwise samples keep accumulating for a
    /// later attempt. Returns whether the buffer was accepted.
    pub fn on_frame(&mut self, submit: impl FnOnce(&[u8]) -> bool) -> bool {
        let accepted = submit(&self.output[..self.output_len]);
        if accepted {
            self.output_len = 0;
        }
        accepted
    }

    /// Samples waiting for the next frame handoff, as packed bytes.
    #[must_use]
    pub fn output(&self) -> &[u8] {
        &self.output[..self.output_len]
    }

    /// Samples discarded because the output buffer was full.
    #[must_use]
    pub fn dropped_samples(&self) -> u64 {
        self.dropped_samples
    }
}

impl Default for Ay3_8910 {
    fn default() -> Self {
        Self::new()
    }
}
