//! Machine timing constants.

/// Processor clock and frame timing for a machine.
///
/// All peripheral timing is derived by integer division from the processor
/// frequency, so the divisors must divide cleanly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MasterClock {
    /// Processor frequency in T-states per second.
    pub tstates_per_second: u32,
    /// Video frames per second.
    pub frames_per_second: u32,
    /// T-states per peripheral clock tick.
    pub tstates_per_clock: u32,
}

impl MasterClock {
    #[must_use]
    pub const fn new(tstates_per_second: u32, frames_per_second: u32, tstates_per_clock: u32) -> Self {
        Self {
            tstates_per_second,
            frames_per_second,
            tstates_per_clock,
        }
    }

    /// T-states in one video frame.
    #[must_use]
    pub const fn tstates_per_frame(&self) -> u32 {
        self.tstates_per_second / self.frames_per_second
    }

    /// Peripheral clock frequency in Hz.
    #[must_use]
    pub const fn clock_hz(&self) -> u32 {
        self.tstates_per_second / self.tstates_per_clock
    }

    /// Peripheral clock ticks in one video frame.
    #[must_use]
    pub const fn clocks_per_frame(&self) -> u32 {
        self.tstates_per_frame() / self.tstates_per_clock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpc_frame_timing() {
        let clock = MasterClock::new(3_993_600, 50, 4);
        assert_eq!(clock.tstates_per_frame(), 79_872);
        assert_eq!(clock.clock_hz(), 998_400);
        assert_eq!(clock.clocks_per_frame(), 19_968);
    }
}
