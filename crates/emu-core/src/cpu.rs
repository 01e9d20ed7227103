//! Processor core trait.

use crate::Bus;

/// An instruction-executing processor core.
///
/// The core runs in bursts: [`Cpu::execute`] keeps executing whole
/// instructions until at least `tstates` have elapsed, calling back into the
/// bus as it goes. The bus is passed in, not owned, so the machine can keep
/// exclusive ownership of its chips between bursts.
pub trait Cpu {
    /// The register block used for inspection and snapshot restore.
    type Registers;

    /// Execute for at least `tstates` T-states. Returns the number actually
    /// executed (instruction boundaries may overshoot the request).
    fn execute<B: Bus>(&mut self, tstates: u32, bus: &mut B) -> u32;

    /// Returns a copy of all registers.
    fn registers(&self) -> Self::Registers;

    /// Overwrite every register and interrupt flag.
    fn set_registers(&mut self, registers: &Self::Registers);

    /// Reset the processor to its power-on state.
    fn reset(&mut self);
}
