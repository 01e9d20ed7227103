//! Scripted stand-in for the Z80, for driving the machine in tests.
//!
//! Executes a NOP every 4 T-states: fetches from PC, advances PC and R,
//! and clocks the bus once. With IFF1 set it accepts any pending
//! interrupt IM 1 style, without pushing PC.

use emu_core::{Bus, Cpu};

use crate::cpc::TSTATES_PER_CLOCK;
use crate::registers::Z80Registers;

#[derive(Debug, Default)]
pub struct StubCpu {
    registers: Z80Registers,
    executed: u64,
    interrupts_taken: u64,
    register_loads: Vec<Z80Registers>,
}

impl StubCpu {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total T-states executed since creation.
    #[must_use]
    pub fn executed(&self) -> u64 {
        self.executed
    }

    #[must_use]
    pub fn interrupts_taken(&self) -> u64 {
        self.interrupts_taken
    }

    /// Every register block passed to `set_registers`, oldest first.
    #[must_use]
    pub fn register_loads(&self) -> &[Z80Registers] {
        &self.register_loads
    }
}

impl Cpu for StubCpu {
    type Registers = Z80Registers;

    fn execute<B: Bus>(&mut self, tstates: u32, bus: &mut B) -> u32 {
        let mut done = 0;
        while done < tstates {
            if self.registers.iff1 && bus.interrupt_pending() {
                bus.interrupt_acknowledge();
                self.interrupts_taken += 1;
            }
            let _opcode = bus.read(self.registers.pc);
            self.registers.pc = self.registers.pc.wrapping_add(1);
            self.registers.r = (self.registers.r & 0x80) | (self.registers.r.wrapping_add(1) & 0x7F);
            bus.clock();
            done += TSTATES_PER_CLOCK;
        }
        self.executed += u64::from(done);
        done
    }

    fn registers(&self) -> Z80Registers {
        self.registers
    }

    fn set_registers(&mut self, registers: &Z80Registers) {
        self.registers = *registers;
        self.register_loads.push(*registers);
    }

    fn reset(&mut self) {
        self.registers = Z80Registers::default();
    }
}
