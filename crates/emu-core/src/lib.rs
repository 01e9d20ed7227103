//! Processor, bus and host-device contracts for tick-stepped emulation.
//!
//! The processor core is external to the peripheral chips: it executes
//! instructions and calls back into a [`Bus`] for memory, I/O, interrupt
//! acknowledge and the per-clock peripheral tick. Everything the host
//! supplies (audio device, processor) is expressed as a trait here so the
//! machine crates never depend on a concrete implementation.

mod bus;
mod clock;
mod cpu;
mod observable;
mod sink;

pub use bus::Bus;
pub use clock::MasterClock;
pub use cpu::Cpu;
pub use observable::{Observable, Value};
pub use sink::AudioSink;
