//! The hooks a processor core calls while it executes.

/// Memory, I/O and timing hooks seen by the processor.
///
/// The processor owns instruction timing; peripherals only advance when it
/// calls [`Bus::clock`]. A Z80 drives `clock` once per peripheral clock
/// (every 4 T-states on a 4 MHz machine).
pub trait Bus {
    /// Read a byte from the memory map.
    fn read(&mut self, address: u16) -> u8;

    /// Write a byte to the memory map.
    fn write(&mut self, address: u16, value: u8);

    /// Read from an I/O port. The full 16-bit port address is decoded.
    fn io_read(&mut self, port: u16) -> u8;

    /// Write to an I/O port.
    fn io_write(&mut self, port: u16, value: u8);

    /// Level of the maskable interrupt request line.
    fn interrupt_pending(&self) -> bool;

    /// Called when the processor accepts a maskable interrupt.
    ///
    /// Accepting drops the request line.
    fn interrupt_acknowledge(&mut self);

    /// Advance the peripherals by one clock tick.
    fn clock(&mut self);
}
