//! The interchangeable execution core a `Computer` drives.
//!
//! `Little32Core` (the real ISA) and `DebugCore` (a fixture stub, see
//! `little32-cpu`) both implement this, so a `Computer` can be built against
//! either one without the bus, scheduler or devices knowing the difference.

use crate::Bus;

/// An execution core: something a `Computer` can clock, reset and interrupt.
pub trait Core {
    /// Executes one instruction to completion against `bus`.
    fn clock<B: Bus>(&mut self, bus: &mut B);

    /// Resets registers and flags to their power-on state.
    fn reset(&mut self);

    /// Pushes the saved status and PC onto the stack, then jumps to
    /// `vector`. Takes the bus directly since the push is a real memory
    /// write, not just register state.
    fn interrupt<B: Bus>(&mut self, bus: &mut B, vector: u32);

    /// Renders a single instruction word as text, for debugging.
    fn disassemble(&self, instruction: u32) -> String;

    /// Returns the program counter.
    fn pc(&self) -> u32;

    /// Overwrites the program counter.
    fn set_pc(&mut self, value: u32);

    /// Overwrites the stack pointer.
    fn set_sp(&mut self, value: u32);
}
