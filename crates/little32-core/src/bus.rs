//! The 32-bit word/byte bus a `Core` executes against.

/// The bus a `Core` reads and writes through.
///
/// Addresses and words are both `u32`. Reads outside any mapping return 0;
/// writes outside any mapping are silently dropped. There is no bus error —
/// the ISA has no fault trap.
pub trait Bus {
    /// Reads a word at `addr`. Returns 0 if nothing is mapped there.
    fn read(&mut self, addr: u32) -> u32;
    /// Reads a byte at `addr`. Returns 0 if nothing is mapped there.
    fn read_byte(&mut self, addr: u32) -> u8;
    /// Writes a word at `addr`. A no-op if nothing is mapped there.
    fn write(&mut self, addr: u32, value: u32);
    /// Writes a byte at `addr`. A no-op if nothing is mapped there.
    fn write_byte(&mut self, addr: u32, value: u8);
}
