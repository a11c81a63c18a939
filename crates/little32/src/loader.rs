//! Program image loading.
//!
//! Grounded on `emu-c64::prg::load_prg`: a program loader just needs a
//! destination address and bytes (or whole instruction words) to copy in
//! before the core starts running. Little32 has no ROM-vs-RAM distinction
//! at this layer — `write_forced` exists precisely so a loader can punch
//! through any write filtering a region applies (§6 "Core ↔ Program
//! loader").

use little32_core::{Computer, Core};

/// Writes `words` into `computer`'s address space starting at `base`,
/// one 32-bit word per 4 bytes, bypassing write filtering.
pub fn load_words<C: Core>(computer: &mut Computer<C>, base: u32, words: &[u32]) {
    for (i, &word) in words.iter().enumerate() {
        computer.write_forced(base.wrapping_add((i as u32) * 4), word);
    }
}

/// Writes a flat byte image into `computer`'s address space starting at
/// `base`, bypassing write filtering.
pub fn load_bytes<C: Core>(computer: &mut Computer<C>, base: u32, bytes: &[u8]) {
    for (i, &byte) in bytes.iter().enumerate() {
        computer.write_byte_forced(base.wrapping_add(i as u32), byte);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use little32_core::RamMapping;
    use little32_cpu::Little32Core;

    #[test]
    fn load_words_writes_consecutive_addresses() {
        let mut computer: Computer<Little32Core> = Computer::new();
        computer.add_mapping(RamMapping::new(0, 64));
        load_words(&mut computer, 0, &[0x1111_1111, 0x2222_2222]);
        assert_eq!(computer.read(0), 0x1111_1111);
        assert_eq!(computer.read(4), 0x2222_2222);
    }

    #[test]
    fn load_bytes_writes_a_flat_image() {
        let mut computer: Computer<Little32Core> = Computer::new();
        computer.add_mapping(RamMapping::new(0x1000, 16));
        load_bytes(&mut computer, 0x1000, &[0xDE, 0xAD, 0xBE, 0xEF]);
        assert_eq!(computer.read(0x1000), 0xEFBE_ADDE);
    }
}
