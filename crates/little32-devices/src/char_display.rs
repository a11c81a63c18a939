//! A plain text character display: one byte per cell, plus a trailing
//! interrupt-vector word.
//!
//! Layout: `width * height` bytes of character codes, followed by a
//! 4-byte interrupt vector at the next address. There is no colour
//! plane — [`crate::colour_char_display::ColourCharDisplay`] adds one.

use little32_core::{DeviceId, MappedDevice, MemoryMapped};

/// A text-only character display mapped into the bus address space.
pub struct CharDisplay {
    address: u32,
    width: u32,
    height: u32,
    memory: Vec<u8>,
    default_memory: Option<Vec<u8>>,
    interrupt_vector: u32,
}

impl CharDisplay {
    /// Creates a `width * height` character display at `address`, zero-filled.
    #[must_use]
    pub fn new(address: u32, width: u32, height: u32) -> Self {
        let size = (width * height) as usize;
        Self {
            address,
            width,
            height,
            memory: vec![0; size],
            default_memory: None,
            interrupt_vector: 0,
        }
    }

    /// Creates a display that restores `default` on reset instead of
    /// zero-filling. `default` is truncated/zero-padded to `width * height`.
    #[must_use]
    pub fn with_default(address: u32, width: u32, height: u32, default: Vec<u8>) -> Self {
        let size = (width * height) as usize;
        let mut default_memory = default;
        default_memory.resize(size, 0);
        Self {
            address,
            width,
            height,
            memory: default_memory.clone(),
            default_memory: Some(default_memory),
            interrupt_vector: 0,
        }
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// The character codes, row-major, one byte per cell.
    #[must_use]
    pub fn cells(&self) -> &[u8] {
        &self.memory
    }

    fn text_size(&self) -> u32 {
        self.width * self.height
    }
}

impl MemoryMapped for CharDisplay {
    fn address(&self) -> u32 {
        self.address
    }

    fn range(&self) -> u32 {
        self.text_size() + 4
    }

    fn read(&mut self, offset: u32) -> u32 {
        let text_size = self.text_size();
        if offset == text_size {
            return self.interrupt_vector;
        }
        if offset % 4 == 0 && offset + 4 <= text_size {
            let i = offset as usize;
            return u32::from_le_bytes([
                self.memory[i],
                self.memory[i + 1],
                self.memory[i + 2],
                self.memory[i + 3],
            ]);
        }
        0
    }

    fn read_byte(&mut self, offset: u32) -> u8 {
        let text_size = self.text_size();
        if offset < text_size {
            return self.memory[offset as usize];
        }
        if offset < text_size + 4 {
            return self.interrupt_vector.to_le_bytes()[(offset - text_size) as usize];
        }
        0
    }

    /// Word writes that don't land exactly on the interrupt vector or a
    /// 4-byte-aligned cell boundary are dropped rather than falling back
    /// to a partial byte write.
    fn write(&mut self, offset: u32, value: u32) {
        let text_size = self.text_size();
        if offset == text_size {
            self.interrupt_vector = value;
            return;
        }
        if offset % 4 == 0 && offset + 4 <= text_size {
            let i = offset as usize;
            self.memory[i..i + 4].copy_from_slice(&value.to_le_bytes());
        }
    }

    fn write_byte(&mut self, offset: u32, value: u8) {
        let text_size = self.text_size();
        if offset < text_size {
            self.memory[offset as usize] = value;
            return;
        }
        if offset < text_size + 4 {
            let mut bytes = self.interrupt_vector.to_le_bytes();
            bytes[(offset - text_size) as usize] = value;
            self.interrupt_vector = u32::from_le_bytes(bytes);
        }
    }
}

impl MappedDevice for CharDisplay {
    fn identity(&self) -> DeviceId {
        DeviceId("char_display")
    }

    fn reset(&mut self) {
        match &self.default_memory {
            Some(default) => self.memory.copy_from_slice(default),
            None => self.memory.fill(0),
        }
    }

    fn render(&mut self, do_interrupt: bool) -> Option<u32> {
        if do_interrupt && self.interrupt_vector != 0 {
            Some(self.interrupt_vector)
        } else {
            None
        }
    }
}
