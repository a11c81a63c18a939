//! A ready-to-run Little32 machine: the real execution core, a flat RAM
//! region, and a program loader, wired together the way `emu-c64::C64`
//! wires a 6502, its memory map and its peripherals.

mod loader;

pub use little32_core::{
    Bus, Computer, Core, DeviceId, InputEvent, IntervalId, MappedDevice, MemoryMapped, Observable,
    RamMapping, Settings, Value,
};
pub use little32_cpu::{disassemble, Class, Condition, DebugCore, Decoded, Flags, Little32Core, LR, PC, SP};
pub use little32_devices::{
    create_char_display, create_colour_char_display, create_device, create_keyboard, CharDisplay,
    ColourCharDisplay, KeyboardDevice,
};
pub use loader::{load_bytes, load_words};

/// A `Computer` built around the real Little32 ISA core. This is the type
/// most callers want; `Computer<DebugCore>` remains available directly
/// from `little32_cpu` for fixture-style rigs.
pub type Machine = Computer<Little32Core>;
