//! Settings-driven device construction — the "Core ↔ Config loader"
//! boundary contract: a device factory receives a [`Settings`] tree and a
//! mutable label map, and either attaches a fully-initialised device to
//! the `Computer` or raises a domain error with a human-readable message.
//!
//! Grounded on `ColourCharDisplayFactory::CreateFromSettings`
//! (`original_source/Little32/src/L32_ColourCharDisplay.cpp`): settings
//! are read by name with documented defaults, the device is placed at the
//! caller's running `start_address` and that address is advanced past it,
//! and a handful of named labels (`text_position`, `colour_position`,
//! `interrupt_position`) are registered so other settings can refer to
//! this device's sub-regions by name. Scoped down from the original by
//! dropping anything that needs a texture/image loader or a wall-clock
//! framerate mode — this crate only has a cycle clock, and rendering is a
//! host concern.

use std::collections::BTreeMap;

use little32_core::{Computer, Core, MemoryMapped, Settings};

use crate::{CharDisplay, ColourCharDisplay, KeyboardDevice};

const DEFAULT_WIDTH: i128 = 16;
const DEFAULT_HEIGHT: i128 = 16;
const DEFAULT_CYCLES_PER_FRAME: i128 = 1000;

fn text_size(settings: &Settings) -> Result<(u32, u32), String> {
    match settings.get("text_size") {
        None => Ok((DEFAULT_WIDTH as u32, DEFAULT_HEIGHT as u32)),
        Some(Settings::IntVec(dims)) if dims.len() == 2 => {
            let width = u32::try_from(dims[0])
                .map_err(|_| format!("text_size width {} does not fit in a u32", dims[0]))?;
            let height = u32::try_from(dims[1])
                .map_err(|_| format!("text_size height {} does not fit in a u32", dims[1]))?;
            if width == 0 || height == 0 {
                return Err("text_size width and height must both be nonzero".to_string());
            }
            Ok((width, height))
        }
        Some(_) => Err("text_size must be a two-element integer vector [width, height]".to_string()),
    }
}

fn cycles_per_frame(settings: &Settings) -> Result<u64, String> {
    let value = match settings.get("cycles_per_frame") {
        None => DEFAULT_CYCLES_PER_FRAME,
        Some(setting) => setting
            .as_int()
            .ok_or_else(|| "cycles_per_frame must be an integer".to_string())?,
    };
    let cycles = u64::try_from(value)
        .map_err(|_| format!("cycles_per_frame {value} must be a nonnegative value that fits in a u64"))?;
    if cycles == 0 {
        return Err("cycles_per_frame must be nonzero".to_string());
    }
    Ok(cycles)
}

/// Builds a [`CharDisplay`] from `settings` (`text_size: [width, height]`,
/// default `16x16`), attaches it to `computer` at `*start_address`,
/// registers its `text_position`/`interrupt_position` labels, and advances
/// `*start_address` past it.
pub fn create_char_display<C: Core>(
    computer: &mut Computer<C>,
    start_address: &mut u32,
    settings: &Settings,
    labels: &mut BTreeMap<String, u32>,
) -> Result<usize, String> {
    let (width, height) = text_size(settings)?;
    let address = *start_address;
    let display = CharDisplay::new(address, width, height);

    labels.insert("text_position".to_string(), address);
    labels.insert(
        "interrupt_position".to_string(),
        address.wrapping_add(width * height),
    );

    let index = computer.add_mapped_device(Box::new(display));
    let range = computer
        .mapped_device(index)
        .expect("device was just inserted")
        .range();
    *start_address = start_address.wrapping_add(range);
    Ok(index)
}

/// Builds a [`ColourCharDisplay`] from `settings` (`text_size: [width,
/// height]`, `cycles_per_frame`, both defaulted), attaches it to
/// `computer` at `*start_address`, registers its `text_position`,
/// `colour_position` and `interrupt_position` labels, advances
/// `*start_address` past it, and schedules its self-refresh interval.
pub fn create_colour_char_display<C: Core + Default>(
    computer: &mut Computer<C>,
    start_address: &mut u32,
    settings: &Settings,
    labels: &mut BTreeMap<String, u32>,
) -> Result<usize, String> {
    let (width, height) = text_size(settings)?;
    let cycles_per_frame = cycles_per_frame(settings)?;
    let address = *start_address;
    let display = ColourCharDisplay::new(address, width, height, cycles_per_frame);

    labels.insert("text_position".to_string(), address);
    labels.insert(
        "colour_position".to_string(),
        address.wrapping_add(display.colour_position()),
    );
    labels.insert(
        "interrupt_position".to_string(),
        address.wrapping_add(display.interrupt_position()),
    );

    let range = display.range();
    let index = display.install(computer);
    *start_address = start_address.wrapping_add(range);
    Ok(index)
}

/// Builds a [`KeyboardDevice`], attaches it to `computer` at
/// `*start_address`, registers its `keyboard_position` label, and
/// advances `*start_address` past it. Takes no settings of its own today,
/// but still receives one for a uniform factory signature — a future
/// setting (e.g. a scancode remap table) slots in without changing callers.
pub fn create_keyboard<C: Core>(
    computer: &mut Computer<C>,
    start_address: &mut u32,
    _settings: &Settings,
    labels: &mut BTreeMap<String, u32>,
) -> Result<usize, String> {
    let address = *start_address;
    let device = KeyboardDevice::new(address);

    labels.insert("keyboard_position".to_string(), address);

    let index = computer.add_mapped_device(Box::new(device));
    let range = computer
        .mapped_device(index)
        .expect("device was just inserted")
        .range();
    *start_address = start_address.wrapping_add(range);
    Ok(index)
}

/// Dispatches to the factory for `kind`, the way a config loader resolves
/// a device's `"type"` field to the matching `IDeviceFactory`.
pub fn create_device<C: Core + Default>(
    computer: &mut Computer<C>,
    start_address: &mut u32,
    kind: &str,
    settings: &Settings,
    labels: &mut BTreeMap<String, u32>,
) -> Result<usize, String> {
    match kind {
        "char_display" => create_char_display(computer, start_address, settings, labels),
        "colour_char_display" => {
            create_colour_char_display(computer, start_address, settings, labels)
        }
        "keyboard" => create_keyboard(computer, start_address, settings, labels),
        other => Err(format!("unknown device kind {other:?}")),
    }
}
