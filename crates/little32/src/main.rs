//! Headless Little32 runner.
//!
//! Loads a flat raw binary image at a chosen address, runs a chosen
//! number of cycles, and prints the final register file and flags. There
//! is no assembler, config-file loader, or windowed renderer here — those
//! are out of scope for the core (see spec's non-goals); this binary is
//! the minimal harness the core needs to be runnable standalone, the way
//! `emu-c64`'s headless mode is a thin shell around `C64`.

use std::path::PathBuf;
use std::process;

use little32::{load_bytes, Core, Machine, RamMapping};

const RAM_SIZE: u32 = 1 << 20;

struct CliArgs {
    image_path: PathBuf,
    load_address: u32,
    entry_point: u32,
    stack_pointer: u32,
    cycles: u32,
}

fn parse_args() -> Result<CliArgs, String> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        return Err(format!(
            "usage: {} <image.bin> [--load ADDR] [--entry ADDR] [--sp ADDR] [--cycles N]",
            args.first().map_or("little32", String::as_str)
        ));
    }

    let mut image_path = None;
    let mut load_address = 0u32;
    let mut entry_point = 0u32;
    let mut stack_pointer = RAM_SIZE;
    let mut cycles = 1000u32;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--load" => {
                i += 1;
                load_address = parse_hex_or_dec(&args[i])?;
            }
            "--entry" => {
                i += 1;
                entry_point = parse_hex_or_dec(&args[i])?;
            }
            "--sp" => {
                i += 1;
                stack_pointer = parse_hex_or_dec(&args[i])?;
            }
            "--cycles" => {
                i += 1;
                cycles = parse_hex_or_dec(&args[i])?;
            }
            path => image_path = Some(PathBuf::from(path)),
        }
        i += 1;
    }

    Ok(CliArgs {
        image_path: image_path.ok_or("no image path given")?,
        load_address,
        entry_point,
        stack_pointer,
        cycles,
    })
}

fn parse_hex_or_dec(s: &str) -> Result<u32, String> {
    s.strip_prefix("0x")
        .map_or_else(
            || s.parse::<u32>(),
            |hex| u32::from_str_radix(hex, 16),
        )
        .map_err(|e| format!("invalid number {s:?}: {e}"))
}

fn main() {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            process::exit(1);
        }
    };

    let image = match std::fs::read(&args.image_path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("failed to read {}: {e}", args.image_path.display());
            process::exit(1);
        }
    };

    let mut machine: Machine = Machine::new();
    machine.add_mapping(RamMapping::new(0, RAM_SIZE));
    load_bytes(&mut machine, args.load_address, &image);

    machine.set_start(args.entry_point, args.stack_pointer);
    machine.hard_reset();
    machine.clock_n(args.cycles);

    let core = machine.core();
    println!("pc = {:#010x}", core.pc());
    for (i, value) in core.registers.r.iter().enumerate() {
        println!("r{i:<2} = {value:#010x}");
    }
    println!(
        "flags: n={} z={} c={} v={}",
        core.flags.n, core.flags.z, core.flags.c, core.flags.v
    );
}
