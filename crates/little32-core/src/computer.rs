//! Host orchestration: wires a `Core` to a bus of RAM and devices, and
//! drives the interval scheduler off the core's cycle count.

use crate::core::Core;
use crate::device::{InputEvent, MappedDevice};
use crate::observable::{Observable, Value};
use crate::scheduler::{IntervalId, Scheduler};
use crate::Bus;

/// The concrete bus: a flat list of plain RAM regions and a flat list of
/// mapped devices, first-match-wins, RAM checked before devices.
///
/// This mirrors the original engine's linear `AddressRange` scan rather
/// than a sorted/interval-tree lookup: Little32 machines map a handful of
/// regions, so a scan is simpler and fast enough.
#[derive(Default)]
struct BusState {
    mappings: Vec<crate::device::RamMapping>,
    devices: Vec<Box<dyn MappedDevice>>,
}

impl BusState {
    /// Finds the mapping or device covering `addr`, returning its index
    /// into the relevant list tagged by kind, and the address translated
    /// to an offset within that region.
    fn dispatch(&self, addr: u32) -> Option<(Region, u32)> {
        for (i, m) in self.mappings.iter().enumerate() {
            if addr >= m.address() && addr - m.address() < m.range() {
                return Some((Region::Mapping(i), addr - m.address()));
            }
        }
        for (i, d) in self.devices.iter().enumerate() {
            if addr >= d.address() && addr - d.address() < d.range() {
                return Some((Region::Device(i), addr - d.address()));
            }
        }
        None
    }
}

enum Region {
    Mapping(usize),
    Device(usize),
}

impl Bus for BusState {
    fn read(&mut self, addr: u32) -> u32 {
        match self.dispatch(addr) {
            Some((Region::Mapping(i), off)) => self.mappings[i].read(off),
            Some((Region::Device(i), off)) => self.devices[i].read(off),
            None => 0,
        }
    }

    fn read_byte(&mut self, addr: u32) -> u8 {
        match self.dispatch(addr) {
            Some((Region::Mapping(i), off)) => self.mappings[i].read_byte(off),
            Some((Region::Device(i), off)) => self.devices[i].read_byte(off),
            None => 0,
        }
    }

    fn write(&mut self, addr: u32, value: u32) {
        match self.dispatch(addr) {
            Some((Region::Mapping(i), off)) => self.mappings[i].write(off, value),
            Some((Region::Device(i), off)) => self.devices[i].write(off, value),
            None => {}
        }
    }

    fn write_byte(&mut self, addr: u32, value: u8) {
        match self.dispatch(addr) {
            Some((Region::Mapping(i), off)) => self.mappings[i].write_byte(off, value),
            Some((Region::Device(i), off)) => self.devices[i].write_byte(off, value),
            None => {}
        }
    }
}

impl BusState {
    /// Bypasses write filtering. Used by program loaders.
    fn write_forced(&mut self, addr: u32, value: u32) {
        match self.dispatch(addr) {
            Some((Region::Mapping(i), off)) => self.mappings[i].write_forced(off, value),
            Some((Region::Device(i), off)) => self.devices[i].write_forced(off, value),
            None => {}
        }
    }

    fn write_byte_forced(&mut self, addr: u32, value: u8) {
        match self.dispatch(addr) {
            Some((Region::Mapping(i), off)) => self.mappings[i].write_byte_forced(off, value),
            Some((Region::Device(i), off)) => self.devices[i].write_byte_forced(off, value),
            None => {}
        }
    }
}

/// A fully assembled Little32 machine: a core, its bus of RAM and devices,
/// and the interval scheduler driven by the core's cycle count.
///
/// `C` is the execution core — typically `little32_cpu::Little32Core`, or
/// `little32_cpu::DebugCore` in tests that don't need real instruction
/// semantics.
pub struct Computer<C: Core> {
    core: C,
    bus: BusState,
    scheduler: Scheduler<Computer<C>>,
    cur_cycle: u64,
    start_pc: u32,
    start_sp: u32,
}

impl<C: Core + Default> Computer<C> {
    /// Creates a computer with a freshly reset core and an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            core: C::default(),
            bus: BusState::default(),
            scheduler: Scheduler::new(),
            cur_cycle: 0,
            start_pc: 0,
            start_sp: 0,
        }
    }
}

impl<C: Core + Default> Default for Computer<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Core> Computer<C> {
    /// Sets the program counter and stack pointer a reset restores.
    pub fn set_start(&mut self, pc: u32, sp: u32) {
        self.start_pc = pc;
        self.start_sp = sp;
    }

    #[must_use]
    pub fn cur_cycle(&self) -> u64 {
        self.cur_cycle
    }

    #[must_use]
    pub fn core(&self) -> &C {
        &self.core
    }

    pub fn core_mut(&mut self) -> &mut C {
        &mut self.core
    }

    /// Adds a plain RAM region to the bus.
    pub fn add_mapping(&mut self, mapping: crate::device::RamMapping) {
        self.bus.mappings.push(mapping);
    }

    /// Adds a mapped device to the bus, returning its index for later
    /// lookup with `mapped_device`/`mapped_device_mut`.
    pub fn add_mapped_device(&mut self, device: Box<dyn MappedDevice>) -> usize {
        self.bus.devices.push(device);
        self.bus.devices.len() - 1
    }

    #[must_use]
    pub fn mapped_device(&self, index: usize) -> Option<&dyn MappedDevice> {
        self.bus.devices.get(index).map(std::convert::AsRef::as_ref)
    }

    pub fn mapped_device_mut(&mut self, index: usize) -> Option<&mut Box<dyn MappedDevice>> {
        self.bus.devices.get_mut(index)
    }

    /// Schedules `callback` to run every `cycle_length` cycles. `repeats`
    /// of `0` means forever, `1` means once, and any other value fires
    /// that many times before self-removing.
    pub fn add_interval(
        &mut self,
        cycle_length: u64,
        repeats: u64,
        callback: impl FnMut(&mut Self) + 'static,
    ) -> IntervalId {
        self.scheduler
            .add(self.cur_cycle, cycle_length, repeats, Box::new(callback))
    }

    /// Cancels a scheduled interval. Returns whether it was still active.
    pub fn remove_interval(&mut self, id: IntervalId) -> bool {
        self.scheduler.remove(id)
    }

    /// Fires every due callback for the current cycle.
    ///
    /// Each entry is removed from `self.scheduler` *before* its callback
    /// runs, so the callback holds an exclusive borrow of the whole
    /// `Computer` with nothing in `self.scheduler` still borrowed — this
    /// is what lets a callback call `add_interval` on `self` and land in
    /// the live scheduler, rather than a detached snapshot that would
    /// overwrite it afterwards.
    fn check_intervals(&mut self) {
        let mut i = 0;
        while i < self.scheduler.constant.len() {
            let mut entry = self.scheduler.constant.remove(i);
            (entry.callback)(self);
            if entry.repeats != 1 {
                if entry.repeats > 1 {
                    entry.repeats -= 1;
                }
                self.scheduler.constant.insert(i, entry);
                i += 1;
            }
        }

        if let Some(mut bucket) = self.scheduler.delayed.remove(&self.cur_cycle) {
            for mut entry in bucket.drain(..) {
                (entry.callback)(self);
                if entry.repeats != 1 {
                    if entry.repeats > 1 {
                        entry.repeats -= 1;
                    }
                    self.scheduler
                        .delayed
                        .entry(self.cur_cycle + entry.cycle_length)
                        .or_default()
                        .push(entry);
                }
            }
        }
    }

    /// Runs one tick: due callbacks, then one instruction, then the cycle
    /// counter advances. Matches the order callbacks observe `cur_cycle`
    /// in — a callback sees the cycle it was scheduled for, not the next
    /// one.
    pub fn clock(&mut self) {
        self.check_intervals();
        self.core.clock(&mut self.bus);
        self.cur_cycle += 1;
    }

    /// Executes `n` instructions.
    pub fn clock_n(&mut self, n: u32) {
        for _ in 0..n {
            self.clock();
        }
    }

    #[must_use]
    pub fn read(&mut self, addr: u32) -> u32 {
        self.bus.read(addr)
    }

    #[must_use]
    pub fn read_byte(&mut self, addr: u32) -> u8 {
        self.bus.read_byte(addr)
    }

    pub fn write(&mut self, addr: u32, value: u32) {
        self.bus.write(addr, value);
    }

    pub fn write_byte(&mut self, addr: u32, value: u8) {
        self.bus.write_byte(addr, value);
    }

    /// Bypasses write filtering, for loading a program image before boot.
    pub fn write_forced(&mut self, addr: u32, value: u32) {
        self.bus.write_forced(addr, value);
    }

    pub fn write_byte_forced(&mut self, addr: u32, value: u8) {
        self.bus.write_byte_forced(addr, value);
    }

    /// Resets registers and flags but leaves RAM and devices untouched.
    pub fn soft_reset(&mut self) {
        self.core.reset();
        self.core.set_pc(self.start_pc);
        self.core.set_sp(self.start_sp);
    }

    /// Resets the core and every device on the bus.
    pub fn hard_reset(&mut self) {
        self.soft_reset();
        for device in &mut self.bus.devices {
            device.reset();
        }
    }

    /// Renders the device at `index`. `do_interrupt` is forwarded to the
    /// device's `render`; its interrupt only fires when both the device
    /// wants one and the caller asked for it this frame.
    pub fn render_device(&mut self, index: usize, do_interrupt: bool) {
        let vector = self
            .bus
            .devices
            .get_mut(index)
            .and_then(|d| d.render(do_interrupt));
        if let Some(vector) = vector {
            self.core.interrupt(&mut self.bus, vector);
        }
    }

    /// Pushes a frame and jumps to `vector` directly, the way a device's
    /// interrupt call-out does internally. Exposed for hosts that need to
    /// raise an interrupt that isn't tied to a device event — a reset
    /// button, a debugger-injected trap, a test scenario.
    pub fn interrupt(&mut self, vector: u32) {
        self.core.interrupt(&mut self.bus, vector);
    }

    /// Delivers a key event to every device on the bus.
    pub fn notify_devices(&mut self, event: InputEvent) {
        let mut vectors = Vec::new();
        for device in &mut self.bus.devices {
            if let Some(vector) = device.notify(event) {
                vectors.push(vector);
            }
        }
        for vector in vectors {
            self.core.interrupt(&mut self.bus, vector);
        }
    }
}

impl<C: Core + Observable> Observable for Computer<C> {
    /// Delegates `cpu.<path>` to the core; everything else is orchestration
    /// state the core itself doesn't know about.
    fn query(&self, path: &str) -> Option<Value> {
        if let Some(rest) = path.strip_prefix("cpu.") {
            self.core.query(rest)
        } else {
            match path {
                "cur_cycle" => Some(self.cur_cycle.into()),
                _ => self.core.query(path),
            }
        }
    }

    fn query_paths(&self) -> &'static [&'static str] {
        &["cpu.<core_paths>", "cur_cycle"]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::RamMapping;

    #[derive(Default)]
    struct StubCore {
        pc: u32,
        sp: u32,
        ticks: u32,
    }

    impl Core for StubCore {
        fn clock<B: Bus>(&mut self, _bus: &mut B) {
            self.ticks += 1;
        }

        fn reset(&mut self) {
            self.pc = 0;
            self.sp = 0;
            self.ticks = 0;
        }

        fn interrupt<B: Bus>(&mut self, _bus: &mut B, _vector: u32) {}

        fn disassemble(&self, _instruction: u32) -> String {
            String::new()
        }

        fn pc(&self) -> u32 {
            self.pc
        }

        fn set_pc(&mut self, value: u32) {
            self.pc = value;
        }

        fn set_sp(&mut self, value: u32) {
            self.sp = value;
        }
    }

    impl Observable for StubCore {
        fn query(&self, path: &str) -> Option<Value> {
            match path {
                "pc" => Some(self.pc.into()),
                _ => None,
            }
        }

        fn query_paths(&self) -> &'static [&'static str] {
            &["pc"]
        }
    }

    #[test]
    fn query_delegates_cpu_prefix_to_the_core_and_exposes_cur_cycle() {
        let mut computer: Computer<StubCore> = Computer::new();
        computer.core_mut().pc = 0x40;
        computer.clock_n(3);
        assert_eq!(computer.query("cpu.pc"), Some(0x40_u32.into()));
        assert_eq!(computer.query("cur_cycle"), Some(3_u64.into()));
        assert_eq!(computer.query("cpu.missing"), None);
    }

    #[test]
    fn ram_before_device_on_overlap() {
        let mut computer: Computer<StubCore> = Computer::new();
        computer.add_mapping(RamMapping::from_bytes(0, vec![0xAA, 0, 0, 0]));
        assert_eq!(computer.read_byte(0), 0xAA);
    }

    #[test]
    fn unmapped_access_reads_zero_and_drops_writes() {
        let mut computer: Computer<StubCore> = Computer::new();
        computer.write(0x8000, 0x1234);
        assert_eq!(computer.read(0x8000), 0);
    }

    #[test]
    fn constant_interval_fires_every_clock() {
        let mut computer: Computer<StubCore> = Computer::new();
        let count = std::rc::Rc::new(std::cell::RefCell::new(0));
        let count2 = count.clone();
        computer.add_interval(1, 0, move |_| {
            *count2.borrow_mut() += 1;
        });
        computer.clock_n(5);
        assert_eq!(*count.borrow(), 5);
    }

    #[test]
    fn one_shot_interval_self_removes() {
        let mut computer: Computer<StubCore> = Computer::new();
        let count = std::rc::Rc::new(std::cell::RefCell::new(0));
        let count2 = count.clone();
        computer.add_interval(2, 1, move |_| {
            *count2.borrow_mut() += 1;
        });
        computer.clock_n(10);
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn callback_can_reschedule_itself_during_the_same_tick() {
        let mut computer: Computer<StubCore> = Computer::new();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let seen2 = seen.clone();
        computer.add_interval(1, 1, move |c| {
            seen2.borrow_mut().push(c.cur_cycle());
            let seen3 = seen2.clone();
            c.add_interval(1, 1, move |c2| {
                seen3.borrow_mut().push(c2.cur_cycle());
            });
        });
        computer.clock_n(3);
        assert_eq!(seen.borrow().len(), 2);
    }
}
