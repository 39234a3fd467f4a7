pub mod cpu;
pub mod driver;
pub mod host;
pub mod machine;
pub mod memory;
pub mod video;

pub use cpu::{Cpu, CpuError, Flags, StepOutcome};
pub use driver::DriverConfig;
pub use host::{Clock, FrameSink, InputSource, NullFrameSink, NullInputSource, NullSoundSink, Signal, SoundSink};
pub use machine::{MachineIo, SoundEffect};
pub use memory::Memory;
pub use video::{scan_out, Frame};

/// Bundles a `Cpu`, `Memory`, and `MachineIo` behind the frame driver's
/// entry point. ROM loading is the only setup step this struct performs —
/// there is no `Configuration` layer, unlike a CPU with multiple linker-
/// relocatable entry points: Space Invaders always starts execution at
/// address zero.
pub struct Emulator {
    pub cpu: Cpu,
    pub memory: Memory,
    pub io: MachineIo,
}

impl Emulator {
    pub fn new() -> Self {
        Self { cpu: Cpu::new(), memory: Memory::new(), io: MachineIo::new() }
    }

    pub fn load_rom(&mut self, rom: &[u8]) {
        self.memory.load_rom(rom);
    }

    pub fn run(
        &mut self,
        config: DriverConfig,
        clock: &dyn Clock,
        input: &mut dyn InputSource,
        frames: &mut dyn FrameSink,
        sound: &mut dyn SoundSink,
    ) {
        driver::run(
            &mut self.cpu,
            &mut self.memory,
            &mut self.io,
            config,
            clock,
            input,
            frames,
            sound,
        );
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self::new()
    }
}
