use log::{error, info};

use crate::cpu::{Cpu, StepOutcome};
use crate::host::{Clock, FrameSink, InputSource, Signal, SoundSink};
use crate::machine::MachineIo;
use crate::memory::Memory;
use crate::video::scan_out;

/// Tuning knobs for the frame driver. None of these are part of the
/// observable contract — only the 60 Hz / two-interrupts-per-frame cadence
/// they approximate is.
#[derive(Debug, Clone, Copy)]
pub struct DriverConfig {
    /// Instructions executed between wall-clock checks.
    pub burst_size: u32,
    /// Milliseconds between the mid-screen and vertical-blank interrupts.
    pub interrupt_period_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { burst_size: 100, interrupt_period_ms: 8 }
    }
}

/// Runs the emulator until the input source signals quit or the CPU
/// executes `HLT`. Paces two interrupts per frame (`RST 1` mid-screen,
/// `RST 2` vertical blank) against `clock`, draining `input` once per
/// iteration and scanning VRAM to `frames` on every vertical blank.
pub fn run(
    cpu: &mut Cpu,
    mem: &mut Memory,
    io: &mut MachineIo,
    config: DriverConfig,
    clock: &dyn Clock,
    input: &mut dyn InputSource,
    frames: &mut dyn FrameSink,
    sound: &mut dyn SoundSink,
) {
    info!("starting frame driver: burst_size={}", config.burst_size);

    let mut next_interrupt_at = clock.now_ms() + config.interrupt_period_ms;
    let mut which_interrupt: u8 = 1;

    loop {
        if input.poll(io) == Signal::Quit {
            info!("quit signal received, stopping");
            return;
        }

        if clock.now_ms() >= next_interrupt_at {
            cpu.inject(mem, which_interrupt);
            if which_interrupt == 2 {
                let frame = scan_out(mem.vram());
                frames.present(&frame);
            }
            which_interrupt = if which_interrupt == 1 { 2 } else { 1 };
            next_interrupt_at = clock.now_ms() + config.interrupt_period_ms;
        }

        for _ in 0..config.burst_size {
            match cpu.step(mem, io, sound) {
                Ok(StepOutcome::Continue) => {}
                Ok(StepOutcome::Halted) => {
                    info!("HLT executed, stopping");
                    return;
                }
                Err(e) => {
                    error!("{e}");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{NullFrameSink, NullInputSource, NullSoundSink};
    use std::cell::Cell;

    struct FakeClock {
        ms: Cell<u64>,
        step_ms: u64,
    }

    impl Clock for FakeClock {
        fn now_ms(&self) -> u64 {
            let v = self.ms.get();
            self.ms.set(v + self.step_ms);
            v
        }
    }

    #[test]
    fn halt_stops_the_driver() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new();
        mem.load_rom(&[0x76]);
        let mut io = MachineIo::new();
        let clock = FakeClock { ms: Cell::new(0), step_ms: 1 };
        let mut input = NullInputSource;
        let mut frames = NullFrameSink;
        let mut sound = NullSoundSink;

        run(
            &mut cpu,
            &mut mem,
            &mut io,
            DriverConfig::default(),
            &clock,
            &mut input,
            &mut frames,
            &mut sound,
        );

        assert_eq!(cpu.pc, 1);
    }

    struct QuitAfterOnePoll {
        polled: bool,
    }

    impl InputSource for QuitAfterOnePoll {
        fn poll(&mut self, _io: &mut MachineIo) -> Signal {
            if self.polled {
                Signal::Quit
            } else {
                self.polled = true;
                Signal::Continue
            }
        }
    }

    #[test]
    fn quit_signal_stops_the_driver() {
        let mut cpu = Cpu::new();
        let mut mem = Memory::new();
        // infinite loop: JMP 0x0000, so only the quit signal can stop the driver
        mem.load_rom(&[0xc3, 0x00, 0x00]);
        let mut io = MachineIo::new();
        let clock = FakeClock { ms: Cell::new(0), step_ms: 0 };
        let mut input = QuitAfterOnePoll { polled: false };
        let mut frames = NullFrameSink;
        let mut sound = NullSoundSink;

        run(
            &mut cpu,
            &mut mem,
            &mut io,
            DriverConfig { burst_size: 10, interrupt_period_ms: 1_000_000 },
            &clock,
            &mut input,
            &mut frames,
            &mut sound,
        );
    }

    struct QuitAfterNPolls {
        polls: u32,
        threshold: u32,
    }

    impl InputSource for QuitAfterNPolls {
        fn poll(&mut self, _io: &mut MachineIo) -> Signal {
            self.polls += 1;
            if self.polls >= self.threshold {
                Signal::Quit
            } else {
                Signal::Continue
            }
        }
    }

    #[test]
    fn vertical_blank_triggers_a_frame_present() {
        struct CountingSink {
            count: std::cell::Cell<u32>,
        }
        impl FrameSink for CountingSink {
            fn present(&mut self, _frame: &crate::video::Frame) {
                self.count.set(self.count.get() + 1);
            }
        }

        // Zeroed memory decodes entirely as NOP, so the CPU never halts on
        // its own; the interrupt-enable latch is forced on so `inject`
        // actually takes effect every simulated vblank.
        let mut cpu = Cpu::new();
        cpu.interrupt_enable = true;
        let mut mem = Memory::new();
        let mut io = MachineIo::new();
        let clock = FakeClock { ms: Cell::new(0), step_ms: 100 };
        let mut input = QuitAfterNPolls { polls: 0, threshold: 3 };
        let mut frames = CountingSink { count: std::cell::Cell::new(0) };
        let mut sound = NullSoundSink;

        run(
            &mut cpu,
            &mut mem,
            &mut io,
            DriverConfig { burst_size: 1, interrupt_period_ms: 1 },
            &clock,
            &mut input,
            &mut frames,
            &mut sound,
        );

        assert!(frames.count.get() >= 1);
    }
}
