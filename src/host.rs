use std::mem::discriminant;

use crate::machine::{MachineIo, SoundEffect};
use crate::video::Frame;

/// What the driver should do after polling input or stepping the CPU.
pub enum Signal {
    Continue,
    Quit,
}

impl PartialEq for Signal {
    fn eq(&self, other: &Signal) -> bool {
        discriminant(self) == discriminant(other)
    }
}

/// Monotonic millisecond clock, injected so interrupt pacing is testable
/// without sleeping in real time.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Drains pending input and mutates the port bits directly.
pub trait InputSource {
    fn poll(&mut self, io: &mut MachineIo) -> Signal;
}

/// Receives one fully scanned-out frame per vertical blank.
pub trait FrameSink {
    fn present(&mut self, frame: &Frame);
}

/// Receives one call per write with the corresponding trigger bit set, once
/// per bit, every write — `MachineIo` does not dedupe across writes with the
/// same bit still set, so a sink that wants debouncing does it itself.
pub trait SoundSink {
    fn trigger(&mut self, effect: SoundEffect);
}

pub struct NullInputSource;

impl InputSource for NullInputSource {
    fn poll(&mut self, _io: &mut MachineIo) -> Signal {
        Signal::Continue
    }
}

pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn present(&mut self, _frame: &Frame) {}
}

pub struct NullSoundSink;

impl SoundSink for NullSoundSink {
    fn trigger(&mut self, _effect: SoundEffect) {}
}
