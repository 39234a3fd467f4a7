use std::cell::RefCell;
use std::fs;
use std::process::ExitCode;
use std::time::Instant;

use invaders8080::{
    Clock, DriverConfig, Emulator, Frame, FrameSink, InputSource, MachineIo, Signal, SoundEffect,
    SoundSink,
};
use log::error;
use minifb::{Key, Window, WindowOptions};

const SCALE: usize = 3;

fn main() -> ExitCode {
    env_logger::init();

    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "space-invaders".into());
    let rom_path = match args.next() {
        Some(path) => path,
        None => {
            error!("usage: {program} <rom-path>");
            return ExitCode::FAILURE;
        }
    };

    let rom = match fs::read(&rom_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("could not read ROM {rom_path}: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut emu = Emulator::new();
    emu.load_rom(&rom);

    let window = match MinifbWindow::new() {
        Ok(w) => RefCell::new(w),
        Err(e) => {
            error!("could not open window: {e}");
            return ExitCode::FAILURE;
        }
    };
    let clock = WallClock { start: Instant::now() };
    let mut sound = match RodioSound::new() {
        Ok(s) => s,
        Err(e) => {
            error!("could not open audio output: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut input = WindowInput { window: &window };
    let mut frames = WindowDisplay { window: &window };
    emu.run(DriverConfig::default(), &clock, &mut input, &mut frames, &mut sound);

    ExitCode::SUCCESS
}

struct WallClock {
    start: Instant,
}

impl Clock for WallClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Owns the single `minifb::Window`. `WindowInput`/`WindowDisplay` each
/// hold a shared reference to a `RefCell` around it and borrow mutably
/// only for the duration of one trait call, the way
/// `examples/flinesse-chippity/src/io_controller.rs` shares one peripheral
/// across the input/display/audio facades.
struct MinifbWindow {
    window: Window,
    framebuf: Vec<u32>,
}

impl MinifbWindow {
    fn new() -> Result<Self, minifb::Error> {
        let window = Window::new(
            "Space Invaders",
            invaders8080::video::SCREEN_WIDTH * SCALE,
            invaders8080::video::SCREEN_HEIGHT * SCALE,
            WindowOptions { resize: false, ..WindowOptions::default() },
        )?;
        Ok(Self {
            window,
            framebuf: vec![0; invaders8080::video::SCREEN_WIDTH * invaders8080::video::SCREEN_HEIGHT],
        })
    }
}

struct WindowInput<'a> {
    window: &'a RefCell<MinifbWindow>,
}

impl<'a> InputSource for WindowInput<'a> {
    fn poll(&mut self, io: &mut MachineIo) -> Signal {
        let win = self.window.borrow();
        if !win.window.is_open() || win.window.is_key_down(Key::Escape) {
            return Signal::Quit;
        }

        let mut set = |byte: &mut u8, bit: u8, down: bool| {
            if down {
                *byte |= 1 << bit;
            } else {
                *byte &= !(1 << bit);
            }
        };

        set(&mut io.port1, 0, win.window.is_key_down(Key::C));
        set(&mut io.port1, 2, win.window.is_key_down(Key::Key1));
        set(&mut io.port1, 1, win.window.is_key_down(Key::Key2));
        set(&mut io.port1, 4, win.window.is_key_down(Key::Space));
        set(&mut io.port1, 5, win.window.is_key_down(Key::Left));
        set(&mut io.port1, 6, win.window.is_key_down(Key::Right));
        set(&mut io.port2, 4, win.window.is_key_down(Key::E));
        set(&mut io.port2, 5, win.window.is_key_down(Key::Q));
        set(&mut io.port2, 6, win.window.is_key_down(Key::W));

        Signal::Continue
    }
}

struct WindowDisplay<'a> {
    window: &'a RefCell<MinifbWindow>,
}

impl<'a> FrameSink for WindowDisplay<'a> {
    fn present(&mut self, frame: &Frame) {
        let mut win = self.window.borrow_mut();
        win.framebuf.copy_from_slice(&frame.pixels);
        let (w, h) = (invaders8080::video::SCREEN_WIDTH, invaders8080::video::SCREEN_HEIGHT);
        let framebuf = win.framebuf.clone();
        let _ = win.window.update_with_buffer(&framebuf, w, h);
    }
}

/// Synthesizes one short tone per sound effect with `rodio::source::SineWave`
/// rather than shipping sample assets the original cabinet's ROM does not
/// include in this repository.
struct RodioSound {
    _stream: rodio::OutputStream,
    handle: rodio::OutputStreamHandle,
}

impl RodioSound {
    fn new() -> Result<Self, rodio::StreamError> {
        let (stream, handle) = rodio::OutputStream::try_default()?;
        Ok(Self { _stream: stream, handle })
    }

    fn frequency(effect: SoundEffect) -> f32 {
        match effect {
            SoundEffect::Ufo => 220.0,
            SoundEffect::Shot => 660.0,
            SoundEffect::PlayerDie => 110.0,
            SoundEffect::InvaderDie => 880.0,
            SoundEffect::Fleet1 => 330.0,
            SoundEffect::Fleet2 => 370.0,
            SoundEffect::Fleet3 => 415.0,
            SoundEffect::Fleet4 => 466.0,
            SoundEffect::UfoHit => 523.0,
        }
    }
}

impl SoundSink for RodioSound {
    fn trigger(&mut self, effect: SoundEffect) {
        use rodio::Source;

        let source = rodio::source::SineWave::new(Self::frequency(effect))
            .amplify(0.15)
            .take_duration(std::time::Duration::from_millis(80));
        if let Err(e) = self.handle.play_raw(source.convert_samples()) {
            error!("could not play sound effect: {e}");
        }
    }
}
