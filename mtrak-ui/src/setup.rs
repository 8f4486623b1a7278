use std::thread::{self, JoinHandle};
use std::time::Duration;

use mtrak_audio::{EngineConfig, EngineError, EventBuffer, MidiEngine, ProcessStatus, Scheduler};

const HEADLESS_RATE: u32 = 48000;
const HEADLESS_FRAMES: u32 = 512;

/// Whatever is driving the scheduler.
pub enum Playback {
    Engine(MidiEngine),
    /// No audio device: a thread calls the scheduler on a timer and logs
    /// the events instead of sending them. Exits once the editor is gone.
    Headless(JoinHandle<()>),
}

impl Playback {
    pub fn describe(&self) -> String {
        match self {
            Playback::Engine(engine) => {
                format!("MIDI out '{}' at {} Hz", engine.port_name(), engine.sample_rate())
            }
            Playback::Headless(_) => "no audio (MTRAK_NO_AUDIO)".to_string(),
        }
    }

    pub fn close(self) {
        match self {
            Playback::Engine(engine) => engine.close(),
            Playback::Headless(thread) => {
                if thread.join().is_err() {
                    log::error!(target: "engine", "headless playback thread panicked");
                }
            }
        }
    }
}

/// Start the MIDI engine with `scheduler` in its callback, or the headless
/// driver when `MTRAK_NO_AUDIO` is set.
pub fn start_playback(config: &EngineConfig, scheduler: Scheduler) -> Result<Playback, EngineError> {
    if std::env::var("MTRAK_NO_AUDIO").is_ok() {
        return Ok(Playback::Headless(spawn_headless(scheduler)?));
    }

    let mut state = scheduler.initial_state();
    let mut scheduler = scheduler;
    let engine = MidiEngine::open(config, move |frames, out| {
        scheduler.process(&mut state, frames, out);
    })?;
    Ok(Playback::Engine(engine))
}

fn spawn_headless(mut scheduler: Scheduler) -> std::io::Result<JoinHandle<()>> {
    let period = Duration::from_secs_f64(HEADLESS_FRAMES as f64 / HEADLESS_RATE as f64);
    thread::Builder::new()
        .name("mtrak-headless".into())
        .spawn(move || {
            let mut state = scheduler.initial_state();
            let mut out = EventBuffer::with_capacity(HEADLESS_RATE, 256);
            log::info!(target: "engine", "headless playback at {} Hz", HEADLESS_RATE);
            loop {
                out.clear();
                let status = scheduler.process(&mut state, HEADLESS_FRAMES, &mut out);
                for event in out.events() {
                    log::debug!(target: "engine", "+{} {:02x?}", event.offset, event.bytes());
                }
                if status == ProcessStatus::Disconnected {
                    break;
                }
                thread::sleep(period);
            }
            log::info!(target: "engine", "headless playback stopped");
        })
}
