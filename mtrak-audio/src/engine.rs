//! Audio/MIDI bootstrap.
//!
//! The default cpal output device provides the buffer clock: its callback
//! fills a silent buffer and hands the frame count to the playback callback.
//! Events written during that call are sent to a midir output port.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleFormat, SizedSample, Stream, StreamConfig};
use midir::{MidiOutput, MidiOutputConnection};
use thiserror::Error;

use crate::sink::EventBuffer;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("MIDI init failed: {0}")]
    MidiInit(#[from] midir::InitError),
    #[error("no MIDI output port matching '{0}'")]
    PortNotFound(String),
    #[error("MIDI connect failed: {0}")]
    Connect(String),
    #[error("no audio output device available")]
    NoOutputDevice,
    #[error("audio output config: {0}")]
    Config(#[from] cpal::DefaultStreamConfigError),
    #[error("unsupported sample format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to build output stream: {0}")]
    Build(#[from] cpal::BuildStreamError),
    #[error("failed to start output stream: {0}")]
    Play(#[from] cpal::PlayStreamError),
    #[error("failed to start playback thread: {0}")]
    Thread(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// MIDI client name.
    pub client_name: String,
    /// Output port to connect to, matched as a substring. Without one a
    /// virtual port named after the client is created.
    pub port_name: Option<String>,
    /// Events kept per buffer.
    pub event_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            client_name: "mtrak".to_string(),
            port_name: None,
            event_capacity: 1024,
        }
    }
}

/// Names of the MIDI output ports currently visible.
pub fn output_ports(client_name: &str) -> Result<Vec<String>, EngineError> {
    let midi_out = MidiOutput::new(client_name)?;
    Ok(midi_out
        .ports()
        .iter()
        .filter_map(|p| midi_out.port_name(p).ok())
        .collect())
}

pub struct MidiEngine {
    stream: Option<Stream>,
    sample_rate: u32,
    port: String,
}

impl MidiEngine {
    /// Open the MIDI port and start the output stream. `callback` runs on
    /// the audio thread once per buffer with the frame count.
    pub fn open<F>(config: &EngineConfig, callback: F) -> Result<Self, EngineError>
    where
        F: FnMut(u32, &mut EventBuffer) + Send + 'static,
    {
        let (connection, port) = connect_output(config)?;

        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(EngineError::NoOutputDevice)?;
        let supported = device.default_output_config()?;
        let sample_rate = supported.sample_rate().0;
        let format = supported.sample_format();
        let stream_config: StreamConfig = supported.config();
        let buffer = EventBuffer::with_capacity(sample_rate, config.event_capacity);

        let stream = match format {
            SampleFormat::F32 => {
                build_stream::<f32, F>(&device, &stream_config, buffer, connection, callback)?
            }
            SampleFormat::I16 => {
                build_stream::<i16, F>(&device, &stream_config, buffer, connection, callback)?
            }
            SampleFormat::U16 => {
                build_stream::<u16, F>(&device, &stream_config, buffer, connection, callback)?
            }
            SampleFormat::I32 => {
                build_stream::<i32, F>(&device, &stream_config, buffer, connection, callback)?
            }
            other => return Err(EngineError::UnsupportedFormat(format!("{:?}", other))),
        };
        stream.play()?;

        log::info!(
            target: "engine",
            "started: {} Hz, {} channels, MIDI out '{}'",
            sample_rate,
            stream_config.channels,
            port
        );

        Ok(Self {
            stream: Some(stream),
            sample_rate,
            port,
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn port_name(&self) -> &str {
        &self.port
    }

    /// Stop the stream and release the MIDI port.
    pub fn close(mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                log::warn!(target: "engine", "pause failed: {}", e);
            }
        }
        log::info!(target: "engine", "closed");
    }
}

fn connect_output(config: &EngineConfig) -> Result<(MidiOutputConnection, String), EngineError> {
    let midi_out = MidiOutput::new(&config.client_name)?;
    match config.port_name.as_deref().filter(|name| !name.is_empty()) {
        Some(wanted) => {
            let ports = midi_out.ports();
            let found = ports.iter().find_map(|p| {
                let name = midi_out.port_name(p).ok()?;
                name.contains(wanted).then(|| (p.clone(), name))
            });
            let (port, name) = found.ok_or_else(|| EngineError::PortNotFound(wanted.to_string()))?;
            let connection = midi_out
                .connect(&port, "mtrak-out")
                .map_err(|e| EngineError::Connect(e.to_string()))?;
            Ok((connection, name))
        }
        None => connect_virtual(midi_out, &config.client_name),
    }
}

#[cfg(unix)]
fn connect_virtual(
    midi_out: MidiOutput,
    name: &str,
) -> Result<(MidiOutputConnection, String), EngineError> {
    use midir::os::unix::VirtualOutput;
    let connection = midi_out
        .create_virtual(name)
        .map_err(|e| EngineError::Connect(e.to_string()))?;
    Ok((connection, format!("{} (virtual)", name)))
}

#[cfg(not(unix))]
fn connect_virtual(
    midi_out: MidiOutput,
    _name: &str,
) -> Result<(MidiOutputConnection, String), EngineError> {
    let ports = midi_out.ports();
    let port = ports
        .first()
        .ok_or_else(|| EngineError::PortNotFound("<any>".to_string()))?;
    let name = midi_out.port_name(port).unwrap_or_default();
    let connection = midi_out
        .connect(port, "mtrak-out")
        .map_err(|e| EngineError::Connect(e.to_string()))?;
    Ok((connection, name))
}

fn build_stream<T, F>(
    device: &Device,
    config: &StreamConfig,
    mut buffer: EventBuffer,
    mut connection: MidiOutputConnection,
    mut callback: F,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    F: FnMut(u32, &mut EventBuffer) + Send + 'static,
{
    let channels = config.channels.max(1) as usize;
    device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            data.fill(T::EQUILIBRIUM);
            buffer.clear();
            callback((data.len() / channels) as u32, &mut buffer);
            let failed = buffer
                .events()
                .iter()
                .filter(|event| connection.send(event.bytes()).is_err())
                .count();
            // reported with the next telemetry summary
            buffer.record_failed_sends(failed as u64);
        },
        |err| {
            log::error!(target: "engine", "output stream error: {}", err);
        },
        None,
    )
}
