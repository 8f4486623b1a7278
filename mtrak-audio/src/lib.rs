//! Playback side of mtrak: the real-time scheduler, the queues that feed it,
//! and the audio/MIDI engine that drives it.

pub mod engine;
pub mod handle;
pub mod scheduler;
pub mod sink;
pub mod telemetry;

pub use engine::{output_ports, EngineConfig, EngineError, MidiEngine};
pub use handle::{pipeline, FeedbackRelay, PipelineConfig, PlaybackHandle, SchedulerQueues, SubmitError};
pub use scheduler::{PlaybackState, ProcessStatus, Scheduler};
pub use sink::{EventBuffer, EventSink, TimedEvent};
pub use telemetry::{ProcessTelemetry, TelemetrySummary};
