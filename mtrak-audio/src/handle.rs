//! Queues between the edit thread and the playback callback.
//!
//! The edit side holds a [`PlaybackHandle`], the callback owns the
//! [`SchedulerQueues`], and a [`FeedbackRelay`] moves playback reports from
//! the bounded real-time queue onto an unbounded one the edit side can drain
//! at its own pace.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TrySendError};
use thiserror::Error;

use mtrak_types::{Action, Event, Feedback};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Capacity of the action, preview and real-time feedback queues.
    pub queue_capacity: usize,
    /// Longest time `submit` waits for room in the action queue.
    pub submit_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 64,
            submit_timeout: Duration::from_millis(100),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("playback queue is full")]
    Full,
    #[error("playback side has shut down")]
    Disconnected,
}

/// Build the three queues and their endpoints.
pub fn pipeline(config: PipelineConfig) -> (PlaybackHandle, SchedulerQueues, FeedbackRelay) {
    let capacity = config.queue_capacity.max(1);
    let (action_tx, action_rx) = crossbeam_channel::bounded(capacity);
    let (preview_tx, preview_rx) = crossbeam_channel::bounded(capacity);
    let (rt_feedback_tx, rt_feedback_rx) = crossbeam_channel::bounded(capacity);
    let (feedback_tx, feedback_rx) = crossbeam_channel::unbounded();

    let handle = PlaybackHandle {
        action_tx,
        preview_tx,
        feedback_rx,
        submit_timeout: config.submit_timeout,
    };
    let queues = SchedulerQueues {
        action_rx,
        preview_rx,
        feedback_tx: rt_feedback_tx,
    };
    let relay = FeedbackRelay {
        rx: rt_feedback_rx,
        tx: feedback_tx,
    };
    (handle, queues, relay)
}

/// Edit-side endpoint.
pub struct PlaybackHandle {
    action_tx: Sender<Action>,
    preview_tx: Sender<Event>,
    feedback_rx: Receiver<Feedback>,
    submit_timeout: Duration,
}

impl PlaybackHandle {
    /// Queue an action, waiting at most the configured timeout for room.
    pub fn submit(&self, action: Action) -> Result<(), SubmitError> {
        self.action_tx
            .send_timeout(action, self.submit_timeout)
            .map_err(|e| match e {
                SendTimeoutError::Timeout(_) => SubmitError::Full,
                SendTimeoutError::Disconnected(_) => SubmitError::Disconnected,
            })
    }

    /// Queue an event to be played immediately. Never waits.
    pub fn preview(&self, event: Event) -> Result<(), SubmitError> {
        self.preview_tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => SubmitError::Full,
            TrySendError::Disconnected(_) => SubmitError::Disconnected,
        })
    }

    pub fn drain_feedback(&self) -> Vec<Feedback> {
        let mut out = Vec::new();
        while let Ok(msg) = self.feedback_rx.try_recv() {
            out.push(msg);
        }
        out
    }

    /// Block until the next report arrives or `timeout` passes.
    pub fn recv_feedback_timeout(&self, timeout: Duration) -> Option<Feedback> {
        match self.feedback_rx.recv_timeout(timeout) {
            Ok(msg) => Some(msg),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn pending_actions(&self) -> usize {
        self.action_tx.len()
    }
}

/// Playback-side endpoint, owned by the scheduler.
pub struct SchedulerQueues {
    pub(crate) action_rx: Receiver<Action>,
    pub(crate) preview_rx: Receiver<Event>,
    pub(crate) feedback_tx: Sender<Feedback>,
}

/// Forwards playback reports off the real-time queue.
pub struct FeedbackRelay {
    rx: Receiver<Feedback>,
    tx: Sender<Feedback>,
}

impl FeedbackRelay {
    /// Run the relay on its own thread until either side disconnects.
    pub fn spawn(self) -> std::io::Result<JoinHandle<()>> {
        thread::Builder::new()
            .name("mtrak-feedback".into())
            .spawn(move || {
                for msg in self.rx.iter() {
                    if self.tx.send(msg).is_err() {
                        break;
                    }
                }
                log::debug!(target: "pipeline", "feedback relay stopped");
            })
    }

    /// Forward everything currently queued. Returns the number forwarded.
    pub fn pump(&self) -> usize {
        let mut count = 0;
        while let Ok(msg) = self.rx.try_recv() {
            if self.tx.send(msg).is_err() {
                break;
            }
            count += 1;
        }
        count
    }
}
