//! Destination of the scheduler's timed events.

/// Receives the events produced for one buffer.
///
/// Implementations are called from the real-time callback and must not
/// block or allocate.
pub trait EventSink {
    fn sample_rate(&self) -> u32;

    /// Write `bytes` at frame `offset` within the current buffer.
    fn write_event(&mut self, offset: u32, bytes: &[u8]);

    /// Total events written here that never reached the output.
    fn lost_events(&self) -> u64 {
        0
    }
}

/// One event stamped with its frame offset in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub offset: u32,
    len: u8,
    bytes: [u8; 3],
}

impl TimedEvent {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// Fixed-capacity event list for one buffer.
///
/// Storage is reserved up front; events past the capacity are counted and
/// discarded rather than growing the list.
#[derive(Debug)]
pub struct EventBuffer {
    sample_rate: u32,
    events: Vec<TimedEvent>,
    dropped: u64,
    failed_sends: u64,
}

impl EventBuffer {
    pub fn with_capacity(sample_rate: u32, capacity: usize) -> Self {
        Self {
            sample_rate,
            events: Vec::with_capacity(capacity.max(1)),
            dropped: 0,
            failed_sends: 0,
        }
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Total events discarded because the buffer was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Count events the output refused after the buffer was filled.
    pub fn record_failed_sends(&mut self, count: u64) {
        self.failed_sends += count;
    }

    pub fn failed_sends(&self) -> u64 {
        self.failed_sends
    }
}

impl EventSink for EventBuffer {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn write_event(&mut self, offset: u32, bytes: &[u8]) {
        if bytes.is_empty() || bytes.len() > 3 {
            return;
        }
        if self.events.len() == self.events.capacity() {
            self.dropped += 1;
            return;
        }
        let mut buf = [0u8; 3];
        buf[..bytes.len()].copy_from_slice(bytes);
        self.events.push(TimedEvent {
            offset,
            len: bytes.len() as u8,
            bytes: buf,
        });
    }

    fn lost_events(&self) -> u64 {
        self.dropped + self.failed_sends
    }
}
