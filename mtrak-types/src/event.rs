//! Three-byte MIDI channel events and their nibble ("digit") addressing.
//!
//! The pattern grid stores every cell as an [`Event`]. Editing works on six
//! 4-bit digits per event: digits 0–1 are the status byte, 2–3 data1 and
//! 4–5 data2.

use serde::{Deserialize, Serialize};

/// Number of editable digits per event.
pub const DIGITS_PER_EVENT: usize = 6;

/// A single 3-byte event: status, data1, data2.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Event(pub [u8; 3]);

impl Event {
    pub const EMPTY: Event = Event([0; 3]);

    pub const fn new(status: u8, data1: u8, data2: u8) -> Self {
        Self([status, data1, data2])
    }

    pub fn status(&self) -> u8 {
        self.0[0]
    }

    pub fn data1(&self) -> u8 {
        self.0[1]
    }

    pub fn data2(&self) -> u8 {
        self.0[2]
    }

    /// Low nibble of the status byte.
    pub fn channel(&self) -> u8 {
        self.0[0] & 0x0f
    }

    pub fn is_empty(&self) -> bool {
        self.0 == [0; 3]
    }

    /// True when the status byte is a real status (0x80 and above).
    pub fn is_channel_message(&self) -> bool {
        self.0[0] >= 0x80
    }

    /// Read digit `index` (0..6). Out-of-range indices read as zero.
    pub fn digit(&self, index: usize) -> u8 {
        match index {
            0..=5 => {
                let byte = self.0[index / 2];
                if index % 2 == 0 {
                    byte >> 4
                } else {
                    byte & 0x0f
                }
            }
            _ => 0,
        }
    }

    /// Overwrite digit `index` with the low nibble of `value`.
    pub fn set_digit(&mut self, index: usize, value: u8) {
        if index >= DIGITS_PER_EVENT {
            return;
        }
        let byte = &mut self.0[index / 2];
        if index % 2 == 0 {
            *byte = (*byte & 0x0f) | ((value & 0x0f) << 4);
        } else {
            *byte = (*byte & 0xf0) | (value & 0x0f);
        }
    }

    pub fn wire_length(&self) -> usize {
        wire_length(self.0[0])
    }

    /// The bytes that go on the wire; empty for unsupported statuses.
    pub fn wire_bytes(&self) -> &[u8] {
        &self.0[..self.wire_length()]
    }

    /// A cell with zero status but some data inherits every zero field from
    /// `defaults`. Cells with a status, or with no data at all, are returned
    /// unchanged.
    pub fn fill_from(self, defaults: Event) -> Event {
        if self.0[0] != 0 || (self.0[1] == 0 && self.0[2] == 0) {
            return self;
        }
        let mut filled = self;
        for (byte, default) in filled.0.iter_mut().zip(defaults.0) {
            if *byte == 0 {
                *byte = default;
            }
        }
        filled
    }
}

/// Wire length derived from the status nibble.
pub fn wire_length(status: u8) -> usize {
    match status >> 4 {
        0x8 | 0x9 | 0xA | 0xB | 0xE => 3,
        0xC | 0xD => 2,
        // 0xF is the system class (sysex and friends), not supported
        _ => 0,
    }
}
