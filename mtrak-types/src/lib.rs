//! # mtrak-types
//!
//! Plain data shared by the mtrak edit side and playback side: the event
//! codec, patterns, geometry, songs, and the ops that flow between threads.

pub mod action;
pub mod event;
pub mod geometry;
pub mod pattern;
pub mod scale;
pub mod song;

pub use action::{Action, Feedback, Op, Origin};
pub use event::{wire_length, Event, DIGITS_PER_EVENT};
pub use geometry::{Brush, Point, Rect, Size};
pub use pattern::{Block, Pattern, Row, TrackResize, MAX_ROWS, MAX_TRACKS};
pub use scale::Scale;
pub use song::{NoteContext, Song, Timing, MAX_PATTERNS};
