//! The pattern grid: rows × tracks of [`Event`]s plus per-track defaults.

use serde::{Deserialize, Serialize, Serializer};

use crate::event::{Event, DIGITS_PER_EVENT};
use crate::geometry::{Rect, Size};

/// Upper bound on tracks per pattern. The playback side preallocates its
/// per-track state to this size.
pub const MAX_TRACKS: usize = 64;
/// Upper bound on rows per pattern.
pub const MAX_ROWS: usize = 4096;

pub type Row = Vec<Event>;

/// A W×H grid of nibbles copied out of a pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Block {
    width: usize,
    height: usize,
    digits: Vec<u8>,
}

impl Block {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            digits: vec![0; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, dx: usize, dy: usize) -> u8 {
        self.digits[dy * self.width + dx]
    }

    pub fn set(&mut self, dx: usize, dy: usize, value: u8) {
        self.digits[dy * self.width + dx] = value & 0x0f;
    }

    pub fn row(&self, dy: usize) -> &[u8] {
        &self.digits[dy * self.width..(dy + 1) * self.width]
    }

    /// Top-left `width × height` corner, clipped to this block's size.
    pub fn sub(&self, width: usize, height: usize) -> Block {
        let width = width.min(self.width);
        let height = height.min(self.height);
        let mut out = Block::new(width, height);
        for dy in 0..height {
            for dx in 0..width {
                out.set(dx, dy, self.get(dx, dy));
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "PatternFile")]
pub struct Pattern {
    rows: Vec<Row>,
    track_defaults: Vec<Event>,
}

impl Pattern {
    /// All-zero pattern. Both dimensions are raised to at least one.
    pub fn new(num_rows: usize, num_tracks: usize) -> Self {
        let num_rows = num_rows.max(1);
        let num_tracks = num_tracks.max(1);
        Self {
            rows: vec![vec![Event::EMPTY; num_tracks]; num_rows],
            track_defaults: vec![Event::EMPTY; num_tracks],
        }
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_tracks(&self) -> usize {
        self.track_defaults.len()
    }

    /// Width in digits.
    pub fn width(&self) -> usize {
        self.num_tracks() * DIGITS_PER_EVENT
    }

    /// Digit/row extent as used by the geometry engine.
    pub fn size(&self) -> Size {
        Size::new(self.width() as i32, self.num_rows() as i32)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, y: usize) -> &[Event] {
        &self.rows[y]
    }

    pub fn event(&self, track: usize, y: usize) -> Event {
        self.rows[y][track]
    }

    pub fn set_event(&mut self, track: usize, y: usize, event: Event) {
        self.rows[y][track] = event;
    }

    pub fn track_defaults(&self) -> &[Event] {
        &self.track_defaults
    }

    pub fn set_track_default(&mut self, track: usize, event: Event) {
        if let Some(slot) = self.track_defaults.get_mut(track) {
            *slot = event;
        }
    }

    pub fn digit(&self, x: usize, y: usize) -> u8 {
        self.rows[y][x / DIGITS_PER_EVENT].digit(x % DIGITS_PER_EVENT)
    }

    pub fn set_digit(&mut self, x: usize, y: usize, value: u8) {
        self.rows[y][x / DIGITS_PER_EVENT].set_digit(x % DIGITS_PER_EVENT, value);
    }

    /// Independent copy of the digits under `r`.
    pub fn block(&self, r: Rect) -> Block {
        let (x, y, w, h) = span(r);
        let mut out = Block::new(w, h);
        for dy in 0..h {
            for dx in 0..w {
                out.set(dx, dy, self.digit(x + dx, y + dy));
            }
        }
        out
    }

    /// Write `block` into `r`. Only the overlap of the two sizes is written.
    pub fn set_block(&mut self, r: Rect, block: &Block) {
        let (x, y, w, h) = span(r);
        for dy in 0..h.min(block.height()) {
            for dx in 0..w.min(block.width()) {
                self.set_digit(x + dx, y + dy, block.get(dx, dy));
            }
        }
    }

    pub fn zero_block(&mut self, r: Rect) {
        let (x, y, w, h) = span(r);
        for dy in 0..h {
            for dx in 0..w {
                self.set_digit(x + dx, y + dy, 0);
            }
        }
    }

    /// Copy the content of `r` to `r` translated by `(dx, dy)`. The source is
    /// read in full before writing, so overlapping moves are safe.
    pub fn copy_block(&mut self, r: Rect, dx: i32, dy: i32) {
        let block = self.block(r);
        self.set_block(r.translate(dx, dy), &block);
    }

    /// New pattern with `n` rows. Growing inserts zero rows at `at`, shrinking
    /// removes rows starting at `at` (pulled back so the removal fits).
    pub fn with_num_rows(&self, n: usize, at: usize) -> Pattern {
        let n = n.max(1);
        let current = self.num_rows();
        let mut rows = self.rows.clone();
        if n > current {
            let at = at.min(current);
            let blank = vec![Event::EMPTY; self.num_tracks()];
            rows.splice(at..at, std::iter::repeat(blank).take(n - current));
        } else if n < current {
            let count = current - n;
            let at = at.min(n);
            rows.drain(at..at + count);
        }
        Pattern {
            rows,
            track_defaults: self.track_defaults.clone(),
        }
    }

    /// New pattern with `n` tracks, inserted or removed at track `at`.
    /// Track defaults follow the same insert/remove so index `t` keeps
    /// describing track `t`.
    pub fn with_num_tracks(&self, n: usize, at: usize) -> Pattern {
        let resize = TrackResize::new(self.num_tracks(), n.max(1), at);
        let mut rows = self.rows.clone();
        let mut track_defaults = self.track_defaults.clone();
        for row in rows.iter_mut() {
            resize.apply(row);
        }
        resize.apply(&mut track_defaults);
        Pattern {
            rows,
            track_defaults,
        }
    }
}

/// Tracks inserted into or removed from a pattern at one position.
///
/// Anything indexed by track (rows, defaults, per-track playback state)
/// goes through the same resize so index `t` keeps describing track `t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackResize {
    pub from: usize,
    pub to: usize,
    /// First inserted or removed track, pulled back so the change fits.
    pub at: usize,
}

impl TrackResize {
    pub fn new(from: usize, to: usize, at: usize) -> Self {
        Self {
            from,
            to,
            at: at.min(from.min(to)),
        }
    }

    /// Where `track` ends up, or `None` if it was removed.
    pub fn map(&self, track: usize) -> Option<usize> {
        if track < self.at {
            Some(track)
        } else if self.to >= self.from {
            Some(track + (self.to - self.from))
        } else if track < self.at + (self.from - self.to) {
            None
        } else {
            Some(track - (self.from - self.to))
        }
    }

    /// Tracks that are new after the resize.
    pub fn inserted(&self) -> std::ops::Range<usize> {
        self.at..self.at + self.to.saturating_sub(self.from)
    }

    /// Resize a per-track list. Inserted slots are empty. Stays within the
    /// list's capacity when the capacity covers `to`.
    pub fn apply(&self, events: &mut Vec<Event>) {
        let current = events.len();
        if self.to > current {
            let at = self.at.min(current);
            events.splice(at..at, std::iter::repeat(Event::EMPTY).take(self.to - current));
        } else if self.to < current {
            let count = current - self.to;
            let at = self.at.min(self.to);
            events.drain(at..at + count);
        }
    }
}

fn span(r: Rect) -> (usize, usize, usize, usize) {
    debug_assert!(r.x >= 0 && r.y >= 0, "block origin out of bounds: {:?}", r);
    (
        r.x.max(0) as usize,
        r.y.max(0) as usize,
        r.w.max(0) as usize,
        r.h.max(0) as usize,
    )
}

/// On-disk shape of a pattern.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PatternFile {
    rows: Vec<Row>,
    num_rows: usize,
    num_tracks: usize,
    #[serde(default)]
    track_defaults: Vec<Event>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PatternFileRef<'a> {
    rows: &'a [Row],
    num_rows: usize,
    num_tracks: usize,
    track_defaults: &'a [Event],
}

impl Serialize for Pattern {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        PatternFileRef {
            rows: &self.rows,
            num_rows: self.num_rows(),
            num_tracks: self.num_tracks(),
            track_defaults: &self.track_defaults,
        }
        .serialize(serializer)
    }
}

impl TryFrom<PatternFile> for Pattern {
    type Error = String;

    fn try_from(file: PatternFile) -> Result<Self, Self::Error> {
        if file.num_rows == 0 || file.num_rows > MAX_ROWS {
            return Err(format!("invalid numRows: {}", file.num_rows));
        }
        if file.num_tracks == 0 || file.num_tracks > MAX_TRACKS {
            return Err(format!("invalid numTracks: {}", file.num_tracks));
        }
        if file.rows.len() != file.num_rows {
            return Err(format!(
                "numRows is {} but {} rows are present",
                file.num_rows,
                file.rows.len()
            ));
        }
        if let Some((y, row)) = file
            .rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != file.num_tracks)
        {
            return Err(format!(
                "row {} has {} tracks, expected {}",
                y,
                row.len(),
                file.num_tracks
            ));
        }
        let track_defaults = if file.track_defaults.is_empty() {
            vec![Event::EMPTY; file.num_tracks]
        } else if file.track_defaults.len() == file.num_tracks {
            file.track_defaults
        } else {
            return Err(format!(
                "trackDefaults has {} entries, expected {}",
                file.track_defaults.len(),
                file.num_tracks
            ));
        };
        Ok(Pattern {
            rows: file.rows,
            track_defaults,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(num_rows: usize, num_tracks: usize) -> Pattern {
        let mut p = Pattern::new(num_rows, num_tracks);
        for y in 0..num_rows {
            for t in 0..num_tracks {
                p.set_event(t, y, Event::new(0x90, y as u8, t as u8 + 1));
            }
        }
        p
    }

    #[test]
    fn set_digit_shows_up_in_block() {
        let mut p = Pattern::new(4, 2);
        p.set_digit(2, 1, 0x9);
        let block = p.block(Rect::new(0, 1, 6, 1));
        assert_eq!(block.row(0), &[0, 0, 9, 0, 0, 0]);
        assert_eq!(p.event(0, 1), Event::new(0x00, 0x90, 0x00));
    }

    #[test]
    fn set_block_of_own_block_is_noop() {
        let p = numbered(8, 3);
        let r = Rect::new(4, 2, 9, 5);
        let mut q = p.clone();
        let block = q.block(r);
        q.set_block(r, &block);
        assert_eq!(p, q);
    }

    #[test]
    fn clone_is_independent() {
        let p = numbered(4, 2);
        let mut q = p.clone();
        q.set_digit(0, 0, 0xf);
        q.set_track_default(1, Event::new(0x91, 1, 1));
        assert_eq!(p.digit(0, 0), 0x9);
        assert_eq!(p.track_defaults()[1], Event::EMPTY);
    }

    #[test]
    fn zero_block_clears_only_rect() {
        let mut p = numbered(4, 2);
        p.zero_block(Rect::new(6, 1, 6, 2));
        assert!(p.event(1, 1).is_empty());
        assert!(p.event(1, 2).is_empty());
        assert!(!p.event(0, 1).is_empty());
        assert!(!p.event(1, 3).is_empty());
    }

    #[test]
    fn copy_block_handles_overlap() {
        let mut p = numbered(6, 1);
        // shift rows 1..4 down by one
        p.copy_block(Rect::new(0, 1, 6, 4), 0, 1);
        assert_eq!(p.event(0, 1), Event::new(0x90, 1, 1));
        assert_eq!(p.event(0, 2), Event::new(0x90, 1, 1));
        assert_eq!(p.event(0, 3), Event::new(0x90, 2, 1));
        assert_eq!(p.event(0, 5), Event::new(0x90, 4, 1));
    }

    #[test]
    fn grow_then_shrink_rows_restores_content() {
        let p = numbered(5, 2);
        let grown = p.with_num_rows(9, p.num_rows());
        assert_eq!(grown.num_rows(), 9);
        assert!(grown.event(0, 7).is_empty());
        let back = grown.with_num_rows(5, 5);
        assert_eq!(back, p);
    }

    #[test]
    fn shrink_then_grow_rows_keeps_common_rows() {
        let p = numbered(8, 2);
        let shrunk = p.with_num_rows(3, 3);
        let back = shrunk.with_num_rows(8, 3);
        for y in 0..3 {
            assert_eq!(back.row(y), p.row(y));
        }
        for y in 3..8 {
            assert!(back.row(y).iter().all(Event::is_empty));
        }
    }

    #[test]
    fn insert_rows_in_the_middle() {
        let p = numbered(4, 1);
        let q = p.with_num_rows(6, 1);
        assert_eq!(q.event(0, 0), p.event(0, 0));
        assert!(q.event(0, 1).is_empty());
        assert!(q.event(0, 2).is_empty());
        assert_eq!(q.event(0, 3), p.event(0, 1));
    }

    #[test]
    fn tracks_and_defaults_move_together() {
        let mut p = numbered(2, 3);
        p.set_track_default(0, Event::new(0x90, 1, 1));
        p.set_track_default(2, Event::new(0x92, 3, 3));

        let inserted = p.with_num_tracks(4, 1);
        assert_eq!(inserted.num_tracks(), 4);
        assert!(inserted.event(1, 0).is_empty());
        assert_eq!(inserted.event(3, 0), p.event(2, 0));
        assert_eq!(inserted.track_defaults()[3], Event::new(0x92, 3, 3));
        assert_eq!(inserted.track_defaults()[1], Event::EMPTY);

        let removed = inserted.with_num_tracks(3, 1);
        assert_eq!(removed, p);
    }

    #[test]
    fn track_resize_maps_indices() {
        let grow = TrackResize::new(3, 5, 1);
        assert_eq!(grow.map(0), Some(0));
        assert_eq!(grow.map(1), Some(3));
        assert_eq!(grow.inserted(), 1..3);

        let shrink = TrackResize::new(4, 2, 3);
        assert_eq!(shrink.at, 2);
        assert_eq!(shrink.map(1), Some(1));
        assert_eq!(shrink.map(2), None);
        assert_eq!(shrink.map(3), None);
        assert!(shrink.inserted().is_empty());

        let mut list = vec![Event::new(0x90, 0, 0), Event::new(0x91, 0, 0)];
        TrackResize::new(2, 3, 0).apply(&mut list);
        assert_eq!(list, vec![Event::EMPTY, Event::new(0x90, 0, 0), Event::new(0x91, 0, 0)]);
    }

    #[test]
    fn rows_never_shrink_below_one() {
        let p = numbered(3, 1);
        assert_eq!(p.with_num_rows(0, 0).num_rows(), 1);
        assert_eq!(p.with_num_tracks(0, 0).num_tracks(), 1);
    }

    #[test]
    fn block_sub_clips() {
        let mut b = Block::new(3, 2);
        b.set(2, 1, 7);
        b.set(0, 0, 1);
        let s = b.sub(2, 5);
        assert_eq!(s.width(), 2);
        assert_eq!(s.height(), 2);
        assert_eq!(s.get(0, 0), 1);
    }

    #[test]
    fn serde_uses_file_field_names() {
        let mut p = Pattern::new(2, 1);
        p.set_event(0, 1, Event::new(0x90, 0x3c, 0x40));
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["numRows"], 2);
        assert_eq!(json["numTracks"], 1);
        assert_eq!(json["rows"][1][0], serde_json::json!([0x90, 0x3c, 0x40]));
        assert_eq!(json["trackDefaults"], serde_json::json!([[0, 0, 0]]));
        let back: Pattern = serde_json::from_value(json).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn inconsistent_file_is_rejected() {
        let json = serde_json::json!({
            "rows": [[[0, 0, 0]], [[0, 0, 0], [0, 0, 0]]],
            "numRows": 2,
            "numTracks": 1,
        });
        assert!(serde_json::from_value::<Pattern>(json).is_err());

        let json = serde_json::json!({
            "rows": [[[0, 0, 0]]],
            "numRows": 3,
            "numTracks": 1,
        });
        assert!(serde_json::from_value::<Pattern>(json).is_err());
    }

    #[test]
    fn missing_track_defaults_are_zeroed() {
        let json = serde_json::json!({
            "rows": [[[144, 60, 64], [0, 0, 0]]],
            "numRows": 1,
            "numTracks": 2,
        });
        let p: Pattern = serde_json::from_value(json).unwrap();
        assert_eq!(p.track_defaults(), &[Event::EMPTY, Event::EMPTY]);
    }
}
