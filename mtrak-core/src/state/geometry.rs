//! Cursor, brush and selection over a pattern.
//!
//! All coordinates are in digit/row units. Operations take the current
//! pattern extent as `bounds` and keep the brush and the selection inside it.

use mtrak_types::{Brush, Point, Rect, Size, DIGITS_PER_EVENT};

const TRACK: i32 = DIGITS_PER_EVENT as i32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditState {
    pub edit_pattern: usize,
    /// The cell digits are typed into. Always inside the brush.
    pub edit_pos: Point,
    pub brush: Brush,
    pub selection: Rect,
    /// Brush at the time the selection last collapsed.
    anchor: Rect,
}

impl Default for EditState {
    fn default() -> Self {
        Self::new()
    }
}

impl EditState {
    pub fn new() -> Self {
        let brush = Brush::default();
        Self {
            edit_pattern: 0,
            edit_pos: brush.rect.origin(),
            brush,
            selection: brush.rect,
            anchor: brush.rect,
        }
    }

    pub fn anchor(&self) -> Rect {
        self.anchor
    }

    /// Track under the cursor.
    pub fn track(&self) -> usize {
        (self.edit_pos.x / TRACK).max(0) as usize
    }

    pub fn row(&self) -> usize {
        self.edit_pos.y.max(0) as usize
    }

    // --- movement ---

    /// Translate the brush, stopping at the pattern edge.
    pub fn move_brush(&mut self, dx: i32, dy: i32, bounds: Size) {
        self.translate_brush(dx, dy, bounds);
        self.collapse_selection();
    }

    fn translate_brush(&mut self, dx: i32, dy: i32, bounds: Size) {
        let r = self.brush.rect;
        let dx = edge_delta(r.x, r.w, dx, bounds.w);
        let dy = edge_delta(r.y, r.h, dy, bounds.h);
        self.brush.rect = r.translate(dx, dy);
        self.edit_pos.x += dx;
        self.edit_pos.y += dy;
    }

    pub fn up(&mut self, bounds: Size) {
        self.move_brush(0, -self.brush.rect.h, bounds);
    }

    pub fn down(&mut self, bounds: Size) {
        self.move_brush(0, self.brush.rect.h, bounds);
    }

    pub fn left(&mut self, bounds: Size) {
        self.move_brush(-self.brush.rect.w, 0, bounds);
    }

    pub fn right(&mut self, bounds: Size) {
        self.move_brush(self.brush.rect.w, 0, bounds);
    }

    /// Up to the previous multiple of `page` rows.
    pub fn page_up(&mut self, page: i32, bounds: Size) {
        let page = page.max(1);
        let y = self.brush.rect.y;
        let target = if y % page != 0 { y - y % page } else { y - page };
        self.move_brush(0, target - y, bounds);
    }

    /// Down to the next multiple of `page` rows.
    pub fn page_down(&mut self, page: i32, bounds: Size) {
        let page = page.max(1);
        let y = self.brush.rect.y;
        let target = y + page - (y + page) % page;
        self.move_brush(0, target - y, bounds);
    }

    /// First digit of the next track.
    pub fn next_track(&mut self, bounds: Size) {
        let x = self.brush.rect.x;
        let target = x - x % TRACK + TRACK;
        if target + self.brush.rect.w <= bounds.w {
            self.move_brush(target - x, 0, bounds);
        }
    }

    /// First digit of the previous track.
    pub fn prev_track(&mut self, bounds: Size) {
        let x = self.brush.rect.x;
        let target = x - x % TRACK - TRACK;
        if target >= 0 {
            self.move_brush(target - x, 0, bounds);
        }
    }

    pub fn jump_first_row(&mut self, bounds: Size) {
        self.move_brush(0, -self.brush.rect.y, bounds);
    }

    pub fn jump_last_row(&mut self, bounds: Size) {
        self.move_brush(0, bounds.h - self.brush.rect.bottom(), bounds);
    }

    pub fn jump_top_left(&mut self, bounds: Size) {
        let r = self.brush.rect;
        self.move_brush(-r.x, -r.y, bounds);
    }

    pub fn jump_bottom_right(&mut self, bounds: Size) {
        let r = self.brush.rect;
        self.move_brush(bounds.w - r.right(), bounds.h - r.bottom(), bounds);
    }

    // --- brush size ---

    /// Toggle-expand the width: a step in the direction that last grew the
    /// brush climbs the ladder, a step against it descends.
    pub fn step_width(&mut self, dir: i32, bounds: Size) {
        let ladder = width_ladder(bounds);
        let w = step(&mut self.brush.expand_dir.x, dir, self.brush.rect.w, &ladder);
        self.set_brush_width(w, bounds);
    }

    pub fn step_height(&mut self, dir: i32, lpb: u32, bounds: Size) {
        let ladder = height_ladder(lpb, bounds);
        let h = step(&mut self.brush.expand_dir.y, dir, self.brush.rect.h, &ladder);
        self.set_brush_height(h, bounds);
    }

    pub fn inc_brush_width(&mut self, bounds: Size) {
        let w = next_rung(&width_ladder(bounds), self.brush.rect.w);
        self.set_brush_width(w, bounds);
    }

    pub fn dec_brush_width(&mut self, bounds: Size) {
        let w = prev_rung(&width_ladder(bounds), self.brush.rect.w);
        self.set_brush_width(w, bounds);
    }

    pub fn inc_brush_height(&mut self, lpb: u32, bounds: Size) {
        let h = next_rung(&height_ladder(lpb, bounds), self.brush.rect.h);
        self.set_brush_height(h, bounds);
    }

    pub fn dec_brush_height(&mut self, lpb: u32, bounds: Size) {
        let h = prev_rung(&height_ladder(lpb, bounds), self.brush.rect.h);
        self.set_brush_height(h, bounds);
    }

    fn set_brush_width(&mut self, w: i32, bounds: Size) {
        let w = w.clamp(1, bounds.w.max(1));
        self.brush.rect.w = w;
        self.brush.rect.x = snap(self.edit_pos.x, w, bounds.w);
        self.collapse_selection();
    }

    fn set_brush_height(&mut self, h: i32, bounds: Size) {
        let h = h.clamp(1, bounds.h.max(1));
        self.brush.rect.h = h;
        self.brush.rect.y = snap(self.edit_pos.y, h, bounds.h);
        self.collapse_selection();
    }

    // --- selection ---

    pub fn inc_selection_width(&mut self, bounds: Size) {
        self.grow_selection(self.brush.rect.w, 0, bounds);
    }

    pub fn dec_selection_width(&mut self, bounds: Size) {
        self.grow_selection(-self.brush.rect.w, 0, bounds);
    }

    pub fn inc_selection_height(&mut self, bounds: Size) {
        self.grow_selection(0, self.brush.rect.h, bounds);
    }

    pub fn dec_selection_height(&mut self, bounds: Size) {
        self.grow_selection(0, -self.brush.rect.h, bounds);
    }

    fn grow_selection(&mut self, dx: i32, dy: i32, bounds: Size) {
        self.translate_brush(dx, dy, bounds);
        self.selection = self.anchor.union(&self.brush.rect);
    }

    pub fn collapse_brush(&mut self) {
        self.brush.rect = Rect::cell(self.edit_pos);
        self.collapse_selection();
    }

    pub fn collapse_selection(&mut self) {
        self.anchor = self.brush.rect;
        self.selection = self.brush.rect;
    }

    /// The selection, widened to whole `min_width`-aligned columns when it is
    /// narrower than that.
    pub fn block_target(&self, min_width: i32, bounds: Size) -> Rect {
        let mut r = self.selection;
        if r.w < min_width {
            r.x -= r.x % min_width;
            r.w = min_width.min(bounds.w - r.x);
        }
        r
    }

    /// Pull everything back inside a pattern of `bounds` after the song
    /// changed shape.
    pub fn fix(&mut self, bounds: Size, num_patterns: usize) {
        self.edit_pattern = self.edit_pattern.min(num_patterns.saturating_sub(1));
        let (w, h) = (bounds.w.max(1), bounds.h.max(1));

        let mut r = self.brush.rect;
        let (x, bw, px) = fix_axis(r.x, r.w, self.edit_pos.x, w);
        let (y, bh, py) = fix_axis(r.y, r.h, self.edit_pos.y, h);
        r = Rect::new(x, y, bw, bh);
        self.brush.rect = r;
        self.edit_pos = Point::new(px, py);

        self.anchor = clamp_rect(self.anchor, w, h);
        self.selection = clamp_rect(self.selection, w, h);
    }
}

/// Delta that keeps `[pos, pos + size)` inside `[0, limit)`.
fn edge_delta(pos: i32, size: i32, d: i32, limit: i32) -> i32 {
    let target = pos + d;
    if target < 0 {
        -pos
    } else if target + size > limit {
        (limit - size - pos).min(d.max(0))
    } else {
        d
    }
}

/// Origin for a brush of `size` covering `pos`.
fn snap(pos: i32, size: i32, limit: i32) -> i32 {
    (pos - pos.rem_euclid(size)).min(limit - size).max(0)
}

fn fix_axis(pos: i32, size: i32, cursor: i32, limit: i32) -> (i32, i32, i32) {
    if pos >= limit {
        let cursor = cursor.clamp(0, limit - 1);
        return (cursor, 1, cursor);
    }
    let pos = pos.max(0);
    let size = size.clamp(1, limit - pos);
    let cursor = cursor.clamp(pos, pos + size - 1);
    (pos, size, cursor)
}

fn clamp_rect(r: Rect, w: i32, h: i32) -> Rect {
    let (x, rw) = clamp_span(r.x, r.w, w);
    let (y, rh) = clamp_span(r.y, r.h, h);
    Rect::new(x, y, rw, rh)
}

fn clamp_span(pos: i32, size: i32, limit: i32) -> (i32, i32) {
    let pos = pos.clamp(0, limit - 1);
    (pos, size.clamp(1, limit - pos))
}

fn ladder(rungs: &[i32], limit: i32) -> Vec<i32> {
    let mut out: Vec<i32> = rungs.iter().map(|&r| r.clamp(1, limit.max(1))).collect();
    out.dedup();
    out
}

fn width_ladder(bounds: Size) -> Vec<i32> {
    ladder(&[1, 2, TRACK, bounds.w], bounds.w)
}

fn height_ladder(lpb: u32, bounds: Size) -> Vec<i32> {
    let lpb = lpb.min(i32::MAX as u32) as i32;
    ladder(&[1, lpb, bounds.h], bounds.h)
}

fn next_rung(ladder: &[i32], size: i32) -> i32 {
    ladder
        .iter()
        .copied()
        .find(|&r| r > size)
        .unwrap_or_else(|| ladder.last().copied().unwrap_or(1))
}

fn prev_rung(ladder: &[i32], size: i32) -> i32 {
    ladder.iter().rev().copied().find(|&r| r < size).unwrap_or(1)
}

fn step(expand_dir: &mut i32, dir: i32, size: i32, ladder: &[i32]) -> i32 {
    let dir = dir.signum();
    if dir == 0 {
        return size;
    }
    if dir == *expand_dir {
        next_rung(ladder, size)
    } else if size > 1 {
        prev_rung(ladder, size)
    } else {
        *expand_dir = dir;
        next_rung(ladder, size)
    }
}
