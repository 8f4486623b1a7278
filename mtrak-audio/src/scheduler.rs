//! The per-buffer playback scheduler.
//!
//! [`Scheduler::process`] runs inside the audio callback. It drains the
//! action and preview queues, then walks the buffer frame by frame, emitting
//! the events of each row on the row's first tick. It never blocks, never
//! logs, and allocates nothing as long as the song stays within
//! `MAX_PATTERNS` and `MAX_TRACKS`.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::{Sender, TryRecvError};

use mtrak_types::{Action, Event, Feedback, Op, Pattern, Song, TrackResize, MAX_TRACKS};

use crate::handle::SchedulerQueues;
use crate::sink::EventSink;
use crate::telemetry::ProcessTelemetry;

/// Buffers between two telemetry reports.
pub const DEFAULT_TELEMETRY_INTERVAL: u32 = 1024;

/// Transport position and per-track running defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackState {
    /// Frames processed since start, playing or not.
    pub play_frame: u64,
    pub play_tick: u32,
    pub play_row: usize,
    pub play_pattern: usize,
    pub is_playing: bool,
    /// Feedback messages lost because the feedback queue was full.
    pub dropped_feedback: u64,
    track_defaults: Vec<Event>,
}

impl Default for PlaybackState {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackState {
    pub fn new() -> Self {
        Self {
            play_frame: 0,
            play_tick: 0,
            play_row: 0,
            play_pattern: 0,
            is_playing: false,
            dropped_feedback: 0,
            track_defaults: Vec::with_capacity(MAX_TRACKS),
        }
    }

    /// Last emitted event per track of the playing pattern. Survives stop
    /// and play; only a load starts over from the stored defaults.
    pub fn track_defaults(&self) -> &[Event] {
        &self.track_defaults
    }

    fn seed_defaults(&mut self, pattern: &Pattern) {
        let tracks = pattern.num_tracks().min(MAX_TRACKS);
        self.track_defaults.clear();
        self.track_defaults
            .extend_from_slice(&pattern.track_defaults()[..tracks]);
    }

    /// Follow tracks inserted or removed at `at`. New tracks start from
    /// the defaults stored in `pattern`.
    fn resize_defaults(&mut self, pattern: &Pattern, at: usize) {
        let tracks = pattern.num_tracks().min(MAX_TRACKS);
        let resize = TrackResize::new(self.track_defaults.len(), tracks, at);
        resize.apply(&mut self.track_defaults);
        for track in resize.inserted() {
            self.track_defaults[track] = pattern.track_defaults()[track];
        }
    }

    fn wrap_row(&mut self, pattern: &Pattern) {
        if self.play_row >= pattern.num_rows() {
            self.play_row = 0;
        }
    }

    fn reset_transport(&mut self) {
        self.is_playing = false;
        self.play_pattern = 0;
        self.play_row = 0;
        self.play_tick = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessStatus {
    Continue,
    /// The edit side dropped its handle; playback keeps running on the
    /// last song it saw.
    Disconnected,
}

/// Owns the playback replica of the song.
pub struct Scheduler {
    song: Song,
    queues: SchedulerQueues,
    telemetry: ProcessTelemetry,
    telemetry_interval: u32,
    buffers_since_report: u32,
}

impl Scheduler {
    pub fn new(song: &Song, queues: SchedulerQueues) -> Self {
        let mut replica = song.clone();
        replica.reserve_patterns();
        Self {
            song: replica,
            queues,
            telemetry: ProcessTelemetry::new(),
            telemetry_interval: DEFAULT_TELEMETRY_INTERVAL,
            buffers_since_report: 0,
        }
    }

    /// Report telemetry every `buffers` buffers; zero turns it off.
    pub fn with_telemetry_interval(mut self, buffers: u32) -> Self {
        self.telemetry_interval = buffers;
        self
    }

    pub fn song(&self) -> &Song {
        &self.song
    }

    /// A stopped transport with defaults seeded from the first pattern.
    pub fn initial_state(&self) -> PlaybackState {
        let mut state = PlaybackState::new();
        if let Some(pattern) = self.song.patterns.first() {
            state.seed_defaults(pattern);
        }
        state
    }

    /// Produce the events for one buffer of `frames` frames.
    pub fn process<S: EventSink + ?Sized>(
        &mut self,
        state: &mut PlaybackState,
        frames: u32,
        out: &mut S,
    ) -> ProcessStatus {
        let started = Instant::now();
        let status = self.apply_actions(state);
        self.play_previews(out);
        if state.is_playing {
            self.advance(state, frames, out);
        } else {
            state.play_frame += frames as u64;
        }
        self.record_telemetry(state, started.elapsed(), frames, out.sample_rate(), out.lost_events());
        status
    }

    fn apply_actions(&mut self, state: &mut PlaybackState) -> ProcessStatus {
        loop {
            match self.queues.action_rx.try_recv() {
                Ok(action) => {
                    self.apply(state, &action);
                    report(&self.queues.feedback_tx, state, Feedback::Applied(action));
                }
                Err(TryRecvError::Empty) => return ProcessStatus::Continue,
                Err(TryRecvError::Disconnected) => return ProcessStatus::Disconnected,
            }
        }
    }

    fn apply(&mut self, state: &mut PlaybackState, action: &Action) {
        action.op.apply(&mut self.song);
        match &action.op {
            Op::ReplacePattern { index, pattern } if *index == state.play_pattern => {
                if pattern.num_tracks().min(MAX_TRACKS) != state.track_defaults.len() {
                    // tracks changed without a position: treat as the end
                    state.resize_defaults(pattern, pattern.num_tracks());
                }
                state.wrap_row(pattern);
            }
            Op::ResizeTracks { index, pattern, at } if *index == state.play_pattern => {
                state.resize_defaults(pattern, *at);
                state.wrap_row(pattern);
            }
            Op::LoadSong { .. } => {
                state.reset_transport();
                if let Some(pattern) = self.song.patterns.first() {
                    state.seed_defaults(pattern);
                }
            }
            Op::Play { from_row } => {
                if state.play_pattern >= self.song.patterns.len() {
                    state.play_pattern = 0;
                }
                if let Some(pattern) = self.song.patterns.get(state.play_pattern) {
                    state.play_row = (*from_row).min(pattern.num_rows() - 1);
                    state.play_tick = 0;
                    state.is_playing = true;
                    if state.track_defaults.len() != pattern.num_tracks().min(MAX_TRACKS) {
                        state.seed_defaults(pattern);
                    }
                }
            }
            Op::Stop => {
                state.is_playing = false;
                state.play_tick = 0;
            }
            _ => {}
        }
    }

    fn play_previews<S: EventSink + ?Sized>(&self, out: &mut S) {
        while let Ok(event) = self.queues.preview_rx.try_recv() {
            if event.is_channel_message() {
                out.write_event(0, event.wire_bytes());
            }
        }
    }

    fn advance<S: EventSink + ?Sized>(&self, state: &mut PlaybackState, frames: u32, out: &mut S) {
        let Some(pattern) = self.song.patterns.get(state.play_pattern) else {
            state.play_frame += frames as u64;
            return;
        };
        let frames_per_tick = self.song.timing.frames_per_tick(out.sample_rate());
        let tpl = self.song.timing.tpl.max(1);
        if state.play_row >= pattern.num_rows() {
            state.play_row = 0;
        }

        for offset in 0..frames {
            if state.play_frame % frames_per_tick == 0 {
                if state.play_tick == 0 {
                    self.emit_row(pattern, state, offset, out);
                }
                state.play_tick += 1;
                if state.play_tick >= tpl {
                    state.play_row += 1;
                    if state.play_row >= pattern.num_rows() {
                        state.play_row = 0;
                    }
                    state.play_tick = 0;
                    let row = state.play_row;
                    report(&self.queues.feedback_tx, state, Feedback::Redraw { row });
                }
            }
            state.play_frame += 1;
        }
    }

    fn emit_row<S: EventSink + ?Sized>(
        &self,
        pattern: &Arc<Pattern>,
        state: &mut PlaybackState,
        offset: u32,
        out: &mut S,
    ) {
        let tracks = state.track_defaults.len().min(pattern.num_tracks());
        for track in 0..tracks {
            let default = state.track_defaults[track];
            let event = pattern.event(track, state.play_row).fill_from(default);
            if !event.is_channel_message() {
                continue;
            }
            out.write_event(offset, event.wire_bytes());
            if event != default {
                state.track_defaults[track] = event;
                let msg = Feedback::TrackDefault {
                    pattern: state.play_pattern,
                    track,
                    event,
                };
                report(&self.queues.feedback_tx, state, msg);
            }
        }
    }

    fn record_telemetry(
        &mut self,
        state: &mut PlaybackState,
        elapsed: Duration,
        frames: u32,
        sample_rate: u32,
        lost_events: u64,
    ) {
        if self.telemetry_interval == 0 {
            return;
        }
        let budget_us = (frames as u64 * 1_000_000 / sample_rate.max(1) as u64).min(u32::MAX as u64);
        self.telemetry.record(elapsed, budget_us as u32);
        self.buffers_since_report += 1;
        if self.buffers_since_report < self.telemetry_interval {
            return;
        }
        self.buffers_since_report = 0;
        let summary = self.telemetry.take_summary();
        let msg = Feedback::Telemetry {
            avg_us: summary.avg_us,
            max_us: summary.max_us,
            p95_us: summary.p95_us,
            overruns: summary.overruns.min(u32::MAX as u64) as u32,
            lost_events,
        };
        report(&self.queues.feedback_tx, state, msg);
    }
}

fn report(tx: &Sender<Feedback>, state: &mut PlaybackState, msg: Feedback) {
    if tx.try_send(msg).is_err() {
        state.dropped_feedback += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handle::{pipeline, FeedbackRelay, PipelineConfig, PlaybackHandle};
    use crate::sink::EventBuffer;
    use mtrak_types::Timing;

    // 120 bpm, lpb 4, tpl 6 at 48 kHz: 1000 frames per tick, 6000 per row
    const RATE: u32 = 48000;

    struct Rig {
        handle: PlaybackHandle,
        relay: FeedbackRelay,
        scheduler: Scheduler,
        state: PlaybackState,
        out: EventBuffer,
    }

    impl Rig {
        fn new(pattern: Pattern) -> Self {
            let song = Song::new(Timing::default(), pattern);
            let (handle, queues, relay) = pipeline(PipelineConfig::default());
            let scheduler = Scheduler::new(&song, queues).with_telemetry_interval(0);
            let state = scheduler.initial_state();
            Self {
                handle,
                relay,
                scheduler,
                state,
                out: EventBuffer::with_capacity(RATE, 256),
            }
        }

        fn send(&self, op: Op) {
            self.handle.submit(Action::new(op, None)).unwrap();
        }

        fn run(&mut self, frames: u32) -> Vec<(u32, Vec<u8>)> {
            self.out.clear();
            self.scheduler.process(&mut self.state, frames, &mut self.out);
            self.out
                .events()
                .iter()
                .map(|e| (e.offset, e.bytes().to_vec()))
                .collect()
        }

        fn feedback(&self) -> Vec<Feedback> {
            self.relay.pump();
            self.handle.drain_feedback()
        }
    }

    fn one_note_per_row(rows: usize) -> Pattern {
        let mut p = Pattern::new(rows, 1);
        for y in 0..rows {
            p.set_event(0, y, Event::new(0x90, 0x30 + y as u8, 0x40));
        }
        p
    }

    #[test]
    fn stopped_transport_only_counts_frames() {
        let mut rig = Rig::new(one_note_per_row(4));
        assert!(rig.run(512).is_empty());
        assert_eq!(rig.state.play_frame, 512);
        assert!(!rig.state.is_playing);
    }

    #[test]
    fn rows_land_on_tick_boundaries() {
        let mut rig = Rig::new(one_note_per_row(4));
        rig.send(Op::Play { from_row: 0 });
        let events = rig.run(8000);
        assert_eq!(
            events,
            vec![(0, vec![0x90, 0x30, 0x40]), (6000, vec![0x90, 0x31, 0x40])]
        );
        assert_eq!(rig.state.play_row, 1);
        assert_eq!(rig.state.play_tick, 2);
    }

    #[test]
    fn playback_starts_on_next_tick() {
        let mut rig = Rig::new(one_note_per_row(4));
        rig.run(500);
        rig.send(Op::Play { from_row: 2 });
        let events = rig.run(1000);
        assert_eq!(events, vec![(500, vec![0x90, 0x32, 0x40])]);
    }

    #[test]
    fn row_wraps_and_reports_redraw() {
        let mut rig = Rig::new(one_note_per_row(2));
        rig.send(Op::Play { from_row: 1 });
        rig.run(6000);
        assert_eq!(rig.state.play_row, 0);
        let feedback = rig.feedback();
        assert!(feedback.contains(&Feedback::Redraw { row: 0 }));
    }

    #[test]
    fn default_fill_uses_track_default() {
        let mut p = Pattern::new(1, 1);
        p.set_track_default(0, Event::new(0x90, 0x3c, 0x00));
        p.set_event(0, 0, Event::new(0x00, 0x00, 0x40));
        let mut rig = Rig::new(p);
        rig.send(Op::Play { from_row: 0 });
        let events = rig.run(100);
        assert_eq!(events, vec![(0, vec![0x90, 0x3c, 0x40])]);
        assert_eq!(rig.state.track_defaults()[0], Event::new(0x90, 0x3c, 0x40));
        assert!(rig.feedback().contains(&Feedback::TrackDefault {
            pattern: 0,
            track: 0,
            event: Event::new(0x90, 0x3c, 0x40),
        }));
    }

    #[test]
    fn replay_keeps_learned_defaults() {
        let mut p = Pattern::new(2, 1);
        p.set_track_default(0, Event::new(0x90, 0x3c, 0x00));
        p.set_event(0, 0, Event::new(0x00, 0x00, 0x40));
        p.set_event(0, 1, Event::new(0x90, 0x45, 0x50));
        let mut rig = Rig::new(p);
        rig.send(Op::Play { from_row: 0 });
        assert_eq!(
            rig.run(12000),
            vec![(0, vec![0x90, 0x3c, 0x40]), (6000, vec![0x90, 0x45, 0x50])]
        );

        rig.send(Op::Stop);
        rig.run(10);
        rig.send(Op::Play { from_row: 0 });
        // row 0 now inherits note 0x45 from the last event sent
        assert_eq!(rig.run(1000), vec![(990, vec![0x90, 0x45, 0x40])]);
    }

    #[test]
    fn learned_defaults_follow_track_resize() {
        let mut p = Pattern::new(1, 2);
        p.set_event(0, 0, Event::new(0x91, 0x3c, 0x40));
        p.set_event(1, 0, Event::new(0x92, 0x40, 0x50));
        let mut rig = Rig::new(p.clone());
        rig.send(Op::Play { from_row: 0 });
        rig.run(100);

        let mut wider = p.with_num_tracks(3, 0);
        wider.set_track_default(0, Event::new(0x9f, 0x01, 0x01));
        let wider = Arc::new(wider);
        rig.send(Op::ResizeTracks { index: 0, pattern: Arc::clone(&wider), at: 0 });
        rig.run(10);
        assert_eq!(
            rig.state.track_defaults(),
            &[
                Event::new(0x9f, 0x01, 0x01),
                Event::new(0x91, 0x3c, 0x40),
                Event::new(0x92, 0x40, 0x50),
            ]
        );

        let narrower = Arc::new(wider.with_num_tracks(2, 1));
        rig.send(Op::ResizeTracks { index: 0, pattern: narrower, at: 1 });
        rig.run(10);
        assert_eq!(
            rig.state.track_defaults(),
            &[Event::new(0x9f, 0x01, 0x01), Event::new(0x92, 0x40, 0x50)]
        );
    }

    #[test]
    fn empty_cells_and_low_status_are_silent() {
        let mut p = Pattern::new(1, 3);
        p.set_event(1, 0, Event::new(0x45, 0x10, 0x10));
        let mut rig = Rig::new(p);
        rig.send(Op::Play { from_row: 0 });
        assert!(rig.run(100).is_empty());
    }

    #[test]
    fn actions_apply_before_events() {
        let mut rig = Rig::new(one_note_per_row(2));
        let mut changed = one_note_per_row(2);
        changed.set_event(0, 0, Event::new(0xc0, 0x07, 0x00));
        rig.send(Op::ReplacePattern { index: 0, pattern: Arc::new(changed) });
        rig.send(Op::Play { from_row: 0 });
        assert_eq!(rig.run(10), vec![(0, vec![0xc0, 0x07])]);
        let applied = rig
            .feedback()
            .into_iter()
            .filter(|f| matches!(f, Feedback::Applied(_)))
            .count();
        assert_eq!(applied, 2);
    }

    #[test]
    fn previews_play_at_offset_zero_even_when_stopped() {
        let mut rig = Rig::new(one_note_per_row(2));
        rig.handle.preview(Event::new(0x91, 0x40, 0x70)).unwrap();
        rig.handle.preview(Event::new(0x00, 0x40, 0x70)).unwrap();
        assert_eq!(rig.run(64), vec![(0, vec![0x91, 0x40, 0x70])]);
    }

    #[test]
    fn stop_halts_output() {
        let mut rig = Rig::new(one_note_per_row(4));
        rig.send(Op::Play { from_row: 0 });
        rig.run(100);
        rig.send(Op::Stop);
        assert!(rig.run(20000).is_empty());
        assert_eq!(rig.state.play_tick, 0);
    }

    #[test]
    fn shrinking_playing_pattern_wraps_row() {
        let mut rig = Rig::new(one_note_per_row(8));
        rig.send(Op::Play { from_row: 6 });
        rig.run(10);
        rig.send(Op::ReplacePattern { index: 0, pattern: Arc::new(one_note_per_row(2)) });
        rig.run(10);
        assert_eq!(rig.state.play_row, 0);
    }

    #[test]
    fn load_song_stops_and_reseeds() {
        let mut rig = Rig::new(one_note_per_row(4));
        rig.send(Op::Play { from_row: 3 });
        rig.run(10);
        let mut p = Pattern::new(2, 3);
        p.set_track_default(2, Event::new(0x92, 1, 1));
        let next = Song::new(Timing::default(), p);
        let previous = Arc::new(rig.scheduler.song().clone());
        rig.send(Op::LoadSong { song: Arc::new(next.clone()), previous });
        rig.run(10);
        assert!(!rig.state.is_playing);
        assert_eq!(rig.state.play_row, 0);
        assert_eq!(rig.state.track_defaults().len(), 3);
        assert_eq!(rig.scheduler.song(), &next);
    }

    #[test]
    fn play_clamps_start_row() {
        let mut rig = Rig::new(one_note_per_row(4));
        rig.send(Op::Play { from_row: 99 });
        assert_eq!(rig.run(10), vec![(0, vec![0x90, 0x33, 0x40])]);
    }

    #[test]
    fn reports_disconnect() {
        let Rig { handle, mut scheduler, mut state, mut out, .. } = Rig::new(one_note_per_row(1));
        drop(handle);
        assert_eq!(
            scheduler.process(&mut state, 10, &mut out),
            ProcessStatus::Disconnected
        );
    }

    #[test]
    fn telemetry_is_reported_on_interval() {
        let mut rig = Rig::new(one_note_per_row(1));
        rig.scheduler.telemetry_interval = 2;
        rig.run(64);
        assert!(rig.feedback().is_empty());
        rig.run(64);
        assert!(matches!(rig.feedback().as_slice(), [Feedback::Telemetry { .. }]));
    }

    #[test]
    fn telemetry_reports_lost_events() {
        let mut rig = Rig::new(one_note_per_row(1));
        rig.scheduler.telemetry_interval = 1;
        rig.out.record_failed_sends(2);
        rig.run(64);
        assert!(matches!(
            rig.feedback().as_slice(),
            [Feedback::Telemetry { lost_events: 2, .. }]
        ));
    }
}
