//! # mtrak-core
//!
//! Edit side of the mtrak step sequencer: the song replica with its cursor,
//! brush and selection, undo history, action dispatch, JSON persistence and
//! configuration. Independent of any UI.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mtrak_audio::{pipeline, Scheduler};
//! use mtrak_core::action::{EditAction, UserAction};
//! use mtrak_core::config::Config;
//! use mtrak_core::dispatch::{dispatch_action, Editor};
//! use mtrak_core::state::AppState;
//!
//! let config = Config::load();
//! let song = config.new_song();
//! let (handle, queues, relay) = pipeline(config.pipeline());
//! let scheduler = Scheduler::new(&song, queues); // moved into the audio callback
//! relay.spawn()?;
//!
//! let mut editor = Editor::new(AppState::new(song), handle);
//! dispatch_action(&UserAction::Edit(EditAction::InsertDigit(9)), &mut editor);
//! editor.poll(); // record applied actions, play position, track defaults
//! ```
//!
//! ## Module Overview
//!
//! - [`state`]: `AppState`, geometry (`EditState`), undo history, clipboard,
//!   modes, persistence
//! - [`action`]: user intents (`UserAction` and friends) and `DispatchResult`
//! - [`dispatch`]: the `Editor` and `dispatch_action()`, the single entry point
//!   for state mutation
//! - [`config`]: TOML configuration (embedded defaults + user override)
//! - [`error`]: `CoreError`

pub mod action;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod state;

pub use error::{CoreError, CoreResult};
