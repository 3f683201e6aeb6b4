//! # vredit Editor
//!
//! The edit-mode core of the vredit in-game VR object editor: interprets
//! raw controller events into a coherent interaction protocol and drives
//! host collaborators through the `vredit-core` traits.
//!
//! ## Overview
//!
//! - [`FrameDispatcher`] — per-frame update fan-out with delta time
//! - [`ButtonRouter`] — raw button/axis subscription registry
//! - [`EditSession`] — the edit-mode gate with symmetric side effects
//! - [`EditModeInput`] — second-stage filter that only forwards while the
//!   gate is open and no blocking menu is up
//! - [`EditStateController`] — the selection/placement state machine
//! - [`EditModeTransitioner`] — ambient double-tap enter/exit gesture
//! - [`EditorContext`] — owns and wires all of the above
//!
//! Hosts construct an [`EditorContext`] with their collaborator
//! implementations, call `initialize`, then feed per-frame ticks and
//! controller events in.

pub mod config;
pub mod context;
pub mod filter;
pub mod frame;
pub mod history;
pub mod hover;
pub mod router;
pub mod scan;
pub mod selection;
pub mod session;
pub mod state;
pub mod transition;

pub use config::TomlConfigStore;
pub use context::{EditorContext, HostInterfaces};
pub use filter::EditModeInput;
pub use frame::{FrameDispatcher, FrameUpdateListener};
pub use history::{ActionHistory, EditAction, PlacementAction};
pub use router::{ButtonRouter, CallbackId, INVALID_CALLBACK_ID};
pub use session::EditSession;
pub use state::{EditState, EditStateController};
pub use transition::EditModeTransitioner;

/// Editor library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
