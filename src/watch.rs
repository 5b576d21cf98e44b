//! Live daemon state as seen from the handoff pipeline.
//!
//! The watcher daemon that maintains the graph runs elsewhere; this module only
//! models the plain snapshot it publishes and the file-based supplier that
//! re-reads it.

mod events;
mod state;

pub use events::{EventOp, LiveEvent};
pub use state::{state_path, LiveState, STATE_FILENAME};
