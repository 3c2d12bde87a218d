//! Event recording for conversation runs
//!
//! An append-only log with typed events is the substrate everything else
//! builds on: the agent wrapper and assertion layer only append, and turn
//! reconstruction is the sole reader that interprets cross-event
//! relationships.
//!
//! # Example
//!
//! ```rust
//! use colloquy_core::record::{EventLog, RecordedEvent};
//!
//! let log = EventLog::new();
//! log.record(RecordedEvent::UserMessage {
//!     content: "Create box A".to_string(),
//! });
//!
//! let events = log.events();
//! assert_eq!(events[0].kind(), "user_message");
//! ```

mod event;
mod log;

pub use event::{EventRecord, RecordedEvent};
pub use log::{EventLog, TestSummary};
