//! Conversation test harness
//!
//! Ties the recording pieces together:
//!
//! - [`ConversationRunner`] - executes named async test scripts and collects
//!   a [`TestRecord`] per script
//! - [`RecordingAgent`] - wraps the agent under test and records its turns
//! - [`RecordingAssert`] - checks that record outcomes instead of panicking
//! - [`ScriptedAgent`] - deterministic agent double for exercising the
//!   harness without a model in the loop

mod assert;
mod recorder;
mod runner;
mod scripted;

pub use assert::{Expectation, RecordingAssert};
pub use recorder::RecordingAgent;
pub use runner::{ConversationRunner, TestRecord};
pub use scripted::{ScriptedAgent, TurnScript};
