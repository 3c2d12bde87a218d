//! # Colloquy - Conversation Evaluation Harness for Diagram Agents
//!
//! Colloquy drives multi-turn conversations against a non-deterministic
//! diagram-drawing agent and records everything that happens:
//! - Append-only event logs with stable ordering and relative timing
//! - Assertions that record outcomes instead of aborting the conversation
//! - Turn reconstruction keyed to rendered canvas images
//! - Aggregate JSON reports for downstream judging, plus a static HTML view
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use colloquy_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = HarnessConfig::default();
//!     let mut runner = ConversationRunner::with_config("basic-shapes", config.clone());
//!
//!     let outcome = runner
//!         .run_test(
//!             "draws two connected boxes",
//!             |signals| {
//!                 Arc::new(
//!                     ScriptedAgent::new(signals)
//!                         .with_turn(TurnScript::new().say("done").set_canvas("A -> B")),
//!                 ) as Arc<dyn DiagramAgent>
//!             },
//!             |mut agent, check| async move {
//!                 agent.send("Draw box A connected to box B").await?;
//!                 agent.criteria(["diagram shows two boxes joined by an arrow"])?;
//!                 check.expect(agent.canvas().await).to_contain("->");
//!                 Ok(())
//!             },
//!         )
//!         .await;
//!     if let Err(err) = outcome {
//!         eprintln!("test failed: {err}");
//!     }
//!
//!     let mut builder = ReportBuilder::new();
//!     builder.add_records(runner.into_records());
//!     builder.build().write_artifacts(&config);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **record**: the append-only [`record::EventLog`] and its typed events
//! - **harness**: the [`harness::ConversationRunner`], recording wrapper,
//!   and recording assertions
//! - **report**: turn reconstruction, aggregate JSON, HTML rendering
//! - **agent**: the [`agent::DiagramAgent`] boundary and signal channel

pub mod agent;
pub mod config;
pub mod error;
pub mod harness;
pub mod record;
pub mod report;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::agent::{
        signal_channel, AgentSignal, AgentState, AgentStatus, ConversationMessage, DiagramAgent,
        MessageRole, SignalReceiver, SignalSender,
    };
    pub use crate::config::{HarnessConfig, ReportConfig};
    pub use crate::error::{ColloquyError, Result};
    pub use crate::harness::{
        ConversationRunner, RecordingAgent, RecordingAssert, ScriptedAgent, TestRecord, TurnScript,
    };
    pub use crate::record::{EventLog, EventRecord, RecordedEvent, TestSummary};
    pub use crate::report::{
        AggregateReport, ReportBuilder, ScenarioOutcome, SuiteSummary, TestReport, TurnRecord,
    };
}
