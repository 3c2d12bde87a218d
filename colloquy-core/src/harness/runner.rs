//! Conversation test runner
//!
//! [`ConversationRunner`] executes named async test scripts against freshly
//! built agents and collects one [`TestRecord`] per script. The record, not
//! the script's return value, is what reporting consumes: a script that
//! returns an error still produces a complete record with everything that
//! was observed up to the failure.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use colloquy_core::harness::{ConversationRunner, ScriptedAgent, TurnScript};
//! use colloquy_core::agent::DiagramAgent;
//!
//! # async fn run() -> colloquy_core::error::Result<()> {
//! let mut runner = ConversationRunner::new("basic-shapes");
//!
//! runner
//!     .run_test(
//!         "draws a single box",
//!         |signals| {
//!             Arc::new(
//!                 ScriptedAgent::new(signals)
//!                     .with_turn(TurnScript::new().say("done").set_canvas("A")),
//!             ) as Arc<dyn DiagramAgent>
//!         },
//!         |mut agent, check| async move {
//!             agent.send("Create a box labeled A").await?;
//!             check.expect(agent.canvas().await).to_equal("A");
//!             Ok(())
//!         },
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::agent::{signal_channel, DiagramAgent, SignalSender};
use crate::config::HarnessConfig;
use crate::error::{ColloquyError, Result};
use crate::record::{EventLog, EventRecord, RecordedEvent, TestSummary};

use super::assert::RecordingAssert;
use super::recorder::RecordingAgent;

/// Everything observed while running one conversation test
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    /// Suite the test belongs to
    pub file_id: String,

    /// Zero-based position within the suite, in execution order
    pub test_index: usize,

    /// `"{fileId} > {name}"`
    pub full_name: String,

    /// Grouping path, outermost first
    pub hierarchy: Vec<String>,

    /// Whether every assertion held and no run-level error occurred
    pub passed: bool,

    /// Wall-clock script duration in milliseconds
    pub duration_ms: u64,

    /// Folded assertion counts
    pub summary: TestSummary,

    /// The full event log, sorted by timestamp then sequence
    pub events: Vec<EventRecord>,

    /// Script error, when the test function returned one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Runs conversation tests for one suite and collects their records
#[derive(Debug)]
pub struct ConversationRunner {
    config: HarnessConfig,
    file_id: String,
    next_test_index: usize,
    records: Vec<TestRecord>,
}

impl ConversationRunner {
    /// Create a runner for the named suite with default configuration
    pub fn new(file_id: impl Into<String>) -> Self {
        Self::with_config(file_id, HarnessConfig::default())
    }

    /// Create a runner for the named suite with explicit configuration
    pub fn with_config(file_id: impl Into<String>, config: HarnessConfig) -> Self {
        Self {
            config,
            file_id: file_id.into(),
            next_test_index: 0,
            records: Vec::new(),
        }
    }

    /// Run one named conversation test.
    ///
    /// `agent` builds the agent under test around the signal sender the
    /// runner supplies; `test` is the script, given a recording wrapper and
    /// an assertion layer sharing one event log.
    ///
    /// A record is appended whether or not the script succeeds. The returned
    /// error re-raises the script's own error first; otherwise, if any
    /// assertion failed, returns [`ColloquyError::AssertionsFailed`] listing
    /// each failing check.
    pub async fn run_test<B, F, Fut>(&mut self, name: &str, agent: B, test: F) -> Result<()>
    where
        B: FnOnce(SignalSender) -> Arc<dyn DiagramAgent>,
        F: FnOnce(RecordingAgent, RecordingAssert) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let test_index = self.next_test_index;
        self.next_test_index += 1;
        let full_name = format!("{} > {}", self.file_id, name);
        tracing::info!(test = %full_name, "running conversation test");

        let log = EventLog::new();
        let (sender, receiver) = signal_channel(self.config.signal_buffer);
        let wrapper = RecordingAgent::new(agent(sender), receiver, log.clone());
        let check = RecordingAssert::new(log.clone());

        let started = Instant::now();
        let script_result = test(wrapper, check).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        if let Err(err) = &script_result {
            log.record(RecordedEvent::Error {
                error: err.to_string(),
                stack: None,
            });
        }

        let summary = log.summary();
        let failing: Vec<String> = log
            .events()
            .iter()
            .filter_map(|record| match &record.event {
                RecordedEvent::Assertion {
                    passed: false,
                    matcher,
                    description,
                    error,
                    ..
                } => Some(
                    description
                        .clone()
                        .or_else(|| error.clone())
                        .unwrap_or_else(|| format!("{matcher} assertion")),
                ),
                _ => None,
            })
            .collect();

        tracing::info!(
            test = %full_name,
            passed = summary.passed,
            assertions = summary.total_assertions,
            failed = summary.failed_assertions,
            duration_ms,
            "conversation test finished"
        );

        self.records.push(TestRecord {
            file_id: self.file_id.clone(),
            test_index,
            full_name,
            hierarchy: vec![self.file_id.clone(), name.to_string()],
            passed: summary.passed,
            duration_ms,
            summary,
            events: log.events(),
            error: script_result.as_ref().err().map(|e| e.to_string()),
        });

        script_result?;
        if !failing.is_empty() {
            return Err(ColloquyError::AssertionsFailed { failures: failing });
        }
        Ok(())
    }

    /// Suite name records are filed under
    pub fn file_id(&self) -> &str {
        &self.file_id
    }

    /// Runner configuration
    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Records collected so far, in execution order
    pub fn records(&self) -> &[TestRecord] {
        &self.records
    }

    /// Consume the runner and take its records
    pub fn into_records(self) -> Vec<TestRecord> {
        self.records
    }
}
