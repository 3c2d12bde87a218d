//! Typed events and the envelope that stamps them into the log
//!
//! Wire shape matches what the downstream judging toolchain consumes:
//! internally tagged (`type`), snake_case variant names, camelCase fields.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Atomic unit of a conversation's event log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RecordedEvent {
    /// A user message was delivered to the agent; opens a turn
    UserMessage {
        /// Message text
        content: String,
    },

    /// One streamed chunk of assistant text; several may occur per turn
    AssistantMessage {
        /// The text chunk
        content: String,
    },

    /// The agent invoked a tool
    ToolCall {
        /// Tool name
        tool_name: String,
        /// Arguments passed to the tool
        args: Value,
    },

    /// A tool invocation returned
    ToolResult {
        /// Tool name
        tool_name: String,
        /// Value the tool returned
        result: Value,
    },

    /// The canvas was replaced wholesale with new diagram source
    CanvasUpdate {
        /// Full new diagram source
        content: String,
        /// Identifier correlating this update with a render outcome and image file
        canvas_update_id: String,
    },

    /// Rendering of a canvas update finished
    RenderComplete {
        /// The update that was rendered
        canvas_update_id: String,
        /// Whether rendering succeeded
        success: bool,
        /// Renderer error message, when rendering failed
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Outcome of one recorded assertion; failure never aborts the run
    Assertion {
        /// Whether the check held
        passed: bool,
        /// Which comparison was applied
        matcher: String,
        /// The value under test
        actual: Value,
        /// The value it was compared against
        expected: Value,
        /// Human label for this check
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        /// Failure message, when the check did not hold
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// Free-text judge criteria attached after the fact to a completed turn
    Criteria {
        /// Zero-based index of the turn the criteria apply to
        turn_index: usize,
        /// The criteria text, in attachment order
        criteria: Vec<String>,
    },

    /// Synthesized at the end of each send; snapshots final diagram state
    TurnComplete {
        /// Zero-based turn index, gap-free in send order
        turn_index: usize,
        /// Last canvas update of the run so far, if any
        #[serde(skip_serializing_if = "Option::is_none")]
        canvas_update_id: Option<String>,
        /// Diagram source of that update
        #[serde(skip_serializing_if = "Option::is_none")]
        d2_content: Option<String>,
        /// Flattened transcript at the instant the turn closed
        #[serde(skip_serializing_if = "Option::is_none")]
        conversation: Option<String>,
    },

    /// Unrecoverable run-level failure, distinct from an assertion failure
    Error {
        /// Error description
        error: String,
        /// Stack or context lines, when available
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
}

impl RecordedEvent {
    /// Get the event kind as a string
    pub fn kind(&self) -> &'static str {
        match self {
            RecordedEvent::UserMessage { .. } => "user_message",
            RecordedEvent::AssistantMessage { .. } => "assistant_message",
            RecordedEvent::ToolCall { .. } => "tool_call",
            RecordedEvent::ToolResult { .. } => "tool_result",
            RecordedEvent::CanvasUpdate { .. } => "canvas_update",
            RecordedEvent::RenderComplete { .. } => "render_complete",
            RecordedEvent::Assertion { .. } => "assertion",
            RecordedEvent::Criteria { .. } => "criteria",
            RecordedEvent::TurnComplete { .. } => "turn_complete",
            RecordedEvent::Error { .. } => "error",
        }
    }

    /// Whether this event is a failed assertion
    pub fn is_failed_assertion(&self) -> bool {
        matches!(self, RecordedEvent::Assertion { passed: false, .. })
    }
}

/// Envelope stamping each event with its position in the log.
///
/// `relative_time` is milliseconds since the log's start; the log clamps it
/// so values never decrease in insertion order even if the platform clock
/// steps backwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    /// Insertion order within the log, starting at zero
    pub sequence: u64,

    /// Absolute time the event was recorded
    pub timestamp: DateTime<Utc>,

    /// Milliseconds since the log started
    pub relative_time: u64,

    /// The event data
    #[serde(flatten)]
    pub event: RecordedEvent,
}

impl EventRecord {
    /// Get the event kind as a string
    pub fn kind(&self) -> &'static str {
        self.event.kind()
    }
}
