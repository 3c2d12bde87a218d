//! The boundary to the diagram-drawing agent under evaluation
//!
//! The harness never implements diagram generation itself. It drives an
//! opaque [`DiagramAgent`] that accepts one user message at a time, mutates
//! shared canvas state, and pushes [`AgentSignal`]s over a bounded channel
//! while a send is in flight.
//!
//! # Signals
//!
//! - [`AgentSignal::Start`] / [`AgentSignal::Complete`] - lifecycle markers for one send
//! - [`AgentSignal::ModelResponse`] - one streamed text chunk
//! - [`AgentSignal::ToolStart`] / [`AgentSignal::ToolEnd`] - tool invocation boundaries
//! - [`AgentSignal::CanvasUpdate`] - full diagram-source replacement
//! - [`AgentSignal::RenderComplete`] - outcome of rendering a canvas update
//! - [`AgentSignal::Log`] / [`AgentSignal::Error`] - diagnostics
//!
//! # Example
//!
//! ```rust,ignore
//! use colloquy_core::agent::{signal_channel, AgentSignal};
//!
//! let (tx, mut rx) = signal_channel(256);
//!
//! // The agent emits while processing a send
//! tx.send(AgentSignal::ModelResponse { chunk: "Drawing...".into() }).await?;
//!
//! // The recording wrapper drains the receiver
//! while let Some(signal) = rx.recv().await {
//!     println!("{}", signal.kind());
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::Result;

/// An agent that turns conversational instructions into diagram source.
///
/// Implementations are single-conversation: one instance per conversation,
/// never reset. `send_message` resolves only after the agent has finished
/// all work for that message, including every signal it intends to emit.
#[async_trait]
pub trait DiagramAgent: Send + Sync {
    /// Deliver one user message and wait for the agent to finish processing it.
    async fn send_message(&self, message: &str) -> Result<()>;

    /// Current diagram source held by the shared canvas.
    async fn canvas_content(&self) -> String;

    /// Full conversation so far, oldest first.
    async fn conversation_history(&self) -> Vec<ConversationMessage>;

    /// Point-in-time agent state.
    async fn state(&self) -> AgentState;
}

/// One message in the agent's conversation history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    /// Who produced the message
    pub role: MessageRole,

    /// Message text
    pub content: String,

    /// When the message was produced
    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    /// Create a message stamped with the current time
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Conversation participant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

impl MessageRole {
    /// Uppercase label used in flattened transcripts
    pub fn label(&self) -> &'static str {
        match self {
            MessageRole::User => "USER",
            MessageRole::Assistant => "ASSISTANT",
        }
    }
}

/// Point-in-time agent state snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    /// Current processing status
    pub status: AgentStatus,
}

/// Agent processing status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Between sends, ready for the next message
    Idle,

    /// A send is in flight
    Running,

    /// The last send ended in an unrecovered error
    Failed,
}

/// Lifecycle signals pushed by the agent while a send is in flight.
///
/// Signals arrive in emission order over the channel created by
/// [`signal_channel`]. Most map 1:1 onto recorded events; `Start`, `Log`,
/// and `Complete` are diagnostics only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum AgentSignal {
    /// The agent began processing the current message
    Start,

    /// Free-form diagnostic line from the agent
    Log {
        /// Log text
        message: String,
    },

    /// One streamed chunk of assistant text
    ModelResponse {
        /// The text chunk
        chunk: String,
    },

    /// A tool invocation began
    ToolStart {
        /// Tool name
        name: String,
        /// Arguments passed to the tool
        args: Value,
    },

    /// A tool invocation finished
    ToolEnd {
        /// Tool name
        name: String,
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
        error: Option<String>,
    },

    /// The agent hit an unrecoverable error processing the message
    Error {
        /// Error description
        error: String,
    },

    /// The agent finished processing the current message
    Complete,
}

impl AgentSignal {
    /// Get the signal kind as a string
    pub fn kind(&self) -> &'static str {
        match self {
            AgentSignal::Start => "start",
            AgentSignal::Log { .. } => "log",
            AgentSignal::ModelResponse { .. } => "model_response",
            AgentSignal::ToolStart { .. } => "tool_start",
            AgentSignal::ToolEnd { .. } => "tool_end",
            AgentSignal::CanvasUpdate { .. } => "canvas_update",
            AgentSignal::RenderComplete { .. } => "render_complete",
            AgentSignal::Error { .. } => "error",
            AgentSignal::Complete => "complete",
        }
    }
}

/// Sender half of a signal channel
pub type SignalSender = mpsc::Sender<AgentSignal>;

/// Receiver half of a signal channel
pub type SignalReceiver = mpsc::Receiver<AgentSignal>;

/// Creates a new signal channel with the specified buffer capacity.
///
/// The channel is bounded and preserves emission order; a full buffer
/// applies backpressure to the agent rather than dropping signals.
pub fn signal_channel(buffer_size: usize) -> (SignalSender, SignalReceiver) {
    mpsc::channel(buffer_size)
}
