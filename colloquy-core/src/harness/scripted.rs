//! Deterministic scripted agent
//!
//! [`ScriptedAgent`] implements [`DiagramAgent`] by replaying canned turns,
//! one [`TurnScript`] per `send_message` call. Steps emit their signals in
//! builder order over the real channel, so harness behavior is exercised
//! against the exact signal sequences a live agent would produce, without a
//! model in the loop.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::Value;
use tokio::sync::RwLock;

use crate::agent::{
    AgentSignal, AgentState, AgentStatus, ConversationMessage, DiagramAgent, MessageRole,
    SignalSender,
};
use crate::error::{ColloquyError, Result};

/// One scripted step within a turn
#[derive(Debug, Clone)]
enum ScriptStep {
    Say(String),
    CallTool {
        name: String,
        args: Value,
        result: Value,
    },
    SetCanvas {
        content: String,
        render_error: Option<String>,
    },
}

/// Canned behavior for one `send_message` call.
///
/// Steps replay in the order the builder methods were called. Text chunks
/// concatenate into a single assistant history entry for the turn.
#[derive(Debug, Clone, Default)]
pub struct TurnScript {
    steps: Vec<ScriptStep>,
    failure: Option<String>,
}

impl TurnScript {
    /// An empty turn: the agent completes without saying or drawing anything
    pub fn new() -> Self {
        Self::default()
    }

    /// Stream one chunk of assistant text
    pub fn say(mut self, chunk: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::Say(chunk.into()));
        self
    }

    /// Invoke a tool and immediately return its canned result
    pub fn call_tool(
        mut self,
        name: impl Into<String>,
        args: Value,
        result: Value,
    ) -> Self {
        self.steps.push(ScriptStep::CallTool {
            name: name.into(),
            args,
            result,
        });
        self
    }

    /// Replace the canvas; the follow-up render succeeds
    pub fn set_canvas(mut self, content: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::SetCanvas {
            content: content.into(),
            render_error: None,
        });
        self
    }

    /// Replace the canvas; the follow-up render fails with the given error
    pub fn fail_render(mut self, content: impl Into<String>, error: impl Into<String>) -> Self {
        self.steps.push(ScriptStep::SetCanvas {
            content: content.into(),
            render_error: Some(error.into()),
        });
        self
    }

    /// End the turn in an unrecoverable agent error after all steps ran
    pub fn fail(mut self, error: impl Into<String>) -> Self {
        self.failure = Some(error.into());
        self
    }
}

/// A [`DiagramAgent`] that replays scripted turns.
///
/// Canvas update identifiers are `canvas-0`, `canvas-1`, ... in emission
/// order across the agent's whole lifetime, mirroring how a live agent
/// correlates updates with rendered image files.
pub struct ScriptedAgent {
    signals: SignalSender,
    turns: RwLock<VecDeque<TurnScript>>,
    canvas: RwLock<String>,
    history: RwLock<Vec<ConversationMessage>>,
    status: RwLock<AgentStatus>,
    canvas_seq: AtomicUsize,
}

impl ScriptedAgent {
    /// Create an agent with no scripted turns; add them with
    /// [`with_turn`](Self::with_turn)
    pub fn new(signals: SignalSender) -> Self {
        Self {
            signals,
            turns: RwLock::new(VecDeque::new()),
            canvas: RwLock::new(String::new()),
            history: RwLock::new(Vec::new()),
            status: RwLock::new(AgentStatus::Idle),
            canvas_seq: AtomicUsize::new(0),
        }
    }

    /// Append one scripted turn
    pub fn with_turn(mut self, turn: TurnScript) -> Self {
        self.turns.get_mut().push_back(turn);
        self
    }

    /// Append several scripted turns in order
    pub fn with_turns(mut self, turns: impl IntoIterator<Item = TurnScript>) -> Self {
        self.turns.get_mut().extend(turns);
        self
    }

    async fn emit(&self, signal: AgentSignal) {
        let _ = self.signals.send(signal).await;
    }
}

#[async_trait::async_trait]
impl DiagramAgent for ScriptedAgent {
    async fn send_message(&self, message: &str) -> Result<()> {
        self.history
            .write()
            .await
            .push(ConversationMessage::new(MessageRole::User, message));
        *self.status.write().await = AgentStatus::Running;
        self.emit(AgentSignal::Start).await;

        let script = self.turns.write().await.pop_front().ok_or_else(|| {
            ColloquyError::Script(format!("no scripted turn remaining for message {message:?}"))
        })?;

        let mut assistant_text = String::new();
        for step in script.steps {
            match step {
                ScriptStep::Say(chunk) => {
                    assistant_text.push_str(&chunk);
                    self.emit(AgentSignal::ModelResponse { chunk }).await;
                }
                ScriptStep::CallTool { name, args, result } => {
                    self.emit(AgentSignal::ToolStart {
                        name: name.clone(),
                        args,
                    })
                    .await;
                    self.emit(AgentSignal::ToolEnd { name, result }).await;
                }
                ScriptStep::SetCanvas {
                    content,
                    render_error,
                } => {
                    let canvas_update_id =
                        format!("canvas-{}", self.canvas_seq.fetch_add(1, Ordering::SeqCst));
                    *self.canvas.write().await = content.clone();
                    self.emit(AgentSignal::CanvasUpdate {
                        content,
                        canvas_update_id: canvas_update_id.clone(),
                    })
                    .await;
                    self.emit(AgentSignal::RenderComplete {
                        canvas_update_id,
                        success: render_error.is_none(),
                        error: render_error,
                    })
                    .await;
                }
            }
        }

        if let Some(error) = script.failure {
            self.emit(AgentSignal::Error {
                error: error.clone(),
            })
            .await;
            *self.status.write().await = AgentStatus::Failed;
            return Err(ColloquyError::Agent(error));
        }

        if !assistant_text.is_empty() {
            self.history
                .write()
                .await
                .push(ConversationMessage::new(MessageRole::Assistant, assistant_text));
        }
        self.emit(AgentSignal::Complete).await;
        *self.status.write().await = AgentStatus::Idle;
        Ok(())
    }

    async fn canvas_content(&self) -> String {
        self.canvas.read().await.clone()
    }

    async fn conversation_history(&self) -> Vec<ConversationMessage> {
        self.history.read().await.clone()
    }

    async fn state(&self) -> AgentState {
        AgentState {
            status: *self.status.read().await,
        }
    }
}

impl std::fmt::Debug for ScriptedAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedAgent").finish()
    }
}
