//! Recording wrapper around the agent under evaluation
//!
//! [`RecordingAgent`] owns the receiving half of the agent's signal channel.
//! While a `send` is in flight it drains signals into the event log as they
//! arrive, so sub-event order within a turn matches the agent's own emission
//! order. When the send resolves it synthesizes one `turn_complete` event
//! snapshotting the diagram state and transcript at that instant.
//!
//! One wrapper observes one conversation. There is no reset; independent
//! conversations get independent agent/wrapper pairs.

use std::sync::Arc;

use crate::agent::{
    AgentSignal, AgentState, ConversationMessage, DiagramAgent, SignalReceiver,
};
use crate::error::{ColloquyError, Result};
use crate::record::{EventLog, RecordedEvent};

/// Last canvas replacement seen in the run
struct CanvasSnapshot {
    canvas_update_id: String,
    content: String,
}

/// Wraps a [`DiagramAgent`] and records everything it does.
///
/// Sub-events are recorded live during [`send`](RecordingAgent::send); the
/// `turn_complete` carries the **last** canvas update of the whole run so
/// far, so a turn that changed nothing still reports the prior diagram
/// state.
pub struct RecordingAgent {
    agent: Arc<dyn DiagramAgent>,
    signals: SignalReceiver,
    log: EventLog,
    completed_turns: usize,
    last_canvas: Option<CanvasSnapshot>,
}

impl RecordingAgent {
    /// Wrap an agent, taking ownership of its signal receiver
    pub fn new(agent: Arc<dyn DiagramAgent>, signals: SignalReceiver, log: EventLog) -> Self {
        Self {
            agent,
            signals,
            log,
            completed_turns: 0,
            last_canvas: None,
        }
    }

    /// Deliver one user message and record the full turn.
    ///
    /// Records `user_message`, drives the agent's send to completion while
    /// translating its signals into events, then synthesizes the
    /// `turn_complete`. If the agent's send resolves with an error the error
    /// propagates and no `turn_complete` is recorded.
    pub async fn send(&mut self, message: &str) -> Result<()> {
        self.log.record(RecordedEvent::UserMessage {
            content: message.to_string(),
        });

        let agent = Arc::clone(&self.agent);
        let text = message.to_string();
        let send_fut = async move { agent.send_message(&text).await };
        tokio::pin!(send_fut);

        // Drain signals ahead of completion so events land in emission order
        let outcome = loop {
            tokio::select! {
                biased;
                Some(signal) = self.signals.recv() => self.record_signal(signal),
                result = &mut send_fut => break result,
            }
        };

        // Signals emitted in the same poll that resolved the send may still
        // be buffered
        while let Ok(signal) = self.signals.try_recv() {
            self.record_signal(signal);
        }

        outcome?;

        let conversation = self.transcript().await;
        self.log.record(RecordedEvent::TurnComplete {
            turn_index: self.completed_turns,
            canvas_update_id: self.last_canvas.as_ref().map(|c| c.canvas_update_id.clone()),
            d2_content: self.last_canvas.as_ref().map(|c| c.content.clone()),
            conversation: Some(conversation),
        });
        self.completed_turns += 1;

        Ok(())
    }

    /// Attach judge criteria to the most recently completed turn.
    ///
    /// Repeated calls for the same turn accumulate. Calling this before any
    /// turn has completed is a script defect and returns
    /// [`ColloquyError::Script`] instead of recording anything.
    pub fn criteria<I, S>(&self, criteria: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.completed_turns == 0 {
            return Err(ColloquyError::Script(
                "criteria() called before any turn completed".to_string(),
            ));
        }
        self.log.record(RecordedEvent::Criteria {
            turn_index: self.completed_turns - 1,
            criteria: criteria.into_iter().map(Into::into).collect(),
        });
        Ok(())
    }

    /// Current diagram source; a point-in-time read, never recorded
    pub async fn canvas(&self) -> String {
        self.agent.canvas_content().await
    }

    /// Conversation so far; a point-in-time read, never recorded
    pub async fn conversation(&self) -> Vec<ConversationMessage> {
        self.agent.conversation_history().await
    }

    /// Agent state snapshot; a point-in-time read, never recorded
    pub async fn state(&self) -> AgentState {
        self.agent.state().await
    }

    /// Resetting is not supported; always returns
    /// [`ColloquyError::ResetUnsupported`]
    pub fn reset(&self) -> Result<()> {
        Err(ColloquyError::ResetUnsupported)
    }

    /// Number of turns that have fully completed
    pub fn completed_turns(&self) -> usize {
        self.completed_turns
    }

    fn record_signal(&mut self, signal: AgentSignal) {
        match signal {
            AgentSignal::Start => tracing::debug!("agent started processing"),
            AgentSignal::Complete => tracing::debug!("agent finished processing"),
            AgentSignal::Log { message } => tracing::debug!("agent: {message}"),
            AgentSignal::ModelResponse { chunk } => {
                self.log
                    .record(RecordedEvent::AssistantMessage { content: chunk });
            }
            AgentSignal::ToolStart { name, args } => {
                self.log.record(RecordedEvent::ToolCall {
                    tool_name: name,
                    args,
                });
            }
            AgentSignal::ToolEnd { name, result } => {
                self.log.record(RecordedEvent::ToolResult {
                    tool_name: name,
                    result,
                });
            }
            AgentSignal::CanvasUpdate {
                content,
                canvas_update_id,
            } => {
                self.last_canvas = Some(CanvasSnapshot {
                    canvas_update_id: canvas_update_id.clone(),
                    content: content.clone(),
                });
                self.log.record(RecordedEvent::CanvasUpdate {
                    content,
                    canvas_update_id,
                });
            }
            AgentSignal::RenderComplete {
                canvas_update_id,
                success,
                error,
            } => {
                self.log.record(RecordedEvent::RenderComplete {
                    canvas_update_id,
                    success,
                    error,
                });
            }
            AgentSignal::Error { error } => {
                self.log.record(RecordedEvent::Error { error, stack: None });
            }
        }
    }

    async fn transcript(&self) -> String {
        self.agent
            .conversation_history()
            .await
            .iter()
            .map(|m| format!("{}: {}", m.role.label(), m.content))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl std::fmt::Debug for RecordingAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingAgent")
            .field("completed_turns", &self.completed_turns)
            .finish()
    }
}

#[cfg(test)]
mod recorder_tests {
    use super::super::scripted::{ScriptedAgent, TurnScript};
    use super::*;
    use crate::agent::signal_channel;

    fn kinds(log: &EventLog) -> Vec<&'static str> {
        log.events().iter().map(|r| r.kind()).collect()
    }

    #[tokio::test]
    async fn test_send_records_turn_in_emission_order() {
        let log = EventLog::new();
        let (sender, receiver) = signal_channel(256);
        let agent = Arc::new(ScriptedAgent::new(sender).with_turn(
            TurnScript::new()
                .say("Drawing box A")
                .call_tool(
                    "update_canvas",
                    serde_json::json!({"content": "A"}),
                    serde_json::json!({"ok": true}),
                )
                .set_canvas("A"),
        ));
        let mut wrapper = RecordingAgent::new(agent, receiver, log.clone());

        wrapper.send("Create a box labeled A").await.unwrap();

        assert_eq!(
            kinds(&log),
            vec![
                "user_message",
                "assistant_message",
                "tool_call",
                "tool_result",
                "canvas_update",
                "render_complete",
                "turn_complete",
            ]
        );
        assert_eq!(wrapper.completed_turns(), 1);
    }

    #[tokio::test]
    async fn test_turn_complete_snapshots_last_canvas_and_transcript() {
        let log = EventLog::new();
        let (sender, receiver) = signal_channel(256);
        let agent = Arc::new(
            ScriptedAgent::new(sender)
                .with_turn(TurnScript::new().say("done").set_canvas("A"))
                .with_turn(TurnScript::new().say("nothing to draw")),
        );
        let mut wrapper = RecordingAgent::new(agent, receiver, log.clone());

        wrapper.send("Draw A").await.unwrap();
        wrapper.send("What does the diagram show?").await.unwrap();

        let turn_completes: Vec<_> = log
            .events()
            .into_iter()
            .filter(|r| r.kind() == "turn_complete")
            .collect();
        assert_eq!(turn_completes.len(), 2);

        // Second turn changed nothing: the snapshot still carries turn one's canvas
        match &turn_completes[1].event {
            RecordedEvent::TurnComplete {
                turn_index,
                canvas_update_id,
                d2_content,
                conversation,
            } => {
                assert_eq!(*turn_index, 1);
                assert_eq!(canvas_update_id.as_deref(), Some("canvas-0"));
                assert_eq!(d2_content.as_deref(), Some("A"));
                let transcript = conversation.as_deref().unwrap();
                assert!(transcript.starts_with("USER: Draw A"));
                assert!(transcript.contains("ASSISTANT: done"));
                assert!(transcript.contains("USER: What does the diagram show?"));
            }
            other => panic!("expected turn_complete, got {}", other.kind()),
        }
    }

    #[tokio::test]
    async fn test_send_error_records_no_turn_complete() {
        let log = EventLog::new();
        let (sender, receiver) = signal_channel(256);
        let agent = Arc::new(
            ScriptedAgent::new(sender).with_turn(TurnScript::new().fail("model overloaded")),
        );
        let mut wrapper = RecordingAgent::new(agent, receiver, log.clone());

        let err = wrapper.send("Draw A").await.unwrap_err();
        assert!(matches!(err, ColloquyError::Agent(_)));

        let kinds = kinds(&log);
        assert!(kinds.contains(&"error"));
        assert!(!kinds.contains(&"turn_complete"));
        assert_eq!(wrapper.completed_turns(), 0);
    }

    #[tokio::test]
    async fn test_criteria_before_first_turn_is_error() {
        let log = EventLog::new();
        let (sender, receiver) = signal_channel(256);
        let agent = Arc::new(ScriptedAgent::new(sender));
        let wrapper = RecordingAgent::new(agent, receiver, log.clone());

        let err = wrapper.criteria(["diagram shows a box"]).unwrap_err();
        assert!(matches!(err, ColloquyError::Script(_)));
        assert!(log.is_empty());
    }

    #[tokio::test]
    async fn test_criteria_attaches_to_last_completed_turn() {
        let log = EventLog::new();
        let (sender, receiver) = signal_channel(256);
        let agent = Arc::new(
            ScriptedAgent::new(sender)
                .with_turn(TurnScript::new().set_canvas("A"))
                .with_turn(TurnScript::new().set_canvas("A\nB")),
        );
        let mut wrapper = RecordingAgent::new(agent, receiver, log.clone());

        wrapper.send("Draw A").await.unwrap();
        wrapper.send("Add B").await.unwrap();
        wrapper.criteria(["shows two boxes"]).unwrap();

        let criteria: Vec<_> = log
            .events()
            .into_iter()
            .filter_map(|r| match r.event {
                RecordedEvent::Criteria {
                    turn_index,
                    criteria,
                } => Some((turn_index, criteria)),
                _ => None,
            })
            .collect();
        assert_eq!(criteria, vec![(1, vec!["shows two boxes".to_string()])]);
    }

    #[tokio::test]
    async fn test_reads_are_passthrough_and_unrecorded() {
        let log = EventLog::new();
        let (sender, receiver) = signal_channel(256);
        let agent = Arc::new(
            ScriptedAgent::new(sender).with_turn(TurnScript::new().set_canvas("A -> B")),
        );
        let mut wrapper = RecordingAgent::new(agent, receiver, log.clone());

        wrapper.send("Connect A to B").await.unwrap();
        let before = log.len();

        assert_eq!(wrapper.canvas().await, "A -> B");
        assert_eq!(wrapper.conversation().await.len(), 1);
        let _ = wrapper.state().await;

        assert_eq!(log.len(), before);
    }

    #[tokio::test]
    async fn test_reset_is_unsupported() {
        let log = EventLog::new();
        let (sender, receiver) = signal_channel(256);
        let agent = Arc::new(ScriptedAgent::new(sender));
        let wrapper = RecordingAgent::new(agent, receiver, log);

        assert!(matches!(
            wrapper.reset(),
            Err(ColloquyError::ResetUnsupported)
        ));
    }
}
