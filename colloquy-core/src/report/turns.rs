//! Turn reconstruction from a flat event log
//!
//! Reporting and judging consume turns, not raw events. One pass over the
//! log groups sub-events under the `turn_complete` that closes them and
//! joins in criteria by turn index, wherever in the log the criteria were
//! recorded.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::record::{EventRecord, RecordedEvent};

/// One reconstructed conversation turn
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnRecord {
    /// Zero-based turn index
    pub turn_index: usize,

    /// Transcript snapshot from the `turn_complete`, or a `USER: ...` line
    /// built from the turn's first user message when no snapshot exists
    pub prompt: String,

    /// The turn's own sub-events: user and assistant messages, tool calls
    /// and results
    pub turn_events: Vec<EventRecord>,

    /// Judge criteria attached to this turn, in attachment order
    pub criteria: Vec<String>,

    /// Where the rendered image for this turn's diagram is expected on disk,
    /// relative to the results directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub png_path: Option<String>,

    /// Diagram source snapshotted when the turn closed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d2_content: Option<String>,
}

/// Group a test's events into [`TurnRecord`]s.
///
/// `file_id` and `test_index` feed the image path convention
/// `{fileId}/test-{testIndex}/{canvasUpdateId}.png`. Events recorded outside
/// any turn boundary (assertions, render outcomes, criteria, errors) are not
/// turn sub-events; criteria still reach their turn through the index join.
pub fn build_turn_records(
    events: &[EventRecord],
    file_id: &str,
    test_index: usize,
) -> Vec<TurnRecord> {
    // Criteria may be recorded long after their turn closed
    let mut criteria_by_turn: HashMap<usize, Vec<String>> = HashMap::new();
    for record in events {
        if let RecordedEvent::Criteria {
            turn_index,
            criteria,
        } = &record.event
        {
            criteria_by_turn
                .entry(*turn_index)
                .or_default()
                .extend(criteria.iter().cloned());
        }
    }

    let mut turns = Vec::new();
    let mut current: Vec<EventRecord> = Vec::new();
    for record in events {
        match &record.event {
            RecordedEvent::UserMessage { .. }
            | RecordedEvent::AssistantMessage { .. }
            | RecordedEvent::ToolCall { .. }
            | RecordedEvent::ToolResult { .. } => current.push(record.clone()),
            RecordedEvent::TurnComplete {
                turn_index,
                canvas_update_id,
                d2_content,
                conversation,
            } => {
                let prompt = conversation
                    .clone()
                    .unwrap_or_else(|| fallback_prompt(&current));
                turns.push(TurnRecord {
                    turn_index: *turn_index,
                    prompt,
                    turn_events: std::mem::take(&mut current),
                    criteria: criteria_by_turn
                        .get(turn_index)
                        .cloned()
                        .unwrap_or_default(),
                    png_path: canvas_update_id
                        .as_ref()
                        .map(|id| format!("{file_id}/test-{test_index}/{id}.png")),
                    d2_content: d2_content.clone(),
                });
            }
            _ => {}
        }
    }
    turns
}

fn fallback_prompt(events: &[EventRecord]) -> String {
    events
        .iter()
        .find_map(|record| match &record.event {
            RecordedEvent::UserMessage { content } => Some(format!("USER: {content}")),
            _ => None,
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod turns_tests {
    use super::*;
    use crate::record::EventLog;

    fn log_two_turns() -> EventLog {
        let log = EventLog::new();
        log.record(RecordedEvent::UserMessage {
            content: "Draw A".to_string(),
        });
        log.record(RecordedEvent::AssistantMessage {
            content: "done".to_string(),
        });
        log.record(RecordedEvent::CanvasUpdate {
            content: "A".to_string(),
            canvas_update_id: "canvas-0".to_string(),
        });
        log.record(RecordedEvent::TurnComplete {
            turn_index: 0,
            canvas_update_id: Some("canvas-0".to_string()),
            d2_content: Some("A".to_string()),
            conversation: Some("USER: Draw A\nASSISTANT: done".to_string()),
        });
        log.record(RecordedEvent::Criteria {
            turn_index: 0,
            criteria: vec!["shows a box".to_string()],
        });
        log.record(RecordedEvent::UserMessage {
            content: "Add B".to_string(),
        });
        log.record(RecordedEvent::ToolCall {
            tool_name: "update_canvas".to_string(),
            args: serde_json::json!({"content": "A\nB"}),
        });
        log.record(RecordedEvent::ToolResult {
            tool_name: "update_canvas".to_string(),
            result: serde_json::json!(null),
        });
        log.record(RecordedEvent::TurnComplete {
            turn_index: 1,
            canvas_update_id: Some("canvas-1".to_string()),
            d2_content: Some("A\nB".to_string()),
            conversation: Some("USER: Draw A\nASSISTANT: done\nUSER: Add B".to_string()),
        });
        // Late criteria for an earlier turn
        log.record(RecordedEvent::Criteria {
            turn_index: 0,
            criteria: vec!["box is labeled A".to_string()],
        });
        log
    }

    #[test]
    fn test_groups_sub_events_by_turn() {
        let turns = build_turn_records(&log_two_turns().events(), "basic-shapes", 0);

        assert_eq!(turns.len(), 2);
        let kinds: Vec<&str> = turns[0].turn_events.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["user_message", "assistant_message"]);
        let kinds: Vec<&str> = turns[1].turn_events.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["user_message", "tool_call", "tool_result"]);
    }

    #[test]
    fn test_criteria_join_across_the_whole_log() {
        let turns = build_turn_records(&log_two_turns().events(), "basic-shapes", 0);

        assert_eq!(
            turns[0].criteria,
            vec!["shows a box".to_string(), "box is labeled A".to_string()]
        );
        assert!(turns[1].criteria.is_empty());
    }

    #[test]
    fn test_png_path_convention() {
        let turns = build_turn_records(&log_two_turns().events(), "basic-shapes", 3);

        assert_eq!(
            turns[0].png_path.as_deref(),
            Some("basic-shapes/test-3/canvas-0.png")
        );
        assert_eq!(
            turns[1].png_path.as_deref(),
            Some("basic-shapes/test-3/canvas-1.png")
        );
    }

    #[test]
    fn test_turn_without_canvas_has_no_png_path() {
        let log = EventLog::new();
        log.record(RecordedEvent::UserMessage {
            content: "hello".to_string(),
        });
        log.record(RecordedEvent::TurnComplete {
            turn_index: 0,
            canvas_update_id: None,
            d2_content: None,
            conversation: Some("USER: hello".to_string()),
        });

        let turns = build_turn_records(&log.events(), "suite", 0);
        assert_eq!(turns.len(), 1);
        assert!(turns[0].png_path.is_none());
        assert!(turns[0].d2_content.is_none());
    }

    #[test]
    fn test_prompt_falls_back_to_first_user_message() {
        let log = EventLog::new();
        log.record(RecordedEvent::UserMessage {
            content: "Draw A".to_string(),
        });
        log.record(RecordedEvent::TurnComplete {
            turn_index: 0,
            canvas_update_id: None,
            d2_content: None,
            conversation: None,
        });

        let turns = build_turn_records(&log.events(), "suite", 0);
        assert_eq!(turns[0].prompt, "USER: Draw A");
    }

    #[test]
    fn test_assertions_and_errors_are_not_turn_events() {
        let log = EventLog::new();
        log.record(RecordedEvent::UserMessage {
            content: "Draw A".to_string(),
        });
        log.record(RecordedEvent::Assertion {
            passed: false,
            matcher: "to_equal".to_string(),
            actual: serde_json::json!("A"),
            expected: serde_json::json!("B"),
            description: None,
            error: Some("Expected \"A\" to equal \"B\"".to_string()),
        });
        log.record(RecordedEvent::Error {
            error: "transient".to_string(),
            stack: None,
        });
        log.record(RecordedEvent::TurnComplete {
            turn_index: 0,
            canvas_update_id: None,
            d2_content: None,
            conversation: Some("USER: Draw A".to_string()),
        });

        let turns = build_turn_records(&log.events(), "suite", 0);
        let kinds: Vec<&str> = turns[0].turn_events.iter().map(|e| e.kind()).collect();
        assert_eq!(kinds, vec!["user_message"]);
    }
}
