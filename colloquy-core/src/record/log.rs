//! Append-only event log for one conversation run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::event::{EventRecord, RecordedEvent};

/// Append-only, time-ordered store of typed events for one conversation run.
///
/// The log is a cheaply clonable handle; the agent wrapper, the assertion
/// layer, and the runner all hold clones and append to the same store.
/// Events are write-only during the run and read exactly once afterwards
/// for turn reconstruction and summary calculation.
#[derive(Clone)]
pub struct EventLog {
    inner: Arc<Mutex<LogInner>>,
}

struct LogInner {
    started_at: DateTime<Utc>,
    last_timestamp: DateTime<Utc>,
    next_sequence: u64,
    records: Vec<EventRecord>,
}

impl LogInner {
    fn fresh() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            last_timestamp: now,
            next_sequence: 0,
            records: Vec::new(),
        }
    }
}

impl EventLog {
    /// Create an empty log whose epoch is now
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(LogInner::fresh())),
        }
    }

    // A poisoned lock still holds a structurally valid log.
    fn lock(&self) -> MutexGuard<'_, LogInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append an event, stamping sequence, absolute time, and relative time.
    ///
    /// Timestamps are clamped to be non-decreasing in insertion order, so a
    /// platform clock step can never produce an out-of-order log.
    pub fn record(&self, event: RecordedEvent) {
        let mut inner = self.lock();
        let timestamp = Utc::now().max(inner.last_timestamp);
        let relative_time = (timestamp - inner.started_at)
            .num_milliseconds()
            .max(0) as u64;
        let sequence = inner.next_sequence;
        inner.next_sequence += 1;
        inner.last_timestamp = timestamp;

        tracing::trace!(kind = event.kind(), sequence, "recorded event");

        inner.records.push(EventRecord {
            sequence,
            timestamp,
            relative_time,
            event,
        });
    }

    /// All events sorted by absolute time, ties broken by insertion order
    pub fn events(&self) -> Vec<EventRecord> {
        let mut records = self.lock().records.clone();
        records.sort_by_key(|r| (r.timestamp, r.sequence));
        records
    }

    /// When the log started (the relative-time epoch)
    pub fn started_at(&self) -> DateTime<Utc> {
        self.lock().started_at
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// Fold assertion outcomes and duration into a summary.
    ///
    /// A run passes when no assertion failed and no run-level error was
    /// recorded.
    pub fn summary(&self) -> TestSummary {
        let inner = self.lock();
        let mut total_assertions = 0;
        let mut passed_assertions = 0;
        let mut failed_assertions = 0;
        let mut has_error = false;

        for record in &inner.records {
            match &record.event {
                RecordedEvent::Assertion { passed, .. } => {
                    total_assertions += 1;
                    if *passed {
                        passed_assertions += 1;
                    } else {
                        failed_assertions += 1;
                    }
                }
                RecordedEvent::Error { .. } => has_error = true,
                _ => {}
            }
        }

        let duration_ms = inner
            .records
            .iter()
            .map(|r| r.relative_time)
            .max()
            .unwrap_or(0);

        TestSummary {
            total_events: inner.records.len(),
            total_assertions,
            passed_assertions,
            failed_assertions,
            duration_ms,
            passed: failed_assertions == 0 && !has_error,
        }
    }

    /// Reset to an empty log with a fresh epoch.
    ///
    /// Intended only between independent runs, never mid-test.
    pub fn clear(&self) {
        let mut inner = self.lock();
        *inner = LogInner::fresh();
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("events", &self.len())
            .finish()
    }
}

/// Derived pass/fail summary for one conversation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestSummary {
    /// Total events in the log
    pub total_events: usize,

    /// Total assertions recorded
    pub total_assertions: usize,

    /// Assertions that held
    pub passed_assertions: usize,

    /// Assertions that did not hold
    pub failed_assertions: usize,

    /// Largest relative time observed, in milliseconds
    pub duration_ms: u64,

    /// Whether the run passed (no failed assertions, no run-level error)
    pub passed: bool,
}

#[cfg(test)]
mod log_tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_stamps_sequence_and_order() {
        let log = EventLog::new();
        log.record(RecordedEvent::UserMessage {
            content: "one".to_string(),
        });
        log.record(RecordedEvent::AssistantMessage {
            content: "two".to_string(),
        });
        log.record(RecordedEvent::TurnComplete {
            turn_index: 0,
            canvas_update_id: None,
            d2_content: None,
            conversation: None,
        });

        let events = log.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].sequence, 0);
        assert_eq!(events[1].sequence, 1);
        assert_eq!(events[2].sequence, 2);

        // Timestamps and relative times never decrease in insertion order
        for pair in events.windows(2) {
            assert!(pair[0].timestamp <= pair[1].timestamp);
            assert!(pair[0].relative_time <= pair[1].relative_time);
        }
    }

    #[test]
    fn test_clone_shares_store() {
        let log = EventLog::new();
        let handle = log.clone();

        handle.record(RecordedEvent::UserMessage {
            content: "hello".to_string(),
        });

        assert_eq!(log.len(), 1);
        assert_eq!(log.events()[0].kind(), "user_message");
    }

    #[test]
    fn test_summary_counts_assertions() {
        let log = EventLog::new();
        log.record(RecordedEvent::Assertion {
            passed: true,
            matcher: "to_equal".to_string(),
            actual: json!(1),
            expected: json!(1),
            description: None,
            error: None,
        });
        log.record(RecordedEvent::Assertion {
            passed: false,
            matcher: "to_equal".to_string(),
            actual: json!(1),
            expected: json!(2),
            description: Some("count is two".to_string()),
            error: Some("Expected 1 to equal 2".to_string()),
        });
        log.record(RecordedEvent::Assertion {
            passed: true,
            matcher: "to_contain".to_string(),
            actual: json!("abc"),
            expected: json!("b"),
            description: None,
            error: None,
        });

        let summary = log.summary();
        assert_eq!(summary.total_events, 3);
        assert_eq!(summary.total_assertions, 3);
        assert_eq!(summary.passed_assertions, 2);
        assert_eq!(summary.failed_assertions, 1);
        assert!(!summary.passed);
    }

    #[test]
    fn test_summary_passes_without_failures() {
        let log = EventLog::new();
        log.record(RecordedEvent::UserMessage {
            content: "hi".to_string(),
        });
        log.record(RecordedEvent::Assertion {
            passed: true,
            matcher: "to_equal".to_string(),
            actual: json!("a"),
            expected: json!("a"),
            description: None,
            error: None,
        });

        let summary = log.summary();
        assert!(summary.passed);
        assert_eq!(summary.failed_assertions, 0);
    }

    #[test]
    fn test_error_event_fails_summary() {
        let log = EventLog::new();
        log.record(RecordedEvent::Error {
            error: "agent crashed".to_string(),
            stack: None,
        });

        let summary = log.summary();
        assert_eq!(summary.total_assertions, 0);
        assert!(!summary.passed);
    }

    #[test]
    fn test_clear_resets_epoch_and_sequence() {
        let log = EventLog::new();
        log.record(RecordedEvent::UserMessage {
            content: "before".to_string(),
        });
        assert_eq!(log.len(), 1);

        log.clear();
        assert!(log.is_empty());

        log.record(RecordedEvent::UserMessage {
            content: "after".to_string(),
        });
        let events = log.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sequence, 0);
    }
}
