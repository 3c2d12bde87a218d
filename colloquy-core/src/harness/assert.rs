//! Recording assertion layer
//!
//! Checks never abort the run: every comparison records an assertion event,
//! pass or fail, and returns normally. A script with twenty independent
//! properties gets all twenty judged and reported; the runner rolls failures
//! into one error only after the script finishes.
//!
//! The trade-off is deliberate: an assertion's outcome cannot gate later
//! control flow in the same test.

use serde_json::Value;

use crate::record::{EventLog, RecordedEvent};

/// Entry point for recorded checks within one conversation run
#[derive(Clone)]
pub struct RecordingAssert {
    log: EventLog,
}

impl RecordingAssert {
    /// Create an assertion layer appending to the given log
    pub fn new(log: EventLog) -> Self {
        Self { log }
    }

    /// Begin a check on a value
    pub fn expect(&self, actual: impl Into<Value>) -> Expectation {
        Expectation {
            log: self.log.clone(),
            actual: actual.into(),
            description: None,
        }
    }
}

impl std::fmt::Debug for RecordingAssert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingAssert").finish()
    }
}

/// A single pending check.
///
/// Each comparison consumes the expectation, records the outcome, and
/// returns `()`.
pub struct Expectation {
    log: EventLog,
    actual: Value,
    description: Option<String>,
}

impl Expectation {
    /// Attach a human label reported when the check fails
    pub fn with_description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    /// Check deep equality
    pub fn to_equal(self, expected: impl Into<Value>) {
        let expected = expected.into();
        let passed = self.actual == expected;
        let error =
            (!passed).then(|| format!("Expected {} to equal {}", self.actual, expected));
        self.record("to_equal", expected, passed, error);
    }

    /// Check containment: substring for strings, element for arrays
    pub fn to_contain(self, expected: impl Into<Value>) {
        let expected = expected.into();
        let passed = match (&self.actual, &expected) {
            (Value::String(s), Value::String(pattern)) => s.contains(pattern.as_str()),
            (Value::Array(arr), val) => arr.contains(val),
            _ => false,
        };
        let error =
            (!passed).then(|| format!("Expected {} to contain {}", self.actual, expected));
        self.record("to_contain", expected, passed, error);
    }

    /// Check a string against a regular expression.
    ///
    /// An invalid pattern is itself a recorded failure, never a panic.
    pub fn to_match(self, pattern: &str) {
        let (passed, error) = match regex::Regex::new(pattern) {
            Ok(re) => match &self.actual {
                Value::String(s) if re.is_match(s) => (true, None),
                Value::String(_) => (
                    false,
                    Some(format!("Expected {} to match /{}/", self.actual, pattern)),
                ),
                _ => (
                    false,
                    Some(format!("Expected a string matching /{}/, got {}", pattern, self.actual)),
                ),
            },
            Err(err) => (false, Some(format!("Invalid pattern /{}/: {}", pattern, err))),
        };
        self.record("to_match", Value::String(pattern.to_string()), passed, error);
    }

    /// Check numeric ordering: actual > expected
    pub fn to_be_greater_than(self, expected: impl Into<Value>) {
        let expected = expected.into();
        let passed = match (self.actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        };
        let error = (!passed).then(|| {
            format!("Expected {} to be greater than {}", self.actual, expected)
        });
        self.record("to_be_greater_than", expected, passed, error);
    }

    /// Check numeric ordering: actual < expected
    pub fn to_be_less_than(self, expected: impl Into<Value>) {
        let expected = expected.into();
        let passed = match (self.actual.as_f64(), expected.as_f64()) {
            (Some(a), Some(b)) => a < b,
            _ => false,
        };
        let error =
            (!passed).then(|| format!("Expected {} to be less than {}", self.actual, expected));
        self.record("to_be_less_than", expected, passed, error);
    }

    fn record(self, matcher: &str, expected: Value, passed: bool, error: Option<String>) {
        if !passed {
            tracing::debug!(
                matcher,
                description = self.description.as_deref(),
                "assertion failed"
            );
        }
        self.log.record(RecordedEvent::Assertion {
            passed,
            matcher: matcher.to_string(),
            actual: self.actual,
            expected,
            description: self.description,
            error,
        });
    }
}
