//! Turn reconstruction, report assembly, and rendering
//!
//! The pipeline from raw records to artifacts:
//!
//! 1. [`build_turn_records`] groups a test's flat event log into turns
//! 2. [`ReportBuilder`] folds test records into one [`AggregateReport`]
//! 3. [`AggregateReport::save`] writes the JSON consumed by downstream
//!    judging; [`render_html`] produces the human-readable page
//!
//! # Example
//!
//! ```rust,no_run
//! use colloquy_core::config::HarnessConfig;
//! use colloquy_core::report::ReportBuilder;
//! # fn build(records: Vec<colloquy_core::harness::TestRecord>) {
//! let mut builder = ReportBuilder::new();
//! builder.add_records(records);
//! builder.build().write_artifacts(&HarnessConfig::default());
//! # }
//! ```

mod aggregate;
mod html;
mod turns;

pub use aggregate::{
    AggregateReport, ReportBuilder, ScenarioOutcome, SuiteSummary, TestReport,
};
pub use html::render_html;
pub use turns::{build_turn_records, TurnRecord};
