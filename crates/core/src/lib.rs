//! Core lint types shared between the HTTP client and the CLI.
//!
//! No I/O here. Tasks describe what to upload, outcomes describe what came
//! back, and the aggregator keeps the session's history newest batch first.

pub mod aggregate;
pub mod drop;
pub mod outcome;
pub mod task;

pub use aggregate::ResultAggregator;
pub use drop::{locale_compare, DropBatch};
pub use outcome::{LintOutcome, LintResult, Problem, Severity};
pub use task::FileTask;
