//! Lint API client shared between front ends.
//!
//! This crate is the single source of truth for the wire contract with the
//! linting service (multipart upload, status mapping, response decoding)
//! and with the AI dispatch endpoint used by the spreadsheet functions.
//!
//! No retries. No timeouts. No progress bars.

pub mod ai;
mod batch;
mod client;
mod session;

pub use ai::{AiDispatcher, AiError};
pub use batch::gather;
pub use client::{
    form_fields, scrub_prompt, status_message, FormField, LintClient, LintError,
    LINT_ENDPOINT,
};
pub use session::Workbench;
