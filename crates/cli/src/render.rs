//! Presentation of lint outcomes.
//!
//! Both renderers are pure functions of the outcome list: rendering the
//! same list twice yields the same output.

use std::fmt::Write as _;

use sheetlint_core::{LintOutcome, LintResult};

use crate::util::{fit, indent};

const SEVERITY_WIDTH: usize = 8;
const SHEET_WIDTH: usize = 14;
const CELL_WIDTH: usize = 8;
const PROBLEM_WIDTH: usize = 48;

/// Diagnostic keys dropped from JSON output unless diagnostics are on.
const DIAGNOSTIC_KEYS: &[&str] = &[
    "prompt",
    "raw_response",
    "prompt_tokens",
    "completion_tokens",
    "total_tokens",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Include prompt, response JSON, raw response and token counts
    pub show_diagnostics: bool,
}

/// Human-readable report, newest batch first.
pub fn render_text(outcomes: &[LintOutcome], opts: &RenderOptions) -> String {
    if outcomes.is_empty() {
        return "No results.\n".to_string();
    }

    let mut out = String::new();
    for (i, outcome) in outcomes.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        render_outcome(&mut out, outcome, opts);
    }
    out
}

fn render_outcome(out: &mut String, outcome: &LintOutcome, opts: &RenderOptions) {
    let stamp = outcome.created_at().format("%Y-%m-%d %H:%M:%S UTC");
    match outcome {
        LintOutcome::Failure { file_name, error, .. } => {
            let _ = writeln!(out, "✗ {}  ({})", file_name, stamp);
            let _ = writeln!(out, "  Error: {}", error);
        }
        LintOutcome::Success { file_name, result, json_response, .. } => {
            let _ = writeln!(out, "✓ {}  ({})", file_name, stamp);
            render_result(out, result);
            if opts.show_diagnostics {
                render_diagnostics(out, result, json_response);
            }
        }
    }
}

fn render_result(out: &mut String, result: &LintResult) {
    if !result.summary.is_empty() {
        let _ = writeln!(out, "  Summary:");
        let _ = writeln!(out, "{}", indent(&result.summary, "    "));
    }

    if !result.subtables.is_empty() {
        let _ = writeln!(out, "  Sub-tables:");
        for (name, addresses) in &result.subtables {
            let _ = writeln!(out, "    {}: {}", name, addresses.join(", "));
        }
    }

    if !result.calculations.is_empty() {
        let _ = writeln!(out, "  Calculations:");
        for calc in &result.calculations {
            let _ = writeln!(out, "    - {}", calc);
        }
    }

    let (high, medium, low) = result.severity_counts();
    if result.problems.is_empty() {
        let _ = writeln!(out, "  Problems: none");
        return;
    }
    let _ = writeln!(
        out,
        "  Problems: {} (high {}, medium {}, low {})",
        result.problems.len(),
        high,
        medium,
        low
    );
    let _ = writeln!(
        out,
        "    {} {} {} {}",
        fit("SEVERITY", SEVERITY_WIDTH),
        fit("SHEET", SHEET_WIDTH),
        fit("CELL", CELL_WIDTH),
        "PROBLEM"
    );

    let detail_pad = " ".repeat(4 + SEVERITY_WIDTH + 1 + SHEET_WIDTH + 1 + CELL_WIDTH + 1);
    for p in &result.problems {
        let _ = writeln!(
            out,
            "    {} {} {} {}",
            fit(p.severity.as_str(), SEVERITY_WIDTH),
            fit(&p.sheet, SHEET_WIDTH),
            fit(&p.cell, CELL_WIDTH),
            fit(&p.problem, PROBLEM_WIDTH).trim_end()
        );
        if !p.fix.is_empty() {
            let _ = writeln!(out, "{}fix: {}", detail_pad, p.fix);
        }
        if !p.example.is_empty() {
            let _ = writeln!(out, "{}example: {}", detail_pad, p.example);
        }
    }
}

fn render_diagnostics(out: &mut String, result: &LintResult, json_response: &str) {
    let _ = writeln!(out, "  ── diagnostics ──");
    if let Some(prompt) = &result.prompt {
        let _ = writeln!(out, "  Prompt:");
        let _ = writeln!(out, "{}", indent(prompt, "    "));
    }
    let _ = writeln!(out, "  Response:");
    let _ = writeln!(out, "{}", indent(json_response, "    "));
    if let Some(raw) = &result.raw_response {
        let _ = writeln!(out, "  Raw response:");
        let _ = writeln!(out, "{}", indent(raw, "    "));
    }
    if result.prompt_tokens.is_some() || result.completion_tokens.is_some() || result.total_tokens.is_some() {
        let show = |n: Option<u64>| n.map_or_else(|| "-".to_string(), |n| n.to_string());
        let _ = writeln!(
            out,
            "  Tokens: prompt {}, completion {}, total {}",
            show(result.prompt_tokens),
            show(result.completion_tokens),
            show(result.total_tokens)
        );
    }
}

/// Machine-readable report.
pub fn render_json(outcomes: &[LintOutcome], opts: &RenderOptions) -> serde_json::Value {
    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    let items: Vec<serde_json::Value> = outcomes
        .iter()
        .map(|o| outcome_json(o, opts))
        .collect();

    serde_json::json!({
        "schema_version": 1,
        "total": outcomes.len(),
        "succeeded": succeeded,
        "failed": outcomes.len() - succeeded,
        "outcomes": items,
    })
}

fn outcome_json(outcome: &LintOutcome, opts: &RenderOptions) -> serde_json::Value {
    let mut value = serde_json::to_value(outcome).unwrap_or(serde_json::Value::Null);
    if !opts.show_diagnostics {
        if let Some(obj) = value.as_object_mut() {
            obj.remove("json_response");
            if let Some(result) = obj.get_mut("result").and_then(|r| r.as_object_mut()) {
                for key in DIAGNOSTIC_KEYS {
                    result.remove(*key);
                }
            }
        }
    }
    value
}
