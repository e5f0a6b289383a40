use std::sync::atomic::{AtomicUsize, Ordering};

use colored::*;
use sesame_common::{ExecutionStatus, ProbeOutcome, ProbeResult};

use crate::report::ResultReporter;

/// Target of raw terminal lines. The formatter prints these without a marker.
pub const PRINT_TARGET: &str = "sesame::print";

pub const TOTAL_WIDTH: usize = 64;

const KEY_WIDTH: usize = 9;

mod colors {
    use colored::Color;

    pub const PRIMARY: Color = Color::BrightGreen;
    pub const ACCENT: Color = Color::Cyan;
    pub const SEPARATOR: Color = Color::BrightBlack;
    pub const TEXT_DEFAULT: Color = Color::White;
    pub const FAILURE: Color = Color::Red;
}

pub fn print(msg: &str) {
    tracing::info!(target: "sesame::print", "{msg}");
}

pub fn header(msg: &str) {
    let formatted: String = format!("⟦ {} ⟧", msg);
    let msg_len: usize = formatted.chars().count();

    let dash_count: usize = TOTAL_WIDTH.saturating_sub(msg_len);
    let left: usize = dash_count / 2;
    let right: usize = dash_count - left;

    let line: ColoredString = format!(
        "{}{}{}",
        "─".repeat(left),
        formatted.to_uppercase().color(colors::PRIMARY),
        "─".repeat(right)
    )
    .color(colors::SEPARATOR);

    print(&format!("{}", line));
}

pub fn tree_head(idx: usize, name: &str) {
    let idx_str: String = format!("[{}]", idx.to_string().color(colors::ACCENT));
    let output: String = format!(
        "{} {}",
        idx_str.color(colors::SEPARATOR),
        name.color(colors::PRIMARY)
    );
    print(&output);
}

pub fn as_tree_one_level(key_value_pair: Vec<(String, ColoredString)>) {
    for (i, (key, value)) in key_value_pair.iter().enumerate() {
        let last: bool = i + 1 == key_value_pair.len();
        let branch: ColoredString = if !last {
            "├─".color(colors::SEPARATOR)
        } else {
            "└─".color(colors::SEPARATOR)
        };
        let dots: String = ".".repeat(KEY_WIDTH.saturating_sub(key.len()));
        let output: String = format!(
            " {} {}{}{} {}",
            branch,
            key.color(colors::TEXT_DEFAULT),
            dots.color(colors::SEPARATOR),
            ":".color(colors::SEPARATOR),
            value
        );
        print(&output);
    }
}

/// Prints captured command output indented under a tree.
fn output_block(text: &str, color: Color) {
    for line in text.lines() {
        print(&format!("   {} {}", "│".color(colors::SEPARATOR), line.color(color)));
    }
}

/// Key/value lines describing one result, without colors.
pub fn summary(result: &ProbeResult) -> Vec<(&'static str, String)> {
    let mut lines: Vec<(&'static str, String)> = vec![("outcome", outcome_label(result.outcome()))];

    if let Some(credential) = result.credential_used() {
        lines.push(("identity", credential.identity().to_string()));
    }
    lines.push(("attempts", result.attempts().to_string()));

    if let Some(status) = result.execution() {
        lines.push(("execution", execution_label(status)));
    }
    if let Some(code) = result.output().and_then(|output| output.exit_status) {
        lines.push(("exit", code.to_string()));
    }
    if let Some(error) = result.error() {
        lines.push(("error", error.to_string()));
    }
    lines.push(("elapsed", format!("{:.2?}", result.elapsed())));

    lines
}

fn outcome_label(outcome: ProbeOutcome) -> String {
    match outcome {
        ProbeOutcome::Authenticated => "authenticated",
        ProbeOutcome::AllCandidatesExhausted => "all candidates exhausted",
        ProbeOutcome::ConnectionError => "connection error",
    }
    .to_string()
}

fn execution_label(status: &ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Completed => "completed".to_string(),
        ExecutionStatus::TimedOut => "timed out".to_string(),
        ExecutionStatus::RuntimeError(reason) => format!("runtime error ({reason})"),
        ExecutionStatus::Cancelled => "cancelled".to_string(),
    }
}

/// Prints each result as a numbered tree, optionally followed by its output.
#[derive(Debug, Default)]
pub struct TerminalReporter {
    printed: AtomicUsize,
    show_output: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, show: bool) -> Self {
        self.show_output = show;
        self
    }
}

impl ResultReporter for TerminalReporter {
    fn report(&self, result: &ProbeResult) {
        let idx: usize = self.printed.fetch_add(1, Ordering::Relaxed) + 1;
        let value_color: Color = match result.outcome() {
            ProbeOutcome::Authenticated => colors::PRIMARY,
            ProbeOutcome::AllCandidatesExhausted => colors::TEXT_DEFAULT,
            ProbeOutcome::ConnectionError => colors::FAILURE,
        };

        if idx == 1 {
            header("probe results");
        }
        tree_head(idx, &result.endpoint().to_string());
        as_tree_one_level(
            summary(result)
                .into_iter()
                .map(|(key, value)| (key.to_string(), value.color(value_color)))
                .collect(),
        );

        if self.show_output {
            if let Some(output) = result.output() {
                output_block(&output.stdout_lossy(), colors::TEXT_DEFAULT);
                output_block(&output.stderr_lossy(), colors::FAILURE);
            }
        }
    }
}
