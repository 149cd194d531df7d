//! Display and output formatting utilities

use crate::config::OutputFormat;
use crate::monad::CoefficientTable;
use crate::search::{AnswerPair, Solution};
use anyhow::{Context, Result};
use std::io::IsTerminal;

/// Format solutions for display
pub struct SolutionFormatter;

impl SolutionFormatter {
    /// The answers in the configured output format.
    ///
    /// Text output is exactly two lines, maximum then minimum.
    pub fn format_answers(answers: &AnswerPair, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Text => Ok(answers.lines().join("\n")),
            OutputFormat::Json => answers.to_json().context("Failed to serialize answers"),
        }
    }

    /// Format a single solution with its statistics, for diagnostics
    pub fn format_solution(solution: &Solution) -> String {
        let mut output = String::new();

        output.push_str(&format!("=== {} ===\n", solution.direction));
        output.push_str(&format!("Model number: {}\n", solution.model_number));
        output.push_str(&format!("Variables: {}\n", solution.statistics.variables));
        output.push_str(&format!("Clauses: {}\n", solution.statistics.clauses));
        output.push_str(&format!(
            "Encoded nodes: {} ({} division witnesses)\n",
            solution.statistics.encoded_nodes, solution.statistics.division_witnesses
        ));
        output.push_str(&format!("Solve calls: {}\n", solution.statistics.solve_calls));
        output.push_str(&format!(
            "Solve time: {:.3}s\n",
            solution.statistics.elapsed.as_secs_f64()
        ));

        output
    }

    /// Coefficient table followed by its push/pop balance
    pub fn format_table(table: &CoefficientTable) -> String {
        let pops = table.pop_count();
        format!(
            "{}{} push steps, {} pop steps\n",
            table,
            table.steps().len() - pops,
            pops
        )
    }
}

/// Color output utilities
pub struct ColorOutput;

impl ColorOutput {
    /// Format text with color (if terminal supports it)
    pub fn colored(text: &str, color: Color) -> String {
        if Self::supports_color() {
            format!("\x1b[{}m{}\x1b[0m", color.code(), text)
        } else {
            text.to_string()
        }
    }

    /// Check if terminal supports color; messages go to stderr
    fn supports_color() -> bool {
        color_allowed(
            std::env::var_os("NO_COLOR").is_some(),
            &std::env::var("TERM").unwrap_or_default(),
            std::io::stderr().is_terminal(),
        )
    }

    /// Format success message
    pub fn success(text: &str) -> String {
        Self::colored(text, Color::Green)
    }

    /// Format error message
    pub fn error(text: &str) -> String {
        Self::colored(text, Color::Red)
    }

    /// Format warning message
    pub fn warning(text: &str) -> String {
        Self::colored(text, Color::Yellow)
    }

    /// Format info message
    pub fn info(text: &str) -> String {
        Self::colored(text, Color::Blue)
    }
}

fn color_allowed(no_color: bool, term: &str, terminal: bool) -> bool {
    terminal && !no_color && term != "dumb"
}

#[derive(Debug, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
}

impl Color {
    fn code(self) -> u8 {
        match self {
            Color::Red => 31,
            Color::Green => 32,
            Color::Yellow => 33,
            Color::Blue => 34,
        }
    }
}
