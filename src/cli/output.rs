//! Terminal output formatting.
//!
//! Human-readable output goes to stdout with colored symbols. In JSON mode
//! every line is a `{"type", "payload"}` object so that scripts can consume
//! the stream; errors always go to stderr.

use std::fmt::Display;
use std::sync::{OnceLock, RwLock};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use serde_json::{json, Value};

/// Runtime output configuration shared by CLI handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputConfig {
    /// Emit machine-readable JSON output instead of human-readable text.
    pub json: bool,
    /// Suppress non-essential output.
    pub quiet: bool,
}

impl OutputConfig {
    #[must_use]
    pub const fn new(json: bool, quiet: bool) -> Self {
        Self { json, quiet }
    }

    /// Whether a line of `weight` reaches the terminal in human mode.
    const fn shows(self, weight: Weight) -> bool {
        match weight {
            Weight::Chatter => !self.quiet,
            Weight::Essential => true,
        }
    }
}

/// How much a human-mode line matters when `--quiet` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Weight {
    /// Decoration and progress; dropped in quiet mode.
    Chatter,
    /// Warnings and data; always printed.
    Essential,
}

static OUTPUT_CONFIG: OnceLock<RwLock<OutputConfig>> = OnceLock::new();

fn config_cell() -> &'static RwLock<OutputConfig> {
    OUTPUT_CONFIG.get_or_init(|| RwLock::new(OutputConfig::default()))
}

fn read_config() -> OutputConfig {
    match config_cell().read() {
        Ok(config) => *config,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

fn write_config(config: OutputConfig) {
    match config_cell().write() {
        Ok(mut current) => *current = config,
        Err(poisoned) => *poisoned.into_inner() = config,
    }
}

fn json_line(kind: &str, payload: Value) -> Value {
    json!({ "type": kind, "payload": payload })
}

/// Route one logical line: a JSON document, a rendered line, or nothing.
fn emit(kind: &str, payload: Value, weight: Weight, render: impl FnOnce()) {
    let config = read_config();
    if config.json {
        println!("{}", json_line(kind, payload));
    } else if config.shows(weight) {
        render();
    }
}

/// `  <symbol> <message>`, the shape of every status line.
fn status_line(symbol: impl Display, message: &str) -> String {
    format!("  {symbol} {message}")
}

/// Label padded to a fixed column so values line up.
fn labeled(label: &str, value: &str) -> String {
    format!("  {:<14} {}", label.dimmed(), value)
}

/// Apply a color only when the output is meant for a terminal.
fn styled(value: impl Display, paint: impl FnOnce(&str) -> String) -> String {
    let value = value.to_string();
    if is_json() {
        value
    } else {
        paint(&value)
    }
}

/// Apply output settings from global CLI flags.
pub fn configure(config: OutputConfig) {
    write_config(config);
}

/// Whether commands should print JSON documents instead of tables.
#[must_use]
pub fn is_json() -> bool {
    read_config().json
}

/// Print the application header with name and version.
pub fn header(version: &str) {
    emit(
        "header",
        json!({ "app": "ratearb", "version": version }),
        Weight::Chatter,
        || println!("{} {}\n", "ratearb".bold(), version.dimmed()),
    );
}

/// Print a labeled value.
pub fn field(label: &str, value: impl Display) {
    let value = value.to_string();
    emit(
        "field",
        json!({ "label": label, "value": value }),
        Weight::Chatter,
        || println!("{}", labeled(label, &value)),
    );
}

/// Print a check-marked confirmation.
pub fn success(message: &str) {
    emit("success", json!({ "message": message }), Weight::Chatter, || {
        println!("{}", status_line("✓".green(), message));
    });
}

/// Print a warning, even in quiet mode.
pub fn warning(message: &str) {
    emit("warning", json!({ "message": message }), Weight::Essential, || {
        println!("{}", status_line("⚠".yellow(), message));
    });
}

/// Print an error line to stderr.
pub fn error(message: &str) {
    if is_json() {
        eprintln!("{}", json_line("error", json!({ "message": message })));
    } else {
        eprintln!("{}", status_line("×".red(), message));
    }
}

/// Start a titled block of output.
pub fn section(title: &str) {
    emit("section", json!({ "title": title }), Weight::Chatter, || {
        println!("\n{}", title.bold());
    });
}

const BRAILLE_SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Create and start a progress spinner.
///
/// Returns a hidden progress bar in JSON or quiet mode.
pub fn spinner(message: &str) -> ProgressBar {
    let config = read_config();
    let pb = if config.json || config.quiet {
        ProgressBar::hidden()
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .tick_strings(BRAILLE_SPINNER)
            .template("  {spinner:.cyan} {msg}")
        {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(80));
        pb
    };
    pb.set_message(message.to_string());
    pb
}

fn finish_spinner(pb: &ProgressBar, kind: &str, message: &str, weight: Weight, symbol: String) {
    let config = read_config();
    if config.json {
        println!("{}", json_line(kind, json!({ "message": message })));
    }
    if config.json || !config.shows(weight) {
        pb.finish_and_clear();
    } else {
        pb.finish_with_message(format!("{symbol} {message}"));
    }
}

/// Finish a spinner with a success checkmark.
pub fn spinner_success(pb: &ProgressBar, message: &str) {
    finish_spinner(pb, "spinner_success", message, Weight::Chatter, "✓".green().to_string());
}

/// Finish a spinner with a failure mark.
pub fn spinner_fail(pb: &ProgressBar, message: &str) {
    finish_spinner(pb, "spinner_fail", message, Weight::Essential, "×".red().to_string());
}

/// Format a yield (favorable) value in green.
pub fn positive(value: impl Display) -> String {
    styled(value, |v| v.green().to_string())
}

/// Format a cost (unfavorable) value in red.
pub fn negative(value: impl Display) -> String {
    styled(value, |v| v.red().to_string())
}

/// Draw the eye to a token or venue name.
pub fn highlight(value: impl Display) -> String {
    styled(value, |v| v.cyan().to_string())
}

/// Print a dimmed explanatory line.
pub fn note(message: &str) {
    emit("note", json!({ "message": message }), Weight::Chatter, || {
        println!("  {}", message.dimmed());
    });
}

/// Print a hint with "hint:" prefix.
pub fn hint(message: &str) {
    emit("hint", json!({ "message": message }), Weight::Chatter, || {
        println!("  {}: {}", "hint".cyan().dimmed(), message.dimmed());
    });
}

/// Print multiple lines of content, each indented.
///
/// Tables are data, so they are printed in quiet mode too.
pub fn lines(content: &str) {
    emit("lines", json!({ "content": content }), Weight::Essential, || {
        for line in content.lines() {
            println!("  {line}");
        }
    });
}

/// Emit a JSON value directly (for commands that need custom JSON output).
pub fn json_output(value: Value) {
    println!("{value}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_mode_keeps_only_essential_lines() {
        let quiet = OutputConfig::new(false, true);
        assert!(!quiet.shows(Weight::Chatter));
        assert!(quiet.shows(Weight::Essential));

        let normal = OutputConfig::new(false, false);
        assert!(normal.shows(Weight::Chatter));
    }

    #[test]
    fn json_lines_carry_type_and_payload() {
        let line = json_line("note", json!({ "message": "hello" }));
        assert_eq!(line["type"], "note");
        assert_eq!(line["payload"]["message"], "hello");
    }

    #[test]
    fn status_and_field_lines_are_indented() {
        assert_eq!(status_line("!", "careful"), "  ! careful");
        let field = labeled("Interval", "24h");
        assert!(field.starts_with("  "));
        assert!(field.contains("Interval"));
        assert!(field.ends_with(" 24h"));
    }
}
