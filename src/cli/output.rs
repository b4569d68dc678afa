//! Operator-facing terminal output.
//!
//! Colored status symbols, key/value lines, rounded tables and a spinner
//! for the network round-trips a command makes before it prints.

use std::fmt::Display;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use rust_decimal::Decimal;
use tabled::settings::Style;
use tabled::{Table, Tabled};

const RULE_WIDTH: usize = 56;

const BRAILLE_SPINNER: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Print a section header and separator.
pub fn section(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(RULE_WIDTH).dimmed());
}

pub fn key_value(label: &str, value: impl Display) {
    println!("{:<14} {value}", label.dimmed());
}

pub fn ok(message: &str) {
    println!("{} {message}", "✓".green());
}

pub fn warn(message: &str) {
    println!("{} {message}", "⚠".yellow());
}

/// Print rows as an indented table, or a note when there are none.
pub fn table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    for line in table.lines() {
        println!("  {line}");
    }
}

/// Start a braille spinner labelled `message`.
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_strings(BRAILLE_SPINNER)
        .template("  {spinner:.cyan} {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Clear the spinner once its work is done.
pub fn spinner_done(pb: &ProgressBar) {
    pb.finish_and_clear();
}

/// Green for positive amounts, plain otherwise.
pub fn amount(value: Decimal) -> String {
    if value > Decimal::ZERO {
        format!("{}", value.to_string().green())
    } else {
        value.to_string()
    }
}
