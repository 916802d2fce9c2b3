//! Output formatting utilities for the CLI.

use std::time::Duration;

use comfy_table::{presets, Cell, CellAlignment, ContentArrangement, Table};
use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use serde::Serialize;

const SPINNER_TEMPLATE: &str = "[{elapsed_precise}] {spinner:.green} {msg}";
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// Trait for types that can be rendered as human-readable or JSON output.
pub trait CommandOutput: Serialize {
    fn to_human(&self) -> String;

    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

pub fn output<T: CommandOutput>(result: &T, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&result.to_json()).unwrap_or_default());
    } else {
        println!("{}", result.to_human());
    }
}

/// Truncate a string to at most `max_len` characters, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Borderless list table with uppercase headers.
pub fn list_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::NOTHING)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h.to_uppercase()).set_alignment(CellAlignment::Left)),
        );
    table
}

/// Render the table with a count line, or a "No x found." line when empty.
pub fn render_list(entity_name: &str, table: &Table, total: u64) -> String {
    if total == 0 {
        return format!("No {entity_name}s found.");
    }
    let noun = if total == 1 {
        entity_name.to_string()
    } else {
        format!("{entity_name}s")
    };
    format!("{} {noun}:\n{table}", style(total).bold())
}

pub fn colorize_status(status: &str) -> StyledObject<&str> {
    match status {
        "report_generated" => style(status).green().bold(),
        "failed" => style(status).red().bold(),
        "uploaded" | "ocr_completed" => style(status).blue(),
        _ => style(status).yellow(),
    }
}

pub fn colorize_risk(level: &str) -> StyledObject<&str> {
    match level.to_uppercase().as_str() {
        "CRITICAL" => style(level).red().bold(),
        "HIGH" => style(level).red(),
        "MEDIUM" => style(level).yellow(),
        _ => style(level).green(),
    }
}

/// Styled label for detail views.
pub fn label(name: &str) -> String {
    format!("{}{}", style(name).bold(), style(":").dim())
}

pub fn action_success(message: &str) -> String {
    format!("{} {message}", style("\u{2713}").green().bold())
}

/// Spinner for long-running steps. Hidden in JSON mode so stdout stays parseable.
pub fn create_spinner(message: impl Into<String>, json_mode: bool) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if json_mode {
        spinner.set_draw_target(ProgressDrawTarget::hidden());
    } else {
        spinner.set_draw_target(ProgressDrawTarget::stderr());
    }
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template(SPINNER_TEMPLATE) {
        spinner.set_style(spinner_style.tick_chars(SPINNER_CHARS));
    }
    spinner.set_message(message.into());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer sentence", 10), "a longe...");
        assert_eq!(truncate("§§§§§§", 5), "§§...");
    }

    #[test]
    fn test_render_list_empty() {
        let table = list_table(&["id"]);
        assert_eq!(render_list("document", &table, 0), "No documents found.");
    }

    #[test]
    fn test_render_list_counts_rows() {
        let mut table = list_table(&["id", "status"]);
        table.add_row(vec!["doc-1", "uploaded"]);
        let rendered = render_list("document", &table, 1);
        assert!(rendered.contains("document:"));
        assert!(rendered.contains("doc-1"));
        assert!(rendered.contains("STATUS"));
    }
}
