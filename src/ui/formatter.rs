//! Pure formatting functions for UI output.
//!
//! Everything here writes to stderr; stdout is reserved for the JSON result.

use crate::domain::{ChangeLevel, ReleaseResult};
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    eprintln!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    eprintln!("{} {}", style("→").yellow(), message);
}

fn level_label(level: ChangeLevel) -> String {
    match level {
        ChangeLevel::Major => style(level).red().bold().to_string(),
        ChangeLevel::Minor => style(level).yellow().to_string(),
        ChangeLevel::Patch => style(level).green().to_string(),
        ChangeLevel::None => style(level).dim().to_string(),
    }
}

/// Build the lines of the run summary.
///
/// Kept separate from printing so the content can be checked without a terminal.
pub fn summary_lines(result: &ReleaseResult) -> Vec<String> {
    let mut lines = vec![style("Release summary").bold().to_string()];

    if result.first_release {
        lines.push("  Previous: none (first release)".to_string());
    } else {
        lines.push(format!("  Previous: {}", result.previous_ref));
    }
    lines.push(format!("  Change:   {}", level_label(result.change_level)));

    if result.release_tag.is_empty() {
        lines.push("  Next:     -".to_string());
    } else {
        lines.push(format!("  Next:     {}", style(&result.release_tag).green()));
    }
    lines
}

/// Print the run summary.
pub fn display_summary(result: &ReleaseResult) {
    for line in summary_lines(result) {
        eprintln!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopReason;

    fn plain(lines: Vec<String>) -> Vec<String> {
        lines
            .into_iter()
            .map(|l| console::strip_ansi_codes(&l).into_owned())
            .collect()
    }

    #[test]
    fn test_summary_full_release() {
        let result = ReleaseResult {
            previous_ref: "v1.2.0".to_string(),
            release_tag: "v1.3.0".to_string(),
            release_version: "1.3.0".to_string(),
            change_level: ChangeLevel::Minor,
            created_tag: true,
            created_release: true,
            ..Default::default()
        };
        let lines = plain(summary_lines(&result));
        assert!(lines.contains(&"  Previous: v1.2.0".to_string()));
        assert!(lines.contains(&"  Change:   minor".to_string()));
        assert!(lines.contains(&"  Next:     v1.3.0".to_string()));
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn test_summary_stopped() {
        let result = ReleaseResult::default().stopped(StopReason::NoChanges);
        let lines = plain(summary_lines(&result));
        assert!(lines.contains(&"  Next:     -".to_string()));
    }

    #[test]
    fn test_summary_first_release() {
        let result = ReleaseResult {
            first_release: true,
            release_tag: "v0.1.0".to_string(),
            ..Default::default()
        };
        let lines = plain(summary_lines(&result));
        assert!(lines.contains(&"  Previous: none (first release)".to_string()));
    }

    #[test]
    fn test_display_functions() {
        // Visual verification test - output is printed to stderr
        display_error("test error");
        display_success("test success");
        display_status("test status");
    }
}
