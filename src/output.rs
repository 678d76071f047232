//! Machine-readable run output
//!
//! The result goes to stdout as JSON and, when requested, is appended to a
//! GitHub Actions output file (`$GITHUB_OUTPUT`) as one output per field.

use crate::domain::ReleaseResult;
use crate::error::{ReleaseError, Result};
use serde_json::Value;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Serialize the result as pretty JSON
pub fn to_json(result: &ReleaseResult) -> Result<String> {
    serde_json::to_string_pretty(result)
        .map_err(|e| ReleaseError::config(format!("cannot serialize result: {}", e)))
}

/// Render the result in `$GITHUB_OUTPUT` format
///
/// Single-line values are written as `name=value`; values containing a newline
/// use the `name<<DELIMITER` heredoc form with a delimiter absent from the value.
pub fn to_github_output(result: &ReleaseResult) -> Result<String> {
    let value = serde_json::to_value(result)
        .map_err(|e| ReleaseError::config(format!("cannot serialize result: {}", e)))?;
    let Value::Object(fields) = value else {
        return Err(ReleaseError::config("result did not serialize to an object"));
    };

    let mut out = String::new();
    for (name, value) in fields {
        let text = match value {
            Value::String(s) => s,
            other => other.to_string(),
        };
        if text.contains('\n') || text.contains('\r') {
            let delimiter = heredoc_delimiter(&text);
            out.push_str(&format!("{}<<{}\n{}\n{}\n", name, delimiter, text, delimiter));
        } else {
            out.push_str(&format!("{}={}\n", name, text));
        }
    }
    Ok(out)
}

fn heredoc_delimiter(value: &str) -> String {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let mut attempt = 0u32;
    loop {
        let candidate = format!("ghadelimiter_{}_{}", seed, attempt);
        if !value.contains(&candidate) {
            return candidate;
        }
        attempt += 1;
    }
}

/// Append the result to a GitHub Actions output file
pub fn write_github_output(path: &Path, result: &ReleaseResult) -> Result<()> {
    let rendered = to_github_output(result)?;
    debug!(path = %path.display(), "writing GitHub Actions outputs");
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(rendered.as_bytes())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ChangeLevel;
    use tempfile::TempDir;

    fn sample() -> ReleaseResult {
        ReleaseResult {
            previous_ref: "v1.2.0".to_string(),
            previous_version: "1.2.0".to_string(),
            release_version: "1.3.0".to_string(),
            release_tag: "v1.3.0".to_string(),
            change_level: ChangeLevel::Minor,
            created_tag: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_json_field_names() {
        let json: Value = serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        assert_eq!(json["previous-ref"], "v1.2.0");
        assert_eq!(json["change-level"], "minor");
        assert_eq!(json["created-tag"], true);
        assert!(json.get("created-release").is_none());
    }

    #[test]
    fn test_github_output_single_line() {
        let out = to_github_output(&sample()).unwrap();
        assert!(out.contains("release-tag=v1.3.0\n"));
        assert!(out.contains("first-release=false\n"));
        assert!(out.contains("prerelease-hook-output=\n"));
    }

    #[test]
    fn test_github_output_multiline_uses_heredoc() {
        let result = ReleaseResult {
            prerelease_hook_output: "line one\nline two\n".to_string(),
            ..sample()
        };
        let out = to_github_output(&result).unwrap();
        let start = out.find("prerelease-hook-output<<").unwrap();
        let header = out[start..].lines().next().unwrap();
        let delimiter = header.trim_start_matches("prerelease-hook-output<<");
        assert!(out.contains(&format!(
            "{}\nline one\nline two\n\n{}\n",
            header, delimiter
        )));
    }

    #[test]
    fn test_delimiter_not_in_value() {
        let value = "ghadelimiter_";
        assert!(!value.contains(&heredoc_delimiter(value)));
    }

    #[test]
    fn test_write_github_output_appends() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output");
        std::fs::write(&path, "existing=1\n").unwrap();
        write_github_output(&path, &sample()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("existing=1\n"));
        assert!(content.contains("release-version=1.3.0\n"));
    }
}
