//! Major-version suffix checks for Go module files
//!
//! A module at major version 2 or above must end its path in `/vN`; modules at
//! major 0 or 1 must not carry a suffix at all.

use crate::error::{ReleaseError, Result};
use semver::Version;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Extract the module path from the contents of a `go.mod` file.
///
/// Accepts the single-line form (`module example.com/m`), quoted paths and the
/// parenthesized block form. `//` comments are ignored.
pub fn parse_module_path(content: &str) -> std::result::Result<String, String> {
    let mut in_block = false;
    let mut found: Option<String> = None;

    for raw in content.lines() {
        let line = match raw.find("//") {
            Some(idx) => &raw[..idx],
            None => raw,
        }
        .trim();
        if line.is_empty() {
            continue;
        }

        if in_block {
            if line == ")" {
                in_block = false;
                continue;
            }
            set_once(&mut found, unquote(line)?)?;
            continue;
        }

        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        if !rest.is_empty() && !rest.starts_with(|c: char| c.is_whitespace() || c == '(') {
            // e.g. `modules` is not the directive
            continue;
        }
        let rest = rest.trim();
        if rest == "(" {
            in_block = true;
        } else if rest.is_empty() {
            return Err("module directive without a path".to_string());
        } else {
            set_once(&mut found, unquote(rest)?)?;
        }
    }

    if in_block {
        return Err("unterminated module block".to_string());
    }
    found.ok_or_else(|| "no module directive".to_string())
}

fn set_once(slot: &mut Option<String>, path: String) -> std::result::Result<(), String> {
    if slot.is_some() {
        return Err("repeated module directive".to_string());
    }
    *slot = Some(path);
    Ok(())
}

fn unquote(s: &str) -> std::result::Result<String, String> {
    let s = s.trim();
    for quote in ['"', '`'] {
        if let Some(inner) = s.strip_prefix(quote) {
            return inner
                .strip_suffix(quote)
                .map(str::to_string)
                .ok_or_else(|| format!("unterminated quoted module path {}", s));
        }
    }
    if s.contains(char::is_whitespace) {
        return Err(format!("unexpected text after module path: {}", s));
    }
    Ok(s.to_string())
}

/// The trailing `/vN` segment of a module path, or `""` when there is none
pub fn version_suffix(module: &str) -> &str {
    match module.rsplit_once('/') {
        Some((_, last)) if is_major_segment(last) => last,
        _ => "",
    }
}

fn is_major_segment(segment: &str) -> bool {
    segment
        .strip_prefix('v')
        .is_some_and(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
}

/// The suffix a module released at `version` must carry
pub fn wanted_suffix(version: &Version) -> String {
    if version.major > 1 {
        format!("v{}", version.major)
    } else {
        String::new()
    }
}

/// Check that a module path matches the release's major version
pub fn check_module_path(module: &str, version: &Version) -> Result<()> {
    let found = version_suffix(module);
    let want = wanted_suffix(version);
    if found != want {
        return Err(ReleaseError::ModuleSuffix {
            module: module.to_string(),
            found: found.to_string(),
            want,
        });
    }
    Ok(())
}

/// Read `rel_path` under `checkout_dir` and check its module path against `version`
pub fn validate_module_file(checkout_dir: &Path, rel_path: &Path, version: &Version) -> Result<()> {
    let path = checkout_dir.join(rel_path);
    debug!(path = %path.display(), version = %version, "validating module file");

    let content = fs::read_to_string(&path).map_err(|e| ReleaseError::ModuleFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let module = parse_module_path(&content).map_err(|reason| ReleaseError::ModuleFile {
        path: path.display().to_string(),
        reason,
    })?;
    check_module_path(&module, version)
}
