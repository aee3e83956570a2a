/*!
shared.rs - flag value coercion shared by every tool.

Focus:
  - split_list: "a, b,,c" -> ["a","b","c"]
  - parse_json_flag: inline JSON or `@path` (.json / .yaml / .yml)
  - load_structured_file: file -> serde_json::Value

Malformed structured input is reported as a `FlagError`, never replaced by an
empty default.
*/

use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::cmd::args::FlagError;

/* ---- Lists ---- */

/// Split a comma separated flag value. Items are trimmed, empties dropped,
/// order preserved.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/* ---- Structured values ---- */

/// Parse a JSON-valued flag. A leading `@` reads the value from a file.
pub fn parse_json_flag(flag: &str, raw: &str) -> Result<Value, FlagError> {
    if let Some(path) = raw.strip_prefix('@') {
        return load_structured_file(Path::new(path)).map_err(|e| FlagError::Unreadable {
            flag: flag.to_string(),
            path: path.to_string(),
            reason: format!("{e:#}"),
        });
    }
    serde_json::from_str(raw).map_err(|e| FlagError::InvalidJson {
        flag: flag.to_string(),
        reason: e.to_string(),
    })
}

/// Load a JSON or YAML document (chosen by extension, JSON otherwise).
pub fn load_structured_file(path: &Path) -> Result<Value> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let is_yaml = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);

    if is_yaml {
        let yaml_v: serde_yaml::Value =
            serde_yaml::from_str(&raw).context("failed to parse YAML")?;
        serde_json::to_value(yaml_v).context("failed to convert YAML to JSON")
    } else {
        serde_json::from_str(&raw).context("failed to parse JSON")
    }
}

/* ---- Tests ---- */
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn split_list_trims_and_keeps_order() {
        assert_eq!(split_list("c, a ,b"), vec!["c", "a", "b"]);
        assert!(split_list(" , ").is_empty());
    }

    #[test]
    fn json_flag_from_yaml_file() {
        let mut f = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(f, "plan: pro\nseats: 3").unwrap();
        let arg = format!("@{}", f.path().display());
        let v = parse_json_flag("custom-data", &arg).unwrap();
        assert_eq!(v, json!({"plan":"pro","seats":3}));
    }

    #[test]
    fn json_flag_from_json_file() {
        let mut f = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(f, r#"[{{"email":"a@example.com"}}]"#).unwrap();
        let arg = format!("@{}", f.path().display());
        let v = parse_json_flag("leads", &arg).unwrap();
        assert_eq!(v, json!([{"email":"a@example.com"}]));
    }

    #[test]
    fn missing_file_is_descriptive() {
        let err = parse_json_flag("leads", "@/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, FlagError::Unreadable { .. }));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
