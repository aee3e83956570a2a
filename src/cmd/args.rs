/*!
`args.rs` - tool-level argument parser.

Everything after the tool name is handed here verbatim:

  <command> <subcommand> [--flag value]... [--switch]

Rules:
  - `--name value` : value is the next token unless it also starts with `--`
  - `--name`       : boolean switch (no following token, or next token is a flag)
  - anything else  : positional, kept in order

The parser is total: every token sequence yields a `ParsedArguments`.
Type coercion happens later, in the accessors below, when a handler asks
for a number / list / JSON value.
*/

use std::collections::BTreeMap;

use serde_json::Value;

use crate::cmd::shared::{parse_json_flag, split_list};

/// Value attached to a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// `--name value`
    Text(String),
    /// `--name` with no value (boolean true)
    Switch,
}

/// Flags + positionals produced from one argv slice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedArguments {
    flags: BTreeMap<String, FlagValue>,
    positionals: Vec<String>,
}

/// Errors raised when a handler reads a flag.
///
/// These are usage errors: they end up as `{"error": ...}` on stdout and never
/// abort the process.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FlagError {
    #[error("--{0} required")]
    Missing(String),

    #[error("--{flag} must be a number (got '{value}')")]
    NotANumber { flag: String, value: String },

    #[error("--{flag} is not valid JSON: {reason}")]
    InvalidJson { flag: String, reason: String },

    #[error("--{flag}: cannot read '{path}': {reason}")]
    Unreadable {
        flag: String,
        path: String,
        reason: String,
    },

    #[error("--{flag} {reason}")]
    Invalid { flag: String, reason: String },
}

/// Parse the tokens following the tool name.
pub fn parse_args<I, S>(tokens: I) -> ParsedArguments
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();
    let mut parsed = ParsedArguments::default();

    let mut i = 0;
    while i < tokens.len() {
        let tok = &tokens[i];
        if let Some(name) = tok.strip_prefix("--") {
            match tokens.get(i + 1) {
                Some(next) if !next.starts_with("--") => {
                    parsed
                        .flags
                        .insert(name.to_string(), FlagValue::Text(next.clone()));
                    i += 2;
                }
                _ => {
                    parsed.flags.insert(name.to_string(), FlagValue::Switch);
                    i += 1;
                }
            }
        } else {
            parsed.positionals.push(tok.clone());
            i += 1;
        }
    }

    parsed
}

impl ParsedArguments {
    /* ---- Raw access ---- */

    #[cfg(test)]
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.flags.get(name)
    }

    #[cfg(test)]
    pub fn flags(&self) -> &BTreeMap<String, FlagValue> {
        &self.flags
    }

    #[cfg(test)]
    pub fn positionals(&self) -> &[String] {
        &self.positionals
    }

    /// First positional (resource).
    pub fn command(&self) -> Option<&str> {
        self.positionals.first().map(String::as_str)
    }

    /// Second positional (action).
    pub fn subcommand(&self) -> Option<&str> {
        self.positionals.get(1).map(String::as_str)
    }

    /* ---- Typed access (handlers) ---- */

    /// String value of a flag. A bare switch has no text.
    pub fn text(&self, name: &str) -> Option<&str> {
        match self.flags.get(name) {
            Some(FlagValue::Text(v)) => Some(v.as_str()),
            _ => None,
        }
    }

    /// String value of a required flag.
    pub fn require(&self, name: &str) -> Result<&str, FlagError> {
        self.text(name)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| FlagError::Missing(name.to_string()))
    }

    /// Whether a boolean flag is on. `--x`, `--x true|1|yes` count as on;
    /// `--x false|0|no` and absence count as off. Any other value counts as on:
    /// `--dry-run extra` must never fall through to a live call.
    pub fn enabled(&self, name: &str) -> bool {
        match self.flags.get(name) {
            None => false,
            Some(FlagValue::Switch) => true,
            Some(FlagValue::Text(v)) => !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "false" | "0" | "no" | "n" | "off"
            ),
        }
    }

    pub fn integer(&self, name: &str) -> Result<Option<i64>, FlagError> {
        let Some(raw) = self.text(name) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| FlagError::NotANumber {
                flag: name.to_string(),
                value: raw.to_string(),
            })
    }

    pub fn decimal(&self, name: &str) -> Result<Option<f64>, FlagError> {
        let Some(raw) = self.text(name) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite())
            .map(Some)
            .ok_or_else(|| FlagError::NotANumber {
                flag: name.to_string(),
                value: raw.to_string(),
            })
    }

    /// Comma separated list, order preserved.
    pub fn list(&self, name: &str) -> Option<Vec<String>> {
        self.text(name).map(split_list)
    }

    pub fn require_list(&self, name: &str) -> Result<Vec<String>, FlagError> {
        let items = self.require(name).map(split_list)?;
        if items.is_empty() {
            return Err(FlagError::Missing(name.to_string()));
        }
        Ok(items)
    }

    /// Comma separated list of integers.
    pub fn integer_list(&self, name: &str) -> Result<Option<Vec<i64>>, FlagError> {
        let Some(items) = self.list(name) else {
            return Ok(None);
        };
        items
            .into_iter()
            .map(|s| {
                s.parse::<i64>().map_err(|_| FlagError::NotANumber {
                    flag: name.to_string(),
                    value: s,
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Some)
    }

    /// Structured flag value: inline JSON or `@path` (JSON / YAML file).
    pub fn json(&self, name: &str) -> Result<Option<Value>, FlagError> {
        match self.text(name) {
            Some(raw) => parse_json_flag(name, raw).map(Some),
            None => Ok(None),
        }
    }

    pub fn require_json(&self, name: &str) -> Result<Value, FlagError> {
        let raw = self.require(name)?;
        parse_json_flag(name, raw)
    }

    /// Restrict a flag to a fixed set of values.
    pub fn one_of(&self, name: &str, allowed: &[&str]) -> Result<Option<&str>, FlagError> {
        match self.text(name) {
            Some(v) if allowed.contains(&v) => Ok(Some(v)),
            Some(v) => Err(FlagError::Invalid {
                flag: name.to_string(),
                reason: format!("must be one of {} (got '{v}')", allowed.join("|")),
            }),
            None => Ok(None),
        }
    }
}

/* ---- Tests ---- */
#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn flag_followed_by_flag_is_switch() {
        let a = parse_args(["--a", "--b", "x"]);
        assert_eq!(a.get("a"), Some(&FlagValue::Switch));
        assert_eq!(a.get("b"), Some(&FlagValue::Text("x".into())));
        assert!(a.positionals().is_empty());
    }

    #[test]
    fn positionals_keep_order_around_flags() {
        let a = parse_args(["campaigns", "--limit", "5", "list", "--dry-run"]);
        assert_eq!(a.positionals(), ["campaigns", "list"]);
        assert_eq!(a.command(), Some("campaigns"));
        assert_eq!(a.subcommand(), Some("list"));
        assert_eq!(a.text("limit"), Some("5"));
        assert!(a.enabled("dry-run"));
    }

    #[test]
    fn trailing_flag_is_switch() {
        let a = parse_args(["x", "--verbose"]);
        assert_eq!(a.get("verbose"), Some(&FlagValue::Switch));
        assert_eq!(a.text("verbose"), None);
    }

    #[test]
    fn single_dash_values_are_values() {
        let a = parse_args(["--offset", "-5"]);
        assert_eq!(a.integer("offset").unwrap(), Some(-5));
    }

    #[test]
    fn repeated_flag_keeps_last_value() {
        let a = parse_args(["--id", "1", "--id", "2"]);
        assert_eq!(a.text("id"), Some("2"));
    }

    #[test]
    fn empty_input() {
        let a = parse_args(Vec::<String>::new());
        assert_eq!(a, ParsedArguments::default());
        assert_eq!(a.command(), None);
    }

    #[test]
    fn require_reports_flag_name() {
        let a = parse_args(["--id"]);
        let err = a.require("id").unwrap_err();
        assert_eq!(err.to_string(), "--id required");
        assert_eq!(
            parse_args(["--name", "x"]).require("email").unwrap_err(),
            FlagError::Missing("email".into())
        );
    }

    #[test]
    fn enabled_values() {
        assert!(!parse_args(["--dry-run", "false"]).enabled("dry-run"));
        assert!(!parse_args(["--dry-run", "0"]).enabled("dry-run"));
        assert!(parse_args(["--dry-run", "yes"]).enabled("dry-run"));
        assert!(parse_args(["--dry-run", "oops"]).enabled("dry-run"));
        assert!(!parse_args(["x"]).enabled("dry-run"));
    }

    #[test]
    fn number_errors_are_descriptive() {
        let a = parse_args(["--count", "ten", "--budget", "12.5"]);
        let err = a.integer("count").unwrap_err();
        assert!(err.to_string().contains("--count must be a number"));
        assert_eq!(a.decimal("budget").unwrap(), Some(12.5));
        assert_eq!(a.integer("missing").unwrap(), None);
    }

    #[test]
    fn list_splits_and_trims() {
        let a = parse_args(["--events", "a, b,,c"]);
        assert_eq!(a.list("events").unwrap(), vec!["a", "b", "c"]);
        assert!(parse_args(["--events", ","]).require_list("events").is_err());
    }

    #[test]
    fn integer_list_rejects_garbage() {
        let a = parse_args(["--lead-ids", "1,2,x"]);
        assert!(matches!(
            a.integer_list("lead-ids"),
            Err(FlagError::NotANumber { .. })
        ));
        let b = parse_args(["--lead-ids", "1,2"]);
        assert_eq!(b.integer_list("lead-ids").unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn json_flag_inline() {
        let a = parse_args(["--properties", r#"{"plan":"pro"}"#]);
        assert_eq!(a.json("properties").unwrap(), Some(json!({"plan":"pro"})));
        let bad = parse_args(["--properties", "{oops"]);
        let err = bad.json("properties").unwrap_err();
        assert!(err.to_string().starts_with("--properties is not valid JSON"));
    }

    #[test]
    fn one_of_restricts_values() {
        let a = parse_args(["--status", "ENABLE"]);
        assert_eq!(
            a.one_of("status", &["ENABLE", "DISABLE"]).unwrap(),
            Some("ENABLE")
        );
        let err = a.one_of("status", &["DELETE"]).unwrap_err();
        assert!(err.to_string().contains("must be one of DELETE"));
    }

    fn token() -> impl Strategy<Value = String> {
        prop_oneof![
            "[a-z]{1,6}",
            "--[a-z]{1,6}",
            Just("--".to_string()),
            Just("-".to_string()),
            Just(String::new()),
        ]
    }

    proptest! {
        #[test]
        fn parser_is_total_and_pairs_correctly(tokens in proptest::collection::vec(token(), 0..24)) {
            let parsed = parse_args(tokens.clone());

            // Replay the pairing rule independently.
            let mut expected_pos = Vec::new();
            let mut expected_flags = BTreeMap::new();
            let mut i = 0;
            while i < tokens.len() {
                if let Some(name) = tokens[i].strip_prefix("--") {
                    if i + 1 < tokens.len() && !tokens[i + 1].starts_with("--") {
                        expected_flags.insert(name.to_string(), FlagValue::Text(tokens[i + 1].clone()));
                        i += 2;
                    } else {
                        expected_flags.insert(name.to_string(), FlagValue::Switch);
                        i += 1;
                    }
                } else {
                    expected_pos.push(tokens[i].clone());
                    i += 1;
                }
            }
            prop_assert_eq!(parsed.positionals(), expected_pos.as_slice());
            prop_assert_eq!(parsed.flags(), &expected_flags);
        }
    }
}
