/*!
gate.rs - credential gate.

Each tool names the environment variables it needs. They are all read at
process start; if one is missing or empty nothing else happens (main prints
the error on stderr and exits 1).

Two kinds:
  - Secret      : API keys, tokens, client secrets. Held as `SecretString`,
                  only exposed when a live request is built.
  - Identifier  : account ids, instance URLs. Plain text, may appear in URLs
                  and dry-run output.
*/

use std::collections::BTreeMap;
use std::fmt;

use secrecy::SecretString;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    Secret,
    Identifier,
}

/// One required environment variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CredentialSpec {
    pub var: &'static str,
    pub kind: CredentialKind,
}

impl CredentialSpec {
    pub const fn secret(var: &'static str) -> Self {
        Self {
            var,
            kind: CredentialKind::Secret,
        }
    }

    pub const fn identifier(var: &'static str) -> Self {
        Self {
            var,
            kind: CredentialKind::Identifier,
        }
    }
}

/// Required variables that were unset or empty (in declaration order).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingCredentials(pub Vec<&'static str>);

impl fmt::Display for MissingCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&missing_message(&self.0))
    }
}

impl std::error::Error for MissingCredentials {}

fn missing_message(vars: &[&str]) -> String {
    match vars {
        [] => "credentials required".to_string(),
        [one] => format!("{one} environment variable required"),
        [init @ .., last] => format!(
            "{} and {last} environment variables required",
            init.join(", ")
        ),
    }
}

/// Credential values for one tool, loaded once per process.
#[derive(Debug, Default)]
pub struct Credentials {
    secrets: BTreeMap<&'static str, SecretString>,
    identifiers: BTreeMap<&'static str, String>,
}

impl Credentials {
    /// Read every required variable from the process environment.
    pub fn from_env(specs: &[CredentialSpec]) -> Result<Self, MissingCredentials> {
        Self::load(specs, |var| std::env::var(var).ok())
    }

    /// Read every required variable through `lookup`. Either all are present
    /// or none are kept.
    pub fn load<F>(specs: &[CredentialSpec], lookup: F) -> Result<Self, MissingCredentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut creds = Credentials::default();
        let mut missing = Vec::new();

        for spec in specs {
            match lookup(spec.var).filter(|v| !v.trim().is_empty()) {
                Some(value) => match spec.kind {
                    CredentialKind::Secret => {
                        creds.secrets.insert(spec.var, SecretString::from(value));
                    }
                    CredentialKind::Identifier => {
                        creds.identifiers.insert(spec.var, value.trim().to_string());
                    }
                },
                None => missing.push(spec.var),
            }
        }

        if missing.is_empty() {
            tracing::debug!(
                secrets = creds.secrets.len(),
                identifiers = creds.identifiers.len(),
                "credentials loaded"
            );
            Ok(creds)
        } else {
            Err(MissingCredentials(missing))
        }
    }

    /// Non-secret value (account id, instance URL).
    pub fn identifier(&self, var: &str) -> Option<&str> {
        self.identifiers.get(var).map(String::as_str)
    }

    /// Secret value. Only the live request path calls this.
    pub(crate) fn secret(&self, var: &str) -> Option<&SecretString> {
        self.secrets.get(var)
    }
}

/* ---- Tests ---- */
#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    const SPECS: &[CredentialSpec] = &[
        CredentialSpec::secret("TIKTOK_ACCESS_TOKEN"),
        CredentialSpec::identifier("TIKTOK_ADVERTISER_ID"),
    ];

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn all_present() {
        let creds = Credentials::load(
            SPECS,
            env(&[
                ("TIKTOK_ACCESS_TOKEN", "tok-123"),
                ("TIKTOK_ADVERTISER_ID", " 700 "),
            ]),
        )
        .unwrap();
        assert_eq!(creds.identifier("TIKTOK_ADVERTISER_ID"), Some("700"));
        assert_eq!(
            creds.secret("TIKTOK_ACCESS_TOKEN").unwrap().expose_secret(),
            "tok-123"
        );
        assert!(creds.identifier("TIKTOK_ACCESS_TOKEN").is_none());
    }

    #[test]
    fn single_missing_message() {
        let err = Credentials::load(SPECS, env(&[("TIKTOK_ADVERTISER_ID", "700")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "TIKTOK_ACCESS_TOKEN environment variable required"
        );
    }

    #[test]
    fn empty_counts_as_missing_and_messages_compose() {
        let err = Credentials::load(SPECS, env(&[("TIKTOK_ACCESS_TOKEN", "  ")])).unwrap_err();
        assert_eq!(err.0, vec!["TIKTOK_ACCESS_TOKEN", "TIKTOK_ADVERTISER_ID"]);
        assert_eq!(
            err.to_string(),
            "TIKTOK_ACCESS_TOKEN and TIKTOK_ADVERTISER_ID environment variables required"
        );
    }

    #[test]
    fn three_missing_uses_commas() {
        assert_eq!(
            missing_message(&["A", "B", "C"]),
            "A, B and C environment variables required"
        );
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let creds = Credentials::load(
            SPECS,
            env(&[
                ("TIKTOK_ACCESS_TOKEN", "super-secret-value"),
                ("TIKTOK_ADVERTISER_ID", "700"),
            ]),
        )
        .unwrap();
        assert!(!format!("{creds:?}").contains("super-secret-value"));
    }
}
