//! Tool registry.
//!
//! A tool is data: base URL, required environment, auth scheme, fixed headers
//! and a route table. Everything else (parsing, dispatch, sending) is shared.
//!
//! klaviyo / mailchimp / calendly / tiktok-ads / paddle / marketo

pub mod calendly;
pub mod klaviyo;
pub mod mailchimp;
pub mod marketo;
pub mod paddle;
pub mod tiktok;

use anyhow::{Result, bail};
use serde_json::{Value, json};

use crate::cmd::ToolName;
use crate::cmd::dispatch::Route;
use crate::cmd::gate::{CredentialSpec, Credentials};
use crate::http::Auth;

/// Where a tool's API lives.
#[derive(Clone, Copy)]
pub enum BaseUrl {
    Fixed(&'static str),
    /// Taken from an identifier credential (per-instance APIs).
    Identifier(&'static str),
    /// Computed from credentials (e.g. a datacenter suffix on the key).
    Derived {
        describe: &'static str,
        derive: fn(&Credentials) -> Result<String>,
    },
}

impl BaseUrl {
    pub fn describe(&self) -> &'static str {
        match *self {
            BaseUrl::Fixed(url) => url,
            BaseUrl::Identifier(var) => var,
            BaseUrl::Derived { describe, .. } => describe,
        }
    }
}

/// Static description of one wrapped API.
pub struct ToolSpec {
    pub name: &'static str,
    pub about: &'static str,
    /// Prefix for optional settings, e.g. `<PREFIX>_BASE_URL`.
    pub env_prefix: &'static str,
    pub base_url: BaseUrl,
    pub credentials: &'static [CredentialSpec],
    pub auth: Auth,
    pub headers: &'static [(&'static str, &'static str)],
    pub routes: &'static [Route],
}

impl ToolSpec {
    /// Name of the environment variable that overrides the base URL.
    pub fn base_url_var(&self) -> String {
        format!("{}_BASE_URL", self.env_prefix)
    }

    /// Base URL: explicit override, else the tool's own rule.
    pub fn resolve_base_url(
        &self,
        credentials: &Credentials,
        override_url: Option<String>,
    ) -> Result<String> {
        if let Some(url) = override_url.filter(|u| !u.trim().is_empty()) {
            tracing::debug!(tool = self.name, url = %url, "base URL overridden");
            return Ok(url.trim().to_string());
        }
        match self.base_url {
            BaseUrl::Fixed(url) => Ok(url.to_string()),
            BaseUrl::Identifier(var) => match credentials.identifier(var) {
                Some(url) => Ok(url.to_string()),
                None => bail!("{var} environment variable required"),
            },
            BaseUrl::Derived { derive, .. } => derive(credentials),
        }
    }
}

/// Every tool, in display order.
pub fn all() -> impl Iterator<Item = &'static ToolSpec> {
    ToolName::variants().iter().map(ToolName::spec)
}

/// Machine-readable listing of tools, environment and routes.
pub fn catalog() -> Value {
    let tools: Vec<Value> = all()
        .map(|t| {
            let routes: Vec<Value> = t
                .routes
                .iter()
                .map(|r| {
                    json!({
                        "command": r.command,
                        "subcommand": r.subcommand,
                        "summary": r.summary,
                    })
                })
                .collect();
            json!({
                "name": t.name,
                "about": t.about,
                "base_url": t.base_url.describe(),
                "base_url_override": t.base_url_var(),
                "environment": t.credentials,
                "routes": routes,
            })
        })
        .collect();
    json!({ "tools": tools })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::dispatch::find_route;
    use crate::cmd::gate::CredentialKind;

    #[test]
    fn route_tables_have_no_duplicates() {
        for tool in all() {
            for (i, r) in tool.routes.iter().enumerate() {
                let first = find_route(tool.routes, r.command, r.subcommand).unwrap();
                assert!(
                    std::ptr::eq(first, &tool.routes[i]),
                    "{}: duplicate route {} {}",
                    tool.name,
                    r.command,
                    r.subcommand
                );
            }
        }
    }

    #[test]
    fn auth_secrets_are_declared_secret() {
        for tool in all() {
            let declared = |var: &str| {
                tool.credentials
                    .iter()
                    .any(|c| c.var == var && c.kind == CredentialKind::Secret)
            };
            match tool.auth {
                Auth::Header { secret, .. } | Auth::Basic { secret, .. } => {
                    assert!(declared(secret), "{}: {secret}", tool.name)
                }
                Auth::ClientCredentials {
                    client_id,
                    client_secret,
                    ..
                } => {
                    assert!(declared(client_id), "{}", tool.name);
                    assert!(declared(client_secret), "{}", tool.name);
                }
            }
        }
    }

    #[test]
    fn catalog_lists_every_tool() {
        let c = catalog();
        let names: Vec<&str> = c["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(
            names,
            vec!["klaviyo", "mailchimp", "calendly", "tiktok-ads", "paddle", "marketo"]
        );
        assert_eq!(c["tools"][0]["environment"][0]["kind"], json!("secret"));
    }

    #[test]
    fn base_url_override_wins() {
        let creds = Credentials::default();
        assert_eq!(
            klaviyo::TOOL
                .resolve_base_url(&creds, Some("http://127.0.0.1:9/api".into()))
                .unwrap(),
            "http://127.0.0.1:9/api"
        );
        assert_eq!(
            klaviyo::TOOL.resolve_base_url(&creds, None).unwrap(),
            "https://a.klaviyo.com/api"
        );
        assert_eq!(klaviyo::TOOL.base_url_var(), "KLAVIYO_BASE_URL");
    }
}
