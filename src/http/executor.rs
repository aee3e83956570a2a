/*!
executor.rs - one request per invocation.

Session (process lifetime, one tool):
  - reqwest client
  - credentials + resolved base URL
  - OAuth token slot (filled at most once, only for client-credentials tools)

execute(descriptor, dry_run):
  dry-run -> descriptor rendering (secrets masked, no network)
  live    -> [token fetch] -> send -> body text -> JSON or {status, body}

No retries, no timeout override, no pagination.
*/

use anyhow::{Context, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::{Auth, HeaderValue, RequestDescriptor, RequestPlan, SecretRef};
use crate::cmd::gate::Credentials;
use crate::tools::ToolSpec;

const USER_AGENT: &str = concat!("martech/", env!("CARGO_PKG_VERSION"));

/// Failure of the client-credentials token fetch.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// The token endpoint answered but gave no `access_token`.
    #[error("failed to obtain access token (HTTP {status})")]
    Rejected { status: u16, response: Value },

    #[error("token request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Config(String),
}

/// Everything one invocation needs to build and send requests.
pub struct Session {
    tool: &'static ToolSpec,
    credentials: Credentials,
    base_url: String,
    client: reqwest::Client,
    token: OnceCell<SecretString>,
}

impl Session {
    pub fn new(tool: &'static ToolSpec, credentials: Credentials, base_url: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            tool,
            credentials,
            base_url,
            client,
            token: OnceCell::new(),
        })
    }

    pub fn tool(&self) -> &'static ToolSpec {
        self.tool
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Resolve a handler's plan into a full descriptor for this tool.
    pub fn describe(&self, plan: RequestPlan) -> Result<RequestDescriptor> {
        RequestDescriptor::from_plan(plan, &self.base_url, &self.tool.auth, self.tool.headers)
    }

    /// Dry-run or send. Upstream errors are returned as values; only transport
    /// failures are `Err`.
    pub async fn execute(&self, desc: &RequestDescriptor, dry_run: bool) -> Result<Value> {
        if dry_run {
            debug!(method = %desc.method, url = %desc.url, "dry run, not sending");
            return Ok(desc.to_dry_run());
        }

        let token = if desc.needs_access_token() {
            match self.access_token().await {
                Ok(t) => Some(t),
                Err(TokenError::Rejected { status, response }) => {
                    warn!(status, "token endpoint returned no access_token");
                    return Ok(json!({
                        "error": "failed to obtain access token",
                        "status": status,
                        "response": response,
                    }));
                }
                Err(e) => return Err(e.into()),
            }
        } else {
            None
        };

        let mut req = self
            .client
            .request(desc.method.into(), desc.url.clone());
        for (name, value) in &desc.headers {
            let rendered = match value {
                HeaderValue::Plain(v) => v.clone(),
                HeaderValue::Secret(s) => self.resolve_secret(s, token)?,
            };
            req = req.header(name.as_str(), rendered);
        }
        if let Some(body) = &desc.body {
            req = req.body(serde_json::to_vec(body).context("Failed to serialize request body")?);
        }

        info!(method = %desc.method, url = %desc.url, "sending request");
        let resp = req
            .send()
            .await
            .with_context(|| format!("{} {} failed", desc.method, desc.url))?;
        let status = resp.status().as_u16();
        let text = resp
            .text()
            .await
            .context("Failed to read response body")?;
        debug!(status, bytes = text.len(), "response received");

        Ok(normalize_response(status, &text))
    }

    /// OAuth access token, fetched on first use and kept for the process.
    pub async fn access_token(&self) -> Result<&SecretString, TokenError> {
        self.token.get_or_try_init(|| self.fetch_token()).await
    }

    async fn fetch_token(&self) -> Result<SecretString, TokenError> {
        let Auth::ClientCredentials {
            token_path,
            client_id,
            client_secret,
        } = self.tool.auth
        else {
            return Err(TokenError::Config(format!(
                "{} does not use client credentials",
                self.tool.name
            )));
        };

        let id = self.require_secret(client_id)?;
        let secret = self.require_secret(client_secret)?;
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), token_path);

        info!(url = %url, "requesting access token");
        let resp = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", id.expose_secret()),
                ("client_secret", secret.expose_secret()),
            ])
            .send()
            .await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;

        let parsed: Option<Value> = serde_json::from_str(&text).ok();
        if let Some(token) = parsed
            .as_ref()
            .and_then(|v| v.get("access_token"))
            .and_then(|v| v.as_str())
            .filter(|t| !t.is_empty())
        {
            debug!("access token acquired");
            return Ok(SecretString::from(token.to_string()));
        }

        Err(TokenError::Rejected {
            status,
            response: parsed.unwrap_or(Value::String(text)),
        })
    }

    fn require_secret(&self, var: &str) -> Result<&SecretString, TokenError> {
        self.credentials
            .secret(var)
            .ok_or_else(|| TokenError::Config(format!("{var} environment variable required")))
    }

    fn resolve_secret(&self, secret: &SecretRef, token: Option<&SecretString>) -> Result<String> {
        match *secret {
            SecretRef::Prefixed { prefix, var } => {
                let value = self.require_secret(var)?;
                Ok(format!("{prefix}{}", value.expose_secret()))
            }
            SecretRef::Basic { user, var } => {
                let value = self.require_secret(var)?;
                let pair = format!("{user}:{}", value.expose_secret());
                Ok(format!("Basic {}", BASE64.encode(pair)))
            }
            SecretRef::AccessToken { prefix } => {
                let token = token.context("access token not acquired")?;
                Ok(format!("{prefix}{}", token.expose_secret()))
            }
        }
    }
}

/// JSON body as-is; anything else becomes `{status, body}`.
pub fn normalize_response(status: u16, text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(v) => v,
        Err(_) => json!({ "status": status, "body": text }),
    }
}

/* ---- Tests ---- */
