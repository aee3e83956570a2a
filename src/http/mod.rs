//! Request model (plan -> descriptor) and dry-run rendering.
//!
//! RequestPlan       : what a handler wants (method, relative path, query, body)
//! RequestDescriptor : the planned HTTP call (absolute URL, headers, body)
//! HeaderValue       : plain text, or a reference to a secret that is only
//!                     resolved when a live request is built
//!
//! The descriptor never holds a secret, so rendering it for `--dry-run` or a
//! log line cannot leak one.
//!
pub mod executor;

use anyhow::{Context, Result};
use serde_json::{Map, Value, json};
use std::fmt;
use url::Url;

/// Fixed token shown in place of any secret.
pub const MASK: &str = "***";

/// HTTP verbs used by the tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/* ---- Plan ---- */

/// Relative request produced by a route handler.
///
/// Path segments are kept raw and percent-encoded when the URL is assembled,
/// so ids taken from flags can't escape their segment.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPlan {
    pub method: Method,
    pub segments: Vec<String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl RequestPlan {
    pub fn new(method: Method, path: &str) -> Self {
        let trimmed = path.strip_prefix('/').unwrap_or(path);
        let segments = if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').map(str::to_string).collect()
        };
        Self {
            method,
            segments,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn get(path: &str) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &str) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn patch(path: &str) -> Self {
        Self::new(Method::Patch, path)
    }

    pub fn delete(path: &str) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Append one raw path segment (encoded later).
    pub fn segment(mut self, seg: impl Into<String>) -> Self {
        self.segments.push(seg.into());
        self
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/* ---- Headers / auth ---- */

/// How a tool authenticates. Names refer to credential variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Auth {
    /// `<name>: <prefix><secret>`
    Header {
        name: &'static str,
        prefix: &'static str,
        secret: &'static str,
    },
    /// `Authorization: Basic base64(<user>:<secret>)`
    Basic {
        user: &'static str,
        secret: &'static str,
    },
    /// OAuth client-credentials grant, then `Authorization: Bearer <token>`.
    ClientCredentials {
        token_path: &'static str,
        client_id: &'static str,
        client_secret: &'static str,
    },
}

impl Auth {
    /// The credential-bearing header for this scheme.
    pub fn header(&self) -> (String, HeaderValue) {
        match *self {
            Auth::Header {
                name,
                prefix,
                secret,
            } => (
                name.to_string(),
                HeaderValue::Secret(SecretRef::Prefixed {
                    prefix,
                    var: secret,
                }),
            ),
            Auth::Basic { user, secret } => (
                "Authorization".to_string(),
                HeaderValue::Secret(SecretRef::Basic { user, var: secret }),
            ),
            Auth::ClientCredentials { .. } => (
                "Authorization".to_string(),
                HeaderValue::Secret(SecretRef::AccessToken { prefix: "Bearer " }),
            ),
        }
    }
}

/// Reference to a secret, resolved only by the executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretRef {
    Prefixed {
        prefix: &'static str,
        var: &'static str,
    },
    Basic {
        user: &'static str,
        var: &'static str,
    },
    AccessToken {
        prefix: &'static str,
    },
}

impl SecretRef {
    pub fn masked(&self) -> String {
        match self {
            SecretRef::Prefixed { prefix, .. } => format!("{prefix}{MASK}"),
            SecretRef::Basic { .. } => format!("Basic {MASK}"),
            SecretRef::AccessToken { prefix } => format!("{prefix}{MASK}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Plain(String),
    Secret(SecretRef),
}

impl HeaderValue {
    pub fn masked(&self) -> String {
        match self {
            HeaderValue::Plain(v) => v.clone(),
            HeaderValue::Secret(s) => s.masked(),
        }
    }
}

/* ---- Descriptor ---- */

/// One planned HTTP call.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, HeaderValue)>,
    pub body: Option<Value>,
}

impl RequestDescriptor {
    /// Resolve a plan against a base URL, adding the auth header and any fixed
    /// tool headers.
    pub fn from_plan(
        plan: RequestPlan,
        base_url: &str,
        auth: &Auth,
        fixed_headers: &[(&str, &str)],
    ) -> Result<Self> {
        let mut url =
            Url::parse(base_url).with_context(|| format!("Invalid base URL: '{base_url}'"))?;
        {
            let mut segs = url
                .path_segments_mut()
                .map_err(|_| anyhow::anyhow!("Base URL cannot carry a path: '{base_url}'"))?;
            segs.pop_if_empty();
            segs.extend(plan.segments.iter());
        }
        if !plan.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &plan.query {
                pairs.append_pair(k, v);
            }
        }

        let mut headers = vec![auth.header()];
        for (name, value) in fixed_headers {
            headers.push((name.to_string(), HeaderValue::Plain(value.to_string())));
        }
        headers.push((
            "Accept".to_string(),
            HeaderValue::Plain("application/json".to_string()),
        ));
        if plan.body.is_some() {
            headers.push((
                "Content-Type".to_string(),
                HeaderValue::Plain("application/json".to_string()),
            ));
        }

        Ok(Self {
            method: plan.method,
            url,
            headers,
            body: plan.body,
        })
    }

    /// Whether sending this request needs an OAuth access token first.
    pub fn needs_access_token(&self) -> bool {
        self.headers
            .iter()
            .any(|(_, v)| matches!(v, HeaderValue::Secret(SecretRef::AccessToken { .. })))
    }

    /// Dry-run rendering: the request as it would be sent, secrets masked.
    pub fn to_dry_run(&self) -> Value {
        let mut headers = Map::new();
        for (name, value) in &self.headers {
            headers.insert(name.clone(), Value::String(value.masked()));
        }

        let mut out = Map::new();
        out.insert("_dry_run".into(), Value::Bool(true));
        out.insert("method".into(), json!(self.method.as_str()));
        out.insert("url".into(), json!(self.url.as_str()));
        out.insert("headers".into(), Value::Object(headers));
        if let Some(body) = &self.body {
            out.insert("body".into(), body.clone());
        }
        Value::Object(out)
    }
}

/* ---- Tests ---- */
