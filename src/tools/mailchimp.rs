//! Mailchimp Marketing API v3.
//!
//! The datacenter is the suffix of the API key (`...-us21`), so the base URL
//! is derived from the credential rather than fixed.

use anyhow::{Result, bail};
use secrecy::ExposeSecret;
use serde_json::{Map, Value, json};

use super::{BaseUrl, ToolSpec};
use crate::cmd::args::{FlagError, ParsedArguments};
use crate::cmd::dispatch::Route;
use crate::cmd::gate::{CredentialSpec, Credentials};
use crate::http::{Auth, RequestPlan};

const API_KEY: &str = "MAILCHIMP_API_KEY";

pub static TOOL: ToolSpec = ToolSpec {
    name: "mailchimp",
    about: "Mailchimp Marketing API",
    env_prefix: "MAILCHIMP",
    base_url: BaseUrl::Derived {
        describe: "https://<dc>.api.mailchimp.com/3.0",
        derive: base_url,
    },
    credentials: &[CredentialSpec::secret(API_KEY)],
    auth: Auth::Basic {
        user: "anystring",
        secret: API_KEY,
    },
    headers: &[],
    routes: &[
        Route {
            command: "campaigns",
            subcommand: "list",
            summary: "List campaigns [--count --offset --status]",
            handler: campaigns_list,
        },
        Route {
            command: "campaigns",
            subcommand: "get",
            summary: "Get a campaign --id",
            handler: campaigns_get,
        },
        Route {
            command: "campaigns",
            subcommand: "send",
            summary: "Send a campaign --id",
            handler: campaigns_send,
        },
        Route {
            command: "lists",
            subcommand: "list",
            summary: "List audiences [--count --offset]",
            handler: lists_list,
        },
        Route {
            command: "lists",
            subcommand: "get",
            summary: "Get an audience --id",
            handler: lists_get,
        },
        Route {
            command: "members",
            subcommand: "list",
            summary: "List audience members --list-id [--count --offset --status]",
            handler: members_list,
        },
        Route {
            command: "members",
            subcommand: "get",
            summary: "Get a member --list-id --id (subscriber hash)",
            handler: members_get,
        },
        Route {
            command: "members",
            subcommand: "add",
            summary: "Add a member --list-id --email [--status --merge-fields JSON --tags a,b]",
            handler: members_add,
        },
    ],
};

fn base_url(credentials: &Credentials) -> Result<String> {
    let Some(key) = credentials.secret(API_KEY) else {
        bail!("{API_KEY} environment variable required");
    };
    match key.expose_secret().rsplit_once('-') {
        Some((_, dc)) if !dc.is_empty() && dc.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Ok(format!("https://{dc}.api.mailchimp.com/3.0"))
        }
        _ => bail!("{API_KEY} must end with a datacenter suffix (e.g. -us21)"),
    }
}

const MEMBER_STATUS: &[&str] = &[
    "subscribed",
    "unsubscribed",
    "cleaned",
    "pending",
    "transactional",
];

fn paged(plan: RequestPlan, args: &ParsedArguments) -> Result<RequestPlan, FlagError> {
    Ok(plan
        .query_opt("count", args.integer("count")?)
        .query_opt("offset", args.integer("offset")?))
}

fn campaigns_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let plan = paged(RequestPlan::get("/campaigns"), args)?;
    Ok(plan.query_opt("status", args.text("status")))
}

fn campaigns_get(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/campaigns").segment(args.require("id")?))
}

fn campaigns_send(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::post("/campaigns")
        .segment(args.require("id")?)
        .segment("actions")
        .segment("send"))
}

fn lists_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    paged(RequestPlan::get("/lists"), args)
}

fn lists_get(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/lists").segment(args.require("id")?))
}

fn members_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let list_id = args.require("list-id")?;
    let plan = paged(RequestPlan::get("/lists").segment(list_id).segment("members"), args)?;
    Ok(plan.query_opt("status", args.one_of("status", MEMBER_STATUS)?))
}

fn members_get(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let list_id = args.require("list-id")?;
    Ok(RequestPlan::get("/lists")
        .segment(list_id)
        .segment("members")
        .segment(args.require("id")?))
}

fn members_add(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let list_id = args.require("list-id")?;

    let mut body = Map::new();
    body.insert("email_address".into(), json!(args.require("email")?));
    body.insert(
        "status".into(),
        json!(args.one_of("status", MEMBER_STATUS)?.unwrap_or("subscribed")),
    );
    if let Some(fields) = args.json("merge-fields")? {
        body.insert("merge_fields".into(), fields);
    }
    if let Some(tags) = args.list("tags") {
        body.insert("tags".into(), json!(tags));
    }

    Ok(RequestPlan::post("/lists")
        .segment(list_id)
        .segment("members")
        .body(Value::Object(body)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::args::parse_args;
    use crate::cmd::dispatch::dispatch;

    fn creds(key: &str) -> Credentials {
        let key = key.to_string();
        Credentials::load(TOOL.credentials, move |_| Some(key.clone())).unwrap()
    }

    #[test]
    fn datacenter_from_key() {
        assert_eq!(
            base_url(&creds("0123abcd-us21")).unwrap(),
            "https://us21.api.mailchimp.com/3.0"
        );
        let err = base_url(&creds("nodatacenter")).unwrap_err();
        assert!(err.to_string().contains("datacenter suffix"));
        // the error must not echo the key
        assert!(!err.to_string().contains("nodatacenter"));
    }

    #[test]
    fn member_add_body() {
        let p = dispatch(
            &TOOL,
            &parse_args([
                "members", "add", "--list-id", "abc", "--email", "a@example.com", "--tags", "vip,beta",
            ]),
            &Credentials::default(),
        )
        .unwrap();
        assert_eq!(p.segments, vec!["lists", "abc", "members"]);
        let body = p.body.unwrap();
        assert_eq!(body["status"], json!("subscribed"));
        assert_eq!(body["tags"], json!(["vip", "beta"]));
    }

    #[test]
    fn member_status_is_checked() {
        let err = dispatch(
            &TOOL,
            &parse_args(["members", "list", "--list-id", "abc", "--status", "gone"]),
            &Credentials::default(),
        )
        .unwrap_err();
        assert!(err.to_json()["error"].as_str().unwrap().starts_with("--status must be one of"));
    }
}
