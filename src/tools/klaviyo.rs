//! Klaviyo (JSON:API, `revision` pinned).

use serde_json::{Map, Value, json};

use super::{BaseUrl, ToolSpec};
use crate::cmd::args::{FlagError, ParsedArguments};
use crate::cmd::dispatch::Route;
use crate::cmd::gate::{CredentialSpec, Credentials};
use crate::http::{Auth, RequestPlan};

pub static TOOL: ToolSpec = ToolSpec {
    name: "klaviyo",
    about: "Klaviyo email/SMS marketing API",
    env_prefix: "KLAVIYO",
    base_url: BaseUrl::Fixed("https://a.klaviyo.com/api"),
    credentials: &[CredentialSpec::secret("KLAVIYO_API_KEY")],
    auth: Auth::Header {
        name: "Authorization",
        prefix: "Klaviyo-API-Key ",
        secret: "KLAVIYO_API_KEY",
    },
    headers: &[("revision", "2024-10-15")],
    routes: &[
        Route {
            command: "campaigns",
            subcommand: "list",
            summary: "List campaigns [--channel email|sms]",
            handler: campaigns_list,
        },
        Route {
            command: "campaigns",
            subcommand: "get",
            summary: "Get a campaign --id",
            handler: campaigns_get,
        },
        Route {
            command: "profiles",
            subcommand: "list",
            summary: "List profiles [--page-size --cursor]",
            handler: profiles_list,
        },
        Route {
            command: "profiles",
            subcommand: "get",
            summary: "Get a profile --id",
            handler: profiles_get,
        },
        Route {
            command: "profiles",
            subcommand: "create",
            summary: "Create a profile --email [--first-name --last-name --phone --properties JSON]",
            handler: profiles_create,
        },
        Route {
            command: "lists",
            subcommand: "list",
            summary: "List lists",
            handler: lists_list,
        },
        Route {
            command: "lists",
            subcommand: "get",
            summary: "Get a list --id",
            handler: lists_get,
        },
        Route {
            command: "lists",
            subcommand: "add-profiles",
            summary: "Add profiles to a list --id --profile-ids a,b",
            handler: lists_add_profiles,
        },
        Route {
            command: "metrics",
            subcommand: "list",
            summary: "List metrics",
            handler: metrics_list,
        },
        Route {
            command: "events",
            subcommand: "create",
            summary: "Track an event --metric --email [--value --properties JSON]",
            handler: events_create,
        },
    ],
};

fn campaigns_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let channel = args.one_of("channel", &["email", "sms"])?.unwrap_or("email");
    Ok(RequestPlan::get("/campaigns")
        .query("filter", format!("equals(messages.channel,'{channel}')")))
}

fn campaigns_get(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/campaigns").segment(args.require("id")?))
}

fn profiles_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/profiles")
        .query_opt("page[size]", args.integer("page-size")?)
        .query_opt("page[cursor]", args.text("cursor")))
}

fn profiles_get(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/profiles").segment(args.require("id")?))
}

fn profiles_create(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let mut attributes = Map::new();
    attributes.insert("email".into(), json!(args.require("email")?));
    for (flag, field) in [
        ("first-name", "first_name"),
        ("last-name", "last_name"),
        ("phone", "phone_number"),
    ] {
        if let Some(v) = args.text(flag) {
            attributes.insert(field.into(), json!(v));
        }
    }
    if let Some(props) = args.json("properties")? {
        attributes.insert("properties".into(), props);
    }

    Ok(RequestPlan::post("/profiles").body(json!({
        "data": { "type": "profile", "attributes": Value::Object(attributes) }
    })))
}

fn lists_list(_: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/lists"))
}

fn lists_get(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/lists").segment(args.require("id")?))
}

fn lists_add_profiles(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let id = args.require("id")?;
    let data: Vec<Value> = args
        .require_list("profile-ids")?
        .into_iter()
        .map(|p| json!({ "type": "profile", "id": p }))
        .collect();
    Ok(RequestPlan::post("/lists")
        .segment(id)
        .segment("relationships")
        .segment("profiles")
        .body(json!({ "data": data })))
}

fn metrics_list(_: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/metrics"))
}

fn events_create(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let metric = args.require("metric")?;
    let email = args.require("email")?;

    let mut attributes = Map::new();
    attributes.insert(
        "properties".into(),
        args.json("properties")?.unwrap_or_else(|| json!({})),
    );
    if let Some(value) = args.decimal("value")? {
        attributes.insert("value".into(), json!(value));
    }
    attributes.insert(
        "metric".into(),
        json!({ "data": { "type": "metric", "attributes": { "name": metric } } }),
    );
    attributes.insert(
        "profile".into(),
        json!({ "data": { "type": "profile", "attributes": { "email": email } } }),
    );

    Ok(RequestPlan::post("/events").body(json!({
        "data": { "type": "event", "attributes": Value::Object(attributes) }
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::args::parse_args;
    use crate::cmd::dispatch::dispatch;
    use crate::http::Method;

    fn plan(tokens: &[&str]) -> RequestPlan {
        dispatch(&TOOL, &parse_args(tokens.iter().copied()), &Credentials::default()).unwrap()
    }

    #[test]
    fn campaigns_list_defaults_to_email_channel() {
        let p = plan(&["campaigns", "list"]);
        assert_eq!(p.method, Method::Get);
        assert_eq!(p.segments, vec!["campaigns"]);
        assert_eq!(
            p.query,
            vec![(
                "filter".to_string(),
                "equals(messages.channel,'email')".to_string()
            )]
        );
    }

    #[test]
    fn profile_create_body() {
        let p = plan(&[
            "profiles",
            "create",
            "--email",
            "a@example.com",
            "--first-name",
            "Ada",
            "--properties",
            r#"{"tier":"gold"}"#,
        ]);
        let attrs = &p.body.unwrap()["data"]["attributes"];
        assert_eq!(attrs["email"], json!("a@example.com"));
        assert_eq!(attrs["first_name"], json!("Ada"));
        assert_eq!(attrs["properties"]["tier"], json!("gold"));
    }

    #[test]
    fn add_profiles_keeps_order() {
        let p = plan(&["lists", "add-profiles", "--id", "L1", "--profile-ids", "p3,p1,p2"]);
        assert_eq!(p.segments, vec!["lists", "L1", "relationships", "profiles"]);
        let ids: Vec<&str> = p.body.as_ref().unwrap()["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["p3", "p1", "p2"]);
    }

    #[test]
    fn event_requires_metric() {
        let err = dispatch(
            &TOOL,
            &parse_args(["events", "create", "--email", "a@example.com"]),
            &Credentials::default(),
        )
        .unwrap_err();
        assert_eq!(err.to_json(), json!({"error": "--metric required"}));
    }
}
