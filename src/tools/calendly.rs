//! Calendly API v2.

use serde_json::{Map, Value, json};

use super::{BaseUrl, ToolSpec};
use crate::cmd::args::{FlagError, ParsedArguments};
use crate::cmd::dispatch::Route;
use crate::cmd::gate::{CredentialSpec, Credentials};
use crate::http::{Auth, RequestPlan};

pub static TOOL: ToolSpec = ToolSpec {
    name: "calendly",
    about: "Calendly scheduling API",
    env_prefix: "CALENDLY",
    base_url: BaseUrl::Fixed("https://api.calendly.com"),
    credentials: &[CredentialSpec::secret("CALENDLY_API_KEY")],
    auth: Auth::Header {
        name: "Authorization",
        prefix: "Bearer ",
        secret: "CALENDLY_API_KEY",
    },
    headers: &[],
    routes: &[
        Route {
            command: "users",
            subcommand: "me",
            summary: "Current user",
            handler: users_me,
        },
        Route {
            command: "events",
            subcommand: "list",
            summary: "List scheduled events --user [--count --status --min-start-time --max-start-time]",
            handler: events_list,
        },
        Route {
            command: "events",
            subcommand: "get",
            summary: "Get a scheduled event --uuid",
            handler: events_get,
        },
        Route {
            command: "events",
            subcommand: "cancel",
            summary: "Cancel a scheduled event --uuid [--reason]",
            handler: events_cancel,
        },
        Route {
            command: "event-types",
            subcommand: "list",
            summary: "List event types --user",
            handler: event_types_list,
        },
        Route {
            command: "invitees",
            subcommand: "list",
            summary: "List invitees --event-uuid [--count]",
            handler: invitees_list,
        },
        Route {
            command: "webhooks",
            subcommand: "list",
            summary: "List webhook subscriptions --organization [--scope --user]",
            handler: webhooks_list,
        },
        Route {
            command: "webhooks",
            subcommand: "create",
            summary: "Create a webhook --url --events a,b --organization [--scope --user]",
            handler: webhooks_create,
        },
        Route {
            command: "webhooks",
            subcommand: "delete",
            summary: "Delete a webhook --uuid",
            handler: webhooks_delete,
        },
    ],
};

const SCOPES: &[&str] = &["organization", "user"];

fn users_me(_: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/users/me"))
}

fn events_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/scheduled_events")
        .query("user", args.require("user")?)
        .query_opt("count", args.integer("count")?)
        .query_opt("status", args.one_of("status", &["active", "canceled"])?)
        .query_opt("min_start_time", args.text("min-start-time"))
        .query_opt("max_start_time", args.text("max-start-time")))
}

fn events_get(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/scheduled_events").segment(args.require("uuid")?))
}

fn events_cancel(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let mut body = Map::new();
    if let Some(reason) = args.text("reason") {
        body.insert("reason".into(), json!(reason));
    }
    Ok(RequestPlan::post("/scheduled_events")
        .segment(args.require("uuid")?)
        .segment("cancellation")
        .body(Value::Object(body)))
}

fn event_types_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/event_types").query("user", args.require("user")?))
}

fn invitees_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/scheduled_events")
        .segment(args.require("event-uuid")?)
        .segment("invitees")
        .query_opt("count", args.integer("count")?))
}

fn webhooks_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/webhook_subscriptions")
        .query("organization", args.require("organization")?)
        .query("scope", args.one_of("scope", SCOPES)?.unwrap_or("organization"))
        .query_opt("user", args.text("user")))
}

fn webhooks_create(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let mut body = Map::new();
    body.insert("url".into(), json!(args.require("url")?));
    body.insert("events".into(), json!(args.require_list("events")?));
    body.insert("organization".into(), json!(args.require("organization")?));
    body.insert(
        "scope".into(),
        json!(args.one_of("scope", SCOPES)?.unwrap_or("organization")),
    );
    if let Some(user) = args.text("user") {
        body.insert("user".into(), json!(user));
    }
    Ok(RequestPlan::post("/webhook_subscriptions").body(Value::Object(body)))
}

fn webhooks_delete(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::delete("/webhook_subscriptions").segment(args.require("uuid")?))
}
