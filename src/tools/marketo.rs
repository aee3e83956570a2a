//! Marketo REST API (per-instance host, OAuth client credentials).

use serde_json::{Map, Value, json};

use super::{BaseUrl, ToolSpec};
use crate::cmd::args::{FlagError, ParsedArguments};
use crate::cmd::dispatch::Route;
use crate::cmd::gate::{CredentialSpec, Credentials};
use crate::http::{Auth, RequestPlan};

pub static TOOL: ToolSpec = ToolSpec {
    name: "marketo",
    about: "Marketo Engage REST API",
    env_prefix: "MARKETO",
    base_url: BaseUrl::Identifier("MARKETO_BASE_URL"),
    credentials: &[
        CredentialSpec::identifier("MARKETO_BASE_URL"),
        CredentialSpec::secret("MARKETO_CLIENT_ID"),
        CredentialSpec::secret("MARKETO_CLIENT_SECRET"),
    ],
    auth: Auth::ClientCredentials {
        token_path: "/identity/oauth/token",
        client_id: "MARKETO_CLIENT_ID",
        client_secret: "MARKETO_CLIENT_SECRET",
    },
    headers: &[],
    routes: &[
        Route {
            command: "leads",
            subcommand: "get",
            summary: "Get a lead --id [--fields a,b]",
            handler: leads_get,
        },
        Route {
            command: "leads",
            subcommand: "find",
            summary: "Find leads --filter-type --values a,b [--fields a,b]",
            handler: leads_find,
        },
        Route {
            command: "leads",
            subcommand: "upsert",
            summary: "Create/update leads --leads JSON|@file [--action --lookup-field]",
            handler: leads_upsert,
        },
        Route {
            command: "campaigns",
            subcommand: "list",
            summary: "List smart campaigns [--batch-size --name]",
            handler: campaigns_list,
        },
        Route {
            command: "campaigns",
            subcommand: "trigger",
            summary: "Trigger a campaign for leads --id --lead-ids 1,2",
            handler: campaigns_trigger,
        },
        Route {
            command: "lists",
            subcommand: "list",
            summary: "List static lists [--batch-size]",
            handler: lists_list,
        },
    ],
};

const UPSERT_ACTIONS: &[&str] = &["createOrUpdate", "createOnly", "updateOnly", "createDuplicate"];

fn leads_get(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let id = args.require("id")?;
    Ok(RequestPlan::get("/rest/v1/lead")
        .segment(format!("{id}.json"))
        .query_opt("fields", args.list("fields").map(|f| f.join(","))))
}

fn leads_find(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/rest/v1/leads.json")
        .query("filterType", args.require("filter-type")?)
        .query("filterValues", args.require_list("values")?.join(","))
        .query_opt("fields", args.list("fields").map(|f| f.join(","))))
}

fn leads_upsert(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let input = match args.require_json("leads")? {
        Value::Array(items) => Value::Array(items),
        obj @ Value::Object(_) => Value::Array(vec![obj]),
        _ => {
            return Err(FlagError::Invalid {
                flag: "leads".into(),
                reason: "must be a JSON object or array of objects".into(),
            });
        }
    };

    let mut body = Map::new();
    body.insert(
        "action".into(),
        json!(args.one_of("action", UPSERT_ACTIONS)?.unwrap_or("createOrUpdate")),
    );
    body.insert(
        "lookupField".into(),
        json!(args.text("lookup-field").unwrap_or("email")),
    );
    body.insert("input".into(), input);
    Ok(RequestPlan::post("/rest/v1/leads.json").body(Value::Object(body)))
}

fn campaigns_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/rest/v1/campaigns.json")
        .query_opt("batchSize", args.integer("batch-size")?)
        .query_opt("name", args.text("name")))
}

fn campaigns_trigger(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let id = args.require("id")?;
    let leads: Vec<Value> = args
        .integer_list("lead-ids")?
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| FlagError::Missing("lead-ids".into()))?
        .into_iter()
        .map(|id| json!({ "id": id }))
        .collect();
    Ok(RequestPlan::post("/rest/v1/campaigns")
        .segment(id)
        .segment("trigger.json")
        .body(json!({ "input": { "leads": leads } })))
}

fn lists_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/rest/v1/lists.json").query_opt("batchSize", args.integer("batch-size")?))
}
