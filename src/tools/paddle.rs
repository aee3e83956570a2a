//! Paddle Billing API. Point `PADDLE_BASE_URL` at the sandbox for testing.

use serde_json::{Map, Value, json};

use super::{BaseUrl, ToolSpec};
use crate::cmd::args::{FlagError, ParsedArguments};
use crate::cmd::dispatch::Route;
use crate::cmd::gate::{CredentialSpec, Credentials};
use crate::http::{Auth, RequestPlan};

pub static TOOL: ToolSpec = ToolSpec {
    name: "paddle",
    about: "Paddle Billing API",
    env_prefix: "PADDLE",
    base_url: BaseUrl::Fixed("https://api.paddle.com"),
    credentials: &[CredentialSpec::secret("PADDLE_API_KEY")],
    auth: Auth::Header {
        name: "Authorization",
        prefix: "Bearer ",
        secret: "PADDLE_API_KEY",
    },
    headers: &[],
    routes: &[
        Route {
            command: "products",
            subcommand: "list",
            summary: "List products [--status --per-page]",
            handler: products_list,
        },
        Route {
            command: "products",
            subcommand: "get",
            summary: "Get a product --id",
            handler: products_get,
        },
        Route {
            command: "products",
            subcommand: "create",
            summary: "Create a product --name --tax-category [--description --custom-data JSON]",
            handler: products_create,
        },
        Route {
            command: "prices",
            subcommand: "list",
            summary: "List prices [--product-id --per-page]",
            handler: prices_list,
        },
        Route {
            command: "customers",
            subcommand: "list",
            summary: "List customers [--email --per-page]",
            handler: customers_list,
        },
        Route {
            command: "customers",
            subcommand: "create",
            summary: "Create a customer --email [--name]",
            handler: customers_create,
        },
        Route {
            command: "customers",
            subcommand: "update",
            summary: "Update a customer --id [--email --name --status active|archived]",
            handler: customers_update,
        },
        Route {
            command: "subscriptions",
            subcommand: "list",
            summary: "List subscriptions [--status --customer-id --per-page]",
            handler: subscriptions_list,
        },
        Route {
            command: "subscriptions",
            subcommand: "get",
            summary: "Get a subscription --id",
            handler: subscriptions_get,
        },
        Route {
            command: "subscriptions",
            subcommand: "cancel",
            summary: "Cancel a subscription --id [--effective-from next_billing_period|immediately]",
            handler: subscriptions_cancel,
        },
        Route {
            command: "transactions",
            subcommand: "list",
            summary: "List transactions [--status --customer-id --per-page]",
            handler: transactions_list,
        },
    ],
};

fn per_page(plan: RequestPlan, args: &ParsedArguments) -> Result<RequestPlan, FlagError> {
    Ok(plan.query_opt("per_page", args.integer("per-page")?))
}

/// Paddle filters take comma separated values as-is.
fn csv(args: &ParsedArguments, flag: &str) -> Option<String> {
    args.list(flag).map(|v| v.join(","))
}

fn products_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    per_page(
        RequestPlan::get("/products").query_opt("status", csv(args, "status")),
        args,
    )
}

fn products_get(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/products").segment(args.require("id")?))
}

fn products_create(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let mut body = Map::new();
    body.insert("name".into(), json!(args.require("name")?));
    body.insert("tax_category".into(), json!(args.require("tax-category")?));
    if let Some(desc) = args.text("description") {
        body.insert("description".into(), json!(desc));
    }
    if let Some(custom) = args.json("custom-data")? {
        body.insert("custom_data".into(), custom);
    }
    Ok(RequestPlan::post("/products").body(Value::Object(body)))
}

fn prices_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    per_page(
        RequestPlan::get("/prices").query_opt("product_id", csv(args, "product-id")),
        args,
    )
}

fn customers_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    per_page(
        RequestPlan::get("/customers").query_opt("email", csv(args, "email")),
        args,
    )
}

fn customers_create(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let mut body = Map::new();
    body.insert("email".into(), json!(args.require("email")?));
    if let Some(name) = args.text("name") {
        body.insert("name".into(), json!(name));
    }
    Ok(RequestPlan::post("/customers").body(Value::Object(body)))
}

fn customers_update(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let id = args.require("id")?;
    let mut body = Map::new();
    if let Some(email) = args.text("email") {
        body.insert("email".into(), json!(email));
    }
    if let Some(name) = args.text("name") {
        body.insert("name".into(), json!(name));
    }
    if let Some(status) = args.one_of("status", &["active", "archived"])? {
        body.insert("status".into(), json!(status));
    }
    if body.is_empty() {
        return Err(FlagError::Invalid {
            flag: "email".into(),
            reason: "or --name or --status required".into(),
        });
    }
    Ok(RequestPlan::patch("/customers").segment(id).body(Value::Object(body)))
}

fn subscriptions_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    per_page(
        RequestPlan::get("/subscriptions")
            .query_opt("status", csv(args, "status"))
            .query_opt("customer_id", csv(args, "customer-id")),
        args,
    )
}

fn subscriptions_get(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    Ok(RequestPlan::get("/subscriptions").segment(args.require("id")?))
}

fn subscriptions_cancel(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    let id = args.require("id")?;
    let effective = args
        .one_of("effective-from", &["next_billing_period", "immediately"])?
        .unwrap_or("next_billing_period");
    Ok(RequestPlan::post("/subscriptions")
        .segment(id)
        .segment("cancel")
        .body(json!({ "effective_from": effective })))
}

fn transactions_list(args: &ParsedArguments, _: &Credentials) -> Result<RequestPlan, FlagError> {
    per_page(
        RequestPlan::get("/transactions")
            .query_opt("status", csv(args, "status"))
            .query_opt("customer_id", csv(args, "customer-id")),
        args,
    )
}
