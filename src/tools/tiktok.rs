//! TikTok Marketing API v1.3.
//!
//! GET endpoints take structured parameters as JSON-encoded query values
//! (`filtering`, `metrics`, ...). Every call is scoped to an advertiser, taken
//! from `TIKTOK_ADVERTISER_ID` unless `--advertiser-id` is given.

use serde_json::{Map, Value, json};

use super::{BaseUrl, ToolSpec};
use crate::cmd::args::{FlagError, ParsedArguments};
use crate::cmd::dispatch::Route;
use crate::cmd::gate::{CredentialSpec, Credentials};
use crate::http::{Auth, RequestPlan};

const ADVERTISER_ID: &str = "TIKTOK_ADVERTISER_ID";

pub static TOOL: ToolSpec = ToolSpec {
    name: "tiktok-ads",
    about: "TikTok Ads (Marketing API)",
    env_prefix: "TIKTOK",
    base_url: BaseUrl::Fixed("https://business-api.tiktok.com/open_api/v1.3"),
    credentials: &[
        CredentialSpec::secret("TIKTOK_ACCESS_TOKEN"),
        CredentialSpec::identifier(ADVERTISER_ID),
    ],
    auth: Auth::Header {
        name: "Access-Token",
        prefix: "",
        secret: "TIKTOK_ACCESS_TOKEN",
    },
    headers: &[],
    routes: &[
        Route {
            command: "campaigns",
            subcommand: "list",
            summary: "List campaigns [--page --page-size]",
            handler: campaigns_list,
        },
        Route {
            command: "campaigns",
            subcommand: "create",
            summary: "Create a campaign --name --objective [--budget-mode --budget]",
            handler: campaigns_create,
        },
        Route {
            command: "campaigns",
            subcommand: "status",
            summary: "Enable/disable/delete campaigns --ids a,b --status ENABLE|DISABLE|DELETE",
            handler: campaigns_status,
        },
        Route {
            command: "adgroups",
            subcommand: "list",
            summary: "List ad groups [--campaign-ids a,b --page --page-size]",
            handler: adgroups_list,
        },
        Route {
            command: "ads",
            subcommand: "list",
            summary: "List ads [--adgroup-ids a,b --page --page-size]",
            handler: ads_list,
        },
        Route {
            command: "reports",
            subcommand: "get",
            summary: "Synchronous report --start-date --end-date [--metrics --dimensions --data-level]",
            handler: reports_get,
        },
    ],
};

const BUDGET_MODES: &[&str] = &[
    "BUDGET_MODE_INFINITE",
    "BUDGET_MODE_DAY",
    "BUDGET_MODE_TOTAL",
];

fn advertiser<'a>(args: &'a ParsedArguments, creds: &'a Credentials) -> Result<&'a str, FlagError> {
    args.text("advertiser-id")
        .or_else(|| creds.identifier(ADVERTISER_ID))
        .ok_or_else(|| FlagError::Missing("advertiser-id".into()))
}

fn paged(plan: RequestPlan, args: &ParsedArguments) -> Result<RequestPlan, FlagError> {
    Ok(plan
        .query_opt("page", args.integer("page")?)
        .query_opt("page_size", args.integer("page-size")?))
}

/// `filtering` query value from optional id lists.
fn filtering(pairs: &[(&str, Option<Vec<String>>)]) -> Option<String> {
    let mut filter = Map::new();
    for (key, ids) in pairs {
        if let Some(ids) = ids {
            filter.insert(key.to_string(), json!(ids));
        }
    }
    (!filter.is_empty()).then(|| Value::Object(filter).to_string())
}

fn campaigns_list(args: &ParsedArguments, creds: &Credentials) -> Result<RequestPlan, FlagError> {
    let plan = RequestPlan::get("/campaign/get/").query("advertiser_id", advertiser(args, creds)?);
    paged(plan, args)
}

fn campaigns_create(args: &ParsedArguments, creds: &Credentials) -> Result<RequestPlan, FlagError> {
    let mut body = Map::new();
    body.insert("advertiser_id".into(), json!(advertiser(args, creds)?));
    body.insert("campaign_name".into(), json!(args.require("name")?));
    body.insert("objective_type".into(), json!(args.require("objective")?));
    body.insert(
        "budget_mode".into(),
        json!(
            args.one_of("budget-mode", BUDGET_MODES)?
                .unwrap_or("BUDGET_MODE_INFINITE")
        ),
    );
    if let Some(budget) = args.decimal("budget")? {
        body.insert("budget".into(), json!(budget));
    }
    Ok(RequestPlan::post("/campaign/create/").body(Value::Object(body)))
}

fn campaigns_status(args: &ParsedArguments, creds: &Credentials) -> Result<RequestPlan, FlagError> {
    let advertiser_id = advertiser(args, creds)?;
    let ids = args.require_list("ids")?;
    let status = args
        .one_of("status", &["ENABLE", "DISABLE", "DELETE"])?
        .ok_or_else(|| FlagError::Missing("status".into()))?;
    Ok(RequestPlan::post("/campaign/status/update/").body(json!({
        "advertiser_id": advertiser_id,
        "campaign_ids": ids,
        "operation_status": status,
    })))
}

fn adgroups_list(args: &ParsedArguments, creds: &Credentials) -> Result<RequestPlan, FlagError> {
    let plan = RequestPlan::get("/adgroup/get/")
        .query("advertiser_id", advertiser(args, creds)?)
        .query_opt(
            "filtering",
            filtering(&[("campaign_ids", args.list("campaign-ids"))]),
        );
    paged(plan, args)
}

fn ads_list(args: &ParsedArguments, creds: &Credentials) -> Result<RequestPlan, FlagError> {
    let plan = RequestPlan::get("/ad/get/")
        .query("advertiser_id", advertiser(args, creds)?)
        .query_opt(
            "filtering",
            filtering(&[
                ("campaign_ids", args.list("campaign-ids")),
                ("adgroup_ids", args.list("adgroup-ids")),
            ]),
        );
    paged(plan, args)
}

fn reports_get(args: &ParsedArguments, creds: &Credentials) -> Result<RequestPlan, FlagError> {
    let advertiser_id = advertiser(args, creds)?;
    let start = args.require("start-date")?;
    let end = args.require("end-date")?;
    let metrics = args
        .list("metrics")
        .unwrap_or_else(|| vec!["spend".into(), "impressions".into(), "clicks".into()]);
    let dimensions = args
        .list("dimensions")
        .unwrap_or_else(|| vec!["campaign_id".into(), "stat_time_day".into()]);

    let plan = RequestPlan::get("/report/integrated/get/")
        .query("advertiser_id", advertiser_id)
        .query("report_type", "BASIC")
        .query(
            "data_level",
            args.text("data-level").unwrap_or("AUCTION_CAMPAIGN"),
        )
        .query("dimensions", json!(dimensions))
        .query("metrics", json!(metrics))
        .query("start_date", start)
        .query("end_date", end);
    paged(plan, args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::args::parse_args;
    use crate::cmd::dispatch::dispatch;

    fn creds() -> Credentials {
        Credentials::load(TOOL.credentials, |var| match var {
            "TIKTOK_ACCESS_TOKEN" => Some("tok".into()),
            "TIKTOK_ADVERTISER_ID" => Some("7001".into()),
            _ => None,
        })
        .unwrap()
    }

    fn query(p: &RequestPlan, key: &str) -> Option<String> {
        p.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    #[test]
    fn advertiser_from_env_or_flag() {
        let p = dispatch(&TOOL, &parse_args(["campaigns", "list"]), &creds()).unwrap();
        assert_eq!(query(&p, "advertiser_id").as_deref(), Some("7001"));

        let p = dispatch(
            &TOOL,
            &parse_args(["campaigns", "list", "--advertiser-id", "42", "--page-size", "50"]),
            &creds(),
        )
        .unwrap();
        assert_eq!(query(&p, "advertiser_id").as_deref(), Some("42"));
        assert_eq!(query(&p, "page_size").as_deref(), Some("50"));
    }

    #[test]
    fn status_update_body() {
        let p = dispatch(
            &TOOL,
            &parse_args(["campaigns", "status", "--ids", "1,2", "--status", "DISABLE"]),
            &creds(),
        )
        .unwrap();
        assert_eq!(
            p.body.unwrap(),
            json!({"advertiser_id":"7001","campaign_ids":["1","2"],"operation_status":"DISABLE"})
        );
    }

    #[test]
    fn report_query_is_json_encoded() {
        let p = dispatch(
            &TOOL,
            &parse_args([
                "reports",
                "get",
                "--start-date",
                "2024-01-01",
                "--end-date",
                "2024-01-31",
                "--metrics",
                "spend,ctr",
            ]),
            &creds(),
        )
        .unwrap();
        assert_eq!(query(&p, "metrics").as_deref(), Some(r#"["spend","ctr"]"#));
        assert_eq!(
            query(&p, "dimensions").as_deref(),
            Some(r#"["campaign_id","stat_time_day"]"#)
        );
    }

    #[test]
    fn adgroup_filtering() {
        let p = dispatch(
            &TOOL,
            &parse_args(["adgroups", "list", "--campaign-ids", "9,8"]),
            &creds(),
        )
        .unwrap();
        assert_eq!(
            query(&p, "filtering").as_deref(),
            Some(r#"{"campaign_ids":["9","8"]}"#)
        );
        let p = dispatch(&TOOL, &parse_args(["adgroups", "list"]), &creds()).unwrap();
        assert!(query(&p, "filtering").is_none());
    }
}
