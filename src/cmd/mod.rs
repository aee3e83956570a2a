/*!
Per-invocation pipeline.

  argv tail -> parse_args -> dispatch -> RequestPlan -> descriptor -> execute

Layout:
  src/cmd/
    mod.rs       (this file: `execute`)
    args.rs      (ParsedArguments + typed flag access)
    shared.rs    (list / JSON / @file coercion)
    gate.rs      (credential gate)
    dispatch.rs  (route table, usage errors)
    tool.rs      (ToolName enum)

Conventions:
  - Usage problems are returned as JSON values, never as `Err`.
  - `Err` is reserved for failures the top-level boundary turns into exit 1.
*/

pub mod args;
pub mod dispatch;
pub mod gate;
pub mod shared;
pub mod tool;

use anyhow::Result;
use serde_json::Value;

use crate::http::executor::Session;

pub use args::parse_args;
pub use gate::Credentials;
pub use tool::ToolName;

/// Parse, dispatch and run one command for the session's tool.
pub async fn execute(session: &Session, tokens: Vec<String>) -> Result<Value> {
    let args = parse_args(tokens);
    let dry_run = args.enabled("dry-run");

    let plan = match dispatch::dispatch(session.tool(), &args, session.credentials()) {
        Ok(plan) => plan,
        Err(usage) => {
            tracing::debug!(?usage, "usage error");
            return Ok(usage.to_json());
        }
    };

    let desc = session.describe(plan)?;
    session.execute(&desc, dry_run).await
}
