/*!
dispatch.rs - two-level route lookup.

  <command> <subcommand>  ->  Route.handler(args, credentials) -> RequestPlan

Unknown or missing names never fail the process: they become a usage value
`{ "error": ..., "usage": ... }` printed like any other result. Flag problems
inside a handler become `{ "error": ... }` the same way.
*/

use serde_json::{Value, json};

use crate::cmd::args::{FlagError, ParsedArguments};
use crate::cmd::gate::Credentials;
use crate::http::RequestPlan;
use crate::tools::{self, ToolSpec};

/// Builds the request for one (command, subcommand) pair.
pub type Handler = fn(&ParsedArguments, &Credentials) -> Result<RequestPlan, FlagError>;

/// One entry of a tool's route table.
#[derive(Clone, Copy)]
pub struct Route {
    pub command: &'static str,
    pub subcommand: &'static str,
    pub summary: &'static str,
    pub handler: Handler,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("command", &self.command)
            .field("subcommand", &self.subcommand)
            .finish()
    }
}

/// Why no request was built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    MissingTool {
        usage: String,
    },
    UnknownTool {
        tool: String,
        usage: String,
    },
    MissingCommand {
        usage: String,
    },
    UnknownCommand {
        command: String,
        usage: String,
    },
    MissingSubcommand {
        command: String,
        usage: String,
    },
    UnknownSubcommand {
        command: String,
        subcommand: String,
        usage: String,
    },
    Flag(FlagError),
}

impl UsageError {
    pub fn to_json(&self) -> Value {
        match self {
            UsageError::MissingTool { usage } => json!({
                "error": "Missing tool",
                "usage": usage,
            }),
            UsageError::UnknownTool { tool, usage } => json!({
                "error": format!("Unknown tool: {tool}"),
                "usage": usage,
            }),
            UsageError::MissingCommand { usage } => json!({
                "error": "Missing command",
                "usage": usage,
            }),
            UsageError::UnknownCommand { command, usage } => json!({
                "error": format!("Unknown command: {command}"),
                "usage": usage,
            }),
            UsageError::MissingSubcommand { command, usage } => json!({
                "error": format!("Missing subcommand for {command}"),
                "usage": usage,
            }),
            UsageError::UnknownSubcommand {
                command,
                subcommand,
                usage,
            } => json!({
                "error": format!("Unknown subcommand: {command} {subcommand}"),
                "usage": usage,
            }),
            UsageError::Flag(e) => json!({ "error": e.to_string() }),
        }
    }
}

impl From<FlagError> for UsageError {
    fn from(e: FlagError) -> Self {
        UsageError::Flag(e)
    }
}

/// Distinct command names, in table order.
pub fn commands(routes: &[Route]) -> Vec<&'static str> {
    let mut out: Vec<&'static str> = Vec::new();
    for r in routes {
        if !out.contains(&r.command) {
            out.push(r.command);
        }
    }
    out
}

/// Subcommands of one command, in table order.
pub fn subcommands(routes: &[Route], command: &str) -> Vec<&'static str> {
    routes
        .iter()
        .filter(|r| r.command == command)
        .map(|r| r.subcommand)
        .collect()
}

pub fn find_route<'a>(routes: &'a [Route], command: &str, subcommand: &str) -> Option<&'a Route> {
    routes
        .iter()
        .find(|r| r.command == command && r.subcommand == subcommand)
}

/// Top-level usage, listing every tool.
pub fn tool_usage() -> String {
    let names: Vec<&str> = tools::all().map(|t| t.name).collect();
    format!(
        "martech <{}> <command> <subcommand> [--flag value]... [--dry-run]",
        names.join("|")
    )
}

fn command_usage(tool: &ToolSpec) -> String {
    format!(
        "{} <{}> <subcommand> [--flag value]... [--dry-run]",
        tool.name,
        commands(tool.routes).join("|")
    )
}

fn subcommand_usage(tool: &ToolSpec, command: &str) -> String {
    format!(
        "{} {} <{}> [--flag value]... [--dry-run]",
        tool.name,
        command,
        subcommands(tool.routes, command).join("|")
    )
}

/// Select the handler for `args` and run it.
pub fn dispatch(
    tool: &ToolSpec,
    args: &ParsedArguments,
    credentials: &Credentials,
) -> Result<RequestPlan, UsageError> {
    let Some(command) = args.command() else {
        return Err(UsageError::MissingCommand {
            usage: command_usage(tool),
        });
    };
    if !tool.routes.iter().any(|r| r.command == command) {
        return Err(UsageError::UnknownCommand {
            command: command.to_string(),
            usage: command_usage(tool),
        });
    }

    let Some(subcommand) = args.subcommand() else {
        return Err(UsageError::MissingSubcommand {
            command: command.to_string(),
            usage: subcommand_usage(tool, command),
        });
    };
    let Some(route) = find_route(tool.routes, command, subcommand) else {
        return Err(UsageError::UnknownSubcommand {
            command: command.to_string(),
            subcommand: subcommand.to_string(),
            usage: subcommand_usage(tool, command),
        });
    };

    tracing::debug!(tool = tool.name, command, subcommand, "dispatching");
    Ok((route.handler)(args, credentials)?)
}

/* ---- Tests ---- */
