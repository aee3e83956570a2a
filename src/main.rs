use std::ffi::OsString;

use anyhow::{Context, Result};
use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};
use serde_json::Value;

mod cmd;
mod http;
mod tools;
mod utils;

use cmd::dispatch::{UsageError, tool_usage};
use cmd::{Credentials, ToolName};
use http::executor::Session;
use tools::ToolSpec;
use utils::output::{fatal, print_json};

/// martech - thin CLI wrappers for marketing / analytics / billing HTTP APIs
///
/// Layout:
///   martech [-v|-q] <tool> <command> <subcommand> [--flag value]... [--dry-run]
///   <tool> <command> <subcommand> ...      (when invoked through a symlink named after the tool)
///   martech --list-tools                   (tools, environment, routes as JSON)
///
/// Output:
///   stdout  one pretty-printed JSON value: the API response, `{status, body}`
///           for non-JSON bodies, `{error, usage?}` for usage errors, or the
///           request itself under --dry-run (secrets masked)
///   stderr  `{"error": ...}` only when credentials are missing or the request
///           could not be made; exit code 1
///
/// Environment:
///   per tool credentials (see --list-tools), <PREFIX>_BASE_URL to override
///   the API host, MARTECH_LOG for log filtering
///
/// Examples:
///   martech klaviyo campaigns list --dry-run
///   martech calendly webhooks create --url https://hooks.example --events invitee.created,invitee.canceled --organization <uri>
///   martech marketo leads find --filter-type email --values a@example.com
#[derive(Parser, Debug)]
#[command(
    name = "martech",
    version,
    author,
    about = "martech - thin CLI wrappers for marketing, analytics and billing HTTP APIs",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Log to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Silence all logging
    #[arg(short, long)]
    quiet: bool,

    /// Print every tool with its environment and routes, then exit
    #[arg(long = "list-tools")]
    list_tools: bool,

    /// API to call
    #[arg(value_enum, required_unless_present = "list_tools")]
    tool: Option<ToolName>,

    /// <command> <subcommand> [--flag value]...
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    args: Vec<String>,
}

/// Insert the tool name when the binary runs under a tool's name.
fn with_program_tool(argv: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut argv: Vec<OsString> = argv.into_iter().collect();
    if let Some(tool) = argv.first().and_then(|p| ToolName::from_program(p)) {
        argv.insert(1, OsString::from(tool.to_string()));
    }
    argv
}

/// What to do with a command line clap rejected.
#[derive(Debug)]
enum Rejected {
    /// `--help` / `--version`: let clap print and exit 0.
    Display(clap::Error),
    /// Missing or unknown tool: a usage value on stdout, exit 0.
    Usage(UsageError),
    /// Anything else: `{"error": ...}` on stderr, exit 1.
    Fatal(String),
}

fn classify(err: clap::Error) -> Rejected {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Rejected::Display(err),
        ErrorKind::MissingRequiredArgument => Rejected::Usage(UsageError::MissingTool {
            usage: tool_usage(),
        }),
        ErrorKind::InvalidValue if is_tool_arg(&err) => {
            let tool = match err.get(ContextKind::InvalidValue) {
                Some(ContextValue::String(v)) => v.clone(),
                _ => String::new(),
            };
            Rejected::Usage(UsageError::UnknownTool {
                tool,
                usage: tool_usage(),
            })
        }
        _ => Rejected::Fatal(first_line(&err)),
    }
}

fn is_tool_arg(err: &clap::Error) -> bool {
    matches!(err.get(ContextKind::InvalidArg), Some(ContextValue::String(a)) if a.contains("TOOL"))
}

/// clap's message without the `error: ` lead or the help hint.
fn first_line(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let line = rendered.lines().next().unwrap_or_default();
    line.strip_prefix("error: ").unwrap_or(line).trim().to_string()
}

fn main() {
    let cli = match Cli::try_parse_from(with_program_tool(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => match classify(e) {
            Rejected::Display(e) => e.exit(),
            Rejected::Usage(usage) => {
                print_json(&usage.to_json());
                return;
            }
            Rejected::Fatal(msg) => fatal(msg),
        },
    };

    utils::init_logging(utils::derive_level(cli.verbose, cli.quiet));

    if cli.list_tools {
        print_json(&tools::catalog());
        return;
    }

    let Some(tool) = cli.tool else {
        fatal("tool required");
    };
    let spec = tool.spec();

    // Credential gate: nothing else runs without the full set.
    let credentials = match Credentials::from_env(spec.credentials) {
        Ok(c) => c,
        Err(e) => fatal(e),
    };

    match run(spec, credentials, cli.args) {
        Ok(value) => print_json(&value),
        Err(e) => fatal(format!("{e:#}")),
    }
}

/// Everything after the gate; any `Err` here ends as exit 1.
fn run(spec: &'static ToolSpec, credentials: Credentials, args: Vec<String>) -> Result<Value> {
    let override_url = std::env::var(spec.base_url_var()).ok();
    let base_url = spec.resolve_base_url(&credentials, override_url)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    rt.block_on(async {
        let session = Session::new(spec, credentials, base_url)?;
        cmd::execute(&session, args).await
    })
}
