// sheetlint CLI - upload spreadsheets to the linting service, render results,
// and call the AI spreadsheet functions from the shell.

mod analytics;
mod exit_codes;
mod render;
mod util;

use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::EnvFilter;

use sheetlint_client::{AiDispatcher, LintClient, Workbench};
use sheetlint_config::ai::{self, AiDiagnostics, ResolvedAiConfig};
use sheetlint_config::{Settings, StartupConfig};
use sheetlint_core::FileTask;

use analytics::{Analytics, ANALYTICS_TARGET};
use exit_codes::{
    ai_exit_code, EXIT_AI_KEYCHAIN_ERR, EXIT_ERROR, EXIT_LINT_CLIENT, EXIT_LINT_FAILED,
    EXIT_SUCCESS, EXIT_USAGE,
};
use render::RenderOptions;

#[derive(Parser)]
#[command(name = "sheetlint")]
#[command(about = "Lint spreadsheets with the sheet linter service")]
#[command(long_version = long_version())]
#[command(version)]
#[command(subcommand_required = false)]
struct Cli {
    /// Verbose logging (info level; RUST_LOG overrides)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload spreadsheets for linting and print the results
    #[command(after_help = "\
Exit code 20 means at least one file could not be linted; results for the
other files are still printed.

Examples:
  sheetlint lint budget.xlsx
  sheetlint lint reports/*.xlsx --json | jq '.outcomes[].status'
  sheetlint lint budget.xlsx --debug
  sheetlint lint --url https://docs.google.com/spreadsheets/d/abc --auth-payload @token.json
  sheetlint lint *.xlsx --api-base https://lint.example.com --max-in-flight 4")]
    Lint {
        /// Spreadsheet files to upload (sorted before dispatch)
        files: Vec<PathBuf>,

        /// Remote spreadsheet URL (e.g. from a Drive picker)
        #[arg(long, requires = "auth_payload")]
        url: Option<String>,

        /// Authorization payload for --url: inline JSON, or @path to a JSON file
        #[arg(long, requires = "url")]
        auth_payload: Option<String>,

        /// Display name for --url (defaults to the URL)
        #[arg(long, requires = "url")]
        name: Option<String>,

        /// Lint service origin (overrides settings and SHEETLINT_API_BASE)
        #[arg(long)]
        api_base: Option<String>,

        /// Upper bound on concurrent uploads (default: all at once)
        #[arg(long, env = "SHEETLINT_MAX_IN_FLIGHT")]
        max_in_flight: Option<usize>,

        /// Output JSON instead of text
        #[arg(long)]
        json: bool,

        /// Show the prompt sent to the model
        #[arg(long)]
        include_prompt: bool,

        /// Show prompt, raw response and token counts
        #[arg(long)]
        debug: bool,

        /// Suppress progress notes on stderr
        #[arg(long, short = 'q')]
        quiet: bool,
    },

    /// AI spreadsheet functions and configuration
    Ai {
        #[command(subcommand)]
        command: AiCommands,
    },

    /// Settings file helpers
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum AiCommands {
    /// AI_Value(query, ...cells): look up a single value
    Value {
        query: String,
        /// Cell values; JSON literals are passed as JSON, anything else as text
        cells: Vec<String>,
    },

    /// AI_List(query, count): generate a list
    List {
        query: String,
        #[arg(long)]
        count: Option<u32>,
    },

    /// AI_Table(query, headers, count): generate a table
    Table {
        query: String,
        /// Column headers (comma-separated)
        #[arg(long, value_delimiter = ',')]
        headers: Vec<String>,
        #[arg(long)]
        count: Option<u32>,
    },

    /// Check AI configuration
    Doctor {
        /// Output as JSON for machine parsing
        #[arg(long)]
        json: bool,
    },

    /// Store the AI backend key in the system keychain (reads stdin if --key is omitted)
    SetKey {
        #[arg(long)]
        key: Option<String>,
    },

    /// Remove the AI backend key from the system keychain
    DeleteKey,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the settings file path
    Path,
    /// Print the effective settings (file + environment) as JSON
    Show,
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\nbuild:   ", env!("BUILD_PROFILE"),
        "\ntarget:  ", env!("TARGET"),
        "\nendpoint: /api/sheet_linter?format=json",
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Resolved once; everything below receives it explicitly
    let settings = Settings::load().with_env_overrides(|name| std::env::var(name).ok());
    let (include_prompt, debug) = match &cli.command {
        Some(Commands::Lint { include_prompt, debug, .. }) => (*include_prompt, *debug),
        _ => (false, false),
    };
    let startup = StartupConfig::from_env(&settings, include_prompt, debug);
    let analytics = Analytics::new(&startup);

    let result = match cli.command {
        None => {
            eprintln!("Usage: sheetlint <command> [options]");
            eprintln!("       sheetlint --help for more information");
            Ok(())
        }
        Some(Commands::Lint {
            files,
            url,
            auth_payload,
            name,
            api_base,
            max_in_flight,
            json,
            include_prompt: _,
            debug: _,
            quiet,
        }) => {
            let args = LintArgs { files, url, auth_payload, name, api_base, max_in_flight, json, quiet };
            cmd_lint(args, settings, &startup, &analytics)
        }
        Some(Commands::Ai { command }) => match command {
            AiCommands::Value { query, cells } => {
                let cells = cells.iter().map(|c| parse_cell_arg(c)).collect();
                cmd_ai_call(&settings, &analytics, "value", |d| d.ai_value(&query, cells))
            }
            AiCommands::List { query, count } => {
                cmd_ai_call(&settings, &analytics, "list", |d| d.ai_list(&query, count))
            }
            AiCommands::Table { query, headers, count } => {
                let headers = serde_json::Value::from(headers);
                cmd_ai_call(&settings, &analytics, "table", |d| d.ai_table(&query, headers, count))
            }
            AiCommands::Doctor { json } => cmd_ai_doctor(&settings, json),
            AiCommands::SetKey { key } => cmd_ai_set_key(key),
            AiCommands::DeleteKey => cmd_ai_delete_key(),
        },
        Some(Commands::Config { command }) => match command {
            ConfigCommands::Path => {
                println!("{}", Settings::config_path_display());
                Ok(())
            }
            ConfigCommands::Show => cmd_config_show(&settings),
        },
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

/// Analytics events are always let through; `Analytics` itself decides
/// whether any are emitted.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let mut filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    if let Ok(directive) = format!("{}=info", ANALYTICS_TARGET).parse::<Directive>() {
        filter = filter.add_directive(directive);
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// lint
// ============================================================================

struct LintArgs {
    files: Vec<PathBuf>,
    url: Option<String>,
    auth_payload: Option<String>,
    name: Option<String>,
    api_base: Option<String>,
    max_in_flight: Option<usize>,
    json: bool,
    quiet: bool,
}

fn cmd_lint(
    args: LintArgs,
    mut settings: Settings,
    startup: &StartupConfig,
    analytics: &Analytics,
) -> Result<(), CliError> {
    if let Some(base) = args.api_base {
        settings.lint.api_base = base;
    }
    if args.max_in_flight.is_some() {
        settings.lint.max_in_flight = args.max_in_flight;
    }

    let mut tasks: Vec<FileTask> = args.files.into_iter().map(FileTask::from_path).collect();
    if let Some(url) = args.url {
        let raw = args.auth_payload.unwrap_or_default();
        let payload = parse_auth_payload(&raw)?;
        let name = args.name.unwrap_or_else(|| url.clone());
        tasks.push(FileTask::remote(name, url, payload));
    }

    let client = LintClient::from_settings(&settings)
        .map_err(|e| CliError::new(EXIT_LINT_CLIENT, e.to_string()))?;

    let mut bench = Workbench::new();
    let added = bench.drop_tasks(&client, tasks);
    if added == 0 {
        if !args.quiet {
            eprintln!("note: nothing to lint (no files given)");
        }
        return Ok(());
    }
    if !args.quiet {
        eprintln!(
            "Linted {} ({} file(s)) via {}",
            bench.title().unwrap_or_default(),
            added,
            client.endpoint_url()
        );
    }

    let failed = bench.results().failure_count();

    analytics.track(
        "batch_linted",
        serde_json::json!({ "files": added, "failed": failed }),
    );

    let opts = RenderOptions { show_diagnostics: startup.show_diagnostics };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if args.json {
        let report = render::render_json(bench.outcomes(), &opts);
        let text = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(e.to_string()))?;
        writeln!(handle, "{}", text).map_err(|e| CliError::io(e.to_string()))?;
    } else {
        write!(handle, "{}", render::render_text(bench.outcomes(), &opts))
            .map_err(|e| CliError::io(e.to_string()))?;
    }

    if failed > 0 {
        // Results are already printed; only the exit code carries the failure
        return Err(CliError::new(
            EXIT_LINT_FAILED,
            format!("{} of {} file(s) could not be linted", failed, added),
        ));
    }
    Ok(())
}

/// Parse `--auth-payload`: inline JSON, or `@path` to a JSON file.
fn parse_auth_payload(raw: &str) -> Result<serde_json::Value, CliError> {
    let (source, text) = match raw.strip_prefix('@') {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| CliError::args(format!("cannot read auth payload {}: {}", path, e)))?;
            (path.to_string(), text)
        }
        None => ("--auth-payload".to_string(), raw.to_string()),
    };

    serde_json::from_str(&text).map_err(|e| {
        CliError::args(format!("{} is not valid JSON: {}", source, e))
            .with_hint("pass the picker's authorization object, e.g. '{\"access_token\":\"...\"}'")
    })
}

/// Cell argument for AI_Value: JSON literal if it parses, text otherwise.
fn parse_cell_arg(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

// ============================================================================
// ai
// ============================================================================

fn cmd_ai_call(
    settings: &Settings,
    analytics: &Analytics,
    method: &str,
    call: impl FnOnce(&AiDispatcher) -> Result<serde_json::Value, sheetlint_client::AiError>,
) -> Result<(), CliError> {
    let config = ResolvedAiConfig::from_settings(&settings.ai);
    let dispatcher = AiDispatcher::from_config(&config).map_err(|e| {
        CliError::new(ai_exit_code(&e), e.to_string())
            .with_hint("set ai.endpoint in settings.json or SHEETLINT_AI_ENDPOINT")
    })?;

    let result = call(&dispatcher);
    analytics.track(
        "ai_call",
        serde_json::json!({ "method": dispatcher.method_name(method), "ok": result.is_ok() }),
    );

    let value = result.map_err(|e| CliError::new(ai_exit_code(&e), e.to_string()))?;
    let text = serde_json::to_string_pretty(&value).map_err(|e| CliError::io(e.to_string()))?;
    println!("{}", text);
    Ok(())
}

fn cmd_ai_doctor(settings: &Settings, json: bool) -> Result<(), CliError> {
    let config = ResolvedAiConfig::from_settings(&settings.ai);
    let diag = AiDiagnostics::from_resolved(&config);

    if json {
        let report = serde_json::json!({
            "schema_version": 1,
            "status": diag.status.as_str(),
            "blocking_reason": config.blocking_reason,
            "endpoint": diag.endpoint,
            "namespace": diag.namespace,
            "key": if diag.key_present { "present" } else { "missing" },
            "key_source": diag.key_source.as_str(),
            "keychain": if diag.keychain_available { "ok" } else { "unavailable" },
        });
        let text = serde_json::to_string_pretty(&report).map_err(|e| CliError::io(e.to_string()))?;
        println!("{}", text);
    } else {
        print!("{}", diag);
        if let Some(reason) = &config.blocking_reason {
            println!();
            println!("{}", reason);
            println!("  Settings file: {}", Settings::config_path_display());
        }
    }
    Ok(())
}

fn cmd_ai_set_key(key: Option<String>) -> Result<(), CliError> {
    let key = match key {
        Some(k) => k,
        None => {
            if io::stdin().is_terminal() {
                eprint!("AI backend key: ");
                io::stderr().flush().ok();
            }
            let mut buf = String::new();
            io::stdin()
                .read_line(&mut buf)
                .map_err(|e| CliError::io(e.to_string()))?;
            buf
        }
    };

    let key = key.trim();
    if key.is_empty() {
        return Err(CliError::args("No key provided").with_hint(format!("pass --key or set {}", ai::AI_KEY_ENV)));
    }

    ai::set_api_key(key).map_err(|e| CliError::new(EXIT_AI_KEYCHAIN_ERR, e))?;
    eprintln!("Stored AI backend key in system keychain");
    Ok(())
}

fn cmd_ai_delete_key() -> Result<(), CliError> {
    ai::delete_api_key().map_err(|e| CliError::new(EXIT_AI_KEYCHAIN_ERR, e))?;
    eprintln!("Removed AI backend key from system keychain");
    Ok(())
}

// ============================================================================
// config
// ============================================================================

fn cmd_config_show(settings: &Settings) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(settings).map_err(|e| CliError::io(e.to_string()))?;
    println!("{}", text);
    Ok(())
}
