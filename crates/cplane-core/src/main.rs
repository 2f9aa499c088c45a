//! cplane - mutation-contract control plane CLI
//!
//! Every subcommand reads its request from stdin and writes JSON to stdout.
//! Logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use cplane_core::{
    config::non_blank, logging, ActionError, Config, Dispatcher, EditGuard, HookPayload,
    ValidateRequest, CACHE_DIR_ENV, LOG_ENV,
};
use cplane_patch::PatchPolicy;
use cplane_store::{ArtifactStore, ExecContext, StoreConfig};
use serde::Serialize;
use tokio::io::AsyncReadExt;

/// Exit code of `hook` when the edit is blocked
const BLOCKED: u8 = 2;

/// cplane CLI
#[derive(Parser)]
#[command(name = "cplane")]
#[command(version = cplane_core::VERSION)]
#[command(about = "Artifact cache and patch mutation-contract checks")]
struct Cli {
    /// Log filter directive (falls back to RUST_LOG, then "warn")
    #[arg(long, global = true, env = LOG_ENV)]
    log: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one cache action: stdin `{"action": ..., ...}`
    Cache {
        /// Worktree the cache root is resolved against (default: current directory)
        #[arg(long)]
        worktree: Option<PathBuf>,
        /// Cache root, absolute or relative to the worktree
        #[arg(long, env = CACHE_DIR_ENV)]
        cache_dir: Option<String>,
    },

    /// Classify a patch: stdin `{"patch": ..., "max_change_percent"?, "strict"?}`
    Validate {
        /// Read a bare unified diff instead of a JSON request
        #[arg(long)]
        raw: bool,
        /// Exit 1 when the patch is invalid
        #[arg(long)]
        check: bool,
        #[command(flatten)]
        policy: PolicyArgs,
    },

    /// Pre-edit hook: stdin `{"tool": ..., "args": {"patch": ...}}`, exit 2 when blocked
    Hook {
        #[command(flatten)]
        policy: PolicyArgs,
    },
}

/// Base policy; fields present in the request take precedence
#[derive(Args)]
struct PolicyArgs {
    /// Largest accepted change per file, in percent of the original
    #[arg(long)]
    max_change_percent: Option<f64>,
    /// Do not reject formatting-only edits
    #[arg(long)]
    no_strict: bool,
}

impl PolicyArgs {
    fn policy(&self) -> PatchPolicy {
        PatchPolicy::default()
            .with_overrides(self.max_change_percent, self.no_strict.then_some(false))
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(log) = non_blank(cli.log) {
        config.log_filter = Some(log);
    }
    logging::init(config.log_filter.as_deref());

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("cplane: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: Config) -> anyhow::Result<ExitCode> {
    let input = read_stdin().await?;
    match command {
        Command::Cache {
            worktree,
            cache_dir,
        } => cache(input, worktree, cache_dir, &config).await,
        Command::Validate { raw, check, policy } => validate(&input, raw, check, &policy),
        Command::Hook { policy } => hook(&input, &policy),
    }
}

async fn read_stdin() -> anyhow::Result<String> {
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .context("reading stdin")?;
    Ok(buf)
}

async fn cache(
    input: String,
    worktree: Option<PathBuf>,
    cache_dir: Option<String>,
    config: &Config,
) -> anyhow::Result<ExitCode> {
    let worktree = match worktree {
        Some(dir) => dir,
        None => std::env::current_dir().context("resolving working directory")?,
    };
    let store_config =
        non_blank(cache_dir).map_or_else(|| config.store_config(), StoreConfig::with_root);
    let store = ArtifactStore::new(store_config, ExecContext::new(worktree));
    let dispatcher = Dispatcher::new(store);

    // store I/O is blocking
    let response = tokio::task::spawn_blocking(move || dispatcher.handle_json(&input))
        .await
        .context("cache worker failed")?;
    respond(response)
}

fn validate(input: &str, raw: bool, check: bool, args: &PolicyArgs) -> anyhow::Result<ExitCode> {
    let request = if raw {
        Ok(ValidateRequest::raw(input))
    } else {
        ValidateRequest::parse(input)
    };

    match request.and_then(|r| r.run(args.policy())) {
        Ok(result) => {
            emit(&result)?;
            Ok(if check && !result.valid {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Err(e) => respond::<()>(Err(e)),
    }
}

fn hook(input: &str, args: &PolicyArgs) -> anyhow::Result<ExitCode> {
    let input = input.trim();
    if input.is_empty() {
        return respond::<()>(Err(ActionError::EmptyInput));
    }
    let payload: HookPayload = match serde_json::from_str(input) {
        Ok(payload) => payload,
        Err(e) => return respond::<()>(Err(ActionError::InvalidJson(e))),
    };

    match EditGuard::new(args.policy()).check(&payload) {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(blocked) => {
            eprintln!("{blocked}");
            Ok(ExitCode::from(BLOCKED))
        }
    }
}

fn respond<T: Serialize>(response: Result<T, ActionError>) -> anyhow::Result<ExitCode> {
    match response {
        Ok(payload) => {
            emit(&payload)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::debug!(error = %e, "request failed");
            emit(&e.envelope())?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn emit<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(value).context("encoding response")?;
    println!("{text}");
    Ok(())
}
