//! multimind — query several AI providers at once and collect one report
//!
//! The CLI plays the caller role: it loads config, selects providers,
//! reads the question file, runs a dispatch round, persists the report
//! when at least one provider answered, and optionally forwards the file
//! to Telegram.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use multimind_core::{
    Config, ConnectivityProbe, DispatchOrchestrator, StatusStore, read_question, report,
};
use multimind_core::providers::ProviderRegistry;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Providers selected when the caller does not pass `--providers`,
/// matching the default checkboxes of the desktop predecessor.
const DEFAULT_SELECTION: &[&str] = &["openai", "anthropic", "google"];

#[derive(Parser)]
#[command(name = "multimind", version, about)]
struct Cli {
    /// Path to the config file (default: ~/.multimind/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Send a question file to the selected providers and save the answers
    Ask {
        /// File containing the question text
        #[arg(long)]
        question: PathBuf,

        /// Directory to save the report in (default: last used directory)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Comma-separated provider names (default: openai,anthropic,google)
        #[arg(long, value_delimiter = ',')]
        providers: Vec<String>,

        /// Skip forwarding the report to Telegram even if configured
        #[arg(long)]
        no_forward: bool,
    },

    /// Check which providers are reachable with the configured keys
    Probe {
        /// Keep probing in the background at a fixed interval
        #[arg(long)]
        watch: bool,

        /// Seconds between probe rounds in watch mode
        #[arg(long, default_value_t = 300)]
        interval_secs: u64,
    },

    /// List the available providers
    Providers,

    /// List saved reports, newest first
    History {
        /// Directory to scan (default: last used directory)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Print the contents of one report instead of listing
        #[arg(long)]
        show: Option<String>,
    },

    /// Inspect or update the configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the configuration with masked keys
    Show,

    /// Store an API key for a provider
    SetKey { provider: String, key: String },

    /// Store the Telegram bot token and chat id
    SetTelegram { bot_token: String, chat_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .or_else(Config::default_path)
        .context("cannot determine config path")?;
    let mut config = Config::load(&config_path)?;

    match cli.command {
        Command::Ask {
            question,
            out,
            providers,
            no_forward,
        } => {
            run_ask(
                &mut config,
                &config_path,
                &question,
                out,
                providers,
                no_forward,
            )
            .await
        }
        Command::Probe {
            watch,
            interval_secs,
        } => run_probe(&config, watch, interval_secs).await,
        Command::Providers => {
            run_providers();
            Ok(())
        }
        Command::History { dir, show } => run_history(&config, dir, show),
        Command::Config { action } => run_config(&mut config, &config_path, action),
    }
}

async fn run_ask(
    config: &mut Config,
    config_path: &Path,
    question_path: &Path,
    out: Option<PathBuf>,
    providers: Vec<String>,
    no_forward: bool,
) -> Result<()> {
    let question = read_question(question_path)?;

    let out_dir = out
        .or_else(|| config.last_directory.clone())
        .context("no output directory: pass --out or run ask with --out once to remember it")?;
    if !out_dir.is_dir() {
        bail!("output directory {} does not exist", out_dir.display());
    }

    let selected: Vec<String> = if providers.is_empty() {
        DEFAULT_SELECTION.iter().map(|s| s.to_string()).collect()
    } else {
        providers
    };

    let registry = Arc::new(ProviderRegistry::with_defaults());
    let orchestrator = DispatchOrchestrator::new(registry);
    let credentials = config.credentials();

    let results = orchestrator
        .dispatch(&question, &selected, &credentials)
        .await?;

    println!("{}", results.summary());
    for (provider, error) in results.failures() {
        println!("  {provider}: {error}");
    }

    if results.success_count() == 0 {
        // Hard contract: never persist an empty, misleading artifact.
        bail!("no provider returned an answer; nothing saved");
    }

    let report_path = report::persist(&results, question_path, &out_dir)?;
    println!("Saved report to {}", report_path.display());

    config.last_directory = Some(out_dir);
    if let Err(err) = config.save(config_path) {
        warn!("failed to remember output directory: {err}");
    }

    if !no_forward && config.telegram_configured() {
        let notifier = multimind_notify::TelegramNotifier::new(
            config.telegram.bot_token.clone(),
            config.telegram.chat_id.clone(),
        );
        // Forwarding is best-effort: the report on disk stays valid either way.
        match notifier.send_document(&report_path).await {
            Ok(()) => println!("Report forwarded to Telegram"),
            Err(err) => {
                warn!("forwarding failed: {err}");
                println!("Forwarding to Telegram failed: {err}");
            }
        }
    }

    Ok(())
}

async fn run_probe(config: &Config, watch: bool, interval_secs: u64) -> Result<()> {
    let registry = Arc::new(ProviderRegistry::with_defaults());
    let store = StatusStore::new();
    let probe = ConnectivityProbe::new(registry, store.clone());
    let credentials = config.credentials();

    if watch {
        let cancel = CancellationToken::new();
        let handle = probe.spawn_loop(
            Duration::from_secs(interval_secs),
            credentials,
            cancel.clone(),
        );
        println!("Probing every {interval_secs}s; press Ctrl-C to stop");
        tokio::signal::ctrl_c().await?;
        cancel.cancel();
        handle.await?;
    } else {
        probe.probe_all(&credentials).await;
    }

    for status in store.snapshot() {
        let state = if status.reachable { "reachable" } else { "unreachable" };
        println!(
            "{:<12} {:<12} checked at {}",
            status.provider,
            state,
            status.checked_at.format("%Y-%m-%d %H:%M:%S")
        );
    }
    Ok(())
}

fn run_providers() {
    let registry = ProviderRegistry::with_defaults();
    for adapter in registry.iter() {
        let identity = adapter.identity();
        let key = if identity.requires_credential() {
            "API key required"
        } else {
            "no key needed"
        };
        println!(
            "{:<12} {:<18} {:<16} models: {}",
            identity.name,
            identity.display_name,
            key,
            identity.models.join(", ")
        );
    }
}

fn run_history(config: &Config, dir: Option<PathBuf>, show: Option<String>) -> Result<()> {
    let dir = dir
        .or_else(|| config.last_directory.clone())
        .context("no report directory: pass --dir")?;

    if let Some(file_name) = show {
        let path = dir.join(&file_name);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read report {}", path.display()))?;
        print!("{content}");
        return Ok(());
    }

    let mut reports: Vec<(std::time::SystemTime, String)> = Vec::new();
    for entry in std::fs::read_dir(&dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?
    {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.contains("_answer") && name.ends_with(".txt") {
            let modified = entry
                .metadata()
                .and_then(|m| m.modified())
                .unwrap_or(std::time::SystemTime::UNIX_EPOCH);
            reports.push((modified, name));
        }
    }
    reports.sort_by(|a, b| b.0.cmp(&a.0));

    if reports.is_empty() {
        println!("No reports found in {}", dir.display());
    }
    for (_, name) in reports {
        println!("{name}");
    }
    Ok(())
}

fn run_config(config: &mut Config, config_path: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            println!("config file: {}", config_path.display());
            println!("openai:    {}", mask(&config.api_keys.openai));
            println!("anthropic: {}", mask(&config.api_keys.anthropic));
            println!("google:    {}", mask(&config.api_keys.google));
            println!("yandex:    {}", mask(&config.api_keys.yandex));
            println!("cohere:    {}", mask(&config.api_keys.cohere));
            println!("telegram bot token: {}", mask(&config.telegram.bot_token));
            println!(
                "telegram chat id:   {}",
                if config.telegram.chat_id.is_empty() {
                    "(not set)"
                } else {
                    &config.telegram.chat_id
                }
            );
            if let Some(dir) = &config.last_directory {
                println!("last directory: {}", dir.display());
            }
            Ok(())
        }
        ConfigAction::SetKey { provider, key } => {
            config.set_key(&provider, key)?;
            config.save(config_path)?;
            println!("Saved API key for {provider}");
            Ok(())
        }
        ConfigAction::SetTelegram { bot_token, chat_id } => {
            config.telegram.bot_token = bot_token;
            config.telegram.chat_id = chat_id;
            config.save(config_path)?;
            println!("Saved Telegram settings");
            Ok(())
        }
    }
}

fn mask(value: &str) -> String {
    if value.is_empty() {
        return "(not set)".to_string();
    }
    if value.len() > 8 {
        format!("{}...{}", &value[..4], &value[value.len() - 4..])
    } else {
        "****".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask() {
        assert_eq!(mask(""), "(not set)");
        assert_eq!(mask("short"), "****");
        assert_eq!(mask("sk-1234567890abcd"), "sk-1...abcd");
    }

    #[test]
    fn test_default_selection_names_exist_in_registry() {
        let registry = ProviderRegistry::with_defaults();
        for name in DEFAULT_SELECTION {
            assert!(registry.get(name).is_some(), "{name} missing from registry");
        }
    }
}
