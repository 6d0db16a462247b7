//! # Breaker Configuration Validator
//!
//! Command-line tool that resolves circuit breaker and storage factory
//! configuration from an optional file plus the environment, prints the
//! effective values and reports every setting that was replaced by a default.

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::process;
use storage_resilience::config::{ConfigLoader, LoadedConfig};
use storage_resilience::constants::{breaker, env, factory, keys};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "breaker-config-validator")]
#[command(about = "Validate storage resilience configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON by extension)
    #[arg(short, long)]
    file: Option<PathBuf>,

    /// Environment variable prefix
    #[arg(short, long, default_value = env::DEFAULT_PREFIX)]
    prefix: String,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Exit with status 2 when any value was replaced by its default
    #[arg(long)]
    strict: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate the configuration (default)
    Validate,

    /// List every accepted key with its range and default
    Keys,
}

fn main() {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .try_init();

    let result = match &cli.command {
        Some(Commands::Keys) => {
            print_keys();
            Ok(0)
        }
        Some(Commands::Validate) | None => validate(&cli),
    };

    match result {
        Ok(code) => {
            info!(exit_code = code, "Configuration validation finished");
            process::exit(code);
        }
        Err(e) => {
            error!("Configuration validation failed: {:#}", e);
            eprintln!("❌ {e:#}");
            process::exit(1);
        }
    }
}

fn validate(cli: &Cli) -> anyhow::Result<i32> {
    let mut loader = ConfigLoader::new().with_prefix(&cli.prefix);
    if let Some(file) = &cli.file {
        loader = loader.with_file(file);
    }

    let loaded = loader.load().context("failed to load configuration")?;

    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&loaded).context("failed to render JSON")?;
            println!("{json}");
        }
        OutputFormat::Table => print_table(cli, &loaded),
    }

    if cli.strict && loaded.has_warnings() {
        return Ok(2);
    }
    Ok(0)
}

fn print_table(cli: &Cli, loaded: &LoadedConfig) {
    println!("🔧 Storage Resilience Configuration");
    match &cli.file {
        Some(file) => println!("Source: {} + {}_* environment", file.display(), cli.prefix),
        None => println!("Source: {}_* environment", cli.prefix),
    }
    println!();

    let b = &loaded.breaker;
    println!("Circuit breaker");
    row(keys::NAME, &b.name);
    row(keys::FAILURE_THRESHOLD, &b.failure_threshold);
    row(keys::TIMEOUT_MS, &b.timeout_ms());
    row(keys::HALF_OPEN_MAX_CALLS, &b.half_open_max_calls);
    row(keys::SUCCESS_THRESHOLD, &b.success_threshold);
    row(keys::MAX_HISTORY_SIZE, &b.max_history_size);
    row(keys::ENABLED, &b.enabled);
    row(keys::METRICS_ENABLED, &b.metrics_enabled);
    row(keys::REOPEN_ON_HALF_OPEN_FAILURE, &b.reopen_on_half_open_failure);
    println!();

    let f = &loaded.factory;
    println!("Strategy factory");
    row(keys::HEALTH_CHECK_INTERVAL_MS, &f.health_check_interval_ms());
    row(keys::HEALTH_PROBE_TIMEOUT_MS, &f.health_probe_timeout_ms());
    row(keys::MAX_CONCURRENT_PROBES, &f.max_concurrent_probes);
    println!();

    if loaded.warnings.is_empty() {
        println!("✅ All values valid");
    } else {
        println!("⚠️  {} value(s) replaced by defaults:", loaded.warnings.len());
        for warning in &loaded.warnings {
            println!("   - {warning}");
        }
    }
}

fn row(key: &str, value: &dyn std::fmt::Display) {
    println!("  {key:<30} {value}");
}

fn print_keys() {
    println!("{:<30} {:<20} {}", "KEY", "RANGE", "DEFAULT");
    let ranged = [
        (
            keys::FAILURE_THRESHOLD,
            u64::from(breaker::MIN_FAILURE_THRESHOLD),
            u64::from(breaker::MAX_FAILURE_THRESHOLD),
            u64::from(breaker::DEFAULT_FAILURE_THRESHOLD),
        ),
        (
            keys::TIMEOUT_MS,
            breaker::MIN_TIMEOUT_MS,
            breaker::MAX_TIMEOUT_MS,
            breaker::DEFAULT_TIMEOUT_MS,
        ),
        (
            keys::HALF_OPEN_MAX_CALLS,
            u64::from(breaker::MIN_HALF_OPEN_MAX_CALLS),
            u64::from(breaker::MAX_HALF_OPEN_MAX_CALLS),
            u64::from(breaker::DEFAULT_HALF_OPEN_MAX_CALLS),
        ),
        (
            keys::SUCCESS_THRESHOLD,
            u64::from(breaker::MIN_SUCCESS_THRESHOLD),
            u64::from(breaker::MAX_SUCCESS_THRESHOLD),
            u64::from(breaker::DEFAULT_SUCCESS_THRESHOLD),
        ),
        (
            keys::MAX_HISTORY_SIZE,
            breaker::MIN_MAX_HISTORY_SIZE as u64,
            breaker::MAX_MAX_HISTORY_SIZE as u64,
            breaker::DEFAULT_MAX_HISTORY_SIZE as u64,
        ),
        (
            keys::HEALTH_CHECK_INTERVAL_MS,
            factory::MIN_HEALTH_CHECK_INTERVAL_MS,
            factory::MAX_HEALTH_CHECK_INTERVAL_MS,
            factory::DEFAULT_HEALTH_CHECK_INTERVAL_MS,
        ),
        (
            keys::HEALTH_PROBE_TIMEOUT_MS,
            factory::MIN_HEALTH_PROBE_TIMEOUT_MS,
            factory::MAX_HEALTH_PROBE_TIMEOUT_MS,
            factory::DEFAULT_HEALTH_PROBE_TIMEOUT_MS,
        ),
        (
            keys::MAX_CONCURRENT_PROBES,
            factory::MIN_MAX_CONCURRENT_PROBES as u64,
            factory::MAX_MAX_CONCURRENT_PROBES as u64,
            factory::DEFAULT_MAX_CONCURRENT_PROBES as u64,
        ),
    ];
    for (key, min, max, default) in ranged {
        println!("{:<30} {:<20} {}", key, format!("{min}-{max}"), default);
    }

    let flags = [
        (keys::ENABLED, breaker::DEFAULT_ENABLED),
        (keys::METRICS_ENABLED, breaker::DEFAULT_METRICS_ENABLED),
        (
            keys::REOPEN_ON_HALF_OPEN_FAILURE,
            breaker::DEFAULT_REOPEN_ON_HALF_OPEN_FAILURE,
        ),
    ];
    for (key, default) in flags {
        println!("{:<30} {:<20} {}", key, "bool", default);
    }
    println!("{:<30} {:<20} {}", keys::NAME, "string", breaker::DEFAULT_NAME);
}
