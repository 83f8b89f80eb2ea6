//! # Cache Configuration Validator
//!
//! Command-line tool for validating cache configuration files across environments
//! before a service starts with them.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use resilient_cache::cache::CacheStore;
use resilient_cache::config::ConfigLoader;
use resilient_cache::logging::log_error;
use resilient_cache::ResilientCache;
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "cache-config-validator")]
#[command(about = "Validate resilient cache configuration files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Environment to validate (development, test, production)
    #[arg(short, long, env = "CACHE_ENV", default_value = "development")]
    environment: String,

    /// Configuration directory path (default: config/cache)
    #[arg(short, long, env = "CACHE_CONFIG_ROOT")]
    config_dir: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Subcommands
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate the configuration (default)
    Validate,

    /// Print the effective configuration with credentials masked
    Show,

    /// List environments that have an overlay file
    Environments,

    /// Connect to the configured backend and run a health check
    Check,
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
        Some(Commands::Validate) | None => validate(&cli),
        Some(Commands::Show) => show(&cli),
        Some(Commands::Environments) => list_environments(&cli),
        Some(Commands::Check) => check(&cli),
    };

    match result {
        Ok(()) => {
            info!("Configuration validation completed successfully");
            process::exit(0);
        }
        Err(e) => {
            log_error("cache-config-validator", "validate", &format!("{e:#}"), None);
            error!("Configuration validation failed: {:#}", e);
            process::exit(1);
        }
    }
}

fn loader(cli: &Cli) -> Result<ConfigLoader> {
    let loader = match &cli.config_dir {
        Some(dir) => ConfigLoader::with_root(dir, &cli.environment),
        None => ConfigLoader::new(&cli.environment),
    };
    loader.context("Failed to initialize configuration loader")
}

fn validate(cli: &Cli) -> Result<()> {
    println!("🔧 Validating Cache Configuration");
    println!("Environment: {}", cli.environment);

    let loader = loader(cli)?;
    println!("Config Directory: {}", loader.root().display());
    if !loader.environment_file().is_file() {
        println!(
            "⚠️  No overlay for '{}', using base configuration only",
            loader.environment()
        );
    }

    let config = loader.load().context("Failed to load configuration")?;
    println!("✅ Configuration loaded and validated");
    println!("   backend:             {}", config.backend);
    println!("   enabled:             {}", config.enabled);
    println!("   key_prefix:          {:?}", config.key_prefix);
    println!("   default_ttl_seconds: {}", config.default_ttl_seconds);
    println!(
        "   circuit_breaker:     {} failures / {}ms recovery",
        config.circuit_breaker.failure_threshold, config.circuit_breaker.recovery_timeout_ms
    );
    Ok(())
}

fn show(cli: &Cli) -> Result<()> {
    let config = loader(cli)?.load().context("Failed to load configuration")?;
    let rendered = serde_json::to_string_pretty(&config.sanitized())?;
    println!("{rendered}");
    Ok(())
}

fn list_environments(cli: &Cli) -> Result<()> {
    let loader = loader(cli)?;
    println!("📋 Available Environments:");

    let environments = loader.available_environments();
    if environments.is_empty() {
        println!("  (none; only base.toml in {})", loader.root().display());
    }
    for env in environments {
        println!("  • {}", env);
    }
    Ok(())
}

fn check(cli: &Cli) -> Result<()> {
    let config = loader(cli)?.load().context("Failed to load configuration")?;
    let requested = config.backend.clone();
    let enabled = config.enabled;

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async {
        let cache = ResilientCache::connect(config).await;
        let provider = cache.store().provider_name();
        println!("🔌 Requested backend '{}', using provider '{}'", requested, provider);

        if enabled && !cache.store().is_enabled() && requested.to_lowercase() != "noop" {
            bail!("backend '{requested}' unavailable, cache would degrade to NoOp");
        }

        let healthy = cache.health_check().await?;
        println!(
            "   circuit_breaker: {}",
            cache.circuit_breaker().metrics().format_summary()
        );
        if !healthy {
            bail!("provider '{provider}' failed its health check");
        }
        println!("✅ Provider '{}' is healthy", provider);
        Ok(())
    })
}
