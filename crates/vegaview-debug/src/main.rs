use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::sync::Arc;
use vegaview_engine::{
    LoadOptions, StandardLoader, UriInput, UrlAccessGate, bypass_external_url_check,
    normalize_time_range_at,
};
use vegaview_runtime::{ViewConfig, resolve_config_path};
use vegaview_types::ApplyFilter;

#[derive(Parser)]
#[command(name = "vegaview-debug")]
#[command(about = "Debug tool for vegaview time ranges, URL policy and configuration", long_about = None)]
struct Cli {
    /// Config file (defaults to VEGAVIEW_CONFIG, then the user config dir)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Normalize two date inputs and print the resulting time filter
    TimeRange {
        start: String,
        end: String,

        /// Evaluate relative expressions against this RFC 3339 instant
        #[arg(long)]
        now: Option<String>,
    },

    /// Run a URL through the external URL gate
    CheckUrl {
        url: String,

        /// Override the configured external URL setting
        #[arg(long)]
        enable_external_urls: bool,

        /// Wrap the URL as a host-trusted payload
        #[arg(long)]
        trusted: bool,

        #[arg(long)]
        base_url: Option<String>,
    },

    /// Print the resolved configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref())?;

    match cli.command {
        Command::TimeRange { start, end, now } => {
            let now = match now {
                Some(text) => DateTime::parse_from_rfc3339(&text)
                    .with_context(|| format!("--now is not an RFC 3339 timestamp: {}", text))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            let range = normalize_time_range_at(&loose_value(&start), &loose_value(&end), now)?;
            let action = ApplyFilter::time_range(range);
            println!("{}", serde_json::to_string_pretty(&action)?);
        }
        Command::CheckUrl {
            url,
            enable_external_urls,
            trusted,
            base_url,
        } => {
            let config = ViewConfig::load_from(&config_path)?;
            let enabled = enable_external_urls || config.enable_external_urls;
            tracing::debug!(enabled, trusted, "checking url");

            let gate = UrlAccessGate::new(Arc::new(StandardLoader), enabled);
            let input = if trusted {
                bypass_external_url_check(url)
            } else {
                UriInput::from(url)
            };
            let options = LoadOptions {
                base_url,
                default_protocol: None,
            };

            let sanitized = gate.sanitize(&input, &options)?;
            println!("allowed: {}", sanitized.href);
        }
        Command::Config => {
            let config = ViewConfig::load_from(&config_path)?;
            eprintln!("[DEBUG] Config path: {}", config_path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

/// Integers are epoch milliseconds; anything else is a date string
fn loose_value(arg: &str) -> Value {
    match arg.parse::<i64>() {
        Ok(millis) => Value::from(millis),
        Err(_) => Value::String(arg.to_string()),
    }
}
