use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command line of the `promwrite` binary
#[derive(Parser, Debug, Clone)]
#[command(name = "promwrite", version, about = "Prometheus remote_write metrics exporter")]
pub struct Cli {
    #[command(flatten)]
    pub args: CommonArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args, Debug, Clone)]
pub struct CommonArgs {
    #[arg(long, global = true, help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,

    #[arg(short, long, global = true, help = "Enable quiet mode (minimal output)")]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show current configuration and exit
    Config {
        #[arg(long, help = "Show configuration in JSON format")]
        json: bool,
    },
    /// Validate configuration and exit
    Validate,
    /// Show version information and exit
    Version,
    /// Push a single probe metric to the configured endpoint
    Probe,
}

pub mod utils {
    use super::*;
    use crate::config::Configuration;
    use anyhow::{Context, Result};

    /// Log filter directive derived from the CLI flags; `RUST_LOG` wins when set
    pub fn log_filter(args: &CommonArgs) -> String {
        if let Ok(filter) = std::env::var("RUST_LOG") {
            return filter;
        }
        let level = if args.quiet {
            "warn"
        } else if args.verbose {
            "debug"
        } else {
            "info"
        };
        level.to_string()
    }

    /// Load configuration with optional override from CLI
    pub fn load_config(config_path: Option<&PathBuf>) -> Result<Configuration> {
        match config_path {
            Some(path) => {
                tracing::info!("Loading configuration from: {}", path.display());
                Configuration::load_from_path(path).context("Failed to load configuration")
            }
            None => Configuration::load().context("Failed to load configuration"),
        }
    }

    /// Render the configuration with the bearer token masked
    pub fn render_config(config: &Configuration, json: bool) -> Result<String> {
        let mut masked = config.clone();
        if !masked.exporter.token.is_empty() {
            masked.exporter.token = "********".to_string();
        }

        if json {
            return serde_json::to_string_pretty(&masked)
                .context("Failed to serialize configuration to JSON");
        }

        let exporter = &masked.exporter;
        let mut out = String::new();
        out.push_str("promwrite configuration:\n");
        out.push_str("========================\n");
        out.push_str(&format!("Endpoint: {}\n", exporter.endpoint));
        out.push_str(&format!("Token: {}\n", exporter.token));
        out.push_str(&format!("Remote timeout: {:?}\n", exporter.remote_timeout));
        out.push_str(&format!("Push interval: {:?}\n", exporter.push_interval));
        out.push_str(&format!(
            "Add metric suffixes: {}\n",
            exporter.add_metric_suffixes
        ));
        for (name, value) in &exporter.external_labels {
            out.push_str(&format!("External label: {name}={value}\n"));
        }
        if !exporter.histogram_boundaries.is_empty() {
            out.push_str(&format!(
                "Histogram boundaries: {:?}\n",
                exporter.histogram_boundaries
            ));
        }
        Ok(out)
    }

    /// Validate configuration and report any issues
    pub fn validate_config(config: &Configuration) -> Result<()> {
        tracing::info!("Validating configuration...");
        config
            .exporter
            .validate()
            .context("Invalid exporter configuration")?;
        tracing::info!("Configuration validation passed");
        Ok(())
    }

    /// Standard version information
    pub fn version_info() -> String {
        format!(
            "{} {} ({})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_RUST_VERSION")
        )
    }
}
