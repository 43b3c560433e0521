use std::time::SystemTime;

use anyhow::{Context, Result};
use clap::Parser;
use common::cli::{Cli, Command, utils};
use common::config::Configuration;
use exporter::model::{DataPoint, Gauge, Metric, MetricData, ScopeMetrics};
use exporter::{ExportError, MetricSnapshot, PushMetricExporter, RemoteWriteExporter};
use opentelemetry::{InstrumentationScope, KeyValue};
use opentelemetry_sdk::Resource;
use tracing_subscriber::EnvFilter;

const PROBE_METRIC: &str = "promwrite_probe";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(utils::log_filter(&cli.args)))
        .init();

    let config = utils::load_config(cli.args.config.as_ref())?;

    match cli.command {
        Command::Config { json } => {
            println!("{}", utils::render_config(&config, json)?);
        }
        Command::Validate => {
            utils::validate_config(&config)?;
            println!("Configuration is valid");
        }
        Command::Version => {
            println!("{}", utils::version_info());
        }
        Command::Probe => probe(&config).await?,
    }

    Ok(())
}

/// Export a single gauge to the configured endpoint.
async fn probe(config: &Configuration) -> Result<()> {
    utils::validate_config(config)?;

    let exporter = RemoteWriteExporter::new(&config.exporter)
        .context("Failed to create remote write exporter")?;
    tracing::info!("Sending probe metric to {}", exporter.endpoint());

    let result = exporter.export_snapshot(&probe_snapshot()).await;
    if let Err(e) = exporter.shutdown() {
        tracing::warn!("Failed to shut down exporter: {e}");
    }

    match result {
        Ok(()) => {
            tracing::info!("Probe metric {PROBE_METRIC} accepted");
            Ok(())
        }
        Err(ExportError::Status { status }) => {
            anyhow::bail!("Remote write endpoint rejected the probe with {status}")
        }
        Err(e) => Err(e).context("Failed to export probe metric"),
    }
}

fn probe_snapshot() -> MetricSnapshot {
    MetricSnapshot {
        resource: Resource::builder_empty()
            .with_attributes([KeyValue::new("service.name", "promwrite")])
            .build(),
        scope_metrics: vec![ScopeMetrics {
            scope: InstrumentationScope::builder("promwrite")
                .with_version(env!("CARGO_PKG_VERSION"))
                .build(),
            metrics: vec![Metric {
                name: PROBE_METRIC.to_string(),
                description: "Connectivity probe sent by promwrite".to_string(),
                unit: String::new(),
                data: MetricData::GaugeI64(Gauge {
                    data_points: vec![DataPoint {
                        attributes: vec![],
                        start_time: None,
                        time: SystemTime::now(),
                        value: 1,
                        exemplars: vec![],
                    }],
                }),
            }],
        }],
    }
}
