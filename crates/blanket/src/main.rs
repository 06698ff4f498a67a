use std::path::PathBuf;

use anyhow::{Context, Result};
use blanket_core::config::{EmptyWindowPolicy, PipelineConfig};
use blanket_core::pipeline::{self, PipelineInputs, RunSummary};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Turns a pair of ANTARES thermistor logs into per-deployment heat-flow
/// blanket records.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Export of the top thermistor logger
    top: PathBuf,
    /// Export of the bottom thermistor logger
    bottom: PathBuf,
    /// Deployment metadata table (CSV with a header row)
    metadata: Option<PathBuf>,

    /// TOML configuration file (falls back to BLANKET_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Calibration offsets table (`sensorId,offset`)
    #[arg(long)]
    offsets: Option<PathBuf>,
    /// Directory receiving the container and report files
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// When an empty deployment window aborts the run: never, last_only, always
    #[arg(long)]
    on_empty_window: Option<EmptyWindowPolicy>,
    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let mut config = PipelineConfig::resolve(cli.config.as_deref())
        .context("failed to load pipeline configuration")?;
    if let Some(offsets) = cli.offsets {
        config.offsets_path = offsets;
    }
    if let Some(output_dir) = cli.output_dir {
        config.output_dir = output_dir;
    }
    if let Some(policy) = cli.on_empty_window {
        config.empty_window_policy = policy;
    }

    let inputs = PipelineInputs {
        top_path: cli.top,
        bottom_path: cli.bottom,
        metadata_path: cli.metadata,
    };

    info!(
        top = %inputs.top_path.display(),
        bottom = %inputs.bottom_path.display(),
        offsets = %config.offsets_path.display(),
        output_dir = %config.output_dir.display(),
        policy = %config.empty_window_policy,
        "Starting blanket run"
    );

    let summary = pipeline::run(&inputs, &config).context("blanket run failed")?;
    print_summary(&summary);
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn print_summary(summary: &RunSummary) {
    let mut table = comfy_table::Table::new();
    table.load_preset(comfy_table::presets::ASCII_MARKDOWN);
    table.set_header(["Deployment", "Samples", "Status", "Container", "Report"]);

    for outcome in &summary.outcomes {
        let (container, report) = match &outcome.artifacts {
            Some(paths) => (
                paths.container.display().to_string(),
                paths.report.display().to_string(),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        table.add_row([
            outcome.label.clone(),
            outcome.sample_count.to_string(),
            outcome.status.to_string(),
            container,
            report,
        ]);
    }

    println!("Run {} ({} aligned samples)", summary.run_id, summary.aligned_samples);
    println!("{table}");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metadata_argument_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["blanket", "top.dat", "bottom.dat"]).unwrap();
        assert!(cli.metadata.is_none());
    }

    #[test]
    fn flags_override_policy_and_paths() {
        let cli = Cli::try_parse_from([
            "blanket",
            "top.dat",
            "bottom.dat",
            "meta.csv",
            "--offsets",
            "cal/offsets.csv",
            "--on-empty-window",
            "never",
            "--json-logs",
        ])
        .unwrap();
        assert_eq!(cli.metadata, Some(PathBuf::from("meta.csv")));
        assert_eq!(cli.offsets, Some(PathBuf::from("cal/offsets.csv")));
        assert_eq!(cli.on_empty_window, Some(EmptyWindowPolicy::Never));
        assert!(cli.json_logs);
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let result = Cli::try_parse_from([
            "blanket",
            "top.dat",
            "bottom.dat",
            "--on-empty-window",
            "sometimes",
        ]);
        assert!(result.is_err());
    }
}
