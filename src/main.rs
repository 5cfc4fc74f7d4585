use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

use deeptech_features::app::feature_pipeline_use_case::FeaturePipelineUseCase;
use deeptech_features::app::ports::CompanySource;
use deeptech_features::infra::json_table::{
    write_flattened_profiles, JsonTableFile, NdjsonFeatureSink,
};
use deeptech_features::{logging, metrics, FeaturePipeline, PipelineConfig};

#[derive(Parser)]
#[command(name = "deeptech_features")]
#[command(about = "Builds the company feature table from company and personnel data")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit the imputation statistics and write the feature table
    FitTransform {
        /// Company table (JSON array or NDJSON)
        #[arg(long)]
        companies: PathBuf,
        /// Personnel table scraped from company people pages
        #[arg(long)]
        personnel: PathBuf,
        /// Profile fragment table (experience, education, funding events)
        #[arg(long)]
        fragments: PathBuf,
        /// Company table to fit on; defaults to --companies
        #[arg(long)]
        reference: Option<PathBuf>,
        /// Pipeline config (TOML); falls back to DTF_CONFIG, then built-in defaults
        #[arg(long)]
        config: Option<PathBuf>,
        /// Output NDJSON feature table
        #[arg(long, default_value = "output/features.ndjson")]
        output: PathBuf,
        /// Write the flattened profiles as NDJSON
        #[arg(long)]
        profiles_out: Option<PathBuf>,
        /// Write the run report as JSON
        #[arg(long)]
        report_out: Option<PathBuf>,
        /// Write a Prometheus text snapshot of the run's metrics
        #[arg(long)]
        metrics_out: Option<PathBuf>,
        #[arg(long, default_value = "logs")]
        log_dir: String,
    },
}

fn load_config(explicit: Option<PathBuf>) -> Result<PipelineConfig> {
    let path = explicit.or_else(|| std::env::var_os("DTF_CONFIG").map(PathBuf::from));
    match path {
        Some(path) => {
            info!(path = %path.display(), "Loading pipeline config");
            PipelineConfig::load(&path)
                .with_context(|| format!("loading config {}", path.display()))
        }
        None => {
            info!("No config given, using built-in defaults");
            Ok(PipelineConfig::default())
        }
    }
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Commands::FitTransform {
            companies,
            personnel,
            fragments,
            reference,
            config,
            output,
            profiles_out,
            report_out,
            metrics_out,
            log_dir,
        } => {
            logging::init_logging(&log_dir);
            metrics::init_metrics();

            let config = load_config(config)?;
            info!(fingerprint = %config.fingerprint(), "Pipeline config ready");
            let pipeline =
                FeaturePipeline::from_config(config).context("building feature pipeline")?;

            let use_case = FeaturePipelineUseCase::new(
                pipeline,
                Box::new(JsonTableFile::new("companies", companies)),
                Box::new(JsonTableFile::new("personnel", personnel)),
                Box::new(JsonTableFile::new("fragments", fragments)),
                Box::new(NdjsonFeatureSink::new(&output)),
            );
            let reference = reference.map(|path| JsonTableFile::new("reference", path));

            let (_, run) = match use_case.run(reference.as_ref().map(|r| r as &dyn CompanySource)) {
                Ok(result) => result,
                Err(e) => {
                    error!("Feature run failed: {:#}", e);
                    return Err(e);
                }
            };

            if let Some(path) = profiles_out {
                write_flattened_profiles(&path, &run.profiles)
                    .with_context(|| format!("writing profiles {}", path.display()))?;
            }
            if let Some(path) = report_out {
                let json = serde_json::to_string_pretty(&run.report)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("writing report {}", path.display()))?;
            }
            if let Some(path) = metrics_out {
                match metrics::render_snapshot() {
                    Some(snapshot) => std::fs::write(&path, snapshot)
                        .with_context(|| format!("writing metrics snapshot {}", path.display()))?,
                    None => error!("Metrics recorder not installed; no snapshot written"),
                }
            }

            println!("\n📊 Feature run {}", run.report.run_id);
            println!(
                "   Companies: {} in, {} out",
                run.report.companies_in, run.report.companies_out
            );
            println!("   Employee counts unresolved: {}", run.report.employee_tiers.unresolved);
            println!(
                "   Companies without personnel data: {}",
                run.report.companies_without_personnel
            );
            println!("   Technical profile batches: {}", run.scrape_batches.len());
            println!("   Output file: {}", output.display());
        }
    }

    Ok(())
}
