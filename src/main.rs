//! energymap entry point: runs one recompute job from a GeoJSON input.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use energymap::config::EngineConfig;
use energymap::io::geojson;
use energymap::io::publish::ArtifactSet;
use energymap::job::RecomputeJob;
use energymap::logging;
use energymap::pipeline::Pipeline;
use energymap::report::ComparisonTable;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Score settlement clusters, forecast demand, and compare electrification scenarios",
    long_about = None
)]
struct Args {
    /// Cluster GeoJSON FeatureCollection.
    #[arg(short, long)]
    input: PathBuf,

    /// Directory that receives the artifact set (replaced atomically).
    #[arg(short, long, default_value = "output")]
    out_dir: PathBuf,

    /// Engine configuration TOML file.
    #[arg(short, long, conflicts_with = "preset")]
    config: Option<PathBuf>,

    /// Built-in configuration preset (baseline, high_growth, accelerated_access).
    #[arg(short, long)]
    preset: Option<String>,

    /// Override the demand horizon year.
    #[arg(long)]
    horizon_year: Option<i32>,

    /// Tracing filter directive, e.g. `energymap=debug`.
    #[arg(long)]
    log_level: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    logging::init(args.log_level.as_deref());

    // --config takes priority, then --preset, then baseline default
    let loaded = if let Some(path) = &args.config {
        EngineConfig::from_toml_file(path)
    } else if let Some(name) = &args.preset {
        EngineConfig::from_preset(name)
    } else {
        Ok(EngineConfig::baseline())
    };
    let mut config = match loaded {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(year) = args.horizon_year {
        config.demand.horizon_year = year;
    }

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        return ExitCode::FAILURE;
    }

    match run(&args, config) {
        Ok(table) => {
            println!("{table}");
            println!("Artifacts written to {}", args.out_dir.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args, config: EngineConfig) -> anyhow::Result<ComparisonTable> {
    let pipeline = Pipeline::new(config)?;
    let job = RecomputeJob::new();

    let outcome = job.run(|cancel| {
        let raw = geojson::load_clusters(&args.input)?;
        let clusters = pipeline.ingest(raw)?;
        let output = pipeline.run(&clusters, cancel)?;
        cancel.check("publish")?;
        ArtifactSet::from_output(&output)?.publish(&args.out_dir)?;
        Ok(output)
    });

    let status = job.status();
    info!(
        state = ?status.state,
        started_at = ?status.started_at,
        finished_at = ?status.finished_at,
        "recompute job finished"
    );

    let output =
        outcome.with_context(|| format!("recompute from {} failed", args.input.display()))?;
    Ok(ComparisonTable::new(output.scenario_results()).ranked())
}
