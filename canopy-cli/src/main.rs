mod log_setup;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use canopy::{run_inference, ChipSource, OnnxScorer, PredictConfig};

#[derive(Parser)]
#[clap(
    name = "canopy",
    about = "Run biomass-estimation inference on a directory of chips"
)]
struct Args {
    /// Directory containing input .tif chips
    #[clap(long)]
    chips_dir: PathBuf,

    /// Path to the trained model weights (ONNX)
    #[clap(long)]
    model_weights: PathBuf,

    /// Directory where prediction .tif files are written
    #[clap(long, default_value = "./predictions")]
    output_dir: PathBuf,
}

fn main() -> Result<()> {
    log_setup::setup_logging("info");
    let args = Args::parse();

    let scorer = OnnxScorer::load(&args.model_weights).with_context(|| {
        format!(
            "Failed to load model weights '{}'",
            args.model_weights.display()
        )
    })?;

    let source = ChipSource::new(&args.chips_dir);
    let config = PredictConfig::new(&args.output_dir);

    let summary = run_inference(&source, &scorer, &config).context("Inference run failed")?;
    tracing::info!(
        "Wrote {} predictions to '{}'",
        summary.processed,
        args.output_dir.display()
    );

    Ok(())
}
