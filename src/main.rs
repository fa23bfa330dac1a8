use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use fluoquant_rs::analysis_pipeline::{
    AnalysisConfig, BackgroundMethod, Calibration, ColocThresholds, Roi, RoiAnalysisPipeline, RoiShape,
};
use fluoquant_rs::logger;

use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(author, version, about = "Fluorescence ROI measurement on raw channel images")]
struct Args {
    /// Output table (delimited text with a UTF-8 byte-order mark)
    output: PathBuf,

    /// Channel images; each channel is named after its file stem
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Physical pixel width
    #[arg(long, value_name = "SIZE", default_value_t = 1.0)]
    pixel_size: f64,

    /// Physical pixel height, defaults to the pixel width
    #[arg(long, value_name = "SIZE")]
    pixel_size_y: Option<f64>,

    /// Length unit of the pixel size
    #[arg(long, default_value = "px")]
    unit: String,

    /// Background correction: none, global-min or ring=<width>
    #[arg(long, value_name = "METHOD", default_value = "none", value_parser = parse_background)]
    background: BackgroundMethod,

    /// Manders threshold on the first colocalized channel
    #[arg(long, value_name = "VALUE", default_value_t = 0.0)]
    threshold_a: f64,

    /// Manders threshold on the second colocalized channel
    #[arg(long, value_name = "VALUE", default_value_t = 0.0)]
    threshold_b: f64,

    /// Field delimiter of the output table
    #[arg(long, default_value_t = ',')]
    delimiter: char,

    /// Channel pair to colocalize, defaults to the first two inputs
    #[arg(long, value_name = "A,B", value_parser = parse_channel_pair)]
    coloc: Option<(String, String)>,

    /// Skip colocalization
    #[arg(long, conflicts_with = "coloc")]
    no_coloc: bool,

    /// Accept channels of different raw sizes
    #[arg(long)]
    allow_mixed_sizes: bool,
}

fn parse_background(s: &str) -> Result<BackgroundMethod, String> {
    match s {
        "none" => Ok(BackgroundMethod::None),
        "global-min" => Ok(BackgroundMethod::GlobalMin),
        _ => match s.strip_prefix("ring=") {
            Some(width) => width
                .parse()
                .map(|width| BackgroundMethod::LocalRing { width })
                .map_err(|e| format!("invalid ring width '{}': {}", width, e)),
            None => Err(format!(
                "unknown background method '{}', expected none, global-min or ring=<width>",
                s
            )),
        },
    }
}

fn parse_channel_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once(',') {
        Some((a, b)) if !a.trim().is_empty() && !b.trim().is_empty() => {
            Ok((a.trim().to_string(), b.trim().to_string()))
        }
        _ => Err(format!("expected two channel names as A,B, got '{}'", s)),
    }
}

fn channel_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

impl Args {
    fn channel_ids(&self) -> Vec<String> {
        self.inputs.iter().map(|p| channel_id(p)).collect()
    }

    fn config(&self) -> anyhow::Result<AnalysisConfig> {
        let calibration = Calibration::new(
            self.pixel_size,
            self.pixel_size_y.unwrap_or(self.pixel_size),
            self.unit.clone(),
        )
        .context("invalid pixel size")?;

        let mut builder = AnalysisConfig::builder()
            .calibration(calibration)
            .background(self.background)
            .thresholds(ColocThresholds::new(self.threshold_a, self.threshold_b))
            .delimiter(self.delimiter)
            .validate_dimensions(!self.allow_mixed_sizes);

        let ids = self.channel_ids();
        let pair = match (&self.coloc, ids.as_slice()) {
            _ if self.no_coloc => None,
            (Some((a, b)), _) => Some((a.clone(), b.clone())),
            (None, [a, b, ..]) => Some((a.clone(), b.clone())),
            (None, _) => None,
        };
        if let Some((a, b)) = pair {
            builder = builder.coloc_channels(a, b);
        }

        Ok(builder.build())
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logger::init();

    info!("Starting fluoquant...");

    let config = args.config()?;
    info!("Calibration: {:?}", config.calibration);
    info!("Background: {:?}", config.background);
    let mut pipeline = RoiAnalysisPipeline::new(config)?;

    let channels = args
        .inputs
        .iter()
        .zip(args.channel_ids())
        .map(|(path, id)| {
            pipeline
                .load_channel_file(path, &id)
                .with_context(|| format!("reading {}", path.display()))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let (width, height) = channels[0].dimensions();
    let (w, h) = (width as f64, height as f64);
    let rois = [
        Roi::new("frame", "Frame", RoiShape::full_frame(width, height)),
        Roi::new("center", "Center", RoiShape::ellipse(w / 4.0, h / 4.0, w / 2.0, h / 2.0)),
    ];

    let rows = match pipeline.analyze(&rois, &channels) {
        Ok(rows) => rows,
        Err(e) => {
            error!("Analysis failed: {}", e);
            return Err(e).context("analyzing channels");
        }
    };

    pipeline
        .export_file(&rows, &args.output)
        .with_context(|| format!("writing {}", args.output.display()))?;
    info!("Analysis successful, {} rows written", rows.len());

    Ok(())
}
