use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use xair_core::config::{Granularity, XairConfig};
use xair_core::conversion::ConversionTable;
use xair_core::pipeline::Pipeline;

/// Concatenates C2-C6 and C6-C20 analyzer exports into gap-filled CSV files.
///
/// Data must be laid out as <input>/<year>/<MM>/*<C2-C6|C6-C20>.Asc, e.g. data/2022/01.
/// Every year (and month) found is processed unless --year / --month narrow the run.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about)]
struct Cli {
    /// Path to the data to process [default: ./data]
    #[arg(short, long, env = "XAIR_INPUT")]
    input: Option<PathBuf>,

    /// Output directory for concatenated files [default: ./]
    #[arg(short, long, env = "XAIR_OUTPUT")]
    output: Option<PathBuf>,

    /// Year to process
    #[arg(short, long)]
    year: Option<i32>,

    /// Month to process, in every selected year
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..=12))]
    month: Option<u32>,

    /// Conversion factor CSV [default: ./facteurs_de_conversions_C2-C20.csv]
    #[arg(short, long, env = "XAIR_FACTORS")]
    factors: Option<PathBuf>,

    /// TOML file with default settings
    #[arg(short, long, env = "XAIR_CONFIG")]
    config: Option<PathBuf>,

    /// One output file per `year` or per `month`
    #[arg(long)]
    granularity: Option<Granularity>,

    /// Minutes subtracted from calibration run timestamps
    #[arg(long)]
    calibration_offset_minutes: Option<i64>,

    /// File-name marker identifying calibration runs
    #[arg(long)]
    calibration_marker: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,
}

impl Cli {
    fn resolve_config(&self) -> Result<XairConfig> {
        let mut config = match &self.config {
            Some(path) => XairConfig::load(path)?,
            None => XairConfig::default(),
        };

        if let Some(input) = &self.input {
            config.input = input.clone();
        }
        if let Some(output) = &self.output {
            config.output = output.clone();
        }
        if let Some(factors) = &self.factors {
            config.factors = factors.clone();
        }
        if self.year.is_some() {
            config.year = self.year;
        }
        if self.month.is_some() {
            config.month = self.month;
        }
        if let Some(granularity) = self.granularity {
            config.granularity = granularity;
        }
        if let Some(offset) = self.calibration_offset_minutes {
            config.calibration.offset_minutes = offset;
        }
        if let Some(marker) = &self.calibration_marker {
            config.calibration.marker = marker.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    let config = cli.resolve_config()?;
    let factors = ConversionTable::load(&config.factors).with_context(|| {
        format!(
            "conversion factors are required, check {}",
            config.factors.display()
        )
    })?;
    info!(
        factors = factors.len(),
        input = %config.input.display(),
        output = %config.output.display(),
        granularity = %config.granularity,
        "starting run"
    );

    let summary = Pipeline::new(&factors, &config).run()?;

    for path in &summary.outputs {
        println!("{}", path.display());
    }
    if summary.skipped_rows > 0 {
        info!(skipped = summary.skipped_rows, "malformed lines were skipped");
    }
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
