use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use aim_convert_rs::image_pipeline::{
    AimReader, AimToVolumePipeline, AimV020Reader, CalibrationKeys, ConversionConfig, ElementType,
    Scaling, VolumeToAimPipeline, header,
};
use aim_convert_rs::logger;

#[derive(Parser)]
#[command(name = "aim_convert")]
#[command(about = "Convert Scanco AIM images to and from MetaImage volumes")]
struct Cli {
    /// Log debug output and span timings
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert an AIM file to a MetaImage volume
    AimToMha {
        /// AIM file to read
        input: PathBuf,

        /// Unit of the output values (HU, mu, BMD, none)
        #[arg(short, long, default_value = "none")]
        scaling: String,

        /// Output file; defaults to the input name with a .mha extension
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Swap the first and last origin/spacing components as well as the array axes
        #[arg(long)]
        swap_geometry: bool,

        /// Store the processing log in canonical layout instead of verbatim
        #[arg(long)]
        normalize_log: bool,

        /// Write 32-bit floats instead of doubles
        #[arg(long)]
        float32: bool,
    },

    /// Convert a MetaImage volume written by aim-to-mha back to AIM
    MhaToAim {
        /// MetaImage file to read
        input: PathBuf,

        /// Output file; defaults to the input name with a .aim extension
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the processing log of an AIM file
    Header {
        /// AIM file to read
        input: PathBuf,

        /// Print the calibration constants and HU equation instead
        #[arg(short, long)]
        calibration: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(if cli.verbose { "debug" } else { "info" });

    match cli.command {
        Commands::AimToMha { input, scaling, output, swap_geometry, normalize_log, float32 } => {
            let scaling: Scaling = scaling.parse()?;
            let config = ConversionConfig::builder()
                .scaling(scaling)
                .write_output(true)
                .output_path(output)
                .swap_geometry_axes(swap_geometry)
                .normalize_log(normalize_log)
                .element_type(if float32 { ElementType::Float } else { ElementType::Double })
                .build();
            let pipeline = AimToVolumePipeline::new(config);
            let volume = pipeline
                .convert_file(&input)
                .with_context(|| format!("converting {}", input.display()))?;
            info!(size = ?volume.size(), "Conversion successful");
        }
        Commands::MhaToAim { input, output } => {
            let config = ConversionConfig::builder()
                .write_output(true)
                .output_path(output)
                .build();
            let pipeline = VolumeToAimPipeline::new(config);
            let image = pipeline
                .convert_file(&input)
                .with_context(|| format!("converting {}", input.display()))?;
            info!(size = ?image.dimensions(), "Conversion successful");
        }
        Commands::Header { input, calibration } => print_header(&input, calibration)?,
    }

    Ok(())
}

fn print_header(input: &Path, calibration: bool) -> Result<()> {
    let data = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    let image = AimV020Reader.read_aim(&data)?;
    let log = header::parse(&image.processing_log);

    if !calibration {
        print!("{}", header::serialize(&log));
        return Ok(());
    }

    let constants = header::extract_constants(&log, &CalibrationKeys::default())?;
    let (slope, intercept) = constants.hu_equation()?;
    println!("mu scaling:         {}", constants.mu_scaling);
    println!("mu water:           {}", constants.hu_mu_water);
    println!("mu air:             {}", constants.hu_mu_air);
    println!("density slope:      {}", constants.density_slope);
    println!("density intercept:  {}", constants.density_intercept);
    println!("HU = {slope} * native + {intercept}");
    Ok(())
}
