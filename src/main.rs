use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

use ims2tiff::convert_pipeline::{
    ConversionConfig, ConversionMethod, ImsToTiffPipeline, TiffFormat,
};
use ims2tiff::logger;

/// Convert an Imaris IMS capture into one multi-page TIFF per timepoint.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Input .ims file.
    file: PathBuf,

    /// Directory the TIFFs are written to.
    #[arg(short, long, default_value = ".")]
    outdir: PathBuf,

    /// Output file prefix; defaults to the input base name plus "_".
    #[arg(short, long)]
    prefix: Option<String>,

    /// Conversion method: bigload, chunked, hyperslab, or gpu.
    #[arg(short, long, default_value = "chunked")]
    method: ConversionMethod,

    /// Output format: tiff or bigtiff.
    #[arg(short, long, default_value = "bigtiff")]
    format: TiffFormat,
}

fn main() -> anyhow::Result<()> {
    logger::init();
    let args = Args::parse();

    let prefix = args.prefix.clone().unwrap_or_else(|| {
        let stem = args
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{stem}_")
    });

    std::fs::create_dir_all(&args.outdir)
        .with_context(|| format!("creating output directory {}", args.outdir.display()))?;

    let config = ConversionConfig::builder()
        .method(args.method)
        .format(args.format)
        .build();
    let pipeline = ImsToTiffPipeline::new(config);

    info!(
        method = %args.method,
        format = %args.format,
        "IMS to TIFF pipeline initialized"
    );

    match pipeline.convert_file(&args.file, &args.outdir, &prefix) {
        Ok(()) => {
            info!("Conversion successful!");
            Ok(())
        }
        Err(e) => {
            error!("Conversion failed: {e}");
            Err(e.into())
        }
    }
}
