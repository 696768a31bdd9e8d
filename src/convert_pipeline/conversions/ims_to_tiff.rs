use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::convert_pipeline::common::error::{ConversionError, Result};
use crate::convert_pipeline::ims::metadata::{open_timepoint, read_image_info, read_thumbnail};
use crate::convert_pipeline::ims::types::VolumeDims;
use crate::convert_pipeline::tiff::page_writer::TiffPageWriter;
use crate::convert_pipeline::tiff::types::ConversionConfig;

/// Converts every timepoint of an IMS capture into its own paginated TIFF.
pub struct ImsToTiffPipeline {
    config: ConversionConfig,
}

impl ImsToTiffPipeline {
    pub fn new(config: ConversionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    fn validate_dimensions(&self, dims: VolumeDims) -> Result<()> {
        if !self.config.validate_dimensions {
            return Ok(());
        }

        if dims.x == 0 || dims.y == 0 || dims.z == 0 {
            return Err(ConversionError::InvalidDimensions(dims.x, dims.y, dims.z));
        }

        Ok(())
    }

    /// Converts `input`, writing one `{prefix}{index}.tif` per timepoint
    /// into `outdir`. Any failure aborts the remaining timepoints.
    #[instrument(skip(self, input, outdir, prefix))]
    pub fn convert_file(&self, input: &Path, outdir: &Path, prefix: &str) -> Result<()> {
        info!(input = %input.display(), "Starting IMS to TIFF conversion");

        let file = {
            let _span = tracing::info_span!("open_input").entered();
            hdf5::File::open(input)?
        };

        let ims_info = read_image_info(&file)?;
        self.validate_dimensions(ims_info.dims)?;

        info!(
            x = ims_info.dims.x,
            y = ims_info.dims.y,
            z = ims_info.dims.z,
            channels = ims_info.channel_count,
            timepoints = ims_info.time_points.len(),
            "Dataset layout"
        );

        let thumbnail = read_thumbnail(&file);

        let resolution_level = file.group("DataSet")?.group("ResolutionLevel 0")?;
        let paths = output_paths(outdir, prefix, ims_info.time_points.len());

        for (index, path) in paths.iter().enumerate() {
            let _span = tracing::info_span!("convert_timepoint", index).entered();
            if let Some(acquired) = ims_info.time_points.get(index) {
                debug!(timepoint = index, %acquired, "Converting timepoint");
            }

            let writer = BufWriter::new(File::create(path).map_err(|e| {
                ConversionError::OutputWrite(format!("{}: {}", path.display(), e))
            })?);
            let mut sink = TiffPageWriter::new(writer, self.config.format)?;
            if let Some(thumb) = &thumbnail {
                sink.set_thumbnail(thumb.clone());
            }

            let timepoint = open_timepoint(&resolution_level, index)?;
            self.config.method.convert(
                &mut sink,
                &timepoint,
                ims_info.dims,
                ims_info.channel_count,
            )?;

            info!(output = %path.display(), "Timepoint written");
        }

        info!(files = paths.len(), "Conversion complete");
        Ok(())
    }
}

/// `{prefix}{index}.tif`, index zero-padded to the width of the file count.
fn output_paths(outdir: &Path, prefix: &str, count: usize) -> Vec<PathBuf> {
    let digits = num_digits(count);
    (0..count)
        .map(|i| outdir.join(format!("{prefix}{i:0digits$}.tif")))
        .collect()
}

fn num_digits(mut n: usize) -> usize {
    let mut count = 0;
    while n > 0 {
        n /= 10;
        count += 1;
    }
    count
}
