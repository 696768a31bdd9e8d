//! Storage-chunk-aligned strategy.

use hdf5::Group;
use ndarray::{Array3, s};
use tracing::debug;

use crate::convert_pipeline::common::error::{ConversionError, Result};
use crate::convert_pipeline::ims::reader::open_channel;
use crate::convert_pipeline::ims::types::VolumeDims;
use crate::convert_pipeline::interleave::InterleavedBlock;
use crate::convert_pipeline::tiff::writer::PageSink;

/// On-disk chunk shape, `[z][y][x]` like the dataset itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ChunkShape {
    z: usize,
    y: usize,
    x: usize,
}

impl ChunkShape {
    fn as_array(&self) -> [usize; 3] {
        [self.z, self.y, self.x]
    }
}

/// Every channel must share one chunk shape or the tiled reads below would
/// not line up. Checked before any sample is read.
fn common_chunk_shape(timepoint: &Group, channels: usize) -> Result<ChunkShape> {
    let mut shape: Option<ChunkShape> = None;

    for channel in 0..channels {
        let dataset = open_channel(timepoint, channel)?;
        let dims = dataset
            .chunk()
            .ok_or(ConversionError::NotChunked(channel))?;
        if dims.len() != 3 {
            return Err(ConversionError::Metadata(format!(
                "channel {channel} chunk rank is {}, expected 3",
                dims.len()
            )));
        }

        let found = ChunkShape {
            z: dims[0],
            y: dims[1],
            x: dims[2],
        };
        match shape {
            None => shape = Some(found),
            Some(expected) if expected != found => {
                return Err(ConversionError::ChunkMismatch {
                    channel,
                    expected: expected.as_array(),
                    found: found.as_array(),
                });
            }
            Some(_) => {}
        }
    }

    shape.ok_or_else(|| ConversionError::Metadata("dataset has no channels".into()))
}

/// Walks the volume one Z-row of storage chunks at a time, reading each
/// chunk-aligned tile per channel straight into its interleaved position,
/// then emits the finished slices of that row. Tiles at the far edges are
/// clipped to the declared extents; the chunk padding is never read.
pub(super) fn convert(
    sink: &mut dyn PageSink,
    timepoint: &Group,
    dims: VolumeDims,
    channels: usize,
) -> Result<()> {
    let chunk = common_chunk_shape(timepoint, channels)?;
    debug!(
        zc = chunk.z,
        yc = chunk.y,
        xc = chunk.x,
        "Using storage chunk shape"
    );

    let z_chunks = dims.z.div_ceil(chunk.z);
    let y_chunks = dims.y.div_ceil(chunk.y);
    let x_chunks = dims.x.div_ceil(chunk.x);

    // One interleaved Z-chunk-row covering the full slice plane.
    let mut block = InterleavedBlock::new(dims.x, dims.y, chunk.z, channels);

    let mut emitted = 0;
    for zi in 0..z_chunks {
        let z0 = zi * chunk.z;
        let z_count = chunk.z.min(dims.z - z0);

        for channel in 0..channels {
            let dataset = open_channel(timepoint, channel)?;
            for yi in 0..y_chunks {
                let y0 = yi * chunk.y;
                let y_count = chunk.y.min(dims.y - y0);
                for xi in 0..x_chunks {
                    let x0 = xi * chunk.x;
                    let x_count = chunk.x.min(dims.x - x0);

                    let tile: Array3<u16> = dataset.read_slice(s![
                        z0..z0 + z_count,
                        y0..y0 + y_count,
                        x0..x0 + x_count
                    ])?;

                    for dz in 0..z_count {
                        for dy in 0..y_count {
                            for dx in 0..x_count {
                                block.set(dz, y0 + dy, x0 + dx, channel, tile[[dz, dy, dx]]);
                            }
                        }
                    }
                }
            }
        }

        // The row holds z_count finished slices; the last row is partial.
        for dz in 0..z_count {
            emitted += 1;
            sink.write_page(dims.x, dims.y, channels, emitted, dims.z, block.page(dz))?;
        }
    }

    Ok(())
}
