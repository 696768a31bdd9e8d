//! Slice-at-a-time strategy.

use hdf5::Group;
use ndarray::{Array3, s};

use crate::convert_pipeline::common::error::Result;
use crate::convert_pipeline::ims::reader::open_channel;
use crate::convert_pipeline::ims::types::VolumeDims;
use crate::convert_pipeline::interleave::InterleavedBlock;
use crate::convert_pipeline::tiff::writer::PageSink;

/// Reads one depth slice per channel at a time, placing samples straight at
/// their channel offset, and emits each page as soon as it is complete.
/// One slice of memory, one read call per channel per page.
pub(super) fn convert(
    sink: &mut dyn PageSink,
    timepoint: &Group,
    dims: VolumeDims,
    channels: usize,
) -> Result<()> {
    let mut block = InterleavedBlock::new(dims.x, dims.y, 1, channels);

    for z in 0..dims.z {
        for channel in 0..channels {
            let dataset = open_channel(timepoint, channel)?;
            let plane: Array3<u16> =
                dataset.read_slice(s![z..z + 1, 0..dims.y, 0..dims.x])?;

            for y in 0..dims.y {
                for x in 0..dims.x {
                    block.set(0, y, x, channel, plane[[0, y, x]]);
                }
            }
        }

        sink.write_page(dims.x, dims.y, channels, z + 1, dims.z, block.page(0))?;
    }

    Ok(())
}
