//! Whole-volume strategy.

use hdf5::Group;
use tracing::debug;

use crate::convert_pipeline::common::error::Result;
use crate::convert_pipeline::ims::reader::read_channel;
use crate::convert_pipeline::ims::types::VolumeDims;
use crate::convert_pipeline::interleave::{PlanarVolume, interleave};
use crate::convert_pipeline::tiff::writer::PageSink;

/// Reads every channel's full volume once, interleaves the lot in a single
/// pass, then emits all pages. Peak memory is two copies of the timepoint.
pub(super) fn convert(
    sink: &mut dyn PageSink,
    timepoint: &Group,
    dims: VolumeDims,
    channels: usize,
) -> Result<()> {
    debug!(channels, "Reading full timepoint volume");

    let mut planar = PlanarVolume::new(dims, channels);
    for channel in 0..channels {
        read_channel(timepoint, channel, planar.channel_mut(channel), dims)?;
    }

    let block = interleave(&planar);
    for z in 0..dims.z {
        sink.write_page(dims.x, dims.y, channels, z + 1, dims.z, block.page(z))?;
    }

    Ok(())
}
