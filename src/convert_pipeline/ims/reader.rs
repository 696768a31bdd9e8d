//! Per-channel sample reads.

use hdf5::{Dataset, Group};
use ndarray::{Array3, s};
use tracing::debug;

use crate::convert_pipeline::common::error::Result;
use crate::convert_pipeline::ims::types::VolumeDims;

/// Resolves `Channel {channel}/Data` under a timepoint group.
pub fn open_channel(timepoint: &Group, channel: usize) -> Result<Dataset> {
    let group = timepoint.group(&format!("Channel {channel}"))?;
    Ok(group.dataset("Data")?)
}

/// Reads one channel's full volume into `out` in `[z][y][x]` order.
///
/// The stored extents are usually padded past the logical volume, so the
/// read selects the `dims` sub-region from the origin instead of taking the
/// dataset's own shape. `out` must hold exactly `dims.voxels()` samples.
pub fn read_channel(
    timepoint: &Group,
    channel: usize,
    out: &mut [u16],
    dims: VolumeDims,
) -> Result<()> {
    debug_assert_eq!(out.len(), dims.voxels());

    debug!(channel, "Reading channel volume");
    let dataset = open_channel(timepoint, channel)?;
    let volume: Array3<u16> = dataset.read_slice(s![0..dims.z, 0..dims.y, 0..dims.x])?;

    // A freshly read array is in standard layout; the fallback covers the
    // degenerate views ndarray refuses to expose as one slice.
    match volume.as_slice() {
        Some(flat) => out.copy_from_slice(flat),
        None => {
            for (dst, src) in out.iter_mut().zip(volume.iter()) {
                *dst = *src;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert_pipeline::test_support::{SyntheticIms, sample_value};

    #[test]
    fn clips_padded_storage_extents() {
        let dims = VolumeDims::new(3, 4, 2);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padded.ims");
        SyntheticIms::new(dims, 1, 1)
            .storage_padding(1, 2, 3)
            .build(&path)
            .unwrap();

        let file = hdf5::File::open(&path).unwrap();
        let timepoint = file
            .group("DataSet/ResolutionLevel 0/TimePoint 0")
            .unwrap();

        let mut out = vec![0u16; dims.voxels()];
        read_channel(&timepoint, 0, &mut out, dims).unwrap();

        for z in 0..dims.z {
            for y in 0..dims.y {
                for x in 0..dims.x {
                    let got = out[z * dims.plane() + y * dims.x + x];
                    assert_eq!(got, sample_value(0, 0, z, y, x), "at ({x},{y},{z})");
                }
            }
        }
    }

    #[test]
    fn missing_channel_is_a_storage_error() {
        let dims = VolumeDims::new(2, 2, 1);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("onechan.ims");
        SyntheticIms::new(dims, 1, 1).build(&path).unwrap();

        let file = hdf5::File::open(&path).unwrap();
        let timepoint = file
            .group("DataSet/ResolutionLevel 0/TimePoint 0")
            .unwrap();

        let mut out = vec![0u16; dims.voxels()];
        assert!(read_channel(&timepoint, 7, &mut out, dims).is_err());
    }
}
