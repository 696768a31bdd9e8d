//! Synthetic IMS fixtures for tests.

use std::path::Path;
use std::str::FromStr;

use hdf5::types::{FixedAscii, VarLenUnicode};
use hdf5::{File, Group};
use ndarray::{Array2, Array3};

use crate::convert_pipeline::ims::types::VolumeDims;

/// Fill value of the padded storage region outside the logical volume; must
/// never show up in converted output.
pub(crate) const PAD_MARKER: u16 = 0xEEEE;

/// Deterministic fill pattern, unique per (timepoint, channel, voxel) for
/// the small volumes used in tests.
pub(crate) fn sample_value(t: usize, c: usize, z: usize, y: usize, x: usize) -> u16 {
    (20000 * t + 1000 * c + 100 * z + 10 * y + x) as u16
}

pub(crate) fn write_str_attr(group: &Group, name: &str, value: &str) {
    let value = VarLenUnicode::from_str(value).unwrap();
    group
        .new_attr::<VarLenUnicode>()
        .create(name)
        .unwrap()
        .write_scalar(&value)
        .unwrap();
}

/// Writes a string the way the instrument does: one attribute element per
/// character.
pub(crate) fn write_char_array_attr(group: &Group, name: &str, value: &str) {
    let chars: Vec<FixedAscii<1>> = value
        .bytes()
        .map(|b| FixedAscii::<1>::from_ascii(&[b]).unwrap())
        .collect();
    let attr = group
        .new_attr::<FixedAscii<1>>()
        .shape((chars.len(),))
        .create(name)
        .unwrap();
    attr.write(ndarray::ArrayView1::from(chars.as_slice()))
        .unwrap();
}

pub(crate) struct SyntheticIms {
    dims: VolumeDims,
    channels: usize,
    timepoints: usize,
    chunk: Option<(usize, usize, usize)>,
    padding: (usize, usize, usize),
    mismatched_chunks: bool,
    thumbnail: Option<usize>,
    timestamp: String,
}

impl SyntheticIms {
    pub(crate) fn new(dims: VolumeDims, channels: usize, timepoints: usize) -> Self {
        Self {
            dims,
            channels,
            timepoints,
            chunk: None,
            padding: (0, 0, 0),
            mismatched_chunks: false,
            thumbnail: None,
            timestamp: "2018-05-24 10:38:17.794".to_string(),
        }
    }

    /// Chunk shape `(z, y, x)` for every channel dataset.
    pub(crate) fn chunk(mut self, chunk: (usize, usize, usize)) -> Self {
        self.chunk = Some(chunk);
        self
    }

    /// Extra stored extent `(z, y, x)` past the logical volume, filled with
    /// [`PAD_MARKER`].
    pub(crate) fn storage_padding(mut self, z: usize, y: usize, x: usize) -> Self {
        self.padding = (z, y, x);
        self
    }

    /// Give channel 0 a different chunk shape than the rest.
    pub(crate) fn mismatched_chunks(mut self) -> Self {
        self.mismatched_chunks = true;
        self
    }

    pub(crate) fn thumbnail(mut self, size: usize) -> Self {
        self.thumbnail = Some(size);
        self
    }

    pub(crate) fn timestamp(mut self, timestamp: &str) -> Self {
        self.timestamp = timestamp.to_string();
        self
    }

    fn chunk_for(&self, channel: usize) -> Option<(usize, usize, usize)> {
        if self.mismatched_chunks {
            return Some(if channel == 0 { (1, 2, 2) } else { (2, 2, 2) });
        }
        self.chunk
    }

    pub(crate) fn build(&self, path: &Path) -> hdf5::Result<()> {
        let file = File::create(path)?;

        let dsi = file.create_group("DataSetInfo")?;
        let image = dsi.create_group("Image")?;
        write_str_attr(&image, "X", &self.dims.x.to_string());
        write_str_attr(&image, "Y", &self.dims.y.to_string());
        write_str_attr(&image, "Z", &self.dims.z.to_string());

        for c in 0..self.channels {
            dsi.create_group(&format!("Channel {c}"))?;
        }

        let time_info = dsi.create_group("TimeInfo")?;
        write_str_attr(&time_info, "FileTimePoints", &self.timepoints.to_string());
        for t in 0..self.timepoints {
            write_str_attr(&time_info, &format!("TimePoint{}", t + 1), &self.timestamp);
        }

        if let Some(size) = self.thumbnail {
            let thumb = file.create_group("Thumbnail")?;
            let data = Array2::<u8>::from_elem((size, 4 * size), 0xAB);
            let dataset = thumb.new_dataset::<u8>().shape((size, 4 * size)).create("Data")?;
            dataset.write(data.view())?;
        }

        let resolution = file
            .create_group("DataSet")?
            .create_group("ResolutionLevel 0")?;
        let (sz, sy, sx) = (
            self.dims.z + self.padding.0,
            self.dims.y + self.padding.1,
            self.dims.x + self.padding.2,
        );

        for t in 0..self.timepoints {
            let timepoint = resolution.create_group(&format!("TimePoint {t}"))?;
            for c in 0..self.channels {
                let channel = timepoint.create_group(&format!("Channel {c}"))?;

                let mut volume = Array3::<u16>::from_elem((sz, sy, sx), PAD_MARKER);
                for z in 0..self.dims.z {
                    for y in 0..self.dims.y {
                        for x in 0..self.dims.x {
                            volume[[z, y, x]] = sample_value(t, c, z, y, x);
                        }
                    }
                }

                let builder = channel.new_dataset::<u16>().shape((sz, sy, sx));
                let builder = match self.chunk_for(c) {
                    Some(chunk) => builder.chunk(chunk),
                    None => builder,
                };
                let dataset = builder.create("Data")?;
                if !volume.is_empty() {
                    dataset.write(volume.view())?;
                }
            }
        }

        Ok(())
    }
}
