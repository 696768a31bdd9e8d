//! Metadata discovery for the IMS container.
//!
//! The on-disk layout does not follow the published format spec; the groups
//! and attributes below were discovered by inspecting acquired files.

use chrono::NaiveDateTime;
use hdf5::types::{FixedAscii, VarLenAscii, VarLenUnicode};
use hdf5::{File, Group};
use tracing::debug;

use crate::convert_pipeline::common::error::{ConversionError, Result};
use crate::convert_pipeline::ims::types::VolumeDims;

/// Timestamps look like `2018-05-24 10:38:17.794`; no timezone is recorded.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Everything the conversion needs to know about a dataset up front.
#[derive(Debug, Clone)]
pub struct ImsInfo {
    pub dims: VolumeDims,
    pub channel_count: usize,
    pub time_points: Vec<NaiveDateTime>,
}

/// Square RGBA8888 preview image stored next to the dataset.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    pub size: usize,
    pub rgba: Vec<u8>,
}

/// Reads a string attribute.
///
/// The instrument writes string attributes as arrays of single characters;
/// ordinary scalar strings also occur and both encodings must parse.
pub fn read_string_attr(group: &Group, name: &str) -> Result<String> {
    let attr = group.attr(name)?;
    if let Ok(s) = attr.read_scalar::<VarLenUnicode>() {
        return Ok(s.to_string());
    }
    if let Ok(s) = attr.read_scalar::<VarLenAscii>() {
        return Ok(s.to_string());
    }
    let chars = attr.read_raw::<FixedAscii<1>>()?;
    Ok(chars.iter().map(|c| c.as_str()).collect())
}

pub fn read_uint_attr(group: &Group, name: &str) -> Result<usize> {
    let s = read_string_attr(group, name)?;
    s.trim().parse::<usize>().map_err(|_| {
        ConversionError::Metadata(format!("attribute {name} is not an unsigned integer: {s:?}"))
    })
}

pub fn read_image_info(file: &File) -> Result<ImsInfo> {
    let dsi = file.group("DataSetInfo")?;

    let image = dsi.group("Image")?;
    let dims = VolumeDims::new(
        read_uint_attr(&image, "X")?,
        read_uint_attr(&image, "Y")?,
        read_uint_attr(&image, "Z")?,
    );

    let channel_count = count_channels(&dsi)?;
    if channel_count == 0 {
        return Err(ConversionError::Metadata(
            "no \"Channel N\" groups under DataSetInfo".into(),
        ));
    }

    let time_points = read_time_points(&dsi)?;

    debug!(
        x = dims.x,
        y = dims.y,
        z = dims.z,
        channels = channel_count,
        timepoints = time_points.len(),
        "Discovered dataset metadata"
    );

    Ok(ImsInfo {
        dims,
        channel_count,
        time_points,
    })
}

/// Counts the `Channel N` groups.
///
/// Some files carry a `NumberOfChannels` attribute under `CustomData`, but
/// not all of them; the group count is the only reliable source.
fn count_channels(dsi: &Group) -> Result<usize> {
    let names = dsi.member_names()?;
    Ok(names.iter().filter(|n| is_channel_name(n)).count())
}

fn is_channel_name(name: &str) -> bool {
    name.strip_prefix("Channel ")
        .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
}

fn read_time_points(dsi: &Group) -> Result<Vec<NaiveDateTime>> {
    let time_info = dsi.group("TimeInfo")?;
    let count = read_uint_attr(&time_info, "FileTimePoints")?;

    let mut points = Vec::with_capacity(count);
    for i in 0..count {
        let raw = read_string_attr(&time_info, &format!("TimePoint{}", i + 1))?;
        let parsed = NaiveDateTime::parse_from_str(raw.trim(), TIMESTAMP_FORMAT)
            .map_err(|e| ConversionError::Metadata(format!("invalid timestamp {raw:?}: {e}")))?;
        points.push(parsed);
    }

    Ok(points)
}

/// Reads the optional square RGBA8888 thumbnail; anything malformed is
/// treated as absent.
pub fn read_thumbnail(file: &File) -> Option<Thumbnail> {
    let dataset = file.group("Thumbnail").ok()?.dataset("Data").ok()?;

    let shape = dataset.shape();
    if shape.len() != 2 || shape[0] == 0 || shape[1] != 4 * shape[0] {
        return None;
    }

    let rgba = dataset.read_raw::<u8>().ok()?;
    Some(Thumbnail {
        size: shape[0],
        rgba,
    })
}

pub fn open_timepoint(resolution_level: &Group, index: usize) -> Result<Group> {
    Ok(resolution_level.group(&format!("TimePoint {index}"))?)
}
