//! IMS container access module
//!
//! Navigates the Imaris HDF5 layout: metadata discovery under `DataSetInfo`
//! and per-channel sample reads under `DataSet/ResolutionLevel 0`.

pub mod metadata;
pub mod reader;
pub mod types;

pub use metadata::{ImsInfo, Thumbnail, open_timepoint, read_image_info, read_thumbnail};
pub use reader::{open_channel, read_channel};
pub use types::VolumeDims;
