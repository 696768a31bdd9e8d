//! Pipeline conversions module
//!
//! This module contains orchestration logic for converting whole IMS
//! datasets into per-timepoint TIFF files.

mod ims_to_tiff;

pub use ims_to_tiff::ImsToTiffPipeline;
