//! IMS to TIFF conversion pipeline module
//!
//! This module provides a structured approach to converting Imaris IMS
//! captures into multi-page TIFFs, with separate modules for container
//! access, sample interleaving, TIFF writing, and conversion orchestration.

pub mod common;
pub mod conversions;
pub mod ims;
pub mod interleave;
pub mod strategy;
pub mod tiff;

#[cfg(test)]
pub(crate) mod test_support;

pub use common::{ConversionError, Result};

pub use ims::{ImsInfo, VolumeDims};

pub use interleave::{InterleavedBlock, PlanarVolume};

pub use strategy::ConversionMethod;

pub use tiff::{ConversionConfig, ConversionConfigBuilder, PageSink, TiffFormat, TiffPageWriter};

pub use conversions::ImsToTiffPipeline;
