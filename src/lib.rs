//! Converter for Imaris IMS microscopy captures into per-timepoint
//! multi-page TIFF files.

pub mod convert_pipeline;
pub mod logger;
