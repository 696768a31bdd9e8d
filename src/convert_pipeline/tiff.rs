//! TIFF writing module
//!
//! This module provides paginated TIFF output for interleaved depth slices,
//! in both classic and BigTIFF flavors.

pub mod page_writer;
pub mod types;
pub mod writer;

pub use page_writer::TiffPageWriter;
pub use types::{ConversionConfig, ConversionConfigBuilder, TiffFormat};
pub use writer::PageSink;
