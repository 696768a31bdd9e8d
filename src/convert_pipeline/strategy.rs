//! Conversion strategies
//!
//! Four interchangeable ways of pulling a timepoint's samples out of storage
//! and into pixel-interleaved pages. They share one contract (emit exactly
//! `dims.z` ordered pages to the sink) and differ only in read/transform
//! granularity, trading memory footprint against I/O pattern.

mod bigload;
mod chunked;
mod gpu;
mod hyperslab;


use std::fmt;
use std::str::FromStr;

use hdf5::Group;

use crate::convert_pipeline::common::error::Result;
use crate::convert_pipeline::ims::types::VolumeDims;
use crate::convert_pipeline::tiff::writer::PageSink;

/// How a timepoint is read and interleaved. Closed set; new strategies are
/// added here, not registered at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionMethod {
    /// Read the whole volume planar, interleave in memory, then write.
    /// Two volume-sized buffers; fastest when the timepoint fits in memory.
    BigLoad,
    /// Read storage-chunk-aligned tiles straight into interleaved position.
    /// One Z-chunk-row of memory; I/O matches the on-disk tiling.
    #[default]
    Chunked,
    /// Read one depth slice per channel at a time, page by page.
    /// Smallest footprint, most read calls.
    Hyperslab,
    /// Read planar, interleave on a CUDA device, read back, then write.
    Gpu,
}

impl ConversionMethod {
    /// Converts one timepoint, emitting pages `1..=dims.z` to `sink` in
    /// increasing depth order.
    pub fn convert(
        &self,
        sink: &mut dyn PageSink,
        timepoint: &Group,
        dims: VolumeDims,
        channels: usize,
    ) -> Result<()> {
        match self {
            ConversionMethod::BigLoad => bigload::convert(sink, timepoint, dims, channels),
            ConversionMethod::Chunked => chunked::convert(sink, timepoint, dims, channels),
            ConversionMethod::Hyperslab => hyperslab::convert(sink, timepoint, dims, channels),
            ConversionMethod::Gpu => gpu::convert(sink, timepoint, dims, channels),
        }
    }
}

impl FromStr for ConversionMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "bigload" => Ok(ConversionMethod::BigLoad),
            "chunked" => Ok(ConversionMethod::Chunked),
            "hyperslab" => Ok(ConversionMethod::Hyperslab),
            "gpu" => Ok(ConversionMethod::Gpu),
            other => Err(format!("unknown conversion method {other:?}")),
        }
    }
}

impl fmt::Display for ConversionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConversionMethod::BigLoad => "bigload",
            ConversionMethod::Chunked => "chunked",
            ConversionMethod::Hyperslab => "hyperslab",
            ConversionMethod::Gpu => "gpu",
        };
        write!(f, "{name}")
    }
}
