use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversionError {
    #[error("Failed to access dataset storage: {0}")]
    Storage(#[from] hdf5::Error),

    #[error("Invalid dataset metadata: {0}")]
    Metadata(String),

    #[error("Invalid volume dimensions: x={0}, y={1}, z={2}")]
    InvalidDimensions(usize, usize, usize),

    #[error(
        "Storage chunk shape of channel {channel} is {found:?}, other channels use {expected:?}"
    )]
    ChunkMismatch {
        channel: usize,
        expected: [usize; 3],
        found: [usize; 3],
    },

    #[error("Dataset of channel {0} is not stored in chunked layout")]
    NotChunked(usize),

    #[error("Failed to write TIFF page: {0}")]
    PageWrite(String),

    #[error("Failed to create output file: {0}")]
    OutputWrite(String),

    #[error("Channel count {count} exceeds device capacity of {max}")]
    ChannelCapacity { count: usize, max: usize },

    #[error("GPU error: {0}")]
    Gpu(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConversionError>;
