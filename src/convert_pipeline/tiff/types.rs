//! Conversion configuration types

use std::fmt;
use std::str::FromStr;

use crate::convert_pipeline::strategy::ConversionMethod;

/// Output container flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiffFormat {
    /// Classic TIFF with 32-bit offsets; capped at 4 GiB per file.
    Classic,
    /// BigTIFF with 64-bit offsets.
    #[default]
    BigTiff,
}

impl FromStr for TiffFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tiff" => Ok(TiffFormat::Classic),
            "bigtiff" => Ok(TiffFormat::BigTiff),
            other => Err(format!("unknown output format {other:?}")),
        }
    }
}

impl fmt::Display for TiffFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TiffFormat::Classic => write!(f, "tiff"),
            TiffFormat::BigTiff => write!(f, "bigtiff"),
        }
    }
}

/// Configuration for IMS to TIFF conversion
#[derive(Debug, Clone)]
pub struct ConversionConfig {
    /// Conversion strategy driving reads and interleaving
    pub method: ConversionMethod,
    /// Output container flavor
    pub format: TiffFormat,
    /// Whether to validate volume dimensions before conversion
    pub validate_dimensions: bool,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            method: ConversionMethod::default(),
            format: TiffFormat::default(),
            validate_dimensions: true,
        }
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::default()
    }
}

/// Builder for ConversionConfig
#[derive(Default)]
pub struct ConversionConfigBuilder {
    method: Option<ConversionMethod>,
    format: Option<TiffFormat>,
    validate_dimensions: Option<bool>,
}

impl ConversionConfigBuilder {
    pub fn method(mut self, method: ConversionMethod) -> Self {
        self.method = Some(method);
        self
    }

    pub fn format(mut self, format: TiffFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn validate_dimensions(mut self, validate: bool) -> Self {
        self.validate_dimensions = Some(validate);
        self
    }

    pub fn build(self) -> ConversionConfig {
        let default = ConversionConfig::default();
        ConversionConfig {
            method: self.method.unwrap_or(default.method),
            format: self.format.unwrap_or(default.format),
            validate_dimensions: self
                .validate_dimensions
                .unwrap_or(default.validate_dimensions),
        }
    }
}
