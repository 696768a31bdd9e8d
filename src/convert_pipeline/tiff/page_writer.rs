//! Paginated TIFF output over the `tiff` crate's directory encoder.
//!
//! The high-level image encoder only knows fixed color types, so pages are
//! written directory-by-directory: the sample count follows the dataset's
//! channel count and every directory carries page-sequence metadata.

use std::io::{Seek, Write};

use tiff::encoder::{TiffEncoder, TiffKind, TiffKindBig, TiffKindStandard};
use tiff::tags::Tag;
use tracing::debug;

use crate::convert_pipeline::common::error::{ConversionError, Result};
use crate::convert_pipeline::ims::metadata::Thumbnail;
use crate::convert_pipeline::tiff::types::TiffFormat;
use crate::convert_pipeline::tiff::writer::PageSink;

// TIFF 6.0 field values, written as raw shorts.
const COMPRESSION_NONE: u16 = 1;
const PHOTOMETRIC_RGB: u16 = 2;
const PLANAR_CONTIG: u16 = 1;
const RESUNIT_NONE: u16 = 1;
const SAMPLE_FORMAT_UINT: u16 = 1;
const EXTRASAMPLE_UNSPECIFIED: u16 = 0;
const EXTRASAMPLE_ASSOC_ALPHA: u16 = 1;
const SUBFILE_PAGE: u32 = 2;
const SUBFILE_REDUCED_IMAGE: u32 = 1;

/// Tag 297 (PageNumber), addressed numerically.
const TAG_PAGE_NUMBER: u16 = 297;

enum Encoder<W: Write + Seek> {
    Classic(TiffEncoder<W, TiffKindStandard>),
    Big(TiffEncoder<W, TiffKindBig>),
}

/// Writes interleaved depth slices as consecutive TIFF page directories.
///
/// Directories are finalized one page at a time, only after the page's full
/// sample data has been written; an aborted conversion never leaves a
/// half-described page behind.
pub struct TiffPageWriter<W: Write + Seek> {
    encoder: Encoder<W>,
    thumbnail: Option<Thumbnail>,
}

impl<W: Write + Seek> TiffPageWriter<W> {
    pub fn new(writer: W, format: TiffFormat) -> Result<Self> {
        let encoder = match format {
            TiffFormat::Classic => {
                Encoder::Classic(TiffEncoder::new(writer).map_err(encode_err)?)
            }
            TiffFormat::BigTiff => Encoder::Big(TiffEncoder::new_big(writer).map_err(encode_err)?),
        };
        Ok(Self {
            encoder,
            thumbnail: None,
        })
    }

    /// Attaches a preview written as a reduced-resolution directory right
    /// after the first page.
    pub fn set_thumbnail(&mut self, thumbnail: Thumbnail) {
        self.thumbnail = Some(thumbnail);
    }
}

impl<W: Write + Seek> PageSink for TiffPageWriter<W> {
    fn write_page(
        &mut self,
        width: usize,
        height: usize,
        channels: usize,
        page: usize,
        page_total: usize,
        data: &[u16],
    ) -> Result<()> {
        debug_assert_eq!(data.len(), width * height * channels);
        debug!(page, page_total, width, height, channels, "Encoding TIFF page");

        match &mut self.encoder {
            Encoder::Classic(enc) => {
                write_page_dir(enc, false, width, height, channels, page, page_total, data)
            }
            Encoder::Big(enc) => {
                write_page_dir(enc, true, width, height, channels, page, page_total, data)
            }
        }
        .map_err(encode_err)?;

        if page == 1 {
            if let Some(thumb) = self.thumbnail.take() {
                match &mut self.encoder {
                    Encoder::Classic(enc) => write_thumbnail_dir(enc, false, &thumb),
                    Encoder::Big(enc) => write_thumbnail_dir(enc, true, &thumb),
                }
                .map_err(encode_err)?;
            }
        }

        Ok(())
    }
}

fn encode_err(e: tiff::TiffError) -> ConversionError {
    ConversionError::PageWrite(e.to_string())
}

#[allow(clippy::too_many_arguments)]
fn write_page_dir<W: Write + Seek, K: TiffKind>(
    encoder: &mut TiffEncoder<W, K>,
    wide_offsets: bool,
    width: usize,
    height: usize,
    channels: usize,
    page: usize,
    page_total: usize,
    data: &[u16],
) -> std::result::Result<(), tiff::TiffError> {
    let mut dir = encoder.new_directory()?;

    dir.write_tag(Tag::ImageWidth, width as u32)?;
    dir.write_tag(Tag::ImageLength, height as u32)?;
    dir.write_tag(Tag::Compression, COMPRESSION_NONE)?;
    dir.write_tag(Tag::NewSubfileType, SUBFILE_PAGE)?;
    dir.write_tag(
        Tag::Unknown(TAG_PAGE_NUMBER),
        &[page as u16, page_total as u16][..],
    )?;
    dir.write_tag(Tag::ResolutionUnit, RESUNIT_NONE)?;
    dir.write_tag(Tag::PlanarConfiguration, PLANAR_CONTIG)?;

    dir.write_tag(Tag::SamplesPerPixel, channels as u16)?;
    let bits = vec![16u16; channels];
    dir.write_tag(Tag::BitsPerSample, &bits[..])?;
    let formats = vec![SAMPLE_FORMAT_UINT; channels];
    dir.write_tag(Tag::SampleFormat, &formats[..])?;

    // RGB regardless of the true channel semantics; everything past the
    // third channel is declared an unspecified extra sample.
    dir.write_tag(Tag::PhotometricInterpretation, PHOTOMETRIC_RGB)?;
    if channels > 3 {
        let extra = vec![EXTRASAMPLE_UNSPECIFIED; channels - 3];
        dir.write_tag(Tag::ExtraSamples, &extra[..])?;
    }

    dir.write_tag(Tag::RowsPerStrip, height as u32)?;
    let offset = dir.write_data(data)?;
    let byte_count = (data.len() * 2) as u64;
    if wide_offsets {
        dir.write_tag(Tag::StripOffsets, offset)?;
        dir.write_tag(Tag::StripByteCounts, byte_count)?;
    } else {
        dir.write_tag(Tag::StripOffsets, offset as u32)?;
        dir.write_tag(Tag::StripByteCounts, byte_count as u32)?;
    }

    dir.finish()
}

fn write_thumbnail_dir<W: Write + Seek, K: TiffKind>(
    encoder: &mut TiffEncoder<W, K>,
    wide_offsets: bool,
    thumb: &Thumbnail,
) -> std::result::Result<(), tiff::TiffError> {
    let mut dir = encoder.new_directory()?;
    let size = thumb.size as u32;

    dir.write_tag(Tag::ImageWidth, size)?;
    dir.write_tag(Tag::ImageLength, size)?;
    dir.write_tag(Tag::Compression, COMPRESSION_NONE)?;
    dir.write_tag(Tag::NewSubfileType, SUBFILE_REDUCED_IMAGE)?;
    dir.write_tag(Tag::ResolutionUnit, RESUNIT_NONE)?;
    dir.write_tag(Tag::PlanarConfiguration, PLANAR_CONTIG)?;

    dir.write_tag(Tag::SamplesPerPixel, 4u16)?;
    dir.write_tag(Tag::BitsPerSample, &[8u16, 8, 8, 8][..])?;
    dir.write_tag(Tag::SampleFormat, &[SAMPLE_FORMAT_UINT; 4][..])?;
    dir.write_tag(Tag::PhotometricInterpretation, PHOTOMETRIC_RGB)?;
    dir.write_tag(Tag::ExtraSamples, &[EXTRASAMPLE_ASSOC_ALPHA][..])?;

    dir.write_tag(Tag::RowsPerStrip, size)?;
    let offset = dir.write_data(&thumb.rgba[..])?;
    let byte_count = thumb.rgba.len() as u64;
    if wide_offsets {
        dir.write_tag(Tag::StripOffsets, offset)?;
        dir.write_tag(Tag::StripByteCounts, byte_count)?;
    } else {
        dir.write_tag(Tag::StripOffsets, offset as u32)?;
        dir.write_tag(Tag::StripByteCounts, byte_count as u32)?;
    }

    dir.finish()
}
