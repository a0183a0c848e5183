//! Image codec - MIME sniffing, decode, resize and encode
//!
//! All methods are synchronous and CPU-bound; callers run them on the
//! blocking thread pool.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};
use lorikeet_core::{ImageMimeType, OutputFormat, ProcessingError};

/// Reported when the content matches no known signature
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

pub trait ImageCodec: Send + Sync {
    /// MIME type sniffed from the leading bytes, ignoring any client-supplied
    /// name or type.
    fn detect_mime_type(&self, data: &[u8]) -> String;

    /// Natural dimensions without decoding pixel data
    fn probe_dimensions(
        &self,
        data: &[u8],
        mime_type: ImageMimeType,
    ) -> Result<(u32, u32), ProcessingError>;

    fn decode(&self, data: &[u8], mime_type: ImageMimeType)
        -> Result<DynamicImage, ProcessingError>;

    fn resize(&self, img: &DynamicImage, width: u32, height: u32) -> DynamicImage;

    fn encode(
        &self,
        img: &DynamicImage,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Vec<u8>, ProcessingError>;
}

/// Codec backed by the `image` crate, with `webp` for lossy WebP output
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterCodec;

impl RasterCodec {
    pub fn new() -> Self {
        RasterCodec
    }

    fn image_format(mime_type: ImageMimeType) -> ImageFormat {
        match mime_type {
            ImageMimeType::Gif => ImageFormat::Gif,
            ImageMimeType::Jpeg => ImageFormat::Jpeg,
            ImageMimeType::Png => ImageFormat::Png,
            ImageMimeType::Bmp => ImageFormat::Bmp,
            ImageMimeType::WebP => ImageFormat::WebP,
        }
    }

    fn decode_error(mime_type: ImageMimeType, err: impl ToString) -> ProcessingError {
        ProcessingError::Decode {
            mime_type: mime_type.to_string(),
            message: err.to_string(),
        }
    }

    fn encode_error(format: OutputFormat, err: impl ToString) -> ProcessingError {
        ProcessingError::Encode {
            format: format.to_string(),
            message: err.to_string(),
        }
    }

    /// WebP caps each side at 16383 px; larger rasters fail here instead of
    /// panicking inside the encoder.
    fn encode_webp(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, ProcessingError> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder
            .encode_simple(false, quality.clamp(0.0, 100.0))
            .map_err(|e| {
                Self::encode_error(
                    OutputFormat::WebP,
                    format!("{:?} ({}x{})", e, width, height),
                )
            })?;

        Ok(webp_data.to_vec())
    }

    fn encode_jpeg(img: &DynamicImage, quality: f32) -> Result<Vec<u8>, ProcessingError> {
        let mut buffer = Vec::new();
        // JPEG has no alpha channel
        let rgb_img = DynamicImage::ImageRgb8(img.to_rgb8());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1.0, 100.0) as u8);

        rgb_img
            .write_with_encoder(encoder)
            .map_err(|e| Self::encode_error(OutputFormat::Jpeg, e))?;

        Ok(buffer)
    }

    fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ProcessingError> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        img.write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| Self::encode_error(OutputFormat::Png, e))?;

        Ok(buffer)
    }
}

impl ImageCodec for RasterCodec {
    fn detect_mime_type(&self, data: &[u8]) -> String {
        match infer::get(data) {
            Some(kind) => kind.mime_type().to_string(),
            None => UNKNOWN_MIME_TYPE.to_string(),
        }
    }

    fn probe_dimensions(
        &self,
        data: &[u8],
        mime_type: ImageMimeType,
    ) -> Result<(u32, u32), ProcessingError> {
        ImageReader::with_format(Cursor::new(data), Self::image_format(mime_type))
            .into_dimensions()
            .map_err(|e| Self::decode_error(mime_type, e))
    }

    fn decode(
        &self,
        data: &[u8],
        mime_type: ImageMimeType,
    ) -> Result<DynamicImage, ProcessingError> {
        image::load_from_memory_with_format(data, Self::image_format(mime_type))
            .map_err(|e| Self::decode_error(mime_type, e))
    }

    fn resize(&self, img: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        if img.dimensions() == (width, height) {
            return img.clone();
        }
        img.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn encode(
        &self,
        img: &DynamicImage,
        format: OutputFormat,
        quality: f32,
    ) -> Result<Vec<u8>, ProcessingError> {
        match format {
            OutputFormat::WebP => Self::encode_webp(img, quality),
            OutputFormat::Jpeg => Self::encode_jpeg(img, quality),
            OutputFormat::Png => Self::encode_png(img),
        }
    }
}
