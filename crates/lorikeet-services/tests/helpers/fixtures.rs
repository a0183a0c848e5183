//! Test fixtures: real images encoded with the `image` crate.

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::io::Cursor;

/// Solid-colour image of the given size, encoded as `format`.
pub fn encoded_image(format: ImageFormat, width: u32, height: u32, shade: u8) -> Vec<u8> {
    let img = match format {
        // JPEG and BMP encoders here are exercised with RGB input
        ImageFormat::Jpeg | ImageFormat::Bmp => {
            DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([shade, 120, 40])))
        }
        _ => DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            width,
            height,
            Rgba([shade, 120, 40, 255]),
        )),
    };
    let mut buffer = Vec::new();
    img.write_to(&mut Cursor::new(&mut buffer), format)
        .expect("Failed to encode fixture image");
    buffer
}

pub fn png(width: u32, height: u32, shade: u8) -> Vec<u8> {
    encoded_image(ImageFormat::Png, width, height, shade)
}

/// Minimal PDF; sniffs as application/pdf.
pub fn pdf() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n"
        .to_vec()
}
