//! Test images and palette constants.

use image::{ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

/// Perler "White" (P01)
pub const WHITE: Rgba<u8> = Rgba([0xF1, 0xF1, 0xF1, 255]);
/// Perler "Red" (P05)
pub const RED: Rgba<u8> = Rgba([0xBF, 0x2E, 0x40, 255]);

/// 8×8 sprite on a white backdrop with a red 4×4 center, upscaled by `scale`
pub fn sprite_png(scale: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(8 * scale, 8 * scale, |x, y| {
        let (sx, sy) = (x / scale, y / scale);
        if (2..6).contains(&sx) && (2..6).contains(&sy) {
            RED
        } else {
            WHITE
        }
    });
    encode(&image, ImageFormat::Png)
}

/// Same sprite as [`sprite_png`] in another container format
pub fn sprite_as(format: ImageFormat) -> Vec<u8> {
    let image = RgbaImage::from_fn(8, 8, |x, y| {
        if (2..6).contains(&x) && (2..6).contains(&y) {
            RED
        } else {
            WHITE
        }
    });
    encode(&image, format)
}

/// 8×8 checkerboard upscaled by `scale`; no coarser grid fits it
pub fn checker_png(scale: u32) -> Vec<u8> {
    let image = RgbaImage::from_fn(8 * scale, 8 * scale, |x, y| {
        if (x / scale + y / scale) % 2 == 1 {
            RED
        } else {
            WHITE
        }
    });
    encode(&image, ImageFormat::Png)
}

/// Solid image of one color
pub fn solid_png(width: u32, height: u32, color: Rgba<u8>) -> Vec<u8> {
    encode(&RgbaImage::from_pixel(width, height, color), ImageFormat::Png)
}

pub fn encode(image: &RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    match format {
        // BMP and PNG keep RGBA; the rest need RGB
        ImageFormat::Png | ImageFormat::Bmp => image.write_to(&mut buf, format),
        _ => image::DynamicImage::ImageRgba8(image.clone())
            .into_rgb8()
            .write_to(&mut buf, format),
    }
    .expect("Failed to encode test image");
    buf.into_inner()
}
