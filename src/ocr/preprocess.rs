use image::{GrayImage, ImageBuffer, Luma, Rgba, RgbaImage};

use crate::config::PixelRect;

/// Converts image to black and white by average brightness.
///
/// Pixels whose mean RGB value is strictly above `threshold` become white,
/// everything else black. The battle report renders light glyphs on a dark
/// panel, so this keeps the digits and names and drops the panel texture.
pub fn binarize(img: &RgbaImage, threshold: u8) -> GrayImage {
    let (width, height) = img.dimensions();
    let mut output = ImageBuffer::new(width, height);

    for (x, y, pixel) in img.enumerate_pixels() {
        let sum = pixel[0] as u16 + pixel[1] as u16 + pixel[2] as u16;
        let value = if sum > threshold as u16 * 3 { 255u8 } else { 0u8 };
        output.put_pixel(x, y, Luma([value]));
    }

    output
}

/// Crops a sub-region in absolute pixel coordinates, clamped to image bounds.
pub fn crop_pixels(img: &ImageBuffer<Rgba<u8>, Vec<u8>>, region: &PixelRect) -> RgbaImage {
    let (w, h) = img.dimensions();

    let x0 = region.x.min(w);
    let y0 = region.y.min(h);
    let rw = region.width.min(w - x0);
    let rh = region.height.min(h - y0);

    image::imageops::crop_imm(img, x0, y0, rw, rh).to_image()
}
