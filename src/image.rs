//! A lossless bijection between a Base64 string and a PNG image, three
//! Base64 characters packed per RGBA pixel.

use image::{ImageBuffer, ImageFormat, Rgba};
use std::io::Cursor;
use tracing::instrument;

use crate::error::CryptoImgError;

/// Hard ceiling on RGBA pixel-buffer size: `width*height*4 <= 1.5 GiB`.
const MAX_PIXEL_BUFFER_BYTES: u64 = 1536 * 1024 * 1024;
const MAX_DIMENSION: u32 = 16_384;
/// Threshold past which the square-ish layout reshapes into a wide fixed layout.
const RESHAPE_THRESHOLD: u32 = 1024;
const WIDE_WIDTH_CAP: u32 = 2048;
const WIDE_HEIGHT_CAP: u32 = 2048;

/// Pixel dimensions chosen for a given Base64 payload length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Plan `(width, height)` for `base64_len` characters.
///
/// Square-ish for small inputs; past `max(w,h) > 1024` reshapes to a capped
/// wide layout so a single row never grows pathologically long.
pub fn plan_dimensions(base64_len: usize) -> Result<Dimensions, CryptoImgError> {
    let pixel_count = div_ceil_usize(base64_len, 3).max(1) as u64;

    let mut width = isqrt_ceil(pixel_count);
    let mut height = div_ceil_u64(pixel_count, width);

    if width.max(height) > RESHAPE_THRESHOLD as u64 {
        width = isqrt_ceil(pixel_count.saturating_mul(3).div_ceil(2)).min(WIDE_WIDTH_CAP as u64);
        height = div_ceil_u64(pixel_count, width);
        if height > WIDE_HEIGHT_CAP as u64 {
            height = WIDE_HEIGHT_CAP as u64;
            width = div_ceil_u64(pixel_count, height);
        }
    }

    if width > MAX_DIMENSION as u64 || height > MAX_DIMENSION as u64 {
        return Err(CryptoImgError::MemoryLimit);
    }

    let buffer_bytes = width.saturating_mul(height).saturating_mul(4);
    if buffer_bytes > MAX_PIXEL_BUFFER_BYTES {
        return Err(CryptoImgError::MemoryLimit);
    }

    Ok(Dimensions { width: width as u32, height: height as u32 })
}

/// Encode a standard-alphabet Base64 string into a lossless PNG.
///
/// Three characters pack into one pixel (`R, G, B`, `A = 255`); a short final
/// triple is padded with zero bytes. Pixels beyond the data are filled with
/// `(0, 0, 0, 255)`, which the decoder reads as the termination sentinel.
#[instrument(skip(base64), fields(base64_len = base64.len()))]
pub fn encode_to_png(base64: &str) -> Result<Vec<u8>, CryptoImgError> {
    let bytes = base64.as_bytes();
    let dims = plan_dimensions(bytes.len())?;

    let mut img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(dims.width, dims.height);
    let pixel_count = (dims.width as u64) * (dims.height as u64);
    let data_pixels = div_ceil_usize(bytes.len(), 3) as u64;

    for i in 0..pixel_count {
        let x = (i % dims.width as u64) as u32;
        let y = (i / dims.width as u64) as u32;

        let pixel = if i < data_pixels {
            let base = (i * 3) as usize;
            let r = *bytes.get(base).unwrap_or(&0);
            let g = *bytes.get(base + 1).unwrap_or(&0);
            let b = *bytes.get(base + 2).unwrap_or(&0);
            Rgba([r, g, b, 255])
        } else {
            Rgba([0, 0, 0, 255])
        };
        img.put_pixel(x, y, pixel);
    }

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .map_err(|_| CryptoImgError::ProcessingError)?;
    Ok(out.into_inner())
}

/// Decode a PNG produced by [`encode_to_png`] back into its Base64 string.
///
/// Stops at the first all-zero-RGB pixel (the termination sentinel); a PNG
/// whose very first pixel is `(0,0,0)` legitimately decodes to an empty
/// string.
#[instrument(skip(png_bytes), fields(png_len = png_bytes.len()))]
pub fn decode_from_png(png_bytes: &[u8]) -> Result<String, CryptoImgError> {
    let img = image::load_from_memory_with_format(png_bytes, ImageFormat::Png)
        .map_err(|_| CryptoImgError::CorruptedImage)?
        .to_rgba8();

    let mut out = Vec::with_capacity((img.width() as usize) * (img.height() as usize) * 3);
    for pixel in img.pixels() {
        let [r, g, b, _a] = pixel.0;
        if r == 0 && g == 0 && b == 0 {
            break;
        }
        if r != 0 {
            out.push(r);
        }
        if g != 0 {
            out.push(g);
        }
        if b != 0 {
            out.push(b);
        }
    }

    String::from_utf8(out).map_err(|_| CryptoImgError::CorruptedImage)
}

fn div_ceil_usize(a: usize, b: usize) -> usize {
    a.div_ceil(b)
}

fn div_ceil_u64(a: u64, b: u64) -> u64 {
    a.div_ceil(b)
}

/// Smallest `w` such that `w*w >= n`.
fn isqrt_ceil(n: u64) -> u64 {
    if n == 0 {
        return 1;
    }
    let mut w = (n as f64).sqrt().ceil() as u64;
    while w * w < n {
        w += 1;
    }
    while w > 1 && (w - 1) * (w - 1) >= n {
        w -= 1;
    }
    w.max(1)
}
