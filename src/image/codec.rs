//! Conversion between bitmaps and packed pixel buffers.

use image::{imageops::FilterType, DynamicImage, GenericImageView, Rgba, RgbaImage};

use crate::error::{Error, Result};

use super::{PixelBuffer, PixelFormat, BYTES_PER_PIXEL, DEFAULT_ROW_ALIGNMENT, MODEL_INPUT_SIZE};

/// Geometry and layout of an encoded model input buffer.
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub row_alignment: usize,
    pub filter: FilterType,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            width: MODEL_INPUT_SIZE,
            height: MODEL_INPUT_SIZE,
            format: PixelFormat::Argb32,
            row_alignment: DEFAULT_ROW_ALIGNMENT,
            filter: FilterType::Lanczos3,
        }
    }
}

/// Resize an image to `width` x `height` and pack it into an ARGB buffer.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the buffer cannot be produced.
pub fn encode_pixel_buffer(img: &DynamicImage, width: u32, height: u32) -> Result<PixelBuffer> {
    encode_pixel_buffer_with(
        img,
        &EncodeOptions {
            width,
            height,
            ..EncodeOptions::default()
        },
    )
}

/// Resize an image and pack it into a buffer described by `options`.
///
/// The image is stretched to fill the target exactly; aspect ratio is not
/// preserved. For formats whose alpha byte is skipped, the source is
/// composited over opaque black and the alpha byte is written as `0xFF`.
///
/// # Errors
///
/// Returns [`Error::Encoding`] if the source or target has a zero dimension
/// or the buffer cannot be allocated.
pub fn encode_pixel_buffer_with(img: &DynamicImage, options: &EncodeOptions) -> Result<PixelBuffer> {
    let (src_width, src_height) = img.dimensions();
    if src_width == 0 || src_height == 0 {
        return Err(Error::Encoding {
            reason: format!("source image is {src_width}x{src_height}"),
        });
    }

    let mut buffer = PixelBuffer::new(
        options.width,
        options.height,
        options.format,
        options.row_alignment,
    )?;

    let resized = if (src_width, src_height) == (options.width, options.height) {
        img.to_rgba8()
    } else {
        img.resize_exact(options.width, options.height, options.filter)
            .to_rgba8()
    };

    let format = options.format;
    let [r_off, g_off, b_off] = format.rgb_offsets();
    let a_off = format.alpha_offset();
    let row_bytes = options.width as usize * BYTES_PER_PIXEL;
    let stride = buffer.bytes_per_row();

    for (src_row, dst_row) in resized
        .rows()
        .zip(buffer.as_bytes_mut().chunks_exact_mut(stride))
    {
        for (pixel, dst) in src_row.zip(dst_row[..row_bytes].chunks_exact_mut(BYTES_PER_PIXEL)) {
            let [r, g, b, a] = pixel.0;
            if format.has_alpha() {
                dst[r_off] = r;
                dst[g_off] = g;
                dst[b_off] = b;
                dst[a_off] = a;
            } else {
                dst[r_off] = over_black(r, a);
                dst[g_off] = over_black(g, a);
                dst[b_off] = over_black(b, a);
                dst[a_off] = u8::MAX;
            }
        }
    }

    tracing::debug!(
        "Encoded {src_width}x{src_height} image into {}x{} {format} buffer",
        options.width,
        options.height
    );

    Ok(buffer)
}

/// Convert a packed pixel buffer into an RGBA image.
///
/// # Errors
///
/// Returns [`Error::Decoding`] if the buffer geometry is inconsistent with
/// its backing data.
pub fn decode_pixel_buffer(buffer: &PixelBuffer) -> Result<RgbaImage> {
    buffer.validate()?;

    let (width, height) = buffer.dimensions();
    let format = buffer.format();
    let [r_off, g_off, b_off] = format.rgb_offsets();
    let a_off = format.alpha_offset();

    let mut img = RgbaImage::new(width, height);
    for (y, dst_row) in (0..height).zip(img.rows_mut()) {
        let src_row = buffer.row(y).ok_or_else(|| Error::Decoding {
            reason: format!("row {y} is missing"),
        })?;

        for (dst, src) in dst_row.zip(src_row.chunks_exact(BYTES_PER_PIXEL)) {
            let alpha = if format.has_alpha() { src[a_off] } else { u8::MAX };
            *dst = Rgba([src[r_off], src[g_off], src[b_off], alpha]);
        }
    }

    Ok(img)
}

/// Composite one channel of a straight-alpha pixel over black.
#[inline]
#[allow(clippy::cast_possible_truncation)]
fn over_black(channel: u8, alpha: u8) -> u8 {
    // Safe: (255 * 255 + 127) / 255 == 255
    ((u16::from(channel) * u16::from(alpha) + 127) / 255) as u8
}
