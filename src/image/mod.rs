//! Image loading, pixel-buffer conversion, resizing and saving.

mod buffer;
mod codec;
mod load;
mod resize;
mod save;

pub use buffer::{PixelBuffer, PixelFormat};
pub use codec::{decode_pixel_buffer, encode_pixel_buffer, encode_pixel_buffer_with, EncodeOptions};
pub use load::load_image;
pub use resize::resize_image;
pub use save::save_image;

/// Side length of the square input the bundled style models expect.
pub const MODEL_INPUT_SIZE: u32 = 700;

/// Bytes per packed 32-bit pixel.
pub const BYTES_PER_PIXEL: usize = 4;

/// Default row alignment of pixel buffers, in bytes.
pub const DEFAULT_ROW_ALIGNMENT: usize = 64;
