//! Raw packed pixel buffers exchanged with style models.

use std::fmt;
use std::ops::Range;

use crate::error::{Error, Result};

use super::BYTES_PER_PIXEL;

/// Channel layout of a 32-bit packed pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// A, R, G, B bytes. The alpha byte is skipped.
    #[default]
    Argb32,
    /// B, G, R, A bytes. The alpha byte is skipped.
    Bgra32,
    /// R, G, B, A bytes with a meaningful alpha channel.
    Rgba32,
}

impl PixelFormat {
    /// Byte offsets of the red, green and blue channels within a pixel.
    #[must_use]
    pub const fn rgb_offsets(self) -> [usize; 3] {
        match self {
            Self::Argb32 => [1, 2, 3],
            Self::Bgra32 => [2, 1, 0],
            Self::Rgba32 => [0, 1, 2],
        }
    }

    /// Byte offset of the alpha channel within a pixel.
    #[must_use]
    pub const fn alpha_offset(self) -> usize {
        match self {
            Self::Argb32 => 0,
            Self::Bgra32 | Self::Rgba32 => 3,
        }
    }

    /// Whether the alpha byte carries coverage or is ignored.
    #[must_use]
    pub const fn has_alpha(self) -> bool {
        matches!(self, Self::Rgba32)
    }

    /// Four-character code naming the layout.
    #[must_use]
    pub const fn fourcc(self) -> &'static str {
        match self {
            Self::Argb32 => "ARGB",
            Self::Bgra32 => "BGRA",
            Self::Rgba32 => "RGBA",
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fourcc())
    }
}

/// A grid of 32-bit packed pixels with an explicit row stride.
///
/// Rows are stored top-down. Each row occupies `bytes_per_row` bytes, of
/// which the first `width * 4` hold pixels and the remainder is padding.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    bytes_per_row: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Allocate a zeroed buffer with rows padded to `row_alignment` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Encoding`] if a dimension is zero, the alignment is
    /// zero, or the total size overflows.
    pub fn new(width: u32, height: u32, format: PixelFormat, row_alignment: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::Encoding {
                reason: format!("cannot allocate a {width}x{height} pixel buffer"),
            });
        }
        if row_alignment == 0 {
            return Err(Error::Encoding {
                reason: "row alignment must be non-zero".to_string(),
            });
        }

        let bytes_per_row = (width as usize)
            .checked_mul(BYTES_PER_PIXEL)
            .and_then(|row| row.checked_next_multiple_of(row_alignment))
            .ok_or_else(|| Error::Encoding {
                reason: format!("row of {width} pixels overflows"),
            })?;
        let len = bytes_per_row
            .checked_mul(height as usize)
            .ok_or_else(|| Error::Encoding {
                reason: format!("{width}x{height} pixel buffer overflows"),
            })?;

        Ok(Self {
            width,
            height,
            bytes_per_row,
            format,
            data: vec![0; len],
        })
    }

    /// Wrap existing bytes without validating them.
    ///
    /// Model implementations use this to hand back raw output. Consistency
    /// between the declared geometry and `data` is checked when decoding.
    #[must_use]
    pub const fn from_raw(
        width: u32,
        height: u32,
        bytes_per_row: usize,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Self {
        Self {
            width,
            height,
            bytes_per_row,
            format,
            data,
        }
    }

    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[must_use]
    pub const fn bytes_per_row(&self) -> usize {
        self.bytes_per_row
    }

    #[must_use]
    pub const fn format(&self) -> PixelFormat {
        self.format
    }

    /// The backing bytes, including row padding.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Mutable access to the backing bytes, including row padding.
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Pixel bytes of row `y`, excluding padding.
    ///
    /// Returns `None` if `y` is out of range or the backing data is too short.
    #[must_use]
    pub fn row(&self, y: u32) -> Option<&[u8]> {
        let range = self.row_range(y)?;
        self.data.get(range)
    }

    /// Mutable pixel bytes of row `y`, excluding padding.
    pub fn row_mut(&mut self, y: u32) -> Option<&mut [u8]> {
        let range = self.row_range(y)?;
        self.data.get_mut(range)
    }

    /// Byte range of row `y`, or `None` if it is out of range or overflows.
    fn row_range(&self, y: u32) -> Option<Range<usize>> {
        if y >= self.height {
            return None;
        }
        let start = (y as usize).checked_mul(self.bytes_per_row)?;
        let end = start.checked_add(self.row_len()?)?;
        Some(start..end)
    }

    /// Bytes of pixel data in one row.
    fn row_len(&self) -> Option<usize> {
        (self.width as usize).checked_mul(BYTES_PER_PIXEL)
    }

    /// Check that the declared geometry is backed by enough bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Decoding`] describing the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::Decoding {
                reason: format!("empty {}x{} pixel buffer", self.width, self.height),
            });
        }

        let min_row = self.row_len().ok_or_else(|| Error::Decoding {
            reason: format!("row of {} pixels overflows", self.width),
        })?;
        if self.bytes_per_row < min_row {
            return Err(Error::Decoding {
                reason: format!(
                    "row stride {} is smaller than {} bytes needed for {} pixels",
                    self.bytes_per_row, min_row, self.width
                ),
            });
        }

        let expected = self
            .bytes_per_row
            .checked_mul(self.height as usize)
            .ok_or_else(|| Error::Decoding {
                reason: format!(
                    "row stride {} x {} rows overflows",
                    self.bytes_per_row, self.height
                ),
            })?;
        if self.data.len() < expected {
            return Err(Error::Decoding {
                reason: format!(
                    "pixel buffer holds {} bytes, expected {expected}",
                    self.data.len()
                ),
            });
        }

        Ok(())
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes_per_row", &self.bytes_per_row)
            .field("format", &self.format)
            .field("len", &self.data.len())
            .finish()
    }
}
