//! ONNX Runtime backed style model.

use std::path::Path;
use std::str::FromStr;
use std::sync::Mutex;

use ndarray::Array4;
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::{PixelBuffer, PixelFormat, BYTES_PER_PIXEL, DEFAULT_ROW_ALIGNMENT};

use super::StyleModel;

/// Number of colour channels in model tensors.
const RGB_CHANNELS: usize = 3;

/// Value range of the model's image tensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorRange {
    /// Channels in [0, 255], the convention of exported fast style-transfer networks.
    #[default]
    Byte,
    /// Channels in [0, 1].
    Unit,
}

impl TensorRange {
    /// Multiplier from a byte channel to a tensor value.
    #[must_use]
    pub const fn scale(self) -> f32 {
        match self {
            Self::Byte => 1.0,
            Self::Unit => 1.0 / 255.0,
        }
    }

    /// Convert a tensor value back to a byte with clamping.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_byte(self, value: f32) -> u8 {
        // Safe: clamped to [0, 255] range before casting
        (value / self.scale()).round().clamp(0.0, 255.0) as u8
    }
}

impl FromStr for TensorRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "byte" | "0-255" => Ok(Self::Byte),
            "unit" | "0-1" => Ok(Self::Unit),
            _ => Err(Error::InvalidParameter {
                name: "input_range".to_string(),
                reason: format!("unknown tensor range {s:?}, expected byte or unit"),
            }),
        }
    }
}

/// A style-transfer network loaded into an ONNX Runtime session.
///
/// The model's first input receives an NCHW `(1, 3, H, W)` RGB tensor and
/// its first output is read back as an RGB tensor of the same layout.
/// Running a session needs exclusive access, so the session sits behind a
/// mutex and concurrent `predict` calls queue on it.
pub struct OnnxStyleModel {
    name: String,
    session: Mutex<Session>,
    input_size: (u32, u32),
    range: TensorRange,
}

impl OnnxStyleModel {
    /// Load a model from an `.onnx` file.
    ///
    /// # Errors
    ///
    /// Returns an error if ONNX Runtime cannot create a session for the file.
    pub fn load<P: AsRef<Path>>(path: P, input_size: (u32, u32), range: TensorRange) -> Result<Self> {
        let path = path.as_ref();
        let name = path
            .file_stem()
            .map_or_else(|| path.display().to_string(), |s| s.to_string_lossy().into_owned());

        tracing::info!("Loading style model {name} from {}", path.display());

        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                name: name.clone(),
                source,
            })?
            .commit_from_file(path)
            .map_err(|source| Error::ModelLoad {
                name: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            session: Mutex::new(session),
            input_size,
            range,
        })
    }
}

impl std::fmt::Debug for OnnxStyleModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxStyleModel")
            .field("name", &self.name)
            .field("input_size", &self.input_size)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl StyleModel for OnnxStyleModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn input_size(&self) -> (u32, u32) {
        self.input_size
    }

    #[allow(clippy::significant_drop_tightening)]
    fn predict(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        let tensor = buffer_to_tensor(input, self.range)?;
        let input_value =
            Tensor::from_array(tensor).map_err(|e| Error::inference(&self.name, e))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| Error::inference(&self.name, "session lock poisoned"))?;

        let outputs = session
            .run(ort::inputs![input_value])
            .map_err(|e| Error::inference(&self.name, e))?;

        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "styled image output".to_string(),
                actual: "no output".to_string(),
            })?;

        let (shape_info, data) = output
            .try_extract_tensor::<f32>()
            .map_err(|e| Error::inference(&self.name, e))?;

        let dims = shape_info
            .iter()
            .map(|&d| usize::try_from(d))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|_| Error::ShapeMismatch {
                expected: "non-negative dimensions".to_string(),
                actual: format!("{:?}", shape_info.iter().collect::<Vec<_>>()),
            })?;

        tensor_to_buffer(&dims, data, self.range)
    }
}

/// Unpack a pixel buffer into an NCHW RGB tensor.
fn buffer_to_tensor(buffer: &PixelBuffer, range: TensorRange) -> Result<Array4<f32>> {
    buffer.validate().map_err(|e| Error::inference("input", e))?;

    let (width, height) = buffer.dimensions();
    let (w, h) = (width as usize, height as usize);
    let offsets = buffer.format().rgb_offsets();
    let scale = range.scale();

    let mut tensor = Array4::<f32>::zeros((1, RGB_CHANNELS, h, w));
    for y in 0..height {
        let row = buffer.row(y).ok_or_else(|| Error::inference("input", "row out of bounds"))?;
        for (x, pixel) in row.chunks_exact(BYTES_PER_PIXEL).enumerate() {
            for (c, &offset) in offsets.iter().enumerate() {
                tensor[[0, c, y as usize, x]] = f32::from(pixel[offset]) * scale;
            }
        }
    }

    Ok(tensor)
}

/// Pack an NCHW RGB tensor into an ARGB pixel buffer.
fn tensor_to_buffer(dims: &[usize], data: &[f32], range: TensorRange) -> Result<PixelBuffer> {
    let [batch, channels, h, w] = dims else {
        return Err(Error::ShapeMismatch {
            expected: "4D tensor".to_string(),
            actual: format!("{}D tensor", dims.len()),
        });
    };
    let (h, w) = (*h, *w);

    if *batch != 1 || *channels != RGB_CHANNELS {
        return Err(Error::ShapeMismatch {
            expected: format!("[1, {RGB_CHANNELS}, H, W]"),
            actual: format!("{dims:?}"),
        });
    }
    let plane = h.checked_mul(w).ok_or_else(|| Error::ShapeMismatch {
        expected: "an addressable tensor".to_string(),
        actual: format!("{dims:?}"),
    })?;
    let expected = plane
        .checked_mul(RGB_CHANNELS)
        .ok_or_else(|| Error::ShapeMismatch {
            expected: "an addressable tensor".to_string(),
            actual: format!("{dims:?}"),
        })?;
    if data.len() != expected {
        return Err(Error::ShapeMismatch {
            expected: format!("{expected} values"),
            actual: format!("{} values", data.len()),
        });
    }

    let too_large = |_| Error::ShapeMismatch {
        expected: "dimensions that fit in u32".to_string(),
        actual: format!("{dims:?}"),
    };
    let width = u32::try_from(w).map_err(too_large)?;
    let height = u32::try_from(h).map_err(too_large)?;

    let format = PixelFormat::Argb32;
    let mut buffer = PixelBuffer::new(width, height, format, DEFAULT_ROW_ALIGNMENT)
        .map_err(|e| Error::inference("output", e))?;
    let [r_off, g_off, b_off] = format.rgb_offsets();
    let a_off = format.alpha_offset();
    let stride = buffer.bytes_per_row();

    for (y, row) in buffer.as_bytes_mut().chunks_exact_mut(stride).enumerate() {
        for (x, pixel) in row[..w * BYTES_PER_PIXEL]
            .chunks_exact_mut(BYTES_PER_PIXEL)
            .enumerate()
        {
            let idx = y * w + x;
            pixel[a_off] = u8::MAX;
            pixel[r_off] = range.to_byte(data[idx]);
            pixel[g_off] = range.to_byte(data[plane + idx]);
            pixel[b_off] = range.to_byte(data[2 * plane + idx]);
        }
    }

    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_to_tensor_shape_and_order() {
        let mut buffer = PixelBuffer::new(2, 1, PixelFormat::Argb32, 64).unwrap();
        buffer.as_bytes_mut()[..8].copy_from_slice(&[255, 10, 20, 30, 255, 40, 50, 60]);

        let tensor = buffer_to_tensor(&buffer, TensorRange::Byte).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 1, 2]);
        assert!((tensor[[0, 0, 0, 0]] - 10.0).abs() < f32::EPSILON);
        assert!((tensor[[0, 2, 0, 1]] - 60.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_buffer_to_tensor_unit_range() {
        let mut buffer = PixelBuffer::new(1, 1, PixelFormat::Bgra32, 4).unwrap();
        buffer.as_bytes_mut().copy_from_slice(&[0, 0, 255, 0]);

        let tensor = buffer_to_tensor(&buffer, TensorRange::Unit).unwrap();
        assert!((tensor[[0, 0, 0, 0]] - 1.0).abs() < 1e-6);
        assert!(tensor[[0, 2, 0, 0]].abs() < 1e-6);
    }

    #[test]
    fn test_tensor_to_buffer_clamps() {
        let data = [300.0, -5.0, 127.6];
        let buffer = tensor_to_buffer(&[1, 3, 1, 1], &data, TensorRange::Byte).unwrap();

        assert_eq!(buffer.format(), PixelFormat::Argb32);
        assert_eq!(buffer.row(0).unwrap(), &[255, 255, 0, 128]);
    }

    #[test]
    fn test_tensor_to_buffer_rejects_bad_rank() {
        let err = tensor_to_buffer(&[3, 4, 4], &[0.0; 48], TensorRange::Byte).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_tensor_to_buffer_rejects_wrong_channels() {
        let err = tensor_to_buffer(&[1, 4, 2, 2], &[0.0; 16], TensorRange::Byte).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_tensor_to_buffer_rejects_short_data() {
        let err = tensor_to_buffer(&[1, 3, 2, 2], &[0.0; 11], TensorRange::Byte).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_tensor_to_buffer_rejects_overflowing_dimensions() {
        let err = tensor_to_buffer(&[1, 3, usize::MAX, 2], &[0.0; 6], TensorRange::Byte).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));

        let err = tensor_to_buffer(&[1, 3, usize::MAX / 4, 2], &[0.0; 6], TensorRange::Byte).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_tensor_round_trip() {
        let mut buffer = PixelBuffer::new(3, 2, PixelFormat::Argb32, 64).unwrap();
        for y in 0..2 {
            let row = buffer.row_mut(y).unwrap();
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                px.copy_from_slice(&[255, x as u8 * 50, y as u8 * 90, 7]);
            }
        }

        let tensor = buffer_to_tensor(&buffer, TensorRange::Unit).unwrap();
        let (data, _) = tensor.into_raw_vec_and_offset();
        let back = tensor_to_buffer(&[1, 3, 2, 3], &data, TensorRange::Unit).unwrap();
        assert_eq!(back, buffer);
    }

    #[test]
    fn test_range_parsing() {
        assert_eq!("byte".parse::<TensorRange>().unwrap(), TensorRange::Byte);
        assert_eq!("0-1".parse::<TensorRange>().unwrap(), TensorRange::Unit);
        assert!("half".parse::<TensorRange>().is_err());
    }

    #[test]
    fn test_to_byte() {
        assert_eq!(TensorRange::Unit.to_byte(1.0), 255);
        assert_eq!(TensorRange::Unit.to_byte(0.5), 128);
        assert_eq!(TensorRange::Byte.to_byte(-1.0), 0);
    }
}
