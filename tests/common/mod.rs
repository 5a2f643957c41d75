//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use image::{DynamicImage, Rgba, RgbaImage};
use stylize::image::{PixelBuffer, PixelFormat};
use stylize::{Error, Result, StyleModel};

/// A uniformly coloured RGBA image.
pub fn solid(width: u32, height: u32, color: [u8; 3]) -> DynamicImage {
    let [r, g, b] = color;
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([r, g, b, 255])))
}

/// Whether two colours differ by at most `tolerance` per channel.
pub fn close_to(actual: Rgba<u8>, expected: [u8; 3], tolerance: u8) -> bool {
    actual.0[..3]
        .iter()
        .zip(expected)
        .all(|(&a, e)| a.abs_diff(e) <= tolerance)
}

/// Always fails inside `predict`.
pub struct FailingModel;

impl StyleModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn predict(&self, _input: &PixelBuffer) -> Result<PixelBuffer> {
        Err(Error::inference("failing", "internal model failure"))
    }
}

/// Succeeds but returns a buffer whose geometry its data cannot back.
pub struct CorruptOutputModel;

impl StyleModel for CorruptOutputModel {
    fn name(&self) -> &str {
        "corrupt"
    }

    fn predict(&self, _input: &PixelBuffer) -> Result<PixelBuffer> {
        Ok(PixelBuffer::from_raw(
            700,
            700,
            2816,
            PixelFormat::Bgra32,
            vec![0; 128],
        ))
    }
}

/// Reports a row stride so large that the buffer size overflows.
pub struct OverflowingStrideModel;

impl StyleModel for OverflowingStrideModel {
    fn name(&self) -> &str {
        "overflowing-stride"
    }

    fn predict(&self, _input: &PixelBuffer) -> Result<PixelBuffer> {
        Ok(PixelBuffer::from_raw(
            2,
            2,
            usize::MAX / 2 + 1,
            PixelFormat::Argb32,
            vec![0; 16],
        ))
    }
}

/// Panics on its first call and echoes its input afterwards.
#[derive(Default)]
pub struct PanicOnceModel {
    panicked: AtomicBool,
}

impl StyleModel for PanicOnceModel {
    fn name(&self) -> &str {
        "panic-once"
    }

    fn input_size(&self) -> (u32, u32) {
        (32, 32)
    }

    fn predict(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        if !self.panicked.swap(true, Ordering::SeqCst) {
            panic!("model exploded");
        }
        Ok(input.clone())
    }
}

/// Inverts colours and records whether two calls ever overlapped.
pub struct InvertingModel {
    in_flight: AtomicBool,
    overlapped: AtomicBool,
    calls: AtomicUsize,
    delay: Duration,
}

impl InvertingModel {
    pub fn new(delay: Duration) -> Self {
        Self {
            in_flight: AtomicBool::new(false),
            overlapped: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            delay,
        }
    }

    pub fn overlapped(&self) -> bool {
        self.overlapped.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StyleModel for InvertingModel {
    fn name(&self) -> &str {
        "inverting"
    }

    fn input_size(&self) -> (u32, u32) {
        (64, 64)
    }

    fn predict(&self, input: &PixelBuffer) -> Result<PixelBuffer> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            self.overlapped.store(true, Ordering::SeqCst);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);
        thread::sleep(self.delay);

        let mut output = input.clone();
        let alpha = output.format().alpha_offset();
        for (i, byte) in output.as_bytes_mut().iter_mut().enumerate() {
            if i % 4 != alpha {
                *byte = u8::MAX - *byte;
            }
        }

        self.in_flight.store(false, Ordering::SeqCst);
        Ok(output)
    }
}
