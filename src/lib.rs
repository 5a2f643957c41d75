//! # stylize
//!
//! Apply a pre-trained neural style-transfer model to photos.
//!
//! The model is an opaque function from one packed pixel buffer to another.
//! This crate converts images to and from those buffers, stretches the
//! result back to the source dimensions, and runs the whole chain on a
//! background worker that reports back on a caller-owned main queue.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use stylize::{Config, Invoker, MainQueue, ModelStore, Stylizer, TensorRange};
//!
//! # fn main() -> stylize::Result<()> {
//! let model = ModelStore::new()?.load("two_fridas", (700, 700), TensorRange::Byte)?;
//! let stylizer = Arc::new(Stylizer::new(Arc::new(model), Config::default())?);
//!
//! let main_queue = MainQueue::new();
//! let invoker = Invoker::new(stylizer, main_queue.handle())?;
//!
//! let photo = stylize::image::load_image("photo.jpg")?;
//! invoker.stylize(photo, |result| match result {
//!     Ok(styled) => println!("done in {:.2?}", styled.timings.total()),
//!     Err(_) => println!("Failed to process image"),
//! })?;
//!
//! main_queue.run_next(Duration::from_secs(60));
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod image;
pub mod model;
pub mod pipeline;

pub use error::{Error, Result, Stage};
pub use model::{IdentityModel, ModelStore, OnnxStyleModel, StyleModel, TensorRange};
pub use pipeline::{Config, InvocationState, Invoker, MainQueue, StylizedImage, Stylizer};
