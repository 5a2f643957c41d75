//! Style-transfer pipeline: configuration, synchronous stylizer and the
//! background invoker that reports back on a main queue.

mod config;
mod invoker;
mod main_queue;
mod stylizer;

pub use config::Config;
pub use invoker::{InvocationState, Invoker};
pub use main_queue::{MainHandle, MainQueue};
pub use stylizer::{StageTimings, StylizedImage, Stylizer};
