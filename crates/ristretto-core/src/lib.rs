pub mod buffer_pool;
pub mod color;
pub mod curve;
pub mod decode;
pub mod error;
pub mod history;
pub mod image_buf;
pub mod pipeline;
pub mod session;

pub use error::{DecodeError, HistoryError, PipelineError};
pub use image_buf::{BitDepth, PixelBuffer};
