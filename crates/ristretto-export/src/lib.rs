pub mod config;
pub mod encoder;
pub mod error;
pub mod exporter;
mod worker;

pub use config::ExportConfig;
pub use encoder::{EncodeJob, Encoder, JpegEncoder, PassthroughEncoder};
pub use error::ExportError;
pub use exporter::{EncodedImage, EncodedResult, Exporter};
