use std::borrow::Cow;
use std::error::Error;

use image::ExtendedColorType;
use image::codecs::jpeg;

pub type BoxError = Box<dyn Error + Send + Sync>;

/// One unit of encoder work: an 8-bit interleaved payload plus its layout.
#[derive(Debug, Clone)]
pub struct EncodeJob {
    pub index: usize,
    pub width: u32,
    pub height: u32,
    pub channels: u8,
    pub pixels: Vec<u8>,
    pub quality: u8,
}

/// Codec used by export workers. Implementations run on worker threads.
pub trait Encoder: Send + Sync {
    fn encode(&self, job: &EncodeJob) -> Result<Vec<u8>, BoxError>;
}

/// Baseline JPEG through the `image` crate. Alpha is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct JpegEncoder;

impl Encoder for JpegEncoder {
    fn encode(&self, job: &EncodeJob) -> Result<Vec<u8>, BoxError> {
        let (color, pixels): (ExtendedColorType, Cow<'_, [u8]>) = match job.channels {
            1 => (ExtendedColorType::L8, Cow::Borrowed(job.pixels.as_slice())),
            3 => (ExtendedColorType::Rgb8, Cow::Borrowed(job.pixels.as_slice())),
            4 => {
                let rgb = job
                    .pixels
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                (ExtendedColorType::Rgb8, Cow::Owned(rgb))
            }
            n => return Err(format!("cannot encode {n}-channel pixels as JPEG").into()),
        };

        let mut out = Vec::new();
        let quality = job.quality.clamp(1, 100);
        jpeg::JpegEncoder::new_with_quality(&mut out, quality).encode(
            &pixels,
            job.width,
            job.height,
            color,
        )?;
        Ok(out)
    }
}

/// Returns the raw 8-bit payload unchanged. Stands in for a codec when none
/// is available, and keeps export tests independent of JPEG output.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughEncoder;

impl Encoder for PassthroughEncoder {
    fn encode(&self, job: &EncodeJob) -> Result<Vec<u8>, BoxError> {
        Ok(job.pixels.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(channels: u8, quality: u8) -> EncodeJob {
        let (width, height) = (8, 8);
        let len = (width * height) as usize * channels as usize;
        EncodeJob {
            index: 0,
            width,
            height,
            channels,
            pixels: (0..len).map(|i| (i % 251) as u8).collect(),
            quality,
        }
    }

    #[test]
    fn jpeg_output_has_soi_marker() {
        for channels in [1, 3, 4] {
            let bytes = JpegEncoder.encode(&job(channels, 85)).unwrap();
            assert_eq!(&bytes[..2], &[0xFF, 0xD8], "{channels} channels");
        }
    }

    #[test]
    fn jpeg_decodes_back_to_same_size() {
        let bytes = JpegEncoder.encode(&job(4, 90)).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (8, 8));
        assert!(!decoded.color().has_alpha());
    }

    #[test]
    fn zero_quality_is_accepted() {
        assert!(JpegEncoder.encode(&job(3, 0)).is_ok());
    }

    #[test]
    fn jpeg_rejects_two_channels() {
        let mut bad = job(1, 80);
        bad.channels = 2;
        assert!(JpegEncoder.encode(&bad).is_err());
    }

    #[test]
    fn passthrough_returns_payload() {
        let j = job(3, 50);
        assert_eq!(PassthroughEncoder.encode(&j).unwrap(), j.pixels);
    }
}
