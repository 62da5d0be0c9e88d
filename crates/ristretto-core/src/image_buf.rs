use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BitDepth {
    Eight,
    Sixteen,
}

impl BitDepth {
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(Self::Eight),
            16 => Some(Self::Sixteen),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::Eight => 8,
            Self::Sixteen => 16,
        }
    }

    /// Largest representable sample value.
    pub fn max_value(self) -> u16 {
        match self {
            Self::Eight => u8::MAX as u16,
            Self::Sixteen => u16::MAX,
        }
    }
}

/// Immutable interleaved pixel buffer.
///
/// Samples are stored as `u16` for both 8- and 16-bit depths so every
/// transform shares one code path; `depth` bounds the valid range.
/// Channel layouts: 1 (gray), 3 (RGB), 4 (RGBA, alpha last).
///
/// There are no mutable accessors. Every transform produces a new buffer,
/// which makes a buffer safe to hand to another thread without locking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPixelBuffer")]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    depth: BitDepth,
    samples: Vec<u16>,
}

impl PixelBuffer {
    pub fn new(
        width: u32,
        height: u32,
        channels: u8,
        depth: BitDepth,
        samples: Vec<u16>,
    ) -> Result<Self, PipelineError> {
        if !matches!(channels, 1 | 3 | 4) {
            return Err(PipelineError::InvalidBuffer(format!(
                "unsupported channel count {channels}"
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if samples.len() != expected {
            return Err(PipelineError::InvalidBuffer(format!(
                "expected {expected} samples for {width}x{height}x{channels}, got {}",
                samples.len()
            )));
        }
        let max = depth.max_value();
        if let Some(bad) = samples.iter().find(|&&s| s > max) {
            return Err(PipelineError::InvalidBuffer(format!(
                "sample {bad} exceeds {}-bit range",
                depth.bits()
            )));
        }
        Ok(Self {
            width,
            height,
            channels,
            depth,
            samples,
        })
    }

    /// Build an 8-bit buffer from interleaved bytes.
    pub fn from_u8(
        width: u32,
        height: u32,
        channels: u8,
        bytes: &[u8],
    ) -> Result<Self, PipelineError> {
        let samples = bytes.iter().map(|&b| b as u16).collect();
        Self::new(width, height, channels, BitDepth::Eight, samples)
    }

    /// Uniformly filled buffer, mostly useful as a test fixture.
    pub fn filled(
        width: u32,
        height: u32,
        channels: u8,
        depth: BitDepth,
        value: u16,
    ) -> Result<Self, PipelineError> {
        let len = width as usize * height as usize * channels as usize;
        Self::new(width, height, channels, depth, vec![value; len])
    }

    /// New buffer with this buffer's channel layout and depth. Callers
    /// guarantee `samples` fit the depth.
    pub(crate) fn derive(&self, width: u32, height: u32, samples: Vec<u16>) -> Self {
        debug_assert_eq!(
            samples.len(),
            width as usize * height as usize * self.channels as usize
        );
        Self {
            width,
            height,
            channels: self.channels,
            depth: self.depth,
            samples,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    pub fn max_value(&self) -> u16 {
        self.depth.max_value()
    }

    pub fn samples(&self) -> &[u16] {
        &self.samples
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// True for RGB and RGBA layouts.
    pub fn is_color(&self) -> bool {
        self.channels >= 3
    }

    pub fn has_alpha(&self) -> bool {
        self.channels == 4
    }

    pub fn into_samples(self) -> Vec<u16> {
        self.samples
    }

    /// Quantize to 8 bits into `out`, replacing its contents. Lets callers
    /// reuse a pooled allocation for encoder payloads.
    pub fn write_u8(&self, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(self.samples.len());
        match self.depth {
            BitDepth::Eight => out.extend(self.samples.iter().map(|&s| s as u8)),
            BitDepth::Sixteen => out.extend(
                self.samples
                    .iter()
                    .map(|&s| ((s as u32 * 255 + 32767) / 65535) as u8),
            ),
        }
    }

    pub fn to_u8(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_u8(&mut out);
        out
    }
}

#[derive(Deserialize)]
struct RawPixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    depth: BitDepth,
    samples: Vec<u16>,
}

impl TryFrom<RawPixelBuffer> for PixelBuffer {
    type Error = PipelineError;

    fn try_from(raw: RawPixelBuffer) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.height, raw.channels, raw.depth, raw.samples)
    }
}
