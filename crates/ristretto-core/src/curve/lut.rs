use crate::curve::CurveChannel;
use crate::curve::apply::map_tones;
use crate::error::PipelineError;
use crate::image_buf::{BitDepth, PixelBuffer};

pub const DEFAULT_LUT_SIZE: usize = 256;

/// Quantized samples of a curve function.
///
/// Direct spline evaluation costs O(control points) per pixel; a table lookup
/// is O(1), which dominates at 10^7+ pixels. The price is quantization error
/// of at most `1 / (2 * (size - 1))` in the curve's input domain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurveLut {
    table: Vec<u16>,
    depth: BitDepth,
}

impl CurveLut {
    /// `table[i] = clamp(round(curve(i / (size - 1)) * max))`. Sizes below 2 are raised to 2.
    pub fn build(curve: impl Fn(f32) -> f32, size: usize, depth: BitDepth) -> Self {
        let size = size.max(2);
        let max = depth.max_value() as f32;
        let last = (size - 1) as f32;
        let table = (0..size)
            .map(|i| (curve(i as f32 / last) * max).round().clamp(0.0, max) as u16)
            .collect();
        Self { table, depth }
    }

    /// Table sized for a buffer's sample range: exact for 8-bit, 4096 entries for 16-bit.
    pub fn for_depth(curve: impl Fn(f32) -> f32, depth: BitDepth) -> Self {
        let size = match depth {
            BitDepth::Eight => DEFAULT_LUT_SIZE,
            BitDepth::Sixteen => 4096,
        };
        Self::build(curve, size, depth)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn depth(&self) -> BitDepth {
        self.depth
    }

    pub fn table(&self) -> &[u16] {
        &self.table
    }

    /// Nearest-entry lookup for a normalized input.
    pub fn lookup(&self, x: f32) -> u16 {
        let last = self.table.len() - 1;
        let idx = (x.clamp(0.0, 1.0) * last as f32).round() as usize;
        self.table[idx.min(last)]
    }

    pub fn lookup_normalized(&self, x: f32) -> f32 {
        self.lookup(x) as f32 / self.depth.max_value() as f32
    }

    /// Map every pixel through the table with the same channel policy as
    /// [`apply_curve`](crate::curve::apply_curve).
    pub fn apply(
        &self,
        buffer: &PixelBuffer,
        channel: CurveChannel,
    ) -> Result<PixelBuffer, PipelineError> {
        map_tones(buffer, channel, |x| self.lookup_normalized(x))
    }
}
