use crate::color::luminance;
use crate::error::PipelineError;
use crate::image_buf::PixelBuffer;
use crate::pipeline::registry::{NodeHandler, NodeParams, required_param};

/// Luminance-preserving saturation, `amount` in [-100, 100].
/// Registered as the `saturation` custom node.
pub struct Saturation;

impl NodeHandler for Saturation {
    fn name(&self) -> &str {
        "saturation"
    }

    fn apply(&self, input: &PixelBuffer, params: &NodeParams) -> Result<PixelBuffer, PipelineError> {
        let amount = required_param(self.name(), params, "amount")?;
        if !(-100.0..=100.0).contains(&amount) {
            return Err(PipelineError::invalid(
                self.name(),
                format!("amount {amount} outside [-100, 100]"),
            ));
        }
        if !input.is_color() {
            return Err(PipelineError::invalid(self.name(), "needs an RGB or RGBA buffer"));
        }
        if amount == 0.0 {
            return Ok(input.clone());
        }

        let max = input.max_value() as f32;
        let blend = 1.0 + amount / 100.0;
        let mut out = input.samples().to_vec();
        for px in out.chunks_exact_mut(input.channels() as usize) {
            let y = luminance(px[0] as f32, px[1] as f32, px[2] as f32);
            for s in &mut px[..3] {
                *s = (y + blend * (*s as f32 - y)).clamp(0.0, max).round() as u16;
            }
        }
        Ok(input.derive(input.width(), input.height(), out))
    }
}
