use serde::{Deserialize, Serialize};

use crate::curve::{CurveChannel, CurveSpec};
use crate::error::PipelineError;
use crate::image_buf::PixelBuffer;
use crate::pipeline::modules;
use crate::pipeline::registry::{NodeParams, NodeRegistry};

/// One parametrized transform. Applying a node borrows its input and
/// returns a fresh buffer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EditNode {
    /// Temperature in Kelvin (5500 is neutral), tint in [-150, 150], positive = magenta.
    WhiteBalance { temp: f32, tint: f32 },
    /// Pixel rectangle; must lie inside the buffer.
    Crop {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    /// Exposure compensation in EV stops.
    Exposure { value: f32 },
    CurveAdjust {
        curve: CurveSpec,
        #[serde(default)]
        channel: CurveChannel,
    },
    /// Dispatched through the graph's [`NodeRegistry`] by name.
    Custom {
        name: String,
        #[serde(default)]
        params: NodeParams,
    },
}

impl EditNode {
    pub fn name(&self) -> &str {
        match self {
            Self::WhiteBalance { .. } => "white_balance",
            Self::Crop { .. } => "crop",
            Self::Exposure { .. } => "exposure",
            Self::CurveAdjust { .. } => "curve_adjust",
            Self::Custom { name, .. } => name,
        }
    }

    pub fn apply(
        &self,
        input: &PixelBuffer,
        registry: &NodeRegistry,
    ) -> Result<PixelBuffer, PipelineError> {
        match self {
            Self::WhiteBalance { temp, tint } => modules::white_balance::apply(input, *temp, *tint),
            Self::Crop {
                x,
                y,
                width,
                height,
            } => modules::crop::apply(input, *x, *y, *width, *height),
            Self::Exposure { value } => modules::exposure::apply(input, *value),
            Self::CurveAdjust { curve, channel } => {
                modules::curve_adjust::apply(input, curve, *channel)
            }
            Self::Custom { name, params } => registry.dispatch(name, input, params),
        }
    }
}
