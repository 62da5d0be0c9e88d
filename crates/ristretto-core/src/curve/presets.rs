use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::curve::CurveSpec;

/// Named control-point sets. Pure data; evaluation goes through `SmoothCurve`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurvePreset {
    Linear,
    SCurve,
    HighlightCompress,
    ShadowBoost,
    ContrastBoost,
    ContrastReduce,
}

#[derive(Debug, Error)]
#[error("unknown curve preset `{0}`")]
pub struct UnknownPreset(pub String);

impl CurvePreset {
    pub const ALL: [CurvePreset; 6] = [
        Self::Linear,
        Self::SCurve,
        Self::HighlightCompress,
        Self::ShadowBoost,
        Self::ContrastBoost,
        Self::ContrastReduce,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::SCurve => "s-curve",
            Self::HighlightCompress => "highlight-compress",
            Self::ShadowBoost => "shadow-boost",
            Self::ContrastBoost => "contrast-boost",
            Self::ContrastReduce => "contrast-reduce",
        }
    }

    pub fn points(self) -> &'static [(f32, f32)] {
        match self {
            Self::Linear => &[(0.0, 0.0), (1.0, 1.0)],
            Self::SCurve => &[(0.0, 0.0), (0.25, 0.2), (0.5, 0.5), (0.75, 0.8), (1.0, 1.0)],
            Self::HighlightCompress => &[(0.0, 0.0), (0.5, 0.5), (0.75, 0.7), (1.0, 0.9)],
            Self::ShadowBoost => &[(0.0, 0.0), (0.25, 0.35), (0.5, 0.6), (1.0, 1.0)],
            Self::ContrastBoost => {
                &[(0.0, 0.0), (0.25, 0.15), (0.5, 0.5), (0.75, 0.85), (1.0, 1.0)]
            }
            Self::ContrastReduce => {
                &[(0.0, 0.1), (0.25, 0.3), (0.5, 0.5), (0.75, 0.7), (1.0, 0.9)]
            }
        }
    }

    pub fn spec(self) -> CurveSpec {
        CurveSpec::from_pairs(self.points())
    }
}

impl fmt::Display for CurvePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CurvePreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}
