//! Tone curves built from control points.
//!
//! A [`CurveSpec`] is pure data; [`SmoothCurve`] turns it into a function on
//! `[0, 1]` using a Catmull-Rom spline through the control points, and
//! [`CurveLut`] quantizes that function for O(1) per-pixel evaluation.
//!
//! ```text
//!   points ──sort/clamp──> CurveSpec ──> SmoothCurve::evaluate ──> CurveLut ──> pixels
//! ```

mod apply;
mod lut;
mod presets;

use serde::{Deserialize, Serialize};

pub use apply::apply_curve;
pub use lut::{CurveLut, DEFAULT_LUT_SIZE};
pub use presets::{CurvePreset, UnknownPreset};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    pub x: f32,
    pub y: f32,
}

impl CurvePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Which samples a curve acts on.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveChannel {
    /// Curve of the plain R/G/B average; all three channels scale by the same ratio.
    #[default]
    Rgb,
    Red,
    Green,
    Blue,
    /// Curve of BT.709 luminance; all three channels scale by the same ratio.
    Luminance,
}

impl CurveChannel {
    /// Sample offset within a pixel for the single-channel modes.
    pub(crate) fn offset(self) -> Option<usize> {
        match self {
            Self::Red => Some(0),
            Self::Green => Some(1),
            Self::Blue => Some(2),
            Self::Rgb | Self::Luminance => None,
        }
    }
}

/// Normalized control points: coordinates clamped to `[0, 1]`, sorted by x,
/// x strictly increasing. When several points share an x, the last one given wins.
/// Non-finite points are dropped.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<CurvePoint>", into = "Vec<CurvePoint>")]
pub struct CurveSpec {
    points: Vec<CurvePoint>,
}

impl CurveSpec {
    pub fn new(points: Vec<CurvePoint>) -> Self {
        let mut points: Vec<CurvePoint> = points
            .into_iter()
            .filter(|p| p.x.is_finite() && p.y.is_finite())
            .map(|p| CurvePoint::new(p.x.clamp(0.0, 1.0), p.y.clamp(0.0, 1.0)))
            .collect();
        // Stable: equal-x points keep their input order, so the last one wins below.
        points.sort_by(|a, b| a.x.total_cmp(&b.x));

        let mut unique: Vec<CurvePoint> = Vec::with_capacity(points.len());
        for p in points {
            match unique.last_mut() {
                Some(last) if last.x == p.x => *last = p,
                _ => unique.push(p),
            }
        }
        Self { points: unique }
    }

    pub fn from_pairs(pairs: &[(f32, f32)]) -> Self {
        Self::new(pairs.iter().map(|&(x, y)| CurvePoint::new(x, y)).collect())
    }

    pub fn points(&self) -> &[CurvePoint] {
        &self.points
    }

    /// Fewer than two points cannot define a curve; such specs evaluate as identity.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 2
    }

}

impl From<Vec<CurvePoint>> for CurveSpec {
    fn from(points: Vec<CurvePoint>) -> Self {
        Self::new(points)
    }
}

impl From<CurveSpec> for Vec<CurvePoint> {
    fn from(spec: CurveSpec) -> Self {
        spec.points
    }
}

/// Canonical 5-point identity curve, the starting point for user editing.
pub fn default_curve() -> CurveSpec {
    CurveSpec::from_pairs(&[(0.0, 0.0), (0.25, 0.25), (0.5, 0.5), (0.75, 0.75), (1.0, 1.0)])
}

pub fn smooth_curve(points: Vec<CurvePoint>) -> SmoothCurve {
    SmoothCurve::new(&CurveSpec::new(points))
}

/// Catmull-Rom interpolant through a [`CurveSpec`].
///
/// Boundary neighbours are clamped to the end points, so even a point set on
/// the diagonal bends slightly between control points. Only a degenerate spec
/// evaluates as the exact identity.
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothCurve {
    points: Vec<CurvePoint>,
    identity: bool,
}

impl SmoothCurve {
    pub fn new(spec: &CurveSpec) -> Self {
        Self {
            points: spec.points().to_vec(),
            identity: spec.is_degenerate(),
        }
    }

    pub fn is_identity(&self) -> bool {
        self.identity
    }

    /// Evaluate at `x` (clamped to `[0, 1]`). Flat outside the control range,
    /// exact on control points, clamped to `[0, 1]` between them.
    pub fn evaluate(&self, x: f32) -> f32 {
        let x = x.clamp(0.0, 1.0);
        if self.identity {
            return x;
        }
        let pts = &self.points;
        let n = pts.len();
        if x <= pts[0].x {
            return pts[0].y;
        }
        if x >= pts[n - 1].x {
            return pts[n - 1].y;
        }

        // Few control points; scan for the bracketing segment.
        for i in 0..n - 1 {
            let p1 = pts[i];
            let p2 = pts[i + 1];
            if x > p2.x {
                continue;
            }
            if x == p1.x {
                return p1.y;
            }
            if x == p2.x {
                return p2.y;
            }
            let p0 = pts[i.saturating_sub(1)];
            let p3 = pts[(i + 2).min(n - 1)];
            let t = (x - p1.x) / (p2.x - p1.x);
            return catmull_rom(p0.y, p1.y, p2.y, p3.y, t).clamp(0.0, 1.0);
        }
        pts[n - 1].y
    }

    pub fn as_fn(&self) -> impl Fn(f32) -> f32 + '_ {
        move |x| self.evaluate(x)
    }
}

/// Uniform Catmull-Rom basis evaluated between `p1` (t=0) and `p2` (t=1).
fn catmull_rom(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - p0 - 3.0 * p2 + p3) * t3)
}
