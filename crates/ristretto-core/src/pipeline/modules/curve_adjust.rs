use crate::curve::{CurveChannel, CurveLut, CurveSpec, SmoothCurve};
use crate::error::PipelineError;
use crate::image_buf::PixelBuffer;

/// Tone curve through a LUT sized for the buffer's depth.
pub fn apply(
    input: &PixelBuffer,
    spec: &CurveSpec,
    channel: CurveChannel,
) -> Result<PixelBuffer, PipelineError> {
    if !input.is_color() && channel != CurveChannel::Rgb && channel != CurveChannel::Luminance {
        return Err(PipelineError::invalid(
            "curve_adjust",
            format!("{channel:?} curve needs a color buffer"),
        ));
    }

    let curve = SmoothCurve::new(spec);
    // Fewer than two points.
    if curve.is_identity() {
        return Ok(input.clone());
    }
    CurveLut::for_depth(curve.as_fn(), input.depth()).apply(input, channel)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{CurvePreset, apply_curve};
    use crate::image_buf::BitDepth;

    fn ramp() -> PixelBuffer {
        let samples: Vec<u16> = (0..=255).flat_map(|v| [v, v, v]).collect();
        PixelBuffer::new(256, 1, 3, BitDepth::Eight, samples).unwrap()
    }

    #[test]
    fn degenerate_spec_is_noop() {
        let buf = ramp();
        let out = apply(&buf, &CurveSpec::default(), CurveChannel::Red).unwrap();
        assert_eq!(out, buf);
        let single = CurveSpec::from_pairs(&[(0.4, 0.9)]);
        assert_eq!(apply(&buf, &single, CurveChannel::Rgb).unwrap(), buf);
    }

    #[test]
    fn linear_preset_is_exact_at_control_points() {
        let buf = ramp();
        let out = apply(&buf, &CurvePreset::Linear.spec(), CurveChannel::Rgb).unwrap();
        assert_eq!(&out.samples()[..3], &[0, 0, 0]);
        assert_eq!(&out.samples()[255 * 3..], &[255, 255, 255]);
        // The clamped spline sags below the diagonal between the end points.
        assert!(out.samples()[64 * 3] < 64);
    }

    #[test]
    fn matches_direct_evaluation_on_neutral_ramp() {
        let buf = ramp();
        let spec = CurvePreset::SCurve.spec();
        let out = apply(&buf, &spec, CurveChannel::Rgb).unwrap();
        let curve = SmoothCurve::new(&spec);
        let direct = apply_curve(&buf, curve.as_fn(), CurveChannel::Rgb).unwrap();
        for (a, b) in out.samples().iter().zip(direct.samples()) {
            assert!(a.abs_diff(*b) <= 1, "lut {a} vs direct {b}");
        }
    }

    #[test]
    fn output_is_monotonic_for_monotonic_curve() {
        let out = apply(&ramp(), &CurvePreset::ContrastBoost.spec(), CurveChannel::Luminance).unwrap();
        let reds: Vec<u16> = out.samples().chunks_exact(3).map(|p| p[0]).collect();
        assert!(reds.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn gray_buffer_rejects_channel_mode_even_for_identity() {
        let mono = PixelBuffer::filled(1, 1, 1, BitDepth::Eight, 10).unwrap();
        assert!(apply(&mono, &CurveSpec::default(), CurveChannel::Blue).is_err());
        assert!(apply(&mono, &CurvePreset::SCurve.spec(), CurveChannel::Luminance).is_ok());
    }
}
