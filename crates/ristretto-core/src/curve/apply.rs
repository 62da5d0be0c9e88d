use crate::color::luminance;
use crate::curve::CurveChannel;
use crate::error::PipelineError;
use crate::image_buf::PixelBuffer;

/// Apply `curve` (a function on `[0, 1]`) to every pixel by direct evaluation.
///
/// Per-channel modes map one sample; `Rgb` and `Luminance` map a pixel's
/// tone value and scale R, G and B by `new / old`, which keeps hue intact.
/// Gray buffers accept the tone modes only. Alpha is never touched.
pub fn apply_curve(
    buffer: &PixelBuffer,
    curve: impl Fn(f32) -> f32,
    channel: CurveChannel,
) -> Result<PixelBuffer, PipelineError> {
    map_tones(buffer, channel, curve)
}

/// Shared per-pixel policy for direct curves and LUTs.
pub(crate) fn map_tones(
    buffer: &PixelBuffer,
    channel: CurveChannel,
    map: impl Fn(f32) -> f32,
) -> Result<PixelBuffer, PipelineError> {
    let max = buffer.max_value() as f32;
    let quantize = |v: f32| v.clamp(0.0, max).round() as u16;
    let mut out = buffer.samples().to_vec();

    if !buffer.is_color() {
        if channel.offset().is_some() {
            return Err(PipelineError::invalid(
                "curve_adjust",
                format!("{channel:?} curve needs a color buffer"),
            ));
        }
        for s in &mut out {
            *s = quantize(map(*s as f32 / max) * max);
        }
        return Ok(buffer.derive(buffer.width(), buffer.height(), out));
    }

    let stride = buffer.channels() as usize;
    match channel {
        CurveChannel::Red | CurveChannel::Green | CurveChannel::Blue => {
            let c = channel.offset().unwrap_or(0);
            for px in out.chunks_exact_mut(stride) {
                px[c] = quantize(map(px[c] as f32 / max) * max);
            }
        }
        CurveChannel::Rgb => {
            for px in out.chunks_exact_mut(stride) {
                let avg = (px[0] as f32 + px[1] as f32 + px[2] as f32) / 3.0 / max;
                let ratio = if avg > 0.0 { map(avg) / avg } else { 1.0 };
                scale_rgb(px, ratio, max);
            }
        }
        CurveChannel::Luminance => {
            for px in out.chunks_exact_mut(stride) {
                let y = luminance(px[0] as f32, px[1] as f32, px[2] as f32) / max;
                let ratio = if y > 0.0 { map(y) / y } else { 0.0 };
                scale_rgb(px, ratio, max);
            }
        }
    }

    Ok(buffer.derive(buffer.width(), buffer.height(), out))
}

fn scale_rgb(px: &mut [u16], ratio: f32, max: f32) {
    for s in &mut px[..3] {
        *s = (*s as f32 * ratio).clamp(0.0, max).round() as u16;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_buf::BitDepth;

    fn rgb8(samples: &[u16]) -> PixelBuffer {
        let pixels = (samples.len() / 3) as u32;
        PixelBuffer::new(pixels, 1, 3, BitDepth::Eight, samples.to_vec()).unwrap()
    }

    #[test]
    fn identity_curve_is_noop() {
        let buf = rgb8(&[10, 200, 30, 0, 0, 0, 255, 255, 255]);
        for channel in [
            CurveChannel::Rgb,
            CurveChannel::Red,
            CurveChannel::Green,
            CurveChannel::Blue,
            CurveChannel::Luminance,
        ] {
            let out = apply_curve(&buf, |x| x, channel).unwrap();
            assert_eq!(out, buf, "{channel:?}");
        }
    }

    #[test]
    fn does_not_mutate_input() {
        let buf = rgb8(&[100, 100, 100]);
        let before = buf.clone();
        let out = apply_curve(&buf, |x| x * 0.5, CurveChannel::Rgb).unwrap();
        assert_eq!(buf, before);
        assert_eq!(out.samples(), &[50, 50, 50]);
    }

    #[test]
    fn single_channel_only_touches_that_channel() {
        let buf = rgb8(&[100, 100, 100]);
        let out = apply_curve(&buf, |_| 1.0, CurveChannel::Green).unwrap();
        assert_eq!(out.samples(), &[100, 255, 100]);
    }

    #[test]
    fn rgb_mode_preserves_ratios() {
        let buf = rgb8(&[120, 60, 30]);
        let out = apply_curve(&buf, |x| x * 1.5, CurveChannel::Rgb).unwrap();
        assert_eq!(out.samples(), &[180, 90, 45]);
    }

    #[test]
    fn rgb_mode_black_pixel_is_noop() {
        let buf = rgb8(&[0, 0, 0]);
        let out = apply_curve(&buf, |_| 0.7, CurveChannel::Rgb).unwrap();
        assert_eq!(out.samples(), &[0, 0, 0]);
    }

    #[test]
    fn luminance_mode_scales_by_luminance_ratio() {
        let buf = rgb8(&[100, 100, 100]);
        let out = apply_curve(&buf, |y| y * 2.0, CurveChannel::Luminance).unwrap();
        assert_eq!(out.samples(), &[200, 200, 200]);
    }

    #[test]
    fn outputs_clamp_to_sample_range() {
        let buf = rgb8(&[250, 10, 10]);
        let out = apply_curve(&buf, |x| x * 4.0, CurveChannel::Rgb).unwrap();
        assert_eq!(out.samples()[0], 255);
        assert_eq!(out.samples()[1], 40);
    }

    #[test]
    fn alpha_is_untouched() {
        let buf = PixelBuffer::new(1, 1, 4, BitDepth::Eight, vec![100, 100, 100, 77]).unwrap();
        let out = apply_curve(&buf, |_| 1.0, CurveChannel::Luminance).unwrap();
        assert_eq!(out.samples()[3], 77);
    }

    #[test]
    fn gray_buffer_maps_tone_modes() {
        let buf = PixelBuffer::new(2, 1, 1, BitDepth::Eight, vec![0, 255]).unwrap();
        let out = apply_curve(&buf, |x| 1.0 - x, CurveChannel::Luminance).unwrap();
        assert_eq!(out.samples(), &[255, 0]);
    }

    #[test]
    fn gray_buffer_rejects_single_channel_modes() {
        let buf = PixelBuffer::new(1, 1, 1, BitDepth::Eight, vec![10]).unwrap();
        let err = apply_curve(&buf, |x| x, CurveChannel::Red).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidNodeParameters { .. }));
    }

    #[test]
    fn sixteen_bit_uses_full_range() {
        let buf = PixelBuffer::new(1, 1, 3, BitDepth::Sixteen, vec![1000, 30000, 65535]).unwrap();
        let out = apply_curve(&buf, |_| 0.5, CurveChannel::Blue).unwrap();
        assert_eq!(out.samples(), &[1000, 30000, 32768]);
    }
}
