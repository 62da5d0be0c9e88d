use crate::color::{linear_to_srgb, sample_table, srgb_to_linear};
use crate::error::PipelineError;
use crate::image_buf::PixelBuffer;
use crate::pipeline::modules::map_through_tables;

const REF_TEMP: f64 = 5500.0;
const MIN_TEMP: f64 = 2000.0;
const MAX_TEMP: f64 = 25000.0;
const MAX_TINT: f32 = 150.0;

/// Von Kries white balance in linear sRGB.
///
/// The illuminant white at `temp` is mapped onto the 5500 K reference white,
/// then green is scaled by the tint. Gains are normalized so green stays at
/// 1.0 before tint, which keeps overall brightness roughly constant.
pub fn apply(input: &PixelBuffer, temp: f32, tint: f32) -> Result<PixelBuffer, PipelineError> {
    if !temp.is_finite() || !tint.is_finite() {
        return Err(PipelineError::invalid(
            "white_balance",
            format!("non-finite parameters temp={temp} tint={tint}"),
        ));
    }
    if tint.abs() > MAX_TINT {
        return Err(PipelineError::invalid(
            "white_balance",
            format!("tint {tint} outside [-{MAX_TINT}, {MAX_TINT}]"),
        ));
    }
    if !input.is_color() {
        return Err(PipelineError::invalid(
            "white_balance",
            "needs an RGB or RGBA buffer",
        ));
    }

    let gains = channel_gains(temp, tint);
    if gains.iter().all(|g| (g - 1.0).abs() < 1e-6) {
        return Ok(input.clone());
    }

    let depth = input.depth();
    let [r, g, b] = gains.map(|gain| {
        sample_table(depth, move |v| linear_to_srgb(srgb_to_linear(v) * gain))
    });
    Ok(map_through_tables(input, [&r, &g, &b]))
}

/// Per-channel multipliers for linear sRGB. `temp` is clamped to
/// [2000 K, 25000 K]; below that the Planckian white leaves the sRGB gamut.
pub fn channel_gains(temp: f32, tint: f32) -> [f32; 3] {
    let src = white_rgb((temp as f64).clamp(MIN_TEMP, MAX_TEMP));
    let dst = white_rgb(REF_TEMP);

    let raw = [dst[0] / src[0], dst[1] / src[1], dst[2] / src[2]];
    let norm = raw[1];
    // Positive tint = magenta: pull green down.
    let tint_gain = (-(tint as f64) / 300.0).exp2();
    [
        (raw[0] / norm) as f32,
        (raw[1] / norm * tint_gain) as f32,
        (raw[2] / norm) as f32,
    ]
}

/// Linear sRGB of the Planckian white at `t`, normalized to Y = 1.
fn white_rgb(t: f64) -> [f64; 3] {
    let (x, y) = planckian_xy(t);
    let xyz = [x / y, 1.0, (1.0 - x - y) / y];
    let rgb = [
        3.2409699419 * xyz[0] - 1.5373831776 * xyz[1] - 0.4986107603 * xyz[2],
        -0.9692436363 * xyz[0] + 1.8759675015 * xyz[1] + 0.0415550574 * xyz[2],
        0.0556300797 * xyz[0] - 0.2039769589 * xyz[1] + 1.0569715142 * xyz[2],
    ];
    rgb.map(|c| c.max(1e-3))
}

// Planckian locus in CIE xy (Kang et al. 2002 polynomial fit).
fn planckian_xy(t: f64) -> (f64, f64) {
    let t2 = t * t;
    let t3 = t2 * t;

    let x = if t <= 4000.0 {
        -0.2661239e9 / t3 - 0.2343589e6 / t2 + 0.8776956e3 / t + 0.179910
    } else {
        -3.0258469e9 / t3 + 2.1070379e6 / t2 + 0.2226347e3 / t + 0.240390
    };

    let x2 = x * x;
    let x3 = x2 * x;

    let y = if t <= 2222.0 {
        -1.1063814 * x3 - 1.34811020 * x2 + 2.18555832 * x - 0.20219683
    } else if t <= 4000.0 {
        -0.9549476 * x3 - 1.37418593 * x2 + 2.09137015 * x - 0.16748867
    } else {
        3.0817580 * x3 - 5.87338670 * x2 + 3.75112997 * x - 0.37001483
    };

    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_buf::BitDepth;

    fn gray() -> PixelBuffer {
        PixelBuffer::filled(1, 1, 3, BitDepth::Eight, 128).unwrap()
    }

    #[test]
    fn neutral_temp_is_identity() {
        let buf = gray();
        assert_eq!(apply(&buf, 5500.0, 0.0).unwrap(), buf);
        assert_eq!(channel_gains(5500.0, 0.0), [1.0, 1.0, 1.0]);
    }

    #[test]
    fn warm_temp_boosts_red() {
        let result = apply(&gray(), 7000.0, 0.0).unwrap();
        let s = result.samples();
        assert!(s[0] > 128, "red should be boosted, got {}", s[0]);
        assert!(s[2] < 128, "blue should be reduced, got {}", s[2]);
        assert_eq!(s[1], 128);
    }

    #[test]
    fn cool_temp_boosts_blue() {
        let result = apply(&gray(), 3500.0, 0.0).unwrap();
        let s = result.samples();
        assert!(s[0] < 128, "red should be reduced, got {}", s[0]);
        assert!(s[2] > 128, "blue should be boosted, got {}", s[2]);
    }

    #[test]
    fn positive_tint_is_magenta() {
        let result = apply(&gray(), 5500.0, 60.0).unwrap();
        let s = result.samples();
        assert!(s[1] < 128);
        assert_eq!(s[0], 128);
        assert_eq!(s[2], 128);
    }

    #[test]
    fn extreme_temps_no_panic() {
        for temp in [1000.0_f32, 2000.0, 3000.0, 10000.0, 20000.0, 40000.0] {
            let gains = channel_gains(temp, 0.0);
            assert!(gains.iter().all(|g| g.is_finite() && *g > 0.0), "{temp}: {gains:?}");
            assert!(apply(&gray(), temp, 0.0).is_ok());
        }
    }

    #[test]
    fn rejects_invalid_parameters() {
        assert!(apply(&gray(), f32::NAN, 0.0).is_err());
        assert!(apply(&gray(), 5500.0, 151.0).is_err());
        let mono = PixelBuffer::filled(1, 1, 1, BitDepth::Eight, 10).unwrap();
        assert!(apply(&mono, 6000.0, 0.0).is_err());
    }

    #[test]
    fn alpha_untouched() {
        let buf = PixelBuffer::new(1, 1, 4, BitDepth::Eight, vec![128, 128, 128, 42]).unwrap();
        let result = apply(&buf, 8000.0, 20.0).unwrap();
        assert_eq!(result.samples()[3], 42);
    }
}
