use crate::color::{linear_to_srgb, sample_table, srgb_to_linear};
use crate::error::PipelineError;
use crate::image_buf::PixelBuffer;
use crate::pipeline::modules::map_through_tables;

/// Scale linear light by `2^ev`. Samples are sRGB-encoded, so the multiply
/// happens after decoding and the result is re-encoded and clipped.
pub fn apply(input: &PixelBuffer, ev: f32) -> Result<PixelBuffer, PipelineError> {
    if !ev.is_finite() {
        return Err(PipelineError::invalid("exposure", format!("non-finite value {ev}")));
    }
    if ev == 0.0 {
        return Ok(input.clone());
    }

    let multiplier = 2.0_f32.powf(ev);
    let table = sample_table(input.depth(), |v| linear_to_srgb(srgb_to_linear(v) * multiplier));
    Ok(map_through_tables(input, [&table, &table, &table]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_buf::BitDepth;

    fn gray_rgb(v: u16) -> PixelBuffer {
        PixelBuffer::filled(2, 1, 3, BitDepth::Eight, v).unwrap()
    }

    #[test]
    fn zero_exposure_is_identity() {
        let buf = gray_rgb(128);
        assert_eq!(apply(&buf, 0.0).unwrap(), buf);
    }

    #[test]
    fn positive_exposure_brightens() {
        let result = apply(&gray_rgb(128), 1.0).unwrap();
        // 128 -> linear 0.216 -> x2 -> 0.432 -> sRGB ~0.69
        let expected = (linear_to_srgb(srgb_to_linear(128.0 / 255.0) * 2.0) * 255.0).round() as u16;
        assert!(result.samples().iter().all(|&s| s == expected));
        assert!(expected > 170);
    }

    #[test]
    fn negative_exposure_darkens() {
        let result = apply(&gray_rgb(128), -1.0).unwrap();
        assert!(result.samples().iter().all(|&s| s < 128));
    }

    #[test]
    fn highlights_clip() {
        let result = apply(&gray_rgb(200), 3.0).unwrap();
        assert!(result.samples().iter().all(|&s| s == 255));
    }

    #[test]
    fn alpha_untouched() {
        let buf = PixelBuffer::new(1, 1, 4, BitDepth::Eight, vec![50, 50, 50, 9]).unwrap();
        let result = apply(&buf, 1.0).unwrap();
        assert_eq!(result.samples()[3], 9);
        assert!(result.samples()[0] > 50);
    }

    #[test]
    fn works_on_gray_and_16bit() {
        let gray = PixelBuffer::new(1, 1, 1, BitDepth::Sixteen, vec![20000]).unwrap();
        let result = apply(&gray, 0.5).unwrap();
        assert!(result.samples()[0] > 20000);
    }

    #[test]
    fn nan_is_rejected() {
        assert!(apply(&gray_rgb(10), f32::NAN).is_err());
    }
}
