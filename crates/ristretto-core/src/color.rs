use crate::image_buf::BitDepth;

/// Inverse sRGB EOTF (IEC 61966-2-1): linear light [0,1] -> perceptual sRGB [0,1].
pub fn linear_to_srgb(x: f32) -> f32 {
    if x <= 0.0031308 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

/// sRGB EOTF (IEC 61966-2-1): perceptual sRGB [0,1] -> linear light [0,1].
pub fn srgb_to_linear(x: f32) -> f32 {
    if x <= 0.04045 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

/// ITU-R BT.709 relative luminance.
pub fn luminance(r: f32, g: f32, b: f32) -> f32 {
    0.2126 * r + 0.7152 * g + 0.0722 * b
}

/// Tabulate a normalized transfer function for every sample value of `depth`.
///
/// Entry `v` holds `round(clamp(f(v / max)) * max)`, so per-pixel work for
/// point operations becomes a single index.
pub fn sample_table(depth: BitDepth, f: impl Fn(f32) -> f32) -> Vec<u16> {
    let max = depth.max_value();
    let scale = max as f32;
    (0..=max)
        .map(|v| (f(v as f32 / scale).clamp(0.0, 1.0) * scale).round() as u16)
        .collect()
}
