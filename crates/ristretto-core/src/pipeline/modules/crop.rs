use crate::error::PipelineError;
use crate::image_buf::PixelBuffer;

/// Copy the `width` x `height` rectangle at (`x`, `y`). The rectangle must be
/// non-empty and lie entirely inside the input.
pub fn apply(
    input: &PixelBuffer,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
) -> Result<PixelBuffer, PipelineError> {
    if width == 0 || height == 0 {
        return Err(PipelineError::invalid(
            "crop",
            format!("empty rectangle {width}x{height}"),
        ));
    }
    let fits = |origin: u32, extent: u32, limit: u32| {
        origin.checked_add(extent).is_some_and(|end| end <= limit)
    };
    if !fits(x, width, input.width()) || !fits(y, height, input.height()) {
        return Err(PipelineError::invalid(
            "crop",
            format!(
                "rectangle {width}x{height}+{x}+{y} outside {}x{} buffer",
                input.width(),
                input.height()
            ),
        ));
    }

    let stride = input.channels() as usize;
    let src_row = input.width() as usize * stride;
    let dst_row = width as usize * stride;
    let mut data = Vec::with_capacity(dst_row * height as usize);
    for row in y as usize..(y + height) as usize {
        let start = row * src_row + x as usize * stride;
        data.extend_from_slice(&input.samples()[start..start + dst_row]);
    }

    Ok(input.derive(width, height, data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_buf::BitDepth;

    fn indexed(w: u32, h: u32) -> PixelBuffer {
        let mut data = Vec::with_capacity((w * h * 3) as usize);
        for i in 0..w * h {
            data.push(i as u16);
            data.push(0);
            data.push(0);
        }
        PixelBuffer::new(w, h, 3, BitDepth::Eight, data).unwrap()
    }

    #[test]
    fn full_rectangle_is_identity() {
        let buf = indexed(4, 4);
        let result = apply(&buf, 0, 0, 4, 4).unwrap();
        assert_eq!(result, buf);
    }

    #[test]
    fn crop_reduces_dimensions() {
        let buf = indexed(4, 4);
        let result = apply(&buf, 0, 0, 2, 2).unwrap();
        assert_eq!(result.width(), 2);
        assert_eq!(result.height(), 2);
        assert_eq!(result.samples().len(), 12);
    }

    #[test]
    fn crop_with_offset() {
        let buf = indexed(4, 4);
        let result = apply(&buf, 2, 2, 2, 2).unwrap();
        let reds: Vec<u16> = result.samples().chunks_exact(3).map(|p| p[0]).collect();
        assert_eq!(reds, vec![10, 11, 14, 15]);
    }

    #[test]
    fn keeps_alpha_layout() {
        let buf = PixelBuffer::new(2, 1, 4, BitDepth::Eight, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        let result = apply(&buf, 1, 0, 1, 1).unwrap();
        assert_eq!(result.samples(), &[5, 6, 7, 8]);
        assert_eq!(result.channels(), 4);
    }

    #[test]
    fn out_of_bounds_is_rejected() {
        let buf = indexed(4, 4);
        for (x, y, w, h) in [(3, 0, 2, 1), (0, 4, 1, 1), (0, 0, 5, 4), (u32::MAX, 0, 2, 1)] {
            let err = apply(&buf, x, y, w, h).unwrap_err();
            assert!(
                matches!(err, PipelineError::InvalidNodeParameters { .. }),
                "({x},{y},{w},{h})"
            );
        }
    }

    #[test]
    fn empty_rectangle_is_rejected() {
        let buf = indexed(4, 4);
        assert!(apply(&buf, 0, 0, 0, 2).is_err());
        assert!(apply(&buf, 0, 0, 2, 0).is_err());
    }
}
