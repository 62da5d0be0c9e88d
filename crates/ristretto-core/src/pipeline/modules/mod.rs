pub mod crop;
pub mod curve_adjust;
pub mod exposure;
pub mod saturation;
pub mod white_balance;

pub use saturation::Saturation;

use crate::image_buf::PixelBuffer;

/// Map each color sample through its channel's table; alpha passes through.
/// Gray buffers use the first table.
fn map_through_tables(input: &PixelBuffer, tables: [&[u16]; 3]) -> PixelBuffer {
    let stride = input.channels() as usize;
    let color = stride.min(3);
    let mut out = input.samples().to_vec();
    for px in out.chunks_exact_mut(stride) {
        for (c, sample) in px[..color].iter_mut().enumerate() {
            *sample = tables[c][*sample as usize];
        }
    }
    input.derive(input.width(), input.height(), out)
}
