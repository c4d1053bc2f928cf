use image::RgbImage;

/// Points per inch in PDF user space.
pub const PDF_POINTS_PER_INCH: f32 = 72.0;

/// Scale factor from PDF points to pixels at `dpi`.
pub fn dpi_scale(dpi: u32) -> f32 {
    dpi as f32 / PDF_POINTS_PER_INCH
}

/// Repack a renderer's interleaved sample buffer into an RGB8 image.
///
/// `components` is the number of bytes per pixel including alpha (1 for
/// gray, 3 for RGB, 4 for RGBA), `stride` the number of bytes per row.
/// Gray samples are replicated into all three channels; alpha is dropped.
/// Returns `None` when the buffer cannot hold the described pixels.
pub fn rgb_from_samples(
    width: u32,
    height: u32,
    components: usize,
    stride: usize,
    samples: &[u8],
) -> Option<RgbImage> {
    if width == 0 || height == 0 || components == 0 {
        return None;
    }
    let row_bytes = (width as usize).checked_mul(components)?;
    if stride < row_bytes {
        return None;
    }
    let needed = stride
        .checked_mul(height as usize - 1)?
        .checked_add(row_bytes)?;
    if samples.len() < needed {
        return None;
    }

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    for row in samples.chunks(stride).take(height as usize) {
        for px in row[..row_bytes].chunks_exact(components) {
            match components {
                1 | 2 => rgb.extend_from_slice(&[px[0], px[0], px[0]]),
                _ => rgb.extend_from_slice(&px[..3]),
            }
        }
    }

    RgbImage::from_raw(width, height, rgb)
}
