use crate::compose::BinaryMask;
use image::{Rgba, RgbaImage};

/// Sentinel written into masked-out pixels of the conditioning image, so the
/// backend only "sees" the unmasked context.
const SENTINEL: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Copy of `source` with every mask-selected pixel replaced by the black
/// sentinel. Pixels outside the mask are byte-for-byte identical to `source`.
/// Caller guarantees `source` and `mask` dimensions match.
pub fn mask_out(source: &RgbaImage, mask: &BinaryMask) -> RgbaImage {
    let mut out = source.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if mask.is_selected(x, y) {
            *pixel = SENTINEL;
        }
    }
    out
}

/// Copy of `base` with every mask-selected pixel replaced by the
/// corresponding `overlay` pixel, alpha-composited when the overlay pixel is
/// not fully opaque. Pixels outside the mask are byte-for-byte identical to
/// `base`. Caller guarantees all three dimensions match.
pub fn paste_in(base: &RgbaImage, overlay: &RgbaImage, mask: &BinaryMask) -> RgbaImage {
    let mut out = base.clone();
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        if mask.is_selected(x, y) {
            *pixel = over(*overlay.get_pixel(x, y), *pixel);
        }
    }
    out
}

/// Standard "over" operator, foreground on background.
fn over(fg: Rgba<u8>, bg: Rgba<u8>) -> Rgba<u8> {
    match fg[3] {
        255 => return fg,
        0 => return bg,
        _ => {}
    }

    let fg_a = fg[3] as f32 / 255.0;
    let bg_a = bg[3] as f32 / 255.0;
    let out_a = fg_a + bg_a * (1.0 - fg_a);
    if out_a == 0.0 {
        return Rgba([0, 0, 0, 0]);
    }

    let mut out = [0u8; 4];
    for c in 0..3 {
        let blended = (fg[c] as f32 * fg_a + bg[c] as f32 * bg_a * (1.0 - fg_a)) / out_a;
        out[c] = blended.round() as u8;
    }
    out[3] = (out_a * 255.0).round() as u8;
    Rgba(out)
}
