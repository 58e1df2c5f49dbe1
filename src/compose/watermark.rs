use crate::config::WatermarkConfig;
use crate::error::{FillError, Result};
use ab_glyph::{point, Font, FontVec, GlyphId, PxScale, ScaleFont};
use image::RgbaImage;
use std::fs;

/// Translucent white fill, matching the mark's original opacity.
const FILL_ALPHA: u8 = 150;

/// Bottom-right insets chosen empirically so the mark clears the corner at
/// common output resolutions.
const INSET_RIGHT: u32 = 100;
const INSET_BOTTOM: u32 = 150;

/// Draws the configured text mark near the bottom-right corner of an image.
/// Construction loads the font once; stamping itself cannot fail.
pub struct Stamper {
    font: FontVec,
    text: String,
    size: f32,
}

impl Stamper {
    pub fn from_config(config: &WatermarkConfig) -> Result<Self> {
        let bytes = fs::read(&config.font_path).map_err(|e| {
            FillError::FontLoadError(format!("{}: {}", config.font_path.display(), e))
        })?;
        let font = FontVec::try_from_vec(bytes).map_err(|e| {
            FillError::FontLoadError(format!("{}: {}", config.font_path.display(), e))
        })?;

        Ok(Stamper {
            font,
            text: config.text.clone(),
            size: config.font_size,
        })
    }

    /// Stamp the mark onto `image` in place.
    pub fn stamp(&self, image: &mut RgbaImage) {
        let scale = PxScale::from(self.size);
        let scaled = self.font.as_scaled(scale);

        let (text_width, text_height) = measure(&scaled, &self.text);
        let (origin_x, origin_y) = placement(image.dimensions(), (text_width, text_height));

        let mut caret = origin_x as f32;
        let baseline = origin_y as f32 + scaled.ascent();
        let mut previous: Option<GlyphId> = None;

        for ch in self.text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = previous {
                caret += scaled.kern(prev, id);
            }
            let glyph = id.with_scale_and_position(scale, point(caret, baseline));
            caret += scaled.h_advance(id);
            previous = Some(id);

            if let Some(outlined) = scaled.outline_glyph(glyph) {
                let bounds = outlined.px_bounds();
                outlined.draw(|gx, gy, coverage| {
                    let px = bounds.min.x as i64 + gx as i64;
                    let py = bounds.min.y as i64 + gy as i64;
                    if px < 0 || py < 0 {
                        return;
                    }
                    let (px, py) = (px as u32, py as u32);
                    if px >= image.width() || py >= image.height() {
                        return;
                    }

                    let alpha = coverage.clamp(0.0, 1.0) * (FILL_ALPHA as f32 / 255.0);
                    let pixel = image.get_pixel_mut(px, py);
                    for c in 0..3 {
                        let blended = pixel[c] as f32 * (1.0 - alpha) + 255.0 * alpha;
                        pixel[c] = blended.round() as u8;
                    }
                });
            }
        }
    }
}

/// Rendered bounding box of `text` at the given scale: advance widths plus
/// kerning across, ascent to descent down.
fn measure<F: Font, S: ScaleFont<F>>(scaled: &S, text: &str) -> (u32, u32) {
    let mut width = 0.0f32;
    let mut previous: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            width += scaled.kern(prev, id);
        }
        width += scaled.h_advance(id);
        previous = Some(id);
    }

    let height = scaled.ascent() - scaled.descent();
    (width.ceil() as u32, height.ceil() as u32)
}

/// Top-left corner for the mark: inset from the bottom-right, clamped to the
/// image so small outputs still render the text fully on-canvas.
pub(crate) fn placement(
    (image_width, image_height): (u32, u32),
    (text_width, text_height): (u32, u32),
) -> (u32, u32) {
    let x = image_width as i64 - text_width as i64 - INSET_RIGHT as i64;
    let y = image_height as i64 - text_height as i64 - INSET_BOTTOM as i64;
    (x.max(0) as u32, y.max(0) as u32)
}
