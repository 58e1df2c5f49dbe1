use crate::error::{FillError, Result};
use image::{GrayImage, Luma, Rgba, RgbaImage};

/// Binary inclusion mask derived from the alpha channel of a user-drawn
/// annotation layer. Every pixel is exactly 0 (excluded) or 255 (included);
/// any alpha above zero snaps to fully included so that downstream
/// compositing is a hard cut with no edge bleeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryMask {
    mask: GrayImage,
}

impl BinaryMask {
    /// Threshold the layer's alpha channel into a binary mask. The layer must
    /// match the source image's dimensions exactly.
    pub fn from_layer(layer: &RgbaImage, expected: (u32, u32)) -> Result<Self> {
        if layer.dimensions() != expected {
            return Err(FillError::DimensionMismatch(format!(
                "mask layer is {:?} but source is {:?}",
                layer.dimensions(),
                expected
            )));
        }

        let (width, height) = layer.dimensions();
        let mut mask = GrayImage::new(width, height);
        for (x, y, pixel) in layer.enumerate_pixels() {
            let value = if pixel[3] > 0 { 255 } else { 0 };
            mask.put_pixel(x, y, Luma([value]));
        }

        Ok(BinaryMask { mask })
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.mask.dimensions()
    }

    pub fn is_selected(&self, x: u32, y: u32) -> bool {
        self.mask.get_pixel(x, y)[0] != 0
    }

    pub fn as_gray(&self) -> &GrayImage {
        &self.mask
    }

    /// Render the mask back as an RGBA annotation layer (opaque white where
    /// included, fully transparent elsewhere) so a previous mask can be
    /// re-fed as a drawing.
    pub fn to_layer(&self) -> RgbaImage {
        let (width, height) = self.mask.dimensions();
        let mut layer = RgbaImage::new(width, height);
        for (x, y, pixel) in self.mask.enumerate_pixels() {
            let color = if pixel[0] != 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 0])
            };
            layer.put_pixel(x, y, color);
        }
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer_with_alphas(alphas: &[u8]) -> RgbaImage {
        let mut layer = RgbaImage::new(alphas.len() as u32, 1);
        for (i, &a) in alphas.iter().enumerate() {
            layer.put_pixel(i as u32, 0, Rgba([10, 20, 30, a]));
        }
        layer
    }

    #[test]
    fn test_alpha_snaps_to_binary() {
        let layer = layer_with_alphas(&[0, 1, 128, 254, 255]);
        let mask = BinaryMask::from_layer(&layer, (5, 1)).unwrap();

        let expected = [0u8, 255, 255, 255, 255];
        for (i, &value) in expected.iter().enumerate() {
            assert_eq!(mask.as_gray().get_pixel(i as u32, 0)[0], value);
        }
    }

    #[test]
    fn test_every_pixel_is_zero_or_full() {
        let layer = layer_with_alphas(&[3, 17, 90, 200, 0, 255]);
        let mask = BinaryMask::from_layer(&layer, (6, 1)).unwrap();
        for pixel in mask.as_gray().pixels() {
            assert!(pixel[0] == 0 || pixel[0] == 255);
        }
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let layer = RgbaImage::new(4, 4);
        let result = BinaryMask::from_layer(&layer, (8, 8));
        assert!(matches!(result, Err(FillError::DimensionMismatch(_))));
    }

    #[test]
    fn test_extraction_idempotent_through_layer_round_trip() {
        let layer = layer_with_alphas(&[0, 255, 0, 255, 128]);
        let first = BinaryMask::from_layer(&layer, (5, 1)).unwrap();
        let second = BinaryMask::from_layer(&first.to_layer(), (5, 1)).unwrap();
        assert_eq!(first, second);
    }
}
