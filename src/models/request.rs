use crate::config::{GenerationDefaults, GUIDANCE_SCALE_RANGE, STEPS_RANGE};
use crate::error::{FillError, Result};
use crate::models::FillModel;
use image::RgbaImage;

/// One region-fill request, constructed per user action and read-only after
/// construction. `source` is the image being edited; `mask_layer` is the
/// user-drawn RGBA annotation whose alpha channel selects the region to
/// regenerate.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub negative_prompt: String,
    pub source: RgbaImage,
    pub mask_layer: RgbaImage,
    pub guidance_scale: f32,
    pub steps: u32,
    pub paste_back: bool,
    pub model: FillModel,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>, source: RgbaImage, mask_layer: RgbaImage) -> Self {
        let defaults = GenerationDefaults::default();
        GenerationRequest {
            prompt: prompt.into(),
            negative_prompt: String::new(),
            source,
            mask_layer,
            guidance_scale: defaults.guidance_scale,
            steps: defaults.steps,
            paste_back: defaults.paste_back,
            model: FillModel::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: &GenerationDefaults) -> Self {
        self.guidance_scale = defaults.guidance_scale;
        self.steps = defaults.steps;
        self.paste_back = defaults.paste_back;
        self
    }

    pub fn with_negative_prompt(mut self, negative_prompt: impl Into<String>) -> Self {
        self.negative_prompt = negative_prompt.into();
        self
    }

    pub fn with_guidance_scale(mut self, guidance_scale: f32) -> Self {
        self.guidance_scale = guidance_scale;
        self
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn with_paste_back(mut self, paste_back: bool) -> Self {
        self.paste_back = paste_back;
        self
    }

    pub fn with_model(mut self, model: FillModel) -> Self {
        self.model = model;
        self
    }

    /// Reject out-of-range parameters and mask/source size disagreements
    /// before any inference work is spent on the request.
    pub fn validate(&self) -> Result<()> {
        if !GUIDANCE_SCALE_RANGE.contains(&self.guidance_scale) {
            return Err(FillError::RequestError(format!(
                "guidance_scale {} outside {:?}",
                self.guidance_scale, GUIDANCE_SCALE_RANGE
            )));
        }
        if !STEPS_RANGE.contains(&self.steps) {
            return Err(FillError::RequestError(format!(
                "steps {} outside {:?}",
                self.steps, STEPS_RANGE
            )));
        }
        if self.mask_layer.dimensions() != self.source.dimensions() {
            return Err(FillError::DimensionMismatch(format!(
                "mask layer is {:?} but source is {:?}",
                self.mask_layer.dimensions(),
                self.source.dimensions()
            )));
        }
        Ok(())
    }
}
