use crate::models::FillModel;
use std::env;
use std::ops::RangeInclusive;
use std::path::PathBuf;

pub const GUIDANCE_SCALE_RANGE: RangeInclusive<f32> = 1.0..=10.0;
pub const STEPS_RANGE: RangeInclusive<u32> = 5..=100;

pub const DEFAULT_GUIDANCE_SCALE: f32 = 1.5;
pub const DEFAULT_STEPS: u32 = 10;
pub const DEFAULT_WATERMARK_TEXT: &str = "RFill";
pub const DEFAULT_WATERMARK_SIZE: f32 = 25.0;

#[derive(Debug, Clone)]
pub struct GenerationDefaults {
    pub guidance_scale: f32,
    pub steps: u32,
    pub paste_back: bool,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        GenerationDefaults {
            guidance_scale: DEFAULT_GUIDANCE_SCALE,
            steps: DEFAULT_STEPS,
            paste_back: true,
        }
    }
}

impl GenerationDefaults {
    pub fn new() -> Self {
        Self::default()
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
}

#[derive(Debug, Clone)]
pub struct WatermarkConfig {
    pub text: String,
    pub font_path: PathBuf,
    pub font_size: f32,
}

impl WatermarkConfig {
    pub fn new(font_path: impl Into<PathBuf>) -> Self {
        WatermarkConfig {
            text: DEFAULT_WATERMARK_TEXT.to_string(),
            font_path: font_path.into(),
            font_size: DEFAULT_WATERMARK_SIZE,
        }
    }

    pub fn from_env() -> Option<Self> {
        let font_path = env::var("RFILL_WATERMARK_FONT").ok()?;
        let mut config = WatermarkConfig::new(font_path);
        if let Ok(text) = env::var("RFILL_WATERMARK_TEXT") {
            config.text = text;
        }
        if let Some(size) = env::var("RFILL_WATERMARK_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.font_size = size;
        }
        Some(config)
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_font_size(mut self, font_size: f32) -> Self {
        self.font_size = font_size;
        self
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub endpoint: Option<String>,
    pub model: FillModel,
    pub watermark: Option<WatermarkConfig>,
    pub defaults: GenerationDefaults,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            endpoint: None,
            model: FillModel::default(),
            watermark: None,
            defaults: GenerationDefaults::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_env() -> Self {
        let endpoint = env::var("RFILL_ENDPOINT").ok();

        EngineConfig {
            endpoint,
            model: FillModel::default(),
            watermark: WatermarkConfig::from_env(),
            defaults: GenerationDefaults::default(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_model(mut self, model: FillModel) -> Self {
        self.model = model;
        self
    }

    pub fn with_watermark(mut self, config: WatermarkConfig) -> Self {
        self.watermark = Some(config);
        self
    }

    pub fn with_defaults(mut self, defaults: GenerationDefaults) -> Self {
        self.defaults = defaults;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_defaults() {
        let defaults = GenerationDefaults::default();
        assert_eq!(defaults.guidance_scale, 1.5);
        assert_eq!(defaults.steps, 10);
        assert!(defaults.paste_back);
    }

    #[test]
    fn test_builder_chain() {
        let config = EngineConfig::new()
            .with_endpoint("http://localhost:7860")
            .with_watermark(WatermarkConfig::new("fonts/demo.ttf").with_text("Demo"))
            .with_defaults(GenerationDefaults::new().with_steps(20));

        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:7860"));
        assert_eq!(config.watermark.as_ref().unwrap().text, "Demo");
        assert_eq!(config.defaults.steps, 20);
    }

    #[test]
    fn test_ranges() {
        assert!(GUIDANCE_SCALE_RANGE.contains(&DEFAULT_GUIDANCE_SCALE));
        assert!(STEPS_RANGE.contains(&DEFAULT_STEPS));
    }
}
