use serde::{Deserialize, Serialize};

/// Model selection for region fill. Currently single-valued; the variant set
/// grows as further checkpoints are validated against the fill pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum FillModel {
    #[default]
    RealVisXlLightning,
}

impl FillModel {
    pub fn model_id(&self) -> &'static str {
        match self {
            FillModel::RealVisXlLightning => "SG161222/RealVisXL_V5.0_Lightning",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            FillModel::RealVisXlLightning => "RealVisXL V5.0 Lightning",
        }
    }

    pub fn supported_models() -> Vec<(&'static str, &'static str, &'static str)> {
        vec![(
            FillModel::RealVisXlLightning.model_id(),
            FillModel::RealVisXlLightning.display_name(),
            "SG161222",
        )]
    }
}

/// Opaque prompt conditioning produced by `InferenceService::encode_prompt`
/// and handed back untouched to `InferenceService::run`. The payload layout
/// belongs to the backend; the orchestrator never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptEmbeddings {
    pub payload: serde_json::Value,
}

impl PromptEmbeddings {
    pub fn new(payload: serde_json::Value) -> Self {
        Self { payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_models() {
        let models = FillModel::supported_models();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].0, "SG161222/RealVisXL_V5.0_Lightning");
    }
}
