pub mod fill;
pub mod http;
pub mod inference;

use crate::compose::Stamper;
use crate::config::{EngineConfig, GenerationDefaults};
use crate::error::{FillError, Result};
use std::sync::Arc;

pub use fill::{FillClient, PairStream};
pub use http::HttpInferenceService;
pub use inference::{FrameStream, InferenceService};

/// One-time, explicit startup for the fill pipeline: resolve the backend,
/// probe it, and load the watermark font. Once constructed the engine is
/// ready; there is no teardown beyond process exit.
pub struct FillEngine {
    fill_client: FillClient,
    defaults: GenerationDefaults,
}

impl FillEngine {
    pub async fn new(config: EngineConfig) -> Result<Self> {
        let endpoint = config.endpoint.clone().ok_or_else(|| {
            FillError::ConfigError("inference endpoint is required (RFILL_ENDPOINT)".into())
        })?;

        let service = HttpInferenceService::new(endpoint, config.model);
        service.health_check().await?;

        Self::with_service(Arc::new(service), config)
    }

    /// Build the engine over a caller-supplied backend. A configured
    /// watermark whose font cannot be loaded fails startup here; stamping
    /// never fails mid-request.
    pub fn with_service(
        service: Arc<dyn InferenceService>,
        config: EngineConfig,
    ) -> Result<Self> {
        let stamper = match &config.watermark {
            Some(watermark) => Some(Arc::new(Stamper::from_config(watermark)?)),
            None => None,
        };

        log::info!(
            "Fill engine ready: model {}, watermark {}",
            config.model.display_name(),
            if stamper.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            fill_client: FillClient::new(service, stamper),
            defaults: config.defaults,
        })
    }

    pub fn fill(&self) -> &FillClient {
        &self.fill_client
    }

    pub fn defaults(&self) -> &GenerationDefaults {
        &self.defaults
    }
}
