use crate::error::Result;
use crate::models::PromptEmbeddings;
use async_trait::async_trait;
use futures::stream::Stream;
use image::RgbaImage;
use std::pin::Pin;

/// Lazy, forward-only sequence of intermediate frames from a running fill
/// job, one per surfaced denoising step.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<RgbaImage>> + Send>>;

/// Seam in front of the external pretrained diffusion pipeline. The pipeline
/// owns the model weights, sampler, and conditioning network; the orchestrator
/// only drives this contract.
#[async_trait]
pub trait InferenceService: Send + Sync {
    /// Encode a prompt/negative-prompt pair into backend-owned conditioning.
    async fn encode_prompt(&self, prompt: &str, negative_prompt: &str)
        -> Result<PromptEmbeddings>;

    /// Start a fill job against the masked conditioning image. Frames arrive
    /// in denoising order; the last one is the finished raw output.
    async fn run(
        &self,
        embeddings: PromptEmbeddings,
        conditioning: RgbaImage,
        guidance_scale: f32,
        steps: u32,
    ) -> Result<FrameStream>;
}
