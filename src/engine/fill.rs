use crate::compose::{mask_out, paste_in, BinaryMask, Stamper};
use crate::engine::inference::InferenceService;
use crate::error::{FillError, Result};
use crate::logger;
use crate::models::{FramePair, GenerationRequest};
use futures::stream::Stream;
use futures::StreamExt;
use image::RgbaImage;
use std::pin::Pin;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

/// Lazy, forward-only sequence of comparison pairs: every intermediate frame
/// against the masked conditioning image, then exactly one terminal pair of
/// original source against the finished output.
pub type PairStream = Pin<Box<dyn Stream<Item = Result<FramePair>> + Send>>;

#[derive(Clone)]
pub struct FillClient {
    service: Arc<dyn InferenceService>,
    stamper: Option<Arc<Stamper>>,
}

impl FillClient {
    pub fn new(service: Arc<dyn InferenceService>, stamper: Option<Arc<Stamper>>) -> Self {
        Self { service, stamper }
    }

    /// Run one fill request. Parameter and dimension problems fail here,
    /// before any inference work is spent. The returned stream delivers
    /// frames strictly in order; dropping it cancels the request.
    pub async fn generate(&self, request: GenerationRequest) -> Result<PairStream> {
        request.validate()?;

        let request_id = Uuid::new_v4();
        log::info!(
            "Fill request {}: {} steps, guidance {}, paste_back={}",
            request_id,
            request.steps,
            request.guidance_scale,
            request.paste_back
        );

        let embeddings = self
            .service
            .encode_prompt(&request.prompt, &request.negative_prompt)
            .await?;

        let mask = BinaryMask::from_layer(&request.mask_layer, request.source.dimensions())?;
        let conditioning = mask_out(&request.source, &mask);

        let mut frames = self
            .service
            .run(
                embeddings,
                conditioning.clone(),
                request.guidance_scale,
                request.steps,
            )
            .await?;

        let stamper = self.stamper.clone();
        let (tx, rx) = tokio::sync::mpsc::channel(8);

        tokio::spawn(async move {
            let _timer = logger::timer(&format!("fill {}", request_id));
            let mut last: Option<RgbaImage> = None;
            let mut surfaced = 0u32;

            while let Some(item) = frames.next().await {
                match item {
                    Ok(frame) => {
                        surfaced += 1;
                        log::debug!("Fill request {}: frame {}", request_id, surfaced);
                        last = Some(frame.clone());
                        let pair = FramePair::progress(frame, conditioning.clone());
                        if tx.send(Ok(pair)).await.is_err() {
                            log::debug!("Fill request {}: consumer gone, stopping", request_id);
                            return;
                        }
                    }
                    Err(e) => {
                        log::error!("Fill request {}: inference failed: {}", request_id, e);
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }

            let Some(final_frame) = last else {
                let _ = tx
                    .send(Err(FillError::ResponseError(
                        "inference produced no frames".into(),
                    )))
                    .await;
                return;
            };

            let mut output = if request.paste_back {
                if final_frame.dimensions() != conditioning.dimensions() {
                    let _ = tx
                        .send(Err(FillError::ResponseError(format!(
                            "final frame is {:?} but conditioning image is {:?}",
                            final_frame.dimensions(),
                            conditioning.dimensions()
                        ))))
                        .await;
                    return;
                }
                paste_in(&conditioning, &final_frame, &mask)
            } else {
                final_frame
            };

            if let Some(stamper) = stamper.as_ref() {
                stamper.stamp(&mut output);
            }

            log::info!(
                "Fill request {}: finished after {} frames",
                request_id,
                surfaced
            );
            let _ = tx.send(Ok(FramePair::terminal(request.source, output))).await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::inference::FrameStream;
    use crate::models::{FrameKind, PromptEmbeddings};
    use async_trait::async_trait;
    use image::Rgba;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct StubService {
        frames: Mutex<Option<Vec<Result<RgbaImage>>>>,
        encode_calls: AtomicUsize,
    }

    impl StubService {
        fn with_frames(frames: Vec<Result<RgbaImage>>) -> Arc<Self> {
            Arc::new(Self {
                frames: Mutex::new(Some(frames)),
                encode_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl InferenceService for StubService {
        async fn encode_prompt(
            &self,
            _prompt: &str,
            _negative_prompt: &str,
        ) -> Result<PromptEmbeddings> {
            self.encode_calls.fetch_add(1, Ordering::SeqCst);
            Ok(PromptEmbeddings::new(json!({"stub": true})))
        }

        async fn run(
            &self,
            _embeddings: PromptEmbeddings,
            _conditioning: RgbaImage,
            _guidance_scale: f32,
            _steps: u32,
        ) -> Result<FrameStream> {
            let frames = self.frames.lock().unwrap().take().expect("run called twice");
            Ok(Box::pin(futures::stream::iter(frames)))
        }
    }

    fn solid(w: u32, h: u32, color: [u8; 4]) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba(color))
    }

    /// 512x512 transparent layer with an opaque square over (200,200)-(300,300).
    fn square_layer() -> RgbaImage {
        let mut layer = RgbaImage::new(512, 512);
        for y in 200..300 {
            for x in 200..300 {
                layer.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        layer
    }

    async fn collect(mut stream: PairStream) -> Vec<Result<FramePair>> {
        let mut items = Vec::new();
        while let Some(item) = stream.next().await {
            items.push(item);
        }
        items
    }

    #[tokio::test]
    async fn test_paste_back_restores_context_around_generated_square() {
        let white = solid(512, 512, [255, 255, 255, 255]);
        let red = solid(512, 512, [255, 0, 0, 255]);
        let service = StubService::with_frames(vec![Ok(red)]);
        let client = FillClient::new(service, None);

        let request = GenerationRequest::new("a red square", white.clone(), square_layer());
        let items = collect(client.generate(request).await.unwrap()).await;
        assert_eq!(items.len(), 2);

        let progress = items[0].as_ref().unwrap();
        assert_eq!(progress.kind, FrameKind::Progress);
        // conditioning frame: black inside the square, source elsewhere
        assert_eq!(*progress.right.get_pixel(250, 250), Rgba([0, 0, 0, 255]));
        assert_eq!(*progress.right.get_pixel(10, 10), Rgba([255, 255, 255, 255]));

        let terminal = items[1].as_ref().unwrap();
        assert!(terminal.is_final());
        assert_eq!(terminal.left, white);
        assert_eq!(*terminal.right.get_pixel(250, 250), Rgba([255, 0, 0, 255]));
        assert_eq!(*terminal.right.get_pixel(10, 10), Rgba([255, 255, 255, 255]));
        assert_eq!(*terminal.right.get_pixel(199, 250), Rgba([255, 255, 255, 255]));
        assert_eq!(*terminal.right.get_pixel(200, 250), Rgba([255, 0, 0, 255]));
    }

    #[tokio::test]
    async fn test_paste_back_disabled_keeps_raw_output() {
        let white = solid(512, 512, [255, 255, 255, 255]);
        let red = solid(512, 512, [255, 0, 0, 255]);
        let service = StubService::with_frames(vec![Ok(red.clone())]);
        let client = FillClient::new(service, None);

        let request = GenerationRequest::new("a red square", white, square_layer())
            .with_paste_back(false);
        let items = collect(client.generate(request).await.unwrap()).await;

        let terminal = items.last().unwrap().as_ref().unwrap();
        assert!(terminal.is_final());
        assert_eq!(terminal.right, red);
    }

    #[tokio::test]
    async fn test_frames_arrive_in_order_then_terminal() {
        let source = solid(16, 16, [9, 9, 9, 255]);
        let mut layer = RgbaImage::new(16, 16);
        layer.put_pixel(3, 3, Rgba([0, 0, 0, 255]));

        let shades = [40u8, 120, 230];
        let frames = shades
            .iter()
            .map(|&v| Ok(solid(16, 16, [v, v, v, 255])))
            .collect();
        let client = FillClient::new(StubService::with_frames(frames), None);

        let request = GenerationRequest::new("x", source, layer);
        let items = collect(client.generate(request).await.unwrap()).await;
        assert_eq!(items.len(), 4);

        for (i, &v) in shades.iter().enumerate() {
            let pair = items[i].as_ref().unwrap();
            assert_eq!(pair.kind, FrameKind::Progress);
            assert_eq!(*pair.left.get_pixel(0, 0), Rgba([v, v, v, 255]));
        }
        assert!(items[3].as_ref().unwrap().is_final());
    }

    #[tokio::test]
    async fn test_inference_failure_ends_stream_without_terminal_pair() {
        let source = solid(16, 16, [9, 9, 9, 255]);
        let layer = square_mask_16();
        let frames = vec![
            Ok(solid(16, 16, [1, 1, 1, 255])),
            Err(FillError::InferenceError("sampler blew up".into())),
        ];
        let client = FillClient::new(StubService::with_frames(frames), None);

        let items = collect(client.generate(GenerationRequest::new("x", source, layer)).await.unwrap()).await;
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(FillError::InferenceError(_))));
    }

    #[tokio::test]
    async fn test_empty_inference_stream_is_a_response_error() {
        let source = solid(16, 16, [9, 9, 9, 255]);
        let client = FillClient::new(StubService::with_frames(Vec::new()), None);

        let items = collect(client.generate(GenerationRequest::new("x", source, square_mask_16())).await.unwrap()).await;
        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], Err(FillError::ResponseError(_))));
    }

    #[tokio::test]
    async fn test_invalid_request_fails_before_any_inference() {
        let source = solid(16, 16, [9, 9, 9, 255]);
        let service = StubService::with_frames(vec![Ok(solid(16, 16, [0, 0, 0, 255]))]);
        let client = FillClient::new(service.clone(), None);

        let request = GenerationRequest::new("x", source.clone(), square_mask_16())
            .with_guidance_scale(50.0);
        assert!(client.generate(request).await.is_err());

        let request = GenerationRequest::new("x", source, RgbaImage::new(8, 8));
        assert!(matches!(
            client.generate(request).await,
            Err(FillError::DimensionMismatch(_))
        ));

        assert_eq!(service.encode_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_mismatched_final_frame_fails_paste_back() {
        let source = solid(16, 16, [9, 9, 9, 255]);
        let client = FillClient::new(
            StubService::with_frames(vec![Ok(solid(8, 8, [1, 1, 1, 255]))]),
            None,
        );

        let items = collect(client.generate(GenerationRequest::new("x", source, square_mask_16())).await.unwrap()).await;
        // one progress pair, then the composite refuses the odd-sized frame
        assert_eq!(items.len(), 2);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(FillError::ResponseError(_))));
    }

    fn square_mask_16() -> RgbaImage {
        let mut layer = RgbaImage::new(16, 16);
        for y in 4..12 {
            for x in 4..12 {
                layer.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }
        layer
    }
}
