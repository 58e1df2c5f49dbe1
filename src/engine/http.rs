use crate::engine::inference::{FrameStream, InferenceService};
use crate::error::{FillError, Result};
use crate::models::{FillModel, PromptEmbeddings};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures::StreamExt;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use tokio_stream::wrappers::ReceiverStream;

/// Inference backend reached over HTTP. Prompt conditioning comes back as an
/// opaque JSON payload from `/v1/encode`; `/v1/fill` answers with
/// newline-delimited JSON, one base64 PNG frame per line.
pub struct HttpInferenceService {
    client: reqwest::Client,
    base_url: String,
    model: FillModel,
}

#[derive(Serialize)]
struct EncodeRequest<'a> {
    prompt: &'a str,
    negative_prompt: &'a str,
    model: &'a str,
}

#[derive(Deserialize)]
struct EncodeResponse {
    conditioning: serde_json::Value,
}

#[derive(Serialize)]
struct FillRequest {
    conditioning: serde_json::Value,
    image: String,
    guidance_scale: f32,
    steps: u32,
    model: String,
}

#[derive(Deserialize)]
struct FrameLine {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

impl HttpInferenceService {
    pub fn new(base_url: impl Into<String>, model: FillModel) -> Self {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
            model,
        }
    }

    /// Probe the backend before taking requests.
    pub async fn health_check(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/healthz", self.base_url))
            .send()
            .await
            .map_err(|e| {
                FillError::InferenceError(format!("backend unreachable at {}: {}", self.base_url, e))
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(FillError::InferenceError(format!(
                "backend health check returned {}",
                response.status()
            )))
        }
    }
}

#[async_trait]
impl InferenceService for HttpInferenceService {
    async fn encode_prompt(
        &self,
        prompt: &str,
        negative_prompt: &str,
    ) -> Result<PromptEmbeddings> {
        let payload = EncodeRequest {
            prompt,
            negative_prompt,
            model: self.model.model_id(),
        };

        log::debug!("Encoding prompt against {}", self.base_url);

        let response = self
            .client
            .post(format!("{}/v1/encode", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| FillError::InferenceError(format!("encode request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FillError::InferenceError(format!(
                "encode request returned {}: {}",
                status, body
            )));
        }

        let parsed: EncodeResponse = response
            .json()
            .await
            .map_err(|e| FillError::ResponseError(format!("bad encode response: {}", e)))?;

        Ok(PromptEmbeddings::new(parsed.conditioning))
    }

    async fn run(
        &self,
        embeddings: PromptEmbeddings,
        conditioning: RgbaImage,
        guidance_scale: f32,
        steps: u32,
    ) -> Result<FrameStream> {
        let payload = FillRequest {
            conditioning: embeddings.payload,
            image: encode_png(&conditioning)?,
            guidance_scale,
            steps,
            model: self.model.model_id().to_string(),
        };

        log::info!(
            "Submitting fill job to {} ({} steps, guidance {})",
            self.base_url,
            steps,
            guidance_scale
        );

        let response = self
            .client
            .post(format!("{}/v1/fill", self.base_url))
            .json(&payload)
            .send()
            .await
            .map_err(|e| FillError::InferenceError(format!("fill request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(FillError::InferenceError(format!(
                "fill request returned {}: {}",
                status, body
            )));
        }

        let mut body = Box::pin(response.bytes_stream());
        let (tx, rx) = tokio::sync::mpsc::channel(16);

        tokio::spawn(async move {
            let mut buffer: Vec<u8> = Vec::new();

            while let Some(chunk) = body.next().await {
                let bytes = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        let _ = tx
                            .send(Err(FillError::InferenceError(format!(
                                "frame stream failed: {}",
                                e
                            ))))
                            .await;
                        return;
                    }
                };

                buffer.extend_from_slice(&bytes);
                while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                    let line: Vec<u8> = buffer.drain(..=pos).collect();
                    let line = String::from_utf8_lossy(&line).to_string();
                    match decode_frame_line(&line) {
                        Ok(Some(frame)) => {
                            if tx.send(Ok(frame)).await.is_err() {
                                return;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => {
                            let _ = tx.send(Err(e)).await;
                            return;
                        }
                    }
                }
            }

            // frame on the last line without a trailing newline
            if !buffer.is_empty() {
                let line = String::from_utf8_lossy(&buffer).to_string();
                match decode_frame_line(&line) {
                    Ok(Some(frame)) => {
                        let _ = tx.send(Ok(frame)).await;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                    }
                }
            }
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}

fn encode_png(image: &RgbaImage) -> Result<String> {
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, image::ImageFormat::Png)
        .map_err(|e| {
            FillError::RequestError(format!("failed to encode conditioning image: {}", e))
        })?;
    Ok(BASE64.encode(buffer.into_inner()))
}

fn decode_frame_line(line: &str) -> Result<Option<RgbaImage>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let frame: FrameLine = serde_json::from_str(line)
        .map_err(|e| FillError::ResponseError(format!("bad frame line: {}", e)))?;

    if let Some(message) = frame.error {
        return Err(FillError::InferenceError(message));
    }

    let Some(encoded) = frame.image else {
        // a bare done marker carries no frame
        return if frame.done {
            Ok(None)
        } else {
            Err(FillError::ResponseError("frame line without image".into()))
        };
    };

    let bytes = BASE64
        .decode(encoded.as_bytes())
        .map_err(|e| FillError::ResponseError(format!("bad frame encoding: {}", e)))?;
    let frame = image::load_from_memory(&bytes)
        .map_err(|e| FillError::ResponseError(format!("undecodable frame: {}", e)))?
        .to_rgba8();

    Ok(Some(frame))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn png_line(image: &RgbaImage) -> String {
        format!("{{\"image\":\"{}\"}}", encode_png(image).unwrap())
    }

    #[test]
    fn test_decode_frame_line_round_trips_png() {
        let frame = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, 255]));
        let decoded = decode_frame_line(&png_line(&frame)).unwrap().unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_decode_frame_line_skips_blank_and_done() {
        assert!(decode_frame_line("").unwrap().is_none());
        assert!(decode_frame_line("  \n").unwrap().is_none());
        assert!(decode_frame_line("{\"done\":true}").unwrap().is_none());
    }

    #[test]
    fn test_decode_frame_line_surfaces_backend_error() {
        let result = decode_frame_line("{\"error\":\"out of VRAM\"}");
        match result {
            Err(FillError::InferenceError(msg)) => assert_eq!(msg, "out of VRAM"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_decode_frame_line_rejects_garbage() {
        assert!(matches!(
            decode_frame_line("not json"),
            Err(FillError::ResponseError(_))
        ));
        assert!(matches!(
            decode_frame_line("{\"image\":\"%%%\"}"),
            Err(FillError::ResponseError(_))
        ));
        assert!(matches!(
            decode_frame_line("{\"done\":false}"),
            Err(FillError::ResponseError(_))
        ));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let service = HttpInferenceService::new("http://localhost:7860/", FillModel::default());
        assert_eq!(service.base_url, "http://localhost:7860");
    }
}
