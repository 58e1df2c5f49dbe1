use futures::StreamExt;
use image::{Rgba, RgbaImage};
use rfill::{EngineConfig, FillEngine, FillModel, GenerationRequest};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded successfully"),
        Err(_) => log::warn!("⚠️  No .env file found, using system environment variables"),
    }

    rfill::logger::init_with_config(
        rfill::logger::LoggerConfig::development().with_level(rfill::logger::LogLevel::Debug),
    )?;

    rfill::logger::log_startup_info("rfill", env!("CARGO_PKG_VERSION"));

    log::info!("🔍 Checking environment...");
    match env::var("RFILL_ENDPOINT") {
        Ok(endpoint) => log::info!("RFILL_ENDPOINT: {}", endpoint),
        Err(_) => {
            log::error!("❌ RFILL_ENDPOINT not set, nothing to talk to");
            return Err("RFILL_ENDPOINT is required".into());
        }
    }
    if env::var("RFILL_WATERMARK_FONT").is_err() {
        log::warn!("⚠️  RFILL_WATERMARK_FONT not set, output will not be stamped");
    }

    let config = EngineConfig::from_env();

    log::info!("🔄 Starting fill engine...");
    let engine = match FillEngine::new(config).await {
        Ok(engine) => {
            log::info!("✅ Fill engine initialized successfully");
            engine
        }
        Err(e) => {
            log::error!("❌ Failed to initialize fill engine: {}", e);
            return Err(e.into());
        }
    };

    log::info!("🖼️  Available fill models:");
    for (id, name, provider) in FillModel::supported_models() {
        log::info!("  {} - {} ({})", id, name, provider);
    }

    // Synthetic request: white canvas with a square region to regenerate.
    log::info!("🧪 Building a demo request (white 512x512, 100x100 masked square)...");
    let source = RgbaImage::from_pixel(512, 512, Rgba([255, 255, 255, 255]));
    let mut mask_layer = RgbaImage::new(512, 512);
    for y in 200..300 {
        for x in 200..300 {
            mask_layer.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
    }

    let request = GenerationRequest::new("a bright red brick wall", source, mask_layer)
        .with_defaults(engine.defaults())
        .with_negative_prompt("blurry, low quality");

    log::info!("🌊 Streaming fill frames...");
    let mut pairs = engine.fill().generate(request).await?;
    let mut frame_count = 0;

    while let Some(item) = pairs.next().await {
        match item {
            Ok(pair) if pair.is_final() => {
                log::info!("🏁 Terminal frame received after {} previews", frame_count);

                let stamp = chrono::Utc::now().timestamp();
                let source_path = format!("fill_source_{}.png", stamp);
                let output_path = format!("fill_output_{}.png", stamp);

                pair.left.save(&source_path)?;
                pair.right.save(&output_path)?;
                log::info!("💾 Saved {} and {}", source_path, output_path);
            }
            Ok(_) => {
                frame_count += 1;
                log::info!("📺 Preview frame {}", frame_count);
            }
            Err(e) => {
                log::error!("❌ Fill failed: {}", e);
                return Err(e.into());
            }
        }
    }

    log::info!("🎉 Demo completed!");
    Ok(())
}
