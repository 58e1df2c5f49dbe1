use futures::StreamExt;
use image::{Rgba, RgbaImage};
use rfill::{EngineConfig, FillEngine, GenerationRequest};
use std::env;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    match dotenv::dotenv() {
        Ok(_) => log::info!("✅ .env file loaded"),
        Err(_) => log::warn!("⚠️  No .env file found"),
    }
    rfill::logger::init()?;

    let endpoint = env::var("RFILL_ENDPOINT")?;
    let config = EngineConfig::new().with_endpoint(endpoint);
    let engine = FillEngine::new(config).await?;

    let source = image::open("input.png")?.to_rgba8();
    let mut mask_layer = RgbaImage::new(source.width(), source.height());
    for y in source.height() / 4..source.height() / 2 {
        for x in source.width() / 4..source.width() / 2 {
            mask_layer.put_pixel(x, y, Rgba([255, 255, 255, 255]));
        }
    }

    let request = GenerationRequest::new("a field of sunflowers", source, mask_layer)
        .with_negative_prompt("artifacts, text")
        .with_steps(20);

    let mut pairs = engine.fill().generate(request).await?;
    while let Some(pair) = pairs.next().await {
        let pair = pair?;
        if pair.is_final() {
            pair.right.save("output.png")?;
            println!("wrote output.png");
        }
    }

    Ok(())
}
