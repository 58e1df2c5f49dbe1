pub mod compose;
pub mod config;
pub mod engine;
pub mod error;
pub mod logger;
pub mod models;
pub mod session;

pub use compose::{mask_out, paste_in, BinaryMask, Stamper};
pub use config::{EngineConfig, GenerationDefaults, WatermarkConfig};
pub use engine::{
    FillClient, FillEngine, FrameStream, HttpInferenceService, InferenceService, PairStream,
};
pub use error::{FillError, Result};
pub use models::{FillModel, FrameKind, FramePair, GenerationRequest, PromptEmbeddings};
pub use session::{Session, SessionView};
