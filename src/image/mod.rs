//! Image types and the generation client.

mod client;
pub mod gemini;
mod types;

pub use client::GenerationClient;
pub use gemini::{GeminiClient, GeminiClientBuilder, GeminiModel};
pub use types::{
    EncodedImage, GenerationResult, ImageFormat, DEFAULT_MEDIA_TYPE, DOWNLOAD_PREFIX,
};
