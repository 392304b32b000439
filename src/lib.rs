#![warn(missing_docs)]
//! Studio Pro - turn casual product photos into studio shots.
//!
//! The crate reads a product photo, sends it to the Gemini image model with a
//! studio-photography instruction and keeps the returned image in a small
//! session that can be downloaded, retried or reset.
//!
//! # Quick Start
//!
//! ```no_run
//! use studio_pro::{GeminiClient, Status, StudioController};
//!
//! #[tokio::main]
//! async fn main() -> studio_pro::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let mut controller = StudioController::new(client);
//!
//!     controller.select_file("photo.jpg")?;
//!     let status = controller.generate().await.clone();
//!     match status {
//!         Status::Success(_) => {
//!             let path = controller.download(".")?;
//!             println!("saved {}", path.display());
//!         }
//!         Status::Failed(message) => eprintln!("{message}"),
//!         _ => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Using the client directly
//!
//! ```no_run
//! use studio_pro::{EncodedImage, GeminiClient, GenerationClient};
//!
//! #[tokio::main]
//! async fn main() -> studio_pro::Result<()> {
//!     let client = GeminiClient::builder().build()?;
//!     let photo = EncodedImage::from_path("photo.jpg")?;
//!     let shot = client.generate(&photo, photo.media_type()).await?;
//!     shot.save("shot.png")?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
mod error;
pub mod image;
pub mod session;

// Re-export error types at crate root
pub use error::{Result, StudioError, DEFAULT_FAILURE_MESSAGE};

pub use config::Settings;
pub use controller::{PendingGeneration, StudioController};
pub use image::{
    EncodedImage, GeminiClient, GeminiClientBuilder, GeminiModel, GenerationClient,
    GenerationResult, ImageFormat,
};
pub use session::{GenerationTicket, GenerationToken, Session, Status};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, StudioError};
    pub use crate::image::{EncodedImage, GeminiClient, GenerationClient, GenerationResult};
    pub use crate::session::{Session, Status};
    pub use crate::StudioController;
}
