//! Generation client trait.

use crate::error::Result;
use crate::image::types::EncodedImage;
use async_trait::async_trait;
use std::sync::Arc;

/// Trait for the remote capability that turns a product photo into a studio shot.
///
/// Every call goes to the remote service. Implementations do no caching,
/// batching or retrying.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Sends `source` (labelled with `media_type`) and returns the generated image.
    async fn generate(&self, source: &EncodedImage, media_type: &str) -> Result<EncodedImage>;

    /// Returns the name of this client for display.
    fn name(&self) -> &str;

    /// Checks if the service is reachable and authenticated.
    async fn health_check(&self) -> Result<()>;
}

#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for Arc<T> {
    async fn generate(&self, source: &EncodedImage, media_type: &str) -> Result<EncodedImage> {
        (**self).generate(source, media_type).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health_check(&self) -> Result<()> {
        (**self).health_check().await
    }
}

#[async_trait]
impl<T: GenerationClient + ?Sized> GenerationClient for Box<T> {
    async fn generate(&self, source: &EncodedImage, media_type: &str) -> Result<EncodedImage> {
        (**self).generate(source, media_type).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health_check(&self) -> Result<()> {
        (**self).health_check().await
    }
}
