//! Drives a [`Session`] against a [`GenerationClient`].

use crate::error::{Result, StudioError};
use crate::image::{EncodedImage, GenerationClient};
use crate::session::{GenerationTicket, GenerationToken, Session, Status};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;

/// A generation running on its own task.
///
/// Hand it back to [`StudioController::finish`] to apply the outcome.
/// Dropping it detaches the task and its outcome is never applied.
#[must_use = "a pending generation does nothing until it is finished"]
#[derive(Debug)]
pub struct PendingGeneration {
    token: GenerationToken,
    handle: JoinHandle<Result<EncodedImage>>,
}

impl PendingGeneration {
    /// Token of the generation this belongs to.
    pub fn token(&self) -> GenerationToken {
        self.token
    }
}

/// Owns the session and the client that serves it.
pub struct StudioController<C> {
    client: Arc<C>,
    session: Session,
}

impl<C: GenerationClient + 'static> StudioController<C> {
    /// Starts with an empty session.
    pub fn new(client: C) -> Self {
        Self::with_shared_client(Arc::new(client))
    }

    /// Starts with an empty session and a client shared with other owners.
    pub fn with_shared_client(client: Arc<C>) -> Self {
        Self {
            client,
            session: Session::new(),
        }
    }

    /// The session as it stands.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current status.
    pub fn status(&self) -> &Status {
        self.session.status()
    }

    /// The client used for generation.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Reads a photo from disk and makes it the source.
    ///
    /// The session is left untouched if the file can't be read.
    pub fn select_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let image = EncodedImage::from_path(path)?;
        let media_type = image.media_type().to_string();
        self.session.select_source(image, media_type);
        Ok(())
    }

    /// Makes an already loaded image the source.
    pub fn select_image(&mut self, image: EncodedImage, media_type: impl Into<String>) {
        self.session.select_source(image, media_type);
    }

    /// Generates a studio shot for the current photo and waits for it.
    ///
    /// Without a photo, or while another generation runs, nothing happens.
    pub async fn generate(&mut self) -> &Status {
        if let Some(ticket) = self.session.begin_generation() {
            self.run(ticket).await;
        }
        self.session.status()
    }

    /// Generates again from the same photo. Only does something after a success.
    pub async fn retry(&mut self) -> &Status {
        if let Some(ticket) = self.session.retry() {
            self.run(ticket).await;
        }
        self.session.status()
    }

    /// Starts a generation on a background task and returns immediately.
    ///
    /// The controller stays usable while the call runs. Resetting or
    /// selecting another photo in the meantime makes the outcome stale.
    ///
    /// The session stays `Generating` until the returned handle is passed to
    /// [`StudioController::finish`]. Dropping it leaves the session there,
    /// with generate disabled, until [`StudioController::reset`] or a new
    /// photo is selected.
    pub fn spawn_generation(&mut self) -> Option<PendingGeneration> {
        let ticket = self.session.begin_generation()?;
        let client = Arc::clone(&self.client);
        let token = ticket.token;
        let handle = tokio::spawn(async move {
            client.generate(&ticket.source, &ticket.media_type).await
        });
        Some(PendingGeneration { token, handle })
    }

    /// Waits for a spawned generation and applies its outcome.
    ///
    /// Returns false if the outcome was stale and dropped.
    pub async fn finish(&mut self, pending: PendingGeneration) -> bool {
        let outcome = match pending.handle.await {
            Ok(outcome) => outcome,
            Err(err) => Err(StudioError::Generation(format!(
                "generation task failed: {err}"
            ))),
        };
        self.session.complete(pending.token, outcome)
    }

    /// Back to the empty session. A running generation is not cancelled;
    /// its outcome is dropped when it arrives.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Saves the studio shot into `dir`. Only available on success.
    pub fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        self.session.download(dir)
    }

    async fn run(&mut self, ticket: GenerationTicket) {
        let outcome = self
            .client
            .generate(&ticket.source, &ticket.media_type)
            .await;
        self.session.complete(ticket.token, outcome);
    }
}
