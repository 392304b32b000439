//! The in-memory studio session and its status state machine.
//!
//! A [`Session`] holds at most one source photo and at most one result.
//! Which of those is present is decided by [`Status`]:
//!
//! | status       | source   | result | error |
//! |--------------|----------|--------|-------|
//! | `Idle`       | optional | -      | -     |
//! | `Generating` | yes      | -      | -     |
//! | `Success`    | yes      | yes    | -     |
//! | `Failed`     | yes      | -      | yes   |
//!
//! Every generation is tagged with a token. Selecting a new photo, resetting
//! or starting another generation moves the token on, so a reply that arrives
//! for an older token is dropped instead of landing in a session that has
//! moved on.

use crate::error::{Result, StudioError, DEFAULT_FAILURE_MESSAGE};
use crate::image::{EncodedImage, GenerationResult, DEFAULT_MEDIA_TYPE};
use std::path::{Path, PathBuf};

/// Where the session is in the generate cycle.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Status {
    /// Nothing generated yet for the current photo (or no photo at all).
    #[default]
    Idle,
    /// A request is in flight.
    Generating,
    /// The studio shot is ready.
    Success(GenerationResult),
    /// The last attempt failed with this message.
    Failed(String),
}

impl Status {
    /// Short lowercase name, for logs and JSON output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Generating => "generating",
            Self::Success(_) => "success",
            Self::Failed(_) => "failed",
        }
    }
}

/// Identifies one generation attempt.
pub type GenerationToken = u64;

/// Everything needed to run one generation outside the session.
#[derive(Debug, Clone)]
pub struct GenerationTicket {
    /// Token to hand back to [`Session::complete`].
    pub token: GenerationToken,
    /// The photo to send.
    pub source: EncodedImage,
    /// The media type reported for the photo.
    pub media_type: String,
}

/// State for one user session.
#[derive(Debug, Clone)]
pub struct Session {
    source: Option<EncodedImage>,
    media_type: String,
    status: Status,
    token: GenerationToken,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// An empty session: no photo, `Idle`.
    pub fn new() -> Self {
        Self {
            source: None,
            media_type: DEFAULT_MEDIA_TYPE.to_string(),
            status: Status::Idle,
            token: 0,
        }
    }

    /// Replaces the source photo and returns to `Idle`.
    ///
    /// Any previous result or error is cleared and a pending generation
    /// becomes stale.
    pub fn select_source(&mut self, image: EncodedImage, media_type: impl Into<String>) {
        let media_type = media_type.into();
        tracing::info!(media_type = %media_type, bytes = image.len(), "source photo selected");
        self.source = Some(image);
        self.media_type = media_type;
        self.status = Status::Idle;
        self.token += 1;
    }

    /// Starts a generation for the current photo.
    ///
    /// Returns `None` and changes nothing when there is no photo or a
    /// generation is already running.
    pub fn begin_generation(&mut self) -> Option<GenerationTicket> {
        if !self.can_generate() {
            return None;
        }
        let source = self.source.clone()?;
        self.token += 1;
        self.status = Status::Generating;
        tracing::info!(token = self.token, "generation started");
        Some(GenerationTicket {
            token: self.token,
            source,
            media_type: self.media_type.clone(),
        })
    }

    /// Generates again from the same photo. Only allowed after a success.
    pub fn retry(&mut self) -> Option<GenerationTicket> {
        if !self.can_retry() {
            return None;
        }
        self.begin_generation()
    }

    /// Applies the outcome of the generation identified by `token`.
    ///
    /// Returns false, leaving the session untouched, when the token is no
    /// longer current.
    pub fn complete(&mut self, token: GenerationToken, outcome: Result<EncodedImage>) -> bool {
        if token != self.token || self.status != Status::Generating {
            tracing::warn!(
                token,
                current = self.token,
                status = self.status.label(),
                "discarding stale generation outcome"
            );
            return false;
        }

        match (outcome, self.source.clone()) {
            (Ok(produced), Some(source)) => {
                tracing::info!(token, bytes = produced.len(), "generation succeeded");
                self.status = Status::Success(GenerationResult::new(source, produced));
            }
            (Ok(_), None) => {
                // Generating always has a source.
                self.status = Status::Failed(DEFAULT_FAILURE_MESSAGE.to_string());
            }
            (Err(err), _) => {
                let message = err.failure_message();
                tracing::info!(token, error = %message, "generation failed");
                self.status = Status::Failed(message);
            }
        }
        true
    }

    /// Back to the initial empty state. A pending generation becomes stale.
    pub fn reset(&mut self) {
        tracing::info!("session reset");
        self.source = None;
        self.media_type = DEFAULT_MEDIA_TYPE.to_string();
        self.status = Status::Idle;
        self.token += 1;
    }

    /// Writes the studio shot to `dir` as `studio-pro-<millis>.png`.
    ///
    /// Only available on success. Does not change the session.
    pub fn download(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let result = self.result().ok_or_else(|| {
            StudioError::InvalidRequest("no generated image to download".into())
        })?;
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(result.download_file_name());
        result.produced_image.save(&path)?;
        tracing::info!(path = %path.display(), "studio shot saved");
        Ok(path)
    }

    /// Current status.
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// The selected photo, if any.
    pub fn source(&self) -> Option<&EncodedImage> {
        self.source.as_ref()
    }

    /// Media type reported for the selected photo.
    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    /// The result, present exactly when the status is `Success`.
    pub fn result(&self) -> Option<&GenerationResult> {
        match &self.status {
            Status::Success(result) => Some(result),
            _ => None,
        }
    }

    /// The failure message, present exactly when the status is `Failed`.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            Status::Failed(message) => Some(message),
            _ => None,
        }
    }

    /// Token of the most recent generation or invalidation.
    pub fn current_token(&self) -> GenerationToken {
        self.token
    }

    /// True when a photo is loaded and nothing is in flight.
    pub fn can_generate(&self) -> bool {
        self.source.is_some() && self.status != Status::Generating
    }

    /// True when a retry is offered.
    pub fn can_retry(&self) -> bool {
        matches!(self.status, Status::Success(_))
    }

    /// True when there is something to download.
    pub fn can_download(&self) -> bool {
        self.can_retry()
    }
}
