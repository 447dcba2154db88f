//! Error types for the review client.
//!
//! All messages are free text meant to be shown to the reviewer as-is; there
//! are no structured error codes.

use thiserror::Error;

use crate::notice::NoticeLevel;
use crate::types::{Decision, SectionStatus};

/// Result alias used across `prism-core`.
pub type Result<T> = std::result::Result<T, ReviewError>;

/// Failures reported by, or while talking to, the backend.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The backend answered `{success: false, error}`.
    #[error("{0}")]
    Backend(String),

    /// The request never produced a response (connection refused, timeout, ...).
    #[error("Network error: {0}")]
    Transport(String),

    /// Non-OK HTTP status without a usable error body.
    #[error("Server returned HTTP {0}")]
    Status(u16),

    /// The body could not be parsed into the expected shape.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A local file needed for the request could not be read.
    #[error("Cannot read {path}: {message}")]
    File { path: String, message: String },
}

impl ApiError {
    /// Builds a `Backend` error, substituting a generic message for blank text.
    pub fn backend(message: Option<String>) -> Self {
        match message {
            Some(m) if !m.trim().is_empty() => ApiError::Backend(m),
            _ => ApiError::Backend("The server could not complete the request".to_owned()),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status(status.as_u16())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

/// Every way a review operation can fail.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ReviewError {
    #[error("No active review session. Upload a document first")]
    NoSession,

    #[error("Section {index} does not exist ({count} sections)")]
    InvalidSectionIndex { index: usize, count: usize },

    #[error("Unknown section '{0}'")]
    UnknownSection(String),

    #[error("Cannot determine the current section")]
    SectionUnresolved,

    #[error("Already at the first section")]
    AtFirstSection,

    #[error("Already at the last section")]
    AtLastSection,

    #[error("Feedback item '{0}' not found in this section")]
    FeedbackNotFound(String),

    #[error("Cannot change feedback from {} to {}; revert it first", .from.as_str(), .to.as_str())]
    InvalidTransition { from: Decision, to: Decision },

    #[error("A request for '{0}' is already in progress")]
    RequestInFlight(String),

    #[error("Section '{section}' cannot be retried while {}", .status.as_str())]
    NotRetryable {
        section: String,
        status: SectionStatus,
    },

    #[error("Please enter a description")]
    EmptyDescription,

    #[error("Please enter a message")]
    EmptyMessage,

    #[error("Select some text to highlight first")]
    EmptySelection,

    #[error("Rating must be between 1 and {max}, got {0}", max = crate::types::MAX_TOOL_RATING)]
    InvalidRating(u8),

    #[error("Cannot highlight this selection: {0}")]
    InvalidSelection(String),

    #[error("Highlight '{0}' not found")]
    HighlightNotFound(String),

    #[error("Custom feedback '{0}' not found")]
    CustomFeedbackNotFound(String),

    #[error("This action removes data and must be confirmed")]
    ConfirmationRequired,

    #[error("Unsupported document '{0}': only .docx files can be analyzed")]
    UnsupportedDocument(String),

    #[error("Complete the review before downloading the reviewed document")]
    NoCompletedReview,

    /// The response arrived after the session it belonged to was replaced.
    #[error("The session changed before the server answered; please try again")]
    Superseded,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ReviewError {
    /// Severity used when this error is shown as a notice.
    ///
    /// Boundary hits are informational, input problems are warnings, and
    /// everything else is an error.
    pub fn notice_level(&self) -> NoticeLevel {
        match self {
            ReviewError::AtFirstSection | ReviewError::AtLastSection => NoticeLevel::Info,
            ReviewError::EmptyDescription
            | ReviewError::EmptyMessage
            | ReviewError::EmptySelection
            | ReviewError::InvalidRating(_)
            | ReviewError::InvalidSelection(_)
            | ReviewError::ConfirmationRequired
            | ReviewError::RequestInFlight(_)
            | ReviewError::InvalidTransition { .. } => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        }
    }
}

/// Failures of the local preference store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Preference database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),

    #[error("Corrupt session mirror: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
