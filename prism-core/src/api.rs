//! The backend as seen by the client.
//!
//! [`ReviewApi`] is the only seam between the review state and the network.
//! [`crate::http::HttpApi`] implements it over `reqwest`; tests substitute
//! scripted implementations.

use std::path::PathBuf;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analysis::AnalysisResult;
use crate::decisions::DecisionAction;
use crate::error::ApiError;
use crate::types::{
    CompletedReview, Dashboard, DownloadKind, FeedbackType, GuidelinesPreference, Statistics,
    ToolFeedback,
};

/// Files and options for `/upload`.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub document: PathBuf,
    pub guidelines: Option<PathBuf>,
    pub preference: GuidelinesPreference,
}

/// Successful `/upload` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UploadOutcome {
    pub session_id: String,
    #[serde(default)]
    pub document_name: String,
    #[serde(default)]
    pub sections: Vec<String>,
    #[serde(default)]
    pub guidelines_uploaded: bool,
}

/// Body of `/add_custom_feedback`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomFeedbackRequest {
    pub session_id: String,
    pub section_name: String,
    #[serde(rename = "type")]
    pub kind: FeedbackType,
    pub category: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_id: Option<String>,
}

/// The parts of the stored `feedback_item` the client keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CustomFeedbackAck {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

/// Every backend operation the client performs.
///
/// Implementations report `{success: false}` bodies as [`ApiError::Backend`]
/// and network failures as [`ApiError::Transport`].
#[async_trait]
pub trait ReviewApi: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome, ApiError>;

    async fn analyze_section(
        &self,
        session_id: &str,
        section: &str,
    ) -> Result<AnalysisResult, ApiError>;

    async fn decide(
        &self,
        session_id: &str,
        section: &str,
        feedback_id: &str,
        action: DecisionAction,
    ) -> Result<(), ApiError>;

    async fn revert_all(&self, session_id: &str) -> Result<(), ApiError>;

    async fn add_custom_feedback(
        &self,
        request: &CustomFeedbackRequest,
    ) -> Result<CustomFeedbackAck, ApiError>;

    async fn delete_custom_feedback(
        &self,
        session_id: &str,
        feedback_id: &str,
    ) -> Result<(), ApiError>;

    async fn complete_review(&self, session_id: &str) -> Result<CompletedReview, ApiError>;

    async fn statistics(&self, session_id: &str) -> Result<Statistics, ApiError>;

    async fn dashboard(&self, session_id: &str) -> Result<Dashboard, ApiError>;

    async fn chat(
        &self,
        session_id: &str,
        message: &str,
        current_section: Option<&str>,
    ) -> Result<String, ApiError>;

    /// Returns whether the backend kept the guidelines document.
    async fn delete_document(&self, session_id: &str, keep_guidelines: bool)
        -> Result<bool, ApiError>;

    async fn reset_session(&self) -> Result<(), ApiError>;

    async fn download(&self, session_id: &str, kind: &DownloadKind) -> Result<Vec<u8>, ApiError>;

    async fn submit_tool_feedback(&self, feedback: &ToolFeedback) -> Result<(), ApiError>;
}
