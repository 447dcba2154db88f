//! `reqwest` implementation of [`ReviewApi`].

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::analysis::AnalysisResult;
use crate::api::{CustomFeedbackAck, CustomFeedbackRequest, ReviewApi, UploadOutcome, UploadRequest};
use crate::decisions::DecisionAction;
use crate::error::ApiError;
use crate::types::{
    CompletedReview, Dashboard, DownloadKind, FeedbackItem, Statistics, ToolFeedback,
};

/// Default backend address used when neither config nor CLI overrides it.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
/// Analysis calls an LLM backend and can be slow; keep the default generous.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const USER_AGENT: &str = concat!("ai-prism/", env!("CARGO_PKG_VERSION"));
const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// HTTP client for the review backend.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        tracing::debug!(path, "POST");
        let response = self.client.post(self.url(path)).json(body).send().await?;
        read_envelope(response).await
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, ApiError> {
        tracing::debug!(path, "GET");
        let response = self.client.get(self.url(path)).query(query).send().await?;
        read_envelope(response).await
    }
}

/// Turns a response into its JSON body, mapping failures onto [`ApiError`].
///
/// A body that says `success: false` or carries an `error` is a backend error
/// whatever the status code. Non-2xx responses without such a body become
/// [`ApiError::Status`].
async fn read_envelope(response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    let text = response.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => {
            let error = value.get("error").filter(|e| !e.is_null());
            let failed = value.get("success").and_then(Value::as_bool) == Some(false);
            if failed || error.is_some() {
                let message = error.map(|e| match e.as_str() {
                    Some(s) => s.to_owned(),
                    None => e.to_string(),
                });
                return Err(ApiError::backend(message));
            }
            if !status.is_success() {
                return Err(ApiError::Status(status.as_u16()));
            }
            Ok(value)
        }
        Err(_) if !status.is_success() => Err(ApiError::Status(status.as_u16())),
        Err(e) => Err(ApiError::Decode(e.to_string())),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

fn field<T: DeserializeOwned>(value: &mut Value, key: &str) -> Result<T, ApiError> {
    let inner = value
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| ApiError::Decode(format!("missing '{key}'")))?;
    decode(inner)
}

#[derive(Deserialize)]
struct AnalysisBody {
    #[serde(default)]
    section_content: String,
    #[serde(default)]
    feedback_items: Vec<FeedbackItem>,
}

#[async_trait]
impl ReviewApi for HttpApi {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome, ApiError> {
        let mut form = reqwest::multipart::Form::new()
            .part("document", file_part(&request.document).await?)
            .text("guidelines_preference", request.preference.as_str().to_owned());
        if let Some(guidelines) = &request.guidelines {
            form = form.part("guidelines", file_part(guidelines).await?);
        }
        tracing::debug!(document = %request.document.display(), "POST /upload");
        let response = self
            .client
            .post(self.url("/upload"))
            .multipart(form)
            .send()
            .await?;
        decode(read_envelope(response).await?)
    }

    async fn analyze_section(&self, session_id: &str, section: &str) -> Result<AnalysisResult, ApiError> {
        let body = self
            .post_json(
                "/analyze_section",
                &json!({ "session_id": session_id, "section_name": section }),
            )
            .await?;
        let parsed: AnalysisBody = decode(body)?;
        Ok(AnalysisResult {
            section_content: parsed.section_content,
            feedback_items: parsed.feedback_items,
        })
    }

    async fn decide(
        &self,
        session_id: &str,
        section: &str,
        feedback_id: &str,
        action: DecisionAction,
    ) -> Result<(), ApiError> {
        self.post_json(
            action.endpoint(),
            &json!({
                "session_id": session_id,
                "section_name": section,
                "feedback_id": feedback_id,
            }),
        )
        .await?;
        Ok(())
    }

    async fn revert_all(&self, session_id: &str) -> Result<(), ApiError> {
        self.post_json("/revert_all_feedback", &json!({ "session_id": session_id }))
            .await?;
        Ok(())
    }

    async fn add_custom_feedback(
        &self,
        request: &CustomFeedbackRequest,
    ) -> Result<CustomFeedbackAck, ApiError> {
        let mut body = self.post_json("/add_custom_feedback", request).await?;
        match body.get("feedback_item") {
            Some(Value::Object(_)) => field(&mut body, "feedback_item"),
            _ => Ok(CustomFeedbackAck::default()),
        }
    }

    async fn delete_custom_feedback(&self, session_id: &str, feedback_id: &str) -> Result<(), ApiError> {
        self.post_json(
            "/delete_user_feedback",
            &json!({ "session_id": session_id, "feedback_id": feedback_id }),
        )
        .await?;
        Ok(())
    }

    async fn complete_review(&self, session_id: &str) -> Result<CompletedReview, ApiError> {
        let body = self
            .post_json("/complete_review", &json!({ "session_id": session_id }))
            .await?;
        decode(body)
    }

    async fn statistics(&self, session_id: &str) -> Result<Statistics, ApiError> {
        let mut body = self
            .get_json("/get_statistics", &[("session_id", session_id)])
            .await?;
        field(&mut body, "statistics")
    }

    async fn dashboard(&self, session_id: &str) -> Result<Dashboard, ApiError> {
        let mut body = self
            .get_json("/get_dashboard_data", &[("session_id", session_id)])
            .await?;
        field(&mut body, "dashboard")
    }

    async fn chat(
        &self,
        session_id: &str,
        message: &str,
        current_section: Option<&str>,
    ) -> Result<String, ApiError> {
        let mut body = self
            .post_json(
                "/chat",
                &json!({
                    "session_id": session_id,
                    "message": message,
                    "current_section": current_section,
                }),
            )
            .await?;
        field(&mut body, "response")
    }

    async fn delete_document(&self, session_id: &str, keep_guidelines: bool) -> Result<bool, ApiError> {
        let body = self
            .post_json(
                "/delete_document",
                &json!({ "session_id": session_id, "keep_guidelines": keep_guidelines }),
            )
            .await?;
        Ok(body
            .get("guidelines_preserved")
            .and_then(Value::as_bool)
            .unwrap_or(keep_guidelines))
    }

    async fn reset_session(&self) -> Result<(), ApiError> {
        self.post_json("/reset_session", &json!({})).await?;
        Ok(())
    }

    async fn submit_tool_feedback(&self, feedback: &ToolFeedback) -> Result<(), ApiError> {
        self.post_json("/submit_tool_feedback", feedback).await?;
        Ok(())
    }

    async fn download(&self, session_id: &str, kind: &DownloadKind) -> Result<Vec<u8>, ApiError> {
        let request = match kind {
            DownloadKind::ReviewedDocument(file) => {
                self.client.get(self.url(&format!("/download/{file}")))
            }
            DownloadKind::Guidelines => self
                .client
                .get(self.url("/download_guidelines"))
                .query(&[("session_id", session_id)]),
            DownloadKind::Statistics(format) => self
                .client
                .get(self.url("/download_statistics"))
                .query(&[("session_id", session_id), ("format", format.as_str())]),
            DownloadKind::UserFeedback(format) => self
                .client
                .get(self.url("/export_user_feedback"))
                .query(&[("session_id", session_id), ("format", format.as_str())]),
        };
        tracing::debug!(?kind, "GET download");
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(read_envelope(response)
                .await
                .err()
                .unwrap_or(ApiError::Decode("download failed".to_owned())));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

async fn file_part(path: &std::path::Path) -> Result<reqwest::multipart::Part, ApiError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| ApiError::File {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.docx".to_owned());
    reqwest::multipart::Part::bytes(bytes)
        .file_name(name)
        .mime_str(DOCX_MIME)
        .map_err(ApiError::from)
}
