//! End-to-end review flows against an in-memory backend.
//!
//! `ScriptedApi` keeps its own copy of the review state the way the real
//! backend does, so statistics reflect what the client actually sent.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use prism_core::analysis::AnalysisResult;
use prism_core::api::{CustomFeedbackAck, CustomFeedbackRequest, ReviewApi, UploadOutcome, UploadRequest};
use prism_core::client::ReviewClient;
use prism_core::decisions::{Controls, DecisionAction};
use prism_core::dispatch::{execute, Request};
use prism_core::error::{ApiError, ReviewError};
use prism_core::notice::NoticeLevel;
use prism_core::review::{Outcome, Review};
use prism_core::types::{
    CompletedReview, CustomFeedbackDraft, Dashboard, Decision, DownloadKind, FeedbackItem,
    FeedbackLink, GuidelinesPreference, HighlightColor, RiskLevel, SectionStatus, Selection,
    Statistics, ToolFeedback,
};

#[derive(Default)]
struct Backend {
    sections: Vec<String>,
    analyses: HashMap<String, AnalysisResult>,
    failures: HashMap<String, u32>,
    analyzed: Vec<String>,
    decisions: HashMap<String, Decision>,
    custom: Vec<String>,
    tool_feedback: Vec<ToolFeedback>,
    calls: Vec<String>,
}

#[derive(Default)]
struct ScriptedApi {
    state: Mutex<Backend>,
}

impl ScriptedApi {
    fn with_sections(sections: &[&str]) -> Self {
        let api = Self::default();
        api.state.lock().unwrap().sections = sections.iter().map(|s| s.to_string()).collect();
        api
    }

    fn script(&self, section: &str, content: &str, items: Vec<FeedbackItem>) {
        self.state.lock().unwrap().analyses.insert(
            section.to_owned(),
            AnalysisResult {
                section_content: content.to_owned(),
                feedback_items: items,
            },
        );
    }

    fn fail_next(&self, section: &str, times: u32) {
        self.state
            .lock()
            .unwrap()
            .failures
            .insert(section.to_owned(), times);
    }

    fn calls(&self, endpoint: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| c.as_str() == endpoint)
            .count()
    }

    fn log(&self, endpoint: &str) {
        self.state.lock().unwrap().calls.push(endpoint.to_owned());
    }
}

fn item(id: &str, risk: &str) -> FeedbackItem {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "type": "critical",
        "category": "Investigation Process",
        "risk_level": risk,
        "description": format!("Observation {id}"),
        "confidence": 0.8,
    }))
    .unwrap()
}

#[async_trait]
impl ReviewApi for ScriptedApi {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome, ApiError> {
        self.log("upload");
        let state = self.state.lock().unwrap();
        Ok(UploadOutcome {
            session_id: "session-1".into(),
            document_name: request
                .document
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            sections: state.sections.clone(),
            guidelines_uploaded: request.guidelines.is_some(),
        })
    }

    async fn analyze_section(&self, _session_id: &str, section: &str) -> Result<AnalysisResult, ApiError> {
        self.log("analyze_section");
        let mut state = self.state.lock().unwrap();
        if let Some(left) = state.failures.get_mut(section) {
            if *left > 0 {
                *left -= 1;
                return Err(ApiError::Transport("connection refused".into()));
            }
        }
        let result = state
            .analyses
            .get(section)
            .cloned()
            .ok_or_else(|| ApiError::Backend(format!("Section '{section}' not found")))?;
        if !state.analyzed.iter().any(|s| s == section) {
            state.analyzed.push(section.to_owned());
        }
        Ok(result)
    }

    async fn decide(
        &self,
        _session_id: &str,
        _section: &str,
        feedback_id: &str,
        action: DecisionAction,
    ) -> Result<(), ApiError> {
        self.log(action.endpoint().trim_start_matches('/'));
        self.state
            .lock()
            .unwrap()
            .decisions
            .insert(feedback_id.to_owned(), action.target());
        Ok(())
    }

    async fn revert_all(&self, _session_id: &str) -> Result<(), ApiError> {
        self.log("revert_all_feedback");
        self.state.lock().unwrap().decisions.clear();
        Ok(())
    }

    async fn add_custom_feedback(
        &self,
        _request: &CustomFeedbackRequest,
    ) -> Result<CustomFeedbackAck, ApiError> {
        self.log("add_custom_feedback");
        let mut state = self.state.lock().unwrap();
        let id = format!("user_{}", state.custom.len() + 1);
        state.custom.push(id.clone());
        Ok(CustomFeedbackAck {
            id: Some(id),
            timestamp: Some("2026-10-16T09:00:00Z".into()),
        })
    }

    async fn delete_custom_feedback(&self, _session_id: &str, feedback_id: &str) -> Result<(), ApiError> {
        self.log("delete_user_feedback");
        let mut state = self.state.lock().unwrap();
        let before = state.custom.len();
        state.custom.retain(|id| id != feedback_id);
        if state.custom.len() == before {
            return Err(ApiError::Backend("Feedback not found".into()));
        }
        Ok(())
    }

    async fn complete_review(&self, _session_id: &str) -> Result<CompletedReview, ApiError> {
        self.log("complete_review");
        let state = self.state.lock().unwrap();
        let accepted = state
            .decisions
            .values()
            .filter(|d| **d == Decision::Accepted)
            .count();
        Ok(CompletedReview {
            comments_count: (accepted + state.custom.len()) as u64,
            output_file: "reviewed_report.docx".into(),
        })
    }

    async fn statistics(&self, _session_id: &str) -> Result<Statistics, ApiError> {
        self.log("get_statistics");
        let state = self.state.lock().unwrap();
        let mut stats = Statistics::default();
        for section in &state.analyzed {
            for item in &state.analyses[section].feedback_items {
                stats.total_feedback += 1;
                match item.risk_level {
                    RiskLevel::High => stats.high_risk += 1,
                    RiskLevel::Medium => stats.medium_risk += 1,
                    RiskLevel::Low => stats.low_risk += 1,
                }
            }
        }
        for decision in state.decisions.values() {
            match decision {
                Decision::Accepted => stats.accepted += 1,
                Decision::Rejected => stats.rejected += 1,
                Decision::Pending => {}
            }
        }
        stats.user_added = state.custom.len() as u64;
        Ok(stats)
    }

    async fn dashboard(&self, _session_id: &str) -> Result<Dashboard, ApiError> {
        self.log("get_dashboard_data");
        let state = self.state.lock().unwrap();
        Ok(Dashboard {
            sections_analyzed: state.analyzed.len() as u64,
            user_feedback: state.custom.len() as u64,
            ..Default::default()
        })
    }

    async fn chat(
        &self,
        _session_id: &str,
        message: &str,
        current_section: Option<&str>,
    ) -> Result<String, ApiError> {
        self.log("chat");
        Ok(format!(
            "About {}: {message}",
            current_section.unwrap_or("the document")
        ))
    }

    async fn delete_document(&self, _session_id: &str, keep_guidelines: bool) -> Result<bool, ApiError> {
        self.log("delete_document");
        Ok(keep_guidelines)
    }

    async fn reset_session(&self) -> Result<(), ApiError> {
        self.log("reset_session");
        let mut state = self.state.lock().unwrap();
        let calls = std::mem::take(&mut state.calls);
        *state = Backend {
            calls,
            ..Default::default()
        };
        Ok(())
    }

    async fn download(&self, _session_id: &str, kind: &DownloadKind) -> Result<Vec<u8>, ApiError> {
        self.log("download");
        Ok(kind.file_name().into_bytes())
    }

    async fn submit_tool_feedback(&self, feedback: &ToolFeedback) -> Result<(), ApiError> {
        self.log("submit_tool_feedback");
        self.state.lock().unwrap().tool_feedback.push(feedback.clone());
        Ok(())
    }
}

fn upload_request(name: &str) -> UploadRequest {
    UploadRequest {
        document: PathBuf::from(name),
        guidelines: None,
        preference: GuidelinesPreference::Both,
    }
}

async fn started(api: ScriptedApi) -> ReviewClient<ScriptedApi> {
    let mut client = ReviewClient::new(api);
    client.upload(upload_request("report.docx")).await.unwrap();
    client
}

fn standard_api() -> ScriptedApi {
    let api = ScriptedApi::with_sections(&["Intro", "Findings"]);
    api.script("Intro", "The seller was notified.", vec![item("f1", "High")]);
    api.script(
        "Findings",
        "Funds were held for 90 days.",
        vec![item("f2", "Medium"), item("f3", "Low")],
    );
    api
}

#[tokio::test]
async fn accept_updates_backend_statistics() {
    let mut client = started(standard_api()).await;
    assert_eq!(client.review().current_section(), Some("Intro"));
    assert_eq!(client.review().section_status("Intro"), SectionStatus::Analyzed);

    assert_eq!(client.accept("f1", None).await.unwrap(), Decision::Accepted);
    let stats = client.statistics().await.unwrap();
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.total_feedback, 1);
    assert_eq!(stats.high_risk, 1);
}

#[tokio::test]
async fn navigation_analyzes_on_demand_and_serves_from_cache() {
    let mut client = started(standard_api()).await;
    assert_eq!(client.api().calls("analyze_section"), 1);

    assert_eq!(client.next().await.unwrap(), SectionStatus::Analyzed);
    assert_eq!(client.previous().await.unwrap(), SectionStatus::Analyzed);
    assert_eq!(client.next().await.unwrap(), SectionStatus::Analyzed);
    assert_eq!(client.api().calls("analyze_section"), 2);

    assert_eq!(client.next().await.unwrap_err(), ReviewError::AtLastSection);
    assert_eq!(client.review().current_section(), Some("Findings"));
}

#[tokio::test]
async fn out_of_range_go_to_keeps_current_section() {
    let mut client = started(standard_api()).await;
    let err = client.go_to(5).await.unwrap_err();
    assert_eq!(err, ReviewError::InvalidSectionIndex { index: 5, count: 2 });
    assert_eq!(client.review().current_index(), Some(0));
    assert_eq!(
        client.review_mut().notices.latest().map(|n| n.level),
        Some(NoticeLevel::Error)
    );
}

#[tokio::test]
async fn duplicate_ensure_issues_a_single_request() {
    let api = standard_api();
    let mut review = Review::new();
    let request = review.begin_upload(upload_request("report.docx")).unwrap();
    let response = execute(&api, request).await;
    assert_eq!(review.apply(response), Outcome::SessionStarted { sections: 2 });

    let first = review.ensure_analyzed("Findings").unwrap();
    let second = review.ensure_analyzed("Findings").unwrap();
    assert!(first.is_some());
    assert!(second.is_none());
    assert_eq!(review.section_status("Findings"), SectionStatus::Analyzing);

    let response = execute(&api, first.unwrap()).await;
    review.apply(response);
    assert_eq!(api.calls("analyze_section"), 1);
    assert!(review.ensure_analyzed("Findings").unwrap().is_none());
}

#[tokio::test]
async fn failed_analysis_recovers_through_retry() {
    let api = standard_api();
    api.fail_next("Intro", 1);
    let mut client = ReviewClient::new(api);

    let err = client.upload(upload_request("report.docx")).await.unwrap_err();
    assert!(matches!(err, ReviewError::Api(ApiError::Transport(_))));
    assert_eq!(client.review().section_status("Intro"), SectionStatus::Failed);
    assert!(client.review().record("Intro").unwrap().last_error.is_some());

    // Navigating back shows the failure; only retry re-issues the request.
    client.next().await.unwrap();
    assert_eq!(client.previous().await.unwrap(), SectionStatus::Failed);
    assert_eq!(client.api().calls("analyze_section"), 2);

    let status = client.retry_analysis(Some("Intro")).await.unwrap();
    assert_eq!(status, SectionStatus::Analyzed);
    assert_eq!(client.review().record("Intro").unwrap().feedback_items.len(), 1);
    assert_eq!(
        client.retry_analysis(Some("Intro")).await.unwrap_err(),
        ReviewError::NotRetryable {
            section: "Intro".into(),
            status: SectionStatus::Analyzed
        }
    );
}

#[tokio::test]
async fn accept_then_revert_restores_pending() {
    let mut client = started(standard_api()).await;
    client.accept("f1", None).await.unwrap();
    assert_eq!(
        client.reject("f1", None).await.unwrap_err(),
        ReviewError::InvalidTransition {
            from: Decision::Accepted,
            to: Decision::Rejected
        }
    );
    assert_eq!(client.revert("f1", None).await.unwrap(), Decision::Pending);
    assert_eq!(
        client.review().controls("Intro", "f1"),
        Controls {
            accept: true,
            reject: true,
            revert: false
        }
    );
    assert_eq!(client.reject("f1", Some("Intro")).await.unwrap(), Decision::Rejected);
}

#[tokio::test]
async fn decisions_never_reload_the_section() {
    let mut client = started(standard_api()).await;
    client.accept("f1", None).await.unwrap();
    client.revert("f1", None).await.unwrap();
    assert_eq!(client.api().calls("analyze_section"), 1);
    assert_eq!(client.review().section_status("Intro"), SectionStatus::Analyzed);
    assert_eq!(client.review().current_index(), Some(0));
}

#[tokio::test]
async fn decision_on_unknown_item_is_rejected_locally() {
    let mut client = started(standard_api()).await;
    assert_eq!(
        client.accept("missing", None).await.unwrap_err(),
        ReviewError::FeedbackNotFound("missing".into())
    );
    assert_eq!(client.api().calls("accept_feedback"), 0);
}

#[tokio::test]
async fn revert_all_resets_every_cached_decision() {
    let mut client = started(standard_api()).await;
    client.accept("f1", None).await.unwrap();
    client.next().await.unwrap();
    client.reject("f3", None).await.unwrap();
    assert_eq!(client.revert_all().await.unwrap(), 2);
    let summary = client.review().summary();
    assert_eq!(summary.pending, 3);
    assert_eq!(client.statistics().await.unwrap().accepted, 0);
}

#[tokio::test]
async fn empty_description_never_reaches_backend() {
    let mut client = started(standard_api()).await;
    let draft = CustomFeedbackDraft {
        description: "   ".into(),
        ..Default::default()
    };
    assert_eq!(
        client.add_custom_feedback(draft).await.unwrap_err(),
        ReviewError::EmptyDescription
    );
    assert_eq!(client.api().calls("add_custom_feedback"), 0);
    assert_eq!(
        client.review_mut().notices.latest().map(|n| n.level),
        Some(NoticeLevel::Warning)
    );
}

#[tokio::test]
async fn clear_for_item_removes_only_linked_entries() {
    let mut client = started(standard_api()).await;
    client.go_to_section("Findings").await.unwrap();
    client
        .add_custom_feedback(CustomFeedbackDraft {
            description: "Cite the SOP".into(),
            link: Some(FeedbackLink::AiItem("X".into())),
            ..Default::default()
        })
        .await
        .unwrap();
    client
        .add_custom_feedback(CustomFeedbackDraft {
            description: "Timeline is unclear".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(client.review().ledger().count_for_section("Findings"), 2);

    assert_eq!(client.clear_custom_for_item("X").await, 1);
    assert_eq!(client.review().ledger().count_for_section("Findings"), 1);
    assert_eq!(client.api().calls("delete_user_feedback"), 1);
    assert_eq!(client.statistics().await.unwrap().user_added, 1);
}

#[tokio::test]
async fn clear_for_section_reports_filtered_count() {
    let mut client = started(standard_api()).await;
    for text in ["one", "two"] {
        client
            .add_custom_feedback(CustomFeedbackDraft {
                description: text.into(),
                ..Default::default()
            })
            .await
            .unwrap();
    }
    client
        .add_custom_feedback(CustomFeedbackDraft {
            section: Some("Findings".into()),
            description: "elsewhere".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(client.clear_custom_for_section(None).await.unwrap(), 2);
    assert_eq!(client.review().ledger().len(), 1);
    assert_eq!(client.review().ledger().entries()[0].section, "Findings");
}

#[tokio::test]
async fn failed_server_delete_only_warns() {
    let mut client = started(standard_api()).await;
    let id = client
        .add_custom_feedback(CustomFeedbackDraft {
            description: "note".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    // Remove it behind the client's back so the server-side delete fails.
    client
        .api()
        .delete_custom_feedback("session-1", &id)
        .await
        .unwrap();
    client.remove_custom_feedback(&id).await.unwrap();
    assert!(client.review().ledger().is_empty());
    assert_eq!(
        client.review_mut().notices.latest().map(|n| n.level),
        Some(NoticeLevel::Warning)
    );
}

#[tokio::test]
async fn highlight_comments_are_linked_and_pruned() {
    let mut client = started(standard_api()).await;
    let id = client
        .create_highlight(None, Selection::new(4, 10), HighlightColor::Yellow)
        .unwrap();
    client.comment_highlight(&id, "Name the seller").await.unwrap();
    let entry = &client.review().ledger().entries()[0];
    assert_eq!(entry.link, Some(FeedbackLink::Highlight(id.clone())));
    assert_eq!(entry.ai_reference.as_deref(), Some("seller"));

    assert_eq!(
        client.clear_highlights(None, false).await.unwrap_err(),
        ReviewError::ConfirmationRequired
    );
    assert_eq!(client.clear_highlights(None, true).await.unwrap(), 1);
    assert!(client.review().ledger().is_empty());
    let content = &client.review().record("Intro").unwrap().content;
    let segments = client.review().highlights().segments("Intro", content);
    assert_eq!(segments.len(), 1);
    assert_eq!(segments[0].text, content.as_str());
}

#[tokio::test]
async fn responses_from_a_previous_session_are_dropped() {
    let api = standard_api();
    let mut review = Review::new();
    let request = review.begin_upload(upload_request("report.docx")).unwrap();
    let response = execute(&api, request).await;
    review.apply(response);

    let pending = review.go_to(0).unwrap().unwrap();
    let reset = review.begin_reset();
    let response = execute(&api, reset).await;
    assert_eq!(review.apply(response), Outcome::SessionReset);
    assert!(review.session().is_none());

    let late = execute(&api, pending).await;
    assert_eq!(review.apply(late), Outcome::Ignored);
    assert!(review.record("Intro").is_none());
}

#[tokio::test]
async fn late_analysis_does_not_steal_the_display() {
    let api = standard_api();
    let mut review = Review::new();
    let request = review.begin_upload(upload_request("report.docx")).unwrap();
    let response = execute(&api, request).await;
    review.apply(response);

    let intro = review.go_to(0).unwrap().unwrap();
    let findings = review.go_to(1).unwrap().unwrap();
    let findings_done = execute(&api, findings).await;
    let intro_done = execute(&api, intro).await;

    assert_eq!(
        review.apply(findings_done),
        Outcome::SectionReady {
            section: "Findings".into(),
            displayed: true
        }
    );
    assert_eq!(
        review.apply(intro_done),
        Outcome::SectionReady {
            section: "Intro".into(),
            displayed: false
        }
    );
    assert_eq!(review.current_section(), Some("Findings"));
    assert_eq!(review.section_status("Intro"), SectionStatus::Analyzed);
}

#[tokio::test]
async fn duplicate_decision_in_flight_is_rejected() {
    let api = standard_api();
    let mut client = started(api).await;
    let review = client.review_mut();
    let first = review
        .begin_decision("f1", DecisionAction::Accept, None, None)
        .unwrap();
    assert_eq!(
        review
            .begin_decision("f1", DecisionAction::Accept, None, None)
            .unwrap_err(),
        ReviewError::RequestInFlight("f1".into())
    );
    assert!(matches!(first, Request::Decide { .. }));
    assert!(review.is_decision_in_flight("f1"));
}

#[tokio::test]
async fn non_docx_upload_is_refused_locally() {
    let mut client = ReviewClient::new(standard_api());
    let err = client.upload(upload_request("notes.pdf")).await.unwrap_err();
    assert_eq!(err, ReviewError::UnsupportedDocument("notes.pdf".into()));
    assert_eq!(client.api().calls("upload"), 0);
    assert!(client.upload(upload_request("REPORT.DOCX")).await.is_ok());
}

#[tokio::test]
async fn complete_review_enables_reviewed_download() {
    let mut client = started(standard_api()).await;
    assert_eq!(
        client.download_reviewed().await.unwrap_err(),
        ReviewError::NoCompletedReview
    );
    client.accept("f1", None).await.unwrap();
    let completed = client.complete_review().await.unwrap();
    assert_eq!(completed.comments_count, 1);
    let bytes = client.download_reviewed().await.unwrap();
    assert_eq!(bytes, b"reviewed_report.docx");
}

#[tokio::test]
async fn chat_records_both_sides_with_section_context() {
    let mut client = started(standard_api()).await;
    assert_eq!(client.chat("  ").await.unwrap_err(), ReviewError::EmptyMessage);
    let answer = client.chat("Is the timeline complete?").await.unwrap();
    assert_eq!(answer, "About Intro: Is the timeline complete?");
    assert_eq!(client.review().chat().len(), 2);
}

#[tokio::test]
async fn delete_document_keeps_session_but_drops_content() {
    let mut client = started(standard_api()).await;
    client
        .add_custom_feedback(CustomFeedbackDraft {
            description: "note".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    client.delete_document(true).await.unwrap();
    let session = client.review().session().unwrap();
    assert_eq!(session.id, "session-1");
    assert_eq!(session.section_count(), 0);
    assert!(client.review().ledger().is_empty());
    assert!(client.review().record("Intro").is_none());
}

#[tokio::test]
async fn operations_without_session_fail_with_notice() {
    let mut client = ReviewClient::new(standard_api());
    assert_eq!(client.next().await.unwrap_err(), ReviewError::NoSession);
    assert_eq!(client.statistics().await.unwrap_err(), ReviewError::NoSession);
    assert_eq!(client.review_mut().notices.drain().len(), 2);
}

#[tokio::test]
async fn tool_feedback_is_sent_with_or_without_session() {
    let mut client = ReviewClient::new(standard_api());
    client.submit_tool_feedback(4, "  ").await.unwrap();

    let mut client = started(standard_api()).await;
    client.submit_tool_feedback(5, "  Fast and clear  ").await.unwrap();
    let notices = client.review_mut().notices.drain();
    assert!(notices
        .iter()
        .any(|n| n.message == "Thank you for your feedback!"));

    let state = client.api().state.lock().unwrap();
    let sent = state.tool_feedback.last().unwrap();
    assert_eq!(sent.rating, 5);
    assert_eq!(sent.feedback, "Fast and clear");
    assert_eq!(sent.session_id.as_deref(), Some("session-1"));
    assert!(chrono::DateTime::parse_from_rfc3339(&sent.timestamp).is_ok());
}

#[tokio::test]
async fn tool_feedback_rating_out_of_range_is_refused_locally() {
    let mut client = ReviewClient::new(standard_api());
    assert_eq!(
        client.submit_tool_feedback(0, "meh").await.unwrap_err(),
        ReviewError::InvalidRating(0)
    );
    assert_eq!(
        client.submit_tool_feedback(6, "wow").await.unwrap_err(),
        ReviewError::InvalidRating(6)
    );
    assert_eq!(client.api().calls("submit_tool_feedback"), 0);
    let notices = client.review_mut().notices.drain();
    assert_eq!(notices.len(), 2);
    assert!(notices.iter().all(|n| n.level == NoticeLevel::Warning));
}
