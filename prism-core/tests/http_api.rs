//! `HttpApi` against a mock backend.

use std::io::Write;
use std::time::Duration;

use prism_core::api::{CustomFeedbackRequest, ReviewApi, UploadRequest};
use prism_core::decisions::DecisionAction;
use prism_core::error::ApiError;
use prism_core::http::HttpApi;
use prism_core::types::{
    DownloadKind, FeedbackType, GuidelinesPreference, RiskLevel, ToolFeedback,
};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn api_for(server: &MockServer) -> HttpApi {
    HttpApi::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn analyze_section_decodes_items() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze_section"))
        .and(body_json(json!({"session_id": "s1", "section_name": "Intro"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "section_content": "The seller appealed.",
            "feedback_items": [{
                "id": "f1",
                "type": "important",
                "category": "Root Cause",
                "risk_level": "High",
                "description": "Root cause not stated",
                "hawkeye_refs": [2, "11"],
                "confidence": 1.7
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = api_for(&server).await.analyze_section("s1", "Intro").await.unwrap();
    assert_eq!(result.section_content, "The seller appealed.");
    let item = &result.feedback_items[0];
    assert_eq!(item.kind, FeedbackType::Important);
    assert_eq!(item.risk_level, RiskLevel::High);
    assert_eq!(item.hawkeye_refs, vec!["2", "11"]);
    assert!(item.confidence <= 1.0);
}

#[tokio::test]
async fn success_false_is_a_backend_error_whatever_the_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/accept_feedback"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "error": "Feedback item not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/reject_feedback"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": ""})))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let err = api
        .decide("s1", "Intro", "f9", DecisionAction::Accept)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Backend("Feedback item not found".into()));

    let err = api
        .decide("s1", "Intro", "f9", DecisionAction::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Backend(m) if !m.is_empty()));
}

#[tokio::test]
async fn non_json_error_maps_to_status() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/revert_all_feedback"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let err = api_for(&server).await.revert_all("s1").await.unwrap_err();
    assert_eq!(err, ApiError::Status(502));
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let api = HttpApi::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = api.statistics("s1").await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)), "got {err:?}");
}

#[tokio::test]
async fn custom_feedback_sends_type_and_link() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/add_custom_feedback"))
        .and(body_partial_json(json!({
            "type": "suggestion",
            "section_name": "Findings",
            "ai_id": "X"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "feedback_item": {"id": "user_1", "timestamp": "2026-10-16T09:00:00"}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let ack = api_for(&server)
        .await
        .add_custom_feedback(&CustomFeedbackRequest {
            session_id: "s1".into(),
            section_name: "Findings".into(),
            kind: FeedbackType::Suggestion,
            category: "General".into(),
            description: "Cite the SOP".into(),
            ai_reference: None,
            ai_id: Some("X".into()),
        })
        .await
        .unwrap();
    assert_eq!(ack.id.as_deref(), Some("user_1"));
}

#[tokio::test]
async fn statistics_and_dashboard_unwrap_their_envelopes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/get_statistics"))
        .and(query_param("session_id", "s1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "statistics": {"total_feedback": 3, "high_risk": 1, "accepted": 1}
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/get_dashboard_data"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "dashboard": {"totalFeedback": 3, "sectionsAnalyzed": 2}
        })))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let stats = api.statistics("s1").await.unwrap();
    assert_eq!((stats.total_feedback, stats.high_risk, stats.accepted), (3, 1, 1));
    let dashboard = api.dashboard("s1").await.unwrap();
    assert_eq!(dashboard.sections_analyzed, 2);
}

#[tokio::test]
async fn upload_posts_multipart_and_reads_sections() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "session_id": "abc",
            "sections": ["Intro", "Findings"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
    file.write_all(b"PK\x03\x04").unwrap();

    let outcome = api_for(&server)
        .await
        .upload(&UploadRequest {
            document: file.path().to_path_buf(),
            guidelines: None,
            preference: GuidelinesPreference::NewOnly,
        })
        .await
        .unwrap();
    assert_eq!(outcome.session_id, "abc");
    assert_eq!(outcome.sections, vec!["Intro", "Findings"]);
}

#[tokio::test]
async fn upload_of_missing_file_never_hits_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/upload"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = api_for(&server)
        .await
        .upload(&UploadRequest {
            document: "/nonexistent/report.docx".into(),
            guidelines: None,
            preference: GuidelinesPreference::Both,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::File { .. }));
}

#[tokio::test]
async fn download_returns_raw_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/reviewed.docx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK\x03\x04".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/export_user_feedback"))
        .and(query_param("format", "csv"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "No session"})))
        .mount(&server)
        .await;

    let api = api_for(&server).await;
    let bytes = api
        .download("s1", &DownloadKind::ReviewedDocument("reviewed.docx".into()))
        .await
        .unwrap();
    assert_eq!(bytes, b"PK\x03\x04");
    let err = api
        .download("s1", &DownloadKind::UserFeedback("csv".into()))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Backend("No session".into()));
}

#[tokio::test]
async fn tool_feedback_posts_rating_and_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit_tool_feedback"))
        .and(body_json(json!({
            "rating": 4,
            "feedback": "Section navigation is quick",
            "timestamp": "2026-10-16T09:00:00+00:00",
            "session_id": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "message": "Feedback submitted successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let feedback = ToolFeedback {
        rating: 4,
        feedback: "Section navigation is quick".into(),
        timestamp: "2026-10-16T09:00:00+00:00".into(),
        session_id: None,
    };
    api_for(&server)
        .await
        .submit_tool_feedback(&feedback)
        .await
        .unwrap();
}

#[tokio::test]
async fn tool_feedback_failure_surfaces_backend_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit_tool_feedback"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "Could not store feedback"})),
        )
        .mount(&server)
        .await;

    let feedback = ToolFeedback {
        rating: 2,
        feedback: String::new(),
        timestamp: "2026-10-16T09:00:00+00:00".into(),
        session_id: Some("s1".into()),
    };
    let err = api_for(&server)
        .await
        .submit_tool_feedback(&feedback)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Backend("Could not store feedback".into()));
}
