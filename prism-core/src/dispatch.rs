//! Backend requests as values.
//!
//! [`crate::review::Review`] validates an operation and hands back a
//! [`Request`]; [`execute`] runs it against a [`ReviewApi`]; the resulting
//! [`Response`] goes back into `Review::apply`. Requests carry the session
//! epoch they were issued under, so a response that outlives its session is
//! recognised and dropped.

use crate::analysis::AnalysisResult;
use crate::api::{CustomFeedbackAck, CustomFeedbackRequest, ReviewApi, UploadOutcome, UploadRequest};
use crate::decisions::DecisionAction;
use crate::error::ApiError;
use crate::types::{
    CompletedReview, CustomFeedbackDraft, Dashboard, DownloadKind, Statistics, ToolFeedback,
};

/// Identifies the session a request belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub epoch: u64,
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `seq` orders concurrent uploads; only the newest may start a session.
    Upload {
        epoch: u64,
        seq: u64,
        upload: UploadRequest,
    },
    Analyze {
        ticket: Ticket,
        section: String,
    },
    Decide {
        ticket: Ticket,
        section: String,
        feedback_id: String,
        action: DecisionAction,
    },
    RevertAll(Ticket),
    AddCustom {
        ticket: Ticket,
        /// Validated draft with `section` resolved.
        draft: CustomFeedbackDraft,
        section: String,
    },
    DeleteCustom {
        ticket: Ticket,
        feedback_id: String,
    },
    CompleteReview(Ticket),
    Statistics(Ticket),
    Dashboard(Ticket),
    Chat {
        ticket: Ticket,
        message: String,
        section: Option<String>,
    },
    DeleteDocument {
        ticket: Ticket,
        keep_guidelines: bool,
    },
    Reset {
        epoch: u64,
    },
    Download {
        ticket: Ticket,
        kind: DownloadKind,
    },
    /// Session-independent, so it carries no ticket.
    ToolFeedback(ToolFeedback),
}

impl Request {
    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Request::Upload { .. } => "upload",
            Request::Analyze { .. } => "analyze",
            Request::Decide { .. } => "decide",
            Request::RevertAll(_) => "revert_all",
            Request::AddCustom { .. } => "add_custom",
            Request::DeleteCustom { .. } => "delete_custom",
            Request::CompleteReview(_) => "complete_review",
            Request::Statistics(_) => "statistics",
            Request::Dashboard(_) => "dashboard",
            Request::Chat { .. } => "chat",
            Request::DeleteDocument { .. } => "delete_document",
            Request::Reset { .. } => "reset",
            Request::Download { .. } => "download",
            Request::ToolFeedback(_) => "tool_feedback",
        }
    }

    /// Section an analysis request targets, used to cancel it on navigation.
    pub fn analysis_section(&self) -> Option<&str> {
        match self {
            Request::Analyze { section, .. } => Some(section),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Response {
    Uploaded {
        epoch: u64,
        seq: u64,
        result: Result<UploadOutcome, ApiError>,
    },
    Analyzed {
        ticket: Ticket,
        section: String,
        result: Result<AnalysisResult, ApiError>,
    },
    Decided {
        ticket: Ticket,
        section: String,
        feedback_id: String,
        action: DecisionAction,
        result: Result<(), ApiError>,
    },
    RevertedAll {
        ticket: Ticket,
        result: Result<(), ApiError>,
    },
    CustomAdded {
        ticket: Ticket,
        draft: CustomFeedbackDraft,
        section: String,
        result: Result<CustomFeedbackAck, ApiError>,
    },
    CustomDeleted {
        ticket: Ticket,
        feedback_id: String,
        result: Result<(), ApiError>,
    },
    ReviewCompleted {
        ticket: Ticket,
        result: Result<CompletedReview, ApiError>,
    },
    Statistics {
        ticket: Ticket,
        result: Result<Statistics, ApiError>,
    },
    Dashboard {
        ticket: Ticket,
        result: Result<Dashboard, ApiError>,
    },
    ChatAnswered {
        ticket: Ticket,
        message: String,
        section: Option<String>,
        result: Result<String, ApiError>,
    },
    DocumentDeleted {
        ticket: Ticket,
        result: Result<bool, ApiError>,
    },
    Reset {
        epoch: u64,
        result: Result<(), ApiError>,
    },
    Downloaded {
        ticket: Ticket,
        kind: DownloadKind,
        result: Result<Vec<u8>, ApiError>,
    },
    ToolFeedbackSent {
        result: Result<(), ApiError>,
    },
}

/// Runs one request against the backend.
///
/// Never fails itself: every backend or transport error is carried inside
/// the returned [`Response`].
pub async fn execute(api: &dyn ReviewApi, request: Request) -> Response {
    tracing::debug!(request = request.label(), "dispatch");
    match request {
        Request::Upload { epoch, seq, upload } => Response::Uploaded {
            epoch,
            seq,
            result: api.upload(&upload).await,
        },
        Request::Analyze { ticket, section } => {
            let result = api.analyze_section(&ticket.session_id, &section).await;
            Response::Analyzed {
                ticket,
                section,
                result,
            }
        }
        Request::Decide {
            ticket,
            section,
            feedback_id,
            action,
        } => {
            let result = api
                .decide(&ticket.session_id, &section, &feedback_id, action)
                .await;
            Response::Decided {
                ticket,
                section,
                feedback_id,
                action,
                result,
            }
        }
        Request::RevertAll(ticket) => {
            let result = api.revert_all(&ticket.session_id).await;
            Response::RevertedAll { ticket, result }
        }
        Request::AddCustom {
            ticket,
            draft,
            section,
        } => {
            let body = CustomFeedbackRequest {
                session_id: ticket.session_id.clone(),
                section_name: section.clone(),
                kind: draft.kind,
                category: draft.category.clone(),
                description: draft.description.clone(),
                ai_reference: draft.ai_reference.clone(),
                ai_id: draft.link.as_ref().map(|l| l.id().to_owned()),
            };
            let result = api.add_custom_feedback(&body).await;
            Response::CustomAdded {
                ticket,
                draft,
                section,
                result,
            }
        }
        Request::DeleteCustom {
            ticket,
            feedback_id,
        } => {
            let result = api
                .delete_custom_feedback(&ticket.session_id, &feedback_id)
                .await;
            Response::CustomDeleted {
                ticket,
                feedback_id,
                result,
            }
        }
        Request::CompleteReview(ticket) => {
            let result = api.complete_review(&ticket.session_id).await;
            Response::ReviewCompleted { ticket, result }
        }
        Request::Statistics(ticket) => {
            let result = api.statistics(&ticket.session_id).await;
            Response::Statistics { ticket, result }
        }
        Request::Dashboard(ticket) => {
            let result = api.dashboard(&ticket.session_id).await;
            Response::Dashboard { ticket, result }
        }
        Request::Chat {
            ticket,
            message,
            section,
        } => {
            let result = api
                .chat(&ticket.session_id, &message, section.as_deref())
                .await;
            Response::ChatAnswered {
                ticket,
                message,
                section,
                result,
            }
        }
        Request::DeleteDocument {
            ticket,
            keep_guidelines,
        } => {
            let result = api
                .delete_document(&ticket.session_id, keep_guidelines)
                .await;
            Response::DocumentDeleted { ticket, result }
        }
        Request::Reset { epoch } => Response::Reset {
            epoch,
            result: api.reset_session().await,
        },
        Request::Download { ticket, kind } => {
            let result = api.download(&ticket.session_id, &kind).await;
            Response::Downloaded {
                ticket,
                kind,
                result,
            }
        }
        Request::ToolFeedback(feedback) => Response::ToolFeedbackSent {
            result: api.submit_tool_feedback(&feedback).await,
        },
    }
}
