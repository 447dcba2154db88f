//! The review state: one explicitly owned object holding the session, the
//! navigator, the analysis cache, decisions, the custom feedback ledger,
//! highlights, and the notice queue.
//!
//! Operations come in two halves. A `begin_*` (or navigation) method checks
//! preconditions, updates local guards, and returns a [`Request`]. After the
//! request has run, [`Review::apply`] folds the [`Response`] back in. Neither
//! half blocks, so the same code serves the sequential [`crate::client`] and
//! the TUI, which runs requests on background tasks.
//!
//! Every error is also pushed to [`Review::notices`].

use crate::analysis::{AnalysisStart, SectionCache};
use crate::api::UploadRequest;
use crate::decisions::{self, Controls, DecisionAction, DecisionTracker};
use crate::dispatch::{Request, Response, Ticket};
use crate::error::{ApiError, Result, ReviewError};
use crate::highlight::HighlightManager;
use crate::ledger::CustomFeedbackLedger;
use crate::navigator::Navigator;
use crate::notice::NoticeQueue;
use crate::session::Session;
use crate::types::{
    ChatMessage, ChatRole, CompletedReview, CustomFeedbackDraft, CustomFeedbackEntry, Dashboard,
    Decision, DownloadKind, FeedbackItem, FeedbackLink, FeedbackType, HighlightColor, RiskLevel,
    SectionRecord, SectionStatus, Selection, Statistics, ToolFeedback, MAX_TOOL_RATING,
};

/// What applying a response changed.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The response belonged to a session that no longer exists.
    Ignored,
    SessionStarted { sections: usize },
    SectionReady { section: String, displayed: bool },
    SectionFailed {
        section: String,
        displayed: bool,
        error: ApiError,
    },
    DecisionApplied { feedback_id: String, decision: Decision },
    AllReverted { changed: usize },
    CustomAdded { entry_id: String },
    /// The entry's highlight was removed while the add was in flight; the
    /// entry was not kept and `delete` removes it from the backend.
    CustomDiscarded { delete: Option<Request> },
    CustomDeleted { feedback_id: String },
    ReviewCompleted,
    StatisticsUpdated,
    DashboardUpdated,
    ChatAnswered,
    DocumentDeleted,
    SessionReset,
    Downloaded { kind: DownloadKind, bytes: Vec<u8> },
    ToolFeedbackSent,
    Failed(ReviewError),
}

/// Result of a local removal: how many entries went, plus best-effort
/// backend deletions to issue.
#[derive(Debug, Clone, Default)]
pub struct Cleared {
    pub count: usize,
    pub requests: Vec<Request>,
}

/// Decision and risk counts over every cached section.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecisionSummary {
    pub total: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub pending: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
}

#[derive(Debug, Default)]
pub struct Review {
    epoch: u64,
    upload_seq: u64,
    session: Option<Session>,
    navigator: Navigator,
    cache: SectionCache,
    decisions: DecisionTracker,
    ledger: CustomFeedbackLedger,
    highlights: HighlightManager,
    chat: Vec<ChatMessage>,
    statistics: Option<Statistics>,
    dashboard: Option<Dashboard>,
    completed: Option<CompletedReview>,
    pub notices: NoticeQueue,
}

impl Review {
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn section_names(&self) -> Vec<String> {
        self.session
            .as_ref()
            .map(Session::section_names)
            .unwrap_or_default()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.navigator.current()
    }

    pub fn current_section(&self) -> Option<&str> {
        let idx = self.navigator.current()?;
        self.session.as_ref()?.section_name(idx)
    }

    pub fn record(&self, section: &str) -> Option<&SectionRecord> {
        self.cache.get(section)
    }

    pub fn current_record(&self) -> Option<&SectionRecord> {
        self.cache.get(self.current_section()?)
    }

    pub fn section_status(&self, section: &str) -> SectionStatus {
        self.cache.status(section)
    }

    pub fn feedback_item(&self, section: &str, feedback_id: &str) -> Option<&FeedbackItem> {
        self.cache.get(section)?.item(feedback_id)
    }

    /// Enabled affordances for a feedback item of the current section.
    pub fn controls(&self, section: &str, feedback_id: &str) -> Controls {
        match self.feedback_item(section, feedback_id) {
            Some(item) => self.decisions.controls(feedback_id, item.decision),
            None => Controls::DISABLED,
        }
    }

    pub fn is_decision_in_flight(&self, feedback_id: &str) -> bool {
        self.decisions.is_in_flight(feedback_id)
    }

    pub fn ledger(&self) -> &CustomFeedbackLedger {
        &self.ledger
    }

    pub fn highlights(&self) -> &HighlightManager {
        &self.highlights
    }

    pub fn chat(&self) -> &[ChatMessage] {
        &self.chat
    }

    pub fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    pub fn dashboard(&self) -> Option<&Dashboard> {
        self.dashboard.as_ref()
    }

    pub fn completed(&self) -> Option<&CompletedReview> {
        self.completed.as_ref()
    }

    pub fn summary(&self) -> DecisionSummary {
        let mut s = DecisionSummary::default();
        for item in self.cache.records().flat_map(|r| r.feedback_items.iter()) {
            s.total += 1;
            match item.decision {
                Decision::Accepted => s.accepted += 1,
                Decision::Rejected => s.rejected += 1,
                Decision::Pending => s.pending += 1,
            }
            match item.risk_level {
                RiskLevel::High => s.high_risk += 1,
                RiskLevel::Medium => s.medium_risk += 1,
                RiskLevel::Low => s.low_risk += 1,
            }
        }
        s
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    /// Validates the upload locally and returns the request to send.
    pub fn begin_upload(&mut self, upload: UploadRequest) -> Result<Request> {
        let name = upload
            .document
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let result = if name.to_ascii_lowercase().ends_with(".docx") {
            self.upload_seq += 1;
            Ok(Request::Upload {
                epoch: self.epoch,
                seq: self.upload_seq,
                upload,
            })
        } else {
            Err(ReviewError::UnsupportedDocument(name))
        };
        self.noted(result)
    }

    /// Replaces the session wholesale and clears every dependent state.
    pub fn start_session(&mut self, session: Session) {
        self.clear_state();
        tracing::info!(
            session_id = %session.id,
            sections = session.section_count(),
            epoch = self.epoch,
            "session started"
        );
        self.navigator = Navigator::new(session.section_count());
        self.session = Some(session);
    }

    /// Drops the session and all dependent state.
    pub fn clear_session(&mut self) {
        self.clear_state();
        self.session = None;
        tracing::info!(epoch = self.epoch, "session cleared");
    }

    fn clear_state(&mut self) {
        self.epoch += 1;
        self.navigator = Navigator::default();
        self.cache.clear();
        self.decisions.clear();
        self.ledger.clear();
        self.highlights.clear();
        self.chat.clear();
        self.statistics = None;
        self.dashboard = None;
        self.completed = None;
    }

    pub fn begin_reset(&mut self) -> Request {
        Request::Reset { epoch: self.epoch }
    }

    pub fn begin_delete_document(&mut self, keep_guidelines: bool) -> Result<Request> {
        let result = self.ticket().map(|ticket| Request::DeleteDocument {
            ticket,
            keep_guidelines,
        });
        self.noted(result)
    }

    // -----------------------------------------------------------------------
    // Navigation and analysis
    // -----------------------------------------------------------------------

    /// Shows section `index`, requesting analysis when it is not cached.
    pub fn go_to(&mut self, index: usize) -> Result<Option<Request>> {
        let result = self.check_session().and_then(|()| self.navigator.go_to(index));
        let index = self.noted(result)?;
        self.show(index)
    }

    pub fn go_to_section(&mut self, name: &str) -> Result<Option<Request>> {
        let result = self
            .require_session()
            .and_then(|s| s.index_of(name).ok_or_else(|| ReviewError::UnknownSection(name.to_owned())));
        let index = self.noted(result)?;
        self.go_to(index)
    }

    pub fn next(&mut self) -> Result<Option<Request>> {
        let result = self.check_session().and_then(|()| self.navigator.next_index());
        let index = self.noted(result)?;
        self.go_to(index)
    }

    pub fn previous(&mut self) -> Result<Option<Request>> {
        let result = self
            .check_session()
            .and_then(|()| self.navigator.previous_index());
        let index = self.noted(result)?;
        self.go_to(index)
    }

    fn show(&mut self, index: usize) -> Result<Option<Request>> {
        let name = match self.session.as_ref().and_then(|s| s.section_name(index)) {
            Some(n) => n.to_owned(),
            None => return self.noted(Err(ReviewError::NoSession)),
        };
        self.ensure_analyzed(&name)
    }

    /// Returns an analysis request only when the section is neither analyzed
    /// nor already being analyzed.
    pub fn ensure_analyzed(&mut self, section: &str) -> Result<Option<Request>> {
        let result = self.known_section(section);
        let ticket = self.noted(result)?;
        Ok(match self.cache.ensure_analyzed(section) {
            AnalysisStart::Dispatch => Some(Request::Analyze {
                ticket,
                section: section.to_owned(),
            }),
            AnalysisStart::Cached | AnalysisStart::InFlight | AnalysisStart::Failed => None,
        })
    }

    /// Retries a failed analysis; defaults to the current section.
    pub fn retry_analysis(&mut self, section: Option<&str>) -> Result<Option<Request>> {
        let result = self.restart_analysis(section, SectionCache::retry);
        self.noted(result)
    }

    /// Explicitly re-analyzes a section; defaults to the current section.
    pub fn reanalyze(&mut self, section: Option<&str>) -> Result<Option<Request>> {
        let result = self.restart_analysis(section, SectionCache::reanalyze);
        self.noted(result)
    }

    fn restart_analysis(
        &mut self,
        section: Option<&str>,
        restart: fn(&mut SectionCache, &str) -> Result<AnalysisStart>,
    ) -> Result<Option<Request>> {
        let name = self.resolve_section(section, None)?;
        let ticket = self.known_section(&name)?;
        Ok(match restart(&mut self.cache, &name)? {
            AnalysisStart::Dispatch => Some(Request::Analyze {
                ticket,
                section: name,
            }),
            AnalysisStart::Cached | AnalysisStart::InFlight | AnalysisStart::Failed => None,
        })
    }

    // -----------------------------------------------------------------------
    // Decisions
    // -----------------------------------------------------------------------

    /// Starts an accept / reject / revert.
    ///
    /// The section is taken from `section`, else the navigator, else
    /// `selector` (whatever the front-end has selected).
    pub fn begin_decision(
        &mut self,
        feedback_id: &str,
        action: DecisionAction,
        section: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Request> {
        let result = self.check_decision(feedback_id, action, section, selector);
        self.noted(result)
    }

    fn check_decision(
        &mut self,
        feedback_id: &str,
        action: DecisionAction,
        section: Option<&str>,
        selector: Option<&str>,
    ) -> Result<Request> {
        let ticket = self.ticket()?;
        let section = self.resolve_section(section, selector)?;
        let current = self
            .feedback_item(&section, feedback_id)
            .map(|i| i.decision)
            .ok_or_else(|| ReviewError::FeedbackNotFound(feedback_id.to_owned()))?;
        decisions::transition(current, action)?;
        self.decisions.claim(feedback_id)?;
        Ok(Request::Decide {
            ticket,
            section,
            feedback_id: feedback_id.to_owned(),
            action,
        })
    }

    pub fn begin_revert_all(&mut self) -> Result<Request> {
        let result = self.ticket().map(Request::RevertAll);
        self.noted(result)
    }

    // -----------------------------------------------------------------------
    // Custom feedback
    // -----------------------------------------------------------------------

    /// Validates a custom feedback draft. An empty description never reaches
    /// the backend.
    pub fn begin_custom_feedback(&mut self, draft: CustomFeedbackDraft) -> Result<Request> {
        let result = self.check_custom(draft);
        self.noted(result)
    }

    fn check_custom(&mut self, mut draft: CustomFeedbackDraft) -> Result<Request> {
        let description = draft.description.trim().to_owned();
        if description.is_empty() {
            return Err(ReviewError::EmptyDescription);
        }
        draft.description = description;
        let ticket = self.ticket()?;
        let section = self.resolve_section(draft.section.as_deref(), None)?;
        if draft.category.trim().is_empty() {
            draft.category = "General".to_owned();
        }
        if let Some(FeedbackLink::AiItem(id)) = &draft.link {
            if draft.ai_reference.is_none() {
                draft.ai_reference = self
                    .feedback_item(&section, id)
                    .map(|i| i.description.clone());
            }
        }
        draft.section = Some(section.clone());
        Ok(Request::AddCustom {
            ticket,
            draft,
            section,
        })
    }

    /// Removes one entry locally and returns the backend deletion to issue.
    pub fn remove_custom_feedback(&mut self, id: &str) -> Result<Cleared> {
        let result = self
            .ledger
            .remove(id)
            .ok_or_else(|| ReviewError::CustomFeedbackNotFound(id.to_owned()));
        let entry = self.noted(result)?;
        Ok(self.cleared(vec![entry]))
    }

    /// Removes every entry linked to AI item `ai_id`.
    pub fn clear_custom_for_item(&mut self, ai_id: &str) -> Cleared {
        let removed = self.ledger.clear_for_item(ai_id);
        let cleared = self.cleared(removed);
        self.notices
            .info(format!("Removed {} custom feedback item(s)", cleared.count));
        cleared
    }

    /// Removes every entry of a section; defaults to the current section.
    pub fn clear_custom_for_section(&mut self, section: Option<&str>) -> Result<Cleared> {
        let result = self.resolve_section(section, None);
        let section = self.noted(result)?;
        let removed = self.ledger.clear_for_section(&section);
        let cleared = self.cleared(removed);
        self.notices.info(format!(
            "Removed {} custom feedback item(s) from {}",
            cleared.count, section
        ));
        Ok(cleared)
    }

    fn cleared(&self, removed: Vec<CustomFeedbackEntry>) -> Cleared {
        let count = removed.len();
        let requests = match self.ticket() {
            Ok(ticket) => removed
                .into_iter()
                .map(|e| Request::DeleteCustom {
                    ticket: ticket.clone(),
                    feedback_id: e.id,
                })
                .collect(),
            Err(_) => Vec::new(),
        };
        Cleared { count, requests }
    }

    // -----------------------------------------------------------------------
    // Highlights
    // -----------------------------------------------------------------------

    /// Highlights `selection` of a section's content; returns the new id.
    pub fn create_highlight(
        &mut self,
        section: Option<&str>,
        selection: Selection,
        color: HighlightColor,
    ) -> Result<String> {
        let result = self.place_highlight(section, selection, color);
        self.noted(result)
    }

    fn place_highlight(
        &mut self,
        section: Option<&str>,
        selection: Selection,
        color: HighlightColor,
    ) -> Result<String> {
        let name = self.resolve_section(section, None)?;
        let content = match self.cache.get(&name) {
            Some(r) if r.status == SectionStatus::Analyzed || !r.content.is_empty() => &r.content,
            _ => {
                return Err(ReviewError::InvalidSelection(
                    "section content is not loaded".to_owned(),
                ))
            }
        };
        let highlight = self.highlights.create(&name, content, selection, color)?;
        Ok(highlight.id.clone())
    }

    /// Adds a comment to a highlight. The comment is stored as custom
    /// feedback linked to the highlight once the backend accepts it.
    pub fn begin_highlight_comment(&mut self, highlight_id: &str, comment: &str) -> Result<Request> {
        let result = match self.highlights.get(highlight_id) {
            Some(h) => Ok(CustomFeedbackDraft {
                section: Some(h.section.clone()),
                kind: FeedbackType::Suggestion,
                category: "Highlight".to_owned(),
                description: comment.to_owned(),
                link: Some(FeedbackLink::Highlight(h.id.clone())),
                ai_reference: Some(h.text.clone()),
            }),
            None => Err(ReviewError::HighlightNotFound(highlight_id.to_owned())),
        };
        let draft = self.noted(result)?;
        self.begin_custom_feedback(draft)
    }

    /// Removes one highlight and the custom feedback linked to it.
    pub fn remove_highlight(&mut self, highlight_id: &str) -> Result<Cleared> {
        let result = self.highlights.remove(highlight_id);
        let removed = self.noted(result)?;
        let entries = self.ledger.clear_for_highlights(&[removed.id]);
        Ok(self.cleared(entries))
    }

    /// Removes every highlight of a section (default: current) and prunes
    /// ledger entries linked to them. Requires `confirmed`.
    pub fn clear_highlights(&mut self, section: Option<&str>, confirmed: bool) -> Result<Cleared> {
        let result = self
            .resolve_section(section, None)
            .and_then(|name| self.highlights.clear_all(&name, confirmed));
        let ids = self.noted(result)?;
        let entries = self.ledger.clear_for_highlights(&ids);
        let cleared = self.cleared(entries);
        self.notices.info(format!(
            "Cleared {} highlight(s) and {} comment(s)",
            ids.len(),
            cleared.count
        ));
        Ok(cleared)
    }

    // -----------------------------------------------------------------------
    // Review-wide operations
    // -----------------------------------------------------------------------

    pub fn begin_complete_review(&mut self) -> Result<Request> {
        let result = self.ticket().map(Request::CompleteReview);
        self.noted(result)
    }

    pub fn begin_statistics(&mut self) -> Result<Request> {
        let result = self.ticket().map(Request::Statistics);
        self.noted(result)
    }

    pub fn begin_dashboard(&mut self) -> Result<Request> {
        let result = self.ticket().map(Request::Dashboard);
        self.noted(result)
    }

    /// Sends a chat message with the current section as context.
    pub fn begin_chat(&mut self, message: &str) -> Result<Request> {
        let message = message.trim();
        let result = if message.is_empty() {
            Err(ReviewError::EmptyMessage)
        } else {
            self.ticket()
        };
        let ticket = self.noted(result)?;
        let section = self.current_section().map(str::to_owned);
        self.chat.push(ChatMessage {
            role: ChatRole::User,
            content: message.to_owned(),
            section: section.clone(),
        });
        Ok(Request::Chat {
            ticket,
            message: message.to_owned(),
            section,
        })
    }

    pub fn begin_download(&mut self, kind: DownloadKind) -> Result<Request> {
        let result = self.ticket().map(|ticket| Request::Download { ticket, kind });
        self.noted(result)
    }

    /// Downloads the commented document produced by the last completed review.
    pub fn begin_download_reviewed(&mut self) -> Result<Request> {
        let result = self
            .completed
            .as_ref()
            .map(|c| DownloadKind::ReviewedDocument(c.output_file.clone()))
            .ok_or(ReviewError::NoCompletedReview);
        let kind = self.noted(result)?;
        self.begin_download(kind)
    }

    /// Rates the review tool itself. Works with or without an open session;
    /// the session id is attached when there is one.
    pub fn begin_tool_feedback(&mut self, rating: u8, text: &str) -> Result<Request> {
        let result = if (1..=MAX_TOOL_RATING).contains(&rating) {
            Ok(rating)
        } else {
            Err(ReviewError::InvalidRating(rating))
        };
        let rating = self.noted(result)?;
        Ok(Request::ToolFeedback(ToolFeedback {
            rating,
            feedback: text.trim().to_owned(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            session_id: self.session.as_ref().map(|s| s.id.clone()),
        }))
    }

    // -----------------------------------------------------------------------
    // Responses
    // -----------------------------------------------------------------------

    /// Folds a backend response into the state.
    pub fn apply(&mut self, response: Response) -> Outcome {
        match response {
            Response::Uploaded { epoch, seq, result } => {
                if epoch != self.epoch {
                    return self.stale("upload");
                }
                if seq != self.upload_seq {
                    tracing::warn!(seq, latest = self.upload_seq, "dropping superseded upload");
                    return Outcome::Ignored;
                }
                match result {
                    Ok(outcome) => {
                        let sections = outcome.sections.len();
                        self.start_session(Session::new(
                            outcome.session_id,
                            outcome.document_name,
                            outcome.sections,
                        ));
                        self.notices
                            .success(format!("Document uploaded: {sections} section(s) found"));
                        Outcome::SessionStarted { sections }
                    }
                    Err(e) => self.failed(e),
                }
            }
            Response::Analyzed {
                ticket,
                section,
                result,
            } => {
                if !self.is_current(&ticket) {
                    return self.stale("analysis");
                }
                let displayed = self.current_section() == Some(section.as_str());
                match result {
                    Ok(analysis) => {
                        let count = analysis.feedback_items.len();
                        self.cache.store(&section, analysis);
                        if displayed {
                            self.notices
                                .success(format!("{section}: {count} feedback item(s)"));
                        }
                        Outcome::SectionReady { section, displayed }
                    }
                    Err(error) => {
                        self.cache.fail(&section, &error.to_string());
                        self.notices
                            .error(format!("Analysis of '{section}' failed: {error}"));
                        Outcome::SectionFailed {
                            section,
                            displayed,
                            error,
                        }
                    }
                }
            }
            Response::Decided {
                ticket,
                section,
                feedback_id,
                action,
                result,
            } => {
                if !self.is_current(&ticket) {
                    return self.stale("decision");
                }
                self.decisions.release(&feedback_id);
                match result {
                    Ok(()) => {
                        let decision = action.target();
                        if let Some(item) = self
                            .cache
                            .get_mut(&section)
                            .and_then(|r| r.item_mut(&feedback_id))
                        {
                            item.decision = decision;
                        }
                        self.notices
                            .success(format!("Feedback {}", action.past_tense()));
                        Outcome::DecisionApplied {
                            feedback_id,
                            decision,
                        }
                    }
                    Err(e) => self.failed(e),
                }
            }
            Response::RevertedAll { ticket, result } => {
                if !self.is_current(&ticket) {
                    return self.stale("revert_all");
                }
                match result {
                    Ok(()) => {
                        let mut changed = 0;
                        for record in self.cache.records_mut() {
                            for item in &mut record.feedback_items {
                                if item.decision != Decision::Pending {
                                    item.decision = Decision::Pending;
                                    changed += 1;
                                }
                            }
                        }
                        self.notices
                            .success(format!("Reverted {changed} decision(s)"));
                        Outcome::AllReverted { changed }
                    }
                    Err(e) => self.failed(e),
                }
            }
            Response::CustomAdded {
                ticket,
                draft,
                section,
                result,
            } => {
                if !self.is_current(&ticket) {
                    return self.stale("custom feedback");
                }
                match result {
                    Ok(ack) => {
                        let server_id = ack.id.clone();
                        let entry = CustomFeedbackEntry {
                            id: ack
                                .id
                                .unwrap_or_else(|| format!("custom_{}", uuid::Uuid::new_v4().simple())),
                            section,
                            kind: draft.kind,
                            category: draft.category,
                            description: draft.description,
                            timestamp: ack
                                .timestamp
                                .unwrap_or_else(|| chrono::Utc::now().to_rfc3339()),
                            link: draft.link,
                            ai_reference: draft.ai_reference,
                        };
                        if let Some(FeedbackLink::Highlight(id)) = &entry.link {
                            if self.highlights.add_comment(id, &entry.description).is_err() {
                                tracing::warn!(
                                    highlight = %id,
                                    entry = %entry.id,
                                    "highlight removed while its comment was pending"
                                );
                                self.notices
                                    .warning("The highlight was removed; its comment was discarded");
                                let delete = server_id.map(|feedback_id| Request::DeleteCustom {
                                    ticket,
                                    feedback_id,
                                });
                                return Outcome::CustomDiscarded { delete };
                            }
                        }
                        let entry_id = entry.id.clone();
                        self.ledger.append(entry);
                        self.notices.success("Custom feedback added");
                        Outcome::CustomAdded { entry_id }
                    }
                    Err(e) => self.failed(e),
                }
            }
            Response::CustomDeleted {
                ticket,
                feedback_id,
                result,
            } => {
                if !self.is_current(&ticket) {
                    return self.stale("custom delete");
                }
                match result {
                    Ok(()) => Outcome::CustomDeleted { feedback_id },
                    Err(e) => {
                        tracing::warn!(%feedback_id, error = %e, "server-side delete failed");
                        self.notices.warning(format!(
                            "Removed locally, but the server kept '{feedback_id}': {e}"
                        ));
                        Outcome::Failed(ReviewError::Api(e))
                    }
                }
            }
            Response::ReviewCompleted { ticket, result } => {
                if !self.is_current(&ticket) {
                    return self.stale("complete_review");
                }
                match result {
                    Ok(completed) => {
                        self.notices.success(format!(
                            "Review completed: {} comment(s) added to {}",
                            completed.comments_count, completed.output_file
                        ));
                        self.completed = Some(completed);
                        Outcome::ReviewCompleted
                    }
                    Err(e) => self.failed(e),
                }
            }
            Response::Statistics { ticket, result } => {
                if !self.is_current(&ticket) {
                    return self.stale("statistics");
                }
                match result {
                    Ok(stats) => {
                        self.statistics = Some(stats);
                        Outcome::StatisticsUpdated
                    }
                    Err(e) => self.failed(e),
                }
            }
            Response::Dashboard { ticket, result } => {
                if !self.is_current(&ticket) {
                    return self.stale("dashboard");
                }
                match result {
                    Ok(dashboard) => {
                        self.dashboard = Some(dashboard);
                        Outcome::DashboardUpdated
                    }
                    Err(e) => self.failed(e),
                }
            }
            Response::ChatAnswered {
                ticket,
                message: _,
                section,
                result,
            } => {
                if !self.is_current(&ticket) {
                    return self.stale("chat");
                }
                match result {
                    Ok(answer) => {
                        self.chat.push(ChatMessage {
                            role: ChatRole::Assistant,
                            content: answer,
                            section,
                        });
                        Outcome::ChatAnswered
                    }
                    Err(e) => self.failed(e),
                }
            }
            Response::DocumentDeleted { ticket, result } => {
                if !self.is_current(&ticket) {
                    return self.stale("delete_document");
                }
                match result {
                    Ok(kept) => {
                        if let Some(session) = self.session.take() {
                            self.start_session(Session::new(session.id, "", Vec::new()));
                        }
                        let suffix = if kept { ", guidelines kept" } else { "" };
                        self.notices.success(format!("Document deleted{suffix}"));
                        Outcome::DocumentDeleted
                    }
                    Err(e) => self.failed(e),
                }
            }
            Response::Reset { epoch, result } => {
                if epoch != self.epoch {
                    return self.stale("reset");
                }
                match result {
                    Ok(()) => {
                        self.clear_session();
                        self.notices.success("Session reset");
                        Outcome::SessionReset
                    }
                    Err(e) => self.failed(e),
                }
            }
            Response::Downloaded {
                ticket,
                kind,
                result,
            } => {
                if !self.is_current(&ticket) {
                    return self.stale("download");
                }
                match result {
                    Ok(bytes) => Outcome::Downloaded { kind, bytes },
                    Err(e) => self.failed(e),
                }
            }
            Response::ToolFeedbackSent { result } => match result {
                Ok(()) => {
                    self.notices.success("Thank you for your feedback!");
                    Outcome::ToolFeedbackSent
                }
                Err(e) => self.failed(e),
            },
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn check_session(&self) -> Result<()> {
        self.require_session().map(|_| ())
    }

    fn require_session(&self) -> Result<&Session> {
        self.session.as_ref().ok_or(ReviewError::NoSession)
    }

    fn ticket(&self) -> Result<Ticket> {
        let session = self.require_session()?;
        Ok(Ticket {
            epoch: self.epoch,
            session_id: session.id.clone(),
        })
    }

    fn known_section(&self, section: &str) -> Result<Ticket> {
        let ticket = self.ticket()?;
        match self.session.as_ref().and_then(|s| s.index_of(section)) {
            Some(_) => Ok(ticket),
            None => Err(ReviewError::UnknownSection(section.to_owned())),
        }
    }

    fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.epoch == self.epoch
            && self
                .session
                .as_ref()
                .is_some_and(|s| s.id == ticket.session_id)
    }

    fn resolve_section(&self, explicit: Option<&str>, selector: Option<&str>) -> Result<String> {
        let session = self.require_session()?;
        let name = explicit
            .filter(|s| !s.is_empty())
            .or_else(|| self.current_section())
            .or_else(|| selector.filter(|s| !s.is_empty()))
            .ok_or(ReviewError::SectionUnresolved)?;
        if session.index_of(name).is_none() {
            return Err(ReviewError::UnknownSection(name.to_owned()));
        }
        Ok(name.to_owned())
    }

    /// Pushes a notice for `Err` and passes the result through.
    fn noted<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            self.notices.push(e.notice_level(), e.to_string());
        }
        result
    }

    fn failed(&mut self, error: ApiError) -> Outcome {
        let error = ReviewError::Api(error);
        self.notices.push(error.notice_level(), error.to_string());
        Outcome::Failed(error)
    }

    fn stale(&self, what: &str) -> Outcome {
        tracing::warn!(what, epoch = self.epoch, "dropping response from a previous session");
        Outcome::Ignored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::AnalysisResult;

    fn review_with(sections: &[&str]) -> Review {
        let mut review = Review::new();
        review.start_session(Session::new(
            "s1",
            "doc.docx",
            sections.iter().map(|s| s.to_string()).collect(),
        ));
        review
    }

    fn item(id: &str) -> FeedbackItem {
        serde_json::from_value(serde_json::json!({"id": id, "risk_level": "High"})).unwrap()
    }

    fn analyzed(review: &mut Review, request: Request, items: Vec<FeedbackItem>) -> Outcome {
        let (ticket, section) = match request {
            Request::Analyze { ticket, section } => (ticket, section),
            other => panic!("expected analysis request, got {other:?}"),
        };
        review.apply(Response::Analyzed {
            ticket,
            section,
            result: Ok(AnalysisResult {
                section_content: "Body text".into(),
                feedback_items: items,
            }),
        })
    }

    #[test]
    fn navigation_without_session_is_rejected_with_notice() {
        let mut review = Review::new();
        assert_eq!(review.go_to(0).unwrap_err(), ReviewError::NoSession);
        assert_eq!(review.notices.len(), 1);
    }

    #[test]
    fn invalid_index_leaves_current_section() {
        let mut review = review_with(&["Intro", "Findings"]);
        review.go_to(1).unwrap();
        assert!(review.go_to(2).is_err());
        assert!(review.go_to(usize::MAX).is_err());
        assert_eq!(review.current_section(), Some("Findings"));
    }

    #[test]
    fn boundary_navigation_is_informational() {
        let mut review = review_with(&["Intro"]);
        review.next().unwrap();
        review.notices.drain();
        assert_eq!(review.next().unwrap_err(), ReviewError::AtLastSection);
        let notice = review.notices.pop().unwrap();
        assert_eq!(notice.level, crate::notice::NoticeLevel::Info);
    }

    #[test]
    fn decision_does_not_reload_section() {
        let mut review = review_with(&["Intro"]);
        let req = review.go_to(0).unwrap().unwrap();
        analyzed(&mut review, req, vec![item("f1")]);

        let req = review
            .begin_decision("f1", DecisionAction::Accept, None, None)
            .unwrap();
        let (ticket, section, feedback_id, action) = match req {
            Request::Decide {
                ticket,
                section,
                feedback_id,
                action,
            } => (ticket, section, feedback_id, action),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(review.controls("Intro", "f1"), Controls::DISABLED);
        let outcome = review.apply(Response::Decided {
            ticket,
            section,
            feedback_id,
            action,
            result: Ok(()),
        });
        assert_eq!(
            outcome,
            Outcome::DecisionApplied {
                feedback_id: "f1".into(),
                decision: Decision::Accepted
            }
        );
        assert_eq!(review.section_status("Intro"), SectionStatus::Analyzed);
        assert_eq!(review.current_index(), Some(0));
        assert!(review.ensure_analyzed("Intro").unwrap().is_none());
        assert!(review.controls("Intro", "f1").revert);
    }

    #[test]
    fn duplicate_decision_in_flight_is_rejected() {
        let mut review = review_with(&["Intro"]);
        let req = review.go_to(0).unwrap().unwrap();
        analyzed(&mut review, req, vec![item("f1")]);
        review
            .begin_decision("f1", DecisionAction::Reject, None, None)
            .unwrap();
        assert_eq!(
            review
                .begin_decision("f1", DecisionAction::Reject, None, None)
                .unwrap_err(),
            ReviewError::RequestInFlight("f1".into())
        );
    }

    #[test]
    fn section_resolution_falls_back_to_selector() {
        let mut review = review_with(&["Intro", "Findings"]);
        assert_eq!(
            review
                .begin_decision("f1", DecisionAction::Accept, None, None)
                .unwrap_err(),
            ReviewError::SectionUnresolved
        );
        // Selector names a real section, but the item is not cached there.
        assert_eq!(
            review
                .begin_decision("f1", DecisionAction::Accept, None, Some("Findings"))
                .unwrap_err(),
            ReviewError::FeedbackNotFound("f1".into())
        );
    }

    #[test]
    fn stale_analysis_after_reset_is_ignored() {
        let mut review = review_with(&["Intro"]);
        let req = review.go_to(0).unwrap().unwrap();
        review.start_session(Session::new("s2", "other.docx", vec!["Intro".into()]));
        assert_eq!(analyzed(&mut review, req, vec![item("f1")]), Outcome::Ignored);
        assert!(review.record("Intro").is_none());
    }

    #[test]
    fn response_for_section_navigated_away_is_cached_not_displayed() {
        let mut review = review_with(&["Intro", "Findings"]);
        let intro = review.go_to(0).unwrap().unwrap();
        let _findings = review.go_to(1).unwrap().unwrap();
        let outcome = analyzed(&mut review, intro, vec![item("f1")]);
        assert_eq!(
            outcome,
            Outcome::SectionReady {
                section: "Intro".into(),
                displayed: false
            }
        );
        assert_eq!(review.current_section(), Some("Findings"));
        assert_eq!(review.section_status("Intro"), SectionStatus::Analyzed);
    }

    #[test]
    fn highlight_clear_prunes_linked_comments() {
        let mut review = review_with(&["Intro"]);
        let req = review.go_to(0).unwrap().unwrap();
        analyzed(&mut review, req, vec![]);
        let id = review
            .create_highlight(None, Selection::new(0, 4), HighlightColor::Green)
            .unwrap();
        let req = review.begin_highlight_comment(&id, "check this").unwrap();
        let (ticket, draft, section) = match req {
            Request::AddCustom {
                ticket,
                draft,
                section,
            } => (ticket, draft, section),
            other => panic!("unexpected {other:?}"),
        };
        review.apply(Response::CustomAdded {
            ticket,
            draft,
            section,
            result: Ok(Default::default()),
        });
        assert_eq!(review.ledger().len(), 1);
        assert_eq!(review.highlights().get(&id).unwrap().comments, vec!["check this"]);

        assert_eq!(
            review.clear_highlights(None, false).unwrap_err(),
            ReviewError::ConfirmationRequired
        );
        let cleared = review.clear_highlights(None, true).unwrap();
        assert_eq!(cleared.count, 1);
        assert_eq!(cleared.requests.len(), 1);
        assert!(review.ledger().is_empty());
        assert_eq!(review.highlights().for_section("Intro").count(), 0);
    }

    fn added(request: Request, id: &str) -> Response {
        match request {
            Request::AddCustom {
                ticket,
                draft,
                section,
            } => Response::CustomAdded {
                ticket,
                draft,
                section,
                result: Ok(crate::api::CustomFeedbackAck {
                    id: Some(id.to_owned()),
                    timestamp: None,
                }),
            },
            other => panic!("expected add request, got {other:?}"),
        }
    }

    #[test]
    fn comment_for_highlight_removed_in_flight_is_discarded() {
        let mut review = review_with(&["Intro"]);
        let req = review.go_to(0).unwrap().unwrap();
        analyzed(&mut review, req, Vec::new());
        let highlight = review
            .create_highlight(None, Selection::new(0, 4), HighlightColor::Yellow)
            .unwrap();
        let pending = review.begin_highlight_comment(&highlight, "check this").unwrap();
        review.remove_highlight(&highlight).unwrap();

        match review.apply(added(pending, "srv_1")) {
            Outcome::CustomDiscarded {
                delete: Some(Request::DeleteCustom { feedback_id, .. }),
            } => assert_eq!(feedback_id, "srv_1"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(review.ledger().is_empty());
    }

    #[test]
    fn late_decision_from_old_session_keeps_new_guard() {
        let mut review = review_with(&["Intro"]);
        let req = review.go_to(0).unwrap().unwrap();
        analyzed(&mut review, req, vec![item("fb_001")]);
        let old = review
            .begin_decision("fb_001", DecisionAction::Accept, None, None)
            .unwrap();

        review.start_session(Session::new("s2", "next.docx", vec!["Intro".into()]));
        let req = review.go_to(0).unwrap().unwrap();
        analyzed(&mut review, req, vec![item("fb_001")]);
        review
            .begin_decision("fb_001", DecisionAction::Reject, None, None)
            .unwrap();

        let late = match old {
            Request::Decide {
                ticket,
                section,
                feedback_id,
                action,
            } => Response::Decided {
                ticket,
                section,
                feedback_id,
                action,
                result: Ok(()),
            },
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(review.apply(late), Outcome::Ignored);
        assert!(review.is_decision_in_flight("fb_001"));
    }

    #[test]
    fn newest_upload_wins() {
        let mut review = Review::new();
        let upload = |name: &str| UploadRequest {
            document: name.into(),
            guidelines: None,
            preference: Default::default(),
        };
        let first = review.begin_upload(upload("a.docx")).unwrap();
        let second = review.begin_upload(upload("b.docx")).unwrap();
        let response = |request: Request, id: &str| match request {
            Request::Upload { epoch, seq, .. } => Response::Uploaded {
                epoch,
                seq,
                result: Ok(crate::api::UploadOutcome {
                    session_id: id.into(),
                    document_name: format!("{id}.docx"),
                    sections: vec!["Intro".into()],
                    guidelines_uploaded: false,
                }),
            },
            other => panic!("unexpected {other:?}"),
        };

        assert_eq!(review.apply(response(first, "a")), Outcome::Ignored);
        assert_eq!(
            review.apply(response(second, "b")),
            Outcome::SessionStarted { sections: 1 }
        );
        assert_eq!(review.session().map(|s| s.id.as_str()), Some("b"));
    }
}
