//! Sequential review client.
//!
//! [`ReviewClient`] pairs a [`Review`] with a [`ReviewApi`] and runs each
//! operation to completion: begin, execute, apply. Scripts and tests use it;
//! the TUI drives `Review` itself so that requests can overlap.

use crate::api::{ReviewApi, UploadRequest};
use crate::decisions::DecisionAction;
use crate::dispatch::{execute, Request};
use crate::error::{Result, ReviewError};
use crate::review::{Cleared, Outcome, Review};
use crate::session::Session;
use crate::types::{
    CompletedReview, CustomFeedbackDraft, Dashboard, Decision, DownloadKind, FeedbackLink,
    HighlightColor, SectionStatus, Selection, Statistics,
};

pub struct ReviewClient<A> {
    api: A,
    review: Review,
}

impl<A: ReviewApi> ReviewClient<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            review: Review::new(),
        }
    }

    /// Resumes a session known to exist on the backend.
    pub fn with_session(api: A, session: Session) -> Self {
        let mut review = Review::new();
        review.start_session(session);
        Self { api, review }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn review(&self) -> &Review {
        &self.review
    }

    pub fn review_mut(&mut self) -> &mut Review {
        &mut self.review
    }

    async fn run(&mut self, request: Request) -> Outcome {
        let response = execute(&self.api, request).await;
        self.review.apply(response)
    }

    async fn run_checked(&mut self, request: Request) -> Result<Outcome> {
        match self.run(request).await {
            Outcome::Failed(e) => Err(e),
            outcome => Ok(outcome),
        }
    }

    /// Runs best-effort deletions; their failures end up as warnings.
    async fn flush(&mut self, cleared: Cleared) -> usize {
        for request in cleared.requests {
            self.run(request).await;
        }
        cleared.count
    }

    async fn discard(&mut self, delete: Option<Request>) {
        if let Some(request) = delete {
            self.run(request).await;
        }
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Uploads a document and shows its first section.
    ///
    /// Returns the number of sections found.
    pub async fn upload(&mut self, upload: UploadRequest) -> Result<usize> {
        let request = self.review.begin_upload(upload)?;
        let sections = match self.run_checked(request).await? {
            Outcome::SessionStarted { sections } => sections,
            other => return Err(unexpected(other)),
        };
        if sections > 0 {
            self.go_to(0).await?;
        }
        Ok(sections)
    }

    pub async fn reset(&mut self) -> Result<()> {
        let request = self.review.begin_reset();
        self.run_checked(request).await.map(|_| ())
    }

    pub async fn delete_document(&mut self, keep_guidelines: bool) -> Result<()> {
        let request = self.review.begin_delete_document(keep_guidelines)?;
        self.run_checked(request).await.map(|_| ())
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub async fn go_to(&mut self, index: usize) -> Result<SectionStatus> {
        let request = self.review.go_to(index)?;
        self.analyze(request).await
    }

    pub async fn go_to_section(&mut self, name: &str) -> Result<SectionStatus> {
        let request = self.review.go_to_section(name)?;
        self.analyze(request).await
    }

    pub async fn next(&mut self) -> Result<SectionStatus> {
        let request = self.review.next()?;
        self.analyze(request).await
    }

    pub async fn previous(&mut self) -> Result<SectionStatus> {
        let request = self.review.previous()?;
        self.analyze(request).await
    }

    pub async fn ensure_analyzed(&mut self, section: &str) -> Result<SectionStatus> {
        let request = self.review.ensure_analyzed(section)?;
        match request {
            Some(r) => self.analyze(Some(r)).await,
            None => Ok(self.review.section_status(section)),
        }
    }

    pub async fn retry_analysis(&mut self, section: Option<&str>) -> Result<SectionStatus> {
        let request = self.review.retry_analysis(section)?;
        self.analyze(request).await
    }

    pub async fn reanalyze(&mut self, section: Option<&str>) -> Result<SectionStatus> {
        let request = self.review.reanalyze(section)?;
        self.analyze(request).await
    }

    async fn analyze(&mut self, request: Option<Request>) -> Result<SectionStatus> {
        let section = match &request {
            Some(r) => r.analysis_section().map(str::to_owned),
            None => self.review.current_section().map(str::to_owned),
        };
        if let Some(request) = request {
            if let Outcome::SectionFailed { error, .. } = self.run(request).await {
                return Err(ReviewError::Api(error));
            }
        }
        Ok(section
            .map(|s| self.review.section_status(&s))
            .unwrap_or_default())
    }

    // -----------------------------------------------------------------------
    // Decisions
    // -----------------------------------------------------------------------

    pub async fn accept(&mut self, feedback_id: &str, section: Option<&str>) -> Result<Decision> {
        self.decide(feedback_id, DecisionAction::Accept, section).await
    }

    pub async fn reject(&mut self, feedback_id: &str, section: Option<&str>) -> Result<Decision> {
        self.decide(feedback_id, DecisionAction::Reject, section).await
    }

    pub async fn revert(&mut self, feedback_id: &str, section: Option<&str>) -> Result<Decision> {
        self.decide(feedback_id, DecisionAction::Revert, section).await
    }

    async fn decide(
        &mut self,
        feedback_id: &str,
        action: DecisionAction,
        section: Option<&str>,
    ) -> Result<Decision> {
        let request = self
            .review
            .begin_decision(feedback_id, action, section, None)?;
        match self.run_checked(request).await? {
            Outcome::DecisionApplied { decision, .. } => Ok(decision),
            other => Err(unexpected(other)),
        }
    }

    /// Resets every decision of the session; returns how many changed.
    pub async fn revert_all(&mut self) -> Result<usize> {
        let request = self.review.begin_revert_all()?;
        match self.run_checked(request).await? {
            Outcome::AllReverted { changed } => Ok(changed),
            other => Err(unexpected(other)),
        }
    }

    // -----------------------------------------------------------------------
    // Custom feedback and highlights
    // -----------------------------------------------------------------------

    /// Adds a custom feedback entry; returns its id.
    pub async fn add_custom_feedback(&mut self, draft: CustomFeedbackDraft) -> Result<String> {
        let highlight = match &draft.link {
            Some(FeedbackLink::Highlight(id)) => Some(id.clone()),
            _ => None,
        };
        let request = self.review.begin_custom_feedback(draft)?;
        match self.run_checked(request).await? {
            Outcome::CustomAdded { entry_id } => Ok(entry_id),
            Outcome::CustomDiscarded { delete } => {
                self.discard(delete).await;
                Err(ReviewError::HighlightNotFound(highlight.unwrap_or_default()))
            }
            other => Err(unexpected(other)),
        }
    }

    pub async fn remove_custom_feedback(&mut self, id: &str) -> Result<()> {
        let cleared = self.review.remove_custom_feedback(id)?;
        self.flush(cleared).await;
        Ok(())
    }

    pub async fn clear_custom_for_item(&mut self, ai_id: &str) -> usize {
        let cleared = self.review.clear_custom_for_item(ai_id);
        self.flush(cleared).await
    }

    pub async fn clear_custom_for_section(&mut self, section: Option<&str>) -> Result<usize> {
        let cleared = self.review.clear_custom_for_section(section)?;
        Ok(self.flush(cleared).await)
    }

    pub fn create_highlight(
        &mut self,
        section: Option<&str>,
        selection: Selection,
        color: HighlightColor,
    ) -> Result<String> {
        self.review.create_highlight(section, selection, color)
    }

    /// Comments on a highlight; returns the id of the stored entry.
    pub async fn comment_highlight(&mut self, highlight_id: &str, comment: &str) -> Result<String> {
        let request = self.review.begin_highlight_comment(highlight_id, comment)?;
        match self.run_checked(request).await? {
            Outcome::CustomAdded { entry_id } => Ok(entry_id),
            Outcome::CustomDiscarded { delete } => {
                self.discard(delete).await;
                Err(ReviewError::HighlightNotFound(highlight_id.to_owned()))
            }
            other => Err(unexpected(other)),
        }
    }

    /// Removes a highlight; returns how many linked comments went with it.
    pub async fn remove_highlight(&mut self, highlight_id: &str) -> Result<usize> {
        let cleared = self.review.remove_highlight(highlight_id)?;
        Ok(self.flush(cleared).await)
    }

    pub async fn clear_highlights(&mut self, section: Option<&str>, confirmed: bool) -> Result<usize> {
        let cleared = self.review.clear_highlights(section, confirmed)?;
        Ok(self.flush(cleared).await)
    }

    // -----------------------------------------------------------------------
    // Review-wide
    // -----------------------------------------------------------------------

    pub async fn complete_review(&mut self) -> Result<CompletedReview> {
        let request = self.review.begin_complete_review()?;
        self.run_checked(request).await?;
        self.review.completed().cloned().ok_or(ReviewError::Superseded)
    }

    pub async fn statistics(&mut self) -> Result<Statistics> {
        let request = self.review.begin_statistics()?;
        self.run_checked(request).await?;
        self.review.statistics().cloned().ok_or(ReviewError::Superseded)
    }

    pub async fn dashboard(&mut self) -> Result<Dashboard> {
        let request = self.review.begin_dashboard()?;
        self.run_checked(request).await?;
        self.review.dashboard().cloned().ok_or(ReviewError::Superseded)
    }

    /// Sends a chat message; returns the assistant's answer.
    pub async fn chat(&mut self, message: &str) -> Result<String> {
        let request = self.review.begin_chat(message)?;
        self.run_checked(request).await?;
        self.review
            .chat()
            .last()
            .map(|m| m.content.clone())
            .ok_or(ReviewError::Superseded)
    }

    pub async fn download(&mut self, kind: DownloadKind) -> Result<Vec<u8>> {
        let request = self.review.begin_download(kind)?;
        self.finish_download(request).await
    }

    pub async fn download_reviewed(&mut self) -> Result<Vec<u8>> {
        let request = self.review.begin_download_reviewed()?;
        self.finish_download(request).await
    }

    async fn finish_download(&mut self, request: Request) -> Result<Vec<u8>> {
        match self.run_checked(request).await? {
            Outcome::Downloaded { bytes, .. } => Ok(bytes),
            other => Err(unexpected(other)),
        }
    }

    /// Rates the review tool (1 to 5) with an optional comment.
    pub async fn submit_tool_feedback(&mut self, rating: u8, feedback: &str) -> Result<()> {
        let request = self.review.begin_tool_feedback(rating, feedback)?;
        self.run_checked(request).await.map(|_| ())
    }
}

/// Maps an outcome the caller did not ask for to an error.
///
/// With one request at a time the only way to get here is a response for a
/// session that was replaced in the meantime.
fn unexpected(outcome: Outcome) -> ReviewError {
    tracing::debug!(?outcome, "unexpected outcome");
    ReviewError::Superseded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrequested_outcome_reads_as_superseded() {
        assert_eq!(unexpected(Outcome::Ignored), ReviewError::Superseded);
        assert_eq!(
            unexpected(Outcome::StatisticsUpdated).to_string(),
            "The session changed before the server answered; please try again"
        );
    }
}
