//! Section analysis cache.
//!
//! Maps section names to [`SectionRecord`]s and owns the per-section status
//! machine: `pending -> analyzing -> {analyzed | failed}`, `failed ->
//! analyzing` on retry, `analyzed -> analyzing` on explicit re-analysis. The
//! `analyzing` status doubles as the guard against duplicate requests.

use std::collections::HashMap;

use crate::error::{Result, ReviewError};
use crate::types::{Decision, FeedbackItem, SectionRecord, SectionStatus};

/// What `ensure_analyzed` decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisStart {
    /// Already analyzed; the cached record can be shown right away.
    Cached,
    /// A request for this section is already outstanding.
    InFlight,
    /// The last attempt failed. Only an explicit retry re-issues it.
    Failed,
    /// The section moved to `analyzing`; the caller must issue the request.
    Dispatch,
}

/// Content and items returned by the analysis endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalysisResult {
    pub section_content: String,
    pub feedback_items: Vec<FeedbackItem>,
}

#[derive(Debug, Default)]
pub struct SectionCache {
    records: HashMap<String, SectionRecord>,
}

impl SectionCache {
    pub fn get(&self, section: &str) -> Option<&SectionRecord> {
        self.records.get(section)
    }

    pub fn get_mut(&mut self, section: &str) -> Option<&mut SectionRecord> {
        self.records.get_mut(section)
    }

    pub fn status(&self, section: &str) -> SectionStatus {
        self.records
            .get(section)
            .map(|r| r.status)
            .unwrap_or_default()
    }

    pub fn records(&self) -> impl Iterator<Item = &SectionRecord> {
        self.records.values()
    }

    pub fn records_mut(&mut self) -> impl Iterator<Item = &mut SectionRecord> {
        self.records.values_mut()
    }

    pub fn analyzed_count(&self) -> usize {
        self.records
            .values()
            .filter(|r| r.status == SectionStatus::Analyzed)
            .count()
    }

    /// Serves from cache, defers to an outstanding request, or starts one.
    ///
    /// Creates the record lazily on first use.
    pub fn ensure_analyzed(&mut self, section: &str) -> AnalysisStart {
        let record = self
            .records
            .entry(section.to_owned())
            .or_insert_with(|| SectionRecord::new(section));
        match record.status {
            SectionStatus::Analyzed => AnalysisStart::Cached,
            SectionStatus::Analyzing => AnalysisStart::InFlight,
            SectionStatus::Failed => AnalysisStart::Failed,
            SectionStatus::Pending => {
                record.status = SectionStatus::Analyzing;
                AnalysisStart::Dispatch
            }
        }
    }

    /// Re-issues a failed analysis. Only valid from `failed`.
    pub fn retry(&mut self, section: &str) -> Result<AnalysisStart> {
        let status = self.status(section);
        if status != SectionStatus::Failed {
            return Err(ReviewError::NotRetryable {
                section: section.to_owned(),
                status,
            });
        }
        self.start(section);
        Ok(AnalysisStart::Dispatch)
    }

    /// Forces a fresh analysis of an analyzed (or failed) section.
    pub fn reanalyze(&mut self, section: &str) -> Result<AnalysisStart> {
        match self.status(section) {
            SectionStatus::Analyzing => Ok(AnalysisStart::InFlight),
            SectionStatus::Analyzed | SectionStatus::Failed => {
                self.start(section);
                Ok(AnalysisStart::Dispatch)
            }
            status @ SectionStatus::Pending => Err(ReviewError::NotRetryable {
                section: section.to_owned(),
                status,
            }),
        }
    }

    fn start(&mut self, section: &str) {
        if let Some(record) = self.records.get_mut(section) {
            record.status = SectionStatus::Analyzing;
        }
    }

    /// Stores a successful analysis. Decisions survive for items whose id
    /// is present in both the old and the new result.
    pub fn store(&mut self, section: &str, result: AnalysisResult) {
        let record = self
            .records
            .entry(section.to_owned())
            .or_insert_with(|| SectionRecord::new(section));
        let previous: HashMap<String, Decision> = record
            .feedback_items
            .iter()
            .map(|i| (i.id.clone(), i.decision))
            .collect();
        record.content = result.section_content;
        record.feedback_items = result.feedback_items;
        for item in &mut record.feedback_items {
            item.decision = previous.get(&item.id).copied().unwrap_or_default();
        }
        record.status = SectionStatus::Analyzed;
        record.last_error = None;
    }

    /// Marks the section failed and remembers the error text.
    pub fn fail(&mut self, section: &str, error: &str) {
        let record = self
            .records
            .entry(section.to_owned())
            .or_insert_with(|| SectionRecord::new(section));
        record.status = SectionStatus::Failed;
        record.last_error = Some(error.to_owned());
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}
