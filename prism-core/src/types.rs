//! Domain types shared by the review state model, the API layer, and the TUI.
//!
//! Wire-facing types derive `serde` and follow the backend's JSON field names.
//! Client-only state (decisions, section status) is never serialized to the
//! backend.

use serde::{Deserialize, Deserializer, Serialize};

/// One named subdivision of the uploaded document.
///
/// Sections are immutable once the upload response arrives; `order` is the
/// position in the backend's section list and is what the navigator indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: String,
    pub order: usize,
}

/// Kind of a feedback item as produced by the analysis engine.
///
/// Unknown kinds from the backend deserialize to `Suggestion` rather than
/// failing the whole analysis response.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackType {
    Important,
    Critical,
    Positive,
    Question,
    Clarification,
    #[default]
    #[serde(other)]
    Suggestion,
}

impl FeedbackType {
    /// Every kind, in the order the TUI cycles through them.
    pub const ALL: [FeedbackType; 6] = [
        FeedbackType::Suggestion,
        FeedbackType::Important,
        FeedbackType::Critical,
        FeedbackType::Positive,
        FeedbackType::Question,
        FeedbackType::Clarification,
    ];

    /// Lowercase wire name, also used for display.
    pub fn as_str(self) -> &'static str {
        match self {
            FeedbackType::Suggestion => "suggestion",
            FeedbackType::Important => "important",
            FeedbackType::Critical => "critical",
            FeedbackType::Positive => "positive",
            FeedbackType::Question => "question",
            FeedbackType::Clarification => "clarification",
        }
    }

    /// The kind after `self` in [`FeedbackType::ALL`], wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Risk classification attached to every feedback item.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// The reviewer's verdict on a feedback item.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl Decision {
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Pending => "pending",
            Decision::Accepted => "accepted",
            Decision::Rejected => "rejected",
        }
    }
}

/// A single AI-generated observation about a section.
///
/// Everything except `decision` comes from the backend and is immutable on the
/// client. `decision` is changed only through the decision tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: FeedbackType,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub suggestion: Option<String>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default, deserialize_with = "string_or_number_list")]
    pub hawkeye_refs: Vec<String>,
    #[serde(default, deserialize_with = "clamped_confidence")]
    pub confidence: f64,
    #[serde(skip)]
    pub decision: Decision,
}

/// Hawkeye references arrive as numbers from the engine and as strings from
/// older payloads; both are normalised to strings.
fn string_or_number_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<Vec<serde_json::Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

fn clamped_confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<f64> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or(0.0).clamp(0.0, 1.0))
}

/// Analysis status of one section.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SectionStatus {
    #[default]
    Pending,
    Analyzing,
    Analyzed,
    Failed,
}

impl SectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SectionStatus::Pending => "pending",
            SectionStatus::Analyzing => "analyzing",
            SectionStatus::Analyzed => "analyzed",
            SectionStatus::Failed => "failed",
        }
    }
}

/// Cached analysis state for one section, created on first navigation.
#[derive(Debug, Clone, Default)]
pub struct SectionRecord {
    pub name: String,
    pub content: String,
    pub feedback_items: Vec<FeedbackItem>,
    pub status: SectionStatus,
    /// Error text of the most recent failed analysis, cleared on success.
    pub last_error: Option<String>,
}

impl SectionRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            ..Self::default()
        }
    }

    pub fn item(&self, feedback_id: &str) -> Option<&FeedbackItem> {
        self.feedback_items.iter().find(|i| i.id == feedback_id)
    }

    pub fn item_mut(&mut self, feedback_id: &str) -> Option<&mut FeedbackItem> {
        self.feedback_items.iter_mut().find(|i| i.id == feedback_id)
    }
}

/// What a custom feedback entry is attached to, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackLink {
    /// An AI-generated feedback item, by id.
    AiItem(String),
    /// A reviewer highlight, by id.
    Highlight(String),
}

impl FeedbackLink {
    pub fn id(&self) -> &str {
        match self {
            FeedbackLink::AiItem(id) | FeedbackLink::Highlight(id) => id,
        }
    }
}

/// A reviewer-authored feedback entry held in the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomFeedbackEntry {
    pub id: String,
    pub section: String,
    pub kind: FeedbackType,
    pub category: String,
    pub description: String,
    /// RFC 3339 creation time.
    pub timestamp: String,
    pub link: Option<FeedbackLink>,
    /// Quoted text of the linked item or highlighted span.
    pub ai_reference: Option<String>,
}

/// Reviewer input for a new custom feedback entry, before validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CustomFeedbackDraft {
    /// Explicit target section; falls back to the navigator's current section.
    pub section: Option<String>,
    pub kind: FeedbackType,
    pub category: String,
    pub description: String,
    pub link: Option<FeedbackLink>,
    pub ai_reference: Option<String>,
}

/// Highlight marker colors offered to the reviewer.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightColor {
    #[default]
    Yellow,
    Green,
    Blue,
    Pink,
}

impl HighlightColor {
    pub fn as_str(self) -> &'static str {
        match self {
            HighlightColor::Yellow => "yellow",
            HighlightColor::Green => "green",
            HighlightColor::Blue => "blue",
            HighlightColor::Pink => "pink",
        }
    }
}

/// Byte range selected in a section's content. Always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    start: usize,
    end: usize,
}

impl Selection {
    pub fn new(start: usize, end: usize) -> Self {
        Self {
            start: start.min(end),
            end: start.max(end),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn is_collapsed(&self) -> bool {
        self.start == self.end
    }
}

/// A reviewer-marked span of section text with a comment thread.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub id: String,
    pub section: String,
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub color: HighlightColor,
    pub comments: Vec<String>,
}

/// Which guidelines the backend should apply during analysis.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidelinesPreference {
    #[default]
    Both,
    NewOnly,
    OldOnly,
}

impl GuidelinesPreference {
    pub fn as_str(self) -> &'static str {
        match self {
            GuidelinesPreference::Both => "both",
            GuidelinesPreference::NewOnly => "new_only",
            GuidelinesPreference::OldOnly => "old_only",
        }
    }
}

/// Aggregate counts from `/get_statistics`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub total_feedback: u64,
    #[serde(default)]
    pub high_risk: u64,
    #[serde(default)]
    pub medium_risk: u64,
    #[serde(default)]
    pub low_risk: u64,
    #[serde(default)]
    pub accepted: u64,
    #[serde(default)]
    pub rejected: u64,
    #[serde(default)]
    pub user_added: u64,
}

/// One entry of the backend's activity log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActivityEntry {
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub details: String,
}

/// Dashboard snapshot from `/get_dashboard_data`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    #[serde(default)]
    pub total_feedback: u64,
    #[serde(default)]
    pub accepted_feedback: u64,
    #[serde(default)]
    pub rejected_feedback: u64,
    #[serde(default)]
    pub user_feedback: u64,
    #[serde(default)]
    pub sections_analyzed: u64,
    #[serde(default)]
    pub total_documents: u64,
    #[serde(default)]
    pub recent_activity: Vec<ActivityEntry>,
}

/// Result of `/complete_review`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompletedReview {
    #[serde(default)]
    pub comments_count: u64,
    pub output_file: String,
}

/// Rating and comment about the tool itself, sent to `/submit_tool_feedback`.
///
/// Not tied to the review: it can be sent without a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolFeedback {
    /// 1 (very poor) to 5 (excellent).
    pub rating: u8,
    pub feedback: String,
    pub timestamp: String,
    pub session_id: Option<String>,
}

/// Highest tool rating.
pub const MAX_TOOL_RATING: u8 = 5;

/// Speaker of a chat transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    pub section: Option<String>,
}

/// Downloadable artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadKind {
    /// The commented document produced by `/complete_review`.
    ReviewedDocument(String),
    Guidelines,
    /// Statistics export in the given format (e.g. `"json"`, `"csv"`).
    Statistics(String),
    /// User feedback export in the given format.
    UserFeedback(String),
}

impl DownloadKind {
    /// Suggested local file name for the downloaded bytes.
    pub fn file_name(&self) -> String {
        match self {
            DownloadKind::ReviewedDocument(name) => name.clone(),
            DownloadKind::Guidelines => "Hawkeye_Guidelines.txt".to_owned(),
            DownloadKind::Statistics(fmt) => format!("statistics.{fmt}"),
            DownloadKind::UserFeedback(fmt) => format!("user_feedback.{fmt}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_item_accepts_numeric_refs_and_clamps_confidence() {
        let item: FeedbackItem = serde_json::from_value(serde_json::json!({
            "id": "f1",
            "type": "critical",
            "category": "Timeline",
            "risk_level": "High",
            "description": "Gap in timeline",
            "hawkeye_refs": [1, "11", 12],
            "confidence": 1.7
        }))
        .unwrap();
        assert_eq!(item.kind, FeedbackType::Critical);
        assert_eq!(item.risk_level, RiskLevel::High);
        assert_eq!(item.hawkeye_refs, vec!["1", "11", "12"]);
        assert_eq!(item.confidence, 1.0);
        assert_eq!(item.decision, Decision::Pending);
    }

    #[test]
    fn unknown_feedback_type_falls_back_to_suggestion() {
        let item: FeedbackItem =
            serde_json::from_value(serde_json::json!({"id": "f2", "type": "nitpick"})).unwrap();
        assert_eq!(item.kind, FeedbackType::Suggestion);
        assert_eq!(item.risk_level, RiskLevel::Low);
    }

    #[test]
    fn feedback_type_uses_lowercase_wire_names() {
        for kind in FeedbackType::ALL {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
            let back: FeedbackType = serde_json::from_value(serde_json::json!(kind.as_str())).unwrap();
            assert_eq!(back, kind);
        }
        assert_eq!(FeedbackType::default(), FeedbackType::Suggestion);
    }

    #[test]
    fn selection_normalises_reversed_bounds() {
        let sel = Selection::new(9, 3);
        assert_eq!((sel.start(), sel.end()), (3, 9));
        assert!(Selection::new(4, 4).is_collapsed());
    }
}
