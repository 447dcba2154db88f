//! Custom feedback ledger: reviewer-authored entries in insertion order.

use crate::types::{CustomFeedbackEntry, FeedbackLink};

#[derive(Debug, Default)]
pub struct CustomFeedbackLedger {
    entries: Vec<CustomFeedbackEntry>,
}

impl CustomFeedbackLedger {
    pub fn append(&mut self, entry: CustomFeedbackEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[CustomFeedbackEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn for_section<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a CustomFeedbackEntry> {
        self.entries.iter().filter(move |e| e.section == section)
    }

    pub fn for_item<'a>(&'a self, ai_id: &'a str) -> impl Iterator<Item = &'a CustomFeedbackEntry> {
        self.entries
            .iter()
            .filter(move |e| matches!(&e.link, Some(FeedbackLink::AiItem(id)) if id == ai_id))
    }

    pub fn count_for_item(&self, ai_id: &str) -> usize {
        self.for_item(ai_id).count()
    }

    pub fn count_for_section(&self, section: &str) -> usize {
        self.for_section(section).count()
    }

    /// Removes one entry by id.
    pub fn remove(&mut self, id: &str) -> Option<CustomFeedbackEntry> {
        let pos = self.entries.iter().position(|e| e.id == id)?;
        Some(self.entries.remove(pos))
    }

    /// Removes every entry linked to AI item `ai_id` and returns them.
    pub fn clear_for_item(&mut self, ai_id: &str) -> Vec<CustomFeedbackEntry> {
        self.remove_where(|e| matches!(&e.link, Some(FeedbackLink::AiItem(id)) if id == ai_id))
    }

    /// Removes every entry of `section` and returns them.
    pub fn clear_for_section(&mut self, section: &str) -> Vec<CustomFeedbackEntry> {
        self.remove_where(|e| e.section == section)
    }

    /// Removes every entry linked to one of `highlight_ids`.
    pub fn clear_for_highlights(&mut self, highlight_ids: &[String]) -> Vec<CustomFeedbackEntry> {
        self.remove_where(|e| {
            matches!(&e.link, Some(FeedbackLink::Highlight(id)) if highlight_ids.contains(id))
        })
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    fn remove_where<F>(&mut self, mut pred: F) -> Vec<CustomFeedbackEntry>
    where
        F: FnMut(&CustomFeedbackEntry) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) = self.entries.drain(..).partition(|e| pred(e));
        self.entries = kept;
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FeedbackType;

    fn entry(id: &str, section: &str, link: Option<FeedbackLink>) -> CustomFeedbackEntry {
        CustomFeedbackEntry {
            id: id.into(),
            section: section.into(),
            kind: FeedbackType::Suggestion,
            category: "General".into(),
            description: format!("note {id}"),
            timestamp: "2026-01-01T00:00:00Z".into(),
            link,
            ai_reference: None,
        }
    }

    #[test]
    fn clear_for_section_only_touches_that_section() {
        let mut ledger = CustomFeedbackLedger::default();
        ledger.append(entry("1", "Intro", None));
        ledger.append(entry("2", "Findings", None));
        ledger.append(entry("3", "Intro", Some(FeedbackLink::AiItem("X".into()))));

        let removed = ledger.clear_for_section("Intro");
        assert_eq!(removed.len(), 2);
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.entries()[0].id, "2");
    }

    #[test]
    fn counts_and_item_clear() {
        let mut ledger = CustomFeedbackLedger::default();
        ledger.append(entry("1", "Findings", Some(FeedbackLink::AiItem("X".into()))));
        ledger.append(entry("2", "Findings", None));
        ledger.append(entry("3", "Findings", Some(FeedbackLink::Highlight("X".into()))));
        assert_eq!(ledger.count_for_item("X"), 1);
        assert_eq!(ledger.count_for_section("Findings"), 3);

        assert_eq!(ledger.clear_for_item("X").len(), 1);
        assert_eq!(ledger.count_for_section("Findings"), 2);
        assert_eq!(ledger.clear_for_highlights(&["X".to_owned()]).len(), 1);
        assert_eq!(ledger.entries()[0].id, "2");
    }
}
