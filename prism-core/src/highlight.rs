//! Highlight manager.
//!
//! Highlights are byte ranges over a section's content. They never overlap
//! partially: a new selection must either avoid every existing highlight or
//! is rejected, which keeps [`HighlightManager::segments`] a clean partition
//! of the content.

use crate::error::{Result, ReviewError};
use crate::types::{Highlight, HighlightColor, Selection};

/// A run of section content, either plain or covered by one highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    pub text: &'a str,
    pub highlight: Option<(&'a str, HighlightColor)>,
}

#[derive(Debug, Default)]
pub struct HighlightManager {
    highlights: Vec<Highlight>,
}

impl HighlightManager {
    /// Wraps `selection` of `content` in a new highlight.
    ///
    /// The selection must be non-empty, inside `content`, on character
    /// boundaries, and must not cross an existing highlight.
    pub fn create(
        &mut self,
        section: &str,
        content: &str,
        selection: Selection,
        color: HighlightColor,
    ) -> Result<&Highlight> {
        if selection.is_collapsed() {
            return Err(ReviewError::EmptySelection);
        }
        if selection.end() > content.len() {
            return Err(ReviewError::InvalidSelection(
                "selection extends past the end of the section".to_owned(),
            ));
        }
        if !content.is_char_boundary(selection.start())
            || !content.is_char_boundary(selection.end())
        {
            return Err(ReviewError::InvalidSelection(
                "selection splits a character".to_owned(),
            ));
        }
        let text = &content[selection.start()..selection.end()];
        if text.trim().is_empty() {
            return Err(ReviewError::EmptySelection);
        }
        let crosses = self
            .for_section(section)
            .any(|h| selection.start() < h.end && h.start < selection.end());
        if crosses {
            return Err(ReviewError::InvalidSelection(
                "selection overlaps an existing highlight".to_owned(),
            ));
        }

        let highlight = Highlight {
            id: format!("highlight_{}", uuid::Uuid::new_v4().simple()),
            section: section.to_owned(),
            start: selection.start(),
            end: selection.end(),
            text: text.to_owned(),
            color,
            comments: Vec::new(),
        };
        tracing::debug!(id = %highlight.id, section, "highlight created");
        let idx = self.highlights.len();
        self.highlights.push(highlight);
        Ok(&self.highlights[idx])
    }

    pub fn get(&self, id: &str) -> Option<&Highlight> {
        self.highlights.iter().find(|h| h.id == id)
    }

    pub fn for_section<'a>(&'a self, section: &'a str) -> impl Iterator<Item = &'a Highlight> {
        self.highlights.iter().filter(move |h| h.section == section)
    }

    pub fn add_comment(&mut self, id: &str, comment: &str) -> Result<()> {
        let highlight = self
            .highlights
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| ReviewError::HighlightNotFound(id.to_owned()))?;
        highlight.comments.push(comment.to_owned());
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Result<Highlight> {
        let pos = self
            .highlights
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| ReviewError::HighlightNotFound(id.to_owned()))?;
        Ok(self.highlights.remove(pos))
    }

    /// Removes every highlight of `section`. Destructive, so the caller must
    /// pass `confirmed = true`. Returns the removed ids.
    pub fn clear_all(&mut self, section: &str, confirmed: bool) -> Result<Vec<String>> {
        if !confirmed {
            return Err(ReviewError::ConfirmationRequired);
        }
        let mut removed = Vec::new();
        self.highlights.retain(|h| {
            if h.section == section {
                removed.push(h.id.clone());
                false
            } else {
                true
            }
        });
        Ok(removed)
    }

    pub fn clear(&mut self) {
        self.highlights.clear();
    }

    /// Splits `content` into plain and highlighted runs for rendering.
    ///
    /// Concatenating the returned texts always reproduces `content`.
    /// Highlights that no longer fit the content are skipped.
    pub fn segments<'a>(&'a self, section: &str, content: &'a str) -> Vec<Segment<'a>> {
        let mut marks: Vec<&Highlight> = self
            .highlights
            .iter()
            .filter(|h| {
                h.section == section
                    && h.end <= content.len()
                    && content.is_char_boundary(h.start)
                    && content.is_char_boundary(h.end)
            })
            .collect();
        marks.sort_by_key(|h| h.start);

        let mut out = Vec::with_capacity(marks.len() * 2 + 1);
        let mut cursor = 0;
        for h in marks {
            if h.start < cursor {
                continue;
            }
            if h.start > cursor {
                out.push(Segment {
                    text: &content[cursor..h.start],
                    highlight: None,
                });
            }
            out.push(Segment {
                text: &content[h.start..h.end],
                highlight: Some((h.id.as_str(), h.color)),
            });
            cursor = h.end;
        }
        if cursor < content.len() {
            out.push(Segment {
                text: &content[cursor..],
                highlight: None,
            });
        }
        out
    }
}
