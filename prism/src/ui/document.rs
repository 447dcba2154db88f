//! Document panel renderer.
//!
//! Shows the content of the current section with highlights painted in their
//! colors, the cursor line, and the visual selection. Only the visible window
//! of lines is turned into `ListItem`s per frame.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem, Paragraph, Wrap},
};

use prism_core::highlight::Segment;
use prism_core::types::SectionStatus;

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_document(
    frame: &mut Frame,
    area: Rect,
    focus: PanelFocus,
    state: &mut AppState,
    theme: &Theme,
) {
    let is_focused = focus == PanelFocus::Document;
    let title = match state.review.current_section() {
        Some(name) => format!("Document · {name}"),
        None => "Document".to_owned(),
    };
    let block = panel_block(title, is_focused, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let Some(section) = state.review.current_section().map(str::to_owned) else {
        let msg = if state.review.session().is_some() {
            "Select a section (Enter in the section list, n / p to step)."
        } else {
            "No document loaded. Press o to open a .docx file."
        };
        render_message(frame, inner, msg, theme);
        return;
    };

    let status = state.review.section_status(&section);
    let lines = match state.review.record(&section) {
        Some(record) if status == SectionStatus::Analyzed || !record.content.is_empty() => {
            if record.content.is_empty() {
                render_message(frame, inner, "(empty section)", theme);
                return;
            }
            let segments = state.review.highlights().segments(&section, &record.content);
            segment_lines(&segments, theme)
        }
        _ => {
            let msg = match status {
                SectionStatus::Failed => {
                    let reason = state
                        .review
                        .record(&section)
                        .and_then(|r| r.last_error.clone())
                        .unwrap_or_else(|| "unknown error".to_owned());
                    format!("Analysis failed: {reason}\n\nPress R to retry.")
                }
                _ => format!("Analyzing '{section}'..."),
            };
            render_message(frame, inner, &msg, theme);
            return;
        }
    };

    let viewport_height = usize::from(inner.height);
    let total = lines.len();
    // Keep the cursor on screen after resizes.
    if state.doc_cursor >= state.doc_scroll + viewport_height.max(1) {
        state.doc_scroll = state.doc_cursor + 1 - viewport_height.max(1);
    }
    let visible_start = state.doc_scroll.min(total.saturating_sub(1));
    let visible_end = (visible_start + viewport_height).min(total);

    let selection = (state.mode == Mode::Visual).then(|| state.visual_range());
    let items: Vec<ListItem> = lines[visible_start..visible_end]
        .iter()
        .enumerate()
        .map(|(offset, line)| {
            let index = visible_start + offset;
            let mut style = Style::default();
            if let Some((first, last)) = selection {
                if (first..=last).contains(&index) {
                    style = style.bg(theme.selection_bg);
                }
            }
            if is_focused && index == state.doc_cursor {
                style = style.bg(theme.cursor_line_bg).add_modifier(Modifier::BOLD);
            }
            ListItem::new(line.clone()).style(style)
        })
        .collect();

    frame.render_widget(List::new(items), inner);
}

/// Splits highlight segments into display lines, keeping each highlight's
/// background across line breaks.
fn segment_lines(segments: &[Segment<'_>], theme: &Theme) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    for segment in segments {
        let style = match segment.highlight {
            Some((_, color)) => Style::default().bg(theme.highlight(color)).fg(theme.highlight_fg),
            None => Style::default().fg(theme.text),
        };
        let mut pieces = segment.text.split('\n');
        if let Some(first) = pieces.next() {
            if !first.is_empty() {
                current.push(Span::styled(first.to_owned(), style));
            }
        }
        for piece in pieces {
            lines.push(Line::from(std::mem::take(&mut current)));
            if !piece.is_empty() {
                current.push(Span::styled(piece.to_owned(), style));
            }
        }
    }
    lines.push(Line::from(current));
    lines
}

fn render_message(frame: &mut Frame, area: Rect, msg: &str, theme: &Theme) {
    frame.render_widget(
        Paragraph::new(msg.to_owned())
            .style(Style::default().fg(theme.text_muted))
            .wrap(Wrap { trim: false }),
        area,
    );
}
