//! Section list panel.
//!
//! One row per section of the session with its analysis status and the
//! number of feedback items once analyzed. The current section is marked;
//! the `ListState` selection is only a cursor until Enter opens it.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
};

use prism_core::types::SectionStatus;

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_sections(
    frame: &mut Frame,
    area: Rect,
    focus: PanelFocus,
    state: &mut AppState,
    theme: &Theme,
) {
    let is_focused = focus == PanelFocus::Sections;
    let names = state.review.section_names();
    let title = if names.is_empty() {
        "Sections".to_owned()
    } else {
        format!("Sections ({})", names.len())
    };
    let block = panel_block(title, is_focused, theme);

    let items: Vec<ListItem> = if names.is_empty() {
        let msg = if state.review.session().is_some() {
            "No sections"
        } else {
            "No document"
        };
        vec![ListItem::new(Line::raw(msg))]
    } else {
        let current = state.review.current_index();
        names
            .iter()
            .enumerate()
            .map(|(i, name)| section_item(state, name, current == Some(i), theme))
            .collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::REVERSED));

    frame.render_stateful_widget(list, area, &mut state.section_list_state);
}

fn section_item(state: &AppState, name: &str, is_current: bool, theme: &Theme) -> ListItem<'static> {
    let status = state.review.section_status(name);
    let glyph = match status {
        SectionStatus::Pending => "○",
        SectionStatus::Analyzing => "◌",
        SectionStatus::Analyzed => "●",
        SectionStatus::Failed => "✗",
    };
    let marker = if is_current { "▶ " } else { "  " };

    let mut spans = vec![
        Span::raw(marker),
        Span::styled(
            format!("{glyph} "),
            Style::default().fg(theme.section_status(status)),
        ),
    ];
    let name_style = if is_current {
        Style::default().fg(theme.text).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.text)
    };
    spans.push(Span::styled(name.to_owned(), name_style));

    if let Some(record) = state.review.record(name) {
        if status == SectionStatus::Analyzed {
            spans.push(Span::styled(
                format!("  {}", record.feedback_items.len()),
                Style::default().fg(theme.text_muted),
            ));
        }
    }
    ListItem::new(Line::from(spans))
}
