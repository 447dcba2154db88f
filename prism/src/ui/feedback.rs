//! Right panel: feedback items and custom entries, or the chat transcript.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{List, ListItem, Paragraph, Wrap},
};

use prism_core::types::{
    ChatRole, CustomFeedbackEntry, Decision, FeedbackItem, FeedbackLink, SectionStatus,
};

use crate::app::{AppState, FeedbackRow, PanelFocus, RightView};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

pub fn render_right_panel(
    frame: &mut Frame,
    area: Rect,
    focus: PanelFocus,
    state: &mut AppState,
    theme: &Theme,
) {
    match state.right_view {
        RightView::Feedback => render_feedback(frame, area, focus, state, theme),
        RightView::Chat => render_chat(frame, area, focus, state, theme),
    }
}

fn render_feedback(
    frame: &mut Frame,
    area: Rect,
    focus: PanelFocus,
    state: &mut AppState,
    theme: &Theme,
) {
    let is_focused = focus == PanelFocus::Feedback;
    let rows = state.feedback_rows();

    let title = match state.review.current_record() {
        Some(record) => {
            let accepted = count(&record.feedback_items, Decision::Accepted);
            let rejected = count(&record.feedback_items, Decision::Rejected);
            format!(
                "Feedback ({})  ✓{accepted} ✗{rejected}",
                record.feedback_items.len()
            )
        }
        None => "Feedback".to_owned(),
    };
    let block = panel_block(title, is_focused, theme);

    let items: Vec<ListItem> = if rows.is_empty() {
        let msg = match state.review.current_section() {
            Some(s) if state.review.section_status(s) == SectionStatus::Analyzed => {
                "No feedback for this section. C adds your own."
            }
            Some(_) => "Waiting for analysis...",
            None => "No section open",
        };
        vec![ListItem::new(Line::raw(msg))]
    } else {
        let section = state.review.current_section().unwrap_or_default();
        rows.iter()
            .filter_map(|row| match row {
                FeedbackRow::Item(id) => state
                    .review
                    .feedback_item(section, id)
                    .map(|item| item_row(state, item, theme)),
                FeedbackRow::Custom(id) => state
                    .review
                    .ledger()
                    .entries()
                    .iter()
                    .find(|e| &e.id == id)
                    .map(|entry| custom_row(entry, theme)),
            })
            .collect()
    };

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(theme.cursor_line_bg))
        .highlight_symbol("› ");

    frame.render_stateful_widget(list, area, &mut state.feedback_state);
}

fn count(items: &[FeedbackItem], decision: Decision) -> usize {
    items.iter().filter(|i| i.decision == decision).count()
}

fn item_row(state: &AppState, item: &FeedbackItem, theme: &Theme) -> ListItem<'static> {
    let badge = if state.review.is_decision_in_flight(&item.id) {
        Span::styled("[…] ", Style::default().fg(theme.section_analyzing))
    } else {
        let mark = match item.decision {
            Decision::Accepted => "[✓] ",
            Decision::Rejected => "[✗] ",
            Decision::Pending => "[ ] ",
        };
        Span::styled(mark, Style::default().fg(theme.decision(item.decision)))
    };

    let header = Line::from(vec![
        badge,
        Span::styled(
            format!("{:<6} ", item.risk_level.as_str()),
            Style::default()
                .fg(theme.risk(item.risk_level))
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!("{} ", item.kind.as_str()),
            Style::default().fg(theme.feedback_type(item.kind)),
        ),
        Span::styled(item.category.clone(), Style::default().fg(theme.text_muted)),
    ]);

    let mut lines = vec![
        header,
        Line::styled(format!("    {}", item.description), Style::default().fg(theme.text)),
    ];
    if let Some(suggestion) = &item.suggestion {
        lines.push(Line::styled(
            format!("    → {suggestion}"),
            Style::default().fg(theme.text_muted),
        ));
    }
    if !item.hawkeye_refs.is_empty() {
        lines.push(Line::styled(
            format!("    Hawkeye #{}", item.hawkeye_refs.join(", #")),
            Style::default().fg(theme.text_muted),
        ));
    }
    ListItem::new(Text::from(lines))
}

fn custom_row(entry: &CustomFeedbackEntry, theme: &Theme) -> ListItem<'static> {
    let origin = match &entry.link {
        Some(FeedbackLink::AiItem(_)) => "  ↳ ",
        Some(FeedbackLink::Highlight(_)) => "  ✎ ",
        None => "  + ",
    };
    let mut lines = vec![Line::from(vec![
        Span::styled(origin, Style::default().fg(theme.custom_entry)),
        Span::styled(
            format!("{} ", entry.kind.as_str()),
            Style::default().fg(theme.feedback_type(entry.kind)),
        ),
        Span::styled(entry.description.clone(), Style::default().fg(theme.custom_entry)),
    ])];
    if let (Some(FeedbackLink::Highlight(_)), Some(quote)) = (&entry.link, &entry.ai_reference) {
        lines.push(Line::styled(
            format!("      \"{}\"", quote.lines().next().unwrap_or_default()),
            Style::default().fg(theme.text_muted),
        ));
    }
    ListItem::new(Text::from(lines))
}

fn render_chat(
    frame: &mut Frame,
    area: Rect,
    focus: PanelFocus,
    state: &mut AppState,
    theme: &Theme,
) {
    let is_focused = focus == PanelFocus::Feedback;
    let block = panel_block("Chat", is_focused, theme);
    let inner = inner_rect(area);
    frame.render_widget(block, area);

    let messages = state.review.chat();
    if messages.is_empty() {
        frame.render_widget(
            Paragraph::new("Ask about the document with i.")
                .style(Style::default().fg(theme.text_muted)),
            inner,
        );
        return;
    }

    let mut lines = Vec::new();
    for message in messages {
        let (who, color) = match message.role {
            ChatRole::User => ("you", theme.border_active),
            ChatRole::Assistant => ("prism", theme.notice_success),
        };
        lines.push(Line::styled(
            who,
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ));
        for text in message.content.lines() {
            lines.push(Line::styled(text.to_owned(), Style::default().fg(theme.text)));
        }
        lines.push(Line::raw(""));
    }

    // Rough wrapped height so that scrolling stops at the last line.
    let width = usize::from(inner.width.max(1));
    let wrapped: usize = lines.iter().map(|l| l.width().div_ceil(width).max(1)).sum();
    let max_scroll = wrapped.saturating_sub(usize::from(inner.height));
    state.chat_scroll = state
        .chat_scroll
        .min(u16::try_from(max_scroll).unwrap_or(u16::MAX));

    frame.render_widget(
        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((state.chat_scroll, 0)),
        inner,
    );
}
