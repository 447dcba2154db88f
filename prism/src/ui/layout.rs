//! Responsive 3-panel layout engine for prism.
//!
//! Pure layout arithmetic plus the two one-row bars (input line and status
//! bar). Called inside `terminal.draw()` on every render so each frame
//! reflects the current terminal size.
//!
//! # Panel geometry
//!
//! At `>= 100` columns all three panels are visible with widths driven by
//! `AppState.left_pct / center_pct / right_pct` (defaults 20 / 50 / 30).
//! Below that only the focused panel is shown, at full width.
//!
//! `Spacing::Overlap(1)` combined with `Block::merge_borders(MergeStrategy::Fuzzy)`
//! makes adjacent panel borders share a single column.

use prism_core::types::MAX_TOOL_RATING;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph},
};

use crate::app::{AppState, Mode, PanelFocus};
use crate::theme::Theme;

/// Narrowest terminal that shows all three panels.
const WIDE_LAYOUT_COLS: u16 = 100;

/// Returns `[left, center, right, input_line, status_bar]` for the current frame.
///
/// The input line has zero height outside Insert mode. Collapsed panels have
/// zero width and must not be rendered.
pub fn compute_layout(frame: &Frame, state: &AppState) -> [Rect; 5] {
    let term_width = frame.area().width;
    let input_height = u16::from(matches!(state.mode, Mode::Insert(_)));

    let [main_area, input_line, status_bar] = frame.area().layout(&Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(input_height),
        Constraint::Length(1),
    ]));

    let horizontal = if term_width >= WIDE_LAYOUT_COLS {
        Layout::horizontal([
            Constraint::Percentage(state.left_pct),
            Constraint::Percentage(state.center_pct),
            Constraint::Percentage(state.right_pct),
        ])
    } else {
        let width = |panel: PanelFocus| {
            if state.focus == panel {
                Constraint::Fill(1)
            } else {
                Constraint::Length(0)
            }
        };
        Layout::horizontal([
            width(PanelFocus::Sections),
            width(PanelFocus::Document),
            width(PanelFocus::Feedback),
        ])
    };

    let [left, center, right] = main_area.layout(&horizontal.spacing(Spacing::Overlap(1)));

    [left, center, right, input_line, status_bar]
}

/// Returns the inner `Rect` of a panel after removing the 1-cell border on each side.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Builds a bordered `Block` for a panel.
///
/// Focused panels get `BorderType::Thick`. `MergeStrategy::Fuzzy` is required
/// because `Exact` produces wrong junctions when `Thick` meets `Plain`.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let border_style = if is_focused {
        Style::default().fg(theme.border_active)
    } else {
        Style::default().fg(theme.border_inactive)
    };
    let border_type = if is_focused { BorderType::Thick } else { BorderType::Plain };

    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(border_style)
        .merge_borders(MergeStrategy::Fuzzy)
}

/// Renders the input line shown while in Insert mode.
pub fn render_input_line(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let Mode::Insert(target) = &state.mode else {
        return;
    };
    let mut spans = vec![Span::styled(
        format!(" {}", target.prompt()),
        Style::default()
            .fg(theme.status_mode_insert)
            .add_modifier(Modifier::BOLD),
    )];
    match target {
        crate::app::InputTarget::CustomFeedback { .. } => spans.push(Span::styled(
            format!(" [{}]", state.custom_kind.as_str()),
            Style::default().fg(theme.feedback_type(state.custom_kind)),
        )),
        crate::app::InputTarget::ToolFeedback => spans.push(Span::styled(
            format!(" {}", stars(state.tool_rating)),
            Style::default().fg(theme.risk_medium),
        )),
        _ => {}
    }
    spans.push(Span::raw(": "));
    spans.push(Span::styled(state.input.as_str(), Style::default().fg(theme.text)));
    spans.push(Span::styled("█", Style::default().fg(theme.text_muted)));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Filled then empty stars, e.g. `★★★☆☆` for 3.
fn stars(rating: u8) -> String {
    let filled = usize::from(rating.min(MAX_TOOL_RATING));
    let empty = usize::from(MAX_TOOL_RATING) - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

/// Renders the 1-row status bar at the bottom of the terminal.
///
/// Left to right: mode indicator, document and section position, pending
/// request count, then the current notice.
pub fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let (mode_text, mode_fg) = match state.mode {
        Mode::Insert(_) => (" INSERT ", theme.status_mode_insert),
        Mode::Visual => (" VISUAL ", theme.status_mode_visual),
        Mode::Normal
        | Mode::HelpOverlay
        | Mode::Confirm(_)
        | Mode::Stats
        | Mode::Tutorial => (" NORMAL ", theme.status_mode_normal),
    };

    let mut spans = vec![Span::styled(
        mode_text,
        Style::default().fg(mode_fg).add_modifier(Modifier::BOLD),
    )];

    match state.review.session() {
        Some(session) => {
            let name = if session.document_name.is_empty() {
                "(no document)"
            } else {
                session.document_name.as_str()
            };
            spans.push(Span::raw(format!(" {name} ")));
            if let Some(index) = state.review.current_index() {
                spans.push(Span::raw(format!(
                    "§ {}/{} ",
                    index + 1,
                    session.section_count()
                )));
            }
        }
        None => spans.push(Span::raw(" no session (o to open) ")),
    }

    if state.in_flight > 0 {
        spans.push(Span::styled(
            format!("⟳ {} ", state.in_flight),
            Style::default().fg(theme.section_analyzing),
        ));
    }

    if let Some(notice) = &state.notice {
        spans.push(Span::raw("│ "));
        spans.push(Span::styled(
            notice.message.as_str(),
            Style::default().fg(theme.notice(notice.level)),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .style(Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg)),
        area,
    );
}
