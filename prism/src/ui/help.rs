//! Modal overlays: help, first-run tutorial, confirmation, and statistics.
//!
//! Each overlay is drawn inside the same `terminal.draw()` closure as the
//! panels: `Clear` erases the area first, then a bordered `Paragraph` goes on
//! top.

use ratatui::{
    Frame,
    layout::Constraint,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
};

use crate::app::{AppState, ConfirmAction, TUTORIAL_PAGES};
use crate::theme::Theme;

/// Renders the help overlay as a centred modal on top of the panels.
///
/// Skipped on terminals narrower than 60 columns to avoid a zero-height `Rect`.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }
    let area = frame
        .area()
        .centered(Constraint::Percentage(80), Constraint::Percentage(80));
    frame.render_widget(Clear, area);

    let block = Block::bordered()
        .title(" Help  · j/k scroll, ? or Esc to dismiss ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(build_help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        area,
    );
}

fn build_help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Navigation"),
        Line::from("  j / k         Move down / up in the focused panel"),
        Line::from("  g / G         Jump to top / bottom"),
        Line::from("  Ctrl-d / u    Half page down / up"),
        Line::from("  Ctrl-f / b    Full page down / up"),
        Line::from("  H / L         Move panel focus left / right"),
        Line::from("  < / >         Shrink / grow the document panel"),
        Line::from(""),
        Line::from("Sections"),
        Line::from("  Enter         Open the selected section"),
        Line::from("  n / p         Next / previous section"),
        Line::from("  R             Retry a failed analysis, or re-analyze"),
        Line::from(""),
        Line::from("Feedback"),
        Line::from("  a / r / u     Accept / reject / revert the selected item"),
        Line::from("  U             Revert every decision"),
        Line::from("  c             Comment on the selected item"),
        Line::from("  C             Add feedback for the section"),
        Line::from("  t             Cycle the type of new feedback"),
        Line::from("  d             Delete the selected entry (or an item's entries)"),
        Line::from("  D             Delete all your entries in the section"),
        Line::from("  Tab           Switch between feedback and chat"),
        Line::from(""),
        Line::from("Document"),
        Line::from("  v             Start a line selection; Enter highlights it"),
        Line::from("  Tab (visual)  Cycle highlight color"),
        Line::from("  m             Comment on the highlight under the cursor"),
        Line::from("  x             Remove the highlight under the cursor"),
        Line::from("  X             Remove every highlight in the section"),
        Line::from(""),
        Line::from("Review"),
        Line::from("  o             Open (upload) a .docx document"),
        Line::from("  i             Ask the assistant about the document"),
        Line::from("  s             Statistics and dashboard"),
        Line::from("  F             Complete the review"),
        Line::from("  w             Download the reviewed document"),
        Line::from("  e / E         Export your feedback (csv) / statistics (json)"),
        Line::from("  Z             Reset the session"),
        Line::from("  K             Delete the document, keep guidelines"),
        Line::from(""),
        Line::from("General"),
        Line::from("  T             Toggle dark / light theme"),
        Line::from("  f             Rate prism; Tab changes the stars"),
        Line::from("  ?             Open / close this help overlay"),
        Line::from("  q / Esc       Quit (confirms while a review is open)"),
    ])
}

/// Renders the first-run tutorial, one page at a time.
pub fn render_tutorial(frame: &mut Frame, theme: &Theme, page: usize) {
    let area = frame
        .area()
        .centered(Constraint::Percentage(60), Constraint::Percentage(50));
    frame.render_widget(Clear, area);

    let (heading, body): (&str, &[&str]) = match page {
        0 => (
            "Welcome to AI-Prism",
            &[
                "Upload a Word document and AI-Prism analyses it one section at a time.",
                "",
                "Sections are analysed the first time you open them.",
                "Coming back to a section shows the stored result.",
            ],
        ),
        1 => (
            "Reviewing feedback",
            &[
                "Each feedback item has a risk level and a type.",
                "",
                "Accept (a) or reject (r) it. To change your mind,",
                "revert it first (u).",
            ],
        ),
        2 => (
            "Your own feedback",
            &[
                "Add comments to an item (c) or the section (C).",
                "",
                "Select lines in the document (v), highlight them (Enter),",
                "then comment on the highlight (m).",
            ],
        ),
        _ => (
            "Finishing up",
            &[
                "Complete the review (F) to write accepted feedback into the document,",
                "then download it (w).",
                "",
                "Press ? at any time for the full list of keys.",
            ],
        ),
    };

    let mut lines = vec![
        Line::styled(
            heading,
            Style::default()
                .fg(theme.border_active)
                .add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
    ];
    lines.extend(body.iter().map(|l| Line::raw(*l)));

    let block = Block::bordered()
        .title(format!(
            " Tutorial {}/{}  · Enter next, Backspace back, Esc skip ",
            page + 1,
            TUTORIAL_PAGES
        ))
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

/// Renders a small y/n dialog for `action`.
pub fn render_confirm(frame: &mut Frame, theme: &Theme, action: ConfirmAction) {
    let area = frame
        .area()
        .centered(Constraint::Length(56), Constraint::Length(5));
    frame.render_widget(Clear, area);

    let block = Block::bordered()
        .title(" Confirm ")
        .border_style(Style::default().fg(theme.notice_warning));
    let text = Text::from(vec![
        Line::raw(action.question()),
        Line::raw(""),
        Line::from(vec![
            Span::styled("y", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" yes   "),
            Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" no"),
        ]),
    ]);
    frame.render_widget(
        Paragraph::new(text).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

/// Renders statistics, the dashboard, and the local decision summary.
pub fn render_stats(frame: &mut Frame, state: &AppState, theme: &Theme) {
    let area = frame
        .area()
        .centered(Constraint::Percentage(60), Constraint::Percentage(70));
    frame.render_widget(Clear, area);

    let heading = |text: &'static str| {
        Line::styled(
            text,
            Style::default()
                .fg(theme.border_active)
                .add_modifier(Modifier::BOLD),
        )
    };
    let row = |label: &str, value: String| Line::raw(format!("  {label:<22}{value}"));

    let summary = state.review.summary();
    let mut lines = vec![
        heading("This session"),
        row("Feedback items", summary.total.to_string()),
        row("Accepted", summary.accepted.to_string()),
        row("Rejected", summary.rejected.to_string()),
        row("Pending", summary.pending.to_string()),
        row(
            "Risk high / med / low",
            format!(
                "{} / {} / {}",
                summary.high_risk, summary.medium_risk, summary.low_risk
            ),
        ),
        row("Your entries", state.review.ledger().len().to_string()),
        Line::raw(""),
        heading("Server statistics"),
    ];

    match state.review.statistics() {
        Some(stats) => {
            lines.push(row("Total feedback", stats.total_feedback.to_string()));
            lines.push(row(
                "Risk high / med / low",
                format!("{} / {} / {}", stats.high_risk, stats.medium_risk, stats.low_risk),
            ));
            lines.push(row("Accepted", stats.accepted.to_string()));
            lines.push(row("Rejected", stats.rejected.to_string()));
            lines.push(row("User added", stats.user_added.to_string()));
        }
        None => lines.push(Line::styled("  loading...", Style::default().fg(theme.text_muted))),
    }

    lines.push(Line::raw(""));
    lines.push(heading("Dashboard"));
    match state.review.dashboard() {
        Some(dashboard) => {
            lines.push(row("Sections analyzed", dashboard.sections_analyzed.to_string()));
            lines.push(row("Documents", dashboard.total_documents.to_string()));
            for entry in dashboard.recent_activity.iter().take(5) {
                lines.push(Line::styled(
                    format!("  {}  {} {}", entry.timestamp, entry.action, entry.details),
                    Style::default().fg(theme.text_muted),
                ));
            }
        }
        None => lines.push(Line::styled("  loading...", Style::default().fg(theme.text_muted))),
    }

    if let Some(completed) = state.review.completed() {
        lines.push(Line::raw(""));
        lines.push(heading("Completed review"));
        lines.push(row("Output file", completed.output_file.clone()));
        lines.push(row("Comments added", completed.comments_count.to_string()));
    }

    let block = Block::bordered()
        .title(" Statistics  · s or Esc to close ")
        .border_style(Style::default().fg(theme.border_active));
    frame.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}
