//! UI rendering module for prism.
//!
//! `render()` is the single entry point called by the event loop's
//! `terminal.draw()` closure. Layout arithmetic lives in `layout.rs`; each
//! panel and overlay has its own module.

mod layout;
pub mod document;
pub mod feedback;
pub mod help;
pub mod keybindings;
pub mod sections;

use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_input_line, render_status_bar};

/// Renders one complete frame: three panels, input line, status bar, and any
/// overlay for the current mode.
///
/// Viewport heights and panel rects are written back into `state` before the
/// panels draw, so the next keypress or click sees this frame's geometry.
pub fn render(frame: &mut Frame, state: &mut AppState, theme: &Theme) {
    let [left, center, right, input_line, status_bar] = compute_layout(frame, state);

    state.sections_viewport_height = inner_rect(left).height;
    state.doc_viewport_height = inner_rect(center).height;
    state.feedback_viewport_height = inner_rect(right).height;
    state.panel_rects = [left, center, right];

    let focus = state.focus;

    if left.width > 0 {
        sections::render_sections(frame, left, focus, state, theme);
    }
    if center.width > 0 {
        document::render_document(frame, center, focus, state, theme);
    }
    if right.width > 0 {
        feedback::render_right_panel(frame, right, focus, state, theme);
    }

    render_input_line(frame, input_line, state, theme);
    render_status_bar(frame, status_bar, state, theme);

    // Overlays go last so they sit on top.
    match state.mode {
        Mode::HelpOverlay => help::render_help_overlay(frame, theme, state.help_scroll),
        Mode::Tutorial => help::render_tutorial(frame, theme, state.tutorial_page),
        Mode::Confirm(action) => help::render_confirm(frame, theme, action),
        Mode::Stats => help::render_stats(frame, state, theme),
        Mode::Normal | Mode::Insert(_) | Mode::Visual => {}
    }
}
