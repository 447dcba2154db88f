//! Keybinding dispatcher for prism.
//!
//! Translates raw crossterm `KeyEvent`s into `AppState` mutations and returns a
//! `KeyAction` telling the event loop whether to continue or quit. The
//! dispatcher branches first on `state.mode` so that every mode has an
//! isolated handler function.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;

use prism_core::types::DownloadKind;
use prism_core::DecisionAction;

use crate::app::{AppState, ConfirmAction, InputTarget, Mode, PanelFocus, RightView};

/// Control-flow signal returned from the key dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

/// Dispatches a key event to the handler matching the current mode.
///
/// # Arguments
///
/// * `key`: the raw crossterm key event (code + modifiers)
/// * `state`: mutable reference to all UI state
pub fn handle_key(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return KeyAction::Quit;
    }
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::Confirm(action) => handle_confirm(key, action, state),
        Mode::Tutorial => handle_tutorial(key, state),
        Mode::Stats => handle_stats(key, state),
        Mode::Insert(_) => handle_insert(key, state),
        Mode::Visual => handle_visual(key, state),
        Mode::Normal => handle_normal(key, state),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

/// Handles a key event while in Normal mode.
///
/// Scroll keys are tried first, then keys that only mean something in the
/// focused panel, then global review actions.
fn handle_normal(key: KeyEvent, state: &mut AppState) -> KeyAction {
    if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }
    if let Some(action) = handle_panel_key(key, state) {
        return action;
    }

    match key.code {
        // Panel focus and layout
        KeyCode::Char('H') => state.focus = state.focus.prev(),
        KeyCode::Char('L') => state.focus = state.focus.next(),
        KeyCode::Tab => {
            state.right_view = match state.right_view {
                RightView::Feedback => RightView::Chat,
                RightView::Chat => RightView::Feedback,
            };
        }
        KeyCode::Char('<') => state.shrink_center_panel(),
        KeyCode::Char('>') => state.grow_center_panel(),

        // Sections
        KeyCode::Char('n') | KeyCode::Char(']') => state.next_section(),
        KeyCode::Char('p') | KeyCode::Char('[') => state.previous_section(),
        KeyCode::Char('R') => state.reanalyze_current(),

        // Decisions
        KeyCode::Char('a') => state.decide(DecisionAction::Accept),
        KeyCode::Char('r') => state.decide(DecisionAction::Reject),
        KeyCode::Char('u') => state.decide(DecisionAction::Revert),
        KeyCode::Char('U') => state.request_confirm(ConfirmAction::RevertAll),

        // Custom feedback
        KeyCode::Char('c') => state.start_custom_feedback(true),
        KeyCode::Char('C') => state.start_custom_feedback(false),
        KeyCode::Char('t') => state.cycle_custom_kind(),
        KeyCode::Char('D') => state.clear_section_custom(),

        // Highlights
        KeyCode::Char('v') => state.enter_visual(),
        KeyCode::Char('m') => state.start_highlight_comment(),
        KeyCode::Char('x') => state.remove_highlight_at_cursor(),
        KeyCode::Char('X') => state.request_confirm(ConfirmAction::ClearHighlights),

        // Review-wide
        KeyCode::Char('o') => state.begin_input(InputTarget::OpenDocument),
        KeyCode::Char('i') => state.begin_input(InputTarget::Chat),
        KeyCode::Char('s') => state.open_stats(),
        KeyCode::Char('F') => state.complete_review(),
        KeyCode::Char('w') => state.download_reviewed(),
        KeyCode::Char('e') => state.download(DownloadKind::UserFeedback("csv".to_owned())),
        KeyCode::Char('E') => state.download(DownloadKind::Statistics("json".to_owned())),
        KeyCode::Char('Z') => state.request_confirm(ConfirmAction::ResetSession),
        KeyCode::Char('K') => state.request_confirm(ConfirmAction::DeleteDocument),
        KeyCode::Char('T') => state.toggle_dark_mode(),
        KeyCode::Char('f') => state.begin_input(InputTarget::ToolFeedback),

        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
        }
        KeyCode::Char('q') | KeyCode::Esc => {
            if state.request_quit() {
                return KeyAction::Quit;
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Handles keys whose meaning depends on the focused panel.
///
/// Returns `Some(KeyAction)` when the key was consumed, `None` when the key
/// should fall through to the global Normal handler.
fn handle_panel_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    match (state.focus, key.code) {
        (PanelFocus::Sections, KeyCode::Enter | KeyCode::Char('l')) => {
            state.open_selected_section();
            Some(KeyAction::Continue)
        }
        (PanelFocus::Feedback, KeyCode::Char('d')) => {
            state.delete_selected();
            Some(KeyAction::Continue)
        }
        (PanelFocus::Document, KeyCode::Enter) => {
            state.start_highlight_comment();
            Some(KeyAction::Continue)
        }
        _ => None,
    }
}

/// Handles scroll-related keys: j / k / g / G and Ctrl combos.
///
/// Returns `Some(KeyAction)` when the key was consumed.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') | KeyCode::Home => state.scroll_top(),
        KeyCode::Char('G') | KeyCode::End => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.half_page_down(),
        KeyCode::Char('u') if ctrl => state.half_page_up(),
        KeyCode::Char('f') if ctrl => state.full_page_down(),
        KeyCode::Char('b') if ctrl => state.full_page_up(),
        KeyCode::PageDown => state.full_page_down(),
        KeyCode::PageUp => state.full_page_up(),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

// ---------------------------------------------------------------------------
// Visual mode
// ---------------------------------------------------------------------------

/// Line selection in the document panel.
///
/// Movement keys extend the selection, Enter (or `h`) highlights it, Tab
/// cycles the color, Esc cancels.
fn handle_visual(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') => state.scroll_top(),
        KeyCode::Char('G') => state.scroll_bottom(),
        KeyCode::Tab => state.cycle_highlight_color(),
        KeyCode::Enter | KeyCode::Char('h') => state.highlight_selection(),
        KeyCode::Esc | KeyCode::Char('v') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Insert mode
// ---------------------------------------------------------------------------

/// Edits the input line. Enter submits, Esc cancels, Tab cycles the type of
/// a custom feedback entry or the tool rating.
fn handle_insert(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Esc => state.cancel_input(),
        KeyCode::Enter => state.submit_input(),
        KeyCode::Backspace => {
            state.input.pop();
        }
        KeyCode::Tab => match state.mode {
            Mode::Insert(InputTarget::CustomFeedback { .. }) => state.cycle_custom_kind(),
            Mode::Insert(InputTarget::ToolFeedback) => state.cycle_tool_rating(),
            _ => {}
        },
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.input.clear();
        }
        KeyCode::Char(c) => state.input.push(c),
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Overlays
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => {
            state.help_scroll = state.help_scroll.saturating_add(1);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            state.help_scroll = state.help_scroll.saturating_sub(1);
        }
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

/// `y` carries out `action`; `n` or Esc cancels.
fn handle_confirm(key: KeyEvent, action: ConfirmAction, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => {
            if state.confirm(action) {
                return KeyAction::Quit;
            }
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

fn handle_tutorial(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Enter | KeyCode::Char(' ') | KeyCode::Char('l') | KeyCode::Right => {
            state.tutorial_next();
        }
        KeyCode::Backspace | KeyCode::Char('h') | KeyCode::Left => state.tutorial_prev(),
        KeyCode::Esc | KeyCode::Char('q') => state.close_tutorial(),
        _ => {}
    }
    KeyAction::Continue
}

fn handle_stats(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('s') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        KeyCode::Char('r') => state.open_stats(),
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Handles a mouse event: click-to-focus and scroll-wheel.
///
/// Left click on a panel focuses it; in the section list it also opens the
/// clicked section. The wheel scrolls the focused panel by 3 lines, or the
/// help overlay while it is open.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => handle_mouse_click(mouse.column, mouse.row, state),
        MouseEventKind::ScrollUp => {
            if state.mode == Mode::HelpOverlay {
                state.help_scroll = state.help_scroll.saturating_sub(3);
            } else {
                state.scroll_up(3);
            }
        }
        MouseEventKind::ScrollDown => {
            if state.mode == Mode::HelpOverlay {
                state.help_scroll = state.help_scroll.saturating_add(3);
            } else {
                state.scroll_down(3);
            }
        }
        _ => {}
    }
    KeyAction::Continue
}

/// Sets panel focus from the clicked position. Collapsed panels are skipped.
fn handle_mouse_click(col: u16, row: u16, state: &mut AppState) {
    if state.mode != Mode::Normal {
        return;
    }
    let pos = Position { x: col, y: row };
    let [left, center, right] = state.panel_rects;

    if left.width > 0 && left.contains(pos) {
        state.focus = PanelFocus::Sections;
        // Row 0 is the border; list rows start one below.
        let clicked = usize::from(row.saturating_sub(left.y + 1)) + state.section_list_state.offset();
        if row > left.y && clicked < state.review.section_names().len() {
            state.section_list_state.select(Some(clicked));
            state.open_selected_section();
            state.focus = PanelFocus::Sections;
        }
    } else if center.width > 0 && center.contains(pos) {
        state.focus = PanelFocus::Document;
    } else if right.width > 0 && right.contains(pos) {
        state.focus = PanelFocus::Feedback;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;
    use crate::app::Effect;
    use prism_core::session::Session;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent {
            code,
            modifiers: KeyModifiers::NONE,
            kind: crossterm::event::KeyEventKind::Press,
            state: KeyEventState::NONE,
        }
    }

    #[test]
    fn quit_without_session_is_immediate() {
        let mut state = AppState::new(true, false);
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Quit);
    }

    #[test]
    fn quit_with_open_review_asks_first() {
        let mut state = AppState::new(true, false);
        state.resume(Session::new("s1", "a.docx", vec!["Intro".into()]));
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::Confirm(ConfirmAction::Quit));
        assert_eq!(handle_key(press(KeyCode::Char('n')), &mut state), KeyAction::Continue);
        assert_eq!(state.mode, Mode::Normal);
        handle_key(press(KeyCode::Char('q')), &mut state);
        assert_eq!(handle_key(press(KeyCode::Char('y')), &mut state), KeyAction::Quit);
    }

    #[test]
    fn insert_mode_collects_text() {
        let mut state = AppState::new(true, false);
        handle_key(press(KeyCode::Char('o')), &mut state);
        for c in "a.docxx".chars() {
            handle_key(press(KeyCode::Char(c)), &mut state);
        }
        handle_key(press(KeyCode::Backspace), &mut state);
        assert_eq!(state.input, "a.docx");
        // 'q' is text here, not quit.
        assert_eq!(handle_key(press(KeyCode::Char('q')), &mut state), KeyAction::Continue);
        handle_key(press(KeyCode::Esc), &mut state);
        assert_eq!(state.mode, Mode::Normal);
        assert!(state.input.is_empty());
    }

    #[test]
    fn tool_feedback_prompt_rates_and_sends() {
        let mut state = AppState::new(true, false);
        handle_key(press(KeyCode::Char('f')), &mut state);
        assert_eq!(state.mode, Mode::Insert(InputTarget::ToolFeedback));
        assert_eq!(state.tool_rating, 5);

        handle_key(press(KeyCode::Tab), &mut state);
        handle_key(press(KeyCode::Tab), &mut state);
        for c in "ok".chars() {
            handle_key(press(KeyCode::Char(c)), &mut state);
        }
        handle_key(press(KeyCode::Enter), &mut state);

        assert_eq!(state.mode, Mode::Normal);
        let effects = state.take_effects();
        assert!(matches!(
            effects.as_slice(),
            [Effect::Send(prism_core::Request::ToolFeedback(sent))]
                if sent.rating == 3 && sent.feedback == "ok" && sent.session_id.is_none()
        ));
    }

    #[test]
    fn tool_rating_wraps_after_one_star() {
        let mut state = AppState::new(true, false);
        state.tool_rating = 1;
        state.cycle_tool_rating();
        assert_eq!(state.tool_rating, 5);
    }

    #[test]
    fn focus_cycles_with_h_and_l() {
        let mut state = AppState::new(true, false);
        handle_key(press(KeyCode::Char('L')), &mut state);
        assert_eq!(state.focus, PanelFocus::Document);
        handle_key(press(KeyCode::Char('H')), &mut state);
        handle_key(press(KeyCode::Char('H')), &mut state);
        assert_eq!(state.focus, PanelFocus::Feedback);
    }
}
