//! Central application state for prism.
//!
//! `AppState` owns the [`Review`] plus everything the terminal needs on top of
//! it: mode, focus, list selections, scroll offsets, the input buffer, and
//! panel geometry. It never performs I/O. Anything that must leave the
//! process (backend requests, preference writes, downloads) is queued as an
//! [`Effect`] and carried out by the main loop.

use std::ops::Range;
use std::path::PathBuf;

use prism_core::api::UploadRequest;
use prism_core::notice::Notice;
use prism_core::session::Session;
use prism_core::store::{FLAG_DARK_MODE, FLAG_TUTORIAL_SEEN};
use prism_core::types::{
    CustomFeedbackDraft, DownloadKind, FeedbackLink, FeedbackType, GuidelinesPreference,
    HighlightColor, SectionStatus, Selection, MAX_TOOL_RATING,
};
use prism_core::{DecisionAction, Outcome, Request, Response, Result, Review};
use ratatui::layout::Rect;
use ratatui::widgets::ListState;

/// Ticks (250 ms each) a notice stays in the status bar.
const NOTICE_TICKS: u16 = 16;

/// Pages of the first-run tutorial.
pub const TUTORIAL_PAGES: usize = 4;

/// Editor mode controlling which keybinding set is active.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing into the input line; the target decides what Enter does.
    Insert(InputTarget),
    /// Line selection in the document panel, anchored at `visual_anchor`.
    Visual,
    HelpOverlay,
    Confirm(ConfirmAction),
    /// Statistics and dashboard overlay.
    Stats,
    Tutorial,
}

/// What the input line is collecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    CustomFeedback { link: Option<FeedbackLink> },
    HighlightComment(String),
    Chat,
    OpenDocument,
    /// Rating and comment about the review tool itself.
    ToolFeedback,
}

impl InputTarget {
    pub fn prompt(&self) -> &'static str {
        match self {
            InputTarget::CustomFeedback { link: Some(_) } => "Comment on item",
            InputTarget::CustomFeedback { link: None } => "Section feedback",
            InputTarget::HighlightComment(_) => "Highlight comment",
            InputTarget::Chat => "Ask",
            InputTarget::OpenDocument => "Open .docx",
            InputTarget::ToolFeedback => "Rate prism",
        }
    }
}

/// Destructive actions that wait for a y/n.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmAction {
    Quit,
    ClearHighlights,
    ResetSession,
    RevertAll,
    DeleteDocument,
}

impl ConfirmAction {
    pub fn question(self) -> &'static str {
        match self {
            ConfirmAction::Quit => "Quit prism?",
            ConfirmAction::ClearHighlights => "Remove every highlight in this section?",
            ConfirmAction::ResetSession => "Reset the session? All review state is lost.",
            ConfirmAction::RevertAll => "Revert every accept/reject decision?",
            ConfirmAction::DeleteDocument => "Delete the document (guidelines are kept)?",
        }
    }
}

/// Which panel currently has keyboard focus.
///
/// Navigation cycles Sections → Document → Feedback → Sections via `next()`
/// and in reverse via `prev()`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    #[default]
    Sections,
    Document,
    Feedback,
}

impl PanelFocus {
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Sections => PanelFocus::Feedback,
            PanelFocus::Document => PanelFocus::Sections,
            PanelFocus::Feedback => PanelFocus::Document,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelFocus::Sections => PanelFocus::Document,
            PanelFocus::Document => PanelFocus::Feedback,
            PanelFocus::Feedback => PanelFocus::Sections,
        }
    }
}

/// Content of the right panel.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RightView {
    #[default]
    Feedback,
    Chat,
}

/// One selectable row of the feedback panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackRow {
    Item(String),
    Custom(String),
}

/// Side effects requested by state transitions, drained by the main loop.
#[derive(Debug)]
pub enum Effect {
    Send(Request),
    /// Abort requests belonging to the previous session.
    CancelPending,
    SetFlag(&'static str, bool),
    SaveSession(Session),
    ClearSession,
    WriteFile { name: String, bytes: Vec<u8> },
}

/// All mutable UI state passed through every render cycle.
pub struct AppState {
    pub review: Review,
    pub mode: Mode,
    pub focus: PanelFocus,
    pub right_view: RightView,

    pub section_list_state: ListState,
    pub feedback_state: ListState,

    /// Line index of the document cursor within the current section.
    pub doc_cursor: usize,
    /// First visible document line.
    pub doc_scroll: usize,
    pub chat_scroll: u16,
    pub help_scroll: u16,
    pub tutorial_page: usize,

    /// Inner heights cached after each render for page scrolling.
    pub sections_viewport_height: u16,
    pub doc_viewport_height: u16,
    pub feedback_viewport_height: u16,

    pub left_pct: u16,
    pub center_pct: u16,
    pub right_pct: u16,
    /// Outer rects of the three panels from the last render, for mouse focus.
    pub panel_rects: [Rect; 3],

    pub input: String,
    /// Feedback type used for the next custom entry.
    pub custom_kind: FeedbackType,
    pub visual_anchor: usize,
    pub highlight_color: HighlightColor,
    /// Stars given in the tool feedback prompt.
    pub tool_rating: u8,

    pub dark_mode: bool,
    /// Guidelines and preference reused by in-app uploads.
    pub guidelines: Option<PathBuf>,
    pub preference: GuidelinesPreference,

    /// Notice currently in the status bar and how long it has been there.
    pub notice: Option<Notice>,
    notice_ticks: u16,
    /// Requests still running, refreshed by the main loop.
    pub in_flight: usize,

    effects: Vec<Effect>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            review: Review::new(),
            mode: Mode::default(),
            focus: PanelFocus::default(),
            right_view: RightView::default(),
            section_list_state: ListState::default(),
            feedback_state: ListState::default(),
            doc_cursor: 0,
            doc_scroll: 0,
            chat_scroll: 0,
            help_scroll: 0,
            tutorial_page: 0,
            sections_viewport_height: 0,
            doc_viewport_height: 0,
            feedback_viewport_height: 0,
            left_pct: 20,
            center_pct: 50,
            right_pct: 30,
            panel_rects: [Rect::default(); 3],
            input: String::new(),
            custom_kind: FeedbackType::default(),
            visual_anchor: 0,
            highlight_color: HighlightColor::default(),
            tool_rating: MAX_TOOL_RATING,
            dark_mode: true,
            guidelines: None,
            preference: GuidelinesPreference::default(),
            notice: None,
            notice_ticks: 0,
            in_flight: 0,
            effects: Vec::new(),
        }
    }
}

/// Scroll distance as a signed cursor offset. `isize` may be 16 bits wide.
fn line_delta(lines: u16) -> isize {
    isize::try_from(lines).unwrap_or(isize::MAX)
}

/// Byte ranges of the lines of `content`, newline excluded.
pub fn line_ranges(content: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for line in content.split('\n') {
        ranges.push(start..start + line.len());
        start += line.len() + 1;
    }
    ranges
}

impl AppState {
    pub fn new(dark_mode: bool, show_tutorial: bool) -> Self {
        Self {
            dark_mode,
            mode: if show_tutorial { Mode::Tutorial } else { Mode::Normal },
            ..Self::default()
        }
    }

    /// Hands the queued effects to the caller, oldest first.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    fn send(&mut self, request: Result<Request>) -> bool {
        match request {
            Ok(r) => {
                self.effects.push(Effect::Send(r));
                true
            }
            Err(_) => false,
        }
    }

    fn send_all(&mut self, requests: Vec<Request>) {
        self.effects.extend(requests.into_iter().map(Effect::Send));
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    /// Queues the upload of `document`.
    pub fn upload(&mut self, document: PathBuf) -> bool {
        let upload = UploadRequest {
            document,
            guidelines: self.guidelines.clone(),
            preference: self.preference,
        };
        let request = self.review.begin_upload(upload);
        if request.is_ok() {
            self.review.notices.info("Uploading document...");
        }
        self.send(request)
    }

    /// Restores a session mirrored from a previous run and shows its first section.
    pub fn resume(&mut self, session: Session) {
        let name = session.document_name.clone();
        self.review.start_session(session);
        self.review.notices.info(format!("Resumed review of {name}"));
        self.reset_view();
        self.navigate(|r| r.go_to(0));
    }

    fn reset_view(&mut self) {
        self.doc_cursor = 0;
        self.doc_scroll = 0;
        self.chat_scroll = 0;
        self.feedback_state = ListState::default();
        self.section_list_state = ListState::default();
        self.mode = Mode::Normal;
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    fn navigate(&mut self, step: impl FnOnce(&mut Review) -> Result<Option<Request>>) {
        let before = self.review.current_index();
        if let Ok(Some(request)) = step(&mut self.review) {
            self.effects.push(Effect::Send(request));
        }
        let after = self.review.current_index();
        self.section_list_state.select(after);
        if before != after {
            self.doc_cursor = 0;
            self.doc_scroll = 0;
            self.feedback_state.select(None);
            self.visual_anchor = 0;
        }
    }

    pub fn next_section(&mut self) {
        self.navigate(Review::next);
    }

    pub fn previous_section(&mut self) {
        self.navigate(Review::previous);
    }

    /// Opens the section selected in the section list.
    pub fn open_selected_section(&mut self) {
        if let Some(index) = self.section_list_state.selected() {
            self.navigate(|r| r.go_to(index));
            self.focus = PanelFocus::Document;
        }
    }

    /// Retries a failed section, or re-runs the analysis of an analyzed one.
    pub fn reanalyze_current(&mut self) {
        let status = self
            .review
            .current_section()
            .map(|s| self.review.section_status(s));
        let request = match status {
            Some(SectionStatus::Failed) => self.review.retry_analysis(None),
            _ => self.review.reanalyze(None),
        };
        if let Ok(Some(request)) = request {
            self.effects.push(Effect::Send(request));
        }
    }

    // -----------------------------------------------------------------------
    // Feedback panel
    // -----------------------------------------------------------------------

    /// Rows of the feedback panel: each AI item followed by the custom entries
    /// linked to it, then the section's remaining custom entries.
    pub fn feedback_rows(&self) -> Vec<FeedbackRow> {
        let Some(record) = self.review.current_record() else {
            return Vec::new();
        };
        let ledger = self.review.ledger();
        let mut rows = Vec::new();
        for item in &record.feedback_items {
            rows.push(FeedbackRow::Item(item.id.clone()));
            rows.extend(ledger.for_item(&item.id).map(|e| FeedbackRow::Custom(e.id.clone())));
        }
        rows.extend(
            ledger
                .for_section(&record.name)
                .filter(|e| !matches!(e.link, Some(FeedbackLink::AiItem(_))))
                .map(|e| FeedbackRow::Custom(e.id.clone())),
        );
        rows
    }

    pub fn selected_row(&self) -> Option<FeedbackRow> {
        let index = self.feedback_state.selected()?;
        self.feedback_rows().into_iter().nth(index)
    }

    fn selected_item_id(&self) -> Option<String> {
        match self.selected_row()? {
            FeedbackRow::Item(id) => Some(id),
            FeedbackRow::Custom(_) => None,
        }
    }

    pub fn decide(&mut self, action: DecisionAction) {
        let Some(id) = self.selected_item_id() else {
            self.review.notices.info("Select a feedback item first");
            return;
        };
        let request = self.review.begin_decision(&id, action, None, None);
        self.send(request);
    }

    /// Opens the input line for a custom entry, linked to the selected AI
    /// item when `linked` is set.
    pub fn start_custom_feedback(&mut self, linked: bool) {
        let link = if linked {
            match self.selected_item_id() {
                Some(id) => Some(FeedbackLink::AiItem(id)),
                None => {
                    self.review.notices.info("Select a feedback item first");
                    return;
                }
            }
        } else {
            None
        };
        if self.review.current_section().is_none() {
            self.review.notices.warning("Open a section first");
            return;
        }
        self.begin_input(InputTarget::CustomFeedback { link });
    }

    /// Deletes the selected custom entry, or every entry linked to the
    /// selected AI item.
    pub fn delete_selected(&mut self) {
        match self.selected_row() {
            Some(FeedbackRow::Custom(id)) => {
                if let Ok(cleared) = self.review.remove_custom_feedback(&id) {
                    self.send_all(cleared.requests);
                }
            }
            Some(FeedbackRow::Item(id)) => {
                let cleared = self.review.clear_custom_for_item(&id);
                self.send_all(cleared.requests);
            }
            None => {}
        }
        self.clamp_feedback_selection();
    }

    pub fn clear_section_custom(&mut self) {
        if let Ok(cleared) = self.review.clear_custom_for_section(None) {
            self.send_all(cleared.requests);
        }
        self.clamp_feedback_selection();
    }

    fn clamp_feedback_selection(&mut self) {
        let len = self.feedback_rows().len();
        match self.feedback_state.selected() {
            Some(_) if len == 0 => self.feedback_state.select(None),
            Some(i) if i >= len => self.feedback_state.select(Some(len - 1)),
            _ => {}
        }
    }

    pub fn cycle_custom_kind(&mut self) {
        self.custom_kind = self.custom_kind.next();
    }

    /// Steps the tool rating down one star, wrapping from 1 back to the top.
    pub fn cycle_tool_rating(&mut self) {
        self.tool_rating = match self.tool_rating {
            0 | 1 => MAX_TOOL_RATING,
            n => n - 1,
        };
    }

    // -----------------------------------------------------------------------
    // Document and highlights
    // -----------------------------------------------------------------------

    fn current_lines(&self) -> Vec<Range<usize>> {
        self.review
            .current_record()
            .map(|r| line_ranges(&r.content))
            .unwrap_or_default()
    }

    pub fn doc_line_count(&self) -> usize {
        self.review
            .current_record()
            .filter(|r| !r.content.is_empty())
            .map(|r| r.content.split('\n').count())
            .unwrap_or(0)
    }

    fn move_doc_cursor(&mut self, delta: isize) {
        let last = self.doc_line_count().saturating_sub(1);
        let target = self.doc_cursor.saturating_add_signed(delta).min(last);
        self.set_doc_cursor(target);
    }

    fn set_doc_cursor(&mut self, line: usize) {
        self.doc_cursor = line;
        let height = usize::from(self.doc_viewport_height.max(1));
        if self.doc_cursor < self.doc_scroll {
            self.doc_scroll = self.doc_cursor;
        } else if self.doc_cursor >= self.doc_scroll + height {
            self.doc_scroll = self.doc_cursor + 1 - height;
        }
    }

    /// Line range covered by the visual selection, inclusive.
    pub fn visual_range(&self) -> (usize, usize) {
        (
            self.visual_anchor.min(self.doc_cursor),
            self.visual_anchor.max(self.doc_cursor),
        )
    }

    pub fn enter_visual(&mut self) {
        if self.doc_line_count() == 0 {
            self.review.notices.info("Nothing to select yet");
            return;
        }
        self.focus = PanelFocus::Document;
        self.visual_anchor = self.doc_cursor;
        self.mode = Mode::Visual;
    }

    /// Highlights the visual selection with the active color.
    pub fn highlight_selection(&mut self) {
        let lines = self.current_lines();
        let (first, last) = self.visual_range();
        let (Some(start), Some(end)) = (lines.get(first), lines.get(last)) else {
            self.mode = Mode::Normal;
            return;
        };
        let selection = Selection::new(start.start, end.end);
        if self
            .review
            .create_highlight(None, selection, self.highlight_color)
            .is_ok()
        {
            self.review
                .notices
                .success(format!("Highlighted {} line(s)", last - first + 1));
            self.mode = Mode::Normal;
        }
    }

    pub fn cycle_highlight_color(&mut self) {
        self.highlight_color = match self.highlight_color {
            HighlightColor::Yellow => HighlightColor::Green,
            HighlightColor::Green => HighlightColor::Blue,
            HighlightColor::Blue => HighlightColor::Pink,
            HighlightColor::Pink => HighlightColor::Yellow,
        };
    }

    /// Id of the first highlight touching the cursor line.
    pub fn highlight_at_cursor(&self) -> Option<String> {
        let section = self.review.current_section()?;
        let line = self.current_lines().get(self.doc_cursor)?.clone();
        self.review
            .highlights()
            .for_section(section)
            .find(|h| h.start < line.end.max(line.start + 1) && line.start < h.end)
            .map(|h| h.id.clone())
    }

    pub fn start_highlight_comment(&mut self) {
        match self.highlight_at_cursor() {
            Some(id) => self.begin_input(InputTarget::HighlightComment(id)),
            None => self.review.notices.info("No highlight on this line"),
        }
    }

    pub fn remove_highlight_at_cursor(&mut self) {
        let Some(id) = self.highlight_at_cursor() else {
            self.review.notices.info("No highlight on this line");
            return;
        };
        if let Ok(cleared) = self.review.remove_highlight(&id) {
            self.review.notices.info(format!(
                "Highlight removed with {} comment(s)",
                cleared.count
            ));
            self.send_all(cleared.requests);
        }
    }

    // -----------------------------------------------------------------------
    // Input line
    // -----------------------------------------------------------------------

    pub fn begin_input(&mut self, target: InputTarget) {
        if target == InputTarget::Chat {
            self.right_view = RightView::Chat;
        }
        self.input.clear();
        self.mode = Mode::Insert(target);
    }

    /// Submits the input line. Validation failures keep the line open so the
    /// reviewer can fix it; the reason is already in the notice queue.
    pub fn submit_input(&mut self) {
        let Mode::Insert(target) = self.mode.clone() else {
            return;
        };
        let text = self.input.clone();
        let accepted = match target {
            InputTarget::CustomFeedback { link } => {
                let draft = CustomFeedbackDraft {
                    section: None,
                    kind: self.custom_kind,
                    category: String::new(),
                    description: text,
                    link,
                    ai_reference: None,
                };
                let request = self.review.begin_custom_feedback(draft);
                self.send(request)
            }
            InputTarget::HighlightComment(id) => {
                let request = self.review.begin_highlight_comment(&id, &text);
                self.send(request)
            }
            InputTarget::Chat => {
                let request = self.review.begin_chat(&text);
                let sent = self.send(request);
                if sent {
                    self.chat_scroll = u16::MAX;
                }
                sent
            }
            InputTarget::OpenDocument => self.upload(PathBuf::from(text.trim())),
            InputTarget::ToolFeedback => {
                let request = self.review.begin_tool_feedback(self.tool_rating, &text);
                self.send(request)
            }
        };
        if accepted {
            self.input.clear();
            self.mode = Mode::Normal;
        }
    }

    pub fn cancel_input(&mut self) {
        self.input.clear();
        self.mode = Mode::Normal;
    }

    // -----------------------------------------------------------------------
    // Review-wide
    // -----------------------------------------------------------------------

    pub fn request_confirm(&mut self, action: ConfirmAction) {
        self.mode = Mode::Confirm(action);
    }

    /// Carries out a confirmed action. Returns `true` when the app should quit.
    pub fn confirm(&mut self, action: ConfirmAction) -> bool {
        self.mode = Mode::Normal;
        match action {
            ConfirmAction::Quit => return true,
            ConfirmAction::ClearHighlights => {
                if let Ok(cleared) = self.review.clear_highlights(None, true) {
                    self.send_all(cleared.requests);
                }
            }
            ConfirmAction::ResetSession => {
                let request = self.review.begin_reset();
                self.effects.push(Effect::Send(request));
            }
            ConfirmAction::RevertAll => {
                let request = self.review.begin_revert_all();
                self.send(request);
            }
            ConfirmAction::DeleteDocument => {
                let request = self.review.begin_delete_document(true);
                self.send(request);
            }
        }
        false
    }

    /// Quitting asks first while a review is open.
    pub fn request_quit(&mut self) -> bool {
        if self.review.session().is_some() && self.review.completed().is_none() {
            self.request_confirm(ConfirmAction::Quit);
            false
        } else {
            true
        }
    }

    pub fn open_stats(&mut self) {
        let stats = self.review.begin_statistics();
        if self.send(stats) {
            let dashboard = self.review.begin_dashboard();
            self.send(dashboard);
            self.mode = Mode::Stats;
        }
    }

    pub fn complete_review(&mut self) {
        let request = self.review.begin_complete_review();
        if self.send(request) {
            self.review.notices.info("Completing review...");
        }
    }

    pub fn download(&mut self, kind: DownloadKind) {
        let request = self.review.begin_download(kind);
        self.send(request);
    }

    pub fn download_reviewed(&mut self) {
        let request = self.review.begin_download_reviewed();
        self.send(request);
    }

    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
        self.effects.push(Effect::SetFlag(FLAG_DARK_MODE, self.dark_mode));
    }

    pub fn close_tutorial(&mut self) {
        self.mode = Mode::Normal;
        self.effects.push(Effect::SetFlag(FLAG_TUTORIAL_SEEN, true));
    }

    pub fn tutorial_next(&mut self) {
        if self.tutorial_page + 1 >= TUTORIAL_PAGES {
            self.close_tutorial();
        } else {
            self.tutorial_page += 1;
        }
    }

    pub fn tutorial_prev(&mut self) {
        self.tutorial_page = self.tutorial_page.saturating_sub(1);
    }

    // -----------------------------------------------------------------------
    // Backend responses and ticks
    // -----------------------------------------------------------------------

    /// Folds a backend response into the review and reacts to the outcome.
    pub fn apply_response(&mut self, response: Response) {
        match self.review.apply(response) {
            Outcome::SessionStarted { sections } => {
                self.effects.push(Effect::CancelPending);
                if let Some(session) = self.review.session() {
                    self.effects.push(Effect::SaveSession(session.clone()));
                }
                self.reset_view();
                if sections > 0 {
                    self.navigate(|r| r.go_to(0));
                }
            }
            Outcome::SessionReset | Outcome::DocumentDeleted => {
                self.effects.push(Effect::CancelPending);
                self.effects.push(Effect::ClearSession);
                self.reset_view();
            }
            Outcome::Downloaded { kind, bytes } => {
                self.effects.push(Effect::WriteFile {
                    name: kind.file_name(),
                    bytes,
                });
            }
            Outcome::CustomDiscarded { delete: Some(request) } => {
                self.effects.push(Effect::Send(request));
            }
            Outcome::ChatAnswered => {
                self.chat_scroll = u16::MAX;
            }
            Outcome::CustomDeleted { .. } | Outcome::AllReverted { .. } => {
                self.clamp_feedback_selection();
            }
            _ => {}
        }
    }

    /// Rotates the status-bar notice.
    pub fn on_tick(&mut self) {
        self.notice_ticks = self.notice_ticks.saturating_add(1);
        let expired = self.notice_ticks >= NOTICE_TICKS;
        if self.notice.is_none() || expired {
            match self.review.notices.pop() {
                Some(next) => {
                    self.notice = Some(next);
                    self.notice_ticks = 0;
                }
                None if expired => self.notice = None,
                None => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // Scrolling
    // -----------------------------------------------------------------------

    /// Scrolls the focused panel down by `lines` rows.
    ///
    /// Sections and Feedback move the list selection; Document moves the
    /// cursor and the view follows; the chat transcript scrolls freely.
    pub fn scroll_down(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Sections => self.section_list_state.scroll_down_by(lines),
            PanelFocus::Document => self.move_doc_cursor(line_delta(lines)),
            PanelFocus::Feedback => match self.right_view {
                RightView::Feedback => self.feedback_state.scroll_down_by(lines),
                RightView::Chat => self.chat_scroll = self.chat_scroll.saturating_add(lines),
            },
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Sections => self.section_list_state.scroll_up_by(lines),
            PanelFocus::Document => self.move_doc_cursor(-line_delta(lines)),
            PanelFocus::Feedback => match self.right_view {
                RightView::Feedback => self.feedback_state.scroll_up_by(lines),
                RightView::Chat => self.chat_scroll = self.chat_scroll.saturating_sub(lines),
            },
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::Sections => self.section_list_state.select_first(),
            PanelFocus::Document => self.set_doc_cursor(0),
            PanelFocus::Feedback => match self.right_view {
                RightView::Feedback => self.feedback_state.select_first(),
                RightView::Chat => self.chat_scroll = 0,
            },
        }
    }

    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::Sections => self.section_list_state.select_last(),
            PanelFocus::Document => {
                let last = self.doc_line_count().saturating_sub(1);
                self.set_doc_cursor(last);
            }
            PanelFocus::Feedback => match self.right_view {
                RightView::Feedback => self.feedback_state.select_last(),
                RightView::Chat => self.chat_scroll = u16::MAX,
            },
        }
    }

    fn focused_viewport_height(&self) -> u16 {
        match self.focus {
            PanelFocus::Sections => self.sections_viewport_height,
            PanelFocus::Document => self.doc_viewport_height,
            PanelFocus::Feedback => self.feedback_viewport_height,
        }
    }

    pub fn half_page_down(&mut self) {
        self.scroll_down((self.focused_viewport_height() / 2).max(1));
    }

    pub fn half_page_up(&mut self) {
        self.scroll_up((self.focused_viewport_height() / 2).max(1));
    }

    pub fn full_page_down(&mut self) {
        self.scroll_down(self.focused_viewport_height().max(1));
    }

    pub fn full_page_up(&mut self) {
        self.scroll_up(self.focused_viewport_height().max(1));
    }

    /// Shrinks the document (centre) panel by transferring 5% to the side panels.
    ///
    /// The centre panel will not shrink below 20%.
    pub fn shrink_center_panel(&mut self) {
        const MIN_CENTER: u16 = 20;
        const STEP: u16 = 5;
        if self.center_pct <= MIN_CENTER {
            return;
        }
        let transfer = STEP.min(self.center_pct - MIN_CENTER);
        self.center_pct -= transfer;
        let left_gain = transfer / 2;
        let right_gain = transfer - left_gain;
        self.left_pct = self.left_pct.saturating_add(left_gain);
        self.right_pct = self.right_pct.saturating_add(right_gain);
    }

    /// Grows the document (centre) panel by pulling from both side panels.
    ///
    /// The centre panel will not grow above 80%; side panels keep at least 5%.
    pub fn grow_center_panel(&mut self) {
        const MAX_CENTER: u16 = 80;
        const MIN_SIDE: u16 = 5;
        const STEP: u16 = 5;
        if self.center_pct >= MAX_CENTER {
            return;
        }
        let transfer = STEP.min(MAX_CENTER - self.center_pct);
        let left_give = (transfer / 2).min(self.left_pct.saturating_sub(MIN_SIDE));
        let right_give = (transfer - transfer / 2).min(self.right_pct.saturating_sub(MIN_SIDE));
        self.left_pct -= left_give;
        self.right_pct -= right_give;
        self.center_pct += left_give + right_give;
    }
}
