//! Color theme system for prism.
//!
//! A `Theme` holds named `ratatui::style::Color` fields covering every UI surface
//! prism renders. Three built-in themes are provided:
//!
//! - `dark`: ANSI 16 colors, works on any terminal including 256-color SSH
//!   sessions with no truecolor support. Default when dark mode is on.
//! - `light`: ANSI 16 colors tuned for light terminal backgrounds.
//! - `catppuccin_mocha`: Catppuccin Mocha palette in RGB; requires truecolor.

use prism_core::notice::NoticeLevel;
use prism_core::types::{Decision, FeedbackType, HighlightColor, RiskLevel, SectionStatus};
use ratatui::style::Color;

/// All color values used across prism's UI surfaces.
#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Document view
    pub text: Color,
    pub text_muted: Color,
    /// Background of the line under the document cursor.
    pub cursor_line_bg: Color,
    /// Background of lines inside a visual selection.
    pub selection_bg: Color,
    pub highlight_yellow: Color,
    pub highlight_green: Color,
    pub highlight_blue: Color,
    pub highlight_pink: Color,
    /// Foreground drawn on top of any highlight background.
    pub highlight_fg: Color,

    // Section list
    pub section_pending: Color,
    pub section_analyzing: Color,
    pub section_analyzed: Color,
    pub section_failed: Color,

    // Feedback badges
    pub risk_high: Color,
    pub risk_medium: Color,
    pub risk_low: Color,
    pub decision_accepted: Color,
    pub decision_rejected: Color,
    pub decision_pending: Color,
    pub feedback_critical: Color,
    pub feedback_important: Color,
    pub feedback_suggestion: Color,
    pub feedback_positive: Color,
    pub feedback_question: Color,
    pub custom_entry: Color,

    // Notices
    pub notice_info: Color,
    pub notice_success: Color,
    pub notice_warning: Color,
    pub notice_error: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_insert: Color,
    pub status_mode_visual: Color,

    pub background: Color,
}

impl Theme {
    /// Returns the built-in dark theme using ANSI 16 colors.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            text: Color::Reset,
            text_muted: Color::DarkGray,
            cursor_line_bg: Color::Rgb(40, 40, 40),
            selection_bg: Color::Blue,
            highlight_yellow: Color::Yellow,
            highlight_green: Color::Green,
            highlight_blue: Color::LightBlue,
            highlight_pink: Color::LightMagenta,
            highlight_fg: Color::Black,

            section_pending: Color::DarkGray,
            section_analyzing: Color::Yellow,
            section_analyzed: Color::Green,
            section_failed: Color::Red,

            risk_high: Color::Red,
            risk_medium: Color::Yellow,
            risk_low: Color::Green,
            decision_accepted: Color::Green,
            decision_rejected: Color::Red,
            decision_pending: Color::DarkGray,
            feedback_critical: Color::Red,
            feedback_important: Color::Yellow,
            feedback_suggestion: Color::Cyan,
            feedback_positive: Color::Green,
            feedback_question: Color::Magenta,
            custom_entry: Color::LightBlue,

            notice_info: Color::White,
            notice_success: Color::Green,
            notice_warning: Color::Yellow,
            notice_error: Color::Red,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_insert: Color::Green,
            status_mode_visual: Color::Magenta,

            background: Color::Reset,
        }
    }

    /// Returns the light theme for terminals with a pale background.
    pub fn light() -> Self {
        Self {
            border_active: Color::Blue,
            border_inactive: Color::Gray,

            text: Color::Black,
            text_muted: Color::DarkGray,
            cursor_line_bg: Color::Rgb(230, 230, 230),
            selection_bg: Color::LightCyan,
            highlight_yellow: Color::LightYellow,
            highlight_green: Color::LightGreen,
            highlight_blue: Color::LightBlue,
            highlight_pink: Color::LightMagenta,
            highlight_fg: Color::Black,

            section_pending: Color::Gray,
            section_analyzing: Color::Rgb(180, 120, 0),
            section_analyzed: Color::Green,
            section_failed: Color::Red,

            risk_high: Color::Red,
            risk_medium: Color::Rgb(180, 120, 0),
            risk_low: Color::Green,
            decision_accepted: Color::Green,
            decision_rejected: Color::Red,
            decision_pending: Color::Gray,
            feedback_critical: Color::Red,
            feedback_important: Color::Rgb(180, 120, 0),
            feedback_suggestion: Color::Blue,
            feedback_positive: Color::Green,
            feedback_question: Color::Magenta,
            custom_entry: Color::Blue,

            notice_info: Color::Black,
            notice_success: Color::Green,
            notice_warning: Color::Rgb(180, 120, 0),
            notice_error: Color::Red,

            status_bar_bg: Color::Gray,
            status_bar_fg: Color::Black,
            status_mode_normal: Color::Blue,
            status_mode_insert: Color::Green,
            status_mode_visual: Color::Magenta,

            background: Color::Reset,
        }
    }

    /// Returns the Catppuccin Mocha theme using RGB truecolor values.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let teal = Color::Rgb(148, 226, 213); // #94e2d5
        let pink = Color::Rgb(245, 194, 231); // #f5c2e7
        let mauve = Color::Rgb(203, 166, 247); // #cba6f7
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface0 = Color::Rgb(49, 50, 68); // #313244
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let base = Color::Rgb(30, 30, 46); // #1e1e2e
        let text = Color::Rgb(205, 214, 244); // #cdd6f4
        let peach = Color::Rgb(250, 179, 135); // #fab387

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            text,
            text_muted: overlay1,
            cursor_line_bg: surface0,
            selection_bg: surface1,
            highlight_yellow: yellow,
            highlight_green: green,
            highlight_blue: blue,
            highlight_pink: pink,
            highlight_fg: base,

            section_pending: overlay1,
            section_analyzing: yellow,
            section_analyzed: green,
            section_failed: red,

            risk_high: red,
            risk_medium: peach,
            risk_low: green,
            decision_accepted: green,
            decision_rejected: red,
            decision_pending: overlay1,
            feedback_critical: red,
            feedback_important: peach,
            feedback_suggestion: blue,
            feedback_positive: green,
            feedback_question: mauve,
            custom_entry: teal,

            notice_info: text,
            notice_success: green,
            notice_warning: yellow,
            notice_error: red,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_insert: green,
            status_mode_visual: mauve,

            background: base,
        }
    }

    /// Resolves a theme name string to the corresponding built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never prevents
    /// startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "light" => Self::light(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }

    /// Theme selected by the persisted dark-mode flag.
    pub fn for_dark_mode(dark: bool) -> Self {
        if dark {
            Self::dark()
        } else {
            Self::light()
        }
    }

    pub fn risk(&self, risk: RiskLevel) -> Color {
        match risk {
            RiskLevel::High => self.risk_high,
            RiskLevel::Medium => self.risk_medium,
            RiskLevel::Low => self.risk_low,
        }
    }

    pub fn decision(&self, decision: Decision) -> Color {
        match decision {
            Decision::Accepted => self.decision_accepted,
            Decision::Rejected => self.decision_rejected,
            Decision::Pending => self.decision_pending,
        }
    }

    pub fn feedback_type(&self, kind: FeedbackType) -> Color {
        match kind {
            FeedbackType::Critical => self.feedback_critical,
            FeedbackType::Important => self.feedback_important,
            FeedbackType::Suggestion => self.feedback_suggestion,
            FeedbackType::Positive => self.feedback_positive,
            FeedbackType::Question | FeedbackType::Clarification => self.feedback_question,
        }
    }

    pub fn section_status(&self, status: SectionStatus) -> Color {
        match status {
            SectionStatus::Pending => self.section_pending,
            SectionStatus::Analyzing => self.section_analyzing,
            SectionStatus::Analyzed => self.section_analyzed,
            SectionStatus::Failed => self.section_failed,
        }
    }

    pub fn highlight(&self, color: HighlightColor) -> Color {
        match color {
            HighlightColor::Yellow => self.highlight_yellow,
            HighlightColor::Green => self.highlight_green,
            HighlightColor::Blue => self.highlight_blue,
            HighlightColor::Pink => self.highlight_pink,
        }
    }

    pub fn notice(&self, level: NoticeLevel) -> Color {
        match level {
            NoticeLevel::Info => self.notice_info,
            NoticeLevel::Success => self.notice_success,
            NoticeLevel::Warning => self.notice_warning,
            NoticeLevel::Error => self.notice_error,
        }
    }
}
