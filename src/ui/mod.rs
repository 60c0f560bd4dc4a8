mod screen;
pub mod theme;

pub use screen::Screen;
pub use theme::Palette;

use crate::domain::{SessionSummary, format_timestamp};
use std::iter::Peekable;
use std::ops::Range;
use std::str::Chars;
use time::OffsetDateTime;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

pub const MAX_VISIBLE_ROWS: usize = 10;
pub const SEARCH_PLACEHOLDER: &str = " /   type to search";
pub const HELP_LINE: &str = "↑↓ navigate | enter select | ^n new | esc quit";

const MIN_PREVIEW_COLS: usize = 10;
const PREVIEW_MARGIN: usize = 2;
// cursor, space, gap, widest timestamp ("yesterday"), one spare column
const ROW_CHROME: usize = 14;
const MIN_TITLE_COLS: usize = 8;
const INDENT: &str = "  ";

/// Everything one frame depends on besides the terminal itself.
#[derive(Clone, Copy, Debug)]
pub struct FrameView<'a> {
    pub query: &'a str,
    pub filtered: &'a [&'a SessionSummary],
    pub selected_index: usize,
    /// Widest title across all sessions, so columns stay put while filtering.
    pub title_width: usize,
}

pub fn render_frame(
    view: &FrameView<'_>,
    width: u16,
    now: OffsetDateTime,
    palette: Palette,
) -> Vec<String> {
    // Every line must fit in `width` columns: a wrapped line would occupy a
    // terminal row that the next redraw does not erase.
    let width = usize::from(width);
    let indented_width = width.saturating_sub(INDENT.len());
    let mut lines: Vec<String> = Vec::with_capacity(MAX_VISIBLE_ROWS + 4);

    if view.query.is_empty() {
        lines.push(palette.dim(&take_width(SEARCH_PLACEHOLDER, width)));
    } else {
        lines.push(truncate_with_ellipsis(&format!(" /{}", view.query), width));
    }
    lines.push(palette.dim(&truncate_with_ellipsis(HELP_LINE, width)));
    lines.push(String::new());

    if view.filtered.is_empty() {
        if view.query.is_empty() {
            let message = take_width("No sessions", indented_width);
            lines.push(format!("{INDENT}{}", palette.dim(&message)));
        } else {
            let message = format!(
                "No matches. Press ^n or enter to create \"{}\"",
                view.query
            );
            let message = truncate_with_ellipsis(&message, indented_width);
            lines.push(format!("{INDENT}{}", palette.warning(&message)));
        }
        return lines;
    }

    let layout = RowLayout {
        width,
        title_width: view
            .title_width
            .min(width.saturating_sub(ROW_CHROME).max(MIN_TITLE_COLS)),
        now,
        palette,
    };
    for idx in visible_window(view.filtered.len(), view.selected_index) {
        lines.push(layout.row(view.filtered[idx], idx == view.selected_index));
    }

    if view.filtered.len() > MAX_VISIBLE_ROWS {
        let summary = format!("{INDENT}... {} matches", view.filtered.len());
        lines.push(palette.dim(&take_width(&summary, width)));
    }
    lines
}

/// Rows shown for `count` entries: the selection sits in the middle of the
/// window, which is clamped to the ends of the list.
pub fn visible_window(count: usize, selected: usize) -> Range<usize> {
    let visible = count.min(MAX_VISIBLE_ROWS);
    let start = selected
        .saturating_sub(visible / 2)
        .min(count - visible);
    start..start + visible
}

pub fn title_column_width(sessions: &[SessionSummary]) -> usize {
    sessions
        .iter()
        .map(|session| printable_line(&session.title).width())
        .max()
        .unwrap_or(0)
}

struct RowLayout {
    width: usize,
    title_width: usize,
    now: OffsetDateTime,
    palette: Palette,
}

impl RowLayout {
    fn row(&self, session: &SessionSummary, selected: bool) -> String {
        let cursor = if selected { '>' } else { ' ' };
        let timestamp = format_timestamp(session.updated_at, self.now);
        let title = pad_to_width(
            &truncate_with_ellipsis(&printable_line(&session.title), self.title_width),
            self.title_width,
        );

        let fixed = 2 + self.title_width + 2 + timestamp.width() + 2;
        let available = self.width.saturating_sub(fixed + PREVIEW_MARGIN);
        let preview = session
            .last_user_message_preview
            .as_deref()
            .filter(|_| available > MIN_PREVIEW_COLS)
            .map(|text| truncate_with_ellipsis(&printable_line(text), available))
            .filter(|text| !text.is_empty());

        let detail = match preview {
            Some(preview) => format!("{timestamp}  {preview}"),
            None => timestamp,
        };

        // Narrow terminals: the title column has a floor, so cut the plain
        // text before any colour codes go in.
        let prefix = take_width(&format!("{cursor} {title}  "), self.width);
        let detail = truncate_with_ellipsis(&detail, self.width.saturating_sub(prefix.width()));
        let line = if detail.is_empty() {
            prefix
        } else {
            format!("{prefix}{}", self.palette.dim(&detail))
        };
        if selected {
            self.palette.selected(&line)
        } else {
            line
        }
    }
}

/// Single-line, escape-free form of remote text. Terminal escape sequences and
/// control characters are dropped; whitespace runs collapse to one space.
fn printable_line(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            skip_escape_sequence(&mut chars);
        } else if ch.is_whitespace() {
            cleaned.push(' ');
        } else if !ch.is_control() {
            cleaned.push(ch);
        }
    }
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Consumes the rest of a sequence whose ESC was just read.
fn skip_escape_sequence(chars: &mut Peekable<Chars<'_>>) {
    match chars.next() {
        // CSI: parameter and intermediate bytes, then one final byte in `@`..=`~`.
        Some('[') => {
            for ch in chars.by_ref() {
                if ('@'..='~').contains(&ch) {
                    break;
                }
            }
        }
        // OSC: terminated by BEL or ESC `\`.
        Some(']') => {
            while let Some(ch) = chars.next() {
                if ch == '\x07' {
                    break;
                }
                if ch == '\x1b' {
                    chars.next_if_eq(&'\\');
                    break;
                }
            }
        }
        _ => {}
    }
}

fn pad_to_width(text: &str, width: usize) -> String {
    let padding = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(padding))
}

fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width <= 3 {
        return take_width(text, max_width);
    }
    format!("{}...", take_width(text, max_width - 3))
}

fn take_width(text: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used + ch_width > max_width {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;
    use time::macros::datetime;

    const NOW: OffsetDateTime = datetime!(2026-10-18 15:30 UTC);

    fn session(id: &str, title: &str, preview: Option<&str>) -> SessionSummary {
        SessionSummary {
            id: id.to_string(),
            title: title.to_string(),
            directory: "/work".to_string(),
            created_at: NOW - Duration::days(30),
            updated_at: datetime!(2026-10-18 09:05 UTC),
            is_interactive: true,
            last_user_message_preview: preview.map(str::to_string),
        }
    }

    fn render(query: &str, sessions: &[SessionSummary], selected: usize, width: u16) -> Vec<String> {
        let filtered: Vec<&SessionSummary> = sessions.iter().collect();
        let view = FrameView {
            query,
            filtered: &filtered,
            selected_index: selected,
            title_width: title_column_width(sessions),
        };
        render_frame(&view, width, NOW, Palette::plain())
    }

    #[test]
    fn header_shows_placeholder_then_help_then_blank() {
        let sessions = vec![session("s1", "alpha", None)];
        let lines = render("", &sessions, 0, 80);
        assert_eq!(lines[0], SEARCH_PLACEHOLDER);
        assert_eq!(lines[1], HELP_LINE);
        assert_eq!(lines[2], "");
        assert_eq!(lines.len(), 4);
    }

    #[test]
    fn header_echoes_query() {
        let sessions = vec![session("s1", "alpha", None)];
        let lines = render("alp", &sessions, 0, 80);
        assert_eq!(lines[0], " /alp");
    }

    #[test]
    fn empty_result_mentions_query() {
        let lines = render("zzz", &[], 0, 80);
        assert_eq!(lines.len(), 4);
        assert_eq!(
            lines[3],
            "  No matches. Press ^n or enter to create \"zzz\""
        );

        let lines = render("", &[], 0, 80);
        assert_eq!(lines[3], "  No sessions");
    }

    #[test]
    fn rows_align_titles_and_mark_selection() {
        let sessions = vec![session("s1", "api", None), session("s2", "api-helper", None)];
        let lines = render("", &sessions, 1, 80);
        assert_eq!(lines[3], "  api         09:05");
        assert_eq!(lines[4], "> api-helper  09:05");
    }

    #[test]
    fn preview_is_collapsed_and_truncated_to_width() {
        let sessions = vec![session(
            "s1",
            "api",
            Some("please\n\n  refactor   the parser and add tests for every edge case"),
        )];
        let lines = render("", &sessions, 0, 40);
        // 40 - (2 + 3 + 2 + 5 + 2) - 2 = 24 columns for the preview
        assert_eq!(lines[3], "> api  09:05  please refactor the p...");
        assert!(lines[3].width() <= 40);
    }

    #[test]
    fn preview_is_dropped_when_too_narrow() {
        let sessions = vec![session("s1", "api", Some("hello there"))];
        let lines = render("", &sessions, 0, 25);
        assert_eq!(lines[3], "> api  09:05");
    }

    #[test]
    fn long_lists_show_window_and_match_count() {
        let sessions: Vec<SessionSummary> = (0..15)
            .map(|idx| session(&format!("s{idx}"), &format!("title {idx:02}"), None))
            .collect();
        let lines = render("", &sessions, 7, 80);
        assert_eq!(lines.len(), 3 + MAX_VISIBLE_ROWS + 1);
        assert!(lines[3].contains("title 02"));
        assert!(lines[8].starts_with("> title 07"));
        assert_eq!(lines[13], "  ... 15 matches");
    }

    #[test]
    fn window_centers_selection_and_clamps_to_edges() {
        assert_eq!(visible_window(3, 2), 0..3);
        assert_eq!(visible_window(15, 0), 0..10);
        assert_eq!(visible_window(15, 7), 2..12);
        assert_eq!(visible_window(15, 14), 5..15);
        assert_eq!(visible_window(0, 0), 0..0);
    }

    #[test]
    fn selected_row_is_highlighted_in_color() {
        let sessions = vec![session("s1", "api", None)];
        let filtered: Vec<&SessionSummary> = sessions.iter().collect();
        let view = FrameView {
            query: "",
            filtered: &filtered,
            selected_index: 0,
            title_width: 3,
        };
        let lines = render_frame(&view, 80, NOW, Palette::ansi());
        assert_eq!(lines[3], "\x1b[36m> api  \x1b[2m09:05\x1b[0m\x1b[0m");
    }

    #[test]
    fn long_query_and_help_line_fit_the_terminal() {
        let sessions = vec![session("s1", "api", None)];
        let query = "refactor the websocket reconnect logic";
        let filtered: Vec<&SessionSummary> = Vec::new();
        let view = FrameView {
            query,
            filtered: &filtered,
            selected_index: 0,
            title_width: title_column_width(&sessions),
        };
        let lines = render_frame(&view, 80, NOW, Palette::plain());
        assert!(lines.iter().all(|line| line.width() <= 80), "{lines:?}");
        assert!(lines[3].starts_with("  No matches. Press ^n or enter to create"));
        assert!(lines[3].ends_with("..."));

        let long_query = "x".repeat(120);
        let view = FrameView {
            query: &long_query,
            ..view
        };
        let lines = render_frame(&view, 80, NOW, Palette::plain());
        assert!(lines.iter().all(|line| line.width() <= 80), "{lines:?}");

        let lines = render("", &sessions, 0, 40);
        assert!(lines.iter().all(|line| line.width() <= 40), "{lines:?}");
        assert_eq!(lines[1].width(), 40);
        assert!(lines[1].ends_with("..."));
    }

    #[test]
    fn rows_fit_even_below_the_title_column_floor() {
        let sessions: Vec<SessionSummary> = (0..12)
            .map(|idx| session(&format!("s{idx}"), "a fairly long session title", Some("hi")))
            .collect();
        for width in [4u16, 12, 20, 30] {
            let lines = render("", &sessions, 3, width);
            assert!(
                lines.iter().all(|line| line.width() <= usize::from(width)),
                "width {width}: {lines:?}"
            );
        }
    }

    #[test]
    fn escape_sequences_in_previews_and_titles_are_stripped() {
        let sessions = vec![session(
            "s1",
            "build\x1b[1m fix\x08",
            Some("why does \x1b[31merror[E0308]\x1b[0m: mismatched types\x07 \x1b]0;title\x07here"),
        )];
        let lines = render("", &sessions, 0, 120);
        assert!(!lines[3].contains('\x1b'), "{:?}", lines[3]);
        assert!(!lines[3].contains('\x08'));
        assert!(!lines[3].contains('\x07'));
        assert!(lines[3].starts_with("> build fix  09:05  why does error[E0308]: mismatched types here"));

        let filtered: Vec<&SessionSummary> = sessions.iter().collect();
        let view = FrameView {
            query: "",
            filtered: &filtered,
            selected_index: 0,
            title_width: title_column_width(&sessions),
        };
        let colored = render_frame(&view, 120, NOW, Palette::ansi());
        assert!(colored[3].starts_with("\x1b[36m> build fix  \x1b[2m09:05  why does error"));
    }

    #[test]
    fn printable_line_drops_controls_and_collapses_whitespace() {
        assert_eq!(printable_line("a\tb\n\n c"), "a b c");
        assert_eq!(printable_line("\x1b[38;5;196mred\x1b[0m"), "red");
        assert_eq!(printable_line("\x1b]8;;http://x\x1b\\link\x1b]8;;\x1b\\"), "link");
        assert_eq!(printable_line("back\x08space\x00"), "backspace");
    }

    #[test]
    fn overlong_titles_are_cut_to_fit_the_terminal() {
        let title = "a".repeat(100);
        let sessions = vec![session("s1", &title, None)];
        let lines = render("", &sessions, 0, 40);
        assert!(lines[3].width() <= 40);
        assert!(lines[3].contains("..."));
    }
}
