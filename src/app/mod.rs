mod line_editor;

pub use line_editor::LineEditor;

use crate::domain::{
    DEFAULT_SESSION_TITLE, KeyEvent, PickerResult, SessionSummary, filter_and_rank, local_now,
};
use crate::infra::{
    RawTerminal, ServiceError, SessionService, TerminalInput, list_candidate_sessions,
};
use crate::ui::{FrameView, Palette, Screen, render_frame, title_column_width};
use std::io::{self, Write};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::debug;

#[derive(Debug, Error)]
pub enum PickerError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("terminal I/O failed: {0}")]
    Terminal(#[from] io::Error),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PickerMode {
    /// Sessions exist: filter and select.
    Listing,
    /// Nothing to resume: ask for the title of a new session.
    PromptingTitle,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PickerExit {
    Selected(PickerResult),
    Quit,
}

#[derive(Clone, Copy, Debug)]
pub struct FrameStyle {
    pub now: OffsetDateTime,
    pub palette: Palette,
}

pub fn entry_mode(sessions: &[SessionSummary]) -> PickerMode {
    if sessions.is_empty() {
        PickerMode::PromptingTitle
    } else {
        PickerMode::Listing
    }
}

/// Lists the candidate sessions for `directory` and lets the user pick one on
/// the controlling terminal. Quitting ends the process with status 0.
pub fn show_picker<S>(service: &S, directory: &str) -> Result<PickerResult, PickerError>
where
    S: SessionService + Sync + ?Sized,
{
    let sessions = list_candidate_sessions(service, directory)?;
    let style = FrameStyle {
        now: local_now(),
        palette: Palette::from_env(),
    };

    let mut input = RawTerminal;
    let mut out = io::stdout().lock();
    match run_picker(sessions, &mut input, &mut out, style)? {
        PickerExit::Selected(result) => Ok(result),
        PickerExit::Quit => {
            debug!("picker dismissed");
            std::process::exit(0);
        }
    }
}

pub fn run_picker(
    sessions: Vec<SessionSummary>,
    input: &mut impl TerminalInput,
    out: &mut impl Write,
    style: FrameStyle,
) -> io::Result<PickerExit> {
    match entry_mode(&sessions) {
        PickerMode::PromptingTitle => prompt_for_title(input, out),
        PickerMode::Listing => run_listing(ListingState::new(sessions), input, out, style),
    }
}

fn run_listing(
    mut state: ListingState,
    input: &mut impl TerminalInput,
    out: &mut impl Write,
    style: FrameStyle,
) -> io::Result<PickerExit> {
    let mut screen = Screen::new();
    screen.draw(out, &state.render(input.width(), style))?;

    loop {
        let key = input.read_key()?;
        match state.handle_key(key) {
            ListingStep::Redraw => screen.draw(out, &state.render(input.width(), style))?,
            ListingStep::Finish(exit) => {
                screen.clear(out)?;
                return Ok(exit);
            }
        }
    }
}

fn prompt_for_title(input: &mut impl TerminalInput, out: &mut impl Write) -> io::Result<PickerExit> {
    writeln!(out, "No sessions in this directory.")?;
    writeln!(
        out,
        "Enter title for new session (or press enter for \"{DEFAULT_SESSION_TITLE}\"):"
    )?;
    write!(out, "> ")?;
    out.flush()?;

    let mut title = LineEditor::new();
    loop {
        match input.read_key()? {
            KeyEvent::Enter => {
                writeln!(out)?;
                out.flush()?;
                return Ok(PickerExit::Selected(PickerResult::new_session(title.text())));
            }
            KeyEvent::Interrupt => return Ok(PickerExit::Quit),
            KeyEvent::Backspace => {
                if title.backspace() {
                    write!(out, "\x08 \x08")?;
                }
            }
            KeyEvent::Char(ch) => {
                if title.push(ch) {
                    write!(out, "{ch}")?;
                }
            }
            KeyEvent::Up | KeyEvent::Down | KeyEvent::Escape | KeyEvent::CreateNew => continue,
        }
        out.flush()?;
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ListingStep {
    Redraw,
    Finish(PickerExit),
}

/// Picker state while sessions are listed. The filtered view is derived from
/// the query on demand; only the selection index is stored.
#[derive(Clone, Debug)]
pub struct ListingState {
    sessions: Vec<SessionSummary>,
    query: LineEditor,
    selected_index: usize,
    title_width: usize,
}

impl ListingState {
    pub fn new(sessions: Vec<SessionSummary>) -> Self {
        let title_width = title_column_width(&sessions);
        Self {
            sessions,
            query: LineEditor::new(),
            selected_index: 0,
            title_width,
        }
    }

    #[cfg(test)]
    pub fn query(&self) -> &str {
        self.query.text()
    }

    #[cfg(test)]
    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn filtered(&self) -> Vec<&SessionSummary> {
        filter_and_rank(&self.sessions, self.query.text())
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> ListingStep {
        match key {
            KeyEvent::Char(ch) => {
                self.query.push(ch);
                self.selected_index = 0;
                ListingStep::Redraw
            }
            KeyEvent::Backspace => {
                self.query.backspace();
                self.selected_index = 0;
                ListingStep::Redraw
            }
            KeyEvent::Up => {
                if !self.filtered().is_empty() {
                    self.selected_index = self.selected_index.saturating_sub(1);
                }
                ListingStep::Redraw
            }
            KeyEvent::Down => {
                let count = self.filtered().len();
                if count > 0 {
                    self.selected_index = (self.selected_index + 1).min(count - 1);
                }
                ListingStep::Redraw
            }
            KeyEvent::CreateNew => ListingStep::Finish(PickerExit::Selected(
                PickerResult::new_session(self.query.text()),
            )),
            KeyEvent::Enter => {
                let result = match self.filtered().get(self.selected_index) {
                    Some(session) => PickerResult::Existing {
                        session_id: session.id.clone(),
                    },
                    None => PickerResult::new_session(self.query.text()),
                };
                ListingStep::Finish(PickerExit::Selected(result))
            }
            KeyEvent::Escape | KeyEvent::Interrupt => ListingStep::Finish(PickerExit::Quit),
        }
    }

    pub fn render(&self, width: u16, style: FrameStyle) -> Vec<String> {
        let filtered = self.filtered();
        let view = FrameView {
            query: self.query.text(),
            filtered: &filtered,
            selected_index: self.selected_index,
            title_width: self.title_width,
        };
        render_frame(&view, width, style.now, style.palette)
    }
}
