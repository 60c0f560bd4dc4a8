use crate::domain::KeyEvent;
use crossterm::event::{self as term, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use std::io;

const FALLBACK_WIDTH: u16 = 80;

/// Keystrokes and geometry of the terminal the picker draws on.
pub trait TerminalInput {
    /// Blocks until the next key the picker understands.
    fn read_key(&mut self) -> io::Result<KeyEvent>;

    fn width(&self) -> u16;
}

/// Reads from the controlling terminal. Raw mode is switched on only while a
/// key is being read and restored to its previous setting afterwards.
#[derive(Debug, Default)]
pub struct RawTerminal;

impl TerminalInput for RawTerminal {
    fn read_key(&mut self) -> io::Result<KeyEvent> {
        loop {
            if let Event::Key(key) = read_event_raw()? {
                if let Some(key) = decode_key(key) {
                    return Ok(key);
                }
            }
        }
    }

    fn width(&self) -> u16 {
        match terminal::size() {
            Ok((cols, _)) if cols > 0 => cols,
            _ => FALLBACK_WIDTH,
        }
    }
}

fn read_event_raw() -> io::Result<Event> {
    let was_raw = terminal::is_raw_mode_enabled()?;
    if !was_raw {
        terminal::enable_raw_mode()?;
    }
    let event = term::read();
    if !was_raw {
        terminal::disable_raw_mode()?;
    }
    event
}

pub fn decode_key(key: term::KeyEvent) -> Option<KeyEvent> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);
    match key.code {
        KeyCode::Up => Some(KeyEvent::Up),
        KeyCode::Down => Some(KeyEvent::Down),
        KeyCode::Enter => Some(KeyEvent::Enter),
        KeyCode::Backspace => Some(KeyEvent::Backspace),
        KeyCode::Esc => Some(KeyEvent::Escape),
        KeyCode::Char('c') if ctrl => Some(KeyEvent::Interrupt),
        KeyCode::Char('n') if ctrl => Some(KeyEvent::CreateNew),
        KeyCode::Char('h') if ctrl => Some(KeyEvent::Backspace),
        KeyCode::Char(ch) if !ctrl && !alt && !ch.is_control() => Some(KeyEvent::Char(ch)),
        _ => None,
    }
}
