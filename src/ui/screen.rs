use crossterm::cursor::MoveUp;
use crossterm::queue;
use crossterm::terminal::{Clear, ClearType};
use std::io::{self, Write};

/// Inline redraw below the cursor. Each draw first erases exactly the lines
/// written by the previous draw, so frames of any height replace each other
/// without leaving residue.
#[derive(Debug, Default)]
pub struct Screen {
    lines_drawn: usize,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn lines_drawn(&self) -> usize {
        self.lines_drawn
    }

    pub fn draw(&mut self, out: &mut impl Write, lines: &[String]) -> io::Result<()> {
        self.erase_lines(out)?;
        for line in lines {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        self.lines_drawn = lines.len();
        Ok(())
    }

    /// Erases the current frame without drawing a new one.
    pub fn clear(&mut self, out: &mut impl Write) -> io::Result<()> {
        self.erase_lines(out)?;
        out.flush()
    }

    fn erase_lines(&mut self, out: &mut impl Write) -> io::Result<()> {
        for _ in 0..self.lines_drawn {
            queue!(out, MoveUp(1), Clear(ClearType::CurrentLine))?;
        }
        self.lines_drawn = 0;
        Ok(())
    }
}
