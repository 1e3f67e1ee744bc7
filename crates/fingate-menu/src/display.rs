//! In-memory character LCD.
//!
//! [`LcdFrame`] holds what a 2-line x 16-column HD44780-style display would
//! show. Every line is always exactly `columns` characters wide: shorter text
//! is padded with spaces, longer text is cut off.
//!
//! # Character set
//!
//! The panel only has glyphs for printable ASCII. Control characters are
//! dropped and any other character is shown as `?`.
//!
//! # Examples
//!
//! ```
//! use fingate_hardware::TextDisplay;
//! use fingate_menu::LcdFrame;
//!
//! let mut lcd = LcdFrame::default();
//! lcd.show("Good Morning", "08:15:00 07/03");
//!
//! assert_eq!(lcd.get_line(0).unwrap(), "Good Morning    ");
//! assert_eq!(lcd.revision(), 1);
//! ```

use std::fmt;

use tracing::warn;

use fingate_core::constants::{LCD_COLUMNS, LCD_LINES};
use fingate_core::{Error, Result};
use fingate_hardware::TextDisplay;

/// Character display frame buffer.
///
/// Not thread-safe. The control loop is its only writer.
#[derive(Debug, Clone)]
pub struct LcdFrame {
    lines: usize,
    columns: usize,
    buffer: Vec<String>,
    /// Incremented on every write, including writes that change nothing.
    revision: u64,
}

impl LcdFrame {
    /// Blank display of the given size.
    pub fn new(lines: usize, columns: usize) -> Self {
        Self {
            lines,
            columns,
            buffer: vec![" ".repeat(columns); lines],
            revision: 0,
        }
    }

    /// Write `text` to `line`, left aligned.
    ///
    /// # Errors
    /// Returns `Error::InvalidLine` if `line` is out of range.
    pub fn set_line(&mut self, line: usize, text: &str) -> Result<()> {
        self.check_line(line)?;
        self.write_line(line, text);
        self.revision += 1;
        Ok(())
    }

    /// Overwrite one cell.
    ///
    /// # Errors
    /// Returns `Error::InvalidLine` if `line` is out of range. A column past
    /// the right edge is ignored, as the panel does.
    pub fn set_char(&mut self, column: usize, line: usize, ch: char) -> Result<()> {
        self.check_line(line)?;
        if column >= self.columns {
            return Ok(());
        }
        let glyph = sanitize_char(ch).unwrap_or(' ');
        let mut cells: Vec<char> = self.buffer[line].chars().collect();
        cells[column] = glyph;
        self.buffer[line] = cells.into_iter().collect();
        self.revision += 1;
        Ok(())
    }

    /// # Errors
    /// Returns `Error::InvalidLine` if `line` is out of range.
    pub fn get_line(&self, line: usize) -> Result<&str> {
        self.check_line(line)?;
        Ok(&self.buffer[line])
    }

    pub fn get_all_lines(&self) -> Vec<&str> {
        self.buffer.iter().map(|s| s.as_str()).collect()
    }

    /// Number of writes so far. Compare two values to see whether the
    /// display was touched in between.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    fn write_line(&mut self, line: usize, text: &str) {
        self.buffer[line] = pad_line(&sanitize_text(text), self.columns);
    }

    fn check_line(&self, line: usize) -> Result<()> {
        if line >= self.lines {
            return Err(Error::InvalidLine {
                line,
                max: self.lines.saturating_sub(1),
            });
        }
        Ok(())
    }
}

impl Default for LcdFrame {
    fn default() -> Self {
        Self::new(LCD_LINES, LCD_COLUMNS)
    }
}

impl TextDisplay for LcdFrame {
    fn show(&mut self, line1: &str, line2: &str) {
        for (line, text) in [line1, line2].into_iter().enumerate().take(self.lines) {
            self.write_line(line, text);
        }
        for line in self.buffer.iter_mut().skip(2) {
            *line = " ".repeat(self.columns);
        }
        self.revision += 1;
    }

    fn show_line(&mut self, line: usize, text: &str) {
        if let Err(e) = self.set_line(line, text) {
            warn!(error = %e, "display write dropped");
        }
    }

    fn put_char(&mut self, column: usize, line: usize, ch: char) {
        if let Err(e) = self.set_char(column, line, ch) {
            warn!(error = %e, "display write dropped");
        }
    }

    fn last_column(&self) -> usize {
        self.columns.saturating_sub(1)
    }
}

/// Boxed rendering, one display line per text line.
///
/// ```text
/// +----------------+
/// |Good Morning    |
/// |08:15:00 07/03  |
/// +----------------+
/// ```
impl fmt::Display for LcdFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = format!("+{}+", "-".repeat(self.columns));
        writeln!(f, "{}", border)?;
        for line in &self.buffer {
            writeln!(f, "|{}|", line)?;
        }
        write!(f, "{}", border)
    }
}

/// Pad with spaces or cut off to exactly `width` characters.
fn pad_line(text: &str, width: usize) -> String {
    let mut line: String = text.chars().take(width).collect();
    let padding = width - line.chars().count();
    line.extend(std::iter::repeat_n(' ', padding));
    line
}

fn sanitize_char(ch: char) -> Option<char> {
    match ch {
        ' '..='~' => Some(ch),
        c if c.is_control() => None,
        _ => Some('?'),
    }
}

fn sanitize_text(text: &str) -> String {
    text.chars().filter_map(sanitize_char).collect()
}
