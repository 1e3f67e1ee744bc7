//! Display that mirrors the LCD to stdout.

use fingate_hardware::TextDisplay;
use fingate_menu::LcdFrame;

/// Wraps an [`LcdFrame`] and prints it whenever its content changes.
///
/// The menu re-renders the same screen every refresh interval, so frames are
/// compared before printing.
#[derive(Debug, Default)]
pub struct TerminalDisplay {
    lcd: LcdFrame,
    last_printed: Option<Vec<String>>,
}

impl TerminalDisplay {
    pub fn frame(&self) -> &LcdFrame {
        &self.lcd
    }

    /// Print the frame if it differs from the last one printed.
    ///
    /// Returns whether anything was printed.
    fn flush(&mut self) -> bool {
        let lines: Vec<String> = self.lcd.get_all_lines().into_iter().map(str::to_owned).collect();
        if self.last_printed.as_ref() == Some(&lines) {
            return false;
        }
        println!("{}", self.lcd);
        self.last_printed = Some(lines);
        true
    }
}

impl TextDisplay for TerminalDisplay {
    fn show(&mut self, line1: &str, line2: &str) {
        self.lcd.show(line1, line2);
        self.flush();
    }

    fn show_line(&mut self, line: usize, text: &str) {
        self.lcd.show_line(line, text);
        self.flush();
    }

    fn put_char(&mut self, column: usize, line: usize, ch: char) {
        self.lcd.put_char(column, line, ch);
        self.flush();
    }

    fn last_column(&self) -> usize {
        self.lcd.last_column()
    }
}
