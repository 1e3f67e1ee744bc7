//! Shared helpers for workflow integration tests.

#![allow(dead_code)]

use fingate_hardware::TextDisplay;

/// Display that keeps every screen it was asked to show.
#[derive(Debug, Default)]
pub struct RecordingDisplay {
    pub screens: Vec<(String, String)>,
    pub ticks: usize,
}

impl RecordingDisplay {
    pub fn last(&self) -> Option<(&str, &str)> {
        self.screens
            .last()
            .map(|(a, b)| (a.as_str(), b.as_str()))
    }

    pub fn contains(&self, line1: &str, line2: &str) -> bool {
        self.screens.iter().any(|(a, b)| a == line1 && b == line2)
    }

    pub fn first_lines(&self) -> Vec<&str> {
        self.screens.iter().map(|(a, _)| a.as_str()).collect()
    }
}

impl TextDisplay for RecordingDisplay {
    fn show(&mut self, line1: &str, line2: &str) {
        self.screens.push((line1.to_string(), line2.to_string()));
    }

    fn show_line(&mut self, line: usize, text: &str) {
        if let Some(last) = self.screens.last_mut() {
            match line {
                0 => last.0 = text.to_string(),
                _ => last.1 = text.to_string(),
            }
        }
    }

    fn put_char(&mut self, _column: usize, _line: usize, ch: char) {
        if ch == '.' {
            self.ticks += 1;
        }
    }
}
