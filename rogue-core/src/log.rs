//! The scrollback message log shown under the map.

use std::collections::VecDeque;

/// Indent for wrapped speech lines.
const SPEECH_INDENT: &str = "  ";

/// A bounded list of log lines. The oldest lines fall off the front.
#[derive(Debug, Clone)]
pub struct GameLog {
    lines: VecDeque<String>,
    max_lines: usize,
    wrap_width: usize,
}

impl GameLog {
    pub fn new(max_lines: usize, wrap_width: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            max_lines: max_lines.max(1),
            wrap_width: wrap_width.max(1),
        }
    }

    /// Append one line.
    pub fn push(&mut self, message: impl Into<String>) {
        self.lines.push_back(message.into());
        while self.lines.len() > self.max_lines {
            self.lines.pop_front();
        }
    }

    /// Append something a character said: the speaker on its own line,
    /// then the text word-wrapped and indented.
    pub fn push_speech(&mut self, speaker: &str, text: &str) {
        self.push(format!("{speaker}:"));
        for line in wrap(text, self.wrap_width) {
            self.push(format!("{SPEECH_INDENT}{line}"));
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.lines.back().map(String::as_str)
    }

    /// Up to `rows` lines ending `offset` lines before the newest.
    pub fn window(&self, rows: usize, offset: usize) -> Vec<&str> {
        let end = self.lines.len().saturating_sub(offset);
        let start = end.saturating_sub(rows);
        self.lines.range(start..end).map(String::as_str).collect()
    }
}

/// Greedy word wrap. Text that already fits is returned as one line, and
/// a single word longer than `width` gets a line of its own.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let text = text.trim();
    if text.chars().count() <= width {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + word.chars().count() + 1 > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded() {
        let mut log = GameLog::new(3, 70);
        for i in 0..5 {
            log.push(format!("line {i}"));
        }
        assert_eq!(log.len(), 3);
        assert_eq!(log.lines().collect::<Vec<_>>(), ["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_wrap() {
        assert_eq!(wrap("short", 70), ["short"]);

        let text = "the quick brown fox jumps over the lazy dog";
        let lines = wrap(text, 10);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
        assert_eq!(lines.join(" "), text);

        assert_eq!(wrap("a incomprehensibilities b", 5), ["a", "incomprehensibilities", "b"]);
    }

    #[test]
    fn test_speech_is_indented() {
        let mut log = GameLog::new(50, 20);
        log.push_speech("Vexa", "The paper folds remember every crease you ever made.");

        let lines: Vec<_> = log.lines().collect();
        assert_eq!(lines[0], "Vexa:");
        assert!(lines[1..].iter().all(|l| l.starts_with("  ")));
        assert!(lines.len() > 2);
    }

    #[test]
    fn test_window() {
        let mut log = GameLog::new(50, 70);
        for i in 0..10 {
            log.push(i.to_string());
        }
        assert_eq!(log.window(3, 0), ["7", "8", "9"]);
        assert_eq!(log.window(3, 2), ["5", "6", "7"]);
        assert_eq!(log.window(20, 0).len(), 10);
        assert!(log.window(3, 20).is_empty());
    }
}
