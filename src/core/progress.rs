use std::fmt;

/// One line of human-readable progress output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Section title, `level` 1 is the outermost
    Header { level: usize, text: String },
    /// Section title with an `i of N` counter
    Numbered {
        level: usize,
        text: String,
        index: usize,
        total: usize,
    },
    /// Indented detail line
    Item { level: usize, text: String },
}

impl Line {
    pub fn header(level: usize, text: impl Into<String>) -> Self {
        Line::Header {
            level,
            text: text.into(),
        }
    }

    pub fn numbered(level: usize, text: impl Into<String>, index: usize, total: usize) -> Self {
        Line::Numbered {
            level,
            text: text.into(),
            index,
            total,
        }
    }

    pub fn item(level: usize, text: impl Into<String>) -> Self {
        Line::Item {
            level,
            text: text.into(),
        }
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Header { level, text } => {
                write!(f, "{} {}", "#".repeat((*level).max(1)), text)
            }
            Line::Numbered {
                level,
                text,
                index,
                total,
            } => write!(
                f,
                "{} {} ({} of {})",
                "#".repeat((*level).max(1)),
                text,
                index,
                total
            ),
            Line::Item { level, text } => write!(f, "{}{}", "    ".repeat(*level), text),
        }
    }
}

/// Receives the progress output of an export run.
///
/// The CLI prints to stdout; the GUI forwards lines to its window. Any
/// `FnMut(Line)` closure is a sink.
pub trait ProgressSink {
    fn emit(&mut self, line: Line);
}

impl<F: FnMut(Line)> ProgressSink for F {
    fn emit(&mut self, line: Line) {
        self(line)
    }
}

pub struct StdoutSink;

impl ProgressSink for StdoutSink {
    fn emit(&mut self, line: Line) {
        if matches!(line, Line::Header { level: 1, .. } | Line::Numbered { level: 1, .. }) {
            println!();
        }
        println!("{}", line);
    }
}
