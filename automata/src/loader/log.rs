use std::fmt::Display;

use crate::loader::Span;

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Logs {
    logs: Vec<LogEntry>,
    has_error: bool,
}

pub trait LogSink {
    fn emit(&mut self, entry: LogEntry) -> &mut LogEntry;

    fn emit_error_locless(&mut self, msg: impl Into<String>) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Error, msg, None))
    }

    fn emit_error(&mut self, msg: impl Into<String>, span: Span) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Error, msg, Some(span)))
    }

    fn emit_warning(&mut self, msg: impl Into<String>, span: Span) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Warning, msg, Some(span)))
    }

    fn emit_warning_locless(&mut self, msg: impl Into<String>) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Warning, msg, None))
    }

    fn emit_help_locless(&mut self, msg: impl Into<String>) -> &mut LogEntry {
        self.emit(LogEntry::new(LogLevel::Help, msg, None))
    }
}

impl LogSink for Logs {
    fn emit(&mut self, entry: LogEntry) -> &mut LogEntry {
        self.has_error |= matches!(entry.level, LogLevel::Error);
        self.logs.push(entry);
        let last = self.logs.len() - 1;
        &mut self.logs[last]
    }
}

impl Logs {
    pub fn new() -> Self {
        Self {
            logs: Vec::new(),
            has_error: false,
        }
    }

    pub fn contains_errors(&self) -> bool {
        self.has_error
    }

    pub fn displayable_with<'a>(
        &'a self,
        src: &'a str,
    ) -> impl Iterator<Item = LogEntryDisplay<'a>> {
        self.logs.iter().map(|entry| LogEntryDisplay { src, entry })
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn into_entries(self) -> impl Iterator<Item = LogEntry> {
        self.logs.into_iter()
    }

    /// Messages of error entries, each followed by its chained notes.
    pub fn error_messages(&self) -> Vec<String> {
        self.logs
            .iter()
            .filter(|entry| entry.level == LogLevel::Error)
            .map(LogEntry::describe)
            .collect()
    }
}

impl Default for Logs {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize), serde(rename_all = "snake_case"))]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Help,
}

#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct LogEntry {
    pub message: String,
    pub span: Option<Span>,
    pub level: LogLevel,
    pub child: Option<Box<LogEntry>>,
}

impl LogEntry {
    pub fn new(level: LogLevel, message: impl Into<String>, span: Option<Span>) -> Self {
        Self {
            message: message.into(),
            span,
            level,
            child: None,
        }
    }

    /// The message followed by every chained note in parentheses.
    pub fn describe(&self) -> String {
        let mut message = self.message.clone();
        let mut child = self.child.as_deref();
        while let Some(note) = child {
            message.push_str(" (");
            message.push_str(&note.message);
            message.push(')');
            child = note.child.as_deref();
        }
        message
    }
}

impl LogSink for LogEntry {
    fn emit(&mut self, entry: LogEntry) -> &mut LogEntry {
        self.child.insert(Box::new(entry))
    }
}

pub struct LogEntryDisplay<'a> {
    src: &'a str,
    entry: &'a LogEntry,
}

/// 1-based line and column of a byte offset.
pub fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let before = src.get(..offset).unwrap_or(src);
    let line = before.matches('\n').count() + 1;
    let column = before.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
    (line, column)
}

impl<'a> Display for LogEntryDisplay<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        pub const RESET: &str = "\x1b[0;22m";
        pub const BOLD: &str = "\x1b[1m";
        pub const RED: &str = "\x1b[31m";
        pub const GREEN: &str = "\x1b[32m";
        pub const YELLOW: &str = "\x1b[33m";
        pub const CYAN: &str = "\x1b[36m";

        let mut next_entry = Some(self.entry);

        while let Some(entry) = next_entry {
            match entry.level {
                LogLevel::Help => write!(f, "{BOLD}{GREEN}help{RESET}{BOLD}: ")?,
                LogLevel::Info => write!(f, "{BOLD}{CYAN}info{RESET}{BOLD}: ")?,
                LogLevel::Warning => write!(f, "{BOLD}{YELLOW}warning{RESET}{BOLD}: ")?,
                LogLevel::Error => write!(f, "{BOLD}{RED}error{RESET}{BOLD}: ")?,
            }
            writeln!(f, "{}{RESET}", entry.message)?;

            if let Some(Span(start, end)) = entry.span {
                let (line, column) = line_col(self.src, start);
                writeln!(f, "{BOLD}{CYAN}  --> {line}:{column}{RESET}")?;

                let line_start = self
                    .src
                    .get(..start)
                    .and_then(|s| s.rfind('\n'))
                    .map_or(0, |v| v + 1);
                let line_end = self
                    .src
                    .get(start..)
                    .and_then(|s| s.find('\n'))
                    .map_or(self.src.len(), |v| v + start);
                let text = self.src.get(line_start..line_end).unwrap_or("");

                let gutter = line.to_string();
                writeln!(f, "{BOLD}{CYAN}{gutter} | {RESET}{}", text.replace('\t', " "))?;
                write!(f, "{BOLD}{CYAN}{:width$} | ", "", width = gutter.len())?;

                let mut index = line_start;
                for c in text.chars() {
                    if index >= end.max(start + 1) {
                        break;
                    }
                    write!(f, "{}", if index >= start { '~' } else { ' ' })?;
                    index += c.len_utf8();
                }
                writeln!(f, "{RESET}")?;
            }
            next_entry = entry.child.as_deref()
        }

        Ok(())
    }
}
