//! Boundary collaborators: the structural JSON form and the JFLAP interchange
//! format. Neither performs semantic validation.

use crate::{
    error::Error,
    loader::log::{LogEntry, LogSink},
};

pub mod ast;
pub mod jff;
#[cfg(feature = "serde")]
pub mod json;
pub mod lexer;
pub mod log;
pub mod parser;

#[macro_export]
macro_rules! maker {
    (pat: $($pat:pat),*) => {
      $($pat)|*
    };
    (arr: $($expr:expr),*) => {
        [$($expr),*]
    };
}

/// Spellings of the empty string. Look-alikes such as `λ` are ordinary
/// symbols.
#[macro_export]
macro_rules! epsilon {
    ($ident: ident) => {
      $crate::maker!($ident: "", "ε")
    };
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Span(pub usize, pub usize);
impl Span {
    pub fn join(&self, end: Span) -> Span {
        Span(self.0, end.1)
    }
}

#[derive(Clone, Copy, Hash, PartialEq, Eq, Debug)]
pub struct Spanned<T>(pub T, pub Span);
impl<T> Spanned<T> {
    pub fn map<R>(self, map: impl Fn(T) -> R) -> Spanned<R> {
        Spanned(map(self.0), self.1)
    }

    pub fn as_ref(&self) -> Spanned<&T> {
        Spanned(&self.0, self.1)
    }
}

/// Source text plus the diagnostics collected while reading it.
pub struct Context<'a> {
    logs: log::Logs,
    src: &'a str,
}

impl<'a> LogSink for Context<'a> {
    fn emit(&mut self, entry: LogEntry) -> &mut LogEntry {
        self.logs.emit(entry)
    }
}

impl<'a> Context<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            logs: log::Logs::new(),
            src,
        }
    }

    pub fn src(&self) -> &'a str {
        self.src
    }

    pub fn logs(&self) -> &log::Logs {
        &self.logs
    }

    pub fn logs_display(&self) -> impl Iterator<Item = log::LogEntryDisplay<'_>> {
        self.logs.displayable_with(self.src)
    }

    pub fn eof(&self) -> Span {
        Span(self.src.len(), self.src.len())
    }

    pub fn contains_errors(&self) -> bool {
        self.logs.contains_errors()
    }

    pub fn into_logs(self) -> log::Logs {
        self.logs
    }

    /// Error messages prefixed with their `line:column`.
    pub fn to_error(&self) -> Error {
        let messages = self
            .logs
            .entries()
            .iter()
            .filter(|entry| entry.level == log::LogLevel::Error)
            .map(|entry| match entry.span {
                Some(Span(start, _)) => {
                    let (line, column) = log::line_col(self.src, start);
                    format!("{line}:{column}: {}", entry.describe())
                }
                None => entry.describe(),
            })
            .collect();
        Error::Malformed(messages)
    }
}
