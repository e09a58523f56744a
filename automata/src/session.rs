use std::collections::VecDeque;

use crate::{automaton::AutomatonSpec, error::Error, presets};

/// Oldest snapshots are dropped past this many.
pub const HISTORY_LIMIT: usize = 100;

/// The document being edited plus a linear undo history. Every edit replaces
/// the whole document; snapshots are never mutated in place.
#[derive(Clone, Debug)]
pub struct Session {
    history: VecDeque<AutomatonSpec>,
    cursor: usize,
}

impl Session {
    pub fn new(spec: AutomatonSpec) -> Self {
        Self {
            history: VecDeque::from([spec]),
            cursor: 0,
        }
    }

    pub fn current(&self) -> &AutomatonSpec {
        &self.history[self.cursor]
    }

    /// Makes `spec` the current document, discarding anything that could
    /// have been redone.
    pub fn replace(&mut self, spec: AutomatonSpec) {
        self.history.truncate(self.cursor + 1);
        self.history.push_back(spec);
        while self.history.len() > HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.cursor = self.history.len() - 1;
    }

    pub fn update(&mut self, edit: impl FnOnce(&AutomatonSpec) -> AutomatonSpec) {
        let next = edit(self.current());
        self.replace(next);
    }

    /// Replaces the document only when `spec` was produced successfully.
    pub fn try_replace(&mut self, spec: Result<AutomatonSpec, Error>) -> Result<(), Error> {
        self.replace(spec?);
        Ok(())
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Back to the default document with an empty history.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(presets::nfa_example())
    }
}
