use std::{collections::BTreeMap, fmt::Display};

use crate::error::Error;

pub mod determinize;
pub mod fa;
pub mod pda;
pub mod tm;
pub mod validate;

pub const EPSILON: &str = "ε";
pub const BLANK: &str = "⊔";
pub const DEFAULT_STACK_BOTTOM: &str = "Z";
pub const DEFAULT_STEP_LIMIT: usize = 2000;

/// What a kind of machine is allowed to declare.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    pub non_deterministic: bool,
    pub epsilon_moves: bool,
}

/// Simulation bounds and defaults. Values carried by the document itself
/// (`stackBottom`, `maxSteps`) take precedence over these.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    pub pda_steps: usize,
    pub tm_steps: usize,
    pub stack_bottom: Symbol,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            pda_steps: DEFAULT_STEP_LIMIT,
            tm_steps: DEFAULT_STEP_LIMIT,
            stack_bottom: Symbol::new(DEFAULT_STACK_BOTTOM),
        }
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct State(pub String);

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for State {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(transparent))]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn blank() -> Self {
        Self::new(BLANK)
    }

    /// `None` when the token spells the empty string.
    pub fn optional(token: impl Into<String>) -> Option<Self> {
        let symbol = Self::new(token);
        (!symbol.is_epsilon()).then_some(symbol)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self.0.as_str(), crate::epsilon!(pat))
    }

    pub fn is_blank(&self) -> bool {
        self.0 == BLANK
    }

    pub fn is_char(&self, c: char) -> bool {
        let mut chars = self.0.chars();
        chars.next() == Some(c) && chars.next().is_none()
    }
}

impl From<char> for Symbol {
    fn from(value: char) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for Symbol {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn symbol_or_epsilon(symbol: Option<&Symbol>) -> &str {
    symbol.map_or(EPSILON, Symbol::as_str)
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize), serde(rename_all = "UPPERCASE"))]
pub enum Kind {
    Dfa,
    Nfa,
    Pda,
    Tm,
}

impl Kind {
    pub const ALL: [Kind; 4] = [Kind::Dfa, Kind::Nfa, Kind::Pda, Kind::Tm];

    pub fn options(self) -> Options {
        match self {
            Kind::Dfa | Kind::Tm => Options {
                non_deterministic: false,
                epsilon_moves: false,
            },
            Kind::Nfa | Kind::Pda => Options {
                non_deterministic: true,
                epsilon_moves: true,
            },
        }
    }

    pub fn is_finite(self) -> bool {
        matches!(self, Kind::Dfa | Kind::Nfa)
    }
}

impl Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Kind::Dfa => "DFA",
            Kind::Nfa => "NFA",
            Kind::Pda => "PDA",
            Kind::Tm => "TM",
        })
    }
}

impl std::str::FromStr for Kind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dfa" | "DFA" => Ok(Kind::Dfa),
            "nfa" | "NFA" => Ok(Kind::Nfa),
            "pda" | "PDA" => Ok(Kind::Pda),
            "tm" | "TM" => Ok(Kind::Tm),
            _ => Err(format!("unknown type {s:?}, expected 'DFA' | 'NFA' | 'PDA' | 'TM'")),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FaTransition {
    pub from: State,
    #[cfg_attr(feature = "serde", serde(with = "epsilon", default))]
    pub symbol: Option<Symbol>,
    pub to: State,
}

impl FaTransition {
    pub fn new(from: impl Into<String>, symbol: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: State::new(from),
            symbol: Symbol::optional(symbol),
            to: State::new(to),
        }
    }

    pub fn reads(&self, c: char) -> bool {
        self.symbol.as_ref().is_some_and(|symbol| symbol.is_char(c))
    }

    pub fn symbol_str(&self) -> &str {
        symbol_or_epsilon(self.symbol.as_ref())
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PdaTransition {
    pub from: State,
    #[cfg_attr(feature = "serde", serde(with = "epsilon", default))]
    pub read: Option<Symbol>,
    #[cfg_attr(feature = "serde", serde(with = "epsilon", default))]
    pub pop: Option<Symbol>,
    /// Pushed first to last, so the last symbol ends up on top.
    #[cfg_attr(feature = "serde", serde(with = "push", default))]
    pub push: Vec<Symbol>,
    pub to: State,
}

impl PdaTransition {
    /// `push` is split into one symbol per character, ε dropped.
    pub fn new(
        from: impl Into<String>,
        read: impl Into<String>,
        pop: impl Into<String>,
        push: &str,
        to: impl Into<String>,
    ) -> Self {
        Self {
            from: State::new(from),
            read: Symbol::optional(read),
            pop: Symbol::optional(pop),
            push: push.chars().filter_map(Symbol::optional).collect(),
            to: State::new(to),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    #[cfg_attr(feature = "serde", serde(rename = "L", alias = "left"))]
    Left,
    #[cfg_attr(feature = "serde", serde(rename = "R", alias = "right"))]
    Right,
}

impl Direction {
    pub fn offset(self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TmTransition {
    pub from: State,
    pub read: Symbol,
    pub write: Symbol,
    #[cfg_attr(feature = "serde", serde(rename = "move"))]
    pub direction: Direction,
    pub to: State,
}

impl TmTransition {
    pub fn new(
        from: impl Into<String>,
        read: impl Into<String>,
        write: impl Into<String>,
        direction: Direction,
        to: impl Into<String>,
    ) -> Self {
        Self {
            from: State::new(from),
            read: Symbol::new(read),
            write: Symbol::new(write),
            direction,
            to: State::new(to),
        }
    }
}

/// Transition table of a spec, one variant per kind of machine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(tag = "type", rename_all = "UPPERCASE")
)]
pub enum Machine {
    Dfa {
        #[cfg_attr(feature = "serde", serde(default))]
        transitions: Vec<FaTransition>,
    },
    Nfa {
        #[cfg_attr(feature = "serde", serde(default))]
        transitions: Vec<FaTransition>,
    },
    Pda {
        #[cfg_attr(
            feature = "serde",
            serde(rename = "stackBottom", default, skip_serializing_if = "Option::is_none")
        )]
        stack_bottom: Option<Symbol>,
        #[cfg_attr(feature = "serde", serde(default))]
        transitions: Vec<PdaTransition>,
    },
    Tm {
        #[cfg_attr(
            feature = "serde",
            serde(rename = "maxSteps", default, skip_serializing_if = "Option::is_none")
        )]
        max_steps: Option<usize>,
        #[cfg_attr(feature = "serde", serde(default))]
        transitions: Vec<TmTransition>,
    },
}

impl Machine {
    pub fn empty(kind: Kind) -> Self {
        match kind {
            Kind::Dfa => Machine::Dfa {
                transitions: Vec::new(),
            },
            Kind::Nfa => Machine::Nfa {
                transitions: Vec::new(),
            },
            Kind::Pda => Machine::Pda {
                stack_bottom: None,
                transitions: Vec::new(),
            },
            Kind::Tm => Machine::Tm {
                max_steps: None,
                transitions: Vec::new(),
            },
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Machine::Dfa { .. } => Kind::Dfa,
            Machine::Nfa { .. } => Kind::Nfa,
            Machine::Pda { .. } => Kind::Pda,
            Machine::Tm { .. } => Kind::Tm,
        }
    }

    pub fn fa_transitions(&self) -> Option<&[FaTransition]> {
        match self {
            Machine::Dfa { transitions } | Machine::Nfa { transitions } => Some(transitions),
            Machine::Pda { .. } | Machine::Tm { .. } => None,
        }
    }

    /// `(from, to)` of every transition in declaration order.
    pub fn endpoints(&self) -> Vec<(&State, &State)> {
        match self {
            Machine::Dfa { transitions } | Machine::Nfa { transitions } => {
                transitions.iter().map(|t| (&t.from, &t.to)).collect()
            }
            Machine::Pda { transitions, .. } => {
                transitions.iter().map(|t| (&t.from, &t.to)).collect()
            }
            Machine::Tm { transitions, .. } => {
                transitions.iter().map(|t| (&t.from, &t.to)).collect()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.endpoints().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AutomatonSpec {
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub machine: Machine,
    #[cfg_attr(feature = "serde", serde(default))]
    pub alphabet: Vec<Symbol>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub states: Vec<State>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub start: Option<State>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub finals: Vec<State>,
    /// Display hint only; no simulator consults it.
    #[cfg_attr(feature = "serde", serde(default))]
    pub rejects: Vec<State>,
}

impl AutomatonSpec {
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            alphabet: Vec::new(),
            states: Vec::new(),
            start: None,
            finals: Vec::new(),
            rejects: Vec::new(),
        }
    }

    pub fn with_alphabet<S: Into<String>>(mut self, alphabet: impl IntoIterator<Item = S>) -> Self {
        self.alphabet = alphabet.into_iter().map(Symbol::new).collect();
        self
    }

    pub fn with_states<S: Into<String>>(mut self, states: impl IntoIterator<Item = S>) -> Self {
        self.states = states.into_iter().map(State::new).collect();
        self
    }

    pub fn with_start(mut self, start: impl Into<String>) -> Self {
        self.start = Some(State::new(start));
        self
    }

    pub fn with_finals<S: Into<String>>(mut self, finals: impl IntoIterator<Item = S>) -> Self {
        self.finals = finals.into_iter().map(State::new).collect();
        self
    }

    pub fn kind(&self) -> Kind {
        self.machine.kind()
    }

    pub fn is_final(&self, state: &State) -> bool {
        self.finals.contains(state)
    }

    pub fn has_state(&self, state: &State) -> bool {
        self.states.contains(state)
    }

    pub(crate) fn start(&self) -> Result<&State, Error> {
        self.start.as_ref().ok_or(Error::MissingStart)
    }

    /// Same states and alphabet under another kind; the transition table is
    /// cleared since its records no longer fit.
    pub fn retyped(&self, kind: Kind) -> Self {
        Self {
            machine: Machine::empty(kind),
            ..self.clone()
        }
    }
}

/// Outcome of one simulation: the verdict plus every configuration visited,
/// the initial one first.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Run<I = Id> {
    pub accepted: bool,
    pub ids: Vec<I>,
}

impl<I> Run<I> {
    pub fn map<J>(self, map: impl FnMut(I) -> J) -> Run<J> {
        Run {
            accepted: self.accepted,
            ids: self.ids.into_iter().map(map).collect(),
        }
    }

    pub fn last(&self) -> Option<&I> {
        self.ids.last()
    }
}

/// Instantaneous description of any kind of machine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize),
    serde(tag = "type", rename_all = "UPPERCASE")
)]
pub enum Id {
    Dfa(fa::DfaId),
    Nfa(fa::NfaId),
    Pda(pda::PdaId),
    Tm(tm::TmId),
}

impl Id {
    pub fn kind(&self) -> Kind {
        match self {
            Id::Dfa(_) => Kind::Dfa,
            Id::Nfa(_) => Kind::Nfa,
            Id::Pda(_) => Kind::Pda,
            Id::Tm(_) => Kind::Tm,
        }
    }
}

impl Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Id::Dfa(id) => write!(f, "{id}"),
            Id::Nfa(id) => write!(f, "{id}"),
            Id::Pda(id) => write!(f, "{id}"),
            Id::Tm(id) => write!(f, "{id}"),
        }
    }
}

pub fn simulate(spec: &AutomatonSpec, input: &str) -> Result<Run, Error> {
    simulate_with(spec, input, &Limits::default())
}

pub fn simulate_with(spec: &AutomatonSpec, input: &str, limits: &Limits) -> Result<Run, Error> {
    Ok(match spec.kind() {
        Kind::Dfa => fa::simulate_dfa(spec, input)?.map(Id::Dfa),
        Kind::Nfa => fa::simulate_nfa(spec, input)?.map(Id::Nfa),
        Kind::Pda => pda::simulate(spec, input, limits)?.map(Id::Pda),
        Kind::Tm => tm::simulate(spec, input, limits)?.map(Id::Tm),
    })
}

/// Renders a sparse tape from its leftmost to its rightmost non-blank cell.
pub(crate) fn tape_contents(tape: &BTreeMap<i64, Symbol>) -> String {
    let written = || tape.iter().filter(|(_, symbol)| !symbol.is_blank());
    let (Some((&first, _)), Some((&last, _))) = (written().next(), written().last()) else {
        return String::new();
    };
    (first..=last)
        .map(|cell| tape.get(&cell).map_or(BLANK, Symbol::as_str))
        .collect()
}

#[cfg(feature = "serde")]
mod epsilon {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{Symbol, symbol_or_epsilon};

    pub fn serialize<S: Serializer>(symbol: &Option<Symbol>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(symbol_or_epsilon(symbol.as_ref()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Symbol>, D::Error> {
        Ok(Option::<String>::deserialize(d)?.and_then(Symbol::optional))
    }
}

/// Push sequences are written as a plain string (`"AZ"`) when every symbol is
/// a single character, as a list otherwise. Both forms are read back.
#[cfg(feature = "serde")]
mod push {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::{EPSILON, Symbol};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        List(Vec<String>),
    }

    pub fn serialize<S: Serializer>(push: &[Symbol], s: S) -> Result<S::Ok, S::Error> {
        if push.is_empty() {
            s.serialize_str(EPSILON)
        } else if push.iter().all(|symbol| symbol.as_str().chars().count() == 1) {
            s.serialize_str(&push.iter().map(Symbol::as_str).collect::<String>())
        } else {
            push.serialize(s)
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Symbol>, D::Error> {
        Ok(match Option::<Raw>::deserialize(d)? {
            None => Vec::new(),
            Some(Raw::Text(text)) if Symbol::optional(text.as_str()).is_none() => Vec::new(),
            Some(Raw::Text(text)) => text.chars().filter_map(Symbol::optional).collect(),
            Some(Raw::List(list)) => list.into_iter().filter_map(Symbol::optional).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epsilon_spellings() {
        for token in ["", "ε"] {
            assert_eq!(Symbol::optional(token), None, "{token:?}");
        }
        for token in ["a", "λ", "ϵ", "epsilon"] {
            assert_eq!(Symbol::optional(token), Some(Symbol::new(token)), "{token:?}");
        }
    }

    #[test]
    fn lambda_is_an_ordinary_symbol() {
        let t = PdaTransition::new("q0", "λ", "ε", "λZ", "q0");
        assert_eq!(t.read, Some(Symbol::new("λ")));
        assert_eq!(t.pop, None);
        assert_eq!(t.push, vec![Symbol::new("λ"), Symbol::new("Z")]);
    }

    #[test]
    fn push_splits_per_character() {
        let t = PdaTransition::new("q0", "a", "Z", "ZA", "q0");
        assert_eq!(t.push, vec![Symbol::new("Z"), Symbol::new("A")]);
        assert!(PdaTransition::new("q0", "b", "A", "ε", "q0").push.is_empty());
    }

    #[test]
    fn retyping_clears_transitions() {
        let spec = crate::presets::nfa_example();
        let tm = spec.retyped(Kind::Tm);
        assert_eq!(tm.kind(), Kind::Tm);
        assert!(tm.machine.is_empty());
        assert_eq!(tm.states, spec.states);
    }

    #[test]
    fn tape_rendering_trims_blanks() {
        let tape = BTreeMap::from([
            (-2, Symbol::blank()),
            (0, Symbol::new("1")),
            (2, Symbol::new("0")),
            (3, Symbol::blank()),
        ]);
        assert_eq!(tape_contents(&tape), "1⊔0");
        assert_eq!(tape_contents(&BTreeMap::new()), "");
    }

    #[test]
    fn dispatch_tags_ids_by_kind() {
        for spec in [
            crate::presets::dfa_a_star_b_star(),
            crate::presets::nfa_example(),
            crate::presets::pda_anbn(),
            crate::presets::tm_unary_increment(),
        ] {
            let run = simulate(&spec, "").unwrap();
            assert!(run.ids.iter().all(|id| id.kind() == spec.kind()));
        }
    }
}
