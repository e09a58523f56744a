use std::collections::BTreeSet;

use super::*;

/// DFA configuration. `state` is `None` once the machine fell into the
/// implicit sink.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DfaId {
    pub state: Option<State>,
    pub unread: String,
}

impl Display for DfaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.as_ref().map_or("∅", State::as_str);
        write!(f, "({state}, {})", unread_or_epsilon(&self.unread))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NfaId {
    pub states: BTreeSet<State>,
    pub unread: String,
}

impl Display for NfaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "({}, {})",
            set_name(&self.states),
            unread_or_epsilon(&self.unread)
        )
    }
}

pub(crate) fn unread_or_epsilon(unread: &str) -> &str {
    if unread.is_empty() { EPSILON } else { unread }
}

/// Canonical name of a set of states: sorted members, comma joined, in
/// braces.
pub fn set_name(states: &BTreeSet<State>) -> String {
    let members: Vec<&str> = states.iter().map(State::as_str).collect();
    format!("{{{}}}", members.join(","))
}

/// Smallest superset of `seed` closed under ε-transitions.
pub fn epsilon_closure(
    transitions: &[FaTransition],
    seed: impl IntoIterator<Item = State>,
) -> BTreeSet<State> {
    let mut closure: BTreeSet<State> = seed.into_iter().collect();
    loop {
        let mut changed = false;
        for t in transitions {
            if t.symbol.is_none() && closure.contains(&t.from) && !closure.contains(&t.to) {
                closure.insert(t.to.clone());
                changed = true;
            }
        }
        if !changed {
            return closure;
        }
    }
}

/// Destinations of every `symbol` transition leaving a member of `from`. No
/// ε-closure is applied.
pub fn move_set(transitions: &[FaTransition], from: &BTreeSet<State>, symbol: &str) -> BTreeSet<State> {
    transitions
        .iter()
        .filter(|t| t.symbol.as_ref().is_some_and(|s| s.as_str() == symbol) && from.contains(&t.from))
        .map(|t| t.to.clone())
        .collect()
}

fn expect_transitions<'s>(
    spec: &'s AutomatonSpec,
    kind: Kind,
    operation: &'static str,
) -> Result<&'s [FaTransition], Error> {
    match (&spec.machine, kind) {
        (Machine::Dfa { transitions }, Kind::Dfa) | (Machine::Nfa { transitions }, Kind::Nfa) => {
            Ok(transitions)
        }
        _ => Err(Error::WrongKind {
            operation,
            expected: if kind == Kind::Dfa { "a DFA" } else { "an NFA" },
            found: spec.kind(),
        }),
    }
}

pub fn simulate_dfa(spec: &AutomatonSpec, input: &str) -> Result<Run<DfaId>, Error> {
    let transitions = expect_transitions(spec, Kind::Dfa, "DFA simulation")?;
    let mut state = spec.start()?.clone();
    let mut ids = vec![DfaId {
        state: Some(state.clone()),
        unread: input.to_owned(),
    }];

    for (position, c) in input.char_indices() {
        let Some(t) = transitions.iter().find(|t| t.from == state && t.reads(c)) else {
            ids.push(DfaId {
                state: None,
                unread: input[position..].to_owned(),
            });
            return Ok(Run {
                accepted: false,
                ids,
            });
        };
        state = t.to.clone();
        ids.push(DfaId {
            state: Some(state.clone()),
            unread: input[position + c.len_utf8()..].to_owned(),
        });
    }

    Ok(Run {
        accepted: spec.is_final(&state),
        ids,
    })
}

pub fn simulate_nfa(spec: &AutomatonSpec, input: &str) -> Result<Run<NfaId>, Error> {
    let transitions = expect_transitions(spec, Kind::Nfa, "NFA simulation")?;
    let mut current = epsilon_closure(transitions, [spec.start()?.clone()]);
    let mut ids = vec![NfaId {
        states: current.clone(),
        unread: input.to_owned(),
    }];

    let mut buf = [0; 4];
    for (position, c) in input.char_indices() {
        let moved = move_set(transitions, &current, c.encode_utf8(&mut buf));
        current = epsilon_closure(transitions, moved);
        ids.push(NfaId {
            states: current.clone(),
            unread: input[position + c.len_utf8()..].to_owned(),
        });
    }

    Ok(Run {
        accepted: current.iter().any(|state| spec.is_final(state)),
        ids,
    })
}
