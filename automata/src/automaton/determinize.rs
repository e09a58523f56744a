//! NFA to DFA conversion by subset construction.

use std::collections::{BTreeSet, HashMap, VecDeque};

use super::{
    fa::{epsilon_closure, move_set, set_name},
    *,
};

/// One `(S, a, T)` expansion, in the order the construction performed it.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Step {
    pub from: BTreeSet<State>,
    pub symbol: Symbol,
    pub to: BTreeSet<State>,
}

/// A DFA state together with the NFA states it stands for.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Subset {
    pub name: State,
    pub members: BTreeSet<State>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Determinized {
    pub dfa: AutomatonSpec,
    pub steps: Vec<Step>,
    /// In discovery order; index 0 is the start subset.
    pub subsets: Vec<Subset>,
}

#[derive(Default)]
struct Subsets {
    index: HashMap<BTreeSet<State>, usize>,
    list: Vec<Subset>,
}

impl Subsets {
    /// Returns the subset's index and whether it was seen for the first time.
    fn intern(&mut self, members: BTreeSet<State>) -> (usize, bool) {
        if let Some(&index) = self.index.get(&members) {
            return (index, false);
        }
        let index = self.list.len();
        self.index.insert(members.clone(), index);
        self.list.push(Subset {
            name: State(set_name(&members)),
            members,
        });
        (index, true)
    }
}

/// Breadth-first subset construction. The result, including the order of the
/// recorded steps, depends only on the declaration order of the NFA's
/// alphabet and transitions.
pub fn determinize(nfa: &AutomatonSpec) -> Result<Determinized, Error> {
    let Machine::Nfa { transitions } = &nfa.machine else {
        return Err(Error::WrongKind {
            operation: "determinize",
            expected: "an NFA",
            found: nfa.kind(),
        });
    };
    let start = nfa.start()?;
    let alphabet: Vec<&Symbol> = nfa.alphabet.iter().filter(|a| !a.is_epsilon()).collect();

    let mut subsets = Subsets::default();
    let mut steps = Vec::new();
    let mut dfa_transitions = Vec::new();

    let (start_index, _) = subsets.intern(epsilon_closure(transitions, [start.clone()]));
    let mut queue = VecDeque::from([start_index]);

    while let Some(from_index) = queue.pop_front() {
        let from = subsets.list[from_index].members.clone();
        for &symbol in &alphabet {
            let to = epsilon_closure(transitions, move_set(transitions, &from, symbol.as_str()));
            let (to_index, fresh) = subsets.intern(to.clone());
            if fresh {
                queue.push_back(to_index);
            }

            dfa_transitions.push(FaTransition {
                from: subsets.list[from_index].name.clone(),
                symbol: Some(symbol.clone()),
                to: subsets.list[to_index].name.clone(),
            });
            steps.push(Step {
                from: from.clone(),
                symbol: symbol.clone(),
                to,
            });
        }
    }

    let subsets = subsets.list;
    let dfa = AutomatonSpec {
        machine: Machine::Dfa {
            transitions: dfa_transitions,
        },
        alphabet: alphabet.into_iter().cloned().collect(),
        states: subsets.iter().map(|s| s.name.clone()).collect(),
        start: Some(subsets[start_index].name.clone()),
        finals: subsets
            .iter()
            .filter(|s| s.members.iter().any(|state| nfa.is_final(state)))
            .map(|s| s.name.clone())
            .collect(),
        rejects: Vec::new(),
    };

    Ok(Determinized {
        dfa,
        steps,
        subsets,
    })
}
