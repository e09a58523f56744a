//! Static checks over a spec. Diagnostics are advisory: they never block
//! simulation or export and are recomputed on every call.

use std::collections::{HashMap, HashSet};

use super::*;
use crate::loader::log::{LogSink, Logs};

/// Ordered, deduplicated diagnostic messages in the order they were found.
pub fn validate(spec: &AutomatonSpec) -> Vec<String> {
    let mut logs = Logs::new();
    check(spec, &mut logs);

    let mut seen = HashSet::new();
    logs.into_entries()
        .map(|entry| entry.message)
        .filter(|message| seen.insert(message.clone()))
        .collect()
}

/// Emits every diagnostic for `spec` into `sink`, duplicates included.
pub fn check(spec: &AutomatonSpec, sink: &mut impl LogSink) {
    if spec.start.is_none() {
        sink.emit_error_locless("No start state");
    }
    if spec.finals.is_empty() {
        sink.emit_warning_locless("No accepting states");
    }

    check_membership(spec, sink);

    let states: HashSet<&State> = spec.states.iter().collect();
    let Some(transitions) = spec.machine.fa_transitions() else {
        for (from, to) in spec.machine.endpoints() {
            check_endpoints(&states, from, to, sink);
        }
        return;
    };
    let options = spec.kind().options();

    // one pass so diagnostics come out per transition
    for t in transitions {
        check_endpoints(&states, &t.from, &t.to, sink);
        match &t.symbol {
            Some(symbol) if !spec.alphabet.contains(symbol) => {
                sink.emit_error_locless(format!("Symbol \"{symbol}\" not in alphabet"));
            }
            None if !options.epsilon_moves => {
                sink.emit_error_locless(format!("{} cannot use ε-transitions", spec.kind()));
            }
            _ => {}
        }
    }

    if !options.non_deterministic {
        let mut seen = HashSet::new();
        for t in transitions {
            if !seen.insert((&t.from, t.symbol_str())) {
                sink.emit_error_locless(format!(
                    "Non-deterministic: multiple edges from {} on {}",
                    t.from,
                    t.symbol_str()
                ));
            }
        }
    }

    check_reachability(spec, transitions, &states, sink);
}

fn check_endpoints(states: &HashSet<&State>, from: &State, to: &State, sink: &mut impl LogSink) {
    if !states.contains(from) || !states.contains(to) {
        sink.emit_error_locless(format!("Transition uses unknown state: {from}→{to}"));
    }
}

fn check_membership(spec: &AutomatonSpec, sink: &mut impl LogSink) {
    let mut seen = HashSet::new();
    for state in &spec.states {
        if !seen.insert(state) {
            sink.emit_error_locless(format!("Duplicate state: {state}"));
        }
    }

    if let Some(start) = &spec.start
        && !spec.has_state(start)
    {
        sink.emit_error_locless(format!("Start state {start} is not a state"));
    }
    for (role, list) in [("Accepting", &spec.finals), ("Rejecting", &spec.rejects)] {
        for state in list.iter().filter(|s| !spec.has_state(s)) {
            sink.emit_error_locless(format!("{role} state {state} is not a state"));
        }
    }
}

/// Every state reachable from `seeds` along `edges`, seeds included.
fn reach<'s>(
    seeds: impl IntoIterator<Item = &'s State>,
    edges: &HashMap<&'s State, Vec<&'s State>>,
) -> HashSet<&'s State> {
    let mut stack: Vec<&State> = seeds.into_iter().collect();
    let mut seen = HashSet::new();
    while let Some(state) = stack.pop() {
        if !seen.insert(state) {
            continue;
        }
        stack.extend(edges.get(state).into_iter().flatten().copied());
    }
    seen
}

fn check_reachability(
    spec: &AutomatonSpec,
    transitions: &[FaTransition],
    states: &HashSet<&State>,
    sink: &mut impl LogSink,
) {
    let mut forward: HashMap<&State, Vec<&State>> = HashMap::new();
    let mut backward: HashMap<&State, Vec<&State>> = HashMap::new();
    for t in transitions
        .iter()
        .filter(|t| states.contains(&t.from) && states.contains(&t.to))
    {
        forward.entry(&t.from).or_default().push(&t.to);
        backward.entry(&t.to).or_default().push(&t.from);
    }

    if let Some(start) = spec.start.as_ref().filter(|s| states.contains(s)) {
        let reachable = reach([start], &forward);
        for state in spec.states.iter().filter(|s| !reachable.contains(s)) {
            sink.emit_warning_locless(format!("Unreachable: {state}"));
        }
    }

    if !spec.finals.is_empty() {
        let live = reach(&spec.finals, &backward);
        for state in spec.states.iter().filter(|s| !live.contains(s)) {
            sink.emit_warning_locless(format!("Dead state: {state}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{loader::log::LogLevel, presets};

    fn count(diagnostics: &[String], prefix: &str) -> usize {
        diagnostics.iter().filter(|d| d.starts_with(prefix)).count()
    }

    #[test]
    fn presets_are_clean() {
        assert!(validate(&presets::dfa_a_star_b_star()).is_empty());
        assert!(validate(&presets::nfa_example()).is_empty());
        assert!(validate(&presets::pda_anbn()).is_empty());
        assert!(validate(&presets::tm_unary_increment()).is_empty());
    }

    #[test]
    fn duplicate_dfa_edge_reported_once() {
        let conflicting = |extra: Vec<FaTransition>| {
            AutomatonSpec::new(Machine::Dfa { transitions: extra })
                .with_alphabet(["a"])
                .with_states(["q0", "q1", "q2"])
                .with_start("q0")
                .with_finals(["q1", "q2"])
        };
        let both = conflicting(vec![
            FaTransition::new("q0", "a", "q1"),
            FaTransition::new("q0", "a", "q2"),
        ]);
        let diagnostics = validate(&both);
        assert_eq!(count(&diagnostics, "Non-deterministic"), 1);
        assert_eq!(
            diagnostics.iter().find(|d| d.starts_with("Non-deterministic")).unwrap(),
            "Non-deterministic: multiple edges from q0 on a"
        );

        for keep in ["q1", "q2"] {
            let single = conflicting(vec![FaTransition::new("q0", "a", keep)]);
            assert_eq!(count(&validate(&single), "Non-deterministic"), 0);
        }
    }

    #[test]
    fn duplicates_are_collapsed() {
        let spec = AutomatonSpec::new(Machine::Dfa {
            transitions: vec![
                FaTransition::new("q0", "a", "q1"),
                FaTransition::new("q0", "a", "q1"),
                FaTransition::new("q0", "a", "q1"),
            ],
        })
        .with_alphabet(["a"])
        .with_states(["q0", "q1"])
        .with_start("q0")
        .with_finals(["q1"]);
        assert_eq!(
            validate(&spec),
            ["Non-deterministic: multiple edges from q0 on a"]
        );

        let mut logs = Logs::new();
        check(&spec, &mut logs);
        assert_eq!(logs.entries().len(), 2);
    }

    #[test]
    fn structural_problems() {
        let spec = AutomatonSpec::new(Machine::Nfa {
            transitions: vec![
                FaTransition::new("q0", "c", "q1"),
                FaTransition::new("q0", "ε", "q9"),
            ],
        })
        .with_alphabet(["a"])
        .with_states(["q0", "q1", "q1"]);
        let diagnostics = validate(&spec);
        assert_eq!(
            diagnostics,
            [
                "No start state",
                "No accepting states",
                "Duplicate state: q1",
                "Symbol \"c\" not in alphabet",
                "Transition uses unknown state: q0→q9",
            ]
        );
    }

    #[test]
    fn findings_come_out_per_transition() {
        let spec = AutomatonSpec::new(Machine::Dfa {
            transitions: vec![
                FaTransition::new("q0", "x", "q1"),
                FaTransition::new("q0", "a", "q7"),
                FaTransition::new("q1", "ε", "q0"),
            ],
        })
        .with_alphabet(["a"])
        .with_states(["q0", "q1"])
        .with_start("q0")
        .with_finals(["q1"]);
        assert_eq!(
            validate(&spec),
            [
                "Symbol \"x\" not in alphabet",
                "Transition uses unknown state: q0→q7",
                "DFA cannot use ε-transitions",
            ]
        );
    }

    #[test]
    fn epsilon_only_flagged_for_dfa() {
        let fa = |machine| {
            AutomatonSpec::new(machine)
                .with_alphabet(["a"])
                .with_states(["q0", "q1"])
                .with_start("q0")
                .with_finals(["q1"])
        };
        let transitions = vec![FaTransition::new("q0", "ε", "q1")];
        let dfa = validate(&fa(Machine::Dfa {
            transitions: transitions.clone(),
        }));
        assert_eq!(dfa, ["DFA cannot use ε-transitions"]);
        assert!(validate(&fa(Machine::Nfa { transitions })).is_empty());
    }

    #[test]
    fn unreachable_and_dead_states() {
        let spec = AutomatonSpec::new(Machine::Nfa {
            transitions: vec![
                FaTransition::new("q0", "a", "q1"),
                FaTransition::new("q0", "ε", "trap"),
                FaTransition::new("island", "a", "q1"),
            ],
        })
        .with_alphabet(["a"])
        .with_states(["q0", "q1", "trap", "island"])
        .with_start("q0")
        .with_finals(["q1"]);
        assert_eq!(validate(&spec), ["Unreachable: island", "Dead state: trap"]);
    }

    #[test]
    fn membership_of_start_and_finals() {
        let spec = AutomatonSpec::new(Machine::empty(Kind::Tm))
            .with_states(["q0"])
            .with_start("qx")
            .with_finals(["qy"]);
        assert_eq!(
            validate(&spec),
            ["Start state qx is not a state", "Accepting state qy is not a state"]
        );
    }

    #[test]
    fn pda_and_tm_skip_graph_analysis() {
        let spec = AutomatonSpec::new(Machine::Pda {
            stack_bottom: None,
            transitions: vec![
                PdaTransition::new("q0", "x", "Z", "", "q1"),
                PdaTransition::new("q0", "x", "Z", "", "q1"),
            ],
        })
        .with_states(["q0", "q1", "lonely"])
        .with_start("q0")
        .with_finals(["q1"]);
        assert!(validate(&spec).is_empty());
    }

    #[test]
    fn levels() {
        let spec = AutomatonSpec::new(Machine::empty(Kind::Dfa)).with_states(["q0"]);
        let mut logs = Logs::new();
        check(&spec, &mut logs);
        assert!(logs.contains_errors());
        let levels: Vec<LogLevel> = logs.entries().iter().map(|e| e.level).collect();
        assert_eq!(levels, [LogLevel::Error, LogLevel::Warning]);
    }
}
