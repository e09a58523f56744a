//! Built-in example machines, one per kind.

use crate::automaton::{
    AutomatonSpec, BLANK, Direction, FaTransition, Machine, PdaTransition, TmTransition,
};

/// `a*b*` over `{a, b}`.
pub fn dfa_a_star_b_star() -> AutomatonSpec {
    AutomatonSpec::new(Machine::Dfa {
        transitions: vec![
            FaTransition::new("q0", "a", "q0"),
            FaTransition::new("q0", "b", "q1"),
            FaTransition::new("q1", "b", "q1"),
        ],
    })
    .with_alphabet(["a", "b"])
    .with_states(["q0", "q1"])
    .with_start("q0")
    .with_finals(["q0", "q1"])
}

/// The default document of a fresh session.
pub fn nfa_example() -> AutomatonSpec {
    AutomatonSpec::new(Machine::Nfa {
        transitions: vec![
            FaTransition::new("q0", "a", "q0"),
            FaTransition::new("q0", "b", "q1"),
            FaTransition::new("q1", "ε", "q2"),
            FaTransition::new("q1", "a", "q2"),
        ],
    })
    .with_alphabet(["a", "b", "ε"])
    .with_states(["q0", "q1", "q2"])
    .with_start("q0")
    .with_finals(["q2"])
}

/// Balanced `a`s then `b`s, counted with one `A` per `a`.
pub fn pda_anbn() -> AutomatonSpec {
    AutomatonSpec::new(Machine::Pda {
        stack_bottom: None,
        transitions: vec![
            PdaTransition::new("q0", "a", "Z", "ZA", "q0"),
            PdaTransition::new("q0", "a", "A", "AA", "q0"),
            PdaTransition::new("q0", "b", "A", "", "q0"),
            PdaTransition::new("q0", "ε", "Z", "Z", "qf"),
        ],
    })
    .with_alphabet(["a", "b", "ε"])
    .with_states(["q0", "qf"])
    .with_start("q0")
    .with_finals(["qf"])
}

/// Appends a `1` to a block of `1`s.
pub fn tm_unary_increment() -> AutomatonSpec {
    AutomatonSpec::new(Machine::Tm {
        max_steps: None,
        transitions: vec![
            TmTransition::new("q0", "1", "1", Direction::Right, "q0"),
            TmTransition::new("q0", BLANK, "1", Direction::Right, "qf"),
        ],
    })
    .with_alphabet(["1"])
    .with_states(["q0", "qf"])
    .with_start("q0")
    .with_finals(["qf"])
}

pub fn all() -> [(&'static str, AutomatonSpec); 4] {
    [
        ("dfa-a-star-b-star", dfa_a_star_b_star()),
        ("nfa-example", nfa_example()),
        ("pda-anbn", pda_anbn()),
        ("tm-unary-increment", tm_unary_increment()),
    ]
}

pub fn by_name(name: &str) -> Option<AutomatonSpec> {
    all()
        .into_iter()
        .find(|(preset, _)| *preset == name)
        .map(|(_, spec)| spec)
}
