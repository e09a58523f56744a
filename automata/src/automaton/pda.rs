use super::*;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PdaId {
    pub state: State,
    pub unread: String,
    /// Bottom first, top last.
    pub stack: Vec<Symbol>,
}

impl Display for PdaId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stack: String = self.stack.iter().rev().map(Symbol::as_str).collect();
        write!(
            f,
            "({}, {}, {})",
            self.state,
            fa::unread_or_epsilon(&self.unread),
            fa::unread_or_epsilon(&stack)
        )
    }
}

impl PdaTransition {
    fn applies(&self, state: &State, next: Option<char>, top: &Symbol) -> bool {
        self.from == *state
            && self.pop.as_ref().is_none_or(|pop| pop == top)
            && self
                .read
                .as_ref()
                .is_none_or(|read| next.is_some_and(|c| read.is_char(c)))
    }
}

/// First applicable transition, preferring ones that consume input over
/// ε-reads.
fn select<'t>(
    transitions: &'t [PdaTransition],
    state: &State,
    next: Option<char>,
    top: &Symbol,
) -> Option<&'t PdaTransition> {
    let mut fallback = None;
    for t in transitions.iter().filter(|t| t.applies(state, next, top)) {
        if t.read.is_some() {
            return Some(t);
        }
        fallback.get_or_insert(t);
    }
    fallback
}

/// Single-path simulation: no branching or backtracking. Acceptance is by
/// final state once the input is exhausted, checked only after a move has
/// been applied; running out of steps rejects.
pub fn simulate(spec: &AutomatonSpec, input: &str, limits: &Limits) -> Result<Run<PdaId>, Error> {
    let Machine::Pda {
        stack_bottom,
        transitions,
    } = &spec.machine
    else {
        return Err(Error::WrongKind {
            operation: "PDA simulation",
            expected: "a PDA",
            found: spec.kind(),
        });
    };
    let bottom = stack_bottom.as_ref().unwrap_or(&limits.stack_bottom);

    let mut state = spec.start()?.clone();
    let mut stack = vec![bottom.clone()];
    let mut position = 0;
    let mut ids = vec![PdaId {
        state: state.clone(),
        unread: input.to_owned(),
        stack: stack.clone(),
    }];

    for _ in 0..limits.pda_steps {
        let next = input[position..].chars().next();
        let top = stack.last().unwrap_or(bottom);
        let Some(t) = select(transitions, &state, next, top) else {
            break;
        };

        if t.read.is_some() {
            position += next.map_or(0, char::len_utf8);
        }
        if let Some(pop) = &t.pop {
            if stack.last() != Some(pop) {
                break;
            }
            stack.pop();
        }
        stack.extend(t.push.iter().cloned());
        state = t.to.clone();

        ids.push(PdaId {
            state: state.clone(),
            unread: input[position..].to_owned(),
            stack: stack.clone(),
        });
        if position == input.len() && spec.is_final(&state) {
            return Ok(Run { accepted: true, ids });
        }
    }

    Ok(Run {
        accepted: false,
        ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presets;

    fn accepts(spec: &AutomatonSpec, input: &str) -> bool {
        simulate(spec, input, &Limits::default()).unwrap().accepted
    }

    #[test]
    fn anbn_preset() {
        let spec = presets::pda_anbn();
        for input in ["", "ab", "aabb", "aaabbb"] {
            assert!(accepts(&spec, input), "{input:?} should be accepted");
        }
        for input in ["a", "aab", "ba", "abb", "b"] {
            assert!(!accepts(&spec, input), "{input:?} should be rejected");
        }
    }

    #[test]
    fn stack_grows_with_last_pushed_on_top() {
        let spec = presets::pda_anbn();
        let run = simulate(&spec, "aa", &Limits::default()).unwrap();
        let last = run.last().unwrap();
        assert_eq!(
            last.stack,
            vec![Symbol::new("Z"), Symbol::new("A"), Symbol::new("A")]
        );
        assert_eq!(last.to_string(), "(q0, ε, AAZ)");
    }

    #[test]
    fn reading_transitions_beat_epsilon_reads() {
        let spec = AutomatonSpec::new(Machine::Pda {
            stack_bottom: None,
            transitions: vec![
                PdaTransition::new("q0", "ε", "ε", "", "dead"),
                PdaTransition::new("q0", "a", "ε", "", "f"),
            ],
        })
        .with_alphabet(["a"])
        .with_states(["q0", "f", "dead"])
        .with_start("q0")
        .with_finals(["f"]);
        assert!(accepts(&spec, "a"));
        // nothing to read, so the ε-move is the only candidate
        assert!(!accepts(&spec, ""));
    }

    #[test]
    fn custom_stack_bottom() {
        let spec = AutomatonSpec::new(Machine::Pda {
            stack_bottom: Some(Symbol::new("$")),
            transitions: vec![PdaTransition::new("q0", "ε", "$", "", "f")],
        })
        .with_states(["q0", "f"])
        .with_start("q0")
        .with_finals(["f"]);
        let run = simulate(&spec, "", &Limits::default()).unwrap();
        assert!(run.accepted);
        assert_eq!(run.ids[0].stack, vec![Symbol::new("$")]);
        assert!(run.ids[1].stack.is_empty());
    }

    #[test]
    fn popping_an_empty_stack_halts() {
        // the empty stack reads as its bottom marker, so the pop is selected
        // but cannot be applied
        let spec = AutomatonSpec::new(Machine::Pda {
            stack_bottom: None,
            transitions: vec![
                PdaTransition::new("q0", "a", "Z", "", "q1"),
                PdaTransition::new("q1", "b", "Z", "", "f"),
            ],
        })
        .with_alphabet(["a", "b"])
        .with_states(["q0", "q1", "f"])
        .with_start("q0")
        .with_finals(["f"]);
        let run = simulate(&spec, "ab", &Limits::default()).unwrap();
        assert!(!run.accepted);
        assert_eq!(run.ids.len(), 2);
    }

    #[test]
    fn step_ceiling_rejects() {
        let spec = AutomatonSpec::new(Machine::Pda {
            stack_bottom: None,
            transitions: vec![PdaTransition::new("q0", "ε", "ε", "", "q0")],
        })
        .with_states(["q0", "f"])
        .with_start("q0")
        .with_finals(["f"]);
        let limits = Limits {
            pda_steps: 25,
            ..Limits::default()
        };
        let run = simulate(&spec, "", &limits).unwrap();
        assert!(!run.accepted);
        assert_eq!(run.ids.len(), 26);
    }

    #[test]
    fn acceptance_needs_a_move() {
        let lone = AutomatonSpec::new(Machine::empty(Kind::Pda))
            .with_states(["q0"])
            .with_start("q0")
            .with_finals(["q0"]);
        let run = simulate(&lone, "", &Limits::default()).unwrap();
        assert!(!run.accepted);
        assert_eq!(run.ids.len(), 1);

        let leaving = AutomatonSpec::new(Machine::Pda {
            stack_bottom: None,
            transitions: vec![PdaTransition::new("q0", "ε", "ε", "", "dead")],
        })
        .with_states(["q0", "dead"])
        .with_start("q0")
        .with_finals(["q0"]);
        let run = simulate(&leaving, "", &Limits::default()).unwrap();
        assert!(!run.accepted);
        assert_eq!(run.ids.len(), 2);
        assert_eq!(run.last().unwrap().state, State::from("dead"));
    }

    #[test]
    fn accepts_on_the_move_into_a_final_state() {
        let spec = AutomatonSpec::new(Machine::Pda {
            stack_bottom: None,
            transitions: vec![
                PdaTransition::new("q0", "ε", "ε", "", "f"),
                PdaTransition::new("f", "ε", "ε", "", "q0"),
            ],
        })
        .with_states(["q0", "f"])
        .with_start("q0")
        .with_finals(["f"]);
        let run = simulate(&spec, "", &Limits::default()).unwrap();
        assert!(run.accepted);
        assert_eq!(run.ids.len(), 2);
    }
}
