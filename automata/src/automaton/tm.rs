use std::collections::HashMap;

use super::*;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", serde_with::serde_as)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TmId {
    pub state: State,
    pub head: i64,

    /// Cells never written read as [`BLANK`].
    #[cfg(feature = "serde")]
    #[serde_as(as = "serde_with::Seq<(_, _)>")]
    pub tape: BTreeMap<i64, Symbol>,
    #[cfg(not(feature = "serde"))]
    pub tape: BTreeMap<i64, Symbol>,
}

impl TmId {
    pub fn read(&self, cell: i64) -> &str {
        self.tape.get(&cell).map_or(BLANK, Symbol::as_str)
    }

    /// Tape from the leftmost to the rightmost non-blank cell.
    pub fn tape_contents(&self) -> String {
        tape_contents(&self.tape)
    }
}

impl Display for TmId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.state, self.head, self.tape_contents())
    }
}

/// Deterministic single-tape simulation. Final states halt and accept as soon
/// as they are entered; a missing transition or running out of steps accepts
/// only when the machine already sits in a final state.
pub fn simulate(spec: &AutomatonSpec, input: &str, limits: &Limits) -> Result<Run<TmId>, Error> {
    let Machine::Tm {
        max_steps,
        transitions,
    } = &spec.machine
    else {
        return Err(Error::WrongKind {
            operation: "TM simulation",
            expected: "a TM",
            found: spec.kind(),
        });
    };
    let mut state = spec.start()?.clone();

    // later declarations of a key replace earlier ones
    let delta: HashMap<(&State, &Symbol), &TmTransition> = transitions
        .iter()
        .map(|t| ((&t.from, &t.read), t))
        .collect();

    let mut tape: BTreeMap<i64, Symbol> = (0..).zip(input.chars().map(Symbol::from)).collect();
    let mut head = 0i64;
    let mut ids = vec![TmId {
        state: state.clone(),
        head,
        tape: tape.clone(),
    }];

    // a zero bound means unset
    let max_steps = max_steps.filter(|&steps| steps > 0).unwrap_or(limits.tm_steps);
    for _ in 0..max_steps {
        if spec.is_final(&state) {
            return Ok(Run { accepted: true, ids });
        }

        let read = tape.get(&head).cloned().unwrap_or_else(Symbol::blank);
        let Some(t) = delta.get(&(&state, &read)) else {
            return Ok(Run {
                accepted: spec.is_final(&state),
                ids,
            });
        };

        tape.insert(head, t.write.clone());
        head += t.direction.offset();
        state = t.to.clone();

        ids.push(TmId {
            state: state.clone(),
            head,
            tape: tape.clone(),
        });
    }

    Ok(Run {
        accepted: spec.is_final(&state),
        ids,
    })
}
