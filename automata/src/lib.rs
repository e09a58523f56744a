//! Definition, simulation and determinization of finite automata, pushdown
//! automata and Turing machines.
//!
//! Every engine entry point takes an immutable [`AutomatonSpec`] and returns a
//! fresh value; nothing is cached between calls.

pub mod automaton;
pub mod error;
pub mod loader;
pub mod presets;
pub mod session;

pub use automaton::{
    AutomatonSpec, Direction, FaTransition, Id, Kind, Limits, Machine, PdaTransition, Run, State,
    Symbol, TmTransition,
    determinize::{Determinized, determinize},
    simulate, simulate_with,
    validate::validate,
};
pub use error::Error;
pub use session::Session;
