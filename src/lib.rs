//! Tagged NFA matching with submatch extraction.
//!
//! Load an automaton with [`nfa::Nfa::new`] or [`nfa::Nfa::from_text`],
//! then call [`nfa::Nfa::find`] to get the whole match and every capture group.

#[macro_use(debug, trace)]
extern crate tracing;

pub mod captures;
pub mod history;
pub mod nfa;
pub mod options;
pub mod ranges;
pub mod simulation;
pub mod text;

pub mod c_interface;
#[cfg(feature = "python")]
pub mod python_interface;
