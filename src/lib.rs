//! Parsing with derivatives.
//!
//! A grammar is a graph of combinators in an arena.  Each input
//! symbol replaces the grammar with its derivative; the input is
//! accepted when what's left accepts the empty string, and the parse
//! forest is read back off the chain of derivatives.

mod siaa;
mod types;

pub mod error;

#[macro_use]
pub mod language;

pub mod grammar;
pub mod parsesets;
pub mod render;

mod builder;
pub mod dervish;

pub use arena::NodeId;
pub use consy::{cons, Cell};
pub use dervish::{Dervish, Recognition, Settings};
pub use error::{GrammarError, Result};
pub use grammar::{Grammar, Stats};
pub use parsesets::{build_forest, Forest, ParseTreeExtractor, Tree};
pub use siaa::Siaa;
pub use types::{Class, Fixpoint, Parser, Rule, Symbol, Thunk, ThunkState, EMPTY, EPSILON, FIRST_TERMINAL};
