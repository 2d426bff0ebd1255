use arena::NodeId;
use thiserror::Error;

/// Mistakes made while building a grammar.  Recognition itself never
/// fails: a rejected input is an answer, not an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GrammarError {
    #[error("nonterminal `{name}` is reachable but was never defined")]
    Undefined { name: String },

    #[error("nonterminal `{name}` is already defined")]
    Redefined { name: String },

    #[error("node {0} was not declared as a nonterminal")]
    NotANonterminal(NodeId),

    #[error("no rule named `{name}`")]
    UnknownRule { name: String },

    #[error("rule `{name}` appears more than once")]
    DuplicateRule { name: String },
}

pub type Result<T> = std::result::Result<T, GrammarError>;
