use arena::NodeId;
use crate::siaa::Siaa;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// A symbol class, as handed over by an external lexer.
pub type Class = u32;

/// The empty language.  Nothing matches it.
pub const EMPTY: Class = 0;

/// The empty string.  A token of this class matches without consuming.
pub const EPSILON: Class = 1;

/// The first class available to user terminals.
pub const FIRST_TERMINAL: Class = 2;

/// One classified piece of input: the class drives the derivative,
/// the lexeme rides along into the parse trees.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Symbol<L: Siaa> {
    pub class: Class,
    pub lexeme: L,
}

impl<L: Siaa> Symbol<L> {
    pub fn new(class: Class, lexeme: L) -> Symbol<L> {
        Symbol { class, lexeme }
    }
}

impl<L: Siaa + fmt::Display> fmt::Display for Symbol<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}

/// Nullability of a nonterminal.  A query that arrives while the
/// nonterminal's own body is still being evaluated sees `false`; that
/// is what makes the least fixpoint well defined on cycles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fixpoint {
    Unstarted,
    InProgress,
    Done(bool),
}

#[derive(Clone, Debug)]
pub struct Rule<L: Siaa> {
    pub name: Rc<str>,

    // The class of the last symbol this rule was derived by, and the
    // result.  One slot only: input is consumed strictly left to right.
    pub memo: Option<(Class, NodeId)>,

    pub fixpoint: Fixpoint,

    // Set while the compactor is inside the body, so that cycles stop
    // here.
    pub busy: bool,

    _lexeme: PhantomData<L>,
}

impl<L: Siaa> Rule<L> {
    pub fn new(name: Rc<str>) -> Rule<L> {
        Rule {
            name,
            memo: None,
            fixpoint: Fixpoint::Unstarted,
            busy: false,
            _lexeme: PhantomData,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ThunkState {
    Pending,
    Running,
    Forced(NodeId),
    // After compaction: the culled resolution, or None if it died.
    Culled(Option<NodeId>),
}

#[derive(Clone, Debug)]
pub struct Thunk<L: Siaa> {
    pub symbol: Symbol<L>,
    pub state: ThunkState,
}

impl<L: Siaa> Thunk<L> {
    pub fn resolved(&self) -> Option<NodeId> {
        match self.state {
            ThunkState::Forced(n) | ThunkState::Culled(Some(n)) => Some(n),
            _ => None,
        }
    }
}

/// The closed set of grammar node kinds.  Edges live in the arena
/// node (`left`, `right`), not here:
///
///   Alt, Cat       left, right
///   Rep, Nt        left (the body)
///   Laz            left (the node being derived)
#[derive(Clone, Debug)]
pub enum Parser<L: Siaa> {
    Emp,
    Tok(Class),
    Eps(Symbol<L>),
    Alt,
    Cat,
    Rep,
    Nt(Rule<L>),
    Laz(Thunk<L>),
    Ukn(Rc<str>),
}
