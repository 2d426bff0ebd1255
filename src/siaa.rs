/// Symbol in an alphabet.
///
/// This is a marker trait for all the qualities that a lexeme must
/// support in order to ride along with a symbol class through the
/// derivative graph and out into the parse forest.  `char`, `&str`
/// and `String` all qualify.
///
/// Lexemes are compared when a nonterminal checks its derivative
/// memo, and hashed when parse trees are collected into a forest.

pub trait Siaa: std::clone::Clone + std::cmp::Eq + std::fmt::Debug + std::hash::Hash {}

impl<T> Siaa for T where T: std::clone::Clone + std::cmp::Eq + std::fmt::Debug + std::hash::Hash {}
