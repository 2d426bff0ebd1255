// A cons tree: either a cell with two subtrees, a single literal, or
// nothing.  Parse trees are binary all the way down, so this is the
// whole representation; a `Nil` stands for a piece of input that
// matched nothing at all.

use std::fmt;

#[derive(Hash, Eq, PartialEq, Clone, Debug)]
pub enum Cell<T> {
    Nil,
    Lit(T),
    Pair(Box<Cell<T>>, Box<Cell<T>>),
}

impl<T> Cell<T> {
    /// Joins two trees.  Two empty halves make an empty whole.
    pub fn cons(l: Cell<T>, r: Cell<T>) -> Cell<T> {
        match (l, r) {
            (Cell::Nil, Cell::Nil) => Cell::Nil,
            (l, r) => Cell::Pair(Box::new(l), Box::new(r)),
        }
    }

    pub fn nilp(&self) -> bool {
        matches!(self, Cell::Nil)
    }

    pub fn pairp(&self) -> bool {
        matches!(self, Cell::Pair(_, _))
    }

    pub fn car(&self) -> Option<&Cell<T>> {
        match self {
            Cell::Pair(ref a, _) => Some(a),
            _ => None,
        }
    }

    pub fn cdr(&self) -> Option<&Cell<T>> {
        match self {
            Cell::Pair(_, ref b) => Some(b),
            _ => None,
        }
    }

    pub fn cadr(&self) -> Option<&Cell<T>> {
        self.cdr().and_then(Cell::car)
    }

    pub fn cddr(&self) -> Option<&Cell<T>> {
        self.cdr().and_then(Cell::cdr)
    }

    /// The literals of the tree, left to right.
    pub fn leaves(&self) -> Vec<&T> {
        fn walk<'a, T>(cell: &'a Cell<T>, out: &mut Vec<&'a T>) {
            match cell {
                Cell::Nil => {}
                Cell::Lit(t) => out.push(t),
                Cell::Pair(a, b) => {
                    walk(a, out);
                    walk(b, out);
                }
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

// Lisp notation: (a . b), with () for Nil.
impl<T: fmt::Display> fmt::Display for Cell<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cell::Nil => write!(f, "()"),
            Cell::Lit(t) => write!(f, "{}", t),
            Cell::Pair(a, b) => write!(f, "({} . {})", a, b),
        }
    }
}

#[macro_export]
macro_rules! cons {
    ($l:expr, $r:expr) => {{
        $crate::Cell::cons($l, $r)
    }};

    ($l:expr, $r:expr, $($x:expr),+) => {{
        $crate::Cell::cons($l, $crate::cons!($r, $($x),*))
    }}
}
