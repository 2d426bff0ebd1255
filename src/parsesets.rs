use arena::NodeId;
use consy::Cell;
use hashbrown::{HashMap, HashSet};
use indexmap::IndexSet;
use log::trace;
use std::fmt;

use crate::grammar::Grammar;
use crate::siaa::Siaa;
use crate::types::{Parser, Symbol, EPSILON, FIRST_TERMINAL};

// A Parse Tree is just a cons tree with immutable interiors.  The
// leaves are the symbols consumed, in input order.
pub type Tree<L> = Cell<Symbol<L>>;

// Our system returns Parse _Forests_, sets of parse trees permuted by
// the different variants found within a single parse.  Using the
// IndexSet keeps the trees in the order they were discovered and
// folds together identical trees reached by different routes.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forest<L: Siaa>(pub IndexSet<Tree<L>>);

// Trees of `start` over the whole of `input`.  Trees that matched
// nothing are kept; the caller decides what to do with them.
pub trait ParseTreeExtractor<L: Siaa> {
    fn parse_tree(&mut self, start: NodeId, input: &[Symbol<L>]) -> Forest<L>;
}

impl<L: Siaa> Forest<L> {
    pub fn new() -> Forest<L> {
        Forest(IndexSet::new())
    }

    // Move semantics with this, almost always.
    pub fn with(pt: Tree<L>) -> Forest<L> {
        let mut ps = Forest::new();
        ps.0.insert(pt);
        ps
    }

    pub fn insert(&mut self, pt: Tree<L>) {
        self.0.insert(pt);
    }

    pub fn union(&mut self, other: Forest<L>) {
        self.0.extend(other.0);
    }

    /// Every tree of `self` paired with every tree of `other`.
    pub fn permute(&self, other: &Forest<L>) -> Forest<L> {
        let mut ps = Forest::new();
        for l in &self.0 {
            for r in &other.0 {
                ps.insert(Cell::cons(l.clone(), r.clone()));
            }
        }
        ps
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, pt: &Tree<L>) -> bool {
        self.0.contains(pt)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tree<L>> {
        self.0.iter()
    }
}

impl<L: Siaa> Default for Forest<L> {
    fn default() -> Forest<L> {
        Forest::new()
    }
}

impl<L: Siaa + fmt::Display> fmt::Display for Forest<L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for tree in &self.0 {
            writeln!(f, "{}", tree)?;
        }
        Ok(())
    }
}

//  ___                       _____
// | _ \__ _ _ _ ___ ___     |_   _| _ ___ ___
// |  _/ _` | '_(_-</ -_)      | || '_/ -_) -_)
// |_| \__,_|_| /__/\___|      |_||_| \___\___|
//
// The derivative graph forgets what it consumed, so trees are read
// back off the original grammar, one span of input at a time.  An
// empty forest is the placeholder for a failed match: an alternative
// that fails contributes nothing, and a concatenation with a failed
// half fails whole.  A forest holding `Nil` matched without consuming
// anything.

// A node and the stretch of input it is asked to cover.
type Span = (NodeId, usize, usize);

struct Replay<'g, 'i, L: Siaa> {
    grammar: &'g mut Grammar<L>,
    input: &'i [Symbol<L>],

    // (node, from) -> every position a match can end at, ascending.
    ends: HashMap<(NodeId, usize), Vec<usize>>,

    trees: HashMap<Span, Forest<L>>,

    // Spans being rendered.  Coming back around to one of them through
    // a cycle yields the placeholder, and marks everything computed
    // meanwhile as incomplete, so it isn't memoized.
    busy: HashSet<Span>,
    cut: bool,
}

impl<'g, 'i, L: Siaa> Replay<'g, 'i, L> {
    fn new(grammar: &'g mut Grammar<L>, input: &'i [Symbol<L>]) -> Replay<'g, 'i, L> {
        Replay {
            grammar,
            input,
            ends: HashMap::new(),
            trees: HashMap::new(),
            busy: HashSet::new(),
            cut: false,
        }
    }

    // Where a match of `nodeid` that starts at `from` can end.  Leaves
    // answer directly; anything else replays its own chain of
    // derivatives over the rest of the input, oldest first, until it
    // dies.
    fn ends(&mut self, nodeid: NodeId, from: usize) -> Vec<usize> {
        if let Some(known) = self.ends.get(&(nodeid, from)) {
            return known.clone();
        }

        let data = self.grammar.arena[nodeid].data.clone();
        let found = match data {
            Parser::Emp | Parser::Ukn(_) => vec![],
            Parser::Eps(_) => vec![from],
            Parser::Tok(class) if class == EPSILON => vec![from],
            Parser::Tok(class) => match self.input.get(from) {
                Some(symbol) if class >= FIRST_TERMINAL && symbol.class == class => vec![from + 1],
                _ => vec![],
            },
            _ => {
                let mut found = Vec::new();
                if self.grammar.nullable(nodeid) {
                    found.push(from);
                }
                let mut node = nodeid;
                for (at, symbol) in self.input.iter().enumerate().skip(from) {
                    let (next, nullable) = self.grammar.step(node, symbol, true);
                    if nullable {
                        found.push(at + 1);
                    }
                    if next == self.grammar.empty {
                        break;
                    }
                    node = next;
                }
                found
            }
        };

        self.ends.insert((nodeid, from), found.clone());
        found
    }

    fn trees(&mut self, nodeid: NodeId, from: usize, to: usize) -> Forest<L> {
        let span = (nodeid, from, to);
        if let Some(known) = self.trees.get(&span) {
            return known.clone();
        }
        if !self.ends(nodeid, from).contains(&to) {
            return Forest::new();
        }
        if !self.busy.insert(span) {
            self.cut = true;
            return Forest::new();
        }

        let outer = std::mem::replace(&mut self.cut, false);
        let forest = self.render(nodeid, from, to);
        self.busy.remove(&span);
        if !self.cut {
            self.trees.insert(span, forest.clone());
        }
        self.cut |= outer;
        trace!("trees {} [{}..{}]: {}", nodeid, from, to, forest.len());
        forest
    }

    fn render(&mut self, nodeid: NodeId, from: usize, to: usize) -> Forest<L> {
        let node = self.grammar.arena[nodeid].clone();
        match node.data {
            Parser::Emp | Parser::Ukn(_) => Forest::new(),

            Parser::Tok(class) if class == EPSILON => Forest::with(Cell::Nil),

            Parser::Tok(_) => Forest::with(Cell::Lit(self.input[from].clone())),

            Parser::Eps(symbol) => Forest::with(Cell::Lit(symbol)),

            Parser::Alt => {
                let mut forest = self.trees(node.left, from, to);
                forest.union(self.trees(node.right, from, to));
                forest
            }

            Parser::Cat => self.pairs(node.left, node.right, from, to, false),

            // Zero repetitions match only the empty span, and every
            // further one has to consume something.
            Parser::Rep if from == to => Forest::with(Cell::Nil),
            Parser::Rep => self.pairs(node.left, nodeid, from, to, true),

            Parser::Nt(_) => self.trees(node.left, from, to),

            Parser::Laz(_) => {
                let resolved = self.grammar.force(nodeid);
                self.trees(resolved, from, to)
            }
        }
    }

    // Every split of `from..to` into a match of `left` followed by a
    // match of `right`, paired up.
    fn pairs(&mut self, left: NodeId, right: NodeId, from: usize, to: usize, consume: bool) -> Forest<L> {
        let mut forest = Forest::new();
        for mid in self.ends(left, from) {
            if mid > to || (consume && mid == from) {
                continue;
            }
            let r = self.trees(right, mid, to);
            if r.is_empty() {
                continue;
            }
            let l = self.trees(left, from, mid);
            forest.union(l.permute(&r));
        }
        forest
    }
}

impl<L: Siaa> ParseTreeExtractor<L> for Grammar<L> {
    fn parse_tree(&mut self, start: NodeId, input: &[Symbol<L>]) -> Forest<L> {
        Replay::new(self, input).trees(start, 0, input.len())
    }
}

/// Builds the forest for a recognizer's run.  `chain` holds the node
/// after each step, starting with the start node, and `input` the
/// symbols that were derived; replaying the chain oldest first says
/// which prefixes of the input the start node matches.  A run whose
/// last step doesn't accept has no trees, and trees that matched
/// nothing at all are dropped.
pub fn build_forest<L: Siaa>(grammar: &mut Grammar<L>, chain: &[NodeId], input: &[Symbol<L>]) -> Forest<L> {
    let start = match chain.first() {
        Some(start) => *start,
        None => return Forest::new(),
    };
    if chain.len() != input.len() + 1 {
        return Forest::new();
    }

    let mut ends = Vec::new();
    for (at, step) in chain.iter().enumerate() {
        if grammar.nullable(*step) {
            ends.push(at);
        }
    }
    if ends.last() != Some(&input.len()) {
        return Forest::new();
    }

    let mut replay = Replay::new(grammar, input);
    replay.ends.insert((start, 0), ends);
    let mut forest = replay.trees(start, 0, input.len());
    forest.0.retain(|tree| !tree.nilp());
    forest
}
