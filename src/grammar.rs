use arena::{Arena, Node, NodeId};
use hashbrown::{HashMap, HashSet};
use log::{debug, trace, warn};
use std::ops::Index;
use std::rc::Rc;

use crate::error::{GrammarError, Result};
use crate::siaa::Siaa;
use crate::types::{Class, Fixpoint, Parser, Rule, Symbol, Thunk, ThunkState, EMPTY, EPSILON, FIRST_TERMINAL};

// Deliberate mechanism to build things in the correct order, so that
// the compiler's habit of building temporaries is circumvented and
// the borrow rules work correctly.  Also: A lot easier.

macro_rules! make_node {
    ( $source:expr, $par:expr ) => {{
        $source.add($par)
    }};

    ( $source:expr, $par:expr, $lhs:expr ) => {{
        let lhs = $lhs;
        $source.push(Node::with($par, lhs, 0))
    }};

    ( $source:expr, $par:expr, $lhs:expr, $rhs:expr ) => {{
        let (lhs, rhs) = ($lhs, $rhs);
        $source.push(Node::with($par, lhs, rhs))
    }};
}

/// Counters for the events worth watching when a grammar misbehaves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    /// Derivative nodes computed (memo hits excluded).
    pub derived: usize,
    /// Thunks evaluated.  Each thunk counts at most once.
    pub forced: usize,
    /// Nodes the compactor found dead.
    pub pruned: usize,
    /// Arena slots reclaimed by `collect`.
    pub collected: usize,
}

/// A grammar is a graph of parsers living in a single arena.  All
/// "nodes" are merely indexes into the arena to other nodes, which
/// is what lets a nonterminal refer to itself without anybody
/// owning anybody.
pub struct Grammar<L: Siaa> {
    pub arena: Arena<Parser<L>>,

    // While it's possible to just have a lot of empties, they're
    // utterly indistinguishable from one another, so having just one
    // every dead result can point to is a small bit of savings.  It
    // is always slot zero.
    pub empty: NodeId,

    // (node, symbol) -> derivative, for the combinators.  Cleared
    // between input symbols; nonterminals keep their own slot.
    memo: HashMap<(NodeId, Symbol<L>), NodeId>,

    // Raised when a nullability answer came from a nonterminal still
    // in progress.  Derivatives computed under such an answer are not
    // memoized.
    provisional: bool,

    stats: Stats,
}

impl<L: Siaa> Grammar<L> {
    pub fn new() -> Grammar<L> {
        let mut arena = Arena::new();
        let empty = arena.add(Parser::Emp);
        Grammar {
            arena,
            empty,
            memo: HashMap::new(),
            provisional: false,
            stats: Stats::default(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// How many nodes `root` can reach, itself included.  This is the
    /// size of the live grammar, as opposed to the arena.
    pub fn reachable(&self, root: NodeId) -> usize {
        let mut seen = HashSet::new();
        let mut stack = vec![root];
        while let Some(nodeid) = stack.pop() {
            if seen.insert(nodeid) {
                stack.extend(self.successors(nodeid, true));
            }
        }
        seen.len()
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    /// The rule name of a nonterminal, declared or defined.
    pub fn name_of(&self, nodeid: NodeId) -> Option<&str> {
        match self.arena.get(nodeid).map(|n| &n.data) {
            Some(Parser::Nt(rule)) => Some(&*rule.name),
            Some(Parser::Ukn(name)) => Some(&**name),
            _ => None,
        }
    }

    //  _  _         _        ___             _               _
    // | \| |___  __| |___   / __|___ _ _  __| |_ _ _ _  _ __| |_ ___ _ _ ___
    // | .` / _ \/ _` / -_) | (__/ _ \ ' \(_-<  _| '_| || / _|  _/ _ \ '_(_-<
    // |_|\_\___/\__,_\___|  \___\___/_||_/__/\__|_|  \_,_\__|\__\___/_| /__/
    //
    pub fn make_tok(&mut self, class: Class) -> NodeId {
        make_node!(self.arena, Parser::Tok(class))
    }

    pub fn make_epsilon(&mut self) -> NodeId {
        self.make_tok(EPSILON)
    }

    /// A terminal that has already matched `symbol`.
    pub fn make_eps(&mut self, symbol: Symbol<L>) -> NodeId {
        make_node!(self.arena, Parser::Eps(symbol))
    }

    pub fn make_alt(&mut self, left: NodeId, right: NodeId) -> NodeId {
        make_node!(self.arena, Parser::Alt, left, right)
    }

    pub fn make_cat(&mut self, left: NodeId, right: NodeId) -> NodeId {
        make_node!(self.arena, Parser::Cat, left, right)
    }

    pub fn make_rep(&mut self, body: NodeId) -> NodeId {
        make_node!(self.arena, Parser::Rep, body)
    }

    /// Right-nested concatenation of every node in `nodes`.
    pub fn make_cats(&mut self, nodes: &[NodeId]) -> NodeId {
        match nodes.split_last() {
            None => self.make_epsilon(),
            Some((last, rest)) => rest.iter().rev().fold(*last, |acc, n| self.make_cat(*n, acc)),
        }
    }

    /// A nonterminal whose body is already known.
    pub fn make_rule(&mut self, name: &str, body: NodeId) -> NodeId {
        make_node!(self.arena, Parser::Nt(Rule::new(Rc::from(name))), body)
    }

    /// A placeholder for a nonterminal, to be referenced before it is
    /// defined.  This is how cycles get closed: declare, build the body
    /// out of the declaration, then `define`.
    pub fn declare(&mut self, name: &str) -> NodeId {
        make_node!(self.arena, Parser::Ukn(Rc::from(name)))
    }

    pub fn define(&mut self, target: NodeId, body: NodeId) -> Result<()> {
        let name = match self.arena.get(target).map(|n| &n.data) {
            Some(Parser::Ukn(name)) => name.clone(),
            Some(Parser::Nt(rule)) => {
                return Err(GrammarError::Redefined {
                    name: rule.name.to_string(),
                })
            }
            _ => return Err(GrammarError::NotANonterminal(target)),
        };
        self.arena[target] = Node::with(Parser::Nt(Rule::new(name)), body, self.empty);
        Ok(())
    }

    /// Fails if any declared-but-undefined nonterminal can be reached
    /// from `start`.
    pub fn validate(&self, start: NodeId) -> Result<()> {
        let mut seen = HashSet::new();
        let mut stack = vec![start];
        while let Some(nodeid) = stack.pop() {
            if !seen.insert(nodeid) {
                continue;
            }
            if let Parser::Ukn(ref name) = self.arena[nodeid].data {
                return Err(GrammarError::Undefined {
                    name: name.to_string(),
                });
            }
            stack.extend(self.successors(nodeid, true));
        }
        Ok(())
    }

    // The nodes `nodeid` depends on.  A pending thunk depends on its
    // base; a forced one only on its result.
    fn successors(&self, nodeid: NodeId, through_pending: bool) -> Vec<NodeId> {
        let node = &self.arena[nodeid];
        match node.data {
            Parser::Emp | Parser::Tok(_) | Parser::Eps(_) | Parser::Ukn(_) => vec![],
            Parser::Alt | Parser::Cat => vec![node.left, node.right],
            Parser::Rep | Parser::Nt(_) => vec![node.left],
            Parser::Laz(ref thunk) => match thunk.state {
                ThunkState::Forced(n) | ThunkState::Culled(Some(n)) => vec![n],
                ThunkState::Culled(None) => vec![],
                ThunkState::Pending | ThunkState::Running if through_pending => vec![node.left],
                ThunkState::Pending | ThunkState::Running => vec![],
            },
        }
    }

    fn rule_mut(&mut self, nodeid: NodeId) -> Option<&mut Rule<L>> {
        match self.arena[nodeid].data {
            Parser::Nt(ref mut rule) => Some(rule),
            _ => None,
        }
    }

    fn set_thunk_state(&mut self, nodeid: NodeId, state: ThunkState) {
        if let Parser::Laz(ref mut thunk) = self.arena[nodeid].data {
            thunk.state = state;
        }
    }

    fn set_busy(&mut self, nodeid: NodeId, busy: bool) {
        if let Some(rule) = self.rule_mut(nodeid) {
            rule.busy = busy;
        }
    }

    // Derivatives ------------------------------------------------------

    /// Drops the combinator derivative memo.  Call between input
    /// symbols; entries are only trustworthy within one pass.
    pub fn forget_derivatives(&mut self) {
        self.memo.clear();
    }

    /// Given a node and a symbol, returns a node that represents the
    /// derivative of the node passed in.  Nothing is evaluated that
    /// doesn't have to be: nonterminals hand back a thunk wrapped in
    /// a fresh nonterminal, so the derivative of a recursive rule can
    /// itself be recursive.
    pub fn derive(&mut self, nodeid: NodeId, symbol: &Symbol<L>) -> NodeId {
        let node = self.arena[nodeid].clone();

        match node.data {
            Parser::Emp | Parser::Eps(_) => return self.empty,

            Parser::Ukn(ref name) => {
                warn!("deriving undefined nonterminal `{}`", name);
                return self.empty;
            }

            Parser::Nt(_) => return self.derive_rule(nodeid, symbol),

            Parser::Laz(_) => {
                let resolved = self.force(nodeid);
                return self.derive(resolved, symbol);
            }

            _ => {}
        }

        let key = (nodeid, symbol.clone());
        if let Some(cached) = self.memo.get(&key) {
            return *cached;
        }

        let outer = std::mem::replace(&mut self.provisional, false);
        let next = match node.data {
            Parser::Tok(class) => {
                if class >= FIRST_TERMINAL && class == symbol.class {
                    self.make_eps(symbol.clone())
                } else {
                    self.empty
                }
            }

            // Both branches, always: an ambiguous grammar keeps every
            // live alternative.
            Parser::Alt => {
                let l = self.derive(node.left, symbol);
                let r = self.derive(node.right, symbol);
                self.make_alt(l, r)
            }

            Parser::Cat => self.derive_cat(node.left, node.right, symbol),

            // Dc(L*) = Dc(L) ◦ L*, sharing the original repetition.
            Parser::Rep => {
                let d = self.derive(node.left, symbol);
                self.make_cat(d, nodeid)
            }

            _ => self.empty,
        };

        self.stats.derived += 1;
        if !self.provisional {
            self.memo.insert(key, next);
        }
        self.provisional |= outer;
        trace!("D[{:?}] {} -> {}", symbol.class, nodeid, next);
        next
    }

    // Dc(p ◦ q) = (Dc(p) ◦ q) ∪ Dc(q)   when p is nullable
    // Dc(p ◦ q) =  Dc(p) ◦ q          otherwise
    //
    // Nothing of p survives in the second branch.  What p matched is
    // recovered from the input when the forest is built, which is what
    // lets the compactor throw consumed prefixes away.
    fn derive_cat(&mut self, left: NodeId, right: NodeId, symbol: &Symbol<L>) -> NodeId {
        if self.nullable(left) {
            let l = self.derive(left, symbol);
            let consumed = self.make_cat(l, right);
            let skipped = self.derive(right, symbol);
            self.make_alt(consumed, skipped)
        } else {
            let l = self.derive(left, symbol);
            self.make_cat(l, right)
        }
    }

    fn derive_rule(&mut self, nodeid: NodeId, symbol: &Symbol<L>) -> NodeId {
        let (body, name) = match self.arena[nodeid] {
            Node {
                left,
                data: Parser::Nt(ref rule),
                ..
            } => {
                if let Some((class, next)) = rule.memo {
                    if class == symbol.class {
                        return next;
                    }
                }
                (left, rule.name.clone())
            }
            _ => return self.empty,
        };

        let thunk = make_node!(
            self.arena,
            Parser::Laz(Thunk {
                symbol: symbol.clone(),
                state: ThunkState::Pending,
            }),
            body
        );
        let next = make_node!(self.arena, Parser::Nt(Rule::new(name)), thunk);

        // Cache the result before anything forces the thunk, so that
        // the body's own references to this rule find it.
        if let Some(rule) = self.rule_mut(nodeid) {
            rule.memo = Some((symbol.class, next));
        }
        next
    }

    /// Evaluates a thunk, at most once, and returns what it resolved
    /// to.  Anything that isn't a thunk is its own resolution.
    pub fn force(&mut self, nodeid: NodeId) -> NodeId {
        let (base, thunk) = match self.arena[nodeid] {
            Node {
                left,
                data: Parser::Laz(ref thunk),
                ..
            } => (left, thunk.clone()),
            _ => return nodeid,
        };

        match thunk.state {
            ThunkState::Forced(n) | ThunkState::Culled(Some(n)) => n,
            ThunkState::Culled(None) => self.empty,
            ThunkState::Running => {
                warn!("thunk {} re-entered while being forced", nodeid);
                self.empty
            }
            ThunkState::Pending => {
                self.set_thunk_state(nodeid, ThunkState::Running);
                let resolved = self.derive(base, &thunk.symbol);
                self.set_thunk_state(nodeid, ThunkState::Forced(resolved));
                self.stats.forced += 1;
                trace!("forced {} = D[{:?}] {} -> {}", nodeid, thunk.symbol.class, base, resolved);
                resolved
            }
        }
    }

    /// One full step of recognition: derive `nodeid` by `symbol`,
    /// settle the nullability of the result (which forces the thunks
    /// the step created) and, if asked, cull it.  Returns the next node
    /// and whether it accepts the empty sequence.
    pub fn step(&mut self, nodeid: NodeId, symbol: &Symbol<L>, cull: bool) -> (NodeId, bool) {
        self.forget_derivatives();
        let next = self.derive(nodeid, symbol);
        let nullable = self.nullable(next);
        if cull {
            (self.cull(next).unwrap_or(self.empty), nullable)
        } else {
            (next, nullable)
        }
    }

    //  _  _      _ _      _    _ _ _ _
    // | \| |_  _| | |__ _| |__(_) (_) |_ _  _
    // | .` | || | | / _` | '_ \ | | |  _| || |
    // |_|\_|\_,_|_|_\__,_|_.__/_|_|_|\__|\_, |
    //                                    |__/
    //
    /// Does `nodeid` accept the empty sequence?  A nonterminal works
    /// this out once and keeps the answer; asking it again while it is
    /// still working (a cycle back to itself) gets `false`.
    pub fn nullable(&mut self, nodeid: NodeId) -> bool {
        let node = self.arena[nodeid].clone();
        match node.data {
            Parser::Emp | Parser::Ukn(_) => false,

            Parser::Tok(class) => class == EPSILON,

            Parser::Eps(_) | Parser::Rep => true,

            Parser::Alt => self.nullable(node.left) || self.nullable(node.right),

            Parser::Cat => self.nullable(node.left) && self.nullable(node.right),

            Parser::Laz(_) => {
                let resolved = self.force(nodeid);
                self.nullable(resolved)
            }

            Parser::Nt(rule) => match rule.fixpoint {
                Fixpoint::Done(nullable) => nullable,

                Fixpoint::InProgress => {
                    self.provisional = true;
                    false
                }

                Fixpoint::Unstarted => {
                    if let Some(rule) = self.rule_mut(nodeid) {
                        rule.fixpoint = Fixpoint::InProgress;
                    }
                    let nullable = self.nullable(node.left);
                    if let Some(rule) = self.rule_mut(nodeid) {
                        rule.fixpoint = Fixpoint::Done(nullable);
                    }
                    nullable
                }
            },
        }
    }

    // Culling ----------------------------------------------------------

    /// Compacts the graph under `nodeid`: dead branches go, resolved
    /// thunks are bypassed.  `None` means the whole node is dead and
    /// should be replaced by `empty`; otherwise the returned node is
    /// the (possibly different) replacement.
    pub fn cull(&mut self, nodeid: NodeId) -> Option<NodeId> {
        let live = self.productive(nodeid);
        let mut seen = HashMap::new();
        self.cull_inner(nodeid, &live, &mut seen)
    }

    // The nodes under `root` that match at least one sequence.  This
    // is a least fixpoint over the graph, so a rule that can only
    // ever recurse into itself comes out dead.  Unforced thunks are
    // given the benefit of the doubt.
    fn productive(&self, root: NodeId) -> HashSet<NodeId> {
        let mut order = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![(root, false)];
        while let Some((nodeid, expanded)) = stack.pop() {
            if expanded {
                order.push(nodeid);
                continue;
            }
            if !seen.insert(nodeid) {
                continue;
            }
            stack.push((nodeid, true));
            for child in self.successors(nodeid, false) {
                if !seen.contains(&child) {
                    stack.push((child, false));
                }
            }
        }

        let mut live = HashSet::new();
        loop {
            let mut changed = false;
            for nodeid in &order {
                if !live.contains(nodeid) && self.produces(*nodeid, &live) {
                    live.insert(*nodeid);
                    changed = true;
                }
            }
            if !changed {
                break live;
            }
        }
    }

    fn produces(&self, nodeid: NodeId, live: &HashSet<NodeId>) -> bool {
        let node = &self.arena[nodeid];
        match node.data {
            Parser::Emp => false,
            Parser::Tok(class) => class != EMPTY,
            Parser::Eps(ref symbol) => symbol.class != EMPTY,
            Parser::Rep | Parser::Ukn(_) => true,
            Parser::Alt => live.contains(&node.left) || live.contains(&node.right),
            Parser::Cat => live.contains(&node.left) && live.contains(&node.right),
            Parser::Nt(_) => live.contains(&node.left),
            Parser::Laz(ref thunk) => match thunk.state {
                ThunkState::Pending | ThunkState::Running => true,
                ThunkState::Forced(n) | ThunkState::Culled(Some(n)) => live.contains(&n),
                ThunkState::Culled(None) => false,
            },
        }
    }

    fn cull_inner(
        &mut self,
        nodeid: NodeId,
        live: &HashSet<NodeId>,
        seen: &mut HashMap<NodeId, Option<NodeId>>,
    ) -> Option<NodeId> {
        if let Some(done) = seen.get(&nodeid) {
            return *done;
        }

        let node = self.arena[nodeid].clone();
        let culled = if !live.contains(&nodeid) {
            None
        } else {
            match node.data {
                Parser::Emp => None,

                Parser::Tok(_) | Parser::Eps(_) | Parser::Ukn(_) => Some(nodeid),

                Parser::Alt => {
                    let l = self.cull_inner(node.left, live, seen);
                    let r = self.cull_inner(node.right, live, seen);
                    match (l, r) {
                        (None, None) => None,
                        (Some(l), None) => Some(l),
                        (None, Some(r)) => Some(r),
                        (Some(l), Some(r)) => {
                            self.arena[nodeid].left = l;
                            self.arena[nodeid].right = r;
                            Some(nodeid)
                        }
                    }
                }

                Parser::Cat => {
                    let l = self.cull_inner(node.left, live, seen);
                    let r = l.and_then(|_| self.cull_inner(node.right, live, seen));
                    match (l, r) {
                        (Some(l), Some(r)) => {
                            self.arena[nodeid].left = l;
                            self.arena[nodeid].right = r;
                            Some(nodeid)
                        }
                        _ => None,
                    }
                }

                // Zero repetitions still match, so a repetition never
                // dies; its body just gets replaced.
                Parser::Rep => {
                    if node.left != self.empty {
                        let body = self.cull_inner(node.left, live, seen).unwrap_or(self.empty);
                        self.arena[nodeid].left = body;
                    }
                    Some(nodeid)
                }

                Parser::Nt(ref rule) => {
                    if rule.busy {
                        return Some(nodeid);
                    }
                    self.set_busy(nodeid, true);
                    let body = self.cull_inner(node.left, live, seen);
                    self.set_busy(nodeid, false);
                    if let Some(body) = body {
                        self.arena[nodeid].left = body;
                    }
                    body.map(|_| nodeid)
                }

                // A resolved thunk is replaced by its resolution for
                // good; an unresolved one is left alone.
                Parser::Laz(ref thunk) => match thunk.state {
                    ThunkState::Pending | ThunkState::Running => Some(nodeid),
                    ThunkState::Culled(resolved) => resolved,
                    ThunkState::Forced(resolved) => {
                        self.set_thunk_state(nodeid, ThunkState::Culled(Some(resolved)));
                        let culled = self.cull_inner(resolved, live, seen);
                        self.set_thunk_state(nodeid, ThunkState::Culled(culled));
                        culled
                    }
                },
            }
        };

        if culled.is_none() && nodeid != self.empty {
            self.stats.pruned += 1;
        }
        seen.insert(nodeid, culled);
        culled
    }

    // Collection -------------------------------------------------------

    /// Throws away every node that none of `roots` can reach, and
    /// rewrites `roots` to the nodes' new positions.  Derivative memos
    /// pointing at collected nodes are forgotten.
    pub fn collect(&mut self, roots: &mut [NodeId]) {
        let mut live = vec![false; self.arena.len()];
        let mut stack: Vec<NodeId> = roots.to_vec();
        stack.push(self.empty);
        while let Some(nodeid) = stack.pop() {
            if live[nodeid] {
                continue;
            }
            live[nodeid] = true;
            stack.extend(self.successors(nodeid, true));
        }

        let before = self.arena.len();
        let map = self.arena.compact(&live);
        let empty = self.empty;
        let relocate = |nodeid: NodeId| map[nodeid].unwrap_or(empty);

        for node in self.arena.arena.iter_mut() {
            node.left = relocate(node.left);
            node.right = relocate(node.right);
            match node.data {
                Parser::Nt(ref mut rule) => {
                    rule.memo = rule
                        .memo
                        .take()
                        .and_then(|(class, next)| map[next].map(|next| (class, next)));
                }
                Parser::Laz(ref mut thunk) => {
                    thunk.state = match thunk.state {
                        ThunkState::Forced(n) => ThunkState::Forced(relocate(n)),
                        ThunkState::Culled(Some(n)) => ThunkState::Culled(Some(relocate(n))),
                        state => state,
                    };
                }
                _ => {}
            }
        }

        for root in roots.iter_mut() {
            *root = relocate(*root);
        }

        self.memo.clear();
        self.stats.collected += before - self.arena.len();
        debug!("collected {} of {} nodes", before - self.arena.len(), before);
    }
}

impl<L: Siaa> Default for Grammar<L> {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: Siaa> Index<NodeId> for Grammar<L> {
    type Output = Node<Parser<L>>;
    fn index(&self, index: NodeId) -> &Node<Parser<L>> {
        debug_assert!(index < self.arena.len());
        &self.arena[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(class: Class) -> Symbol<char> {
        Symbol::new(class, char::from(b'a' + class as u8))
    }

    #[test]
    fn nullability_follows_the_rules() {
        let mut g = Grammar::<char>::new();
        let e = g.make_epsilon();
        let a = g.make_tok(2);
        let b = g.make_tok(3);
        let ea = g.make_alt(e, a);
        let ae = g.make_alt(a, e);
        let ab = g.make_alt(a, b);
        let ecat = g.make_cat(e, e);
        let acat = g.make_cat(e, a);
        let star = g.make_rep(ab);

        assert!(g.nullable(e));
        assert!(!g.nullable(a));
        assert!(g.nullable(ea) && g.nullable(ae));
        assert!(!g.nullable(ab));
        assert!(g.nullable(ecat));
        assert!(!g.nullable(acat));
        assert!(g.nullable(star));
        assert!(!g.nullable(g.empty));
    }

    #[test]
    fn tokens_derive_to_accepted_or_empty() {
        let mut g = Grammar::<char>::new();
        let a = g.make_tok(2);
        let e = g.make_epsilon();

        let da = g.derive(a, &sym(2));
        assert!(matches!(g[da].data, Parser::Eps(ref s) if s.class == 2));
        assert!(g.nullable(da));
        assert_eq!(g.derive(da, &sym(2)), g.empty);

        assert_eq!(g.derive(a, &sym(3)), g.empty);
        assert_eq!(g.derive(e, &sym(1)), g.empty);
        assert_eq!(g.derive(e, &sym(2)), g.empty);
    }

    #[test]
    fn nullable_left_concatenation_keeps_both_readings() {
        // (a | ε) ◦ a, derived by a: either the first a was consumed,
        // or the ε was taken and the second a consumed.
        let mut g = Grammar::<char>::new();
        let a1 = g.make_tok(2);
        let e = g.make_epsilon();
        let opt = g.make_alt(a1, e);
        let a2 = g.make_tok(2);
        let lang = g.make_cat(opt, a2);

        let d = g.derive(lang, &sym(2));
        assert!(matches!(g[d].data, Parser::Alt));
        assert!(g.nullable(d));
        let dd = g.derive(d, &sym(2));
        assert!(g.nullable(dd));
        let ddd = g.derive(dd, &sym(2));
        assert!(!g.nullable(ddd));
    }

    #[test]
    fn thunks_are_forced_once() {
        let mut g = Grammar::<char>::new();
        let a = g.make_tok(2);
        let b = g.make_tok(3);
        let ab = g.make_cat(a, b);
        let s = g.make_rule("S", ab);

        let n1 = g.derive(s, &sym(2));
        assert_eq!(g.stats().forced, 0);
        assert!(!g.nullable(n1));
        assert!(!g.nullable(n1));
        let n2 = g.derive(n1, &sym(3));
        let n2_again = g.derive(n1, &sym(3));
        assert_eq!(n2, n2_again);
        assert_eq!(g.stats().forced, 1);

        assert!(g.nullable(n2));
        assert_eq!(g.stats().forced, 2);
    }

    #[test]
    fn nonterminal_memo_holds_one_symbol() {
        let mut g = Grammar::<char>::new();
        let a = g.make_tok(2);
        let s = g.make_rule("S", a);

        let first = g.derive(s, &sym(2));
        assert_eq!(g.derive(s, &sym(2)), first);
        // Keyed by class: a different lexeme of the same class hits.
        assert_eq!(g.derive(s, &Symbol::new(2, 'z')), first);
        let other = g.derive(s, &sym(3));
        assert_ne!(other, first);
        // The slot now belongs to class 3.
        assert_ne!(g.derive(s, &sym(2)), first);
    }

    #[test]
    fn fixpoint_terminates_on_left_recursion() {
        // L = L '(' L ')' | ε
        let mut g = Grammar::<char>::new();
        let l = g.declare("L");
        let open = g.make_tok(2);
        let close = g.make_tok(3);
        let inner = g.make_cats(&[l, open, l, close]);
        let e = g.make_epsilon();
        let body = g.make_alt(inner, e);
        g.define(l, body).unwrap();

        assert!(g.nullable(l));
        let mut node = l;
        for class in [2, 2, 3, 2, 3, 3] {
            node = g.derive(node, &sym(class));
            g.nullable(node);
        }
        assert!(g.nullable(node));
        assert!(matches!(g[l].data, Parser::Nt(ref r) if r.fixpoint == Fixpoint::Done(true)));
    }

    #[test]
    fn fixpoint_terminates_on_mutual_recursion() {
        // A = B 'a' | ε ; B = A 'b'
        let mut g = Grammar::<char>::new();
        let a = g.declare("A");
        let b = g.declare("B");
        let ta = g.make_tok(2);
        let tb = g.make_tok(3);
        let ba = g.make_cat(b, ta);
        let e = g.make_epsilon();
        let abody = g.make_alt(ba, e);
        let bbody = g.make_cat(a, tb);
        g.define(a, abody).unwrap();
        g.define(b, bbody).unwrap();

        assert!(g.nullable(a));
        assert!(!g.nullable(b));

        // "ba" is in A, "b" is not.
        let n = g.derive(a, &sym(3));
        assert!(!g.nullable(n));
        let n = g.derive(n, &sym(2));
        assert!(g.nullable(n));
    }

    #[test]
    fn definition_errors() {
        let mut g = Grammar::<char>::new();
        let a = g.make_tok(2);
        let l = g.declare("L");
        assert_eq!(g.validate(l), Err(GrammarError::Undefined { name: "L".into() }));
        assert_eq!(g.define(a, a), Err(GrammarError::NotANonterminal(a)));
        g.define(l, a).unwrap();
        assert_eq!(g.define(l, a), Err(GrammarError::Redefined { name: "L".into() }));
        assert!(g.validate(l).is_ok());
        assert_eq!(g.name_of(l), Some("L"));
    }

    #[test]
    fn dead_alternatives_are_pruned() {
        let mut g = Grammar::<char>::new();
        let a = g.make_tok(2);
        let b = g.make_tok(3);
        let ab = g.make_alt(a, b);
        let d = g.derive(ab, &sym(2));
        let survivor = g.cull(d).unwrap();
        assert!(matches!(g[survivor].data, Parser::Eps(_)));

        let cat = g.make_cat(a, b);
        let d = g.derive(cat, &sym(3));
        assert_eq!(g.cull(d), None);
    }

    #[test]
    fn repetition_survives_a_dead_body() {
        let mut g = Grammar::<char>::new();
        let dead = g.make_tok(EMPTY);
        let star = g.make_rep(dead);
        assert_eq!(g.cull(star), Some(star));
        assert_eq!(g[star].left, g.empty);
        assert!(g.nullable(star));
    }

    #[test]
    fn self_feeding_rule_is_dead() {
        // L = L 'a' matches nothing at all.
        let mut g = Grammar::<char>::new();
        let l = g.declare("L");
        let a = g.make_tok(2);
        let body = g.make_cat(l, a);
        g.define(l, body).unwrap();
        assert_eq!(g.cull(l), None);
    }

    #[test]
    fn collection_preserves_the_language() {
        let mut g = Grammar::<char>::new();
        let a = g.make_tok(2);
        let b = g.make_tok(3);
        let ab = g.make_cat(a, b);
        let star = g.make_rep(ab);
        let s = g.make_rule("S", star);

        let mut node = s;
        for class in [2, 3, 2] {
            g.forget_derivatives();
            node = g.derive(node, &sym(class));
            g.nullable(node);
            node = g.cull(node).unwrap_or(g.empty);
        }
        let before = g.node_count();
        let mut roots = [s, node];
        g.collect(&mut roots);
        assert!(g.node_count() < before);
        assert_eq!(g.stats().collected, before - g.node_count());

        let node = g.derive(roots[1], &sym(3));
        assert!(g.nullable(node));
    }
}
