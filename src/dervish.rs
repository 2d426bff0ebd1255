use arena::NodeId;
use log::debug;

use crate::error::Result;
use crate::grammar::Grammar;
use crate::language::Language;
use crate::parsesets::{build_forest, Forest};
use crate::siaa::Siaa;
use crate::types::Symbol;

/// Knobs for a recognizer.  The defaults are what you want unless
/// you're looking at the derivative graph itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Settings {
    /// Compact the graph after every step.
    pub cull: bool,
    /// Reclaim unreachable arena slots every this many steps.
    pub collect_every: Option<usize>,
    /// Stop deriving once the grammar has died.
    pub stop_when_dead: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            cull: true,
            collect_every: None,
            stop_when_dead: true,
        }
    }
}

impl Settings {
    pub fn cull(mut self, on: bool) -> Self {
        self.cull = on;
        self
    }

    pub fn collect_every(mut self, steps: usize) -> Self {
        self.collect_every = if steps == 0 { None } else { Some(steps) };
        self
    }

    pub fn stop_when_dead(mut self, on: bool) -> Self {
        self.stop_when_dead = on;
        self
    }
}

/// The outcome of running a whole input through a recognizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Recognition {
    /// The residual grammar after the last symbol.
    pub node: NodeId,
    pub accepted: bool,
}

/// A recognizer: a grammar, a start node, and the chain of derivatives
/// taken so far.
pub struct Dervish<L: Siaa> {
    grammar: Grammar<L>,
    start: NodeId,
    current: NodeId,
    chain: Vec<NodeId>,
    input: Vec<Symbol<L>>,
    steps: usize,
    settings: Settings,
}

impl<L: Siaa> Dervish<L> {
    pub fn new(grammar: Grammar<L>, start: NodeId) -> Result<Dervish<L>> {
        Dervish::with_settings(grammar, start, Settings::default())
    }

    pub fn with_settings(grammar: Grammar<L>, start: NodeId, settings: Settings) -> Result<Dervish<L>> {
        grammar.validate(start)?;
        Ok(Dervish {
            grammar,
            start,
            current: start,
            chain: vec![start],
            input: Vec::new(),
            steps: 0,
            settings,
        })
    }

    pub fn from_language(lang: &Language) -> Result<Dervish<L>> {
        let (grammar, start) = Grammar::from_language(lang)?;
        Dervish::new(grammar, start)
    }

    pub fn from_rules(rules: &[(&str, Language)], start: &str) -> Result<Dervish<L>> {
        let (grammar, start) = Grammar::from_rules(rules, start)?;
        Dervish::new(grammar, start)
    }

    pub fn grammar(&self) -> &Grammar<L> {
        &self.grammar
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    /// The node after each step, starting with the start node.
    pub fn chain(&self) -> &[NodeId] {
        &self.chain
    }

    /// The symbols derived so far; `chain()[i + 1]` is the derivative
    /// by `input()[i]`.
    pub fn input(&self) -> &[Symbol<L>] {
        &self.input
    }

    /// How many symbols have actually been derived.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_dead(&self) -> bool {
        self.current == self.grammar.empty
    }

    /// Back to the start node.  The grammar keeps whatever it has
    /// learned about its nonterminals.
    pub fn reset(&mut self) {
        self.current = self.start;
        self.chain = vec![self.start];
        self.input.clear();
        self.steps = 0;
    }

    /// Consumes one symbol.  Returns false once nothing can match any
    /// more.
    pub fn feed(&mut self, symbol: &Symbol<L>) -> bool {
        if self.settings.stop_when_dead && self.is_dead() {
            return false;
        }

        let (next, nullable) = self.grammar.step(self.current, symbol, self.settings.cull);
        self.current = next;
        self.chain.push(next);
        self.input.push(symbol.clone());
        self.steps += 1;
        debug!(
            "step {}: class {} -> node {} ({} nodes, nullable: {})",
            self.steps,
            symbol.class,
            next,
            self.grammar.node_count(),
            nullable
        );

        if let Some(every) = self.settings.collect_every {
            if self.steps % every == 0 {
                self.collect();
            }
        }

        !self.is_dead()
    }

    /// Does the input so far form a complete match?
    pub fn accepted(&mut self) -> bool {
        self.grammar.nullable(self.current)
    }

    pub fn recognize<I>(&mut self, symbols: I) -> Recognition
    where
        I: IntoIterator<Item = Symbol<L>>,
    {
        self.reset();
        for symbol in symbols {
            if !self.feed(&symbol) && self.settings.stop_when_dead {
                break;
            }
        }
        Recognition {
            node: self.current,
            accepted: self.accepted(),
        }
    }

    /// The parse trees of the input so far; empty if it isn't accepted.
    pub fn forest(&mut self) -> Forest<L> {
        build_forest(&mut self.grammar, &self.chain, &self.input)
    }

    /// Recognize and, if accepted, build the forest.
    pub fn parse<I>(&mut self, symbols: I) -> Option<Forest<L>>
    where
        I: IntoIterator<Item = Symbol<L>>,
    {
        if self.recognize(symbols).accepted {
            Some(self.forest())
        } else {
            None
        }
    }

    fn collect(&mut self) {
        let mut roots = Vec::with_capacity(self.chain.len() + 1);
        roots.push(self.start);
        roots.extend_from_slice(&self.chain);
        self.grammar.collect(&mut roots);
        self.start = roots[0];
        self.chain = roots.split_off(1);
        self.current = self.chain.last().copied().unwrap_or(self.start);
    }
}
