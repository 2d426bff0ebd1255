use arena::NodeId;
use hashbrown::HashSet;
use std::cell::RefCell;
use std::fmt;

use crate::grammar::Grammar;
use crate::siaa::Siaa;
use crate::types::{Parser, ThunkState, EPSILON};

/// A printable view of the graph under one node.  Nothing is forced;
/// a pending thunk prints as the derivative it is waiting to take.
/// Nonterminals print their body the first time they are met and only
/// their name afterwards, so cycles print finitely.
pub struct Rendered<'a, L: Siaa> {
    grammar: &'a Grammar<L>,
    start: NodeId,
}

impl<L: Siaa> Grammar<L> {
    pub fn display(&self, start: NodeId) -> Rendered<'_, L> {
        Rendered {
            grammar: self,
            start,
        }
    }
}

impl<'a, L: Siaa> Rendered<'a, L> {
    fn walk(&self, f: &mut fmt::Formatter, nodeid: NodeId, seen: &RefCell<HashSet<NodeId>>) -> fmt::Result {
        let node = &self.grammar[nodeid];
        match node.data {
            Parser::Emp => write!(f, "∅"),
            Parser::Tok(class) if class == EPSILON => write!(f, "ε"),
            Parser::Tok(class) => write!(f, "(tok {})", class),
            Parser::Eps(ref symbol) => write!(f, "(eps {} {:?})", symbol.class, symbol.lexeme),
            Parser::Ukn(ref name) => write!(f, "(undefined {})", name),

            Parser::Alt => {
                write!(f, "(")?;
                self.walk(f, node.left, seen)?;
                write!(f, " | ")?;
                self.walk(f, node.right, seen)?;
                write!(f, ")")
            }

            Parser::Cat => {
                write!(f, "(")?;
                self.walk(f, node.left, seen)?;
                write!(f, " ")?;
                self.walk(f, node.right, seen)?;
                write!(f, ")")
            }

            Parser::Rep => {
                write!(f, "(* ")?;
                self.walk(f, node.left, seen)?;
                write!(f, ")")
            }

            Parser::Nt(ref rule) => {
                if !seen.borrow_mut().insert(nodeid) {
                    return write!(f, "{}#{}", rule.name, nodeid);
                }
                write!(f, "[{}#{}: ", rule.name, nodeid)?;
                self.walk(f, node.left, seen)?;
                write!(f, "]")
            }

            Parser::Laz(ref thunk) => match thunk.state {
                ThunkState::Forced(n) | ThunkState::Culled(Some(n)) => self.walk(f, n, seen),
                ThunkState::Culled(None) => write!(f, "∅"),
                ThunkState::Pending | ThunkState::Running => {
                    write!(f, "(D{} ", thunk.symbol.class)?;
                    self.walk(f, node.left, seen)?;
                    write!(f, ")")
                }
            },
        }
    }
}

impl<'a, L: Siaa> fmt::Display for Rendered<'a, L> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let seen = RefCell::new(HashSet::new());
        self.walk(f, self.start, &seen)
    }
}

#[cfg(feature = "render_trees")]
pub fn render_dot<L: Siaa, W: std::io::Write>(grammar: &Grammar<L>, start: NodeId, output: &mut W) -> std::io::Result<()> {
    use std::borrow::Cow;

    type Nd = usize;
    type Ed<'a> = &'a (usize, usize);

    struct Graph {
        nodes: Vec<String>,
        edges: Vec<(usize, usize)>,
    }

    struct GrammarRenderer<'a, L: Siaa> {
        grammar: &'a Grammar<L>,
        placed: hashbrown::HashMap<NodeId, usize>,
        graph: Graph,
    }

    impl<'a, L: Siaa> GrammarRenderer<'a, L> {
        fn handler(&mut self, nodeid: NodeId) -> usize {
            if let Some(pos) = self.placed.get(&nodeid) {
                return *pos;
            }

            let node = &self.grammar[nodeid];
            let (text, children) = match node.data {
                Parser::Emp => (format!("{:4} Emp", nodeid), vec![]),
                Parser::Tok(ref c) => (format!("{:4} ':{:?}", nodeid, c), vec![]),
                Parser::Eps(ref s) => (format!("{:4} e:{:?}", nodeid, s.lexeme), vec![]),
                Parser::Ukn(ref name) => (format!("{:4} Ukn {}", nodeid, name), vec![]),
                Parser::Alt => (format!("{:4} Alt", nodeid), vec![node.left, node.right]),
                Parser::Cat => (format!("{:4} Cat", nodeid), vec![node.left, node.right]),
                Parser::Rep => (format!("{:4} Rep", nodeid), vec![node.left]),
                Parser::Nt(ref rule) => (format!("{:4} Nt {}", nodeid, rule.name), vec![node.left]),
                Parser::Laz(ref thunk) => match thunk.resolved() {
                    Some(n) => (format!("{:4} L:{:?}", nodeid, thunk.state), vec![n]),
                    None => (format!("{:4} L:{:?}", nodeid, thunk.symbol.class), vec![node.left]),
                },
            };

            self.graph.nodes.push(text);
            let pos = self.graph.nodes.len() - 1;
            self.placed.insert(nodeid, pos);
            for child in children {
                let child = self.handler(child);
                self.graph.edges.push((pos, child));
            }
            pos
        }
    }

    impl<'a> dot::Labeller<'a, Nd, Ed<'a>> for Graph {
        fn graph_id(&'a self) -> dot::Id<'a> {
            dot::Id::new("grammar").unwrap()
        }

        fn node_id(&'a self, n: &Nd) -> dot::Id<'a> {
            dot::Id::new(format!("N{}", n)).unwrap()
        }

        fn node_label<'b>(&'b self, n: &Nd) -> dot::LabelText<'b> {
            dot::LabelText::LabelStr(Cow::from(self.nodes[*n].to_owned()))
        }
    }

    impl<'a> dot::GraphWalk<'a, Nd, Ed<'a>> for Graph {
        fn nodes(&self) -> dot::Nodes<'a, Nd> {
            (0..self.nodes.len()).collect()
        }
        fn edges(&'a self) -> dot::Edges<'a, Ed<'a>> {
            self.edges.iter().collect()
        }
        fn source(&self, e: &Ed) -> Nd {
            let &&(s, _) = e;
            s
        }
        fn target(&self, e: &Ed) -> Nd {
            let &&(_, t) = e;
            t
        }
    }

    let mut renderer = GrammarRenderer {
        grammar,
        placed: hashbrown::HashMap::new(),
        graph: Graph {
            nodes: vec![],
            edges: vec![],
        },
    };
    renderer.handler(start);
    dot::render(&renderer.graph, output)
}
