use std::ops::Index;
use std::ops::IndexMut;

pub type NodeId = usize;

/// A binary node: a payload and two child edges.  Leaves and unary
/// nodes simply leave the unused edges at zero, which by convention
/// is the owner's sentinel.
#[derive(Debug, Clone)]
pub struct Node<T> {
    pub left: NodeId,
    pub right: NodeId,
    pub data: T,
}

impl<T> Node<T> {
    pub fn new(data: T) -> Node<T> {
        Node {
            left: NodeId::default(),
            right: NodeId::default(),
            data,
        }
    }

    pub fn with(data: T, left: NodeId, right: NodeId) -> Node<T> {
        Node { left, right, data }
    }
}

#[derive(Debug, Clone)]
pub struct Arena<T> {
    pub arena: Vec<Node<T>>,
}

impl<T> Arena<T> {
    pub fn new() -> Arena<T> {
        Arena { arena: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn push(&mut self, node: Node<T>) -> NodeId {
        self.arena.push(node);
        self.arena.len() - 1
    }

    pub fn add(&mut self, data: T) -> NodeId {
        self.push(Node::new(data))
    }

    pub fn get(&self, index: NodeId) -> Option<&Node<T>> {
        self.arena.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Node<T>> {
        self.arena.iter()
    }

    /// Drops every node not flagged in `live`, sliding the survivors
    /// down in their original order.  Returns the old-index to
    /// new-index map; edges are *not* rewritten here, since only the
    /// owner knows which parts of `T` hold indices.
    pub fn compact(&mut self, live: &[bool]) -> Vec<Option<NodeId>> {
        debug_assert!(live.len() == self.arena.len());
        let mut map = Vec::with_capacity(self.arena.len());
        let mut next = 0;
        for keep in live {
            if *keep {
                map.push(Some(next));
                next += 1;
            } else {
                map.push(None);
            }
        }

        let mut index = 0;
        self.arena.retain(|_| {
            let keep = live[index];
            index += 1;
            keep
        });
        map
    }
}

impl<T> Index<NodeId> for Arena<T> {
    type Output = Node<T>;

    fn index(&self, index: NodeId) -> &Node<T> {
        debug_assert!(index < self.arena.len());
        &self.arena[index]
    }
}

impl<T> IndexMut<NodeId> for Arena<T> {
    fn index_mut(&mut self, index: NodeId) -> &mut Node<T> {
        debug_assert!(index < self.arena.len());
        &mut self.arena[index]
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}
