//! Interning of words to dense symbol ids
//!
//! Words are stored in a compressed prefix tree whose edges carry byte
//! labels.  Every node other than the root either ends a word or branches into
//! at least two children; insertion splits edges to keep this true and removal
//! merges them back.  Ids of removed words are recycled last-in first-out
//! before fresh ids are allocated.

use std::mem;

use crate::{MAX_SYMBOL, free::Free, prelude::*};

/// A failed lookup or insertion on an [`Alphabet`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AlphabetError {
    /// No live word has this id
    #[error("No word is assigned to symbol {0}")]
    IdNotFound(Symbol),
    /// The word was never added or has been removed
    #[error("Word {0:?} is not in the alphabet")]
    WordNotFound(String),
    /// Every id up to the maximum is taken by a live word
    #[error("Alphabet id space exhausted")]
    CapacityExceeded,
}

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
struct Node {
    label: Vec<u8>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    symbol: Option<Symbol>,
}

impl Node {
    #[inline]
    fn new(label: Vec<u8>, parent: Option<NodeId>) -> Self {
        Self {
            label,
            parent,
            children: vec![],
            symbol: None,
        }
    }
}

fn common_prefix(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(a, b)| a == b).count()
}

/// A bidirectional mapping between words and symbol ids
#[derive(Debug, Clone)]
pub struct Alphabet {
    nodes: Vec<Option<Node>>,
    vacant: Vec<NodeId>,
    words: BTreeMap<Symbol, NodeId>,
    recycled: Vec<Symbol>,
    free: Free<Symbol>,
}

impl Default for Alphabet {
    #[inline]
    fn default() -> Self { Self::with_max_id(MAX_SYMBOL) }
}

impl Alphabet {
    /// An empty alphabet using the whole non-negative symbol range
    #[inline]
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Construct an empty alphabet handing out ids in `0..=max`
    #[must_use]
    pub fn with_max_id(max: Symbol) -> Self {
        Self {
            nodes: vec![Some(Node::new(vec![], None))],
            vacant: vec![],
            words: BTreeMap::new(),
            recycled: vec![],
            free: Free::new(0, max),
        }
    }

    /// The number of live words
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize { self.words.len() }

    /// Check whether no word is live
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool { self.words.is_empty() }

    /// Check whether `word` is live
    #[inline]
    #[must_use]
    pub fn contains(&self, word: &str) -> bool { self.find(word.as_bytes()).is_some() }

    /// Add a word, returning false if it was already present or no id is left
    pub fn add(&mut self, word: &str) -> bool { matches!(self.insert(word), Ok((_, true))) }

    /// Look up the id of a word, assigning a new one if it is absent
    ///
    /// # Errors
    /// Returns [`AlphabetError::CapacityExceeded`] if the word is new and the
    /// id space is exhausted.
    pub fn intern(&mut self, word: &str) -> Result<Symbol, AlphabetError> {
        self.insert(word).map(|(id, _)| id)
    }

    /// # Errors
    /// Returns [`AlphabetError::WordNotFound`] if the word was never added.
    pub fn id(&self, word: &str) -> Result<Symbol, AlphabetError> {
        self.find(word.as_bytes())
            .ok_or_else(|| AlphabetError::WordNotFound(word.into()))
    }

    /// # Errors
    /// Returns [`AlphabetError::IdNotFound`] if no live word has this id.
    pub fn word(&self, id: Symbol) -> Result<String, AlphabetError> {
        let &node = self.words.get(&id).ok_or(AlphabetError::IdNotFound(id))?;
        Ok(self.spell(node))
    }

    /// Remove a word, freeing its id for reuse
    ///
    /// # Errors
    /// Returns [`AlphabetError::WordNotFound`] if the word is absent.
    pub fn remove(&mut self, word: &str) -> Result<Symbol, AlphabetError> {
        let id = self.id(word)?;
        self.remove_id(id)?;
        Ok(id)
    }

    /// Remove the word with the given id, returning it
    ///
    /// # Errors
    /// Returns [`AlphabetError::IdNotFound`] if no live word has this id.
    pub fn remove_id(&mut self, id: Symbol) -> Result<String, AlphabetError> {
        let node = self.words.remove(&id).ok_or(AlphabetError::IdNotFound(id))?;
        let word = self.spell(node);
        self.node_mut(node).symbol = None;
        self.recycled.push(id);
        self.compress(node);
        Ok(word)
    }

    /// Remove every word for which `f` returns false
    pub fn retain(&mut self, mut f: impl FnMut(Symbol, &str) -> bool) {
        let doomed: Vec<_> = self
            .iter()
            .filter(|(id, word)| !f(*id, word))
            .map(|(id, _)| id)
            .collect();

        for id in doomed {
            self.remove_id(id).unwrap_or_else(|_| unreachable!());
        }
    }

    /// Iterate over `(id, word)` pairs in id order
    pub fn iter(&self) -> impl Iterator<Item = (Symbol, String)> + '_ {
        self.words.iter().map(|(&id, &node)| (id, self.spell(node)))
    }

    #[inline]
    fn node(&self, id: NodeId) -> &Node {
        self.nodes
            .get(id)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| unreachable!())
    }

    #[inline]
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes
            .get_mut(id)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| unreachable!())
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(id) = self.vacant.pop() {
            self.nodes[id] = Some(node);
            id
        } else {
            self.nodes.push(Some(node));
            self.nodes.len() - 1
        }
    }

    fn release(&mut self, id: NodeId) -> Node {
        let node = self.nodes[id].take().unwrap_or_else(|| unreachable!());
        self.vacant.push(id);
        node
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        for child in &mut self.node_mut(parent).children {
            if *child == old {
                *child = new;
            }
        }
    }

    fn child_starting_with(&self, node: NodeId, byte: u8) -> Option<NodeId> {
        self.node(node)
            .children
            .iter()
            .copied()
            .find(|&c| self.node(c).label.first() == Some(&byte))
    }

    fn locate(&self, mut rest: &[u8]) -> Option<NodeId> {
        let mut node = ROOT;

        while let Some(&first) = rest.first() {
            let child = self.child_starting_with(node, first)?;
            rest = rest.strip_prefix(self.node(child).label.as_slice())?;
            node = child;
        }

        Some(node)
    }

    #[inline]
    fn find(&self, word: &[u8]) -> Option<Symbol> {
        self.locate(word).and_then(|n| self.node(n).symbol)
    }

    fn insert(&mut self, word: &str) -> Result<(Symbol, bool), AlphabetError> {
        if let Some(id) = self.find(word.as_bytes()) {
            return Ok((id, false));
        }

        let id = self
            .recycled
            .pop()
            .or_else(|| self.free.fresh())
            .ok_or(AlphabetError::CapacityExceeded)?;
        let node = self.graft(word.as_bytes());
        self.node_mut(node).symbol = Some(id);
        self.words.insert(id, node);
        Ok((id, true))
    }

    fn graft(&mut self, mut rest: &[u8]) -> NodeId {
        let mut node = ROOT;

        while let Some(&first) = rest.first() {
            let Some(child) = self.child_starting_with(node, first) else {
                let leaf = self.alloc(Node::new(rest.to_vec(), Some(node)));
                self.node_mut(node).children.push(leaf);
                return leaf;
            };

            let label_len = self.node(child).label.len();
            let common = common_prefix(&self.node(child).label, rest);
            node = if common < label_len {
                self.split(child, common)
            } else {
                child
            };
            rest = &rest[common..];
        }

        node
    }

    /// Split the edge into `child` after `at` bytes, returning the new node
    fn split(&mut self, child: NodeId, at: usize) -> NodeId {
        let parent = self.node(child).parent.unwrap_or_else(|| unreachable!());
        let tail = self.node_mut(child).label.split_off(at);
        let head = mem::replace(&mut self.node_mut(child).label, tail);

        let mid = self.alloc(Node {
            label: head,
            parent: Some(parent),
            children: vec![child],
            symbol: None,
        });
        self.node_mut(child).parent = Some(mid);
        self.replace_child(parent, child, mid);
        mid
    }

    /// Prune dead branches upward from `node` and merge a sole remaining
    /// child into its parent edge
    fn compress(&mut self, mut node: NodeId) {
        while let Some(parent) = self.node(node).parent {
            let n = self.node(node);
            if n.symbol.is_some() {
                break;
            }

            match (n.children.len(), n.children.first().copied()) {
                (0, _) => {
                    self.node_mut(parent).children.retain(|&c| c != node);
                    self.release(node);
                    node = parent;
                },
                (1, Some(child)) => {
                    let Node { mut label, .. } = self.release(node);
                    let c = self.node_mut(child);
                    label.extend_from_slice(&c.label);
                    c.label = label;
                    c.parent = Some(parent);
                    self.replace_child(parent, node, child);
                    break;
                },
                _ => break,
            }
        }
    }

    fn spell(&self, mut node: NodeId) -> String {
        let mut parts = vec![];
        while let Some(parent) = self.node(node).parent {
            parts.push(self.node(node).label.as_slice());
            node = parent;
        }

        let bytes: Vec<u8> = parts.into_iter().rev().flatten().copied().collect();
        String::from_utf8(bytes).unwrap_or_else(|_| unreachable!())
    }
}
