//! The adaptive Huffman code tree.
//!
//! The tree lives in a fixed-capacity arena of `NODE_COUNT` slots. Slot 0 is
//! the root; the slots in use are `0..next_free_node()`. Layout obeys the
//! sibling property at all times:
//!
//! - weights never increase as the index grows
//! - the children of an internal node sit in two adjacent slots `c` and `c + 1`
//! - an internal node weighs exactly the sum of its children
//!
//! A slot's `parent` describes where the slot hangs in the tree, not what
//! currently occupies it. Moving content between slots therefore carries
//! weight and kind, and the back-references (children's parents, the symbol
//! table) are patched to follow it.
//!
//! # Code Bits
//!
//! A step into an odd slot is a 0 bit, a step into an even slot is a 1 bit.
//! First children always occupy odd slots, so decoding is `child + bit`.

use tracing::{debug, trace};

use crate::error::{Result, StructuralError};

/// Byte symbols plus END_OF_STREAM and ESCAPE.
pub const SYMBOL_COUNT: usize = 258;

/// Capacity of the node arena: a full binary tree over every symbol.
pub const NODE_COUNT: usize = SYMBOL_COUNT * 2 - 1;

/// Root weight ceiling. The tree is rebuilt before the root would reach it.
pub const MAX_WEIGHT: u32 = 0x8000;

/// One member of the coding alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A literal data byte
    Byte(u8),
    /// Marks the end of the logical stream
    EndOfStream,
    /// Announces an 8-bit literal for a symbol not yet in the tree
    Escape,
}

impl Symbol {
    /// Position of this symbol in the symbol table (0..SYMBOL_COUNT).
    pub fn index(self) -> usize {
        self.value() as usize
    }

    /// Numeric value: bytes map to themselves, END_OF_STREAM is 256, ESCAPE is 257.
    pub fn value(self) -> u16 {
        match self {
            Symbol::Byte(b) => u16::from(b),
            Symbol::EndOfStream => 256,
            Symbol::Escape => 257,
        }
    }
}

impl From<u8> for Symbol {
    fn from(byte: u8) -> Self {
        Symbol::Byte(byte)
    }
}

/// Typed index into the node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIndex(u16);

impl NodeIndex {
    pub const ROOT: NodeIndex = NodeIndex(0);

    fn new(index: usize) -> Self {
        debug_assert!(index < NODE_COUNT);
        NodeIndex(index as u16)
    }

    pub fn get(self) -> usize {
        self.0 as usize
    }
}

/// What a slot currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Leaf(Symbol),
    /// Children occupy `child` and `child + 1`
    Internal { child: NodeIndex },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Node {
    pub weight: u32,
    /// `None` only for the root slot
    pub parent: Option<NodeIndex>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, NodeKind::Leaf(_))
    }
}

/// A path from the root to a leaf.
///
/// `bits` holds `len` bits; the highest of them is the step taken at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
    pub bits: u64,
    pub len: usize,
}

/// The self-adjusting Huffman tree.
///
/// One tree is built per encode or decode run and is owned by that run.
#[derive(Debug, Clone)]
pub struct CodeTree {
    /// Occupied slots; `nodes.len()` is the next free slot
    nodes: Vec<Node>,
    /// Symbol -> leaf slot, `None` until the symbol is first seen
    leaf: [Option<NodeIndex>; SYMBOL_COUNT],
    /// Number of rebuilds performed so far
    rebuilds: u64,
}

impl CodeTree {
    /// Create the initial tree: a root over END_OF_STREAM and ESCAPE.
    pub fn new() -> Self {
        let root = NodeIndex::ROOT;
        let mut nodes = Vec::with_capacity(NODE_COUNT);
        nodes.push(Node {
            weight: 2,
            parent: None,
            kind: NodeKind::Internal {
                child: NodeIndex(1),
            },
        });
        nodes.push(Node {
            weight: 1,
            parent: Some(root),
            kind: NodeKind::Leaf(Symbol::EndOfStream),
        });
        nodes.push(Node {
            weight: 1,
            parent: Some(root),
            kind: NodeKind::Leaf(Symbol::Escape),
        });

        let mut leaf = [None; SYMBOL_COUNT];
        leaf[Symbol::EndOfStream.index()] = Some(NodeIndex(1));
        leaf[Symbol::Escape.index()] = Some(NodeIndex(2));

        Self {
            nodes,
            leaf,
            rebuilds: 0,
        }
    }

    /// Bounds-checked slot access.
    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index.get())
    }

    /// All occupied slots in index order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// First unused slot of the arena.
    pub fn next_free_node(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_weight(&self) -> u32 {
        self.nodes[NodeIndex::ROOT.get()].weight
    }

    /// Leaf slot holding `symbol`, if it has been seen.
    pub fn leaf(&self, symbol: Symbol) -> Option<NodeIndex> {
        self.leaf[symbol.index()]
    }

    pub fn contains(&self, symbol: Symbol) -> bool {
        self.leaf(symbol).is_some()
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }

    /// Root-to-leaf path of the slot `from`.
    ///
    /// # Errors
    /// `StructuralError::CodeTooLong` if the leaf is deeper than 64 levels.
    pub fn path(&self, from: NodeIndex) -> Result<Code> {
        let mut bits = 0u64;
        let mut len = 0usize;
        let mut current = from;

        // Walking upward yields the bits leaf-first; filling from the low end
        // leaves the root's step in the highest position.
        while let Some(parent) = self.nodes[current.get()].parent {
            if len == 64 {
                return Err(StructuralError::CodeTooLong(len + 1).into());
            }
            if current.get() % 2 == 0 {
                bits |= 1 << len;
            }
            len += 1;
            current = parent;
        }

        Ok(Code { bits, len })
    }

    /// Add a previously unseen symbol by splitting the lightest leaf.
    ///
    /// The lightest leaf moves down into slot `next_free_node`, the new symbol
    /// takes slot `next_free_node + 1` with weight 0, and the old slot becomes
    /// their parent. The caller is expected to `update` the new symbol next.
    ///
    /// # Errors
    /// - `StructuralError::DuplicateSymbol` if the symbol already has a leaf
    /// - `StructuralError::TreeFull` if no two slots remain
    pub fn insert(&mut self, symbol: Symbol) -> Result<NodeIndex> {
        if self.contains(symbol) {
            let value = symbol.value();
            return Err(match symbol {
                Symbol::Byte(b) => StructuralError::DuplicateSymbol(b),
                _ => StructuralError::InvalidSymbol(value),
            }
            .into());
        }
        if self.nodes.len() + 2 > NODE_COUNT {
            return Err(StructuralError::TreeFull {
                capacity: NODE_COUNT,
            }
            .into());
        }

        let lightest = self.nodes.len() - 1;
        let old = self.nodes[lightest];
        let NodeKind::Leaf(old_symbol) = old.kind else {
            return Err(StructuralError::LightestNotLeaf { index: lightest }.into());
        };

        let split = NodeIndex::new(lightest);
        let moved = NodeIndex::new(self.nodes.len());
        let added = NodeIndex::new(self.nodes.len() + 1);

        self.nodes.push(Node {
            parent: Some(split),
            ..old
        });
        self.leaf[old_symbol.index()] = Some(moved);

        self.nodes.push(Node {
            weight: 0,
            parent: Some(split),
            kind: NodeKind::Leaf(symbol),
        });
        self.leaf[symbol.index()] = Some(added);

        self.nodes[lightest].kind = NodeKind::Internal { child: moved };

        trace!(symbol = symbol.value(), slot = added.get(), "inserted new symbol");
        Ok(added)
    }

    /// Count one more occurrence of `symbol` and restore the sibling property.
    ///
    /// Rebuilds first if the increment would bring the root to `MAX_WEIGHT`,
    /// one step earlier than coders that wait for the root to reach it, so
    /// streams stop being bit-compatible with theirs after the first rebuild.
    /// Each node on the path to the root is incremented, then slid toward
    /// the root past every lighter slot, swapping once per level.
    ///
    /// # Errors
    /// `StructuralError::MissingLeaf` if the symbol is not in the tree.
    pub fn update(&mut self, symbol: Symbol) -> Result<()> {
        if !self.contains(symbol) {
            return Err(StructuralError::MissingLeaf(symbol.value()).into());
        }

        if self.root_weight() + 1 >= MAX_WEIGHT {
            self.rebuild();
        }

        // Looked up after the rebuild, which relocates leaves.
        let mut current = self.leaf(symbol);
        while let Some(node) = current {
            let index = node.get();
            self.nodes[index].weight += 1;
            let weight = self.nodes[index].weight;

            let mut target = index;
            while target > NodeIndex::ROOT.get() && self.nodes[target - 1].weight < weight {
                target -= 1;
            }

            if target != index {
                self.swap(index, target);
            }

            current = self.nodes[target].parent;
        }

        Ok(())
    }

    /// Exchange the contents of slots `i` and `j`.
    ///
    /// Weight and kind move; each slot keeps its own parent. Leaves are
    /// re-pointed in the symbol table, internal nodes re-parent their children.
    pub fn swap(&mut self, i: usize, j: usize) {
        self.point_content_at(i, j);
        self.point_content_at(j, i);

        let parent_i = self.nodes[i].parent;
        let parent_j = self.nodes[j].parent;
        self.nodes.swap(i, j);
        self.nodes[i].parent = parent_i;
        self.nodes[j].parent = parent_j;
    }

    /// Make everything that refers to the content of `from` refer to `to`.
    fn point_content_at(&mut self, from: usize, to: usize) {
        let to = NodeIndex::new(to);
        match self.nodes[from].kind {
            NodeKind::Leaf(symbol) => self.leaf[symbol.index()] = Some(to),
            NodeKind::Internal { child } => {
                self.nodes[child.get()].parent = Some(to);
                self.nodes[child.get() + 1].parent = Some(to);
            }
        }
    }

    /// Halve every leaf weight and rebuild the tree from scratch.
    ///
    /// 1. Leaves are packed into the tail of the occupied range with their
    ///    weights halved (rounding up), keeping their relative order.
    /// 2. Working from the tail, each pair of lowest-weight nodes gets a new
    ///    parent, which is inserted at the first position that keeps weights
    ///    ordered. Nodes between the free slot and that position shift down.
    /// 3. Parent pointers and the symbol table are rebuilt from the layout.
    pub fn rebuild(&mut self) {
        let before = self.root_weight();
        let used = self.nodes.len();

        let mut tail = used;
        for i in (0..used).rev() {
            if self.nodes[i].is_leaf() {
                tail -= 1;
                let mut node = self.nodes[i];
                node.weight = (node.weight + 1) / 2;
                self.nodes[tail] = node;
            }
        }

        // `tail` is now the number of internal nodes. Filling slot `free`
        // consumes the pair at `2 * free + 1`, which walks down from the end.
        for free in (0..tail).rev() {
            let pair = 2 * free + 1;
            let weight = self.nodes[pair].weight + self.nodes[pair + 1].weight;

            let mut position = free + 1;
            while weight < self.nodes[position].weight {
                position += 1;
            }
            position -= 1;

            self.nodes.copy_within(free + 1..=position, free);
            self.nodes[position] = Node {
                weight,
                parent: None,
                kind: NodeKind::Internal {
                    child: NodeIndex::new(pair),
                },
            };
        }

        self.nodes[NodeIndex::ROOT.get()].parent = None;
        for i in (0..used).rev() {
            let slot = NodeIndex::new(i);
            match self.nodes[i].kind {
                NodeKind::Leaf(symbol) => self.leaf[symbol.index()] = Some(slot),
                NodeKind::Internal { child } => {
                    self.nodes[child.get()].parent = Some(slot);
                    self.nodes[child.get() + 1].parent = Some(slot);
                }
            }
        }

        self.rebuilds += 1;
        debug!(
            before,
            after = self.root_weight(),
            rebuilds = self.rebuilds,
            "rebuilt code tree"
        );
    }

    /// Check every structural invariant, describing the first violation.
    pub fn validate(&self) -> std::result::Result<(), String> {
        let len = self.nodes.len();

        if self.nodes[0].parent.is_some() {
            return Err("root has a parent".to_string());
        }
        if self.root_weight() > MAX_WEIGHT {
            return Err(format!("root weight {} above ceiling", self.root_weight()));
        }

        for i in 1..len {
            if self.nodes[i - 1].weight < self.nodes[i].weight {
                return Err(format!(
                    "weight order broken at {}: {} < {}",
                    i,
                    self.nodes[i - 1].weight,
                    self.nodes[i].weight
                ));
            }
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match node.kind {
                NodeKind::Leaf(symbol) => {
                    if self.leaf[symbol.index()] != Some(NodeIndex::new(i)) {
                        return Err(format!("symbol {} not mapped to slot {}", symbol.value(), i));
                    }
                }
                NodeKind::Internal { child } => {
                    let c = child.get();
                    if c <= i || c + 1 >= len {
                        return Err(format!("slot {} has children out of range at {}", i, c));
                    }
                    if c % 2 == 0 {
                        return Err(format!("slot {} has first child in even slot {}", i, c));
                    }
                    let parent = Some(NodeIndex::new(i));
                    if self.nodes[c].parent != parent || self.nodes[c + 1].parent != parent {
                        return Err(format!("children of slot {} point elsewhere", i));
                    }
                    if node.weight != self.nodes[c].weight + self.nodes[c + 1].weight {
                        return Err(format!("slot {} weight is not the sum of its children", i));
                    }
                }
            }
        }

        for (symbol, slot) in self.leaf.iter().enumerate() {
            if let Some(slot) = slot {
                match self.nodes.get(slot.get()).map(|n| n.kind) {
                    Some(NodeKind::Leaf(s)) if s.index() == symbol => {}
                    _ => return Err(format!("symbol {} maps to non-matching slot {}", symbol, slot.get())),
                }
            }
        }

        Ok(())
    }
}

impl Default for CodeTree {
    fn default() -> Self {
        Self::new()
    }
}
