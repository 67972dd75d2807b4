//! MCTS tree node representation.
//!
//! Each node represents the state reached by the searching agent taking an
//! action from the parent. States are not stored: every iteration replays the
//! path from a copy of the root state.

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// A node in the MCTS tree.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// Parent node index (NONE for root)
    pub parent: NodeId,

    /// Action index that led to this node from parent
    pub action: u8,

    /// Distance from the root
    pub depth: u32,

    /// Number of times this node has been visited
    pub visit_count: u32,

    /// Sum of rollout values backed up through this node
    pub value_sum: f64,

    /// Smallest and largest value ever backed up through this node.
    /// Starts inverted so the first backup sets both.
    pub bounds: (f64, f64),

    /// One slot per action index, `NodeId::NONE` until expanded
    pub children: Vec<NodeId>,
}

impl MctsNode {
    /// Create a new root node with `num_actions` empty child slots.
    pub fn new_root(num_actions: usize) -> Self {
        Self::new_child(NodeId::NONE, 0, 0, num_actions)
    }

    /// Create a new child node.
    pub fn new_child(parent: NodeId, action: u8, depth: u32, num_actions: usize) -> Self {
        Self {
            parent,
            action,
            depth,
            visit_count: 0,
            value_sum: 0.0,
            bounds: (f64::MAX, -f64::MAX),
            children: vec![NodeId::NONE; num_actions],
        }
    }

    /// Mean backed-up value, guarded by `epsilon` for unvisited nodes.
    #[inline]
    pub fn mean_value(&self, epsilon: f64) -> f64 {
        self.value_sum / (self.visit_count as f64 + epsilon)
    }

    /// Whether any child slot is still empty.
    #[inline]
    pub fn has_unexpanded(&self) -> bool {
        self.children.iter().any(|c| c.is_none())
    }

    /// Number of children created so far.
    pub fn expanded_count(&self) -> usize {
        self.children.iter().filter(|c| c.is_some()).count()
    }

    /// Record a backed-up value.
    #[inline]
    pub fn record(&mut self, value: f64) {
        self.visit_count += 1;
        self.value_sum += value;
        if value < self.bounds.0 {
            self.bounds.0 = value;
        }
        if value > self.bounds.1 {
            self.bounds.1 = value;
        }
    }
}
