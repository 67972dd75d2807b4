//! MCTS tree structure with arena allocation.
//!
//! The tree uses arena allocation for efficient node storage and
//! cache-friendly traversal. Nodes are stored in a contiguous Vec
//! and referenced by NodeId indices. A tree lives for exactly one search
//! and is dropped as a unit.

use rand::Rng;
use rand_chacha::ChaCha20Rng;

use crate::node::{MctsNode, NodeId};

/// Rescale `value` into [0, 1] using the given bounds.
/// Degenerate bounds (`min >= max`) leave the value unchanged.
#[inline]
pub fn normalise(value: f64, min: f64, max: f64) -> f64 {
    if min < max {
        (value - min) / (max - min)
    } else {
        value
    }
}

/// Perturb `value` by a tiny multiplicative amount to break ties.
/// `r` is a uniform draw in [0, 1).
#[inline]
pub fn noise(value: f64, epsilon: f64, r: f64) -> f64 {
    (value + epsilon) * (1.0 + epsilon * (r - 0.5))
}

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct MctsTree {
    /// Arena storing all nodes
    nodes: Vec<MctsNode>,

    /// Root node index (always 0 after initialization)
    root: NodeId,

    num_actions: usize,
}

impl MctsTree {
    /// Create a new tree whose nodes each have `num_actions` child slots.
    pub fn new(num_actions: usize) -> Self {
        Self {
            nodes: vec![MctsNode::new_root(num_actions)],
            root: NodeId(0),
            num_actions,
        }
    }

    /// Get the root node ID.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Get a reference to a node by ID.
    #[inline]
    pub fn get(&self, id: NodeId) -> &MctsNode {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable reference to a node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MctsNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Get the total number of nodes in the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty (should never be true after construction).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Create the child of `parent_id` for `action` and link it into the
    /// parent's slot. Returns the new child's NodeId.
    pub fn add_child(&mut self, parent_id: NodeId, action: usize) -> NodeId {
        let depth = self.get(parent_id).depth + 1;
        let child_id = NodeId(self.nodes.len() as u32);
        self.nodes.push(MctsNode::new_child(
            parent_id,
            action as u8,
            depth,
            self.num_actions,
        ));
        self.get_mut(parent_id).children[action] = child_id;
        child_id
    }

    /// Pick the empty child slot with the largest uniform draw.
    /// Returns None when the node is fully expanded.
    pub fn pick_unexpanded(&self, node_id: NodeId, rng: &mut ChaCha20Rng) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (action, child) in self.get(node_id).children.iter().enumerate() {
            if child.is_some() {
                continue;
            }
            let x: f64 = rng.gen();
            if best.map_or(true, |(_, v)| x > v) {
                best = Some((action, x));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Select a child of a fully expanded node with UCT.
    ///
    /// `Q` is the child's epsilon-guarded mean normalised by the *parent's*
    /// bounds, `U = k * sqrt(ln(N_parent + 1) / (N_child + epsilon))`, and the
    /// sum is perturbed with `noise` before comparison.
    pub fn uct_select(
        &self,
        node_id: NodeId,
        k: f64,
        epsilon: f64,
        rng: &mut ChaCha20Rng,
    ) -> Option<NodeId> {
        let node = self.get(node_id);
        let (min, max) = node.bounds;
        let ln_parent = (node.visit_count as f64 + 1.0).ln();

        let mut selected = None;
        let mut best_value = -f64::MAX;
        for &child_id in node.children.iter().filter(|c| c.is_some()) {
            let child = self.get(child_id);
            let q = normalise(child.mean_value(epsilon), min, max);
            let u = k * (ln_parent / (child.visit_count as f64 + epsilon)).sqrt();
            let score = noise(q + u, epsilon, rng.gen());
            if score > best_value {
                best_value = score;
                selected = Some(child_id);
            }
        }
        selected
    }

    /// Backpropagate a value from a node to the root.
    pub fn backpropagate(&mut self, leaf_id: NodeId, value: f64) {
        let mut current_id = leaf_id;
        while current_id.is_some() {
            let node = self.get_mut(current_id);
            node.record(value);
            current_id = node.parent;
        }
    }

    /// Recommend the root action with the most visits, ties broken by noise.
    ///
    /// When every expanded child has the same visit count the best mean value
    /// decides instead; with no expanded children the answer is action 0.
    pub fn most_visited_action(&self, epsilon: f64, rng: &mut ChaCha20Rng) -> usize {
        let root = self.get(self.root);
        let mut selected = None;
        let mut best_value = -f64::MAX;
        let mut first_visits = None;
        let mut all_equal = true;

        for (action, &child_id) in root.children.iter().enumerate() {
            if child_id.is_none() {
                continue;
            }
            let visits = self.get(child_id).visit_count;
            match first_visits {
                None => first_visits = Some(visits),
                Some(first) if first != visits => all_equal = false,
                _ => {}
            }
            let value = noise(visits as f64, epsilon, rng.gen());
            if value > best_value {
                best_value = value;
                selected = Some(action);
            }
        }

        match selected {
            None => 0,
            Some(_) if all_equal => self.best_action(epsilon, rng).unwrap_or_else(|| {
                tracing::warn!("No root child to recommend, falling back to action 0");
                0
            }),
            Some(action) => action,
        }
    }

    /// Root action with the highest mean value, ties broken by noise.
    pub fn best_action(&self, epsilon: f64, rng: &mut ChaCha20Rng) -> Option<usize> {
        let root = self.get(self.root);
        let mut selected = None;
        let mut best_value = -f64::MAX;
        for (action, &child_id) in root.children.iter().enumerate() {
            if child_id.is_none() {
                continue;
            }
            let value = noise(self.get(child_id).mean_value(epsilon), epsilon, rng.gen());
            if value > best_value {
                best_value = value;
                selected = Some(action);
            }
        }
        selected
    }

    /// Get statistics about the tree for debugging.
    pub fn stats(&self) -> TreeStats {
        let root = self.get(self.root);
        TreeStats {
            total_nodes: self.nodes.len(),
            root_visits: root.visit_count,
            root_value: if root.visit_count == 0 {
                0.0
            } else {
                root.value_sum / root.visit_count as f64
            },
            max_depth: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
        }
    }
}

/// Statistics about an MCTS tree.
#[derive(Debug, Clone)]
pub struct TreeStats {
    pub total_nodes: usize,
    pub root_visits: u32,
    pub root_value: f64,
    pub max_depth: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    const EPS: f64 = 1e-6;

    fn rng() -> ChaCha20Rng {
        ChaCha20Rng::seed_from_u64(42)
    }

    #[test]
    fn test_new_tree() {
        let tree = MctsTree::new(6);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.root(), NodeId(0));
        assert!(tree.get(tree.root()).parent.is_none());
        assert_eq!(tree.get(tree.root()).children.len(), 6);
    }

    #[test]
    fn test_normalise_and_noise() {
        assert!((normalise(5.0, 0.0, 10.0) - 0.5).abs() < 1e-12);
        // degenerate bounds pass the value through
        assert_eq!(normalise(3.0, 1.0, 1.0), 3.0);
        assert_eq!(normalise(3.0, f64::MAX, -f64::MAX), 3.0);

        let n = noise(1.0, EPS, 0.5);
        assert!((n - (1.0 + EPS)).abs() < 1e-12);
        assert!(noise(1.0, EPS, 0.9) > noise(1.0, EPS, 0.1));
    }

    #[test]
    fn test_add_child() {
        let mut tree = MctsTree::new(3);
        let child_id = tree.add_child(tree.root(), 2);

        assert_eq!(tree.len(), 2);
        assert_eq!(child_id, NodeId(1));
        assert_eq!(tree.get(tree.root()).children[2], child_id);
        assert!(tree.get(tree.root()).children[0].is_none());

        let child = tree.get(child_id);
        assert_eq!(child.parent, tree.root());
        assert_eq!(child.action, 2);
        assert_eq!(child.depth, 1);
    }

    #[test]
    fn test_pick_unexpanded_only_returns_empty_slots() {
        let mut tree = MctsTree::new(3);
        let mut rng = rng();
        tree.add_child(tree.root(), 0);
        tree.add_child(tree.root(), 2);

        for _ in 0..10 {
            assert_eq!(tree.pick_unexpanded(tree.root(), &mut rng), Some(1));
        }
        tree.add_child(tree.root(), 1);
        assert_eq!(tree.pick_unexpanded(tree.root(), &mut rng), None);
    }

    #[test]
    fn test_backpropagate_sums_and_bounds() {
        let mut tree = MctsTree::new(2);
        let child = tree.add_child(tree.root(), 0);
        let grandchild = tree.add_child(child, 1);

        tree.backpropagate(grandchild, 0.5);
        tree.backpropagate(child, -0.25);

        let root = tree.get(tree.root());
        assert_eq!(root.visit_count, 2);
        assert!((root.value_sum - 0.25).abs() < 1e-12);
        assert_eq!(root.bounds, (-0.25, 0.5));

        let child_node = tree.get(child);
        assert_eq!(child_node.visit_count, 2);
        assert_eq!(child_node.bounds, (-0.25, 0.5));

        let leaf = tree.get(grandchild);
        assert_eq!(leaf.visit_count, 1);
        assert_eq!(leaf.bounds, (0.5, 0.5));
    }

    #[test]
    fn test_uct_prefers_unvisited_child() {
        let mut tree = MctsTree::new(2);
        let visited = tree.add_child(tree.root(), 0);
        let fresh = tree.add_child(tree.root(), 1);
        for _ in 0..5 {
            tree.backpropagate(visited, 1.0);
        }

        // Zero visits are guarded by epsilon, giving a huge but finite bonus
        let mut rng = rng();
        assert_eq!(tree.uct_select(tree.root(), 2f64.sqrt(), EPS, &mut rng), Some(fresh));
    }

    #[test]
    fn test_uct_on_all_unvisited_children_is_finite() {
        let mut tree = MctsTree::new(3);
        for a in 0..3 {
            tree.add_child(tree.root(), a);
        }
        let mut rng = rng();
        let selected = tree.uct_select(tree.root(), 2f64.sqrt(), EPS, &mut rng);
        assert!(selected.is_some());
    }

    #[test]
    fn test_uct_normalises_with_parent_bounds() {
        let mut tree = MctsTree::new(2);
        let good = tree.add_child(tree.root(), 0);
        let bad = tree.add_child(tree.root(), 1);
        for _ in 0..50 {
            tree.backpropagate(good, 10.0);
            tree.backpropagate(bad, -10.0);
        }
        let mut rng = rng();
        assert_eq!(tree.uct_select(tree.root(), 0.1, EPS, &mut rng), Some(good));
    }

    #[test]
    fn test_most_visited_action() {
        let mut tree = MctsTree::new(4);
        let a = tree.add_child(tree.root(), 1);
        let b = tree.add_child(tree.root(), 3);
        tree.backpropagate(a, 0.0);
        tree.backpropagate(b, 0.0);
        tree.backpropagate(b, 0.0);

        let mut rng = rng();
        assert_eq!(tree.most_visited_action(EPS, &mut rng), 3);
    }

    #[test]
    fn test_equal_visits_fall_back_to_best_mean() {
        let mut tree = MctsTree::new(3);
        let a = tree.add_child(tree.root(), 0);
        let b = tree.add_child(tree.root(), 1);
        let c = tree.add_child(tree.root(), 2);
        for (child, value) in [(a, 0.1), (b, 0.9), (c, 0.4)] {
            tree.backpropagate(child, value);
            tree.backpropagate(child, value);
        }

        let mut rng = rng();
        assert_eq!(tree.most_visited_action(EPS, &mut rng), 1);
        assert_eq!(tree.best_action(EPS, &mut rng), Some(1));
    }

    #[test]
    fn test_no_children_recommends_zero() {
        let tree = MctsTree::new(6);
        let mut rng = rng();
        assert_eq!(tree.most_visited_action(EPS, &mut rng), 0);
        assert_eq!(tree.best_action(EPS, &mut rng), None);
    }

    #[test]
    fn test_tree_stats() {
        let mut tree = MctsTree::new(2);
        let child = tree.add_child(tree.root(), 0);
        tree.add_child(child, 1);
        tree.backpropagate(child, 1.0);

        let stats = tree.stats();
        assert_eq!(stats.total_nodes, 3);
        assert_eq!(stats.max_depth, 2);
        assert_eq!(stats.root_visits, 1);
    }
}
