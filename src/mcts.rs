//! Monte Carlo Tree Search (MCTS) with UCT selection.
//!
//! Each iteration runs four phases:
//! - Selection: descend from the root by maximal UCT score to a leaf
//! - Expansion: add one child per legal action of that leaf
//! - Simulation: random playout from one randomly chosen new child
//! - Backpropagation: update visits and signed wins up to the root
//!
//! Nodes live in a single arena and refer to each other by [`NodeId`], so a
//! child can point back at its parent without shared ownership. Nothing is
//! removed during a search, which keeps every id valid until the tree is
//! dropped. A fresh tree is built for every move.

use std::time::{Duration, Instant};

use log::{debug, log_enabled, trace, Level};

use crate::constants::{ACTION_CAPACITY, MAX_ITERATIONS, MAX_TIME_MS, UCT_C};
use crate::error::EngineError;
use crate::playout::playout_with_buffer;
use crate::position::{gen_actions, is_terminal, Action, Player, State};

/// Index of a node in the tree arena. The root is always `NodeId(0)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the MCTS search tree.
#[derive(Clone, Debug)]
pub struct TreeNode {
    /// The position after `action` was played
    pub state: State,
    /// The action that led here (`None` only at the root)
    pub action: Option<Action>,
    /// Number of backpropagations through this node
    pub visits: u32,
    /// +1 per win and -1 per loss for the side that moved into this node
    pub wins: i32,
    /// Parent node (`None` only at the root)
    pub parent: Option<NodeId>,
    /// Child nodes in action generation order
    pub children: Vec<NodeId>,
}

impl TreeNode {
    fn new(state: State, action: Option<Action>, parent: Option<NodeId>) -> Self {
        Self {
            state,
            action,
            visits: 0,
            wins: 0,
            parent,
            children: Vec::new(),
        }
    }
}

/// UCT score of a child given its parent's visit count.
///
/// Unvisited children score +inf so each is simulated once before any
/// sibling statistics are reused.
#[inline]
pub fn uct_score(wins: i32, visits: u32, parent_visits: u32) -> f64 {
    if visits == 0 {
        return f64::INFINITY;
    }
    let v = visits as f64;
    wins as f64 / v + UCT_C * ((parent_visits as f64).ln() / v).sqrt()
}

/// MCTS tree with arena-based node storage.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    /// Playouts run during this episode
    playouts: usize,
}

impl Tree {
    /// Create a tree holding only a root for `state`.
    pub fn new(state: State) -> Self {
        Self {
            nodes: vec![TreeNode::new(state, None, None)],
            playouts: 0,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.index()]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut TreeNode {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes created so far, root included.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: the root exists from construction.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline]
    pub fn playouts(&self) -> usize {
        self.playouts
    }

    fn allocate(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// UCT score of a node against its parent. The root has no parent and
    /// scores -1 (display only).
    pub fn uct(&self, id: NodeId) -> f64 {
        let node = self.get(id);
        match node.parent {
            Some(parent) => uct_score(node.wins, node.visits, self.get(parent).visits),
            None => -1.0,
        }
    }

    /// Child of `id` with the highest UCT score; the first one wins ties.
    fn best_uct_child(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id);
        let mut best: Option<(NodeId, f64)> = None;
        for &child in &node.children {
            let c = self.get(child);
            let value = uct_score(c.wins, c.visits, node.visits);
            if best.is_none_or(|(_, best_value)| value > best_value) {
                best = Some((child, value));
            }
        }
        best.map(|(child, _)| child)
    }

    /// Descend from the root to a node without children.
    pub fn select(&self) -> NodeId {
        let mut id = self.root();
        while let Some(child) = self.best_uct_child(id) {
            id = child;
        }
        id
    }

    /// Add one child per legal action of `id`. A terminal position gets no
    /// children.
    pub fn expand(&mut self, id: NodeId, actions: &mut Vec<Action>) {
        let state = self.get(id).state;
        gen_actions(&state, actions);
        for &action in actions.iter() {
            let mut child_state = state;
            child_state.apply(action);
            let child = self.allocate(TreeNode::new(child_state, Some(action), Some(id)));
            self.get_mut(id).children.push(child);
        }
    }

    /// Run a playout from a random child of `id`.
    ///
    /// Returns the node backpropagation should start from and the winner.
    /// A childless (terminal) node is its own result: the side to move
    /// there has lost.
    pub fn simulate(
        &mut self,
        id: NodeId,
        rng: &mut fastrand::Rng,
        actions: &mut Vec<Action>,
    ) -> Result<(NodeId, Player), EngineError> {
        self.playouts += 1;
        let node = self.get(id);
        if node.children.is_empty() {
            return Ok((id, node.state.player.opponent()));
        }
        let child = node.children[rng.usize(..node.children.len())];
        let winner = playout_with_buffer(self.get(child).state, rng, actions)?;
        Ok((child, winner))
    }

    /// Walk from `id` up to the root, counting a visit at every node.
    ///
    /// `state.player` is the side about to move, so a win for its opponent
    /// is a win for whoever moved into the node. Losses subtract rather than
    /// being ignored, keeping `wins` in `[-visits, visits]`.
    pub fn backpropagate(&mut self, id: NodeId, winner: Player) {
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.get_mut(node_id);
            if winner == node.state.player.opponent() {
                node.wins += 1;
            } else {
                node.wins -= 1;
            }
            node.visits += 1;
            current = node.parent;
        }
    }

    /// Run one select, expand, simulate, backpropagate cycle.
    pub fn iterate(
        &mut self,
        rng: &mut fastrand::Rng,
        actions: &mut Vec<Action>,
    ) -> Result<(), EngineError> {
        let leaf = self.select();
        self.expand(leaf, actions);
        let (start, winner) = self.simulate(leaf, rng, actions)?;
        self.backpropagate(start, winner);
        Ok(())
    }

    /// Most visited child of the root; the first one wins ties.
    pub fn best_child(&self) -> Option<NodeId> {
        let mut best: Option<(NodeId, u32)> = None;
        for &child in &self.get(self.root()).children {
            let visits = self.get(child).visits;
            if best.is_none_or(|(_, best_visits)| visits > best_visits) {
                best = Some((child, visits));
            }
        }
        best.map(|(child, _)| child)
    }

    /// One-line description of a node for diagnostics.
    pub fn describe(&self, id: NodeId) -> String {
        let node = self.get(id);
        let parent = node
            .parent
            .map(|p| p.0.to_string())
            .unwrap_or_else(|| "nil".to_string());
        let action = node
            .action
            .map(|a| a.to_string())
            .unwrap_or_else(|| "nil".to_string());
        format!(
            "node {} wins {} visits {} uct {:.6} parent {} action {}",
            id.0,
            node.wins,
            node.visits,
            self.uct(id),
            parent,
            action
        )
    }

    /// Log every visited node at trace level, indented by depth.
    pub fn dump(&self) {
        if !log_enabled!(Level::Trace) {
            return;
        }
        let mut stack = vec![(self.root(), 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.get(id);
            if node.visits > 0 {
                trace!("{}{}", " ".repeat(depth * 2), self.describe(id));
            }
            for &child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
    }

    /// Log statistics for the root's children at debug level.
    pub fn dump_children(&self) {
        if !log_enabled!(Level::Debug) {
            return;
        }
        for &child in &self.get(self.root()).children {
            let node = self.get(child);
            if let Some(action) = node.action {
                debug!(
                    "action {} v={} w={} uct={:.3}",
                    action,
                    node.visits,
                    node.wins,
                    self.uct(child)
                );
            }
        }
    }
}

/// Search limits for one move.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchConfig {
    /// Wall-clock budget measured from the turn start
    pub time_budget: Duration,
    /// Hard cap on iterations, for runs without a meaningful clock
    pub max_iterations: usize,
    /// Fixed RNG seed; entropy-seeded when `None`
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            time_budget: Duration::from_millis(MAX_TIME_MS),
            max_iterations: MAX_ITERATIONS,
            seed: None,
        }
    }
}

impl SearchConfig {
    /// The deadline for a turn that started at `start`.
    pub fn deadline(&self, start: Instant) -> Instant {
        start + self.time_budget
    }

    /// A random source honoring `seed`.
    pub fn rng(&self) -> fastrand::Rng {
        match self.seed {
            Some(seed) => fastrand::Rng::with_seed(seed),
            None => fastrand::Rng::new(),
        }
    }
}

/// Outcome of a search.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// The most visited root action
    pub action: Action,
    /// Visits of that action, used as a confidence value
    pub visits: u32,
    /// Completed iterations
    pub iterations: usize,
    /// Playouts run
    pub playouts: usize,
    /// Nodes created, root included
    pub nodes: usize,
    /// Time spent searching
    pub elapsed: Duration,
}

/// Run MCTS iterations on `tree` until `deadline` or `max_iterations`.
///
/// The clock is only read between iterations, so the deadline can be
/// overrun by one iteration. The first iteration always runs, which
/// guarantees the root is expanded and one child has a visit.
/// Returns the number of completed iterations.
///
/// # Errors
/// [`EngineError::NoLegalActions`] if the root position is terminal, and any
/// playout error.
pub fn tree_search(
    tree: &mut Tree,
    deadline: Instant,
    max_iterations: usize,
    rng: &mut fastrand::Rng,
) -> Result<usize, EngineError> {
    if is_terminal(&tree.get(tree.root()).state) {
        return Err(EngineError::NoLegalActions);
    }

    let max_iterations = max_iterations.max(1);
    let mut actions = Vec::with_capacity(ACTION_CAPACITY);
    let mut iterations = 0;

    while iterations < max_iterations && (iterations == 0 || Instant::now() < deadline) {
        tree.iterate(rng, &mut actions)?;
        iterations += 1;
    }

    Ok(iterations)
}

/// Choose an action for `state` within `deadline` and `max_iterations`.
///
/// Builds a fresh tree, searches, and returns the most visited root child
/// together with its visit count.
pub fn search(
    state: &State,
    deadline: Instant,
    max_iterations: usize,
    rng: &mut fastrand::Rng,
) -> Result<SearchResult, EngineError> {
    let start = Instant::now();
    let mut tree = Tree::new(*state);
    let iterations = tree_search(&mut tree, deadline, max_iterations, rng)?;

    tree.dump();
    tree.dump_children();

    let best = tree.best_child().ok_or(EngineError::NoLegalActions)?;
    let node = tree.get(best);
    let action = node.action.ok_or(EngineError::NoLegalActions)?;

    Ok(SearchResult {
        action,
        visits: node.visits,
        iterations,
        playouts: tree.playouts(),
        nodes: tree.len(),
        elapsed: start.elapsed(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::legal_actions;

    fn far_deadline() -> Instant {
        Instant::now() + Duration::from_secs(3600)
    }

    #[test]
    fn test_uct_unvisited_is_infinite() {
        assert_eq!(uct_score(0, 0, 10), f64::INFINITY);
    }

    #[test]
    fn test_uct_formula() {
        let expected = 3.0 / 4.0 + UCT_C * ((16f64).ln() / 4.0).sqrt();
        assert!((uct_score(3, 4, 16) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_new_tree_has_only_root() {
        let tree = Tree::new(State::initial());
        assert_eq!(tree.len(), 1);
        assert!(tree.get(tree.root()).action.is_none());
        assert!(tree.get(tree.root()).parent.is_none());
        assert_eq!(tree.select(), tree.root());
        assert!(tree.best_child().is_none());
    }

    #[test]
    fn test_expand_creates_child_per_action() {
        let mut tree = Tree::new(State::initial());
        let mut actions = Vec::new();
        tree.expand(tree.root(), &mut actions);

        let root = tree.get(tree.root());
        let expected = legal_actions(&root.state);
        assert_eq!(root.children.len(), expected.len());
        for (&child, &action) in root.children.iter().zip(&expected) {
            let node = tree.get(child);
            let mut state = State::initial();
            state.apply(action);
            assert_eq!(node.action, Some(action));
            assert_eq!(node.parent, Some(tree.root()));
            assert_eq!(node.state, state);
        }
    }

    #[test]
    fn test_select_prefers_unvisited_then_first() {
        let mut tree = Tree::new(State::initial());
        let mut actions = Vec::new();
        tree.expand(tree.root(), &mut actions);
        let children = tree.get(tree.root()).children.clone();

        // All unvisited: first child wins the tie
        assert_eq!(tree.select(), children[0]);

        tree.get_mut(tree.root()).visits = 1;
        tree.get_mut(children[0]).visits = 1;
        tree.get_mut(children[0]).wins = 1;
        assert_eq!(tree.select(), children[1]);
    }

    #[test]
    fn test_backpropagate_signed_scores() {
        let mut tree = Tree::new(State::initial());
        let mut actions = Vec::new();
        tree.expand(tree.root(), &mut actions);
        let child = tree.get(tree.root()).children[0];

        // Child position has black to move; white moved into it.
        tree.backpropagate(child, Player::White);
        assert_eq!(tree.get(child).wins, 1);
        assert_eq!(tree.get(tree.root()).wins, -1);

        tree.backpropagate(child, Player::Black);
        assert_eq!(tree.get(child).wins, 0);
        assert_eq!(tree.get(child).visits, 2);
        assert_eq!(tree.get(tree.root()).wins, 0);
        assert_eq!(tree.get(tree.root()).visits, 2);
    }

    #[test]
    fn test_best_child_picks_most_visited() {
        let mut tree = Tree::new(State::initial());
        let mut actions = Vec::new();
        tree.expand(tree.root(), &mut actions);
        let children = tree.get(tree.root()).children.clone();

        for (&child, visits) in children.iter().zip([5, 12, 3]) {
            tree.get_mut(child).visits = visits;
        }
        assert_eq!(tree.best_child(), Some(children[1]));
    }

    #[test]
    fn test_best_child_first_max_wins_ties() {
        let mut tree = Tree::new(State::initial());
        let mut actions = Vec::new();
        tree.expand(tree.root(), &mut actions);
        let children = tree.get(tree.root()).children.clone();

        tree.get_mut(children[2]).visits = 4;
        tree.get_mut(children[5]).visits = 4;
        assert_eq!(tree.best_child(), Some(children[2]));
    }

    #[test]
    fn test_single_iteration_expands_root() {
        let mut tree = Tree::new(State::initial());
        let mut rng = fastrand::Rng::with_seed(3);
        let iterations = tree_search(&mut tree, far_deadline(), 1, &mut rng).unwrap();

        assert_eq!(iterations, 1);
        assert_eq!(tree.get(tree.root()).children.len(), 112);
        assert_eq!(tree.len(), 113);
        assert_eq!(tree.get(tree.root()).visits, 1);
        assert_eq!(tree.playouts(), 1);
    }

    #[test]
    fn test_root_visits_match_iterations() {
        let mut tree = Tree::new(State::initial());
        let mut rng = fastrand::Rng::with_seed(11);
        let iterations = tree_search(&mut tree, far_deadline(), 500, &mut rng).unwrap();

        assert_eq!(iterations, 500);
        let root = tree.get(tree.root());
        assert_eq!(root.visits, 500);
        let child_sum: u32 = root.children.iter().map(|&c| tree.get(c).visits).sum();
        assert_eq!(child_sum, 500);
    }

    #[test]
    fn test_wins_bounded_by_visits() {
        let mut tree = Tree::new(State::initial());
        let mut rng = fastrand::Rng::with_seed(5);
        tree_search(&mut tree, far_deadline(), 300, &mut rng).unwrap();

        for i in 0..tree.len() {
            let node = tree.get(NodeId(i as u32));
            assert!(node.wins.unsigned_abs() <= node.visits);
        }
    }

    #[test]
    fn test_expired_deadline_still_runs_once() {
        let mut tree = Tree::new(State::initial());
        let mut rng = fastrand::Rng::with_seed(8);
        let iterations = tree_search(&mut tree, Instant::now(), 1000, &mut rng).unwrap();
        assert_eq!(iterations, 1);
        assert!(tree.best_child().is_some());
    }

    #[test]
    fn test_search_on_terminal_state_fails() {
        let state = State::from_rows(
            &[
                "w.......", "........", "........", "........", "........", "........",
                "........", ".......b",
            ],
            Player::White,
        )
        .unwrap();
        let mut rng = fastrand::Rng::with_seed(1);
        let err = search(&state, far_deadline(), 10, &mut rng).unwrap_err();
        assert_eq!(err, EngineError::NoLegalActions);
    }

    #[test]
    fn test_search_finds_winning_capture() {
        // a8xa7 leaves black stuck. a8xb8 lets c8 recapture on b8.
        let state = State::from_rows(
            &[
                "wbb.....", "b.......", "........", "........", "........", "........",
                "........", "........",
            ],
            Player::White,
        )
        .unwrap();
        let mut rng = fastrand::Rng::with_seed(4);
        let result = search(&state, far_deadline(), 200, &mut rng).unwrap();
        assert_eq!(result.action, Action::new(0, 8));
        assert_eq!(result.iterations, 200);
        assert!(result.visits > 100);
    }

    #[test]
    fn test_search_config_seeded_rng_repeats() {
        let config = SearchConfig {
            seed: Some(17),
            ..SearchConfig::default()
        };
        assert_eq!(config.rng().u64(..), config.rng().u64(..));
        assert_eq!(config.max_iterations, MAX_ITERATIONS);
    }
}
