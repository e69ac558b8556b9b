//! # D*-Lite
//!
//! Incremental shortest paths on the 8-connected grid, searched backward
//! from the goal so the cost-to-goal values survive edge-cost changes.
//!
//! ## Node State
//!
//! Every node carries `g` (settled cost to the goal) and `rhs` (one-step
//! lookahead). A node is consistent when they agree; inconsistent nodes
//! sit in the open queue ordered by
//!
//! ```text
//! key(n) = (min(g, rhs) + h(n, start), min(g, rhs))
//! ```
//!
//! compared lexicographically with an epsilon on the first component.
//!
//! ## Search Space
//!
//! Nodes are created on first reference and only within `max_distance`
//! (Euclidean, exclusive) of the start, so every search is finite. They
//! live in an `Arena` indexed by grid position.
//!
//! ## Edge Cost
//!
//! `cost(from, to)` probes the ground under `to` and a sphere resting on
//! it. A blocked sphere makes the edge impassable; otherwise the cost is
//! the planar distance, 1 or sqrt(2).

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;

use wildgrove_core::{Arena, ArenaId, PriorityQueue};
use wildgrove_shared::Vec3;

use crate::config::SearchConfig;
use crate::error::{NavError, NavResult};
use crate::grid::GridPos;
use crate::oracle::TerrainOracle;

/// Tolerance for float equality in keys and consistency checks.
const EPSILON: f32 = 1e-4;

/// Priority of an open node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Key {
    /// `min(g, rhs) + h`.
    pub primary: f32,
    /// `min(g, rhs)`.
    pub secondary: f32,
}

impl Key {
    /// Lexicographic order; primaries within `EPSILON` count as equal.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Ordering {
        if (self.primary - other.primary).abs() > EPSILON {
            self.primary.total_cmp(&other.primary)
        } else {
            self.secondary.total_cmp(&other.secondary)
        }
    }
}

/// Search counters, accumulated over the lifetime of one instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// `compute_shortest_path` runs.
    pub searches: u32,
    /// Nodes popped from the open queue.
    pub expansions: u64,
    /// `update_obstacles` calls.
    pub repairs: u32,
}

#[derive(Clone, Debug)]
struct PathNode {
    pos: GridPos,
    g: f32,
    rhs: f32,
    /// Key the node is queued under, if it is open.
    queued: Option<Key>,
}

impl PathNode {
    const fn new(pos: GridPos) -> Self {
        Self {
            pos,
            g: f32::INFINITY,
            rhs: f32::INFINITY,
            queued: None,
        }
    }

    #[allow(clippy::float_cmp)]
    fn is_consistent(&self) -> bool {
        // Covers inf == inf, where the difference is NaN.
        self.g == self.rhs || (self.g - self.rhs).abs() <= EPSILON
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    key: Key,
    node: ArenaId,
}

impl OpenEntry {
    fn by_key(a: &Self, b: &Self) -> Ordering {
        a.key.compare(&b.key)
    }
}

type OpenQueue = PriorityQueue<OpenEntry, fn(&OpenEntry, &OpenEntry) -> Ordering>;

/// One path request: an agent and a target snapshot.
///
/// The world is not owned; every call that evaluates edge costs borrows
/// the oracle, so hosts can hand in a view of state they mutate between
/// ticks.
///
/// # Example
///
/// ```rust
/// use wildgrove_navigation::{DStarLite, GridPos, SearchConfig};
/// use wildgrove_shared::{FlatGround, Vec3};
///
/// let ground = FlatGround::default();
/// let mut search = DStarLite::new(Vec3::ZERO, Vec3::new(5.0, 0.0, 0.0), SearchConfig::default()).unwrap();
///
/// let path = search.calculate_path(&ground).unwrap();
/// assert_eq!(path.len(), 5);
/// assert_eq!(path.last(), Some(&GridPos::new(5, 0)));
/// ```
pub struct DStarLite {
    config: SearchConfig,
    nodes: Arena<PathNode>,
    index: HashMap<GridPos, ArenaId>,
    open: OpenQueue,
    start: ArenaId,
    goal: ArenaId,
    start_pos: GridPos,
    /// Last extracted path, start excluded, goal included.
    path: Option<Vec<GridPos>>,
    stats: SearchStats,
}

impl DStarLite {
    /// Sets up a search from `start` to `goal` (both rounded to cells).
    ///
    /// Only the goal is seeded into the open queue; nothing is expanded
    /// until `calculate_path`.
    ///
    /// # Errors
    ///
    /// - `NavError::InvalidConfig` if `config` does not validate
    /// - `NavError::OutOfRange` if the goal is not within `max_distance`
    ///   of the start
    pub fn new(start: Vec3, goal: Vec3, config: SearchConfig) -> NavResult<Self> {
        config.validate()?;
        let start_pos = GridPos::from_world(start);
        let goal_pos = GridPos::from_world(goal);
        if !within_radius(start_pos, goal_pos, config.max_distance) {
            return Err(NavError::OutOfRange {
                start: start_pos,
                goal: goal_pos,
                max_distance: config.max_distance,
            });
        }

        let mut nodes = Arena::with_capacity(64);
        let mut index = HashMap::with_capacity(64);
        let start_id = nodes.alloc(PathNode::new(start_pos));
        index.insert(start_pos, start_id);
        let goal_id = if goal_pos == start_pos {
            start_id
        } else {
            let id = nodes.alloc(PathNode::new(goal_pos));
            index.insert(goal_pos, id);
            id
        };

        let mut search = Self {
            config,
            nodes,
            index,
            open: PriorityQueue::new(OpenEntry::by_key as fn(&OpenEntry, &OpenEntry) -> Ordering),
            start: start_id,
            goal: goal_id,
            start_pos,
            path: None,
            stats: SearchStats::default(),
        };
        search.nodes[goal_id].rhs = search.heuristic(goal_pos);
        search.update_node(goal_id);
        Ok(search)
    }

    /// Start cell.
    #[must_use]
    pub const fn start(&self) -> GridPos {
        self.start_pos
    }

    /// Goal cell.
    #[must_use]
    pub fn goal(&self) -> GridPos {
        self.nodes[self.goal].pos
    }

    /// Search bounds.
    #[must_use]
    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Last successfully extracted path, start excluded, goal included.
    #[must_use]
    pub fn path(&self) -> Option<&[GridPos]> {
        self.path.as_deref()
    }

    /// Nodes materialized so far.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Nodes currently in the open queue.
    #[must_use]
    pub fn open_len(&self) -> usize {
        self.open.len()
    }

    /// Search counters.
    #[must_use]
    pub const fn stats(&self) -> SearchStats {
        self.stats
    }

    /// `g` of the node at `pos`, if it was ever materialized.
    #[must_use]
    pub fn g(&self, pos: GridPos) -> Option<f32> {
        self.index.get(&pos).map(|&id| self.nodes[id].g)
    }

    /// `rhs` of the node at `pos`, if it was ever materialized.
    #[must_use]
    pub fn rhs(&self, pos: GridPos) -> Option<f32> {
        self.index.get(&pos).map(|&id| self.nodes[id].rhs)
    }

    /// Returns true if `pos` can hold a node in this search.
    #[must_use]
    pub fn in_range(&self, pos: GridPos) -> bool {
        within_radius(self.start_pos, pos, self.config.max_distance)
    }

    /// Cost of stepping from `from` to the adjacent cell `to` under the
    /// current state of `oracle`.
    #[must_use]
    pub fn edge_cost<O: TerrainOracle + ?Sized>(&self, oracle: &O, from: GridPos, to: GridPos) -> f32 {
        let radius = self.config.probe_radius;
        let ground = oracle.ground_height(to.x as f32, to.z as f32, self.config.max_height);
        if oracle.is_obstructed(to.to_world(ground + radius), radius) {
            return f32::INFINITY;
        }
        from.distance(to)
    }

    /// Runs the search, then walks the cost-to-goal field from the start.
    ///
    /// The returned path excludes the start and ends at the goal.
    ///
    /// # Errors
    ///
    /// Returns `NavError::PathNotFound` when the walk reaches a cell with
    /// no unvisited neighbour at finite cost.
    pub fn calculate_path<O: TerrainOracle + ?Sized>(&mut self, oracle: &O) -> NavResult<&[GridPos]> {
        self.path = None;
        let expanded = self.compute_shortest_path(oracle);
        let path = self.extract_path(oracle)?;
        tracing::debug!(
            "Path {} -> {}: {} steps, {} expansions, {} nodes",
            self.start_pos,
            self.goal(),
            path.len(),
            expanded,
            self.nodes.len()
        );
        Ok(self.path.insert(path).as_slice())
    }

    /// Repairs the last path after the world changed.
    ///
    /// Re-evaluates every cell of the previous path except the endpoints,
    /// together with their neighbours, then searches and extracts again.
    ///
    /// # Errors
    ///
    /// Returns `NavError::PathNotFound` when no path remains.
    pub fn update_obstacles<O: TerrainOracle + ?Sized>(&mut self, oracle: &O) -> NavResult<&[GridPos]> {
        let goal_pos = self.goal();
        let interior: Vec<GridPos> = self
            .path
            .as_deref()
            .unwrap_or_default()
            .iter()
            .copied()
            .filter(|&pos| pos != self.start_pos && pos != goal_pos)
            .collect();
        self.stats.repairs += 1;
        tracing::debug!(
            "Repairing path {} -> {} around {} cells",
            self.start_pos,
            goal_pos,
            interior.len()
        );
        self.notify_changed(oracle, interior);
        self.calculate_path(oracle)
    }

    /// Marks the cost of entering each of `cells` as changed.
    ///
    /// Every cell and each of its neighbours recomputes `rhs` from its
    /// current successors and is requeued if inconsistent. Takes effect on
    /// the next `calculate_path`.
    pub fn notify_changed<O, I>(&mut self, oracle: &O, cells: I)
    where
        O: TerrainOracle + ?Sized,
        I: IntoIterator<Item = GridPos>,
    {
        let mut touched = HashSet::new();
        for cell in cells {
            let Some(id) = self.index.get(&cell).copied() else {
                continue;
            };
            if touched.insert(id) {
                self.update_map(oracle, id);
            }
            for neighbour in self.neighbours(id).into_iter().flatten() {
                if touched.insert(neighbour) {
                    self.update_map(oracle, neighbour);
                }
            }
        }
    }

    /// Processes open nodes until the start is consistent and no open key
    /// is below the start's. Returns the number of expansions.
    ///
    /// # Panics
    ///
    /// Panics if the open queue runs dry while the start is inconsistent,
    /// which would mean a node skipped its requeue.
    pub fn compute_shortest_path<O: TerrainOracle + ?Sized>(&mut self, oracle: &O) -> u64 {
        let mut expansions = 0u64;
        loop {
            let start_key = self.key(self.start);
            let start_consistent = self.nodes[self.start].is_consistent();
            let Ok(top) = self.open.peek().copied() else {
                assert!(start_consistent, "{}", NavError::EmptyOpenQueue);
                break;
            };
            if top.key.compare(&start_key) != Ordering::Less && start_consistent {
                break;
            }
            let Ok(OpenEntry { node: current, .. }) = self.open.dequeue() else {
                break;
            };
            self.nodes[current].queued = None;
            expansions += 1;

            let PathNode { pos, g, rhs, .. } = self.nodes[current];
            if g > rhs {
                // Overconsistent: settle and relax predecessors through it.
                self.nodes[current].g = rhs;
                for neighbour in self.neighbours(current).into_iter().flatten() {
                    if neighbour != self.goal {
                        let through = self.edge_cost(oracle, self.nodes[neighbour].pos, pos) + rhs;
                        let node = &mut self.nodes[neighbour];
                        node.rhs = node.rhs.min(through);
                    }
                    self.update_node(neighbour);
                }
            } else {
                // Underconsistent: unsettle and recompute everything that
                // may have depended on it.
                self.nodes[current].g = f32::INFINITY;
                for neighbour in self.neighbours(current).into_iter().flatten() {
                    self.update_map(oracle, neighbour);
                }
                self.update_map(oracle, current);
            }
        }
        self.stats.searches += 1;
        self.stats.expansions += expansions;
        expansions
    }

    /// Recomputes `rhs` from successors (goal excluded), then requeues.
    fn update_map<O: TerrainOracle + ?Sized>(&mut self, oracle: &O, id: ArenaId) {
        if id != self.goal {
            let rhs = self.lookahead(oracle, id);
            self.nodes[id].rhs = rhs;
        }
        self.update_node(id);
    }

    /// Keeps the node in the open queue exactly while it is inconsistent.
    fn update_node(&mut self, id: ArenaId) {
        let consistent = self.nodes[id].is_consistent();
        let queued = self.nodes[id].queued;
        let key = self.key(id);
        if queued == Some(key) && !consistent {
            return;
        }
        if queued.is_some() {
            self.open.remove_where(|entry| entry.node == id);
            self.nodes[id].queued = None;
        }
        if !consistent {
            self.open.enqueue(OpenEntry { key, node: id });
            self.nodes[id].queued = Some(key);
        }
    }

    /// Best cost to the goal through any successor.
    fn lookahead<O: TerrainOracle + ?Sized>(&mut self, oracle: &O, id: ArenaId) -> f32 {
        let pos = self.nodes[id].pos;
        self.neighbours(id)
            .into_iter()
            .flatten()
            .map(|n| self.edge_cost(oracle, pos, self.nodes[n].pos) + self.nodes[n].g)
            .fold(f32::INFINITY, f32::min)
    }

    fn key(&self, id: ArenaId) -> Key {
        let node = &self.nodes[id];
        let settled = node.g.min(node.rhs);
        Key {
            primary: settled + self.heuristic(node.pos),
            secondary: settled,
        }
    }

    fn heuristic(&self, pos: GridPos) -> f32 {
        self.config
            .heuristic
            .estimate(pos.x - self.start_pos.x, pos.z - self.start_pos.z)
    }

    /// Node at `pos`, created on first reference if in range.
    fn node_at(&mut self, pos: GridPos) -> Option<ArenaId> {
        if let Some(&id) = self.index.get(&pos) {
            return Some(id);
        }
        if !self.in_range(pos) {
            return None;
        }
        let id = self.nodes.alloc(PathNode::new(pos));
        self.index.insert(pos, id);
        Some(id)
    }

    fn neighbours(&mut self, id: ArenaId) -> [Option<ArenaId>; 8] {
        let pos = self.nodes[id].pos;
        let mut out = [None; 8];
        for (slot, (dx, dz)) in out.iter_mut().zip(GridPos::DIRECTIONS) {
            *slot = self.node_at(pos.offset(dx, dz));
        }
        out
    }

    /// Greedy walk from the start, always to the unvisited neighbour with
    /// the lowest `cost + g`.
    fn extract_path<O: TerrainOracle + ?Sized>(&mut self, oracle: &O) -> NavResult<Vec<GridPos>> {
        let mut path = Vec::new();
        let mut visited = HashSet::new();
        let mut current = self.start;

        while current != self.goal {
            let from = self.nodes[current].pos;
            if current != self.start {
                path.push(from);
            }
            visited.insert(from);

            let mut best: Option<(ArenaId, f32)> = None;
            for neighbour in self.neighbours(current).into_iter().flatten() {
                let to = self.nodes[neighbour].pos;
                if visited.contains(&to) {
                    continue;
                }
                let total = self.edge_cost(oracle, from, to) + self.nodes[neighbour].g;
                if total.is_finite() && best.map_or(true, |(_, lowest)| total < lowest) {
                    best = Some((neighbour, total));
                }
            }

            match best {
                Some((next, _)) => current = next,
                None => {
                    tracing::debug!("No path {} -> {}: dead end at {}", self.start_pos, self.goal(), from);
                    return Err(NavError::PathNotFound { at: from });
                }
            }
        }

        path.push(self.nodes[self.goal].pos);
        Ok(path)
    }
}

impl fmt::Debug for DStarLite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DStarLite")
            .field("start", &self.start_pos)
            .field("nodes", &self.nodes.len())
            .field("open", &self.open.len())
            .field("path_len", &self.path.as_ref().map(Vec::len))
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

fn within_radius(center: GridPos, pos: GridPos, max_distance: u32) -> bool {
    let radius = i64::from(max_distance);
    center.distance_squared(pos) < radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Heuristic;
    use crate::oracle::{BlockedCells, SplitOracle};
    use wildgrove_shared::FlatGround;

    type Walls = SplitOracle<FlatGround, BlockedCells>;

    fn walls(cells: &[(i32, i32)]) -> Walls {
        SplitOracle::new(
            FlatGround::default(),
            cells.iter().map(|&(x, z)| GridPos::new(x, z)).collect(),
        )
    }

    fn octile() -> SearchConfig {
        SearchConfig {
            heuristic: Heuristic::Octile,
            ..SearchConfig::default()
        }
    }

    fn at(x: f32, z: f32) -> Vec3 {
        Vec3::new(x, 0.0, z)
    }

    fn path_cost(search: &DStarLite, oracle: &Walls, path: &[GridPos]) -> f32 {
        let mut from = search.start();
        let mut total = 0.0;
        for &to in path {
            assert!(from.is_adjacent(to), "{from} -> {to} is not a step");
            total += search.edge_cost(oracle, from, to);
            from = to;
        }
        total
    }

    #[test]
    fn test_key_epsilon() {
        let a = Key { primary: 1.0, secondary: 2.0 };
        let b = Key { primary: 1.0 + EPSILON / 2.0, secondary: 1.0 };
        assert_eq!(a.compare(&b), Ordering::Greater);
        let c = Key { primary: 2.0, secondary: 0.0 };
        assert_eq!(a.compare(&c), Ordering::Less);
        let inf = Key { primary: f32::INFINITY, secondary: f32::INFINITY };
        assert_eq!(inf.compare(&inf), Ordering::Equal);
    }

    #[test]
    fn test_only_goal_is_seeded() {
        let search = DStarLite::new(at(0.0, 0.0), at(3.0, 4.0), octile()).unwrap();
        assert_eq!(search.open_len(), 1);
        assert_eq!(search.node_count(), 2);
        assert_eq!(search.g(GridPos::new(0, 0)), Some(f32::INFINITY));
        assert_eq!(search.rhs(GridPos::new(0, 0)), Some(f32::INFINITY));
        assert!(search.rhs(GridPos::new(3, 4)).unwrap().is_finite());
    }

    #[test]
    #[allow(clippy::float_cmp)]
    fn test_goal_rhs_carries_start_heuristic() {
        let search = DStarLite::new(at(0.0, 0.0), at(3.0, 4.0), SearchConfig::default()).unwrap();
        assert_eq!(search.rhs(GridPos::new(3, 4)), Some(7.0));
    }

    #[test]
    fn test_goal_out_of_range() {
        let config = SearchConfig {
            max_distance: 5,
            ..SearchConfig::default()
        };
        let result = DStarLite::new(at(0.0, 0.0), at(3.0, 4.0), config);
        assert!(matches!(result, Err(NavError::OutOfRange { max_distance: 5, .. })));
    }

    #[test]
    fn test_invalid_config() {
        let config = SearchConfig {
            max_height: -1.0,
            ..SearchConfig::default()
        };
        let result = DStarLite::new(at(0.0, 0.0), at(1.0, 0.0), config);
        assert!(matches!(result, Err(NavError::InvalidConfig(_))));
    }

    #[test]
    fn test_diagonal_path_on_open_ground() {
        let oracle = walls(&[]);
        let mut search = DStarLite::new(at(0.0, 0.0), at(4.0, 4.0), octile()).unwrap();
        let path = search.calculate_path(&oracle).unwrap().to_vec();
        assert_eq!(path.len(), 4);
        assert!((path_cost(&search, &oracle, &path) - 4.0 * std::f32::consts::SQRT_2).abs() < 1e-4);
    }

    #[test]
    fn test_start_equals_goal() {
        let mut search = DStarLite::new(at(2.2, 2.0), at(1.8, 2.3), octile()).unwrap();
        assert_eq!(search.calculate_path(&walls(&[])).unwrap(), &[GridPos::new(2, 2)]);
    }

    #[test]
    fn test_walls_are_avoided() {
        // Vertical wall at x = 2 from z = -3 to z = 3.
        let wall: Vec<(i32, i32)> = (-3..=3).map(|z| (2, z)).collect();
        let oracle = walls(&wall);
        let mut search = DStarLite::new(at(0.0, 0.0), at(4.0, 0.0), octile()).unwrap();
        let path = search.calculate_path(&oracle).unwrap().to_vec();
        assert!(path.iter().all(|p| !oracle.obstacles.is_blocked(*p)));
        assert_eq!(path.last(), Some(&GridPos::new(4, 0)));
    }

    #[test]
    fn test_enclosed_start_has_no_path() {
        let ring: Vec<(i32, i32)> = GridPos::new(0, 0).neighbours().map(|p| (p.x, p.z)).collect();
        let config = SearchConfig {
            max_distance: 8,
            ..octile()
        };
        let mut search = DStarLite::new(at(0.0, 0.0), at(5.0, 0.0), config).unwrap();
        assert_eq!(
            search.calculate_path(&walls(&ring)),
            Err(NavError::PathNotFound { at: GridPos::new(0, 0) })
        );
        assert!(search.path().is_none());
    }

    #[test]
    fn test_nodes_stay_inside_radius() {
        let config = SearchConfig {
            max_distance: 6,
            ..SearchConfig::default()
        };
        let ring: Vec<(i32, i32)> = GridPos::new(0, 0).neighbours().map(|p| (p.x, p.z)).collect();
        let mut search = DStarLite::new(at(0.0, 0.0), at(4.0, 0.0), config).unwrap();
        assert!(search.calculate_path(&walls(&ring)).is_err());
        assert!(search.index.keys().all(|&pos| pos.distance_squared(GridPos::new(0, 0)) < 36));
    }

    #[test]
    fn test_repair_routes_around_new_block() {
        let mut oracle = walls(&[]);
        let mut search = DStarLite::new(at(0.0, 0.0), at(6.0, 0.0), octile()).unwrap();
        let before = search.calculate_path(&oracle).unwrap().to_vec();
        assert!(before.contains(&GridPos::new(3, 0)));

        oracle.obstacles.block(GridPos::new(3, 0));
        let after = search.update_obstacles(&oracle).unwrap().to_vec();
        assert!(!after.contains(&GridPos::new(3, 0)));
        assert_eq!(after.last(), Some(&GridPos::new(6, 0)));
        assert_eq!(search.stats().repairs, 1);
        assert_eq!(search.stats().searches, 2);
    }

    #[test]
    fn test_repair_reopens_cleared_cells() {
        let mut oracle = walls(&[(3, -1), (3, 0), (3, 1)]);
        let mut search = DStarLite::new(at(0.0, 0.0), at(6.0, 0.0), octile()).unwrap();
        let first = search.calculate_path(&oracle).unwrap().to_vec();
        let detour = path_cost(&search, &oracle, &first);

        oracle.obstacles.unblock(GridPos::new(3, 0));
        search.notify_changed(&oracle, [GridPos::new(3, 0)]);
        let path = search.calculate_path(&oracle).unwrap().to_vec();
        let direct = path_cost(&search, &oracle, &path);
        assert!(direct < detour);
        assert!((direct - 6.0).abs() < 1e-4);
    }
}
