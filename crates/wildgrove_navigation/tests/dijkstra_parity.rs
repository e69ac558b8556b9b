//! Path costs against a plain Dijkstra over the same bounded grid.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use wildgrove_navigation::{BlockedCells, DStarLite, GridPos, Heuristic, NavError, SearchConfig, SplitOracle};
use wildgrove_shared::{FlatGround, Vec3};

const RADIUS: i32 = 12;

type Field = SplitOracle<FlatGround, BlockedCells>;

struct Frontier {
    cost: f32,
    cell: GridPos,
}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Frontier {}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        other.cost.total_cmp(&self.cost).then_with(|| self.cell.cmp(&other.cell))
    }
}

fn config() -> SearchConfig {
    SearchConfig {
        max_distance: RADIUS as u32,
        heuristic: Heuristic::Octile,
        ..SearchConfig::default()
    }
}

fn in_disk(cell: GridPos) -> bool {
    cell.distance_squared(GridPos::new(0, 0)) < i64::from(RADIUS * RADIUS)
}

/// Cheapest cost from the origin to `goal`, or `None` if unreachable.
fn dijkstra(field: &Field, goal: GridPos) -> Option<f32> {
    let start = GridPos::new(0, 0);
    let mut best: HashMap<GridPos, f32> = HashMap::from([(start, 0.0)]);
    let mut open = BinaryHeap::from([Frontier { cost: 0.0, cell: start }]);

    while let Some(Frontier { cost, cell }) = open.pop() {
        if cell == goal {
            return Some(cost);
        }
        if best.get(&cell).is_some_and(|&known| known < cost) {
            continue;
        }
        for next in cell.neighbours() {
            if !in_disk(next) || field.obstacles.is_blocked(next) {
                continue;
            }
            let through = cost + cell.distance(next);
            if best.get(&next).map_or(true, |&known| through < known) {
                best.insert(next, through);
                open.push(Frontier { cost: through, cell: next });
            }
        }
    }
    None
}

fn path_cost(path: &[GridPos]) -> f32 {
    let mut previous = GridPos::new(0, 0);
    let mut total = 0.0;
    for &cell in path {
        assert!(previous.is_adjacent(cell), "{previous} -> {cell} is not a single step");
        total += previous.distance(cell);
        previous = cell;
    }
    total
}

fn random_field(rng: &mut ChaCha8Rng, density: f64) -> Field {
    let mut blocked = BlockedCells::new();
    for x in -RADIUS..=RADIUS {
        for z in -RADIUS..=RADIUS {
            if (x, z) != (0, 0) && rng.gen_bool(density) {
                blocked.block(GridPos::new(x, z));
            }
        }
    }
    SplitOracle::new(FlatGround { height: 0.0 }, blocked)
}

fn random_goal(rng: &mut ChaCha8Rng, field: &Field) -> GridPos {
    loop {
        let goal = GridPos::new(rng.gen_range(-RADIUS..=RADIUS), rng.gen_range(-RADIUS..=RADIUS));
        if goal != GridPos::new(0, 0) && in_disk(goal) && !field.obstacles.is_blocked(goal) {
            return goal;
        }
    }
}

fn assert_matches_reference(field: &Field, goal: GridPos, result: Result<&[GridPos], NavError>) {
    match (dijkstra(field, goal), result) {
        (Some(expected), Ok(path)) => {
            assert_eq!(path.last(), Some(&goal));
            assert!(path.iter().all(|&cell| !field.obstacles.is_blocked(cell)));
            let cost = path_cost(path);
            assert!(
                (cost - expected).abs() < 1e-3,
                "path to {goal} costs {cost}, Dijkstra found {expected}"
            );
        }
        (None, Err(NavError::PathNotFound { .. })) => {}
        (expected, result) => panic!("goal {goal}: Dijkstra {expected:?}, D*-Lite {result:?}"),
    }
}

#[test]
fn test_fresh_search_matches_dijkstra() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED_0001);
    for _ in 0..40 {
        let field = random_field(&mut rng, 0.25);
        let goal = random_goal(&mut rng, &field);
        let goal_world = Vec3::new(goal.x as f32, 0.0, goal.z as f32);

        let mut search = DStarLite::new(Vec3::ZERO, goal_world, config()).unwrap();
        assert_matches_reference(&field, goal, search.calculate_path(&field));
    }
}

#[test]
fn test_repair_matches_fresh_dijkstra() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5EED_0002);
    for _ in 0..25 {
        let mut field = random_field(&mut rng, 0.15);
        let goal = random_goal(&mut rng, &field);
        let goal_world = Vec3::new(goal.x as f32, 0.0, goal.z as f32);

        let mut search = DStarLite::new(Vec3::ZERO, goal_world, config()).unwrap();
        let Ok(first) = search.calculate_path(&field) else {
            continue;
        };
        let mut path = first.to_vec();

        // Drop obstacles onto the current path and repair after each one.
        for _ in 0..3 {
            if path.len() < 2 {
                break;
            }
            let victim = path[rng.gen_range(0..path.len() - 1)];
            field.obstacles.block(victim);

            let repaired = search.update_obstacles(&field).map(<[GridPos]>::to_vec);
            assert_matches_reference(&field, goal, repaired.as_deref().map_err(Clone::clone));
            match repaired {
                Ok(next) => path = next,
                Err(_) => break,
            }
        }
        assert!(search.stats().repairs >= 1);
    }
}

#[test]
fn test_unreachable_goal_reports_dead_end() {
    let mut blocked = BlockedCells::new();
    for cell in GridPos::new(6, 0).neighbours() {
        blocked.block(cell);
    }
    let field = SplitOracle::new(FlatGround { height: 0.0 }, blocked);

    let mut search = DStarLite::new(Vec3::ZERO, Vec3::new(6.0, 0.0, 0.0), config()).unwrap();
    let result = search.calculate_path(&field);
    assert!(matches!(result, Err(NavError::PathNotFound { .. })));
    assert_eq!(dijkstra(&field, GridPos::new(6, 0)), None);
}
