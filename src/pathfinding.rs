// Path search over the occupancy grid
//
// `shortest_path` is a plain breadth-first search. `risk_weighted_path` is an
// A* search whose step costs rise near stronger rivals' heads and fall in open
// areas. Both are capped by a node expansion budget and return the full cell
// sequence from start to goal inclusive.
//
// Paths are computed on a snapshot; callers must re-check that the first step
// is still a legal move before using it.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

use crate::board::Grid;
use crate::config::PathfindingConfig;
use crate::profile;
use crate::space::flood_fill;
use crate::types::{Coord, Direction};

/// Unweighted shortest path from `from` to `to`.
///
/// `from` may be an occupied cell (the head); every other cell on the path must
/// be passable.
pub fn shortest_path(grid: &Grid, from: Coord, to: Coord, max_expansions: usize) -> Option<Vec<Coord>> {
    profile!("path_search", {
        if from == to {
            return Some(vec![from]);
        }
        let start_idx = grid.index(from)?;
        grid.index(to)?;

        let mut parents: Vec<Option<Coord>> = vec![None; grid.cell_count()];
        let mut visited = vec![false; grid.cell_count()];
        visited[start_idx] = true;

        let mut queue = VecDeque::new();
        queue.push_back(from);
        let mut expansions = 0;

        while let Some(current) = queue.pop_front() {
            expansions += 1;
            if expansions > max_expansions {
                return None;
            }

            for dir in Direction::toward(current, to) {
                let next = dir.apply(&current);
                let Some(idx) = grid.index(next) else {
                    continue;
                };
                if visited[idx] || !grid.is_passable(next) {
                    continue;
                }
                visited[idx] = true;
                parents[idx] = Some(current);
                if next == to {
                    return Some(rebuild_path(grid, &parents, from, to));
                }
                queue.push_back(next);
            }
        }

        None
    })
}

fn rebuild_path(grid: &Grid, parents: &[Option<Coord>], from: Coord, to: Coord) -> Vec<Coord> {
    let mut path = vec![to];
    let mut current = to;
    while current != from {
        match grid.index(current).and_then(|i| parents[i]) {
            Some(parent) => {
                path.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

/// Step costs for the risk-weighted search
#[derive(Debug, Clone)]
pub struct RiskField {
    threat_heads: Vec<Coord>,
    base_cost: u32,
    radius: i32,
    proximity_weight: u32,
    space_discount: u32,
    local_space_cap: usize,
}

impl RiskField {
    /// `threat_heads` are the heads of rivals that would beat us head-to-head
    pub fn new(threat_heads: Vec<Coord>, cfg: &PathfindingConfig, local_space_cap: usize) -> Self {
        RiskField {
            threat_heads,
            base_cost: cfg.base_step_cost,
            radius: cfg.proximity_radius,
            proximity_weight: cfg.proximity_weight,
            space_discount: cfg.space_discount,
            local_space_cap: local_space_cap.max(1),
        }
    }

    /// Cheapest possible step, used to keep the heuristic admissible
    fn min_step_cost(&self) -> u32 {
        self.base_cost.saturating_sub(self.space_discount).max(1)
    }

    /// Cost of stepping into `cell`
    pub fn step_cost(&self, grid: &Grid, cell: Coord) -> u32 {
        let proximity: u32 = self
            .threat_heads
            .iter()
            .map(|head| {
                let d = head.manhattan(cell);
                if d <= self.radius {
                    (self.radius + 1 - d) as u32 * self.proximity_weight
                } else {
                    0
                }
            })
            .sum();

        let local = flood_fill(grid, cell, self.local_space_cap, &[]) as u32;
        let discount = self.space_discount * local / self.local_space_cap as u32;

        (self.base_cost + proximity)
            .saturating_sub(discount)
            .max(self.min_step_cost())
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Node {
    estimate: u32,
    cost: u32,
    seq: u64,
    cell: Coord,
}

// BinaryHeap is a max-heap: invert so the lowest estimate, then the lowest
// cost, then the earliest enqueued node pops first.
impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .estimate
            .cmp(&self.estimate)
            .then_with(|| other.cost.cmp(&self.cost))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A* path from `from` to `to` using `risk` for step costs and a Manhattan
/// heuristic. Neighbours are enqueued facing the target, larger axis first.
pub fn risk_weighted_path(
    grid: &Grid,
    from: Coord,
    to: Coord,
    risk: &RiskField,
    max_expansions: usize,
) -> Option<Vec<Coord>> {
    profile!("path_search", {
        if from == to {
            return Some(vec![from]);
        }
        let start_idx = grid.index(from)?;
        grid.index(to)?;

        let h_scale = risk.min_step_cost();
        let mut best_cost = vec![u32::MAX; grid.cell_count()];
        let mut parents: Vec<Option<Coord>> = vec![None; grid.cell_count()];
        let mut step_costs: Vec<Option<u32>> = vec![None; grid.cell_count()];
        best_cost[start_idx] = 0;

        let mut heap = BinaryHeap::new();
        let mut seq = 0u64;
        heap.push(Node {
            estimate: from.manhattan(to) as u32 * h_scale,
            cost: 0,
            seq,
            cell: from,
        });

        let mut expansions = 0;
        while let Some(Node { cost, cell, .. }) = heap.pop() {
            if cell == to {
                return Some(rebuild_path(grid, &parents, from, to));
            }
            let Some(cell_idx) = grid.index(cell) else {
                continue;
            };
            if cost > best_cost[cell_idx] {
                continue;
            }

            expansions += 1;
            if expansions > max_expansions {
                return None;
            }

            for dir in Direction::toward(cell, to) {
                let next = dir.apply(&cell);
                let Some(idx) = grid.index(next) else {
                    continue;
                };
                if !grid.is_passable(next) {
                    continue;
                }
                let step = *step_costs[idx].get_or_insert_with(|| risk.step_cost(grid, next));
                let next_cost = cost + step;
                if next_cost >= best_cost[idx] {
                    continue;
                }
                best_cost[idx] = next_cost;
                parents[idx] = Some(cell);
                seq += 1;
                heap.push(Node {
                    estimate: next_cost + next.manhattan(to) as u32 * h_scale,
                    cost: next_cost,
                    seq,
                    cell: next,
                });
            }
        }

        None
    })
}
