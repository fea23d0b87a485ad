// Reachability estimation
//
// Both routines are bounded: `flood_fill` stops at a visit cap and
// `future_space` expands a fixed number of frontier layers, so their cost per
// call does not depend on board size.

use std::collections::VecDeque;

use crate::board::Grid;
use crate::profile;
use crate::types::Coord;

/// Counts passable cells reachable from `start` through 4-directional moves.
///
/// `start` itself is counted only when it is passable. Cells in `blocked` are
/// treated as occupied on top of what the grid says. The search stops once
/// `cap` cells are found, so a result equal to `cap` means "at least cap".
pub fn flood_fill(grid: &Grid, start: Coord, cap: usize, blocked: &[Coord]) -> usize {
    profile!("flood_fill", {
        let Some(start_idx) = grid.index(start) else {
            return 0;
        };
        if cap == 0 {
            return 0;
        }

        let is_open = |c: Coord| grid.is_passable(c) && !blocked.contains(&c);

        let mut visited = vec![false; grid.cell_count()];
        visited[start_idx] = true;
        let mut count = usize::from(is_open(start));
        if count >= cap {
            return cap;
        }

        let mut queue = VecDeque::new();
        queue.push_back(start);

        while let Some(current) = queue.pop_front() {
            for next in current.neighbors() {
                let Some(idx) = grid.index(next) else {
                    continue;
                };
                if visited[idx] || !is_open(next) {
                    continue;
                }
                visited[idx] = true;
                count += 1;
                if count >= cap {
                    return cap;
                }
                queue.push_back(next);
            }
        }

        count
    })
}

/// Discounted count of cells opened up layer by layer around `start`.
///
/// Layer `k` (cells first reached in `k` steps) contributes `discount^(k-1)`
/// per cell, for `k` in `1..=depth`. This is an explicit bounded frontier, not
/// a recursive lookahead.
pub fn future_space(
    grid: &Grid,
    start: Coord,
    depth: usize,
    discount: f64,
    blocked: &[Coord],
) -> f64 {
    let Some(start_idx) = grid.index(start) else {
        return 0.0;
    };

    let mut visited = vec![false; grid.cell_count()];
    visited[start_idx] = true;
    let mut frontier = vec![start];
    let mut weight = 1.0;
    let mut total = 0.0;

    for _ in 0..depth {
        let mut next_frontier = Vec::new();
        for cell in &frontier {
            for n in cell.neighbors() {
                let Some(idx) = grid.index(n) else {
                    continue;
                };
                if visited[idx] || !grid.is_passable(n) || blocked.contains(&n) {
                    continue;
                }
                visited[idx] = true;
                next_frontier.push(n);
            }
        }
        if next_frontier.is_empty() {
            break;
        }
        total += weight * next_frontier.len() as f64;
        weight *= discount;
        frontier = next_frontier;
    }

    total
}
