// Space-filling tour used as the last scored fallback
//
// The tour visits every cell exactly once. When at least one board side is
// even it closes into a Hamiltonian cycle; on an odd-by-odd board no cycle
// exists and the tour is a serpentine path whose last step does not wrap.

use crate::types::Coord;

#[derive(Debug, Clone)]
pub struct HamiltonianTour {
    width: i32,
    order: Vec<Coord>,
    /// Position of each cell (row-major) within `order`
    position: Vec<usize>,
    closed: bool,
}

impl HamiltonianTour {
    /// Builds the tour once per session; the board size never changes.
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);

        let (order, closed) = if width >= 2 && height >= 2 && height % 2 == 0 {
            (row_cycle(width, height, false), true)
        } else if width >= 2 && height >= 2 && width % 2 == 0 {
            (row_cycle(height, width, true), true)
        } else {
            (serpentine(width, height), false)
        };

        let mut position = vec![0; (width * height) as usize];
        for (i, cell) in order.iter().enumerate() {
            position[(cell.y * width + cell.x) as usize] = i;
        }

        HamiltonianTour {
            width,
            order,
            position,
            closed,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_cycle(&self) -> bool {
        self.closed
    }

    pub fn cells(&self) -> &[Coord] {
        &self.order
    }

    pub fn position_of(&self, c: Coord) -> Option<usize> {
        if c.x < 0 || c.y < 0 || c.x >= self.width || self.width == 0 {
            return None;
        }
        self.position.get((c.y * self.width + c.x) as usize).copied()
    }

    /// The cell after `c` on the tour
    pub fn successor(&self, c: Coord) -> Option<Coord> {
        let pos = self.position_of(c)?;
        if pos + 1 < self.order.len() {
            Some(self.order[pos + 1])
        } else if self.closed {
            self.order.first().copied()
        } else {
            None
        }
    }

    /// Steps forward along the tour from `from` to `to`
    pub fn forward_distance(&self, from: Coord, to: Coord) -> Option<usize> {
        let a = self.position_of(from)?;
        let b = self.position_of(to)?;
        let n = self.order.len();
        Some((b + n - a) % n)
    }
}

/// Cycle over a board with an even number of rows: row 0 runs right across
/// columns 1.., the remaining rows zig-zag back and forth over the same
/// columns, and column 0 is the return lane back up to the start.
fn row_cycle(cols: i32, rows: i32, transpose: bool) -> Vec<Coord> {
    let make = |col: i32, row: i32| {
        if transpose {
            Coord::new(row, col)
        } else {
            Coord::new(col, row)
        }
    };

    let mut order = Vec::with_capacity((cols * rows) as usize);
    for row in 0..rows {
        if row % 2 == 0 {
            for col in 1..cols {
                order.push(make(col, row));
            }
        } else {
            for col in (1..cols).rev() {
                order.push(make(col, row));
            }
        }
    }
    for row in (0..rows).rev() {
        order.push(make(0, row));
    }
    order
}

fn serpentine(width: i32, height: i32) -> Vec<Coord> {
    let mut order = Vec::with_capacity((width * height) as usize);
    for y in 0..height {
        if y % 2 == 0 {
            order.extend((0..width).map(|x| Coord::new(x, y)));
        } else {
            order.extend((0..width).rev().map(|x| Coord::new(x, y)));
        }
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_valid_tour(tour: &HamiltonianTour, width: i32, height: i32) {
        assert_eq!(tour.len(), (width * height) as usize);
        let unique: HashSet<_> = tour.cells().iter().collect();
        assert_eq!(unique.len(), tour.len());
        for pair in tour.cells().windows(2) {
            assert_eq!(pair[0].manhattan(pair[1]), 1);
        }
        for cell in tour.cells() {
            assert!(cell.x >= 0 && cell.x < width && cell.y >= 0 && cell.y < height);
        }
    }

    #[test]
    fn test_even_rows_form_cycle() {
        let tour = HamiltonianTour::new(5, 4);
        assert_valid_tour(&tour, 5, 4);
        assert!(tour.is_cycle());
        let first = tour.cells()[0];
        let last = tour.cells()[tour.len() - 1];
        assert_eq!(first.manhattan(last), 1);
    }

    #[test]
    fn test_even_columns_form_cycle() {
        let tour = HamiltonianTour::new(6, 5);
        assert_valid_tour(&tour, 6, 5);
        assert!(tour.is_cycle());
        let last = tour.cells()[tour.len() - 1];
        assert_eq!(tour.successor(last), Some(tour.cells()[0]));
    }

    #[test]
    fn test_odd_board_is_open_path() {
        let tour = HamiltonianTour::new(5, 5);
        assert_valid_tour(&tour, 5, 5);
        assert!(!tour.is_cycle());
        let last = tour.cells()[tour.len() - 1];
        assert_eq!(tour.successor(last), None);
    }

    #[test]
    fn test_successor_is_adjacent_everywhere_on_cycle() {
        let tour = HamiltonianTour::new(50, 50);
        for &cell in tour.cells() {
            let next = tour.successor(cell).unwrap();
            assert_eq!(cell.manhattan(next), 1);
        }
    }

    #[test]
    fn test_forward_distance_wraps() {
        let tour = HamiltonianTour::new(4, 4);
        let a = tour.cells()[14];
        let b = tour.cells()[1];
        assert_eq!(tour.forward_distance(a, b), Some(3));
        assert_eq!(tour.position_of(Coord::new(-1, 0)), None);
    }
}
