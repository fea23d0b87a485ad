// Board reconstruction and the per-turn occupancy grid
//
// Snakes arrive as kink chains: the head followed by every point where the
// body changes direction, ending at the tail. `reconstruct_body` walks unit
// steps between consecutive points to recover the full segment list, and
// `Grid` holds one `CellKind` per board cell for the current turn only.

use serde::Serialize;

use crate::types::{Coord, Snake};

/// Expands a kink chain into exactly `length` body cells, head first.
///
/// Steps between two kink points are horizontal first, then vertical, so a
/// malformed diagonal pair still yields a connected body. An over-long chain is
/// truncated; a short one is padded by repeating its last cell.
pub fn reconstruct_body(kinks: &[Coord], length: usize) -> Vec<Coord> {
    let mut body = Vec::with_capacity(length);
    let Some(&head) = kinks.first() else {
        return body;
    };
    if length == 0 {
        return body;
    }

    body.push(head);
    let mut cursor = head;

    'chain: for &target in &kinks[1..] {
        while cursor != target {
            if body.len() >= length {
                break 'chain;
            }
            cursor = step_toward(cursor, target);
            body.push(cursor);
        }
    }

    while body.len() < length {
        body.push(cursor);
    }
    body
}

fn step_toward(from: Coord, to: Coord) -> Coord {
    if from.x != to.x {
        Coord::new(from.x + (to.x - from.x).signum(), from.y)
    } else {
        Coord::new(from.x, from.y + (to.y - from.y).signum())
    }
}

/// Classification of a single board cell for the current turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CellKind {
    Empty,
    SelfBody,
    EnemyBody,
    Wall,
    /// Free, but a rival that beats us head-to-head can also step here
    DangerZone,
    Goal,
}

impl CellKind {
    /// Whether a head can move into this cell without colliding
    pub fn is_passable(self) -> bool {
        matches!(self, CellKind::Empty | CellKind::DangerZone | CellKind::Goal)
    }
}

/// Row-major occupancy grid. Anything outside the board reads as `Wall`.
#[derive(Debug, Clone)]
pub struct Grid {
    width: i32,
    height: i32,
    cells: Vec<CellKind>,
}

impl Grid {
    pub fn new(width: i32, height: i32) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Grid {
            width,
            height,
            cells: vec![CellKind::Empty; (width * height) as usize],
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn in_bounds(&self, c: Coord) -> bool {
        c.x >= 0 && c.x < self.width && c.y >= 0 && c.y < self.height
    }

    /// Row-major index of an in-bounds cell
    pub fn index(&self, c: Coord) -> Option<usize> {
        if self.in_bounds(c) {
            Some((c.y * self.width + c.x) as usize)
        } else {
            None
        }
    }

    pub fn get(&self, c: Coord) -> CellKind {
        self.index(c).map_or(CellKind::Wall, |i| self.cells[i])
    }

    pub fn set(&mut self, c: Coord, kind: CellKind) {
        if let Some(i) = self.index(c) {
            self.cells[i] = kind;
        }
    }

    pub fn is_passable(&self, c: Coord) -> bool {
        self.get(c).is_passable()
    }

    /// Passable orthogonal neighbours of `c`
    pub fn open_neighbors(&self, c: Coord) -> impl Iterator<Item = Coord> + '_ {
        c.neighbors().into_iter().filter(move |n| self.is_passable(*n))
    }

    /// Marks the outermost ring of cells as wall
    pub fn wall_off_edges(&mut self) {
        for x in 0..self.width {
            self.set(Coord::new(x, 0), CellKind::Wall);
            self.set(Coord::new(x, self.height - 1), CellKind::Wall);
        }
        for y in 0..self.height {
            self.set(Coord::new(0, y), CellKind::Wall);
            self.set(Coord::new(self.width - 1, y), CellKind::Wall);
        }
    }

    /// Marks a snake's body. The tail cell is left untouched when it vacates
    /// this turn.
    pub fn mark_snake(&mut self, snake: &Snake, kind: CellKind, tail_vacates: bool) {
        let keep = if tail_vacates {
            snake.body.len().saturating_sub(1)
        } else {
            snake.body.len()
        };
        for &segment in &snake.body[..keep] {
            self.set(segment, kind);
        }
    }

    /// Flags the free cells around a rival head as contested
    pub fn mark_danger_around(&mut self, head: Coord) {
        for n in head.neighbors() {
            if self.get(n) == CellKind::Empty {
                self.set(n, CellKind::DangerZone);
            }
        }
    }

    pub fn mark_goal(&mut self, apple: Coord) {
        if self.get(apple) == CellKind::Empty || self.get(apple) == CellKind::DangerZone {
            self.set(apple, CellKind::Goal);
        }
    }
}

/// Whether a snake's tail leaves its cell this turn.
///
/// A freshly grown snake (stacked tail) keeps its tail. Rivals whose head
/// touches the apple are assumed to eat it and keep their tail too; our own
/// growth depends on the move being evaluated and is handled by the caller.
pub fn tail_vacates(snake: &Snake, apple: Option<Coord>, is_me: bool) -> bool {
    if snake.body.len() < 2 || snake.has_stacked_tail() {
        return false;
    }
    if is_me {
        return true;
    }
    match (snake.head(), apple) {
        (Some(head), Some(apple)) => head.manhattan(apple) != 1,
        _ => true,
    }
}
