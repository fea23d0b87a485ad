// Game value objects shared by the protocol driver and the decision engine
//
// All of these are plain data rebuilt from the wire every turn. They derive
// Serialize/Deserialize so a turn can be written to the JSONL debug log and
// replayed later.

use serde::{Deserialize, Serialize};

/// 2D coordinate on the board. Row 0 is the top row; y grows downward.
#[derive(Deserialize, Serialize, Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
pub struct Coord {
    pub x: i32,
    pub y: i32,
}

impl Coord {
    pub fn new(x: i32, y: i32) -> Self {
        Coord { x, y }
    }

    pub fn manhattan(&self, other: Coord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// The four orthogonal neighbours, in `Direction::all()` order
    pub fn neighbors(&self) -> [Coord; 4] {
        Direction::all().map(|d| d.apply(self))
    }
}

/// The four absolute movement directions.
///
/// Wire codes: 0 = up, 1 = down, 2 = left, 3 = right. Heading-relative or
/// diagonal codes (4-6) are never produced.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Returns all possible directions
    pub fn all() -> [Direction; 4] {
        [Direction::Up, Direction::Down, Direction::Left, Direction::Right]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }

    /// Calculates the next coordinate when moving in this direction
    pub fn apply(&self, coord: &Coord) -> Coord {
        match self {
            Direction::Up => Coord { x: coord.x, y: coord.y - 1 },
            Direction::Down => Coord { x: coord.x, y: coord.y + 1 },
            Direction::Left => Coord { x: coord.x - 1, y: coord.y },
            Direction::Right => Coord { x: coord.x + 1, y: coord.y },
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Direction of a single orthogonal step from `from` to `to`, if they are adjacent
    pub fn between(from: Coord, to: Coord) -> Option<Direction> {
        match (to.x - from.x, to.y - from.y) {
            (0, -1) => Some(Direction::Up),
            (0, 1) => Some(Direction::Down),
            (-1, 0) => Some(Direction::Left),
            (1, 0) => Some(Direction::Right),
            _ => None,
        }
    }

    /// All four directions ordered to face `to` from `from`: the axis with the
    /// larger delta first, then the other axis, then the two directions moving away.
    pub fn toward(from: Coord, to: Coord) -> [Direction; 4] {
        let dx = to.x - from.x;
        let dy = to.y - from.y;
        let horizontal = if dx < 0 { Direction::Left } else { Direction::Right };
        let vertical = if dy < 0 { Direction::Up } else { Direction::Down };

        if dx.abs() >= dy.abs() {
            [horizontal, vertical, vertical.opposite(), horizontal.opposite()]
        } else {
            [vertical, horizontal, horizontal.opposite(), vertical.opposite()]
        }
    }
}

/// Session parameters fixed by the init line
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub snake_count: usize,
    pub width: i32,
    pub height: i32,
    pub mode: Option<i32>,
}

impl SessionConfig {
    pub fn in_bounds(&self, coord: Coord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }
}

/// Snake status for one turn, with its body already expanded head-first
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Snake {
    pub alive: bool,
    pub length: usize,
    pub kills: u32,
    pub body: Vec<Coord>,
}

impl Snake {
    pub fn dead() -> Self {
        Snake {
            alive: false,
            length: 0,
            kills: 0,
            body: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.alive && !self.body.is_empty()
    }

    pub fn head(&self) -> Option<Coord> {
        self.body.first().copied()
    }

    pub fn neck(&self) -> Option<Coord> {
        self.body.get(1).copied().filter(|n| Some(*n) != self.head())
    }

    pub fn tail(&self) -> Option<Coord> {
        self.body.last().copied()
    }

    /// True when the last two segments overlap, i.e. the snake has just grown
    /// and its tail will stay put next turn.
    pub fn has_stacked_tail(&self) -> bool {
        let n = self.body.len();
        n >= 2 && self.body[n - 1] == self.body[n - 2]
    }

    /// Current direction of travel, derived from neck to head
    pub fn heading(&self) -> Option<Direction> {
        Direction::between(self.neck()?, self.head()?)
    }
}

/// Everything the engine is told about a single turn
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TurnSnapshot {
    pub turn: u32,
    /// `None` when the apple line could not be parsed
    pub apple: Option<Coord>,
    /// Index of our snake in `snakes`; out of range when the index line was malformed
    pub me: usize,
    pub snakes: Vec<Snake>,
}

impl TurnSnapshot {
    pub fn my_snake(&self) -> Option<&Snake> {
        self.snakes.get(self.me).filter(|s| s.is_alive())
    }

    /// Alive snakes other than ours, with their roster index
    pub fn rivals(&self) -> impl Iterator<Item = (usize, &Snake)> {
        let me = self.me;
        self.snakes
            .iter()
            .enumerate()
            .filter(move |(i, s)| *i != me && s.is_alive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_up_decreases_y() {
        let c = Coord::new(5, 5);
        assert_eq!(Direction::Up.apply(&c), Coord::new(5, 4));
        assert_eq!(Direction::Down.apply(&c), Coord::new(5, 6));
        assert_eq!(Direction::Left.apply(&c), Coord::new(4, 5));
        assert_eq!(Direction::Right.apply(&c), Coord::new(6, 5));
    }

    #[test]
    fn test_between_rejects_non_adjacent() {
        assert_eq!(
            Direction::between(Coord::new(1, 1), Coord::new(2, 1)),
            Some(Direction::Right)
        );
        assert_eq!(Direction::between(Coord::new(1, 1), Coord::new(2, 2)), None);
        assert_eq!(Direction::between(Coord::new(1, 1), Coord::new(1, 1)), None);
    }

    #[test]
    fn test_toward_prefers_larger_axis() {
        let order = Direction::toward(Coord::new(0, 0), Coord::new(5, 2));
        assert_eq!(
            order,
            [Direction::Right, Direction::Down, Direction::Up, Direction::Left]
        );

        let order = Direction::toward(Coord::new(5, 5), Coord::new(4, 0));
        assert_eq!(order[0], Direction::Up);
        assert_eq!(order[1], Direction::Left);
        assert_eq!(order[3], Direction::Down);
    }

    #[test]
    fn test_heading_and_stacked_tail() {
        let snake = Snake {
            alive: true,
            length: 4,
            kills: 0,
            body: vec![
                Coord::new(3, 3),
                Coord::new(3, 4),
                Coord::new(3, 5),
                Coord::new(3, 5),
            ],
        };
        assert_eq!(snake.heading(), Some(Direction::Up));
        assert!(snake.has_stacked_tail());
    }
}
