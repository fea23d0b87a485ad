// Request-scoped state for a single decision
//
// A `TurnContext` is built fresh from each snapshot and dropped once the move
// is emitted. It owns the occupancy grid and a memo of reachable-space results,
// so no routine depends on hidden state carried between turns.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::board::{tail_vacates, CellKind, Grid};
use crate::config::Config;
use crate::space::{flood_fill, future_space};
use crate::threat::{apple_value, classify, resolve_head_to_head, HeadToHead, RivalClass};
use crate::types::{Coord, Direction, SessionConfig, Snake, TurnSnapshot};

/// A legal next cell for our head, with the space left after moving there
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub direction: Direction,
    pub cell: Coord,
    pub eats: bool,
    pub space: usize,
}

pub struct TurnContext<'a> {
    pub config: &'a Config,
    pub session: &'a SessionConfig,
    pub snapshot: &'a TurnSnapshot,
    pub grid: Grid,
    pub apple_age: u32,
    /// `None` when there is no apple this turn
    pub apple_value: Option<i32>,
    space_memo: RefCell<HashMap<(Coord, bool), usize>>,
}

impl<'a> TurnContext<'a> {
    pub fn new(
        config: &'a Config,
        session: &'a SessionConfig,
        snapshot: &'a TurnSnapshot,
        apple_age: u32,
    ) -> Self {
        let mut grid = Grid::new(session.width, session.height);
        if config.board.edge_cells_are_walls {
            grid.wall_off_edges();
        }

        for (i, snake) in snapshot.snakes.iter().enumerate() {
            if !snake.is_alive() {
                continue;
            }
            let is_me = i == snapshot.me;
            let kind = if is_me {
                CellKind::SelfBody
            } else {
                CellKind::EnemyBody
            };
            grid.mark_snake(snake, kind, tail_vacates(snake, snapshot.apple, is_me));
        }

        let apple = snapshot.apple.filter(|a| grid.in_bounds(*a));
        if let Some(apple) = apple {
            grid.mark_goal(apple);
        }

        if let Some(me) = snapshot.my_snake() {
            for (_, rival) in snapshot.rivals() {
                if resolve_head_to_head(me, rival) == HeadToHead::Lose {
                    if let Some(head) = rival.head() {
                        grid.mark_danger_around(head);
                    }
                }
            }
        }

        TurnContext {
            config,
            session,
            snapshot,
            grid,
            apple_age,
            apple_value: apple.map(|_| apple_value(apple_age, &config.apple)),
            space_memo: RefCell::new(HashMap::new()),
        }
    }

    pub fn turn(&self) -> u32 {
        self.snapshot.turn
    }

    pub fn me(&self) -> Option<&'a Snake> {
        self.snapshot.my_snake()
    }

    pub fn head(&self) -> Option<Coord> {
        self.me().and_then(|s| s.head())
    }

    /// The apple, if present and on the board
    pub fn apple(&self) -> Option<Coord> {
        self.apple_value.and(self.snapshot.apple)
    }

    /// Our tail, when it leaves its cell this turn
    fn own_vacating_tail(&self) -> Option<Coord> {
        let me = self.me()?;
        if tail_vacates(me, self.snapshot.apple, true) {
            me.tail()
        } else {
            None
        }
    }

    /// Reachable space after moving the head onto `cell`, counting `cell`.
    ///
    /// Eating keeps our tail in place, so the vacating tail is blocked again.
    pub fn space_after(&self, cell: Coord, eats: bool) -> usize {
        if let Some(&cached) = self.space_memo.borrow().get(&(cell, eats)) {
            return cached;
        }
        let blocked: Vec<Coord> = if eats {
            self.own_vacating_tail().into_iter().collect()
        } else {
            Vec::new()
        };
        let space = flood_fill(&self.grid, cell, self.config.reachability.visit_cap, &blocked);
        self.space_memo.borrow_mut().insert((cell, eats), space);
        space
    }

    /// Free space around our current head, before moving
    pub fn own_space(&self) -> usize {
        self.head().map_or(0, |head| {
            flood_fill(&self.grid, head, self.config.reachability.visit_cap, &[])
        })
    }

    pub fn projected_space(&self, cell: Coord) -> f64 {
        let cfg = &self.config.reachability;
        future_space(&self.grid, cell, cfg.future_depth, cfg.future_discount, &[])
    }

    /// Every move that does not hit a wall, a body, or reverse onto our neck
    pub fn candidates(&self) -> Vec<Candidate> {
        let Some(me) = self.me() else {
            return Vec::new();
        };
        let Some(head) = me.head() else {
            return Vec::new();
        };
        let neck = me.neck();
        let apple = self.apple();

        Direction::all()
            .into_iter()
            .filter_map(|direction| {
                let cell = direction.apply(&head);
                if !self.grid.is_passable(cell) || Some(cell) == neck {
                    return None;
                }
                let eats = Some(cell) == apple;
                Some(Candidate {
                    direction,
                    cell,
                    eats,
                    space: self.space_after(cell, eats),
                })
            })
            .collect()
    }

    /// Final legality check shared by every tier
    pub fn passes(&self, candidate: &Candidate, floor: usize) -> bool {
        self.grid.is_passable(candidate.cell) && candidate.space >= floor
    }

    /// Rivals within the threat radius, with their classification
    pub fn classified_rivals(&self) -> Vec<(usize, &'a Snake, RivalClass)> {
        let Some(me) = self.me() else {
            return Vec::new();
        };
        self.snapshot
            .rivals()
            .map(|(i, rival)| (i, rival, classify(me, rival, &self.config.rivals)))
            .collect()
    }

    /// Heads of every rival that would beat us head-to-head
    pub fn stronger_heads(&self) -> Vec<Coord> {
        let Some(me) = self.me() else {
            return Vec::new();
        };
        self.snapshot
            .rivals()
            .filter(|(_, rival)| resolve_head_to_head(me, rival) == HeadToHead::Lose)
            .filter_map(|(_, rival)| rival.head())
            .collect()
    }

    /// Distance from `cell` to the closest Threat-class rival head
    pub fn nearest_threat_distance(&self, cell: Coord) -> Option<i32> {
        self.classified_rivals()
            .into_iter()
            .filter(|(_, _, class)| *class == RivalClass::Threat)
            .filter_map(|(_, rival, _)| rival.head())
            .map(|h| h.manhattan(cell))
            .min()
    }
}
