// Threat and opportunity analysis
//
// Apple valuation, rival classification, head-to-head resolution, short-range
// rival prediction and hunting evaluation. Apple age and rival profiles are
// the only state that survives from one turn to the next.

use rand::Rng;
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::board::Grid;
use crate::config::{AppleConfig, HuntingConfig, RivalsConfig};
use crate::types::{Coord, Direction, Snake, TurnSnapshot};

/// Apple value for a given age: `ceil(base_value - age / ticks_per_point)`.
///
/// With the default constants this is `ceil(5 - 0.1 * age)`. Computed in
/// integers so the ceiling is exact at every age.
pub fn apple_value(age: u32, cfg: &AppleConfig) -> i32 {
    let ticks = i64::from(cfg.ticks_per_point.max(1));
    let numerator = i64::from(cfg.base_value) * ticks - i64::from(age);
    let value = numerator.div_euclid(ticks) + i64::from(numerator.rem_euclid(ticks) != 0);
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

pub fn is_lethal(value: i32, cfg: &AppleConfig) -> bool {
    value <= cfg.lethal_value
}

/// Tracks ticks since the apple last moved or respawned
#[derive(Debug, Default, Clone)]
pub struct AppleTracker {
    last_position: Option<Coord>,
    age: u32,
}

impl AppleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records this turn's apple position and returns its age.
    /// An absent apple leaves the tracker untouched.
    pub fn observe(&mut self, apple: Option<Coord>) -> u32 {
        match apple {
            Some(pos) if self.last_position != Some(pos) => {
                self.last_position = Some(pos);
                self.age = 0;
            }
            Some(_) => self.age = self.age.saturating_add(1),
            None => {}
        }
        self.age
    }

    pub fn age(&self) -> u32 {
        self.age
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RivalClass {
    Prey,
    Threat,
    Neutral,
}

/// Classifies a rival relative to us. Rivals outside the threat radius are
/// always neutral.
pub fn classify(me: &Snake, rival: &Snake, cfg: &RivalsConfig) -> RivalClass {
    let (Some(my_head), Some(rival_head)) = (me.head(), rival.head()) else {
        return RivalClass::Neutral;
    };
    if my_head.manhattan(rival_head) > cfg.threat_radius {
        return RivalClass::Neutral;
    }
    if rival.length + cfg.prey_margin <= me.length {
        RivalClass::Prey
    } else if rival.length >= me.length {
        RivalClass::Threat
    } else {
        RivalClass::Neutral
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadToHead {
    Win,
    Lose,
}

/// Who survives if both heads land on the same cell: the longer snake, then
/// the one with more kills. A full tie counts as a loss for us.
pub fn resolve_head_to_head(me: &Snake, rival: &Snake) -> HeadToHead {
    if me.length > rival.length {
        HeadToHead::Win
    } else if me.length == rival.length && me.kills > rival.kills {
        HeadToHead::Win
    } else {
        HeadToHead::Lose
    }
}

/// Outcome of moving into `cell` against every rival that can reach it in one
/// step. `None` when no rival can contest the cell.
pub fn contest_at(snapshot: &TurnSnapshot, cell: Coord) -> Option<HeadToHead> {
    let me = snapshot.my_snake()?;
    let mut outcome = None;
    for (_, rival) in snapshot.rivals() {
        if rival.head().map_or(false, |h| h.manhattan(cell) == 1) {
            match resolve_head_to_head(me, rival) {
                HeadToHead::Lose => return Some(HeadToHead::Lose),
                HeadToHead::Win => outcome = Some(HeadToHead::Win),
            }
        }
    }
    outcome
}

/// Whether our length exceeds every rival's by at least the decisive margin
pub fn has_decisive_lead(snapshot: &TurnSnapshot, cfg: &AppleConfig) -> bool {
    let Some(me) = snapshot.my_snake() else {
        return false;
    };
    snapshot
        .rivals()
        .all(|(_, rival)| me.length >= rival.length + cfg.decisive_lead)
}

/// True when some rival reaches the apple first, or at the same time and wins
/// the resulting head-to-head.
pub fn race_lost(snapshot: &TurnSnapshot, apple: Coord) -> bool {
    let Some(me) = snapshot.my_snake() else {
        return true;
    };
    let Some(my_head) = me.head() else {
        return true;
    };
    let my_distance = my_head.manhattan(apple);

    snapshot.rivals().any(|(_, rival)| {
        let Some(head) = rival.head() else {
            return false;
        };
        let distance = head.manhattan(apple);
        distance < my_distance
            || (distance == my_distance && resolve_head_to_head(me, rival) == HeadToHead::Lose)
    })
}

/// What we remember about a rival between turns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RivalProfile {
    pub max_length: usize,
    pub kills: u32,
    pub turns_seen: u32,
}

/// Rival profiles keyed by roster index
#[derive(Debug, Default, Clone)]
pub struct RivalBook {
    profiles: HashMap<usize, RivalProfile>,
}

impl RivalBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, snapshot: &TurnSnapshot) {
        for (index, rival) in snapshot.rivals() {
            let profile = self.profiles.entry(index).or_default();
            profile.max_length = profile.max_length.max(rival.length);
            profile.kills = profile.kills.max(rival.kills);
            profile.turns_seen += 1;
        }
    }

    pub fn get(&self, index: usize) -> Option<&RivalProfile> {
        self.profiles.get(&index)
    }

    /// Chance that a rival leaves its current heading next turn. Only rivals
    /// with a recorded kill streak are expected to deviate.
    pub fn deviation_chance(&self, index: usize, cfg: &RivalsConfig) -> f64 {
        match self.get(index) {
            Some(profile) if profile.kills >= cfg.deviation_kill_threshold => {
                (f64::from(profile.kills) * cfg.deviation_chance_per_kill)
                    .min(cfg.deviation_chance_max)
                    .clamp(0.0, 1.0)
            }
            _ => 0.0,
        }
    }
}

/// Predicts a rival's next `depth` head positions.
///
/// The rival keeps its heading while that cell is free, unless a deviation is
/// drawn; otherwise it turns toward the free neighbour with the most exits.
pub fn predict_path<R: Rng + ?Sized>(
    grid: &Grid,
    rival: &Snake,
    depth: usize,
    deviation_chance: f64,
    rng: &mut R,
) -> Vec<Coord> {
    let mut path = Vec::with_capacity(depth);
    let Some(mut pos) = rival.head() else {
        return path;
    };
    let mut previous = rival.neck();
    let mut heading = rival.heading();

    for _ in 0..depth {
        let options: Vec<Coord> = pos
            .neighbors()
            .into_iter()
            .filter(|n| grid.is_passable(*n) && Some(*n) != previous && !path.contains(n))
            .collect();
        if options.is_empty() {
            break;
        }

        let straight = heading.map(|h| h.apply(&pos)).filter(|s| options.contains(s));
        let deviate = deviation_chance > 0.0 && rng.random_bool(deviation_chance.min(1.0));

        let next = match straight {
            Some(s) if !deviate || options.len() == 1 => s,
            // Most exits wins; earlier neighbour order breaks ties
            _ => options
                .iter()
                .enumerate()
                .filter(|(_, o)| Some(**o) != straight)
                .max_by_key(|(i, o)| (grid.open_neighbors(**o).count(), Reverse(*i)))
                .map_or(options[0], |(_, o)| *o),
        };

        heading = Direction::between(pos, next);
        previous = Some(pos);
        pos = next;
        path.push(next);
    }

    path
}

/// Hunting is only allowed when the move leaves room proportional to our length
pub fn hunting_eligible(space_after: usize, my_length: usize, cap: usize, cfg: &HuntingConfig) -> bool {
    space_after >= cap || space_after as f64 >= my_length as f64 * cfg.space_per_length
}

/// Scores moving to `candidate` as a step in hunting `prey`, whose predicted
/// next positions are `predicted`.
pub fn evaluate_hunt(
    grid: &Grid,
    me: &Snake,
    prey: &Snake,
    predicted: &[Coord],
    candidate: Coord,
    cfg: &HuntingConfig,
) -> f64 {
    let Some(target) = predicted.first().copied().or_else(|| prey.head()) else {
        return f64::MIN;
    };

    let size = cfg.weight_size_diff * (me.length as f64 - prey.length as f64);

    let distance = candidate.manhattan(target);
    let proximity = if cfg.min_safe_distance <= 0 || distance >= cfg.min_safe_distance {
        cfg.weight_proximity / f64::from(1 + distance - cfg.min_safe_distance.max(0))
    } else {
        cfg.weight_proximity * f64::from(distance) / f64::from(cfg.min_safe_distance)
    };

    let escapes_before: Vec<Coord> = grid.open_neighbors(target).collect();
    let escapes_after = escapes_before
        .iter()
        .filter(|e| candidate.manhattan(**e) > 1)
        .count();
    let cut = (escapes_before.len() - escapes_after) as f64;

    size + proximity + cfg.weight_escape_cut * cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::CellKind;
    use crate::config::Config;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn snake(length: usize, kills: u32, body: &[(i32, i32)]) -> Snake {
        Snake {
            alive: true,
            length,
            kills,
            body: body.iter().map(|&(x, y)| Coord::new(x, y)).collect(),
        }
    }

    #[test]
    fn test_apple_value_known_ages() {
        let cfg = Config::default_hardcoded().apple;
        assert_eq!(apple_value(0, &cfg), 5);
        assert_eq!(apple_value(40, &cfg), 1);
        assert!(apple_value(60, &cfg) <= -1);
        assert!(apple_value(90, &cfg) <= -4);
        assert!(is_lethal(apple_value(90, &cfg), &cfg));
        assert!(!is_lethal(apple_value(60, &cfg), &cfg));
    }

    #[test]
    fn test_apple_value_matches_ceiling_formula() {
        let cfg = Config::default_hardcoded().apple;
        for age in 0..200u32 {
            let expected = (5.0 - f64::from(age) / 10.0).ceil() as i32;
            assert_eq!(apple_value(age, &cfg), expected, "age {}", age);
        }
    }

    #[test]
    fn test_apple_tracker_resets_on_move() {
        let mut tracker = AppleTracker::new();
        assert_eq!(tracker.observe(Some(Coord::new(1, 1))), 0);
        assert_eq!(tracker.observe(Some(Coord::new(1, 1))), 1);
        assert_eq!(tracker.observe(None), 1);
        assert_eq!(tracker.observe(Some(Coord::new(1, 1))), 2);
        assert_eq!(tracker.observe(Some(Coord::new(4, 1))), 0);
    }

    #[test]
    fn test_head_to_head_rules() {
        let me = snake(5, 1, &[(0, 0)]);
        assert_eq!(
            resolve_head_to_head(&me, &snake(5, 2, &[(1, 1)])),
            HeadToHead::Lose
        );
        assert_eq!(
            resolve_head_to_head(&me, &snake(5, 0, &[(1, 1)])),
            HeadToHead::Win
        );
        assert_eq!(
            resolve_head_to_head(&me, &snake(5, 1, &[(1, 1)])),
            HeadToHead::Lose
        );
        assert_eq!(
            resolve_head_to_head(&snake(6, 0, &[(0, 0)]), &snake(5, 9, &[(1, 1)])),
            HeadToHead::Win
        );
        assert_eq!(
            resolve_head_to_head(&me, &snake(7, 0, &[(1, 1)])),
            HeadToHead::Lose
        );
    }

    #[test]
    fn test_classification() {
        let cfg = Config::default_hardcoded().rivals;
        let me = snake(10, 0, &[(5, 5)]);
        assert_eq!(classify(&me, &snake(6, 0, &[(7, 5)]), &cfg), RivalClass::Prey);
        assert_eq!(classify(&me, &snake(10, 0, &[(7, 5)]), &cfg), RivalClass::Threat);
        assert_eq!(classify(&me, &snake(8, 0, &[(7, 5)]), &cfg), RivalClass::Neutral);
        assert_eq!(classify(&me, &snake(30, 0, &[(40, 40)]), &cfg), RivalClass::Neutral);
    }

    #[test]
    fn test_contest_at_prefers_loss() {
        let snapshot = TurnSnapshot {
            turn: 0,
            apple: None,
            me: 0,
            snakes: vec![
                snake(5, 0, &[(5, 5), (5, 6)]),
                snake(3, 0, &[(7, 5), (8, 5)]),
                snake(6, 0, &[(6, 4), (6, 3)]),
            ],
        };
        assert_eq!(contest_at(&snapshot, Coord::new(6, 5)), Some(HeadToHead::Lose));
        assert_eq!(contest_at(&snapshot, Coord::new(7, 6)), Some(HeadToHead::Win));
        assert_eq!(contest_at(&snapshot, Coord::new(4, 5)), None);
    }

    #[test]
    fn test_race_lost_when_rival_closer() {
        let snapshot = TurnSnapshot {
            turn: 0,
            apple: Some(Coord::new(10, 10)),
            me: 0,
            snakes: vec![
                snake(5, 0, &[(0, 0), (0, 1)]),
                snake(3, 0, &[(9, 10), (8, 10)]),
            ],
        };
        assert!(race_lost(&snapshot, Coord::new(10, 10)));
        assert!(!race_lost(&snapshot, Coord::new(0, 3)));
    }

    #[test]
    fn test_rival_book_deviation() {
        let cfg = Config::default_hardcoded().rivals;
        let mut book = RivalBook::new();
        let snapshot = TurnSnapshot {
            turn: 0,
            apple: None,
            me: 0,
            snakes: vec![
                snake(5, 0, &[(0, 0)]),
                snake(4, 1, &[(5, 5)]),
                snake(4, 5, &[(9, 9)]),
            ],
        };
        book.observe(&snapshot);
        book.observe(&snapshot);
        assert_eq!(book.get(2).map(|p| p.turns_seen), Some(2));
        assert_eq!(book.get(1).map(|p| p.max_length), Some(4));
        assert_eq!(book.deviation_chance(1, &cfg), 0.0);
        assert!((book.deviation_chance(2, &cfg) - 0.25).abs() < 1e-9);
        assert!(book.get(0).is_none());
    }

    #[test]
    fn test_predict_path_keeps_heading() {
        let grid = Grid::new(20, 20);
        let rival = snake(3, 0, &[(5, 5), (4, 5), (3, 5)]);
        let mut rng = StdRng::seed_from_u64(1);
        let path = predict_path(&grid, &rival, 3, 0.0, &mut rng);
        assert_eq!(path, vec![Coord::new(6, 5), Coord::new(7, 5), Coord::new(8, 5)]);
    }

    #[test]
    fn test_predict_path_turns_at_obstacle() {
        let mut grid = Grid::new(10, 10);
        grid.set(Coord::new(6, 5), CellKind::Wall);
        let rival = snake(3, 0, &[(5, 5), (4, 5), (3, 5)]);
        let mut rng = StdRng::seed_from_u64(1);
        let path = predict_path(&grid, &rival, 1, 0.0, &mut rng);
        assert_eq!(path.len(), 1);
        assert_ne!(path[0], Coord::new(6, 5));
        assert_eq!(path[0].manhattan(Coord::new(5, 5)), 1);
    }

    #[test]
    fn test_hunting_eligibility() {
        let cfg = Config::default_hardcoded().hunting;
        assert!(hunting_eligible(50, 80, 50, &cfg));
        assert!(hunting_eligible(12, 10, 50, &cfg));
        assert!(!hunting_eligible(8, 10, 50, &cfg));
    }

    #[test]
    fn test_hunt_rewards_cutting_escapes() {
        let cfg = Config::default_hardcoded().hunting;
        let grid = Grid::new(20, 20);
        let me = snake(10, 0, &[(5, 8)]);
        let prey = snake(4, 0, &[(5, 5)]);
        let predicted = [Coord::new(5, 5)];
        let near = evaluate_hunt(&grid, &me, &prey, &predicted, Coord::new(5, 7), &cfg);
        let far = evaluate_hunt(&grid, &me, &prey, &predicted, Coord::new(5, 9), &cfg);
        assert!(near > far);
    }
}
