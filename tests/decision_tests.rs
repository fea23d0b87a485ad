//! End-to-end decision tests
//!
//! Drive `Bot::decide` with hand-built snapshots and check the move against
//! what any reasonable player would do: take the free apple, avoid the
//! lethal one, never contest a cell we lose, never step into a body or onto
//! the border ring.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use snake_agent::bot::{Bot, Tier};
use snake_agent::config::Config;
use snake_agent::types::{Coord, Direction, SessionConfig, Snake, TurnSnapshot};

fn seeded_config(seed: u64) -> Config {
    let mut config = Config::default_hardcoded();
    config.engine.rng_seed = Some(seed);
    // Keep the scored tiers reachable on slow CI machines
    config.timing.turn_budget_ms = 10_000;
    config
}

fn session(snake_count: usize, width: i32, height: i32) -> SessionConfig {
    SessionConfig {
        snake_count,
        width,
        height,
        mode: None,
    }
}

fn snake(length: usize, body: &[(i32, i32)]) -> Snake {
    Snake {
        alive: true,
        length,
        kills: 0,
        body: body.iter().map(|&(x, y)| Coord::new(x, y)).collect(),
    }
}

#[test]
fn test_fresh_apple_three_away_is_approached() {
    let mut bot = Bot::new(seeded_config(1), session(1, 20, 20));
    let apple = Coord::new(10, 7);
    let snapshot = TurnSnapshot {
        turn: 0,
        apple: Some(apple),
        me: 0,
        snakes: vec![snake(3, &[(10, 10), (10, 11), (10, 12)])],
    };

    let decision = bot.decide(&snapshot);
    let next = decision.direction.apply(&Coord::new(10, 10));
    assert_eq!(next.manhattan(apple), 2, "Move should cut the apple distance by one");
    assert_eq!(decision.tier, Tier::GoalPursuit);
}

#[test]
fn test_lethal_apple_straight_ahead_is_not_eaten() {
    let mut bot = Bot::new(seeded_config(2), session(1, 20, 20));
    let mut snapshot = TurnSnapshot {
        turn: 0,
        apple: Some(Coord::new(10, 9)),
        me: 0,
        snakes: vec![snake(3, &[(10, 10), (10, 11), (10, 12)])],
    };

    let mut last = None;
    for turn in 0..=95 {
        snapshot.turn = turn;
        last = Some(bot.decide(&snapshot));
    }

    assert!(bot.apple_age() >= 90, "Apple should have aged into the lethal band");
    let decision = last.unwrap();
    assert_ne!(decision.direction, Direction::Up, "Must not eat a lethal apple");
}

#[test]
fn test_equal_length_head_on_is_avoided() {
    let mut bot = Bot::new(seeded_config(3), session(2, 20, 20));
    // Heads two apart on the same column, moving toward each other
    let snapshot = TurnSnapshot {
        turn: 5,
        apple: None,
        me: 0,
        snakes: vec![
            snake(3, &[(10, 10), (10, 11), (10, 12)]),
            snake(3, &[(10, 8), (10, 7), (10, 6)]),
        ],
    };

    let decision = bot.decide(&snapshot);
    assert_ne!(
        decision.direction,
        Direction::Up,
        "A tied head-to-head is a loss and must be avoided"
    );
    assert_eq!(decision.tier, Tier::Emergency);
}

#[test]
fn test_race_lost_apple_is_not_pursued_into_rival() {
    let mut bot = Bot::new(seeded_config(4), session(2, 20, 20));
    let snapshot = TurnSnapshot {
        turn: 1,
        apple: Some(Coord::new(15, 10)),
        me: 0,
        snakes: vec![
            snake(3, &[(10, 10), (9, 10), (8, 10)]),
            snake(6, &[(15, 12), (15, 13), (15, 14), (15, 15), (15, 16), (15, 17)]),
        ],
    };

    let decision = bot.decide(&snapshot);
    assert_ne!(decision.tier, Tier::GoalPursuit, "Rival is closer, race is lost");
}

#[test]
fn test_cautious_policy_still_decides() {
    let mut config = seeded_config(5);
    config.engine.scoring_policy = "cautious".to_string();
    let mut bot = Bot::new(config, session(2, 15, 15));
    let snapshot = TurnSnapshot {
        turn: 1,
        apple: None,
        me: 1,
        snakes: vec![
            snake(4, &[(2, 2), (2, 3), (2, 4), (2, 5)]),
            snake(4, &[(7, 7), (7, 8), (7, 9), (7, 10)]),
        ],
    };

    let decision = bot.decide(&snapshot);
    assert_eq!(decision.tier, Tier::GeneralScoring);
    assert_ne!(decision.direction, Direction::Down, "Down is our own neck");
}

/// Builds a random contiguous body with a self-avoiding walk
fn random_snake(rng: &mut StdRng, occupied: &mut Vec<Coord>, width: i32, height: i32) -> Option<Snake> {
    let length = rng.random_range(2..9);
    let start = Coord::new(rng.random_range(0..width), rng.random_range(0..height));
    if occupied.contains(&start) {
        return None;
    }
    let mut body = vec![start];
    while body.len() < length {
        let tail = *body.last()?;
        let options: Vec<Coord> = tail
            .neighbors()
            .into_iter()
            .filter(|c| {
                c.x >= 0 && c.y >= 0 && c.x < width && c.y < height
                    && !occupied.contains(c)
                    && !body.contains(c)
            })
            .collect();
        if options.is_empty() {
            break;
        }
        body.push(options[rng.random_range(0..options.len())]);
    }
    occupied.extend(body.iter().copied());
    Some(Snake {
        alive: true,
        length: body.len(),
        kills: rng.random_range(0..4),
        body,
    })
}

#[test]
fn test_random_boards_never_step_into_a_body_or_border() {
    let mut rng = StdRng::seed_from_u64(2024);
    let (width, height) = (15, 15);

    for round in 0..150 {
        let mut occupied = Vec::new();
        let mut snakes = Vec::new();
        while snakes.len() < 4 {
            if let Some(s) = random_snake(&mut rng, &mut occupied, width, height) {
                snakes.push(s);
            }
        }
        let me = rng.random_range(0..snakes.len());
        let apple = Coord::new(rng.random_range(0..width), rng.random_range(0..height));
        let snapshot = TurnSnapshot {
            turn: round,
            apple: (!occupied.contains(&apple)).then_some(apple),
            me,
            snakes: snakes.clone(),
        };

        let mut bot = Bot::new(seeded_config(round as u64), session(snakes.len(), width, height));
        let decision = bot.decide(&snapshot);
        let code = bot.encode(decision.direction);
        assert!(code <= 3, "Only absolute codes may be emitted");

        let head = snakes[me].body[0];
        let neck = snakes[me].body.get(1).copied();
        let inside = |c: Coord| c.x >= 1 && c.y >= 1 && c.x < width - 1 && c.y < height - 1;
        let free = |c: Coord| inside(c) && !occupied.contains(&c);
        let any_free = Direction::all()
            .into_iter()
            .map(|d| d.apply(&head))
            .any(|c| free(c) && Some(c) != neck);
        if !any_free {
            continue;
        }

        let next = decision.direction.apply(&head);
        let is_non_tail_body = snakes
            .iter()
            .any(|s| s.body[..s.body.len() - 1].contains(&next));
        assert!(
            inside(next),
            "Round {}: move {:?} steps onto the border ring at {:?}",
            round,
            decision.direction,
            next
        );
        assert!(
            !is_non_tail_body,
            "Round {}: move {:?} runs into a body at {:?}",
            round,
            decision.direction,
            next
        );
    }
}

#[test]
fn test_fresh_apple_on_border_is_left_alone() {
    let mut bot = Bot::new(seeded_config(6), session(1, 20, 20));
    let snapshot = TurnSnapshot {
        turn: 0,
        apple: Some(Coord::new(0, 10)),
        me: 0,
        snakes: vec![snake(3, &[(1, 10), (2, 10), (3, 10)])],
    };

    let decision = bot.decide(&snapshot);
    let next = decision.direction.apply(&Coord::new(1, 10));
    assert_ne!(next, Coord::new(0, 10), "Apple on the border ring is out of reach");
    assert_ne!(decision.tier, Tier::GoalPursuit);
}
