// Decision engine
//
// `Bot` owns everything that lives for the whole session (tuning config,
// session config, the space-filling tour, the random source) plus the two
// pieces of deliberately retained state: apple age and rival profiles. Each
// call to `decide` builds a fresh `TurnContext` and runs a strict-priority
// cascade over it:
//
//   1. Emergency        own space <= 1 or a threat is adjacent
//   2. Goal pursuit     valuable apple we do not lose the race for
//   3. Hazard avoidance harmful apple nearby
//   4. Hunting          a prey target worth closing on
//   5. General scoring  pluggable ScoringPolicy over all candidates
//   6. Space filling    follow the Hamiltonian tour
//   7. Desperation      anything that does not collide immediately
//
// A tier wins only if its candidate passes the shared legality check with the
// tier's space floor. Tier 7 always answers, so `decide` never fails.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::board::CellKind;
use crate::config::{BoardConfig, Config};
use crate::context::{Candidate, TurnContext};
use crate::pathfinding::{risk_weighted_path, shortest_path, RiskField};
use crate::profile;
use crate::scoring::{policy_from_name, ScoringPolicy};
use crate::threat::{
    contest_at, evaluate_hunt, has_decisive_lead, hunting_eligible, is_lethal, predict_path,
    race_lost, AppleTracker, HeadToHead, RivalBook, RivalClass,
};
use crate::tour::HamiltonianTour;
use crate::types::{Coord, Direction, SessionConfig, TurnSnapshot};

/// Cascade tier that produced a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    Emergency,
    GoalPursuit,
    HazardAvoidance,
    Hunting,
    GeneralScoring,
    SpaceFilling,
    Desperation,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Emergency => "emergency",
            Tier::GoalPursuit => "goal_pursuit",
            Tier::HazardAvoidance => "hazard_avoidance",
            Tier::Hunting => "hunting",
            Tier::GeneralScoring => "general_scoring",
            Tier::SpaceFilling => "space_filling",
            Tier::Desperation => "desperation",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub direction: Direction,
    pub tier: Tier,
}

impl Decision {
    fn new(direction: Direction, tier: Tier) -> Self {
        Decision { direction, tier }
    }
}

/// Move decision engine for one snake over one session
pub struct Bot {
    config: Config,
    session: SessionConfig,
    apple: AppleTracker,
    rivals: RivalBook,
    tour: HamiltonianTour,
    scoring: Box<dyn ScoringPolicy>,
    rng: StdRng,
}

impl Bot {
    /// Creates a new Bot with the scoring policy and seed named in `config`
    ///
    /// # Arguments
    /// * `config` - Tuning constants, fixed for the bot's lifetime
    /// * `session` - Board dimensions and roster size from the init line
    pub fn new(config: Config, session: SessionConfig) -> Self {
        let scoring = policy_from_name(&config.engine.scoring_policy);
        let rng = match config.engine.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self::with_parts(config, session, scoring, rng)
    }

    /// Creates a Bot with an explicit scoring policy and random source
    pub fn with_parts(
        config: Config,
        session: SessionConfig,
        scoring: Box<dyn ScoringPolicy>,
        rng: StdRng,
    ) -> Self {
        let tour = HamiltonianTour::new(session.width, session.height);
        info!(
            "Engine ready: {}x{} board, {} snakes, {} scoring, tour is {}",
            session.width,
            session.height,
            session.snake_count,
            scoring.name(),
            if tour.is_cycle() { "a cycle" } else { "an open path" }
        );

        Bot {
            config,
            session,
            apple: AppleTracker::new(),
            rivals: RivalBook::new(),
            tour,
            scoring,
            rng,
        }
    }

    pub fn session(&self) -> &SessionConfig {
        &self.session
    }

    pub fn apple_age(&self) -> u32 {
        self.apple.age()
    }

    /// Wire code for a direction under the configured encoding
    pub fn encode(&self, direction: Direction) -> u8 {
        self.config.direction_encoding.encode(direction)
    }

    /// Chooses this turn's move. Always returns a direction.
    pub fn decide(&mut self, snapshot: &TurnSnapshot) -> Decision {
        profile!("decide", {
            let start = Instant::now();
            let age = self.apple.observe(snapshot.apple);
            self.rivals.observe(snapshot);

            let Bot {
                config,
                session,
                rivals,
                tour,
                scoring,
                rng,
                ..
            } = self;

            let ctx = TurnContext::new(config, session, snapshot, age);
            let decision = if ctx.me().is_none() {
                debug!("Turn {}: own snake absent, answering at random", snapshot.turn);
                Decision::new(Direction::all()[rng.random_range(0..4)], Tier::Desperation)
            } else {
                let deadline = start + Duration::from_millis(config.timing.effective_budget_ms());
                Cascade {
                    ctx: &ctx,
                    rivals,
                    tour,
                    scoring: &**scoring,
                    rng,
                    deadline,
                }
                .run()
            };

            info!(
                "Turn {}: Chose {} ({}) via {} (apple age {}, value {:?}, time: {}ms)",
                snapshot.turn,
                decision.direction.as_str(),
                config.direction_encoding.encode(decision.direction),
                decision.tier.as_str(),
                age,
                ctx.apple_value,
                start.elapsed().as_millis()
            );
            decision
        })
    }
}

/// One pass of the tiered policy over a single turn
struct Cascade<'c, 'a> {
    ctx: &'c TurnContext<'a>,
    rivals: &'c RivalBook,
    tour: &'c HamiltonianTour,
    scoring: &'c dyn ScoringPolicy,
    rng: &'c mut StdRng,
    deadline: Instant,
}

impl Cascade<'_, '_> {
    fn run(mut self) -> Decision {
        let candidates = self.ctx.candidates();
        debug!(
            "Turn {}: candidates {:?}",
            self.ctx.turn(),
            candidates
                .iter()
                .map(|c| (c.direction.as_str(), c.space))
                .collect::<Vec<_>>()
        );

        let scored_tiers: [fn(&mut Self, &[Candidate]) -> Option<Decision>; 5] = [
            Self::emergency,
            Self::goal_pursuit,
            Self::hazard_avoidance,
            Self::hunting,
            Self::general_scoring,
        ];

        for tier in scored_tiers {
            if Instant::now() >= self.deadline {
                debug!("Turn {}: budget exhausted, falling back", self.ctx.turn());
                break;
            }
            if let Some(decision) = tier(&mut self, &candidates) {
                return decision;
            }
        }

        self.space_filling(&candidates)
            .unwrap_or_else(|| self.desperation(&candidates))
    }

    fn head(&self) -> Option<Coord> {
        self.ctx.head()
    }

    fn loses_contest(&self, cell: Coord) -> bool {
        contest_at(self.ctx.snapshot, cell) == Some(HeadToHead::Lose)
    }

    fn eats_lethal(&self, candidate: &Candidate) -> bool {
        candidate.eats
            && self
                .ctx
                .apple_value
                .map_or(false, |v| is_lethal(v, &self.ctx.config.apple))
    }

    /// Tier 1. Fires when our own space is down to one cell or a Threat head
    /// is within `emergency_threat_distance`. The default of 2 counts heads two
    /// apart as adjacent, since both can step onto the cell between them next
    /// turn.
    fn emergency(&mut self, candidates: &[Candidate]) -> Option<Decision> {
        let ctx = self.ctx;
        let cfg = ctx.config;
        let head = self.head()?;

        let own_space = ctx.own_space();
        let threat_adjacent = ctx
            .nearest_threat_distance(head)
            .map_or(false, |d| d <= cfg.rivals.emergency_threat_distance);
        if own_space > 1 && !threat_adjacent {
            return None;
        }
        debug!(
            "Turn {}: emergency (space {}, threat adjacent {})",
            ctx.turn(),
            own_space,
            threat_adjacent
        );

        let radius = cfg.rivals.threat_radius;
        let score = |c: &Candidate| {
            let threat_distance = ctx.nearest_threat_distance(c.cell).unwrap_or(radius).min(radius);
            let mut s = cfg.scores.emergency_weight_space * c.space as f64
                + cfg.scores.emergency_weight_threat_distance * f64::from(threat_distance);
            if self.loses_contest(c.cell) {
                s += cfg.scores.head_to_head_loss_penalty;
            }
            s
        };

        candidates
            .iter()
            .filter(|c| ctx.passes(c, cfg.floors.emergency))
            .max_by(|a, b| score(a).total_cmp(&score(b)))
            .map(|c| Decision::new(c.direction, Tier::Emergency))
    }

    fn goal_pursuit(&mut self, candidates: &[Candidate]) -> Option<Decision> {
        let ctx = self.ctx;
        let cfg = ctx.config;
        let (apple, value) = (ctx.apple()?, ctx.apple_value?);
        if value < 1 {
            return None;
        }
        if race_lost(ctx.snapshot, apple) {
            debug!("Turn {}: apple race lost, skipping pursuit", ctx.turn());
            return None;
        }
        let head = self.head()?;
        let floor = cfg.floors.goal;
        let acceptable = |c: &Candidate| ctx.passes(c, floor) && !self.loses_contest(c.cell);

        let stronger: Vec<Coord> = ctx
            .stronger_heads()
            .into_iter()
            .filter(|h| h.manhattan(head) <= cfg.rivals.threat_radius)
            .collect();
        let max_expansions = cfg.pathfinding.max_expansions;
        let path = if stronger.is_empty() {
            shortest_path(&ctx.grid, head, apple, max_expansions)
        } else {
            let risk = RiskField::new(stronger, &cfg.pathfinding, cfg.reachability.local_space_cap);
            risk_weighted_path(&ctx.grid, head, apple, &risk, max_expansions)
        };

        // The path is a snapshot: its first step must still be a legal candidate
        if let Some(step) = path.as_ref().and_then(|p| p.get(1)) {
            if let Some(c) = candidates.iter().find(|c| c.cell == *step) {
                if acceptable(c) {
                    debug!("Turn {}: pursuing apple at {:?}", ctx.turn(), apple);
                    return Some(Decision::new(c.direction, Tier::GoalPursuit));
                }
            }
        }

        let distance = head.manhattan(apple);
        if distance > cfg.apple.close_distance {
            return None;
        }
        candidates
            .iter()
            .filter(|c| acceptable(c) && c.cell.manhattan(apple) < distance)
            .max_by_key(|c| c.space)
            .map(|c| Decision::new(c.direction, Tier::GoalPursuit))
    }

    fn hazard_avoidance(&mut self, candidates: &[Candidate]) -> Option<Decision> {
        let ctx = self.ctx;
        let cfg = ctx.config;
        let (apple, value) = (ctx.apple()?, ctx.apple_value?);
        if value >= 0 {
            return None;
        }
        let lethal = is_lethal(value, &cfg.apple);
        if !lethal && has_decisive_lead(ctx.snapshot, &cfg.apple) {
            return None;
        }
        let head = self.head()?;
        let distance = head.manhattan(apple);
        if distance > cfg.apple.hazard_radius {
            return None;
        }

        candidates
            .iter()
            .filter(|c| {
                ctx.passes(c, cfg.floors.hazard)
                    && !c.eats
                    && !self.loses_contest(c.cell)
                    && c.cell.manhattan(apple) > distance
            })
            .max_by_key(|c| (c.cell.manhattan(apple), c.space))
            .map(|c| {
                debug!("Turn {}: avoiding apple worth {}", ctx.turn(), value);
                Decision::new(c.direction, Tier::HazardAvoidance)
            })
    }

    fn hunting(&mut self, candidates: &[Candidate]) -> Option<Decision> {
        let ctx = self.ctx;
        let cfg = ctx.config;
        let me = ctx.me()?;
        let head = me.head()?;
        let cap = cfg.reachability.visit_cap;

        let prey: Vec<_> = ctx
            .classified_rivals()
            .into_iter()
            .filter(|(_, _, class)| *class == RivalClass::Prey)
            .collect();
        if prey.is_empty() {
            return None;
        }

        let mut best: Option<(f64, &Candidate, usize)> = None;
        for (index, target, _) in prey {
            let chance = self.rivals.deviation_chance(index, &cfg.rivals);
            let predicted = predict_path(&ctx.grid, target, cfg.rivals.prediction_depth, chance, &mut *self.rng);
            let Some(aim) = predicted.first().copied().or_else(|| target.head()) else {
                continue;
            };

            for c in candidates {
                if !ctx.passes(c, cfg.floors.hunting)
                    || !hunting_eligible(c.space, me.length, cap, &cfg.hunting)
                    || self.loses_contest(c.cell)
                    || (c.eats && ctx.apple_value.map_or(false, |v| v < 0))
                    || c.cell.manhattan(aim) >= head.manhattan(aim)
                {
                    continue;
                }
                let score = evaluate_hunt(&ctx.grid, me, target, &predicted, c.cell, &cfg.hunting);
                if best.map_or(true, |(s, _, _)| score > s) {
                    best = Some((score, c, index));
                }
            }
        }

        let (score, c, index) = best?;
        if score < cfg.hunting.min_score {
            return None;
        }
        debug!(
            "Turn {}: hunting snake {} (score {:.1}, peak length {})",
            ctx.turn(),
            index,
            score,
            self.rivals.get(index).map_or(0, |p| p.max_length)
        );
        Some(Decision::new(c.direction, Tier::Hunting))
    }

    fn general_scoring(&mut self, candidates: &[Candidate]) -> Option<Decision> {
        let ctx = self.ctx;
        let floor = ctx.config.floors.general;

        candidates
            .iter()
            .filter(|c| ctx.passes(c, floor))
            .map(|c| (c, self.scoring.score(ctx, c)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(c, score)| {
                debug!(
                    "Turn {}: {} scored {:.1} under {}",
                    ctx.turn(),
                    c.direction.as_str(),
                    score,
                    self.scoring.name()
                );
                Decision::new(c.direction, Tier::GeneralScoring)
            })
    }

    fn space_filling(&mut self, candidates: &[Candidate]) -> Option<Decision> {
        let ctx = self.ctx;
        let head = self.head()?;
        let legal: Vec<&Candidate> = candidates
            .iter()
            .filter(|c| ctx.passes(c, ctx.config.floors.space_filling) && !self.eats_lethal(c))
            .collect();

        if let Some(next) = self.tour.successor(head) {
            if let Some(c) = legal.iter().find(|c| c.cell == next) {
                return Some(Decision::new(c.direction, Tier::SpaceFilling));
            }
        }

        legal
            .iter()
            .min_by_key(|c| self.tour.forward_distance(head, c.cell).unwrap_or(usize::MAX))
            .map(|c| Decision::new(c.direction, Tier::SpaceFilling))
    }

    fn desperation(&mut self, candidates: &[Candidate]) -> Decision {
        let ctx = self.ctx;

        if let Some(best) = candidates.iter().map(|c| c.space).max() {
            let tied: Vec<&Candidate> = candidates.iter().filter(|c| c.space == best).collect();
            let pick = tied[self.rng.random_range(0..tied.len())];
            return Decision::new(pick.direction, Tier::Desperation);
        }

        // Boxed in: stay off the border if we can, on the board at least
        let Some(head) = self.head() else {
            return Decision::new(Direction::Up, Tier::Desperation);
        };
        let inside: Vec<Direction> = Direction::all()
            .into_iter()
            .filter(|d| ctx.grid.get(d.apply(&head)) != CellKind::Wall)
            .collect();
        let on_board: Vec<Direction> = if inside.is_empty() {
            Direction::all()
                .into_iter()
                .filter(|d| ctx.grid.in_bounds(d.apply(&head)))
                .collect()
        } else {
            inside
        };
        let direction = if on_board.is_empty() {
            ctx.me().and_then(|s| s.heading()).unwrap_or(Direction::Up)
        } else {
            on_board[self.rng.random_range(0..on_board.len())]
        };
        debug!("Turn {}: no legal move, answering {}", ctx.turn(), direction.as_str());
        Decision::new(direction, Tier::Desperation)
    }
}

/// Minimal safe answer used when the engine itself fails.
///
/// Prefers a free cell off the border ring (when the board walls it off), then
/// any free cell on the board, then any cell on the board. Bodies count as
/// occupied except for their tails.
pub fn safe_default(
    session: &SessionConfig,
    board: &BoardConfig,
    snapshot: &TurnSnapshot,
) -> Direction {
    let Some(head) = snapshot.my_snake().and_then(|s| s.head()) else {
        return Direction::Up;
    };
    let occupied = |c: Coord| {
        snapshot.snakes.iter().filter(|s| s.is_alive()).any(|s| {
            let keep = s.body.len().saturating_sub(1);
            s.body[..keep].contains(&c)
        })
    };
    let on_ring = |c: Coord| {
        board.edge_cells_are_walls
            && (c.x == 0 || c.y == 0 || c.x == session.width - 1 || c.y == session.height - 1)
    };
    let first = |ok: &dyn Fn(Coord) -> bool| {
        Direction::all()
            .into_iter()
            .find(|d| session.in_bounds(d.apply(&head)) && ok(d.apply(&head)))
    };

    first(&|c: Coord| !occupied(c) && !on_ring(c))
        .or_else(|| first(&|c: Coord| !occupied(c)))
        .or_else(|| first(&|_: Coord| true))
        .unwrap_or(Direction::Up)
}
