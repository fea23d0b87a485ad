// Candidate scoring for the general tier
//
// The decision cascade is fixed; only the way a candidate cell is scored in
// the general tier varies. Policies are chosen by name at construction.

use log::warn;

use crate::config::ScoresConfig;
use crate::context::{Candidate, TurnContext};
use crate::profile;
use crate::threat::{contest_at, has_decisive_lead, is_lethal, HeadToHead, RivalClass};
use crate::types::Coord;

/// Scores one candidate move. Higher is better.
pub trait ScoringPolicy: Send {
    fn name(&self) -> &'static str;
    fn score(&self, ctx: &TurnContext, candidate: &Candidate) -> f64;
}

/// Builds the policy named in the engine config, defaulting to weighted
pub fn policy_from_name(name: &str) -> Box<dyn ScoringPolicy> {
    match name {
        "weighted" => Box::new(WeightedScoring),
        "cautious" => Box::new(CautiousScoring),
        other => {
            warn!("Unknown scoring policy '{}', using weighted", other);
            Box::new(WeightedScoring)
        }
    }
}

/// Full weighted sum: space, projection, goal, rivals, walls, centrality
#[derive(Debug, Default, Clone, Copy)]
pub struct WeightedScoring;

impl ScoringPolicy for WeightedScoring {
    fn name(&self) -> &'static str {
        "weighted"
    }

    fn score(&self, ctx: &TurnContext, candidate: &Candidate) -> f64 {
        profile!("scoring", {
            let s = &ctx.config.scores;
            let cell = candidate.cell;

            space_terms(ctx, candidate, 1.0)
                + goal_term(ctx, candidate)
                + rival_terms(ctx, cell, true)
                + head_to_head_term(ctx, cell)
                + wall_penalty(cell, ctx.grid.width(), ctx.grid.height(), s)
                + center_bias(cell, ctx.grid.width(), ctx.grid.height(), s)
        })
    }
}

/// Survival first: doubles the weight of space, ignores the apple unless it is
/// harmful and never chases prey
#[derive(Debug, Default, Clone, Copy)]
pub struct CautiousScoring;

impl ScoringPolicy for CautiousScoring {
    fn name(&self) -> &'static str {
        "cautious"
    }

    fn score(&self, ctx: &TurnContext, candidate: &Candidate) -> f64 {
        profile!("scoring", {
            let s = &ctx.config.scores;
            let cell = candidate.cell;

            space_terms(ctx, candidate, 2.0)
                + goal_term(ctx, candidate).min(0.0)
                + rival_terms(ctx, cell, false)
                + head_to_head_term(ctx, cell)
                + wall_penalty(cell, ctx.grid.width(), ctx.grid.height(), s)
        })
    }
}

fn space_terms(ctx: &TurnContext, candidate: &Candidate, scale: f64) -> f64 {
    let s = &ctx.config.scores;
    scale
        * (s.weight_space * candidate.space as f64
            + s.weight_future_space * ctx.projected_space(candidate.cell))
}

/// Pull toward a valuable apple, push away from a harmful one. A harmful but
/// non-lethal apple is ignored while we hold a decisive lead.
fn goal_term(ctx: &TurnContext, candidate: &Candidate) -> f64 {
    let (Some(apple), Some(value)) = (ctx.apple(), ctx.apple_value) else {
        return 0.0;
    };
    let apple_cfg = &ctx.config.apple;
    let lethal = is_lethal(value, apple_cfg);

    if candidate.eats && lethal {
        return ctx.config.scores.lethal_apple_penalty;
    }

    let effective = if value < 0 && !lethal && has_decisive_lead(ctx.snapshot, apple_cfg) {
        0
    } else {
        value
    };
    let distance = candidate.cell.manhattan(apple) as f64;
    ctx.config.scores.weight_goal * f64::from(effective) / (1.0 + distance)
}

fn rival_terms(ctx: &TurnContext, cell: Coord, chase_prey: bool) -> f64 {
    let s = &ctx.config.scores;
    let radius = ctx.config.rivals.threat_radius;

    ctx.classified_rivals()
        .into_iter()
        .filter_map(|(_, rival, class)| Some((rival.head()?.manhattan(cell), class)))
        .map(|(distance, class)| match class {
            RivalClass::Threat => s.weight_threat_distance * f64::from(distance.min(radius)),
            RivalClass::Prey if chase_prey => s.weight_prey_closing / (1.0 + f64::from(distance)),
            _ => 0.0,
        })
        .sum()
}

fn head_to_head_term(ctx: &TurnContext, cell: Coord) -> f64 {
    match contest_at(ctx.snapshot, cell) {
        Some(HeadToHead::Win) => ctx.config.scores.head_to_head_win_bonus,
        Some(HeadToHead::Lose) => ctx.config.scores.head_to_head_loss_penalty,
        None => 0.0,
    }
}

/// Penalty for hugging the board edge: `-base / (d + 1)` within the safe
/// distance `d` of the nearest edge, plus a flat corner penalty when close to
/// two edges at once.
pub fn wall_penalty(cell: Coord, width: i32, height: i32, s: &ScoresConfig) -> f64 {
    let dx = cell.x.min(width - 1 - cell.x);
    let dy = cell.y.min(height - 1 - cell.y);
    let nearest = dx.min(dy);

    let mut penalty = 0.0;
    if nearest < s.safe_distance_from_wall {
        penalty -= s.wall_penalty_base / f64::from(nearest + 1);
    }
    if dx < s.safe_distance_from_wall && dy < s.safe_distance_from_wall {
        penalty -= s.corner_penalty;
    }
    penalty
}

/// Bonus that falls off linearly with Manhattan distance from the centre
pub fn center_bias(cell: Coord, width: i32, height: i32, s: &ScoresConfig) -> f64 {
    let center = Coord::new(width / 2, height / 2);
    let max_distance = (center.x + center.y).max(1);
    let distance = cell.manhattan(center).min(max_distance);
    s.center_bias_multiplier * (1.0 - f64::from(distance) / f64::from(max_distance))
}
