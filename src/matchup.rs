use crate::ai::{choose_legal, ActionChooser, RandomChooser};
use crate::battle::{Battle, BattleOptions, BattleSnapshot, Outcome, Side, TurnRecord};
use crate::dex::Dex;
use crate::model::Combatant;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct BattleReport {
    pub turns: Vec<TurnRecord>,
    /// `None` when the turn cap was reached first.
    pub outcome: Option<Outcome>,
    pub final_state: BattleSnapshot,
}

/// Plays a battle to completion or `options.max_turns`.
pub fn simulate_battle(
    dex: Arc<Dex>,
    p1: Combatant,
    p2: Combatant,
    p1_chooser: &mut dyn ActionChooser,
    p2_chooser: &mut dyn ActionChooser,
    seed: u64,
    options: BattleOptions,
) -> BattleReport {
    let mut battle = Battle::with_options(dex.clone(), p1, p2, seed, options);
    let mut fallback_rng = SmallRng::seed_from_u64(seed.rotate_left(17));
    while battle.winner().is_none() && battle.turn() < options.max_turns {
        let me = battle.combatant(Side::P1);
        let foe = battle.combatant(Side::P2);
        let p1_move = choose_legal(p1_chooser, &dex, me, foe, &mut fallback_rng);
        let p2_move = choose_legal(p2_chooser, &dex, foe, me, &mut fallback_rng);
        battle.execute_turn(&p1_move, &p2_move);
    }
    BattleReport {
        turns: battle.history().to_vec(),
        outcome: battle.winner(),
        final_state: battle.snapshot(),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchupSummary {
    pub battles: u64,
    pub p1_wins: u64,
    pub p2_wins: u64,
    pub draws: u64,
    pub unfinished: u64,
}

impl MatchupSummary {
    /// Draws count as half a win; unfinished battles count as losses.
    pub fn win_rate(&self) -> f64 {
        if self.battles == 0 {
            return 0.0;
        }
        (self.p1_wins as f64 + 0.5 * self.draws as f64) / self.battles as f64
    }

    fn record(&mut self, outcome: Option<&Outcome>) {
        self.battles += 1;
        match outcome.map(Outcome::winner_side) {
            Some(Some(Side::P1)) => self.p1_wins += 1,
            Some(Some(Side::P2)) => self.p2_wins += 1,
            Some(None) => self.draws += 1,
            None => self.unfinished += 1,
        }
    }

    fn merge(mut self, other: MatchupSummary) -> MatchupSummary {
        self.battles += other.battles;
        self.p1_wins += other.p1_wins;
        self.p2_wins += other.p2_wins;
        self.draws += other.draws;
        self.unfinished += other.unfinished;
        self
    }
}

/// Runs `sims` random-vs-random battles in parallel. Each battle's seeds derive
/// from `seed` and its index, so results do not depend on thread scheduling.
pub fn run_matchup(
    dex: Arc<Dex>,
    p1: &Combatant,
    p2: &Combatant,
    sims: u64,
    seed: u64,
    options: BattleOptions,
) -> MatchupSummary {
    (0..sims)
        .into_par_iter()
        .map(|idx| {
            let mut rng = SmallRng::seed_from_u64(seed ^ (idx << 32) ^ idx);
            let mut p1_chooser = RandomChooser::damaging_only(rng.gen());
            let mut p2_chooser = RandomChooser::damaging_only(rng.gen());
            let report = simulate_battle(
                dex.clone(),
                p1.clone(),
                p2.clone(),
                &mut p1_chooser,
                &mut p2_chooser,
                rng.gen(),
                options,
            );
            let mut summary = MatchupSummary::default();
            summary.record(report.outcome.as_ref());
            summary
        })
        .reduce(MatchupSummary::default, MatchupSummary::merge)
}
