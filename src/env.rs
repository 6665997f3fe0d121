//! Step-based battle environment for learning agents.

use crate::ai::{choose_legal, ActionChooser};
use crate::battle::{Battle, BattleOptions, Outcome, Side};
use crate::dex::Dex;
use crate::error::{BattleError, Result};
use crate::events::BattleEvent;
use crate::model::{Combatant, Status};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;

pub const WIN_REWARD: f64 = 100.0;

/// What the agent sees between steps.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Observation {
    pub turn: u32,
    pub p1_hp: f64,
    pub p2_hp: f64,
    pub p1_status: Option<Status>,
    pub p2_status: Option<Status>,
    pub legal_moves: Vec<String>,
}

/// Result of a single environment step.
#[derive(Clone, Debug)]
pub struct StepResult {
    pub observation: Observation,
    /// Damage dealt minus damage taken, plus or minus [`WIN_REWARD`] at the end.
    pub reward: f64,
    pub done: bool,
    /// Event log of the resolved turn.
    pub events: Vec<BattleEvent>,
    /// Terminal outcome, once the battle is decided.
    pub outcome: Option<Outcome>,
}

/// The agent plays side 1 against `opponent` on side 2.
pub struct BattleEnv<C: ActionChooser> {
    dex: Arc<Dex>,
    p1: Combatant,
    p2: Combatant,
    options: BattleOptions,
    opponent: C,
    seeds: SmallRng,
    rng: SmallRng,
    battle: Battle,
    done: bool,
}

impl<C: ActionChooser> BattleEnv<C> {
    pub fn new(
        dex: Arc<Dex>,
        p1: Combatant,
        p2: Combatant,
        opponent: C,
        seed: u64,
        options: BattleOptions,
    ) -> Self {
        let mut seeds = SmallRng::seed_from_u64(seed);
        let battle = Battle::with_options(dex.clone(), p1.clone(), p2.clone(), seeds.gen(), options);
        let rng = SmallRng::seed_from_u64(seeds.gen());
        Self {
            dex,
            p1,
            p2,
            options,
            opponent,
            seeds,
            rng,
            battle,
            done: false,
        }
    }

    /// Starts a new episode with a fresh battle seed.
    pub fn reset(&mut self) -> Observation {
        self.battle = Battle::with_options(
            self.dex.clone(),
            self.p1.clone(),
            self.p2.clone(),
            self.seeds.gen(),
            self.options,
        );
        self.done = false;
        self.observe()
    }

    pub fn observe(&self) -> Observation {
        let p1 = self.battle.combatant(Side::P1);
        let p2 = self.battle.combatant(Side::P2);
        Observation {
            turn: self.battle.turn(),
            p1_hp: p1.hp_fraction(),
            p2_hp: p2.hp_fraction(),
            p1_status: p1.status,
            p2_status: p2.status,
            legal_moves: p1.available_moves.clone(),
        }
    }

    pub fn battle(&self) -> &Battle {
        &self.battle
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Plays one turn with `p1_move`; an unknown choice becomes a random legal move.
    pub fn step(&mut self, p1_move: &str) -> Result<StepResult> {
        if self.done || self.battle.is_over() {
            return Err(BattleError::EpisodeOver);
        }
        let me = self.battle.combatant(Side::P1).clone();
        let foe = self.battle.combatant(Side::P2).clone();
        let p1_move = if me.knows_move(p1_move) {
            p1_move.to_string()
        } else {
            let mut substitute = FixedChoice(p1_move.to_string());
            choose_legal(&mut substitute, &self.dex, &me, &foe, &mut self.rng)
        };
        let p2_move = choose_legal(&mut self.opponent, &self.dex, &foe, &me, &mut self.rng);

        let events = self.battle.execute_turn(&p1_move, &p2_move);
        let dealt = self
            .battle
            .history()
            .last()
            .map(|record| record.damage)
            .unwrap_or_default();
        let mut reward = dealt.p1 as f64 - dealt.p2 as f64;

        let outcome = self.battle.winner();
        let turn_cap = self.options.max_turns > 0 && self.battle.turn() >= self.options.max_turns;
        match &outcome {
            Some(Outcome::Winner { side: Side::P1, .. }) => reward += WIN_REWARD,
            Some(Outcome::Winner { side: Side::P2, .. }) => reward -= WIN_REWARD,
            _ => {}
        }
        self.done = outcome.is_some() || turn_cap;

        Ok(StepResult {
            observation: self.observe(),
            reward,
            done: self.done,
            events,
            outcome,
        })
    }
}

struct FixedChoice(String);

impl ActionChooser for FixedChoice {
    fn choose_move(&mut self, _: &Dex, _: &Combatant, _: &Combatant, _: &[String]) -> String {
        self.0.clone()
    }
}
