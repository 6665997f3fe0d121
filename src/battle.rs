use crate::damage;
use crate::dex::Dex;
use crate::events::{BattleEvent, Verdict};
use crate::model::{Combatant, Status};
use crate::status::{self, chance};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    P1,
    P2,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::P1 => Side::P2,
            Side::P2 => Side::P1,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Side::P1 => "p1",
            Side::P2 => "p2",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Winner { side: Side, name: String },
    Draw,
}

impl Outcome {
    /// The winner's name, or "draw".
    pub fn label(&self) -> &str {
        match self {
            Outcome::Winner { name, .. } => name,
            Outcome::Draw => "draw",
        }
    }

    pub fn winner_side(&self) -> Option<Side> {
        match self {
            Outcome::Winner { side, .. } => Some(*side),
            Outcome::Draw => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleOptions {
    pub critical_hits: bool,
    /// Turn cap for simulated battles; single turns ignore it.
    pub max_turns: u32,
}

impl Default for BattleOptions {
    fn default() -> Self {
        BattleOptions {
            critical_hits: true,
            max_turns: 20,
        }
    }
}

/// Damage dealt by each side during one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideDamage {
    pub p1: u32,
    pub p2: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    pub turn: u32,
    pub p1_move: String,
    pub p2_move: String,
    pub events: Vec<BattleEvent>,
    pub damage: SideDamage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    pub turn: u32,
    pub p1: Combatant,
    pub p2: Combatant,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    pub damage: u32,
    pub flinched: bool,
    pub status: Option<Status>,
}

/// Shared state threaded through move execution.
pub struct MoveContext<'a, R: Rng + ?Sized> {
    pub dex: &'a Dex,
    pub options: &'a BattleOptions,
    pub rng: &'a mut R,
}

/// Which side acts first: priority, then current speed, then side 1.
pub fn determine_order(
    dex: &Dex,
    p1: &Combatant,
    p1_move: &str,
    p2: &Combatant,
    p2_move: &str,
) -> Side {
    let p1_priority = dex.moves.lookup(p1_move).priority;
    let p2_priority = dex.moves.lookup(p2_move).priority;
    if p1_priority != p2_priority {
        return if p1_priority > p2_priority { Side::P1 } else { Side::P2 };
    }
    if p2.speed > p1.speed {
        Side::P2
    } else {
        Side::P1
    }
}

/// Executes one move. Flinch only rolls when `can_flinch`.
pub fn perform_move<R: Rng + ?Sized>(
    ctx: &mut MoveContext<'_, R>,
    attacker: &mut Combatant,
    defender: &mut Combatant,
    move_name: &str,
    log: &mut Vec<BattleEvent>,
    can_flinch: bool,
) -> MoveOutcome {
    let move_def = ctx.dex.moves.lookup(move_name);
    let mut outcome = MoveOutcome::default();

    if let Some(frac) = move_def.heal_frac.filter(|f| *f > 0.0) {
        let amount = (attacker.max_hp as f64 * frac).round() as u32;
        let restored = attacker.heal(amount);
        log.push(BattleEvent::Heal {
            attacker: attacker.name.clone(),
            move_name: move_name.to_string(),
            amount: restored,
            hp: attacker.hp,
        });
        return outcome;
    }

    if move_def.accuracy < 1.0 && !chance(&mut *ctx.rng, move_def.accuracy) {
        log.push(BattleEvent::MoveMiss {
            attacker: attacker.name.clone(),
            move_name: move_name.to_string(),
        });
        return outcome;
    }

    let hit = damage::damage(
        &ctx.dex.types,
        attacker,
        defender,
        &move_def,
        ctx.options.critical_hits,
        &mut *ctx.rng,
    );
    defender.take_damage(hit.damage);
    outcome.damage = hit.damage;
    log.push(BattleEvent::Damage {
        attacker: attacker.name.clone(),
        target: defender.name.clone(),
        move_name: move_name.to_string(),
        damage: hit.damage,
        hp: defender.hp,
        effectiveness: hit.effectiveness,
        verdict: Verdict::classify(hit.effectiveness),
        critical: hit.critical,
    });

    outcome.status = status::inflict_from_move(defender, &move_def, log, &mut *ctx.rng);

    if can_flinch && !defender.is_fainted() {
        if let Some(p) = move_def.flinch_chance {
            if chance(&mut *ctx.rng, p) {
                outcome.flinched = true;
                log.push(BattleEvent::Flinch {
                    target: defender.name.clone(),
                    from: attacker.name.clone(),
                });
            }
        }
    }
    outcome
}

/// Two-combatant battle. Owns its combatants and its random source.
#[derive(Debug, Clone)]
pub struct Battle {
    dex: Arc<Dex>,
    p1: Combatant,
    p2: Combatant,
    initial: (Combatant, Combatant),
    options: BattleOptions,
    // 参考: pokemon-showdown/sim/battle.ts: Battle は共有 PRNG (Battle.prng) を用いる。
    rng: SmallRng,
    turn: u32,
    history: Vec<TurnRecord>,
}

impl Battle {
    pub fn new(dex: Arc<Dex>, p1: Combatant, p2: Combatant, seed: u64) -> Self {
        Battle::with_options(dex, p1, p2, seed, BattleOptions::default())
    }

    pub fn with_options(
        dex: Arc<Dex>,
        p1: Combatant,
        p2: Combatant,
        seed: u64,
        options: BattleOptions,
    ) -> Self {
        Battle {
            dex,
            initial: (p1.clone(), p2.clone()),
            p1,
            p2,
            options,
            rng: SmallRng::seed_from_u64(seed),
            turn: 0,
            history: Vec::new(),
        }
    }

    pub fn dex(&self) -> &Dex {
        &self.dex
    }

    pub fn options(&self) -> &BattleOptions {
        &self.options
    }

    pub fn combatant(&self, side: Side) -> &Combatant {
        match side {
            Side::P1 => &self.p1,
            Side::P2 => &self.p2,
        }
    }

    pub fn legal_moves(&self, side: Side) -> &[String] {
        &self.combatant(side).available_moves
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn history(&self) -> &[TurnRecord] {
        &self.history
    }

    /// Resolves one turn and returns its events.
    ///
    /// Must not be called after either side has fainted; callers check
    /// [`Battle::winner`] first.
    pub fn execute_turn(&mut self, p1_move: &str, p2_move: &str) -> Vec<BattleEvent> {
        self.turn += 1;
        let first_side = determine_order(&self.dex, &self.p1, p1_move, &self.p2, p2_move);
        debug!(turn = self.turn, first = %first_side, p1_move, p2_move, "resolving turn");

        let (first, second, first_move, second_move) = match first_side {
            Side::P1 => (&mut self.p1, &mut self.p2, p1_move, p2_move),
            Side::P2 => (&mut self.p2, &mut self.p1, p2_move, p1_move),
        };
        let mut ctx = MoveContext {
            dex: &self.dex,
            options: &self.options,
            rng: &mut self.rng,
        };
        let mut log = vec![BattleEvent::TurnStart {
            turn: self.turn,
            first: first.name.clone(),
            second: second.name.clone(),
        }];
        let mut dealt_first = 0;
        let mut dealt_second = 0;

        let mut flinched = false;
        if status::apply_start_of_turn(first, &mut log, &mut *ctx.rng) && !first.is_fainted() {
            let outcome = perform_move(&mut ctx, first, second, first_move, &mut log, true);
            dealt_first = outcome.damage;
            flinched = outcome.flinched;
        }

        if second.is_fainted() {
            log.push(BattleEvent::Faint {
                target: second.name.clone(),
            });
        } else {
            if flinched {
                log.push(BattleEvent::FlinchSkip {
                    target: second.name.clone(),
                });
            } else if status::apply_start_of_turn(second, &mut log, &mut *ctx.rng)
                && !second.is_fainted()
            {
                let outcome = perform_move(&mut ctx, second, first, second_move, &mut log, false);
                dealt_second = outcome.damage;
            }
            if first.is_fainted() {
                log.push(BattleEvent::Faint {
                    target: first.name.clone(),
                });
            }
            if second.is_fainted() {
                log.push(BattleEvent::Faint {
                    target: second.name.clone(),
                });
            }
        }

        let damage = match first_side {
            Side::P1 => SideDamage {
                p1: dealt_first,
                p2: dealt_second,
            },
            Side::P2 => SideDamage {
                p1: dealt_second,
                p2: dealt_first,
            },
        };
        self.history.push(TurnRecord {
            turn: self.turn,
            p1_move: p1_move.to_string(),
            p2_move: p2_move.to_string(),
            events: log.clone(),
            damage,
        });
        log
    }

    /// `Draw` when both sides are down at once.
    pub fn winner(&self) -> Option<Outcome> {
        match (self.p1.is_fainted(), self.p2.is_fainted()) {
            (true, true) => Some(Outcome::Draw),
            (false, true) => Some(Outcome::Winner {
                side: Side::P1,
                name: self.p1.name.clone(),
            }),
            (true, false) => Some(Outcome::Winner {
                side: Side::P2,
                name: self.p2.name.clone(),
            }),
            (false, false) => None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.p1.is_fainted() || self.p2.is_fainted()
    }

    /// Restores both combatants to their starting state. The random source keeps going.
    pub fn reset(&mut self) {
        self.p1 = self.initial.0.clone();
        self.p2 = self.initial.1.clone();
        self.turn = 0;
        self.history.clear();
    }

    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            turn: self.turn,
            p1: self.p1.clone(),
            p2: self.p2.clone(),
        }
    }

    /// Rolls combatant state back to `snapshot`, dropping later history.
    pub fn restore(&mut self, snapshot: BattleSnapshot) {
        self.turn = snapshot.turn;
        self.p1 = snapshot.p1;
        self.p2 = snapshot.p2;
        self.p1.clamp_hp();
        self.p2.clamp_hp();
        self.history.retain(|record| record.turn <= snapshot.turn);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CombatantInput, FlatFields};

    fn mon(name: &str, speed: u32) -> Combatant {
        CombatantInput::Flat(FlatFields {
            name: Some(name.to_string()),
            hp: Some(200.0),
            speed: Some(speed),
            available_moves: vec!["tackle".into(), "quick attack".into()],
            ..FlatFields::default()
        })
        .normalize()
        .unwrap()
    }

    #[test]
    fn order_uses_priority_then_speed_then_side_one() {
        let dex = Dex::standard();
        let slow = mon("slow", 30);
        let fast = mon("fast", 90);
        assert_eq!(determine_order(&dex, &slow, "tackle", &fast, "tackle"), Side::P2);
        assert_eq!(determine_order(&dex, &slow, "quick attack", &fast, "tackle"), Side::P1);
        let twin = mon("twin", 30);
        assert_eq!(determine_order(&dex, &twin, "tackle", &slow, "tackle"), Side::P1);
        assert_eq!(determine_order(&dex, &slow, "Quick-Attack", &fast, "quickattack"), Side::P2);
    }

    #[test]
    fn heal_is_clamped_and_skips_damage() {
        let dex = Dex::standard();
        let options = BattleOptions::default();
        let mut rng = SmallRng::seed_from_u64(4);
        let mut ctx = MoveContext {
            dex: &dex,
            options: &options,
            rng: &mut rng,
        };
        let mut a = mon("a", 50);
        let mut b = mon("b", 50);
        a.hp = 150;
        let mut log = Vec::new();
        let outcome = perform_move(&mut ctx, &mut a, &mut b, "recover", &mut log, true);
        assert_eq!(outcome, MoveOutcome::default());
        assert_eq!(a.hp, 200);
        assert_eq!(b.hp, 200);
        assert!(matches!(log[0], BattleEvent::Heal { amount: 50, hp: 200, .. }));
    }

    #[test]
    fn unknown_move_logs_zero_damage() {
        let mut battle = Battle::new(Dex::shared(), mon("a", 60), mon("b", 50), 8);
        let events = battle.execute_turn("flail wildly", "tackle");
        assert!(events.iter().any(|e| matches!(
            e,
            BattleEvent::Damage { attacker, damage: 0, .. } if attacker == "a"
        )));
        assert_eq!(battle.combatant(Side::P2).hp, 200);
    }

    #[test]
    fn reset_and_restore() {
        let mut battle = Battle::new(Dex::shared(), mon("a", 60), mon("b", 50), 8);
        let start = battle.snapshot();
        battle.execute_turn("tackle", "tackle");
        let after_one = battle.snapshot();
        battle.execute_turn("tackle", "tackle");
        assert_eq!(battle.history().len(), 2);
        battle.restore(after_one.clone());
        assert_eq!(battle.snapshot(), after_one);
        assert_eq!(battle.history().len(), 1);
        battle.reset();
        assert_eq!(battle.snapshot(), start);
        assert!(battle.history().is_empty());
    }

    #[test]
    fn restore_clamps_out_of_range_hp() {
        let mut battle = Battle::new(Dex::shared(), mon("a", 60), mon("b", 50), 2);
        let mut raw = serde_json::to_value(battle.snapshot()).unwrap();
        raw["p1"]["hp"] = serde_json::json!(battle.combatant(Side::P1).max_hp + 100);
        let snapshot: BattleSnapshot = serde_json::from_value(raw).unwrap();
        battle.restore(snapshot);
        let p1 = battle.combatant(Side::P1);
        assert_eq!(p1.hp, p1.max_hp);
        battle.execute_turn("recover", "tackle");
        let p1 = battle.combatant(Side::P1);
        assert!(p1.hp <= p1.max_hp);
    }
}
