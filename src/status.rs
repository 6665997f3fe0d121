use crate::events::BattleEvent;
use crate::model::{Combatant, Status};
use crate::moves::MoveDef;
use rand::Rng;

pub const FULL_PARALYSIS_CHANCE: f64 = 0.25;
pub const THAW_CHANCE: f64 = 0.20;
pub const MIN_SLEEP_TURNS: u32 = 1;
pub const MAX_SLEEP_TURNS: u32 = 3;

pub(crate) fn chance<R: Rng + ?Sized>(rng: &mut R, probability: f64) -> bool {
    rng.gen::<f64>() < probability
}

pub fn burn_damage(max_hp: u32) -> u32 {
    ((max_hp as f64 / 16.0).round() as u32).max(1)
}

pub fn poison_damage(max_hp: u32) -> u32 {
    (max_hp / 8).max(1)
}

/// Runs `combatant`'s status at the start of its action. Returns whether it may act.
pub fn apply_start_of_turn<R: Rng + ?Sized>(
    combatant: &mut Combatant,
    log: &mut Vec<BattleEvent>,
    rng: &mut R,
) -> bool {
    let Some(status) = combatant.status else {
        return true;
    };
    match status {
        Status::Burn | Status::Poison => {
            let tick = if status == Status::Burn {
                burn_damage(combatant.max_hp)
            } else {
                poison_damage(combatant.max_hp)
            };
            combatant.take_damage(tick);
            log.push(BattleEvent::StatusDamage {
                status,
                target: combatant.name.clone(),
                damage: tick,
                hp: combatant.hp,
            });
            !combatant.is_fainted()
        }
        Status::Sleep => {
            if combatant.status_turns == 0 {
                combatant.clear_status();
                log.push(BattleEvent::StatusCleared {
                    status,
                    target: combatant.name.clone(),
                });
                true
            } else {
                combatant.status_turns -= 1;
                log.push(BattleEvent::StatusSkip {
                    status,
                    target: combatant.name.clone(),
                    turns_left: Some(combatant.status_turns),
                });
                false
            }
        }
        Status::Paralyze => {
            if chance(rng, FULL_PARALYSIS_CHANCE) {
                log.push(BattleEvent::StatusSkip {
                    status,
                    target: combatant.name.clone(),
                    turns_left: None,
                });
                false
            } else {
                log.push(BattleEvent::StatusOvercome {
                    status,
                    target: combatant.name.clone(),
                });
                true
            }
        }
        Status::Freeze => {
            if chance(rng, THAW_CHANCE) {
                combatant.clear_status();
                log.push(BattleEvent::StatusCleared {
                    status,
                    target: combatant.name.clone(),
                });
                true
            } else {
                log.push(BattleEvent::StatusSkip {
                    status,
                    target: combatant.name.clone(),
                    turns_left: None,
                });
                false
            }
        }
    }
}

/// Type immunities, checked only when a status is inflicted.
pub fn is_immune(target: &Combatant, status: Status, source: &MoveDef) -> bool {
    match status {
        Status::Burn => target.has_type("fire"),
        Status::Freeze => target.has_type("ice"),
        Status::Poison => target.has_type("poison") || target.has_type("steel"),
        Status::Paralyze => target.has_type("electric"),
        Status::Sleep => source.powder && target.has_type("grass"),
    }
}

/// Sets `status` on `target`; sleep lasts 1 to 3 turns.
pub fn inflict<R: Rng + ?Sized>(target: &mut Combatant, status: Status, rng: &mut R) {
    let turns = if status == Status::Sleep {
        rng.gen_range(MIN_SLEEP_TURNS..=MAX_SLEEP_TURNS)
    } else {
        0
    };
    target.set_status(status, turns);
}

/// Applies the secondary status of `move_def` to a defender that has none.
/// A guaranteed status wins over probabilistic ones; at most one lands.
pub fn inflict_from_move<R: Rng + ?Sized>(
    target: &mut Combatant,
    move_def: &MoveDef,
    log: &mut Vec<BattleEvent>,
    rng: &mut R,
) -> Option<Status> {
    if target.status.is_some() || target.is_fainted() {
        return None;
    }
    if let Some(status) = move_def.set_status {
        if is_immune(target, status, move_def) {
            log.push(BattleEvent::StatusImmune {
                status,
                target: target.name.clone(),
                from: move_def.name.clone(),
            });
            return None;
        }
        inflict(target, status, rng);
        log.push(BattleEvent::StatusInflict {
            status,
            target: target.name.clone(),
            from: move_def.name.clone(),
        });
        return Some(status);
    }
    for (&status, &probability) in &move_def.status_inflict {
        if is_immune(target, status, move_def) {
            continue;
        }
        if chance(rng, probability) {
            inflict(target, status, rng);
            log.push(BattleEvent::StatusInflict {
                status,
                target: target.name.clone(),
                from: move_def.name.clone(),
            });
            return Some(status);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CombatantInput, FlatFields, TypeList};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn mon(types: &[&str], max_hp: u32) -> Combatant {
        CombatantInput::Flat(FlatFields {
            name: Some("target".into()),
            types: TypeList::Many(types.iter().map(|t| t.to_string()).collect()),
            hp: Some(max_hp as f64),
            ..FlatFields::default()
        })
        .normalize()
        .unwrap()
    }

    #[test]
    fn burn_ticks_sixteenth_rounded() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut c = mon(&["normal"], 100);
        c.set_status(Status::Burn, 0);
        let mut log = Vec::new();
        assert!(apply_start_of_turn(&mut c, &mut log, &mut rng));
        assert_eq!(c.hp, 94);
        assert!(matches!(log[0], BattleEvent::StatusDamage { damage: 6, hp: 94, .. }));
        assert_eq!(burn_damage(10), 1);
    }

    #[test]
    fn poison_ticks_eighth_floored() {
        assert_eq!(poison_damage(100), 12);
        assert_eq!(poison_damage(7), 1);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut c = mon(&["normal"], 100);
        c.set_status(Status::Poison, 0);
        c.hp = 5;
        let mut log = Vec::new();
        assert!(!apply_start_of_turn(&mut c, &mut log, &mut rng));
        assert_eq!(c.hp, 0);
    }

    #[test]
    fn sleep_counts_down_then_wakes() {
        let mut rng = SmallRng::seed_from_u64(1);
        let mut c = mon(&["normal"], 100);
        c.set_status(Status::Sleep, 2);
        let mut log = Vec::new();
        assert!(!apply_start_of_turn(&mut c, &mut log, &mut rng));
        assert!(!apply_start_of_turn(&mut c, &mut log, &mut rng));
        assert!(apply_start_of_turn(&mut c, &mut log, &mut rng));
        assert_eq!(c.status, None);
        assert_eq!(c.status_turns, 0);
        assert!(matches!(log[1], BattleEvent::StatusSkip { turns_left: Some(0), .. }));
        assert!(matches!(log[2], BattleEvent::StatusCleared { status: Status::Sleep, .. }));
    }

    #[test]
    fn paralysis_blocks_about_a_quarter() {
        let mut rng = SmallRng::seed_from_u64(99);
        let mut c = mon(&["normal"], 100);
        c.set_status(Status::Paralyze, 0);
        let mut log = Vec::new();
        let blocked = (0..1000)
            .filter(|_| !apply_start_of_turn(&mut c, &mut log, &mut rng))
            .count();
        assert!((180..=320).contains(&blocked), "blocked {blocked}");
        assert_eq!(c.status, Some(Status::Paralyze));
    }

    #[test]
    fn freeze_eventually_thaws() {
        let mut rng = SmallRng::seed_from_u64(5);
        let mut c = mon(&["water"], 100);
        c.set_status(Status::Freeze, 0);
        let mut log = Vec::new();
        let mut turns = 0;
        while !apply_start_of_turn(&mut c, &mut log, &mut rng) {
            turns += 1;
            assert!(turns < 200);
        }
        assert_eq!(c.status, None);
    }

    #[test]
    fn immunities_follow_types() {
        let powder = MoveDef {
            powder: true,
            ..MoveDef::new("sleep powder", "grass", 0)
        };
        let plain = MoveDef::new("hypnosis", "psychic", 0);
        assert!(is_immune(&mon(&["fire"], 50), Status::Burn, &plain));
        assert!(is_immune(&mon(&["ice"], 50), Status::Freeze, &plain));
        assert!(is_immune(&mon(&["steel"], 50), Status::Poison, &plain));
        assert!(is_immune(&mon(&["electric"], 50), Status::Paralyze, &plain));
        assert!(is_immune(&mon(&["grass", "poison"], 50), Status::Sleep, &powder));
        assert!(!is_immune(&mon(&["grass"], 50), Status::Sleep, &plain));
        assert!(!is_immune(&mon(&["water"], 50), Status::Burn, &plain));
    }

    #[test]
    fn guaranteed_sleep_lasts_one_to_three_turns() {
        let sleep = MoveDef {
            set_status: Some(Status::Sleep),
            ..MoveDef::new("lullaby", "normal", 0)
        };
        for seed in 0..50 {
            let mut rng = SmallRng::seed_from_u64(seed);
            let mut c = mon(&["normal"], 100);
            let mut log = Vec::new();
            assert_eq!(inflict_from_move(&mut c, &sleep, &mut log, &mut rng), Some(Status::Sleep));
            assert!((1..=3).contains(&c.status_turns));
        }
    }

    #[test]
    fn immune_target_logs_and_keeps_clean_status() {
        let wisp = MoveDef {
            set_status: Some(Status::Burn),
            ..MoveDef::new("will-o-wisp", "fire", 0)
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let mut c = mon(&["fire"], 100);
        let mut log = Vec::new();
        assert_eq!(inflict_from_move(&mut c, &wisp, &mut log, &mut rng), None);
        assert_eq!(c.status, None);
        assert!(matches!(log[0], BattleEvent::StatusImmune { .. }));
    }
}
