use crate::model::Combatant;
use crate::moves::MoveDef;
use crate::types::TypeChart;
use rand::Rng;

pub const LEVEL: f64 = 50.0;
pub const STAB: f64 = 1.5;
pub const CRIT_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_CRIT_RATE: f64 = 1.0 / 16.0;
pub const MIN_VARIANCE: f64 = 0.85;

/// The random factors of one damage calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageRoll {
    pub critical: bool,
    pub variance: f64,
}

impl DamageRoll {
    /// No crit, top of the variance range.
    pub fn max() -> Self {
        DamageRoll {
            critical: false,
            variance: 1.0,
        }
    }

    /// Draws crit first, then variance.
    pub fn sample<R: Rng + ?Sized>(move_def: &MoveDef, crits_enabled: bool, rng: &mut R) -> Self {
        let crit_rate = move_def.crit_rate.unwrap_or(DEFAULT_CRIT_RATE);
        let critical = crits_enabled && rng.gen::<f64>() < crit_rate;
        let variance = rng.gen_range(MIN_VARIANCE..=1.0);
        DamageRoll { critical, variance }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub damage: u32,
    pub effectiveness: f64,
    pub critical: bool,
}

pub fn base_damage(power: u32, attack: u32, defense: u32) -> f64 {
    let defense = defense.max(1) as f64;
    ((2.0 * LEVEL / 5.0 + 2.0) * power as f64 * attack as f64 / defense) / 50.0 + 2.0
}

pub fn is_stab(attacker: &Combatant, move_def: &MoveDef) -> bool {
    attacker.has_type(&move_def.move_type)
}

/// Deterministic core: STAB, then effectiveness, then crit, then variance.
/// Positive-power moves always deal at least 1.
pub fn damage_with_roll(
    chart: &TypeChart,
    attacker: &Combatant,
    defender: &Combatant,
    move_def: &MoveDef,
    roll: DamageRoll,
) -> Hit {
    let effectiveness = chart.effectiveness(&move_def.move_type, &defender.types);
    if move_def.power == 0 {
        return Hit {
            damage: 0,
            effectiveness,
            critical: false,
        };
    }
    let mut damage = base_damage(move_def.power, attacker.attack, defender.defense);
    if is_stab(attacker, move_def) {
        damage *= STAB;
    }
    damage *= effectiveness;
    if roll.critical {
        damage *= CRIT_MULTIPLIER;
    }
    damage *= roll.variance;
    Hit {
        damage: (damage.round() as u32).max(1),
        effectiveness,
        critical: roll.critical,
    }
}

/// Zero-power moves consume no randomness.
pub fn damage<R: Rng + ?Sized>(
    chart: &TypeChart,
    attacker: &Combatant,
    defender: &Combatant,
    move_def: &MoveDef,
    crits_enabled: bool,
    rng: &mut R,
) -> Hit {
    if move_def.power == 0 {
        return damage_with_roll(chart, attacker, defender, move_def, DamageRoll::max());
    }
    let roll = DamageRoll::sample(move_def, crits_enabled, rng);
    damage_with_roll(chart, attacker, defender, move_def, roll)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CombatantInput, FlatFields, TypeList};
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn mon(name: &str, types: &[&str], attack: u32, defense: u32) -> Combatant {
        CombatantInput::Flat(FlatFields {
            name: Some(name.to_string()),
            types: TypeList::Many(types.iter().map(|t| t.to_string()).collect()),
            hp: Some(100.0),
            attack: Some(attack),
            defense: Some(defense),
            speed: Some(80),
            ..FlatFields::default()
        })
        .normalize()
        .unwrap()
    }

    #[test]
    fn resisted_stab_move_loses_to_neutral_move() {
        let chart = TypeChart::standard();
        let a = mon("A", &["fire"], 84, 78);
        let b = mon("B", &["water"], 83, 100);
        let fire = MoveDef::new("fire", "fire", 40);
        let normal = MoveDef::new("normal", "normal", 40);
        let a_hits_b = damage_with_roll(&chart, &a, &b, &fire, DamageRoll::max());
        let b_hits_a = damage_with_roll(&chart, &b, &a, &normal, DamageRoll::max());
        assert_eq!(a_hits_b.effectiveness, 0.5);
        assert_eq!(a_hits_b.damage, 13);
        assert_eq!(b_hits_a.damage, 21);
    }

    #[test]
    fn zero_power_deals_nothing_and_draws_nothing() {
        let chart = TypeChart::standard();
        let a = mon("A", &["normal"], 200, 50);
        let b = mon("B", &["normal"], 50, 50);
        let mut rng = SmallRng::seed_from_u64(3);
        let mut untouched = SmallRng::seed_from_u64(3);
        let hit = damage(&chart, &a, &b, &MoveDef::new("growl", "normal", 0), true, &mut rng);
        assert_eq!(hit.damage, 0);
        assert_eq!(rng.gen::<u64>(), untouched.gen::<u64>());
    }

    #[test]
    fn positive_power_deals_at_least_one() {
        let chart = TypeChart::standard();
        let weak = mon("Weak", &["normal"], 1, 50);
        let ghost = mon("Ghost", &["ghost"], 50, 255);
        let hit = damage_with_roll(
            &chart,
            &weak,
            &ghost,
            &MoveDef::new("tackle", "normal", 40),
            DamageRoll {
                critical: false,
                variance: MIN_VARIANCE,
            },
        );
        assert_eq!(hit.effectiveness, 0.0);
        assert_eq!(hit.damage, 1);
    }

    #[test]
    fn critical_hits_double_before_rounding() {
        let chart = TypeChart::standard();
        let a = mon("A", &["normal"], 100, 100);
        let b = mon("B", &["normal"], 100, 100);
        let mv = MoveDef::new("strike", "normal", 50);
        let plain = damage_with_roll(&chart, &a, &b, &mv, DamageRoll::max());
        let crit = damage_with_roll(
            &chart,
            &a,
            &b,
            &mv,
            DamageRoll {
                critical: true,
                variance: 1.0,
            },
        );
        // base = 22 * 50 / 50 + 2 = 24
        assert_eq!(plain.damage, 24);
        assert_eq!(crit.damage, 48);
    }

    #[test]
    fn sampled_damage_stays_in_variance_window() {
        let chart = TypeChart::standard();
        let a = mon("A", &["normal"], 100, 100);
        let b = mon("B", &["normal"], 100, 100);
        let mv = MoveDef::new("strike", "normal", 50);
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..200 {
            let hit = damage(&chart, &a, &b, &mv, false, &mut rng);
            assert!(!hit.critical);
            assert!((20..=24).contains(&hit.damage), "got {}", hit.damage);
        }
    }
}
