use crate::damage::STAB;
use crate::dex::Dex;
use crate::model::{Combatant, DEFAULT_MOVE};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::warn;

/// Picks one move name from `legal` for `me`.
pub trait ActionChooser {
    fn choose_move(
        &mut self,
        dex: &Dex,
        me: &Combatant,
        opponent: &Combatant,
        legal: &[String],
    ) -> String;
}

/// Legal moves with power and a non-zero multiplier against `defender`, or every
/// legal move when none qualify.
pub fn damaging_moves(dex: &Dex, attacker: &Combatant, defender: &Combatant) -> Vec<String> {
    let damaging: Vec<String> = attacker
        .available_moves
        .iter()
        .filter(|name| {
            let def = dex.moves.lookup(name);
            def.is_damaging() && dex.types.effectiveness(&def.move_type, &defender.types) > 0.0
        })
        .cloned()
        .collect();
    if damaging.is_empty() {
        attacker.available_moves.clone()
    } else {
        damaging
    }
}

/// Asks `chooser` and swaps an illegal answer for a random legal move.
pub fn choose_legal<C, R>(
    chooser: &mut C,
    dex: &Dex,
    me: &Combatant,
    opponent: &Combatant,
    rng: &mut R,
) -> String
where
    C: ActionChooser + ?Sized,
    R: Rng + ?Sized,
{
    let legal = &me.available_moves;
    let picked = chooser.choose_move(dex, me, opponent, legal);
    if me.knows_move(&picked) {
        return picked;
    }
    let fallback = legal
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| DEFAULT_MOVE.to_string());
    warn!(combatant = %me.name, picked = %picked, %fallback, "illegal move from chooser, substituting");
    fallback
}

pub struct RandomChooser {
    rng: SmallRng,
    damaging_only: bool,
}

impl RandomChooser {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            damaging_only: false,
        }
    }

    /// Only picks moves that can hurt the opponent when any exist.
    pub fn damaging_only(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            damaging_only: true,
        }
    }
}

impl ActionChooser for RandomChooser {
    fn choose_move(
        &mut self,
        dex: &Dex,
        me: &Combatant,
        opponent: &Combatant,
        legal: &[String],
    ) -> String {
        let pool = if self.damaging_only {
            damaging_moves(dex, me, opponent)
        } else {
            legal.to_vec()
        };
        pool.choose(&mut self.rng)
            .cloned()
            .unwrap_or_else(|| DEFAULT_MOVE.to_string())
    }
}

/// Epsilon-greedy on expected damage.
pub struct HeuristicChooser {
    rng: SmallRng,
    epsilon: f64,
}

impl HeuristicChooser {
    pub fn new(seed: u64, epsilon: f64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
            epsilon: epsilon.clamp(0.0, 1.0),
        }
    }

    pub fn score(dex: &Dex, me: &Combatant, opponent: &Combatant, move_name: &str) -> f64 {
        let def = dex.moves.lookup(move_name);
        let mut score = def.power as f64 * dex.types.effectiveness(&def.move_type, &opponent.types);
        if me.has_type(&def.move_type) {
            score *= STAB;
        }
        if def.power >= 60 {
            score *= 1.05;
        }
        score
    }
}

impl ActionChooser for HeuristicChooser {
    fn choose_move(
        &mut self,
        dex: &Dex,
        me: &Combatant,
        opponent: &Combatant,
        legal: &[String],
    ) -> String {
        if legal.is_empty() {
            return DEFAULT_MOVE.to_string();
        }
        if self.rng.gen::<f64>() < self.epsilon {
            if let Some(pick) = legal.choose(&mut self.rng) {
                return pick.clone();
            }
        }
        let mut best = &legal[0];
        let mut best_score = f64::NEG_INFINITY;
        for name in legal {
            let score = Self::score(dex, me, opponent, name);
            if score > best_score {
                best = name;
                best_score = score;
            }
        }
        best.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{load_combatant, Roster};

    struct Stubborn;

    impl ActionChooser for Stubborn {
        fn choose_move(&mut self, _: &Dex, _: &Combatant, _: &Combatant, _: &[String]) -> String {
            "hyper beam".to_string()
        }
    }

    #[test]
    fn heuristic_prefers_super_effective_stab() {
        let dex = Dex::standard();
        let roster = Roster::standard();
        let charizard = load_combatant(&roster, "charizard").unwrap();
        let venusaur = load_combatant(&roster, "venusaur").unwrap();
        let mut chooser = HeuristicChooser::new(1, 0.0);
        let pick = chooser.choose_move(&dex, &charizard, &venusaur, &charizard.available_moves);
        assert_eq!(pick, "flamethrower");
    }

    #[test]
    fn damaging_filter_skips_status_and_immune_moves() {
        let dex = Dex::standard();
        let roster = Roster::standard();
        let venusaur = load_combatant(&roster, "venusaur").unwrap();
        let blastoise = load_combatant(&roster, "blastoise").unwrap();
        let moves = damaging_moves(&dex, &venusaur, &blastoise);
        assert_eq!(moves, vec!["vine whip", "razor leaf"]);
    }

    #[test]
    fn illegal_choice_is_replaced_with_legal_move() {
        let dex = Dex::standard();
        let roster = Roster::standard();
        let pikachu = load_combatant(&roster, "pikachu").unwrap();
        let blastoise = load_combatant(&roster, "blastoise").unwrap();
        let mut rng = SmallRng::seed_from_u64(2);
        for _ in 0..20 {
            let pick = choose_legal(&mut Stubborn, &dex, &pikachu, &blastoise, &mut rng);
            assert!(pikachu.knows_move(&pick));
        }
    }

    #[test]
    fn random_chooser_stays_legal() {
        let dex = Dex::standard();
        let roster = Roster::standard();
        let alakazam = load_combatant(&roster, "alakazam").unwrap();
        let bulbasaur = load_combatant(&roster, "bulbasaur").unwrap();
        let mut chooser = RandomChooser::new(9);
        for _ in 0..50 {
            let pick = chooser.choose_move(&dex, &alakazam, &bulbasaur, &alakazam.available_moves);
            assert!(alakazam.knows_move(&pick));
        }
    }
}
