use crate::error::{BattleError, Result};
use crate::model::{Combatant, CombatantInput, NestedStats, StatBlock, TypeList};
use std::collections::HashMap;

/// Lookup of combatant records by name.
pub trait CombatantSource {
    fn fetch(&self, name: &str) -> Option<CombatantInput>;
}

pub fn load_combatant(source: &dyn CombatantSource, name: &str) -> Result<Combatant> {
    source
        .fetch(name)
        .ok_or_else(|| BattleError::UnknownCombatant {
            name: name.to_string(),
        })?
        .normalize()
}

/// In-memory source keyed by lowercase name.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: HashMap<String, CombatantInput>,
}

fn entry(name: &str, types: &[&str], stats: [u32; 4], moves: &[&str]) -> CombatantInput {
    let [hp, attack, defense, speed] = stats;
    CombatantInput::Nested(NestedStats {
        name: Some(name.to_string()),
        types: TypeList::Many(types.iter().map(|t| t.to_string()).collect()),
        stats: StatBlock {
            hp: Some(hp),
            attack: Some(attack),
            defense: Some(defense),
            speed: Some(speed),
        },
        moves: moves.iter().map(|m| m.to_string()).collect(),
        status: None,
    })
}

impl Roster {
    /// Base-stat lines for the built-in opponents.
    pub fn standard() -> Self {
        let mut roster = Roster::default();
        roster.insert(entry(
            "charizard",
            &["fire", "flying"],
            [78, 84, 78, 100],
            &["flamethrower", "wing attack", "slash", "ember"],
        ));
        roster.insert(entry(
            "blastoise",
            &["water"],
            [79, 83, 100, 78],
            &["water gun", "tackle", "bite"],
        ));
        roster.insert(entry(
            "venusaur",
            &["grass", "poison"],
            [80, 82, 83, 80],
            &["vine whip", "razor leaf", "sleep powder"],
        ));
        roster.insert(entry(
            "alakazam",
            &["psychic"],
            [55, 50, 45, 120],
            &["psybeam", "confusion", "recover"],
        ));
        roster.insert(entry(
            "pikachu",
            &["electric"],
            [35, 55, 40, 90],
            &["thunder shock", "quick attack", "thunderbolt"],
        ));
        roster.insert(entry(
            "bulbasaur",
            &["grass", "poison"],
            [45, 49, 49, 45],
            &["vine whip", "tackle", "sleep powder"],
        ));
        roster
    }

    /// Parses a JSON array of combatant records.
    pub fn from_json(raw: &str) -> Result<Self> {
        let inputs: Vec<CombatantInput> = serde_json::from_str(raw)?;
        let mut roster = Roster::default();
        for input in inputs {
            roster.insert(input);
        }
        Ok(roster)
    }

    pub fn insert(&mut self, input: CombatantInput) {
        let key = input_name(&input).unwrap_or("unknown").to_ascii_lowercase();
        self.entries.insert(key, input);
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

fn input_name(input: &CombatantInput) -> Option<&str> {
    match input {
        CombatantInput::Foreign(info) => Some(&info.name),
        CombatantInput::Nested(nested) => nested.name.as_deref(),
        CombatantInput::Flat(flat) => flat.name.as_deref(),
    }
}

impl CombatantSource for Roster {
    fn fetch(&self, name: &str) -> Option<CombatantInput> {
        self.entries.get(&name.trim().to_ascii_lowercase()).cloned()
    }
}
