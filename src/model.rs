use crate::error::{BattleError, Result};
use crate::moves::move_id;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const DEFAULT_NAME: &str = "unknown";
pub const DEFAULT_STAT: u32 = 50;
pub const DEFAULT_TYPE: &str = "normal";
pub const DEFAULT_MOVE: &str = "tackle";
/// Species feed records can list hundreds of learnable moves; only the head is kept.
pub const FOREIGN_MOVE_LIMIT: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[serde(alias = "brn")]
    Burn,
    #[serde(alias = "psn")]
    Poison,
    #[serde(alias = "slp", alias = "asleep")]
    Sleep,
    #[serde(alias = "paralysis", alias = "par")]
    Paralyze,
    #[serde(alias = "frz", alias = "frozen")]
    Freeze,
}

impl Status {
    /// Case-insensitive parse. `Ok(None)` for an empty or `none` value.
    pub fn parse(raw: &str) -> Result<Option<Status>> {
        let key = raw.trim().to_ascii_lowercase();
        let status = match key.as_str() {
            "" | "none" => return Ok(None),
            "burn" | "brn" => Status::Burn,
            "poison" | "psn" => Status::Poison,
            "sleep" | "slp" | "asleep" => Status::Sleep,
            "paralyze" | "paralysis" | "par" => Status::Paralyze,
            "freeze" | "frz" | "frozen" => Status::Freeze,
            other => {
                return Err(BattleError::MalformedCombatant {
                    reason: format!("unknown status {other:?}"),
                })
            }
        };
        Ok(Some(status))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Burn => "burn",
            Status::Poison => "poison",
            Status::Sleep => "sleep",
            Status::Paralyze => "paralyze",
            Status::Freeze => "freeze",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    Attack,
    Defense,
    SpAttack,
    SpDefense,
    Speed,
}

/// One side of a battle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combatant {
    pub name: String,
    pub types: Vec<String>,
    pub hp: u32,
    pub max_hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
    pub available_moves: Vec<String>,
    pub status: Option<Status>,
    pub status_turns: u32,
}

impl Combatant {
    pub fn is_fainted(&self) -> bool {
        self.hp == 0
    }

    pub fn has_type(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t.eq_ignore_ascii_case(type_name))
    }

    /// Returns the hp actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.hp);
        self.hp -= lost;
        lost
    }

    /// Returns the hp actually restored.
    pub fn heal(&mut self, amount: u32) -> u32 {
        let restored = amount.min(self.max_hp.saturating_sub(self.hp));
        self.hp += restored;
        restored
    }

    /// Pulls hp back inside `0..=max_hp` for state that skipped normalization.
    pub fn clamp_hp(&mut self) {
        self.max_hp = self.max_hp.max(1);
        self.hp = self.hp.min(self.max_hp);
    }

    pub fn set_status(&mut self, status: Status, turns: u32) {
        self.status = Some(status);
        self.status_turns = if status == Status::Sleep { turns } else { 0 };
    }

    pub fn clear_status(&mut self) {
        self.status = None;
        self.status_turns = 0;
    }

    pub fn knows_move(&self, move_name: &str) -> bool {
        let id = move_id(move_name);
        self.available_moves.iter().any(|m| move_id(m) == id)
    }

    pub fn hp_fraction(&self) -> f64 {
        self.hp as f64 / self.max_hp.max(1) as f64
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeList {
    One(String),
    Many(Vec<String>),
}

impl Default for TypeList {
    fn default() -> Self {
        TypeList::Many(Vec::new())
    }
}

impl TypeList {
    fn into_vec(self) -> Vec<String> {
        match self {
            TypeList::One(t) => vec![t],
            TypeList::Many(list) => list,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FlatFields {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub types: TypeList,
    #[serde(default)]
    pub hp: Option<f64>,
    #[serde(default)]
    pub max_hp: Option<f64>,
    #[serde(default)]
    pub attack: Option<u32>,
    #[serde(default)]
    pub defense: Option<u32>,
    #[serde(default)]
    pub speed: Option<u32>,
    #[serde(default, alias = "moves")]
    pub available_moves: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub status_turns: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatBlock {
    #[serde(default)]
    pub hp: Option<u32>,
    #[serde(default)]
    pub attack: Option<u32>,
    #[serde(default)]
    pub defense: Option<u32>,
    #[serde(default)]
    pub speed: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NestedStats {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub types: TypeList,
    pub stats: StatBlock,
    #[serde(default, alias = "available_moves")]
    pub moves: Vec<String>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Species record as served by the combatant source feed.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeciesInfo {
    pub name: String,
    pub types: Vec<String>,
    pub abilities: Vec<String>,
    pub stats: HashMap<String, u32>,
    #[serde(default)]
    pub moves: Vec<String>,
}

/// Accepted combatant shapes. Anything else fails to deserialize.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CombatantInput {
    Foreign(SpeciesInfo),
    Nested(NestedStats),
    Flat(FlatFields),
}

impl CombatantInput {
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|err| BattleError::MalformedCombatant {
            reason: err.to_string(),
        })
    }

    pub fn normalize(self) -> Result<Combatant> {
        let draft = match self {
            CombatantInput::Flat(flat) => Draft {
                name: flat.name,
                types: flat.types.into_vec(),
                hp: flat.hp.map(round_stat),
                max_hp: flat.max_hp.map(round_stat),
                attack: flat.attack,
                defense: flat.defense,
                speed: flat.speed,
                moves: flat.available_moves,
                status: flat.status,
                status_turns: flat.status_turns,
            },
            CombatantInput::Nested(nested) => Draft {
                name: nested.name,
                types: nested.types.into_vec(),
                hp: nested.stats.hp,
                max_hp: None,
                attack: nested.stats.attack,
                defense: nested.stats.defense,
                speed: nested.stats.speed,
                moves: nested.moves,
                status: nested.status,
                status_turns: None,
            },
            CombatantInput::Foreign(info) => Draft {
                name: Some(info.name),
                types: info.types,
                hp: info.stats.get("hp").copied(),
                max_hp: None,
                attack: info.stats.get("attack").copied(),
                defense: info.stats.get("defense").copied(),
                speed: info.stats.get("speed").copied(),
                moves: info.moves.into_iter().take(FOREIGN_MOVE_LIMIT).collect(),
                status: None,
                status_turns: None,
            },
        };
        draft.build()
    }
}

impl From<Combatant> for CombatantInput {
    fn from(c: Combatant) -> Self {
        CombatantInput::Flat(FlatFields {
            name: Some(c.name),
            types: TypeList::Many(c.types),
            hp: Some(c.hp as f64),
            max_hp: Some(c.max_hp as f64),
            attack: Some(c.attack),
            defense: Some(c.defense),
            speed: Some(c.speed),
            available_moves: c.available_moves,
            status: c.status.map(|s| s.to_string()),
            status_turns: Some(c.status_turns),
        })
    }
}

impl TryFrom<CombatantInput> for Combatant {
    type Error = BattleError;

    fn try_from(input: CombatantInput) -> Result<Self> {
        input.normalize()
    }
}

fn round_stat(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round().min(u32::MAX as f64) as u32
    } else {
        0
    }
}

struct Draft {
    name: Option<String>,
    types: Vec<String>,
    hp: Option<u32>,
    max_hp: Option<u32>,
    attack: Option<u32>,
    defense: Option<u32>,
    speed: Option<u32>,
    moves: Vec<String>,
    status: Option<String>,
    status_turns: Option<u32>,
}

impl Draft {
    fn build(self) -> Result<Combatant> {
        let name = self
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| DEFAULT_NAME.to_string());

        let mut types: Vec<String> = Vec::new();
        for t in self.types {
            let t = t.trim().to_ascii_lowercase();
            if !t.is_empty() && !types.contains(&t) {
                types.push(t);
            }
        }
        if types.len() > 2 {
            return Err(BattleError::MalformedCombatant {
                reason: format!("{name} has {} types, at most 2 allowed", types.len()),
            });
        }
        if types.is_empty() {
            types.push(DEFAULT_TYPE.to_string());
        }

        let hp = self.hp.unwrap_or(DEFAULT_STAT);
        let max_hp = self.max_hp.unwrap_or(hp).max(1);
        let hp = hp.min(max_hp);

        let mut available_moves: Vec<String> = self
            .moves
            .into_iter()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        if available_moves.is_empty() {
            available_moves.push(DEFAULT_MOVE.to_string());
        }

        let status = match self.status {
            Some(raw) => Status::parse(&raw)?,
            None => None,
        };
        let status_turns = match status {
            Some(Status::Sleep) => self.status_turns.unwrap_or(0),
            _ => 0,
        };

        Ok(Combatant {
            name,
            types,
            hp,
            max_hp,
            attack: self.attack.unwrap_or(DEFAULT_STAT).max(1),
            defense: self.defense.unwrap_or(DEFAULT_STAT).max(1),
            speed: self.speed.unwrap_or(DEFAULT_STAT).max(1),
            available_moves,
            status,
            status_turns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_input_applies_defaults() {
        let c = CombatantInput::from_json("{}").unwrap().normalize().unwrap();
        assert_eq!(c.name, "unknown");
        assert_eq!(c.types, vec!["normal"]);
        assert_eq!((c.hp, c.max_hp, c.attack, c.defense, c.speed), (50, 50, 50, 50, 50));
        assert_eq!(c.available_moves, vec!["tackle"]);
        assert_eq!(c.status, None);
    }

    #[test]
    fn flat_input_clamps_hp_and_reads_status() {
        let raw = r#"{"name": "charizard", "types": "Fire", "hp": 120.0, "max_hp": 78,
            "attack": 84, "defense": 78, "speed": 100, "moves": ["ember"],
            "status": "PAR", "status_turns": 3}"#;
        let c = CombatantInput::from_json(raw).unwrap().normalize().unwrap();
        assert_eq!(c.types, vec!["fire"]);
        assert_eq!((c.hp, c.max_hp), (78, 78));
        assert_eq!(c.status, Some(Status::Paralyze));
        assert_eq!(c.status_turns, 0);
    }

    #[test]
    fn nested_stats_block_is_accepted() {
        let raw = r#"{"name": "blastoise", "types": ["water"],
            "stats": {"hp": 79, "attack": 83, "defense": 100, "speed": 78},
            "moves": ["water gun", "bite"]}"#;
        let c = CombatantInput::from_json(raw).unwrap().normalize().unwrap();
        assert_eq!((c.hp, c.max_hp, c.defense), (79, 79, 100));
        assert_eq!(c.available_moves, vec!["water gun", "bite"]);
    }

    #[test]
    fn species_record_keeps_known_stats() {
        let raw = r#"{"name": "pikachu", "types": ["electric"], "abilities": ["static"],
            "stats": {"hp": 35, "attack": 55, "defense": 40, "special-attack": 50, "speed": 90},
            "moves": ["thunder-shock", "quick-attack"], "weight": 60}"#;
        let c = CombatantInput::from_json(raw).unwrap().normalize().unwrap();
        assert_eq!((c.hp, c.attack, c.defense, c.speed), (35, 55, 40, 90));
        assert!(c.knows_move("Thunder Shock"));
    }

    #[test]
    fn rejects_unrecognised_shapes() {
        assert!(CombatantInput::from_json(r#"{"name": "x", "level": 5}"#).is_err());
        assert!(CombatantInput::from_json("[1, 2]").is_err());
        let too_many = r#"{"types": ["fire", "water", "grass"]}"#;
        let err = CombatantInput::from_json(too_many).unwrap().normalize();
        assert!(matches!(err, Err(BattleError::MalformedCombatant { .. })));
        let bad_status = r#"{"status": "confused"}"#;
        assert!(CombatantInput::from_json(bad_status).unwrap().normalize().is_err());
    }

    #[test]
    fn combatant_round_trips_through_flat_input() {
        let mut c = CombatantInput::from_json(r#"{"name": "snorlax", "hp": 160}"#)
            .unwrap()
            .normalize()
            .unwrap();
        c.take_damage(40);
        c.set_status(Status::Sleep, 2);
        let back = CombatantInput::from(c.clone()).normalize().unwrap();
        assert_eq!(back, c);
    }

    #[test]
    fn hp_stays_within_bounds() {
        let mut c = CombatantInput::from_json(r#"{"hp": 10}"#).unwrap().normalize().unwrap();
        assert_eq!(c.take_damage(25), 10);
        assert_eq!(c.hp, 0);
        assert_eq!(c.heal(50), 10);
        assert_eq!(c.hp, 10);
    }

    #[test]
    fn heal_and_clamp_tolerate_hp_above_max() {
        let mut c = CombatantInput::Flat(FlatFields {
            hp: Some(200.0),
            ..FlatFields::default()
        })
        .normalize()
        .unwrap();
        c.hp = 300;
        assert_eq!(c.heal(50), 0);
        c.clamp_hp();
        assert_eq!(c.hp, 200);
        c.max_hp = 0;
        c.clamp_hp();
        assert_eq!((c.hp, c.max_hp), (1, 1));
    }
}
