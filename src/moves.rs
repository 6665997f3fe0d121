use crate::error::{BattleError, Result};
use crate::model::{Stat, Status};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Lowercase ASCII alphanumerics only: "Will-O-Wisp" and "willowisp" are the same move.
pub fn move_id(name: &str) -> String {
    name.to_ascii_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

pub struct MoveData {
    pub name: &'static str,
    pub power: u32,
    pub move_type: &'static str,
    pub accuracy: f64,
    pub priority: i32,
    pub status_inflict: &'static [(Status, f64)],
    pub set_status: Option<Status>,
    pub flinch: Option<f64>,
    pub heal_frac: Option<f64>,
    pub crit_rate: Option<f64>,
    pub powder: bool,
    pub self_stat_changes: &'static [(Stat, i8)],
}

const BASE: MoveData = MoveData {
    name: "",
    power: 0,
    move_type: "normal",
    accuracy: 1.0,
    priority: 0,
    status_inflict: &[],
    set_status: None,
    flinch: None,
    heal_frac: None,
    crit_rate: None,
    powder: false,
    self_stat_changes: &[],
};

static MOVES: phf::Map<&'static str, MoveData> = phf_map! {
    "ember" => MoveData { name: "ember", power: 40, move_type: "fire", status_inflict: &[(Status::Burn, 0.1)], ..BASE },
    "flamethrower" => MoveData { name: "flamethrower", power: 90, move_type: "fire", status_inflict: &[(Status::Burn, 0.1)], ..BASE },
    "fireblast" => MoveData { name: "fire blast", power: 110, move_type: "fire", status_inflict: &[(Status::Burn, 0.3)], ..BASE },
    "willowisp" => MoveData { name: "will-o-wisp", move_type: "fire", set_status: Some(Status::Burn), ..BASE },
    "wingattack" => MoveData { name: "wing attack", power: 60, move_type: "flying", ..BASE },
    "airslash" => MoveData { name: "air slash", power: 75, move_type: "flying", flinch: Some(0.3), ..BASE },
    "slash" => MoveData { name: "slash", power: 70, crit_rate: Some(0.125), ..BASE },
    "tackle" => MoveData { name: "tackle", power: 40, ..BASE },
    "quickattack" => MoveData { name: "quick attack", power: 40, priority: 1, ..BASE },
    "hyperbeam" => MoveData { name: "hyper beam", power: 150, ..BASE },
    "bodyslam" => MoveData { name: "body slam", power: 85, status_inflict: &[(Status::Paralyze, 0.3)], ..BASE },
    "watergun" => MoveData { name: "water gun", power: 40, move_type: "water", ..BASE },
    "surf" => MoveData { name: "surf", power: 90, move_type: "water", ..BASE },
    "hydropump" => MoveData { name: "hydro pump", power: 110, move_type: "water", accuracy: 0.8, ..BASE },
    "vinewhip" => MoveData { name: "vine whip", power: 45, move_type: "grass", ..BASE },
    "razorleaf" => MoveData { name: "razor leaf", power: 55, move_type: "grass", crit_rate: Some(0.125), ..BASE },
    "leafstorm" => MoveData { name: "leaf storm", power: 130, move_type: "grass", self_stat_changes: &[(Stat::SpAttack, -2)], ..BASE },
    "sleeppowder" => MoveData { name: "sleep powder", move_type: "grass", accuracy: 0.75, set_status: Some(Status::Sleep), powder: true, ..BASE },
    "poisonpowder" => MoveData { name: "poison powder", move_type: "poison", accuracy: 0.75, set_status: Some(Status::Poison), powder: true, ..BASE },
    "poisonsting" => MoveData { name: "poison sting", power: 15, move_type: "poison", status_inflict: &[(Status::Poison, 0.3)], ..BASE },
    "sludgebomb" => MoveData { name: "sludge bomb", power: 90, move_type: "poison", status_inflict: &[(Status::Poison, 0.3)], ..BASE },
    "toxic" => MoveData { name: "toxic", move_type: "poison", accuracy: 0.9, set_status: Some(Status::Poison), ..BASE },
    "psybeam" => MoveData { name: "psybeam", power: 65, move_type: "psychic", ..BASE },
    "confusion" => MoveData { name: "confusion", power: 50, move_type: "psychic", ..BASE },
    "psychic" => MoveData { name: "psychic", power: 90, move_type: "psychic", ..BASE },
    "hypnosis" => MoveData { name: "hypnosis", move_type: "psychic", accuracy: 0.6, set_status: Some(Status::Sleep), ..BASE },
    "recover" => MoveData { name: "recover", move_type: "psychic", heal_frac: Some(0.5), ..BASE },
    "bite" => MoveData { name: "bite", power: 60, move_type: "dark", flinch: Some(0.3), ..BASE },
    "crunch" => MoveData { name: "crunch", power: 80, move_type: "dark", ..BASE },
    "thundershock" => MoveData { name: "thunder shock", power: 40, move_type: "electric", status_inflict: &[(Status::Paralyze, 0.1)], ..BASE },
    "thunderbolt" => MoveData { name: "thunderbolt", power: 90, move_type: "electric", status_inflict: &[(Status::Paralyze, 0.1)], ..BASE },
    "thunder" => MoveData { name: "thunder", power: 110, move_type: "electric", status_inflict: &[(Status::Paralyze, 0.3)], ..BASE },
    "thunderwave" => MoveData { name: "thunder wave", move_type: "electric", accuracy: 0.9, set_status: Some(Status::Paralyze), ..BASE },
    "icebeam" => MoveData { name: "ice beam", power: 90, move_type: "ice", status_inflict: &[(Status::Freeze, 0.1)], ..BASE },
    "blizzard" => MoveData { name: "blizzard", power: 110, move_type: "ice", status_inflict: &[(Status::Freeze, 0.1)], ..BASE },
    "earthquake" => MoveData { name: "earthquake", power: 100, move_type: "ground", ..BASE },
    "rockslide" => MoveData { name: "rock slide", power: 75, move_type: "rock", accuracy: 0.9, flinch: Some(0.3), ..BASE },
    "swordsdance" => MoveData { name: "swords dance", self_stat_changes: &[(Stat::Attack, 2)], ..BASE },
    "agility" => MoveData { name: "agility", move_type: "psychic", self_stat_changes: &[(Stat::Speed, 2)], ..BASE },
    "defensecurl" => MoveData { name: "defense curl", self_stat_changes: &[(Stat::Defense, 1)], ..BASE },
};

fn default_type() -> String {
    "normal".to_string()
}

fn default_accuracy() -> f64 {
    1.0
}

/// Immutable move template.
///
/// Damage and secondary effects are independent: a move with power and a
/// `status_inflict` entry does both. `self_stat_changes` is carried for callers
/// but the resolver does not track stat stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub power: u32,
    #[serde(rename = "type", default = "default_type")]
    pub move_type: String,
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    #[serde(default)]
    pub priority: i32,
    /// Rolled in catalog order; at most one applies.
    #[serde(default)]
    pub status_inflict: IndexMap<Status, f64>,
    #[serde(default)]
    pub set_status: Option<Status>,
    #[serde(default, rename = "flinch")]
    pub flinch_chance: Option<f64>,
    #[serde(default)]
    pub heal_frac: Option<f64>,
    #[serde(default)]
    pub crit_rate: Option<f64>,
    #[serde(default)]
    pub powder: bool,
    #[serde(default, alias = "self_stat_boost", alias = "self_stat_drop")]
    pub self_stat_changes: BTreeMap<Stat, i8>,
}

impl MoveDef {
    pub fn new(name: &str, move_type: &str, power: u32) -> Self {
        MoveDef {
            name: name.to_string(),
            power,
            move_type: move_type.to_ascii_lowercase(),
            accuracy: 1.0,
            priority: 0,
            status_inflict: IndexMap::new(),
            set_status: None,
            flinch_chance: None,
            heal_frac: None,
            crit_rate: None,
            powder: false,
            self_stat_changes: BTreeMap::new(),
        }
    }

    /// Catalog fallback for names it does not know.
    pub fn unknown(name: &str) -> Self {
        MoveDef::new(name, "normal", 0)
    }

    pub fn is_damaging(&self) -> bool {
        self.power > 0
    }

    fn from_static(data: &MoveData) -> Self {
        MoveDef {
            name: data.name.to_string(),
            power: data.power,
            move_type: data.move_type.to_string(),
            accuracy: data.accuracy,
            priority: data.priority,
            status_inflict: data.status_inflict.iter().copied().collect(),
            set_status: data.set_status,
            flinch_chance: data.flinch,
            heal_frac: data.heal_frac,
            crit_rate: data.crit_rate,
            powder: data.powder,
            self_stat_changes: data.self_stat_changes.iter().copied().collect(),
        }
    }

    fn validate(&self) -> Result<()> {
        let fail = |reason: String| {
            Err(BattleError::InvalidCatalog {
                entry: self.name.clone(),
                reason,
            })
        };
        if !(self.accuracy > 0.0 && self.accuracy <= 1.0) {
            return fail(format!("accuracy {} outside (0, 1]", self.accuracy));
        }
        let probabilities = self
            .status_inflict
            .values()
            .chain(self.flinch_chance.iter())
            .chain(self.crit_rate.iter());
        for p in probabilities {
            if !(0.0..=1.0).contains(p) {
                return fail(format!("probability {p} outside [0, 1]"));
            }
        }
        if let Some(frac) = self.heal_frac {
            if !frac.is_finite() || frac < 0.0 {
                return fail(format!("heal_frac {frac} must be non-negative"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MoveCatalog {
    moves: HashMap<String, MoveDef>,
}

impl MoveCatalog {
    pub fn standard() -> Self {
        let moves = MOVES
            .entries()
            .map(|(id, data)| (id.to_string(), MoveDef::from_static(data)))
            .collect();
        MoveCatalog { moves }
    }

    /// Parses `{"ember": {"power": 40, "type": "fire", ...}}`. Each entry is validated.
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, MoveDef> = serde_json::from_str(raw)?;
        let mut catalog = MoveCatalog::default();
        for (key, mut def) in parsed {
            if def.name.is_empty() {
                def.name = key.trim().to_ascii_lowercase();
            }
            def.move_type = def.move_type.trim().to_ascii_lowercase();
            catalog.insert(def)?;
        }
        Ok(catalog)
    }

    /// Adds or replaces an entry, keyed by the id of its name.
    pub fn insert(&mut self, def: MoveDef) -> Result<()> {
        def.validate()?;
        self.moves.insert(move_id(&def.name), def);
        Ok(())
    }

    /// Merges `other` over this catalog.
    pub fn extend(&mut self, other: MoveCatalog) {
        self.moves.extend(other.moves);
    }

    pub fn get(&self, name: &str) -> Option<&MoveDef> {
        self.moves.get(&move_id(name))
    }

    /// Unknown names resolve to a zero-power normal move and never fail.
    pub fn lookup(&self, name: &str) -> MoveDef {
        match self.get(name) {
            Some(def) => def.clone(),
            None => {
                debug!(move_name = name, "unknown move, treating as zero power");
                MoveDef::unknown(name)
            }
        }
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }
}
