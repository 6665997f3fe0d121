use crate::error::{BattleError, Result};
use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// Ref: pokemon-showdown/sim/dex-data.ts: only non-neutral multipliers are listed.
static STANDARD_CHART: phf::Map<&'static str, &'static [(&'static str, f64)]> = phf_map! {
    "normal" => &[("rock", 0.5), ("steel", 0.5), ("ghost", 0.0)],
    "fire" => &[
        ("fire", 0.5), ("water", 0.5), ("rock", 0.5), ("dragon", 0.5),
        ("grass", 2.0), ("ice", 2.0), ("bug", 2.0), ("steel", 2.0),
    ],
    "water" => &[
        ("water", 0.5), ("grass", 0.5), ("dragon", 0.5),
        ("fire", 2.0), ("ground", 2.0), ("rock", 2.0),
    ],
    "electric" => &[
        ("electric", 0.5), ("grass", 0.5), ("dragon", 0.5),
        ("water", 2.0), ("flying", 2.0), ("ground", 0.0),
    ],
    "grass" => &[
        ("fire", 0.5), ("grass", 0.5), ("poison", 0.5), ("flying", 0.5),
        ("bug", 0.5), ("dragon", 0.5), ("steel", 0.5),
        ("water", 2.0), ("ground", 2.0), ("rock", 2.0),
    ],
    "ice" => &[
        ("fire", 0.5), ("water", 0.5), ("ice", 0.5), ("steel", 0.5),
        ("grass", 2.0), ("ground", 2.0), ("flying", 2.0), ("dragon", 2.0),
    ],
    "fighting" => &[
        ("normal", 2.0), ("ice", 2.0), ("rock", 2.0), ("dark", 2.0), ("steel", 2.0),
        ("poison", 0.5), ("flying", 0.5), ("psychic", 0.5), ("bug", 0.5), ("fairy", 0.5),
        ("ghost", 0.0),
    ],
    "poison" => &[
        ("grass", 2.0), ("fairy", 2.0),
        ("poison", 0.5), ("ground", 0.5), ("rock", 0.5), ("ghost", 0.5),
        ("steel", 0.0),
    ],
    "ground" => &[
        ("fire", 2.0), ("electric", 2.0), ("poison", 2.0), ("rock", 2.0), ("steel", 2.0),
        ("grass", 0.5), ("bug", 0.5),
        ("flying", 0.0),
    ],
    "flying" => &[
        ("grass", 2.0), ("fighting", 2.0), ("bug", 2.0),
        ("electric", 0.5), ("rock", 0.5), ("steel", 0.5),
    ],
    "psychic" => &[
        ("fighting", 2.0), ("poison", 2.0),
        ("psychic", 0.5), ("steel", 0.5),
        ("dark", 0.0),
    ],
    "bug" => &[
        ("grass", 2.0), ("psychic", 2.0), ("dark", 2.0),
        ("fire", 0.5), ("fighting", 0.5), ("poison", 0.5), ("flying", 0.5),
        ("ghost", 0.5), ("steel", 0.5), ("fairy", 0.5),
    ],
    "rock" => &[
        ("fire", 2.0), ("ice", 2.0), ("flying", 2.0), ("bug", 2.0),
        ("fighting", 0.5), ("ground", 0.5), ("steel", 0.5),
    ],
    "ghost" => &[("ghost", 2.0), ("psychic", 2.0), ("dark", 0.5), ("normal", 0.0)],
    "dragon" => &[("dragon", 2.0), ("steel", 0.5), ("fairy", 0.0)],
    "dark" => &[
        ("psychic", 2.0), ("ghost", 2.0),
        ("fighting", 0.5), ("dark", 0.5), ("fairy", 0.5),
    ],
    "steel" => &[
        ("rock", 2.0), ("ice", 2.0), ("fairy", 2.0),
        ("fire", 0.5), ("water", 0.5), ("electric", 0.5), ("steel", 0.5),
    ],
    "fairy" => &[
        ("fighting", 2.0), ("dragon", 2.0), ("dark", 2.0),
        ("fire", 0.5), ("poison", 0.5), ("steel", 0.5),
    ],
};

/// Attacking type -> defending type -> multiplier. Missing entries are neutral.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeChart {
    rows: HashMap<String, HashMap<String, f64>>,
}

impl TypeChart {
    /// The full 18-type chart.
    pub fn standard() -> Self {
        let rows = STANDARD_CHART
            .entries()
            .map(|(attacking, row)| {
                let row = row
                    .iter()
                    .map(|(defending, mult)| (defending.to_string(), *mult))
                    .collect();
                (attacking.to_string(), row)
            })
            .collect();
        TypeChart { rows }
    }

    /// Parses a nested `{"fire": {"grass": 2.0}}` table. Keys are lowercased.
    pub fn from_json(raw: &str) -> Result<Self> {
        let parsed: HashMap<String, HashMap<String, f64>> = serde_json::from_str(raw)?;
        let mut chart = TypeChart::default();
        for (attacking, row) in parsed {
            for (defending, mult) in row {
                chart.set(&attacking, &defending, mult)?;
            }
        }
        Ok(chart)
    }

    pub fn set(&mut self, attacking: &str, defending: &str, multiplier: f64) -> Result<()> {
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(BattleError::InvalidCatalog {
                entry: format!("{attacking}->{defending}"),
                reason: format!("multiplier must be a non-negative number, got {multiplier}"),
            });
        }
        self.rows
            .entry(attacking.trim().to_ascii_lowercase())
            .or_default()
            .insert(defending.trim().to_ascii_lowercase(), multiplier);
        Ok(())
    }

    /// Merges `other` cell by cell; its entries win.
    pub fn extend(&mut self, other: TypeChart) {
        for (attacking, row) in other.rows {
            self.rows.entry(attacking).or_default().extend(row);
        }
    }

    pub fn single(&self, attacking: &str, defending: &str) -> f64 {
        let atk = attacking.to_ascii_lowercase();
        let def = defending.to_ascii_lowercase();
        self.rows
            .get(&atk)
            .and_then(|row| row.get(&def))
            .copied()
            .unwrap_or(1.0)
    }

    /// Product over every defending type; an empty list is neutral.
    pub fn effectiveness(&self, move_type: &str, target_types: &[String]) -> f64 {
        target_types
            .iter()
            .map(|t| self.single(move_type, t))
            .product()
    }
}
