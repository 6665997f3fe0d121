pub mod ai;
pub mod battle;
pub mod damage;
pub mod dex;
pub mod env;
pub mod error;
pub mod events;
pub mod matchup;
pub mod model;
pub mod moves;
pub mod registry;
pub mod source;
pub mod status;
pub mod types;

use crate::ai::{ActionChooser, HeuristicChooser, RandomChooser};
use crate::battle::{BattleOptions, Side};
use crate::dex::Dex;
use crate::matchup::{run_matchup, simulate_battle};
use crate::model::{Combatant, CombatantInput};
use crate::moves::MoveCatalog;
use crate::source::{load_combatant, Roster};
use crate::types::TypeChart;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use crate::battle::Battle;
pub use crate::error::{BattleError, Result};
pub use crate::events::BattleEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Battle,
    Matchup,
    Roster,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policy {
    Random,
    Heuristic { epsilon: f64 },
}

#[derive(Debug, Clone)]
pub struct CliOptions {
    pub command: Command,
    /// Roster name or path to a combatant JSON file.
    pub p1: String,
    pub p2: String,
    pub seed: u64,
    pub sims: u64,
    pub moves_path: Option<PathBuf>,
    pub types_path: Option<PathBuf>,
    pub roster_path: Option<PathBuf>,
    pub policy: Policy,
    pub battle: BattleOptions,
    pub json: bool,
}

impl Default for CliOptions {
    fn default() -> Self {
        CliOptions {
            command: Command::Battle,
            p1: "charizard".to_string(),
            p2: "blastoise".to_string(),
            seed: 0,
            sims: 100,
            moves_path: None,
            types_path: None,
            roster_path: None,
            policy: Policy::Random,
            battle: BattleOptions::default(),
            json: false,
        }
    }
}

/// Built-in data, with any catalog or chart file merged over it.
pub fn load_dex(moves_path: Option<&Path>, types_path: Option<&Path>) -> anyhow::Result<Dex> {
    let mut dex = Dex::standard();
    if let Some(path) = moves_path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read move catalog at {}", path.display()))?;
        let catalog = MoveCatalog::from_json(&raw)
            .with_context(|| format!("Invalid move catalog in {}", path.display()))?;
        dex.moves.extend(catalog);
    }
    if let Some(path) = types_path {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read type chart at {}", path.display()))?;
        let chart = TypeChart::from_json(&raw)
            .with_context(|| format!("Invalid type chart in {}", path.display()))?;
        dex.types.extend(chart);
    }
    Ok(dex)
}

pub fn load_roster(path: Option<&Path>) -> anyhow::Result<Roster> {
    let Some(path) = path else {
        return Ok(Roster::standard());
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster at {}", path.display()))?;
    Roster::from_json(&raw).with_context(|| format!("Failed to parse roster from {}", path.display()))
}

/// A `.json` path is read as a combatant record; anything else is a roster name.
pub fn resolve_combatant(name_or_path: &str, roster: &Roster) -> anyhow::Result<Combatant> {
    let path = Path::new(name_or_path);
    if path.extension().is_some_and(|ext| ext == "json") {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read combatant file at {}", path.display()))?;
        let input = CombatantInput::from_json(&raw)
            .with_context(|| format!("Failed to parse combatant from {}", path.display()))?;
        return Ok(input.normalize()?);
    }
    load_combatant(roster, name_or_path)
        .with_context(|| format!("Unknown combatant {name_or_path}"))
}

fn chooser(policy: Policy, seed: u64) -> Box<dyn ActionChooser> {
    match policy {
        Policy::Random => Box::new(RandomChooser::damaging_only(seed)),
        Policy::Heuristic { epsilon } => Box::new(HeuristicChooser::new(seed, epsilon)),
    }
}

pub fn run(opts: CliOptions) -> anyhow::Result<()> {
    let roster = load_roster(opts.roster_path.as_deref())?;
    if opts.command == Command::Roster {
        for name in roster.names() {
            println!("{name}");
        }
        return Ok(());
    }
    if opts.battle.max_turns == 0 {
        anyhow::bail!("--max-turns must be > 0");
    }
    let dex = Arc::new(load_dex(opts.moves_path.as_deref(), opts.types_path.as_deref())?);
    let p1 = resolve_combatant(&opts.p1, &roster)?;
    let p2 = resolve_combatant(&opts.p2, &roster)?;

    match opts.command {
        Command::Battle => {
            let mut p1_chooser = chooser(opts.policy, opts.seed.wrapping_add(1));
            let mut p2_chooser = chooser(opts.policy, opts.seed.wrapping_add(2));
            let report = simulate_battle(
                dex,
                p1,
                p2,
                p1_chooser.as_mut(),
                p2_chooser.as_mut(),
                opts.seed,
                opts.battle,
            );
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }
            for record in &report.turns {
                for event in &record.events {
                    println!("{event}");
                }
            }
            match &report.outcome {
                Some(outcome) => println!("Result: {}", outcome.label()),
                None => println!(
                    "Result: undecided after {} turns ({} {} HP, {} {} HP)",
                    report.final_state.turn,
                    report.final_state.p1.name,
                    report.final_state.p1.hp,
                    report.final_state.p2.name,
                    report.final_state.p2.hp,
                ),
            }
        }
        Command::Matchup => {
            if opts.sims == 0 {
                anyhow::bail!("--sims must be > 0");
            }
            let summary = run_matchup(dex, &p1, &p2, opts.sims, opts.seed, opts.battle);
            if opts.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!(
                    "{} vs {}: {} battles, {} wins / {} losses / {} draws / {} unfinished, win rate {:.3} for {}",
                    p1.name,
                    p2.name,
                    summary.battles,
                    summary.p1_wins,
                    summary.p2_wins,
                    summary.draws,
                    summary.unfinished,
                    summary.win_rate(),
                    Side::P1,
                );
            }
        }
        Command::Roster => {}
    }
    Ok(())
}
