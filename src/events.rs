use crate::model::Status;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    SuperEffective,
    NotVeryEffective,
    NoEffect,
}

impl Verdict {
    pub fn classify(effectiveness: f64) -> Option<Verdict> {
        if effectiveness == 0.0 {
            Some(Verdict::NoEffect)
        } else if effectiveness > 1.5 {
            Some(Verdict::SuperEffective)
        } else if effectiveness < 0.75 {
            Some(Verdict::NotVeryEffective)
        } else {
            None
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::SuperEffective => "It's super effective!",
            Verdict::NotVeryEffective => "It's not very effective...",
            Verdict::NoEffect => "It had no effect.",
        })
    }
}

/// One entry of a turn's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BattleEvent {
    TurnStart {
        turn: u32,
        first: String,
        second: String,
    },
    StatusDamage {
        status: Status,
        target: String,
        damage: u32,
        hp: u32,
    },
    /// The status kept `target` from acting. `turns_left` is set for sleep.
    StatusSkip {
        status: Status,
        target: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        turns_left: Option<u32>,
    },
    /// Paralyzed but moved anyway.
    StatusOvercome { status: Status, target: String },
    /// Woke up or thawed out.
    StatusCleared { status: Status, target: String },
    Heal {
        attacker: String,
        #[serde(rename = "move")]
        move_name: String,
        amount: u32,
        hp: u32,
    },
    MoveMiss {
        attacker: String,
        #[serde(rename = "move")]
        move_name: String,
    },
    Damage {
        attacker: String,
        target: String,
        #[serde(rename = "move")]
        move_name: String,
        damage: u32,
        hp: u32,
        effectiveness: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        verdict: Option<Verdict>,
        critical: bool,
    },
    StatusInflict {
        status: Status,
        target: String,
        from: String,
    },
    StatusImmune {
        status: Status,
        target: String,
        from: String,
    },
    Flinch { target: String, from: String },
    FlinchSkip { target: String },
    Faint { target: String },
}

impl fmt::Display for BattleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BattleEvent::TurnStart { turn, first, .. } => {
                write!(f, "-- turn {turn} ({first} moves first) --")
            }
            BattleEvent::StatusDamage {
                status,
                target,
                damage,
                hp,
            } => write!(f, "{target} is hurt by its {status}! (-{damage}, {hp} HP left)"),
            BattleEvent::StatusSkip {
                status,
                target,
                turns_left,
            } => match (status, turns_left) {
                (Status::Sleep, Some(left)) => {
                    write!(f, "{target} is fast asleep. ({left} turns left)")
                }
                (Status::Paralyze, _) => write!(f, "{target} is fully paralyzed!"),
                (Status::Freeze, _) => write!(f, "{target} is frozen solid!"),
                _ => write!(f, "{target} can't move because of {status}."),
            },
            BattleEvent::StatusOvercome { target, .. } => {
                write!(f, "{target} is paralyzed but moved anyway.")
            }
            BattleEvent::StatusCleared { status, target } => match status {
                Status::Sleep => write!(f, "{target} woke up!"),
                Status::Freeze => write!(f, "{target} thawed out!"),
                _ => write!(f, "{target} recovered from {status}."),
            },
            BattleEvent::Heal {
                attacker,
                move_name,
                amount,
                hp,
            } => write!(f, "{attacker} used {move_name} and restored {amount} HP ({hp})."),
            BattleEvent::MoveMiss {
                attacker,
                move_name,
            } => write!(f, "{attacker} used {move_name}, but it missed!"),
            BattleEvent::Damage {
                attacker,
                target,
                move_name,
                damage,
                hp,
                verdict,
                critical,
                ..
            } => {
                write!(f, "{attacker} used {move_name}! {target} took {damage} ({hp} HP left).")?;
                if *critical {
                    write!(f, " A critical hit!")?;
                }
                if let Some(verdict) = verdict {
                    write!(f, " {verdict}")?;
                }
                Ok(())
            }
            BattleEvent::StatusInflict { status, target, .. } => {
                write!(f, "{target} was afflicted with {status}!")
            }
            BattleEvent::StatusImmune { status, target, .. } => {
                write!(f, "{target} is unaffected by {status}.")
            }
            BattleEvent::Flinch { target, .. } => write!(f, "{target} flinched!"),
            BattleEvent::FlinchSkip { target } => write!(f, "{target} flinched and couldn't move!"),
            BattleEvent::Faint { target } => write!(f, "{target} fainted!"),
        }
    }
}
