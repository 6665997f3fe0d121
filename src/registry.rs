use crate::battle::{Battle, BattleOptions, BattleSnapshot, Outcome, Side};
use crate::dex::Dex;
use crate::error::{BattleError, BattleId, Result};
use crate::events::BattleEvent;
use crate::model::Combatant;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

struct Slot {
    battle: Battle,
    checkpoint: BattleSnapshot,
}

type SlotHandle = Arc<Mutex<Slot>>;

/// Live battles keyed by id. Turns for one battle are serialized; different
/// battles proceed independently.
pub struct BattleRegistry {
    dex: Arc<Dex>,
    options: BattleOptions,
    battles: RwLock<HashMap<BattleId, SlotHandle>>,
}

impl BattleRegistry {
    pub fn new(dex: Arc<Dex>, options: BattleOptions) -> Self {
        Self {
            dex,
            options,
            battles: RwLock::new(HashMap::new()),
        }
    }

    pub fn create(&self, p1: Combatant, p2: Combatant, seed: u64) -> BattleId {
        let id = Uuid::new_v4();
        let battle = Battle::with_options(self.dex.clone(), p1, p2, seed, self.options);
        let slot = Slot {
            checkpoint: battle.snapshot(),
            battle,
        };
        info!(battle_id = %id, p1 = %slot.checkpoint.p1.name, p2 = %slot.checkpoint.p2.name, "battle created");
        self.battles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(slot)));
        id
    }

    pub fn remove(&self, id: BattleId) -> Option<BattleSnapshot> {
        let handle = self
            .battles
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)?;
        info!(battle_id = %id, "battle removed");
        let slot = lock_slot(id, &handle);
        Some(slot.battle.snapshot())
    }

    pub fn len(&self) -> usize {
        self.battles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle(&self, id: BattleId) -> Result<SlotHandle> {
        self.battles
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .cloned()
            .ok_or(BattleError::BattleNotFound { battle_id: id })
    }

    /// Runs one turn after checking the battle is live and both moves are known.
    pub fn play_turn(&self, id: BattleId, p1_move: &str, p2_move: &str) -> Result<Vec<BattleEvent>> {
        let handle = self.handle(id)?;
        let mut slot = lock_slot(id, &handle);
        if let Some(outcome) = slot.battle.winner() {
            return Err(BattleError::BattleEnded {
                battle_id: id,
                outcome,
            });
        }
        for (side, name) in [(Side::P1, p1_move), (Side::P2, p2_move)] {
            if !slot.battle.combatant(side).knows_move(name) {
                return Err(BattleError::IllegalMove {
                    battle_id: id,
                    side,
                    move_name: name.to_string(),
                });
            }
        }
        let checkpoint = slot.battle.snapshot();
        slot.checkpoint = checkpoint;
        Ok(slot.battle.execute_turn(p1_move, p2_move))
    }

    pub fn snapshot(&self, id: BattleId) -> Result<BattleSnapshot> {
        let handle = self.handle(id)?;
        let slot = lock_slot(id, &handle);
        Ok(slot.battle.snapshot())
    }

    pub fn winner(&self, id: BattleId) -> Result<Option<Outcome>> {
        let handle = self.handle(id)?;
        let slot = lock_slot(id, &handle);
        Ok(slot.battle.winner())
    }
}

/// A panic mid-turn poisons the mutex; the battle is rolled back to the last
/// snapshot taken before that turn.
fn lock_slot(id: BattleId, handle: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    match handle.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            let mut guard = poisoned.into_inner();
            warn!(battle_id = %id, turn = guard.checkpoint.turn, "restoring battle after failed turn");
            let checkpoint = guard.checkpoint.clone();
            guard.battle.restore(checkpoint);
            handle.clear_poison();
            guard
        }
    }
}
