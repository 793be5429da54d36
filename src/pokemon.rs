//! The in-battle view of a single Pokemon: derived stats, temporary stat
//! stages, status conditions and move slots with PP.

use crate::data::DataRepository;
use crate::errors::{DataError, DataResult};
use schema::{MoveId, SpeciesId, StatType, StatusType, VolatileType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const MAX_STAT_STAGE: i8 = 6;
pub const MIN_STAT_STAGE: i8 = -6;

/// A major status condition. At most one at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusCondition {
    /// Remaining sleep turns
    Sleep(u8),
    /// Poison with the number of end-of-turn ticks taken so far
    Poison,
    Burn,
    Freeze,
    Paralysis,
}

impl StatusCondition {
    pub fn status_type(&self) -> StatusType {
        match self {
            StatusCondition::Sleep(_) => StatusType::Sleep,
            StatusCondition::Poison => StatusType::Poison,
            StatusCondition::Burn => StatusType::Burn,
            StatusCondition::Freeze => StatusType::Freeze,
            StatusCondition::Paralysis => StatusType::Paralysis,
        }
    }
}

/// A volatile condition. Cleared on switch-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolatileCondition {
    Confused { turns_remaining: u8 },
    Infatuated,
    Flinched,
}

impl VolatileCondition {
    pub fn volatile_type(&self) -> VolatileType {
        match self {
            VolatileCondition::Confused { .. } => VolatileType::Confusion,
            VolatileCondition::Infatuated => VolatileType::Infatuation,
            VolatileCondition::Flinched => VolatileType::Flinch,
        }
    }
}

/// One of the four move slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveSlot {
    pub move_id: MoveId,
    pub pp: u8,
}

/// A Pokemon as it exists inside a battle. Built from a [`schema::SpeciesData`]
/// plus a level; persistent-layer concerns (IVs, EVs, experience curves)
/// stay outside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combatant {
    pub species: SpeciesId,
    pub name: String,
    pub level: u8,
    pub current_hp: u16,
    /// Derived stats in HP/ATK/DEF/SPA/SPD/SPE order
    pub stats: [u16; 6],
    pub stat_stages: HashMap<StatType, i8>,
    pub status: Option<StatusCondition>,
    pub volatiles: HashMap<VolatileType, VolatileCondition>,
    pub moves: [Option<MoveSlot>; 4],
}

impl Combatant {
    /// Derive battle stats from base stats at the given level and start at
    /// full HP.
    pub fn from_species(
        repo: &DataRepository,
        species: SpeciesId,
        level: u8,
        move_ids: &[MoveId],
    ) -> DataResult<Self> {
        let data = repo.species(species)?;
        let base = data.base_stats.as_array();

        let mut stats = [0u16; 6];
        stats[0] = hp_stat(base[0], level);
        for i in 1..6 {
            stats[i] = other_stat(base[i], level);
        }

        let mut moves = [None; 4];
        for (slot, &id) in moves.iter_mut().zip(move_ids.iter().take(4)) {
            let move_data = repo.move_data(id)?;
            *slot = Some(MoveSlot { move_id: id, pp: move_data.max_pp });
        }

        Ok(Self {
            species,
            name: data.name.clone(),
            level,
            current_hp: stats[0],
            stats,
            stat_stages: HashMap::new(),
            status: None,
            volatiles: HashMap::new(),
            moves,
        })
    }

    pub fn max_hp(&self) -> u16 {
        self.stats[0]
    }

    pub fn is_fainted(&self) -> bool {
        self.current_hp == 0
    }

    /// HP as a whole percentage, rounded up so a living Pokemon never
    /// reads as 0%.
    pub fn hp_percent(&self) -> u8 {
        if self.current_hp == 0 {
            return 0;
        }
        let pct = (self.current_hp as u32 * 100).div_ceil(self.max_hp() as u32);
        pct.min(100) as u8
    }

    /// Apply damage, saturating at 0. Returns the amount actually dealt.
    pub fn take_damage(&mut self, amount: u16) -> u16 {
        let dealt = amount.min(self.current_hp);
        self.current_hp -= dealt;
        dealt
    }

    /// Restore HP, capped at max. Returns the amount actually healed.
    pub fn heal(&mut self, amount: u16) -> u16 {
        let healed = amount.min(self.max_hp() - self.current_hp);
        self.current_hp += healed;
        healed
    }

    pub fn stat_stage(&self, stat: StatType) -> i8 {
        self.stat_stages.get(&stat).copied().unwrap_or(0)
    }

    /// Shift a stat stage, clamped to [-6, 6]. Returns the stages actually
    /// applied (0 when already at the bound).
    pub fn modify_stat_stage(&mut self, stat: StatType, delta: i8) -> i8 {
        let current = self.stat_stage(stat);
        let new = (current + delta).clamp(MIN_STAT_STAGE, MAX_STAT_STAGE);
        if new == 0 {
            self.stat_stages.remove(&stat);
        } else {
            self.stat_stages.insert(stat, new);
        }
        new - current
    }

    pub fn has_volatile(&self, kind: VolatileType) -> bool {
        self.volatiles.contains_key(&kind)
    }

    pub fn add_volatile(&mut self, condition: VolatileCondition) {
        self.volatiles.insert(condition.volatile_type(), condition);
    }

    pub fn remove_volatile(&mut self, kind: VolatileType) -> bool {
        self.volatiles.remove(&kind).is_some()
    }

    /// Reset switch-scoped state: stat stages and volatile conditions.
    /// Major status persists across switches.
    pub fn clear_battle_state(&mut self) {
        self.stat_stages.clear();
        self.volatiles.clear();
    }

    pub fn move_slot(&self, index: usize) -> Option<&MoveSlot> {
        self.moves.get(index).and_then(|slot| slot.as_ref())
    }

    /// Spend one PP from the given slot. PP 0 slots are still selectable
    /// targets for validation to reject.
    pub fn spend_pp(&mut self, index: usize) -> DataResult<MoveId> {
        let slot = self
            .moves
            .get_mut(index)
            .and_then(|slot| slot.as_mut())
            .ok_or_else(|| DataError::MalformedData(format!("empty move slot {}", index)))?;
        if slot.pp > 0 {
            slot.pp -= 1;
        }
        Ok(slot.move_id)
    }

    pub fn has_usable_move(&self) -> bool {
        self.moves
            .iter()
            .flatten()
            .any(|slot| slot.pp > 0)
    }
}

// Gen-1 style stat derivation without IVs/EVs.
fn hp_stat(base: u8, level: u8) -> u16 {
    (2 * base as u16 * level as u16) / 100 + level as u16 + 10
}

fn other_stat(base: u8, level: u8) -> u16 {
    (2 * base as u16 * level as u16) / 100 + 5
}
