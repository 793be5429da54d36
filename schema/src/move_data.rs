use crate::{PokemonType, StatType, StatusType, VolatileType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable move identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct MoveId(pub u16);

impl fmt::Display for MoveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "move {}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveCategory {
    Physical,
    Special,
    Status,
}

impl fmt::Display for MoveCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveCategory::Physical => write!(f, "Physical"),
            MoveCategory::Special => write!(f, "Special"),
            MoveCategory::Status => write!(f, "Status"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectTarget {
    User,
    Target,
}

/// Secondary and primary move effects. Chances are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MoveEffect {
    /// Inflict a primary status condition on the target.
    Ailment { status: StatusType, chance: u8 },
    /// Inflict a volatile condition (confusion, infatuation, flinch).
    Volatile { condition: VolatileType, chance: u8 },
    /// Shift a stat stage on user or target by `stages` (may be negative).
    StatChange {
        target: EffectTarget,
        stat: StatType,
        stages: i8,
        chance: u8,
    },
    /// Heal the user by a percentage of its max HP.
    Heal { percent: u8 },
    /// Recoil to the user as a percentage of damage dealt.
    Recoil { percent: u8 },
    /// Elevated critical-hit chance.
    HighCrit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveData {
    pub id: MoveId,
    pub name: String,
    pub move_type: PokemonType,
    pub category: MoveCategory,
    /// None for status moves.
    pub power: Option<u8>,
    /// None means the move never misses.
    pub accuracy: Option<u8>,
    pub max_pp: u8,
    /// Priority tier, compared only among attack-class actions.
    /// -1 ..= 2 in the shipped move table.
    pub priority: i8,
    pub effects: Vec<MoveEffect>,
}

impl MoveData {
    pub fn is_damaging(&self) -> bool {
        matches!(self.category, MoveCategory::Physical | MoveCategory::Special)
    }

    pub fn has_high_crit(&self) -> bool {
        self.effects.iter().any(|e| matches!(e, MoveEffect::HighCrit))
    }
}
