use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatType {
    Attack,
    Defense,
    SpecialAttack,
    SpecialDefense,
    Speed,
    Accuracy,
    Evasion,
}

impl fmt::Display for StatType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StatType::Attack => "Attack",
            StatType::Defense => "Defense",
            StatType::SpecialAttack => "Special Attack",
            StatType::SpecialDefense => "Special Defense",
            StatType::Speed => "Speed",
            StatType::Accuracy => "accuracy",
            StatType::Evasion => "evasiveness",
        };
        write!(f, "{}", name)
    }
}

/// Primary status conditions a move effect can inflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusType {
    Sleep,
    Poison,
    Burn,
    Freeze,
    Paralysis,
}

/// Volatile conditions a move effect can inflict. They clear at
/// well-defined points instead of persisting like a primary status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolatileType {
    Confusion,
    Infatuation,
    Flinch,
}

/// The format of a battle. Determines phase skipping, capture legality
/// and which ruleset the trainer manager applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleKind {
    Wild,
    Trainer,
    Pvp,
    Double,
    Triple,
    Raid,
    Gym,
    Elite4,
    Champion,
    Tournament,
}

impl BattleKind {
    /// Capture is only ever legal against wild spawns.
    pub fn allows_capture(self) -> bool {
        matches!(self, BattleKind::Wild)
    }

    /// Team-format battles open with a lead-selection phase; wild
    /// encounters and plain trainer duels skip straight to battle.
    pub fn uses_team_selection(self) -> bool {
        !matches!(self, BattleKind::Wild | BattleKind::Trainer)
    }

    /// Running only escapes wild encounters; elsewhere it is a forfeit.
    pub fn allows_flee(self) -> bool {
        matches!(self, BattleKind::Wild)
    }
}

impl fmt::Display for BattleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BallKind {
    Poke,
    Great,
    Ultra,
    Master,
}

impl BallKind {
    pub fn modifier(self) -> f32 {
        match self {
            BallKind::Poke => 1.0,
            BallKind::Great => 1.5,
            BallKind::Ultra => 2.0,
            // Large enough to saturate any catch-rate computation.
            BallKind::Master => 255.0,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            BallKind::Poke => "Poke Ball",
            BallKind::Great => "Great Ball",
            BallKind::Ultra => "Ultra Ball",
            BallKind::Master => "Master Ball",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    Potion,
    SuperPotion,
    HyperPotion,
    Antidote,
    BurnHeal,
    IceHeal,
    Awakening,
    ParalyzeHeal,
    FullHeal,
}

impl ItemKind {
    /// HP restored, if this is a healing item.
    pub fn heal_amount(self) -> Option<u16> {
        match self {
            ItemKind::Potion => Some(20),
            ItemKind::SuperPotion => Some(50),
            ItemKind::HyperPotion => Some(120),
            _ => None,
        }
    }

    /// Which status condition this item cures, if any. FullHeal cures all.
    pub fn cures(self) -> Option<StatusType> {
        match self {
            ItemKind::Antidote => Some(StatusType::Poison),
            ItemKind::BurnHeal => Some(StatusType::Burn),
            ItemKind::IceHeal => Some(StatusType::Freeze),
            ItemKind::Awakening => Some(StatusType::Sleep),
            ItemKind::ParalyzeHeal => Some(StatusType::Paralysis),
            _ => None,
        }
    }

    pub fn cures_everything(self) -> bool {
        matches!(self, ItemKind::FullHeal)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ItemKind::Potion => "Potion",
            ItemKind::SuperPotion => "Super Potion",
            ItemKind::HyperPotion => "Hyper Potion",
            ItemKind::Antidote => "Antidote",
            ItemKind::BurnHeal => "Burn Heal",
            ItemKind::IceHeal => "Ice Heal",
            ItemKind::Awakening => "Awakening",
            ItemKind::ParalyzeHeal => "Paralyze Heal",
            ItemKind::FullHeal => "Full Heal",
        }
    }
}

/// Difficulty/behavior profile for AI-controlled sides. Selecting the
/// decision function from a profile is a pure mapping; the AI itself keeps
/// no state beyond the visible turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiProfile {
    Random,
    Cautious,
    Aggressive,
    Expert,
}
