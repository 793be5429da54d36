use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub enum PokemonType {
    Normal,
    Fighting,
    Flying,
    Poison,
    Ground,
    Rock,
    Bug,
    Ghost,
    Fire,
    Water,
    Grass,
    Electric,
    Psychic,
    Ice,
    Dragon,
    Typeless,
}

impl fmt::Display for PokemonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl PokemonType {
    /// Single-type matchup multiplier for one attacking type against one
    /// defending type. Legal values are exactly 0.0, 0.5, 1.0 and 2.0;
    /// dual-typed defenders multiply two of these together.
    pub fn matchup(attacking: PokemonType, defending: PokemonType) -> f32 {
        use PokemonType::*;

        // Immunities first; they short-circuit everything else.
        match (attacking, defending) {
            (Normal, Ghost) | (Fighting, Ghost) | (Ghost, Normal) | (Electric, Ground)
            | (Ground, Flying) => return 0.0,
            _ => {}
        }

        let super_effective = match attacking {
            Normal => false,
            Fighting => matches!(defending, Normal | Ice | Rock),
            Flying => matches!(defending, Fighting | Bug | Grass),
            Poison => matches!(defending, Bug | Grass),
            Ground => matches!(defending, Poison | Rock | Fire | Electric),
            Rock => matches!(defending, Flying | Bug | Fire | Ice),
            Bug => matches!(defending, Poison | Grass | Psychic),
            Ghost => matches!(defending, Ghost),
            Fire => matches!(defending, Bug | Grass | Ice),
            Water => matches!(defending, Ground | Rock | Fire),
            Grass => matches!(defending, Ground | Rock | Water),
            Electric => matches!(defending, Flying | Water),
            Psychic => matches!(defending, Fighting | Poison),
            Ice => matches!(defending, Flying | Ground | Grass | Dragon),
            Dragon => matches!(defending, Dragon),
            Typeless => false,
        };
        if super_effective {
            return 2.0;
        }

        let resisted = match attacking {
            Normal => matches!(defending, Rock),
            Fighting => matches!(defending, Flying | Poison | Bug | Psychic),
            Flying => matches!(defending, Rock | Electric),
            Poison => matches!(defending, Poison | Ground | Rock | Ghost),
            Ground => matches!(defending, Bug | Grass),
            Rock => matches!(defending, Fighting | Ground),
            Bug => matches!(defending, Fighting | Flying | Poison | Ghost | Fire),
            Ghost => false,
            Fire => matches!(defending, Rock | Fire | Water | Dragon),
            Water => matches!(defending, Water | Grass | Dragon),
            Grass => matches!(defending, Flying | Poison | Bug | Fire | Grass | Dragon),
            Electric => matches!(defending, Grass | Electric | Dragon),
            Psychic => matches!(defending, Psychic),
            Ice => matches!(defending, Water | Ice | Fire),
            Dragon => false,
            Typeless => false,
        };
        if resisted {
            return 0.5;
        }

        1.0
    }
}

/// Discrete damage multiplier drawn from the type-matchup table.
/// These six tiers are the only legal effectiveness values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effectiveness {
    NoEffect,
    Quarter,
    Half,
    Neutral,
    Double,
    Quadruple,
}

impl Effectiveness {
    pub fn multiplier(self) -> f32 {
        match self {
            Effectiveness::NoEffect => 0.0,
            Effectiveness::Quarter => 0.25,
            Effectiveness::Half => 0.5,
            Effectiveness::Neutral => 1.0,
            Effectiveness::Double => 2.0,
            Effectiveness::Quadruple => 4.0,
        }
    }

    /// The combined tier of one attacking type against a one- or two-typed
    /// defender.
    pub fn against(attacking: PokemonType, defenders: &[PokemonType]) -> Effectiveness {
        let mut product = 1.0f32;
        for defending in defenders {
            product *= PokemonType::matchup(attacking, *defending);
        }
        Effectiveness::from_multiplier(product)
    }

    fn from_multiplier(product: f32) -> Effectiveness {
        if product < 0.01 {
            Effectiveness::NoEffect
        } else if product < 0.3 {
            Effectiveness::Quarter
        } else if product < 0.6 {
            Effectiveness::Half
        } else if product < 1.5 {
            Effectiveness::Neutral
        } else if product < 3.0 {
            Effectiveness::Double
        } else {
            Effectiveness::Quadruple
        }
    }
}

impl fmt::Display for Effectiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Effectiveness::NoEffect => "no effect",
            Effectiveness::Quarter => "barely effective",
            Effectiveness::Half => "not very effective",
            Effectiveness::Neutral => "effective",
            Effectiveness::Double => "super effective",
            Effectiveness::Quadruple => "devastatingly effective",
        };
        write!(f, "{}", text)
    }
}
