//! Damage, accuracy and stat math. Pure functions of the combatants, the
//! move data and the turn's rng oracle.

use crate::battle::state::TurnRng;
use crate::pokemon::{Combatant, StatusCondition};
use schema::{Effectiveness, MoveCategory, MoveData, StatType};

const CRIT_CHANCE: u8 = 6;
const HIGH_CRIT_CHANCE: u8 = 25;
const CRIT_MULTIPLIER: f32 = 2.0;
const STAB_MULTIPLIER: f32 = 1.5;

/// Everything the engine needs to apply and narrate one damaging hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    pub damage: u16,
    pub effectiveness: Effectiveness,
    pub critical: bool,
}

/// Stage multiplier for Attack/Defense/Speed stats: 2/8ths through 8/2ths.
pub fn stage_multiplier(stage: i8) -> f32 {
    let stage = stage.clamp(-6, 6);
    if stage >= 0 {
        (2 + stage as i32) as f32 / 2.0
    } else {
        2.0 / (2 - stage as i32) as f32
    }
}

/// Accuracy/evasion stages use a 3-denominator ladder instead.
pub fn accuracy_multiplier(stage: i8) -> f32 {
    let stage = stage.clamp(-6, 6);
    if stage >= 0 {
        (3 + stage as i32) as f32 / 3.0
    } else {
        3.0 / (3 - stage as i32) as f32
    }
}

fn staged_stat(combatant: &Combatant, stat: StatType, raw: u16) -> u16 {
    let multiplier = stage_multiplier(combatant.stat_stage(stat));
    ((raw as f32 * multiplier) as u16).max(1)
}

pub fn effective_attack(combatant: &Combatant, category: MoveCategory) -> u16 {
    let (index, stat) = match category {
        MoveCategory::Special => (3, StatType::SpecialAttack),
        _ => (1, StatType::Attack),
    };
    let mut value = staged_stat(combatant, stat, combatant.stats[index]);
    // Burn halves physical attack
    if category == MoveCategory::Physical && combatant.status == Some(StatusCondition::Burn) {
        value = (value / 2).max(1);
    }
    value
}

pub fn effective_defense(combatant: &Combatant, category: MoveCategory) -> u16 {
    let (index, stat) = match category {
        MoveCategory::Special => (4, StatType::SpecialDefense),
        _ => (2, StatType::Defense),
    };
    staged_stat(combatant, stat, combatant.stats[index])
}

/// Speed after stages and status. Paralysis halves it.
pub fn effective_speed(combatant: &Combatant) -> u16 {
    let mut value = staged_stat(combatant, StatType::Speed, combatant.stats[5]);
    if combatant.status == Some(StatusCondition::Paralysis) {
        value = (value / 2).max(1);
    }
    value
}

/// Accuracy check. Moves with no accuracy value always hit.
pub fn move_hits(
    attacker: &Combatant,
    defender: &Combatant,
    move_data: &MoveData,
    rng: &mut TurnRng,
) -> bool {
    let Some(accuracy) = move_data.accuracy else {
        return true;
    };
    let stage =
        attacker.stat_stage(StatType::Accuracy) - defender.stat_stage(StatType::Evasion);
    let threshold = (accuracy as f32 * accuracy_multiplier(stage)).min(100.0) as u8;
    rng.next_outcome("accuracy check") <= threshold
}

/// Full damage pipeline for one hit of a damaging move.
///
/// A zero effectiveness multiplier short-circuits before the critical and
/// variance rolls, so immune hits consume no rng.
pub fn calculate_damage(
    attacker: &Combatant,
    defender: &Combatant,
    defender_types: &[schema::PokemonType],
    attacker_types: &[schema::PokemonType],
    move_data: &MoveData,
    rng: &mut TurnRng,
) -> DamageOutcome {
    let effectiveness = Effectiveness::against(move_data.move_type, defender_types);
    if effectiveness == Effectiveness::NoEffect {
        return DamageOutcome { damage: 0, effectiveness, critical: false };
    }

    let power = move_data.power.unwrap_or(0) as u32;
    if power == 0 {
        return DamageOutcome { damage: 0, effectiveness, critical: false };
    }

    let crit_chance = if move_data.has_high_crit() { HIGH_CRIT_CHANCE } else { CRIT_CHANCE };
    let critical = rng.next_outcome("critical hit check") <= crit_chance;

    let attack = effective_attack(attacker, move_data.category) as u32;
    let defense = effective_defense(defender, move_data.category) as u32;
    let level = attacker.level as u32;

    let base = ((2 * level / 5 + 2) * power * attack / defense.max(1)) / 50 + 2;

    let mut modifier = effectiveness.multiplier();
    if attacker_types.contains(&move_data.move_type) {
        modifier *= STAB_MULTIPLIER;
    }
    if critical {
        modifier *= CRIT_MULTIPLIER;
    }

    // Variance band: map a 1..=100 roll onto 85%..=100%.
    let roll = rng.next_outcome("damage variance");
    let variance = (85 + ((roll - 1) % 16)) as f32 / 100.0;

    let damage = ((base as f32 * modifier * variance) as u16).max(1);
    DamageOutcome { damage, effectiveness, critical }
}
