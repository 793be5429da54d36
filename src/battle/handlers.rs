//! Per-action resolution handlers.
//!
//! Each submitted [`BattleAction`] is resolved by the first registered
//! handler whose `applies` matches it. Handlers mutate the game state,
//! push events for every discrete effect, and report whether the battle
//! ended as a direct result of the action.

use crate::battle::calculators::{calculate_damage, effective_speed, move_hits};
use crate::battle::capture::resolve_capture;
use crate::battle::state::{
    BattleAction, BattleEvent, BattleGameState, BattleOutcome, BattlePhase, EventBus, TurnRng,
};
use crate::battle::switching;
use crate::data::{DataRepository, STRUGGLE};
use crate::errors::{EngineError, EngineResult};
use crate::pokemon::{StatusCondition, VolatileCondition};
use schema::{EffectTarget, MoveData, MoveEffect, VolatileType};

const PARALYSIS_PREVENT_CHANCE: u8 = 25;
const THAW_CHANCE: u8 = 20;
const CONFUSION_SELF_HIT_CHANCE: u8 = 50;

/// What the engine should do after a handler ran.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Continue,
    BattleOver(BattleOutcome),
}

pub struct ResolveCtx<'a> {
    pub repo: &'a DataRepository,
    pub rng: &'a mut TurnRng,
}

pub trait ActionHandler {
    fn applies(&self, action: &BattleAction) -> bool;

    fn resolve(
        &self,
        state: &mut BattleGameState,
        side: usize,
        action: BattleAction,
        ctx: &mut ResolveCtx<'_>,
        bus: &mut EventBus,
    ) -> EngineResult<Resolution>;
}

pub struct HandlerRegistry {
    handlers: Vec<Box<dyn ActionHandler + Send + Sync>>,
}

impl HandlerRegistry {
    /// The standard handler set covering every action variant.
    pub fn standard() -> Self {
        Self {
            handlers: vec![
                Box::new(RunHandler),
                Box::new(ItemHandler),
                Box::new(SwitchHandler),
                Box::new(CaptureHandler),
                Box::new(AttackHandler),
            ],
        }
    }

    pub fn resolve(
        &self,
        state: &mut BattleGameState,
        side: usize,
        action: BattleAction,
        ctx: &mut ResolveCtx<'_>,
        bus: &mut EventBus,
    ) -> EngineResult<Resolution> {
        for handler in &self.handlers {
            if handler.applies(&action) {
                return handler.resolve(state, side, action, ctx, bus);
            }
        }
        Err(EngineError::InconsistentState(format!(
            "no handler registered for {:?}",
            action
        )))
    }
}

struct RunHandler;

impl ActionHandler for RunHandler {
    fn applies(&self, action: &BattleAction) -> bool {
        matches!(action, BattleAction::Run)
    }

    fn resolve(
        &self,
        state: &mut BattleGameState,
        side: usize,
        _action: BattleAction,
        ctx: &mut ResolveCtx<'_>,
        bus: &mut EventBus,
    ) -> EngineResult<Resolution> {
        if !state.kind.allows_flee() {
            // Running from a trainer battle is a forfeit.
            bus.push(BattleEvent::Message {
                text: format!("{} forfeited the battle!", state.team(side).trainer_name),
            });
            let outcome =
                if side == 0 { BattleOutcome::Defeat } else { BattleOutcome::Victory };
            return Ok(Resolution::BattleOver(outcome));
        }

        let runner = effective_speed(state.team(side).active()) as u32;
        let opponent = effective_speed(state.team(state.opponent_of(side)).active()) as u32;
        let success = if runner >= opponent {
            true
        } else {
            let threshold = ((runner * 100) / opponent.max(1)).min(95) as u8;
            ctx.rng.next_outcome("flee check") <= threshold
        };

        bus.push(BattleEvent::FleeAttempt { side, success });
        if success {
            let outcome = if side == 0 {
                BattleOutcome::Fled
            } else {
                BattleOutcome::Ended { captured: None }
            };
            Ok(Resolution::BattleOver(outcome))
        } else {
            Ok(Resolution::Continue)
        }
    }
}

struct ItemHandler;

impl ActionHandler for ItemHandler {
    fn applies(&self, action: &BattleAction) -> bool {
        matches!(action, BattleAction::Item { .. })
    }

    fn resolve(
        &self,
        state: &mut BattleGameState,
        side: usize,
        action: BattleAction,
        _ctx: &mut ResolveCtx<'_>,
        bus: &mut EventBus,
    ) -> EngineResult<Resolution> {
        let BattleAction::Item { item, target } = action else {
            return Ok(Resolution::Continue);
        };

        let Some(pokemon) = state.team_mut(side).member_mut(target) else {
            bus.push(BattleEvent::ActionRejected {
                side,
                reason: format!("no team member at slot {}", target),
            });
            return Ok(Resolution::Continue);
        };
        if pokemon.is_fainted() {
            bus.push(BattleEvent::ActionRejected {
                side,
                reason: "items cannot target a fainted Pokemon".to_string(),
            });
            return Ok(Resolution::Continue);
        }

        let name = pokemon.name.clone();
        bus.push(BattleEvent::ItemUsed { side, item, target: name.clone() });

        if let Some(amount) = item.heal_amount() {
            let healed = pokemon.heal(amount);
            bus.push(BattleEvent::Healed {
                side,
                target: name.clone(),
                amount: healed,
                new_hp: pokemon.current_hp,
                max_hp: pokemon.max_hp(),
            });
        }
        if let Some(status) = pokemon.status {
            let cured = item.cures_everything() || item.cures() == Some(status.status_type());
            if cured {
                pokemon.status = None;
                bus.push(BattleEvent::StatusRemoved {
                    side,
                    target: name,
                    status: status.status_type(),
                });
            }
        }
        Ok(Resolution::Continue)
    }
}

struct SwitchHandler;

impl ActionHandler for SwitchHandler {
    fn applies(&self, action: &BattleAction) -> bool {
        matches!(action, BattleAction::Switch { .. })
    }

    fn resolve(
        &self,
        state: &mut BattleGameState,
        side: usize,
        action: BattleAction,
        _ctx: &mut ResolveCtx<'_>,
        bus: &mut EventBus,
    ) -> EngineResult<Resolution> {
        let BattleAction::Switch { team_index } = action else {
            return Ok(Resolution::Continue);
        };
        if let Err(err) = switching::perform_switch(state, side, team_index, bus) {
            // Validated at submission; a failure here means the target
            // fainted earlier in the same turn. Skip the action.
            bus.push(BattleEvent::ActionRejected { side, reason: err.to_string() });
        }
        Ok(Resolution::Continue)
    }
}

struct CaptureHandler;

impl ActionHandler for CaptureHandler {
    fn applies(&self, action: &BattleAction) -> bool {
        matches!(action, BattleAction::Capture { .. })
    }

    fn resolve(
        &self,
        state: &mut BattleGameState,
        side: usize,
        action: BattleAction,
        ctx: &mut ResolveCtx<'_>,
        bus: &mut EventBus,
    ) -> EngineResult<Resolution> {
        let BattleAction::Capture { ball } = action else {
            return Ok(Resolution::Continue);
        };

        let target_side = state.opponent_of(side);
        state.phase = BattlePhase::Capture;

        let (species, outcome) = {
            let target = state.team(target_side).active();
            let species_rate = ctx.repo.species(target.species)?.catch_rate;
            bus.push(BattleEvent::BallThrown { side, ball, target: target.name.clone() });
            let outcome = resolve_capture(target, species_rate, ball, ctx.rng);
            (target.species, outcome)
        };

        // A critical capture resolves on its single shake.
        let shown_shakes = if outcome.critical { outcome.shakes.min(1) } else { outcome.shakes.min(3) };
        for shake in 1..=shown_shakes {
            bus.push(BattleEvent::CaptureShake { shake });
        }

        let target_name = state.team(target_side).active().name.clone();
        if outcome.success {
            state.captured = Some(species);
            bus.push(BattleEvent::CaptureSucceeded {
                species,
                pokemon: target_name,
                critical: outcome.critical,
            });
            state.phase = BattlePhase::Ended;
            Ok(Resolution::BattleOver(BattleOutcome::Ended { captured: Some(species) }))
        } else {
            bus.push(BattleEvent::CaptureFailed {
                pokemon: target_name,
                shakes: outcome.shakes,
            });
            state.phase = BattlePhase::Battle;
            Ok(Resolution::Continue)
        }
    }
}

struct AttackHandler;

impl ActionHandler for AttackHandler {
    fn applies(&self, action: &BattleAction) -> bool {
        matches!(
            action,
            BattleAction::Attack { .. } | BattleAction::MegaEvolve { .. } | BattleAction::ZMove { .. }
        )
    }

    fn resolve(
        &self,
        state: &mut BattleGameState,
        side: usize,
        action: BattleAction,
        ctx: &mut ResolveCtx<'_>,
        bus: &mut EventBus,
    ) -> EngineResult<Resolution> {
        let (move_index, power_boost) = match action {
            BattleAction::Attack { move_index } => (move_index, 1.0),
            BattleAction::MegaEvolve { move_index } => {
                bus.push(BattleEvent::Message {
                    text: format!("{} Mega Evolved!", state.team(side).active().name),
                });
                (move_index, 1.0)
            }
            BattleAction::ZMove { move_index } => {
                bus.push(BattleEvent::Message {
                    text: format!(
                        "{} is surrounded by Z-Power!",
                        state.team(side).active().name
                    ),
                });
                (move_index, 1.5)
            }
            _ => return Ok(Resolution::Continue),
        };

        if state.team(side).active().is_fainted() {
            // Fainted earlier this turn; the action is simply lost.
            return Ok(Resolution::Continue);
        }

        if !can_act(state, side, ctx.rng, bus) {
            return Ok(Resolution::Continue);
        }

        if confusion_self_hit(state, side, ctx, bus)? {
            return Ok(Resolution::Continue);
        }

        let move_id = select_move(state, side, move_index)?;
        let move_data = ctx.repo.move_data(move_id)?.clone();
        let target_side = state.opponent_of(side);

        bus.push(BattleEvent::MoveUsed {
            side,
            pokemon: state.team(side).active().name.clone(),
            move_name: move_data.name.clone(),
        });

        if state.team(target_side).active().is_fainted() {
            bus.push(BattleEvent::Message { text: "But there was no target...".to_string() });
            return Ok(Resolution::Continue);
        }

        if !move_hits(
            state.team(side).active(),
            state.team(target_side).active(),
            &move_data,
            ctx.rng,
        ) {
            bus.push(BattleEvent::MoveMissed {
                side,
                pokemon: state.team(side).active().name.clone(),
            });
            return Ok(Resolution::Continue);
        }

        let mut damage_dealt = 0u16;
        if move_data.is_damaging() {
            let mut boosted = move_data.clone();
            if power_boost != 1.0 {
                boosted.power =
                    boosted.power.map(|p| ((p as f32 * power_boost) as u16).min(255) as u8);
            }
            match apply_damage(state, side, target_side, &boosted, ctx, bus)? {
                // No-effect hits skip secondary effects too
                None => return Ok(Resolution::Continue),
                Some(dealt) => damage_dealt = dealt,
            }
        }

        apply_move_effects(state, side, target_side, &move_data, damage_dealt, ctx, bus)?;
        Ok(Resolution::Continue)
    }
}

fn defender_types(
    state: &BattleGameState,
    side: usize,
    ctx: &ResolveCtx<'_>,
) -> EngineResult<Vec<schema::PokemonType>> {
    Ok(ctx.repo.species(state.team(side).active().species)?.types.clone())
}

/// Sleep, freeze, paralysis and flinch checks. Pushes the narration and
/// returns false when the turn is lost.
fn can_act(
    state: &mut BattleGameState,
    side: usize,
    rng: &mut TurnRng,
    bus: &mut EventBus,
) -> bool {
    let name = state.team(side).active().name.clone();

    if state.team_mut(side).active_mut().remove_volatile(VolatileType::Flinch) {
        bus.push(BattleEvent::Message { text: format!("{} flinched and couldn't move!", name) });
        return false;
    }

    match state.team(side).active().status {
        Some(StatusCondition::Sleep(turns)) => {
            if turns <= 1 {
                state.team_mut(side).active_mut().status = None;
                bus.push(BattleEvent::StatusRemoved {
                    side,
                    target: name,
                    status: schema::StatusType::Sleep,
                });
                true
            } else {
                state.team_mut(side).active_mut().status =
                    Some(StatusCondition::Sleep(turns - 1));
                bus.push(BattleEvent::Message { text: format!("{} is fast asleep.", name) });
                false
            }
        }
        Some(StatusCondition::Freeze) => {
            if rng.next_outcome("thaw check") <= THAW_CHANCE {
                state.team_mut(side).active_mut().status = None;
                bus.push(BattleEvent::StatusRemoved {
                    side,
                    target: name,
                    status: schema::StatusType::Freeze,
                });
                true
            } else {
                bus.push(BattleEvent::Message { text: format!("{} is frozen solid!", name) });
                false
            }
        }
        Some(StatusCondition::Paralysis) => {
            if rng.next_outcome("paralysis check") <= PARALYSIS_PREVENT_CHANCE {
                bus.push(BattleEvent::Message {
                    text: format!("{} is paralyzed! It can't move!", name),
                });
                false
            } else {
                true
            }
        }
        _ => true,
    }
}

/// Confusion tick: maybe hurt itself instead of moving. Returns true when
/// the action was consumed by the self-hit.
fn confusion_self_hit(
    state: &mut BattleGameState,
    side: usize,
    ctx: &mut ResolveCtx<'_>,
    bus: &mut EventBus,
) -> EngineResult<bool> {
    let Some(VolatileCondition::Confused { turns_remaining }) = state
        .team(side)
        .active()
        .volatiles
        .get(&VolatileType::Confusion)
        .copied()
    else {
        return Ok(false);
    };

    let name = state.team(side).active().name.clone();
    if turns_remaining <= 1 {
        state.team_mut(side).active_mut().remove_volatile(VolatileType::Confusion);
        bus.push(BattleEvent::Message { text: format!("{} snapped out of confusion!", name) });
        return Ok(false);
    }
    state.team_mut(side).active_mut().add_volatile(VolatileCondition::Confused {
        turns_remaining: turns_remaining - 1,
    });
    bus.push(BattleEvent::Message { text: format!("{} is confused!", name) });

    if ctx.rng.next_outcome("confusion check") > CONFUSION_SELF_HIT_CHANCE {
        return Ok(false);
    }

    // Typeless 40-power physical hit against itself, no crit or stab.
    let active = state.team(side).active();
    let attack = crate::battle::calculators::effective_attack(active, schema::MoveCategory::Physical) as u32;
    let defense = crate::battle::calculators::effective_defense(active, schema::MoveCategory::Physical) as u32;
    let level = active.level as u32;
    let damage = ((((2 * level / 5 + 2) * 40 * attack / defense.max(1)) / 50 + 2) as u16).max(1);

    let pokemon = state.team_mut(side).active_mut();
    let dealt = pokemon.take_damage(damage);
    bus.push(BattleEvent::Message { text: format!("{} hurt itself in its confusion!", name) });
    bus.push(BattleEvent::DamageDealt {
        side,
        target: name.clone(),
        damage: dealt,
        remaining_hp: pokemon.current_hp,
        max_hp: pokemon.max_hp(),
    });
    if pokemon.is_fainted() {
        bus.push(BattleEvent::Fainted { side, pokemon: name });
    }
    Ok(true)
}

/// PP selection: spend from the chosen slot when it has PP, fall back to
/// Struggle when the whole moveset is dry.
fn select_move(
    state: &mut BattleGameState,
    side: usize,
    move_index: usize,
) -> EngineResult<schema::MoveId> {
    let active = state.team(side).active();
    if !active.has_usable_move() {
        return Ok(STRUGGLE);
    }
    let slot = active
        .move_slot(move_index)
        .ok_or(crate::errors::ActionError::InvalidMoveIndex(move_index))?;
    if slot.pp == 0 {
        return Ok(STRUGGLE);
    }
    state
        .team_mut(side)
        .active_mut()
        .spend_pp(move_index)
        .map_err(EngineError::Data)
}

fn apply_damage(
    state: &mut BattleGameState,
    side: usize,
    target_side: usize,
    move_data: &MoveData,
    ctx: &mut ResolveCtx<'_>,
    bus: &mut EventBus,
) -> EngineResult<Option<u16>> {
    let attacker_types = ctx.repo.species(state.team(side).active().species)?.types.clone();
    let target_types = defender_types(state, target_side, ctx)?;

    let outcome = calculate_damage(
        state.team(side).active(),
        state.team(target_side).active(),
        &target_types,
        &attacker_types,
        move_data,
        ctx.rng,
    );

    bus.push(BattleEvent::Effectiveness { multiplier: outcome.effectiveness.multiplier() });
    if outcome.effectiveness == schema::Effectiveness::NoEffect {
        return Ok(None);
    }
    if outcome.critical {
        bus.push(BattleEvent::CriticalHit);
    }

    let target_name = state.team(target_side).active().name.clone();
    let target = state.team_mut(target_side).active_mut();
    let dealt = target.take_damage(outcome.damage);
    bus.push(BattleEvent::DamageDealt {
        side: target_side,
        target: target_name.clone(),
        damage: dealt,
        remaining_hp: target.current_hp,
        max_hp: target.max_hp(),
    });
    if target.is_fainted() {
        bus.push(BattleEvent::Fainted { side: target_side, pokemon: target_name });
    }
    Ok(Some(dealt))
}

fn apply_move_effects(
    state: &mut BattleGameState,
    side: usize,
    target_side: usize,
    move_data: &MoveData,
    damage_dealt: u16,
    ctx: &mut ResolveCtx<'_>,
    bus: &mut EventBus,
) -> EngineResult<()> {
    for effect in &move_data.effects {
        match effect {
            MoveEffect::Ailment { status, chance } => {
                if state.team(target_side).active().is_fainted() {
                    continue;
                }
                if ctx.rng.next_outcome("ailment chance") > *chance {
                    continue;
                }
                let target = state.team_mut(target_side).active_mut();
                if target.status.is_some() {
                    continue;
                }
                let condition = match status {
                    schema::StatusType::Sleep => {
                        // 1..=100 roll folded to 1..=3 turns of sleep
                        let turns = (ctx.rng.next_outcome("sleep duration") - 1) % 3 + 1;
                        StatusCondition::Sleep(turns)
                    }
                    schema::StatusType::Poison => StatusCondition::Poison,
                    schema::StatusType::Burn => StatusCondition::Burn,
                    schema::StatusType::Freeze => StatusCondition::Freeze,
                    schema::StatusType::Paralysis => StatusCondition::Paralysis,
                };
                let target = state.team_mut(target_side).active_mut();
                target.status = Some(condition);
                bus.push(BattleEvent::StatusApplied {
                    side: target_side,
                    target: target.name.clone(),
                    status: *status,
                });
            }
            MoveEffect::Volatile { condition, chance } => {
                if state.team(target_side).active().is_fainted() {
                    continue;
                }
                if ctx.rng.next_outcome("volatile chance") > *chance {
                    continue;
                }
                let target = state.team_mut(target_side).active_mut();
                if target.has_volatile(*condition) {
                    continue;
                }
                let applied = match condition {
                    VolatileType::Confusion => {
                        let turns = (ctx.rng.next_outcome("confusion duration") - 1) % 4 + 2;
                        VolatileCondition::Confused { turns_remaining: turns }
                    }
                    VolatileType::Infatuation => VolatileCondition::Infatuated,
                    VolatileType::Flinch => VolatileCondition::Flinched,
                };
                target.add_volatile(applied);
                bus.push(BattleEvent::VolatileApplied {
                    side: target_side,
                    target: target.name.clone(),
                    condition: *condition,
                });
            }
            MoveEffect::StatChange { target, stat, stages, chance } => {
                if ctx.rng.next_outcome("stat change chance") > *chance {
                    continue;
                }
                let affected_side = match target {
                    EffectTarget::User => side,
                    EffectTarget::Target => target_side,
                };
                if state.team(affected_side).active().is_fainted() {
                    continue;
                }
                let pokemon = state.team_mut(affected_side).active_mut();
                let old_stage = pokemon.stat_stage(*stat);
                pokemon.modify_stat_stage(*stat, *stages);
                let new_stage = pokemon.stat_stage(*stat);
                bus.push(BattleEvent::StatStageChanged {
                    side: affected_side,
                    target: pokemon.name.clone(),
                    stat: *stat,
                    old_stage,
                    new_stage,
                });
            }
            MoveEffect::Heal { percent } => {
                let pokemon = state.team_mut(side).active_mut();
                let amount = (pokemon.max_hp() as u32 * *percent as u32 / 100) as u16;
                let healed = pokemon.heal(amount);
                if healed > 0 {
                    bus.push(BattleEvent::Healed {
                        side,
                        target: pokemon.name.clone(),
                        amount: healed,
                        new_hp: pokemon.current_hp,
                        max_hp: pokemon.max_hp(),
                    });
                }
            }
            MoveEffect::Recoil { percent } => {
                if damage_dealt == 0 {
                    continue;
                }
                let recoil = ((damage_dealt as u32 * *percent as u32 / 100) as u16).max(1);
                let name = state.team(side).active().name.clone();
                let pokemon = state.team_mut(side).active_mut();
                let dealt = pokemon.take_damage(recoil);
                bus.push(BattleEvent::Message {
                    text: format!("{} is damaged by recoil!", name),
                });
                bus.push(BattleEvent::DamageDealt {
                    side,
                    target: name.clone(),
                    damage: dealt,
                    remaining_hp: pokemon.current_hp,
                    max_hp: pokemon.max_hp(),
                });
                if pokemon.is_fainted() {
                    bus.push(BattleEvent::Fainted { side, pokemon: name });
                }
            }
            MoveEffect::HighCrit => {}
        }
    }
    Ok(())
}
