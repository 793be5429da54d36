//! Switch execution on top of [`Team`]'s validation: performs the swap and
//! emits the observable events.

use crate::battle::state::{BattleEvent, BattleGameState, EventBus};
use crate::errors::SwitchError;
use crate::team::TeamSummary;

/// Voluntary mid-turn switch. The target must be a different, non-fainted
/// teammate.
pub fn perform_switch(
    state: &mut BattleGameState,
    side: usize,
    target: usize,
    bus: &mut EventBus,
) -> Result<(), SwitchError> {
    state.team(side).validate_switch(target, false)?;
    swap(state, side, target, bus);
    Ok(())
}

/// Replacement after a faint. The "different index" rule is waived; the
/// target must simply be able to fight.
pub fn perform_replacement(
    state: &mut BattleGameState,
    side: usize,
    target: usize,
    bus: &mut EventBus,
) -> Result<(), SwitchError> {
    state.team(side).validate_switch(target, true)?;
    swap(state, side, target, bus);
    state.pending_replacements[side] = false;
    Ok(())
}

fn swap(state: &mut BattleGameState, side: usize, target: usize, bus: &mut EventBus) {
    let old_pokemon = state.team(side).active().name.clone();
    // validate_switch already passed; OutOfRange cannot occur here
    let _ = state.team_mut(side).apply_switch(target);
    let team = state.team(side);
    bus.push(BattleEvent::Switched {
        side,
        old_pokemon,
        new_pokemon: team.active().name.clone(),
    });
    bus.push(BattleEvent::TeamUpdate { side, summary: TeamSummary::of(team) });
}
