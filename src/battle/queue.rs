//! Deterministic per-turn action ordering.
//!
//! Ordering is recomputed every turn because stat stages and status can
//! change effective Speed between turns. Ties never fall back to
//! randomness; side 0 acts first on an exact tie so identical inputs
//! replay identically.

use crate::battle::calculators::effective_speed;
use crate::battle::state::{BattleAction, BattleGameState};
use crate::data::DataRepository;

/// Category tier, highest first. A move's own priority is compared only
/// among attack-class actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ActionCategory {
    RunOrItem = 2,
    Switch = 1,
    AttackClass = 0,
}

fn category_of(action: &BattleAction) -> ActionCategory {
    match action {
        BattleAction::Run | BattleAction::Item { .. } => ActionCategory::RunOrItem,
        BattleAction::Switch { .. } => ActionCategory::Switch,
        BattleAction::Attack { .. }
        | BattleAction::Capture { .. }
        | BattleAction::MegaEvolve { .. }
        | BattleAction::ZMove { .. } => ActionCategory::AttackClass,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct QueuedAction {
    pub side: usize,
    pub action: BattleAction,
}

#[derive(Debug)]
pub struct ActionQueue {
    ordered: Vec<QueuedAction>,
}

impl ActionQueue {
    /// Order this turn's submitted actions. Tie-break levels:
    /// category, then declared move priority (attack-class only), then
    /// effective Speed, then side index.
    pub fn build(state: &BattleGameState, repo: &DataRepository) -> Self {
        let mut entries: Vec<(QueuedAction, ActionCategory, i8, u16)> = state
            .pending_actions
            .iter()
            .enumerate()
            .filter_map(|(side, action)| action.map(|action| (side, action)))
            .map(|(side, action)| {
                let category = category_of(&action);
                let move_priority = match category {
                    ActionCategory::AttackClass => declared_priority(state, repo, side, &action),
                    _ => 0,
                };
                let speed = effective_speed(state.team(side).active());
                (QueuedAction { side, action }, category, move_priority, speed)
            })
            .collect();

        // Stable sort keeps side 0 ahead on exact ties.
        entries.sort_by(|a, b| {
            b.1.cmp(&a.1)
                .then(b.2.cmp(&a.2))
                .then(b.3.cmp(&a.3))
        });

        Self { ordered: entries.into_iter().map(|(queued, ..)| queued).collect() }
    }

    pub fn actions(&self) -> &[QueuedAction] {
        &self.ordered
    }

    pub fn into_actions(self) -> Vec<QueuedAction> {
        self.ordered
    }
}

fn declared_priority(
    state: &BattleGameState,
    repo: &DataRepository,
    side: usize,
    action: &BattleAction,
) -> i8 {
    let move_index = match action {
        BattleAction::Attack { move_index }
        | BattleAction::MegaEvolve { move_index }
        | BattleAction::ZMove { move_index } => *move_index,
        _ => return 0,
    };
    state
        .team(side)
        .active()
        .move_slot(move_index)
        .and_then(|slot| repo.move_data(slot.move_id).ok())
        .map(|data| data.priority)
        .unwrap_or(0)
}
