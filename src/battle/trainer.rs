//! Turns an externally supplied trainer description into a battle-ready
//! side: a wrapped roster plus a decision function keyed by AI profile.

use crate::battle::ai::{Behavior, RandomBehavior, ScoringAi};
use crate::battle::state::{BattleAction, BattleGameState, TurnRng};
use crate::data::DataRepository;
use crate::errors::DataResult;
use crate::team::{StoredPokemon, Team};
use schema::AiProfile;
use serde::{Deserialize, Serialize};

/// Persisted description of a computer-controlled opponent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainerData {
    pub name: String,
    pub profile: AiProfile,
    pub roster: Vec<StoredPokemon>,
    /// Prize money on defeat. `None` derives it from the roster's levels.
    pub reward_money: Option<u32>,
    /// Spoken when the trainer wins.
    pub victory_line: Option<String>,
    /// Spoken when the trainer loses.
    pub defeat_line: Option<String>,
    /// Clamp roster levels, e.g. for scaled gym rematches
    pub level_cap: Option<u8>,
}

/// Binds a trainer's team to its decision behavior so the engine can poll
/// non-player sides exactly like player sides.
pub struct TrainerTeamManager {
    behavior: Box<dyn Behavior + Send + Sync>,
    data: Option<TrainerData>,
}

impl TrainerTeamManager {
    pub fn new(profile: AiProfile) -> Self {
        Self { behavior: behavior_for(profile), data: None }
    }

    /// Keeps the trainer description so the session can apply its reward
    /// table and dialogue at the end of the battle.
    pub fn from_data(data: TrainerData) -> Self {
        Self { behavior: behavior_for(data.profile), data: Some(data) }
    }

    pub fn reward_money(&self) -> Option<u32> {
        self.data.as_ref().and_then(|d| d.reward_money)
    }

    /// The trainer's closing line for a finished battle, from the
    /// player side's perspective of `outcome`.
    pub fn end_line(&self, outcome: &crate::battle::state::BattleOutcome) -> Option<&str> {
        use crate::battle::state::BattleOutcome;
        let data = self.data.as_ref()?;
        match outcome {
            BattleOutcome::Victory => data.defeat_line.as_deref(),
            BattleOutcome::Defeat => data.victory_line.as_deref(),
            _ => None,
        }
    }

    /// Build the Team the engine understands from the stored roster,
    /// applying the level cap.
    pub fn build_team(repo: &DataRepository, data: &TrainerData) -> DataResult<Team> {
        let mut roster = data.roster.clone();
        if let Some(cap) = data.level_cap {
            for entry in &mut roster {
                entry.level = entry.level.min(cap);
            }
        }
        Team::from_stored(repo, data.name.clone(), &roster)
    }

    /// Chosen action for this side given only the visible game state and
    /// the turn's rng oracle.
    pub fn decide(
        &self,
        side: usize,
        state: &BattleGameState,
        repo: &DataRepository,
        rng: &mut TurnRng,
    ) -> BattleAction {
        self.behavior.decide(side, state, repo, rng)
    }

    /// Replacement choice after a faint: the first able reserve.
    pub fn choose_replacement(&self, side: usize, state: &BattleGameState) -> Option<usize> {
        state.team(side).valid_switch_targets().first().copied()
    }
}

fn behavior_for(profile: AiProfile) -> Box<dyn Behavior + Send + Sync> {
    match profile {
        AiProfile::Random => Box::new(RandomBehavior),
        other => Box::new(ScoringAi::new(other)),
    }
}
