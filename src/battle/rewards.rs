//! Terminal-state reward hand-off.
//!
//! The engine computes a summary once per battle; applying it (inventory,
//! experience curves, persistence) belongs to an external collaborator.

use crate::battle::state::{BattleGameState, BattleOutcome};
use crate::data::DataRepository;
use crate::errors::EngineResult;
use schema::SpeciesId;
use serde::{Deserialize, Serialize};

/// One defeated opponent worth experience, attributed to the winning
/// side's participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperienceCandidate {
    pub species: SpeciesId,
    pub level: u8,
    pub experience: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardSummary {
    pub outcome: BattleOutcome,
    /// Trainer names of both sides, in side order
    pub participants: Vec<String>,
    pub experience_candidates: Vec<ExperienceCandidate>,
    pub money_reward: u32,
    pub captured_pokemon: Option<SpeciesId>,
}

/// Flat-rate experience: `base_exp * level / 7`.
fn experience_for(base_exp: u16, level: u8) -> u32 {
    base_exp as u32 * level as u32 / 7
}

/// Build the hand-off summary for a finished battle. Experience accrues
/// only to a victorious side 0; money only in trainer-class battles.
pub fn summarize(
    state: &BattleGameState,
    outcome: &BattleOutcome,
    repo: &DataRepository,
) -> EngineResult<RewardSummary> {
    let mut experience_candidates = Vec::new();
    let mut money_reward = 0;

    if *outcome == BattleOutcome::Victory {
        for fallen in state.team(1).members().iter().filter(|p| p.is_fainted()) {
            let species = repo.species(fallen.species)?;
            experience_candidates.push(ExperienceCandidate {
                species: fallen.species,
                level: fallen.level,
                experience: experience_for(species.base_exp, fallen.level),
            });
        }
        if !state.kind.allows_flee() {
            // Trainer payout scales with the opposing team's strength.
            let top_level = state
                .team(1)
                .members()
                .iter()
                .map(|p| p.level as u32)
                .max()
                .unwrap_or(0);
            money_reward = top_level * 40;
        }
    }

    Ok(RewardSummary {
        outcome: outcome.clone(),
        participants: state.teams.iter().map(|t| t.trainer_name.clone()).collect(),
        experience_candidates,
        money_reward,
        captured_pokemon: state.captured,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{move_ids, species_ids};
    use crate::team::{StoredPokemon, Team};
    use schema::BattleKind;

    fn finished_state(kind: BattleKind) -> BattleGameState {
        let repo = DataRepository::demo();
        let player = Team::from_stored(
            &repo,
            "Red",
            &[StoredPokemon::new(species_ids::PIKACHU, 25, vec![move_ids::THUNDER_SHOCK])],
        )
        .unwrap();
        let mut opponent = Team::from_stored(
            &repo,
            "Blue",
            &[StoredPokemon::new(species_ids::PIDGEY, 20, vec![move_ids::TACKLE])],
        )
        .unwrap();
        let hp = opponent.active().max_hp();
        opponent.active_mut().take_damage(hp);
        BattleGameState::new("done", kind, [player, opponent])
    }

    #[test]
    fn victory_lists_fallen_opponents_as_experience() {
        let repo = DataRepository::demo();
        let state = finished_state(BattleKind::Trainer);
        let summary = summarize(&state, &BattleOutcome::Victory, &repo).unwrap();
        assert_eq!(summary.experience_candidates.len(), 1);
        // Pidgey base_exp 50 at level 20: 50 * 20 / 7 = 142
        assert_eq!(summary.experience_candidates[0].experience, 142);
        assert_eq!(summary.money_reward, 800);
        assert_eq!(summary.participants, vec!["Red".to_string(), "Blue".to_string()]);
    }

    #[test]
    fn wild_victories_pay_no_money() {
        let repo = DataRepository::demo();
        let state = finished_state(BattleKind::Wild);
        let summary = summarize(&state, &BattleOutcome::Victory, &repo).unwrap();
        assert_eq!(summary.money_reward, 0);
        assert_eq!(summary.experience_candidates.len(), 1);
    }

    #[test]
    fn fleeing_earns_nothing() {
        let repo = DataRepository::demo();
        let state = finished_state(BattleKind::Wild);
        let summary = summarize(&state, &BattleOutcome::Fled, &repo).unwrap();
        assert!(summary.experience_candidates.is_empty());
        assert_eq!(summary.money_reward, 0);
        assert!(summary.captured_pokemon.is_none());
    }
}
