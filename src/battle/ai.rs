//! Opponent decision-making for non-player sides.
//!
//! Every behavior is a pure function of the visible game state plus the
//! turn's rng oracle, so trainer decisions replay deterministically with
//! the same inputs.

use crate::battle::calculators::effective_attack;
use crate::battle::state::{BattleAction, BattleGameState, TurnRng};
use crate::data::DataRepository;
use ordered_float::OrderedFloat;
use schema::{AiProfile, Effectiveness, MoveEffect};

/// A system that can decide on a battle action for one side.
pub trait Behavior {
    fn decide(
        &self,
        side: usize,
        state: &BattleGameState,
        repo: &DataRepository,
        rng: &mut TurnRng,
    ) -> BattleAction;
}

/// Uniform pick among usable move slots. Used by the lowest difficulty
/// profile and by wild Pokemon.
pub struct RandomBehavior;

impl Behavior for RandomBehavior {
    fn decide(
        &self,
        side: usize,
        state: &BattleGameState,
        _repo: &DataRepository,
        rng: &mut TurnRng,
    ) -> BattleAction {
        let usable: Vec<usize> = state
            .team(side)
            .active()
            .moves
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.map(|s| s.pp > 0).unwrap_or(false))
            .map(|(i, _)| i)
            .collect();
        if usable.is_empty() {
            return BattleAction::Attack { move_index: 0 };
        }
        let roll = rng.next_outcome("ai move pick") as usize;
        BattleAction::Attack { move_index: usable[(roll - 1) % usable.len()] }
    }
}

/// Scores every legal option and takes the best one, weighted by profile.
pub struct ScoringAi {
    profile: AiProfile,
}

impl ScoringAi {
    pub fn new(profile: AiProfile) -> Self {
        Self { profile }
    }

    fn score_action(
        &self,
        action: &BattleAction,
        side: usize,
        state: &BattleGameState,
        repo: &DataRepository,
    ) -> f32 {
        match action {
            BattleAction::Attack { move_index } => {
                self.score_move(*move_index, side, state, repo)
            }
            BattleAction::Switch { team_index } => {
                self.score_switch(*team_index, side, state, repo)
            }
            _ => -1000.0,
        }
    }

    fn score_move(
        &self,
        move_index: usize,
        side: usize,
        state: &BattleGameState,
        repo: &DataRepository,
    ) -> f32 {
        let attacker = state.team(side).active();
        let defender = state.team(state.opponent_of(side)).active();
        let Some(slot) = attacker.move_slot(move_index) else {
            return -1000.0;
        };
        if slot.pp == 0 {
            return -1000.0;
        }
        let Ok(move_data) = repo.move_data(slot.move_id) else {
            return -1000.0;
        };
        let Ok(attacker_species) = repo.species(attacker.species) else {
            return 0.0;
        };
        let Ok(defender_species) = repo.species(defender.species) else {
            return 0.0;
        };

        let mut damage_score = 0.0;
        if move_data.is_damaging() {
            let effectiveness =
                Effectiveness::against(move_data.move_type, &defender_species.types).multiplier();
            if effectiveness == 0.0 {
                return -1.0;
            }
            let stab = if attacker_species.types.contains(&move_data.move_type) {
                1.5
            } else {
                1.0
            };
            let power = move_data.power.unwrap_or(0) as f32;
            let stat = effective_attack(attacker, move_data.category) as f32;
            let normalized = stat / (attacker.level as f32 * 2.0).max(1.0);
            damage_score = power * effectiveness * stab * normalized;
        }

        // Status moves score on their secondary value instead.
        let mut utility_score = 0.0;
        for effect in &move_data.effects {
            match effect {
                MoveEffect::Ailment { chance, .. } if defender.status.is_none() => {
                    utility_score += 30.0 * (*chance as f32 / 100.0);
                }
                MoveEffect::StatChange { stages, chance, .. } => {
                    utility_score += 8.0 * stages.unsigned_abs() as f32 * (*chance as f32 / 100.0);
                }
                MoveEffect::Heal { percent } => {
                    let missing = 1.0 - attacker.current_hp as f32 / attacker.max_hp() as f32;
                    utility_score += *percent as f32 * missing;
                }
                _ => {}
            }
        }

        let utility_weight = match self.profile {
            AiProfile::Random | AiProfile::Aggressive => 0.2,
            AiProfile::Cautious => 1.2,
            AiProfile::Expert => 1.0,
        };
        damage_score + utility_score * utility_weight
    }

    fn score_switch(
        &self,
        team_index: usize,
        side: usize,
        state: &BattleGameState,
        repo: &DataRepository,
    ) -> f32 {
        if self.profile != AiProfile::Expert {
            return -500.0;
        }
        if state.team(side).validate_switch(team_index, false).is_err() {
            return -1000.0;
        }
        let active = state.team(side).active();
        let defender = state.team(state.opponent_of(side)).active();
        let (Ok(candidate_species), Ok(defender_species)) = (
            state
                .team(side)
                .member(team_index)
                .map(|p| repo.species(p.species))
                .unwrap_or(Err(crate::errors::DataError::EmptyRoster)),
            repo.species(defender.species),
        ) else {
            return -1000.0;
        };

        // Only worth it when the current matchup is bad and the bench
        // resists the opponent.
        let hp_fraction = active.current_hp as f32 / active.max_hp() as f32;
        let incoming: f32 = defender_species
            .types
            .iter()
            .map(|t| Effectiveness::against(*t, &candidate_species.types).multiplier())
            .product();
        if hp_fraction < 0.3 && incoming < 1.0 {
            25.0
        } else {
            -50.0
        }
    }
}

impl Behavior for ScoringAi {
    fn decide(
        &self,
        side: usize,
        state: &BattleGameState,
        repo: &DataRepository,
        rng: &mut TurnRng,
    ) -> BattleAction {
        if self.profile == AiProfile::Random {
            return RandomBehavior.decide(side, state, repo, rng);
        }

        let mut candidates: Vec<BattleAction> = (0..4)
            .map(|move_index| BattleAction::Attack { move_index })
            .collect();
        for team_index in state.team(side).valid_switch_targets() {
            candidates.push(BattleAction::Switch { team_index });
        }

        candidates
            .into_iter()
            .max_by_key(|action| OrderedFloat(self.score_action(action, side, state, repo)))
            .unwrap_or(BattleAction::Attack { move_index: 0 })
    }
}
