//! A trainer's side of the battle: up to six Pokemon and which one is
//! currently active.

use crate::data::DataRepository;
use crate::errors::{DataError, DataResult, SwitchError};
use crate::pokemon::Combatant;
use schema::{MoveId, SpeciesId, StatusType};
use serde::{Deserialize, Serialize};

pub const MAX_TEAM_SIZE: usize = 6;

/// The persistent-layer description of a Pokemon handed to the engine at
/// battle creation. The engine derives a [`Combatant`] from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPokemon {
    pub species: SpeciesId,
    pub level: u8,
    pub moves: Vec<MoveId>,
    /// Override for the species display name (nickname)
    pub nickname: Option<String>,
}

impl StoredPokemon {
    pub fn new(species: SpeciesId, level: u8, moves: Vec<MoveId>) -> Self {
        Self { species, level, moves, nickname: None }
    }
}

/// One side's team. Index 0 is sent out first.
#[derive(Debug, Clone)]
pub struct Team {
    pub trainer_name: String,
    members: Vec<Combatant>,
    active: usize,
}

impl Team {
    pub fn new(trainer_name: impl Into<String>, members: Vec<Combatant>) -> DataResult<Self> {
        if members.is_empty() {
            return Err(DataError::EmptyRoster);
        }
        let mut members = members;
        members.truncate(MAX_TEAM_SIZE);
        Ok(Self { trainer_name: trainer_name.into(), members, active: 0 })
    }

    pub fn from_stored(
        repo: &DataRepository,
        trainer_name: impl Into<String>,
        stored: &[StoredPokemon],
    ) -> DataResult<Self> {
        let mut members = Vec::with_capacity(stored.len());
        for entry in stored {
            let mut combatant =
                Combatant::from_species(repo, entry.species, entry.level, &entry.moves)?;
            if let Some(nickname) = &entry.nickname {
                combatant.name = nickname.clone();
            }
            members.push(combatant);
        }
        Self::new(trainer_name, members)
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active(&self) -> &Combatant {
        &self.members[self.active]
    }

    pub fn active_mut(&mut self) -> &mut Combatant {
        &mut self.members[self.active]
    }

    pub fn members(&self) -> &[Combatant] {
        &self.members
    }

    pub fn member(&self, index: usize) -> Option<&Combatant> {
        self.members.get(index)
    }

    pub fn member_mut(&mut self, index: usize) -> Option<&mut Combatant> {
        self.members.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Indices that a voluntary or forced switch may target.
    pub fn valid_switch_targets(&self) -> Vec<usize> {
        self.members
            .iter()
            .enumerate()
            .filter(|(i, p)| *i != self.active && !p.is_fainted())
            .map(|(i, _)| i)
            .collect()
    }

    pub fn has_able_pokemon(&self) -> bool {
        self.members.iter().any(|p| !p.is_fainted())
    }

    /// Check a switch target without applying it. `forced` allows the
    /// current active slot when it is fainted (replacement after a faint).
    pub fn validate_switch(&self, target: usize, forced: bool) -> Result<(), SwitchError> {
        let member = self.member(target).ok_or(SwitchError::OutOfRange(target))?;
        if member.is_fainted() {
            return Err(SwitchError::TargetFainted(target));
        }
        if target == self.active && !forced {
            return Err(SwitchError::AlreadyActive(target));
        }
        Ok(())
    }

    /// Swap the active slot. The outgoing Pokemon's stat stages and
    /// volatiles are cleared; major status stays.
    pub fn apply_switch(&mut self, target: usize) -> Result<(), SwitchError> {
        self.validate_switch(target, true)?;
        self.members[self.active].clear_battle_state();
        self.active = target;
        Ok(())
    }
}

/// What the opposing side (and the post-battle hand-off) may see of a team.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub trainer_name: String,
    pub active_index: usize,
    pub members: Vec<CombatantSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombatantSummary {
    pub species: SpeciesId,
    pub name: String,
    pub level: u8,
    pub hp_percent: u8,
    pub status: Option<StatusType>,
    pub fainted: bool,
}

impl TeamSummary {
    pub fn of(team: &Team) -> Self {
        Self {
            trainer_name: team.trainer_name.clone(),
            active_index: team.active_index(),
            members: team
                .members()
                .iter()
                .map(|p| CombatantSummary {
                    species: p.species,
                    name: p.name.clone(),
                    level: p.level,
                    hp_percent: p.hp_percent(),
                    status: p.status.as_ref().map(|s| s.status_type()),
                    fainted: p.is_fainted(),
                })
                .collect(),
        }
    }
}
