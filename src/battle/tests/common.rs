use crate::battle::engine::BattleEngine;
use crate::battle::state::BattlePhase;
use crate::data::DataRepository;
use crate::pokemon::{Combatant, StatusCondition};
use crate::team::Team;
use schema::{BattleKind, MoveId, SpeciesId};
use std::sync::Arc;

/// A builder for creating test combatants with common defaults.
///
/// # Example
/// ```ignore
/// let pokemon = TestPokemonBuilder::new(species_ids::PIKACHU, 25)
///     .with_moves(vec![move_ids::TACKLE])
///     .with_status(StatusCondition::Paralysis)
///     .build(&repo);
/// ```
pub struct TestPokemonBuilder {
    species: SpeciesId,
    level: u8,
    moves: Vec<MoveId>,
    status: Option<StatusCondition>,
    current_hp: Option<u16>,
}

impl TestPokemonBuilder {
    pub fn new(species: SpeciesId, level: u8) -> Self {
        Self {
            species,
            level,
            moves: vec![crate::data::move_ids::TACKLE],
            status: None,
            current_hp: None,
        }
    }

    pub fn with_moves(mut self, moves: Vec<MoveId>) -> Self {
        self.moves = moves;
        self
    }

    pub fn with_status(mut self, status: StatusCondition) -> Self {
        self.status = Some(status);
        self
    }

    /// Sets the current HP. If not set, HP will be max.
    pub fn with_hp(mut self, hp: u16) -> Self {
        self.current_hp = Some(hp);
        self
    }

    pub fn build(self, repo: &DataRepository) -> Combatant {
        let mut pokemon =
            Combatant::from_species(repo, self.species, self.level, &self.moves)
                .unwrap_or_else(|err| {
                    panic!("failed to build test pokemon {:?}: {}", self.species, err)
                });
        pokemon.status = self.status;
        if let Some(hp) = self.current_hp {
            pokemon.current_hp = hp.min(pokemon.max_hp());
        }
        pokemon
    }
}

/// An engine already advanced into the battle phase, with the opening
/// events discarded.
pub fn engine_in_battle(
    kind: BattleKind,
    side0: Vec<Combatant>,
    side1: Vec<Combatant>,
) -> BattleEngine {
    let repo = Arc::new(DataRepository::demo());
    let teams = [
        Team::new("Player One", side0).unwrap(),
        Team::new("Player Two", side1).unwrap(),
    ];
    let mut engine = BattleEngine::new("test-battle", kind, teams, repo);
    engine.begin().unwrap();
    assert_eq!(engine.phase(), BattlePhase::Battle);
    engine
}
