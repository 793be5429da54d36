//! Turn-based battle engine for Pokemon-like combatants.
//!
//! A strict phase state machine with deterministic action ordering,
//! damage/effectiveness/capture resolution, trainer AI, and a timed,
//! sequence-numbered event broadcast for every observer of a match.
//! Battles run as independent async sessions over the synchronous engine.

// --- MODULE DECLARATIONS ---
pub mod battle;
pub mod data;
pub mod errors;
pub mod pokemon;
pub mod team;

// --- PUBLIC API RE-EXPORTS ---

// --- From the `schema` crate ---
pub use schema::{
    AiProfile,
    BallKind,
    BaseStats,
    BattleKind,
    Effectiveness,
    ItemKind,
    MoveCategory,
    MoveData,
    MoveId,
    PokemonType,
    SpeciesData,
    SpeciesId,
    StatType,
    StatusType,
    VolatileType,
};

// --- From this crate's modules (`src/`) ---

// The synchronous engine and its state.
pub use battle::engine::BattleEngine;
pub use battle::state::{
    BattleAction, BattleEvent, BattleEventKind, BattleGameState, BattleOutcome, BattlePhase,
    EventBus, TurnRng,
};

// Async session and broadcast layers.
pub use battle::broadcast::{BroadcastManager, BroadcastTiming, SequencedEvent};
pub use battle::session::{BattleSession, SessionConfig, SessionHandle, SessionOutcome};

// Sides, rosters and opponents.
pub use battle::ai::{Behavior, RandomBehavior, ScoringAi};
pub use battle::rewards::RewardSummary;
pub use battle::trainer::{TrainerData, TrainerTeamManager};
pub use pokemon::{Combatant, StatusCondition, VolatileCondition};
pub use team::{StoredPokemon, Team, TeamSummary};

// Data access.
pub use data::DataRepository;

// Crate-specific error and result types.
pub use errors::{
    ActionError, ActionResult, DataError, DataResult, EngineError, EngineResult, SessionError,
    SwitchError,
};
