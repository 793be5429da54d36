pub mod ai;
pub mod broadcast;
pub mod calculators;
pub mod capture;
pub mod engine;
pub mod handlers;
pub mod queue;
pub mod rewards;
pub mod session;
pub mod state;
pub mod switching;
pub mod trainer;

#[cfg(test)]
mod tests;

pub use engine::BattleEngine;
pub use session::{BattleSession, SessionConfig, SessionHandle};
pub use state::{BattleAction, BattleEvent, BattleGameState, BattleOutcome, BattlePhase};
