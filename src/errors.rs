use crate::battle::state::BattlePhase;
use schema::{BattleKind, MoveId, SpeciesId};
use std::fmt;

/// Top-level error type for the battle engine.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Error related to a submitted action
    Action(ActionError),
    /// Error related to static data lookup
    Data(DataError),
    /// The battle state broke an internal invariant; the session must
    /// transition to `Interrupted` rather than continue undefined.
    InconsistentState(String),
    /// An operation was attempted after the battle reached a terminal phase
    TerminalPhase(BattlePhase),
}

/// Validation errors for submitted actions. These are rejected
/// synchronously to the submitter and never mutate battle state.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionError {
    /// The session is not currently accepting actions from this side
    NotAwaitingAction(usize),
    /// This side already has a pending action this turn
    AlreadySubmitted(usize),
    /// The action is not valid in the current phase
    WrongPhase(BattlePhase),
    /// Move slot index is out of bounds or empty
    InvalidMoveIndex(usize),
    /// Capture attempted in a battle kind that forbids it
    CaptureNotAllowed(BattleKind),
    /// Switch target was rejected
    Switch(SwitchError),
    /// An action that only makes sense during the replacement sub-phase,
    /// or a non-switch action submitted while a replacement is required
    ReplacementRequired(usize),
    /// Structurally malformed action
    Malformed(String),
}

/// Errors for switch-target validation. Each rejection reason is distinct
/// so the client can explain exactly what was wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchError {
    OutOfRange(usize),
    AlreadyActive(usize),
    TargetFainted(usize),
}

/// Errors related to the immutable data repository.
#[derive(Debug, Clone, PartialEq)]
pub enum DataError {
    SpeciesNotFound(SpeciesId),
    MoveNotFound(MoveId),
    EmptyRoster,
    MalformedData(String),
}

/// Errors surfaced by the async session layer.
#[derive(Debug)]
pub enum SessionError {
    /// The session task has ended; the handle is stale
    Closed,
    Engine(EngineError),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Action(err) => write!(f, "action error: {}", err),
            EngineError::Data(err) => write!(f, "data error: {}", err),
            EngineError::InconsistentState(details) => {
                write!(f, "inconsistent battle state: {}", details)
            }
            EngineError::TerminalPhase(phase) => {
                write!(f, "battle already ended in phase {:?}", phase)
            }
        }
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionError::NotAwaitingAction(side) => {
                write!(f, "side {} is not being asked for an action", side)
            }
            ActionError::AlreadySubmitted(side) => {
                write!(f, "side {} already submitted an action this turn", side)
            }
            ActionError::WrongPhase(phase) => {
                write!(f, "action is not valid during phase {:?}", phase)
            }
            ActionError::InvalidMoveIndex(index) => write!(f, "invalid move index: {}", index),
            ActionError::CaptureNotAllowed(kind) => {
                write!(f, "capture is not allowed in a {} battle", kind)
            }
            ActionError::Switch(err) => write!(f, "illegal switch: {}", err),
            ActionError::ReplacementRequired(side) => {
                write!(f, "side {} must send out a replacement first", side)
            }
            ActionError::Malformed(details) => write!(f, "malformed action: {}", details),
        }
    }
}

impl fmt::Display for SwitchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwitchError::OutOfRange(index) => write!(f, "team slot {} does not exist", index),
            SwitchError::AlreadyActive(index) => {
                write!(f, "team slot {} is already in battle", index)
            }
            SwitchError::TargetFainted(index) => write!(f, "team slot {} has fainted", index),
        }
    }
}

impl fmt::Display for DataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataError::SpeciesNotFound(id) => write!(f, "species not found: {}", id),
            DataError::MoveNotFound(id) => write!(f, "move not found: {}", id),
            DataError::EmptyRoster => write!(f, "a team must contain at least one pokemon"),
            DataError::MalformedData(details) => write!(f, "malformed data: {}", details),
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Closed => write!(f, "battle session is closed"),
            SessionError::Engine(err) => write!(f, "engine error: {}", err),
        }
    }
}

impl std::error::Error for EngineError {}
impl std::error::Error for ActionError {}
impl std::error::Error for SwitchError {}
impl std::error::Error for DataError {}
impl std::error::Error for SessionError {}

impl From<ActionError> for EngineError {
    fn from(err: ActionError) -> Self {
        EngineError::Action(err)
    }
}

impl From<DataError> for EngineError {
    fn from(err: DataError) -> Self {
        EngineError::Data(err)
    }
}

impl From<SwitchError> for ActionError {
    fn from(err: SwitchError) -> Self {
        ActionError::Switch(err)
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        SessionError::Engine(err)
    }
}

/// Type alias for Results using EngineError
pub type EngineResult<T> = Result<T, EngineError>;

/// Type alias for Results using ActionError
pub type ActionResult<T> = Result<T, ActionError>;

/// Type alias for Results using DataError
pub type DataResult<T> = Result<T, DataError>;
