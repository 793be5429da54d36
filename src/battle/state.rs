//! Battle phases, actions, events and the shared game state.
//!
//! Everything here is plain data. The engine mutates a single
//! [`BattleGameState`] from one logical thread of control; events collect
//! in an [`EventBus`] per resolution step and flow out through the
//! broadcast layer afterwards.

use crate::team::{Team, TeamSummary};
use schema::{BallKind, BattleKind, ItemKind, SpeciesId, StatType, StatusType, VolatileType};
use serde::{Deserialize, Serialize};

/// The battle state machine. Terminal phases have no outgoing transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattlePhase {
    Waiting,
    Intro,
    TeamSelection,
    Battle,
    Capture,
    Victory,
    Defeat,
    Fled,
    Ended,
    Interrupted,
}

impl BattlePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BattlePhase::Victory
                | BattlePhase::Defeat
                | BattlePhase::Fled
                | BattlePhase::Ended
                | BattlePhase::Interrupted
        )
    }

    /// The legal edges of the phase graph. `Interrupted` is reachable from
    /// any non-terminal phase.
    pub fn can_transition_to(&self, next: BattlePhase) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == BattlePhase::Interrupted {
            return true;
        }
        matches!(
            (self, next),
            (BattlePhase::Waiting, BattlePhase::Intro)
                | (BattlePhase::Intro, BattlePhase::TeamSelection)
                | (BattlePhase::Intro, BattlePhase::Battle)
                | (BattlePhase::TeamSelection, BattlePhase::Battle)
                | (BattlePhase::Battle, BattlePhase::Capture)
                | (BattlePhase::Capture, BattlePhase::Battle)
                | (BattlePhase::Capture, BattlePhase::Ended)
                | (BattlePhase::Battle, BattlePhase::Victory)
                | (BattlePhase::Battle, BattlePhase::Defeat)
                | (BattlePhase::Battle, BattlePhase::Fled)
                | (BattlePhase::Battle, BattlePhase::Ended)
        )
    }
}

impl std::fmt::Display for BattlePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BattlePhase::Waiting => "waiting",
            BattlePhase::Intro => "intro",
            BattlePhase::TeamSelection => "team selection",
            BattlePhase::Battle => "battle",
            BattlePhase::Capture => "capture",
            BattlePhase::Victory => "victory",
            BattlePhase::Defeat => "defeat",
            BattlePhase::Fled => "fled",
            BattlePhase::Ended => "ended",
            BattlePhase::Interrupted => "interrupted",
        };
        write!(f, "{}", name)
    }
}

/// An action a side may submit for one turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleAction {
    Attack { move_index: usize },
    Item { item: ItemKind, target: usize },
    Switch { team_index: usize },
    Run,
    Capture { ball: BallKind },
    MegaEvolve { move_index: usize },
    ZMove { move_index: usize },
}

/// How the battle concluded, from side 0's perspective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleOutcome {
    Victory,
    Defeat,
    Fled,
    /// Normal conclusion that is neither win nor loss; a successful
    /// capture records the species taken.
    Ended { captured: Option<SpeciesId> },
    Interrupted,
}

impl BattleOutcome {
    pub fn terminal_phase(&self) -> BattlePhase {
        match self {
            BattleOutcome::Victory => BattlePhase::Victory,
            BattleOutcome::Defeat => BattlePhase::Defeat,
            BattleOutcome::Fled => BattlePhase::Fled,
            BattleOutcome::Ended { .. } => BattlePhase::Ended,
            BattleOutcome::Interrupted => BattlePhase::Interrupted,
        }
    }
}

/// Coarse classification used by the broadcast timing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BattleEventKind {
    Message,
    Animation,
    Damage,
    Heal,
    Status,
    StatChange,
    Faint,
    Switch,
    Capture,
    UiUpdate,
    TurnChange,
    BattleEnd,
    Rejection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    TurnStarted {
        turn_number: u32,
    },
    TurnEnded {
        turn_number: u32,
    },
    Message {
        text: String,
    },
    MoveUsed {
        side: usize,
        pokemon: String,
        move_name: String,
    },
    MoveMissed {
        side: usize,
        pokemon: String,
    },
    CriticalHit,
    Effectiveness {
        multiplier: f32,
    },
    DamageDealt {
        side: usize,
        target: String,
        damage: u16,
        remaining_hp: u16,
        max_hp: u16,
    },
    Healed {
        side: usize,
        target: String,
        amount: u16,
        new_hp: u16,
        max_hp: u16,
    },
    StatusApplied {
        side: usize,
        target: String,
        status: StatusType,
    },
    StatusRemoved {
        side: usize,
        target: String,
        status: StatusType,
    },
    StatusDamage {
        side: usize,
        target: String,
        status: StatusType,
        damage: u16,
        remaining_hp: u16,
        max_hp: u16,
    },
    VolatileApplied {
        side: usize,
        target: String,
        condition: VolatileType,
    },
    StatStageChanged {
        side: usize,
        target: String,
        stat: StatType,
        old_stage: i8,
        new_stage: i8,
    },
    Fainted {
        side: usize,
        pokemon: String,
    },
    Switched {
        side: usize,
        old_pokemon: String,
        new_pokemon: String,
    },
    ItemUsed {
        side: usize,
        item: ItemKind,
        target: String,
    },
    BallThrown {
        side: usize,
        ball: BallKind,
        target: String,
    },
    CaptureShake {
        shake: u8,
    },
    CaptureSucceeded {
        species: SpeciesId,
        pokemon: String,
        critical: bool,
    },
    CaptureFailed {
        pokemon: String,
        shakes: u8,
    },
    FleeAttempt {
        side: usize,
        success: bool,
    },
    ActionRejected {
        side: usize,
        reason: String,
    },
    ReplacementRequired {
        side: usize,
    },
    TeamUpdate {
        side: usize,
        summary: TeamSummary,
    },
    BattleEnded {
        outcome: BattleOutcome,
    },
}

impl BattleEvent {
    pub fn kind(&self) -> BattleEventKind {
        match self {
            BattleEvent::TurnStarted { .. } | BattleEvent::TurnEnded { .. } => {
                BattleEventKind::TurnChange
            }
            BattleEvent::Message { .. } => BattleEventKind::Message,
            BattleEvent::MoveUsed { .. }
            | BattleEvent::MoveMissed { .. }
            | BattleEvent::CriticalHit
            | BattleEvent::Effectiveness { .. } => BattleEventKind::Animation,
            BattleEvent::DamageDealt { .. } => BattleEventKind::Damage,
            BattleEvent::Healed { .. } => BattleEventKind::Heal,
            BattleEvent::StatusApplied { .. }
            | BattleEvent::StatusRemoved { .. }
            | BattleEvent::StatusDamage { .. }
            | BattleEvent::VolatileApplied { .. } => BattleEventKind::Status,
            BattleEvent::StatStageChanged { .. } => BattleEventKind::StatChange,
            BattleEvent::Fainted { .. } => BattleEventKind::Faint,
            BattleEvent::Switched { .. } | BattleEvent::ReplacementRequired { .. } => {
                BattleEventKind::Switch
            }
            BattleEvent::ItemUsed { .. } => BattleEventKind::UiUpdate,
            BattleEvent::BallThrown { .. }
            | BattleEvent::CaptureShake { .. }
            | BattleEvent::CaptureSucceeded { .. }
            | BattleEvent::CaptureFailed { .. } => BattleEventKind::Capture,
            BattleEvent::FleeAttempt { .. } => BattleEventKind::Animation,
            BattleEvent::ActionRejected { .. } => BattleEventKind::Rejection,
            BattleEvent::TeamUpdate { .. } => BattleEventKind::UiUpdate,
            BattleEvent::BattleEnded { .. } => BattleEventKind::BattleEnd,
        }
    }

    /// Narration line for the event, or `None` for silent events that exist
    /// only for client state sync.
    pub fn format(&self) -> Option<String> {
        match self {
            BattleEvent::TurnStarted { turn_number } => {
                Some(format!("=== Turn {} ===", turn_number))
            }
            BattleEvent::TurnEnded { .. } => None,
            BattleEvent::Message { text } => Some(text.clone()),
            BattleEvent::MoveUsed { pokemon, move_name, .. } => {
                Some(format!("{} used {}!", pokemon, move_name))
            }
            BattleEvent::MoveMissed { pokemon, .. } => {
                Some(format!("{}'s attack missed!", pokemon))
            }
            BattleEvent::CriticalHit => Some("A critical hit!".to_string()),
            BattleEvent::Effectiveness { multiplier } => {
                if *multiplier == 0.0 {
                    Some("It had no effect...".to_string())
                } else if *multiplier < 1.0 {
                    Some("It's not very effective...".to_string())
                } else if *multiplier > 1.0 {
                    Some("It's super effective!".to_string())
                } else {
                    None
                }
            }
            BattleEvent::DamageDealt { target, damage, .. } => {
                Some(format!("{} took {} damage!", target, damage))
            }
            BattleEvent::Healed { target, amount, .. } => {
                Some(format!("{} recovered {} HP!", target, amount))
            }
            BattleEvent::StatusApplied { target, status, .. } => {
                let verb = match status {
                    StatusType::Sleep => "fell asleep!",
                    StatusType::Poison => "was poisoned!",
                    StatusType::Burn => "was burned!",
                    StatusType::Freeze => "was frozen solid!",
                    StatusType::Paralysis => "is paralyzed! It may be unable to move!",
                };
                Some(format!("{} {}", target, verb))
            }
            BattleEvent::StatusRemoved { target, status, .. } => {
                let verb = match status {
                    StatusType::Sleep => "woke up!",
                    StatusType::Freeze => "thawed out!",
                    _ => "recovered from its condition!",
                };
                Some(format!("{} {}", target, verb))
            }
            BattleEvent::StatusDamage { target, status, damage, .. } => {
                let name = match status {
                    StatusType::Poison => "poison",
                    StatusType::Burn => "its burn",
                    _ => "its condition",
                };
                Some(format!("{} is hurt by {}! ({} damage)", target, name, damage))
            }
            BattleEvent::VolatileApplied { target, condition, .. } => {
                let verb = match condition {
                    VolatileType::Confusion => "became confused!",
                    VolatileType::Infatuation => "fell in love!",
                    VolatileType::Flinch => "flinched!",
                };
                Some(format!("{} {}", target, verb))
            }
            BattleEvent::StatStageChanged { target, stat, old_stage, new_stage, .. } => {
                let direction = match new_stage.cmp(old_stage) {
                    std::cmp::Ordering::Greater => "rose!",
                    std::cmp::Ordering::Less => "fell!",
                    std::cmp::Ordering::Equal => "won't go any further!",
                };
                Some(format!("{}'s {} {}", target, stat, direction))
            }
            BattleEvent::Fainted { pokemon, .. } => Some(format!("{} fainted!", pokemon)),
            BattleEvent::Switched { old_pokemon, new_pokemon, .. } => {
                Some(format!("{} was recalled. Go, {}!", old_pokemon, new_pokemon))
            }
            BattleEvent::ItemUsed { item, target, .. } => {
                Some(format!("The {} was used on {}.", item.display_name(), target))
            }
            BattleEvent::BallThrown { ball, target, .. } => {
                Some(format!("A {} was thrown at {}!", ball.display_name(), target))
            }
            BattleEvent::CaptureShake { shake } => Some(format!("Shake {}...", shake)),
            BattleEvent::CaptureSucceeded { pokemon, critical, .. } => {
                if *critical {
                    Some(format!("A critical capture! {} was caught!", pokemon))
                } else {
                    Some(format!("Gotcha! {} was caught!", pokemon))
                }
            }
            BattleEvent::CaptureFailed { pokemon, .. } => {
                Some(format!("Oh no! {} broke free!", pokemon))
            }
            BattleEvent::FleeAttempt { success, .. } => {
                if *success {
                    Some("Got away safely!".to_string())
                } else {
                    Some("Can't escape!".to_string())
                }
            }
            BattleEvent::ActionRejected { reason, .. } => {
                Some(format!("The action was rejected: {}", reason))
            }
            BattleEvent::ReplacementRequired { .. } => None,
            BattleEvent::TeamUpdate { .. } => None,
            BattleEvent::BattleEnded { outcome } => {
                let text = match outcome {
                    BattleOutcome::Victory => "You won the battle!",
                    BattleOutcome::Defeat => "You were defeated...",
                    BattleOutcome::Fled => "The battle is over.",
                    BattleOutcome::Ended { captured: Some(_) } => "The wild Pokemon was caught!",
                    BattleOutcome::Ended { captured: None } => "The battle is over.",
                    BattleOutcome::Interrupted => "The battle was interrupted.",
                };
                Some(text.to_string())
            }
        }
    }
}

/// Collects events produced while resolving one step. Drained by the
/// engine into the broadcast layer.
#[derive(Debug, Default)]
pub struct EventBus {
    events: Vec<BattleEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: BattleEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Pre-drawn percentile rolls for one turn. Every consumer names why it
/// draws, which makes exhaustion messages and test logs readable, and
/// lets tests inject exact outcomes.
#[derive(Debug, Clone)]
pub struct TurnRng {
    outcomes: Vec<u8>,
    index: usize,
}

impl TurnRng {
    pub fn new_for_test(outcomes: Vec<u8>) -> Self {
        // Consumers subtract 1 from rolls, so 0 would underflow.
        assert!(
            outcomes.iter().all(|o| (1..=100).contains(o)),
            "TurnRng outcomes must be in 1..=100, got {:?}",
            outcomes
        );
        Self { outcomes, index: 0 }
    }

    pub fn new_random() -> Self {
        use rand::Rng;
        let mut rng = rand::rng();
        let outcomes: Vec<u8> = (0..100).map(|_| rng.random_range(1..=100)).collect();
        Self { outcomes, index: 0 }
    }

    /// Next roll in 1..=100. Panics on exhaustion; random instances carry
    /// far more values than one turn can consume.
    pub fn next_outcome(&mut self, reason: &str) -> u8 {
        if self.index >= self.outcomes.len() {
            panic!(
                "TurnRng exhausted! Tried to get a value for: '{}'. Need more random values.",
                reason
            );
        }
        let outcome = self.outcomes[self.index];

        #[cfg(test)]
        println!("[RNG] Consumed {} for: {}", outcome, reason);

        self.index += 1;
        outcome
    }
}

/// The full mutable state of one battle.
#[derive(Debug, Clone)]
pub struct BattleGameState {
    pub battle_id: String,
    pub kind: BattleKind,
    pub teams: [Team; 2],
    pub phase: BattlePhase,
    pub turn_number: u32,
    pub pending_actions: [Option<BattleAction>; 2],
    /// Sides that must send out a replacement before the turn continues
    pub pending_replacements: [bool; 2],
    /// Set when a wild Pokemon is caught, carried into the outcome
    pub captured: Option<SpeciesId>,
}

impl BattleGameState {
    pub fn new(battle_id: impl Into<String>, kind: BattleKind, teams: [Team; 2]) -> Self {
        Self {
            battle_id: battle_id.into(),
            kind,
            teams,
            phase: BattlePhase::Waiting,
            turn_number: 0,
            pending_actions: [None, None],
            pending_replacements: [false, false],
            captured: None,
        }
    }

    pub fn team(&self, side: usize) -> &Team {
        &self.teams[side]
    }

    pub fn team_mut(&mut self, side: usize) -> &mut Team {
        &mut self.teams[side]
    }

    pub fn opponent_of(&self, side: usize) -> usize {
        1 - side
    }

    pub fn awaiting_replacement(&self) -> bool {
        self.pending_replacements.iter().any(|&p| p)
    }

    pub fn all_actions_submitted(&self) -> bool {
        self.pending_actions.iter().all(|a| a.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases_have_no_exits() {
        for terminal in [
            BattlePhase::Victory,
            BattlePhase::Defeat,
            BattlePhase::Fled,
            BattlePhase::Ended,
            BattlePhase::Interrupted,
        ] {
            assert!(terminal.is_terminal());
            assert!(!terminal.can_transition_to(BattlePhase::Battle));
            assert!(!terminal.can_transition_to(BattlePhase::Interrupted));
        }
    }

    #[test]
    fn capture_is_only_reachable_from_battle() {
        assert!(BattlePhase::Battle.can_transition_to(BattlePhase::Capture));
        assert!(BattlePhase::Capture.can_transition_to(BattlePhase::Battle));
        assert!(!BattlePhase::Intro.can_transition_to(BattlePhase::Capture));
        assert!(!BattlePhase::TeamSelection.can_transition_to(BattlePhase::Capture));
    }

    #[test]
    fn any_live_phase_can_be_interrupted() {
        for phase in [
            BattlePhase::Waiting,
            BattlePhase::Intro,
            BattlePhase::TeamSelection,
            BattlePhase::Battle,
            BattlePhase::Capture,
        ] {
            assert!(phase.can_transition_to(BattlePhase::Interrupted));
        }
    }

    #[test]
    #[should_panic(expected = "must be in 1..=100")]
    fn rng_rejects_out_of_range_test_rolls() {
        TurnRng::new_for_test(vec![50, 0]);
    }

    #[test]
    fn rng_reports_the_reason_on_exhaustion() {
        let mut rng = TurnRng::new_for_test(vec![42]);
        assert_eq!(rng.next_outcome("accuracy check"), 42);
        let result = std::panic::catch_unwind(move || rng.next_outcome("crit check"));
        assert!(result.is_err());
    }
}
