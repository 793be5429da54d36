//! The phase manager: owns one battle's state, validates submissions,
//! orders and resolves turns, and decides terminal conditions.
//!
//! The engine is synchronous; the async session layer in
//! [`crate::battle::session`] drives it and owns timing concerns.

use crate::battle::handlers::{HandlerRegistry, Resolution, ResolveCtx};
use crate::battle::queue::ActionQueue;
use crate::battle::rewards::{self, RewardSummary};
use crate::battle::state::{
    BattleAction, BattleEvent, BattleGameState, BattleOutcome, BattlePhase, EventBus, TurnRng,
};
use crate::battle::switching;
use crate::data::DataRepository;
use crate::errors::{ActionError, EngineError, EngineResult};
use crate::pokemon::StatusCondition;
use crate::team::{Team, TeamSummary};
use std::sync::Arc;

pub struct BattleEngine {
    state: BattleGameState,
    repo: Arc<DataRepository>,
    registry: HandlerRegistry,
    outcome: Option<BattleOutcome>,
    rewards_taken: bool,
}

impl BattleEngine {
    pub fn new(
        battle_id: impl Into<String>,
        kind: schema::BattleKind,
        teams: [Team; 2],
        repo: Arc<DataRepository>,
    ) -> Self {
        Self {
            state: BattleGameState::new(battle_id, kind, teams),
            repo,
            registry: HandlerRegistry::standard(),
            outcome: None,
            rewards_taken: false,
        }
    }

    pub fn state(&self) -> &BattleGameState {
        &self.state
    }

    pub fn phase(&self) -> BattlePhase {
        self.state.phase
    }

    pub fn outcome(&self) -> Option<&BattleOutcome> {
        self.outcome.as_ref()
    }

    pub fn repo(&self) -> &DataRepository {
        &self.repo
    }

    /// Walk the opening phases: `waiting → intro → [team_selection] →
    /// battle`, emitting the introduction events.
    pub fn begin(&mut self) -> EngineResult<Vec<BattleEvent>> {
        if self.state.phase != BattlePhase::Waiting {
            return Err(EngineError::Action(ActionError::WrongPhase(self.state.phase)));
        }
        let mut bus = EventBus::new();

        self.transition(BattlePhase::Intro)?;
        bus.push(BattleEvent::Message {
            text: match self.state.kind {
                schema::BattleKind::Wild => {
                    format!("A wild {} appeared!", self.state.team(1).active().name)
                }
                _ => format!(
                    "{} challenges {}!",
                    self.state.team(1).trainer_name,
                    self.state.team(0).trainer_name
                ),
            },
        });

        if self.state.kind.uses_team_selection() {
            self.transition(BattlePhase::TeamSelection)?;
            // Lead choice defaults to roster order; summaries let clients
            // present the choice before the first turn.
            for side in 0..2 {
                bus.push(BattleEvent::TeamUpdate {
                    side,
                    summary: TeamSummary::of(self.state.team(side)),
                });
            }
        }

        self.transition(BattlePhase::Battle)?;
        for side in 0..2 {
            bus.push(BattleEvent::Message {
                text: format!("Go, {}!", self.state.team(side).active().name),
            });
        }
        Ok(bus.drain())
    }

    /// Validate and park one side's action for the current turn.
    pub fn submit_action(&mut self, side: usize, action: BattleAction) -> EngineResult<()> {
        if self.state.phase.is_terminal() {
            return Err(EngineError::TerminalPhase(self.state.phase));
        }
        if self.state.phase != BattlePhase::Battle {
            return Err(ActionError::WrongPhase(self.state.phase).into());
        }
        if side > 1 {
            return Err(ActionError::Malformed(format!("no side {}", side)).into());
        }
        if self.state.pending_replacements[side] {
            return Err(ActionError::ReplacementRequired(side).into());
        }
        if self.state.awaiting_replacement() {
            // The other side must replace first; nobody acts meanwhile
            return Err(ActionError::NotAwaitingAction(side).into());
        }
        if self.state.pending_actions[side].is_some() {
            return Err(ActionError::AlreadySubmitted(side).into());
        }
        self.validate_action(side, &action)?;
        self.state.pending_actions[side] = Some(action);
        Ok(())
    }

    fn validate_action(&self, side: usize, action: &BattleAction) -> EngineResult<()> {
        match action {
            BattleAction::Attack { move_index }
            | BattleAction::MegaEvolve { move_index }
            | BattleAction::ZMove { move_index } => {
                let active = self.state.team(side).active();
                if active.has_usable_move() && active.move_slot(*move_index).is_none() {
                    return Err(ActionError::InvalidMoveIndex(*move_index).into());
                }
                Ok(())
            }
            BattleAction::Capture { .. } => {
                if !self.state.kind.allows_capture() {
                    return Err(ActionError::CaptureNotAllowed(self.state.kind).into());
                }
                Ok(())
            }
            BattleAction::Switch { team_index } => {
                self.state
                    .team(side)
                    .validate_switch(*team_index, false)
                    .map_err(|e| ActionError::Switch(e).into())
            }
            BattleAction::Item { item: _, target } => {
                match self.state.team(side).member(*target) {
                    Some(p) if !p.is_fainted() => Ok(()),
                    Some(_) => Err(ActionError::Malformed(
                        "items cannot target a fainted Pokemon".to_string(),
                    )
                    .into()),
                    None => {
                        Err(ActionError::Malformed(format!("no team member {}", target)).into())
                    }
                }
            }
            BattleAction::Run => Ok(()),
        }
    }

    pub fn awaiting_action_from(&self, side: usize) -> bool {
        self.state.phase == BattlePhase::Battle
            && !self.state.awaiting_replacement()
            && self.state.pending_actions[side].is_none()
    }

    pub fn ready_to_resolve(&self) -> bool {
        self.state.phase == BattlePhase::Battle
            && !self.state.awaiting_replacement()
            && self.state.all_actions_submitted()
    }

    /// Substitute the default action for a side that failed to submit: the
    /// first usable move, falling back to Struggle.
    pub fn fill_default_action(&mut self, side: usize) {
        if self.state.pending_actions[side].is_some() {
            return;
        }
        let active = self.state.team(side).active();
        let move_index = active
            .moves
            .iter()
            .position(|slot| slot.map(|s| s.pp > 0).unwrap_or(false))
            .unwrap_or(0);
        self.state.pending_actions[side] = Some(BattleAction::Attack { move_index });
    }

    /// Resolve one full turn with the supplied rng oracle. Both actions
    /// must be present (`fill_default_action` covers timeouts).
    pub fn resolve_turn(&mut self, mut rng: TurnRng) -> EngineResult<Vec<BattleEvent>> {
        if self.state.phase.is_terminal() {
            return Err(EngineError::TerminalPhase(self.state.phase));
        }
        if self.state.phase != BattlePhase::Battle {
            return Err(ActionError::WrongPhase(self.state.phase).into());
        }
        if self.state.awaiting_replacement() {
            let side = if self.state.pending_replacements[0] { 0 } else { 1 };
            return Err(ActionError::ReplacementRequired(side).into());
        }
        if !self.state.all_actions_submitted() {
            return Err(EngineError::InconsistentState(
                "turn resolution requires an action from every side".to_string(),
            ));
        }

        let mut bus = EventBus::new();
        self.state.turn_number += 1;
        bus.push(BattleEvent::TurnStarted { turn_number: self.state.turn_number });

        let queue = ActionQueue::build(&self.state, &self.repo);
        self.state.pending_actions = [None, None];

        for queued in queue.into_actions() {
            let mut ctx = ResolveCtx { repo: &self.repo, rng: &mut rng };
            let resolution =
                self.registry
                    .resolve(&mut self.state, queued.side, queued.action, &mut ctx, &mut bus)?;
            if let Resolution::BattleOver(outcome) = resolution {
                self.finish(outcome, &mut bus);
                return Ok(bus.drain());
            }
            if self.check_elimination(&mut bus) {
                return Ok(bus.drain());
            }
        }

        self.apply_end_of_turn(&mut bus);
        if self.check_elimination(&mut bus) {
            return Ok(bus.drain());
        }
        self.request_replacements(&mut bus);

        bus.push(BattleEvent::TurnEnded { turn_number: self.state.turn_number });
        Ok(bus.drain())
    }

    /// Poison and burn ticks in side order, then sleep bookkeeping is
    /// handled per-action; freeze persists until thawed.
    fn apply_end_of_turn(&mut self, bus: &mut EventBus) {
        for side in 0..2 {
            let pokemon = self.state.team_mut(side).active_mut();
            // Flinch only lasts the turn it was inflicted.
            pokemon.remove_volatile(schema::VolatileType::Flinch);
            if pokemon.is_fainted() {
                continue;
            }
            let (status, damage) = match pokemon.status {
                Some(StatusCondition::Poison) => {
                    (schema::StatusType::Poison, (pokemon.max_hp() / 8).max(1))
                }
                Some(StatusCondition::Burn) => {
                    (schema::StatusType::Burn, (pokemon.max_hp() / 16).max(1))
                }
                _ => continue,
            };
            let dealt = pokemon.take_damage(damage);
            let name = pokemon.name.clone();
            bus.push(BattleEvent::StatusDamage {
                side,
                target: name.clone(),
                status,
                damage: dealt,
                remaining_hp: pokemon.current_hp,
                max_hp: pokemon.max_hp(),
            });
            if pokemon.is_fainted() {
                bus.push(BattleEvent::Fainted { side, pokemon: name });
            }
        }
    }

    /// Terminal check: a side with no able Pokemon loses. Returns true
    /// when the battle ended.
    fn check_elimination(&mut self, bus: &mut EventBus) -> bool {
        let side0_out = !self.state.team(0).has_able_pokemon();
        let side1_out = !self.state.team(1).has_able_pokemon();
        let outcome = match (side0_out, side1_out) {
            (true, true) => BattleOutcome::Ended { captured: None },
            (true, false) => BattleOutcome::Defeat,
            (false, true) => BattleOutcome::Victory,
            (false, false) => return false,
        };
        self.finish(outcome, bus);
        true
    }

    /// Flag sides whose active fainted but still have reserves; the turn
    /// loop blocks until replacements arrive.
    fn request_replacements(&mut self, bus: &mut EventBus) {
        for side in 0..2 {
            if self.state.team(side).active().is_fainted()
                && !self.state.pending_replacements[side]
            {
                self.state.pending_replacements[side] = true;
                bus.push(BattleEvent::ReplacementRequired { side });
            }
        }
    }

    /// Forced replacement after a faint. Only legal while the side is
    /// flagged as pending.
    pub fn submit_replacement(
        &mut self,
        side: usize,
        team_index: usize,
    ) -> EngineResult<Vec<BattleEvent>> {
        if self.state.phase.is_terminal() {
            return Err(EngineError::TerminalPhase(self.state.phase));
        }
        if !self.state.pending_replacements.get(side).copied().unwrap_or(false) {
            return Err(ActionError::NotAwaitingAction(side).into());
        }
        let mut bus = EventBus::new();
        switching::perform_replacement(&mut self.state, side, team_index, &mut bus)
            .map_err(ActionError::Switch)?;
        Ok(bus.drain())
    }

    /// Default replacement on timeout: the first able reserve.
    pub fn fill_default_replacement(&mut self, side: usize) -> EngineResult<Vec<BattleEvent>> {
        let Some(target) = self.state.team(side).valid_switch_targets().first().copied() else {
            return Err(EngineError::InconsistentState(format!(
                "side {} owes a replacement but has no able reserve",
                side
            )));
        };
        self.submit_replacement(side, target)
    }

    /// External abort (disconnect). Idempotent on terminal phases.
    pub fn abort(&mut self) -> Vec<BattleEvent> {
        let mut bus = EventBus::new();
        if !self.state.phase.is_terminal() {
            self.finish(BattleOutcome::Interrupted, &mut bus);
        }
        bus.drain()
    }

    fn finish(&mut self, outcome: BattleOutcome, bus: &mut EventBus) {
        self.state.phase = outcome.terminal_phase();
        bus.push(BattleEvent::BattleEnded { outcome: outcome.clone() });
        self.outcome = Some(outcome);
    }

    /// Reward hand-off, produced exactly once after the terminal phase.
    pub fn take_rewards(&mut self) -> EngineResult<Option<RewardSummary>> {
        if self.rewards_taken {
            return Ok(None);
        }
        let Some(outcome) = &self.outcome else {
            return Err(EngineError::Action(ActionError::WrongPhase(self.state.phase)));
        };
        self.rewards_taken = true;
        Ok(Some(rewards::summarize(&self.state, outcome, &self.repo)?))
    }

    /// Post-battle snapshot for the persistence layer.
    pub fn team_summaries(&self) -> [TeamSummary; 2] {
        [TeamSummary::of(self.state.team(0)), TeamSummary::of(self.state.team(1))]
    }

    fn transition(&mut self, next: BattlePhase) -> EngineResult<()> {
        if !self.state.phase.can_transition_to(next) {
            return Err(EngineError::InconsistentState(format!(
                "illegal phase transition {} -> {}",
                self.state.phase, next
            )));
        }
        self.state.phase = next;
        Ok(())
    }
}
