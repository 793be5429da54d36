//! One battle as an async task.
//!
//! The session task owns the engine exclusively; actions arrive over a
//! message channel, turn timeouts substitute default actions so the state
//! machine always makes progress, and an abort message (or every handle
//! dropping) interrupts the battle at its single suspension point.

use crate::battle::broadcast::{BroadcastManager, BroadcastTiming, SequencedEvent};
use crate::battle::engine::BattleEngine;
use crate::battle::rewards::RewardSummary;
use crate::battle::state::{BattleAction, BattleEvent, BattleOutcome, TurnRng};
use crate::battle::trainer::TrainerTeamManager;
use crate::data::DataRepository;
use crate::errors::SessionError;
use crate::team::{Team, TeamSummary};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub battle_id: String,
    pub kind: schema::BattleKind,
    /// How long to wait for each side's submission before substituting
    /// the default action.
    pub turn_timeout: Duration,
    pub timing: BroadcastTiming,
}

impl SessionConfig {
    pub fn new(battle_id: impl Into<String>, kind: schema::BattleKind) -> Self {
        Self {
            battle_id: battle_id.into(),
            kind,
            turn_timeout: Duration::from_secs(30),
            timing: BroadcastTiming::default(),
        }
    }
}

enum SessionMsg {
    Submit {
        side: usize,
        action: BattleAction,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Replacement {
        side: usize,
        team_index: usize,
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    Participate {
        reply: oneshot::Sender<mpsc::UnboundedReceiver<SequencedEvent>>,
    },
    Spectate {
        reply: oneshot::Sender<mpsc::UnboundedReceiver<SequencedEvent>>,
    },
    Abort,
}

/// Cloneable handle for submitting into a running session.
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionMsg>,
}

impl SessionHandle {
    pub async fn submit(&self, side: usize, action: BattleAction) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Submit { side, action, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn submit_replacement(
        &self,
        side: usize,
        team_index: usize,
    ) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Replacement { side, team_index, reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)?
    }

    pub async fn participate(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<SequencedEvent>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Participate { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    pub async fn spectate(
        &self,
    ) -> Result<mpsc::UnboundedReceiver<SequencedEvent>, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Spectate { reply })
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }

    /// Signal an external abort (e.g. disconnect).
    pub async fn abort(&self) {
        let _ = self.tx.send(SessionMsg::Abort).await;
    }
}

/// What the session task resolves to after the terminal phase.
#[derive(Debug)]
pub struct SessionOutcome {
    pub outcome: BattleOutcome,
    pub rewards: Option<RewardSummary>,
    pub team_summaries: [TeamSummary; 2],
}

pub struct BattleSession;

impl BattleSession {
    /// Spawn the session task. An `opponent` manager makes side 1
    /// computer-controlled; otherwise both sides submit via the handle.
    pub fn spawn(
        config: SessionConfig,
        teams: [Team; 2],
        repo: Arc<DataRepository>,
        opponent: Option<TrainerTeamManager>,
    ) -> (SessionHandle, JoinHandle<SessionOutcome>) {
        let (tx, inbox) = mpsc::channel(32);
        let task = tokio::spawn(run_session(config, teams, repo, opponent, inbox));
        (SessionHandle { tx }, task)
    }
}

async fn run_session(
    config: SessionConfig,
    teams: [Team; 2],
    repo: Arc<DataRepository>,
    opponent: Option<TrainerTeamManager>,
    mut inbox: mpsc::Receiver<SessionMsg>,
) -> SessionOutcome {
    let mut engine = BattleEngine::new(config.battle_id.clone(), config.kind, teams, repo);
    let broadcast = BroadcastManager::spawn(config.battle_id.clone(), config.timing.clone());

    info!(battle_id = %config.battle_id, kind = ?config.kind, "battle session started");

    match engine.begin() {
        Ok(events) => broadcast.publish(0, events),
        Err(err) => {
            warn!(battle_id = %config.battle_id, error = %err, "failed to open battle");
            broadcast.publish(0, engine.abort());
        }
    }

    while !engine.phase().is_terminal() {
        if engine.state().awaiting_replacement() {
            run_replacement_round(&config, &mut engine, &broadcast, &opponent, &mut inbox).await;
            continue;
        }
        run_action_round(&config, &mut engine, &broadcast, &opponent, &mut inbox).await;

        if engine.phase().is_terminal() {
            break;
        }
        let turn = engine.state().turn_number + 1;
        match engine.resolve_turn(TurnRng::new_random()) {
            Ok(events) => broadcast.publish(turn, events),
            Err(err) => {
                warn!(battle_id = %config.battle_id, error = %err, "turn resolution failed");
                broadcast.publish(turn, engine.abort());
            }
        }
    }

    let outcome = engine
        .outcome()
        .cloned()
        .unwrap_or(BattleOutcome::Interrupted);
    let mut rewards = engine.take_rewards().ok().flatten();
    if let Some(manager) = &opponent {
        let turn = engine.state().turn_number;
        if let Some(line) = manager.end_line(&outcome) {
            broadcast.publish(turn, vec![BattleEvent::Message { text: line.to_string() }]);
        }
        if let (Some(summary), Some(money)) = (rewards.as_mut(), manager.reward_money()) {
            if outcome == BattleOutcome::Victory {
                summary.money_reward = money;
            }
        }
    }
    let team_summaries = engine.team_summaries();
    info!(battle_id = %config.battle_id, outcome = ?outcome, "battle session finished");

    broadcast.shutdown().await;
    SessionOutcome { outcome, rewards, team_summaries }
}

/// Collect the turn's actions: the AI side submits immediately, human
/// sides get until the deadline, after which defaults fill the gaps.
async fn run_action_round(
    config: &SessionConfig,
    engine: &mut BattleEngine,
    broadcast: &BroadcastManager,
    opponent: &Option<TrainerTeamManager>,
    inbox: &mut mpsc::Receiver<SessionMsg>,
) {
    if let Some(manager) = opponent {
        if engine.awaiting_action_from(1) {
            let action = {
                let mut rng = TurnRng::new_random();
                manager.decide(1, engine.state(), engine.repo(), &mut rng)
            };
            if engine.submit_action(1, action).is_err() {
                engine.fill_default_action(1);
            }
        }
    }

    let deadline = Instant::now() + config.turn_timeout;
    while !engine.ready_to_resolve() && !engine.phase().is_terminal() {
        match timeout_at(deadline, inbox.recv()).await {
            Ok(Some(msg)) => {
                if handle_msg(msg, engine, broadcast) {
                    return;
                }
            }
            Ok(None) => {
                // Every handle dropped; nobody can ever act again.
                broadcast.publish(engine.state().turn_number, engine.abort());
                return;
            }
            Err(_) => {
                for side in 0..2 {
                    if engine.awaiting_action_from(side) {
                        engine.fill_default_action(side);
                    }
                }
            }
        }
    }
}

/// Block the turn loop until every owed replacement is in, substituting
/// the first able reserve on timeout.
async fn run_replacement_round(
    config: &SessionConfig,
    engine: &mut BattleEngine,
    broadcast: &BroadcastManager,
    opponent: &Option<TrainerTeamManager>,
    inbox: &mut mpsc::Receiver<SessionMsg>,
) {
    if let Some(manager) = opponent {
        if engine.state().pending_replacements[1] {
            if let Some(choice) = manager.choose_replacement(1, engine.state()) {
                match engine.submit_replacement(1, choice) {
                    Ok(events) => broadcast.publish(engine.state().turn_number, events),
                    Err(err) => {
                        warn!(battle_id = %config.battle_id, error = %err, "ai replacement failed");
                    }
                }
            }
        }
    }

    let deadline = Instant::now() + config.turn_timeout;
    while engine.state().awaiting_replacement() && !engine.phase().is_terminal() {
        match timeout_at(deadline, inbox.recv()).await {
            Ok(Some(msg)) => {
                if handle_msg(msg, engine, broadcast) {
                    return;
                }
            }
            Ok(None) => {
                broadcast.publish(engine.state().turn_number, engine.abort());
                return;
            }
            Err(_) => {
                for side in 0..2 {
                    if engine.state().pending_replacements[side] {
                        match engine.fill_default_replacement(side) {
                            Ok(events) => {
                                broadcast.publish(engine.state().turn_number, events)
                            }
                            Err(err) => {
                                warn!(battle_id = %config.battle_id, error = %err, "no default replacement");
                                broadcast
                                    .publish(engine.state().turn_number, engine.abort());
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Apply one inbox message. Returns true when the session must stop.
fn handle_msg(msg: SessionMsg, engine: &mut BattleEngine, broadcast: &BroadcastManager) -> bool {
    match msg {
        SessionMsg::Submit { side, action, reply } => {
            let result = engine
                .submit_action(side, action)
                .map_err(SessionError::Engine);
            let _ = reply.send(result);
            false
        }
        SessionMsg::Replacement { side, team_index, reply } => {
            match engine.submit_replacement(side, team_index) {
                Ok(events) => {
                    broadcast.publish(engine.state().turn_number, events);
                    let _ = reply.send(Ok(()));
                }
                Err(err) => {
                    let _ = reply.send(Err(SessionError::Engine(err)));
                }
            }
            false
        }
        SessionMsg::Participate { reply } => {
            let _ = reply.send(broadcast.subscribe_participant());
            false
        }
        SessionMsg::Spectate { reply } => {
            let _ = reply.send(broadcast.subscribe_spectator());
            false
        }
        SessionMsg::Abort => {
            broadcast.publish(engine.state().turn_number, engine.abort());
            true
        }
    }
}
