//! Timed, sequence-numbered event delivery to participants and spectators.
//!
//! A detached dispatcher task owns the subscriber lists and the sequence
//! counter; the engine side only pushes control messages onto an unbounded
//! channel, so publishing never blocks turn resolution. Inter-event delays
//! give client animations time to play. Spectators receive the same
//! stream with exact HP values redacted to percentages at the point of
//! emission.

use crate::battle::state::{BattleEvent, BattleEventKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

/// One delivered envelope. Consumers apply events in `sequence` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencedEvent {
    pub sequence: u64,
    pub turn: u32,
    pub event: BattleEvent,
}

/// Per-kind inter-event delays.
#[derive(Debug, Clone)]
pub struct BroadcastTiming {
    delays: HashMap<BattleEventKind, Duration>,
    default: Duration,
}

impl Default for BroadcastTiming {
    fn default() -> Self {
        let mut delays = HashMap::new();
        delays.insert(BattleEventKind::Message, Duration::from_millis(300));
        delays.insert(BattleEventKind::Animation, Duration::from_millis(500));
        delays.insert(BattleEventKind::Damage, Duration::from_millis(400));
        delays.insert(BattleEventKind::Heal, Duration::from_millis(400));
        delays.insert(BattleEventKind::Status, Duration::from_millis(350));
        delays.insert(BattleEventKind::StatChange, Duration::from_millis(350));
        delays.insert(BattleEventKind::Faint, Duration::from_millis(800));
        delays.insert(BattleEventKind::Switch, Duration::from_millis(600));
        delays.insert(BattleEventKind::Capture, Duration::from_millis(900));
        delays.insert(BattleEventKind::UiUpdate, Duration::ZERO);
        delays.insert(BattleEventKind::TurnChange, Duration::from_millis(100));
        delays.insert(BattleEventKind::BattleEnd, Duration::from_millis(500));
        delays.insert(BattleEventKind::Rejection, Duration::ZERO);
        Self { delays, default: Duration::from_millis(250) }
    }
}

impl BroadcastTiming {
    /// Zero delay everywhere. Used by tests and headless simulations.
    pub fn instant() -> Self {
        Self { delays: HashMap::new(), default: Duration::ZERO }
    }

    pub fn delay_for(&self, kind: BattleEventKind) -> Duration {
        self.delays.get(&kind).copied().unwrap_or(self.default)
    }
}

enum ControlMsg {
    AddParticipant(mpsc::UnboundedSender<SequencedEvent>),
    AddSpectator(mpsc::UnboundedSender<SequencedEvent>),
    Publish { turn: u32, events: Vec<BattleEvent> },
    Shutdown,
}

/// Handle to the dispatcher task for one battle.
pub struct BroadcastManager {
    control: mpsc::UnboundedSender<ControlMsg>,
    task: Option<JoinHandle<()>>,
}

impl BroadcastManager {
    pub fn spawn(battle_id: String, timing: BroadcastTiming) -> Self {
        let (control, inbox) = mpsc::unbounded_channel();
        let task = tokio::spawn(dispatch_loop(battle_id, timing, inbox));
        Self { control, task: Some(task) }
    }

    pub fn subscribe_participant(&self) -> mpsc::UnboundedReceiver<SequencedEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.control.send(ControlMsg::AddParticipant(tx));
        rx
    }

    pub fn subscribe_spectator(&self) -> mpsc::UnboundedReceiver<SequencedEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        let _ = self.control.send(ControlMsg::AddSpectator(tx));
        rx
    }

    /// Fire-and-forget: queues the batch for timed delivery and returns
    /// immediately.
    pub fn publish(&self, turn: u32, events: Vec<BattleEvent>) {
        if events.is_empty() {
            return;
        }
        let _ = self.control.send(ControlMsg::Publish { turn, events });
    }

    /// Flush pending deliveries and stop the dispatcher.
    pub async fn shutdown(mut self) {
        let _ = self.control.send(ControlMsg::Shutdown);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

async fn dispatch_loop(
    battle_id: String,
    timing: BroadcastTiming,
    mut inbox: mpsc::UnboundedReceiver<ControlMsg>,
) {
    let mut participants: Vec<mpsc::UnboundedSender<SequencedEvent>> = Vec::new();
    let mut spectators: Vec<mpsc::UnboundedSender<SequencedEvent>> = Vec::new();
    let mut sequence: u64 = 0;

    while let Some(msg) = inbox.recv().await {
        match msg {
            ControlMsg::AddParticipant(tx) => participants.push(tx),
            ControlMsg::AddSpectator(tx) => spectators.push(tx),
            ControlMsg::Publish { turn, events } => {
                for event in events {
                    let delay = timing.delay_for(event.kind());
                    sequence += 1;
                    let envelope = SequencedEvent { sequence, turn, event };
                    let redacted = redact_for_spectators(&envelope.event).map(|event| {
                        SequencedEvent { sequence: envelope.sequence, turn: envelope.turn, event }
                    });
                    deliver(&battle_id, &mut participants, envelope, "participant");
                    if let Some(redacted) = redacted {
                        deliver(&battle_id, &mut spectators, redacted, "spectator");
                    }
                    if delay > Duration::ZERO {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
            ControlMsg::Shutdown => break,
        }
    }
}

/// Send to every subscriber, dropping the ones whose receiver is gone.
/// A failed delivery never blocks the state machine.
fn deliver(
    battle_id: &str,
    subscribers: &mut Vec<mpsc::UnboundedSender<SequencedEvent>>,
    envelope: SequencedEvent,
    role: &str,
) {
    subscribers.retain(|tx| match tx.send(envelope.clone()) {
        Ok(()) => true,
        Err(_) => {
            warn!(battle_id, role, sequence = envelope.sequence, "dropping disconnected observer");
            false
        }
    });
}

/// Spectator view of an event: exact HP numbers become percentages and
/// full team rosters are withheld (`None` drops the event).
pub fn redact_for_spectators(event: &BattleEvent) -> Option<BattleEvent> {
    fn percent(current: u16, max: u16) -> u16 {
        if current == 0 {
            return 0;
        }
        ((current as u32 * 100).div_ceil(max.max(1) as u32)).min(100) as u16
    }

    Some(match event {
        BattleEvent::TeamUpdate { .. } => return None,
        BattleEvent::DamageDealt { side, target, damage: _, remaining_hp, max_hp } => {
            BattleEvent::DamageDealt {
                side: *side,
                target: target.clone(),
                damage: 0,
                remaining_hp: percent(*remaining_hp, *max_hp),
                max_hp: 100,
            }
        }
        BattleEvent::Healed { side, target, amount: _, new_hp, max_hp } => BattleEvent::Healed {
            side: *side,
            target: target.clone(),
            amount: 0,
            new_hp: percent(*new_hp, *max_hp),
            max_hp: 100,
        },
        BattleEvent::StatusDamage { side, target, status, damage: _, remaining_hp, max_hp } => {
            BattleEvent::StatusDamage {
                side: *side,
                target: target.clone(),
                status: *status,
                damage: 0,
                remaining_hp: percent(*remaining_hp, *max_hp),
                max_hp: 100,
            }
        }
        other => other.clone(),
    })
}
