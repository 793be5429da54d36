use crate::battle::broadcast::BroadcastTiming;
use crate::battle::session::{BattleSession, SessionConfig};
use crate::battle::state::{BattleAction, BattleEvent, BattleOutcome};
use crate::battle::tests::common::TestPokemonBuilder;
use crate::battle::trainer::{TrainerData, TrainerTeamManager};
use crate::data::{move_ids, species_ids, DataRepository};
use crate::team::Team;
use schema::{AiProfile, BattleKind};
use std::sync::Arc;
use std::time::Duration;

fn fast_config(battle_id: &str, kind: BattleKind, timeout: Duration) -> SessionConfig {
    let mut config = SessionConfig::new(battle_id, kind);
    config.turn_timeout = timeout;
    config.timing = BroadcastTiming::instant();
    config
}

fn one_on_one(repo: &DataRepository) -> [Team; 2] {
    let player = TestPokemonBuilder::new(species_ids::PIKACHU, 30)
        .with_moves(vec![move_ids::THUNDER_SHOCK, move_ids::QUICK_ATTACK])
        .build(repo);
    let wild = TestPokemonBuilder::new(species_ids::PIDGEY, 5).with_hp(1).build(repo);
    [
        Team::new("Red", vec![player]).unwrap(),
        Team::new("Wild", vec![wild]).unwrap(),
    ]
}

#[tokio::test]
async fn session_runs_a_wild_battle_to_victory() {
    let repo = Arc::new(DataRepository::demo());
    let (handle, task) = BattleSession::spawn(
        fast_config("wild-1", BattleKind::Wild, Duration::from_secs(5)),
        one_on_one(&repo),
        Arc::clone(&repo),
        Some(TrainerTeamManager::new(AiProfile::Random)),
    );
    let mut events = handle.participate().await.unwrap();

    handle.submit(0, BattleAction::Attack { move_index: 0 }).await.unwrap();

    let outcome = task.await.unwrap();
    assert_eq!(outcome.outcome, BattleOutcome::Victory);
    let rewards = outcome.rewards.expect("victory produces a reward hand-off");
    assert_eq!(rewards.experience_candidates.len(), 1);

    // The stream ends with the battle-end envelope, in sequence order.
    let mut sequences = Vec::new();
    let mut last = None;
    while let Some(envelope) = events.recv().await {
        sequences.push(envelope.sequence);
        last = Some(envelope.event);
    }
    assert!(sequences.windows(2).all(|w| w[0] < w[1]));
    assert!(matches!(last, Some(BattleEvent::BattleEnded { .. })));
}

#[tokio::test]
async fn abort_interrupts_a_battle_waiting_for_actions() {
    let repo = Arc::new(DataRepository::demo());
    let player_a = TestPokemonBuilder::new(species_ids::PIKACHU, 30).build(&repo);
    let player_b = TestPokemonBuilder::new(species_ids::SQUIRTLE, 30).build(&repo);
    let (handle, task) = BattleSession::spawn(
        fast_config("pvp-abort", BattleKind::Trainer, Duration::from_secs(60)),
        [
            Team::new("A", vec![player_a]).unwrap(),
            Team::new("B", vec![player_b]).unwrap(),
        ],
        Arc::clone(&repo),
        None,
    );
    let mut events = handle.participate().await.unwrap();

    handle.abort().await;
    let outcome = task.await.unwrap();
    assert_eq!(outcome.outcome, BattleOutcome::Interrupted);

    let mut saw_interrupted_end = false;
    while let Some(envelope) = events.recv().await {
        if matches!(
            envelope.event,
            BattleEvent::BattleEnded { outcome: BattleOutcome::Interrupted }
        ) {
            saw_interrupted_end = true;
        }
    }
    assert!(saw_interrupted_end);
}

#[tokio::test]
async fn silent_side_times_out_and_the_battle_still_progresses() {
    let repo = Arc::new(DataRepository::demo());
    let (handle, task) = BattleSession::spawn(
        fast_config("timeout-1", BattleKind::Wild, Duration::from_millis(50)),
        one_on_one(&repo),
        Arc::clone(&repo),
        Some(TrainerTeamManager::new(AiProfile::Random)),
    );
    let mut events = handle.participate().await.unwrap();

    // Side 0 never submits; the timeout substitutes its default attack,
    // which one-shots the 1-HP wild target.
    let outcome = task.await.unwrap();
    assert_eq!(outcome.outcome, BattleOutcome::Victory);

    let mut saw_player_move = false;
    while let Some(envelope) = events.recv().await {
        if matches!(envelope.event, BattleEvent::MoveUsed { side: 0, .. }) {
            saw_player_move = true;
        }
    }
    assert!(saw_player_move);
}

#[tokio::test]
async fn spectators_see_percentages_instead_of_exact_hp() {
    let repo = Arc::new(DataRepository::demo());
    let player = TestPokemonBuilder::new(species_ids::PIKACHU, 30)
        .with_moves(vec![move_ids::THUNDER_SHOCK])
        .build(&repo);
    let wild = TestPokemonBuilder::new(species_ids::GEODUDE, 30).build(&repo);
    let (handle, task) = BattleSession::spawn(
        fast_config("spectate-1", BattleKind::Wild, Duration::from_secs(5)),
        [
            Team::new("Red", vec![player]).unwrap(),
            Team::new("Wild", vec![wild]).unwrap(),
        ],
        Arc::clone(&repo),
        Some(TrainerTeamManager::new(AiProfile::Random)),
    );
    let mut spectator = handle.spectate().await.unwrap();

    handle.submit(0, BattleAction::Attack { move_index: 0 }).await.unwrap();
    // One turn is enough; Thunder Shock cannot hurt a Ground type, but
    // the wild side's tackle lands real damage on the player.
    tokio::time::sleep(Duration::from_millis(100)).await;
    handle.abort().await;
    task.await.unwrap();

    let mut saw_redacted_damage = false;
    while let Some(envelope) = spectator.recv().await {
        if let BattleEvent::DamageDealt { damage, max_hp, remaining_hp, .. } = envelope.event {
            assert_eq!(damage, 0);
            assert_eq!(max_hp, 100);
            assert!(remaining_hp <= 100);
            saw_redacted_damage = true;
        }
    }
    assert!(saw_redacted_damage);
}

#[tokio::test]
async fn beaten_trainer_pays_out_and_speaks_their_line() {
    let repo = Arc::new(DataRepository::demo());
    let player = TestPokemonBuilder::new(species_ids::PIKACHU, 30)
        .with_moves(vec![move_ids::THUNDER_SHOCK])
        .build(&repo);
    let rattata = TestPokemonBuilder::new(species_ids::RATTATA, 10).with_hp(1).build(&repo);
    let data = TrainerData {
        name: "Youngster Joey".to_string(),
        profile: AiProfile::Random,
        roster: vec![],
        reward_money: Some(999),
        victory_line: None,
        defeat_line: Some("My Rattata is in the top percentage!".to_string()),
        level_cap: None,
    };
    let (handle, task) = BattleSession::spawn(
        fast_config("trainer-1", BattleKind::Trainer, Duration::from_secs(5)),
        [
            Team::new("Red", vec![player]).unwrap(),
            Team::new("Youngster Joey", vec![rattata]).unwrap(),
        ],
        Arc::clone(&repo),
        Some(TrainerTeamManager::from_data(data)),
    );
    let mut events = handle.participate().await.unwrap();

    handle.submit(0, BattleAction::Attack { move_index: 0 }).await.unwrap();

    let outcome = task.await.unwrap();
    assert_eq!(outcome.outcome, BattleOutcome::Victory);
    let rewards = outcome.rewards.expect("victory produces a reward hand-off");
    assert_eq!(rewards.money_reward, 999);

    let mut saw_defeat_line = false;
    while let Some(envelope) = events.recv().await {
        if matches!(
            &envelope.event,
            BattleEvent::Message { text } if text.contains("top percentage")
        ) {
            saw_defeat_line = true;
        }
    }
    assert!(saw_defeat_line);
}
