//! Scripted wild-battle demo: a player team against a wild Pidgey, with
//! the event stream narrated to stdout as it is delivered.

use pokemon_battle_engine::battle::trainer::TrainerTeamManager;
use pokemon_battle_engine::data::{move_ids, species_ids, DataRepository};
use pokemon_battle_engine::{
    AiProfile, BallKind, BattleAction, BattleKind, BattleSession, BroadcastTiming, SessionConfig,
    StoredPokemon, Team,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let repo = Arc::new(DataRepository::demo());

    let player = Team::from_stored(
        &repo,
        "Red",
        &[
            StoredPokemon::new(
                species_ids::PIKACHU,
                18,
                vec![move_ids::THUNDER_SHOCK, move_ids::QUICK_ATTACK, move_ids::THUNDER_WAVE],
            ),
            StoredPokemon::new(
                species_ids::SQUIRTLE,
                16,
                vec![move_ids::WATER_GUN, move_ids::TACKLE],
            ),
        ],
    )?;
    let wild = Team::from_stored(
        &repo,
        "Wild",
        &[StoredPokemon::new(species_ids::PIDGEY, 14, vec![move_ids::TACKLE, move_ids::GROWL])],
    )?;

    let mut config = SessionConfig::new("demo-wild-battle", BattleKind::Wild);
    config.turn_timeout = Duration::from_secs(30);
    config.timing = BroadcastTiming::default();

    let (handle, task) = BattleSession::spawn(
        config,
        [player, wild],
        Arc::clone(&repo),
        Some(TrainerTeamManager::new(AiProfile::Random)),
    );

    let mut events = handle.participate().await?;
    let narrator = tokio::spawn(async move {
        while let Some(envelope) = events.recv().await {
            if let Some(line) = envelope.event.format() {
                println!("[{:>3}] {}", envelope.sequence, line);
            }
        }
    });

    // Soften the target, paralyze it, then throw balls until it sticks.
    let script = [
        BattleAction::Attack { move_index: 1 },
        BattleAction::Attack { move_index: 2 },
        BattleAction::Capture { ball: BallKind::Great },
        BattleAction::Capture { ball: BallKind::Great },
        BattleAction::Capture { ball: BallKind::Ultra },
    ];
    for action in script {
        if handle.submit(0, action).await.is_err() {
            break;
        }
        // Let the turn resolve and its events play out.
        tokio::time::sleep(Duration::from_secs(3)).await;
    }
    handle.abort().await;

    let outcome = task.await?;
    narrator.await?;
    println!();
    println!("Outcome: {:?}", outcome.outcome);
    if let Some(rewards) = outcome.rewards {
        println!("Rewards: {:?}", rewards);
    }
    Ok(())
}
