use crate::battle::state::{BattleAction, BattleEvent, BattleOutcome, BattlePhase, TurnRng};
use crate::battle::tests::common::{engine_in_battle, TestPokemonBuilder};
use crate::data::{move_ids, species_ids, DataRepository};
use crate::errors::{ActionError, EngineError};
use crate::pokemon::StatusCondition;
use pretty_assertions::assert_eq;
use schema::BattleKind;

fn kind_of(event: &BattleEvent) -> &'static str {
    match event {
        BattleEvent::DamageDealt { .. } => "damage",
        BattleEvent::Fainted { .. } => "faint",
        BattleEvent::BattleEnded { .. } => "battle_end",
        _ => "other",
    }
}

#[test]
fn lethal_hit_emits_damage_faint_battle_end_in_order() {
    let repo = DataRepository::demo();
    let attacker = TestPokemonBuilder::new(species_ids::PIKACHU, 50)
        .with_moves(vec![move_ids::THUNDER_SHOCK])
        .build(&repo);
    let victim = TestPokemonBuilder::new(species_ids::PIDGEY, 10).with_hp(1).build(&repo);

    let mut engine = engine_in_battle(BattleKind::Wild, vec![attacker], vec![victim]);
    engine.submit_action(0, BattleAction::Attack { move_index: 0 }).unwrap();
    engine.submit_action(1, BattleAction::Attack { move_index: 0 }).unwrap();

    // accuracy, crit, variance for side 0 only; side 1 never gets to act.
    let events =
        engine.resolve_turn(TurnRng::new_for_test(vec![50, 90, 8, 100, 100])).unwrap();

    let trace: Vec<&str> =
        events.iter().map(kind_of).filter(|k| *k != "other").collect();
    assert_eq!(trace, vec!["damage", "faint", "battle_end"]);
    assert_eq!(engine.phase(), BattlePhase::Victory);
    assert_eq!(engine.outcome(), Some(&BattleOutcome::Victory));

    // Reward hand-off is produced exactly once.
    let rewards = engine.take_rewards().unwrap().unwrap();
    assert_eq!(rewards.outcome, BattleOutcome::Victory);
    assert_eq!(rewards.experience_candidates.len(), 1);
    assert!(engine.take_rewards().unwrap().is_none());
}

#[test]
fn replaying_the_same_inputs_yields_an_identical_event_sequence() {
    let repo = DataRepository::demo();
    let run = || {
        let attacker = TestPokemonBuilder::new(species_ids::CHARMANDER, 30)
            .with_moves(vec![move_ids::EMBER])
            .build(&repo);
        let defender = TestPokemonBuilder::new(species_ids::BULBASAUR, 30)
            .with_moves(vec![move_ids::VINE_WHIP])
            .build(&repo);
        let mut engine =
            engine_in_battle(BattleKind::Trainer, vec![attacker], vec![defender]);
        engine.submit_action(0, BattleAction::Attack { move_index: 0 }).unwrap();
        engine.submit_action(1, BattleAction::Attack { move_index: 0 }).unwrap();
        engine
            .resolve_turn(TurnRng::new_for_test(vec![50, 90, 8, 95, 40, 90, 8]))
            .unwrap()
    };
    assert_eq!(run(), run());
}

#[test]
fn poison_and_burn_tick_at_end_of_turn_in_side_order() {
    let repo = DataRepository::demo();
    let poisoned = TestPokemonBuilder::new(species_ids::SQUIRTLE, 40)
        .with_moves(vec![move_ids::TAIL_WHIP])
        .with_status(StatusCondition::Poison)
        .build(&repo);
    let burned = TestPokemonBuilder::new(species_ids::BULBASAUR, 40)
        .with_moves(vec![move_ids::GROWL])
        .with_status(StatusCondition::Burn)
        .build(&repo);
    let poisoned_max = poisoned.max_hp();
    let burned_max = burned.max_hp();

    let mut engine = engine_in_battle(BattleKind::Trainer, vec![poisoned], vec![burned]);
    engine.submit_action(0, BattleAction::Attack { move_index: 0 }).unwrap();
    engine.submit_action(1, BattleAction::Attack { move_index: 0 }).unwrap();
    let events = engine
        .resolve_turn(TurnRng::new_for_test(vec![50, 100, 50, 100]))
        .unwrap();

    let ticks: Vec<(usize, u16)> = events
        .iter()
        .filter_map(|e| match e {
            BattleEvent::StatusDamage { side, damage, .. } => Some((*side, *damage)),
            _ => None,
        })
        .collect();
    assert_eq!(
        ticks,
        vec![(0, poisoned_max / 8), (1, burned_max / 16)]
    );
}

#[test]
fn faint_with_reserves_blocks_the_next_turn_until_replacement() {
    let repo = DataRepository::demo();
    let attacker = TestPokemonBuilder::new(species_ids::PIKACHU, 50)
        .with_moves(vec![move_ids::THUNDER_SHOCK])
        .build(&repo);
    let lead = TestPokemonBuilder::new(species_ids::PIDGEY, 10).with_hp(1).build(&repo);
    let reserve = TestPokemonBuilder::new(species_ids::RATTATA, 10).build(&repo);

    let mut engine =
        engine_in_battle(BattleKind::Trainer, vec![attacker], vec![lead, reserve]);
    engine.submit_action(0, BattleAction::Attack { move_index: 0 }).unwrap();
    engine.submit_action(1, BattleAction::Attack { move_index: 0 }).unwrap();
    let events =
        engine.resolve_turn(TurnRng::new_for_test(vec![50, 90, 8, 100, 100])).unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, BattleEvent::ReplacementRequired { side: 1 })));
    assert_eq!(engine.phase(), BattlePhase::Battle);

    // Nobody may act while the replacement is owed.
    assert!(matches!(
        engine.submit_action(0, BattleAction::Attack { move_index: 0 }),
        Err(EngineError::Action(ActionError::NotAwaitingAction(0)))
    ));
    assert!(matches!(
        engine.submit_action(1, BattleAction::Attack { move_index: 0 }),
        Err(EngineError::Action(ActionError::ReplacementRequired(1)))
    ));

    let events = engine.submit_replacement(1, 1).unwrap();
    assert!(events.iter().any(|e| matches!(e, BattleEvent::Switched { side: 1, .. })));
    assert!(engine.submit_action(1, BattleAction::Attack { move_index: 0 }).is_ok());
}

#[test]
fn capture_is_rejected_outside_wild_battles() {
    let repo = DataRepository::demo();
    let a = TestPokemonBuilder::new(species_ids::PIKACHU, 20).build(&repo);
    let b = TestPokemonBuilder::new(species_ids::RATTATA, 20).build(&repo);
    let mut engine = engine_in_battle(BattleKind::Trainer, vec![a], vec![b]);
    let result =
        engine.submit_action(0, BattleAction::Capture { ball: schema::BallKind::Poke });
    assert!(matches!(
        result,
        Err(EngineError::Action(ActionError::CaptureNotAllowed(BattleKind::Trainer)))
    ));
}

#[test]
fn duplicate_submission_is_rejected() {
    let repo = DataRepository::demo();
    let a = TestPokemonBuilder::new(species_ids::PIKACHU, 20).build(&repo);
    let b = TestPokemonBuilder::new(species_ids::RATTATA, 20).build(&repo);
    let mut engine = engine_in_battle(BattleKind::Wild, vec![a], vec![b]);
    engine.submit_action(0, BattleAction::Attack { move_index: 0 }).unwrap();
    assert!(matches!(
        engine.submit_action(0, BattleAction::Run),
        Err(EngineError::Action(ActionError::AlreadySubmitted(0)))
    ));
}

#[test]
fn terminal_phase_rejects_everything() {
    let repo = DataRepository::demo();
    let a = TestPokemonBuilder::new(species_ids::PIKACHU, 20).build(&repo);
    let b = TestPokemonBuilder::new(species_ids::RATTATA, 20).build(&repo);
    let mut engine = engine_in_battle(BattleKind::Wild, vec![a], vec![b]);
    let events = engine.abort();
    assert!(events
        .iter()
        .any(|e| matches!(e, BattleEvent::BattleEnded { outcome: BattleOutcome::Interrupted })));
    assert_eq!(engine.phase(), BattlePhase::Interrupted);
    assert!(matches!(
        engine.submit_action(0, BattleAction::Run),
        Err(EngineError::TerminalPhase(BattlePhase::Interrupted))
    ));
    assert!(matches!(
        engine.resolve_turn(TurnRng::new_for_test(vec![])),
        Err(EngineError::TerminalPhase(BattlePhase::Interrupted))
    ));
}

#[test]
fn timed_out_side_gets_the_default_action() {
    let repo = DataRepository::demo();
    let a = TestPokemonBuilder::new(species_ids::PIKACHU, 20)
        .with_moves(vec![move_ids::THUNDER_SHOCK])
        .build(&repo);
    let b = TestPokemonBuilder::new(species_ids::RATTATA, 20).build(&repo);
    let mut engine = engine_in_battle(BattleKind::Wild, vec![a], vec![b]);
    engine.submit_action(0, BattleAction::Attack { move_index: 0 }).unwrap();
    assert!(!engine.ready_to_resolve());
    engine.fill_default_action(1);
    assert!(engine.ready_to_resolve());
    let events = engine
        .resolve_turn(TurnRng::new_for_test(vec![50; 12]))
        .unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, BattleEvent::MoveUsed { side: 1, .. })));
}

#[test]
fn critical_capture_shows_a_single_shake() {
    let repo = DataRepository::demo();
    let player = TestPokemonBuilder::new(species_ids::PIKACHU, 30)
        .with_moves(vec![move_ids::THUNDER_SHOCK])
        .build(&repo);
    let wild = TestPokemonBuilder::new(species_ids::PIDGEY, 5)
        .with_hp(1)
        .with_status(StatusCondition::Sleep(2))
        .build(&repo);

    let mut engine = engine_in_battle(BattleKind::Wild, vec![player], vec![wild]);
    engine
        .submit_action(0, BattleAction::Capture { ball: schema::BallKind::Ultra })
        .unwrap();
    engine.submit_action(1, BattleAction::Attack { move_index: 0 }).unwrap();

    // Capture probability is maxed out, so the critical check (10 <= 25)
    // fires and the single critical shake (50 <= 100) holds.
    let events = engine.resolve_turn(TurnRng::new_for_test(vec![10, 50])).unwrap();

    let shakes = events
        .iter()
        .filter(|e| matches!(e, BattleEvent::CaptureShake { .. }))
        .count();
    assert_eq!(shakes, 1);
    assert!(events.iter().any(|e| matches!(
        e,
        BattleEvent::CaptureSucceeded { critical: true, .. }
    )));
    assert_eq!(
        engine.outcome(),
        Some(&BattleOutcome::Ended { captured: Some(species_ids::PIDGEY) })
    );
}
