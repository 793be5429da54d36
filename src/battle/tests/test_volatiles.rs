use crate::battle::state::{BattleAction, BattleEvent, TurnRng};
use crate::battle::tests::common::{engine_in_battle, TestPokemonBuilder};
use crate::data::{move_ids, species_ids, DataRepository};
use pretty_assertions::assert_eq;
use schema::{BattleKind, ItemKind, VolatileType};

fn message_containing(events: &[BattleEvent], needle: &str) -> bool {
    events.iter().any(|e| {
        matches!(e, BattleEvent::Message { text } if text.contains(needle))
    })
}

fn moves_used_by(events: &[BattleEvent], wanted: usize) -> usize {
    events
        .iter()
        .filter(|e| matches!(e, BattleEvent::MoveUsed { side, .. } if *side == wanted))
        .count()
}

#[test]
fn flinch_costs_the_slower_side_its_turn() {
    let repo = DataRepository::demo();
    let biter = TestPokemonBuilder::new(species_ids::PIKACHU, 20)
        .with_moves(vec![move_ids::BITE])
        .build(&repo);
    let victim = TestPokemonBuilder::new(species_ids::SQUIRTLE, 20)
        .with_moves(vec![move_ids::TACKLE])
        .build(&repo);

    let mut engine = engine_in_battle(BattleKind::Trainer, vec![biter], vec![victim]);
    engine.submit_action(0, BattleAction::Attack { move_index: 0 }).unwrap();
    engine.submit_action(1, BattleAction::Attack { move_index: 0 }).unwrap();

    // accuracy, crit, variance, then the flinch chance for Bite; the
    // flinched side consumes nothing.
    let events = engine.resolve_turn(TurnRng::new_for_test(vec![50, 90, 8, 5])).unwrap();

    assert!(events.iter().any(|e| matches!(
        e,
        BattleEvent::VolatileApplied { condition: VolatileType::Flinch, .. }
    )));
    assert!(message_containing(&events, "flinched"));
    assert_eq!(moves_used_by(&events, 0), 1);
    assert_eq!(moves_used_by(&events, 1), 0);
    assert!(!engine.state().team(1).active().has_volatile(VolatileType::Flinch));
}

#[test]
fn flinch_landed_after_acting_clears_at_end_of_turn() {
    let repo = DataRepository::demo();
    // The slower side carries Bite; the faster side spends its turn on an
    // item, which resolves first, so the flinch lands on a side that has
    // already acted.
    let biter = TestPokemonBuilder::new(species_ids::SQUIRTLE, 20)
        .with_moves(vec![move_ids::BITE])
        .build(&repo);
    let victim = TestPokemonBuilder::new(species_ids::PIKACHU, 20)
        .with_moves(vec![move_ids::TACKLE])
        .build(&repo);

    let mut engine = engine_in_battle(BattleKind::Trainer, vec![biter], vec![victim]);
    engine.submit_action(0, BattleAction::Attack { move_index: 0 }).unwrap();
    engine
        .submit_action(1, BattleAction::Item { item: ItemKind::Potion, target: 0 })
        .unwrap();

    let events = engine.resolve_turn(TurnRng::new_for_test(vec![50, 90, 8, 5])).unwrap();

    assert!(events.iter().any(|e| matches!(
        e,
        BattleEvent::VolatileApplied { side: 1, condition: VolatileType::Flinch, .. }
    )));
    // Swept at end of turn; it cannot steal the following turn.
    assert!(!engine.state().team(1).active().has_volatile(VolatileType::Flinch));

    engine.submit_action(0, BattleAction::Attack { move_index: 0 }).unwrap();
    engine.submit_action(1, BattleAction::Attack { move_index: 0 }).unwrap();
    let events = engine
        .resolve_turn(TurnRng::new_for_test(vec![50, 90, 8, 50, 90, 8, 95]))
        .unwrap();
    assert_eq!(moves_used_by(&events, 1), 1);
}

#[test]
fn confused_pokemon_may_hurt_itself_then_snaps_out() {
    let repo = DataRepository::demo();
    let caster = TestPokemonBuilder::new(species_ids::PIKACHU, 20)
        .with_moves(vec![move_ids::CONFUSE_RAY, move_ids::TACKLE])
        .build(&repo);
    let victim = TestPokemonBuilder::new(species_ids::SQUIRTLE, 20)
        .with_moves(vec![move_ids::TACKLE])
        .build(&repo);
    let hp_before = victim.current_hp;

    let mut engine = engine_in_battle(BattleKind::Trainer, vec![caster], vec![victim]);
    engine.submit_action(0, BattleAction::Attack { move_index: 0 }).unwrap();
    engine.submit_action(1, BattleAction::Attack { move_index: 0 }).unwrap();

    // Confuse Ray: accuracy, volatile chance, duration (roll 1 -> two
    // turns). The confused side then fails its confusion check (10 <= 50)
    // and hits itself without drawing further rolls.
    let events = engine.resolve_turn(TurnRng::new_for_test(vec![50, 50, 1, 10])).unwrap();

    assert!(events.iter().any(|e| matches!(
        e,
        BattleEvent::VolatileApplied { side: 1, condition: VolatileType::Confusion, .. }
    )));
    assert!(message_containing(&events, "hurt itself in its confusion"));
    assert_eq!(moves_used_by(&events, 1), 0);
    assert!(engine.state().team(1).active().current_hp < hp_before);
    assert!(engine.state().team(1).active().has_volatile(VolatileType::Confusion));

    // One confused turn remains; it wears off and the action proceeds.
    engine.submit_action(0, BattleAction::Attack { move_index: 1 }).unwrap();
    engine.submit_action(1, BattleAction::Attack { move_index: 0 }).unwrap();
    let events = engine
        .resolve_turn(TurnRng::new_for_test(vec![50, 90, 8, 50, 90, 8]))
        .unwrap();

    assert!(message_containing(&events, "snapped out of confusion"));
    assert_eq!(moves_used_by(&events, 1), 1);
    assert!(!engine.state().team(1).active().has_volatile(VolatileType::Confusion));
}
