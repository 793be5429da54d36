use crate::battle::calculators::effective_speed;
use crate::battle::queue::ActionQueue;
use crate::battle::state::{BattleAction, BattleGameState};
use crate::battle::tests::common::TestPokemonBuilder;
use crate::data::{move_ids, species_ids, DataRepository};
use crate::team::Team;
use pretty_assertions::assert_eq;
use schema::BattleKind;

fn state_with(
    fast: crate::pokemon::Combatant,
    slow: crate::pokemon::Combatant,
    actions: [BattleAction; 2],
) -> BattleGameState {
    let mut state = BattleGameState::new(
        "ordering",
        BattleKind::Trainer,
        [Team::new("A", vec![fast]).unwrap(), Team::new("B", vec![slow]).unwrap()],
    );
    state.pending_actions = [Some(actions[0]), Some(actions[1])];
    state
}

#[test]
fn faster_combatant_attacks_first() {
    let repo = DataRepository::demo();
    let pikachu = TestPokemonBuilder::new(species_ids::PIKACHU, 50).build(&repo);
    let geodude = TestPokemonBuilder::new(species_ids::GEODUDE, 50).build(&repo);
    assert!(effective_speed(&pikachu) > effective_speed(&geodude));

    // Fast on side 1 this time, to prove it's Speed and not side order.
    let state = state_with(
        geodude,
        pikachu,
        [
            BattleAction::Attack { move_index: 0 },
            BattleAction::Attack { move_index: 0 },
        ],
    );
    let order: Vec<usize> =
        ActionQueue::build(&state, &repo).actions().iter().map(|q| q.side).collect();
    assert_eq!(order, vec![1, 0]);
}

#[test]
fn run_resolves_before_any_attack_regardless_of_speed() {
    let repo = DataRepository::demo();
    let pikachu = TestPokemonBuilder::new(species_ids::PIKACHU, 50).build(&repo);
    let geodude = TestPokemonBuilder::new(species_ids::GEODUDE, 50).build(&repo);

    // The slow side runs; it still goes first.
    let state = state_with(
        pikachu,
        geodude,
        [BattleAction::Attack { move_index: 0 }, BattleAction::Run],
    );
    let order: Vec<usize> =
        ActionQueue::build(&state, &repo).actions().iter().map(|q| q.side).collect();
    assert_eq!(order, vec![1, 0]);
}

#[test]
fn switch_resolves_after_items_but_before_attacks() {
    let repo = DataRepository::demo();
    let slow_switcher = TestPokemonBuilder::new(species_ids::GEODUDE, 50).build(&repo);
    let bench = TestPokemonBuilder::new(species_ids::ONIX, 50).build(&repo);
    let pikachu = TestPokemonBuilder::new(species_ids::PIKACHU, 50).build(&repo);

    let mut state = BattleGameState::new(
        "switch-order",
        BattleKind::Trainer,
        [
            Team::new("A", vec![slow_switcher, bench]).unwrap(),
            Team::new("B", vec![pikachu]).unwrap(),
        ],
    );
    state.pending_actions = [
        Some(BattleAction::Switch { team_index: 1 }),
        Some(BattleAction::Attack { move_index: 0 }),
    ];
    let order: Vec<usize> =
        ActionQueue::build(&state, &repo).actions().iter().map(|q| q.side).collect();
    assert_eq!(order, vec![0, 1]);
}

#[test]
fn quick_attack_outruns_a_faster_normal_attack() {
    let repo = DataRepository::demo();
    let slow = TestPokemonBuilder::new(species_ids::GEODUDE, 50)
        .with_moves(vec![move_ids::QUICK_ATTACK])
        .build(&repo);
    let fast = TestPokemonBuilder::new(species_ids::PIKACHU, 50).build(&repo);

    let state = state_with(
        slow,
        fast,
        [
            BattleAction::Attack { move_index: 0 },
            BattleAction::Attack { move_index: 0 },
        ],
    );
    let order: Vec<usize> =
        ActionQueue::build(&state, &repo).actions().iter().map(|q| q.side).collect();
    assert_eq!(order, vec![0, 1]);
}

#[test]
fn exact_speed_ties_break_to_side_zero() {
    let repo = DataRepository::demo();
    let a = TestPokemonBuilder::new(species_ids::PIKACHU, 50).build(&repo);
    let b = TestPokemonBuilder::new(species_ids::PIKACHU, 50).build(&repo);
    assert_eq!(effective_speed(&a), effective_speed(&b));

    let state = state_with(
        a,
        b,
        [
            BattleAction::Attack { move_index: 0 },
            BattleAction::Attack { move_index: 0 },
        ],
    );
    // Repeated builds must give the same order: no unseeded randomness.
    for _ in 0..5 {
        let order: Vec<usize> =
            ActionQueue::build(&state, &repo).actions().iter().map(|q| q.side).collect();
        assert_eq!(order, vec![0, 1]);
    }
}
