use super::support::*;
use super::*;

#[test]
fn equal_length_head_to_head_kills_both() {
    let mut game = layout_game(
        11,
        11,
        vec![
            PlayerLayout::new(P1, vec![(3, 5), (2, 5), (1, 5)]),
            PlayerLayout::new(P2, vec![(5, 5), (6, 5), (7, 5)]),
        ],
        vec![],
        0,
    );

    let report = step_with(&mut game, &[(P1, Move::Right), (P2, Move::Left)]);

    assert_eq!(
        report.deaths.get(&PlayerId(P1)),
        Some(&DeathCause::HeadToHead)
    );
    assert_eq!(
        report.deaths.get(&PlayerId(P2)),
        Some(&DeathCause::HeadToHead)
    );
    assert_eq!(game.alive_count(), 0);
    assert!(game.is_over());
}

#[test]
fn strictly_longer_player_wins_head_to_head() {
    let mut game = layout_game(
        11,
        11,
        vec![
            PlayerLayout::new(P1, vec![(3, 5), (2, 5), (1, 5), (0, 5)]),
            PlayerLayout::new(P2, vec![(5, 5), (6, 5), (7, 5)]),
        ],
        vec![],
        0,
    );

    let report = step_with(&mut game, &[(P1, Move::Right), (P2, Move::Left)]);

    assert!(!report.died(PlayerId(P1)));
    assert_eq!(
        report.deaths.get(&PlayerId(P2)),
        Some(&DeathCause::HeadToHead)
    );
    assert!(player(&game, P1).alive);
    assert!(game.is_over(), "one survivor ends a two player game");
    assert_eq!(game.occupant(4, 5), Some(Occupant::Player(PlayerId(P1))));
}

#[test]
fn three_way_head_to_head_compares_against_longest_rival() {
    let layouts = |lengths: [usize; 3]| {
        vec![
            PlayerLayout::new(P1, (0..lengths[0]).map(|i| (5, 4 - i as i32)).collect()),
            PlayerLayout::new(P2, (0..lengths[1]).map(|i| (4 - i as i32, 5)).collect()),
            PlayerLayout::new(P3, (0..lengths[2]).map(|i| (6 + i as i32, 5)).collect()),
        ]
    };
    let moves = [(P1, Move::Down), (P2, Move::Right), (P3, Move::Left)];

    let mut tied = layout_game(11, 11, layouts([4, 4, 3]), vec![], 0);
    let report = step_with(&mut tied, &moves);
    assert_eq!(report.deaths.len(), 3);

    let mut clear_winner = layout_game(11, 11, layouts([5, 4, 3]), vec![], 0);
    let report = step_with(&mut clear_winner, &moves);
    assert!(!report.died(PlayerId(P1)));
    assert!(report.died(PlayerId(P2)));
    assert!(report.died(PlayerId(P3)));
}

#[test]
fn moving_into_another_body_kills_only_the_mover() {
    let mut game = layout_game(
        11,
        11,
        vec![
            PlayerLayout::new(P1, vec![(2, 4), (1, 4)]),
            PlayerLayout::new(P2, vec![(3, 3), (3, 4), (3, 5), (3, 6)]),
        ],
        vec![],
        0,
    );

    let report = step_with(&mut game, &[(P1, Move::Right), (P2, Move::Up)]);

    assert_eq!(
        report.deaths.get(&PlayerId(P1)),
        Some(&DeathCause::BodyCollision)
    );
    assert!(player(&game, P2).alive);
}

#[test]
fn running_into_own_neck_is_fatal() {
    let mut game = layout_game(
        11,
        11,
        vec![PlayerLayout::new(P1, vec![(5, 5), (5, 6), (5, 7)])],
        vec![],
        0,
    );

    let report = step_with(&mut game, &[(P1, Move::Down)]);

    assert_eq!(
        report.deaths.get(&PlayerId(P1)),
        Some(&DeathCause::BodyCollision)
    );
    assert!(game.is_over());
}

#[test]
fn swapping_heads_passes_through_and_kills_both() {
    let mut game = layout_game(
        11,
        11,
        vec![
            PlayerLayout::new(P1, vec![(2, 2), (1, 2)]),
            PlayerLayout::new(P2, vec![(3, 2), (4, 2)]),
        ],
        vec![],
        0,
    );

    let report = step_with(&mut game, &[(P1, Move::Right), (P2, Move::Left)]);

    assert_eq!(
        report.deaths.get(&PlayerId(P1)),
        Some(&DeathCause::BodyCollision)
    );
    assert_eq!(
        report.deaths.get(&PlayerId(P2)),
        Some(&DeathCause::BodyCollision)
    );
}

#[test]
fn tail_of_an_eating_snake_does_not_move_away() {
    let mut game = layout_game(
        11,
        11,
        vec![
            PlayerLayout::new(P1, vec![(4, 2), (4, 1)]),
            PlayerLayout::new(P2, vec![(5, 4), (5, 3), (5, 2)]),
        ],
        vec![(5, 5)],
        1,
    );

    let report = step_with(&mut game, &[(P1, Move::Right), (P2, Move::Down)]);

    assert_eq!(report.meals, vec![PlayerId(P2)]);
    assert_eq!(
        report.deaths.get(&PlayerId(P1)),
        Some(&DeathCause::BodyCollision)
    );
}

#[test]
fn two_heads_on_one_food_both_eat() {
    let mut game = layout_game(
        11,
        11,
        vec![
            PlayerLayout::new(P1, vec![(4, 5), (3, 5)]),
            PlayerLayout::new(P2, vec![(6, 5), (7, 5)]),
        ],
        vec![(5, 5)],
        1,
    );

    let report = step_with(&mut game, &[(P1, Move::Right), (P2, Move::Left)]);

    assert_eq!(report.meals.len(), 2);
    assert_eq!(player(&game, P1).length(), 3);
    assert_eq!(player(&game, P2).length(), 3);
    assert_eq!(report.deaths.len(), 2, "equal lengths after eating");
    assert_eq!(report.food_spawned, 1, "one shared food item was consumed");
    assert_eq!(game.food().len(), 1);
}

#[test]
fn death_resolution_is_independent_of_player_order() {
    let players = vec![
        PlayerLayout::new(P1, vec![(3, 5), (2, 5), (1, 5)]),
        PlayerLayout::new(P2, vec![(5, 5), (6, 5)]),
        PlayerLayout::new(P3, vec![(4, 7), (4, 8), (4, 9), (4, 10)]),
    ];
    let moves = [(P1, Move::Right), (P2, Move::Left), (P3, Move::Up)];

    let mut forward = layout_game(11, 11, players.clone(), vec![(4, 6)], 1);
    let mut reversed = layout_game(11, 11, players.into_iter().rev().collect(), vec![(4, 6)], 1);

    let forward_report = step_with(&mut forward, &moves);
    let reversed_report = step_with(&mut reversed, &moves);

    assert_eq!(forward_report.deaths, reversed_report.deaths);
    assert!(forward_report.died(PlayerId(P2)));
    assert!(!forward_report.died(PlayerId(P1)));
    assert!(!forward_report.died(PlayerId(P3)));
    for id in [P1, P2, P3] {
        assert_eq!(body(&forward, id), body(&reversed, id));
    }
}
