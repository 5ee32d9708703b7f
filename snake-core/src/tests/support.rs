use super::*;

pub(super) const P1: u32 = 1_000_001;
pub(super) const P2: u32 = 1_000_002;
pub(super) const P3: u32 = 1_000_003;

pub(super) fn layout_game(
    width: u32,
    height: u32,
    players: Vec<PlayerLayout>,
    food: Vec<Tile>,
    target_food: usize,
) -> GameInstance {
    GameInstance::from_layout(InstanceId(1), width, height, players, food, target_food, 7)
        .expect("test layout should be valid")
}

pub(super) fn step_with(game: &mut GameInstance, moves: &[(u32, Move)]) -> TurnReport {
    for &(id, mv) in moves {
        game.set_move(PlayerId(id), mv)
            .expect("test moves target known players");
    }
    game.step().expect("every living player should have a move")
}

pub(super) fn player(game: &GameInstance, id: u32) -> &PlayerState {
    game.player(PlayerId(id))
        .expect("player should exist in the test game")
}

pub(super) fn body(game: &GameInstance, id: u32) -> Vec<Tile> {
    player(game, id).body.iter().copied().collect()
}

pub(super) fn assert_occupancy_matches_state(game: &GameInstance) {
    let mut expected = vec![None; crate::grid::board_capacity(game.width, game.height)];
    for player in game.players.iter().filter(|player| player.alive) {
        for &segment in &player.body {
            let idx = game.cell_index(segment).expect("bodies stay in bounds");
            expected[idx] = Some(Occupant::Player(player.id));
        }
    }
    for &tile in &game.food {
        let idx = game.cell_index(tile).expect("food stays in bounds");
        assert!(expected[idx].is_none(), "food should not overlap a body");
        expected[idx] = Some(Occupant::Food);
    }
    assert_eq!(game.occupancy, expected);
}
