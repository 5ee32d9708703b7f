use super::*;
use snake_config::BatchConfig;
use snake_core::{GameInstance, PlayerLayout};
use snake_types::{InstanceId, Tile};

pub(super) const P1: u32 = 3_000_001;
pub(super) const P2: u32 = 3_000_002;

pub(super) fn small_config(slots: usize, models: usize) -> BatchConfig {
    BatchConfig::new(2, slots, models).with_seed(7)
}

pub(super) fn small_env(slots: usize, models: usize) -> BatchEnv {
    BatchEnv::new(small_config(slots, models)).expect("small batch env should build")
}

pub(super) fn layout_game(
    width: u32,
    height: u32,
    players: Vec<PlayerLayout>,
    food: Vec<Tile>,
) -> GameInstance {
    let target = food.len();
    GameInstance::from_layout(InstanceId(77), width, height, players, food, target, 1)
        .expect("test layout should be valid")
}

pub(super) fn encode(game: &GameInstance, observer: u32, orientation: Orientation) -> Vec<u8> {
    let mut block = vec![0; OBS_SIZE];
    write_observation(&mut block, game, snake_types::PlayerId(observer), orientation)
        .expect("observer is part of the game");
    block
}

/// Value at board tile offset `(dx, dy)` from the observer's head, without orientation.
pub(super) fn at_offset(block: &[u8], dx: i32, dy: i32, layer: usize) -> u8 {
    let x = (VIEW_CENTER.0 as i32 + dx) as usize;
    let y = (VIEW_CENTER.1 as i32 + dy) as usize;
    block[obs_index(x, y, layer)]
}

pub(super) fn layer_count(block: &[u8], layer: usize) -> usize {
    block
        .chunks_exact(NUM_LAYERS)
        .filter(|cell| cell[layer] != 0)
        .count()
}
