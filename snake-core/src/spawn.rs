use crate::GameInstance;
use rand::Rng;
use snake_types::{
    Occupant, PlayerId, PlayerState, Tile, MAX_HEALTH, MAX_PLAYER_ID, MIN_PLAYER_ID,
    PLAYER_STARTING_LENGTH,
};
use std::collections::VecDeque;

/// Rejection-sampling budget for each snake or food item placed at construction.
pub const PLACEMENT_ATTEMPTS: u32 = 1_000;
/// Rejection-sampling budget shared by one whole food top-up after a turn.
pub const FOOD_RESPAWN_ATTEMPTS: u32 = 1_000;

impl GameInstance {
    pub(crate) fn spawn_players(&mut self, count: usize) {
        for _ in 0..count {
            let id = self.draw_player_id();
            let mut budget = PLACEMENT_ATTEMPTS;
            let Some(tile) = self.sample_free_tile(&mut budget) else {
                break;
            };
            self.mark(tile, Occupant::Player(id));
            self.players.push(PlayerState {
                id,
                body: VecDeque::from(vec![tile; PLAYER_STARTING_LENGTH]),
                health: MAX_HEALTH,
                alive: true,
                pending_move: None,
            });
        }
    }

    pub(crate) fn spawn_initial_food(&mut self, count: usize) {
        for _ in 0..count {
            let mut budget = PLACEMENT_ATTEMPTS;
            let Some(tile) = self.sample_free_tile(&mut budget) else {
                break;
            };
            self.mark(tile, Occupant::Food);
            self.food.insert(tile);
        }
    }

    /// Tops food back up to its target. Expects occupancy to reflect the survivors.
    ///
    /// Returns how many items were placed; stops short once the attempt budget runs out.
    pub(crate) fn replenish_food(&mut self) -> usize {
        let mut budget = FOOD_RESPAWN_ATTEMPTS;
        let mut placed = 0;
        while self.food.len() < self.target_food {
            let Some(tile) = self.sample_free_tile(&mut budget) else {
                break;
            };
            self.mark(tile, Occupant::Food);
            self.food.insert(tile);
            placed += 1;
        }
        placed
    }

    fn draw_player_id(&mut self) -> PlayerId {
        loop {
            let id = PlayerId(self.rng.random_range(MIN_PLAYER_ID..=MAX_PLAYER_ID));
            if self.players.iter().all(|player| player.id != id) {
                return id;
            }
        }
    }

    fn sample_free_tile(&mut self, budget: &mut u32) -> Option<Tile> {
        if self.occupancy.is_empty() {
            return None;
        }
        while *budget > 0 {
            *budget -= 1;
            let tile = (
                self.rng.random_range(0..self.width as i32),
                self.rng.random_range(0..self.height as i32),
            );
            if self.is_free(tile) {
                return Some(tile);
            }
        }
        None
    }

    fn mark(&mut self, tile: Tile, occupant: Occupant) {
        if let Some(idx) = self.cell_index(tile) {
            self.occupancy[idx] = Some(occupant);
        }
    }
}
