use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use snake_types::{
    BoardSnapshot, InstanceId, Move, Occupant, PlayerId, PlayerState, Tile, MAX_HEALTH,
};
use std::collections::{BTreeSet, HashSet, VecDeque};
use thiserror::Error;

mod grid;
mod spawn;
mod turn;

#[cfg(test)]
mod tests;

pub use grid::next_tile;
pub use spawn::{FOOD_RESPAWN_ATTEMPTS, PLACEMENT_ATTEMPTS};
pub use turn::TurnReport;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("unknown player id {0}")]
    UnknownPlayer(PlayerId),
    #[error("living player {0} has no pending move")]
    MissingMove(PlayerId),
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

/// A player placed explicitly by [`GameInstance::from_layout`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerLayout {
    pub id: PlayerId,
    /// Head first.
    pub body: Vec<Tile>,
    pub health: u32,
}

impl PlayerLayout {
    pub fn new(id: u32, body: Vec<Tile>) -> Self {
        Self {
            id: PlayerId(id),
            body,
            health: MAX_HEALTH,
        }
    }

    pub fn with_health(mut self, health: u32) -> Self {
        self.health = health;
        self
    }
}

/// One environment: board, snakes and food, advanced one turn at a time by [`GameInstance::step`].
#[derive(Debug, Clone)]
pub struct GameInstance {
    id: InstanceId,
    turn: u32,
    over: bool,
    width: u32,
    height: u32,
    target_food: usize,
    players: Vec<PlayerState>,
    food: BTreeSet<Tile>,
    occupancy: Vec<Option<Occupant>>,
    rng: ChaCha8Rng,
}

impl GameInstance {
    /// Places `num_players` snakes and `num_food` food items at random free cells.
    ///
    /// Placement is bounded; on a board too small for the request fewer items are placed.
    pub fn new(
        id: InstanceId,
        width: u32,
        height: u32,
        num_players: usize,
        num_food: usize,
        seed: u64,
    ) -> Self {
        let mut game = Self::empty(id, width, height, num_food, seed);
        game.spawn_players(num_players);
        game.spawn_initial_food(num_food);
        game.debug_assert_consistent_state();
        game
    }

    pub fn from_layout(
        id: InstanceId,
        width: u32,
        height: u32,
        players: Vec<PlayerLayout>,
        food: Vec<Tile>,
        target_food: usize,
        seed: u64,
    ) -> Result<Self, GameError> {
        validate_layout(width, height, &players, &food, target_food)?;

        let mut game = Self::empty(id, width, height, target_food, seed);
        game.players = players
            .into_iter()
            .map(|layout| PlayerState {
                id: layout.id,
                body: VecDeque::from(layout.body),
                health: layout.health,
                alive: true,
                pending_move: None,
            })
            .collect();
        game.food = food.into_iter().collect();
        game.rebuild_occupancy();
        game.debug_assert_consistent_state();
        Ok(game)
    }

    fn empty(id: InstanceId, width: u32, height: u32, target_food: usize, seed: u64) -> Self {
        Self {
            id,
            turn: 0,
            over: false,
            width,
            height,
            target_food,
            players: Vec::new(),
            food: BTreeSet::new(),
            occupancy: vec![None; grid::board_capacity(width, height)],
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn is_over(&self) -> bool {
        self.over
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn target_food(&self) -> usize {
        self.target_food
    }

    pub fn players(&self) -> &[PlayerState] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerState> {
        self.players.iter().find(|player| player.id == id)
    }

    /// Ids in creation order; stable for the lifetime of the instance.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|player| player.id).collect()
    }

    pub fn food(&self) -> &BTreeSet<Tile> {
        &self.food
    }

    pub fn alive_count(&self) -> usize {
        self.players.iter().filter(|player| player.alive).count()
    }

    /// Records the move `id` will make on the next [`GameInstance::step`].
    ///
    /// Moves persist until replaced. Moves for dead players are accepted and ignored.
    pub fn set_move(&mut self, id: PlayerId, mv: Move) -> Result<(), GameError> {
        let player = self
            .players
            .iter_mut()
            .find(|player| player.id == id)
            .ok_or(GameError::UnknownPlayer(id))?;
        if player.alive {
            player.pending_move = Some(mv);
        }
        Ok(())
    }

    /// Occupant of an in-bounds cell; `None` for empty or out-of-bounds cells.
    pub fn occupant(&self, x: i32, y: i32) -> Option<Occupant> {
        let idx = self.cell_index((x, y))?;
        self.occupancy[idx]
    }

    /// Viewer encoding of a cell: 0 empty, 1 food, otherwise the occupying player id.
    pub fn tile_id(&self, x: i32, y: i32) -> u32 {
        Occupant::tile_id(self.occupant(x, y))
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            instance_id: self.id,
            turn: self.turn,
            over: self.over,
            width: self.width,
            height: self.height,
            target_food: self.target_food,
            players: self.players.clone(),
            food: self.food.iter().copied().collect(),
        }
    }

    fn cell_index(&self, tile: Tile) -> Option<usize> {
        grid::cell_index(tile, self.width, self.height)
    }

    fn is_free(&self, tile: Tile) -> bool {
        self.cell_index(tile)
            .is_some_and(|idx| self.occupancy[idx].is_none())
    }

    /// Occupancy is derived: always rebuilt from living bodies and the food set.
    fn rebuild_occupancy(&mut self) {
        self.occupancy.fill(None);
        for player in self.players.iter().filter(|player| player.alive) {
            for &segment in &player.body {
                if let Some(idx) = grid::cell_index(segment, self.width, self.height) {
                    self.occupancy[idx] = Some(Occupant::Player(player.id));
                }
            }
        }
        for &tile in &self.food {
            if let Some(idx) = grid::cell_index(tile, self.width, self.height) {
                debug_assert!(self.occupancy[idx].is_none(), "food must not sit under a body");
                self.occupancy[idx] = Some(Occupant::Food);
            }
        }
    }

    fn debug_assert_consistent_state(&self) {
        if cfg!(debug_assertions) {
            debug_assert!(
                self.food.len() <= self.target_food,
                "food count must not exceed its target",
            );
            for &tile in &self.food {
                debug_assert_eq!(
                    self.occupant(tile.0, tile.1),
                    Some(Occupant::Food),
                    "occupancy must mark every food cell",
                );
            }
            for player in self.players.iter().filter(|player| player.alive) {
                debug_assert!(!player.body.is_empty(), "living players keep a body");
                for &(x, y) in &player.body {
                    debug_assert_eq!(
                        self.occupant(x, y),
                        Some(Occupant::Player(player.id)),
                        "occupancy must point at the body occupying that cell",
                    );
                }
            }
        }
    }
}

fn validate_layout(
    width: u32,
    height: u32,
    players: &[PlayerLayout],
    food: &[Tile],
    target_food: usize,
) -> Result<(), GameError> {
    if width == 0 || height == 0 {
        return Err(GameError::InvalidLayout(
            "board dimensions must be greater than zero".to_owned(),
        ));
    }

    let mut ids = HashSet::new();
    let mut claimed: Vec<Option<PlayerId>> = vec![None; grid::board_capacity(width, height)];
    for player in players {
        if !player.id.is_valid() {
            return Err(GameError::InvalidLayout(format!(
                "player id {} is outside the player id range",
                player.id
            )));
        }
        if !ids.insert(player.id) {
            return Err(GameError::InvalidLayout(format!(
                "player id {} appears twice",
                player.id
            )));
        }
        if player.body.is_empty() {
            return Err(GameError::InvalidLayout(format!(
                "player {} has an empty body",
                player.id
            )));
        }
        if !(1..=MAX_HEALTH).contains(&player.health) {
            return Err(GameError::InvalidLayout(format!(
                "player {} health {} is outside 1..={MAX_HEALTH}",
                player.id, player.health
            )));
        }
        for &segment in &player.body {
            let idx = grid::cell_index(segment, width, height).ok_or_else(|| {
                GameError::InvalidLayout(format!(
                    "player {} segment {segment:?} is out of bounds",
                    player.id
                ))
            })?;
            match claimed[idx] {
                Some(other) if other != player.id => {
                    return Err(GameError::InvalidLayout(format!(
                        "players {other} and {} overlap at {segment:?}",
                        player.id
                    )));
                }
                _ => claimed[idx] = Some(player.id),
            }
        }
    }

    let mut seen_food = HashSet::new();
    for &tile in food {
        let idx = grid::cell_index(tile, width, height).ok_or_else(|| {
            GameError::InvalidLayout(format!("food {tile:?} is out of bounds"))
        })?;
        if !seen_food.insert(tile) {
            return Err(GameError::InvalidLayout(format!("food {tile:?} appears twice")));
        }
        if claimed[idx].is_some() {
            return Err(GameError::InvalidLayout(format!(
                "food {tile:?} lies under a body"
            )));
        }
    }
    if food.len() > target_food {
        return Err(GameError::InvalidLayout(format!(
            "{} food items exceed the target of {target_food}",
            food.len()
        )));
    }
    Ok(())
}
