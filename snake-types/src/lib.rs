use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Segments a freshly placed snake starts with, all stacked on its spawn cell.
pub const PLAYER_STARTING_LENGTH: usize = 3;
pub const MAX_HEALTH: u32 = 100;

/// Tile ids reported to viewers. Player ids never collide with these.
pub const EMPTY_TILE_ID: u32 = 0;
pub const FOOD_TILE_ID: u32 = 1;

pub const MIN_PLAYER_ID: u32 = 1_000_000;
pub const MAX_PLAYER_ID: u32 = 9_999_999;

/// Board cell as `(x, y)`; `y` grows downwards.
pub type Tile = (i32, i32);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlayerId(pub u32);

impl PlayerId {
    pub fn is_valid(self) -> bool {
        (MIN_PLAYER_ID..=MAX_PLAYER_ID).contains(&self.0)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Move {
    Up,
    Down,
    Left,
    Right,
}

impl Move {
    pub const ALL: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Move::Up => (0, -1),
            Move::Down => (0, 1),
            Move::Left => (-1, 0),
            Move::Right => (1, 0),
        }
    }

    pub fn mirrored_horizontally(self) -> Self {
        match self {
            Move::Left => Move::Right,
            Move::Right => Move::Left,
            other => other,
        }
    }

    pub fn mirrored_vertically(self) -> Self {
        match self {
            Move::Up => Move::Down,
            Move::Down => Move::Up,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Occupant {
    Food,
    Player(PlayerId),
}

impl Occupant {
    pub fn tile_id(occupant: Option<Occupant>) -> u32 {
        match occupant {
            None => EMPTY_TILE_ID,
            Some(Occupant::Food) => FOOD_TILE_ID,
            Some(Occupant::Player(id)) => id.0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeathCause {
    OutOfBounds,
    Starvation,
    HeadToHead,
    BodyCollision,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerState {
    pub id: PlayerId,
    /// Head first.
    pub body: VecDeque<Tile>,
    pub health: u32,
    pub alive: bool,
    #[serde(default)]
    pub pending_move: Option<Move>,
}

impl PlayerState {
    pub fn head(&self) -> Option<Tile> {
        self.body.front().copied()
    }

    pub fn length(&self) -> usize {
        self.body.len()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BoardSnapshot {
    pub instance_id: InstanceId,
    pub turn: u32,
    pub over: bool,
    pub width: u32,
    pub height: u32,
    pub target_food: usize,
    pub players: Vec<PlayerState>,
    pub food: Vec<Tile>,
}
