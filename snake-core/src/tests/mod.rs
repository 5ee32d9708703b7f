pub(super) use super::*;
pub(super) use snake_types::{
    DeathCause, InstanceId, Move, Occupant, PlayerId, PlayerState, Tile, MAX_HEALTH,
    PLAYER_STARTING_LENGTH,
};

mod collisions;
mod support;
