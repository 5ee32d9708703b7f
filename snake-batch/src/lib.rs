use snake_core::GameError;
use thiserror::Error;

mod encode;
mod env;
mod pool;
mod render;

#[cfg(test)]
mod tests;

pub use encode::{
    decode_action, obs_index, write_observation, Orientation, ACTION_MOVES, BOARD_LAYER,
    BODY_LAYER, FOOD_LAYER, HEAD_HEALTH_LAYER, LAYER_HEIGHT, LAYER_WIDTH, LONGER_OPPONENT_LAYER,
    NUM_LAYERS, OBS_SIZE, SEGMENT_LAYER, VIEW_CENTER,
};
pub use env::{
    BatchEnv, BatchMetrics, EpisodeOutcome, StepInfo, FOOD_REWARD, INSTANCE_ID_BASE,
    SURVIVAL_TURNS,
};
pub use pool::{PoolError, Round, WorkerPool};
pub use render::{render_ascii, BoardView};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("invalid batch config: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("action {value} for model {model} in slot {slot} is not a valid move index")]
    InvalidAction { model: usize, slot: usize, value: u8 },
    #[error("model index {model} is out of range for {models} models")]
    ModelOutOfRange { model: usize, models: usize },
    #[error("slot {slot}: {source}")]
    Game {
        slot: usize,
        #[source]
        source: GameError,
    },
}
