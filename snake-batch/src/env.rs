use crate::encode::{decode_action, mix64, write_observation, Orientation, OBS_SIZE};
use crate::pool::WorkerPool;
use crate::render::BoardView;
use crate::BatchError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use snake_config::{validate_batch_config, BatchConfig};
use snake_core::GameInstance;
use snake_types::{InstanceId, PlayerId, MAX_HEALTH};
use tracing::{debug, info};

/// First instance id handed out; slot `s` then uses `BASE + s + k * slots`.
pub const INSTANCE_ID_BASE: u64 = 1_000_000;

/// Turn count an episode must exceed for a surviving primary agent to count as a win.
pub const SURVIVAL_TURNS: u32 = 100;
/// Reward for a turn on which the primary agent ate.
pub const FOOD_REWARD: f64 = 0.1;

/// How an episode ended for the slot's primary agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeOutcome {
    /// Alive at game over after more than [`SURVIVAL_TURNS`] turns.
    Win,
    /// Alive at game over, but the game ended too early to count.
    Draw,
    Loss,
}

impl EpisodeOutcome {
    pub fn classify(alive: bool, turn: u32) -> Self {
        match (alive, turn > SURVIVAL_TURNS) {
            (false, _) => Self::Loss,
            (true, true) => Self::Win,
            (true, false) => Self::Draw,
        }
    }

    /// Episode return: 1 for a win, 0 for a draw, -1 for a loss.
    pub fn reward(self) -> f64 {
        match self {
            Self::Win => 1.0,
            Self::Draw => 0.0,
            Self::Loss => -1.0,
        }
    }
}

/// Status of a slot's primary agent after the latest round.
///
/// Field order and layout are read positionally by external consumers.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepInfo {
    pub health: u32,
    pub length: u32,
    pub turn: u32,
    pub alive: bool,
    /// Health snapped back to full on this turn.
    pub ate: bool,
    /// Primary agent dead or game over; the slot has already been reset.
    pub over: bool,
}

impl StepInfo {
    fn observe(game: &GameInstance, primary: Option<PlayerId>) -> Self {
        let Some(player) = primary.and_then(|id| game.player(id)) else {
            return Self {
                turn: game.turn(),
                over: true,
                ..Self::default()
            };
        };
        Self {
            health: player.health,
            length: player.length() as u32,
            turn: game.turn(),
            alive: player.alive,
            ate: player.health == MAX_HEALTH && game.turn() > 0,
            over: !player.alive || game.is_over(),
        }
    }

    /// Terminal outcome, if this round ended the episode.
    pub fn outcome(&self) -> Option<EpisodeOutcome> {
        self.over.then(|| EpisodeOutcome::classify(self.alive, self.turn))
    }

    /// Reward for this round: the food bonus plus the terminal reward, if any.
    pub fn reward(&self) -> f64 {
        let food = if self.ate { FOOD_REWARD } else { 0.0 };
        food + self.outcome().map_or(0.0, EpisodeOutcome::reward)
    }
}

/// Running totals over every step round since construction or the last reseed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchMetrics {
    pub rounds: u64,
    pub slot_steps: u64,
    pub episodes_completed: u64,
    pub primary_wins: u64,
    pub primary_draws: u64,
    pub primary_losses: u64,
    /// Sum of terminal turn counts.
    pub episode_turns: u64,
    /// Sum of terminal rewards over finished episodes.
    pub episode_return_sum: f64,
    /// Sum of per-round rewards over every slot, food bonuses included.
    pub reward_sum: f64,
}

impl BatchMetrics {
    pub fn mean_episode_turns(&self) -> Option<f64> {
        (self.episodes_completed > 0)
            .then(|| self.episode_turns as f64 / self.episodes_completed as f64)
    }

    pub fn mean_episode_return(&self) -> Option<f64> {
        (self.episodes_completed > 0)
            .then(|| self.episode_return_sum / self.episodes_completed as f64)
    }

    pub(crate) fn record(&mut self, outcome: EpisodeOutcome, turn: u32) {
        self.episodes_completed += 1;
        self.episode_turns += u64::from(turn);
        self.episode_return_sum += outcome.reward();
        match outcome {
            EpisodeOutcome::Win => self.primary_wins += 1,
            EpisodeOutcome::Draw => self.primary_draws += 1,
            EpisodeOutcome::Loss => self.primary_losses += 1,
        }
    }
}

/// Parameters every new instance is drawn from.
#[derive(Debug, Clone, Copy)]
struct InstanceShape {
    models: usize,
    min_board_size: u32,
    max_board_size: u32,
    min_food: u32,
    max_food: u32,
    /// Also the stride between consecutive instance ids of one slot.
    slots: usize,
}

impl InstanceShape {
    fn from_config(config: &BatchConfig) -> Self {
        Self {
            models: config.models,
            min_board_size: config.min_board_size,
            max_board_size: config.max_board_size,
            min_food: config.min_food,
            max_food: config.max_food,
            slots: config.slots,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Finished {
    instance: InstanceId,
    turn: u32,
    outcome: EpisodeOutcome,
}

struct Slot {
    index: usize,
    game: GameInstance,
    /// Model `m` controls `player_ids[m]` for the lifetime of `game`.
    player_ids: Vec<PlayerId>,
    rng: ChaCha8Rng,
    next_instance: u64,
}

impl Slot {
    fn new(index: usize, root_seed: u64, shape: &InstanceShape) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(root_seed ^ mix64(index as u64 + 1));
        let mut next_instance = INSTANCE_ID_BASE + index as u64;
        let game = spawn_instance(&mut rng, &mut next_instance, shape);
        let player_ids = game.player_ids();
        Self {
            index,
            game,
            player_ids,
            rng,
            next_instance,
        }
    }

    fn primary(&self) -> Option<PlayerId> {
        self.player_ids.first().copied()
    }

    fn respawn(&mut self, shape: &InstanceShape) {
        self.game = spawn_instance(&mut self.rng, &mut self.next_instance, shape);
        self.player_ids = self.game.player_ids();
    }

    /// Zeroes and re-encodes the slot's blocks, first replacing the game when `respawn` is set.
    fn reset(
        &mut self,
        mut blocks: Vec<&mut [u8]>,
        info: &mut StepInfo,
        shape: &InstanceShape,
        respawn: bool,
    ) -> Result<(), BatchError> {
        clear(&mut blocks);
        if respawn {
            self.respawn(shape);
        }
        *info = StepInfo::observe(&self.game, self.primary());
        self.encode(&mut blocks)
    }

    fn step(
        &mut self,
        mut blocks: Vec<&mut [u8]>,
        actions: &[u8],
        info: &mut StepInfo,
        shape: &InstanceShape,
    ) -> Result<Option<Finished>, BatchError> {
        clear(&mut blocks);
        for (model, &id) in self.player_ids.iter().enumerate() {
            let value = actions[model * shape.slots + self.index];
            let action = decode_action(value).ok_or(BatchError::InvalidAction {
                model,
                slot: self.index,
                value,
            })?;
            let orientation = Orientation::for_view(self.game.id(), self.game.turn(), id);
            self.game
                .set_move(id, orientation.apply(action))
                .map_err(|source| BatchError::Game {
                    slot: self.index,
                    source,
                })?;
        }

        self.game.step().map_err(|source| BatchError::Game {
            slot: self.index,
            source,
        })?;
        *info = StepInfo::observe(&self.game, self.primary());

        let finished = info.outcome().map(|outcome| Finished {
            instance: self.game.id(),
            turn: info.turn,
            outcome,
        });
        if finished.is_some() {
            self.respawn(shape);
        }
        self.encode(&mut blocks)?;
        Ok(finished)
    }

    fn encode(&self, blocks: &mut [&mut [u8]]) -> Result<(), BatchError> {
        for (block, &id) in blocks.iter_mut().zip(&self.player_ids) {
            let orientation = Orientation::for_view(self.game.id(), self.game.turn(), id);
            write_observation(block, &self.game, id, orientation).map_err(|source| {
                BatchError::Game {
                    slot: self.index,
                    source,
                }
            })?;
        }
        Ok(())
    }
}

fn spawn_instance(
    rng: &mut ChaCha8Rng,
    next_instance: &mut u64,
    shape: &InstanceShape,
) -> GameInstance {
    let width = rng.random_range(shape.min_board_size..=shape.max_board_size);
    let height = rng.random_range(shape.min_board_size..=shape.max_board_size);
    let food = rng.random_range(shape.min_food..=shape.max_food) as usize;
    let seed = rng.random::<u64>();
    let id = InstanceId(*next_instance);
    *next_instance += shape.slots as u64;
    GameInstance::new(id, width, height, shape.models, food, seed)
}

fn clear(blocks: &mut [&mut [u8]]) {
    for block in blocks.iter_mut() {
        block.fill(0);
    }
}

/// Splits `[model][slot][OBS_SIZE]` storage into one group of per-model blocks per slot.
fn blocks_by_slot(observations: &mut [u8], slots: usize) -> Vec<Vec<&mut [u8]>> {
    let mut by_slot: Vec<Vec<&mut [u8]>> = (0..slots).map(|_| Vec::new()).collect();
    for model_region in observations.chunks_exact_mut(slots * OBS_SIZE) {
        for (group, block) in by_slot
            .iter_mut()
            .zip(model_region.chunks_exact_mut(OBS_SIZE))
        {
            group.push(block);
        }
    }
    by_slot
}

/// Many independent games stepped together on a worker pool.
///
/// Callers write one action byte per (model, slot) through [`BatchEnv::actions_mut`], call
/// [`BatchEnv::step`], then read [`BatchEnv::observations`] and [`BatchEnv::infos`]. Slots whose
/// episode ended are reset inside the same round.
pub struct BatchEnv {
    config: BatchConfig,
    shape: InstanceShape,
    seed: u64,
    pool: WorkerPool,
    slots: Vec<Slot>,
    observations: Vec<u8>,
    actions: Vec<u8>,
    infos: Vec<StepInfo>,
    metrics: BatchMetrics,
}

impl BatchEnv {
    pub fn new(config: BatchConfig) -> Result<Self, BatchError> {
        validate_batch_config(&config).map_err(BatchError::InvalidConfig)?;
        let pool = WorkerPool::new(config.threads)?;
        let seed = config.seed.unwrap_or_else(|| rand::rng().random());
        let shape = InstanceShape::from_config(&config);
        let slots = (0..config.slots)
            .map(|index| Slot::new(index, seed, &shape))
            .collect();

        let mut env = Self {
            observations: vec![0; config.models * config.slots * OBS_SIZE],
            actions: vec![0; config.models * config.slots],
            infos: vec![StepInfo::default(); config.slots],
            metrics: BatchMetrics::default(),
            config,
            shape,
            seed,
            pool,
            slots,
        };
        info!(
            threads = env.pool.threads(),
            slots = env.config.slots,
            models = env.config.models,
            seed = env.seed,
            "batch env ready"
        );
        env.reset_round(false)?;
        Ok(env)
    }

    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn num_slots(&self) -> usize {
        self.config.slots
    }

    pub fn num_models(&self) -> usize {
        self.config.models
    }

    pub fn metrics(&self) -> BatchMetrics {
        self.metrics
    }

    /// Replaces every slot's game with a fresh one and re-encodes all observations.
    pub fn reset(&mut self) -> Result<(), BatchError> {
        self.reset_round(true)
    }

    /// Slots are created with their first game, so construction and reseed only encode.
    fn reset_round(&mut self, respawn: bool) -> Result<(), BatchError> {
        let Self {
            shape,
            pool,
            slots,
            observations,
            infos,
            ..
        } = self;
        let shape = *shape;
        let groups = blocks_by_slot(observations, slots.len());
        let mut results: Vec<Option<Result<(), BatchError>>> = slots.iter().map(|_| None).collect();

        pool.round(|round| {
            for (((slot, blocks), info), result) in slots
                .iter_mut()
                .zip(groups)
                .zip(infos.iter_mut())
                .zip(results.iter_mut())
            {
                round.schedule(move || {
                    *result = Some(slot.reset(blocks, info, &shape, respawn));
                });
            }
        });

        for result in results.into_iter().flatten() {
            result?;
        }
        debug!(slots = self.slots.len(), respawn, "reset round complete");
        Ok(())
    }

    /// Advances every slot by one turn using the current action buffer.
    ///
    /// The whole action buffer is validated before any slot moves.
    pub fn step(&mut self) -> Result<(), BatchError> {
        self.validate_actions()?;

        let Self {
            shape,
            pool,
            slots,
            observations,
            actions,
            infos,
            ..
        } = self;
        let shape = *shape;
        let actions = actions.as_slice();
        let groups = blocks_by_slot(observations, slots.len());
        let mut results: Vec<Option<Result<Option<Finished>, BatchError>>> =
            slots.iter().map(|_| None).collect();

        pool.round(|round| {
            for (((slot, blocks), info), result) in slots
                .iter_mut()
                .zip(groups)
                .zip(infos.iter_mut())
                .zip(results.iter_mut())
            {
                round.schedule(move || {
                    *result = Some(slot.step(blocks, actions, info, &shape));
                });
            }
        });

        self.metrics.rounds += 1;
        let mut first_error = None;
        for (slot, result) in results.into_iter().enumerate() {
            match result {
                Some(Ok(finished)) => {
                    self.metrics.slot_steps += 1;
                    self.metrics.reward_sum += self.infos[slot].reward();
                    if let Some(finished) = finished {
                        self.record_episode(slot, finished);
                    }
                }
                Some(Err(err)) => {
                    first_error.get_or_insert(err);
                }
                None => {}
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Starts over from `seed`: slot generators and instance ids restart, metrics clear, and
    /// every slot is reset.
    pub fn reseed(&mut self, seed: u64) -> Result<(), BatchError> {
        self.seed = seed;
        self.slots = (0..self.config.slots)
            .map(|index| Slot::new(index, seed, &self.shape))
            .collect();
        self.metrics = BatchMetrics::default();
        info!(seed, "batch env reseeded");
        self.reset_round(false)
    }

    /// Model `model`'s observations: `slots` blocks of [`OBS_SIZE`] bytes.
    pub fn observations(&self, model: usize) -> Result<&[u8], BatchError> {
        let region = self.model_region(model, OBS_SIZE)?;
        Ok(&self.observations[region])
    }

    /// Model `model`'s action bytes, one per slot.
    pub fn actions(&self, model: usize) -> Result<&[u8], BatchError> {
        let region = self.model_region(model, 1)?;
        Ok(&self.actions[region])
    }

    pub fn actions_mut(&mut self, model: usize) -> Result<&mut [u8], BatchError> {
        let region = self.model_region(model, 1)?;
        Ok(&mut self.actions[region])
    }

    pub fn infos(&self) -> &[StepInfo] {
        &self.infos
    }

    /// Current game in `slot`; valid until the next round.
    pub fn game(&self, slot: usize) -> Option<&GameInstance> {
        self.slots.get(slot).map(|slot| &slot.game)
    }

    /// Player each model controls in `slot`, by model index.
    pub fn player_ids(&self, slot: usize) -> Option<&[PlayerId]> {
        self.slots.get(slot).map(|slot| slot.player_ids.as_slice())
    }

    /// Read-only view of slot 0 for display between rounds.
    pub fn render(&self) -> Option<BoardView> {
        self.game(0).map(BoardView::capture)
    }

    fn model_region(
        &self,
        model: usize,
        stride: usize,
    ) -> Result<std::ops::Range<usize>, BatchError> {
        if model >= self.config.models {
            return Err(BatchError::ModelOutOfRange {
                model,
                models: self.config.models,
            });
        }
        let len = self.config.slots * stride;
        Ok(model * len..(model + 1) * len)
    }

    fn validate_actions(&self) -> Result<(), BatchError> {
        let slots = self.config.slots;
        match self
            .actions
            .iter()
            .position(|&value| decode_action(value).is_none())
        {
            Some(index) => Err(BatchError::InvalidAction {
                model: index / slots,
                slot: index % slots,
                value: self.actions[index],
            }),
            None => Ok(()),
        }
    }

    fn record_episode(&mut self, slot: usize, finished: Finished) {
        self.metrics.record(finished.outcome, finished.turn);
        debug!(
            slot,
            instance = finished.instance.0,
            turn = finished.turn,
            outcome = ?finished.outcome,
            "episode finished"
        );
    }
}
