use snake_core::{GameError, GameInstance};
use snake_types::{InstanceId, Move, PlayerId, Tile};

pub const NUM_LAYERS: usize = 6;
pub const LAYER_WIDTH: usize = 39;
pub const LAYER_HEIGHT: usize = 39;
/// Bytes in one (model, slot) observation block.
pub const OBS_SIZE: usize = NUM_LAYERS * LAYER_WIDTH * LAYER_HEIGHT;

pub const HEAD_HEALTH_LAYER: usize = 0;
pub const BODY_LAYER: usize = 1;
pub const SEGMENT_LAYER: usize = 2;
pub const LONGER_OPPONENT_LAYER: usize = 3;
pub const FOOD_LAYER: usize = 4;
pub const BOARD_LAYER: usize = 5;

/// Cell of the observation window that holds the observer's head.
pub const VIEW_CENTER: (usize, usize) = (LAYER_WIDTH / 2, LAYER_HEIGHT / 2);

/// Action byte to move, before orientation is applied.
pub const ACTION_MOVES: [Move; 4] = [Move::Up, Move::Down, Move::Left, Move::Right];

pub fn decode_action(value: u8) -> Option<Move> {
    ACTION_MOVES.get(usize::from(value)).copied()
}

/// Per-view mirroring: bit 0 flips the x axis, bit 1 flips the y axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Orientation(u8);

impl Orientation {
    pub const IDENTITY: Self = Self(0);

    pub fn from_bits(bits: u8) -> Self {
        Self(bits & 0b11)
    }

    /// Orientation for one observer at one turn. Encoding and decoding must both use this.
    pub fn for_view(instance: InstanceId, turn: u32, player: PlayerId) -> Self {
        let key = mix64((u64::from(turn) << 32) | u64::from(player.0));
        Self::from_bits((mix64(instance.0 ^ key) & 0b11) as u8)
    }

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn flip_x(self) -> bool {
        self.0 & 0b01 != 0
    }

    pub fn flip_y(self) -> bool {
        self.0 & 0b10 != 0
    }

    /// Maps a move chosen in view space onto the board.
    pub fn apply(self, mv: Move) -> Move {
        let mv = if self.flip_x() {
            mv.mirrored_horizontally()
        } else {
            mv
        };
        if self.flip_y() {
            mv.mirrored_vertically()
        } else {
            mv
        }
    }

    /// Window cell for `tile` as seen from `origin`, or `None` outside the window.
    pub fn view_cell(self, origin: Tile, tile: Tile) -> Option<(usize, usize)> {
        let dx = tile.0 - origin.0;
        let dy = tile.1 - origin.1;
        let dx = if self.flip_x() { -dx } else { dx };
        let dy = if self.flip_y() { -dy } else { dy };
        let x = usize::try_from(dx + VIEW_CENTER.0 as i32).ok()?;
        let y = usize::try_from(dy + VIEW_CENTER.1 as i32).ok()?;
        (x < LAYER_WIDTH && y < LAYER_HEIGHT).then_some((x, y))
    }
}

/// Byte offset of `(x, y, layer)` inside one observation block.
pub fn obs_index(x: usize, y: usize, layer: usize) -> usize {
    x * (LAYER_HEIGHT * NUM_LAYERS) + y * NUM_LAYERS + layer
}

/// Writes `observer`'s egocentric view of `game` into a zeroed block of [`OBS_SIZE`] bytes.
pub fn write_observation(
    out: &mut [u8],
    game: &GameInstance,
    observer: PlayerId,
    orientation: Orientation,
) -> Result<(), GameError> {
    debug_assert_eq!(out.len(), OBS_SIZE);
    let me = game
        .player(observer)
        .ok_or(GameError::UnknownPlayer(observer))?;
    let Some(origin) = me.head() else {
        return Ok(());
    };
    let my_length = me.length();

    let mut stamp = |tile: Tile, layer: usize, value: u8| {
        if let Some((x, y)) = orientation.view_cell(origin, tile) {
            out[obs_index(x, y, layer)] = value;
        }
    };

    for player in game.players().iter().filter(|player| player.alive) {
        let Some(head) = player.head() else {
            continue;
        };
        stamp(head, HEAD_HEALTH_LAYER, saturate(player.health as usize));
        for (from_tail, &segment) in player.body.iter().rev().enumerate() {
            stamp(segment, BODY_LAYER, 1);
            stamp(segment, SEGMENT_LAYER, saturate(from_tail + 1));
        }
        if player.id != observer {
            stamp(
                head,
                LONGER_OPPONENT_LAYER,
                u8::from(player.length() >= my_length),
            );
        }
    }

    for &tile in game.food() {
        stamp(tile, FOOD_LAYER, 1);
    }

    for x in 0..game.width() as i32 {
        for y in 0..game.height() as i32 {
            stamp((x, y), BOARD_LAYER, 1);
        }
    }
    Ok(())
}

fn saturate(value: usize) -> u8 {
    u8::try_from(value).unwrap_or(u8::MAX)
}

/// SplitMix64 finalizer.
pub(crate) fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
