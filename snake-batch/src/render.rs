use snake_core::GameInstance;
use snake_types::{InstanceId, PlayerId, Tile, EMPTY_TILE_ID, FOOD_TILE_ID};

/// Copy of one board's geometry and occupancy, taken between rounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    pub instance_id: InstanceId,
    pub turn: u32,
    pub over: bool,
    pub width: u32,
    pub height: u32,
    /// Row-major tile ids: 0 empty, 1 food, otherwise the occupying player id.
    pub tiles: Vec<u32>,
    /// Living heads in player creation order.
    pub heads: Vec<(PlayerId, Tile)>,
}

impl BoardView {
    pub fn capture(game: &GameInstance) -> Self {
        let mut tiles = Vec::with_capacity(game.width() as usize * game.height() as usize);
        for y in 0..game.height() as i32 {
            for x in 0..game.width() as i32 {
                tiles.push(game.tile_id(x, y));
            }
        }
        let heads = game
            .players()
            .iter()
            .filter(|player| player.alive)
            .filter_map(|player| player.head().map(|head| (player.id, head)))
            .collect();
        Self {
            instance_id: game.id(),
            turn: game.turn(),
            over: game.is_over(),
            width: game.width(),
            height: game.height(),
            tiles,
            heads,
        }
    }

    pub fn tile_id(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return EMPTY_TILE_ID;
        }
        self.tiles[(y * self.width + x) as usize]
    }
}

/// Text drawing: `.` empty, `*` food, `A`.. heads and `a`.. bodies, lettered by player order.
pub fn render_ascii(view: &BoardView) -> String {
    let letter = |id: u32| {
        view.heads
            .iter()
            .position(|(player, _)| player.0 == id)
            .map_or(b'?', |index| b'a' + (index % 26) as u8)
    };

    let border = format!("+{}+\n", "-".repeat(view.width as usize));
    let mut out = String::new();
    out.push_str(&border);
    for y in 0..view.height {
        out.push('|');
        for x in 0..view.width {
            let glyph = match view.tile_id(x, y) {
                EMPTY_TILE_ID => b'.',
                FOOD_TILE_ID => b'*',
                id => {
                    let is_head = view
                        .heads
                        .iter()
                        .any(|&(player, head)| player.0 == id && head == (x as i32, y as i32));
                    if is_head {
                        letter(id).to_ascii_uppercase()
                    } else {
                        letter(id)
                    }
                }
            };
            out.push(char::from(glyph));
        }
        out.push_str("|\n");
    }
    out.push_str(&border);
    out.push_str(&format!(
        "instance={} turn={} snakes={} over={}\n",
        view.instance_id.0,
        view.turn,
        view.heads.len(),
        view.over
    ));
    out
}
