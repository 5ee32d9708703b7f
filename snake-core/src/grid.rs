use snake_types::{Move, Tile};

/// Cell reached from `tile` by `mv`; may lie outside the board.
pub fn next_tile(tile: Tile, mv: Move) -> Tile {
    let (dx, dy) = mv.delta();
    (tile.0 + dx, tile.1 + dy)
}

pub(crate) fn in_bounds(tile: Tile, width: u32, height: u32) -> bool {
    tile.0 >= 0 && tile.1 >= 0 && tile.0 < width as i32 && tile.1 < height as i32
}

pub(crate) fn cell_index(tile: Tile, width: u32, height: u32) -> Option<usize> {
    if !in_bounds(tile, width, height) {
        return None;
    }
    Some(tile.1 as usize * width as usize + tile.0 as usize)
}

pub(crate) fn board_capacity(width: u32, height: u32) -> usize {
    width as usize * height as usize
}
