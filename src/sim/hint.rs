//! Pair search over the open tiles of a grid

use super::tile::{Grid, Tile, TileId};

fn open_tiles(grid: &Grid) -> Vec<&Tile> {
    grid.tiles().filter(|t| !t.matched).collect()
}

/// Number of unordered pairs among unmatched tiles that would match
pub fn available_matches(grid: &Grid) -> usize {
    let open = open_tiles(grid);
    open.iter()
        .enumerate()
        .map(|(i, a)| open[i + 1..].iter().filter(|b| a.pairs_with(b)).count())
        .sum()
}

/// First matching pair in row-major order, if any
pub fn find_match(grid: &Grid) -> Option<(TileId, TileId)> {
    let open = open_tiles(grid);
    open.iter().enumerate().find_map(|(i, a)| {
        open[i + 1..]
            .iter()
            .find(|b| a.pairs_with(b))
            .map(|b| (a.id, b.id))
    })
}
