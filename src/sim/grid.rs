//! Grid generation and row extension
//!
//! Fresh grids get a share of guaranteed pairs written into them so a level
//! is always solvable from the start. Appended rows are plain random fill.

use rand::Rng;

use super::levels::LevelConfig;
use super::tile::{Grid, PAIR_SUM, Tile};

/// Fraction of a level's target matches seeded as guaranteed pairs
pub const GUARANTEED_PAIR_FRACTION: f32 = 0.6;

/// Number of guaranteed pairs written into a fresh grid for `config`
pub fn guaranteed_pairs(config: &LevelConfig) -> u32 {
    (config.target_matches as f32 * GUARANTEED_PAIR_FRACTION).floor() as u32
}

fn random_value<R: Rng + ?Sized>(config: &LevelConfig, rng: &mut R) -> u32 {
    rng.random_range(config.value_range().as_range())
}

fn random_row<R: Rng + ?Sized>(row: usize, config: &LevelConfig, rng: &mut R) -> Vec<Tile> {
    (0..config.cols)
        .map(|col| Tile::new(row, col, random_value(config, rng)))
        .collect()
}

/// Build the starting grid for a level
pub fn generate_grid<R: Rng + ?Sized>(config: &LevelConfig, rng: &mut R) -> Grid {
    let mut rows: Vec<Vec<Tile>> = (0..config.rows)
        .map(|row| random_row(row, config, rng))
        .collect();

    if config.rows == 0 || config.cols < 2 {
        log::debug!(
            "Level {}: {}x{} grid has no room for guaranteed pairs",
            config.level,
            config.rows,
            config.cols
        );
        return Grid::from_rows(rows);
    }

    for _ in 0..guaranteed_pairs(config) {
        let row = rng.random_range(0..config.rows);
        let col1 = rng.random_range(0..config.cols);
        let mut col2 = rng.random_range(0..config.cols);
        while col2 == col1 {
            col2 = rng.random_range(0..config.cols);
        }

        let (a, b) = if rng.random_bool(0.5) {
            let value = random_value(config, rng);
            (value, value)
        } else {
            let value = rng.random_range(1..PAIR_SUM);
            (value, PAIR_SUM - value)
        };
        rows[row][col1].value = a;
        rows[row][col2].value = b;
    }

    Grid::from_rows(rows)
}

/// Append one random row below `grid`. The input grid is left untouched.
pub fn add_row<R: Rng + ?Sized>(grid: &Grid, config: &LevelConfig, rng: &mut R) -> Grid {
    grid.with_row(random_row(grid.len(), config, rng))
}
