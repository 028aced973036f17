//! Tiles, the grid that owns them, and the pairing rule
//!
//! A tile's identity is its creation position (`"row-col"`). Rows are shared
//! behind `Arc` so snapshots are cheap and marking a match only copies the
//! row it touches.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Two tile values that add up to this form a pair
pub const PAIR_SUM: u32 = 10;

/// Stable identity of a tile, derived from where it was created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct TileId {
    pub row: usize,
    pub col: usize,
}

impl TileId {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for TileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed tile id {0:?}, expected \"row-col\"")]
pub struct ParseTileIdError(String);

impl FromStr for TileId {
    type Err = ParseTileIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (row, col) = s
            .split_once('-')
            .ok_or_else(|| ParseTileIdError(s.to_string()))?;
        let row = row.parse().map_err(|_| ParseTileIdError(s.to_string()))?;
        let col = col.parse().map_err(|_| ParseTileIdError(s.to_string()))?;
        Ok(Self { row, col })
    }
}

impl From<TileId> for String {
    fn from(id: TileId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for TileId {
    type Error = ParseTileIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// A single numbered cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    pub id: TileId,
    pub value: u32,
    pub matched: bool,
    pub row: usize,
    pub col: usize,
}

impl Tile {
    pub fn new(row: usize, col: usize, value: u32) -> Self {
        Self {
            id: TileId::new(row, col),
            value,
            matched: false,
            row,
            col,
        }
    }

    /// True if the two tiles are distinct and equal or sum to ten
    #[inline]
    pub fn pairs_with(&self, other: &Tile) -> bool {
        if self.id == other.id {
            return false;
        }
        self.value == other.value || self.value.checked_add(other.value) == Some(PAIR_SUM)
    }
}

/// Pairing rule over possibly-missing tiles. Symmetric and irreflexive.
pub fn tiles_match(a: Option<&Tile>, b: Option<&Tile>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.pairs_with(b),
        _ => false,
    }
}

/// One row of tiles, shared between snapshots until written
pub type Row = Arc<Vec<Tile>>;

/// Rows of tiles, top to bottom. Only ever grows by appending rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Row>,
}

impl Grid {
    pub fn from_rows(rows: Vec<Vec<Tile>>) -> Self {
        Self {
            rows: rows.into_iter().map(Arc::new).collect(),
        }
    }

    /// Number of rows
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column count of the first row (all rows share it)
    pub fn cols(&self) -> usize {
        self.rows.first().map(|r| r.len()).unwrap_or(0)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    pub fn get(&self, id: TileId) -> Option<&Tile> {
        self.rows
            .get(id.row)
            .and_then(|row| row.get(id.col))
            .filter(|tile| tile.id == id)
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.rows.iter().flat_map(|row| row.iter())
    }

    pub fn tile_count(&self) -> usize {
        self.rows.iter().map(|row| row.len()).sum()
    }

    pub fn matched_count(&self) -> usize {
        self.tiles().filter(|t| t.matched).count()
    }

    /// Returns a grid with `row` appended, sharing every existing row
    pub(crate) fn with_row(&self, row: Vec<Tile>) -> Self {
        let mut rows = Vec::with_capacity(self.rows.len() + 1);
        rows.extend(self.rows.iter().cloned());
        rows.push(Arc::new(row));
        Self { rows }
    }

    /// Flag a tile as matched, copying its row if a snapshot still holds it
    pub(crate) fn mark_matched(&mut self, id: TileId) -> bool {
        let Some(row) = self.rows.get_mut(id.row) else {
            return false;
        };
        if row.get(id.col).is_none_or(|t| t.id != id || t.matched) {
            return false;
        }
        Arc::make_mut(row)[id.col].matched = true;
        true
    }
}
