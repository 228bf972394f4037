//! Arena grid storage and spatial queries.
//!
//! The arena is a fixed-size grid of single-byte cell classifications,
//! stored row-major in one flat array. Cells are addressed externally by
//! physical [`Position`] (millimetres); the map converts to [`GridCoord`]
//! through a fixed affine transform:
//!
//! ```text
//! position = (coord - origin) * cell_size
//! coord    = origin + position.div_euclid(cell_size)
//! ```
//!
//! The transform is exactly invertible for every in-bounds coordinate:
//! `to_grid(to_position(c)) == c`.

use crate::config::MapConfig;
use crate::core::{CellKind, GridCoord, Position};
use crate::error::{Error, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Fixed-size arena grid of cell classifications.
///
/// Unwritten cells hold [`CellKind::Empty`].
#[derive(Clone, Debug)]
pub struct ArenaMap {
    /// Row-major cell classifications (`row * width + col`)
    cells: Vec<u8>,
    width: i16,
    height: i16,
    /// Grid coordinate corresponding to physical (0, 0)
    origin: GridCoord,
    /// Physical size of one cell in millimetres
    cell_size: i16,
}

impl ArenaMap {
    /// Create an empty map from validated configuration
    pub fn new(config: &MapConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            cells: vec![CellKind::Empty as u8; config.width as usize * config.height as usize],
            width: config.width,
            height: config.height,
            origin: GridCoord::new(config.origin_col, config.origin_row),
            cell_size: config.cell_size_mm,
        })
    }

    /// Empty map sized for the small competition arena
    pub fn small_arena() -> Self {
        // Defaults are statically valid, new() cannot fail here
        Self::new(&crate::config::AppConfig::small_arena_defaults().map)
            .unwrap_or_else(|_| unreachable!("small arena defaults are valid"))
    }

    /// Grid width in cells
    #[inline]
    pub fn width(&self) -> i16 {
        self.width
    }

    /// Grid height in cells
    #[inline]
    pub fn height(&self) -> i16 {
        self.height
    }

    /// Total number of cells
    #[inline]
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Convert a grid coordinate to the physical position of its cell origin
    #[inline]
    pub fn to_position(&self, coord: GridCoord) -> Position {
        Position::new(
            ((coord.col as i32 - self.origin.col as i32) * self.cell_size as i32) as i16,
            ((coord.row as i32 - self.origin.row as i32) * self.cell_size as i32) as i16,
        )
    }

    /// Convert a physical position to the grid coordinate of its cell
    #[inline]
    pub fn to_grid(&self, position: Position) -> GridCoord {
        GridCoord::new(
            ((position.x as i32).div_euclid(self.cell_size as i32) + self.origin.col as i32)
                as i16,
            ((position.y as i32).div_euclid(self.cell_size as i32) + self.origin.row as i32)
                as i16,
        )
    }

    /// Check whether a grid coordinate is inside the grid extent
    #[inline]
    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.col >= 0 && coord.col < self.width && coord.row >= 0 && coord.row < self.height
    }

    /// Flat index for an in-bounds coordinate
    #[inline]
    fn index(&self, coord: GridCoord) -> Option<usize> {
        if self.contains(coord) {
            Some(coord.row as usize * self.width as usize + coord.col as usize)
        } else {
            None
        }
    }

    /// Record a classification at a physical position
    ///
    /// Returns [`Error::OutOfBounds`] when the position falls outside the
    /// grid; the grid is left unchanged.
    pub fn set_cell(&mut self, position: Position, kind: CellKind) -> Result<()> {
        let coord = self.to_grid(position);
        match self.index(coord) {
            Some(i) => {
                self.cells[i] = kind as u8;
                Ok(())
            }
            None => Err(Error::OutOfBounds {
                x: position.x,
                y: position.y,
            }),
        }
    }

    /// Classification stored at a physical position
    ///
    /// Out-of-bounds positions read as [`CellKind::Empty`].
    pub fn get_cell(&self, position: Position) -> CellKind {
        self.index(self.to_grid(position))
            .map(|i| CellKind::from_u8(self.cells[i]))
            .unwrap_or(CellKind::Empty)
    }

    /// All cells holding one classification, in row-major scan order
    ///
    /// The result is deterministic given the grid contents and never
    /// larger than the grid capacity.
    pub fn cells_of_type(&self, kind: CellKind) -> PointCluster {
        let mut points = Vec::new();
        for row in 0..self.height {
            for col in 0..self.width {
                let i = row as usize * self.width as usize + col as usize;
                if CellKind::from_u8(self.cells[i]) == kind {
                    points.push(self.to_position(GridCoord::new(col, row)));
                }
            }
        }
        PointCluster { points }
    }

    /// Iterate over all non-empty cells with their coordinates
    pub fn iter_known(&self) -> impl Iterator<Item = (GridCoord, CellKind)> + '_ {
        (0..self.cells.len()).filter_map(move |i| {
            let kind = CellKind::from_u8(self.cells[i]);
            if kind == CellKind::Empty {
                None
            } else {
                Some((
                    GridCoord::new(
                        (i % self.width as usize) as i16,
                        (i / self.width as usize) as i16,
                    ),
                    kind,
                ))
            }
        })
    }

    /// Reset every cell to [`CellKind::Empty`]
    pub fn clear(&mut self) {
        self.cells.fill(CellKind::Empty as u8);
    }

    /// Fill the grid with a procedurally generated layout for offline
    /// testing: border cells all around, random obstacles and targets
    /// inside. Seeded for reproducibility.
    pub fn fill_random(&mut self, seed: u64) {
        let mut rng = StdRng::seed_from_u64(seed);
        for row in 0..self.height {
            for col in 0..self.width {
                let i = row as usize * self.width as usize + col as usize;
                let on_border =
                    row == 0 || col == 0 || row == self.height - 1 || col == self.width - 1;
                let kind = if on_border {
                    CellKind::Border
                } else {
                    match rng.random_range(0..100) {
                        0..10 => CellKind::Obstacle,
                        10..15 => CellKind::Target,
                        _ => CellKind::Floor,
                    }
                };
                self.cells[i] = kind as u8;
            }
        }
    }
}

/// Ordered collection of positions sharing one classification.
///
/// Produced by [`ArenaMap::cells_of_type`]; never exceeds the grid
/// capacity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PointCluster {
    points: Vec<Position>,
}

impl PointCluster {
    /// Number of positions in the cluster
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True when no cell matched
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Positions in scan order
    #[inline]
    pub fn positions(&self) -> &[Position] {
        &self.points
    }
}

impl IntoIterator for PointCluster {
    type Item = Position;
    type IntoIter = std::vec::IntoIter<Position>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.into_iter()
    }
}
