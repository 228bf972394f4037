//! Physical positions, grid coordinates and cell classifications.
//!
//! [`Position`] is a physical point on the arena floor in millimetres,
//! as produced by the odometry collaborator and as transmitted on the
//! wire. [`GridCoord`] is a discrete cell address in the arena map.
//! The two are distinct types on purpose: mixing them up was an easy
//! mistake when both were bare integer pairs.

/// Physical position on the arena floor, in millimetres.
///
/// Signed 16-bit so every reachable position is exactly representable
/// in a wire frame coordinate field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    /// X coordinate in millimetres
    pub x: i16,
    /// Y coordinate in millimetres
    pub y: i16,
}

impl Position {
    /// Create a new position
    #[inline]
    pub const fn new(x: i16, y: i16) -> Self {
        Self { x, y }
    }
}

/// Discrete cell address in the arena map.
///
/// Related to [`Position`] by the map's affine transform; may be
/// negative or past the grid extent before bounds checking.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct GridCoord {
    /// Column index
    pub col: i16,
    /// Row index
    pub row: i16,
}

impl GridCoord {
    /// Create a new grid coordinate
    #[inline]
    pub const fn new(col: i16, row: i16) -> Self {
        Self { col, row }
    }
}

/// Single-byte cell classification stored in the arena map.
///
/// `Empty` is the sentinel for cells never written. Each kind carries
/// the RGB colour used when reporting the cell to the scoring server.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CellKind {
    /// Not yet observed
    #[default]
    Empty = 0,
    /// Traversable floor
    Floor = 1,
    /// Movable obstacle
    Obstacle = 2,
    /// Arena border
    Border = 3,
    /// Scoring target area
    Target = 4,
}

impl CellKind {
    /// Convert from stored byte. Unknown values map to `Empty`.
    #[inline]
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => CellKind::Floor,
            2 => CellKind::Obstacle,
            3 => CellKind::Border,
            4 => CellKind::Target,
            _ => CellKind::Empty,
        }
    }

    /// RGB colour reported to the server for this classification
    pub fn report_color(self) -> (u8, u8, u8) {
        match self {
            CellKind::Empty => (0, 0, 0),
            CellKind::Floor => (255, 255, 255),
            CellKind::Obstacle => (255, 0, 0),
            CellKind::Border => (0, 0, 255),
            CellKind::Target => (0, 255, 0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_kind_byte_round_trip() {
        for kind in [
            CellKind::Empty,
            CellKind::Floor,
            CellKind::Obstacle,
            CellKind::Border,
            CellKind::Target,
        ] {
            assert_eq!(CellKind::from_u8(kind as u8), kind);
        }
    }

    #[test]
    fn test_unknown_byte_is_empty() {
        assert_eq!(CellKind::from_u8(200), CellKind::Empty);
    }
}
