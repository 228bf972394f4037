//! Fundamental value types shared across the map and protocol layers

mod position;

pub use position::{CellKind, GridCoord, Position};
