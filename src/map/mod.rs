//! Discretized arena map populated from sensor observations

mod grid;

pub use grid::{ArenaMap, PointCluster};
