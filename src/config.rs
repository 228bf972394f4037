//! Configuration for the server link and arena map
//!
//! Loads configuration from a TOML file with the minimal parameters the
//! link and map need. Team identifiers and the server address are fixed
//! per competition and normally come from a deployed config file.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Largest supported grid width, fixed by the competition arena
pub const MAP_MAX_WIDTH: i16 = 26;
/// Largest supported grid height, fixed by the competition arena
pub const MAP_MAX_HEIGHT: i16 = 42;

/// Top-level application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub link: LinkConfig,
    pub map: MapConfig,
    pub logging: LoggingConfig,
}

/// Server link configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkConfig {
    /// Scoring server address, e.g. `192.168.0.10:8112`
    pub server_addr: String,
    /// Our own team identifier, stamped as frame source
    pub team_id: u8,
    /// The server's team identifier, stamped as frame destination
    pub server_team_id: u8,
    /// Bounded read timeout on the channel, in milliseconds
    pub read_timeout_ms: u64,
    /// Fixed sleep between reconnection attempts, in milliseconds
    pub reconnect_interval_ms: u64,
}

impl LinkConfig {
    /// Read timeout as a [`Duration`]
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    /// Reconnect interval as a [`Duration`]
    pub fn reconnect_interval(&self) -> Duration {
        Duration::from_millis(self.reconnect_interval_ms)
    }
}

/// Arena map configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MapConfig {
    /// Grid width in cells (at most [`MAP_MAX_WIDTH`])
    pub width: i16,
    /// Grid height in cells (at most [`MAP_MAX_HEIGHT`])
    pub height: i16,
    /// Grid column corresponding to physical x = 0
    pub origin_col: i16,
    /// Grid row corresponding to physical y = 0
    pub origin_row: i16,
    /// Physical size of one cell, in millimetres
    pub cell_size_mm: i16,
}

impl MapConfig {
    /// Validate grid dimensions against the fixed arena bounds
    pub fn validate(&self) -> Result<()> {
        if self.width < 1 || self.width > MAP_MAX_WIDTH {
            return Err(Error::InvalidParameter(format!(
                "map width {} outside 1..={}",
                self.width, MAP_MAX_WIDTH
            )));
        }
        if self.height < 1 || self.height > MAP_MAX_HEIGHT {
            return Err(Error::InvalidParameter(format!(
                "map height {} outside 1..={}",
                self.height, MAP_MAX_HEIGHT
            )));
        }
        if !(1..=1000).contains(&self.cell_size_mm) {
            return Err(Error::InvalidParameter(format!(
                "cell size {} mm outside 1..=1000",
                self.cell_size_mm
            )));
        }
        // The origin is the start cell and must lie on the grid
        if self.origin_col < 0 || self.origin_col >= self.width {
            return Err(Error::InvalidParameter(format!(
                "origin column {} outside grid width {}",
                self.origin_col, self.width
            )));
        }
        if self.origin_row < 0 || self.origin_row >= self.height {
            return Err(Error::InvalidParameter(format!(
                "origin row {} outside grid height {}",
                self.origin_row, self.height
            )));
        }
        // Every cell's physical coordinates must fit the 16-bit wire
        // fields exactly: the farthest cell sits (dimension - 1) cells
        // from an on-grid origin.
        let span = (self.width.max(self.height) as i32 - 1) * self.cell_size_mm as i32;
        if span > i16::MAX as i32 {
            return Err(Error::InvalidParameter(format!(
                "grid extent {} mm exceeds the {} mm coordinate range",
                span,
                i16::MAX
            )));
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.map.validate()?;
        Ok(config)
    }

    /// Default configuration for the small competition arena
    ///
    /// Grid extent and start cell match the physical small arena.
    /// Suitable for testing; deployments use a TOML file.
    pub fn small_arena_defaults() -> Self {
        Self {
            link: LinkConfig {
                server_addr: "192.168.0.10:8112".to_string(),
                team_id: 5,
                server_team_id: 0,
                read_timeout_ms: 1000,
                reconnect_interval_ms: 2000,
            },
            map: MapConfig {
                width: 13,
                height: 21,
                origin_col: 6,
                origin_row: 1,
                cell_size_mm: 100,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::small_arena_defaults()
    }
}
