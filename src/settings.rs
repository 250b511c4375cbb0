use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::terminal::CELL_W;

pub const DEFAULT_COLS: usize = 18;
pub const DEFAULT_ROWS: usize = 10;
pub const DEFAULT_FPS: u64 = 60;
/// Widest grid whose lattice, `2 * cols + 1` tiles of `CELL_W` columns, fits in u16.
pub const MAX_COLS: usize = (u16::MAX as usize / CELL_W - 1) / 2;
/// Tallest grid whose lattice plus status line, `2 * rows + 3`, fits in u16.
pub const MAX_ROWS: usize = (u16::MAX as usize - 3) / 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub cols: usize,
    pub rows: usize,
    pub fps: u64,
    pub seed: Option<u64>,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cols: DEFAULT_COLS,
            rows: DEFAULT_ROWS,
            fps: DEFAULT_FPS,
            seed: None,
            log_file: None,
        }
    }
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let settings = Self {
            cols: positive(&lookup, "MAZE_COLS")?.unwrap_or(defaults.cols),
            rows: positive(&lookup, "MAZE_ROWS")?.unwrap_or(defaults.rows),
            fps: positive(&lookup, "MAZE_FPS")?.unwrap_or(defaults.fps),
            seed: parse(&lookup, "MAZE_SEED")?.map(|(_, seed)| seed),
            log_file: non_empty(&lookup, "MAZE_LOG").map(PathBuf::from),
        };
        settings.check_dimensions()?;
        Ok(settings)
    }

    /// The drawn lattice plus status line must be addressable in u16
    /// terminal coordinates.
    fn check_dimensions(&self) -> Result<()> {
        if self.cols > MAX_COLS {
            return Err(too_large("MAZE_COLS", self.cols, MAX_COLS));
        }
        if self.rows > MAX_ROWS {
            return Err(too_large("MAZE_ROWS", self.rows, MAX_ROWS));
        }
        if self.cols.checked_mul(self.rows).is_none() {
            return Err(Error::InvalidSetting {
                name: "MAZE_ROWS",
                value: self.rows.to_string(),
                reason: format!("{}x{} cells overflow", self.cols, self.rows),
            });
        }
        Ok(())
    }

    pub fn frame_time(&self) -> Duration {
        Duration::from_micros(1_000_000 / self.fps.max(1))
    }
}

fn non_empty(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn too_large(name: &'static str, value: usize, max: usize) -> Error {
    Error::InvalidSetting {
        name,
        value: value.to_string(),
        reason: format!("must be at most {}", max),
    }
}

/// Parsed value together with the trimmed text it came from.
fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<(String, T)>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup, name) {
        None => Ok(None),
        Some(value) => match value.parse::<T>() {
            Ok(parsed) => Ok(Some((value, parsed))),
            Err(err) => Err(Error::InvalidSetting {
                name,
                reason: err.to_string(),
                value,
            }),
        },
    }
}

fn positive<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str) -> Result<Option<T>>
where
    T: FromStr + Default + PartialEq,
    T::Err: std::fmt::Display,
{
    match parse::<T>(lookup, name)? {
        Some((value, v)) if v == T::default() => Err(Error::InvalidSetting {
            name,
            value,
            reason: "must be at least 1".to_owned(),
        }),
        other => Ok(other.map(|(_, v)| v)),
    }
}
