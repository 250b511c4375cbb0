//! Perfect-maze generation by randomized depth-first backtracking, stepped
//! one cell at a time so a frontend can animate it.

pub mod error;
pub mod generator;
pub mod grid;
pub mod logging;
pub mod run_loop;
pub mod sampler;
pub mod settings;
pub mod terminal;

pub use error::{Error, Result};
pub use generator::{MazeGenerator, StepOutcome};
pub use grid::{Cell, Dir, Grid, Pos};
pub use run_loop::{Display, RunLoop, RunState, Signal};
pub use sampler::{RngSampler, Sampler};
pub use settings::Settings;
