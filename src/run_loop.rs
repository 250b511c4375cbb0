use std::io;

use log::debug;

use crate::generator::{MazeGenerator, StepOutcome};
use crate::sampler::Sampler;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Quit,
    TogglePause,
}

/// Whatever shows the maze and turns user input into [`Signal`]s.
pub trait Display {
    /// Drains pending input without blocking.
    fn poll_signals(&mut self) -> io::Result<Vec<Signal>>;

    fn render<S: Sampler>(&mut self, maze: &MazeGenerator<S>, state: RunState) -> io::Result<()>;

    /// Waits out the rest of the current frame.
    fn pace(&mut self);
}

#[derive(Debug)]
pub struct RunLoop {
    state: RunState,
}

impl Default for RunLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLoop {
    pub fn new() -> Self {
        Self {
            state: RunState::Running,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn apply(&mut self, signal: Signal) {
        self.state = match (self.state, signal) {
            (_, Signal::Quit) => RunState::Stopped,
            (RunState::Running, Signal::TogglePause) => RunState::Paused,
            (RunState::Paused, Signal::TogglePause) => RunState::Running,
            (RunState::Stopped, Signal::TogglePause) => RunState::Stopped,
        };
        debug!("{:?} -> {:?}", signal, self.state);
    }

    /// Advances the maze by one step if running.
    pub fn tick<S: Sampler>(&self, maze: &mut MazeGenerator<S>) -> Option<StepOutcome> {
        match self.state {
            RunState::Running => Some(maze.step()),
            RunState::Paused | RunState::Stopped => None,
        }
    }

    /// Poll, step, render, pace until a quit signal arrives.
    pub fn run<D: Display, S: Sampler>(
        &mut self,
        display: &mut D,
        maze: &mut MazeGenerator<S>,
    ) -> io::Result<()> {
        while self.state != RunState::Stopped {
            for signal in display.poll_signals()? {
                self.apply(signal);
            }
            if self.state == RunState::Stopped {
                break;
            }
            self.tick(maze);
            display.render(maze, self.state)?;
            display.pace();
        }
        Ok(())
    }
}
