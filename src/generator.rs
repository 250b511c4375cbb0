//! Randomized depth-first backtracking, one unit of work per [`MazeGenerator::step`].

use log::{info, trace};

use crate::grid::{Cell, Dir, Grid, Pos};
use crate::sampler::Sampler;

/// What a single call to [`MazeGenerator::step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// Walked from `from` into the previously unvisited `to`.
    Carved { from: Pos, to: Pos, dir: Dir },
    /// `from` was a dead end and was popped off the stack.
    Backtracked { from: Pos },
    /// Every cell is visited; nothing changed.
    Complete,
}

pub struct MazeGenerator<S> {
    grid: Grid,
    stack: Vec<Pos>,
    visited_count: usize,
    steps: usize,
    sampler: S,
}

impl<S: Sampler> MazeGenerator<S> {
    pub const START: Pos = Pos::new(0, 0);

    pub fn new(cols: usize, rows: usize, sampler: S) -> Self {
        let mut grid = Grid::new(cols, rows);
        grid.set_bit(Self::START, Cell::VISITED);
        let capacity = grid.total_cells();
        let mut generator = Self {
            grid,
            stack: Vec::with_capacity(capacity),
            visited_count: 1,
            steps: 0,
            sampler,
        };
        // On a 1x1 grid the start cell is the whole maze.
        if !generator.is_complete() {
            generator.stack.push(Self::START);
        }
        generator
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Cell at the top of the stack, `None` once the maze is complete.
    pub fn cursor(&self) -> Option<Pos> {
        self.stack.last().copied()
    }

    pub fn stack_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited_count
    }

    pub fn total_cells(&self) -> usize {
        self.grid.total_cells()
    }

    /// Number of steps that carved or backtracked.
    pub fn steps(&self) -> usize {
        self.steps
    }

    pub fn is_complete(&self) -> bool {
        self.visited_count == self.total_cells()
    }

    fn candidates(&self, pos: Pos) -> Vec<Dir> {
        Dir::ALL
            .into_iter()
            .filter(|&dir| match self.grid.neighbor(pos, dir) {
                Some(next) => !self.grid.is_visited(next),
                None => false,
            })
            .collect()
    }

    pub fn step(&mut self) -> StepOutcome {
        if self.is_complete() {
            return StepOutcome::Complete;
        }
        let current = match self.stack.last() {
            Some(&pos) => pos,
            None => unreachable!(
                "stack emptied with {} of {} cells visited",
                self.visited_count,
                self.total_cells()
            ),
        };
        self.steps += 1;

        let candidates = self.candidates(current);
        if candidates.is_empty() {
            self.stack.pop();
            trace!("backtrack from ({}, {}), depth {}", current.x, current.y, self.stack.len());
            return StepOutcome::Backtracked { from: current };
        }

        let idx = self.sampler.pick(candidates.len());
        let dir = candidates[idx];
        let next = self.grid.carve(current, dir);
        self.grid.set_bit(next, Cell::VISITED);
        self.visited_count += 1;
        trace!("carve {:?} from ({}, {}) to ({}, {})", dir, current.x, current.y, next.x, next.y);

        if self.is_complete() {
            // The rest of the stack would only unwind dead ends.
            self.stack.clear();
            info!(
                "maze {}x{} complete after {} steps",
                self.grid.cols(),
                self.grid.rows(),
                self.steps
            );
        } else {
            self.stack.push(next);
        }
        StepOutcome::Carved {
            from: current,
            to: next,
            dir,
        }
    }

    /// Steps until complete, returning how many steps did work.
    pub fn run_to_completion(&mut self) -> usize {
        let before = self.steps;
        while self.step() != StepOutcome::Complete {}
        self.steps - before
    }
}
