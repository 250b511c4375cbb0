//! Crossterm frontend: polls keys, paces frames and redraws only the tiles
//! that changed since the previous frame.

use std::io::{self, Stdout, Write};
use std::thread;
use std::time::{Duration, Instant};

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{ExecutableCommand, QueueableCommand};
use log::{debug, warn};
use unicode_width::UnicodeWidthStr;

use crate::generator::MazeGenerator;
use crate::grid::{Dir, Pos};
use crate::run_loop::{Display, RunState, Signal};
use crate::sampler::Sampler;

pub const CELL_W: usize = 2;

/// One square of the drawn lattice. Cells sit at odd coordinates, the
/// passages between them at mixed parity, wall posts at even/even.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Border,
    Wall,
    Unvisited,
    Path,
    Cursor,
}

pub fn lattice_size(cols: usize, rows: usize) -> (usize, usize) {
    (cols * 2 + 1, rows * 2 + 1)
}

pub fn tile_at<S: Sampler>(maze: &MazeGenerator<S>, tx: usize, ty: usize) -> Tile {
    let grid = maze.grid();
    let (w, h) = lattice_size(grid.cols(), grid.rows());
    if tx == 0 || ty == 0 || tx == w - 1 || ty == h - 1 {
        return Tile::Border;
    }
    match (tx % 2 == 1, ty % 2 == 1) {
        (true, true) => {
            let pos = Pos::new(tx / 2, ty / 2);
            if maze.cursor() == Some(pos) {
                Tile::Cursor
            } else if grid.is_visited(pos) {
                Tile::Path
            } else {
                Tile::Unvisited
            }
        }
        // Passage between (tx/2 - 1, y) and (tx/2, y).
        (false, true) => open_or_wall(grid.has_opening(Pos::new(tx / 2 - 1, ty / 2), Dir::East)),
        (true, false) => open_or_wall(grid.has_opening(Pos::new(tx / 2, ty / 2 - 1), Dir::South)),
        (false, false) => Tile::Wall,
    }
}

fn open_or_wall(open: bool) -> Tile {
    if open {
        Tile::Path
    } else {
        Tile::Wall
    }
}

pub fn signal_for(key: KeyEvent) -> Option<Signal> {
    if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Signal::Quit),
        KeyCode::Char('q') | KeyCode::Esc => Some(Signal::Quit),
        KeyCode::Char('p') | KeyCode::Char(' ') => Some(Signal::TogglePause),
        _ => None,
    }
}

/// Raw mode, alternate screen and hidden cursor for as long as it lives.
/// Dropping it restores the terminal even when entering failed half way.
pub struct TerminalSession<W: Write> {
    out: W,
    raw_mode: bool,
}

impl<W: Write> TerminalSession<W> {
    pub fn enter(out: W, raw_mode: bool) -> io::Result<Self> {
        if raw_mode {
            terminal::enable_raw_mode()?;
        }
        let mut session = Self { out, raw_mode };
        session.out.execute(EnterAlternateScreen)?;
        session.out.execute(Hide)?;
        Ok(session)
    }
}

impl<W: Write> Drop for TerminalSession<W> {
    fn drop(&mut self) {
        let restored = self
            .out
            .execute(Show)
            .and_then(|out| out.execute(LeaveAlternateScreen))
            .map(|_| ());
        let restored = if self.raw_mode {
            restored.and(terminal::disable_raw_mode())
        } else {
            restored
        };
        if let Err(err) = restored {
            warn!("failed to restore terminal: {}", err);
        }
    }
}

fn glyph(tile: Tile) -> (&'static str, Color) {
    match tile {
        Tile::Border => ("██", Color::DarkCyan),
        Tile::Wall => ("  ", Color::Reset),
        Tile::Unvisited => ("·", Color::DarkBlue),
        Tile::Path => ("██", Color::White),
        Tile::Cursor => ("●", Color::Red),
    }
}

/// Glyph text right-padded with spaces to exactly `CELL_W` columns.
fn tile_text(tile: Tile) -> String {
    let (text, _) = glyph(tile);
    let mut padded = text.to_owned();
    let w = UnicodeWidthStr::width(text);
    if w < CELL_W {
        padded.extend(std::iter::repeat(' ').take(CELL_W - w));
    }
    padded
}

type SizeSource = Box<dyn FnMut() -> io::Result<(u16, u16)>>;

pub struct TerminalDisplay<W: Write = Stdout> {
    out: W,
    size: SizeSource,
    last: Vec<Tile>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
    drawn: usize,
    frame_time: Duration,
    frame_start: Instant,
}

impl TerminalDisplay<Stdout> {
    pub fn new(stdout: Stdout, cols: usize, rows: usize, frame_time: Duration) -> Self {
        Self::with_size_source(stdout, Box::new(terminal::size), cols, rows, frame_time)
    }
}

impl<W: Write> TerminalDisplay<W> {
    pub fn with_size_source(
        out: W,
        size: SizeSource,
        cols: usize,
        rows: usize,
        frame_time: Duration,
    ) -> Self {
        let (w, h) = lattice_size(cols, rows);
        Self {
            out,
            size,
            last: vec![Tile::Wall; w * h],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
            drawn: 0,
            frame_time,
            frame_start: Instant::now(),
        }
    }

    /// Tiles written by the most recent `render`.
    pub fn drawn(&self) -> usize {
        self.drawn
    }

    fn draw_tile(&mut self, tx: u16, ty: u16, tile: Tile) -> io::Result<()> {
        let (_, color) = glyph(tile);
        // The caller checked the whole lattice fits on screen.
        let x_pos = self.origin_x + tx * CELL_W as u16;
        let y_pos = self.origin_y + ty;
        self.out.queue(MoveTo(x_pos, y_pos))?;
        self.out.queue(SetForegroundColor(color))?;
        self.out.queue(Print(tile_text(tile)))?;
        self.out.queue(ResetColor)?;
        Ok(())
    }

    fn render_too_small(&mut self, needed: (Option<u16>, Option<u16>), term: (u16, u16)) -> io::Result<()> {
        let show = |n: Option<u16>| n.map_or_else(|| format!(">{}", u16::MAX), |n| n.to_string());
        self.out.queue(Clear(ClearType::All))?;
        let msg = format!(
            "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
            show(needed.0),
            show(needed.1),
            term.0,
            term.1
        );
        self.out.queue(Print(msg))?;
        self.out.flush()?;
        self.needs_full = true;
        self.drawn = 0;
        Ok(())
    }
}

fn hud<S: Sampler>(maze: &MazeGenerator<S>, state: RunState) -> String {
    let label = if maze.is_complete() {
        "DONE"
    } else if state == RunState::Paused {
        "PAUSED"
    } else {
        "RUNNING"
    };
    format!(
        "Visited: {}/{}  Stack: {}  Steps: {}  [{}]  (p pause, q quit)",
        maze.visited_count(),
        maze.total_cells(),
        maze.stack_depth(),
        maze.steps(),
        label
    )
}

impl<W: Write> Display for TerminalDisplay<W> {
    fn poll_signals(&mut self) -> io::Result<Vec<Signal>> {
        let mut signals = Vec::new();
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(key) => signals.extend(signal_for(key)),
                Event::Resize(w, h) => {
                    debug!("terminal resized to {}x{}", w, h);
                    self.needs_full = true;
                }
                _ => {}
            }
        }
        Ok(signals)
    }

    fn render<S: Sampler>(&mut self, maze: &MazeGenerator<S>, state: RunState) -> io::Result<()> {
        let grid = maze.grid();
        let (w, h) = lattice_size(grid.cols(), grid.rows());
        let needed_w = w.checked_mul(CELL_W).and_then(|n| u16::try_from(n).ok());
        let needed_h = h.checked_add(2).and_then(|n| u16::try_from(n).ok());

        self.out.queue(MoveTo(0, 0))?;

        let (term_w, term_h) = (self.size)()?;
        let (needed_w, needed_h) = match (needed_w, needed_h) {
            (Some(nw), Some(nh)) if term_w >= nw && term_h >= nh => (nw, nh),
            needed => return self.render_too_small(needed, (term_w, term_h)),
        };

        let origin_x = (term_w - needed_w) / 2;
        let origin_y = (term_h - needed_h) / 2 + 1;
        if origin_x != self.origin_x || origin_y != self.origin_y {
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
        }
        if self.needs_full {
            self.out.queue(Clear(ClearType::All))?;
        }

        let hud = hud(maze, state);
        if self.needs_full || hud != self.last_hud {
            self.out.queue(MoveTo(self.origin_x, self.origin_y - 1))?;
            self.out.queue(SetForegroundColor(Color::White))?;
            self.out.queue(Clear(ClearType::CurrentLine))?;
            self.out.queue(Print(&hud))?;
            self.out.queue(ResetColor)?;
            self.last_hud = hud;
        }

        // Both fit in u16: the lattice is no larger than needed_w x needed_h.
        let mut drawn = 0;
        for (ty, row) in (0..h).zip(0u16..) {
            for (tx, col) in (0..w).zip(0u16..) {
                let tile = tile_at(maze, tx, ty);
                let idx = ty * w + tx;
                if self.needs_full || tile != self.last[idx] {
                    self.last[idx] = tile;
                    self.draw_tile(col, row, tile)?;
                    drawn += 1;
                }
            }
        }
        self.needs_full = false;
        self.drawn = drawn;

        self.out.flush()?;
        Ok(())
    }

    fn pace(&mut self) {
        let elapsed = self.frame_start.elapsed();
        if elapsed < self.frame_time {
            thread::sleep(self.frame_time - elapsed);
        }
        self.frame_start = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::RngSampler;

    fn lattice<S: Sampler>(maze: &MazeGenerator<S>) -> Vec<Vec<Tile>> {
        let (w, h) = lattice_size(maze.grid().cols(), maze.grid().rows());
        (0..h).map(|ty| (0..w).map(|tx| tile_at(maze, tx, ty)).collect()).collect()
    }

    #[test]
    fn fresh_maze_shows_cursor_on_start() {
        let maze = MazeGenerator::new(3, 2, RngSampler::seeded(Some(0)));
        let tiles = lattice(&maze);
        assert_eq!(tiles.len(), 5);
        assert_eq!(tiles[0].len(), 7);
        assert!(tiles[0].iter().all(|&t| t == Tile::Border));
        assert!(tiles[4].iter().all(|&t| t == Tile::Border));
        assert_eq!(tiles[1][1], Tile::Cursor);
        assert_eq!(tiles[1][3], Tile::Unvisited);
        assert_eq!(tiles[3][5], Tile::Unvisited);
        assert_eq!(tiles[1][2], Tile::Wall);
        assert_eq!(tiles[2][2], Tile::Wall);
    }

    #[test]
    fn finished_maze_has_one_passage_per_edge_and_no_cursor() {
        let mut maze = MazeGenerator::new(4, 3, RngSampler::seeded(Some(8)));
        maze.run_to_completion();
        let tiles = lattice(&maze);

        let interior: Vec<Tile> = tiles[1..tiles.len() - 1]
            .iter()
            .flat_map(|row| row[1..row.len() - 1].iter().copied())
            .collect();
        assert!(!interior.contains(&Tile::Cursor));
        assert!(!interior.contains(&Tile::Unvisited));

        // 12 cell tiles plus one passage tile per carved opening.
        let paths = interior.iter().filter(|&&t| t == Tile::Path).count();
        assert_eq!(paths, 12 + 11);
    }

    #[test]
    fn passages_follow_openings() {
        let mut maze = MazeGenerator::new(2, 2, RngSampler::seeded(Some(4)));
        maze.run_to_completion();
        let grid = maze.grid();
        let east = tile_at(&maze, 2, 1) == Tile::Path;
        assert_eq!(east, grid.has_opening(Pos::new(0, 0), Dir::East));
        let south = tile_at(&maze, 1, 2) == Tile::Path;
        assert_eq!(south, grid.has_opening(Pos::new(0, 0), Dir::South));
        assert_eq!(tile_at(&maze, 2, 2), Tile::Wall);
    }

    #[test]
    fn keys_map_to_signals() {
        let key = |code| KeyEvent::new(code, KeyModifiers::NONE);
        assert_eq!(signal_for(key(KeyCode::Char('q'))), Some(Signal::Quit));
        assert_eq!(signal_for(key(KeyCode::Esc)), Some(Signal::Quit));
        assert_eq!(signal_for(key(KeyCode::Char('p'))), Some(Signal::TogglePause));
        assert_eq!(signal_for(key(KeyCode::Char(' '))), Some(Signal::TogglePause));
        assert_eq!(signal_for(key(KeyCode::Char('c'))), None);
        assert_eq!(
            signal_for(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(Signal::Quit)
        );

        let mut release = key(KeyCode::Char('p'));
        release.kind = KeyEventKind::Release;
        assert_eq!(signal_for(release), None);
    }

    #[test]
    fn hud_reports_progress_and_state() {
        let mut maze = MazeGenerator::new(2, 2, RngSampler::seeded(Some(2)));
        assert!(hud(&maze, RunState::Paused).contains("Visited: 1/4"));
        assert!(hud(&maze, RunState::Paused).contains("[PAUSED]"));
        assert!(hud(&maze, RunState::Running).contains("[RUNNING]"));
        maze.run_to_completion();
        assert!(hud(&maze, RunState::Running).contains("[DONE]"));
        assert!(hud(&maze, RunState::Running).contains("Stack: 0"));
    }

    /// Writer the test can read back while the display owns a clone.
    #[derive(Clone, Default)]
    struct SharedBuf {
        bytes: std::rc::Rc<std::cell::RefCell<Vec<u8>>>,
        fail_first: std::rc::Rc<std::cell::Cell<bool>>,
    }

    impl SharedBuf {
        fn failing_once() -> Self {
            let buf = Self::default();
            buf.fail_first.set(true);
            buf
        }

        fn text(&self) -> String {
            String::from_utf8_lossy(&self.bytes.borrow()).into_owned()
        }

        fn clear(&self) {
            self.bytes.borrow_mut().clear();
        }
    }

    impl Write for SharedBuf {
        fn write(&mut self, data: &[u8]) -> io::Result<usize> {
            if self.fail_first.replace(false) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"));
            }
            self.bytes.borrow_mut().extend_from_slice(data);
            Ok(data.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn display(
        buf: &SharedBuf,
        size: (u16, u16),
        cols: usize,
        rows: usize,
    ) -> (TerminalDisplay<SharedBuf>, std::rc::Rc<std::cell::Cell<(u16, u16)>>) {
        let term = std::rc::Rc::new(std::cell::Cell::new(size));
        let source = term.clone();
        let display = TerminalDisplay::with_size_source(
            buf.clone(),
            Box::new(move || Ok(source.get())),
            cols,
            rows,
            Duration::ZERO,
        );
        (display, term)
    }

    #[test]
    fn every_tile_is_padded_to_cell_width() {
        for tile in [Tile::Border, Tile::Wall, Tile::Unvisited, Tile::Path, Tile::Cursor] {
            let text = tile_text(tile);
            assert_eq!(UnicodeWidthStr::width(text.as_str()), CELL_W, "{:?} -> {:?}", tile, text);
        }
        assert_eq!(tile_text(Tile::Cursor), "● ");
        assert_eq!(tile_text(Tile::Unvisited), "· ");
        assert_eq!(tile_text(Tile::Path), "██");
    }

    #[test]
    fn small_terminal_gets_a_message() {
        let maze = MazeGenerator::new(3, 2, RngSampler::seeded(Some(1)));
        let buf = SharedBuf::default();
        let (mut display, _) = display(&buf, (10, 5), 3, 2);
        display.render(&maze, RunState::Running).unwrap();
        assert!(buf.text().contains("Need at least 14x7 (cols x rows). Current: 10x5."));
        assert_eq!(display.drawn(), 0);
    }

    #[test]
    fn lattice_taller_than_u16_is_too_small_not_a_panic() {
        // 1x32767 grid: 65535 lattice rows plus the status line.
        let maze = MazeGenerator::new(1, 32767, RngSampler::seeded(Some(1)));
        let buf = SharedBuf::default();
        let (mut display, _) = display(&buf, (80, 24), 1, 32767);
        display.render(&maze, RunState::Running).unwrap();
        assert!(buf.text().contains("Need at least 6x>65535"));
        assert_eq!(display.drawn(), 0);
    }

    #[test]
    fn only_changed_tiles_are_redrawn() {
        let mut maze = MazeGenerator::new(3, 2, RngSampler::seeded(Some(6)));
        let buf = SharedBuf::default();
        let (mut display, term) = display(&buf, (80, 24), 3, 2);

        display.render(&maze, RunState::Running).unwrap();
        assert_eq!(display.drawn(), 7 * 5);
        assert!(buf.text().contains("Visited: 1/6"));

        buf.clear();
        display.render(&maze, RunState::Running).unwrap();
        assert_eq!(display.drawn(), 0);
        assert!(!buf.text().contains("Visited"));

        // Old cursor becomes path, the passage opens, the new cell gets the cursor.
        maze.step();
        display.render(&maze, RunState::Running).unwrap();
        assert_eq!(display.drawn(), 3);

        // Moving the origin forces a full redraw.
        buf.clear();
        term.set((100, 30));
        display.render(&maze, RunState::Running).unwrap();
        assert_eq!(display.drawn(), 7 * 5);
        assert!(buf.text().contains("\x1b[2J"));
    }

    #[test]
    fn recovering_from_too_small_redraws_everything() {
        let maze = MazeGenerator::new(3, 2, RngSampler::seeded(Some(6)));
        let buf = SharedBuf::default();
        let (mut display, term) = display(&buf, (80, 24), 3, 2);
        display.render(&maze, RunState::Running).unwrap();

        term.set((4, 4));
        display.render(&maze, RunState::Running).unwrap();
        assert_eq!(display.drawn(), 0);

        term.set((80, 24));
        display.render(&maze, RunState::Running).unwrap();
        assert_eq!(display.drawn(), 7 * 5);
    }

    #[test]
    fn session_restores_screen_on_drop() {
        let buf = SharedBuf::default();
        let session = TerminalSession::enter(buf.clone(), false).unwrap();
        assert!(buf.text().contains("\x1b[?1049h"));
        assert!(buf.text().contains("\x1b[?25l"));
        drop(session);
        assert!(buf.text().contains("\x1b[?25h"));
        assert!(buf.text().contains("\x1b[?1049l"));
    }

    #[test]
    fn session_restores_screen_when_enter_fails() {
        let buf = SharedBuf::failing_once();
        assert!(TerminalSession::enter(buf.clone(), false).is_err());
        assert!(!buf.text().contains("\x1b[?1049h"));
        assert!(buf.text().contains("\x1b[?25h"));
        assert!(buf.text().contains("\x1b[?1049l"));
    }
}
