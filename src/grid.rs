use bitflags::bitflags;

bitflags! {
    /// Per-cell state. An `OPEN_*` bit means the side has been carved through,
    /// so there is no wall there.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Cell: u8 {
        const VISITED    = 0b0000_0001;
        const OPEN_NORTH = 0b0000_0010;
        const OPEN_SOUTH = 0b0000_0100;
        const OPEN_EAST  = 0b0000_1000;
        const OPEN_WEST  = 0b0001_0000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

impl Pos {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    North,
    South,
    East,
    West,
}

impl Dir {
    /// Order in which neighbours are offered to the sampler.
    pub const ALL: [Dir; 4] = [Dir::West, Dir::East, Dir::North, Dir::South];

    pub fn delta(self) -> (isize, isize) {
        match self {
            Dir::North => (0, -1),
            Dir::South => (0, 1),
            Dir::East => (1, 0),
            Dir::West => (-1, 0),
        }
    }

    pub fn opposite(self) -> Dir {
        match self {
            Dir::North => Dir::South,
            Dir::South => Dir::North,
            Dir::East => Dir::West,
            Dir::West => Dir::East,
        }
    }

    pub fn opening(self) -> Cell {
        match self {
            Dir::North => Cell::OPEN_NORTH,
            Dir::South => Cell::OPEN_SOUTH,
            Dir::East => Cell::OPEN_EAST,
            Dir::West => Cell::OPEN_WEST,
        }
    }
}

/// Fixed-size row-major array of cells.
///
/// Accessors panic on out-of-bounds coordinates: callers are expected to go
/// through [`Grid::neighbor`] or iterate within `cols() x rows()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(cols: usize, rows: usize) -> Self {
        assert!(cols > 0 && rows > 0, "grid must be at least 1x1, got {}x{}", cols, rows);
        let total = cols
            .checked_mul(rows)
            .unwrap_or_else(|| panic!("{}x{} grid overflows usize", cols, rows));
        Self {
            cols,
            rows,
            cells: vec![Cell::empty(); total],
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    fn index_of(&self, pos: Pos) -> usize {
        assert!(
            pos.x < self.cols && pos.y < self.rows,
            "cell ({}, {}) outside {}x{} grid",
            pos.x,
            pos.y,
            self.cols,
            self.rows
        );
        pos.y * self.cols + pos.x
    }

    #[inline]
    pub fn get(&self, pos: Pos) -> Cell {
        self.cells[self.index_of(pos)]
    }

    #[inline]
    pub fn set_bit(&mut self, pos: Pos, bit: Cell) {
        let idx = self.index_of(pos);
        self.cells[idx] |= bit;
    }

    #[inline]
    pub fn is_visited(&self, pos: Pos) -> bool {
        self.get(pos).contains(Cell::VISITED)
    }

    #[inline]
    pub fn has_opening(&self, pos: Pos, dir: Dir) -> bool {
        self.get(pos).contains(dir.opening())
    }

    pub fn neighbor(&self, pos: Pos, dir: Dir) -> Option<Pos> {
        let (dx, dy) = dir.delta();
        let nx = pos.x as isize + dx;
        let ny = pos.y as isize + dy;
        if nx < 0 || ny < 0 {
            return None;
        }
        let nx = nx as usize;
        let ny = ny as usize;
        if nx >= self.cols || ny >= self.rows {
            return None;
        }
        Some(Pos::new(nx, ny))
    }

    /// Opens the side of `pos` facing `dir` together with the facing side of
    /// the neighbour, and returns the neighbour.
    pub fn carve(&mut self, pos: Pos, dir: Dir) -> Pos {
        let next = self.neighbor(pos, dir).unwrap_or_else(|| {
            panic!("cannot carve {:?} from ({}, {}): edge of grid", dir, pos.x, pos.y)
        });
        self.set_bit(pos, dir.opening());
        self.set_bit(next, dir.opposite().opening());
        next
    }

    /// Number of carved passages, each pair of mirrored openings counted once.
    pub fn opening_count(&self) -> usize {
        self.cells
            .iter()
            .map(|cell| {
                cell.intersection(Cell::OPEN_SOUTH | Cell::OPEN_EAST)
                    .bits()
                    .count_ones() as usize
            })
            .sum()
    }

    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.rows).flat_map(move |y| (0..self.cols).map(move |x| Pos::new(x, y)))
    }
}
