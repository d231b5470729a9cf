use rayon::iter::{IntoParallelIterator, ParallelIterator};

pub mod gpucompute;
pub mod scheduler;
pub mod seed;

pub use scheduler::{FrameScheduler, FrameStep, SchedulerState};
pub use seed::SeedPattern;

/// How neighbour lookups behave at the border of the grid.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgePolicy {
    /// The grid is a torus: the row above row 0 is the last row.
    #[default]
    Wrap,
    /// Cells outside the grid are permanently dead.
    Dead,
}

impl EdgePolicy {
    /// Value of the `wrap_edges` override constant in the compute shader.
    pub(crate) fn shader_constant(self) -> f64 {
        match self {
            EdgePolicy::Wrap => 1.0,
            EdgePolicy::Dead => 0.0,
        }
    }
}

/// One generation of a square grid, stored row-major as `0`/`1` words.
///
/// This is the host-side view of what lives in each cell buffer. The GPU never
/// reads it back; it is the seed for the buffers and the reference the rule is
/// tested against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    width: u32,
    cells: Vec<u32>,
}

impl Grid {
    pub fn new(width: u32) -> Grid {
        Grid {
            width,
            cells: vec![0; (width as usize) * (width as usize)],
        }
    }

    pub fn seeded(width: u32, pattern: &SeedPattern) -> Grid {
        let mut grid = Grid::new(width);
        pattern.apply(&mut grid);
        grid
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    pub fn live_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == 1).count()
    }

    pub fn get(&self, row: u32, col: u32) -> bool {
        self.cells[self.index(row, col)] == 1
    }

    pub fn set(&mut self, row: u32, col: u32, alive: bool) {
        let idx = self.index(row, col);
        self.cells[idx] = alive as u32;
    }

    fn index(&self, row: u32, col: u32) -> usize {
        debug_assert!(row < self.width && col < self.width);
        row as usize * self.width as usize + col as usize
    }

    /// Applies B3/S23 to every cell and returns the following generation.
    pub fn next_generation(&self, edges: EdgePolicy) -> Grid {
        let cells = (0..self.cells.len())
            .into_par_iter()
            .map(|idx| {
                let live = live_neighbours(&self.cells, idx, self.width, edges);
                let alive = self.cells[idx] == 1;
                (live == 3 || (alive && live == 2)) as u32
            })
            .collect();
        Grid {
            width: self.width,
            cells,
        }
    }

    /// Runs `generations` steps of the rule.
    pub fn advance(&self, generations: usize, edges: EdgePolicy) -> Grid {
        (0..generations).fold(self.clone(), |grid, _| grid.next_generation(edges))
    }
}

#[inline(always)]
fn live_neighbours(cells: &[u32], idx: usize, width: u32, edges: EdgePolicy) -> u32 {
    let w = width as isize;
    let row = idx as isize / w;
    let col = idx as isize % w;

    const N: [(isize, isize); 8] = [
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, -1),
        (0, 1),
        (1, -1),
        (1, 0),
        (1, 1),
    ];

    let mut live = 0;
    for (dr, dc) in N {
        let (nr, nc) = match edges {
            EdgePolicy::Wrap => ((row + dr).rem_euclid(w), (col + dc).rem_euclid(w)),
            EdgePolicy::Dead => {
                let (nr, nc) = (row + dr, col + dc);
                if nr < 0 || nr >= w || nc < 0 || nc >= w {
                    continue;
                }
                (nr, nc)
            }
        };
        live += cells[(nr * w + nc) as usize];
    }
    live
}

/// One of the two physical cell buffers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

impl Slot {
    pub fn other(self) -> Slot {
        match self {
            Slot::A => Slot::B,
            Slot::B => Slot::A,
        }
    }
}

/// Which buffer holds the readable generation for a frame.
///
/// `Even` frames read slot A and write slot B; `Odd` frames do the reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    Even,
    Odd,
}

impl Parity {
    pub fn of_step(step: u64) -> Parity {
        if step % 2 == 0 {
            Parity::Even
        } else {
            Parity::Odd
        }
    }

    /// Slot read as the current generation.
    pub fn source(self) -> Slot {
        match self {
            Parity::Even => Slot::A,
            Parity::Odd => Slot::B,
        }
    }

    /// Slot written as the next generation.
    pub fn destination(self) -> Slot {
        self.source().other()
    }
}

/// Exactly two values, one per physical slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pair<T> {
    a: T,
    b: T,
}

impl<T> Pair<T> {
    pub fn from_fn(mut f: impl FnMut(Slot) -> T) -> Pair<T> {
        let a = f(Slot::A);
        let b = f(Slot::B);
        Pair { a, b }
    }

    pub fn get(&self, slot: Slot) -> &T {
        match slot {
            Slot::A => &self.a,
            Slot::B => &self.b,
        }
    }
}
