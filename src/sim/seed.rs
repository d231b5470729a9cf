use super::Grid;

/// Gosper's glider gun as `(row, col)` pairs, anchored near the top-left corner.
///
/// See <https://conwaylife.com/wiki/Gosper_glider_gun>.
pub const GOSPER_GLIDER_GUN: [(u32, u32); 36] = [
    // left block
    (5, 1),
    (5, 2),
    (6, 1),
    (6, 2),
    // left half of the shuttle
    (3, 13),
    (3, 14),
    (4, 12),
    (5, 11),
    (6, 11),
    (7, 11),
    (8, 12),
    (9, 13),
    (9, 14),
    // its tail
    (6, 15),
    (4, 16),
    (8, 16),
    (5, 17),
    (6, 17),
    (7, 17),
    (6, 18),
    // right half of the shuttle
    (3, 21),
    (4, 21),
    (5, 21),
    (3, 22),
    (4, 22),
    (5, 22),
    (2, 23),
    (6, 23),
    // its tail
    (1, 25),
    (2, 25),
    (6, 25),
    (7, 25),
    // right block
    (3, 35),
    (4, 35),
    (3, 36),
    (4, 36),
];

/// The initial generation written into the cell buffers.
#[derive(Clone, Debug, PartialEq)]
pub enum SeedPattern {
    GosperGliderGun,
    /// `cell[i] = i % 2`.
    Checkerboard,
    /// Each cell is alive with probability `density`, reproducible from `seed`.
    Random { density: f32, seed: u64 },
}

impl SeedPattern {
    /// Smallest grid width the pattern fits into.
    pub fn min_width(&self) -> u32 {
        match self {
            SeedPattern::GosperGliderGun => {
                let (rows, cols) = GOSPER_GLIDER_GUN
                    .iter()
                    .fold((0, 0), |(r, c), &(row, col)| (r.max(row), c.max(col)));
                rows.max(cols) + 1
            }
            SeedPattern::Checkerboard | SeedPattern::Random { .. } => 1,
        }
    }

    pub(super) fn apply(&self, grid: &mut Grid) {
        match self {
            SeedPattern::GosperGliderGun => {
                for &(row, col) in &GOSPER_GLIDER_GUN {
                    grid.set(row, col, true);
                }
            }
            SeedPattern::Checkerboard => {
                for (i, cell) in grid.cells.iter_mut().enumerate() {
                    *cell = (i % 2) as u32;
                }
            }
            SeedPattern::Random { density, seed } => {
                let mut rng = fastrand::Rng::with_seed(*seed);
                for cell in grid.cells.iter_mut() {
                    *cell = (rng.f32() < *density) as u32;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glider_gun_matches_table_exactly() {
        let grid = Grid::seeded(64, &SeedPattern::GosperGliderGun);
        assert_eq!(grid.live_count(), GOSPER_GLIDER_GUN.len());
        for &(row, col) in &GOSPER_GLIDER_GUN {
            assert!(grid.get(row, col), "({row}, {col}) should be alive");
        }
    }

    #[test]
    fn glider_gun_table_has_no_duplicates() {
        let mut sorted = GOSPER_GLIDER_GUN.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 36);
    }

    #[test]
    fn glider_gun_needs_37_columns() {
        assert_eq!(SeedPattern::GosperGliderGun.min_width(), 37);
    }

    #[test]
    fn checkerboard_alternates_by_index() {
        let grid = Grid::seeded(32, &SeedPattern::Checkerboard);
        assert_eq!(grid.cells().len(), 32 * 32);
        for (i, &cell) in grid.cells().iter().enumerate() {
            assert_eq!(cell, (i % 2) as u32);
        }
        assert_eq!(grid.live_count(), 512);
    }

    #[test]
    fn random_is_reproducible_and_binary() {
        let pattern = SeedPattern::Random {
            density: 0.3,
            seed: 7,
        };
        let a = Grid::seeded(40, &pattern);
        let b = Grid::seeded(40, &pattern);
        assert_eq!(a, b);
        assert!(a.cells().iter().all(|&c| c <= 1));
        assert!(a.live_count() > 0 && a.live_count() < 1600);
    }

    #[test]
    fn every_width_yields_width_squared_binary_cells() {
        for width in 1..=48 {
            for pattern in [SeedPattern::Checkerboard, SeedPattern::GosperGliderGun] {
                if width < pattern.min_width() {
                    continue;
                }
                let grid = Grid::seeded(width, &pattern);
                assert_eq!(grid.cells().len(), (width * width) as usize);
                assert!(grid.cells().iter().all(|&c| c == 0 || c == 1));
            }
        }
    }
}
