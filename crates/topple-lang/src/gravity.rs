//! Falling-character preprocessor.
//!
//! Source text is a 2D grid. Every non-blank character must rest, directly or
//! through a diagonal staircase, on the foundation: the bottommost row holding
//! an unquoted `#`. Anything else falls straight down its column before the
//! program is tokenized, landing on the first character beneath it or falling
//! out of the grid entirely.

use tracing::debug;

/// Cells that never support anything and are free for a falling character.
fn is_blank(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Support {
    /// On the current evaluation path; revisiting it means a cycle.
    Visiting,
    Supported,
    Unsupported,
}

/// Per-query memo of support results, indexed `row * width + col`.
struct SupportMemo(Vec<Option<Support>>);

impl SupportMemo {
    fn new(len: usize) -> Self { Self(vec![None; len]) }
}

/// Counters from one `settle` run, logged and handy for tooling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettleReport {
    pub sweeps: usize,
    pub moved: usize,
    pub dropped: usize,
}

// ─── Grid ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Grid {
    cells: Vec<Vec<char>>,
    width: usize,
    foundation: Option<usize>,
}

impl Grid {
    /// Builds a rectangular grid, padding short lines with blanks.
    pub fn new(source: &str) -> Self {
        let mut cells: Vec<Vec<char>> = source.split('\n').map(|l| l.chars().collect()).collect();
        let width = cells.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut cells {
            row.resize(width, ' ');
        }
        let foundation = find_foundation(&cells);
        Self { cells, width, foundation }
    }

    pub fn height(&self) -> usize { self.cells.len() }
    pub fn width(&self) -> usize { self.width }
    pub fn foundation_row(&self) -> Option<usize> { self.foundation }

    pub fn get(&self, row: usize, col: usize) -> char {
        self.cells.get(row).and_then(|r| r.get(col)).copied().unwrap_or(' ')
    }

    /// Is the cell transitively grounded on the foundation?
    pub fn is_supported(&self, row: usize, col: usize) -> bool {
        let mut memo = SupportMemo::new(self.height() * self.width);
        self.supported(row, col, &mut memo)
    }

    fn supported(&self, row: usize, col: usize, memo: &mut SupportMemo) -> bool {
        let ch = self.get(row, col);
        if is_blank(ch) { return false; }
        let Some(foundation) = self.foundation else { return false };
        if row == foundation && ch == '#' { return true; }
        if row >= foundation { return false; }

        let idx = row * self.width + col;
        match memo.0[idx] {
            Some(Support::Supported) => return true,
            Some(Support::Unsupported) | Some(Support::Visiting) => return false,
            None => {}
        }
        memo.0[idx] = Some(Support::Visiting);

        let below = row + 1;
        let lo = col.saturating_sub(1);
        let hi = (col + 1).min(self.width - 1);
        let grounded = (lo..=hi).any(|c| !is_blank(self.get(below, c)) && self.supported(below, c, memo));

        memo.0[idx] = Some(if grounded { Support::Supported } else { Support::Unsupported });
        grounded
    }

    /// Every unsupported non-blank cell above the foundation, or every
    /// non-blank cell when there is no foundation. Does not touch the grid.
    pub fn unsupported_positions(&self) -> Vec<(usize, usize)> {
        let mut out = Vec::new();
        let Some(foundation) = self.foundation else {
            for (row, line) in self.cells.iter().enumerate() {
                for (col, &ch) in line.iter().enumerate() {
                    if !is_blank(ch) { out.push((row, col)); }
                }
            }
            return out;
        };

        let mut memo = SupportMemo::new(self.height() * self.width);
        for row in 0..foundation {
            for col in 0..self.width {
                if !is_blank(self.get(row, col)) && !self.supported(row, col, &mut memo) {
                    out.push((row, col));
                }
            }
        }
        out
    }

    /// Runs the fall simulation to a fixed point.
    pub fn settle(&mut self) -> SettleReport {
        let mut report = SettleReport::default();
        let Some(foundation) = self.foundation else { return report };
        let limit = (self.height() * self.width).max(1);

        for _ in 0..limit {
            report.sweeps += 1;
            let mut changed = false;

            for row in (0..foundation).rev() {
                // The grid changes after every row, so support is re-derived.
                let mut memo = SupportMemo::new(self.height() * self.width);
                let falling: Vec<(usize, char)> = (0..self.width)
                    .filter(|&col| {
                        let ch = self.get(row, col);
                        !is_blank(ch) && !self.supported(row, col, &mut memo)
                    })
                    .map(|col| (col, self.cells[row][col]))
                    .collect();

                for &(col, _) in &falling {
                    self.cells[row][col] = ' ';
                }
                for (col, ch) in falling {
                    match self.landing_row(row, col) {
                        Some(land) => {
                            self.cells[land][col] = ch;
                            if land != row {
                                changed = true;
                                report.moved += 1;
                            }
                        }
                        None => {
                            changed = true;
                            report.dropped += 1;
                        }
                    }
                }
            }

            if !changed { break; }
        }

        debug!(
            foundation,
            sweeps = report.sweeps,
            moved = report.moved,
            dropped = report.dropped,
            "grid settled"
        );
        report
    }

    /// Row a character released at `row` comes to rest in, or `None` when
    /// nothing below it stops the fall.
    fn landing_row(&self, row: usize, col: usize) -> Option<usize> {
        (row + 1..self.height())
            .find(|&r| !is_blank(self.cells[r][col]))
            .map(|r| r - 1)
    }

    /// Serializes the grid, trimming trailing blanks per line.
    pub fn render(&self) -> String {
        self.cells
            .iter()
            .map(|row| {
                let line: String = row.iter().collect();
                line.trim_end_matches(is_blank).to_string()
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Bottom-to-top, left-to-right scan for the first `#` outside a string.
fn find_foundation(cells: &[Vec<char>]) -> Option<usize> {
    for (row, line) in cells.iter().enumerate().rev() {
        let mut in_string = false;
        for &ch in line {
            match ch {
                '"' => in_string = !in_string,
                '#' if !in_string => return Some(row),
                _ => {}
            }
        }
    }
    None
}

// ─── Entry points ─────────────────────────────────────────────────────────────

/// Lets every unsupported character fall and returns the settled source.
/// A program without a foundation is unsupported as a whole: the result is empty.
pub fn process(source: &str) -> String {
    process_with_report(source).0
}

pub fn process_with_report(source: &str) -> (String, SettleReport) {
    let mut grid = Grid::new(source);
    if grid.foundation_row().is_none() {
        debug!("no foundation row, whole program falls out");
        return (String::new(), SettleReport::default());
    }
    let report = grid.settle();
    (grid.render(), report)
}

/// Positions (row, column) in `source` that would fall, for editor highlighting.
pub fn unsupported_positions(source: &str) -> Vec<(usize, usize)> {
    Grid::new(source).unsupported_positions()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn foundation_is_bottommost_hash_row() {
        assert_eq!(Grid::new("#\nx\n##").foundation_row(), Some(2));
        assert_eq!(Grid::new("##\nx\ny").foundation_row(), Some(0));
    }

    #[test]
    fn quoted_hash_is_not_a_foundation() {
        let g = Grid::new("#\n\"#\"");
        assert_eq!(g.foundation_row(), Some(0));
    }

    #[test]
    fn no_foundation_means_empty_program() {
        assert_eq!(process("x = 1\ny = 2"), "");
        assert_eq!(process(""), "");
    }

    #[test]
    fn directly_supported_stays() {
        assert_eq!(process("x\n#"), "x\n#");
    }

    #[test]
    fn diagonal_support_counts() {
        assert_eq!(process(" x\n#"), " x\n#");
        assert_eq!(process("x\n #"), "x\n #");
    }

    #[test]
    fn staircase_is_transitively_supported() {
        let src = "  c\n b\na\n#";
        assert_eq!(process(src), src);
    }

    #[test]
    fn unsupported_char_falls_out_of_grid() {
        assert_eq!(process("  x\n#"), "\n#");
    }

    #[test]
    fn falling_char_lands_on_first_char_below() {
        assert_eq!(process("x\n\n#"), "\nx\n#");
    }

    #[test]
    fn overhang_falls_out() {
        assert_eq!(process("x = 10\n###"), "x =\n###");
    }

    #[test]
    fn rows_below_foundation_are_left_alone() {
        assert_eq!(process("x\n#\n y"), "x\n#\n y");
    }

    #[test]
    fn settles_a_stack_in_one_sweep() {
        let (out, report) = process_with_report("a\nb\n\n#");
        assert_eq!(out, "\na\nb\n#");
        assert_eq!(report.moved, 2);
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn unsupported_positions_does_not_mutate() {
        let g = Grid::new("ab   c\n##");
        assert_eq!(g.unsupported_positions(), vec![(0, 5)]);
        assert_eq!(g.render(), "ab   c\n##");
    }

    #[test]
    fn unsupported_positions_without_foundation_lists_everything() {
        assert_eq!(unsupported_positions("a b"), vec![(0, 0), (0, 2)]);
    }

    #[test]
    fn blank_is_never_supported() {
        let g = Grid::new(" \n#");
        assert!(!g.is_supported(0, 0));
        assert!(g.is_supported(1, 0));
    }

    #[test]
    fn process_is_idempotent() {
        let src = "   fun f() {\n  x\n      return 1 }\n  y = f()\n####";
        let once = process(src);
        assert_eq!(process(&once), once);
    }
}
