use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::{
    HEADROOM_ROWS, PLAYABLE_HEIGHT, PLAYABLE_WIDTH, SENTINEL_MARGIN_BOTTOM, SENTINEL_MARGIN_LEFT,
    TOTAL_HEIGHT, TOTAL_WIDTH, placement::Placement,
};

// Left sentinel: bits 0-1
const LEFT_SENTINEL_MASK: u16 = 0b11;
// Right sentinel: bits 12-13
const RIGHT_SENTINEL_MASK: u16 = 0b11 << (SENTINEL_MARGIN_LEFT + PLAYABLE_WIDTH);
const SENTINEL_MASK: u16 = LEFT_SENTINEL_MASK | RIGHT_SENTINEL_MASK;
const FULL_ROW_MASK: u16 = (1 << TOTAL_WIDTH) - 1;
pub(crate) const PLAYABLE_MASK: u16 = FULL_ROW_MASK & !SENTINEL_MASK;

/// Single row in the bit board representation.
///
/// # Bit Layout (LSB to MSB)
///
/// - Bits 0-1: Left sentinel (walls)
/// - Bits 2-11: Playable area (10 cells, left to right)
/// - Bits 12-13: Right sentinel (walls)
/// - Bits 14-15: Unused (padding)
///
/// Sentinel bits are always set, so a shifted piece mask that overflows a
/// side collides with the wall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRow {
    bits: u16,
}

impl BitRow {
    pub const EMPTY: Self = Self {
        bits: SENTINEL_MASK,
    };
    pub const FULL_SENTINEL: Self = Self {
        bits: FULL_ROW_MASK,
    };

    /// Raw bits including the wall columns.
    #[inline]
    #[must_use]
    pub fn bits(self) -> u16 {
        self.bits
    }

    /// Bits of the playable columns only; walls read as empty.
    #[inline]
    #[must_use]
    pub fn playable_bits(self) -> u16 {
        self.bits & PLAYABLE_MASK
    }

    #[inline]
    #[must_use]
    pub fn filled_cells(self) -> u32 {
        self.playable_bits().count_ones()
    }

    #[inline]
    #[must_use]
    pub fn is_playable_filled(self) -> bool {
        (self.bits & PLAYABLE_MASK) == PLAYABLE_MASK
    }

    #[inline]
    #[must_use]
    pub fn is_playable_empty(self) -> bool {
        self.playable_bits() == 0
    }

    /// Checks if playable column `col` is occupied.
    #[inline]
    #[must_use]
    pub fn is_cell_occupied(self, col: usize) -> bool {
        let bit = 1 << (col + SENTINEL_MARGIN_LEFT);
        (self.bits & bit) != 0
    }

    #[inline]
    fn occupy_cell(&mut self, col: usize) {
        self.bits |= 1 << (col + SENTINEL_MARGIN_LEFT);
    }
}

/// Board of bit rows for O(1)-per-row collision, merge, and line clearing.
///
/// Row 0 is the bottom of the array and row indices grow upwards:
///
/// ```text
/// 27 ┐
/// .. │ headroom (spawn and rotation space, always walls only)
/// 23 ┘
/// 22 ┐ <- ROOF, top-most reachable row
/// .. │ playable rows
///  3 ┘ <- FLOOR, bottom-most reachable row
///  2 ┐
///  1 │ sentinel floor (permanently full)
///  0 ┘
/// ```
///
/// The 2-column wall margin on each side lets every 4×4 piece box be shifted
/// so that its occupied cells reach the outermost playable columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitBoard {
    rows: [BitRow; TOTAL_HEIGHT],
}

impl Default for BitBoard {
    fn default() -> Self {
        Self::INITIAL
    }
}

// Serialized as the visible rows in `from_ascii` notation, top row first:
// `["..........", ..., "##........"]`. Sentinel rows and walls are implied.
impl Serialize for BitBoard {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_seq(self.rows[Self::FLOOR..].iter().rev().map(|row| {
            (0..PLAYABLE_WIDTH)
                .map(|col| if row.is_cell_occupied(col) { '#' } else { '.' })
                .collect::<String>()
        }))
    }
}

impl<'de> Deserialize<'de> for BitBoard {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let lines = Vec::<String>::deserialize(deserializer)?;
        let visible = TOTAL_HEIGHT - Self::FLOOR;
        if lines.len() != visible {
            return Err(D::Error::custom(format!(
                "expected {visible} rows, got {}",
                lines.len()
            )));
        }

        let mut board = Self::INITIAL;
        for (line, y) in lines.iter().zip((Self::FLOOR..TOTAL_HEIGHT).rev()) {
            if line.chars().count() != PLAYABLE_WIDTH {
                return Err(D::Error::custom(format!(
                    "row {y} must have {PLAYABLE_WIDTH} cells: {line:?}"
                )));
            }
            for (col, cell) in line.chars().enumerate() {
                match cell {
                    '#' => board.rows[y].occupy_cell(col),
                    '.' => {}
                    _ => {
                        return Err(D::Error::custom(format!(
                            "unexpected cell {cell:?} in row {y}"
                        )));
                    }
                }
            }
        }
        Ok(board)
    }
}

impl BitBoard {
    pub const TOTAL_WIDTH: usize = TOTAL_WIDTH;
    pub const TOTAL_HEIGHT: usize = TOTAL_HEIGHT;
    pub const PLAYABLE_WIDTH: usize = PLAYABLE_WIDTH;
    pub const PLAYABLE_HEIGHT: usize = PLAYABLE_HEIGHT;
    pub const HEADROOM_ROWS: usize = HEADROOM_ROWS;
    /// Bottom-most reachable row.
    pub const FLOOR: usize = SENTINEL_MARGIN_BOTTOM;
    /// Top-most reachable row.
    pub const ROOF: usize = SENTINEL_MARGIN_BOTTOM + PLAYABLE_HEIGHT - 1;
    pub const PLAYABLE_Y_RANGE: Range<usize> = Self::FLOOR..(Self::ROOF + 1);

    pub const INITIAL: Self = {
        let mut rows = [BitRow::EMPTY; TOTAL_HEIGHT];
        let mut y = 0;
        while y < SENTINEL_MARGIN_BOTTOM {
            rows[y] = BitRow::FULL_SENTINEL;
            y += 1;
        }
        Self { rows }
    };

    #[inline]
    #[must_use]
    pub fn row(&self, y: usize) -> BitRow {
        self.rows[y]
    }

    /// Checks if the placement overlaps occupied cells or walls.
    #[must_use]
    pub fn is_colliding(&self, placement: Placement) -> bool {
        let y0 = placement.y();
        (0..4).any(|i| placement.row_bits(i) & self.rows[y0 + i].bits != 0)
    }

    /// Checks that the placement is in bounds and does not collide.
    #[must_use]
    pub fn allows(&self, placement: Placement) -> bool {
        placement.is_in_bounds() && !self.is_colliding(placement)
    }

    /// Sets the placement's cells as occupied.
    pub fn fill_placement(&mut self, placement: Placement) {
        let y0 = placement.y();
        for (i, row) in self.rows[y0..][..4].iter_mut().enumerate() {
            row.bits |= placement.row_bits(i);
        }
    }

    /// Like [`Self::fill_placement`], but returns a new board.
    #[must_use]
    pub fn merged(&self, placement: Placement) -> Self {
        let mut board = *self;
        board.fill_placement(placement);
        board
    }

    /// Removes full rows after `placement` was merged and returns the updated
    /// summit together with the number of cleared lines.
    ///
    /// Only rows touched by the placement can have become full, so the scan
    /// starts at the placement's lowest cell and stops right after its highest
    /// cell if nothing was cleared. Otherwise the rows above are shifted down
    /// up to `summit`, and the rows vacated at the top are reset to empty.
    pub fn clear_lines(&mut self, placement: Placement, summit: usize) -> (usize, usize) {
        let top = placement.top_row();
        let summit = summit.max(top);
        let mut lines = 0;

        for src in placement.bottom_row()..=summit {
            let row = self.rows[src];
            if src <= top && row.is_playable_filled() {
                lines += 1;
                continue;
            }
            if lines == 0 {
                if src >= top {
                    break;
                }
                continue;
            }
            self.rows[src - lines] = row;
        }

        self.rows[summit + 1 - lines..=summit].fill(BitRow::EMPTY);
        (summit - lines, lines)
    }

    /// Checks whether any cell was locked above the roof.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.rows[Self::ROOF + 1..]
            .iter()
            .any(|row| !row.is_playable_empty())
    }

    /// Creates a `BitBoard` from ASCII art for testing.
    ///
    /// '#' represents an occupied cell, '.' an empty cell. Rows are given top
    /// to bottom and the last row lands on [`Self::FLOOR`].
    #[must_use]
    pub fn from_ascii(art: &str) -> Self {
        let mut board = Self::INITIAL;
        let lines: Vec<&str> = art.lines().filter(|line| !line.trim().is_empty()).collect();
        assert!(lines.len() <= PLAYABLE_HEIGHT + HEADROOM_ROWS);

        for (i, line) in lines.iter().rev().enumerate() {
            let chars: Vec<char> = line.chars().filter(|c| *c == '#' || *c == '.').collect();
            assert_eq!(
                chars.len(),
                Self::PLAYABLE_WIDTH,
                "Each row must have exactly {} cells, got {} at row {}",
                Self::PLAYABLE_WIDTH,
                chars.len(),
                i
            );
            for (col, &ch) in chars.iter().enumerate() {
                if ch == '#' {
                    board.rows[Self::FLOOR + i].occupy_cell(col);
                }
            }
        }
        board
    }
}

#[cfg(test)]
mod tests {
    use crate::core::piece::{PieceForm, PieceKind};

    use super::*;

    fn fill_row(board: &mut BitBoard, y: usize) {
        for col in 0..PLAYABLE_WIDTH {
            board.rows[y].occupy_cell(col);
        }
    }

    fn topmost_filled(board: &BitBoard) -> usize {
        (0..TOTAL_HEIGHT)
            .rev()
            .find(|&y| !board.rows[y].is_playable_empty())
            .unwrap_or(BitBoard::FLOOR - 1)
    }

    #[test]
    fn test_initial_board() {
        let board = BitBoard::INITIAL;

        for y in 0..TOTAL_HEIGHT {
            for x in 0..TOTAL_WIDTH {
                let cell = board.rows[y].bits & (1 << x) != 0;
                if y < BitBoard::FLOOR {
                    assert!(cell, "Floor sentinels should be occupied at ({x}, {y})");
                    continue;
                }
                if !(SENTINEL_MARGIN_LEFT..SENTINEL_MARGIN_LEFT + PLAYABLE_WIDTH).contains(&x) {
                    assert!(cell, "Side sentinels should be occupied at ({x}, {y})");
                    continue;
                }
                assert!(!cell, "Playable area should not be occupied at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_bit_row_is_playable_filled() {
        let mut row = BitRow::EMPTY;
        assert!(!row.is_playable_filled());
        for col in 0..PLAYABLE_WIDTH {
            row.occupy_cell(col);
        }
        assert!(row.is_playable_filled());
        assert_eq!(row.filled_cells(), 10);
    }

    #[test]
    fn test_from_ascii_is_bottom_aligned() {
        let board = BitBoard::from_ascii(
            r"
            .#........
            #.........
            ",
        );
        assert!(board.row(BitBoard::FLOOR).is_cell_occupied(0));
        assert!(board.row(BitBoard::FLOOR + 1).is_cell_occupied(1));
        assert_eq!(board.row(BitBoard::FLOOR).bits(), 0x3007);
    }

    #[test]
    fn test_merge_is_idempotent_and_monotone() {
        let board = BitBoard::from_ascii(
            r"
            ..#.......
            .###....#.
            ",
        );
        for kind in PieceKind::ALL {
            for form in kind.forms() {
                let geometry = kind.geometry(form);
                for x in geometry.x_min()..=geometry.x_max() {
                    for y in 0..=TOTAL_HEIGHT - 4 {
                        let placement = Placement::new(kind, form, x, y);
                        let once = board.merged(placement);
                        assert_eq!(once.merged(placement), once);
                        for (before, after) in board.rows.iter().zip(&once.rows) {
                            assert_eq!(before.bits & after.bits, before.bits);
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_allows_implies_not_colliding() {
        let board = BitBoard::from_ascii(
            r"
            ##....##..
            ###..####.
            ",
        );
        for kind in PieceKind::ALL {
            for form in 0..PieceForm::LEN {
                let form = PieceForm::from_index(form);
                for x in 0..TOTAL_WIDTH {
                    for y in 0..=TOTAL_HEIGHT - 4 {
                        let placement = Placement::new(kind, form, x, y);
                        if board.allows(placement) {
                            assert!(!board.is_colliding(placement));
                            assert!(placement.is_in_bounds());
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_wall_collision() {
        let board = BitBoard::INITIAL;
        let vertical_i = PieceForm::from_index(1);
        // box column 2 shifted 0 lands on playable column 0; shifted 13 overflows
        assert!(!board.is_colliding(Placement::new(PieceKind::I, vertical_i, 0, 10)));
        assert!(board.is_colliding(Placement::new(PieceKind::I, vertical_i, 10, 10)));
        // sentinel floor
        assert!(board.is_colliding(Placement::new(PieceKind::I, vertical_i, 4, 0)));
    }

    #[test]
    fn test_clear_lines_without_full_rows() {
        let mut board = BitBoard::from_ascii(
            r"
            ..........
            ####.#####
            ",
        );
        let placement = Placement::new(PieceKind::O, PieceForm::SPAWN, 2, BitBoard::FLOOR - 1);
        board.fill_placement(placement);
        let before = board;

        let (summit, lines) = board.clear_lines(placement, BitBoard::FLOOR);
        assert_eq!(lines, 0);
        assert_eq!(summit, placement.top_row());
        assert_eq!(board, before);
    }

    #[test]
    fn test_clear_lines_single_line() {
        let mut board = BitBoard::from_ascii(
            r"
            #.........
            ####..####
            ",
        );
        // O at playable columns 4-5, box bottom row 2
        let placement = Placement::new(PieceKind::O, PieceForm::SPAWN, 6, BitBoard::FLOOR - 2);
        board.fill_placement(placement);

        let (summit, lines) = board.clear_lines(placement, BitBoard::FLOOR + 1);
        assert_eq!(lines, 1);
        assert_eq!(summit, BitBoard::FLOOR);
        assert_eq!(
            board,
            BitBoard::from_ascii(
                r"
                #...##....
                "
            )
        );
    }

    #[test]
    fn test_clear_lines_preserves_order_of_surviving_rows() {
        let mut board = BitBoard::from_ascii(
            r"
            ......#...
            #.........
            #########.
            .#........
            #########.
            #########.
            ",
        );
        // vertical I in the right-most column completes rows 0, 1 and 3
        let placement = Placement::new(PieceKind::I, PieceForm::from_index(1), 9, BitBoard::FLOOR);
        board.fill_placement(placement);
        let summit = topmost_filled(&board);

        let (summit, lines) = board.clear_lines(placement, summit);
        assert_eq!(lines, 3);
        assert_eq!(summit, BitBoard::FLOOR + 2);
        assert_eq!(
            board,
            BitBoard::from_ascii(
                r"
                ......#...
                #.........
                .#.......#
                "
            )
        );
        for y in summit + 1..TOTAL_HEIGHT {
            assert_eq!(board.rows[y], BitRow::EMPTY);
        }
    }

    #[test]
    fn test_clear_lines_preserves_sentinels() {
        let mut board = BitBoard::from_ascii(
            r"
            #########.
            ",
        );
        let placement = Placement::new(PieceKind::I, PieceForm::from_index(1), 9, BitBoard::FLOOR);
        board.fill_placement(placement);
        board.clear_lines(placement, BitBoard::FLOOR);

        for y in 0..BitBoard::FLOOR {
            assert_eq!(board.rows[y], BitRow::FULL_SENTINEL);
        }
        for y in BitBoard::PLAYABLE_Y_RANGE {
            assert_eq!(board.rows[y].bits & SENTINEL_MASK, SENTINEL_MASK);
        }
    }

    #[test]
    fn test_game_over_above_roof() {
        let mut board = BitBoard::INITIAL;
        assert!(!board.is_game_over());
        fill_row(&mut board, BitBoard::ROOF);
        assert!(!board.is_game_over());
        board.rows[BitBoard::ROOF + 1].occupy_cell(3);
        assert!(board.is_game_over());
    }

    #[test]
    fn test_bit_board_serialization() {
        let board = BitBoard::from_ascii(
            r"
            #.........
            ##......##
            ",
        );
        let json = serde_json::to_value(board).unwrap();
        let rows = json.as_array().unwrap();
        assert_eq!(rows.len(), PLAYABLE_HEIGHT + HEADROOM_ROWS);
        assert_eq!(rows[0], "..........");
        assert_eq!(rows[rows.len() - 2], "#.........");
        assert_eq!(rows[rows.len() - 1], "##......##");

        let deserialized: BitBoard = serde_json::from_value(json).unwrap();
        assert_eq!(deserialized, board);
    }

    #[test]
    fn test_bit_board_deserialization_rejects_bad_rows() {
        let mut rows = vec![".........."; PLAYABLE_HEIGHT + HEADROOM_ROWS];
        assert!(serde_json::from_value::<BitBoard>(serde_json::json!(rows)).is_ok());
        rows[3] = "....x.....";
        assert!(serde_json::from_value::<BitBoard>(serde_json::json!(rows)).is_err());
        rows[3] = "...";
        assert!(serde_json::from_value::<BitBoard>(serde_json::json!(rows)).is_err());
        rows.pop();
        assert!(serde_json::from_value::<BitBoard>(serde_json::json!(rows)).is_err());
    }
}
