use crate::{BitBoard, PieceKind, Placement};

pub type ColumnHeights = [u8; BitBoard::PLAYABLE_WIDTH];

/// Board together with the values derived from it after each lock.
///
/// `column_heights` always matches the board exactly (number of playable
/// rows up to and including the column's top cell). `summit` is at least the
/// row index of the top-most filled row; on an empty board it rests on the
/// top sentinel floor row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameState {
    board: BitBoard,
    placement: Placement,
    column_heights: ColumnHeights,
    summit: usize,
    lines: usize,
    total_lines: usize,
    total_pieces: usize,
    game_over: bool,
}

impl GameState {
    #[must_use]
    pub fn new(first: PieceKind) -> Self {
        Self::with_board(BitBoard::INITIAL, first)
    }

    /// Starts from an arbitrary board, deriving heights and summit from it.
    #[must_use]
    pub fn with_board(board: BitBoard, first: PieceKind) -> Self {
        let mut column_heights = [0; BitBoard::PLAYABLE_WIDTH];
        for (col, height) in column_heights.iter_mut().enumerate() {
            *height = scan_column_height(&board, col, BitBoard::PLAYABLE_HEIGHT);
        }
        let summit = BitBoard::PLAYABLE_Y_RANGE
            .rev()
            .find(|&y| !board.row(y).is_playable_empty())
            .unwrap_or(BitBoard::FLOOR - 1);
        Self {
            board,
            placement: Placement::spawn(first),
            column_heights,
            summit,
            lines: 0,
            total_lines: 0,
            total_pieces: 0,
            game_over: board.is_game_over(),
        }
    }

    #[must_use]
    pub fn board(&self) -> &BitBoard {
        &self.board
    }

    /// The piece in play, or the last locked piece right after [`Self::lock`].
    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    #[must_use]
    pub fn column_heights(&self) -> &ColumnHeights {
        &self.column_heights
    }

    #[must_use]
    pub fn summit(&self) -> usize {
        self.summit
    }

    /// Lines cleared by the most recent lock.
    #[must_use]
    pub fn lines(&self) -> usize {
        self.lines
    }

    #[must_use]
    pub fn total_lines(&self) -> usize {
        self.total_lines
    }

    #[must_use]
    pub fn total_pieces(&self) -> usize {
        self.total_pieces
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Replaces the piece in play without touching the board.
    #[must_use]
    pub fn with_placement(&self, placement: Placement) -> Self {
        Self { placement, ..*self }
    }

    /// Merges `placement` into the board, clears full rows and updates every
    /// derived value. The receiver is left untouched.
    #[must_use]
    pub fn lock(&self, placement: Placement) -> Self {
        let mut next = *self;
        next.placement = placement;
        next.board.fill_placement(placement);
        let (summit, lines) = next.board.clear_lines(placement, next.summit);
        next.summit = summit;
        next.lines = lines;
        next.update_column_heights();
        next.total_lines += lines;
        next.total_pieces += 1;
        next.game_over = next.board.is_game_over();
        next
    }

    // A column's new height can only be below max(old height, piece top) less
    // the cleared lines, since every cleared row filled every column.
    fn update_column_heights(&mut self) {
        let placement = self.placement;
        let piece_height = placement.top_row() + 1 - BitBoard::FLOOR;
        for col in 0..BitBoard::PLAYABLE_WIDTH {
            let covered = placement.covers_column(col);
            if !covered && self.lines == 0 {
                continue;
            }
            let mut bound = usize::from(self.column_heights[col]);
            if covered {
                bound = bound.max(piece_height);
            }
            self.column_heights[col] =
                scan_column_height(&self.board, col, bound.saturating_sub(self.lines));
        }
    }
}

#[expect(clippy::cast_possible_truncation)]
fn scan_column_height(board: &BitBoard, col: usize, upper_bound: usize) -> u8 {
    (0..upper_bound)
        .rev()
        .find(|&h| board.row(BitBoard::FLOOR + h).is_cell_occupied(col))
        .map_or(0, |h| h as u8 + 1)
}
