pub use self::{bit_board::*, piece::*, placement::*};

pub(crate) mod bit_board;
pub(crate) mod piece;
pub(crate) mod placement;

pub(crate) const SENTINEL_MARGIN_LEFT: usize = 2;
const SENTINEL_MARGIN_RIGHT: usize = 2;
// Permanently full rows under the playfield.
const SENTINEL_MARGIN_BOTTOM: usize = 3;
// Hidden rows above the playfield for spawning and rotating.
const HEADROOM_ROWS: usize = 5;

const PLAYABLE_WIDTH: usize = 10;
const PLAYABLE_HEIGHT: usize = 20;
const TOTAL_WIDTH: usize = SENTINEL_MARGIN_LEFT + PLAYABLE_WIDTH + SENTINEL_MARGIN_RIGHT;
const TOTAL_HEIGHT: usize = SENTINEL_MARGIN_BOTTOM + PLAYABLE_HEIGHT + HEADROOM_ROWS;
