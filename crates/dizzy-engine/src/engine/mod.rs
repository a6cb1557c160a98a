//! Game state transitions on top of the bit board.
//!
//! - [`GameState`] - Board plus derived per-column heights, summit and counters
//! - [`generate_placements`] - Every straight-drop resting position of a piece
//! - [`PieceSource`] - Where the next piece comes from
//!
//! # Example
//!
//! ```
//! use dizzy_engine::{GameState, PieceKind, generate_placements};
//!
//! let state = GameState::new(PieceKind::T);
//! let placements = generate_placements(PieceKind::T, state.column_heights());
//! let next = state.lock(placements[0]);
//! assert_eq!(next.total_pieces(), 1);
//! ```

pub use self::{game_state::*, piece_source::*, placement_generator::*};

mod game_state;
mod piece_source;
mod placement_generator;
