//! Bit-packed Tetris board engine used by the dizzy agent.
//!
//! The [`core`] module holds the fixed-size data structures (board rows, piece
//! forms and placements) and the [`engine`] module builds the game state and
//! placement search on top of them.

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("fixed piece sequence must contain at least one piece")]
pub struct EmptyPieceSequenceError;
