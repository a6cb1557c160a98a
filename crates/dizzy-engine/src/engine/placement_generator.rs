use arrayvec::ArrayVec;

use crate::{BitBoard, ColumnHeights, PieceKind, Placement, core::SENTINEL_MARGIN_LEFT};

/// Upper bound on resting positions of a single piece.
pub const MAX_PLACEMENTS: usize = 4 * BitBoard::PLAYABLE_WIDTH;

/// Enumerates one resting position per (usable form, legal x).
///
/// Each placement is the straight drop of that form from above the stack:
/// for every box column holding a cell, the landing row is the row that puts
/// the column's lowest cell right on top of the column, and the highest such
/// row wins. Only heights are consulted, so overhang tucks and slides are
/// never produced and no collision test is needed.
///
/// Placements landing above the roof are still emitted; locking them ends
/// the game.
#[must_use]
pub fn generate_placements(
    kind: PieceKind,
    heights: &ColumnHeights,
) -> ArrayVec<Placement, MAX_PLACEMENTS> {
    let mut placements = ArrayVec::new();
    for form in kind.forms() {
        let geometry = kind.geometry(form);
        let depths = geometry.depths();
        for x in geometry.x_min()..=geometry.x_max() {
            let y = depths
                .iter()
                .enumerate()
                .filter(|&(_, &depth)| depth != 0)
                .map(|(j, &depth)| {
                    let col = x + j - SENTINEL_MARGIN_LEFT;
                    usize::from(heights[col]) + BitBoard::FLOOR + 1 - usize::from(depth)
                })
                .max()
                .unwrap_or(BitBoard::FLOOR);
            placements.push(Placement::new(kind, form, x, y));
        }
    }
    placements
}
