use serde::{Deserialize, Serialize};

use super::{
    SENTINEL_MARGIN_LEFT, TOTAL_HEIGHT, TOTAL_WIDTH,
    bit_board::{BitBoard, PLAYABLE_MASK},
    piece::{FormGeometry, PieceForm, PieceKind},
};

/// Box column offset used when a new piece enters the board.
pub(crate) const SPAWN_X: usize = 5;

/// A piece in a specific form at a specific position on the board.
///
/// Placements are immutable values. `x` is the left shift applied to the box
/// mask, so box column 0 maps to board column `x` (wall columns included).
/// `y` is the board row of the box's bottom row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Placement {
    kind: PieceKind,
    form: PieceForm,
    x: u8,
    y: u8,
}

impl Serialize for Placement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        // Format: "kind#form@x,y" (e.g., "S#1@4,18")
        let s = format!(
            "{}#{}@{},{}",
            self.kind.as_char(),
            self.form.index(),
            self.x,
            self.y
        );
        serializer.serialize_str(&s)
    }
}

impl<'de> Deserialize<'de> for Placement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error as _;

        let s = String::deserialize(deserializer)?;
        let invalid = || D::Error::custom(format!("expected format 'kind#form@x,y', got '{s}'"));

        let (kind, rest) = s.split_once('#').ok_or_else(invalid)?;
        let (form, position) = rest.split_once('@').ok_or_else(invalid)?;
        let (x, y) = position.split_once(',').ok_or_else(invalid)?;

        let mut kind_chars = kind.chars();
        let kind = match (kind_chars.next(), kind_chars.next()) {
            (Some(c), None) => PieceKind::from_char(c)
                .ok_or_else(|| D::Error::custom(format!("invalid piece kind: {c}")))?,
            _ => return Err(invalid()),
        };
        let form = form
            .parse::<u8>()
            .map_err(|e| D::Error::custom(format!("invalid form: {form} ({e})")))
            .and_then(|n| PieceForm::try_from(n).map_err(D::Error::custom))?;
        let x = x
            .parse::<u8>()
            .map_err(|e| D::Error::custom(format!("invalid x position: {x} ({e})")))?;
        let y = y
            .parse::<u8>()
            .map_err(|e| D::Error::custom(format!("invalid y position: {y} ({e})")))?;
        if usize::from(x) >= TOTAL_WIDTH || usize::from(y) + 4 > TOTAL_HEIGHT {
            return Err(D::Error::custom(format!("position out of range: {x},{y}")));
        }

        Ok(Self { kind, form, x, y })
    }
}

impl Placement {
    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub const fn new(kind: PieceKind, form: PieceForm, x: usize, y: usize) -> Self {
        assert!(x < TOTAL_WIDTH);
        assert!(y + 4 <= TOTAL_HEIGHT);
        Self {
            kind,
            form,
            x: x as u8,
            y: y as u8,
        }
    }

    /// Default entry position: spawn form, topmost cell on the top playable row.
    #[must_use]
    pub fn spawn(kind: PieceKind) -> Self {
        let geometry = kind.geometry(PieceForm::SPAWN);
        let y = BitBoard::ROOF + 1 + geometry.upper_empty_rows() - 4;
        Self::new(kind, PieceForm::SPAWN, SPAWN_X, y)
    }

    #[must_use]
    pub fn kind(self) -> PieceKind {
        self.kind
    }

    #[must_use]
    pub fn form(self) -> PieceForm {
        self.form
    }

    #[must_use]
    pub fn x(self) -> usize {
        usize::from(self.x)
    }

    #[must_use]
    pub fn y(self) -> usize {
        usize::from(self.y)
    }

    #[must_use]
    pub fn geometry(self) -> &'static FormGeometry {
        self.kind.geometry(self.form)
    }

    /// Board bits covered by box row `row` (0 = bottom row of the box).
    #[inline]
    #[must_use]
    pub fn row_bits(self, row: usize) -> u16 {
        self.geometry().mask()[row] << self.x
    }

    /// Board row of the lowest occupied cell.
    #[must_use]
    pub fn bottom_row(self) -> usize {
        self.y() + self.geometry().lower_empty_rows()
    }

    /// Board row of the highest occupied cell.
    #[must_use]
    pub fn top_row(self) -> usize {
        self.y() + 3 - self.geometry().upper_empty_rows()
    }

    /// Whether any cell of the piece lies in playable column `col`.
    #[must_use]
    pub fn covers_column(self, col: usize) -> bool {
        (col + SENTINEL_MARGIN_LEFT)
            .checked_sub(self.x())
            .filter(|&j| j < 4)
            .is_some_and(|j| self.geometry().depths()[j] != 0)
    }

    /// Checks that every cell lies inside the playable area.
    ///
    /// Horizontal overflow is detected by counting the cells that survive
    /// masking to the playable columns.
    #[must_use]
    pub fn is_in_bounds(self) -> bool {
        let filled: u32 = (0..4)
            .map(|row| (self.row_bits(row) & PLAYABLE_MASK).count_ones())
            .sum();
        if filled != 4 {
            return false;
        }
        BitBoard::PLAYABLE_Y_RANGE.contains(&self.bottom_row())
            && BitBoard::PLAYABLE_Y_RANGE.contains(&self.top_row())
    }
}
