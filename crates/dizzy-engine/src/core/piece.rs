use rand::{Rng, distr::StandardUniform, prelude::Distribution};
use serde::{Deserialize, Serialize};

use super::{TOTAL_WIDTH, bit_board::PLAYABLE_MASK};

/// Enum representing the type of piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[repr(u8)]
pub enum PieceKind {
    /// I-piece.
    I = 0,
    /// O-piece.
    O = 1,
    /// S-piece.
    S = 2,
    /// Z-piece.
    Z = 3,
    /// J-piece.
    J = 4,
    /// L-piece.
    L = 5,
    /// T-piece.
    T = 6,
}

impl Distribution<PieceKind> for StandardUniform {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> PieceKind {
        match rng.random_range(0..=6) {
            0 => PieceKind::I,
            1 => PieceKind::O,
            2 => PieceKind::S,
            3 => PieceKind::Z,
            4 => PieceKind::J,
            5 => PieceKind::L,
            _ => PieceKind::T,
        }
    }
}

impl PieceKind {
    /// Number of piece types (7).
    pub const LEN: usize = 7;

    pub const ALL: [Self; Self::LEN] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::S,
        PieceKind::Z,
        PieceKind::J,
        PieceKind::L,
        PieceKind::T,
    ];

    /// Number of rotation forms that produce distinct shapes.
    ///
    /// The remaining forms are translations of the usable ones, so searching
    /// them would only yield duplicate resting positions.
    #[must_use]
    pub const fn usable_forms(self) -> usize {
        match self {
            PieceKind::O => 1,
            PieceKind::I | PieceKind::S | PieceKind::Z => 2,
            PieceKind::J | PieceKind::L | PieceKind::T => 4,
        }
    }

    /// Iterates over the usable forms, starting with the spawn form.
    pub fn forms(self) -> impl Iterator<Item = PieceForm> {
        (0..self.usable_forms()).map(PieceForm::from_index)
    }

    #[must_use]
    pub fn geometry(self, form: PieceForm) -> &'static FormGeometry {
        &FORM_GEOMETRIES[self as usize][form.index()]
    }

    /// Returns the single character representation of this piece kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use dizzy_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::S.as_char(), 'S');
    /// ```
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            PieceKind::I => 'I',
            PieceKind::O => 'O',
            PieceKind::S => 'S',
            PieceKind::Z => 'Z',
            PieceKind::J => 'J',
            PieceKind::L => 'L',
            PieceKind::T => 'T',
        }
    }

    /// Parses a piece kind from a single character.
    ///
    /// # Examples
    ///
    /// ```
    /// use dizzy_engine::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_char('T'), Some(PieceKind::T));
    /// assert_eq!(PieceKind::from_char('X'), None);
    /// ```
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(PieceKind::I),
            'O' => Some(PieceKind::O),
            'S' => Some(PieceKind::S),
            'Z' => Some(PieceKind::Z),
            'J' => Some(PieceKind::J),
            'L' => Some(PieceKind::L),
            'T' => Some(PieceKind::T),
            _ => None,
        }
    }
}

/// Rotation form of a piece.
///
/// - `0`: spawn orientation
/// - `1`: 90° clockwise
/// - `2`: 180°
/// - `3`: 270° clockwise
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PieceForm(u8);

impl PieceForm {
    pub const SPAWN: Self = Self(0);
    pub const LEN: usize = 4;

    #[must_use]
    #[expect(clippy::cast_possible_truncation)]
    pub const fn from_index(index: usize) -> Self {
        assert!(index < Self::LEN);
        Self(index as u8)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for PieceForm {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if usize::from(value) < Self::LEN {
            Ok(Self(value))
        } else {
            Err(format!("piece form must be 0-3, got {value}"))
        }
    }
}

impl From<PieceForm> for u8 {
    fn from(form: PieceForm) -> Self {
        form.0
    }
}

/// Occupied cells of a form inside its 4×4 box.
///
/// Index 0 is the bottom row of the box and bit 0 is its leftmost column.
pub type PieceMask = [u16; 4];

/// Precomputed geometry of a single (kind, form) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormGeometry {
    mask: PieceMask,
    lower_empty_rows: u8,
    upper_empty_rows: u8,
    depths: [u8; 4],
    x_min: u8,
    x_max: u8,
}

impl FormGeometry {
    #[must_use]
    pub const fn mask(&self) -> PieceMask {
        self.mask
    }

    /// Empty box rows below the lowest occupied cell.
    #[must_use]
    pub const fn lower_empty_rows(&self) -> usize {
        self.lower_empty_rows as usize
    }

    /// Empty box rows above the highest occupied cell.
    #[must_use]
    pub const fn upper_empty_rows(&self) -> usize {
        self.upper_empty_rows as usize
    }

    /// 1-based row of the lowest occupied cell of each box column, counted
    /// from the box bottom. Zero if the column is empty.
    #[must_use]
    pub const fn depths(&self) -> [u8; 4] {
        self.depths
    }

    /// Smallest board shift keeping every cell inside the playable columns.
    #[must_use]
    pub const fn x_min(&self) -> usize {
        self.x_min as usize
    }

    /// Largest board shift keeping every cell inside the playable columns.
    #[must_use]
    pub const fn x_max(&self) -> usize {
        self.x_max as usize
    }

    #[expect(clippy::cast_possible_truncation)]
    const fn from_top_down(top_down: PieceMask) -> Self {
        let mask = [top_down[3], top_down[2], top_down[1], top_down[0]];

        let mut lower_empty_rows = 0;
        while mask[lower_empty_rows] == 0 {
            lower_empty_rows += 1;
        }
        let mut upper_empty_rows = 0;
        while mask[3 - upper_empty_rows] == 0 {
            upper_empty_rows += 1;
        }

        let mut depths = [0; 4];
        let mut col = 0;
        while col < 4 {
            let mut row = 0;
            while row < 4 {
                if mask[row] & (1 << col) != 0 {
                    depths[col] = row as u8 + 1;
                    break;
                }
                row += 1;
            }
            col += 1;
        }

        let mut x_min = TOTAL_WIDTH;
        let mut x_max = 0;
        let mut x = 0;
        while x < TOTAL_WIDTH {
            let mut cells = 0;
            let mut row = 0;
            while row < 4 {
                cells += ((mask[row] << x) & PLAYABLE_MASK).count_ones();
                row += 1;
            }
            if cells == 4 {
                if x < x_min {
                    x_min = x;
                }
                x_max = x;
            }
            x += 1;
        }
        assert!(x_min <= x_max);

        Self {
            mask,
            lower_empty_rows: lower_empty_rows as u8,
            upper_empty_rows: upper_empty_rows as u8,
            depths,
            x_min: x_min as u8,
            x_max: x_max as u8,
        }
    }
}

/// Generates all 4 rotation states of a top-down piece mask by rotating 90° clockwise.
///
/// # Arguments
///
/// * `size` - Effective size of the piece (3 for most pieces, 4 for I, 2 for O)
/// * `mask` - Initial piece mask at the spawn form, top row first
const fn mask_rotations(size: usize, mask: PieceMask) -> [PieceMask; 4] {
    let mut rotates = [mask; 4];
    let mut i = 1;
    while i < 4 {
        let mut new_mask = [0; 4];
        let mut y = 0;
        while y < size {
            let mut x = 0;
            while x < size {
                if (rotates[i - 1][size - 1 - x] & (1 << y)) != 0 {
                    new_mask[y] |= 1 << x;
                }
                x += 1;
            }
            y += 1;
        }
        rotates[i] = new_mask;
        i += 1;
    }
    rotates
}

const fn form_geometries(size: usize, top_down: PieceMask) -> [FormGeometry; 4] {
    let rotations = mask_rotations(size, top_down);
    [
        FormGeometry::from_top_down(rotations[0]),
        FormGeometry::from_top_down(rotations[1]),
        FormGeometry::from_top_down(rotations[2]),
        FormGeometry::from_top_down(rotations[3]),
    ]
}

static FORM_GEOMETRIES: [[FormGeometry; 4]; PieceKind::LEN] = {
    const fn m(bits: [bool; 4]) -> u16 {
        let mut mask = 0;
        let mut i = 0;
        while i < 4 {
            if bits[i] {
                mask |= 1 << i;
            }
            i += 1;
        }
        mask
    }

    const C: bool = true;
    const E: bool = false;
    const EEEE: u16 = m([E; 4]);

    [
        // I-piece
        form_geometries(4, [EEEE, m([C, C, C, C]), EEEE, EEEE]),
        // O-piece
        form_geometries(2, [m([C, C, E, E]), m([C, C, E, E]), EEEE, EEEE]),
        // S-piece
        form_geometries(3, [m([E, C, C, E]), m([C, C, E, E]), EEEE, EEEE]),
        // Z-piece
        form_geometries(3, [m([C, C, E, E]), m([E, C, C, E]), EEEE, EEEE]),
        // J-piece
        form_geometries(3, [m([C, E, E, E]), m([C, C, C, E]), EEEE, EEEE]),
        // L-piece
        form_geometries(3, [m([E, E, C, E]), m([C, C, C, E]), EEEE, EEEE]),
        // T-piece
        form_geometries(3, [m([E, C, E, E]), m([C, C, C, E]), EEEE, EEEE]),
    ]
};
