//! Score to rank mapping.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Narrative rank tier derived from cumulative score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Rank {
    Princess,
    Soldier,
    Knight,
    Monk,
    Rook,
    MadRook,
    Vizier,
    King,
    BlackKing,
}

/// Lower bounds (inclusive), highest first. Anything below the last entry is
/// a `Princess`.
const RANK_THRESHOLDS: &[(i64, Rank)] = &[
    (3000, Rank::BlackKing),
    (2000, Rank::King),
    (1500, Rank::Vizier),
    (1200, Rank::MadRook),
    (900, Rank::Rook),
    (600, Rank::Monk),
    (400, Rank::Knight),
    (250, Rank::Soldier),
];

impl Rank {
    /// Returns the tier whose threshold is the greatest one `<= score`.
    pub fn for_score(score: i64) -> Self {
        RANK_THRESHOLDS
            .iter()
            .find(|(threshold, _)| score >= *threshold)
            .map_or(Self::Princess, |(_, rank)| *rank)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Princess => "Princess",
            Self::Soldier => "Soldier",
            Self::Knight => "Knight",
            Self::Monk => "Monk",
            Self::Rook => "Rook",
            Self::MadRook => "Mad Rook",
            Self::Vizier => "Vizier",
            Self::King => "King",
            Self::BlackKing => "Black King",
        }
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
