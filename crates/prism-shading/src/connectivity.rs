//! Connectivity bitmask: which neighbours of a tile share its texture.

use std::ops::{BitOr, BitOrAssign};

use crate::error::ShadingError;

/// Four-bit connectivity mask carried per frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConnectedDirections(u8);

impl ConnectedDirections {
    /// No connected neighbours.
    pub const NONE: Self = Self(0);
    /// Connected to the left neighbour.
    pub const LEFT: Self = Self(0x1);
    /// Connected to the right neighbour.
    pub const RIGHT: Self = Self(0x2);
    /// Connected to the neighbour above.
    pub const UP: Self = Self(0x4);
    /// Connected to the neighbour below.
    pub const DOWN: Self = Self(0x8);
    /// Either horizontal neighbour.
    pub const HORIZONTAL: Self = Self(0x3);
    /// Either vertical neighbour.
    pub const VERTICAL: Self = Self(0xC);
    /// All four neighbours.
    pub const ALL: Self = Self(0xF);

    /// Parse a raw mask, rejecting bits above the low four.
    pub fn from_bits(bits: u32) -> Result<Self, ShadingError> {
        if bits & !u32::from(Self::ALL.0) != 0 {
            return Err(ShadingError::InvalidPackedField {
                field: "connected_directions",
                value: bits,
            });
        }
        Ok(Self(bits as u8))
    }

    /// Parse a raw mask, discarding unknown bits.
    pub const fn from_bits_truncate(bits: u32) -> Self {
        Self((bits & 0xF) as u8)
    }

    /// Raw mask value.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// `true` if every bit of `other` is set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `true` if any bit of `other` is set.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// `true` if no direction is connected.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two masks.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl BitOr for ConnectedDirections {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for ConnectedDirections {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}
