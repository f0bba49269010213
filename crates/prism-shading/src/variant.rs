//! Packed variant field: `(variant_id << 16) | facing_bits` in one `u32`.
//!
//! The two halves are independent 16-bit namespaces. Packing never carries
//! from one into the other, and decoding is a plain unsigned split.

use crate::error::ShadingError;

/// Reserved per-face selection bits. Decoded but not consumed by shading yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct FacingBits(pub u16);

/// Decoded form of a vertex's packed variant data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct VariantData {
    /// Variant id (high 16 bits).
    pub variant_id: u16,
    /// Facing bits (low 16 bits).
    pub facing: FacingBits,
}

impl VariantData {
    /// Build from already-ranged halves.
    pub const fn new(variant_id: u16, facing: FacingBits) -> Self {
        Self { variant_id, facing }
    }

    /// Build from wider integers, rejecting values that do not fit in 16 bits.
    pub fn try_new(variant_id: u32, facing: u32) -> Result<Self, ShadingError> {
        let variant_id = u16::try_from(variant_id).map_err(|_| ShadingError::InvalidPackedField {
            field: "variant_id",
            value: variant_id,
        })?;
        let facing = u16::try_from(facing).map_err(|_| ShadingError::InvalidPackedField {
            field: "facing_bits",
            value: facing,
        })?;
        Ok(Self::new(variant_id, FacingBits(facing)))
    }

    /// Pack into the vertex attribute layout.
    pub const fn pack(self) -> u32 {
        ((self.variant_id as u32) << 16) | self.facing.0 as u32
    }

    /// Split a packed value. Every `u32` is a valid packing.
    pub const fn unpack(packed: u32) -> Self {
        Self {
            variant_id: (packed >> 16) as u16,
            facing: FacingBits((packed & 0xFFFF) as u16),
        }
    }
}

impl From<u32> for VariantData {
    fn from(packed: u32) -> Self {
        Self::unpack(packed)
    }
}

impl From<VariantData> for u32 {
    fn from(data: VariantData) -> Self {
        data.pack()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_reference_value() {
        let data = VariantData::new(1, FacingBits(2));
        assert_eq!(data.pack(), 0x0001_0002);
        assert_eq!(VariantData::unpack(0x0001_0002), data);
    }

    #[test]
    fn test_round_trip_across_ranges() {
        let samples = [0u16, 1, 2, 15, 16, 255, 256, 0x7FFF, 0x8000, 0xFFFE, 0xFFFF];
        for &v in &samples {
            for &f in &samples {
                let data = VariantData::new(v, FacingBits(f));
                let decoded = VariantData::unpack(data.pack());
                assert_eq!(decoded, data, "variant {v:#x} facing {f:#x}");
            }
        }
    }

    #[test]
    fn test_high_bits_do_not_sign_extend() {
        let data = VariantData::unpack(0xFFFF_8000);
        assert_eq!(data.variant_id, 0xFFFF);
        assert_eq!(data.facing, FacingBits(0x8000));
    }

    #[test]
    fn test_no_carry_between_halves() {
        let full_facing = VariantData::new(0, FacingBits(0xFFFF)).pack();
        assert_eq!(full_facing, 0x0000_FFFF);
        assert_eq!(VariantData::unpack(full_facing).variant_id, 0);
    }

    #[test]
    fn test_try_new_enforces_16_bits() {
        assert!(VariantData::try_new(0xFFFF, 0xFFFF).is_ok());
        assert_eq!(
            VariantData::try_new(0x1_0000, 0),
            Err(ShadingError::InvalidPackedField {
                field: "variant_id",
                value: 0x1_0000
            })
        );
        assert!(matches!(
            VariantData::try_new(0, 70_000),
            Err(ShadingError::InvalidPackedField {
                field: "facing_bits",
                ..
            })
        ));
    }

    #[test]
    fn test_u32_conversions() {
        let packed: u32 = VariantData::new(5, FacingBits(3)).into();
        let back = VariantData::from(packed);
        assert_eq!(back.variant_id, 5);
        assert_eq!(back.facing.0, 3);
    }
}
