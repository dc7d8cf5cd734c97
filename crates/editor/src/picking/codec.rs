//! Reversible mapping between entity indices and the colors written by the pick pass.
//!
//! Channel bytes are little-endian (red holds the least significant byte) and
//! carry `index + 1`, so the all-zero clear color never decodes to a live index.

/// One texel of the pick target, channels in `[r, g, b, a]` order.
///
/// Same layout as an `Rgba8Uint` texel, so mapped readback bytes cast straight into it.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PickColor(pub [u8; 4]);

/// Index the all-zero color decodes to. Entity rows are `NonMaxU32`, so no live entity has it.
pub const RESERVED_INDEX: u32 = u32::MAX;

impl PickColor {
    /// Cleared pixel, meaning "nothing here"
    pub const SENTINEL: PickColor = PickColor([0, 0, 0, 0]);

    pub fn is_sentinel(&self) -> bool {
        *self == Self::SENTINEL
    }

    /// Word uploaded to the pick shader, which unpacks it into the four channels
    pub fn to_packed(self) -> u32 {
        u32::from_le_bytes(self.0)
    }

    pub fn from_packed(packed: u32) -> Self {
        Self(packed.to_le_bytes())
    }
}

pub fn encode(index: u32) -> PickColor {
    PickColor(index.wrapping_add(1).to_le_bytes())
}

pub fn decode(color: PickColor) -> u32 {
    u32::from_le_bytes(color.0).wrapping_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_sentinel_decodes_to_reserved_index() {
        assert_eq!(decode(PickColor::SENTINEL), RESERVED_INDEX);
        assert_eq!(encode(RESERVED_INDEX), PickColor::SENTINEL);
    }

    #[test]
    fn test_low_byte_goes_to_red() {
        assert_eq!(encode(0), PickColor([1, 0, 0, 0]));
        assert_eq!(encode(0x0001_02FF), PickColor([0x00, 0x03, 0x01, 0x00]));
        assert_eq!(encode(0x0403_0200), PickColor([0x01, 0x02, 0x03, 0x04]));
    }

    #[test]
    fn test_texel_bytes_cast_to_color() {
        let texel = [0x08u8, 0x00, 0x00, 0x00, 0xAA, 0xBB];
        let color: PickColor = bytemuck::pod_read_unaligned(&texel[..4]);
        assert_eq!(decode(color), 7);
        assert_eq!(bytemuck::bytes_of(&encode(7)), &texel[..4]);
        assert_eq!(<PickColor as bytemuck::Zeroable>::zeroed(), PickColor::SENTINEL);
    }

    #[test]
    fn test_packed_matches_channel_order() {
        let color = PickColor([0x11, 0x22, 0x33, 0x44]);
        assert_eq!(color.to_packed(), 0x4433_2211);
        assert_eq!(PickColor::from_packed(0x4433_2211), color);
    }

    proptest! {
        #[test]
        fn test_decode_inverts_encode(index in any::<u32>()) {
            prop_assert_eq!(decode(encode(index)), index);
        }

        #[test]
        fn test_distinct_indices_get_distinct_colors(a in any::<u32>(), b in any::<u32>()) {
            prop_assume!(a != b);
            prop_assert_ne!(encode(a), encode(b));
        }

        #[test]
        fn test_live_indices_never_encode_to_sentinel(index in 0..RESERVED_INDEX) {
            prop_assert!(!encode(index).is_sentinel());
        }

        #[test]
        fn test_packed_round_trip(index in any::<u32>()) {
            let color = encode(index);
            prop_assert_eq!(PickColor::from_packed(color.to_packed()), color);
        }
    }
}
