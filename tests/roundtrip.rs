//! # Encode/Decode Round-Trip Properties
//!
//! Property tests over the primitive and variant codecs: every value a
//! builder accepts must decode back identically through a view, truncated
//! input must never wrap, and adaptive-width encodings must be stable under
//! re-encoding.

use proptest::prelude::*;

use wireview::buffer::{BigEndian, LittleEndian, NativeEndian};
use wireview::cursor::{Builder, View};
use wireview::scalar::{Int24Builder, Int24View, Uint24Builder, Uint24View};
use wireview::strings::{String16Builder, String16View, String8Builder, String8View};
use wireview::variant::{
    IntVariantBuilder, IntVariantSpec, IntVariantView, UintVariantBuilder, UintVariantSpec,
    UintVariantView,
};
use wireview::varint::{Varint32Builder, Varint32View, Varuint32nBuilder, Varuint32nView};

enum Number {}

impl IntVariantSpec for Number {
    const KIND_ZERO: Option<u8> = Some(0x40);
    const KIND_ONE: Option<u8> = Some(0x41);
    const KIND8: Option<u8> = Some(0x51);
    const KIND16: Option<u8> = Some(0x52);
    const KIND24: Option<u8> = Some(0x53);
    const KIND32: Option<u8> = Some(0x54);
    const KIND64: Option<u8> = Some(0x58);
}

enum Counter {}

impl UintVariantSpec for Counter {
    const KIND8: Option<u8> = Some(0x61);
    const KIND16: Option<u8> = Some(0x62);
    const KIND32: Option<u8> = Some(0x64);
    const KIND64: Option<u8> = Some(0x68);
}

proptest! {
    #[test]
    fn varint32_roundtrips(value in any::<i32>()) {
        let mut buf = [0u8; 8];
        let limit = {
            let mut b = Varint32Builder::wrap(&mut buf, 0, 8).unwrap();
            b.set(value).unwrap();
            b.build().unwrap()
        };
        prop_assert!(limit <= 5);

        let v = Varint32View::wrap(&buf, 0, limit).unwrap();
        prop_assert_eq!(v.value(), value);
        prop_assert_eq!(v.limit(), limit);
    }

    #[test]
    fn varint32_never_wraps_truncated_input(value in any::<i32>()) {
        let mut buf = [0u8; 8];
        let limit = {
            let mut b = Varint32Builder::wrap(&mut buf, 0, 8).unwrap();
            b.set(value).unwrap();
            b.build().unwrap()
        };
        for cut in 0..limit {
            prop_assert!(Varint32View::try_wrap(&buf, 0, cut).is_none());
        }
    }

    #[test]
    fn varuint32n_roundtrips(value in -1i32..=0x0FFF_FFFF) {
        let mut buf = [0u8; 8];
        let limit = {
            let mut b = Varuint32nBuilder::wrap(&mut buf, 0, 8).unwrap();
            b.set(value).unwrap();
            b.build().unwrap()
        };

        let v = Varuint32nView::wrap(&buf, 0, limit).unwrap();
        prop_assert_eq!(v.value(), value);
    }

    #[test]
    fn u24_roundtrips_in_both_byte_orders(value in 0u32..=0x00FF_FFFF) {
        let mut buf = [0u8; 4];
        let limit = {
            let mut b = Uint24Builder::<BigEndian>::wrap(&mut buf, 0, 4).unwrap();
            b.set(value).unwrap();
            b.build().unwrap()
        };
        prop_assert_eq!(limit, 3);
        let v = Uint24View::<BigEndian>::wrap(&buf, 0, 3).unwrap();
        prop_assert_eq!(v.value().unwrap(), value);

        let mut b = Uint24Builder::<LittleEndian>::wrap(&mut buf, 0, 4).unwrap();
        b.set(value).unwrap();
        let limit = b.build().unwrap();
        let v = Uint24View::<LittleEndian>::wrap(&buf, 0, limit).unwrap();
        prop_assert_eq!(v.value().unwrap(), value);
    }

    #[test]
    fn i24_roundtrips_the_signed_range(value in -0x0080_0000i32..=0x007F_FFFF) {
        let mut buf = [0u8; 4];
        let limit = {
            let mut b = Int24Builder::<NativeEndian>::wrap(&mut buf, 0, 4).unwrap();
            b.set(value).unwrap();
            b.build().unwrap()
        };
        let v = Int24View::<NativeEndian>::wrap(&buf, 0, limit).unwrap();
        prop_assert_eq!(v.value().unwrap(), value);
    }

    #[test]
    fn string8_roundtrips(text in ".{0,40}") {
        prop_assume!(text.len() <= 254);
        let mut buf = [0u8; 300];
        let limit = {
            let mut b = String8Builder::<NativeEndian>::wrap(&mut buf, 0, 300).unwrap();
            b.set(Some(&text)).unwrap();
            b.build().unwrap()
        };

        let v = String8View::<NativeEndian>::wrap(&buf, 0, limit).unwrap();
        prop_assert_eq!(v.as_str().unwrap(), Some(text.as_str()));
        prop_assert_eq!(v.length(), Some(text.len()));
    }

    #[test]
    fn string16_roundtrips_and_equality_is_bytewise(text in ".{0,40}") {
        let mut left = [0u8; 200];
        let mut right = [0u8; 200];
        let limit = {
            let mut b = String16Builder::<NativeEndian>::wrap(&mut left, 0, 200).unwrap();
            b.set(Some(&text)).unwrap();
            b.build().unwrap()
        };
        {
            let mut b = String16Builder::<NativeEndian>::wrap(&mut right, 0, 200).unwrap();
            b.set(Some(&text)).unwrap();
            b.build().unwrap()
        };

        let lv = String16View::<NativeEndian>::wrap(&left, 0, limit).unwrap();
        let rv = String16View::<NativeEndian>::wrap(&right, 0, limit).unwrap();
        prop_assert_eq!(lv, rv);
    }

    #[test]
    fn int_variant_roundtrips_and_is_stable(value in any::<i64>()) {
        let mut buf = [0u8; 16];
        let limit = {
            let mut b = IntVariantBuilder::<Number, NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
            b.set(value).unwrap();
            b.build().unwrap()
        };

        let v = IntVariantView::<Number, NativeEndian>::wrap(&buf, 0, limit).unwrap();
        prop_assert_eq!(v.get().unwrap(), value);

        // Re-encoding the decoded value reproduces the same bytes.
        let mut again = [0u8; 16];
        let again_limit = {
            let mut b =
                IntVariantBuilder::<Number, NativeEndian>::wrap(&mut again, 0, 16).unwrap();
            b.set(v.get().unwrap()).unwrap();
            b.build().unwrap()
        };
        prop_assert_eq!(again_limit, limit);
        prop_assert_eq!(&again[..limit], &buf[..limit]);
    }

    #[test]
    fn uint_variant_roundtrips_and_is_stable(value in any::<u64>()) {
        let mut buf = [0u8; 16];
        let limit = {
            let mut b = UintVariantBuilder::<Counter, NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
            b.set(value).unwrap();
            b.build().unwrap()
        };

        let v = UintVariantView::<Counter, NativeEndian>::wrap(&buf, 0, limit).unwrap();
        prop_assert_eq!(v.get().unwrap(), value);

        let mut again = [0u8; 16];
        let again_limit = {
            let mut b =
                UintVariantBuilder::<Counter, NativeEndian>::wrap(&mut again, 0, 16).unwrap();
            b.set(v.get().unwrap()).unwrap();
            b.build().unwrap()
        };
        prop_assert_eq!(again_limit, limit);
        prop_assert_eq!(&again[..limit], &buf[..limit]);
    }
}

#[test]
fn wrapping_at_a_nonzero_offset_preserves_bounds() {
    let mut buf = [0u8; 32];
    let limit = {
        let mut b = String8Builder::<NativeEndian>::wrap(&mut buf, 5, 32).unwrap();
        b.set(Some("offset")).unwrap();
        b.build().unwrap()
    };
    assert_eq!(limit, 12);

    let v = String8View::<NativeEndian>::wrap(&buf, 5, limit).unwrap();
    assert_eq!(v.offset(), 5);
    assert_eq!(v.as_str().unwrap(), Some("offset"));
    assert_eq!(v.bytes(), &[6, b'o', b'f', b'f', b's', b'e', b't']);
}
