//! # Array Narrowing Properties
//!
//! Arrays of adaptive-width items append provisionally at the widest member
//! and narrow in place on `build()`. These tests pin the protocol's
//! guarantees: values survive the narrowing walk unchanged, the final image
//! is never larger than the provisional one, and every item ends up at the
//! member its own content selects.

use proptest::prelude::*;

use wireview::array::{
    Array16Builder, Array16View, Array32Builder, Array32View, Array8Builder, Array8View,
};
use wireview::buffer::NativeEndian;
use wireview::cursor::{Builder, View};
use wireview::scalar::Uint8;
use wireview::variant::{
    ArrayVariant, ArrayVariantSpec, ListVariant, ListVariantBuilder, ListVariantSpec,
    ListVariantView, MapVariant, MapVariantSpec, OctetsVariant, OctetsVariantSpec, StringVariant,
    StringVariantSpec, UintVariant, UintVariantSpec,
};

enum Text {}

impl StringVariantSpec for Text {
    const KIND_EMPTY: Option<u8> = Some(0x00);
    const KIND8: Option<u8> = Some(0xA1);
    const KIND16: Option<u8> = Some(0xA2);
    const KIND32: Option<u8> = Some(0xA3);
}

enum Counter {}

impl UintVariantSpec for Counter {
    const KIND_ZERO: Option<u8> = Some(0x60);
    const KIND8: Option<u8> = Some(0x61);
    const KIND16: Option<u8> = Some(0x62);
    const KIND32: Option<u8> = Some(0x64);
    const KIND64: Option<u8> = Some(0x68);
}

enum Fields {}

impl ListVariantSpec for Fields {
    const KIND_ZERO: Option<u8> = Some(0x70);
    const KIND8: Option<u8> = Some(0x71);
    const KIND32: Option<u8> = Some(0x73);
}

enum Packet {}

impl OctetsVariantSpec for Packet {
    const KIND8: Option<u8> = Some(0xB1);
    const KIND16: Option<u8> = Some(0xB2);
}

enum Tags {}

impl ArrayVariantSpec for Tags {
    const KIND8: Option<u8> = Some(0x91);
    const KIND32: Option<u8> = Some(0x93);
}

enum Attrs {}

impl MapVariantSpec for Attrs {
    const KIND8: Option<u8> = Some(0x81);
    const KIND32: Option<u8> = Some(0x83);
}

fn item_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        1 => Just(None),
        1 => Just(Some(String::new())),
        4 => ".{0,80}".prop_map(Some),
    ]
}

proptest! {
    #[test]
    fn array_of_string_variants_survives_narrowing(items in prop::collection::vec(item_strategy(), 0..12)) {
        let mut buf = vec![0u8; 8192];
        let (limit, provisional) = {
            let mut b = Array32Builder::<StringVariant<Text>, NativeEndian>::wrap(&mut buf, 0, 8192)
                .unwrap();
            for item in &items {
                b.item(|i| i.set(item.as_deref()).map(|_| ())).unwrap();
            }
            let provisional = b.limit();
            (b.build().unwrap(), provisional)
        };
        prop_assert!(limit <= provisional, "narrowing must never grow the image");

        let v = Array32View::<StringVariant<Text>, NativeEndian>::wrap(&buf, 0, limit).unwrap();
        prop_assert_eq!(v.field_count(), items.len() as u64);

        let mut decoded = Vec::new();
        v.for_each(|item| decoded.push(item.get().unwrap().map(str::to_owned)))
            .unwrap();
        prop_assert_eq!(decoded, items);
    }

    #[test]
    fn array_of_uint_variants_roundtrips(values in prop::collection::vec(any::<u64>(), 0..16)) {
        let mut buf = vec![0u8; 512];
        let limit = {
            let mut b =
                Array32Builder::<UintVariant<Counter>, NativeEndian>::wrap(&mut buf, 0, 512)
                    .unwrap();
            for &value in &values {
                b.item(|i| i.set(value).map(|_| ())).unwrap();
            }
            b.build().unwrap()
        };

        let v = Array32View::<UintVariant<Counter>, NativeEndian>::wrap(&buf, 0, limit).unwrap();
        let mut decoded = Vec::new();
        v.for_each(|item| decoded.push(item.get().unwrap())).unwrap();
        prop_assert_eq!(decoded, values);
    }

    #[test]
    fn list_variant_picks_the_width_its_body_needs(body in prop::collection::vec(any::<u8>(), 0..600)) {
        let field_count = body.len().min(7) as u64;
        let mut buf = vec![0u8; 1024];
        let limit = {
            let mut b = ListVariantBuilder::<Fields, NativeEndian>::wrap(&mut buf, 0, 1024).unwrap();
            b.set(field_count, &body).unwrap();
            b.build().unwrap()
        };

        if body.is_empty() && field_count == 0 {
            prop_assert_eq!((limit, buf[0]), (1, 0x70));
        } else if body.len() + 1 <= 255 {
            prop_assert_eq!(buf[0], 0x71);
            prop_assert_eq!(limit, 1 + 2 + body.len());
        } else {
            prop_assert_eq!(buf[0], 0x73);
            prop_assert_eq!(limit, 1 + 8 + body.len());
        }

        let v = ListVariantView::<Fields, NativeEndian>::wrap(&buf, 0, limit).unwrap();
        prop_assert_eq!(v.field_count(), field_count);
        prop_assert_eq!(v.fields(), &body[..]);
    }
}

#[test]
fn narrowing_moves_items_down_past_a_shrunken_neighbor() {
    // First item shrinks from the widest member to a sentinel, so every
    // later item must move down during the walk.
    let mut buf = [0u8; 128];
    let limit = {
        let mut b =
            Array8Builder::<UintVariant<Counter>, NativeEndian>::wrap(&mut buf, 0, 128).unwrap();
        b.item(|i| i.set(0).map(|_| ())).unwrap();
        b.item(|i| i.set(300).map(|_| ())).unwrap();
        b.item(|i| i.set(7).map(|_| ())).unwrap();
        b.build().unwrap()
    };
    // header 2 + sentinel 1 + (kind + u16) 3 + (kind + u8) 2
    assert_eq!(limit, 8);
    assert_eq!(buf[2], 0x60);
    assert_eq!(buf[3], 0x62);
    assert_eq!(buf[6], 0x61);

    let v = Array8View::<UintVariant<Counter>, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    let mut decoded = Vec::new();
    v.for_each(|item| decoded.push(item.get().unwrap())).unwrap();
    assert_eq!(decoded, [0, 300, 7]);
}

#[test]
fn array_of_list_variants_narrows_to_sentinel_and_list8() {
    let mut buf = [0u8; 256];
    let (limit, provisional) = {
        let mut b =
            Array8Builder::<ListVariant<Fields>, NativeEndian>::wrap(&mut buf, 0, 256).unwrap();
        b.item(|i| i.set(0, &[]).map(|_| ())).unwrap();
        b.item(|i| i.set(2, &[1, 2, 3, 4, 5]).map(|_| ())).unwrap();
        let provisional = b.limit();
        (b.build().unwrap(), provisional)
    };
    assert!(limit <= provisional);
    // header 2 + sentinel 1 + (kind + two u8 header fields + 5 bytes) 8
    assert_eq!(limit, 11);
    assert_eq!(buf[2], 0x70);
    assert_eq!(buf[3], 0x71);
    assert_eq!(buf[4], 6);
    assert_eq!(buf[5], 2);

    let v = Array8View::<ListVariant<Fields>, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    let mut decoded = Vec::new();
    v.for_each(|item| decoded.push((item.field_count(), item.fields().to_vec())))
        .unwrap();
    assert_eq!(decoded, [(0, vec![]), (2, vec![1, 2, 3, 4, 5])]);
}

#[test]
fn array_of_octets_variants_narrows_to_mixed_widths() {
    let big = vec![0xCD; 300];
    let mut buf = vec![0u8; 1024];
    let (limit, provisional) = {
        let mut b = Array16Builder::<OctetsVariant<Packet>, NativeEndian>::wrap(&mut buf, 0, 1024)
            .unwrap();
        b.item(|i| i.set(b"hello").map(|_| ())).unwrap();
        b.item(|i| i.set(&big).map(|_| ())).unwrap();
        let provisional = b.limit();
        (b.build().unwrap(), provisional)
    };
    assert!(limit <= provisional);
    // header 4 + (kind + u8 length + 5) 7 + (kind + u16 length + 300) 303
    assert_eq!(limit, 314);
    assert_eq!(buf[4], 0xB1);
    assert_eq!(buf[5], 5);
    assert_eq!(buf[11], 0xB2);

    let v = Array16View::<OctetsVariant<Packet>, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    let mut decoded = Vec::new();
    v.for_each(|item| decoded.push(item.get().to_vec())).unwrap();
    assert_eq!(decoded[0], b"hello");
    assert_eq!(decoded[1], big);
}

#[test]
fn array_of_array_variants_narrows_each_body() {
    let mut buf = [0u8; 128];
    let limit = {
        let mut b =
            Array8Builder::<ArrayVariant<Tags, Uint8>, NativeEndian>::wrap(&mut buf, 0, 128)
                .unwrap();
        b.item(|i| i.set(3, &[7, 8, 9]).map(|_| ())).unwrap();
        b.build().unwrap()
    };
    // header 2 + (kind + two u8 header fields + 3 items) 6
    assert_eq!(limit, 8);
    assert_eq!(buf[2], 0x91);

    let v = Array8View::<ArrayVariant<Tags, Uint8>, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    let mut values = Vec::new();
    v.for_each(|inner| {
        inner
            .for_each(|item| values.push(item.value().unwrap()))
            .unwrap();
    })
    .unwrap();
    assert_eq!(values, [7, 8, 9]);
}

#[test]
fn array_of_map_variants_narrows_each_body() {
    let mut buf = [0u8; 128];
    let limit = {
        let mut b = Array8Builder::<MapVariant<Attrs, Uint8, Uint8>, NativeEndian>::wrap(
            &mut buf, 0, 128,
        )
        .unwrap();
        b.item(|i| i.set(4, &[1, 2, 3, 4]).map(|_| ())).unwrap();
        b.build().unwrap()
    };
    // header 2 + (kind + two u8 header fields + 4 field bytes) 7
    assert_eq!(limit, 9);
    assert_eq!(buf[2], 0x81);

    let v =
        Array8View::<MapVariant<Attrs, Uint8, Uint8>, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    let mut entries = Vec::new();
    v.for_each(|map| {
        assert_eq!(map.entry_count(), 2);
        map.for_each(|k, val| entries.push((k.value().unwrap(), val.value().unwrap())))
            .unwrap();
    })
    .unwrap();
    assert_eq!(entries, [(1, 2), (3, 4)]);
}

#[test]
fn rebuilding_an_already_narrow_array_is_a_fixpoint() {
    let mut buf = [0u8; 256];
    let first = {
        let mut b =
            Array8Builder::<StringVariant<Text>, NativeEndian>::wrap(&mut buf, 0, 256).unwrap();
        b.item(|i| i.set(Some("alpha")).map(|_| ())).unwrap();
        b.item(|i| i.set(Some("")).map(|_| ())).unwrap();
        b.build().unwrap()
    };
    let image: Vec<u8> = buf[..first].to_vec();

    // Feed the narrowed items back through a second append-and-build pass.
    let mut again = [0u8; 256];
    let second = {
        let mut b =
            Array8Builder::<StringVariant<Text>, NativeEndian>::wrap(&mut again, 0, 256).unwrap();
        b.item(|i| i.set(Some("alpha")).map(|_| ())).unwrap();
        b.item(|i| i.set(Some("")).map(|_| ())).unwrap();
        b.build().unwrap()
    };
    assert_eq!(second, first);
    assert_eq!(&again[..second], &image[..]);
}
