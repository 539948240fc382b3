use super::*;

use crate::array::{Array16Builder, Array16View, Array8Builder, Array8View};
use crate::buffer::NativeEndian;
use crate::cursor::{Builder, View};
use crate::list::List8Builder;
use crate::map::{Map8Builder, Map8View};
use crate::scalar::{Uint16, Uint32};
use crate::strings::Str8;

#[derive(Debug)]
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

enum SparseNumber {}

impl IntVariantSpec for SparseNumber {
    const KIND16: Option<u8> = Some(0x52);
    const KIND64: Option<u8> = Some(0x58);
}

#[derive(Debug)]
enum TinyNumber {}

impl IntVariantSpec for TinyNumber {
    const KIND8: Option<u8> = Some(0x51);
}

enum Counter {}

impl UintVariantSpec for Counter {
    const KIND8: Option<u8> = Some(0x61);
    const KIND16: Option<u8> = Some(0x62);
    const KIND24: Option<u8> = Some(0x63);
    const KIND32: Option<u8> = Some(0x64);
    const KIND64: Option<u8> = Some(0x68);
}

enum Text {}

impl StringVariantSpec for Text {
    const KIND_EMPTY: Option<u8> = Some(0x00);
    const KIND8: Option<u8> = Some(0xA1);
    const KIND16: Option<u8> = Some(0xA2);
    const KIND32: Option<u8> = Some(0xA3);
}

enum Packet {}

impl OctetsVariantSpec for Packet {
    const KIND8: Option<u8> = Some(0xB1);
    const KIND16: Option<u8> = Some(0xB2);
}

enum Fields {}

impl ListVariantSpec for Fields {
    const KIND_ZERO: Option<u8> = Some(0x70);
    const KIND8: Option<u8> = Some(0x71);
    const KIND32: Option<u8> = Some(0x73);
}

#[derive(Debug)]
enum Tags {}

impl ArrayVariantSpec for Tags {
    const KIND8: Option<u8> = Some(0x91);
    const KIND16: Option<u8> = Some(0x92);
    const KIND32: Option<u8> = Some(0x93);
}

#[derive(Debug)]
enum Attrs {}

impl MapVariantSpec for Attrs {
    const KIND8: Option<u8> = Some(0x81);
    const KIND16: Option<u8> = Some(0x82);
    const KIND32: Option<u8> = Some(0x83);
}

fn set_int(buf: &mut [u8], value: i64) -> usize {
    let max = buf.len();
    let mut b = IntVariantBuilder::<Number, NativeEndian>::wrap(buf, 0, max).unwrap();
    b.set(value).unwrap();
    b.build().unwrap()
}

fn get_int(buf: &[u8], limit: usize) -> i64 {
    IntVariantView::<Number, NativeEndian>::wrap(buf, 0, limit)
        .unwrap()
        .get()
        .unwrap()
}

#[test]
fn int_variant_zero_and_one_use_sentinels() {
    let mut buf = [0u8; 16];
    let limit = set_int(&mut buf, 0);
    assert_eq!((limit, buf[0]), (1, 0x40));
    assert_eq!(get_int(&buf, limit), 0);

    let limit = set_int(&mut buf, 1);
    assert_eq!((limit, buf[0]), (1, 0x41));
    assert_eq!(get_int(&buf, limit), 1);
}

#[test]
fn int_variant_picks_narrowest_bucket() {
    let mut buf = [0u8; 16];
    for (value, kind, limit) in [
        (2i64, 0x51u8, 2usize),
        (127, 0x51, 2),
        (128, 0x52, 3),
        (32_767, 0x52, 3),
        (32_768, 0x53, 4),
        (8_388_607, 0x53, 4),
        (8_388_608, 0x54, 5),
        (2_147_483_647, 0x54, 5),
        (2_147_483_648, 0x58, 9),
    ] {
        let got = set_int(&mut buf, value);
        assert_eq!((got, buf[0]), (limit, kind), "value {}", value);
        assert_eq!(get_int(&buf, got), value);
    }
}

#[test]
fn int_variant_negative_values_probe_sign_extension() {
    let mut buf = [0u8; 16];
    let limit = set_int(&mut buf, -1);
    assert_eq!((limit, buf[0], buf[1]), (2, 0x51, 0xFF));
    assert_eq!(get_int(&buf, limit), -1);

    let limit = set_int(&mut buf, -129);
    assert_eq!((limit, buf[0]), (3, 0x52));
    assert_eq!(get_int(&buf, limit), -129);

    let limit = set_int(&mut buf, -8_388_608);
    assert_eq!((limit, buf[0]), (4, 0x53));
    assert_eq!(get_int(&buf, limit), -8_388_608);

    let limit = set_int(&mut buf, i64::MIN);
    assert_eq!((limit, buf[0]), (9, 0x58));
    assert_eq!(get_int(&buf, limit), i64::MIN);
}

#[test]
fn int_variant_undeclared_bucket_falls_through_to_wider() {
    let mut buf = [0u8; 16];
    let limit = {
        let mut b = IntVariantBuilder::<SparseNumber, NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
        b.set(5).unwrap();
        b.build().unwrap()
    };
    assert_eq!((limit, buf[0]), (3, 0x52), "8-bit bucket folds into 16");

    let limit = {
        let mut b = IntVariantBuilder::<SparseNumber, NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
        b.set(100_000).unwrap();
        b.build().unwrap()
    };
    assert_eq!((limit, buf[0]), (9, 0x58), "24/32-bit buckets fold into 64");
}

#[test]
fn int_variant_fails_when_no_member_fits() {
    let mut buf = [0u8; 16];
    let mut b = IntVariantBuilder::<TinyNumber, NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
    let err = b.set(1000).unwrap_err();
    assert!(err.to_string().contains("no declared member"));
    let err = b.set(-1000).unwrap_err();
    assert!(err.to_string().contains("no declared member"));
}

#[test]
fn int_variant_rejects_unrecognized_kind() {
    let buf = [0xEEu8, 0, 0];
    let err = IntVariantView::<Number, NativeEndian>::wrap(&buf, 0, 3).unwrap_err();
    assert!(err.to_string().contains("unrecognized kind 238 at offset 0"));
    assert!(IntVariantView::<Number, NativeEndian>::try_wrap(&buf, 0, 3).is_none());
}

#[test]
fn uint_variant_picks_narrowest_bucket() {
    let mut buf = [0u8; 16];
    for (value, kind, limit) in [
        (0u64, 0x61u8, 2usize),
        (255, 0x61, 2),
        (256, 0x62, 3),
        (65_535, 0x62, 3),
        (65_536, 0x63, 4),
        (16_777_215, 0x63, 4),
        (16_777_216, 0x64, 5),
        (4_294_967_295, 0x64, 5),
        (4_294_967_296, 0x68, 9),
    ] {
        let got = {
            let mut b = UintVariantBuilder::<Counter, NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
            b.set(value).unwrap();
            b.build().unwrap()
        };
        assert_eq!((got, buf[0]), (limit, kind), "value {}", value);
        let v = UintVariantView::<Counter, NativeEndian>::wrap(&buf, 0, got).unwrap();
        assert_eq!(v.get().unwrap(), value);
    }
}

#[test]
fn string_variant_selects_member_by_content_length() {
    // Empty string takes the sentinel: one kind byte, no payload.
    let mut buf = vec![0u8; 80_010];
    let limit = {
        let mut b = StringVariantBuilder::<Text, NativeEndian>::wrap(&mut buf, 0, 80_010).unwrap();
        b.set(Some("")).unwrap();
        b.build().unwrap()
    };
    assert_eq!((limit, buf[0]), (1, 0x00));
    let v = StringVariantView::<Text, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    assert_eq!(v.get().unwrap(), Some(""));

    // Ten bytes fit the 8-bit member.
    let limit = {
        let mut b = StringVariantBuilder::<Text, NativeEndian>::wrap(&mut buf, 0, 80_010).unwrap();
        b.set(Some("abcdefghij")).unwrap();
        b.build().unwrap()
    };
    assert_eq!((limit, buf[0], buf[1]), (12, 0xA1, 10));
    let v = StringVariantView::<Text, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    assert_eq!(v.get().unwrap(), Some("abcdefghij"));

    // Seventy thousand bytes need the 32-bit member.
    let text = "z".repeat(70_000);
    let limit = {
        let mut b = StringVariantBuilder::<Text, NativeEndian>::wrap(&mut buf, 0, 80_010).unwrap();
        b.set(Some(&text)).unwrap();
        b.build().unwrap()
    };
    assert_eq!((limit, buf[0]), (70_005, 0xA3));
    let v = StringVariantView::<Text, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    assert_eq!(v.length().unwrap(), Some(70_000));
}

#[test]
fn string_variant_null_takes_the_narrowest_member() {
    let mut buf = [0u8; 8];
    let limit = {
        let mut b = StringVariantBuilder::<Text, NativeEndian>::wrap(&mut buf, 0, 8).unwrap();
        b.set(None).unwrap();
        b.build().unwrap()
    };
    assert_eq!((limit, buf[0], buf[1]), (2, 0xA1, 0xFF));
    let v = StringVariantView::<Text, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    assert_eq!(v.get().unwrap(), None);
    assert_eq!(v.length().unwrap(), None);
}

#[test]
fn string_variant_build_without_set_fails() {
    let mut buf = [0u8; 8];
    let b = StringVariantBuilder::<Text, NativeEndian>::wrap(&mut buf, 0, 8).unwrap();
    assert!(b.build().unwrap_err().to_string().contains("value not set"));
}

#[test]
fn octets_variant_selects_member_by_content_length() {
    let mut buf = vec![0u8; 512];
    let limit = {
        let mut b = OctetsVariantBuilder::<Packet, NativeEndian>::wrap(&mut buf, 0, 512).unwrap();
        b.set(b"hello").unwrap();
        b.build().unwrap()
    };
    assert_eq!((limit, buf[0], buf[1]), (7, 0xB1, 5));
    let v = OctetsVariantView::<Packet, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    assert_eq!(v.get(), b"hello");

    let content = vec![0xCD; 300];
    let limit = {
        let mut b = OctetsVariantBuilder::<Packet, NativeEndian>::wrap(&mut buf, 0, 512).unwrap();
        b.set(&content).unwrap();
        b.build().unwrap()
    };
    assert_eq!((limit, buf[0]), (303, 0xB2));
    let v = OctetsVariantView::<Packet, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    assert_eq!(v.length(), 300);
}

#[test]
fn list_variant_picks_list8_for_a_small_body() {
    let mut scratch = [0u8; 16];
    let list_limit = {
        let mut b = List8Builder::<NativeEndian>::wrap(&mut scratch, 0, 16).unwrap();
        b.fields(2, &[1, 2, 3, 4, 5]).unwrap();
        b.build().unwrap()
    };
    let list = crate::list::List8View::<NativeEndian>::wrap(&scratch, 0, list_limit).unwrap();

    let mut buf = [0u8; 16];
    let limit = {
        let mut b = ListVariantBuilder::<Fields, NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
        b.set_list(&list).unwrap();
        b.build().unwrap()
    };
    assert_eq!(limit, 8);
    assert_eq!(&buf[..8], &[0x71, 6, 2, 1, 2, 3, 4, 5]);

    let v = ListVariantView::<Fields, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    assert_eq!(v.field_count(), 2);
    assert_eq!(v.fields(), &[1, 2, 3, 4, 5]);
}

#[test]
fn list_variant_empty_body_takes_the_zero_sentinel() {
    let mut buf = [0u8; 4];
    let limit = {
        let mut b = ListVariantBuilder::<Fields, NativeEndian>::wrap(&mut buf, 0, 4).unwrap();
        b.set(0, &[]).unwrap();
        b.build().unwrap()
    };
    assert_eq!((limit, buf[0]), (1, 0x70));

    let v = ListVariantView::<Fields, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    assert!(v.is_empty());
    assert!(v.fields().is_empty());
}

#[test]
fn list_variant_wide_body_skips_to_list32() {
    let fields = vec![7u8; 300];
    let mut buf = vec![0u8; 400];
    let limit = {
        let mut b = ListVariantBuilder::<Fields, NativeEndian>::wrap(&mut buf, 0, 400).unwrap();
        b.set(3, &fields).unwrap();
        b.build().unwrap()
    };
    assert_eq!((limit, buf[0]), (309, 0x73), "no 16-bit member is declared");

    let v = ListVariantView::<Fields, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    assert_eq!(v.field_count(), 3);
    assert_eq!(v.fields().len(), 300);
}

#[test]
fn array_of_string_variants_narrows_each_item() {
    let big = "w".repeat(300);
    let mut buf = vec![0u8; 512];
    let (limit, provisional) = {
        let mut b =
            Array16Builder::<StringVariant<Text>, NativeEndian>::wrap(&mut buf, 0, 512).unwrap();
        b.item(|i| i.set(Some("ab")).map(|_| ())).unwrap();
        b.item(|i| i.set(Some(&big)).map(|_| ())).unwrap();
        let provisional = b.limit();
        (b.build().unwrap(), provisional)
    };
    // Both items were appended at the 32-bit member and narrowed in place.
    assert_eq!(provisional, 4 + 7 + 305);
    assert_eq!(limit, 4 + 4 + 303);
    assert_eq!(buf[4], 0xA1, "two bytes fit the 8-bit member");
    assert_eq!(buf[8], 0xA2, "three hundred bytes need the 16-bit member");

    let v = Array16View::<StringVariant<Text>, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    let mut values = Vec::new();
    v.for_each(|item| values.push(item.get().unwrap().map(str::to_owned)))
        .unwrap();
    assert_eq!(values, [Some("ab".to_owned()), Some(big)]);
}

#[test]
fn array_compaction_keeps_null_and_empty_items() {
    let mut buf = [0u8; 32];
    let limit = {
        let mut b =
            Array8Builder::<StringVariant<Text>, NativeEndian>::wrap(&mut buf, 0, 32).unwrap();
        b.item(|i| i.set(None).map(|_| ())).unwrap();
        b.item(|i| i.set(Some("")).map(|_| ())).unwrap();
        b.item(|i| i.set(Some("xyz")).map(|_| ())).unwrap();
        b.build().unwrap()
    };
    // null -> 8-bit null (2), "" -> sentinel (1), "xyz" -> 8-bit (5)
    assert_eq!(limit, 2 + 2 + 1 + 5);

    let v = Array8View::<StringVariant<Text>, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    let mut values = Vec::new();
    v.for_each(|item| values.push(item.get().unwrap().map(str::to_owned)))
        .unwrap();
    assert_eq!(values, [None, Some(String::new()), Some("xyz".to_owned())]);
}

#[test]
fn array_variant_wraps_an_existing_array_body() {
    let mut scratch = [0u8; 16];
    let array_limit = {
        let mut b = Array8Builder::<Uint16, NativeEndian>::wrap(&mut scratch, 0, 16).unwrap();
        b.item(|i| i.set(100).map(|_| ())).unwrap();
        b.item(|i| i.set(200).map(|_| ())).unwrap();
        b.item(|i| i.set(300).map(|_| ())).unwrap();
        b.build().unwrap()
    };
    let array = Array8View::<Uint16, NativeEndian>::wrap(&scratch, 0, array_limit).unwrap();

    let mut buf = [0u8; 16];
    let limit = {
        let mut b =
            ArrayVariantBuilder::<Tags, Uint16, NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
        b.set_array(&array).unwrap();
        b.build().unwrap()
    };
    assert_eq!(buf[0], 0x91);

    let v = ArrayVariantView::<Tags, Uint16, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    let mut values = Vec::new();
    v.for_each(|item| values.push(item.value().unwrap())).unwrap();
    assert_eq!(values, [100, 200, 300]);
}

#[test]
fn map_variant_wraps_an_existing_map_body() {
    let mut scratch = [0u8; 64];
    let map_limit = {
        let mut b = Map8Builder::<Str8, Uint32, NativeEndian>::wrap(&mut scratch, 0, 64).unwrap();
        b.entry(|k| k.set(Some("one")).map(|_| ()), |v| v.set(1).map(|_| ()))
            .unwrap();
        b.entry(|k| k.set(Some("two")).map(|_| ()), |v| v.set(2).map(|_| ()))
            .unwrap();
        b.build().unwrap()
    };
    let map = Map8View::<Str8, Uint32, NativeEndian>::wrap(&scratch, 0, map_limit).unwrap();

    let mut buf = [0u8; 64];
    let limit = {
        let mut b =
            MapVariantBuilder::<Attrs, Str8, Uint32, NativeEndian>::wrap(&mut buf, 0, 64).unwrap();
        b.set_map(&map).unwrap();
        b.build().unwrap()
    };
    assert_eq!(buf[0], 0x81);

    let v = MapVariantView::<Attrs, Str8, Uint32, NativeEndian>::wrap(&buf, 0, limit).unwrap();
    assert_eq!(v.entry_count(), 2);
    let mut entries = Vec::new();
    v.for_each(|key, value| {
        entries.push((
            key.as_str().unwrap().unwrap().to_owned(),
            value.value().unwrap(),
        ));
    })
    .unwrap();
    assert_eq!(entries, [("one".to_owned(), 1), ("two".to_owned(), 2)]);
}

#[test]
fn map_variant_rejects_odd_field_count() {
    let mut buf = [0u8; 16];
    let mut b =
        MapVariantBuilder::<Attrs, Str8, Uint32, NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
    assert!(b.set(3, &[0; 6]).unwrap_err().to_string().contains("is odd"));
}

#[test]
fn array_and_map_variants_reject_a_zero_sentinel_kind() {
    // 0x70 is a list sentinel; arrays and maps declare no zero member, so
    // the kind byte must fail to resolve instead of decoding an empty body.
    let buf = [0x70u8, 0, 0];
    let err = ArrayVariantView::<Tags, Uint16, NativeEndian>::wrap(&buf, 0, 3).unwrap_err();
    assert!(err.to_string().contains("unrecognized kind 112"));

    let err = MapVariantView::<Attrs, Str8, Uint32, NativeEndian>::wrap(&buf, 0, 3).unwrap_err();
    assert!(err.to_string().contains("unrecognized kind 112"));
}
