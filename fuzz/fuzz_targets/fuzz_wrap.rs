//! Fuzz testing for view wrapping.
//!
//! Wraps arbitrary byte sequences with every codec's view to ensure
//! malformed input is always rejected with an error, never a panic or an
//! out-of-bounds cursor.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use wireview::array::Array8View;
use wireview::buffer::NativeEndian;
use wireview::cursor::View;
use wireview::enums::{EnumLabelSpec, EnumSpec, EnumView, LabelEnumView};
use wireview::list::{List32View, List8View};
use wireview::map::Map8View;
use wireview::octets::{BoundedOctets16View, BoundedOctets8View};
use wireview::scalar::{Int24View, Uint64View};
use wireview::strings::{String16View, String32View, String8View, Str8};
use wireview::variant::{
    IntVariantSpec, IntVariantView, ListVariantSpec, ListVariantView, StringVariant,
    StringVariantSpec, StringVariantView,
};
use wireview::varint::{Varint32View, Varuint32nView};
use wireview::W8;

enum Number {}

impl IntVariantSpec for Number {
    const KIND_ZERO: Option<u8> = Some(0x40);
    const KIND8: Option<u8> = Some(0x51);
    const KIND16: Option<u8> = Some(0x52);
    const KIND32: Option<u8> = Some(0x54);
    const KIND64: Option<u8> = Some(0x58);
}

enum Text {}

impl StringVariantSpec for Text {
    const KIND_EMPTY: Option<u8> = Some(0x00);
    const KIND8: Option<u8> = Some(0xA1);
    const KIND16: Option<u8> = Some(0xA2);
    const KIND32: Option<u8> = Some(0xA3);
}

enum Fields {}

impl ListVariantSpec for Fields {
    const KIND_ZERO: Option<u8> = Some(0x70);
    const KIND8: Option<u8> = Some(0x71);
    const KIND32: Option<u8> = Some(0x73);
}

enum Priority {}

impl EnumSpec for Priority {
    const VALUES: &'static [u64] = &[1, 2, 3];
}

enum Role {}

impl EnumLabelSpec for Role {
    const LABELS: &'static [&'static str] = &["reader", "writer"];
}

#[derive(Debug, Arbitrary)]
struct WrapInput {
    data: Vec<u8>,
    offset: u16,
    max_limit: u16,
}

fn check<'a, V: View<'a>>(buffer: &'a [u8], offset: usize, max_limit: usize) {
    if let Some(view) = V::try_wrap(buffer, offset, max_limit) {
        assert!(view.offset() <= view.limit());
        assert!(view.limit() <= view.max_limit());
        assert!(view.max_limit() <= buffer.len());
        let _ = view.bytes();
    }
}

fuzz_target!(|input: WrapInput| {
    let buffer = input.data.as_slice();
    let offset = input.offset as usize;
    let max_limit = input.max_limit as usize;

    check::<Uint64View<NativeEndian>>(buffer, offset, max_limit);
    check::<Int24View<NativeEndian>>(buffer, offset, max_limit);
    check::<Varint32View>(buffer, offset, max_limit);
    check::<Varuint32nView>(buffer, offset, max_limit);
    check::<String8View<NativeEndian>>(buffer, offset, max_limit);
    check::<String16View<NativeEndian>>(buffer, offset, max_limit);
    check::<String32View<NativeEndian>>(buffer, offset, max_limit);
    check::<BoundedOctets8View<NativeEndian>>(buffer, offset, max_limit);
    check::<BoundedOctets16View<NativeEndian>>(buffer, offset, max_limit);
    check::<List8View<NativeEndian>>(buffer, offset, max_limit);
    check::<List32View<NativeEndian>>(buffer, offset, max_limit);
    check::<EnumView<Priority, W8, NativeEndian>>(buffer, offset, max_limit);
    check::<LabelEnumView<Role, NativeEndian>>(buffer, offset, max_limit);
    check::<IntVariantView<Number, NativeEndian>>(buffer, offset, max_limit);
    check::<StringVariantView<Text, NativeEndian>>(buffer, offset, max_limit);
    check::<ListVariantView<Fields, NativeEndian>>(buffer, offset, max_limit);

    // Containers walk their items on access; decoding must stay in bounds.
    if let Some(array) =
        Array8View::<StringVariant<Text>, NativeEndian>::try_wrap(buffer, offset, max_limit)
    {
        let _ = array.for_each(|item| {
            let _ = item.get();
        });
    }
    if let Some(map) = Map8View::<Str8, Str8, NativeEndian>::try_wrap(buffer, offset, max_limit) {
        let _ = map.for_each(|key, value| {
            let _ = key.as_str();
            let _ = value.as_str();
        });
    }
});
