//! Collection variants: a list, array or map body behind the narrowest
//! declared header width, with an optional empty sentinel for lists.
//!
//! ```text
//! +------+            +------+----------+---------------+------------+
//! | kind |     or     | kind | length:W | fieldCount:W  | fields ... |
//! +------+            +------+----------+---------------+------------+
//!  empty sentinel      general member, W in {8, 16, 32}
//! ```
//!
//! The chosen width must fit both the length header (fieldCount field plus
//! fields region) and the field count itself.

use core::marker::PhantomData;

use eyre::{bail, ensure, eyre, Result};
use zerocopy::byteorder::ByteOrder;

use crate::array::ArrayView;
use crate::buffer::{self, HeaderWidth, NativeEndian, W16, W32, W8};
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;
use crate::list::ListView;
use crate::map::MapView;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum ColMember {
    Zero,
    C8,
    C16,
    C32,
}

impl ColMember {
    /// Size of one header field; the full header is twice this.
    fn field_size(self) -> usize {
        match self {
            ColMember::Zero => 0,
            ColMember::C8 => 1,
            ColMember::C16 => 2,
            ColMember::C32 => 4,
        }
    }

    fn max(self) -> u64 {
        match self {
            ColMember::Zero => 0,
            ColMember::C8 => W8::MAX,
            ColMember::C16 => W16::MAX,
            ColMember::C32 => W32::MAX,
        }
    }
}

/// Declared kind bytes of one collection variant family, gathered from its
/// spec trait so the resolve/select/rebuild machinery can be shared.
#[derive(Clone, Copy)]
struct ColKinds {
    zero: Option<u8>,
    k8: Option<u8>,
    k16: Option<u8>,
    k32: Option<u8>,
}

impl ColKinds {
    fn resolve(&self, kind: u8) -> Option<ColMember> {
        let declared = [
            (self.zero, ColMember::Zero),
            (self.k8, ColMember::C8),
            (self.k16, ColMember::C16),
            (self.k32, ColMember::C32),
        ];
        declared
            .iter()
            .find(|(k, _)| *k == Some(kind))
            .map(|(_, member)| *member)
    }

    fn kind_of(&self, member: ColMember) -> Result<u8> {
        let kind = match member {
            ColMember::Zero => self.zero,
            ColMember::C8 => self.k8,
            ColMember::C16 => self.k16,
            ColMember::C32 => self.k32,
        };
        kind.ok_or_else(|| eyre!("member {:?} is not declared", member))
    }

    /// Narrowest declared general member whose width fits both the length
    /// header and the field count.
    fn member_for(&self, fields_len: usize, field_count: u64) -> Result<ColMember> {
        let order = [ColMember::C8, ColMember::C16, ColMember::C32];
        order
            .iter()
            .filter(|&&m| self.kind_of(m).is_ok())
            .find(|&&m| {
                (fields_len + m.field_size()) as u64 <= m.max() && field_count <= m.max()
            })
            .copied()
            .ok_or_else(|| {
                eyre!(
                    "no declared member can hold {} field bytes and {} fields",
                    fields_len,
                    field_count
                )
            })
    }

    fn widest(&self) -> Result<ColMember> {
        let order = [ColMember::C32, ColMember::C16, ColMember::C8];
        order
            .iter()
            .find(|&&m| self.kind_of(m).is_ok())
            .copied()
            .ok_or_else(|| eyre!("no general member is declared"))
    }
}

fn get_field<O: ByteOrder>(buffer: &[u8], offset: usize, member: ColMember) -> Result<u64> {
    match member {
        ColMember::Zero => Ok(0),
        ColMember::C8 => W8::get::<O>(buffer, offset),
        ColMember::C16 => W16::get::<O>(buffer, offset),
        ColMember::C32 => W32::get::<O>(buffer, offset),
    }
}

fn put_field<O: ByteOrder>(
    buffer: &mut [u8],
    offset: usize,
    member: ColMember,
    value: u64,
) -> Result<()> {
    match member {
        ColMember::Zero => Ok(()),
        ColMember::C8 => W8::put::<O>(buffer, offset, value),
        ColMember::C16 => W16::put::<O>(buffer, offset, value),
        ColMember::C32 => W32::put::<O>(buffer, offset, value),
    }
}

/// Decodes the body at `offset` and returns `(member, fields_offset,
/// fields_len, field_count, limit)`.
fn decode_body<O: ByteOrder>(
    kinds: &ColKinds,
    buffer: &[u8],
    offset: usize,
    max_limit: usize,
) -> Result<(ColMember, usize, usize, u64, usize)> {
    check_wrap(buffer.len(), offset, max_limit)?;
    check_limit(offset + 1, max_limit)?;
    let kind = buffer::get_u8(buffer, offset)?;
    let member = kinds
        .resolve(kind)
        .ok_or_else(|| eyre!("unrecognized kind {} at offset {}", kind, offset))?;
    if member == ColMember::Zero {
        return Ok((member, offset + 1, 0, 0, offset + 1));
    }
    let fs = member.field_size();
    check_limit(offset + 1 + 2 * fs, max_limit)?;
    let length = get_field::<O>(buffer, offset + 1, member)? as usize;
    let field_count = get_field::<O>(buffer, offset + 1 + fs, member)?;
    ensure!(
        length >= fs,
        "length {} at offset {} is smaller than its field count field",
        length,
        offset + 1
    );
    let limit = offset + 1 + fs + length;
    check_limit(limit, max_limit)?;
    Ok((member, offset + 1 + 2 * fs, length - fs, field_count, limit))
}

/// Encodes `fields` at `write_offset` in the narrowest declared member,
/// moving them from `fields_start` which must lie at or after the encoded
/// position. Shared by the builders and the narrowing rebuild.
fn encode_body<O: ByteOrder>(
    kinds: &ColKinds,
    buffer: &mut [u8],
    write_offset: usize,
    max_limit: usize,
    member: ColMember,
    fields_start: usize,
    fields_len: usize,
    field_count: u64,
) -> Result<usize> {
    check_limit(write_offset + 1, max_limit)?;
    buffer::put_u8(buffer, write_offset, kinds.kind_of(member)?)?;
    if member == ColMember::Zero {
        return Ok(write_offset + 1);
    }
    let fs = member.field_size();
    let dest = write_offset + 1 + 2 * fs;
    check_limit(dest + fields_len, max_limit)?;
    buffer.copy_within(fields_start..fields_start + fields_len, dest);
    put_field::<O>(buffer, write_offset + 1, member, (fields_len + fs) as u64)?;
    put_field::<O>(buffer, write_offset + 1 + fs, member, field_count)?;
    Ok(dest + fields_len)
}

fn select_member(
    kinds: &ColKinds,
    fields_len: usize,
    field_count: u64,
    provisional: bool,
) -> Result<ColMember> {
    if provisional {
        kinds.widest()
    } else if fields_len == 0 && field_count == 0 && kinds.zero.is_some() {
        Ok(ColMember::Zero)
    } else {
        kinds.member_for(fields_len, field_count)
    }
}

fn rebuild_body<O: ByteOrder>(
    kinds: &ColKinds,
    buffer: &mut [u8],
    read_offset: usize,
    read_limit: usize,
    write_offset: usize,
) -> Result<usize> {
    let (_, fields_start, fields_len, field_count, _) =
        decode_body::<O>(kinds, buffer, read_offset, read_limit)?;
    let target = select_member(kinds, fields_len, field_count, false)?;
    // Narrowing never grows the header, so the moved fields never pass
    // their source.
    encode_body::<O>(
        kinds,
        buffer,
        write_offset,
        read_limit,
        target,
        fields_start,
        fields_len,
        field_count,
    )
}

/// Declared kind bytes for a list variant. `KIND_ZERO` is the sentinel for
/// an empty list with no header at all.
pub trait ListVariantSpec: 'static {
    const KIND_ZERO: Option<u8> = None;
    const KIND8: Option<u8> = None;
    const KIND16: Option<u8> = None;
    const KIND32: Option<u8> = None;
}

fn list_kinds<S: ListVariantSpec>() -> ColKinds {
    ColKinds {
        zero: S::KIND_ZERO,
        k8: S::KIND8,
        k16: S::KIND16,
        k32: S::KIND32,
    }
}

/// Marker codec for a list variant with schema `S`.
#[derive(Debug)]
pub struct ListVariant<S: ListVariantSpec, O: ByteOrder + 'static = NativeEndian>(
    PhantomData<(S, O)>,
);

#[derive(Debug)]
pub struct ListVariantView<'a, S: ListVariantSpec, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    limit: usize,
    fields_offset: usize,
    fields_len: usize,
    field_count: u64,
    _marker: PhantomData<(S, O)>,
}

impl<'a, S: ListVariantSpec, O: ByteOrder> View<'a> for ListVariantView<'a, S, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        let kinds = list_kinds::<S>();
        let (_, fields_offset, fields_len, field_count, limit) =
            decode_body::<O>(&kinds, buffer, offset, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            max_limit,
            limit,
            fields_offset,
            fields_len,
            field_count,
            _marker: PhantomData,
        })
    }

    fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn max_limit(&self) -> usize {
        self.max_limit
    }

    fn limit(&self) -> usize {
        self.limit
    }
}

impl<'a, S: ListVariantSpec, O: ByteOrder> ListVariantView<'a, S, O> {
    pub fn kind(&self) -> Result<u8> {
        buffer::get_u8(self.buffer, self.offset)
    }

    pub fn field_count(&self) -> u64 {
        self.field_count
    }

    pub fn is_empty(&self) -> bool {
        self.field_count == 0
    }

    /// The opaque fields region; empty for the zero sentinel.
    pub fn fields(&self) -> &'a [u8] {
        &self.buffer[self.fields_offset..self.fields_offset + self.fields_len]
    }
}

impl_byte_eq!(ListVariantView<'a, S: ListVariantSpec, O: ByteOrder>);

#[derive(Debug)]
pub struct ListVariantBuilder<'a, S: ListVariantSpec, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    provisional: bool,
    _marker: PhantomData<(S, O)>,
}

impl<'a, S: ListVariantSpec, O: ByteOrder> Builder<'a> for ListVariantBuilder<'a, S, O> {
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            limit: offset,
            max_limit,
            provisional: false,
            _marker: PhantomData,
        })
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn max_limit(&self) -> usize {
        self.max_limit
    }

    fn limit(&self) -> usize {
        self.limit
    }

    fn build(self) -> Result<usize> {
        ensure!(self.limit > self.offset, "value not set");
        Ok(self.limit)
    }
}

impl<'a, S: ListVariantSpec, O: ByteOrder> ListVariantBuilder<'a, S, O> {
    /// Encodes a pre-built body of `field_count` fields. An empty body takes
    /// the zero sentinel when one is declared.
    pub fn set(&mut self, field_count: u64, fields: &[u8]) -> Result<&mut Self> {
        let kinds = list_kinds::<S>();
        let member = select_member(&kinds, fields.len(), field_count, self.provisional)?;
        check_limit(self.offset + 1, self.max_limit)?;
        buffer::put_u8(self.buffer, self.offset, kinds.kind_of(member)?)?;
        if member == ColMember::Zero {
            self.limit = self.offset + 1;
            return Ok(self);
        }
        let fs = member.field_size();
        let dest = self.offset + 1 + 2 * fs;
        check_limit(dest + fields.len(), self.max_limit)?;
        self.buffer[dest..dest + fields.len()].copy_from_slice(fields);
        put_field::<O>(self.buffer, self.offset + 1, member, (fields.len() + fs) as u64)?;
        put_field::<O>(self.buffer, self.offset + 1 + fs, member, field_count)?;
        self.limit = dest + fields.len();
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
    }
    /// Re-encodes an existing list body under this variant's members.
    pub fn set_list<W: HeaderWidth>(&mut self, list: &ListView<'_, W, O>) -> Result<&mut Self> {
        self.set(list.field_count(), list.fields())
    }
}

impl<S: ListVariantSpec, O: ByteOrder + 'static> Codec for ListVariant<S, O> {
    type View<'a> = ListVariantView<'a, S, O>;
    type Builder<'b> = ListVariantBuilder<'b, S, O>;

    fn wrap_item(buffer: &mut [u8], offset: usize, max_limit: usize) -> Result<Self::Builder<'_>> {
        let mut builder = ListVariantBuilder::wrap(buffer, offset, max_limit)?;
        builder.provisional = true;
        Ok(builder)
    }

    fn rebuild(
        buffer: &mut [u8],
        read_offset: usize,
        read_limit: usize,
        write_offset: usize,
        max_length: usize,
    ) -> Result<usize> {
        let _ = max_length;
        let kinds = list_kinds::<S>();
        rebuild_body::<O>(&kinds, buffer, read_offset, read_limit, write_offset)
    }
}

/// Declared kind bytes for an array variant.
pub trait ArrayVariantSpec: 'static {
    const KIND8: Option<u8> = None;
    const KIND16: Option<u8> = None;
    const KIND32: Option<u8> = None;
}

fn array_kinds<S: ArrayVariantSpec>() -> ColKinds {
    ColKinds {
        zero: None,
        k8: S::KIND8,
        k16: S::KIND16,
        k32: S::KIND32,
    }
}

/// Marker codec for an array variant with schema `S` and item codec `T`.
#[derive(Debug)]
pub struct ArrayVariant<S: ArrayVariantSpec, T: Codec, O: ByteOrder + 'static = NativeEndian>(
    PhantomData<(S, T, O)>,
);

#[derive(Debug)]
pub struct ArrayVariantView<'a, S: ArrayVariantSpec, T: Codec, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    limit: usize,
    member: ColMember,
    _marker: PhantomData<(S, T, O)>,
}

impl<'a, S: ArrayVariantSpec, T: Codec, O: ByteOrder> View<'a> for ArrayVariantView<'a, S, T, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        let kinds = array_kinds::<S>();
        let (member, _, _, _, limit) = decode_body::<O>(&kinds, buffer, offset, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            max_limit,
            limit,
            member,
            _marker: PhantomData,
        })
    }

    fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn max_limit(&self) -> usize {
        self.max_limit
    }

    fn limit(&self) -> usize {
        self.limit
    }
}

impl<'a, S: ArrayVariantSpec, T: Codec, O: ByteOrder> ArrayVariantView<'a, S, T, O> {
    pub fn kind(&self) -> Result<u8> {
        buffer::get_u8(self.buffer, self.offset)
    }

    /// Visits every item in order, through the width the kind byte selected.
    pub fn for_each<F>(&self, consumer: F) -> Result<()>
    where
        F: FnMut(&T::View<'a>),
    {
        match self.member {
            ColMember::Zero => bail!("array variants declare no zero sentinel"),
            ColMember::C8 => ArrayView::<W8, T, O>::wrap(self.buffer, self.offset + 1, self.limit)?
                .for_each(consumer),
            ColMember::C16 => {
                ArrayView::<W16, T, O>::wrap(self.buffer, self.offset + 1, self.limit)?
                    .for_each(consumer)
            }
            ColMember::C32 => {
                ArrayView::<W32, T, O>::wrap(self.buffer, self.offset + 1, self.limit)?
                    .for_each(consumer)
            }
        }
    }
}

impl_byte_eq!(ArrayVariantView<'a, S: ArrayVariantSpec, T: Codec, O: ByteOrder>);

#[derive(Debug)]
pub struct ArrayVariantBuilder<'a, S: ArrayVariantSpec, T: Codec, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    provisional: bool,
    _marker: PhantomData<(S, T, O)>,
}

impl<'a, S: ArrayVariantSpec, T: Codec, O: ByteOrder> Builder<'a>
    for ArrayVariantBuilder<'a, S, T, O>
{
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            limit: offset,
            max_limit,
            provisional: false,
            _marker: PhantomData,
        })
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn max_limit(&self) -> usize {
        self.max_limit
    }

    fn limit(&self) -> usize {
        self.limit
    }

    fn build(self) -> Result<usize> {
        ensure!(self.limit > self.offset, "value not set");
        Ok(self.limit)
    }
}

impl<'a, S: ArrayVariantSpec, T: Codec, O: ByteOrder> ArrayVariantBuilder<'a, S, T, O> {
    /// Re-encodes an existing array body under this variant's members. The
    /// items themselves are already self-describing and move verbatim.
    pub fn set_array<W: HeaderWidth>(&mut self, array: &ArrayView<'_, W, T, O>) -> Result<&mut Self> {
        let fields = &array.buffer()[array.offset() + 2 * W::SIZE..array.limit()];
        self.set(array.field_count(), fields)
    }

    /// Encodes a pre-built run of `field_count` items.
    pub fn set(&mut self, field_count: u64, fields: &[u8]) -> Result<&mut Self> {
        let kinds = array_kinds::<S>();
        let member = select_member(&kinds, fields.len(), field_count, self.provisional)?;
        check_limit(self.offset + 1, self.max_limit)?;
        buffer::put_u8(self.buffer, self.offset, kinds.kind_of(member)?)?;
        let fs = member.field_size();
        let dest = self.offset + 1 + 2 * fs;
        check_limit(dest + fields.len(), self.max_limit)?;
        self.buffer[dest..dest + fields.len()].copy_from_slice(fields);
        put_field::<O>(self.buffer, self.offset + 1, member, (fields.len() + fs) as u64)?;
        put_field::<O>(self.buffer, self.offset + 1 + fs, member, field_count)?;
        self.limit = dest + fields.len();
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
    }
}

impl<S: ArrayVariantSpec, T: Codec, O: ByteOrder + 'static> Codec for ArrayVariant<S, T, O> {
    type View<'a> = ArrayVariantView<'a, S, T, O>;
    type Builder<'b> = ArrayVariantBuilder<'b, S, T, O>;

    fn wrap_item(buffer: &mut [u8], offset: usize, max_limit: usize) -> Result<Self::Builder<'_>> {
        let mut builder = ArrayVariantBuilder::wrap(buffer, offset, max_limit)?;
        builder.provisional = true;
        Ok(builder)
    }

    fn rebuild(
        buffer: &mut [u8],
        read_offset: usize,
        read_limit: usize,
        write_offset: usize,
        max_length: usize,
    ) -> Result<usize> {
        let _ = max_length;
        let kinds = array_kinds::<S>();
        rebuild_body::<O>(&kinds, buffer, read_offset, read_limit, write_offset)
    }
}

/// Declared kind bytes for a map variant.
pub trait MapVariantSpec: 'static {
    const KIND8: Option<u8> = None;
    const KIND16: Option<u8> = None;
    const KIND32: Option<u8> = None;
}

fn map_kinds<S: MapVariantSpec>() -> ColKinds {
    ColKinds {
        zero: None,
        k8: S::KIND8,
        k16: S::KIND16,
        k32: S::KIND32,
    }
}

/// Marker codec for a map variant with schema `S`, keys `K` and values `V`.
#[derive(Debug)]
pub struct MapVariant<
    S: MapVariantSpec,
    K: Codec,
    V: Codec,
    O: ByteOrder + 'static = NativeEndian,
>(PhantomData<(S, K, V, O)>);

#[derive(Debug)]
pub struct MapVariantView<'a, S: MapVariantSpec, K: Codec, V: Codec, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    limit: usize,
    member: ColMember,
    field_count: u64,
    _marker: PhantomData<(S, K, V, O)>,
}

impl<'a, S: MapVariantSpec, K: Codec, V: Codec, O: ByteOrder> View<'a>
    for MapVariantView<'a, S, K, V, O>
{
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        let kinds = map_kinds::<S>();
        let (member, _, _, field_count, limit) =
            decode_body::<O>(&kinds, buffer, offset, max_limit)?;
        ensure!(
            field_count % 2 == 0,
            "map field count {} at offset {} is odd",
            field_count,
            offset
        );
        Ok(Self {
            buffer,
            offset,
            max_limit,
            limit,
            member,
            field_count,
            _marker: PhantomData,
        })
    }

    fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn max_limit(&self) -> usize {
        self.max_limit
    }

    fn limit(&self) -> usize {
        self.limit
    }
}

impl<'a, S: MapVariantSpec, K: Codec, V: Codec, O: ByteOrder> MapVariantView<'a, S, K, V, O> {
    pub fn kind(&self) -> Result<u8> {
        buffer::get_u8(self.buffer, self.offset)
    }

    pub fn entry_count(&self) -> u64 {
        self.field_count / 2
    }

    /// Visits every key/value pair through the width the kind byte selected.
    pub fn for_each<F>(&self, consumer: F) -> Result<()>
    where
        F: FnMut(&K::View<'a>, &V::View<'a>),
    {
        match self.member {
            ColMember::Zero => bail!("map variants declare no zero sentinel"),
            ColMember::C8 => {
                MapView::<W8, K, V, O>::wrap(self.buffer, self.offset + 1, self.limit)?
                    .for_each(consumer)
            }
            ColMember::C16 => {
                MapView::<W16, K, V, O>::wrap(self.buffer, self.offset + 1, self.limit)?
                    .for_each(consumer)
            }
            ColMember::C32 => {
                MapView::<W32, K, V, O>::wrap(self.buffer, self.offset + 1, self.limit)?
                    .for_each(consumer)
            }
        }
    }
}

impl_byte_eq!(MapVariantView<'a, S: MapVariantSpec, K: Codec, V: Codec, O: ByteOrder>);

#[derive(Debug)]
pub struct MapVariantBuilder<'a, S: MapVariantSpec, K: Codec, V: Codec, O: ByteOrder = NativeEndian>
{
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    provisional: bool,
    _marker: PhantomData<(S, K, V, O)>,
}

impl<'a, S: MapVariantSpec, K: Codec, V: Codec, O: ByteOrder> Builder<'a>
    for MapVariantBuilder<'a, S, K, V, O>
{
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            limit: offset,
            max_limit,
            provisional: false,
            _marker: PhantomData,
        })
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn max_limit(&self) -> usize {
        self.max_limit
    }

    fn limit(&self) -> usize {
        self.limit
    }

    fn build(self) -> Result<usize> {
        ensure!(self.limit > self.offset, "value not set");
        Ok(self.limit)
    }
}

impl<'a, S: MapVariantSpec, K: Codec, V: Codec, O: ByteOrder> MapVariantBuilder<'a, S, K, V, O> {
    /// Re-encodes an existing map body under this variant's members.
    pub fn set_map<W: HeaderWidth>(&mut self, map: &MapView<'_, W, K, V, O>) -> Result<&mut Self> {
        let fields = &map.buffer()[map.offset() + 2 * W::SIZE..map.limit()];
        self.set(map.field_count(), fields)
    }

    /// Encodes a pre-built run of `field_count` keys and values.
    pub fn set(&mut self, field_count: u64, fields: &[u8]) -> Result<&mut Self> {
        bail_on_odd(field_count)?;
        let kinds = map_kinds::<S>();
        let member = select_member(&kinds, fields.len(), field_count, self.provisional)?;
        check_limit(self.offset + 1, self.max_limit)?;
        buffer::put_u8(self.buffer, self.offset, kinds.kind_of(member)?)?;
        let fs = member.field_size();
        let dest = self.offset + 1 + 2 * fs;
        check_limit(dest + fields.len(), self.max_limit)?;
        self.buffer[dest..dest + fields.len()].copy_from_slice(fields);
        put_field::<O>(self.buffer, self.offset + 1, member, (fields.len() + fs) as u64)?;
        put_field::<O>(self.buffer, self.offset + 1 + fs, member, field_count)?;
        self.limit = dest + fields.len();
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
    }
}

fn bail_on_odd(field_count: u64) -> Result<()> {
    if field_count % 2 != 0 {
        bail!("map field count {} is odd", field_count);
    }
    Ok(())
}

impl<S: MapVariantSpec, K: Codec, V: Codec, O: ByteOrder + 'static> Codec
    for MapVariant<S, K, V, O>
{
    type View<'a> = MapVariantView<'a, S, K, V, O>;
    type Builder<'b> = MapVariantBuilder<'b, S, K, V, O>;

    fn wrap_item(buffer: &mut [u8], offset: usize, max_limit: usize) -> Result<Self::Builder<'_>> {
        let mut builder = MapVariantBuilder::wrap(buffer, offset, max_limit)?;
        builder.provisional = true;
        Ok(builder)
    }

    fn rebuild(
        buffer: &mut [u8],
        read_offset: usize,
        read_limit: usize,
        write_offset: usize,
        max_length: usize,
    ) -> Result<usize> {
        let _ = max_length;
        let kinds = map_kinds::<S>();
        rebuild_body::<O>(&kinds, buffer, read_offset, read_limit, write_offset)
    }
}
