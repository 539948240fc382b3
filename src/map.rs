//! # Map Codec
//!
//! Array-shaped header over key/value entries of two independently typed
//! codecs. `fieldCount` counts keys **and** values, so it is always even and
//! iteration steps by two:
//!
//! ```text
//! +----------+---------------+-------+---------+-------+---------+-----+
//! | length:W | fieldCount:W  | key 0 | value 0 | key 1 | value 1 | ... |
//! +----------+---------------+-------+---------+-------+---------+-----+
//! ```
//!
//! `try_wrap` walks every entry and reports absent if any of them ends past
//! the available bytes, so a partially buffered map is never observed as
//! complete.

use core::marker::PhantomData;

use eyre::{ensure, Result};
use zerocopy::byteorder::ByteOrder;

use crate::buffer::{HeaderWidth, NativeEndian, W32, W8};
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;

#[derive(Debug)]
pub struct MapView<'a, W: HeaderWidth, K: Codec, V: Codec, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    length: usize,
    field_count: u64,
    _marker: PhantomData<(W, K, V, O)>,
}

pub type Map8View<'a, K, V, O = NativeEndian> = MapView<'a, W8, K, V, O>;
pub type Map32View<'a, K, V, O = NativeEndian> = MapView<'a, W32, K, V, O>;

impl<'a, W: HeaderWidth, K: Codec, V: Codec, O: ByteOrder> View<'a> for MapView<'a, W, K, V, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 2 * W::SIZE, max_limit)?;
        let length = W::get::<O>(buffer, offset)? as usize;
        let field_count = W::get::<O>(buffer, offset + W::SIZE)?;
        ensure!(
            length >= W::SIZE,
            "map length {} at offset {} is smaller than its field count field",
            length,
            offset
        );
        ensure!(
            field_count % 2 == 0,
            "map field count {} at offset {} is odd",
            field_count,
            offset
        );
        check_limit(offset + W::SIZE + length, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            max_limit,
            length,
            field_count,
            _marker: PhantomData,
        })
    }

    fn try_wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Option<Self> {
        let map = Self::wrap(buffer, offset, max_limit).ok()?;
        let limit = map.limit();
        let mut entry_offset = map.fields_offset();
        let mut index = 0;
        while index < map.field_count {
            let key = <K::View<'a> as View<'a>>::try_wrap(buffer, entry_offset, limit)?;
            let value = <V::View<'a> as View<'a>>::try_wrap(buffer, key.limit(), limit)?;
            entry_offset = value.limit();
            index += 2;
        }
        Some(map)
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
        self.offset + W::SIZE + self.length
    }
}

impl<'a, W: HeaderWidth, K: Codec, V: Codec, O: ByteOrder> MapView<'a, W, K, V, O> {
    pub fn length(&self) -> usize {
        self.length
    }

    /// Keys plus values, always even.
    pub fn field_count(&self) -> u64 {
        self.field_count
    }

    pub fn entry_count(&self) -> u64 {
        self.field_count / 2
    }

    pub fn is_empty(&self) -> bool {
        self.field_count == 0
    }

    fn fields_offset(&self) -> usize {
        self.offset + 2 * W::SIZE
    }

    /// Visits every key/value pair in order.
    pub fn for_each<F>(&self, mut consumer: F) -> Result<()>
    where
        F: FnMut(&K::View<'a>, &V::View<'a>),
    {
        let limit = self.limit();
        let mut entry_offset = self.fields_offset();
        let mut index = 0;
        while index < self.field_count {
            let key = <K::View<'a> as View<'a>>::wrap(self.buffer, entry_offset, limit)?;
            let value = <V::View<'a> as View<'a>>::wrap(self.buffer, key.limit(), limit)?;
            entry_offset = value.limit();
            consumer(&key, &value);
            index += 2;
        }
        Ok(())
    }
}

impl_byte_eq!(MapView<'a, W: HeaderWidth, K: Codec, V: Codec, O: ByteOrder>);

#[derive(Debug)]
pub struct MapBuilder<'a, W: HeaderWidth, K: Codec, V: Codec, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    field_count: u64,
    _marker: PhantomData<(W, K, V, O)>,
}

pub type Map8Builder<'a, K, V, O = NativeEndian> = MapBuilder<'a, W8, K, V, O>;
pub type Map32Builder<'a, K, V, O = NativeEndian> = MapBuilder<'a, W32, K, V, O>;

impl<'a, W: HeaderWidth, K: Codec, V: Codec, O: ByteOrder> Builder<'a>
    for MapBuilder<'a, W, K, V, O>
{
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 2 * W::SIZE, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            limit: offset + 2 * W::SIZE,
            max_limit,
            field_count: 0,
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
        let length = (self.limit - self.offset - W::SIZE) as u64;
        ensure!(
            length <= W::MAX,
            "map length {} is beyond maximum {}",
            length,
            W::MAX
        );
        ensure!(
            self.field_count <= W::MAX,
            "map field count {} is beyond maximum {}",
            self.field_count,
            W::MAX
        );
        W::put::<O>(self.buffer, self.offset, length)?;
        W::put::<O>(self.buffer, self.offset + W::SIZE, self.field_count)?;
        Ok(self.limit)
    }
}

impl<'a, W: HeaderWidth, K: Codec, V: Codec, O: ByteOrder> MapBuilder<'a, W, K, V, O> {
    /// Appends one key/value entry.
    pub fn entry<FK, FV>(&mut self, key: FK, value: FV) -> Result<&mut Self>
    where
        FK: for<'b> FnOnce(&mut K::Builder<'b>) -> Result<()>,
        FV: for<'b> FnOnce(&mut V::Builder<'b>) -> Result<()>,
    {
        let max_limit = self.max_limit;
        let key_limit = {
            let mut kb = <K::Builder<'_> as Builder<'_>>::wrap(self.buffer, self.limit, max_limit)?;
            key(&mut kb)?;
            kb.build()?
        };
        let value_limit = {
            let mut vb = <V::Builder<'_> as Builder<'_>>::wrap(self.buffer, key_limit, max_limit)?;
            value(&mut vb)?;
            vb.build()?
        };
        check_limit(value_limit, self.max_limit)?;
        self.limit = value_limit;
        self.field_count += 2;
        Ok(self)
    }

    pub fn field_count(&self) -> u64 {
        self.field_count
    }

    /// Resets the builder to an empty map, keeping the wrap bounds.
    pub fn rewrap(&mut self) {
        self.limit = self.offset + 2 * W::SIZE;
        self.field_count = 0;
    }
}
