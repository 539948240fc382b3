//! # Array Codec
//!
//! A counted container of homogeneous typed items. The header matches the
//! list codec; the fields region is a back-to-back run of items of one
//! declared codec `T`, each self-describing its own size:
//!
//! ```text
//! +----------+---------------+--------+--------+-----+
//! | length:W | fieldCount:W  | item 0 | item 1 | ... |
//! +----------+---------------+--------+--------+-----+
//! ```
//!
//! Traversal is single-pass and allocation-free: each item is lazily wrapped
//! starting at the previous item's limit.
//!
//! ## Append-then-narrow
//!
//! Adaptive-width items (variants) cannot know their final width while later
//! items are still being appended, because narrowing an item would shift
//! every offset after it. The builder therefore appends such items
//! provisionally at their widest declared layout ([`Codec::wrap_item`]) and
//! `build()` runs a narrowing walk:
//!
//! ```text
//! read cursor   ──────►  item offsets in the provisional (wide) layout
//! write cursor  ──────►  item offsets in the narrowed layout
//! ```
//!
//! Each item is re-encoded at the narrowest layout that fits its value
//! ([`Codec::rebuild`]), at or before its provisional offset. After every
//! item the write cursor must not pass the read cursor; rebuild may shrink
//! or keep an item's size, never grow it, so a violation means the item
//! bytes were malformed and is reported as an error. The header is
//! backpatched only after the walk completes.

use core::marker::PhantomData;

use eyre::{ensure, Result};
use zerocopy::byteorder::ByteOrder;

use crate::buffer::{HeaderWidth, NativeEndian, W16, W32, W8};
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;

#[derive(Debug)]
pub struct ArrayView<'a, W: HeaderWidth, T: Codec, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    length: usize,
    field_count: u64,
    _marker: PhantomData<(W, T, O)>,
}

pub type Array8View<'a, T, O = NativeEndian> = ArrayView<'a, W8, T, O>;
pub type Array16View<'a, T, O = NativeEndian> = ArrayView<'a, W16, T, O>;
pub type Array32View<'a, T, O = NativeEndian> = ArrayView<'a, W32, T, O>;

impl<'a, W: HeaderWidth, T: Codec, O: ByteOrder> View<'a> for ArrayView<'a, W, T, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 2 * W::SIZE, max_limit)?;
        let length = W::get::<O>(buffer, offset)? as usize;
        let field_count = W::get::<O>(buffer, offset + W::SIZE)?;
        ensure!(
            length >= W::SIZE,
            "array length {} at offset {} is smaller than its field count field",
            length,
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

impl<'a, W: HeaderWidth, T: Codec, O: ByteOrder> ArrayView<'a, W, T, O> {
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn field_count(&self) -> u64 {
        self.field_count
    }

    pub fn is_empty(&self) -> bool {
        self.field_count == 0
    }

    fn fields_offset(&self) -> usize {
        self.offset + 2 * W::SIZE
    }

    /// Visits every item in order.
    pub fn for_each<F>(&self, mut consumer: F) -> Result<()>
    where
        F: FnMut(&T::View<'a>),
    {
        let limit = self.limit();
        let mut offset = self.fields_offset();
        for _ in 0..self.field_count {
            let item = <T::View<'a> as View<'a>>::wrap(self.buffer, offset, limit)?;
            offset = item.limit();
            consumer(&item);
        }
        Ok(())
    }

    /// True if any item satisfies the predicate; stops at the first match.
    pub fn any_match<F>(&self, mut predicate: F) -> Result<bool>
    where
        F: FnMut(&T::View<'a>) -> bool,
    {
        Ok(self.match_first(&mut predicate)?.is_some())
    }

    /// The first item satisfying the predicate, if any.
    pub fn match_first<F>(&self, mut predicate: F) -> Result<Option<T::View<'a>>>
    where
        F: FnMut(&T::View<'a>) -> bool,
    {
        let limit = self.limit();
        let mut offset = self.fields_offset();
        for _ in 0..self.field_count {
            let item = <T::View<'a> as View<'a>>::wrap(self.buffer, offset, limit)?;
            offset = item.limit();
            if predicate(&item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }
}

impl_byte_eq!(ArrayView<'a, W: HeaderWidth, T: Codec, O: ByteOrder>);

#[derive(Debug)]
pub struct ArrayBuilder<'a, W: HeaderWidth, T: Codec, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    field_count: u64,
    max_length: usize,
    _marker: PhantomData<(W, T, O)>,
}

pub type Array8Builder<'a, T, O = NativeEndian> = ArrayBuilder<'a, W8, T, O>;
pub type Array16Builder<'a, T, O = NativeEndian> = ArrayBuilder<'a, W16, T, O>;
pub type Array32Builder<'a, T, O = NativeEndian> = ArrayBuilder<'a, W32, T, O>;

impl<'a, W: HeaderWidth, T: Codec, O: ByteOrder> Builder<'a> for ArrayBuilder<'a, W, T, O> {
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 2 * W::SIZE, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            limit: offset + 2 * W::SIZE,
            max_limit,
            field_count: 0,
            max_length: 0,
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

    fn build(mut self) -> Result<usize> {
        let fields_offset = self.offset + 2 * W::SIZE;
        let append_limit = self.limit;
        let mut read_offset = fields_offset;
        let mut write_limit = fields_offset;

        for _ in 0..self.field_count {
            let read_limit = {
                let item = <T::View<'_> as View<'_>>::wrap(self.buffer, read_offset, append_limit)?;
                item.limit()
            };
            let new_limit =
                T::rebuild(self.buffer, read_offset, read_limit, write_limit, self.max_length)?;
            ensure!(
                new_limit <= read_limit,
                "compacted item at offset {} overruns the unread item at offset {}",
                write_limit,
                read_limit
            );
            write_limit = new_limit;
            read_offset = read_limit;
        }

        self.limit = write_limit;
        let length = (self.limit - self.offset - W::SIZE) as u64;
        ensure!(
            length <= W::MAX,
            "array length {} is beyond maximum {}",
            length,
            W::MAX
        );
        ensure!(
            self.field_count <= W::MAX,
            "array field count {} is beyond maximum {}",
            self.field_count,
            W::MAX
        );
        W::put::<O>(self.buffer, self.offset, length)?;
        W::put::<O>(self.buffer, self.offset + W::SIZE, self.field_count)?;
        Ok(self.limit)
    }
}

impl<'a, W: HeaderWidth, T: Codec, O: ByteOrder> ArrayBuilder<'a, W, T, O> {
    /// Appends one item through a nested typed builder.
    pub fn item<F>(&mut self, consumer: F) -> Result<&mut Self>
    where
        F: for<'b> FnOnce(&mut T::Builder<'b>) -> Result<()>,
    {
        let offset = self.limit;
        let max_limit = self.max_limit;
        let item_limit = {
            let mut item = T::wrap_item(self.buffer, offset, max_limit)?;
            consumer(&mut item)?;
            item.build()?
        };
        check_limit(item_limit, self.max_limit)?;
        self.max_length = self.max_length.max(item_limit - offset);
        self.limit = item_limit;
        self.field_count += 1;
        Ok(self)
    }

    pub fn field_count(&self) -> u64 {
        self.field_count
    }

    /// Largest provisional encoded item size observed so far.
    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Resets the builder to an empty array, keeping the wrap bounds.
    pub fn rewrap(&mut self) {
        self.limit = self.offset + 2 * W::SIZE;
        self.field_count = 0;
        self.max_length = 0;
    }
}
