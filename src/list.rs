//! # List Codec
//!
//! A counted container whose field region is opaque to this layer: callers
//! append fields through a visitor and read them back with their own typed
//! cursors. The header is two same-width fields:
//!
//! ```text
//! +----------+---------------+------------------+
//! | length:W | fieldCount:W  | fields ...       |
//! +----------+---------------+------------------+
//! ```
//!
//! `length` counts the fieldCount field plus the fields region, so
//! `limit = offset + W::SIZE + length`. Widths W8 and W32 are provided; the
//! builder backpatches the header on `build()` and fails if either field
//! exceeds the width's maximum.

use core::marker::PhantomData;

use eyre::{ensure, Result};
use zerocopy::byteorder::ByteOrder;

use crate::buffer::{HeaderWidth, NativeEndian, W32, W8};
use crate::cursor::{check_limit, check_wrap, Builder, View};
use crate::impl_byte_eq;

#[derive(Debug)]
pub struct ListView<'a, W: HeaderWidth, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    length: usize,
    field_count: u64,
    _marker: PhantomData<(W, O)>,
}

pub type List8View<'a, O = NativeEndian> = ListView<'a, W8, O>;
pub type List32View<'a, O = NativeEndian> = ListView<'a, W32, O>;

impl<'a, W: HeaderWidth, O: ByteOrder> View<'a> for ListView<'a, W, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 2 * W::SIZE, max_limit)?;
        let length = W::get::<O>(buffer, offset)? as usize;
        let field_count = W::get::<O>(buffer, offset + W::SIZE)?;
        ensure!(
            length >= W::SIZE,
            "list length {} at offset {} is smaller than its field count field",
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

impl<'a, W: HeaderWidth, O: ByteOrder> ListView<'a, W, O> {
    /// Header length field: fieldCount field plus fields region, in bytes.
    pub fn length(&self) -> usize {
        self.length
    }

    pub fn field_count(&self) -> u64 {
        self.field_count
    }

    /// The opaque fields region.
    pub fn fields(&self) -> &'a [u8] {
        &self.buffer[self.offset + 2 * W::SIZE..self.limit()]
    }
}

impl_byte_eq!(ListView<'a, W: HeaderWidth, O: ByteOrder>);

#[derive(Debug)]
pub struct ListBuilder<'a, W: HeaderWidth, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    field_count: u64,
    _marker: PhantomData<(W, O)>,
}

pub type List8Builder<'a, O = NativeEndian> = ListBuilder<'a, W8, O>;
pub type List32Builder<'a, O = NativeEndian> = ListBuilder<'a, W32, O>;

impl<'a, W: HeaderWidth, O: ByteOrder> Builder<'a> for ListBuilder<'a, W, O> {
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
            "list length {} is beyond maximum {}",
            length,
            W::MAX
        );
        ensure!(
            self.field_count <= W::MAX,
            "list field count {} is beyond maximum {}",
            self.field_count,
            W::MAX
        );
        W::put::<O>(self.buffer, self.offset, length)?;
        W::put::<O>(self.buffer, self.offset + W::SIZE, self.field_count)?;
        Ok(self.limit)
    }
}

impl<'a, W: HeaderWidth, O: ByteOrder> ListBuilder<'a, W, O> {
    /// Appends one field. The visitor writes at the given offset bounded by
    /// `max_limit` and returns the number of bytes written.
    pub fn field<F>(&mut self, visitor: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut [u8], usize, usize) -> Result<usize>,
    {
        let written = visitor(self.buffer, self.limit, self.max_limit)?;
        let new_limit = self.limit + written;
        check_limit(new_limit, self.max_limit)?;
        self.limit = new_limit;
        self.field_count += 1;
        Ok(self)
    }

    /// Appends a pre-encoded block of `count` fields at once.
    pub fn fields(&mut self, count: u64, raw: &[u8]) -> Result<&mut Self> {
        let new_limit = self.limit + raw.len();
        check_limit(new_limit, self.max_limit)?;
        self.buffer[self.limit..new_limit].copy_from_slice(raw);
        self.limit = new_limit;
        self.field_count += count;
        Ok(self)
    }

    pub fn field_count(&self) -> u64 {
        self.field_count
    }

    /// Resets the builder to an empty list, keeping the wrap bounds.
    pub fn rewrap(&mut self) {
        self.limit = self.offset + 2 * W::SIZE;
        self.field_count = 0;
    }
}
