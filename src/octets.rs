//! # Octet Span Codecs
//!
//! `BoundedOctets` is a length-prefixed raw byte span with an 8- or 16-bit
//! length field and no sentinel values; the maximum content length is the
//! width's full range (`2^w - 1`).
//!
//! ```text
//! +----------+----------------+
//! | length:W | bytes ...      |
//! +----------+----------------+
//! ```
//!
//! `Octets` is the degenerate span with no header at all: its limit is the
//! wrap's `max_limit`, which makes it the right shape for opaque payloads
//! whose extent is delimited by an enclosing header (list fields, message
//! tails).

use core::marker::PhantomData;

use eyre::{ensure, Result};
use zerocopy::byteorder::ByteOrder;

use crate::buffer::{HeaderWidth, NativeEndian, W16, W8};
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;

/// Marker codec for a length-prefixed octet span.
#[derive(Debug)]
pub struct BoundedOctets<W: HeaderWidth, O: ByteOrder + 'static = NativeEndian>(
    PhantomData<(W, O)>,
);

pub type BoundedOctets8<O = NativeEndian> = BoundedOctets<W8, O>;
pub type BoundedOctets16<O = NativeEndian> = BoundedOctets<W16, O>;

#[derive(Debug)]
pub struct BoundedOctetsView<'a, W: HeaderWidth, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    length: usize,
    _marker: PhantomData<(W, O)>,
}

pub type BoundedOctets8View<'a, O = NativeEndian> = BoundedOctetsView<'a, W8, O>;
pub type BoundedOctets16View<'a, O = NativeEndian> = BoundedOctetsView<'a, W16, O>;

impl<'a, W: HeaderWidth, O: ByteOrder> View<'a> for BoundedOctetsView<'a, W, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + W::SIZE, max_limit)?;
        let length = W::get::<O>(buffer, offset)? as usize;
        check_limit(offset + W::SIZE + length, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            max_limit,
            length,
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

impl<'a, W: HeaderWidth, O: ByteOrder> BoundedOctetsView<'a, W, O> {
    pub fn length(&self) -> usize {
        self.length
    }

    /// The content bytes, without the length prefix.
    pub fn get(&self) -> &'a [u8] {
        &self.buffer[self.offset + W::SIZE..self.limit()]
    }
}

impl_byte_eq!(BoundedOctetsView<'a, W: HeaderWidth, O: ByteOrder>);

#[derive(Debug)]
pub struct BoundedOctetsBuilder<'a, W: HeaderWidth, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    _marker: PhantomData<(W, O)>,
}

pub type BoundedOctets8Builder<'a, O = NativeEndian> = BoundedOctetsBuilder<'a, W8, O>;
pub type BoundedOctets16Builder<'a, O = NativeEndian> = BoundedOctetsBuilder<'a, W16, O>;

impl<'a, W: HeaderWidth, O: ByteOrder> Builder<'a> for BoundedOctetsBuilder<'a, W, O> {
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + W::SIZE, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            limit: offset,
            max_limit,
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

impl<'a, W: HeaderWidth, O: ByteOrder> BoundedOctetsBuilder<'a, W, O> {
    pub fn set(&mut self, value: &[u8]) -> Result<&mut Self> {
        ensure!(
            value.len() as u64 <= W::MAX,
            "length {} is beyond maximum length {}",
            value.len(),
            W::MAX
        );
        let new_limit = self.offset + W::SIZE + value.len();
        check_limit(new_limit, self.max_limit)?;
        W::put::<O>(self.buffer, self.offset, value.len() as u64)?;
        self.buffer[self.offset + W::SIZE..new_limit].copy_from_slice(value);
        self.limit = new_limit;
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
    }
}

impl<W: HeaderWidth, O: ByteOrder + 'static> Codec for BoundedOctets<W, O> {
    type View<'a> = BoundedOctetsView<'a, W, O>;
    type Builder<'b> = BoundedOctetsBuilder<'b, W, O>;
}

/// Headerless raw span delimited by `max_limit`.
#[derive(Debug)]
pub struct OctetsView<'a> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
}

impl<'a> View<'a> for OctetsView<'a> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            max_limit,
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
        self.max_limit
    }
}

impl<'a> OctetsView<'a> {
    pub fn get(&self) -> &'a [u8] {
        self.bytes()
    }
}

impl_byte_eq!(OctetsView<'a>);

#[derive(Debug)]
pub struct OctetsBuilder<'a> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
}

impl<'a> Builder<'a> for OctetsBuilder<'a> {
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            limit: offset,
            max_limit,
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
        Ok(self.limit)
    }
}

impl<'a> OctetsBuilder<'a> {
    /// Replaces the accumulated content with `value`.
    pub fn set(&mut self, value: &[u8]) -> Result<&mut Self> {
        self.limit = self.offset;
        self.put(value)
    }

    /// Appends raw bytes at the write cursor.
    pub fn put(&mut self, value: &[u8]) -> Result<&mut Self> {
        let new_limit = self.limit + value.len();
        check_limit(new_limit, self.max_limit)?;
        self.buffer[self.limit..new_limit].copy_from_slice(value);
        self.limit = new_limit;
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
    }
}
