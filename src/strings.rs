//! # Length-Prefixed String Codec
//!
//! UTF-8 text behind an 8/16/32-bit length prefix with a reserved **null
//! sentinel**: the all-ones length value (`2^w - 1`) means "no string" and no
//! value region follows. The maximum content length is therefore `2^w - 2`.
//!
//! ```text
//! +----------+----------------+        +----------+
//! | length:W | utf-8 bytes    |   or   | 2^w - 1  |   (null)
//! +----------+----------------+        +----------+
//! ```
//!
//! Reading a null string is not an error: `as_str()` returns `None`. A
//! builder that is finalized without any value set encodes null.

use core::marker::PhantomData;

use eyre::{ensure, eyre, Result};
use zerocopy::byteorder::ByteOrder;

use crate::buffer::{HeaderWidth, NativeEndian, W16, W32, W8};
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;

/// Marker codec for a length-prefixed string of header width `W`.
#[derive(Debug)]
pub struct Str<W: HeaderWidth, O: ByteOrder + 'static = NativeEndian>(PhantomData<(W, O)>);

pub type Str8<O = NativeEndian> = Str<W8, O>;
pub type Str16<O = NativeEndian> = Str<W16, O>;
pub type Str32<O = NativeEndian> = Str<W32, O>;

#[derive(Debug)]
pub struct StringView<'a, W: HeaderWidth, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    length: Option<usize>,
    _marker: PhantomData<(W, O)>,
}

pub type String8View<'a, O = NativeEndian> = StringView<'a, W8, O>;
pub type String16View<'a, O = NativeEndian> = StringView<'a, W16, O>;
pub type String32View<'a, O = NativeEndian> = StringView<'a, W32, O>;

impl<'a, W: HeaderWidth, O: ByteOrder> View<'a> for StringView<'a, W, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + W::SIZE, max_limit)?;
        let raw = W::get::<O>(buffer, offset)?;
        let length = if raw == W::MAX {
            None
        } else {
            Some(raw as usize)
        };
        let limit = offset + W::SIZE + length.unwrap_or(0);
        check_limit(limit, max_limit)?;
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
        self.offset + W::SIZE + self.length.unwrap_or(0)
    }
}

impl<'a, W: HeaderWidth, O: ByteOrder> StringView<'a, W, O> {
    /// Content length in bytes; `None` is the null sentinel.
    pub fn length(&self) -> Option<usize> {
        self.length
    }

    pub fn is_null(&self) -> bool {
        self.length.is_none()
    }

    /// Raw content bytes, `None` for null.
    pub fn data(&self) -> Option<&'a [u8]> {
        self.length
            .map(|len| &self.buffer[self.offset + W::SIZE..self.offset + W::SIZE + len])
    }

    /// The decoded text; `None` for null, error on invalid UTF-8.
    pub fn as_str(&self) -> Result<Option<&'a str>> {
        match self.data() {
            None => Ok(None),
            Some(bytes) => core::str::from_utf8(bytes)
                .map(Some)
                .map_err(|e| eyre!("invalid utf-8 at offset {}: {}", self.offset + W::SIZE, e)),
        }
    }
}

impl_byte_eq!(StringView<'a, W: HeaderWidth, O: ByteOrder>);

#[derive(Debug)]
pub struct StringBuilder<'a, W: HeaderWidth, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    _marker: PhantomData<(W, O)>,
}

pub type String8Builder<'a, O = NativeEndian> = StringBuilder<'a, W8, O>;
pub type String16Builder<'a, O = NativeEndian> = StringBuilder<'a, W16, O>;
pub type String32Builder<'a, O = NativeEndian> = StringBuilder<'a, W32, O>;

impl<'a, W: HeaderWidth, O: ByteOrder> Builder<'a> for StringBuilder<'a, W, O> {
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

    fn build(mut self) -> Result<usize> {
        if self.limit == self.offset {
            self.set(None)?;
        }
        Ok(self.limit)
    }
}

impl<'a, W: HeaderWidth, O: ByteOrder> StringBuilder<'a, W, O> {
    pub fn set(&mut self, value: Option<&str>) -> Result<&mut Self> {
        match value {
            None => {
                W::put::<O>(self.buffer, self.offset, W::MAX)?;
                self.limit = self.offset + W::SIZE;
                Ok(self)
            }
            Some(text) => self.set_bytes(text.as_bytes()),
        }
    }

    /// Sets pre-encoded content bytes directly.
    pub fn set_bytes(&mut self, value: &[u8]) -> Result<&mut Self> {
        ensure!(
            (value.len() as u64) < W::MAX,
            "length {} is beyond maximum length {}",
            value.len(),
            W::MAX - 1
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

impl<W: HeaderWidth, O: ByteOrder + 'static> Codec for Str<W, O> {
    type View<'a> = StringView<'a, W, O>;
    type Builder<'b> = StringBuilder<'b, W, O>;
}
