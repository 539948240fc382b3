//! String variant: UTF-8 text stored behind the narrowest declared header
//! width that fits the content, with an optional empty-string sentinel.
//!
//! ```text
//! +------+                +------+-----------+------------------+
//! | kind |      or        | kind | length:W  | utf-8 bytes      |
//! +------+                +------+-----------+------------------+
//!  empty sentinel          general member, W in {8, 16, 32}
//! ```
//!
//! Null is carried by the underlying string codec's all-ones sentinel, at
//! the narrowest declared general member.

use core::marker::PhantomData;

use eyre::{bail, ensure, eyre, Result};
use zerocopy::byteorder::ByteOrder;

use crate::buffer::{self, HeaderWidth, NativeEndian, W16, W32, W8};
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;
use crate::strings::{String16View, String32View, String8View, StringBuilder};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum StrMember {
    Empty,
    L8,
    L16,
    L32,
}

impl StrMember {
    fn header_size(self) -> usize {
        match self {
            StrMember::Empty => 0,
            StrMember::L8 => 1,
            StrMember::L16 => 2,
            StrMember::L32 => 4,
        }
    }
}

/// Declared kind bytes for a string variant. `KIND_EMPTY` is the sentinel
/// for `""`; the general members carry a length header of 8/16/32 bits.
pub trait StringVariantSpec: 'static {
    const KIND_EMPTY: Option<u8> = None;
    const KIND8: Option<u8> = None;
    const KIND16: Option<u8> = None;
    const KIND32: Option<u8> = None;
}

fn resolve<S: StringVariantSpec>(kind: u8) -> Option<StrMember> {
    let declared = [
        (S::KIND_EMPTY, StrMember::Empty),
        (S::KIND8, StrMember::L8),
        (S::KIND16, StrMember::L16),
        (S::KIND32, StrMember::L32),
    ];
    declared
        .iter()
        .find(|(k, _)| *k == Some(kind))
        .map(|(_, member)| *member)
}

fn kind_of<S: StringVariantSpec>(member: StrMember) -> Result<u8> {
    let kind = match member {
        StrMember::Empty => S::KIND_EMPTY,
        StrMember::L8 => S::KIND8,
        StrMember::L16 => S::KIND16,
        StrMember::L32 => S::KIND32,
    };
    kind.ok_or_else(|| eyre!("member {:?} is not declared", member))
}

/// Narrowest declared general member that can hold `len` content bytes.
fn member_for<S: StringVariantSpec>(len: usize) -> Result<StrMember> {
    let required = if (len as u64) < W8::MAX {
        StrMember::L8
    } else if (len as u64) < W16::MAX {
        StrMember::L16
    } else if (len as u64) < W32::MAX {
        StrMember::L32
    } else {
        bail!("length {} is beyond maximum length {}", len, W32::MAX - 1);
    };
    let order = [StrMember::L8, StrMember::L16, StrMember::L32];
    order
        .iter()
        .skip_while(|&&m| m != required)
        .find(|&&m| kind_of::<S>(m).is_ok())
        .copied()
        .ok_or_else(|| eyre!("no declared member can hold length {}", len))
}

fn narrowest<S: StringVariantSpec>() -> Result<StrMember> {
    member_for::<S>(0)
}

fn widest<S: StringVariantSpec>() -> Result<StrMember> {
    let order = [StrMember::L32, StrMember::L16, StrMember::L8];
    order
        .iter()
        .find(|&&m| kind_of::<S>(m).is_ok())
        .copied()
        .ok_or_else(|| eyre!("no general member is declared"))
}

/// Marker codec for a string variant with schema `S`.
#[derive(Debug)]
pub struct StringVariant<S: StringVariantSpec, O: ByteOrder + 'static = NativeEndian>(
    PhantomData<(S, O)>,
);

#[derive(Debug)]
pub struct StringVariantView<'a, S: StringVariantSpec, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    limit: usize,
    member: StrMember,
    _marker: PhantomData<(S, O)>,
}

impl<'a, S: StringVariantSpec, O: ByteOrder> View<'a> for StringVariantView<'a, S, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 1, max_limit)?;
        let kind = buffer::get_u8(buffer, offset)?;
        let member = resolve::<S>(kind)
            .ok_or_else(|| eyre!("unrecognized kind {} at offset {}", kind, offset))?;
        let limit = match member {
            StrMember::Empty => offset + 1,
            StrMember::L8 => String8View::<O>::wrap(buffer, offset + 1, max_limit)?.limit(),
            StrMember::L16 => String16View::<O>::wrap(buffer, offset + 1, max_limit)?.limit(),
            StrMember::L32 => String32View::<O>::wrap(buffer, offset + 1, max_limit)?.limit(),
        };
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

impl<'a, S: StringVariantSpec, O: ByteOrder> StringVariantView<'a, S, O> {
    pub fn kind(&self) -> Result<u8> {
        buffer::get_u8(self.buffer, self.offset)
    }

    /// Content length in bytes; `None` is null.
    pub fn length(&self) -> Result<Option<usize>> {
        match self.member {
            StrMember::Empty => Ok(Some(0)),
            StrMember::L8 => {
                Ok(String8View::<O>::wrap(self.buffer, self.offset + 1, self.limit)?.length())
            }
            StrMember::L16 => {
                Ok(String16View::<O>::wrap(self.buffer, self.offset + 1, self.limit)?.length())
            }
            StrMember::L32 => {
                Ok(String32View::<O>::wrap(self.buffer, self.offset + 1, self.limit)?.length())
            }
        }
    }

    /// The decoded text; `None` for null, error on invalid UTF-8.
    pub fn get(&self) -> Result<Option<&'a str>> {
        match self.member {
            StrMember::Empty => Ok(Some("")),
            StrMember::L8 => {
                String8View::<O>::wrap(self.buffer, self.offset + 1, self.limit)?.as_str()
            }
            StrMember::L16 => {
                String16View::<O>::wrap(self.buffer, self.offset + 1, self.limit)?.as_str()
            }
            StrMember::L32 => {
                String32View::<O>::wrap(self.buffer, self.offset + 1, self.limit)?.as_str()
            }
        }
    }
}

impl_byte_eq!(StringVariantView<'a, S: StringVariantSpec, O: ByteOrder>);

#[derive(Debug)]
pub struct StringVariantBuilder<'a, S: StringVariantSpec, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    provisional: bool,
    _marker: PhantomData<(S, O)>,
}

impl<'a, S: StringVariantSpec, O: ByteOrder> Builder<'a> for StringVariantBuilder<'a, S, O> {
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

impl<'a, S: StringVariantSpec, O: ByteOrder> StringVariantBuilder<'a, S, O> {
    /// Encodes `value`. `None` is null at the narrowest general member; a
    /// declared empty sentinel wins for `""`. A provisional builder (inside
    /// an array append pass) always writes the widest general member so that
    /// offsets of later items stay stable until the narrowing pass.
    pub fn set(&mut self, value: Option<&str>) -> Result<&mut Self> {
        let member = if self.provisional {
            widest::<S>()?
        } else {
            match value {
                None => narrowest::<S>()?,
                Some(text) if text.is_empty() && S::KIND_EMPTY.is_some() => StrMember::Empty,
                Some(text) => member_for::<S>(text.len())?,
            }
        };
        let kind = kind_of::<S>(member)?;
        check_limit(self.offset + 1, self.max_limit)?;
        buffer::put_u8(self.buffer, self.offset, kind)?;
        let limit = match member {
            StrMember::Empty => self.offset + 1,
            StrMember::L8 => self.set_general::<W8>(value)?,
            StrMember::L16 => self.set_general::<W16>(value)?,
            StrMember::L32 => self.set_general::<W32>(value)?,
        };
        self.limit = limit;
        Ok(self)
    }

    fn set_general<W: HeaderWidth>(&mut self, value: Option<&str>) -> Result<usize> {
        let mut inner =
            StringBuilder::<W, O>::wrap(self.buffer, self.offset + 1, self.max_limit)?;
        inner.set(value)?;
        inner.build()
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
    }
}

impl<S: StringVariantSpec, O: ByteOrder + 'static> Codec for StringVariant<S, O> {
    type View<'a> = StringVariantView<'a, S, O>;
    type Builder<'b> = StringVariantBuilder<'b, S, O>;

    fn wrap_item(buffer: &mut [u8], offset: usize, max_limit: usize) -> Result<Self::Builder<'_>> {
        let mut builder = StringVariantBuilder::wrap(buffer, offset, max_limit)?;
        builder.provisional = true;
        Ok(builder)
    }

    /// Narrows a provisionally encoded item to the member its actual content
    /// length selects, moving the content down to the write cursor.
    fn rebuild(
        buffer: &mut [u8],
        read_offset: usize,
        read_limit: usize,
        write_offset: usize,
        max_length: usize,
    ) -> Result<usize> {
        let _ = max_length;
        let source = StringVariantView::<S, O>::wrap(buffer, read_offset, read_limit)?;
        let member = source.member;
        // Content range in the pre-move encoding; None is null.
        let content = match member {
            StrMember::Empty => Some((read_offset + 1, 0)),
            StrMember::L8 | StrMember::L16 | StrMember::L32 => {
                let hdr = member.header_size();
                source
                    .length()?
                    .map(|len| (read_offset + 1 + hdr, len))
            }
        };
        let target = match content {
            None => narrowest::<S>()?,
            Some((_, 0)) if S::KIND_EMPTY.is_some() => StrMember::Empty,
            Some((_, len)) => member_for::<S>(len)?,
        };
        buffer::put_u8(buffer, write_offset, kind_of::<S>(target)?)?;
        let new_limit = match target {
            StrMember::Empty => write_offset + 1,
            StrMember::L8 => rebuild_general::<W8, O>(buffer, write_offset, content)?,
            StrMember::L16 => rebuild_general::<W16, O>(buffer, write_offset, content)?,
            StrMember::L32 => rebuild_general::<W32, O>(buffer, write_offset, content)?,
        };
        Ok(new_limit)
    }
}

fn rebuild_general<W: HeaderWidth, O: ByteOrder>(
    buffer: &mut [u8],
    write_offset: usize,
    content: Option<(usize, usize)>,
) -> Result<usize> {
    let header = write_offset + 1;
    match content {
        None => {
            W::put::<O>(buffer, header, W::MAX)?;
            Ok(header + W::SIZE)
        }
        Some((start, len)) => {
            // Narrowing never grows the header, so the destination starts at
            // or before the source and the forward move is safe.
            let dest = header + W::SIZE;
            buffer.copy_within(start..start + len, dest);
            W::put::<O>(buffer, header, len as u64)?;
            Ok(dest + len)
        }
    }
}
