//! Octet-span variant: a raw byte span behind the narrowest declared length
//! header that fits the content. No sentinels and no null; the underlying
//! span codec uses the full width range for lengths.

use core::marker::PhantomData;

use eyre::{bail, ensure, eyre, Result};
use zerocopy::byteorder::ByteOrder;

use crate::buffer::{self, HeaderWidth, NativeEndian, W16, W32, W8};
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;
use crate::octets::{BoundedOctetsBuilder, BoundedOctetsView};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum OctMember {
    L8,
    L16,
    L32,
}

impl OctMember {
    fn header_size(self) -> usize {
        match self {
            OctMember::L8 => 1,
            OctMember::L16 => 2,
            OctMember::L32 => 4,
        }
    }
}

/// Declared kind bytes for an octet-span variant.
pub trait OctetsVariantSpec: 'static {
    const KIND8: Option<u8> = None;
    const KIND16: Option<u8> = None;
    const KIND32: Option<u8> = None;
}

fn resolve<S: OctetsVariantSpec>(kind: u8) -> Option<OctMember> {
    let declared = [
        (S::KIND8, OctMember::L8),
        (S::KIND16, OctMember::L16),
        (S::KIND32, OctMember::L32),
    ];
    declared
        .iter()
        .find(|(k, _)| *k == Some(kind))
        .map(|(_, member)| *member)
}

fn kind_of<S: OctetsVariantSpec>(member: OctMember) -> Result<u8> {
    let kind = match member {
        OctMember::L8 => S::KIND8,
        OctMember::L16 => S::KIND16,
        OctMember::L32 => S::KIND32,
    };
    kind.ok_or_else(|| eyre!("member {:?} is not declared", member))
}

fn member_for<S: OctetsVariantSpec>(len: usize) -> Result<OctMember> {
    let required = if len as u64 <= W8::MAX {
        OctMember::L8
    } else if len as u64 <= W16::MAX {
        OctMember::L16
    } else if len as u64 <= W32::MAX {
        OctMember::L32
    } else {
        bail!("length {} is beyond maximum length {}", len, W32::MAX);
    };
    let order = [OctMember::L8, OctMember::L16, OctMember::L32];
    order
        .iter()
        .skip_while(|&&m| m != required)
        .find(|&&m| kind_of::<S>(m).is_ok())
        .copied()
        .ok_or_else(|| eyre!("no declared member can hold length {}", len))
}

fn widest<S: OctetsVariantSpec>() -> Result<OctMember> {
    let order = [OctMember::L32, OctMember::L16, OctMember::L8];
    order
        .iter()
        .find(|&&m| kind_of::<S>(m).is_ok())
        .copied()
        .ok_or_else(|| eyre!("no member is declared"))
}

/// Marker codec for an octet-span variant with schema `S`.
#[derive(Debug)]
pub struct OctetsVariant<S: OctetsVariantSpec, O: ByteOrder + 'static = NativeEndian>(
    PhantomData<(S, O)>,
);

#[derive(Debug)]
pub struct OctetsVariantView<'a, S: OctetsVariantSpec, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    limit: usize,
    member: OctMember,
    _marker: PhantomData<(S, O)>,
}

impl<'a, S: OctetsVariantSpec, O: ByteOrder> View<'a> for OctetsVariantView<'a, S, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 1, max_limit)?;
        let kind = buffer::get_u8(buffer, offset)?;
        let member = resolve::<S>(kind)
            .ok_or_else(|| eyre!("unrecognized kind {} at offset {}", kind, offset))?;
        let limit = match member {
            OctMember::L8 => {
                BoundedOctetsView::<W8, O>::wrap(buffer, offset + 1, max_limit)?.limit()
            }
            OctMember::L16 => {
                BoundedOctetsView::<W16, O>::wrap(buffer, offset + 1, max_limit)?.limit()
            }
            OctMember::L32 => {
                BoundedOctetsView::<W32, O>::wrap(buffer, offset + 1, max_limit)?.limit()
            }
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

impl<'a, S: OctetsVariantSpec, O: ByteOrder> OctetsVariantView<'a, S, O> {
    pub fn kind(&self) -> Result<u8> {
        buffer::get_u8(self.buffer, self.offset)
    }

    /// The content bytes, without the kind byte or length prefix.
    pub fn get(&self) -> &'a [u8] {
        let hdr = self.member.header_size();
        &self.buffer[self.offset + 1 + hdr..self.limit]
    }

    pub fn length(&self) -> usize {
        self.limit - self.offset - 1 - self.member.header_size()
    }
}

impl_byte_eq!(OctetsVariantView<'a, S: OctetsVariantSpec, O: ByteOrder>);

#[derive(Debug)]
pub struct OctetsVariantBuilder<'a, S: OctetsVariantSpec, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    provisional: bool,
    _marker: PhantomData<(S, O)>,
}

impl<'a, S: OctetsVariantSpec, O: ByteOrder> Builder<'a> for OctetsVariantBuilder<'a, S, O> {
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

impl<'a, S: OctetsVariantSpec, O: ByteOrder> OctetsVariantBuilder<'a, S, O> {
    pub fn set(&mut self, value: &[u8]) -> Result<&mut Self> {
        let member = if self.provisional {
            widest::<S>()?
        } else {
            member_for::<S>(value.len())?
        };
        check_limit(self.offset + 1, self.max_limit)?;
        buffer::put_u8(self.buffer, self.offset, kind_of::<S>(member)?)?;
        let limit = match member {
            OctMember::L8 => self.set_general::<W8>(value)?,
            OctMember::L16 => self.set_general::<W16>(value)?,
            OctMember::L32 => self.set_general::<W32>(value)?,
        };
        self.limit = limit;
        Ok(self)
    }

    fn set_general<W: HeaderWidth>(&mut self, value: &[u8]) -> Result<usize> {
        let mut inner =
            BoundedOctetsBuilder::<W, O>::wrap(self.buffer, self.offset + 1, self.max_limit)?;
        inner.set(value)?;
        inner.build()
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
    }
}

impl<S: OctetsVariantSpec, O: ByteOrder + 'static> Codec for OctetsVariant<S, O> {
    type View<'a> = OctetsVariantView<'a, S, O>;
    type Builder<'b> = OctetsVariantBuilder<'b, S, O>;

    fn wrap_item(buffer: &mut [u8], offset: usize, max_limit: usize) -> Result<Self::Builder<'_>> {
        let mut builder = OctetsVariantBuilder::wrap(buffer, offset, max_limit)?;
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
        let source = OctetsVariantView::<S, O>::wrap(buffer, read_offset, read_limit)?;
        let start = read_offset + 1 + source.member.header_size();
        let len = source.length();
        let target = member_for::<S>(len)?;
        buffer::put_u8(buffer, write_offset, kind_of::<S>(target)?)?;
        let header = write_offset + 1;
        let dest = header + target.header_size();
        buffer.copy_within(start..start + len, dest);
        match target {
            OctMember::L8 => W8::put::<O>(buffer, header, len as u64)?,
            OctMember::L16 => W16::put::<O>(buffer, header, len as u64)?,
            OctMember::L32 => W32::put::<O>(buffer, header, len as u64)?,
        }
        Ok(dest + len)
    }
}
