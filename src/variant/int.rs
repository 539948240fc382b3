//! Integer variants: a signed or unsigned value stored at the narrowest
//! declared width that reproduces it, with optional zero/one sentinels.

use core::marker::PhantomData;

use eyre::{bail, ensure, eyre, Result};
use zerocopy::byteorder::ByteOrder;

use crate::buffer::{self, NativeEndian};
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;

/// Width buckets an integer member can occupy. `Zero` and `One` are
/// sentinels with no payload.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum IntMember {
    Zero,
    One,
    B8,
    B16,
    B24,
    B32,
    B64,
}

impl IntMember {
    fn payload_size(self) -> usize {
        match self {
            IntMember::Zero | IntMember::One => 0,
            IntMember::B8 => 1,
            IntMember::B16 => 2,
            IntMember::B24 => 3,
            IntMember::B32 => 4,
            IntMember::B64 => 8,
        }
    }
}

/// Declared kind bytes for a signed integer variant, one per width bucket.
/// `None` buckets fold into the next larger declared one on encode.
pub trait IntVariantSpec: 'static {
    const KIND_ZERO: Option<u8> = None;
    const KIND_ONE: Option<u8> = None;
    const KIND8: Option<u8> = None;
    const KIND16: Option<u8> = None;
    const KIND24: Option<u8> = None;
    const KIND32: Option<u8> = None;
    const KIND64: Option<u8> = None;
}

/// Declared kind bytes for an unsigned integer variant.
pub trait UintVariantSpec: 'static {
    const KIND_ZERO: Option<u8> = None;
    const KIND_ONE: Option<u8> = None;
    const KIND8: Option<u8> = None;
    const KIND16: Option<u8> = None;
    const KIND24: Option<u8> = None;
    const KIND32: Option<u8> = None;
    const KIND64: Option<u8> = None;
}

fn resolve_signed<S: IntVariantSpec>(kind: u8) -> Option<IntMember> {
    let declared = [
        (S::KIND_ZERO, IntMember::Zero),
        (S::KIND_ONE, IntMember::One),
        (S::KIND8, IntMember::B8),
        (S::KIND16, IntMember::B16),
        (S::KIND24, IntMember::B24),
        (S::KIND32, IntMember::B32),
        (S::KIND64, IntMember::B64),
    ];
    declared
        .iter()
        .find(|(k, _)| *k == Some(kind))
        .map(|(_, member)| *member)
}

fn resolve_unsigned<S: UintVariantSpec>(kind: u8) -> Option<IntMember> {
    let declared = [
        (S::KIND_ZERO, IntMember::Zero),
        (S::KIND_ONE, IntMember::One),
        (S::KIND8, IntMember::B8),
        (S::KIND16, IntMember::B16),
        (S::KIND24, IntMember::B24),
        (S::KIND32, IntMember::B32),
        (S::KIND64, IntMember::B64),
    ];
    declared
        .iter()
        .find(|(k, _)| *k == Some(kind))
        .map(|(_, member)| *member)
}

/// Marker codec for a signed integer variant with schema `S`.
#[derive(Debug)]
pub struct IntVariant<S: IntVariantSpec, O: ByteOrder + 'static = NativeEndian>(PhantomData<(S, O)>);

#[derive(Debug)]
pub struct IntVariantView<'a, S: IntVariantSpec, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    member: IntMember,
    _marker: PhantomData<(S, O)>,
}

impl<'a, S: IntVariantSpec, O: ByteOrder> View<'a> for IntVariantView<'a, S, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 1, max_limit)?;
        let kind = buffer::get_u8(buffer, offset)?;
        let member = resolve_signed::<S>(kind)
            .ok_or_else(|| eyre!("unrecognized kind {} at offset {}", kind, offset))?;
        check_limit(offset + 1 + member.payload_size(), max_limit)?;
        Ok(Self {
            buffer,
            offset,
            max_limit,
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
        self.offset + 1 + self.member.payload_size()
    }
}

impl<'a, S: IntVariantSpec, O: ByteOrder> IntVariantView<'a, S, O> {
    pub fn kind(&self) -> Result<u8> {
        buffer::get_u8(self.buffer, self.offset)
    }

    /// The value, widened to `i64` regardless of the wire member.
    pub fn get(&self) -> Result<i64> {
        let payload = self.offset + 1;
        Ok(match self.member {
            IntMember::Zero => 0,
            IntMember::One => 1,
            IntMember::B8 => buffer::get_i8(self.buffer, payload)? as i64,
            IntMember::B16 => buffer::get_i16::<O>(self.buffer, payload)? as i64,
            IntMember::B24 => buffer::get_i24::<O>(self.buffer, payload)? as i64,
            IntMember::B32 => buffer::get_i32::<O>(self.buffer, payload)? as i64,
            IntMember::B64 => buffer::get_i64::<O>(self.buffer, payload)?,
        })
    }
}

impl_byte_eq!(IntVariantView<'a, S: IntVariantSpec, O: ByteOrder>);

#[derive(Debug)]
pub struct IntVariantBuilder<'a, S: IntVariantSpec, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    provisional: bool,
    _marker: PhantomData<(S, O)>,
}

impl<'a, S: IntVariantSpec, O: ByteOrder> Builder<'a> for IntVariantBuilder<'a, S, O> {
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

impl<'a, S: IntVariantSpec, O: ByteOrder> IntVariantBuilder<'a, S, O> {
    /// Encodes `value` at the narrowest declared member that holds it. A
    /// provisional builder (inside an array append pass) validates the value
    /// the same way but writes the widest general member, so offsets of
    /// later items stay stable until the narrowing pass.
    pub fn set(&mut self, value: i64) -> Result<&mut Self> {
        let member = if self.provisional {
            Self::select(value)?;
            Self::widest()?
        } else {
            Self::select(value)?
        };
        let kind = Self::kind_of(member)?;
        check_limit(self.offset + 1 + member.payload_size(), self.max_limit)?;
        buffer::put_u8(self.buffer, self.offset, kind)?;
        let payload = self.offset + 1;
        match member {
            IntMember::Zero | IntMember::One => {}
            IntMember::B8 => buffer::put_i8(self.buffer, payload, value as i8)?,
            IntMember::B16 => buffer::put_i16::<O>(self.buffer, payload, value as i16)?,
            IntMember::B24 => buffer::put_i24::<O>(self.buffer, payload, value as i32)?,
            IntMember::B32 => buffer::put_i32::<O>(self.buffer, payload, value as i32)?,
            IntMember::B64 => buffer::put_i64::<O>(self.buffer, payload, value)?,
        }
        self.limit = self.offset + 1 + member.payload_size();
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
    }

    fn select(value: i64) -> Result<IntMember> {
        if value == 0 && S::KIND_ZERO.is_some() {
            return Ok(IntMember::Zero);
        }
        if value == 1 && S::KIND_ONE.is_some() {
            return Ok(IntMember::One);
        }
        if value >= 0 {
            // One bit is reserved for the sign, so the bucket index is the
            // byte index of the highest significant bit, not bit - 1.
            let bits = 64 - (value as u64).leading_zeros() as usize;
            let required = match bits >> 3 {
                0 => IntMember::B8,
                1 => IntMember::B16,
                2 => IntMember::B24,
                3 => IntMember::B32,
                _ => IntMember::B64,
            };
            return Self::narrowest_from(required, value);
        }
        // Negative: probe sign extension at each declared width, narrowest
        // first. A skipped bucket is naturally absorbed by the next probe.
        if S::KIND8.is_some() && value & !0x7F == !0x7F {
            Ok(IntMember::B8)
        } else if S::KIND16.is_some() && value & !0x7FFF == !0x7FFF {
            Ok(IntMember::B16)
        } else if S::KIND24.is_some() && value & !0x7F_FFFF == !0x7F_FFFF {
            Ok(IntMember::B24)
        } else if S::KIND32.is_some() && value & !0x7FFF_FFFF == !0x7FFF_FFFF {
            Ok(IntMember::B32)
        } else if S::KIND64.is_some() {
            Ok(IntMember::B64)
        } else {
            bail!("no declared member can hold value {}", value)
        }
    }

    fn narrowest_from(required: IntMember, value: i64) -> Result<IntMember> {
        let order = [
            IntMember::B8,
            IntMember::B16,
            IntMember::B24,
            IntMember::B32,
            IntMember::B64,
        ];
        order
            .iter()
            .skip_while(|&&m| m != required)
            .find(|&&m| Self::kind_of(m).is_ok())
            .copied()
            .ok_or_else(|| eyre!("no declared member can hold value {}", value))
    }

    fn widest() -> Result<IntMember> {
        let order = [
            IntMember::B64,
            IntMember::B32,
            IntMember::B24,
            IntMember::B16,
            IntMember::B8,
        ];
        order
            .iter()
            .find(|&&m| Self::kind_of(m).is_ok())
            .copied()
            .ok_or_else(|| eyre!("no general member is declared"))
    }

    fn kind_of(member: IntMember) -> Result<u8> {
        let kind = match member {
            IntMember::Zero => S::KIND_ZERO,
            IntMember::One => S::KIND_ONE,
            IntMember::B8 => S::KIND8,
            IntMember::B16 => S::KIND16,
            IntMember::B24 => S::KIND24,
            IntMember::B32 => S::KIND32,
            IntMember::B64 => S::KIND64,
        };
        kind.ok_or_else(|| eyre!("member {:?} is not declared", member))
    }
}

impl<S: IntVariantSpec, O: ByteOrder + 'static> Codec for IntVariant<S, O> {
    type View<'a> = IntVariantView<'a, S, O>;
    type Builder<'b> = IntVariantBuilder<'b, S, O>;

    fn wrap_item(buffer: &mut [u8], offset: usize, max_limit: usize) -> Result<Self::Builder<'_>> {
        let mut builder = IntVariantBuilder::wrap(buffer, offset, max_limit)?;
        builder.provisional = true;
        Ok(builder)
    }

    /// Re-encodes the value at the member its magnitude selects.
    fn rebuild(
        buffer: &mut [u8],
        read_offset: usize,
        read_limit: usize,
        write_offset: usize,
        max_length: usize,
    ) -> Result<usize> {
        let _ = max_length;
        let value = IntVariantView::<S, O>::wrap(buffer, read_offset, read_limit)?.get()?;
        let mut builder = IntVariantBuilder::<S, O>::wrap(buffer, write_offset, read_limit)?;
        builder.set(value)?;
        builder.build()
    }
}

/// Marker codec for an unsigned integer variant with schema `S`.
#[derive(Debug)]
pub struct UintVariant<S: UintVariantSpec, O: ByteOrder + 'static = NativeEndian>(
    PhantomData<(S, O)>,
);

#[derive(Debug)]
pub struct UintVariantView<'a, S: UintVariantSpec, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    member: IntMember,
    _marker: PhantomData<(S, O)>,
}

impl<'a, S: UintVariantSpec, O: ByteOrder> View<'a> for UintVariantView<'a, S, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 1, max_limit)?;
        let kind = buffer::get_u8(buffer, offset)?;
        let member = resolve_unsigned::<S>(kind)
            .ok_or_else(|| eyre!("unrecognized kind {} at offset {}", kind, offset))?;
        check_limit(offset + 1 + member.payload_size(), max_limit)?;
        Ok(Self {
            buffer,
            offset,
            max_limit,
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
        self.offset + 1 + self.member.payload_size()
    }
}

impl<'a, S: UintVariantSpec, O: ByteOrder> UintVariantView<'a, S, O> {
    pub fn kind(&self) -> Result<u8> {
        buffer::get_u8(self.buffer, self.offset)
    }

    /// The value, widened to `u64` regardless of the wire member.
    pub fn get(&self) -> Result<u64> {
        let payload = self.offset + 1;
        Ok(match self.member {
            IntMember::Zero => 0,
            IntMember::One => 1,
            IntMember::B8 => buffer::get_u8(self.buffer, payload)? as u64,
            IntMember::B16 => buffer::get_u16::<O>(self.buffer, payload)? as u64,
            IntMember::B24 => buffer::get_u24::<O>(self.buffer, payload)? as u64,
            IntMember::B32 => buffer::get_u32::<O>(self.buffer, payload)? as u64,
            IntMember::B64 => buffer::get_u64::<O>(self.buffer, payload)?,
        })
    }
}

impl_byte_eq!(UintVariantView<'a, S: UintVariantSpec, O: ByteOrder>);

#[derive(Debug)]
pub struct UintVariantBuilder<'a, S: UintVariantSpec, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    provisional: bool,
    _marker: PhantomData<(S, O)>,
}

impl<'a, S: UintVariantSpec, O: ByteOrder> Builder<'a> for UintVariantBuilder<'a, S, O> {
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

impl<'a, S: UintVariantSpec, O: ByteOrder> UintVariantBuilder<'a, S, O> {
    /// Encodes `value` at the narrowest declared member that holds it, or at
    /// the widest general member when building provisionally inside an array.
    pub fn set(&mut self, value: u64) -> Result<&mut Self> {
        let member = if self.provisional {
            Self::select(value)?;
            Self::widest()?
        } else {
            Self::select(value)?
        };
        let kind = Self::kind_of(member)?;
        check_limit(self.offset + 1 + member.payload_size(), self.max_limit)?;
        buffer::put_u8(self.buffer, self.offset, kind)?;
        let payload = self.offset + 1;
        match member {
            IntMember::Zero | IntMember::One => {}
            IntMember::B8 => buffer::put_u8(self.buffer, payload, value as u8)?,
            IntMember::B16 => buffer::put_u16::<O>(self.buffer, payload, value as u16)?,
            IntMember::B24 => buffer::put_u24::<O>(self.buffer, payload, value as u32)?,
            IntMember::B32 => buffer::put_u32::<O>(self.buffer, payload, value as u32)?,
            IntMember::B64 => buffer::put_u64::<O>(self.buffer, payload, value)?,
        }
        self.limit = self.offset + 1 + member.payload_size();
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
    }

    fn select(value: u64) -> Result<IntMember> {
        if value == 0 && S::KIND_ZERO.is_some() {
            return Ok(IntMember::Zero);
        }
        if value == 1 && S::KIND_ONE.is_some() {
            return Ok(IntMember::One);
        }
        let bits = (64 - value.leading_zeros() as usize).max(1);
        let required = match (bits - 1) >> 3 {
            0 => IntMember::B8,
            1 => IntMember::B16,
            2 => IntMember::B24,
            3 => IntMember::B32,
            _ => IntMember::B64,
        };
        let order = [
            IntMember::B8,
            IntMember::B16,
            IntMember::B24,
            IntMember::B32,
            IntMember::B64,
        ];
        order
            .iter()
            .skip_while(|&&m| m != required)
            .find(|&&m| Self::kind_of(m).is_ok())
            .copied()
            .ok_or_else(|| eyre!("no declared member can hold value {}", value))
    }

    fn widest() -> Result<IntMember> {
        let order = [
            IntMember::B64,
            IntMember::B32,
            IntMember::B24,
            IntMember::B16,
            IntMember::B8,
        ];
        order
            .iter()
            .find(|&&m| Self::kind_of(m).is_ok())
            .copied()
            .ok_or_else(|| eyre!("no general member is declared"))
    }

    fn kind_of(member: IntMember) -> Result<u8> {
        let kind = match member {
            IntMember::Zero => S::KIND_ZERO,
            IntMember::One => S::KIND_ONE,
            IntMember::B8 => S::KIND8,
            IntMember::B16 => S::KIND16,
            IntMember::B24 => S::KIND24,
            IntMember::B32 => S::KIND32,
            IntMember::B64 => S::KIND64,
        };
        kind.ok_or_else(|| eyre!("member {:?} is not declared", member))
    }
}

impl<S: UintVariantSpec, O: ByteOrder + 'static> Codec for UintVariant<S, O> {
    type View<'a> = UintVariantView<'a, S, O>;
    type Builder<'b> = UintVariantBuilder<'b, S, O>;

    fn wrap_item(buffer: &mut [u8], offset: usize, max_limit: usize) -> Result<Self::Builder<'_>> {
        let mut builder = UintVariantBuilder::wrap(buffer, offset, max_limit)?;
        builder.provisional = true;
        Ok(builder)
    }

    /// Re-encodes the value at the member its magnitude selects.
    fn rebuild(
        buffer: &mut [u8],
        read_offset: usize,
        read_limit: usize,
        write_offset: usize,
        max_length: usize,
    ) -> Result<usize> {
        let _ = max_length;
        let value = UintVariantView::<S, O>::wrap(buffer, read_offset, read_limit)?.get()?;
        let mut builder = UintVariantBuilder::<S, O>::wrap(buffer, write_offset, read_limit)?;
        builder.set(value)?;
        builder.build()
    }
}
