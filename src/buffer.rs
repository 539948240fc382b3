//! # Buffer Primitive
//!
//! Endian-aware fixed-width reads and writes over plain byte slices, plus the
//! `HeaderWidth` abstraction shared by every length-prefixed codec.
//!
//! Byte order is a type parameter (`O: ByteOrder`) fixed per schema type, so
//! every access monomorphizes to a direct load/store with no runtime branch.
//! `NativeEndian` is the default order; `NetworkEndian` selects fixed
//! big-endian wire order.
//!
//! ## Width table
//!
//! | Accessor | Bytes | Notes |
//! |----------|-------|-------|
//! | u8/i8    | 1     | order-independent |
//! | u16/i16  | 2     | |
//! | u24/i24  | 3     | no native width; assembled per byte order, i24 sign-extended from bit 23 |
//! | u32/i32  | 4     | |
//! | u64/i64  | 8     | |

use eyre::{ensure, eyre, Result};
use zerocopy::byteorder::{ByteOrder, I16, I32, I64, U16, U32, U64};

pub use zerocopy::byteorder::{BigEndian, LittleEndian, NativeEndian, NetworkEndian};

/// True when `O` lays out multi-byte values least-significant-byte first.
///
/// The probe constant-folds after monomorphization; it exists because the
/// 24-bit accessors have no wrapper type to delegate to.
#[inline]
pub(crate) fn is_little_endian<O: ByteOrder>() -> bool {
    U16::<O>::new(1).to_bytes()[0] == 1
}

macro_rules! fixed_width_accessors {
    ($($get:ident, $put:ident, $native:ty, $wire:ident, $size:expr, $what:expr;)*) => {
        $(
            #[inline]
            pub fn $get<O: ByteOrder>(buffer: &[u8], offset: usize) -> Result<$native> {
                ensure!(
                    offset + $size <= buffer.len(),
                    "insufficient data for {} at offset {}",
                    $what,
                    offset
                );
                let bytes: [u8; $size] = buffer[offset..offset + $size]
                    .try_into()
                    .map_err(|_| eyre!("insufficient data for {} at offset {}", $what, offset))?;
                Ok($wire::<O>::from_bytes(bytes).get())
            }

            #[inline]
            pub fn $put<O: ByteOrder>(buffer: &mut [u8], offset: usize, value: $native) -> Result<()> {
                ensure!(
                    offset + $size <= buffer.len(),
                    "insufficient space for {} at offset {}",
                    $what,
                    offset
                );
                buffer[offset..offset + $size].copy_from_slice(&$wire::<O>::new(value).to_bytes());
                Ok(())
            }
        )*
    };
}

fixed_width_accessors! {
    get_u16, put_u16, u16, U16, 2, "u16";
    get_i16, put_i16, i16, I16, 2, "i16";
    get_u32, put_u32, u32, U32, 4, "u32";
    get_i32, put_i32, i32, I32, 4, "i32";
    get_u64, put_u64, u64, U64, 8, "u64";
    get_i64, put_i64, i64, I64, 8, "i64";
}

#[inline]
pub fn get_u8(buffer: &[u8], offset: usize) -> Result<u8> {
    buffer
        .get(offset)
        .copied()
        .ok_or_else(|| eyre!("insufficient data for u8 at offset {}", offset))
}

#[inline]
pub fn put_u8(buffer: &mut [u8], offset: usize, value: u8) -> Result<()> {
    ensure!(
        offset < buffer.len(),
        "insufficient space for u8 at offset {}",
        offset
    );
    buffer[offset] = value;
    Ok(())
}

#[inline]
pub fn get_i8(buffer: &[u8], offset: usize) -> Result<i8> {
    Ok(get_u8(buffer, offset)? as i8)
}

#[inline]
pub fn put_i8(buffer: &mut [u8], offset: usize, value: i8) -> Result<()> {
    put_u8(buffer, offset, value as u8)
}

#[inline]
pub fn get_u24<O: ByteOrder>(buffer: &[u8], offset: usize) -> Result<u32> {
    ensure!(
        offset + 3 <= buffer.len(),
        "insufficient data for u24 at offset {}",
        offset
    );
    let b = &buffer[offset..offset + 3];
    let value = if is_little_endian::<O>() {
        (b[0] as u32) | ((b[1] as u32) << 8) | ((b[2] as u32) << 16)
    } else {
        ((b[0] as u32) << 16) | ((b[1] as u32) << 8) | (b[2] as u32)
    };
    Ok(value)
}

#[inline]
pub fn put_u24<O: ByteOrder>(buffer: &mut [u8], offset: usize, value: u32) -> Result<()> {
    ensure!(
        value <= 0x00FF_FFFF,
        "value {} is beyond maximum u24 value {}",
        value,
        0x00FF_FFFFu32
    );
    ensure!(
        offset + 3 <= buffer.len(),
        "insufficient space for u24 at offset {}",
        offset
    );
    let bytes = if is_little_endian::<O>() {
        [value as u8, (value >> 8) as u8, (value >> 16) as u8]
    } else {
        [(value >> 16) as u8, (value >> 8) as u8, value as u8]
    };
    buffer[offset..offset + 3].copy_from_slice(&bytes);
    Ok(())
}

/// Reads a 24-bit signed value, sign-extending from bit 23.
#[inline]
pub fn get_i24<O: ByteOrder>(buffer: &[u8], offset: usize) -> Result<i32> {
    let raw = get_u24::<O>(buffer, offset)?;
    Ok(((raw as i32) << 8) >> 8)
}

#[inline]
pub fn put_i24<O: ByteOrder>(buffer: &mut [u8], offset: usize, value: i32) -> Result<()> {
    ensure!(
        (-0x0080_0000..=0x007F_FFFF).contains(&value),
        "value {} is beyond i24 range",
        value
    );
    put_u24::<O>(buffer, offset, (value as u32) & 0x00FF_FFFF)
}

/// Width of the length/field-count header fields carried by the octets,
/// string, list, array and map codecs.
///
/// Each width is a type-level marker so header offsets are compile-time
/// constants per concrete codec type.
pub trait HeaderWidth: 'static {
    /// Header field size in bytes.
    const SIZE: usize;
    /// Largest value the field can hold (`2^width - 1`).
    const MAX: u64;

    fn get<O: ByteOrder>(buffer: &[u8], offset: usize) -> Result<u64>;
    fn put<O: ByteOrder>(buffer: &mut [u8], offset: usize, value: u64) -> Result<()>;
}

/// 8-bit header fields.
#[derive(Debug)]
pub enum W8 {}
/// 16-bit header fields.
#[derive(Debug)]
pub enum W16 {}
/// 32-bit header fields.
#[derive(Debug)]
pub enum W32 {}

impl HeaderWidth for W8 {
    const SIZE: usize = 1;
    const MAX: u64 = 0xFF;

    #[inline]
    fn get<O: ByteOrder>(buffer: &[u8], offset: usize) -> Result<u64> {
        Ok(get_u8(buffer, offset)? as u64)
    }

    #[inline]
    fn put<O: ByteOrder>(buffer: &mut [u8], offset: usize, value: u64) -> Result<()> {
        ensure!(
            value <= Self::MAX,
            "value {} is beyond maximum {} for 1-byte field",
            value,
            Self::MAX
        );
        put_u8(buffer, offset, value as u8)
    }
}

impl HeaderWidth for W16 {
    const SIZE: usize = 2;
    const MAX: u64 = 0xFFFF;

    #[inline]
    fn get<O: ByteOrder>(buffer: &[u8], offset: usize) -> Result<u64> {
        Ok(get_u16::<O>(buffer, offset)? as u64)
    }

    #[inline]
    fn put<O: ByteOrder>(buffer: &mut [u8], offset: usize, value: u64) -> Result<()> {
        ensure!(
            value <= Self::MAX,
            "value {} is beyond maximum {} for 2-byte field",
            value,
            Self::MAX
        );
        put_u16::<O>(buffer, offset, value as u16)
    }
}

impl HeaderWidth for W32 {
    const SIZE: usize = 4;
    const MAX: u64 = 0xFFFF_FFFF;

    #[inline]
    fn get<O: ByteOrder>(buffer: &[u8], offset: usize) -> Result<u64> {
        Ok(get_u32::<O>(buffer, offset)? as u64)
    }

    #[inline]
    fn put<O: ByteOrder>(buffer: &mut [u8], offset: usize, value: u64) -> Result<()> {
        ensure!(
            value <= Self::MAX,
            "value {} is beyond maximum {} for 4-byte field",
            value,
            Self::MAX
        );
        put_u32::<O>(buffer, offset, value as u32)
    }
}
