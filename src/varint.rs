//! # Variable-Length Integer Codec
//!
//! Two wire flavors, both little-endian 7-bit groups with a continuation bit
//! in bit 7 of each byte:
//!
//! ## Varint32 (zigzag signed)
//!
//! The value is mapped through zigzag before grouping so small magnitudes of
//! either sign stay short:
//!
//! ```text
//! zigzag(v)   = (v << 1) ^ (v >> 31)
//! unzigzag(n) = (n >> 1) ^ -(n & 1)
//! ```
//!
//! | Value | Zigzag | Encoding |
//! |-------|--------|----------|
//! | 0     | 0      | `00` |
//! | -1    | 1      | `01` |
//! | 1     | 2      | `02` |
//! | -64   | 127    | `7F` |
//! | 64    | 128    | `80 01` |
//! | i32::MIN | 0xFFFFFFFF | `FF FF FF FF 0F` |
//!
//! A 32-bit value needs at most 5 groups and the 5th group carries only the
//! top 4 bits, so a 5th byte with a non-zero high nibble, or any 6th group,
//! is an encoding error.
//!
//! ## Varuint32n (offset-biased unsigned)
//!
//! Stores `value + 1`, reserving the single byte `00` for the input `-1`
//! ("no value") distinctly from 0 (`01`). Valid input range is
//! `[-1, 0x0FFF_FFFF]`; decode subtracts the bias.
//!
//! Both views size themselves by scanning continuation bits, never reading
//! past `max_limit`; `try_wrap` reports an incomplete tail as absent, which
//! is the expected outcome while a stream is still buffering.

use eyre::{bail, ensure, Result};

use crate::buffer;
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;

/// Byte length of the complete varint at `offset`, or `None` when the bytes
/// available before `max_limit` end mid-value.
fn scan_size(
    buffer: &[u8],
    offset: usize,
    max_limit: usize,
    check_high_nibble: bool,
) -> Result<Option<usize>> {
    let max_pos = core::cmp::min(offset + 5, max_limit);
    let mut pos = offset;
    while pos < max_pos {
        let byte = buffer[pos];
        if byte & 0x80 == 0 {
            let size = pos - offset + 1;
            if check_high_nibble && size == 5 {
                ensure!(
                    byte & 0xF0 == 0,
                    "varint32 value at offset {} exceeds 32 bits",
                    offset
                );
            }
            return Ok(Some(size));
        }
        pos += 1;
    }
    if pos - offset == 5 {
        bail!("varint32 value at offset {} exceeds 32 bits", offset);
    }
    Ok(None)
}

/// Marker codec for a zigzag-encoded signed 32-bit varint.
pub enum Varint32 {}

#[derive(Debug)]
pub struct Varint32View<'a> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    size: usize,
}

impl<'a> View<'a> for Varint32View<'a> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        let Some(size) = scan_size(buffer, offset, max_limit, true)? else {
            bail!("varint32 value at offset {} is truncated", offset);
        };
        Ok(Self {
            buffer,
            offset,
            max_limit,
            size,
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
        self.offset + self.size
    }
}

impl<'a> Varint32View<'a> {
    pub fn value(&self) -> i32 {
        let mut unsigned: u32 = 0;
        for i in 0..self.size {
            let bits = (self.buffer[self.offset + i] & 0x7F) as u32;
            unsigned |= bits << (7 * i);
        }
        ((unsigned >> 1) as i32) ^ -((unsigned & 1) as i32)
    }
}

impl_byte_eq!(Varint32View<'a>);

#[derive(Debug)]
pub struct Varint32Builder<'a> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    value_set: bool,
}

impl<'a> Builder<'a> for Varint32Builder<'a> {
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 1, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            limit: offset,
            max_limit,
            value_set: false,
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
        ensure!(self.value_set, "value not set");
        Ok(self.limit)
    }
}

impl<'a> Varint32Builder<'a> {
    pub fn set(&mut self, value: i32) -> Result<&mut Self> {
        let zigzagged = (value.wrapping_shl(1) ^ (value >> 31)) as u32;
        let size = encoded_size(zigzagged);
        check_limit(self.offset + size, self.max_limit)?;

        let mut remaining = zigzagged;
        for i in 0..size {
            let mut bits = (remaining & 0x7F) as u8;
            remaining >>= 7;
            if remaining != 0 {
                bits |= 0x80;
            }
            buffer::put_u8(self.buffer, self.offset + i, bits)?;
        }
        self.limit = self.offset + size;
        self.value_set = true;
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
        self.value_set = false;
    }
}

impl Codec for Varint32 {
    type View<'a> = Varint32View<'a>;
    type Builder<'b> = Varint32Builder<'b>;
}

/// Number of 7-bit groups needed, minimum one byte.
fn encoded_size(value: u32) -> usize {
    let bits = 32 - value.leading_zeros() as usize;
    core::cmp::max(1, bits.div_ceil(7))
}

/// Marker codec for an offset-biased unsigned varint with a distinct
/// "no value" encoding.
pub enum Varuint32n {}

#[derive(Debug)]
pub struct Varuint32nView<'a> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    size: usize,
}

impl<'a> View<'a> for Varuint32nView<'a> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        let Some(size) = scan_size(buffer, offset, max_limit, false)? else {
            bail!("varuint32n value at offset {} is truncated", offset);
        };
        Ok(Self {
            buffer,
            offset,
            max_limit,
            size,
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
        self.offset + self.size
    }
}

impl<'a> Varuint32nView<'a> {
    /// The decoded value; `-1` is the reserved "no value" indicator.
    pub fn value(&self) -> i32 {
        let mut biased: u32 = 0;
        for i in 0..self.size {
            let bits = (self.buffer[self.offset + i] & 0x7F) as u32;
            biased |= bits << (7 * i);
        }
        biased as i32 - 1
    }
}

impl_byte_eq!(Varuint32nView<'a>);

#[derive(Debug)]
pub struct Varuint32nBuilder<'a> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    value_set: bool,
}

impl<'a> Builder<'a> for Varuint32nBuilder<'a> {
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + 1, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            limit: offset,
            max_limit,
            value_set: false,
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
        ensure!(self.value_set, "value not set");
        Ok(self.limit)
    }
}

impl<'a> Varuint32nBuilder<'a> {
    pub fn set(&mut self, nvalue: i32) -> Result<&mut Self> {
        ensure!(
            (-1..=0x0FFF_FFFF).contains(&nvalue),
            "input value {} out of range",
            nvalue
        );
        let biased = (nvalue + 1) as u32;
        let size = encoded_size(biased);
        check_limit(self.offset + size, self.max_limit)?;

        let mut remaining = biased;
        for i in 0..size {
            let mut bits = (remaining & 0x7F) as u8;
            remaining >>= 7;
            if remaining != 0 {
                bits |= 0x80;
            }
            buffer::put_u8(self.buffer, self.offset + i, bits)?;
        }
        self.limit = self.offset + size;
        self.value_set = true;
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
        self.value_set = false;
    }
}

impl Codec for Varuint32n {
    type View<'a> = Varuint32nView<'a>;
    type Builder<'b> = Varuint32nBuilder<'b>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode_varint32(value: i32, buf: &mut [u8]) -> usize {
        let mut b = Varint32Builder::wrap(buf, 0, 16.min(buf.len())).unwrap();
        b.set(value).unwrap();
        b.build().unwrap()
    }

    #[test]
    fn varint32_minus_one_is_single_byte_0x01() {
        let mut buf = [0u8; 8];
        let limit = encode_varint32(-1, &mut buf);
        assert_eq!(limit, 1);
        assert_eq!(buf[0], 0x01);

        let v = Varint32View::wrap(&buf, 0, 1).unwrap();
        assert_eq!(v.value(), -1);
    }

    #[test]
    fn varint32_zero_is_single_byte_0x00() {
        let mut buf = [0u8; 8];
        let limit = encode_varint32(0, &mut buf);
        assert_eq!(limit, 1);
        assert_eq!(buf[0], 0x00);
        assert_eq!(Varint32View::wrap(&buf, 0, 1).unwrap().value(), 0);
    }

    #[test]
    fn varint32_boundary_values_roundtrip() {
        for value in [
            0,
            -1,
            1,
            -64,
            63,
            64,
            -65,
            i32::MAX,
            i32::MIN,
            0x3FFF,
            -0x4000,
        ] {
            let mut buf = [0u8; 8];
            let limit = encode_varint32(value, &mut buf);
            let v = Varint32View::wrap(&buf, 0, limit).unwrap();
            assert_eq!(v.value(), value, "roundtrip of {value}");
            assert_eq!(v.sizeof(), limit);
        }
    }

    #[test]
    fn varint32_min_uses_five_bytes() {
        let mut buf = [0u8; 8];
        let limit = encode_varint32(i32::MIN, &mut buf);
        assert_eq!(limit, 5);
        assert_eq!(&buf[..5], &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn varint32_wrap_rejects_more_than_32_bits() {
        let over = [0xFF, 0xFF, 0xFF, 0xFF, 0x1F];
        let err = Varint32View::wrap(&over, 0, 5).unwrap_err();
        assert!(err.to_string().contains("exceeds 32 bits"));

        let six = [0x80, 0x80, 0x80, 0x80, 0x80, 0x01];
        assert!(Varint32View::wrap(&six, 0, 6).is_err());
    }

    #[test]
    fn varint32_truncated_wrap_fails_and_try_wrap_is_absent() {
        let partial = [0x80, 0x80];
        let err = Varint32View::wrap(&partial, 0, 2).unwrap_err();
        assert!(err.to_string().contains("truncated"));
        assert!(Varint32View::try_wrap(&partial, 0, 2).is_none());

        let complete = [0x80, 0x01];
        assert!(Varint32View::try_wrap(&complete, 0, 2).is_some());
        assert!(Varint32View::try_wrap(&complete, 0, 1).is_none());
    }

    #[test]
    fn varint32_build_without_set_fails() {
        let mut buf = [0u8; 4];
        let b = Varint32Builder::wrap(&mut buf, 0, 4).unwrap();
        assert!(b.build().unwrap_err().to_string().contains("value not set"));
    }

    #[test]
    fn varuint32n_minus_one_is_single_byte_0x00() {
        let mut buf = [0u8; 8];
        let limit = {
            let mut b = Varuint32nBuilder::wrap(&mut buf, 0, 8).unwrap();
            b.set(-1).unwrap();
            b.build().unwrap()
        };
        assert_eq!(limit, 1);
        assert_eq!(buf[0], 0x00);
        assert_eq!(Varuint32nView::wrap(&buf, 0, 1).unwrap().value(), -1);
    }

    #[test]
    fn varuint32n_zero_is_biased_to_0x01() {
        let mut buf = [0u8; 8];
        let mut b = Varuint32nBuilder::wrap(&mut buf, 0, 8).unwrap();
        b.set(0).unwrap();
        let limit = b.build().unwrap();
        assert_eq!(limit, 1);
        assert_eq!(buf[0], 0x01);
        assert_eq!(Varuint32nView::wrap(&buf, 0, 1).unwrap().value(), 0);
    }

    #[test]
    fn varuint32n_range_boundaries() {
        for value in [-1, 0, 1, 126, 127, 128, 0x0FFF_FFFF] {
            let mut buf = [0u8; 8];
            let limit = {
                let mut b = Varuint32nBuilder::wrap(&mut buf, 0, 8).unwrap();
                b.set(value).unwrap();
                b.build().unwrap()
            };
            let v = Varuint32nView::wrap(&buf, 0, limit).unwrap();
            assert_eq!(v.value(), value, "roundtrip of {value}");
        }
    }

    #[test]
    fn varuint32n_rejects_out_of_range_input() {
        let mut buf = [0u8; 8];
        let mut b = Varuint32nBuilder::wrap(&mut buf, 0, 8).unwrap();
        assert!(b.set(-2).unwrap_err().to_string().contains("out of range"));
        assert!(b.set(0x1000_0000).is_err());
    }

    #[test]
    fn rewrapping_the_same_bytes_is_idempotent() {
        let mut buf = [0u8; 8];
        let limit = encode_varint32(-123456, &mut buf);
        let first = Varint32View::wrap(&buf, 0, limit).unwrap().value();
        let second = Varint32View::wrap(&buf, 0, limit).unwrap().value();
        assert_eq!(first, second);
    }
}
