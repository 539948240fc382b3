//! # Enum Codec
//!
//! A declared, closed set of constants carried on the wire either as a
//! fixed-width raw discriminant or as a `String8` label. The schema is a
//! type-level spec listing the wire representation per ordinal; decoding a
//! value outside the declared set fails loudly, since it indicates wire
//! corruption or version skew.

use core::marker::PhantomData;

use eyre::{ensure, eyre, Result};
use zerocopy::byteorder::ByteOrder;

use crate::buffer::{HeaderWidth, NativeEndian};
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;
use crate::strings::{String8Builder, String8View};

/// Declared raw wire values, indexed by ordinal.
pub trait EnumSpec: 'static {
    const VALUES: &'static [u64];
}

/// Marker codec for a value-backed enum with discriminant width `W`.
#[derive(Debug)]
pub struct Enum<S: EnumSpec, W: HeaderWidth, O: ByteOrder + 'static = NativeEndian>(
    PhantomData<(S, W, O)>,
);

#[derive(Debug)]
pub struct EnumView<'a, S: EnumSpec, W: HeaderWidth, O: ByteOrder = NativeEndian> {
    buffer: &'a [u8],
    offset: usize,
    max_limit: usize,
    _marker: PhantomData<(S, W, O)>,
}

impl<'a, S: EnumSpec, W: HeaderWidth, O: ByteOrder> View<'a> for EnumView<'a, S, W, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        check_wrap(buffer.len(), offset, max_limit)?;
        check_limit(offset + W::SIZE, max_limit)?;
        Ok(Self {
            buffer,
            offset,
            max_limit,
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
        self.offset + W::SIZE
    }
}

impl<'a, S: EnumSpec, W: HeaderWidth, O: ByteOrder> EnumView<'a, S, W, O> {
    /// The raw wire discriminant, unvalidated.
    pub fn raw(&self) -> Result<u64> {
        W::get::<O>(self.buffer, self.offset)
    }

    /// The declared ordinal for the wire discriminant.
    pub fn ordinal(&self) -> Result<usize> {
        let raw = self.raw()?;
        S::VALUES
            .iter()
            .position(|&declared| declared == raw)
            .ok_or_else(|| eyre!("unrecognized enum value {} at offset {}", raw, self.offset))
    }
}

impl_byte_eq!(EnumView<'a, S: EnumSpec, W: HeaderWidth, O: ByteOrder>);

#[derive(Debug)]
pub struct EnumBuilder<'a, S: EnumSpec, W: HeaderWidth, O: ByteOrder = NativeEndian> {
    buffer: &'a mut [u8],
    offset: usize,
    limit: usize,
    max_limit: usize,
    _marker: PhantomData<(S, W, O)>,
}

impl<'a, S: EnumSpec, W: HeaderWidth, O: ByteOrder> Builder<'a> for EnumBuilder<'a, S, W, O> {
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

impl<'a, S: EnumSpec, W: HeaderWidth, O: ByteOrder> EnumBuilder<'a, S, W, O> {
    pub fn set(&mut self, ordinal: usize) -> Result<&mut Self> {
        ensure!(
            ordinal < S::VALUES.len(),
            "ordinal {} is beyond the {} declared values",
            ordinal,
            S::VALUES.len()
        );
        check_limit(self.offset + W::SIZE, self.max_limit)?;
        W::put::<O>(self.buffer, self.offset, S::VALUES[ordinal])?;
        self.limit = self.offset + W::SIZE;
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.limit = self.offset;
    }
}

impl<S: EnumSpec, W: HeaderWidth, O: ByteOrder + 'static> Codec for Enum<S, W, O> {
    type View<'a> = EnumView<'a, S, W, O>;
    type Builder<'b> = EnumBuilder<'b, S, W, O>;
}

/// Declared labels, indexed by ordinal.
pub trait EnumLabelSpec: 'static {
    const LABELS: &'static [&'static str];
}

/// Marker codec for a string-backed enum carried as a `String8`.
#[derive(Debug)]
pub struct LabelEnum<S: EnumLabelSpec, O: ByteOrder + 'static = NativeEndian>(PhantomData<(S, O)>);

#[derive(Debug)]
pub struct LabelEnumView<'a, S: EnumLabelSpec, O: ByteOrder = NativeEndian> {
    inner: String8View<'a, O>,
    _marker: PhantomData<S>,
}

impl<'a, S: EnumLabelSpec, O: ByteOrder> View<'a> for LabelEnumView<'a, S, O> {
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
        let inner = String8View::wrap(buffer, offset, max_limit)?;
        Ok(Self {
            inner,
            _marker: PhantomData,
        })
    }

    fn buffer(&self) -> &'a [u8] {
        self.inner.buffer()
    }

    fn offset(&self) -> usize {
        self.inner.offset()
    }

    fn max_limit(&self) -> usize {
        self.inner.max_limit()
    }

    fn limit(&self) -> usize {
        self.inner.limit()
    }
}

impl<'a, S: EnumLabelSpec, O: ByteOrder> LabelEnumView<'a, S, O> {
    pub fn ordinal(&self) -> Result<usize> {
        let label = self
            .inner
            .as_str()?
            .ok_or_else(|| eyre!("unrecognized enum label at offset {}: null", self.offset()))?;
        S::LABELS
            .iter()
            .position(|&declared| declared == label)
            .ok_or_else(|| {
                eyre!(
                    "unrecognized enum label {:?} at offset {}",
                    label,
                    self.offset()
                )
            })
    }

    pub fn label(&self) -> Result<Option<&'a str>> {
        self.inner.as_str()
    }
}

impl_byte_eq!(LabelEnumView<'a, S: EnumLabelSpec, O: ByteOrder>);

#[derive(Debug)]
pub struct LabelEnumBuilder<'a, S: EnumLabelSpec, O: ByteOrder = NativeEndian> {
    inner: String8Builder<'a, O>,
    value_set: bool,
    _marker: PhantomData<S>,
}

impl<'a, S: EnumLabelSpec, O: ByteOrder> Builder<'a> for LabelEnumBuilder<'a, S, O> {
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
        let inner = String8Builder::wrap(buffer, offset, max_limit)?;
        Ok(Self {
            inner,
            value_set: false,
            _marker: PhantomData,
        })
    }

    fn offset(&self) -> usize {
        self.inner.offset()
    }

    fn max_limit(&self) -> usize {
        self.inner.max_limit()
    }

    fn limit(&self) -> usize {
        self.inner.limit()
    }

    fn build(self) -> Result<usize> {
        ensure!(self.value_set, "value not set");
        self.inner.build()
    }
}

impl<'a, S: EnumLabelSpec, O: ByteOrder> LabelEnumBuilder<'a, S, O> {
    pub fn set(&mut self, ordinal: usize) -> Result<&mut Self> {
        ensure!(
            ordinal < S::LABELS.len(),
            "ordinal {} is beyond the {} declared labels",
            ordinal,
            S::LABELS.len()
        );
        self.inner.set(Some(S::LABELS[ordinal]))?;
        self.value_set = true;
        Ok(self)
    }

    pub fn rewrap(&mut self) {
        self.inner.rewrap();
        self.value_set = false;
    }
}

impl<S: EnumLabelSpec, O: ByteOrder + 'static> Codec for LabelEnum<S, O> {
    type View<'a> = LabelEnumView<'a, S, O>;
    type Builder<'b> = LabelEnumBuilder<'b, S, O>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::W8;

    enum Priority {}

    impl EnumSpec for Priority {
        const VALUES: &'static [u64] = &[0x10, 0x20, 0x30];
    }

    enum Role {}

    impl EnumLabelSpec for Role {
        const LABELS: &'static [&'static str] = &["reader", "writer", "admin"];
    }

    #[test]
    fn enum_roundtrip_by_ordinal() {
        let mut buf = [0u8; 4];
        let limit = {
            let mut b = EnumBuilder::<Priority, W8, NativeEndian>::wrap(&mut buf, 0, 4).unwrap();
            b.set(1).unwrap();
            b.build().unwrap()
        };
        assert_eq!(limit, 1);
        assert_eq!(buf[0], 0x20);

        let v = EnumView::<Priority, W8, NativeEndian>::wrap(&buf, 0, 4).unwrap();
        assert_eq!(v.ordinal().unwrap(), 1);
        assert_eq!(v.raw().unwrap(), 0x20);
    }

    #[test]
    fn unrecognized_raw_value_fails_on_decode() {
        let buf = [0x99u8];
        let v = EnumView::<Priority, W8, NativeEndian>::wrap(&buf, 0, 1).unwrap();
        let err = v.ordinal().unwrap_err();
        assert!(err.to_string().contains("unrecognized enum value 153"));
    }

    #[test]
    fn set_rejects_undeclared_ordinal() {
        let mut buf = [0u8; 4];
        let mut b = EnumBuilder::<Priority, W8, NativeEndian>::wrap(&mut buf, 0, 4).unwrap();
        assert!(b.set(3).is_err());
    }

    #[test]
    fn build_without_set_fails() {
        let mut buf = [0u8; 4];
        let b = EnumBuilder::<Priority, W8, NativeEndian>::wrap(&mut buf, 0, 4).unwrap();
        assert!(b.build().unwrap_err().to_string().contains("value not set"));
    }

    #[test]
    fn label_enum_roundtrip() {
        let mut buf = [0u8; 16];
        let limit = {
            let mut b = LabelEnumBuilder::<Role, NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
            b.set(2).unwrap();
            b.build().unwrap()
        };
        assert_eq!(limit, 6);

        let v = LabelEnumView::<Role, NativeEndian>::wrap(&buf, 0, limit).unwrap();
        assert_eq!(v.ordinal().unwrap(), 2);
        assert_eq!(v.label().unwrap(), Some("admin"));
    }

    #[test]
    fn unrecognized_label_fails_on_decode() {
        let mut buf = [0u8; 16];
        let limit = {
            let mut b = String8Builder::<NativeEndian>::wrap(&mut buf, 0, 16).unwrap();
            b.set(Some("nobody")).unwrap();
            b.build().unwrap()
        };
        let v = LabelEnumView::<Role, NativeEndian>::wrap(&buf, 0, limit).unwrap();
        let err = v.ordinal().unwrap_err();
        assert!(err.to_string().contains("unrecognized enum label"));
    }

    #[test]
    fn label_enum_build_without_set_fails() {
        let mut buf = [0u8; 4];
        let b = LabelEnumBuilder::<Role, NativeEndian>::wrap(&mut buf, 0, 4).unwrap();
        assert!(b.build().unwrap_err().to_string().contains("value not set"));
    }
}
