//! # Fixed-Width Scalar Codec
//!
//! View/builder pairs for the fixed-width integer family, generic over byte
//! order. The 24-bit pair has no native Rust width and is assembled from
//! three raw bytes by the buffer primitive.
//!
//! Each scalar also has a zero-sized marker type (`Uint32`, `Int64`, ...)
//! implementing [`Codec`], so scalars can serve directly as array items and
//! map keys/values.

use core::marker::PhantomData;

use eyre::{ensure, Result};
use zerocopy::byteorder::ByteOrder;

use crate::buffer::{self, NativeEndian};
use crate::cursor::{check_limit, check_wrap, Builder, Codec, View};
use crate::impl_byte_eq;

macro_rules! scalar_codec {
    ($($name:ident, $native:ty, $size:expr, $get:ident, $put:ident;)*) => {
        $(
            ::paste::paste! {
                #[doc = concat!("Marker codec for a `", stringify!($native), "` value.")]
                #[derive(Debug)]
                pub struct $name<O: ByteOrder + 'static = NativeEndian>(PhantomData<O>);

                #[derive(Debug)]
                pub struct [<$name View>]<'a, O: ByteOrder = NativeEndian> {
                    buffer: &'a [u8],
                    offset: usize,
                    max_limit: usize,
                    _order: PhantomData<O>,
                }

                impl<'a, O: ByteOrder> View<'a> for [<$name View>]<'a, O> {
                    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
                        check_wrap(buffer.len(), offset, max_limit)?;
                        check_limit(offset + $size, max_limit)?;
                        Ok(Self { buffer, offset, max_limit, _order: PhantomData })
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
                        self.offset + $size
                    }
                }

                impl<'a, O: ByteOrder> [<$name View>]<'a, O> {
                    pub fn value(&self) -> Result<$native> {
                        buffer::$get::<O>(self.buffer, self.offset)
                    }
                }

                impl_byte_eq!([<$name View>]<'a, O: ByteOrder>);

                #[derive(Debug)]
                pub struct [<$name Builder>]<'a, O: ByteOrder = NativeEndian> {
                    buffer: &'a mut [u8],
                    offset: usize,
                    limit: usize,
                    max_limit: usize,
                    _order: PhantomData<O>,
                }

                impl<'a, O: ByteOrder> Builder<'a> for [<$name Builder>]<'a, O> {
                    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
                        check_wrap(buffer.len(), offset, max_limit)?;
                        check_limit(offset + $size, max_limit)?;
                        Ok(Self { buffer, offset, limit: offset, max_limit, _order: PhantomData })
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

                impl<'a, O: ByteOrder> [<$name Builder>]<'a, O> {
                    pub fn set(&mut self, value: $native) -> Result<&mut Self> {
                        buffer::$put::<O>(self.buffer, self.offset, value)?;
                        self.limit = self.offset + $size;
                        Ok(self)
                    }

                    /// Resets the write cursor so the value can be re-set.
                    pub fn rewrap(&mut self) {
                        self.limit = self.offset;
                    }
                }

                impl<O: ByteOrder + 'static> Codec for $name<O> {
                    type View<'a> = [<$name View>]<'a, O>;
                    type Builder<'b> = [<$name Builder>]<'b, O>;
                }
            }
        )*
    };
}

scalar_codec! {
    Uint16, u16, 2, get_u16, put_u16;
    Int16, i16, 2, get_i16, put_i16;
    Uint24, u32, 3, get_u24, put_u24;
    Int24, i32, 3, get_i24, put_i24;
    Uint32, u32, 4, get_u32, put_u32;
    Int32, i32, 4, get_i32, put_i32;
    Uint64, u64, 8, get_u64, put_u64;
    Int64, i64, 8, get_i64, put_i64;
}

macro_rules! byte_codec {
    ($($name:ident, $native:ty, $get:ident, $put:ident;)*) => {
        $(
            ::paste::paste! {
                #[doc = concat!("Marker codec for a single-byte `", stringify!($native), "` value.")]
                pub enum $name {}

                #[derive(Debug)]
                pub struct [<$name View>]<'a> {
                    buffer: &'a [u8],
                    offset: usize,
                    max_limit: usize,
                }

                impl<'a> View<'a> for [<$name View>]<'a> {
                    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self> {
                        check_wrap(buffer.len(), offset, max_limit)?;
                        check_limit(offset + 1, max_limit)?;
                        Ok(Self { buffer, offset, max_limit })
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
                        self.offset + 1
                    }
                }

                impl<'a> [<$name View>]<'a> {
                    pub fn value(&self) -> Result<$native> {
                        buffer::$get(self.buffer, self.offset)
                    }
                }

                impl_byte_eq!([<$name View>]<'a>);

                #[derive(Debug)]
                pub struct [<$name Builder>]<'a> {
                    buffer: &'a mut [u8],
                    offset: usize,
                    limit: usize,
                    max_limit: usize,
                }

                impl<'a> Builder<'a> for [<$name Builder>]<'a> {
                    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self> {
                        check_wrap(buffer.len(), offset, max_limit)?;
                        check_limit(offset + 1, max_limit)?;
                        Ok(Self { buffer, offset, limit: offset, max_limit })
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

                impl<'a> [<$name Builder>]<'a> {
                    pub fn set(&mut self, value: $native) -> Result<&mut Self> {
                        buffer::$put(self.buffer, self.offset, value)?;
                        self.limit = self.offset + 1;
                        Ok(self)
                    }

                    /// Resets the write cursor so the value can be re-set.
                    pub fn rewrap(&mut self) {
                        self.limit = self.offset;
                    }
                }

                impl Codec for $name {
                    type View<'a> = [<$name View>]<'a>;
                    type Builder<'b> = [<$name Builder>]<'b>;
                }
            }
        )*
    };
}

byte_codec! {
    Uint8, u8, get_u8, put_u8;
    Int8, i8, get_i8, put_i8;
}
