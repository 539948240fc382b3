//! # Internal Macros
//!
//! ## impl_byte_eq!
//!
//! Implements `PartialEq`, `Eq` and `Hash` for a view type over its raw
//! encoded byte range `[offset, limit())`. Two views are equal iff their
//! underlying bytes are bit-identical; field-wise comparison is never used.
//!
//! ### Usage
//!
//! ```ignore
//! impl_byte_eq!(StringView<'a, W: HeaderWidth, O: ByteOrder>);
//! ```

/// Byte-range equality and hashing for a view type.
#[macro_export]
macro_rules! impl_byte_eq {
    ($ty:ident<'a $(, $g:ident : $bound:path)*>) => {
        impl<'a $(, $g: $bound)*> PartialEq for $ty<'a $(, $g)*> {
            fn eq(&self, other: &Self) -> bool {
                $crate::cursor::View::bytes(self) == $crate::cursor::View::bytes(other)
            }
        }

        impl<'a $(, $g: $bound)*> Eq for $ty<'a $(, $g)*> {}

        impl<'a $(, $g: $bound)*> ::core::hash::Hash for $ty<'a $(, $g)*> {
            fn hash<H: ::core::hash::Hasher>(&self, state: &mut H) {
                state.write($crate::cursor::View::bytes(self));
            }
        }
    };
}
