//! # Variant Codec
//!
//! One logical field, several physical layouts. A variant type declares a
//! set of **member kinds**, each binding a single-byte kind discriminator to
//! a width-specific codec, ordered by width bucket:
//!
//! ```text
//! bucket:   0        8        16        32        64
//!           |        |         |         |         |
//!           sentinel narrow ──────────────────► wide
//! ```
//!
//! The 0-width bucket is a **sentinel**: a kind byte that encodes a constant
//! (0, 1, the empty string, the empty list) with no payload at all.
//!
//! ## Encoding
//!
//! `set(value)` picks the narrowest declared member that reproduces the
//! value exactly:
//!
//! 1. A sentinel whose constant equals the value always wins.
//! 2. Otherwise the highest nonzero byte of the value (for integers) or the
//!    content length (for strings/octets/collections) selects a bucket;
//!    buckets with no declared member fold into the next larger declared one.
//! 3. Signed negatives are probed in increasing width order with a
//!    sign-extension bitmask, falling back to the widest declared member.
//!
//! The kind byte is written first, the member payload directly after it.
//!
//! ## Decoding
//!
//! `wrap` reads the kind byte and matches it against the declared members;
//! an undeclared kind is a hard error, never skipped, since it means wire
//! corruption or version skew.
//!
//! ## Inside arrays
//!
//! When variant values are array items, the final width of an item is not
//! committed while later items are still being appended. Items are appended
//! provisionally at the widest declared member and narrowed in place during
//! the array's `build()` pass; see the array codec for the two-cursor walk.
//!
//! Schemas are type-level: a unit type implementing one of the `*VariantSpec`
//! traits declares the kind byte per bucket, and every view/builder is
//! monomorphized against it.

mod collection;
mod int;
mod octets;
mod string;

pub use collection::{
    ArrayVariant, ArrayVariantBuilder, ArrayVariantSpec, ArrayVariantView, ListVariant,
    ListVariantBuilder, ListVariantSpec, ListVariantView, MapVariant, MapVariantBuilder,
    MapVariantSpec, MapVariantView,
};
pub use int::{
    IntVariant, IntVariantBuilder, IntVariantSpec, IntVariantView, UintVariant,
    UintVariantBuilder, UintVariantSpec, UintVariantView,
};
pub use octets::{OctetsVariant, OctetsVariantBuilder, OctetsVariantSpec, OctetsVariantView};
pub use string::{StringVariant, StringVariantBuilder, StringVariantSpec, StringVariantView};

#[cfg(test)]
mod tests;
