//! # wireview - Zero-Copy Schema-Driven Binary Codecs
//!
//! wireview encodes and decodes binary wire formats in place, directly over
//! caller-provided byte buffers. This implementation prioritizes:
//!
//! - **Zero-copy data access**: Views overlay existing bytes, no intermediate buffers
//! - **Zero allocation on the hot path**: Builders write into preallocated buffers
//! - **Compact wire images**: Adaptive-width variants pick the narrowest encoding
//!
//! ## Quick Start
//!
//! ```
//! use wireview::buffer::NativeEndian;
//! use wireview::cursor::{Builder, View};
//! use wireview::strings::{String8Builder, String8View};
//!
//! # fn main() -> eyre::Result<()> {
//! let mut buf = [0u8; 16];
//! let limit = {
//!     let mut b = String8Builder::<NativeEndian>::wrap(&mut buf, 0, 16)?;
//!     b.set(Some("hello"))?;
//!     b.build()?
//! };
//!
//! let v = String8View::<NativeEndian>::wrap(&buf, 0, limit)?;
//! assert_eq!(v.as_str()?, Some("hello"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! Every codec is a view/builder pair over the same base contract:
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │   Variants (adaptive-width encodings)    │
//! ├─────────────────────────────────────────┤
//! │  Containers (list / array / map / enum)  │
//! ├─────────────────────────────────────────┤
//! │  Primitives (scalar / varint / string /  │
//! │              octets)                     │
//! ├─────────────────────────────────────────┤
//! │   Cursor contract (View / Builder /      │
//! │              Codec)                      │
//! ├─────────────────────────────────────────┤
//! │   Buffer accessors (fixed-width r/w)     │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Schemas are expressed at the type level: marker types carry the header
//! width, byte order and declared variant members as generic parameters, so
//! every wire type monomorphizes into straight-line field access.
//!
//! ## Module Overview
//!
//! - [`buffer`]: Bounds-checked fixed-width reads and writes, 8 to 64 bits
//!   plus 24-bit, and the [`buffer::HeaderWidth`] length-field abstraction
//! - [`cursor`]: The [`cursor::View`]/[`cursor::Builder`] wrap contract and
//!   the [`cursor::Codec`] type descriptor
//! - [`scalar`]: Fixed-width integer codecs
//! - [`varint`]: Zigzag varint32 and the offset-biased varuint32n
//! - [`strings`]: Length-prefixed UTF-8 with a null sentinel
//! - [`octets`]: Raw byte spans, bounded and headerless
//! - [`list`], [`array`], [`map`]: Counted containers with 8/16/32-bit headers
//! - [`enums`]: Closed constant sets, value-backed or label-backed
//! - [`variant`]: Multi-kind encodings with narrowest-member selection and
//!   the array append-then-narrow protocol

pub mod macros;

pub mod array;
pub mod buffer;
pub mod cursor;
pub mod enums;
pub mod list;
pub mod map;
pub mod octets;
pub mod scalar;
pub mod strings;
pub mod variant;
pub mod varint;

pub use buffer::{BigEndian, LittleEndian, NativeEndian, NetworkEndian, W16, W32, W8};
pub use cursor::{Builder, Codec, View};
