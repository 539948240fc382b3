//! # View/Builder Base Contract
//!
//! Every codec in this crate is a pair of cursors over a caller-provided byte
//! buffer:
//!
//! - A **view** overlays `[offset, limit())` of a shared slice. `limit()` is
//!   always computed from bytes already present at `offset` (a length field,
//!   a kind byte), never set externally. After a successful wrap,
//!   `offset <= limit() <= max_limit` holds.
//! - A **builder** overlays a mutable slice starting at `offset` with an
//!   internal `limit` cursor that only grows within one build pass, bounded
//!   by `max_limit`. `build()` finalizes header fields that could not be
//!   known until all children were appended and returns the final limit; the
//!   caller re-wraps a view over `[offset, limit)` to read the value back.
//!
//! Wrapping never copies and never allocates. `wrap` fails when the cursor
//! would start beyond `max_limit` or the bytes at `offset` do not form a
//! complete value; `try_wrap` reports the same conditions as `None`, which is
//! the normal signal when parsing partially-buffered streaming input.
//!
//! Views and builders are plain structs holding a borrow plus cursor fields;
//! constructing one is free, so "reuse" is simply wrapping again. A view must
//! not outlive the pass that produced it if the underlying bytes are about to
//! be rewritten.

use eyre::{ensure, Result};

/// Fails when a structural read/write would pass `max_limit`.
#[inline]
pub fn check_limit(limit: usize, max_limit: usize) -> Result<()> {
    ensure!(
        limit <= max_limit,
        "limit {} is beyond max limit {}",
        limit,
        max_limit
    );
    Ok(())
}

/// Validates a wrap request before any bytes are touched.
#[inline]
pub fn check_wrap(capacity: usize, offset: usize, max_limit: usize) -> Result<()> {
    ensure!(
        offset <= max_limit,
        "offset {} is beyond max limit {}",
        offset,
        max_limit
    );
    ensure!(
        max_limit <= capacity,
        "max limit {} is beyond buffer capacity {}",
        max_limit,
        capacity
    );
    Ok(())
}

/// Zero-copy read cursor.
pub trait View<'a>: Sized {
    /// Wraps the bytes at `offset`; fails if `offset > max_limit` or the
    /// bytes do not form a complete, well-formed value.
    fn wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Result<Self>;

    /// Speculative wrap: `None` where [`View::wrap`] would fail. Used when
    /// insufficient bytes is an expected, recoverable condition.
    fn try_wrap(buffer: &'a [u8], offset: usize, max_limit: usize) -> Option<Self> {
        Self::wrap(buffer, offset, max_limit).ok()
    }

    fn buffer(&self) -> &'a [u8];
    fn offset(&self) -> usize;
    fn max_limit(&self) -> usize;

    /// One past the last byte of the value, computed from the value's own
    /// header bytes.
    fn limit(&self) -> usize;

    fn sizeof(&self) -> usize {
        self.limit() - self.offset()
    }

    /// The raw encoded range `[offset, limit())`. Equality and hashing of
    /// views are defined over these bytes, not field-wise.
    fn bytes(&self) -> &'a [u8] {
        &self.buffer()[self.offset()..self.limit()]
    }
}

/// Write cursor.
pub trait Builder<'a>: Sized {
    /// Starts a build pass at `offset`; fails if the region cannot hold the
    /// type's minimum encoding.
    fn wrap(buffer: &'a mut [u8], offset: usize, max_limit: usize) -> Result<Self>;

    fn offset(&self) -> usize;
    fn max_limit(&self) -> usize;

    /// Current write cursor; grows monotonically within one build pass.
    fn limit(&self) -> usize;

    fn sizeof(&self) -> usize {
        self.limit() - self.offset()
    }

    /// Finalizes deferred header fields and returns the final limit.
    fn build(self) -> Result<usize>;
}

/// Type-level descriptor tying a wire type's view and builder together, so
/// arrays and maps can be generic over their item/key/value types without
/// dynamic dispatch.
pub trait Codec: 'static {
    type View<'a>: View<'a>;
    type Builder<'b>: Builder<'b>;

    /// Wraps the builder used while an item is appended inside an array,
    /// before any narrowing pass has run. Adaptive-width codecs override
    /// this to pin the provisional encoding to their widest member so that
    /// later item offsets stay stable during the append pass.
    fn wrap_item(buffer: &mut [u8], offset: usize, max_limit: usize) -> Result<Self::Builder<'_>> {
        Self::Builder::wrap(buffer, offset, max_limit)
    }

    /// Re-encodes the item occupying `[read_offset, read_limit)` into its
    /// narrowest layout starting at `write_offset`, returning the new limit.
    /// `max_length` is the largest encoded item size observed across the
    /// containing collection. The default keeps the encoding as-is and only
    /// moves the bytes.
    fn rebuild(
        buffer: &mut [u8],
        read_offset: usize,
        read_limit: usize,
        write_offset: usize,
        max_length: usize,
    ) -> Result<usize> {
        let _ = max_length;
        let size = read_limit - read_offset;
        buffer.copy_within(read_offset..read_limit, write_offset);
        Ok(write_offset + size)
    }
}
