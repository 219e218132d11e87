//! Ordered byte-stream abstraction for inter-node constraint exchange.
//!
//! Constraints and constraint sets cross the node boundary through the
//! runtime's messaging layer, which hands this crate an ordered stream to
//! write into or read from. [`WireSink`] and [`WireSource`] are that
//! boundary: one field at a time, in declared field order, big-endian.
//!
//! Writers are infallible (the transport buffers grow); readers are
//! fallible, because the peer may be a different build. Truncated input and
//! unknown discriminants surface as [`WireError`], never as panics.
//!
//! # Examples
//!
//! ```
//! use placer::wire::{WireSink, WireSource};
//!
//! let mut buf = Vec::new();
//! buf.put_u32(7);
//! buf.put_bool(true);
//!
//! let mut src: &[u8] = &buf;
//! assert_eq!(src.get_u32().unwrap(), 7);
//! assert!(src.get_bool().unwrap());
//! ```

/// Error produced when decoding from a wire stream fails.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    /// The stream ended before the declared fields did.
    #[error("wire stream truncated: needed {needed} more bytes")]
    Truncated {
        /// Bytes still required by the current field.
        needed: usize,
    },
    /// A discriminant byte named no known variant.
    #[error("unknown {what} discriminant {value}")]
    BadDiscriminant {
        /// Which enumeration was being decoded.
        what: &'static str,
        /// The offending tag byte.
        value: u8,
    },
    /// A length prefix exceeded the sanity limit.
    #[error("wire length {len} exceeds limit {limit}")]
    LengthOverflow {
        /// Declared element count.
        len: u64,
        /// Maximum accepted count.
        limit: u64,
    },
}

/// Hard cap on decoded vector lengths. A peer declaring more elements than
/// this is corrupt or hostile, not merely large.
pub const MAX_WIRE_LEN: u64 = 1 << 20;

/// An ordered byte stream being written.
///
/// All writes append at the end; there is no seeking. Default methods are
/// built on [`put_slice`](Self::put_slice).
pub trait WireSink {
    /// Appends raw bytes to the stream.
    fn put_slice(&mut self, src: &[u8]);

    /// Appends a single byte.
    fn put_u8(&mut self, n: u8) {
        self.put_slice(&[n]);
    }

    /// Appends a big-endian u32.
    fn put_u32(&mut self, n: u32) {
        self.put_slice(&n.to_be_bytes());
    }

    /// Appends a big-endian u64.
    fn put_u64(&mut self, n: u64) {
        self.put_slice(&n.to_be_bytes());
    }

    /// Appends a big-endian i64.
    fn put_i64(&mut self, n: i64) {
        self.put_slice(&n.to_be_bytes());
    }

    /// Appends a bool as one byte.
    fn put_bool(&mut self, b: bool) {
        self.put_u8(u8::from(b));
    }

    /// Appends an element count prefix.
    fn put_len(&mut self, len: usize) {
        self.put_u64(len as u64);
    }
}

impl WireSink for Vec<u8> {
    fn put_slice(&mut self, src: &[u8]) {
        self.extend_from_slice(src);
    }
}

impl<S: WireSink + ?Sized> WireSink for &mut S {
    fn put_slice(&mut self, src: &[u8]) {
        (**self).put_slice(src);
    }
}

/// An ordered byte stream being read.
///
/// Reads consume from the front in the same order the peer wrote.
pub trait WireSource {
    /// Number of unread bytes.
    fn remaining(&self) -> usize;

    /// Copies exactly `dst.len()` bytes out of the stream.
    fn take_slice(&mut self, dst: &mut [u8]) -> Result<(), WireError>;

    /// Reads a single byte.
    fn get_u8(&mut self) -> Result<u8, WireError> {
        let mut b = [0u8; 1];
        self.take_slice(&mut b)?;
        Ok(b[0])
    }

    /// Reads a big-endian u32.
    fn get_u32(&mut self) -> Result<u32, WireError> {
        let mut b = [0u8; 4];
        self.take_slice(&mut b)?;
        Ok(u32::from_be_bytes(b))
    }

    /// Reads a big-endian u64.
    fn get_u64(&mut self) -> Result<u64, WireError> {
        let mut b = [0u8; 8];
        self.take_slice(&mut b)?;
        Ok(u64::from_be_bytes(b))
    }

    /// Reads a big-endian i64.
    fn get_i64(&mut self) -> Result<i64, WireError> {
        let mut b = [0u8; 8];
        self.take_slice(&mut b)?;
        Ok(i64::from_be_bytes(b))
    }

    /// Reads a bool byte, accepting only 0 and 1.
    fn get_bool(&mut self) -> Result<bool, WireError> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            value => Err(WireError::BadDiscriminant {
                what: "bool",
                value,
            }),
        }
    }

    /// Reads an element count prefix, enforcing [`MAX_WIRE_LEN`].
    fn get_len(&mut self) -> Result<usize, WireError> {
        let len = self.get_u64()?;
        if len > MAX_WIRE_LEN {
            return Err(WireError::LengthOverflow {
                len,
                limit: MAX_WIRE_LEN,
            });
        }
        Ok(len as usize)
    }
}

impl WireSource for &[u8] {
    fn remaining(&self) -> usize {
        self.len()
    }

    fn take_slice(&mut self, dst: &mut [u8]) -> Result<(), WireError> {
        if self.len() < dst.len() {
            return Err(WireError::Truncated {
                needed: dst.len() - self.len(),
            });
        }
        let (head, tail) = self.split_at(dst.len());
        dst.copy_from_slice(head);
        *self = tail;
        Ok(())
    }
}

/// A value with a fixed field order on the wire.
///
/// Implementations must write fields in declared order and read them back in
/// the same order; conditional fields appear only when their discriminant
/// requires them. This is a wire-compatibility contract with the rest of the
/// runtime, not a convenience.
pub trait WireEncode: Sized {
    /// Writes `self` to the sink, one field at a time.
    fn encode<S: WireSink>(&self, sink: &mut S);

    /// Reads a value the peer wrote with [`encode`](Self::encode).
    fn decode<R: WireSource>(source: &mut R) -> Result<Self, WireError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_round_trip() {
        let mut buf = Vec::new();
        buf.put_u8(0xab);
        buf.put_u32(0x1234_5678);
        buf.put_u64(u64::MAX);
        buf.put_i64(-42);
        buf.put_bool(false);
        buf.put_len(3);

        let mut src: &[u8] = &buf;
        assert_eq!(src.get_u8().unwrap(), 0xab);
        assert_eq!(src.get_u32().unwrap(), 0x1234_5678);
        assert_eq!(src.get_u64().unwrap(), u64::MAX);
        assert_eq!(src.get_i64().unwrap(), -42);
        assert!(!src.get_bool().unwrap());
        assert_eq!(src.get_len().unwrap(), 3);
        assert_eq!(src.remaining(), 0);
    }

    #[test]
    fn truncation_is_an_error() {
        let buf = vec![0u8; 3];
        let mut src: &[u8] = &buf;
        let err = src.get_u32().unwrap_err();
        assert_eq!(err, WireError::Truncated { needed: 1 });
    }

    #[test]
    fn bad_bool_is_a_discriminant_error() {
        let buf = vec![7u8];
        let mut src: &[u8] = &buf;
        assert!(matches!(
            src.get_bool(),
            Err(WireError::BadDiscriminant { what: "bool", .. })
        ));
    }

    #[test]
    fn oversized_len_is_rejected() {
        let mut buf = Vec::new();
        buf.put_u64(MAX_WIRE_LEN + 1);
        let mut src: &[u8] = &buf;
        assert!(matches!(
            src.get_len(),
            Err(WireError::LengthOverflow { .. })
        ));
    }
}
