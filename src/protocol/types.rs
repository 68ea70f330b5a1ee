//! Reply Types
//!
//! This module defines the replies the server can send back to a client.
//! Only a reduced subset of RESP is produced: success values are sent as
//! simple strings, never as length-prefixed bulk strings.
//!
//! ## Protocol Format
//!
//! Each reply starts with a type prefix byte:
//! - `+` Simple String
//! - `-` Error
//! - `:` Integer
//! - `$-1` Null (literal null bulk marker)
//!
//! All replies are terminated with CRLF (`\r\n`).
//!
//! ## Examples
//!
//! Simple String: `+OK\r\n`
//! Error: `-Unknown command PING\r\n`
//! Integer: `:1\r\n`
//! Null: `$-1\r\n`

use bytes::{BufMut, Bytes, BytesMut};
use std::fmt;

/// The CRLF terminator used in the protocol
pub const CRLF: &[u8] = b"\r\n";

/// Protocol type prefixes
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
}

/// A reply produced by the command dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Simple strings carry status text and stored values, byte for byte.
    /// Format: `+<string>\r\n`
    SimpleString(Bytes),

    /// Errors are similar to simple strings but indicate an error condition.
    /// Format: `-<error message>\r\n`
    Error(String),

    /// 64-bit signed integers.
    /// Format: `:<integer>\r\n`
    Integer(i64),

    /// Null bulk marker, sent when a key is absent.
    /// Format: `$-1\r\n`
    Null,
}

impl RespValue {
    /// Creates a new simple string reply.
    ///
    /// # Example
    /// ```
    /// use redline::protocol::types::RespValue;
    /// let ok = RespValue::simple_string("OK");
    /// ```
    pub fn simple_string(s: impl Into<Bytes>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Creates a new error reply.
    ///
    /// # Example
    /// ```
    /// use redline::protocol::types::RespValue;
    /// let err = RespValue::error("Unknown command PING");
    /// ```
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Creates a new integer reply.
    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a null reply.
    pub fn null() -> Self {
        RespValue::Null
    }

    /// Common reply for successful writes
    pub fn ok() -> Self {
        RespValue::SimpleString(Bytes::from_static(b"OK"))
    }

    /// Number of bytes the encoded reply occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        let body = match self {
            RespValue::SimpleString(s) => s.len(),
            RespValue::Error(s) => s.len(),
            RespValue::Integer(n) => n.to_string().len(),
            RespValue::Null => 2,
        };
        1 + body + CRLF.len()
    }

    /// Serializes the reply to bytes for sending over the wire.
    pub fn serialize(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.serialize_into(&mut buf);
        buf.freeze()
    }

    /// Serializes the reply into an existing buffer.
    pub fn serialize_into(&self, buf: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                buf.put_u8(prefix::SIMPLE_STRING);
                buf.put_slice(s);
            }
            RespValue::Error(s) => {
                buf.put_u8(prefix::ERROR);
                buf.put_slice(s.as_bytes());
            }
            RespValue::Integer(n) => {
                buf.put_u8(prefix::INTEGER);
                buf.put_slice(n.to_string().as_bytes());
            }
            RespValue::Null => {
                buf.put_u8(prefix::BULK_STRING);
                buf.put_slice(b"-1");
            }
        }
        buf.put_slice(CRLF);
    }

    /// Returns true if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, RespValue::Null)
    }

    /// Returns true if this value is an error.
    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }
}

impl fmt::Display for RespValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RespValue::SimpleString(s) => write!(f, "\"{}\"", String::from_utf8_lossy(s)),
            RespValue::Error(s) => write!(f, "(error) {}", s),
            RespValue::Integer(n) => write!(f, "(integer) {}", n),
            RespValue::Null => write!(f, "(nil)"),
        }
    }
}
