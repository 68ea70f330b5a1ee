//! Line Tokenizer
//!
//! Splits a raw request buffer into the CRLF-delimited tokens the command
//! parser consumes.
//!
//! ## Boundary Rules
//!
//! - A terminator at the very first byte produces no token (there is never an
//!   empty leading token). Empty tokens elsewhere are kept.
//! - Bytes following the last terminator are never emitted. A request always
//!   ends with CRLF, so a trailing fragment is either padding or a truncated
//!   read, and the parser's arity check rejects the latter.
//!
//! Tokens are byte slices of the input buffer. No text decoding happens
//! here, so declared lengths are always checked against the bytes that
//! arrived.

use crate::protocol::types::CRLF;
use thiserror::Error;

/// A single token: a slice of the request buffer between two terminators.
pub type Token<'a> = &'a [u8];

/// Errors produced while tokenizing a request buffer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The buffer has zero length
    #[error("empty payload")]
    EmptyPayload,
}

/// Result type for tokenizing.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Splits `buf` on CRLF into an ordered sequence of tokens.
///
/// # Example
///
/// ```
/// use redline::protocol::tokenize;
///
/// let tokens = tokenize(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n").unwrap();
/// assert_eq!(tokens.len(), 5);
/// assert_eq!(tokens[2], b"GET");
/// ```
pub fn tokenize(buf: &[u8]) -> DecodeResult<Vec<Token<'_>>> {
    if buf.is_empty() {
        return Err(DecodeError::EmptyPayload);
    }

    let mut tokens = Vec::new();
    let mut start = 0;
    let mut i = 0;

    // Only offsets with a following byte can begin a terminator.
    while i + 1 < buf.len() {
        if buf[i] == CRLF[0] && buf[i + 1] == CRLF[1] {
            if i != 0 {
                tokens.push(&buf[start..i]);
            }
            i += CRLF.len();
            start = i;
            continue;
        }
        i += 1;
    }

    Ok(tokens)
}
