//! Wire Protocol
//!
//! This module implements the reduced, line-delimited RESP subset the server
//! speaks.
//!
//! ## Pipeline
//!
//! ```text
//! raw bytes ──> tokenizer ──> parser ──> Command
//!                                           │
//!                               (dispatch)  ▼
//! reply bytes <────────────────────── RespValue
//! ```
//!
//! ## Modules
//!
//! - `tokenizer`: Splits a request buffer on CRLF
//! - `parser`: Validates arity and lengths, builds a `Command`
//! - `types`: Defines the `RespValue` reply enum and its encoding
//!
//! ## Example
//!
//! ```
//! use redline::protocol::{decode_command, RespValue};
//!
//! let command = decode_command(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n").unwrap();
//! assert_eq!(command.name, "GET");
//!
//! let reply = RespValue::simple_string("test1").serialize();
//! assert_eq!(&reply[..], b"+test1\r\n");
//! ```

pub mod parser;
pub mod tokenizer;
pub mod types;

// Re-export commonly used types for convenience
pub use parser::{parse_command, Command, CommandParser, ParseError, ParseResult, SyntaxError};
pub use tokenizer::{tokenize, DecodeError, DecodeResult, Token};
pub use types::RespValue;

use thiserror::Error;

/// Structural failures that stop a request before it becomes a `Command`.
///
/// These never produce a reply; the exchange is abandoned.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("error decoding request: {0}")]
    Decode(#[from] DecodeError),

    #[error("error parsing request: {0}")]
    Parse(#[from] ParseError),
}

/// Tokenizes and parses one request buffer.
pub fn decode_command(buf: &[u8]) -> Result<Command, RequestError> {
    let tokens = tokenize(buf)?;
    Ok(parse_command(tokens.as_slice())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Encodes a request the way a client would.
    fn encode(name: &str, params: &[&str]) -> Vec<u8> {
        let mut out = format!("*{}\r\n${}\r\n{}\r\n", params.len() + 1, name.len(), name);
        for p in params {
            out.push_str(&format!("${}\r\n{}\r\n", p.len(), p));
        }
        out.into_bytes()
    }

    #[test]
    fn test_encoded_requests_decode_to_same_command() {
        let long = "abc".repeat(256);
        let cases: Vec<(&str, Vec<&str>)> = vec![
            ("SET", vec!["name", "test1"]),
            ("SET", vec!["jsonData", "{\"test\":123}"]),
            ("SET", vec!["name", long.as_str()]),
            ("SET", vec![long.as_str(), long.as_str()]),
            ("GET", vec!["name"]),
            ("DEL", vec!["a", "b", "c"]),
        ];

        for (name, params) in cases {
            let command = decode_command(&encode(name, &params)).unwrap();
            assert_eq!(command.name, name);
            assert_eq!(command.params, params);
        }
    }

    #[test]
    fn test_lowercase_verb_normalized() {
        let command = decode_command(&encode("del", &["k"])).unwrap();
        assert_eq!(command.name, "DEL");
    }

    #[test]
    fn test_empty_buffer() {
        assert_eq!(
            decode_command(b""),
            Err(RequestError::Decode(DecodeError::EmptyPayload))
        );
    }

    #[test]
    fn test_no_terminators_is_end_of_input() {
        assert_eq!(
            decode_command(b"hello"),
            Err(RequestError::Parse(ParseError::EndOfInput))
        );
    }

    #[test]
    fn test_length_mismatch_fails() {
        let err = decode_command(b"*2\r\n$3\r\nget\r\n$10\r\nname\r\n").unwrap_err();
        assert!(matches!(
            err,
            RequestError::Parse(ParseError::Syntax(SyntaxError::LengthMismatch { .. }))
        ));
    }

    #[test]
    fn test_truncated_request_fails_arity() {
        // The last payload lost its terminator, so it is dropped by the tokenizer.
        let err = decode_command(b"*2\r\n$3\r\nGET\r\n$4\r\nname").unwrap_err();
        assert!(matches!(
            err,
            RequestError::Parse(ParseError::Syntax(SyntaxError::ArityMismatch { .. }))
        ));
    }

    #[test]
    fn test_non_utf8_value_survives_decoding() {
        let command = decode_command(b"*3\r\n$3\r\nSET\r\n$1\r\nk\r\n$1\r\n\xff\r\n").unwrap();
        assert_eq!(command.name, "SET");
        assert_eq!(command.params[0], "k");
        assert_eq!(command.params[1], &b"\xff"[..]);
    }
}
