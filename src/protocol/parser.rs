//! Command Parser
//!
//! This module turns the token sequence produced by the tokenizer into a
//! [`Command`]. The grammar is a declared array of bulk strings:
//!
//! ```text
//! *<N>            array header, N = 1 + parameter count
//! $<len>          length header of the command name
//! <NAME>          command name
//! $<len>          length header of parameter 1
//! <p1>            parameter 1
//! ...
//! ```
//!
//! ## How the Parser Works
//!
//! The parser keeps a single forward cursor over the tokens and never
//! backtracks. Before anything past the array header is read, the declared
//! arity is checked against the total token count, so a request whose shape
//! is wrong never reaches the length checks. Every bulk payload must match its
//! declared length exactly, counted in raw bytes. Parameters are kept as
//! bytes; only the command name is read as text.
//!
//! Parsing is all-or-nothing: on any error no `Command` is produced.

use crate::protocol::types::prefix;
use bytes::Bytes;
use thiserror::Error;

/// Structural violations of the request grammar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyntaxError {
    /// A header token did not start with the expected marker
    #[error("invalid syntax: expected '{expected}', got '{found}'")]
    UnexpectedMarker { expected: char, found: String },

    /// A header's count or length is not a non-negative integer
    #[error("invalid syntax: expected integer, got '{value}': {reason}")]
    InvalidInteger { value: String, reason: String },

    /// The declared array arity disagrees with the number of tokens
    #[error("expected {expected} tokens for the declared command parts, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// A bulk payload's length differs from its declared length
    #[error("expected length {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    /// A length header was not followed by a payload token
    #[error("missing payload for declared length {declared}")]
    MissingPayload { declared: usize },
}

/// Errors that can occur while parsing a command.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The cursor ran past the last token
    #[error("end of input")]
    EndOfInput,

    /// The tokens do not follow the request grammar
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// A parsed request: an upper-cased verb plus its ordered parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// Command name, normalized to upper case
    pub name: String,
    /// Parameters in wire order, byte for byte
    pub params: Vec<Bytes>,
}

impl Command {
    /// Creates a command, upper-casing the name.
    pub fn new(name: impl AsRef<str>, params: Vec<Bytes>) -> Self {
        Self {
            name: name.as_ref().to_uppercase(),
            params,
        }
    }
}

/// A single-use parser over one request's tokens.
///
/// # Example
///
/// ```
/// use redline::protocol::CommandParser;
///
/// let tokens = ["*2", "$3", "get", "$4", "name"];
/// let command = CommandParser::new(&tokens).parse().unwrap();
/// assert_eq!(command.name, "GET");
/// assert_eq!(command.params, vec!["name"]);
/// ```
#[derive(Debug)]
pub struct CommandParser<'t, T> {
    tokens: &'t [T],
    /// Index of the next unread token
    current: usize,
}

impl<'t, T: AsRef<[u8]>> CommandParser<'t, T> {
    /// Creates a parser positioned at the first token.
    pub fn new(tokens: &'t [T]) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parses the whole token sequence into a [`Command`].
    pub fn parse(&mut self) -> ParseResult<Command> {
        let header = self.next().ok_or(ParseError::EndOfInput)?;
        let parts = parse_length(header, prefix::ARRAY)?;

        // One length header plus one payload token per declared part.
        let size = self.tokens.len();
        let expected = parts.checked_mul(2).and_then(|n| n.checked_add(1));
        match expected {
            Some(expected) if parts > 0 && expected == size => {}
            _ => {
                return Err(SyntaxError::ArityMismatch {
                    expected: expected.unwrap_or(usize::MAX),
                    actual: size,
                }
                .into())
            }
        }

        let name = self.parse_bulk()?;
        let params = self.parse_params()?;

        Ok(Command::new(String::from_utf8_lossy(name), params))
    }

    fn next(&mut self) -> Option<&'t [u8]> {
        let tokens = self.tokens;
        let token = tokens.get(self.current)?;
        self.current += 1;
        Some(token.as_ref())
    }

    /// Reads a `$<len>` header and the payload that must follow it.
    fn parse_bulk(&mut self) -> ParseResult<&'t [u8]> {
        let header = self.next().ok_or(ParseError::EndOfInput)?;
        let declared = parse_length(header, prefix::BULK_STRING)?;

        let payload = self
            .next()
            .ok_or(SyntaxError::MissingPayload { declared })?;

        if payload.len() != declared {
            return Err(SyntaxError::LengthMismatch {
                expected: declared,
                actual: payload.len(),
            }
            .into());
        }
        Ok(payload)
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Bytes>> {
        let mut params = Vec::with_capacity(self.remaining() / 2);
        while self.remaining() > 0 {
            params.push(Bytes::copy_from_slice(self.parse_bulk()?));
        }
        Ok(params)
    }

    fn remaining(&self) -> usize {
        self.tokens.len() - self.current
    }
}

/// Parses a header of the form `<marker><non-negative integer>`.
fn parse_length(token: &[u8], marker: u8) -> Result<usize, SyntaxError> {
    let digits = match token.split_first() {
        Some((&first, rest)) if first == marker => rest,
        found => {
            return Err(SyntaxError::UnexpectedMarker {
                expected: char::from(marker),
                found: found
                    .map(|(&b, _)| char::from(b).to_string())
                    .unwrap_or_default(),
            })
        }
    };

    let invalid = |reason: String| SyntaxError::InvalidInteger {
        value: String::from_utf8_lossy(digits).into_owned(),
        reason,
    };

    std::str::from_utf8(digits)
        .map_err(|e| invalid(e.to_string()))?
        .parse::<usize>()
        .map_err(|e| invalid(e.to_string()))
}

/// Parses a complete token slice into a command.
pub fn parse_command<T: AsRef<[u8]>>(tokens: &[T]) -> ParseResult<Command> {
    CommandParser::new(tokens).parse()
}
