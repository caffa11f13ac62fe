//! Provides the `Cursor` type: the remaining, not yet decoded part of a
//! mangled symbol together with its index into the original input.
//!
//! Decoding is strictly left-to-right. A `Cursor` only ever moves forward and
//! every failed expectation is terminal, there is no backtracking across
//! alternative interpretations of the grammar.

use std::fmt;

use super::error::{Error, Reason, Result};

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor<'a> {
    idx: usize,
    string: &'a str,
}

impl<'a> Cursor<'a> {
    /// Construct a new `Cursor` (with `index == 0`) from the given input.
    #[inline]
    pub(crate) fn new(string: &'a str) -> Cursor<'a> {
        Cursor { idx: 0, string }
    }

    /// Number of bytes that haven't been consumed yet.
    #[inline]
    pub(crate) fn remaining_len(&self) -> usize {
        self.string.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.string.is_empty()
    }

    /// Get the index into the original input that this `Cursor` is at.
    #[inline]
    pub(crate) fn index(&self) -> usize {
        self.idx
    }

    /// The input that hasn't been consumed yet.
    #[inline]
    pub(crate) fn as_str(&self) -> &'a str {
        self.string
    }

    /// Peek at the next byte.
    #[inline]
    pub(crate) fn peek(&self) -> Option<u8> {
        self.string.as_bytes().first().copied()
    }

    /// Peek at the byte after the next byte.
    #[inline]
    pub(crate) fn peek_second(&self) -> Option<u8> {
        self.string.as_bytes().get(1).copied()
    }

    #[inline]
    pub(crate) fn peek_digit(&self) -> bool {
        matches!(self.peek(), Some(b'0'..=b'9'))
    }

    /// Whether the remaining input starts with `expected`. Never consumes.
    #[inline]
    pub(crate) fn peek_matches(&self, expected: &str) -> bool {
        self.string.starts_with(expected)
    }

    /// Construct an error pointing at the current position.
    #[inline]
    pub(crate) fn error(&self, reason: Reason) -> Error {
        Error::new(reason, self.idx)
    }

    /// Skip over `count` bytes.
    ///
    /// Panics if `count` is out of bounds or not on a char boundary.
    #[inline]
    fn advance(&mut self, count: usize) {
        self.idx += count;
        self.string = &self.string[count..];
    }

    /// Consume `expected` if the input starts with it.
    pub(crate) fn try_consume(&mut self, expected: &str) -> bool {
        if self.peek_matches(expected) {
            self.advance(expected.len());
            true
        } else {
            false
        }
    }

    /// Expect and consume the given str. Otherwise return an error with reason
    /// `Reason::UnexpectedText` if the input doesn't match, or
    /// `Reason::UnexpectedEnd` if it isn't long enough.
    pub(crate) fn consume(&mut self, expected: &str) -> Result<()> {
        if self.try_consume(expected) {
            return Ok(());
        }

        if self.string.len() < expected.len() && expected.starts_with(self.string) {
            Err(self.error(Reason::UnexpectedEnd))
        } else {
            Err(self.error(Reason::UnexpectedText))
        }
    }

    /// Parse a non-negative decimal number.
    ///
    /// "<number>s appearing in mangled names never have leading zeroes,
    /// except for the value zero, represented as '0'."
    pub(crate) fn number(&mut self) -> Result<usize> {
        if self.is_empty() {
            return Err(self.error(Reason::UnexpectedEnd));
        }

        let num_numeric = self.string.bytes().take_while(u8::is_ascii_digit).count();
        if num_numeric == 0 {
            return Err(self.error(Reason::UnexpectedText));
        }

        let head = &self.string[..num_numeric];
        if num_numeric > 1 && head.starts_with('0') {
            return Err(self.error(Reason::UnexpectedText));
        }

        let number = head.parse::<usize>().map_err(|_| self.error(Reason::Overflow))?;
        self.advance(num_numeric);
        Ok(number)
    }

    /// Parse a decimal number if one follows.
    pub(crate) fn opt_number(&mut self) -> Result<Option<usize>> {
        if self.peek_digit() {
            self.number().map(Some)
        } else {
            Ok(None)
        }
    }

    /// Consume an identifier of exactly `len` word characters.
    pub(crate) fn identifier(&mut self, len: usize) -> Result<&'a str> {
        if len == 0 {
            return Err(self.error(Reason::UnexpectedText));
        }

        let ident = match self.string.get(..len) {
            Some(ident) => ident,
            None if self.string.len() < len => return Err(self.error(Reason::UnexpectedEnd)),
            None => return Err(self.error(Reason::UnexpectedText)),
        };

        if !ident.bytes().all(|c| c.is_ascii_alphanumeric() || c == b'_') {
            return Err(self.error(Reason::UnexpectedText));
        }

        self.advance(len);
        Ok(ident)
    }
}

impl<'a> fmt::Debug for Cursor<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Cursor {{ idx: {}, string: {:?} }}", self.idx, self.string)
    }
}
