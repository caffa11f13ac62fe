//! Custom `Error` and `Result` types for the demangler.

use core::fmt;

/// Why a symbol was rejected.
///
/// Every reason describes the same failure as far as callers are concerned:
/// the input is not a valid mangled name. The reason only exists for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Reason {
    /// The mangled symbol ends abruptly.
    UnexpectedEnd,

    /// The mangled symbol is not well-formed.
    UnexpectedText,

    /// Found a back reference that is out-of-bounds of the substitution
    /// table, or a back reference into an empty table.
    BadBackReference,

    /// An overflow would occur when parsing an integer in a mangled symbol.
    Overflow,

    /// Encountered too much recursion when demangling symbol.
    TooMuchRecursion,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Reason::UnexpectedEnd => write!(f, "mangled symbol ends abruptly"),
            Reason::UnexpectedText => write!(f, "mangled symbol is not well-formed"),
            Reason::BadBackReference => {
                write!(f, "back reference that is out-of-bounds of the substitution table")
            }
            Reason::Overflow => write!(
                f,
                "an overflow would occur when parsing an integer in a mangled symbol"
            ),
            Reason::TooMuchRecursion => {
                write!(f, "encountered too much recursion when demangling symbol")
            }
        }
    }
}

/// The provided mangle is not valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Error {
    reason: Reason,
    offset: usize,
}

impl Error {
    pub(crate) fn new(reason: Reason, offset: usize) -> Self {
        Self { reason, offset }
    }

    #[inline]
    pub fn reason(&self) -> Reason {
        self.reason
    }

    /// Byte offset into the mangled input at which decoding gave up.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "the provided mangle is not valid: {} (at offset {})",
            self.reason, self.offset
        )
    }
}

impl std::error::Error for Error {}

/// A demangling result of `T` or an [`Error`].
pub type Result<T> = ::core::result::Result<T, Error>;

#[test]
fn size_of_error() {
    assert!(
        core::mem::size_of::<Error>() <= 2 * core::mem::size_of::<usize>(),
        "We should keep the size of our Error type in check"
    );
}
