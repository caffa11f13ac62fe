//! Symbol demangler for C++ style mangled names.

use std::borrow::Cow;
use std::fmt;

use tokenizing::{Color, ColorScheme, Colors, Token};

mod helper;
pub mod itanium;

pub use helper::parallel_compute;

/// Restore the `_Z` prefix of symbols whose toolchain added or stripped an
/// underscore.
pub fn normalize(s: &str) -> Cow<'_, str> {
    if s.starts_with('Z') {
        return Cow::Owned(format!("_{s}"));
    }

    Cow::Borrowed(s.strip_prefix('_').filter(|s| s.starts_with("_Z")).unwrap_or(s))
}

/// Demangle `s`, falling back to the symbol itself when it can't be decoded.
pub fn parser(s: &str) -> TokenStream {
    itanium::parse(&normalize(s)).unwrap_or_else(|| TokenStream::simple(s))
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token<'static>>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self {
            tokens: Vec::with_capacity(128),
        }
    }

    pub fn simple(s: &str) -> Self {
        let mut this = Self {
            tokens: Vec::with_capacity(1),
        };

        this.push_string(s.to_string(), Colors::item());
        this
    }

    #[inline]
    pub fn push(&mut self, text: &'static str, color: &'static Color) {
        self.tokens.push(Token::from_str(text, color));
    }

    #[inline]
    pub fn push_string(&mut self, text: String, color: &'static Color) {
        self.tokens.push(Token::from_string(text, color));
    }

    #[inline]
    pub fn tokens(&self) -> &[Token<'static>] {
        self.tokens.as_slice()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

impl fmt::Display for TokenStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.tokens.iter().try_for_each(|token| f.write_str(&token.text))
    }
}
