//! Colored tokens making up a demangled symbol.
use std::borrow::Cow;

pub use egui::Color32 as Color;

/// Currently used global colorscheme
pub type Colors = IBM;

/// Colors for each kind of token in a demangled symbol.
pub trait ColorScheme {
    /// `(`, `)`, `<`, `>` and the braces of synthesized bodies.
    fn brackets() -> &'static Color;
    /// `::` between scopes and `, ` between arguments.
    fn delimiter() -> &'static Color;
    /// The `this` adjustment of a thunk.
    fn comment() -> &'static Color;
    /// Names taken from the symbol and the `p0`/`T0` placeholders.
    fn item() -> &'static Color;

    fn spacing() -> &'static Color {
        &colors::WHITE
    }

    /// Builtin types and `std` abbreviations.
    fn known() -> &'static Color {
        Self::item()
    }

    /// `struct`, `complex` and `this`.
    fn annotation() -> &'static Color {
        Self::item()
    }

    /// `const`, `*` and `&`.
    fn special() -> &'static Color {
        Self::item()
    }
}

pub struct IBM;

impl ColorScheme for IBM {
    fn brackets() -> &'static Color {
        &colors::GRAY40
    }

    fn delimiter() -> &'static Color {
        &colors::GRAY20
    }

    fn comment() -> &'static Color {
        &colors::GRAY99
    }

    fn item() -> &'static Color {
        &colors::MAGENTA
    }

    fn known() -> &'static Color {
        &colors::PURPLE
    }

    fn annotation() -> &'static Color {
        &colors::BLUE
    }

    fn special() -> &'static Color {
        &colors::RED
    }
}

pub mod colors {
    //! IBM inspired colors.

    use super::Color;

    pub const WHITE: Color = Color::from_rgb(0xff, 0xff, 0xff);
    pub const BLUE: Color = Color::from_rgb(0x0f, 0x62, 0xfe);
    pub const MAGENTA: Color = Color::from_rgb(0xf5, 0x12, 0x81);
    pub const RED: Color = Color::from_rgb(0xff, 0x00, 0x0b);
    pub const PURPLE: Color = Color::from_rgb(0x89, 0x1f, 0xff);
    pub const GRAY20: Color = Color::from_rgb(0x20, 0x20, 0x20);
    pub const GRAY40: Color = Color::from_rgb(0x40, 0x40, 0x40);
    pub const GRAY99: Color = Color::from_rgb(0x99, 0x99, 0x99);
}

/// A piece of demangled text and the color it's printed in.
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'txt> {
    pub text: Cow<'txt, str>,
    pub color: &'static Color,
}

impl<'txt> Token<'txt> {
    pub fn from_string(text: String, color: &'static Color) -> Self {
        Self {
            text: Cow::Owned(text),
            color,
        }
    }

    pub fn from_str(text: &'static str, color: &'static Color) -> Self {
        Self {
            text: Cow::Borrowed(text),
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_distinct() {
        let all = [
            Colors::spacing(),
            Colors::brackets(),
            Colors::delimiter(),
            Colors::comment(),
            Colors::item(),
            Colors::known(),
            Colors::annotation(),
            Colors::special(),
        ];

        for (idx, a) in all.iter().enumerate() {
            for b in &all[idx + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn tokens_keep_their_text() {
        let owned = Token::from_string("vector".to_string(), Colors::item());
        let borrowed = Token::from_str("vector", Colors::item());

        assert_eq!(owned, borrowed);
        assert_eq!(&owned.text[..], "vector");
    }
}
