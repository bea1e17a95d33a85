//! Coloured terminal output.
//!
//! Colours are plain ANSI escape sequences so output stays readable when
//! piped into log collectors that understand them.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::level::LogLevel;

/// Sequence that ends a coloured span.
pub const RESET: &str = "\x1b[00m";

/// A terminal foreground colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Color {
    /// Bright white.
    #[default]
    White,
    /// Bright green.
    Green,
    /// Bright red.
    Red,
    /// Bright blue.
    Blue,
    /// Bright yellow.
    Yellow,
    /// Bright magenta.
    Magenta,
    /// Bright cyan.
    Cyan,
    /// 256-colour orange, used for warnings.
    Orange,
}

impl Color {
    /// Colours selectable by name.
    pub const NAMED: [Color; 7] = [
        Self::White,
        Self::Green,
        Self::Red,
        Self::Blue,
        Self::Yellow,
        Self::Magenta,
        Self::Cyan,
    ];

    /// The escape sequence that starts this colour.
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Self::White => "\x1b[97m",
            Self::Green => "\x1b[92m",
            Self::Red => "\x1b[91m",
            Self::Blue => "\x1b[94m",
            Self::Yellow => "\x1b[93m",
            Self::Magenta => "\x1b[95m",
            Self::Cyan => "\x1b[96m",
            Self::Orange => "\x1b[38;5;208m",
        }
    }

    /// Lowercase colour name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Green => "green",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Yellow => "yellow",
            Self::Magenta => "magenta",
            Self::Cyan => "cyan",
            Self::Orange => "orange",
        }
    }

    /// Colour used for console records at `level`, if any.
    #[must_use]
    pub fn for_level(level: LogLevel) -> Option<Self> {
        match level {
            LogLevel::Warning => Some(Self::Orange),
            LogLevel::Error | LogLevel::Critical => Some(Self::Red),
            LogLevel::Info => Some(Self::Green),
            LogLevel::Debug | LogLevel::None => None,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Color {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::NAMED
            .into_iter()
            .find(|color| color.name() == s)
            .ok_or_else(|| Error::InvalidColor {
                color: s.to_string(),
            })
    }
}

/// Wrap `message` in the escape sequences for `color`.
#[must_use]
pub fn colorize(message: impl fmt::Display, color: Color) -> String {
    format!("{}{message}{RESET}", color.code())
}

/// Print `message` to stdout in the named colour.
///
/// # Errors
///
/// Returns [`Error::InvalidColor`] if `color` is not one of the named colours.
pub fn print_in_color(message: impl fmt::Display, color: &str) -> Result<()> {
    let color: Color = color.parse()?;
    println!("{}", colorize(message, color));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_colorize_wraps_message() {
        assert_eq!(colorize("done", Color::Green), "\x1b[92mdone\x1b[00m");
        assert_eq!(colorize(42, Color::Cyan), "\x1b[96m42\x1b[00m");
    }

    #[test]
    fn test_parse_named_colors() {
        for color in Color::NAMED {
            assert_eq!(color.name().parse::<Color>().unwrap(), color);
        }
    }

    #[test]
    fn test_orange_is_not_selectable_by_name() {
        assert!("orange".parse::<Color>().is_err());
    }

    #[test]
    fn test_print_in_color_rejects_unknown_color() {
        let err = print_in_color("hello", "purple").unwrap_err();
        assert!(matches!(err, Error::InvalidColor { .. }));
    }

    #[test]
    fn test_print_in_color_accepts_known_color() {
        assert!(print_in_color("hello", "yellow").is_ok());
    }

    #[test]
    fn test_level_colors() {
        assert_eq!(Color::for_level(LogLevel::Warning), Some(Color::Orange));
        assert_eq!(Color::for_level(LogLevel::Critical), Some(Color::Red));
        assert_eq!(Color::for_level(LogLevel::Info), Some(Color::Green));
        assert_eq!(Color::for_level(LogLevel::Debug), None);
    }
}
