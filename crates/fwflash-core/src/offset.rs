//! Flash offsets
//!
//! Offsets show up in two places: the partition table, where any integer
//! notation is accepted (`0x290000`, `2686976`, `0o12200000`), and on the
//! command line, where the user must give a `0x`-prefixed hex address. Both
//! render back out the same way, as lowercase `0x` hex without padding.

use std::fmt;
use std::str::FromStr;

/// A flash address
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FlashOffset(pub u32);

impl FlashOffset {
    /// Parse an integer with base auto-detection
    ///
    /// Accepts `0x`, `0o` and `0b` prefixes (any case) and plain decimal.
    /// Single underscores between digits are allowed. A decimal literal with
    /// a leading zero (`0100`) is ambiguous and rejected.
    pub fn parse_auto(s: &str) -> Result<Self, String> {
        let s = s.trim();
        let s = s.strip_prefix('+').unwrap_or(s);
        if s.is_empty() {
            return Err("empty offset".to_string());
        }

        let lower = s.to_ascii_lowercase();
        let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
            (rest, 16)
        } else if let Some(rest) = lower.strip_prefix("0o") {
            (rest, 8)
        } else if let Some(rest) = lower.strip_prefix("0b") {
            (rest, 2)
        } else {
            (lower.as_str(), 10)
        };

        let digits = strip_underscores(digits).ok_or_else(|| format!("invalid offset: {}", s))?;
        if digits.is_empty() || digits.starts_with(['+', '-']) {
            return Err(format!("invalid offset: {}", s));
        }
        let leading_zero = digits.len() > 1 && digits.starts_with('0');
        if radix == 10 && leading_zero && digits.bytes().any(|b| b != b'0') {
            return Err(format!("invalid offset (leading zero): {}", s));
        }

        u32::from_str_radix(&digits, radix)
            .map(FlashOffset)
            .map_err(|e| format!("invalid offset {}: {}", s, e))
    }

    /// Parse a user-supplied offset, which must carry the `0x` prefix
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix("0x")?;
        if hex.starts_with(['+', '-']) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(FlashOffset)
    }

    /// The raw address
    pub fn value(self) -> u32 {
        self.0
    }
}

/// Remove single underscores between digits; `None` for misplaced ones
fn strip_underscores(digits: &str) -> Option<String> {
    if !digits.contains('_') {
        return Some(digits.to_string());
    }
    if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
        return None;
    }
    Some(digits.replace('_', ""))
}

impl fmt::Display for FlashOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for FlashOffset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_auto(s)
    }
}

impl From<u32> for FlashOffset {
    fn from(value: u32) -> Self {
        FlashOffset(value)
    }
}
