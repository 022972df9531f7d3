//! Recovery time codec.
//!
//! Recovery is entered as `[M]MSS` or `M:SS`. The last two decimal digits are
//! seconds and the remaining digits are minutes, so `345` reads as 3:45. This
//! is positional, not base-60 arithmetic on a raw second count.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::{Display, Formatter};

static RECOVERY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d*):?(\d*)$").expect("valid recovery regex"));

/// Glyph rendered for an unknown recovery, distinct from `0:00`.
pub const UNKNOWN_RECOVERY_GLYPH: &str = "—";

/// Parses free-text recovery into whole seconds.
///
/// Returns `None` for empty or non-numeric input, and for values that do
/// not fit the seconds range.
pub fn parse_recovery(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    let captures = RECOVERY_RE.captures(trimmed)?;
    let digits = format!(
        "{}{}",
        captures.get(1).map_or("", |m| m.as_str()),
        captures.get(2).map_or("", |m| m.as_str())
    );
    if digits.is_empty() {
        return None;
    }

    let value: u32 = digits.parse().ok()?;
    let minutes = value / 100;
    let seconds = value % 100;
    minutes.checked_mul(60)?.checked_add(seconds)
}

/// Formats whole seconds as `M:SS`.
pub fn format_recovery(seconds: Option<u32>) -> Option<String> {
    seconds.map(|total| format!("{}:{:02}", total / 60, total % 60))
}

/// Display wrapper rendering a missing recovery as [`UNKNOWN_RECOVERY_GLYPH`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoveryDisplay(pub Option<u32>);

impl Display for RecoveryDisplay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match format_recovery(self.0) {
            Some(text) => f.write_str(&text),
            None => f.write_str(UNKNOWN_RECOVERY_GLYPH),
        }
    }
}
