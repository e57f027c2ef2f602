//! Human-readable sizes for memory regions.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Wraps a size in bytes and formats it as a human-readable value with binary SI prefixes.
///
/// Binary SI prefixes (KiB, MiB, GiB, etc.) are always used, where each unit is 1024 times
/// the previous unit. Values are displayed with up to 2 decimal places, omitting trailing
/// zeros.
///
/// Sizes can also be parsed from strings such as `"32KiB"`, `"4 MB"` or `"8192"`. Decimal
/// spellings (`KB`, `MB`, ...) are read as their binary counterparts, so `"1MB"` is
/// 1048576 bytes.
///
/// # Examples
///
/// ```
/// use mmu::HumanSize;
///
/// assert_eq!(format!("{}", HumanSize(1023)), "1023B");
/// assert_eq!(format!("{}", HumanSize(1536)), "1.5KiB");
/// assert_eq!("32KiB".parse::<HumanSize>(), Ok(HumanSize(32 * 1024)));
/// assert_eq!("128MB".parse::<HumanSize>(), Ok(HumanSize(128 << 20)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct HumanSize(pub u64);

impl HumanSize {
    /// Returns the raw byte count.
    #[inline]
    pub const fn bytes(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HumanSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const THRESHOLD: f64 = 1024.0;

        let bytes = self.0 as f64;

        if bytes < THRESHOLD {
            return write!(f, "{}B", self.0);
        }

        let mut size = bytes;
        let mut unit_index = 0;

        while size >= THRESHOLD && unit_index < UNITS.len() - 1 {
            size /= THRESHOLD;
            unit_index += 1;
        }

        if size as u64 as f64 == size {
            write!(f, "{}{}", size as u64, UNITS[unit_index])
        } else if (size * 10.0) as u64 as f64 == size * 10.0 {
            write!(f, "{:.1}{}", size, UNITS[unit_index])
        } else {
            write!(f, "{:.2}{}", size, UNITS[unit_index])
        }
    }
}

/// Errors produced when parsing a [`HumanSize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseSizeError {
    /// The string had no leading digits.
    #[error("size has no numeric value")]
    MissingValue,
    /// The unit suffix is not a byte unit.
    #[error("unknown size unit (expected B, KiB, MiB, GiB, TiB, PiB or EiB)")]
    UnknownUnit,
    /// The value does not fit in 64 bits once scaled by its unit.
    #[error("size overflows 64 bits")]
    Overflow,
}

/// Returns the power of 1024 for a unit suffix, accepting `K`, `KB` and `KiB` spellings.
fn unit_exponent(unit: &str) -> Option<u32> {
    if unit.is_empty() || unit.eq_ignore_ascii_case("b") {
        return Some(0);
    }

    let mut chars = unit.chars();
    let prefix = chars.next()?.to_ascii_uppercase();
    let rest = chars.as_str();
    if !(rest.is_empty() || rest.eq_ignore_ascii_case("b") || rest.eq_ignore_ascii_case("ib")) {
        return None;
    }

    UNITS
        .iter()
        .skip(1)
        .position(|u| u.starts_with(prefix))
        .map(|index| index as u32 + 1)
}

impl FromStr for HumanSize {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| !(c.is_ascii_digit() || c == '_'))
            .unwrap_or(s.len());
        let (digits, unit) = s.split_at(split);

        let mut value: u64 = 0;
        let mut seen_digit = false;
        for c in digits.chars().filter(|c| *c != '_') {
            let digit = u64::from(c as u8 - b'0');
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add(digit))
                .ok_or(ParseSizeError::Overflow)?;
            seen_digit = true;
        }
        if !seen_digit {
            return Err(ParseSizeError::MissingValue);
        }

        let exponent = unit_exponent(unit.trim()).ok_or(ParseSizeError::UnknownUnit)?;
        1024u64
            .checked_pow(exponent)
            .and_then(|scale| value.checked_mul(scale))
            .map(Self)
            .ok_or(ParseSizeError::Overflow)
    }
}
