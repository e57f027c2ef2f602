//! Human-readable address formatting for log output.

use core::fmt;

/// Wraps an address and formats it as an uppercase hexadecimal value with `0x` prefix
/// and `_` digit separators every 4 digits.
///
/// # Examples
///
/// ```
/// use mmu::HumanAddress;
///
/// assert_eq!(format!("{}", HumanAddress(0x0)), "0x0");
/// assert_eq!(format!("{}", HumanAddress(0x4000)), "0x4000");
/// assert_eq!(format!("{}", HumanAddress(0xF_4008)), "0xF_4008");
/// assert_eq!(format!("{}", HumanAddress(u64::MAX)), "0xFFFF_FFFF_FFFF_FFFF");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct HumanAddress(pub u64);

fn hex_digit(value: u64, index: u32) -> char {
    let digit = ((value >> (index * 4)) & 0xF) as u8;
    if digit < 10 {
        (b'0' + digit) as char
    } else {
        (b'A' + (digit - 10)) as char
    }
}

impl fmt::Display for HumanAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value == 0 {
            return write!(f, "0x0");
        }

        write!(f, "0x")?;

        let bits = u64::BITS - value.leading_zeros();
        let num_digits = bits.div_ceil(4);

        // The first group absorbs the remainder so every later group is exactly 4 wide.
        let leading = match num_digits % 4 {
            0 => 4,
            n => n,
        };

        for i in (0..num_digits).rev() {
            let written = num_digits - 1 - i;
            if written >= leading && (written - leading) % 4 == 0 {
                write!(f, "_")?;
            }
            write!(f, "{}", hex_digit(value, i))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_zero() {
        assert_eq!(format!("{}", HumanAddress(0x0)), "0x0");
    }

    #[test]
    fn formats_short_values_without_separators() {
        assert_eq!(format!("{}", HumanAddress(0x8)), "0x8");
        assert_eq!(format!("{}", HumanAddress(0xFFF)), "0xFFF");
        assert_eq!(format!("{}", HumanAddress(0x4000)), "0x4000");
    }

    #[test]
    fn formats_with_separators() {
        assert_eq!(format!("{}", HumanAddress(0xF_4000)), "0xF_4000");
        assert_eq!(format!("{}", HumanAddress(0x12_3456)), "0x12_3456");
        assert_eq!(format!("{}", HumanAddress(0xDEAD_BEEF)), "0xDEAD_BEEF");
        assert_eq!(
            format!("{}", HumanAddress(0x1_2345_6789_ABCD)),
            "0x1_2345_6789_ABCD"
        );
    }

    #[test]
    fn formats_invalid_sentinel() {
        assert_eq!(
            format!("{}", HumanAddress(u64::MAX)),
            "0xFFFF_FFFF_FFFF_FFFF"
        );
    }
}
