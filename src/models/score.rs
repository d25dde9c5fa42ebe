//! Enrollment score: a decimal in `[0, 100]` with at most two fractional digits.
//!
//! Stored as an integer count of hundredths so no floating point rounding ever
//! touches a grade.

use serde::{Serialize, Serializer};
use std::fmt;

pub const MAX_HUNDREDTHS: i64 = 10_000;

pub const NOT_A_NUMBER: &str = "Enter a number.";
pub const TOO_MANY_DECIMALS: &str = "Ensure that there are no more than 2 decimal places.";
pub const BELOW_MIN: &str = "Ensure this value is greater than or equal to 0.";
pub const ABOVE_MAX: &str = "Ensure this value is less than or equal to 100.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, sqlx::Type)]
#[sqlx(transparent)]
pub struct Score(i64);

impl Score {
    pub fn from_hundredths(hundredths: i64) -> Option<Self> {
        (0..=MAX_HUNDREDTHS)
            .contains(&hundredths)
            .then_some(Self(hundredths))
    }

    pub fn hundredths(self) -> i64 {
        self.0
    }

    /// Parse a submitted score.
    ///
    /// Extra fractional digits are rejected outright, never truncated or
    /// rounded: `"50.999"` is an error.
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        let s = raw.trim();
        let (negative, unsigned) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        let (int_part, frac_part) = unsigned.split_once('.').unwrap_or((unsigned, ""));

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(NOT_A_NUMBER);
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(NOT_A_NUMBER);
        }
        if frac_part.len() > 2 {
            return Err(TOO_MANY_DECIMALS);
        }

        let int_digits = int_part.trim_start_matches('0');
        if int_digits.len() > 3 {
            return Err(if negative { BELOW_MIN } else { ABOVE_MAX });
        }
        let whole: i64 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| NOT_A_NUMBER)?
        };
        let frac: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().map_err(|_| NOT_A_NUMBER)? * 10,
            _ => frac_part.parse().map_err(|_| NOT_A_NUMBER)?,
        };

        let hundredths = whole * 100 + frac;
        if negative && hundredths > 0 {
            return Err(BELOW_MIN);
        }
        Self::from_hundredths(hundredths).ok_or(ABOVE_MAX)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Score {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds_and_two_decimals() {
        assert_eq!(Score::parse("0").unwrap().hundredths(), 0);
        assert_eq!(Score::parse("100").unwrap().hundredths(), 10_000);
        assert_eq!(Score::parse("50.25").unwrap().hundredths(), 5_025);
        assert_eq!(Score::parse("99.5").unwrap().hundredths(), 9_950);
        assert_eq!(Score::parse(" 007.10 ").unwrap().hundredths(), 710);
        assert_eq!(Score::parse(".5").unwrap().hundredths(), 50);
    }

    #[test]
    fn rejects_out_of_range() {
        assert_eq!(Score::parse("-0.01"), Err(BELOW_MIN));
        assert_eq!(Score::parse("100.01"), Err(ABOVE_MAX));
        assert_eq!(Score::parse("1000"), Err(ABOVE_MAX));
        assert_eq!(Score::parse("-5000"), Err(BELOW_MIN));
    }

    #[test]
    fn rejects_extra_precision_without_truncating() {
        assert_eq!(Score::parse("100.123"), Err(TOO_MANY_DECIMALS));
        assert_eq!(Score::parse("50.999"), Err(TOO_MANY_DECIMALS));
    }

    #[test]
    fn rejects_non_numbers() {
        for raw in ["", ".", "abc", "1e2", "5,5", "1.2.3", "--1"] {
            assert_eq!(Score::parse(raw), Err(NOT_A_NUMBER), "input {raw:?}");
        }
    }

    #[test]
    fn displays_two_decimals() {
        assert_eq!(Score::parse("50.2").unwrap().to_string(), "50.20");
        assert_eq!(Score::parse("100").unwrap().to_string(), "100.00");
        assert_eq!(Score::parse("0.05").unwrap().to_string(), "0.05");
    }
}
