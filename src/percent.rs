//! Percentages written as `"<digits>%"`.

use std::str::FromStr;

use crate::errors::Error;

/// A whole-number percentage such as `"42%"`.
///
/// Values above 100 are accepted; callers clamp if they need to.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Percent {
    pub(crate) value: u32,
}

impl Percent {
    pub fn value(&self) -> u32 {
        self.value
    }

    /// The percentage as a fraction, `"42%"` becomes `0.42`.
    pub fn unit_interval(&self) -> f64 {
        f64::from(self.value) / 100.0
    }

    /// Returns None unless `s` is digits followed by `%`.
    ///
    /// # Examples
    ///
    /// ```
    /// use hue_bridge::Percent;
    ///
    /// assert_eq!(Percent::parse("42%").map(|p| p.unit_interval()), Some(0.42));
    /// assert!(Percent::parse("42").is_none());
    /// assert!(Percent::parse("-5%").is_none());
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        let digits = s.trim().strip_suffix('%')?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok().map(|value| Percent { value })
    }
}

impl FromStr for Percent {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        Self::parse(s).ok_or_else(|| Error::InvalidPercent(s.to_string()))
    }
}
