use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Fixed-point decimal with 18 decimal places, stored as a scaled integer.
///
/// Every finite `f64` whose shortest decimal form has at most 18 fractional
/// digits converts exactly, so amounts read from a document are written back
/// unchanged. Arithmetic saturates instead of overflowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Amount(i128);

impl Amount {
    const DECIMALS: usize = 18;
    const SCALE: i128 = 1_000_000_000_000_000_000;

    pub const ZERO: Amount = Amount(0);

    /// Exact conversion. `None` for NaN, infinities, magnitudes beyond the
    /// scaled range and values with more than 18 decimals.
    pub fn try_from_float(value: f64) -> Option<Self> {
        Self::parse_float(value, false)
    }

    pub fn from_whole(value: i64) -> Self {
        Amount(i128::from(value) * Self::SCALE)
    }

    pub fn to_f64(self) -> f64 {
        // our own decimal rendering always parses
        self.to_string().parse().unwrap_or_default()
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// `self * percent / 100`, truncated to the last decimal.
    pub fn percent(self, percent: u32) -> Self {
        let percent = i128::from(percent);
        let hundredths = (self.0 / 100).saturating_mul(percent);
        Amount(hundredths.saturating_add(self.0 % 100 * percent / 100))
    }

    /// French rendering as used in operator messages: narrow no-break space
    /// between thousands, decimal comma, at most three decimals.
    pub fn to_fr_string(self) -> String {
        const MILLI: u128 = (Amount::SCALE / 1_000) as u128;

        let abs = self.0.unsigned_abs();
        let thousandths = abs / MILLI + u128::from(abs % MILLI >= MILLI / 2);
        let whole = (thousandths / 1_000).to_string();
        let frac = thousandths % 1_000;

        let mut out = String::new();
        if self.0 < 0 && thousandths > 0 {
            out.push('-');
        }
        for (i, digit) in whole.chars().enumerate() {
            if i > 0 && (whole.len() - i) % 3 == 0 {
                out.push('\u{202f}');
            }
            out.push(digit);
        }
        if frac > 0 {
            out.push(',');
            out.push_str(format!("{frac:03}").trim_end_matches('0'));
        }
        out
    }

    /// `truncate` drops digits past the last decimal instead of rejecting.
    fn parse_float(value: f64, truncate: bool) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }

        // shortest round-trip form, never in exponent notation
        let text = value.abs().to_string();
        let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), ""));
        if frac.len() > Self::DECIMALS && !truncate {
            return None;
        }
        let frac = &frac[..frac.len().min(Self::DECIMALS)];

        let whole: i128 = whole.parse().ok()?;
        let mut scaled = whole.checked_mul(Self::SCALE)?;
        if !frac.is_empty() {
            let digits: i128 = frac.parse().ok()?;
            let shift = 10i128.pow((Self::DECIMALS - frac.len()) as u32);
            scaled = scaled.checked_add(digits * shift)?;
        }

        Some(Amount(if value < 0.0 { -scaled } else { scaled }))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let scale = Self::SCALE as u128;
        let whole = abs / scale;
        let frac = abs % scale;
        if frac == 0 {
            return write!(f, "{sign}{whole}");
        }
        let digits = format!("{frac:018}");
        write!(f, "{sign}{whole}.{}", digits.trim_end_matches('0'))
    }
}

// Whole amounts go out as JSON integers so documents written by other
// clients survive a load/save cycle unchanged.
impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.0 % Self::SCALE == 0 {
            if let Ok(whole) = i64::try_from(self.0 / Self::SCALE) {
                return serializer.serialize_i64(whole);
            }
        }
        serializer.serialize_f64(self.to_f64())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        // digits past the last decimal are not worth losing a document over
        Amount::parse_float(value, true)
            .ok_or_else(|| serde::de::Error::custom("amount must be a finite number in range"))
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_add(rhs.0))
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0.saturating_sub(rhs.0))
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl std::iter::Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Amount::ZERO, |acc, a| acc + a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amount(value: f64) -> Amount {
        Amount::try_from_float(value).unwrap()
    }

    #[test]
    fn try_from_float_is_exact() {
        assert_eq!(amount(100.0), Amount::from_whole(100));
        assert_eq!(amount(1.5), Amount(1_500_000_000_000_000_000));
        assert_eq!(amount(0.0001), Amount(100_000_000_000_000));
        assert_eq!(amount(3.00004), Amount(3_000_040_000_000_000_000));
        assert_eq!(amount(0.1) + amount(0.2), amount(0.3));
    }

    #[test]
    fn try_from_float_rejects_non_finite() {
        assert_eq!(Amount::try_from_float(f64::NAN), None);
        assert_eq!(Amount::try_from_float(f64::INFINITY), None);
        assert_eq!(Amount::try_from_float(f64::NEG_INFINITY), None);
        assert_eq!(Amount::try_from_float(3.0), Some(Amount::from_whole(3)));
    }

    #[test]
    fn try_from_float_rejects_out_of_range() {
        assert!(Amount::try_from_float(1e20).is_some());
        assert_eq!(Amount::try_from_float(1e21), None);
        assert_eq!(Amount::try_from_float(-1e21), None);
        assert_eq!(Amount::try_from_float(f64::MAX), None);
    }

    #[test]
    fn try_from_float_rejects_excess_decimals() {
        assert!(Amount::try_from_float(1e-18).is_some());
        assert_eq!(Amount::try_from_float(1e-19), None);
    }

    #[test]
    fn display_trims_trailing_zeros() {
        assert_eq!(Amount::from_whole(50_000).to_string(), "50000");
        assert_eq!(amount(1.5).to_string(), "1.5");
        assert_eq!(amount(0.0001).to_string(), "0.0001");
        assert_eq!(amount(12.345678).to_string(), "12.345678");
        assert_eq!(Amount::ZERO.to_string(), "0");
    }

    #[test]
    fn display_formats_negative() {
        assert_eq!(amount(-50.25).to_string(), "-50.25");
        assert_eq!(amount(-0.0001).to_string(), "-0.0001");
    }

    #[test]
    fn french_rendering_groups_thousands() {
        assert_eq!(Amount::from_whole(50_000).to_fr_string(), "50\u{202f}000");
        assert_eq!(amount(1_234_567.891).to_fr_string(), "1\u{202f}234\u{202f}567,891");
        assert_eq!(amount(12.5).to_fr_string(), "12,5");
        assert_eq!(Amount::from_whole(999).to_fr_string(), "999");
        assert_eq!(amount(-1_000.25).to_fr_string(), "-1\u{202f}000,25");
    }

    #[test]
    fn french_rendering_rounds_to_three_decimals() {
        assert_eq!(amount(2.0005).to_fr_string(), "2,001");
        assert_eq!(amount(2.0004).to_fr_string(), "2");
        assert_eq!(amount(0.0004).to_fr_string(), "0");
        assert_eq!(amount(9_999.9999).to_fr_string(), "10\u{202f}000");
    }

    #[test]
    fn percent_of_amount() {
        assert_eq!(Amount::from_whole(100).percent(5), Amount::from_whole(5));
        assert_eq!(amount(12.5).percent(5), amount(0.625));
        // below the last decimal is dropped
        assert_eq!(Amount(1).percent(5), Amount::ZERO);
    }

    #[test]
    fn percent_of_largest_amount_does_not_overflow() {
        let max = amount(1e20);
        assert_eq!(max.percent(5), amount(5e18));
        assert_eq!(Amount(i128::MAX).percent(100), Amount(i128::MAX));
        assert_eq!(Amount(i128::MAX).percent(1_000), Amount(i128::MAX));
    }

    #[test]
    fn arithmetic() {
        let mut a = Amount(100);
        a += Amount(50);
        assert_eq!(a, Amount(150));
        a -= Amount(30);
        assert_eq!(a, Amount(120));
        assert_eq!(a - Amount(200), Amount(-80));
    }

    #[test]
    fn arithmetic_saturates() {
        let big = amount(1e20);
        let total: Amount = std::iter::repeat_n(big, 10).sum();
        assert_eq!(total, Amount(i128::MAX));
        assert_eq!(Amount(i128::MIN) - big, Amount(i128::MIN));
    }

    #[test]
    fn sum_of_amounts() {
        let total: Amount = [1.5, 2.25, 3.0].into_iter().map(amount).sum();
        assert_eq!(total, amount(6.75));
    }

    #[test]
    fn serializes_whole_amounts_as_integers() {
        assert_eq!(serde_json::to_string(&Amount::from_whole(50_000)).unwrap(), "50000");
        assert_eq!(serde_json::to_string(&amount(2.5)).unwrap(), "2.5");
    }

    #[test]
    fn serialization_keeps_every_stored_digit() {
        for raw in ["12.345678", "0.30000000000000004", "1234.56789012", "0.1"] {
            let parsed: Amount = serde_json::from_str(raw).unwrap();
            assert_eq!(serde_json::to_string(&parsed).unwrap(), raw);
        }
    }

    #[test]
    fn deserializes_integers_and_floats() {
        let whole: Amount = serde_json::from_str("10").unwrap();
        let frac: Amount = serde_json::from_str("0.75").unwrap();
        assert_eq!(whole, Amount::from_whole(10));
        assert_eq!(frac, amount(0.75));
    }

    #[test]
    fn deserialization_truncates_excess_decimals() {
        let tiny: Amount = serde_json::from_str("1e-20").unwrap();
        assert_eq!(tiny, Amount::ZERO);
        assert!(serde_json::from_str::<Amount>("1e300").is_err());
    }

    #[test]
    fn ordering() {
        assert!(amount(3.01) > Amount::from_whole(3));
        assert!(amount(3.00004) > Amount::from_whole(3));
        assert!(Amount(-1) < Amount::ZERO);
    }
}
