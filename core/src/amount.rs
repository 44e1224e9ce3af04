use std::fmt;

use serde::{
    Deserialize,
    Serialize,
};

pub const MIST_PER_SUI: u64 = 1_000_000_000;
const SUI_DECIMALS: usize = 9;

/// An amount of SUI in its smallest unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mist(pub u64);

impl Mist {
    pub const ZERO: Self = Self(0);

    /// Parses a decimal SUI amount, flooring anything past 9 decimal places
    pub fn from_sui_str(s: &str) -> Result<Self, AmountParseError> {
        let err = || AmountParseError(s.to_owned());
        let s = s.trim();
        let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(err());
        }
        if !whole.chars().chain(frac.chars()).all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        let whole: u64 = if whole.is_empty() { 0 } else { whole.parse().map_err(|_| err())? };
        let frac_digits = &frac[..frac.len().min(SUI_DECIMALS)];
        let frac: u64 = if frac_digits.is_empty() {
            0
        } else {
            format!("{frac_digits:0<width$}", width = SUI_DECIMALS).parse().map_err(|_| err())?
        };

        whole
            .checked_mul(MIST_PER_SUI)
            .and_then(|m| m.checked_add(frac))
            .map(Self)
            .ok_or_else(err)
    }

    pub fn as_sui(self) -> f64 { self.0 as f64 / MIST_PER_SUI as f64 }

    pub fn is_zero(self) -> bool { self.0 == 0 }

    /// 8 decimal rendering used for reward amounts
    pub fn precise(self) -> impl fmt::Display { format!("{:.8}", self.as_sui()) }
}

impl fmt::Display for Mist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.4}", self.as_sui()) }
}

impl From<u64> for Mist {
    fn from(value: u64) -> Self { Self(value) }
}

impl From<Mist> for u64 {
    fn from(value: Mist) -> Self { value.0 }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmountParseError(String);

impl fmt::Display for AmountParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Invalid SUI amount: {:?}", self.0) }
}

impl std::error::Error for AmountParseError {}
