use std::{
    fmt,
    str::FromStr,
};

use serde::{
    de::Error as _,
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

pub const ADDRESS_LENGTH: usize = 32;

/// A 32 byte account address or object id
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

/// Objects and accounts share the same id space
pub type ObjectId = Address;

impl Address {
    pub const ZERO: Self = Self([0; ADDRESS_LENGTH]);
    pub const FRAMEWORK: Self = Self::from_low_byte(0x2);
    pub const CLOCK: Self = Self::from_low_byte(0x6);

    const fn from_low_byte(b: u8) -> Self {
        let mut bytes = [0; ADDRESS_LENGTH];
        bytes[ADDRESS_LENGTH - 1] = b;
        Self(bytes)
    }

    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self { Self(bytes) }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] { &self.0 }

    /// `0x1234...abcd`
    pub fn short(&self) -> String { truncate(&self.to_string(), 6, 4) }

    /// `0x123456...abcdef`, used for object ids
    pub fn short_id(&self) -> String { truncate(&self.to_string(), 8, 6) }
}

impl TryFrom<&[u8]> for Address {
    type Error = AddressParseError;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        <[u8; ADDRESS_LENGTH]>::try_from(value)
            .map(Self)
            .map_err(|_| AddressParseError(format!("expected {ADDRESS_LENGTH} bytes, got {}", value.len())))
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        if digits.is_empty() || digits.len() > ADDRESS_LENGTH * 2 {
            return Err(AddressParseError(s.to_owned()));
        }

        let padded = format!("{digits:0>width$}", width = ADDRESS_LENGTH * 2);
        let mut bytes = [0; ADDRESS_LENGTH];
        hex::decode_to_slice(padded, &mut bytes).map_err(|_| AddressParseError(s.to_owned()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "0x{}", hex::encode(self.0)) }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(self, f) }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if serializer.is_human_readable() {
            serializer.collect_str(self)
        } else {
            self.0.serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(de: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        if de.is_human_readable() {
            let s = String::deserialize(de)?;
            s.parse().map_err(D::Error::custom)
        } else {
            <[u8; ADDRESS_LENGTH]>::deserialize(de).map(Self)
        }
    }
}


#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParseError(String);

impl fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Invalid address: {}", self.0) }
}

impl std::error::Error for AddressParseError {}


/// Keep the first `head` and last `tail` characters of `s`, joined with `...`
pub fn truncate(s: &str, head: usize, tail: usize) -> String {
    let chars: Vec<char> = s.chars().collect();
    if chars.len() <= head + tail {
        return s.to_owned();
    }
    let start: String = chars[..head].iter().collect();
    let end: String = chars[chars.len() - tail..].iter().collect();
    format!("{start}...{end}")
}
