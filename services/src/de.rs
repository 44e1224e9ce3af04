use std::{
    fmt,
    marker::PhantomData,
};

use serde::{
    de::{
        Error,
        SeqAccess,
        Visitor,
    },
    Deserialize,
};
use time::OffsetDateTime;
use tracing::warn;


/// Sui encodes most 64 bit numbers as strings, but not all of them
pub fn u64_from_str_or_num<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Num(u64),
        Str(String),
    }

    match Raw::deserialize(de)? {
        Raw::Num(n) => Ok(n),
        Raw::Str(s) => s.parse().map_err(Error::custom),
    }
}

pub fn opt_u64_from_str_or_num<'de, D>(de: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Wrap(#[serde(deserialize_with = "u64_from_str_or_num")] u64);

    Option::<Wrap>::deserialize(de).map(|o| o.map(|Wrap(n)| n))
}

pub fn datetime_from_ms(ms: u64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()
}


struct GoodVisitor<T>(PhantomData<fn() -> T>);
impl<'de, T: Deserialize<'de>> Visitor<'de> for GoodVisitor<T> {
    type Value = Vec<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result { formatter.write_str("a sequence") }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut values = Vec::with_capacity(seq.size_hint().unwrap_or_default());
        loop {
            match seq.next_element() {
                Ok(Some(value)) => values.push(value),
                Ok(None) => break,
                Err(e) => warn!("Skipping malformed entry: {e:#}"),
            }
        }
        Ok(values)
    }
}

/// Deserializes a sequence, dropping entries that fail to parse instead of failing the whole page
pub fn vec_skip_errors<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    de.deserialize_seq(GoodVisitor(PhantomData))
}
