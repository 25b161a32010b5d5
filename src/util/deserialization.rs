use std::fmt;
use serde::{self, de, Deserializer, Deserialize};
use std::str::FromStr;

use crate::plot::hasher::LaneWidth;

/// Accepts the hashing core either as its numeric selector (`0`, `1`, `2`)
/// or by name (`"orig"`, `"sse4"`, `"avx2"`).
pub fn lane_width_from_selector<'de, D>(d: D) -> Result<LaneWidth, D::Error>
    where D: Deserializer<'de> {
    d.deserialize_any(LaneWidthVisitor)
}

struct LaneWidthVisitor;

impl<'de> de::Visitor<'de> for LaneWidthVisitor {
    type Value = LaneWidth;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result
    {
        write!(formatter, "a core selector (0, 1, 2) or name (orig, sse4, avx2)")
    }

    fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where E: de::Error
    {
        LaneWidth::from_selector(v)
            .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where E: de::Error
    {
        if v < 0 {
            return Err(E::invalid_value(de::Unexpected::Signed(v), &self));
        }
        self.visit_u64(v as u64)
    }

    fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where E: de::Error
    {
        LaneWidth::from_str(v).map_err(de::Error::custom)
    }
}

pub fn from_str<'de, T, D>(deserializer: D) -> Result<T, D::Error>
    where
        T: FromStr,
        T::Err: fmt::Display,
        D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    T::from_str(&s).map_err(de::Error::custom)
}
