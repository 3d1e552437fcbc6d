// Tolerant decoders for Icinga2 attribute encodings.
//
// Icinga2 reports integer-like values (states, acknowledgement) as either
// plain integers or floats (`0.0`), and timestamps as fractional epoch
// seconds where `0` or `-1` mean "never".

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer, Visitor};

struct IntLike;

impl Visitor<'_> for IntLike {
    type Value = i64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an integer or integral floating-point number")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<i64, E> {
        Ok(i64::from(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<i64, E> {
        Ok(v)
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<i64, E> {
        i64::try_from(v).map_err(|_| E::custom(format!("integer {v} out of range")))
    }

    #[allow(clippy::as_conversions, clippy::cast_possible_truncation)]
    fn visit_f64<E: de::Error>(self, v: f64) -> Result<i64, E> {
        // 2^63: i64::MAX is not exactly representable, so the upper bound is exclusive.
        const LIMIT: f64 = 9_223_372_036_854_775_808.0;
        if v.is_finite() && v.fract() == 0.0 && (-LIMIT..LIMIT).contains(&v) {
            Ok(v as i64)
        } else {
            Err(E::custom(format!("{v} is not an integral number")))
        }
    }
}

struct Optional<V>(V);

impl<'de, V> Visitor<'de> for Optional<V>
where
    V: Visitor<'de>,
{
    type Value = Option<V::Value>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.expecting(f)?;
        f.write_str(" or null")
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Self::Value, D::Error> {
        d.deserialize_any(self.0).map(Some)
    }
}

/// Integer-like value, accepting `2`, `2.0` and booleans. Null is rejected.
pub(crate) fn int_like<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    d.deserialize_any(IntLike)
}

/// Tri-state integer flag collapsed to a boolean: true iff non-zero.
/// Null and absent values are `false`.
pub(crate) fn flag<'de, D: Deserializer<'de>>(d: D) -> Result<bool, D::Error> {
    let value = d.deserialize_option(Optional(IntLike))?;
    Ok(value.is_some_and(|v| v != 0))
}

struct EpochSeconds;

impl Visitor<'_> for EpochSeconds {
    type Value = f64;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a timestamp in epoch seconds")
    }

    #[allow(clippy::as_conversions, clippy::cast_precision_loss)]
    fn visit_i64<E: de::Error>(self, v: i64) -> Result<f64, E> {
        Ok(v as f64)
    }

    #[allow(clippy::as_conversions, clippy::cast_precision_loss)]
    fn visit_u64<E: de::Error>(self, v: u64) -> Result<f64, E> {
        Ok(v as f64)
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<f64, E> {
        Ok(v)
    }
}

/// Epoch-seconds timestamp. Non-positive values and null mean "never".
pub(crate) fn epoch_seconds<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DateTime<Utc>>, D::Error> {
    let Some(secs) = d.deserialize_option(Optional(EpochSeconds))? else {
        return Ok(None);
    };
    if !secs.is_finite() || secs <= 0.0 {
        return Ok(None);
    }
    from_epoch(secs)
        .map(Some)
        .ok_or_else(|| de::Error::custom(format!("timestamp {secs} out of range")))
}

#[allow(
    clippy::as_conversions,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn from_epoch(secs: f64) -> Option<DateTime<Utc>> {
    let whole = secs.trunc();
    let nanos = ((secs - whole) * 1e9).round().min(999_999_999.0) as u32;
    DateTime::from_timestamp(whole as i64, nanos)
}
