// Object states as reported in the `state` and `state_type` attributes.

use serde::{Deserialize, Deserializer};
use strum::Display;

use super::de::int_like;

/// Current state of a Host object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum HostState {
    #[default]
    Up,
    Down,
    Unreachable,
}

impl TryFrom<i64> for HostState {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Up),
            1 => Ok(Self::Down),
            2 => Ok(Self::Unreachable),
            other => Err(format!("invalid host state {other}")),
        }
    }
}

/// Current state of a Service object.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum ServiceState {
    #[default]
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl TryFrom<i64> for ServiceState {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ok),
            1 => Ok(Self::Warning),
            2 => Ok(Self::Critical),
            3 => Ok(Self::Unknown),
            other => Err(format!("invalid service state {other}")),
        }
    }
}

/// Whether a state is transient (soft) or confirmed after retries (hard).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display)]
pub enum StateType {
    #[default]
    Soft,
    Hard,
}

impl TryFrom<i64> for StateType {
    type Error = String;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Soft),
            1 => Ok(Self::Hard),
            other => Err(format!("invalid state type {other}")),
        }
    }
}

macro_rules! deserialize_from_int {
    ($($ty:ty),+) => {$(
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let raw = int_like(d)?;
                Self::try_from(raw).map_err(serde::de::Error::custom)
            }
        }
    )+};
}

deserialize_from_int!(HostState, ServiceState, StateType);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_decode_from_floats() {
        let state: HostState = serde_json::from_str("1.0").unwrap_or_default();
        assert_eq!(state, HostState::Down);
        let state: ServiceState = serde_json::from_str("3").unwrap_or_default();
        assert_eq!(state, ServiceState::Unknown);
        let kind: StateType = serde_json::from_str("1.0").unwrap_or_default();
        assert_eq!(kind, StateType::Hard);
    }

    #[test]
    fn out_of_range_state_is_an_error() {
        assert!(serde_json::from_str::<ServiceState>("4").is_err());
        assert!(serde_json::from_str::<StateType>("2.0").is_err());
    }

    #[test]
    fn display_names() {
        assert_eq!(HostState::Unreachable.to_string(), "Unreachable");
        assert_eq!(ServiceState::Critical.to_string(), "Critical");
        assert_eq!(StateType::Hard.to_string(), "Hard");
    }
}
