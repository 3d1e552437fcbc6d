use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::check_result::string_or_null;
use super::de::{epoch_seconds, flag};
use super::{CheckResult, ConfigObject, CreateBody, HostState, Object, StateType};
use crate::error::Error;

/// A Host object.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Host {
    pub name: String,
    /// IPv4 address or resolvable name.
    pub address: String,
    pub address6: String,
    pub groups: Vec<String>,
    pub state: HostState,
    pub state_type: StateType,
    pub check_command: String,
    pub display_name: String,
    pub last_check: Option<DateTime<Utc>>,
    pub last_check_result: Option<CheckResult>,
    pub acknowledgement: bool,
    pub notes: String,
}

/// Attributes accepted when creating a Host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostCreateAttrs<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    pub address: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub address6: &'a str,
    pub check_command: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub display_name: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub groups: &'a [String],
    #[serde(skip_serializing_if = "str::is_empty")]
    pub notes: &'a str,
}

// Wire shape of a Host's `attrs` as returned by the API.
#[derive(Deserialize)]
struct HostAttrs {
    #[serde(default, rename = "__name")]
    full_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_null")]
    address: String,
    #[serde(default, deserialize_with = "string_or_null")]
    address6: String,
    #[serde(default)]
    groups: Option<Vec<String>>,
    #[serde(default)]
    state: HostState,
    #[serde(default)]
    state_type: StateType,
    #[serde(default, deserialize_with = "string_or_null")]
    check_command: String,
    #[serde(default, deserialize_with = "string_or_null")]
    display_name: String,
    #[serde(default, deserialize_with = "epoch_seconds")]
    last_check: Option<DateTime<Utc>>,
    #[serde(default)]
    last_check_result: Option<CheckResult>,
    #[serde(default, deserialize_with = "flag")]
    acknowledgement: bool,
    #[serde(default, deserialize_with = "string_or_null")]
    notes: String,
}

impl ConfigObject for Host {
    const TYPE: &'static str = "Host";
    const COLLECTION: &'static str = "hosts";

    type CreateAttrs<'a> = HostCreateAttrs<'a>;

    fn name(&self) -> &str {
        &self.name
    }

    fn create_projection(&self) -> CreateBody<HostCreateAttrs<'_>> {
        CreateBody {
            attrs: HostCreateAttrs {
                address: &self.address,
                address6: &self.address6,
                check_command: &self.check_command,
                display_name: &self.display_name,
                groups: &self.groups,
                notes: &self.notes,
            },
        }
    }

    fn read_projection(name: &str, attrs: Value) -> Result<Self, Error> {
        let a: HostAttrs = super::decode_attrs(Self::TYPE, name, attrs)?;
        Ok(Self {
            name: super::full_name(name, a.full_name),
            address: a.address,
            address6: a.address6,
            groups: a.groups.unwrap_or_default(),
            state: a.state,
            state_type: a.state_type,
            check_command: a.check_command,
            display_name: a.display_name,
            last_check: a.last_check,
            last_check_result: a.last_check_result,
            acknowledgement: a.acknowledgement,
            notes: a.notes,
        })
    }

    fn into_object(self) -> Object {
        Object::Host(self)
    }

    fn from_object(object: Object) -> Option<Self> {
        match object {
            Object::Host(h) => Some(h),
            _ => None,
        }
    }
}
