use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::check_result::string_or_null;
use super::de::{epoch_seconds, flag};
use super::{CheckResult, ConfigObject, CreateBody, Object, ServiceState, StateType};
use crate::error::Error;

/// A Service object.
///
/// Services are identified by the compound name `<host>!<service>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Service {
    pub name: String,
    pub groups: Vec<String>,
    pub state: ServiceState,
    pub state_type: StateType,
    pub check_command: String,
    pub display_name: String,
    pub last_check: Option<DateTime<Utc>>,
    pub last_check_result: Option<CheckResult>,
    pub acknowledgement: bool,
    pub notes: String,
}

impl Service {
    /// Split the compound name into `(host, service)` on the first `!`.
    pub fn split_name(&self) -> Result<(&str, &str), Error> {
        self.name
            .split_once('!')
            .ok_or_else(|| Error::InvalidServiceName {
                name: self.name.clone(),
            })
    }

    /// Name of the Host this service belongs to.
    pub fn host_name(&self) -> Result<&str, Error> {
        self.split_name().map(|(host, _)| host)
    }

    /// Service name without the host part.
    pub fn service_name(&self) -> Result<&str, Error> {
        self.split_name().map(|(_, service)| service)
    }
}

/// Attributes accepted when creating a Service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCreateAttrs<'a> {
    pub check_command: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    pub display_name: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub groups: &'a [String],
    #[serde(skip_serializing_if = "str::is_empty")]
    pub notes: &'a str,
}

#[derive(Deserialize)]
struct ServiceAttrs {
    #[serde(default, rename = "__name")]
    full_name: Option<String>,
    #[serde(default)]
    groups: Option<Vec<String>>,
    #[serde(default)]
    state: ServiceState,
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

impl ConfigObject for Service {
    const TYPE: &'static str = "Service";
    const COLLECTION: &'static str = "services";

    type CreateAttrs<'a> = ServiceCreateAttrs<'a>;

    fn name(&self) -> &str {
        &self.name
    }

    fn create_projection(&self) -> CreateBody<ServiceCreateAttrs<'_>> {
        CreateBody {
            attrs: ServiceCreateAttrs {
                check_command: &self.check_command,
                display_name: &self.display_name,
                groups: &self.groups,
                notes: &self.notes,
            },
        }
    }

    fn read_projection(name: &str, attrs: Value) -> Result<Self, Error> {
        let a: ServiceAttrs = super::decode_attrs(Self::TYPE, name, attrs)?;
        Ok(Self {
            name: super::full_name(name, a.full_name),
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
        Object::Service(self)
    }

    fn from_object(object: Object) -> Option<Self> {
        match object {
            Object::Service(s) => Some(s),
            _ => None,
        }
    }
}
