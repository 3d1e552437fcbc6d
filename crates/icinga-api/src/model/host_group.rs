use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::check_result::string_or_null;
use super::{ConfigObject, CreateBody, Object};
use crate::error::Error;

/// A HostGroup object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostGroup {
    pub name: String,
    pub display_name: String,
}

/// Attributes accepted when creating a HostGroup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostGroupCreateAttrs<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    pub display_name: &'a str,
}

#[derive(Deserialize)]
struct HostGroupAttrs {
    #[serde(default, rename = "__name")]
    full_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_null")]
    display_name: String,
}

impl ConfigObject for HostGroup {
    const TYPE: &'static str = "HostGroup";
    const COLLECTION: &'static str = "hostgroups";

    type CreateAttrs<'a> = HostGroupCreateAttrs<'a>;

    fn name(&self) -> &str {
        &self.name
    }

    fn create_projection(&self) -> CreateBody<HostGroupCreateAttrs<'_>> {
        CreateBody {
            attrs: HostGroupCreateAttrs {
                display_name: &self.display_name,
            },
        }
    }

    fn read_projection(name: &str, attrs: Value) -> Result<Self, Error> {
        let a: HostGroupAttrs = super::decode_attrs(Self::TYPE, name, attrs)?;
        Ok(Self {
            name: super::full_name(name, a.full_name),
            display_name: a.display_name,
        })
    }

    fn into_object(self) -> Object {
        Object::HostGroup(self)
    }

    fn from_object(object: Object) -> Option<Self> {
        match object {
            Object::HostGroup(g) => Some(g),
            _ => None,
        }
    }
}
