use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::check_result::string_or_null;
use super::{ConfigObject, CreateBody, Object};
use crate::error::Error;

/// A User object (a notification recipient, not an ApiUser).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    pub name: String,
    pub email: String,
    pub groups: Vec<String>,
}

/// Attributes accepted when creating a User.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserCreateAttrs<'a> {
    #[serde(skip_serializing_if = "str::is_empty")]
    pub email: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    pub groups: &'a [String],
}

#[derive(Deserialize)]
struct UserAttrs {
    #[serde(default, rename = "__name")]
    full_name: Option<String>,
    #[serde(default, deserialize_with = "string_or_null")]
    email: String,
    #[serde(default)]
    groups: Option<Vec<String>>,
}

impl ConfigObject for User {
    const TYPE: &'static str = "User";
    const COLLECTION: &'static str = "users";

    type CreateAttrs<'a> = UserCreateAttrs<'a>;

    fn name(&self) -> &str {
        &self.name
    }

    fn create_projection(&self) -> CreateBody<UserCreateAttrs<'_>> {
        CreateBody {
            attrs: UserCreateAttrs {
                email: &self.email,
                groups: &self.groups,
            },
        }
    }

    fn read_projection(name: &str, attrs: Value) -> Result<Self, Error> {
        let a: UserAttrs = super::decode_attrs(Self::TYPE, name, attrs)?;
        Ok(Self {
            name: super::full_name(name, a.full_name),
            email: a.email,
            groups: a.groups.unwrap_or_default(),
        })
    }

    fn into_object(self) -> Object {
        Object::User(self)
    }

    fn from_object(object: Object) -> Option<Self> {
        match object {
            Object::User(u) => Some(u),
            _ => None,
        }
    }
}
