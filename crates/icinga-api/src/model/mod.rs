// Icinga2 configuration object model
//
// Every object variant exposes the same capability set: identity, API path,
// a read projection (every attribute the server reports, derived ones
// included) and a create projection (only the caller-settable attributes,
// wrapped in `{"attrs": {...}}`). The two projections are separate functions
// so the create-payload omission rules stay visible and testable.

mod check_result;
pub(crate) mod de;
mod host;
mod host_group;
mod service;
mod state;
mod user;

use std::collections::HashMap;
use std::sync::OnceLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;
use crate::transport::path_segment;

pub use check_result::CheckResult;
pub use host::{Host, HostCreateAttrs};
pub use host_group::{HostGroup, HostGroupCreateAttrs};
pub use service::{Service, ServiceCreateAttrs};
pub use state::{HostState, ServiceState, StateType};
pub use user::{User, UserCreateAttrs};

/// Body of a create (`PUT`) request: `{"attrs": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateBody<A> {
    pub attrs: A,
}

/// Capability set shared by all configuration object variants.
pub trait ConfigObject: Sized {
    /// Type discriminator as reported in the envelope's `type` field.
    const TYPE: &'static str;

    /// Collection segment of the object path, e.g. `hosts`.
    const COLLECTION: &'static str;

    /// Caller-settable attributes sent on create.
    type CreateAttrs<'a>: Serialize
    where
        Self: 'a;

    /// The object's identity, e.g. `web01` or `web01!http`.
    fn name(&self) -> &str;

    /// The object's API path relative to the version prefix.
    fn path(&self) -> String {
        object_path::<Self>(self.name())
    }

    /// Create projection. Never includes server-derived attributes.
    fn create_projection(&self) -> CreateBody<Self::CreateAttrs<'_>>;

    /// Read projection: decode the `attrs` of a result record named `name`.
    fn read_projection(name: &str, attrs: Value) -> Result<Self, Error>;

    fn into_object(self) -> Object;

    fn from_object(object: Object) -> Option<Self>;
}

/// API path of the object of type `T` named `name`.
pub fn object_path<T: ConfigObject>(name: &str) -> String {
    format!("/objects/{}/{}", T::COLLECTION, path_segment(name))
}

/// API path of the whole collection of type `T`.
pub fn collection_path<T: ConfigObject>() -> String {
    format!("/objects/{}", T::COLLECTION)
}

/// A decoded object of any supported variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Host(Host),
    Service(Service),
    HostGroup(HostGroup),
    User(User),
}

impl Object {
    pub fn name(&self) -> &str {
        match self {
            Self::Host(h) => h.name(),
            Self::Service(s) => s.name(),
            Self::HostGroup(g) => g.name(),
            Self::User(u) => u.name(),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Self::Host(h) => h.path(),
            Self::Service(s) => s.path(),
            Self::HostGroup(g) => g.path(),
            Self::User(u) => u.path(),
        }
    }

    /// The type discriminator of this variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Host(_) => Host::TYPE,
            Self::Service(_) => Service::TYPE,
            Self::HostGroup(_) => HostGroup::TYPE,
            Self::User(_) => User::TYPE,
        }
    }

    /// Create projection of the wrapped variant as JSON.
    pub fn create_projection(&self) -> Result<Value, Error> {
        let body = match self {
            Self::Host(h) => serde_json::to_value(h.create_projection()),
            Self::Service(s) => serde_json::to_value(s.create_projection()),
            Self::HostGroup(g) => serde_json::to_value(g.create_projection()),
            Self::User(u) => serde_json::to_value(u.create_projection()),
        };
        body.map_err(|e| Error::decode(format!("encode {}: {e}", self.name())))
    }
}

// ── Decoder registry ─────────────────────────────────────────────────

/// Decodes the attrs of one result record into an [`Object`].
pub type Decoder = fn(&str, Value) -> Result<Object, Error>;

fn decode_as<T: ConfigObject>(name: &str, attrs: Value) -> Result<Object, Error> {
    T::read_projection(name, attrs).map(ConfigObject::into_object)
}

fn registry() -> &'static HashMap<&'static str, Decoder> {
    static REGISTRY: OnceLock<HashMap<&'static str, Decoder>> = OnceLock::new();
    REGISTRY.get_or_init(|| {
        let mut decoders: HashMap<&'static str, Decoder> = HashMap::new();
        decoders.insert(Host::TYPE, decode_as::<Host>);
        decoders.insert(Service::TYPE, decode_as::<Service>);
        decoders.insert(HostGroup::TYPE, decode_as::<HostGroup>);
        decoders.insert(User::TYPE, decode_as::<User>);
        decoders
    })
}

/// Look up the decoder registered for a type discriminator.
pub fn decoder_for(type_name: &str) -> Option<Decoder> {
    registry().get(type_name).copied()
}

/// Shared helper for read projections: deserialize `attrs` into the
/// variant's wire struct, tagging failures with the object name.
pub(crate) fn decode_attrs<A: DeserializeOwned>(
    type_name: &str,
    name: &str,
    attrs: Value,
) -> Result<A, Error> {
    serde_json::from_value(attrs)
        .map_err(|e| Error::decode(format!("decode {type_name} {name:?}: {e}")))
}

/// Resolve an object's full name: the record name when present, otherwise
/// the `__name` attribute.
pub(crate) fn full_name(record_name: &str, attr_name: Option<String>) -> String {
    if record_name.is_empty() {
        attr_name.unwrap_or_default()
    } else {
        record_name.to_owned()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;

    #[test]
    fn registry_covers_every_variant() {
        for ty in ["Host", "Service", "HostGroup", "User"] {
            assert!(decoder_for(ty).is_some(), "missing decoder for {ty}");
        }
        assert!(decoder_for("Downtime").is_none());
        assert!(decoder_for("host").is_none());
    }

    #[test]
    fn decoder_dispatches_on_discriminator() {
        let decode = decoder_for("HostGroup").unwrap();
        let obj = decode("linux", json!({"display_name": "Linux Servers"})).unwrap();
        assert_eq!(obj.type_name(), "HostGroup");
        assert_eq!(obj.name(), "linux");
        assert_eq!(obj.path(), "/objects/hostgroups/linux");
    }

    #[test]
    fn paths() {
        assert_eq!(object_path::<Service>("a!b"), "/objects/services/a!b");
        assert_eq!(
            object_path::<Service>("host1!disk /"),
            "/objects/services/host1!disk%20%2F"
        );
        assert_eq!(object_path::<Host>("50%off"), "/objects/hosts/50%25off");
        assert_eq!(collection_path::<User>(), "/objects/users");
    }

    #[test]
    fn object_create_projection_matches_variant() {
        let obj = Object::User(User {
            name: "olly".into(),
            email: "olly@example.com".into(),
            groups: vec![],
        });
        assert_eq!(
            obj.create_projection().unwrap(),
            json!({"attrs": {"email": "olly@example.com"}})
        );
    }
}
