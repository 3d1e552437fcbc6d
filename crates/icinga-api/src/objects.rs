// Object CRUD endpoints
//
// lookup / filtered list / create / delete over `/v1/objects/{type}/{name}`.
// HTTP 404 always means "absent"; 200 with a clean envelope is success;
// anything else is resolved through the envelope parser.

use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::client::Client;
use crate::error::Error;
use crate::model::{
    ConfigObject, Host, HostGroup, Object, Service, User, collection_path, object_path,
};
use crate::response::{self, Envelope};

/// Whether a server error message reports a duplicate object.
///
/// Icinga2 has no structured error code for this; the message text is the
/// only signal, so this stays the single place that depends on it.
pub fn indicates_duplicate(message: &str) -> bool {
    message.contains("already exists")
}

/// Map a successful-status body to `Ok(())` unless its envelope signals an
/// error; map any other status through the envelope parser.
pub(crate) fn expect_success(status: StatusCode, body: &[u8]) -> Result<(), Error> {
    if status != StatusCode::OK {
        return Err(response::failure(status, body));
    }
    if body.trim_ascii().is_empty() {
        return Ok(());
    }
    match Envelope::from_slice(body)?.error_message() {
        Some(message) => Err(Error::Server { message }),
        None => Ok(()),
    }
}

fn into_variant<T: ConfigObject>(object: Object) -> Result<T, Error> {
    let found = object.type_name();
    T::from_object(object)
        .ok_or_else(|| Error::decode(format!("expected {}, got {found}", T::TYPE)))
}

impl Client {
    // ── Untyped façade ───────────────────────────────────────────────

    /// Look up the single object at `path`.
    ///
    /// `GET /v1/{path}`. Zero results is [`Error::NotExist`], more than one
    /// is [`Error::AmbiguousResult`].
    pub async fn lookup(&self, path: &str) -> Result<Object, Error> {
        self.lookup_at(path)
            .await
            .map_err(|e| e.context("lookup", path))
    }

    async fn lookup_at(&self, path: &str) -> Result<Object, Error> {
        let resp = self.transport.get(path, "").await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotExist);
        }
        let body = resp.bytes().await?;
        if status != StatusCode::OK {
            return Err(response::failure(status, &body));
        }
        response::single(response::parse_response(&body)?)
    }

    /// List the objects under `path` matching the filter expression `expr`.
    ///
    /// `GET /v1/{path}?filter={expr}`. An empty expression lists everything
    /// and an empty result is not an error; a non-empty expression that
    /// matches nothing is [`Error::NoMatch`].
    pub async fn filtered_list(&self, path: &str, expr: &str) -> Result<Vec<Object>, Error> {
        self.filtered_list_at(path, expr)
            .await
            .map_err(|e| e.context("list", path))
    }

    async fn filtered_list_at(&self, path: &str, expr: &str) -> Result<Vec<Object>, Error> {
        debug!(path, filter = expr, "listing objects");
        let resp = self.transport.get(path, expr).await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(if expr.is_empty() {
                Error::NotExist
            } else {
                Error::NoMatch
            });
        }
        let body = resp.bytes().await?;
        if status != StatusCode::OK {
            return Err(response::failure(status, &body));
        }
        let objects = response::parse_response(&body)?;
        if objects.is_empty() && !expr.is_empty() {
            return Err(Error::NoMatch);
        }
        Ok(objects)
    }

    /// Create `object` from its create projection.
    ///
    /// `PUT /v1/objects/{type}/{name}` with `{"attrs": {...}}`.
    pub async fn create(&self, object: &Object) -> Result<(), Error> {
        let path = object.path();
        let result = match object.create_projection() {
            Ok(body) => self.create_at(&path, &body).await,
            Err(e) => Err(e),
        };
        result.map_err(|e| e.context("create", path))
    }

    async fn create_at<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<(), Error> {
        let resp = self.transport.put(path, body).await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotExist);
        }
        let body = resp.bytes().await?;
        expect_success(status, &body).map_err(|e| match e {
            Error::Server { ref message } if indicates_duplicate(message) => Error::AlreadyExists,
            other => other,
        })
    }

    /// Delete the object at `path`, optionally cascading to dependents
    /// (for example a host's services).
    ///
    /// `DELETE /v1/{path}[?cascade=1]`
    pub async fn delete(&self, path: &str, cascade: bool) -> Result<(), Error> {
        self.delete_at(path, cascade)
            .await
            .map_err(|e| e.context("delete", path))
    }

    async fn delete_at(&self, path: &str, cascade: bool) -> Result<(), Error> {
        let resp = self.transport.delete(path, cascade).await?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotExist);
        }
        let body = resp.bytes().await?;
        expect_success(status, &body)
    }

    // ── Typed façade ─────────────────────────────────────────────────

    /// Look up one object of type `T` by name.
    pub async fn lookup_object<T: ConfigObject>(&self, name: &str) -> Result<T, Error> {
        let path = object_path::<T>(name);
        let object = self.lookup(&path).await?;
        into_variant(object).map_err(|e| e.context("lookup", path))
    }

    /// List objects of type `T` matching `filter` (empty means all).
    pub async fn list_objects<T: ConfigObject>(&self, filter: &str) -> Result<Vec<T>, Error> {
        let path = collection_path::<T>();
        self.filtered_list(&path, filter)
            .await?
            .into_iter()
            .map(into_variant)
            .collect::<Result<_, _>>()
            .map_err(|e| e.context("list", path))
    }

    /// Create an object of type `T`.
    pub async fn create_object<T: ConfigObject>(&self, object: &T) -> Result<(), Error> {
        let path = object.path();
        self.create_at(&path, &object.create_projection())
            .await
            .map_err(|e| e.context("create", path))
    }

    /// Delete the object of type `T` named `name`.
    pub async fn delete_object<T: ConfigObject>(&self, name: &str, cascade: bool) -> Result<(), Error> {
        self.delete(&object_path::<T>(name), cascade).await
    }

    // ── Hosts ────────────────────────────────────────────────────────

    pub async fn lookup_host(&self, name: &str) -> Result<Host, Error> {
        self.lookup_object(name).await
    }

    pub async fn hosts(&self, filter: &str) -> Result<Vec<Host>, Error> {
        self.list_objects(filter).await
    }

    pub async fn create_host(&self, host: &Host) -> Result<(), Error> {
        self.create_object(host).await
    }

    pub async fn delete_host(&self, name: &str, cascade: bool) -> Result<(), Error> {
        self.delete_object::<Host>(name, cascade).await
    }

    // ── Services ─────────────────────────────────────────────────────

    /// Look up a service by its compound `<host>!<service>` name.
    pub async fn lookup_service(&self, name: &str) -> Result<Service, Error> {
        self.lookup_object(name).await
    }

    pub async fn services(&self, filter: &str) -> Result<Vec<Service>, Error> {
        self.list_objects(filter).await
    }

    pub async fn create_service(&self, service: &Service) -> Result<(), Error> {
        self.create_object(service).await
    }

    pub async fn delete_service(&self, name: &str, cascade: bool) -> Result<(), Error> {
        self.delete_object::<Service>(name, cascade).await
    }

    // ── Host groups ──────────────────────────────────────────────────

    pub async fn lookup_host_group(&self, name: &str) -> Result<HostGroup, Error> {
        self.lookup_object(name).await
    }

    pub async fn host_groups(&self, filter: &str) -> Result<Vec<HostGroup>, Error> {
        self.list_objects(filter).await
    }

    pub async fn create_host_group(&self, group: &HostGroup) -> Result<(), Error> {
        self.create_object(group).await
    }

    pub async fn delete_host_group(&self, name: &str, cascade: bool) -> Result<(), Error> {
        self.delete_object::<HostGroup>(name, cascade).await
    }

    // ── Users ────────────────────────────────────────────────────────

    pub async fn lookup_user(&self, name: &str) -> Result<User, Error> {
        self.lookup_object(name).await
    }

    pub async fn users(&self, filter: &str) -> Result<Vec<User>, Error> {
        self.list_objects(filter).await
    }

    pub async fn create_user(&self, user: &User) -> Result<(), Error> {
        self.create_object(user).await
    }

    pub async fn delete_user(&self, name: &str, cascade: bool) -> Result<(), Error> {
        self.delete_object::<User>(name, cascade).await
    }
}
