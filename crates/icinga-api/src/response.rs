// Icinga2 response envelope parser
//
// Every non-streaming endpoint answers with
// `{ "results": [{ "name", "type", "attrs" | "errors" }], "status" }`.
// Confusingly the top-level `status` carries an error message, while
// successful statuses live inside the individual results.

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::model::{self, Object};

/// Raw response envelope.
#[derive(Debug, Default, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    pub results: Vec<ResultRecord>,
    /// Request-level error message; empty on success.
    #[serde(default)]
    pub status: Option<String>,
}

/// One entry of the envelope's `results` list.
#[derive(Debug, Default, Deserialize)]
pub struct ResultRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub type_name: Option<String>,
    #[serde(default)]
    pub attrs: Option<Value>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
}

impl Envelope {
    /// Decode the envelope JSON without interpreting it.
    pub fn from_slice(body: &[u8]) -> Result<Self, Error> {
        serde_json::from_slice(body).map_err(|e| Error::decode(format!("malformed envelope: {e}")))
    }

    /// The request-level or first per-result error message, if any.
    ///
    /// A non-empty top-level `status` wins; otherwise the first record with
    /// errors has its messages joined with `", "`.
    pub fn error_message(&self) -> Option<String> {
        if let Some(status) = self.status.as_deref().filter(|s| !s.is_empty()) {
            return Some(status.to_owned());
        }
        self.results.iter().find_map(ResultRecord::error_message)
    }

    /// Interpret the envelope: fail on the first error signal, otherwise
    /// decode every typed record through the decoder registry.
    pub fn into_objects(self) -> Result<Vec<Object>, Error> {
        if let Some(message) = self.error_message() {
            return Err(Error::Server { message });
        }
        let mut objects = Vec::with_capacity(self.results.len());
        for record in self.results {
            let Some(type_name) = record.type_name.filter(|t| !t.is_empty()) else {
                continue;
            };
            let decode = model::decoder_for(&type_name)
                .ok_or_else(|| Error::decode(format!("unsupported object type {type_name:?}")))?;
            let name = record.name.unwrap_or_default();
            let attrs = record.attrs.unwrap_or_else(|| Value::Object(serde_json::Map::new()));
            objects.push(decode(&name, attrs)?);
        }
        Ok(objects)
    }
}

impl ResultRecord {
    fn error_message(&self) -> Option<String> {
        self.errors
            .as_ref()
            .filter(|errors| !errors.is_empty())
            .map(|errors| errors.join(", "))
    }
}

/// Parse a response body into decoded objects or the first error it signals.
pub fn parse_response(body: &[u8]) -> Result<Vec<Object>, Error> {
    Envelope::from_slice(body)?.into_objects()
}

/// Reduce a result list to exactly one object.
pub fn single(mut objects: Vec<Object>) -> Result<Object, Error> {
    match objects.len() {
        0 => Err(Error::NotExist),
        1 => objects.pop().ok_or(Error::NotExist),
        count => Err(Error::AmbiguousResult { count }),
    }
}

/// Build the error for a non-success HTTP status from its response body.
///
/// Uses the envelope's error signal when there is one; an empty body or a
/// clean envelope yields [`Error::Status`]; an undecodable body is a decode
/// error.
pub(crate) fn failure(status: reqwest::StatusCode, body: &[u8]) -> Error {
    if body.trim_ascii().is_empty() {
        return Error::Status {
            status: status.as_u16(),
        };
    }
    match Envelope::from_slice(body) {
        Ok(envelope) => envelope.error_message().map_or(
            Error::Status {
                status: status.as_u16(),
            },
            |message| Error::Server { message },
        ),
        Err(e) => e,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use serde_json::json;

    use super::*;
    use crate::error::ErrorKind;
    use crate::model::{Host, HostState, User};

    fn parse(value: &Value) -> Result<Vec<Object>, Error> {
        parse_response(value.to_string().as_bytes())
    }

    #[test]
    fn decodes_one_object_per_typed_record() {
        let objects = parse(&json!({
            "results": [
                {"name": "a", "type": "Host", "attrs": {"state": 1.0, "check_command": "hostalive"}},
                {"name": "b", "type": "Host", "attrs": {"state": 0}},
                {"name": "test", "type": "User", "attrs": {"email": "test@example.com", "groups": []}}
            ]
        }))
        .unwrap();
        assert_eq!(objects.len(), 3);
        let Object::Host(Host { name, state, .. }) = &objects[0] else {
            panic!("expected host, got {:?}", objects[0]);
        };
        assert_eq!(name, "a");
        assert_eq!(*state, HostState::Down);
        assert_eq!(
            objects[2],
            Object::User(User {
                name: "test".into(),
                email: "test@example.com".into(),
                groups: vec![]
            })
        );
    }

    #[test]
    fn unknown_discriminator_is_fatal() {
        let err = parse(&json!({
            "results": [
                {"name": "a", "type": "Host", "attrs": {}},
                {"name": "d", "type": "Downtime", "attrs": {}}
            ]
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert!(err.to_string().contains("Downtime"));
    }

    #[test]
    fn top_level_status_wins() {
        let err = parse(&json!({
            "error": 404,
            "status": "No objects found.",
            "results": [{"name": "a", "type": "Host", "attrs": {}}]
        }))
        .unwrap_err();
        assert!(matches!(err, Error::Server { ref message } if message == "No objects found."));
    }

    #[test]
    fn first_record_error_stops_decoding() {
        let err = parse(&json!({
            "results": [
                {"code": 500, "errors": ["Object already exists.", "Try again."], "status": "Object could not be created."},
                {"name": "x", "type": "NotAType", "attrs": {}},
                {"code": 500, "errors": ["second"]}
            ]
        }))
        .unwrap_err();
        assert!(
            matches!(err, Error::Server { ref message } if message == "Object already exists., Try again."),
            "{err:?}"
        );
    }

    #[test]
    fn empty_errors_list_is_not_an_error() {
        let objects = parse(&json!({
            "results": [{"name": "a", "type": "Host", "attrs": {}, "errors": []}],
            "status": ""
        }))
        .unwrap();
        assert_eq!(objects.len(), 1);
    }

    #[test]
    fn untyped_records_are_skipped() {
        let objects = parse(&json!({
            "results": [{"code": 200, "status": "Object was created."}]
        }))
        .unwrap();
        assert!(objects.is_empty());
    }

    #[test]
    fn malformed_json_is_a_decode_error() {
        let err = parse_response(b"<html>502 Bad Gateway</html>").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn single_requires_exactly_one() {
        assert!(matches!(single(vec![]), Err(Error::NotExist)));

        let host = Object::Host(Host::default());
        assert_eq!(single(vec![host.clone()]).unwrap(), host);

        let err = single(vec![host.clone(), host]).unwrap_err();
        assert!(matches!(err, Error::AmbiguousResult { count: 2 }));
        assert_eq!(err.kind(), ErrorKind::AmbiguousResult);
    }

    #[test]
    fn failure_prefers_envelope_message() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        let err = failure(status, br#"{"results": [{"code": 500, "errors": ["boom"]}]}"#);
        assert!(matches!(err, Error::Server { ref message } if message == "boom"));

        let err = failure(status, br#"{"results": []}"#);
        assert!(matches!(err, Error::Status { status: 500 }));

        let err = failure(reqwest::StatusCode::UNAUTHORIZED, b"");
        assert!(matches!(err, Error::Status { status: 401 }));
    }
}
