use thiserror::Error;

/// Top-level error type for the `icinga-api` crate.
///
/// Icinga2 signals failure three different ways (HTTP status code, the
/// top-level `status` string of the response envelope, and per-result
/// `errors` lists). All three are folded into this one taxonomy so callers
/// can branch on [`ErrorKind`] instead of matching message text.
#[derive(Debug, Error)]
pub enum Error {
    // ── Object lookup ───────────────────────────────────────────────
    /// The addressed object does not exist (HTTP 404 or an empty lookup).
    #[error("object does not exist")]
    NotExist,

    /// A non-empty filter expression matched no objects.
    #[error("no object matches filter")]
    NoMatch,

    /// A create request collided with an existing object.
    #[error("object already exists")]
    AlreadyExists,

    /// A lookup returned more than one object.
    #[error("ambiguous result: expected 1 object, got {count}")]
    AmbiguousResult { count: usize },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, body read, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Server ──────────────────────────────────────────────────────
    /// Error message reported by Icinga2, surfaced verbatim.
    #[error("{message}")]
    Server { message: String },

    /// Unexpected HTTP status with no error message in the body.
    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    // ── Data ────────────────────────────────────────────────────────
    /// Malformed envelope JSON or an unknown type discriminator.
    #[error("decode error: {message}")]
    Decode { message: String },

    /// A single malformed line from the event stream. Non-fatal: the stream
    /// keeps going after delivering this.
    #[error("decode event: {message}")]
    StreamDecode { message: String, line: String },

    /// A service name without the `<host>!<service>` separator.
    #[error("invalid service name {name:?}: missing '!' separator")]
    InvalidServiceName { name: String },

    // ── Context ─────────────────────────────────────────────────────
    /// Wraps another error with the operation and target that produced it.
    #[error("{operation} {target}: {source}")]
    Context {
        operation: &'static str,
        target: String,
        #[source]
        source: Box<Error>,
    },
}

/// Coarse classification of an [`Error`], independent of message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotExist,
    NoMatch,
    AlreadyExists,
    AmbiguousResult,
    Transport,
    Server,
    Decode,
    StreamDecode,
    InvalidInput,
}

impl Error {
    /// Attach the operation name and target identifier to this error.
    pub fn context(self, operation: &'static str, target: impl Into<String>) -> Self {
        Self::Context {
            operation,
            target: target.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through any [`Error::Context`] layers.
    pub fn root(&self) -> &Self {
        match self {
            Self::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Classify this error by kind.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotExist => ErrorKind::NotExist,
            Self::NoMatch => ErrorKind::NoMatch,
            Self::AlreadyExists => ErrorKind::AlreadyExists,
            Self::AmbiguousResult { .. } => ErrorKind::AmbiguousResult,
            Self::Transport(_) | Self::InvalidUrl(_) | Self::Tls(_) => ErrorKind::Transport,
            Self::Server { .. } | Self::Status { .. } => ErrorKind::Server,
            Self::Decode { .. } => ErrorKind::Decode,
            Self::StreamDecode { .. } => ErrorKind::StreamDecode,
            Self::InvalidServiceName { .. } => ErrorKind::InvalidInput,
            Self::Context { source, .. } => source.kind(),
        }
    }

    /// Returns `true` if the target is absent or a filter matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotExist | ErrorKind::NoMatch)
    }

    /// Returns `true` if a create collided with an existing object.
    pub fn is_already_exists(&self) -> bool {
        self.kind() == ErrorKind::AlreadyExists
    }

    pub(crate) fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn context_preserves_kind() {
        let err = Error::NotExist
            .context("lookup", "/objects/hosts/a")
            .context("check", "a");
        assert_eq!(err.kind(), ErrorKind::NotExist);
        assert!(err.is_not_found());
        assert_eq!(
            err.to_string(),
            "check a: lookup /objects/hosts/a: object does not exist"
        );
    }

    #[test]
    fn context_exposes_source() {
        let err = Error::AlreadyExists.context("create", "h1");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("object already exists"));
    }

    #[test]
    fn server_message_is_verbatim() {
        let err = Error::Server {
            message: "Attribute 'check_command' must be set.".into(),
        };
        assert_eq!(err.to_string(), "Attribute 'check_command' must be set.");
        assert_eq!(err.kind(), ErrorKind::Server);
    }
}
