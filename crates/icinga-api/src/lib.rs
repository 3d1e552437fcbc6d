// icinga-api: Async Rust client for the Icinga2 HTTP API (objects, actions, events)

pub mod checker;
pub mod client;
pub mod error;
pub mod events;
pub mod model;
pub mod objects;
pub mod response;
pub mod transport;

pub use checker::{CheckFilter, Checkable};
pub use client::{Client, ClientConfig, Permissions};
pub use error::{Error, ErrorKind};
pub use events::{Event, EventStream, EventType, Subscription};
pub use model::{
    CheckResult, ConfigObject, Host, HostGroup, HostState, Object, Service, ServiceState,
    StateType, User,
};
pub use response::parse_response;
pub use transport::{TlsMode, TransportConfig, filter_encode};
