// Check scheduler
//
// Builds one filter expression per target and posts it to the
// reschedule-check action. Host groups reschedule the checks of their
// member hosts, so they filter on type `Host`.

use std::fmt::Write as _;

use reqwest::StatusCode;
use serde::Serialize;
use tracing::debug;

use crate::client::Client;
use crate::error::Error;
use crate::model::{ConfigObject, Host, HostGroup, Service};
use crate::response;

const RESCHEDULE_PATH: &str = "/actions/reschedule-check";

/// Body of a reschedule-check request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckFilter {
    #[serde(rename = "type")]
    pub type_name: &'static str,
    pub filter: String,
}

/// An object whose checks can be rescheduled.
pub trait Checkable: ConfigObject {
    /// The reschedule-check body selecting this object's checks.
    fn check_filter(&self) -> Result<CheckFilter, Error>;
}

impl Checkable for Host {
    fn check_filter(&self) -> Result<CheckFilter, Error> {
        Ok(CheckFilter {
            type_name: Host::TYPE,
            filter: format!("host.name == {}", quote(&self.name)),
        })
    }
}

impl Checkable for Service {
    fn check_filter(&self) -> Result<CheckFilter, Error> {
        let (host, service) = self.split_name()?;
        Ok(CheckFilter {
            type_name: Service::TYPE,
            filter: format!(
                "host.name == {} && service.name == {}",
                quote(host),
                quote(service)
            ),
        })
    }
}

impl Checkable for HostGroup {
    fn check_filter(&self) -> Result<CheckFilter, Error> {
        Ok(CheckFilter {
            type_name: Host::TYPE,
            filter: format!("{} in host.groups", quote(&self.name)),
        })
    }
}

/// Double-quote `s` as a filter string literal.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04x}", u32::from(c));
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

impl Client {
    /// Ask the server to run the checks of `target` now.
    ///
    /// `POST /v1/actions/reschedule-check`. A malformed service name fails
    /// before anything is sent.
    pub async fn reschedule_check<T: Checkable>(&self, target: &T) -> Result<(), Error> {
        self.reschedule(target)
            .await
            .map_err(|e| e.context("check", target.name()))
    }

    async fn reschedule<T: Checkable>(&self, target: &T) -> Result<(), Error> {
        let body = target.check_filter()?;
        debug!(kind = body.type_name, filter = %body.filter, "rescheduling check");
        let resp = self.transport.post(RESCHEDULE_PATH, &body).await?;
        let status = resp.status();
        if status == StatusCode::OK {
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotExist);
        }
        let body = resp.bytes().await?;
        Err(response::failure(status, &body))
    }
}
