//! Service and backend identity types.
//!
//! # Responsibilities
//! - Name logical services (`ServiceId`)
//! - Describe one concrete backend endpoint (`BackendDescriptor`)
//! - Derive the authority and probe URL for an endpoint
//!
//! # Design Decisions
//! - Descriptors are immutable; pools replace them wholesale on refresh
//! - A backend id is either `host:port` or a full URL (scheme included)
//! - Authority is pre-computed so the request hot path never parses URLs

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Logical name grouping one or more backends.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

impl ServiceId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for ServiceId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// One concrete network endpoint implementing a logical service.
///
/// Immutable once created. Pool refreshes build brand-new descriptors
/// instead of mutating existing ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendDescriptor {
    /// Endpoint identity as configured: `host:port` or a full URL.
    id: String,
    /// The logical service this backend belongs to.
    service: ServiceId,
    /// `host:port` form used when dialing the backend.
    authority: String,
}

impl BackendDescriptor {
    pub fn new(id: impl Into<String>, service: ServiceId) -> Self {
        let id = id.into();
        let authority = derive_authority(&id);
        Self {
            id,
            service,
            authority,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn service(&self) -> &ServiceId {
        &self.service
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Build the liveness-probe URL for this backend.
    ///
    /// Ids carrying their own scheme keep it; bare `host:port` ids get
    /// `http://` or `https://` according to `secure`. The optional suffix
    /// is appended verbatim.
    pub fn probe_url(&self, secure: bool, suffix: &str) -> String {
        if has_scheme(&self.id) {
            format!("{}{}", self.id, suffix)
        } else if secure {
            format!("https://{}{}", self.id, suffix)
        } else {
            format!("http://{}{}", self.id, suffix)
        }
    }
}

impl fmt::Display for BackendDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.service)
    }
}

fn has_scheme(id: &str) -> bool {
    id.starts_with("http://") || id.starts_with("https://")
}

/// Reduce a backend id to the `host:port` used for dialing.
///
/// Full URLs are parsed and stripped to host + effective port; ids that do
/// not parse are passed through untouched (configuration validation flags
/// them before a pool is built).
fn derive_authority(id: &str) -> String {
    if !has_scheme(id) {
        return id.to_string();
    }
    match Url::parse(id) {
        Ok(url) => match (url.host_str(), url.port_or_known_default()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            _ => id.to_string(),
        },
        Err(_) => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_from_host_port() {
        let b = BackendDescriptor::new("localhost:9000", ServiceId::from("fly"));
        assert_eq!(b.authority(), "localhost:9000");
    }

    #[test]
    fn test_authority_from_url() {
        let b = BackendDescriptor::new("http://localhost:9000", ServiceId::from("fly"));
        assert_eq!(b.authority(), "localhost:9000");

        let b = BackendDescriptor::new("https://api.example.com", ServiceId::from("fly"));
        assert_eq!(b.authority(), "api.example.com:443");
    }

    #[test]
    fn test_probe_url_scheme_selection() {
        let bare = BackendDescriptor::new("localhost:9000", ServiceId::from("fly"));
        assert_eq!(bare.probe_url(false, ""), "http://localhost:9000");
        assert_eq!(bare.probe_url(true, "/health"), "https://localhost:9000/health");

        // An id that already carries a scheme keeps it, secure flag or not.
        let url = BackendDescriptor::new("http://localhost:9001", ServiceId::from("fly"));
        assert_eq!(url.probe_url(true, "/ping"), "http://localhost:9001/ping");
    }
}
