//! Read-only view of the inbound request.

use std::collections::HashMap;

use crate::constants::{HEADER_USER_AGENT, NO_BROWSER};

/// The parts of an HTTP request the protocols look at.
///
/// The web layer implements this for its own request type. Header lookups
/// are case-insensitive.
pub trait UploadRequest {
    /// Returns a query or form parameter.
    fn param(&self, key: &str) -> Option<&str>;

    /// Returns a header value, matching the name case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;

    /// Remote address of the client.
    fn client_ip(&self) -> &str;

    /// Id of the active session, or `None` when the request has no session.
    fn session_id(&self) -> Option<&str>;

    fn user_agent(&self) -> Option<&str> {
        self.header(HEADER_USER_AGENT)
    }

    fn has_param(&self, key: &str) -> bool {
        self.param(key).is_some()
    }

    fn has_header(&self, name: &str) -> bool {
        self.header(name).is_some()
    }
}

/// Map-backed [`UploadRequest`], used by adapters and tests.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    params: HashMap<String, String>,
    headers: HashMap<String, String>,
    client_ip: String,
    session_id: Option<String>,
}

impl RequestParts {
    pub fn new(client_ip: impl Into<String>) -> Self {
        Self {
            client_ip: client_ip.into(),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

impl UploadRequest for RequestParts {
    fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    fn client_ip(&self) -> &str {
        &self.client_ip
    }

    fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

/// Who is uploading: captured from the request when a handler is bound so
/// fragment names can be computed later without the request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ClientIdentity {
    pub session_id: Option<String>,
    pub client_ip: String,
    pub user_agent: Option<String>,
}

impl ClientIdentity {
    pub fn from_request(req: &dyn UploadRequest) -> Self {
        Self {
            session_id: req.session_id().map(str::to_owned),
            client_ip: req.client_ip().to_owned(),
            user_agent: req.user_agent().map(str::to_owned),
        }
    }

    /// Input of the browser fingerprint: client ip followed by the user agent
    /// (or a fixed placeholder when there is none).
    pub fn fingerprint_source(&self) -> String {
        format!(
            "{}{}",
            self.client_ip,
            self.user_agent.as_deref().unwrap_or(NO_BROWSER)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_are_case_insensitive() {
        let req = RequestParts::new("10.0.0.1").with_header("Content-Range", "bytes 0-1/2");
        assert_eq!(req.header("content-range"), Some("bytes 0-1/2"));
        assert_eq!(req.header("CONTENT-RANGE"), Some("bytes 0-1/2"));
        assert!(req.has_header("Content-range"));
    }

    #[test]
    fn params_are_exact() {
        let req = RequestParts::new("10.0.0.1").with_param("chunkNumber", "1");
        assert!(req.has_param("chunkNumber"));
        assert!(!req.has_param("chunknumber"));
    }

    #[test]
    fn identity_fingerprint_without_user_agent() {
        let req = RequestParts::new("127.0.0.1");
        let identity = ClientIdentity::from_request(&req);
        assert_eq!(identity.fingerprint_source(), "127.0.0.1no-browser");
        assert!(identity.session_id.is_none());
    }

    #[test]
    fn identity_captures_session_and_agent() {
        let req = RequestParts::new("127.0.0.1")
            .with_header("User-Agent", "curl/8.0")
            .with_session("abc");
        let identity = ClientIdentity::from_request(&req);
        assert_eq!(identity.session_id.as_deref(), Some("abc"));
        assert_eq!(identity.fingerprint_source(), "127.0.0.1curl/8.0");
    }
}
