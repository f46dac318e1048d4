use crate::errors::ApiError;
use hyper::header::{HeaderMap, HeaderName};
use std::fmt;

pub const DEFAULT_IDENTITY_HEADER: &str = "x-tenant-id";
pub const DEFAULT_REQUEST_ID_HEADER: &str = "x-request-id";

/// A verified, non-empty tenant id. Every manager call is scoped by one.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TenantIdentity(String);

impl TenantIdentity {
    /// Returns `None` for an empty id.
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Header names the authentication layer uses to hand identity and correlation id
/// to this service.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestHeaders {
    pub identity: HeaderName,
    pub request_id: HeaderName,
}

impl Default for RequestHeaders {
    fn default() -> Self {
        RequestHeaders {
            identity: HeaderName::from_static(DEFAULT_IDENTITY_HEADER),
            request_id: HeaderName::from_static(DEFAULT_REQUEST_ID_HEADER),
        }
    }
}

/// Per-request values resolved before any handler runs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RequestContext {
    pub tenant: Option<TenantIdentity>,
    /// Only used for logs and error bodies, never passed to the manager.
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn from_headers(headers: &HeaderMap, names: &RequestHeaders) -> Self {
        let value_of = |name: &HeaderName| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned)
        };

        RequestContext {
            tenant: value_of(&names.identity).and_then(TenantIdentity::new),
            request_id: value_of(&names.request_id).filter(|id| !id.is_empty()),
        }
    }

    pub fn require_tenant(&self) -> Result<&TenantIdentity, ApiError> {
        self.tenant
            .as_ref()
            .ok_or(ApiError::InvalidInput("missing tenant identity"))
    }

    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant.as_ref().map(TenantIdentity::as_str)
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }
}
