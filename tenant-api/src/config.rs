use crate::identity::{DEFAULT_IDENTITY_HEADER, DEFAULT_REQUEST_ID_HEADER, RequestHeaders};
use hyper::header::HeaderName;
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Listener and admin listener both use {0}")]
    ListenerConflict(String),

    #[error("Invalid header name: {0:?}")]
    InvalidHeaderName(String),
}

/// Tenant API configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Listener for tenant API requests
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    /// Header carrying the verified tenant id, set by the authentication layer
    #[serde(default = "default_identity_header")]
    pub identity_header: String,
    /// Header carrying the request correlation id
    #[serde(default = "default_request_id_header")]
    pub request_id_header: String,
}

fn default_identity_header() -> String {
    DEFAULT_IDENTITY_HEADER.to_string()
}

fn default_request_id_header() -> String {
    DEFAULT_REQUEST_ID_HEADER.to_string()
}

impl Config {
    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.listener == self.admin_listener {
            return Err(ValidationError::ListenerConflict(format!(
                "{}:{}",
                self.listener.host, self.listener.port
            )));
        }

        self.request_headers()?;
        Ok(())
    }

    /// Parses the configured header names.
    pub fn request_headers(&self) -> Result<RequestHeaders, ValidationError> {
        let parse = |name: &str| {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ValidationError::InvalidHeaderName(name.to_string()))
        };

        Ok(RequestHeaders {
            identity: parse(&self.identity_header)?,
            request_id: parse(&self.request_id_header)?,
        })
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    /// Validates the listener configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}
