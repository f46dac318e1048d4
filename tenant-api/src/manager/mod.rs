//! The configuration store contract the API delegates every stateful operation to.

mod memory;

pub use memory::MemoryManager;

use crate::identity::TenantIdentity;
use crate::resources::{ProxyConfig, TenantInfo, Version};
use async_trait::async_trait;

/// Errors a manager may report. The message of each kind is shown to clients, so
/// implementations should keep it short and token-like.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The configuration was understood but violates a routing rule.
    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("database error: {0}")]
    Database(#[from] DbError),

    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Anything a manager cannot place in the kinds above.
    #[error("unknown error: {0}")]
    Unknown(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn unknown<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        StoreError::Unknown(err.into())
    }
}

/// Failure of the backing database. `status` carries the database's own status
/// code when it answered at all; `None` means it could not be reached.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct DbError {
    pub status: Option<u16>,
    pub message: String,
}

impl DbError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        DbError {
            status,
            message: message.into(),
        }
    }
}

/// Stores tenant configuration and service versions.
///
/// Every call is scoped by the tenant. Implementations own all consistency
/// guarantees: a tenant is created once, updates replace the whole configuration,
/// and deleting a tenant removes its versions.
#[async_trait]
pub trait Manager: Send + Sync {
    async fn create(&self, tenant: &TenantIdentity, info: TenantInfo) -> Result<(), StoreError>;

    async fn set(&self, tenant: &TenantIdentity, info: TenantInfo) -> Result<(), StoreError>;

    async fn get(&self, tenant: &TenantIdentity) -> Result<ProxyConfig, StoreError>;

    async fn delete(&self, tenant: &TenantIdentity) -> Result<(), StoreError>;

    async fn set_version(&self, tenant: &TenantIdentity, version: Version)
    -> Result<(), StoreError>;

    async fn get_version(
        &self,
        tenant: &TenantIdentity,
        service: &str,
    ) -> Result<Version, StoreError>;

    async fn delete_version(&self, tenant: &TenantIdentity, service: &str)
    -> Result<(), StoreError>;

    /// Used by the readiness probe.
    fn is_ready(&self) -> bool {
        true
    }
}
