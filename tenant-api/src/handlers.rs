//! One handler per API operation.
//!
//! Handlers receive an already verified [`TenantIdentity`] where the operation is
//! scoped to an existing tenant, decode and validate the payload, make exactly one
//! manager call and shape the reply. Failures are returned as [`ApiError`] and
//! mapped to a response by the caller.

use crate::errors::ApiError;
use crate::identity::TenantIdentity;
use crate::manager::Manager;
use crate::resources::{TenantInfo, Version};
use hyper::StatusCode;
use hyper::body::Bytes;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    CreateTenant,
    UpdateTenant,
    ReadTenant,
    DeleteTenant,
    SetVersion,
    GetVersion,
    DeleteVersion,
}

impl Operation {
    /// Name the operation is reported under. Setting and deleting a version are
    /// both reported as `versions_update`.
    pub const fn metric_name(&self) -> &'static str {
        match self {
            Operation::CreateTenant => "tenants_create",
            Operation::UpdateTenant => "tenants_update",
            Operation::ReadTenant => "tenants_read",
            Operation::DeleteTenant => "tenants_delete",
            Operation::SetVersion => "versions_update",
            Operation::GetVersion => "versions_read",
            Operation::DeleteVersion => "versions_update",
        }
    }
}

/// Successful handler result. `body` is JSON when present.
#[derive(Debug, PartialEq)]
pub struct Reply {
    pub status: StatusCode,
    pub body: Option<Bytes>,
}

impl Reply {
    pub fn empty(status: StatusCode) -> Self {
        Reply { status, body: None }
    }

    pub fn json(status: StatusCode, body: Vec<u8>) -> Self {
        Reply {
            status,
            body: Some(Bytes::from(body)),
        }
    }
}

fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Encodes a read result. The read has already succeeded, so an encoding failure
/// is logged and answered with an empty 200 rather than blamed on the payload.
fn encode<T: Serialize>(value: &T, tenant: &TenantIdentity, what: &'static str) -> Reply {
    match serde_json::to_vec(value) {
        Ok(body) => Reply::json(StatusCode::OK, body),
        Err(err) => {
            tracing::warn!(
                error = %err,
                tenant_id = %tenant,
                "Could not write JSON response for getting {what}"
            );
            Reply::empty(StatusCode::OK)
        }
    }
}

#[derive(Clone)]
pub struct TenantApi {
    manager: Arc<dyn Manager>,
}

impl TenantApi {
    pub fn new(manager: Arc<dyn Manager>) -> Self {
        Self { manager }
    }

    /// Registers a new tenant. The only operation that takes the tenant id from
    /// the payload, since no identity exists yet.
    pub async fn create_tenant(&self, payload: &[u8]) -> Result<Reply, ApiError> {
        let info: TenantInfo = decode(payload)?;

        let tenant = TenantIdentity::new(info.id.clone())
            .ok_or(ApiError::InvalidInput("tenant id is required"))?;
        tracing::Span::current().record("tenant_id", tenant.as_str());

        self.manager.create(&tenant, info).await?;
        Ok(Reply::empty(StatusCode::CREATED))
    }

    /// Replaces the whole configuration of the calling tenant.
    pub async fn update_tenant(
        &self,
        tenant: &TenantIdentity,
        payload: &[u8],
    ) -> Result<Reply, ApiError> {
        let mut info: TenantInfo = decode(payload)?;
        info.id = tenant.to_string();

        self.manager.set(tenant, info).await?;
        Ok(Reply::empty(StatusCode::OK))
    }

    pub async fn read_tenant(&self, tenant: &TenantIdentity) -> Result<Reply, ApiError> {
        let config = self.manager.get(tenant).await?;
        let info = config.into_tenant_info(tenant);

        Ok(encode(&info, tenant, "tenant information"))
    }

    pub async fn delete_tenant(&self, tenant: &TenantIdentity) -> Result<Reply, ApiError> {
        self.manager.delete(tenant).await?;
        Ok(Reply::empty(StatusCode::OK))
    }

    /// Creates or replaces the version record of `service`. The service name in
    /// the payload is ignored in favour of the path.
    pub async fn set_version(
        &self,
        tenant: &TenantIdentity,
        service: &str,
        payload: &[u8],
    ) -> Result<Reply, ApiError> {
        let mut version: Version = decode(payload)?;
        version.service = service.to_string();

        self.manager.set_version(tenant, version).await?;
        Ok(Reply::empty(StatusCode::OK))
    }

    pub async fn get_version(
        &self,
        tenant: &TenantIdentity,
        service: &str,
    ) -> Result<Reply, ApiError> {
        let version = self.manager.get_version(tenant, service).await?;

        Ok(encode(&version, tenant, "version information"))
    }

    pub async fn delete_version(
        &self,
        tenant: &TenantIdentity,
        service: &str,
    ) -> Result<Reply, ApiError> {
        self.manager.delete_version(tenant, service).await?;
        Ok(Reply::empty(StatusCode::OK))
    }
}
