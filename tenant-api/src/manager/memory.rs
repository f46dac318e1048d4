use super::{DbError, Manager, StoreError};
use crate::identity::TenantIdentity;
use crate::resources::{ProxyConfig, TenantInfo, Version};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;

const TENANT_NOT_FOUND: &str = "error_tenant_not_found";
const VERSION_NOT_FOUND: &str = "error_version_not_found";

struct TenantEntry {
    config: ProxyConfig,
    versions: HashMap<String, Version>,
}

/// Keeps tenant configuration in process memory.
///
/// Writes are serialized by a single lock, so a successful write is visible to
/// every later read.
#[derive(Default)]
pub struct MemoryManager {
    tenants: RwLock<HashMap<TenantIdentity, TenantEntry>>,
}

impl MemoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn validate_config(config: &ProxyConfig) -> Result<(), StoreError> {
        if config.port == 0 {
            return Err(StoreError::InvalidRule("error_invalid_port".into()));
        }
        Ok(())
    }

    fn validate_version(version: &Version) -> Result<(), StoreError> {
        if !version.selectors.is_empty() && version.default.is_empty() {
            return Err(StoreError::InvalidRule(
                "error_version_default_required".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Manager for MemoryManager {
    async fn create(&self, tenant: &TenantIdentity, info: TenantInfo) -> Result<(), StoreError> {
        let config = ProxyConfig::from(info);
        Self::validate_config(&config)?;

        let mut tenants = self.tenants.write();
        if tenants.contains_key(tenant) {
            return Err(DbError::new(Some(409), "tenant already exists").into());
        }

        tenants.insert(
            tenant.clone(),
            TenantEntry {
                config,
                versions: HashMap::new(),
            },
        );
        tracing::debug!(tenant_id = %tenant, "Created tenant");
        Ok(())
    }

    async fn set(&self, tenant: &TenantIdentity, info: TenantInfo) -> Result<(), StoreError> {
        let config = ProxyConfig::from(info);
        Self::validate_config(&config)?;

        let mut tenants = self.tenants.write();
        let entry = tenants
            .get_mut(tenant)
            .ok_or_else(|| StoreError::NotFound(TENANT_NOT_FOUND.into()))?;
        entry.config = config;
        Ok(())
    }

    async fn get(&self, tenant: &TenantIdentity) -> Result<ProxyConfig, StoreError> {
        self.tenants
            .read()
            .get(tenant)
            .map(|entry| entry.config.clone())
            .ok_or_else(|| StoreError::NotFound(TENANT_NOT_FOUND.into()))
    }

    async fn delete(&self, tenant: &TenantIdentity) -> Result<(), StoreError> {
        // Versions live inside the entry and go with it
        match self.tenants.write().remove(tenant) {
            Some(entry) => {
                tracing::debug!(
                    tenant_id = %tenant,
                    versions = entry.versions.len(),
                    "Deleted tenant"
                );
                Ok(())
            }
            None => Err(StoreError::NotFound(TENANT_NOT_FOUND.into())),
        }
    }

    async fn set_version(
        &self,
        tenant: &TenantIdentity,
        version: Version,
    ) -> Result<(), StoreError> {
        Self::validate_version(&version)?;

        let mut tenants = self.tenants.write();
        let entry = tenants
            .get_mut(tenant)
            .ok_or_else(|| StoreError::NotFound(TENANT_NOT_FOUND.into()))?;
        entry.versions.insert(version.service.clone(), version);
        Ok(())
    }

    async fn get_version(
        &self,
        tenant: &TenantIdentity,
        service: &str,
    ) -> Result<Version, StoreError> {
        let tenants = self.tenants.read();
        let entry = tenants
            .get(tenant)
            .ok_or_else(|| StoreError::NotFound(TENANT_NOT_FOUND.into()))?;
        entry
            .versions
            .get(service)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(VERSION_NOT_FOUND.into()))
    }

    async fn delete_version(
        &self,
        tenant: &TenantIdentity,
        service: &str,
    ) -> Result<(), StoreError> {
        let mut tenants = self.tenants.write();
        let entry = tenants
            .get_mut(tenant)
            .ok_or_else(|| StoreError::NotFound(TENANT_NOT_FOUND.into()))?;
        entry
            .versions
            .remove(service)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(VERSION_NOT_FOUND.into()))
    }
}
