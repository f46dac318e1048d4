//! Wire representations of tenant and service version configuration.

use crate::identity::TenantIdentity;
use serde::{Deserialize, Deserializer, Serialize};

/// A single traffic filter. Filters are passed through to the manager untouched;
/// only their order carries meaning here.
pub type FilterSpec = serde_json::Value;

/// Decodes an explicit `null` the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A tenant's complete routing configuration as exchanged over the wire.
///
/// Missing fields decode to their defaults, so a partial document is accepted and
/// left to the manager to judge.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TenantInfo {
    /// Only read from the payload on create. Every other operation takes the id
    /// from the request identity.
    #[serde(deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub credentials: Credentials,
    #[serde(deserialize_with = "null_as_default")]
    pub load_balance: String,
    #[serde(deserialize_with = "null_as_default")]
    pub port: u16,
    #[serde(deserialize_with = "null_as_default")]
    pub req_tracking_header: String,
    #[serde(deserialize_with = "null_as_default")]
    pub filters: Vec<FilterSpec>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka: Option<KafkaCredentials>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<RegistryCredentials>,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct KafkaCredentials {
    #[serde(deserialize_with = "null_as_default")]
    pub api_key: String,
    #[serde(deserialize_with = "null_as_default")]
    pub admin_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub rest_url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub brokers: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub user: String,
    #[serde(deserialize_with = "null_as_default")]
    pub password: String,
    #[serde(deserialize_with = "null_as_default")]
    pub sasl: bool,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RegistryCredentials {
    #[serde(deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(deserialize_with = "null_as_default")]
    pub token: String,
}

/// The configuration the manager keeps for a tenant. Same as [`TenantInfo`]
/// without the id, which is the storage key instead.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ProxyConfig {
    pub credentials: Credentials,
    pub load_balance: String,
    pub port: u16,
    pub req_tracking_header: String,
    pub filters: Vec<FilterSpec>,
}

impl ProxyConfig {
    /// Rebuilds the wire representation, re-attaching the tenant id.
    pub fn into_tenant_info(self, tenant: &TenantIdentity) -> TenantInfo {
        TenantInfo {
            id: tenant.to_string(),
            credentials: self.credentials,
            load_balance: self.load_balance,
            port: self.port,
            req_tracking_header: self.req_tracking_header,
            filters: self.filters,
        }
    }
}

impl From<TenantInfo> for ProxyConfig {
    fn from(info: TenantInfo) -> Self {
        ProxyConfig {
            credentials: info.credentials,
            load_balance: info.load_balance,
            port: info.port,
            req_tracking_header: info.req_tracking_header,
            filters: info.filters,
        }
    }
}

/// Versioning metadata for one service of one tenant.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Version {
    /// Always replaced by the `{service}` path parameter before reaching the manager.
    #[serde(default, deserialize_with = "null_as_default")]
    pub service: String,
    /// Version receiving traffic no selector claims.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub default: String,
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "String::is_empty"
    )]
    pub selectors: String,
    /// Any other fields (weights, labels) are forwarded verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}
