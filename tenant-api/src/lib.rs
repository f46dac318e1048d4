pub mod config;
pub mod errors;
pub mod handlers;
pub mod identity;
pub mod manager;
pub mod metrics_defs;
pub mod reporter;
pub mod resources;
pub mod service;

#[cfg(test)]
mod testutils;

use handlers::TenantApi;
use manager::Manager;
use reporter::Reporter;
use service::TenantApiService;
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum TenantApiError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] config::ValidationError),
}

/// Serves the tenant API and the admin endpoints until either listener fails.
pub async fn run(
    config: config::Config,
    manager: Arc<dyn Manager>,
    reporter: Arc<dyn Reporter>,
) -> Result<(), TenantApiError> {
    config.validate()?;
    let headers = config.request_headers()?;

    let api_service = TenantApiService::new(TenantApi::new(manager.clone()), reporter, headers);
    let admin_service: AdminService<_, TenantApiError> =
        AdminService::new(move || manager.is_ready());

    let api_task = run_http_service(&config.listener.host, config.listener.port, api_service);
    let admin_task = run_http_service(
        &config.admin_listener.host,
        config.admin_listener.port,
        admin_service,
    );

    tokio::try_join!(api_task, admin_task)?;
    Ok(())
}
