use crate::identity::TenantIdentity;
use crate::manager::{Manager, MemoryManager, StoreError};
use crate::reporter::{Outcome, Reporter};
use crate::resources::{ProxyConfig, TenantInfo, Version};
use async_trait::async_trait;
use metrics::{
    Counter, Gauge, GaugeFn, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
};
use parking_lot::Mutex;
use std::future::pending;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Wraps a `MemoryManager` and counts calls reaching it.
#[derive(Default)]
pub struct CountingManager {
    inner: MemoryManager,
    calls: AtomicUsize,
}

impl CountingManager {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Direct access for assertions. Calls made here are not counted.
    pub fn inner(&self) -> &MemoryManager {
        &self.inner
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Manager for CountingManager {
    async fn create(&self, tenant: &TenantIdentity, info: TenantInfo) -> Result<(), StoreError> {
        self.count();
        self.inner.create(tenant, info).await
    }

    async fn set(&self, tenant: &TenantIdentity, info: TenantInfo) -> Result<(), StoreError> {
        self.count();
        self.inner.set(tenant, info).await
    }

    async fn get(&self, tenant: &TenantIdentity) -> Result<ProxyConfig, StoreError> {
        self.count();
        self.inner.get(tenant).await
    }

    async fn delete(&self, tenant: &TenantIdentity) -> Result<(), StoreError> {
        self.count();
        self.inner.delete(tenant).await
    }

    async fn set_version(
        &self,
        tenant: &TenantIdentity,
        version: Version,
    ) -> Result<(), StoreError> {
        self.count();
        self.inner.set_version(tenant, version).await
    }

    async fn get_version(
        &self,
        tenant: &TenantIdentity,
        service: &str,
    ) -> Result<Version, StoreError> {
        self.count();
        self.inner.get_version(tenant, service).await
    }

    async fn delete_version(
        &self,
        tenant: &TenantIdentity,
        service: &str,
    ) -> Result<(), StoreError> {
        self.count();
        self.inner.delete_version(tenant, service).await
    }
}

/// Fails every call with the error built by `make_error`.
pub struct FailingManager<F> {
    make_error: F,
}

impl<F> FailingManager<F>
where
    F: Fn() -> StoreError + Send + Sync,
{
    pub fn new(make_error: F) -> Self {
        Self { make_error }
    }
}

#[async_trait]
impl<F> Manager for FailingManager<F>
where
    F: Fn() -> StoreError + Send + Sync,
{
    async fn create(&self, _tenant: &TenantIdentity, _info: TenantInfo) -> Result<(), StoreError> {
        Err((self.make_error)())
    }

    async fn set(&self, _tenant: &TenantIdentity, _info: TenantInfo) -> Result<(), StoreError> {
        Err((self.make_error)())
    }

    async fn get(&self, _tenant: &TenantIdentity) -> Result<ProxyConfig, StoreError> {
        Err((self.make_error)())
    }

    async fn delete(&self, _tenant: &TenantIdentity) -> Result<(), StoreError> {
        Err((self.make_error)())
    }

    async fn set_version(
        &self,
        _tenant: &TenantIdentity,
        _version: Version,
    ) -> Result<(), StoreError> {
        Err((self.make_error)())
    }

    async fn get_version(
        &self,
        _tenant: &TenantIdentity,
        _service: &str,
    ) -> Result<Version, StoreError> {
        Err((self.make_error)())
    }

    async fn delete_version(
        &self,
        _tenant: &TenantIdentity,
        _service: &str,
    ) -> Result<(), StoreError> {
        Err((self.make_error)())
    }

    fn is_ready(&self) -> bool {
        false
    }
}

#[derive(Default)]
pub struct RecordingReporter {
    records: Mutex<Vec<(&'static str, Outcome)>>,
}

impl RecordingReporter {
    pub fn records(&self) -> Vec<(&'static str, Outcome)> {
        self.records.lock().clone()
    }
}

impl Reporter for RecordingReporter {
    fn record(&self, operation: &'static str, outcome: Outcome, _duration: Duration) {
        self.records.lock().push((operation, outcome));
    }
}

/// Never completes any call, like a store that stopped answering.
pub struct StallingManager;

#[async_trait]
impl Manager for StallingManager {
    async fn create(&self, _tenant: &TenantIdentity, _info: TenantInfo) -> Result<(), StoreError> {
        pending().await
    }

    async fn set(&self, _tenant: &TenantIdentity, _info: TenantInfo) -> Result<(), StoreError> {
        pending().await
    }

    async fn get(&self, _tenant: &TenantIdentity) -> Result<ProxyConfig, StoreError> {
        pending().await
    }

    async fn delete(&self, _tenant: &TenantIdentity) -> Result<(), StoreError> {
        pending().await
    }

    async fn set_version(
        &self,
        _tenant: &TenantIdentity,
        _version: Version,
    ) -> Result<(), StoreError> {
        pending().await
    }

    async fn get_version(
        &self,
        _tenant: &TenantIdentity,
        _service: &str,
    ) -> Result<Version, StoreError> {
        pending().await
    }

    async fn delete_version(
        &self,
        _tenant: &TenantIdentity,
        _service: &str,
    ) -> Result<(), StoreError> {
        pending().await
    }
}

#[derive(Default)]
struct GaugeState {
    current: f64,
    peak: f64,
}

#[derive(Default)]
pub struct TrackedGauge {
    state: Mutex<GaugeState>,
}

impl TrackedGauge {
    pub fn current(&self) -> f64 {
        self.state.lock().current
    }

    pub fn peak(&self) -> f64 {
        self.state.lock().peak
    }

    fn apply(&self, update: impl FnOnce(f64) -> f64) {
        let mut state = self.state.lock();
        state.current = update(state.current);
        state.peak = state.peak.max(state.current);
    }
}

impl GaugeFn for TrackedGauge {
    fn increment(&self, value: f64) {
        self.apply(|current| current + value);
    }

    fn decrement(&self, value: f64) {
        self.apply(|current| current - value);
    }

    fn set(&self, value: f64) {
        self.apply(|_| value);
    }
}

/// Recorder that tracks a single gauge by name and drops everything else.
pub struct GaugeRecorder {
    name: &'static str,
    gauge: Arc<TrackedGauge>,
}

impl GaugeRecorder {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            gauge: Arc::new(TrackedGauge::default()),
        }
    }

    pub fn gauge(&self) -> &TrackedGauge {
        &self.gauge
    }
}

impl Recorder for GaugeRecorder {
    fn describe_counter(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn describe_histogram(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

    fn register_counter(&self, _key: &Key, _metadata: &Metadata<'_>) -> Counter {
        Counter::noop()
    }

    fn register_gauge(&self, key: &Key, _metadata: &Metadata<'_>) -> Gauge {
        if key.name() == self.name {
            Gauge::from_arc(self.gauge.clone())
        } else {
            Gauge::noop()
        }
    }

    fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
        Histogram::noop()
    }
}
