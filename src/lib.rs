//! Admission control for distributed job queues.
//!
//! Job types declare restriction policies (fixed time windows plus an
//! explicitly-released concurrency cap). Before a queued invocation runs it is
//! checked against its policy via atomic counters in a shared store; violators
//! are diverted to a per-source restriction queue and drained later under a
//! shared scan-admission cap so many workers cannot thrash the same overflow
//! list.
//!
//! The crate owns no storage: counters and queues live behind the
//! [`store::CounterStore`] and [`store::QueueStore`] traits (Redis in
//! production, in-memory for tests). The surrounding worker calls
//! [`AdmissionControl::reserve`] instead of popping queues directly, and
//! [`AdmissionControl::after_execution`] (or the scoped
//! [`AdmissionControl::execute`]) once per admitted invocation.

pub mod clock;
pub mod envelope;
pub mod hooks;
pub mod keys;
pub mod limiter;
pub mod period;
pub mod policy;
pub mod router;
pub mod scanner;
pub mod settings;
pub mod store;
pub mod trace;

use std::sync::Arc;

use crate::clock::Clock;
use crate::envelope::JobInvocation;
use crate::hooks::{ExecutionOutcome, LifecycleHooks};
use crate::limiter::RateLimiter;
use crate::policy::PolicyRegistry;
use crate::router::RestrictionRouter;
use crate::scanner::{ReserveError, Scanner};
use crate::settings::RestrictionConfig;
use crate::store::{CounterStore, QueueStore, StoreError};

/// Re-export so test crates can write `#[turnstile::test]`.
pub use turnstile_macros::test;

/// Facade wiring the registry, limiter, router, scanner and lifecycle hooks
/// together over one pair of stores.
pub struct AdmissionControl {
    scanner: Scanner,
    hooks: LifecycleHooks,
}

impl AdmissionControl {
    pub fn new(
        config: RestrictionConfig,
        registry: Arc<PolicyRegistry>,
        counters: Arc<dyn CounterStore>,
        queues: Arc<dyn QueueStore>,
    ) -> Self {
        Self::with_clock(config, registry, counters, queues, clock::system())
    }

    /// Same as [`AdmissionControl::new`] with an explicit time source, for
    /// deterministic window buckets under test.
    pub fn with_clock(
        config: RestrictionConfig,
        registry: Arc<PolicyRegistry>,
        counters: Arc<dyn CounterStore>,
        queues: Arc<dyn QueueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limiter = RateLimiter::new(
            Arc::clone(&counters),
            clock,
            config.concurrent_key_expire_seconds,
        );
        let router = RestrictionRouter::new(
            Arc::clone(&queues),
            config.restriction_queue_prefix.clone(),
        );
        let hooks = LifecycleHooks::new(Arc::clone(&registry), limiter.clone());
        let scanner = Scanner::new(config, registry, limiter, router, counters, queues);
        Self { scanner, hooks }
    }

    /// Reserve the next admissible job from `queue`, diverting restricted
    /// invocations to their restriction queue. `Ok(None)` means no runnable
    /// job on this queue this cycle.
    pub async fn reserve(&self, queue: &str) -> Result<Option<JobInvocation>, ReserveError> {
        self.scanner.reserve(queue).await
    }

    /// Must run exactly once per admitted invocation, whatever the outcome.
    pub async fn after_execution(
        &self,
        invocation: &JobInvocation,
        outcome: ExecutionOutcome,
    ) -> Result<(), StoreError> {
        self.hooks.after_execution(invocation, outcome).await
    }

    /// Run `f` for an admitted invocation and release held concurrency
    /// capacity afterwards, on both success and failure.
    pub async fn execute<T, E, F, Fut>(&self, invocation: &JobInvocation, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.hooks.execute(invocation, f).await
    }
}
