//! Post-execution wiring. The surrounding scheduler either calls
//! [`LifecycleHooks::after_execution`] itself once per admitted invocation
//! (from its crash-recovery path too, or held `Concurrent` capacity leaks),
//! or runs the job through [`LifecycleHooks::execute`], which scopes the
//! release around the execution step.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::envelope::JobInvocation;
use crate::limiter::RateLimiter;
use crate::policy::PolicyRegistry;
use crate::store::StoreError;

/// How an invocation's execution ended. Release happens for all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    Succeeded,
    Failed,
    Errored,
}

pub struct LifecycleHooks {
    registry: Arc<PolicyRegistry>,
    limiter: RateLimiter,
}

impl LifecycleHooks {
    pub fn new(registry: Arc<PolicyRegistry>, limiter: RateLimiter) -> Self {
        Self { registry, limiter }
    }

    /// Release the invocation's held `Concurrent` capacity. The outcome is
    /// recorded for logging only; it never gates the release.
    pub async fn after_execution(
        &self,
        invocation: &JobInvocation,
        outcome: ExecutionOutcome,
    ) -> Result<(), StoreError> {
        debug!(
            job_type = invocation.job_type(),
            source_queue = invocation.source_queue(),
            ?outcome,
            "job execution finished"
        );
        if let Some(policy) = self.registry.get(invocation.job_type()) {
            self.limiter.release(policy, invocation.args()).await?;
        }
        Ok(())
    }

    /// Run `f` and release afterwards, on success and failure alike. A store
    /// failure during release is logged rather than returned, so the job's
    /// own result is never lost; the leaked slot lasts until the configured
    /// safety TTL (or forever without one).
    pub async fn execute<T, E, F, Fut>(&self, invocation: &JobInvocation, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let result = f().await;
        let outcome = if result.is_ok() {
            ExecutionOutcome::Succeeded
        } else {
            ExecutionOutcome::Failed
        };
        if let Err(err) = self.after_execution(invocation, outcome).await {
            warn!(
                job_type = invocation.job_type(),
                error = %err,
                "failed to release concurrency capacity after execution"
            );
        }
        result
    }
}
