//! The reservation entry point. Workers call [`Scanner::reserve`] once per
//! "next job" request against one named queue; the scanner pops candidates,
//! runs admission, and diverts rejects, so the worker only ever sees runnable
//! jobs or "no job".
//!
//! Restriction queues get extra treatment: repeated pop/push churn on a long
//! overflow list is expensive for the shared store, so the number of workers
//! draining any restriction queue at once is capped by a shared counter with
//! a TTL (a crashed holder's slot frees itself), and every scan is bounded to
//! `min(queue length, batch size)` cycles.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::envelope::{CodecError, JobEnvelope, JobInvocation};
use crate::keys;
use crate::limiter::{Admission, RateLimiter};
use crate::policy::PolicyRegistry;
use crate::router::{RestrictionRouter, RouteError};
use crate::settings::RestrictionConfig;
use crate::store::{CounterStore, QueueStore, StoreError};

#[derive(Debug, Error)]
pub enum ReserveError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("undecodable payload on queue {queue}: {source}")]
    Decode {
        queue: String,
        #[source]
        source: CodecError,
    },
    #[error("failed to requeue restricted invocation: {0}")]
    Requeue(#[from] RouteError),
}

pub struct Scanner {
    config: RestrictionConfig,
    registry: Arc<PolicyRegistry>,
    limiter: RateLimiter,
    router: RestrictionRouter,
    counters: Arc<dyn CounterStore>,
    queues: Arc<dyn QueueStore>,
}

impl Scanner {
    pub fn new(
        config: RestrictionConfig,
        registry: Arc<PolicyRegistry>,
        limiter: RateLimiter,
        router: RestrictionRouter,
        counters: Arc<dyn CounterStore>,
        queues: Arc<dyn QueueStore>,
    ) -> Self {
        Self {
            config,
            registry,
            limiter,
            router,
            counters,
            queues,
        }
    }

    /// Reserve the next admissible job from `queue`. `Ok(None)` means no
    /// runnable job this cycle; the scheduler should move on and revisit.
    pub async fn reserve(&self, queue: &str) -> Result<Option<JobInvocation>, ReserveError> {
        if self.router.is_restriction_queue(queue) {
            self.reserve_restricted(queue).await
        } else {
            self.scan(queue).await
        }
    }

    /// Pop one envelope. A popped item must never be dropped, so an
    /// undecodable payload goes back on the tail before the error surfaces.
    async fn pop_envelope(&self, queue: &str) -> Result<Option<JobEnvelope>, ReserveError> {
        let Some(payload) = self.queues.dequeue_head(queue).await? else {
            return Ok(None);
        };
        match JobEnvelope::decode(&payload) {
            Ok(envelope) => Ok(Some(envelope)),
            Err(source) => {
                self.queues.enqueue(queue, &payload).await?;
                Err(ReserveError::Decode {
                    queue: queue.to_string(),
                    source,
                })
            }
        }
    }

    /// Best-effort return of a popped envelope to the tail of `queue`, for
    /// error paths where the item would otherwise vanish.
    async fn requeue_popped(&self, queue: &str, envelope: &JobEnvelope) {
        let payload = match envelope.encode() {
            Ok(payload) => payload,
            Err(err) => {
                warn!(
                    queue,
                    job_type = %envelope.job_type,
                    error = %err,
                    "could not re-encode popped job for requeue"
                );
                return;
            }
        };
        if let Err(err) = self.queues.enqueue(queue, &payload).await {
            warn!(
                queue,
                job_type = %envelope.job_type,
                error = %err,
                "failed to requeue popped job after store error"
            );
        }
    }

    /// Pop/admit cycles over `queue`, bounded by `min(length, batch size)` so
    /// a fully restricted queue costs a predictable number of round trips per
    /// call. Restricted invocations go to the tail of their restriction queue
    /// (for a restriction queue, that is `queue` itself).
    async fn scan(&self, queue: &str) -> Result<Option<JobInvocation>, ReserveError> {
        let attempts = self
            .queues
            .length(queue)
            .await?
            .min(self.config.restriction_queue_batch_size);

        for _ in 0..attempts {
            let Some(envelope) = self.pop_envelope(queue).await? else {
                return Ok(None);
            };

            // Job types without a registered policy pass straight through.
            let Some(policy) = self.registry.get(&envelope.job_type) else {
                return Ok(Some(JobInvocation {
                    envelope,
                    source_queue: queue.to_string(),
                }));
            };

            let admission = match self.limiter.admit(policy, &envelope.args).await {
                Ok(admission) => admission,
                Err(err) => {
                    // The counter store failed mid-decision. The queue store
                    // is a separate backend and may be healthy, so put the
                    // popped item back on the tail before surfacing, same as
                    // the decode path.
                    self.requeue_popped(queue, &envelope).await;
                    return Err(err.into());
                }
            };

            match admission {
                Admission::Admitted => {
                    return Ok(Some(JobInvocation {
                        envelope,
                        source_queue: queue.to_string(),
                    }));
                }
                Admission::Restricted => {
                    self.router.push(Some(queue), policy, &envelope).await?;
                }
            }
        }

        debug!(queue, attempts, "no admissible job within scan bound");
        Ok(None)
    }

    /// Drain path for restriction queues, gated by the shared scan-admission
    /// counter.
    async fn reserve_restricted(&self, queue: &str) -> Result<Option<JobInvocation>, ReserveError> {
        let scan_key = keys::scan_admission_key(&self.config.restriction_queue_prefix);

        let slots = self.counters.increment(&scan_key).await?;
        if slots > self.config.scan_admission_max || slots < 0 {
            // Full (or the counter is damaged): back out without touching the
            // queue at all.
            self.counters.decrement(&scan_key).await?;
            debug!(queue, slots, "scan admission full");
            return Ok(None);
        }

        let result = self.drain(queue, &scan_key).await;

        // The slot is released on every exit path. If the decrement itself
        // fails, the key's TTL reclaims it; an already-reserved job is still
        // returned rather than dropped.
        if let Err(err) = self.counters.decrement(&scan_key).await {
            warn!(
                queue,
                error = %err,
                "failed to release scan admission slot; expiry will reclaim it"
            );
        }

        result
    }

    async fn drain(&self, queue: &str, scan_key: &str) -> Result<Option<JobInvocation>, ReserveError> {
        // Refresh the expiry only after winning a slot, so the counter still
        // lapses when every holder is wedged.
        self.counters
            .set_expiry(scan_key, self.config.scan_admission_expire_seconds)
            .await?;
        self.scan(queue).await
    }
}
