//! The admission decision. Counters count usage upward: admit increments each
//! period counter of the policy and compares the post-increment value against
//! the limit, rolling back every increment made in the call on the first
//! violation. Window counters stay incremented on success (capacity is spent
//! at reservation time); `Concurrent` counters stay incremented until
//! [`RateLimiter::release`].

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::clock::Clock;
use crate::keys;
use crate::period::Period;
use crate::policy::JobPolicy;
use crate::store::{CounterStore, StoreError};

/// Outcome of an admission check. Restriction is a control outcome, not an
/// error: the invocation is still runnable later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    Restricted,
}

impl Admission {
    pub fn is_restricted(&self) -> bool {
        matches!(self, Admission::Restricted)
    }
}

/// Usage snapshot for one period of a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodUsage {
    pub period: Period,
    pub limit: i64,
    pub used: i64,
}

#[derive(Clone)]
pub struct RateLimiter {
    counters: Arc<dyn CounterStore>,
    clock: Arc<dyn Clock>,
    concurrent_key_expire_seconds: Option<u64>,
}

impl RateLimiter {
    pub fn new(
        counters: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
        concurrent_key_expire_seconds: Option<u64>,
    ) -> Self {
        Self {
            counters,
            clock,
            concurrent_key_expire_seconds,
        }
    }

    /// Check every period of `policy` in registration order. All periods must
    /// pass; on the first violation every counter incremented by this call is
    /// decremented again (the violating one included), so a rejected attempt
    /// never leaves a net increment behind.
    pub async fn admit(&self, policy: &JobPolicy, args: &[Value]) -> Result<Admission, StoreError> {
        let identifier = policy.identifier(args);
        let now = self.clock.now();
        let mut incremented: Vec<String> = Vec::with_capacity(policy.limits().len());

        for &(period, limit) in policy.limits() {
            let key = keys::counter_key(&identifier, period, now);
            let value = self.counters.increment(&key).await?;

            if value == 1 {
                // First increment of this bucket: attach the expiry. Window
                // counters live exactly one window; Concurrent counters only
                // get the optional safety TTL.
                let ttl = match period.window_seconds() {
                    Some(secs) => Some(secs),
                    None => self.concurrent_key_expire_seconds,
                };
                if let Some(secs) = ttl {
                    self.counters.set_expiry(&key, secs).await?;
                }
            }

            incremented.push(key);
            if value > limit {
                debug!(
                    job_type = policy.name(),
                    %identifier,
                    %period,
                    limit,
                    value,
                    "admission restricted"
                );
                // Rolled-back counters are not deleted, even at zero: another
                // worker's increment between our decrement and a delete would
                // be wiped out. A key rolled back to zero just keeps (or, on
                // its next first increment, renews) its TTL; the bucket token
                // in the key keeps stale windows from ever being re-read.
                for k in &incremented {
                    self.counters.decrement(k).await?;
                }
                return Ok(Admission::Restricted);
            }
        }

        Ok(Admission::Admitted)
    }

    /// Give back held `Concurrent` capacity. Must run exactly once per
    /// admitted invocation, whatever the execution outcome. No-op for
    /// policies without a `Concurrent` period.
    pub async fn release(&self, policy: &JobPolicy, args: &[Value]) -> Result<(), StoreError> {
        if !policy.has_concurrent_limit() {
            return Ok(());
        }
        let identifier = policy.identifier(args);
        let now = self.clock.now();
        for &(period, _) in policy.limits() {
            if period.is_concurrent() {
                let key = keys::counter_key(&identifier, period, now);
                let value = self.counters.decrement(&key).await?;
                if value < 0 {
                    // The safety TTL already reclaimed this slot while the
                    // job ran; undo the underflow so the counter is never
                    // left negative.
                    self.counters.increment(&key).await?;
                }
                debug!(
                    job_type = policy.name(),
                    %identifier,
                    value,
                    "released concurrent slot"
                );
            }
        }
        Ok(())
    }

    /// Read-only snapshot of current counter values for every period of the
    /// policy, for operator inspection. Absent counters read as zero.
    pub async fn usage(
        &self,
        policy: &JobPolicy,
        args: &[Value],
    ) -> Result<Vec<PeriodUsage>, StoreError> {
        let identifier = policy.identifier(args);
        let now = self.clock.now();
        let mut out = Vec::with_capacity(policy.limits().len());
        for &(period, limit) in policy.limits() {
            let key = keys::counter_key(&identifier, period, now);
            let used = self.counters.get(&key).await?.unwrap_or(0);
            out.push(PeriodUsage {
                period,
                limit,
                used,
            });
        }
        Ok(out)
    }
}
