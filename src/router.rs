use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::envelope::{CodecError, JobEnvelope};
use crate::keys;
use crate::policy::JobPolicy;
use crate::store::{QueueStore, StoreError};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// Routes restricted invocations to their per-source overflow queue.
pub struct RestrictionRouter {
    queues: Arc<dyn QueueStore>,
    prefix: String,
}

impl RestrictionRouter {
    pub fn new(queues: Arc<dyn QueueStore>, prefix: String) -> Self {
        Self { queues, prefix }
    }

    /// The restriction queue for `source_queue`, falling back to the policy's
    /// declared default queue when the source is unknown. Stable under
    /// repeated application.
    pub fn queue_name(&self, source_queue: Option<&str>, policy: &JobPolicy) -> String {
        let source = source_queue.unwrap_or_else(|| policy.default_queue());
        keys::restriction_queue_name(&self.prefix, source)
    }

    pub fn is_restriction_queue(&self, queue: &str) -> bool {
        keys::is_restriction_queue(&self.prefix, queue)
    }

    /// Enqueue a restricted invocation onto the tail of its restriction
    /// queue. Returns the queue it landed on.
    pub async fn push(
        &self,
        source_queue: Option<&str>,
        policy: &JobPolicy,
        envelope: &JobEnvelope,
    ) -> Result<String, RouteError> {
        let queue = self.queue_name(source_queue, policy);
        let payload = envelope.encode()?;
        self.queues.enqueue(&queue, &payload).await?;
        debug!(
            job_type = %envelope.job_type,
            %queue,
            "diverted restricted invocation"
        );
        Ok(queue)
    }
}
