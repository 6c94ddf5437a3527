use std::collections::HashMap;
use std::fmt;

use serde_json::Value;

use crate::period::Period;

type IdentifierFn = dyn Fn(&[Value]) -> String + Send + Sync;

/// The restriction policy for one job type: an ordered set of period limits,
/// the queue the type runs on by default, and an optional override that folds
/// selected arguments into the counter scope (e.g. per-tenant limits).
pub struct JobPolicy {
    name: String,
    default_queue: String,
    limits: Vec<(Period, i64)>,
    identifier: Option<Box<IdentifierFn>>,
}

impl JobPolicy {
    pub fn new(name: impl Into<String>, default_queue: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default_queue: default_queue.into(),
            limits: Vec::new(),
            identifier: None,
        }
    }

    /// Add a period limit. Repeatable; calls merge, last write per period
    /// wins while keeping the period's original position, since admission
    /// evaluates periods in registration order.
    pub fn restrict(mut self, period: Period, limit: i64) -> Self {
        match self.limits.iter_mut().find(|(p, _)| *p == period) {
            Some(entry) => entry.1 = limit,
            None => self.limits.push((period, limit)),
        }
        self
    }

    /// Override the counter scope. The default scope is the job type name,
    /// giving one shared budget per type; an override can return e.g.
    /// `"EmailJob:{tenant}"` for independent per-tenant budgets.
    pub fn identified_by<F>(mut self, f: F) -> Self
    where
        F: Fn(&[Value]) -> String + Send + Sync + 'static,
    {
        self.identifier = Some(Box::new(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_queue(&self) -> &str {
        &self.default_queue
    }

    /// Period limits in registration order.
    pub fn limits(&self) -> &[(Period, i64)] {
        &self.limits
    }

    pub fn identifier(&self, args: &[Value]) -> String {
        match &self.identifier {
            Some(f) => f(args),
            None => self.name.clone(),
        }
    }

    pub fn has_concurrent_limit(&self) -> bool {
        self.limits.iter().any(|(p, _)| p.is_concurrent())
    }
}

impl fmt::Debug for JobPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobPolicy")
            .field("name", &self.name)
            .field("default_queue", &self.default_queue)
            .field("limits", &self.limits)
            .field("custom_identifier", &self.identifier.is_some())
            .finish()
    }
}

/// Job types with a restriction policy, looked up by type name. Built once at
/// startup and immutable afterwards; job types without an entry pass through
/// admission untouched.
#[derive(Debug, Default)]
pub struct PolicyRegistry {
    types: HashMap<String, JobPolicy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a policy, replacing any previous policy for the same type.
    pub fn register(&mut self, policy: JobPolicy) {
        self.types.insert(policy.name().to_string(), policy);
    }

    pub fn get(&self, job_type: &str) -> Option<&JobPolicy> {
        self.types.get(job_type)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}
