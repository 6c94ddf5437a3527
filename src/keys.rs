//! Key and queue-name derivation. Pure string helpers; every component that
//! touches the shared store goes through these so tests can assert the exact
//! layout.

use chrono::{DateTime, Utc};

use crate::period::Period;

/// The counter key for one (identifier, period) pair at time `now`:
/// `<identifier>:<bucket>`, where the bucket token is `*` for `Concurrent`
/// and the window bucket otherwise. All invocations in the same window share
/// one counter.
pub fn counter_key(identifier: &str, period: Period, now: DateTime<Utc>) -> String {
    format!("{}:{}", identifier, period.bucket_token(now))
}

/// The shared counter bounding how many workers may drain restriction queues
/// at once.
pub fn scan_admission_key(prefix: &str) -> String {
    format!("{}:scan_admission", prefix)
}

/// Derive the restriction queue for a source queue. Idempotent: a name that
/// already carries the prefix is returned unchanged.
pub fn restriction_queue_name(prefix: &str, source_queue: &str) -> String {
    if is_restriction_queue(prefix, source_queue) {
        source_queue.to_string()
    } else {
        format!("{}_{}", prefix, source_queue)
    }
}

/// Whether `queue` is a restriction (overflow) queue under `prefix`.
pub fn is_restriction_queue(prefix: &str, queue: &str) -> bool {
    queue
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.starts_with('_'))
}
