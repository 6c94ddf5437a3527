use chrono::{TimeZone, Utc};

use turnstile::keys::{
    counter_key, is_restriction_queue, restriction_queue_name, scan_admission_key,
};
use turnstile::period::Period;

#[turnstile::test]
fn test_window_counter_key_buckets_by_epoch_division() {
    let now = Utc.with_ymd_and_hms(2024, 5, 14, 10, 30, 0).unwrap();
    let bucket = now.timestamp() / 3600;
    assert_eq!(
        counter_key("EmailJob", Period::PerHour, now),
        format!("EmailJob:{}", bucket)
    );

    // Same window, same key; next window, different key.
    let later = now + chrono::Duration::minutes(10);
    assert_eq!(
        counter_key("EmailJob", Period::PerHour, now),
        counter_key("EmailJob", Period::PerHour, later)
    );
    let next_hour = now + chrono::Duration::hours(1);
    assert_ne!(
        counter_key("EmailJob", Period::PerHour, now),
        counter_key("EmailJob", Period::PerHour, next_hour)
    );
}

#[turnstile::test]
fn test_custom_window_counter_key() {
    let now = Utc.with_ymd_and_hms(2024, 5, 14, 10, 30, 0).unwrap();
    let bucket = now.timestamp() / 300;
    assert_eq!(
        counter_key("EmailJob", Period::PerSeconds(300), now),
        format!("EmailJob:{}", bucket)
    );
}

#[turnstile::test]
fn test_calendar_counter_keys() {
    let now = Utc.with_ymd_and_hms(2024, 5, 14, 10, 30, 0).unwrap();
    assert_eq!(counter_key("EmailJob", Period::PerMonth, now), "EmailJob:2024-05");
    assert_eq!(counter_key("EmailJob", Period::PerYear, now), "EmailJob:2024");
}

#[turnstile::test]
fn test_concurrent_counter_key_has_no_bucket() {
    let now = Utc.with_ymd_and_hms(2024, 5, 14, 10, 30, 0).unwrap();
    assert_eq!(counter_key("EmailJob", Period::Concurrent, now), "EmailJob:*");
}

#[turnstile::test]
fn test_restriction_queue_name_prefixes_unprefixed_names() {
    assert_eq!(restriction_queue_name("restriction", "normal"), "restriction_normal");
}

#[turnstile::test]
fn test_restriction_queue_name_is_idempotent() {
    assert_eq!(restriction_queue_name("restriction", "restriction_foo"), "restriction_foo");
    let once = restriction_queue_name("restriction", "foo");
    assert_eq!(restriction_queue_name("restriction", &once), once);
}

#[turnstile::test]
fn test_is_restriction_queue_requires_prefix_and_separator() {
    assert!(is_restriction_queue("restriction", "restriction_mail"));
    assert!(!is_restriction_queue("restriction", "mail"));
    // A queue merely starting with the token is not an overflow queue.
    assert!(!is_restriction_queue("restriction", "restrictionmail"));
}

#[turnstile::test]
fn test_scan_admission_key_scoped_by_prefix() {
    assert_eq!(scan_admission_key("restriction"), "restriction:scan_admission");
    assert_eq!(scan_admission_key("overflow"), "overflow:scan_admission");
}
