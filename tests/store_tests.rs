use turnstile::envelope::JobEnvelope;
use turnstile::store::{CounterStore, MemoryStore, QueueStore};

#[turnstile::test]
async fn test_counters_return_post_operation_values() {
    let store = MemoryStore::new();
    assert_eq!(store.increment("k").await.unwrap(), 1);
    assert_eq!(store.increment("k").await.unwrap(), 2);
    assert_eq!(store.increment_by("k", 5).await.unwrap(), 7);
    assert_eq!(store.decrement("k").await.unwrap(), 6);
    assert_eq!(store.decrement_by("k", 6).await.unwrap(), 0);
    assert_eq!(store.get("k").await.unwrap(), Some(0));
    assert_eq!(store.get("absent").await.unwrap(), None);
}

#[turnstile::test]
async fn test_set_if_absent_only_sets_once() {
    let store = MemoryStore::new();
    assert!(store.set_if_absent("k", 9).await.unwrap());
    assert!(!store.set_if_absent("k", 1).await.unwrap());
    assert_eq!(store.get("k").await.unwrap(), Some(9));
}

#[turnstile::test]
async fn test_get_and_set_returns_previous_and_drops_expiry() {
    let store = MemoryStore::new();
    assert_eq!(store.get_and_set("k", 3).await.unwrap(), None);
    store.set_expiry("k", 100).await.unwrap();
    assert_eq!(store.get_and_set("k", 8).await.unwrap(), Some(3));
    assert_eq!(store.time_to_live("k").await.unwrap(), None);
}

#[turnstile::test]
async fn test_expiry_lifecycle() {
    let store = MemoryStore::new();
    assert_eq!(store.time_to_live("k").await.unwrap(), None);
    store.increment("k").await.unwrap();
    assert_eq!(store.time_to_live("k").await.unwrap(), None);
    store.set_expiry("k", 120).await.unwrap();
    let ttl = store.time_to_live("k").await.unwrap().unwrap();
    assert!(ttl <= 120 && ttl >= 118);
    store.delete("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[turnstile::test]
async fn test_queue_is_fifo() {
    let store = MemoryStore::new();
    store.enqueue("q", "a").await.unwrap();
    store.enqueue("q", "b").await.unwrap();
    assert_eq!(store.length("q").await.unwrap(), 2);
    assert_eq!(store.dequeue_head("q").await.unwrap().as_deref(), Some("a"));
    assert_eq!(store.dequeue_head("q").await.unwrap().as_deref(), Some("b"));
    assert_eq!(store.dequeue_head("q").await.unwrap(), None);
    assert_eq!(store.length("q").await.unwrap(), 0);
}

#[turnstile::test]
fn test_envelope_wire_format() {
    let env = JobEnvelope::new("EmailJob", vec![serde_json::json!("acme"), serde_json::json!(3)]);
    let payload = env.encode().unwrap();
    assert_eq!(payload, r#"{"class":"EmailJob","args":["acme",3]}"#);
    assert_eq!(JobEnvelope::decode(&payload).unwrap(), env);

    // Envelopes written by other tooling may omit args entirely.
    let bare = JobEnvelope::decode(r#"{"class":"EmailJob"}"#).unwrap();
    assert!(bare.args.is_empty());
    assert!(JobEnvelope::decode("not json").is_err());
}
