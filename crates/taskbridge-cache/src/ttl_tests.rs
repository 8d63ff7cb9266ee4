use super::*;
use std::sync::Arc;
use std::thread;

fn cache(default_ttl: Option<Duration>) -> TtlCache<String, String> {
    TtlCache::new("test", default_ttl)
}

#[test]
fn test_get_after_set() {
    let cache = cache(None);
    cache.set("k".to_string(), "v".to_string(), Some(Duration::from_secs(60)));
    assert_eq!(cache.get("k"), Some("v".to_string()));
}

#[test]
fn test_get_after_ttl_elapses() {
    let cache = cache(None);
    cache.set("k".to_string(), "v".to_string(), Some(Duration::from_millis(30)));
    thread::sleep(Duration::from_millis(60));

    assert_eq!(cache.get("k"), None);
    // Lazy eviction removed the entry.
    assert_eq!(cache.len(), 0);
}

#[test]
fn test_default_ttl_applies() {
    let cache = cache(Some(Duration::from_millis(30)));
    cache.set("k".to_string(), "v".to_string(), None);
    assert!(cache.contains("k"));

    thread::sleep(Duration::from_millis(60));
    assert!(!cache.contains("k"));
}

#[test]
fn test_explicit_ttl_overrides_default() {
    let cache = cache(Some(Duration::from_millis(10)));
    cache.set("k".to_string(), "v".to_string(), Some(Duration::from_secs(60)));
    thread::sleep(Duration::from_millis(30));
    assert_eq!(cache.get("k"), Some("v".to_string()));
}

#[test]
fn test_hits_and_misses_sum_to_gets() {
    let cache = cache(None);
    cache.set("present".to_string(), "v".to_string(), None);

    let n = 25;
    for i in 0..n {
        if i % 3 == 0 {
            cache.get("absent");
        } else {
            cache.get("present");
        }
    }

    let stats = cache.stats();
    assert_eq!(stats.hits + stats.misses, n);
    assert_eq!(stats.misses, 9);
    assert_eq!(stats.hits, 16);
}

#[test]
fn test_delete_and_clear() {
    let cache = cache(None);
    cache.set("a".to_string(), "1".to_string(), None);
    cache.set("b".to_string(), "2".to_string(), None);

    assert!(cache.delete("a"));
    assert!(!cache.delete("a"));
    assert_eq!(cache.len(), 1);

    cache.clear();
    assert!(cache.is_empty());
}

#[test]
fn test_cleanup_expired() {
    let cache = cache(None);
    cache.set("short".to_string(), "1".to_string(), Some(Duration::from_millis(10)));
    cache.set("forever".to_string(), "2".to_string(), None);
    thread::sleep(Duration::from_millis(30));

    assert_eq!(cache.cleanup_expired(), 1);
    assert_eq!(cache.len(), 1);
    assert!(cache.contains("forever"));
}

#[test]
fn test_contains_does_not_count() {
    let cache = cache(None);
    cache.set("k".to_string(), "v".to_string(), None);
    assert!(cache.contains("k"));
    assert!(!cache.contains("other"));

    let stats = cache.stats();
    assert_eq!(stats.total_requests(), 0);
}

#[test]
fn test_hit_rate() {
    let cache = cache(None);
    assert_eq!(cache.hit_rate(), 0.0);

    cache.set("k".to_string(), "v".to_string(), None);
    cache.get("k");
    cache.get("missing");
    assert!((cache.hit_rate() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn test_concurrent_access() {
    let cache = Arc::new(TtlCache::<u32, u32>::new("shared", None));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 0..100 {
                    cache.set(t * 1000 + i, i, None);
                    cache.get(&(t * 1000 + i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = cache.stats();
    assert_eq!(stats.size, 400);
    assert_eq!(stats.hits, 400);
    assert_eq!(stats.misses, 0);
}

#[test]
fn test_stats_serialize() {
    let cache = cache(None);
    cache.get("x");
    let json = serde_json::to_value(cache.stats()).unwrap();
    assert_eq!(json["name"], "test");
    assert_eq!(json["misses"], 1);
}
