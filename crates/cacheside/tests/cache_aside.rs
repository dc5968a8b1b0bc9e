// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Integration tests for the cache-aside family of `CacheAccessor`.

use std::{
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use cacheside::{CacheAccessor, CancellationToken, ExpirationPolicy};
use cacheside_tier::testing::{CacheOp, MockDistributedCache};

fn block_on<F: std::future::Future>(f: F) -> F::Output {
    futures::executor::block_on(f)
}

fn setup() -> (MockDistributedCache, CacheAccessor<MockDistributedCache>, CancellationToken) {
    let mock = MockDistributedCache::new();
    let accessor = CacheAccessor::new(mock.clone());
    (mock, accessor, CancellationToken::new())
}

#[derive(Debug)]
struct UpstreamError;

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("upstream unavailable")
    }
}

impl std::error::Error for UpstreamError {}

#[test]
fn hit_returns_cached_value_without_calling_producer() {
    block_on(async {
        let (mock, accessor, token) = setup();
        mock.put_raw("k", b"\"cached\"".to_vec());

        let value: String = accessor
            .get_or_insert("k", None, &token, || async { panic!("producer must not run on a hit") })
            .await
            .unwrap();

        assert_eq!(value, "cached");
        assert!(mock.writes().is_empty());
    });
}

#[test]
fn miss_produces_writes_and_returns() {
    block_on(async {
        let (mock, accessor, token) = setup();

        let value: String = accessor
            .get_or_insert("k", None, &token, || async { "fresh".to_string() })
            .await
            .unwrap();

        assert_eq!(value, "fresh");
        assert_eq!(mock.raw("k").unwrap(), b"\"fresh\"");

        let writes = mock.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].2, ExpirationPolicy::DEFAULT);
        assert_eq!(
            mock.operations()
                .iter()
                .filter(|op| matches!(op, CacheOp::Get(_)))
                .count(),
            1
        );
    });
}

#[test]
fn per_call_policy_overrides_default() {
    block_on(async {
        let (mock, accessor, token) = setup();
        let policy = ExpirationPolicy::none().with_absolute_expiration_relative_to_now(Duration::from_secs(90));

        let _: i32 = accessor.get_or_insert("k", Some(&policy), &token, || async { 5 }).await.unwrap();

        assert_eq!(mock.writes()[0].2, policy);
    });
}

#[test]
fn second_call_uses_cached_value() {
    block_on(async {
        let (_mock, accessor, token) = setup();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: u32 = accessor
                .get_or_insert("k", None, &token, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    99
                })
                .await
                .unwrap();
            assert_eq!(value, 99);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    });
}

#[test]
fn malformed_entry_is_a_decode_error() {
    block_on(async {
        let (mock, accessor, token) = setup();
        mock.put_raw("k", b"<html>".to_vec());

        let error = accessor
            .get_or_insert::<i32, _>("k", None, &token, || async { panic!("producer must not run") })
            .await
            .unwrap_err();

        assert!(error.is_decode());
        assert!(error.to_string().contains('k'));
        // The malformed entry is left in place.
        assert_eq!(mock.raw("k").unwrap(), b"<html>");
        assert!(mock.writes().is_empty());
    });
}

#[test]
fn read_failure_skips_producer() {
    block_on(async {
        let (mock, accessor, token) = setup();
        mock.fail_when(|op| matches!(op, CacheOp::Get(_)));
        let called = AtomicUsize::new(0);

        let error = accessor
            .get_or_insert("k", None, &token, || async {
                called.fetch_add(1, Ordering::SeqCst);
                1
            })
            .await
            .unwrap_err();

        assert!(error.is_transport());
        assert_eq!(called.load(Ordering::SeqCst), 0);
    });
}

#[test]
fn write_failure_propagates_after_producing() {
    block_on(async {
        let (mock, accessor, token) = setup();
        mock.fail_when(|op| matches!(op, CacheOp::Set { .. }));

        let error = accessor.get_or_insert("k", None, &token, || async { 1 }).await.unwrap_err();

        assert!(error.is_transport());
        assert!(!mock.contains_key("k"));
    });
}

#[test]
fn unencodable_value_is_not_written() {
    block_on(async {
        let (mock, accessor, token) = setup();

        let error = accessor
            .get_or_insert("k", None, &token, || async { std::collections::HashMap::from([((1, 2), 3)]) })
            .await
            .unwrap_err();

        assert!(error.is_encode());
        assert!(mock.writes().is_empty());
    });
}

#[test]
fn try_variant_caches_success() {
    block_on(async {
        let (mock, accessor, token) = setup();

        let value: i32 = accessor
            .try_get_or_insert("k", None, &token, || async { Ok::<_, UpstreamError>(7) })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(mock.raw("k").unwrap(), b"7");
    });
}

#[test]
fn try_variant_propagates_producer_error_without_writing() {
    block_on(async {
        let (mock, accessor, token) = setup();

        let error = accessor
            .try_get_or_insert::<i32, _, _>("k", None, &token, || async { Err(UpstreamError) })
            .await
            .unwrap_err();

        assert!(error.is_producer());
        assert!(error.producer_error::<UpstreamError>().is_some());
        assert!(mock.writes().is_empty());

        // The failure is not cached, so the next call produces again.
        let value: i32 = accessor
            .try_get_or_insert("k", None, &token, || async { Ok::<_, UpstreamError>(8) })
            .await
            .unwrap();
        assert_eq!(value, 8);
    });
}

#[test]
fn absent_value_is_returned_but_not_cached() {
    block_on(async {
        let (mock, accessor, token) = setup();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Option<String> = accessor
                .get_or_insert("k", None, &token, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    None
                })
                .await
                .unwrap();
            assert_eq!(value, None);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(mock.writes().is_empty());
        assert!(!mock.contains_key("k"));
    });
}

#[test]
fn present_option_value_is_cached() {
    block_on(async {
        let (mock, accessor, token) = setup();

        let value: Option<String> = accessor
            .get_or_insert("k", None, &token, || async { Some("found".to_string()) })
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("found"));
        assert_eq!(mock.raw("k").unwrap(), b"\"found\"");

        let again: Option<String> = accessor
            .get_or_insert("k", None, &token, || async { panic!("producer must not run on a hit") })
            .await
            .unwrap();
        assert_eq!(again.as_deref(), Some("found"));
    });
}

#[test]
fn try_variant_does_not_cache_absent_value_under_empty_key() {
    block_on(async {
        let (mock, accessor, token) = setup();

        let value: Option<u32> = accessor
            .try_get_or_insert("", None, &token, || async { Ok::<_, UpstreamError>(None) })
            .await
            .unwrap();

        assert_eq!(value, None);
        assert!(mock.writes().is_empty());
        assert!(!mock.contains_key(""));
    });
}

#[test]
fn optional_variant_returns_absent_without_writing() {
    block_on(async {
        let (mock, accessor, token) = setup();

        let value: Option<String> = accessor
            .optionally_get_or_insert("k", None, &token, || async { None })
            .await
            .unwrap();

        assert_eq!(value, None);
        assert!(mock.writes().is_empty());
        assert!(!mock.contains_key("k"));
    });
}

#[test]
fn optional_variant_caches_present_value() {
    block_on(async {
        let (mock, accessor, token) = setup();

        let value = accessor
            .optionally_get_or_insert("k", None, &token, || async { Some("found".to_string()) })
            .await
            .unwrap();
        assert_eq!(value.as_deref(), Some("found"));
        assert_eq!(mock.writes().len(), 1);

        let again: Option<String> = accessor
            .optionally_get_or_insert("k", None, &token, || async { None })
            .await
            .unwrap();
        assert_eq!(again.as_deref(), Some("found"));
    });
}

#[test]
fn optional_variant_retries_producer_after_absent_result() {
    block_on(async {
        let (_mock, accessor, token) = setup();
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Option<u8> = accessor
                .optionally_get_or_insert("k", None, &token, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    None
                })
                .await
                .unwrap();
            assert_eq!(value, None);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    });
}

#[test]
fn concurrent_misses_without_protection_may_both_produce() {
    let accessor = Arc::new(CacheAccessor::in_memory());
    let calls = Arc::new(AtomicUsize::new(0));
    let token = CancellationToken::new();

    block_on(async {
        let first = accessor.get_or_insert("k", None, &token, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            1
        });
        let second = accessor.get_or_insert("k", None, &token, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            2
        });

        let (a, b): (cacheside::Result<i32>, cacheside::Result<i32>) = futures::join!(first, second);
        a.unwrap();
        b.unwrap();
    });

    // Both produced or one saw the other's write; either way the entry holds one of them.
    let stored: Option<i32> = block_on(accessor.try_get("k", &token)).unwrap();
    assert!(matches!(stored, Some(1 | 2)));
    assert!((1..=2).contains(&calls.load(Ordering::SeqCst)));
}
