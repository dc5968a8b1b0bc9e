// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg(feature = "serde")]

//! Binding `ExpirationPolicy` from configuration.

use std::time::Duration;

use cacheside_tier::ExpirationPolicy;

#[test]
fn missing_fields_fall_back_to_default_policy() {
    let policy: ExpirationPolicy = serde_json::from_str("{}").unwrap();
    assert_eq!(policy, ExpirationPolicy::default());
}

#[test]
fn explicit_fields_override_defaults() {
    let json = r#"{
        "absolute_expiration": null,
        "absolute_expiration_relative_to_now": { "secs": 60, "nanos": 0 },
        "sliding_expiration": null
    }"#;
    let policy: ExpirationPolicy = serde_json::from_str(json).unwrap();

    assert_eq!(policy.absolute_expiration_relative_to_now(), Some(Duration::from_secs(60)));
    assert_eq!(policy.sliding_expiration(), None);
}

#[test]
fn policy_survives_serialization() {
    let policy = ExpirationPolicy::none().with_sliding_expiration(Duration::from_secs(90));
    let json = serde_json::to_string(&policy).unwrap();
    assert_eq!(serde_json::from_str::<ExpirationPolicy>(&json).unwrap(), policy);
}
