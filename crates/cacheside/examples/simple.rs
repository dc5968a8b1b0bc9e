// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Simple Accessor Example
//!
//! Typed writes and tolerant reads over the in-memory transport.

use std::time::Duration;

use cacheside::{CacheAccessor, CancellationToken, ExpirationPolicy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Serialize, Deserialize)]
struct Settings {
    theme: String,
    page_size: u32,
}

#[tokio::main]
async fn main() -> Result<(), cacheside::Error> {
    let accessor = CacheAccessor::in_memory();
    let token = CancellationToken::new();

    let settings = Settings {
        theme: "dark".to_string(),
        page_size: 50,
    };
    accessor.set("settings:42", &settings, None, &token).await?;

    let found: Option<Settings> = accessor.try_get("settings:42", &token).await?;
    println!("try_get(settings:42) = {found:?}");

    // Missing keys fall back to the type's default or to a supplied one.
    let missing: Settings = accessor.get("settings:7", &token).await?;
    println!("get(settings:7) = {missing:?}");

    let page_size: u32 = accessor.get_or_default("page_size", 25, &token).await?;
    println!("get_or_default(page_size) = {page_size}");

    // Short-lived entries take a per-call policy.
    let brief = ExpirationPolicy::none().with_absolute_expiration_relative_to_now(Duration::from_millis(50));
    accessor.set("otp", &"314159", Some(&brief), &token).await?;
    tokio::time::sleep(Duration::from_millis(100)).await;

    let otp: Option<String> = accessor.try_get("otp", &token).await?;
    println!("try_get(otp) after expiry = {otp:?}");

    accessor.remove("settings:42", &token).await?;
    Ok(())
}
