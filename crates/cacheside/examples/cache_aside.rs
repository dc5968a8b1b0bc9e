// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Cache-Aside Example
//!
//! Demonstrates `get_or_insert`, `try_get_or_insert` and `optionally_get_or_insert`
//! with structured logs enabled and stampede protection turned on.

use std::time::Duration;

use cacheside::{CacheAccessor, CancellationToken, InMemoryDistributedCache};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Product {
    sku: String,
    price_cents: u64,
}

#[derive(Debug)]
struct CatalogError(String);

impl std::fmt::Display for CatalogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "catalog lookup failed: {}", self.0)
    }
}

impl std::error::Error for CatalogError {}

/// Simulates a slow catalog database.
async fn load_product(sku: &str) -> Result<Product, CatalogError> {
    tokio::time::sleep(Duration::from_millis(100)).await;
    if sku == "broken" {
        return Err(CatalogError(sku.to_string()));
    }
    Ok(Product {
        sku: sku.to_string(),
        price_cents: 1299,
    })
}

/// Simulates a lookup that may find nothing.
async fn find_discount(sku: &str) -> Option<u8> {
    tokio::time::sleep(Duration::from_millis(20)).await;
    (sku == "sku-1").then_some(15)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).init();

    let accessor = CacheAccessor::builder(InMemoryDistributedCache::new())
        .name("catalog")
        .stampede_protection()
        .logs()
        .build();
    let token = CancellationToken::new();

    // First call misses and loads; the second is served from the cache.
    for _ in 0..2 {
        let product = accessor
            .try_get_or_insert("product:sku-1", None, &token, || load_product("sku-1"))
            .await;
        println!("product:sku-1 = {product:?}");
    }

    // Producer failures are returned and nothing is cached.
    match accessor
        .try_get_or_insert::<Product, _, _>("product:broken", None, &token, || load_product("broken"))
        .await
    {
        Ok(product) => println!("unexpected product {product:?}"),
        Err(error) => println!("failed as expected: {error} ({:?})", error.producer_error::<CatalogError>()),
    }

    // An absent result is returned but not cached.
    let discount = accessor
        .optionally_get_or_insert("discount:sku-2", None, &token, || find_discount("sku-2"))
        .await;
    println!("discount:sku-2 = {discount:?}");

    // Plain producers always yield a value.
    let banner: String = accessor
        .get_or_insert("banner", None, &token, || async { "Spring sale".to_string() })
        .await
        .unwrap_or_default();
    println!("banner = {banner}");
}
