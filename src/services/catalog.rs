// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Product catalog reads with a cache-aside featured list.

use crate::db::Store;
use crate::error::AppError;
use crate::models::Product;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

const FEATURED_KEY: &str = "featured";

/// Cached product list with its expiry.
#[derive(Clone)]
pub struct CachedProducts {
    products: Vec<Product>,
    expires_at: DateTime<Utc>,
}

pub struct CatalogService {
    db: Arc<dyn Store>,
    cache: DashMap<&'static str, CachedProducts>,
    ttl: Duration,
}

impl CatalogService {
    pub fn new(db: Arc<dyn Store>, ttl_secs: i64) -> Self {
        Self {
            db,
            cache: DashMap::new(),
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// Featured products, served from cache while fresh.
    pub async fn featured_products(&self) -> Result<Vec<Product>, AppError> {
        let now = Utc::now();

        if let Some(cached) = self.cache.get(FEATURED_KEY) {
            if now < cached.expires_at {
                return Ok(cached.products.clone());
            }
        }

        // Miss or stale. Concurrent misses may each read the store; the last
        // writer wins and all of them return a fresh list.
        let products = self.db.list_featured_products().await?;
        self.cache.insert(
            FEATURED_KEY,
            CachedProducts {
                products: products.clone(),
                expires_at: now + self.ttl,
            },
        );
        tracing::debug!(count = products.len(), "Featured products cache refreshed");

        Ok(products)
    }

    /// Drop the cached featured list. Products are written outside this
    /// service, so in production entries only leave the cache by expiry.
    #[cfg(test)]
    pub(crate) fn invalidate(&self) {
        self.cache.remove(FEATURED_KEY);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryDb;

    fn product(id: &str, featured: bool) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            description: String::new(),
            price: 10.0,
            image_url: None,
            featured,
        }
    }

    #[tokio::test]
    async fn test_featured_served_from_cache_until_invalidated() {
        let db = Arc::new(MemoryDb::new());
        db.upsert_product(&product("p1", true)).await.unwrap();
        db.upsert_product(&product("p2", false)).await.unwrap();

        let catalog = CatalogService::new(db.clone(), 300);
        assert_eq!(catalog.featured_products().await.unwrap().len(), 1);

        db.upsert_product(&product("p3", true)).await.unwrap();
        assert_eq!(catalog.featured_products().await.unwrap().len(), 1);

        catalog.invalidate();
        assert_eq!(catalog.featured_products().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_ttl_always_reloads() {
        let db = Arc::new(MemoryDb::new());
        let catalog = CatalogService::new(db.clone(), 0);
        assert!(catalog.featured_products().await.unwrap().is_empty());

        db.upsert_product(&product("p1", true)).await.unwrap();
        assert_eq!(catalog.featured_products().await.unwrap().len(), 1);
    }
}
