//! services/api/src/adapters/price.rs
//!
//! This module contains the adapter for the Bitcoin price feed. It implements
//! the `PriceService` port from the `core` crate against a CoinGecko-style
//! simple-price endpoint and caches the result in-process.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use choreboard_core::ports::{PortError, PortResult, PriceService};
use tokio::sync::Mutex;
use tracing::warn;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

struct CachedPrice {
    fetched_at: Instant,
    price: f64,
}

/// An adapter that implements the `PriceService` port over HTTP, with a
/// time-based cache so the upstream API is hit at most once per TTL.
pub struct HttpPriceAdapter {
    client: reqwest::Client,
    api_url: String,
    currency: String,
    ttl: Duration,
    cache: Mutex<Option<CachedPrice>>,
}

impl HttpPriceAdapter {
    /// Creates a new `HttpPriceAdapter`.
    pub fn new(client: reqwest::Client, api_url: String, currency: String, ttl: Duration) -> Self {
        Self {
            client,
            api_url,
            currency,
            ttl,
            cache: Mutex::new(None),
        }
    }

    async fn fetch_price(&self) -> PortResult<f64> {
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("ids", "bitcoin"), ("vs_currencies", self.currency.as_str())])
            .send()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?
            .error_for_status()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        // Response shape: {"bitcoin": {"usd": 67000.0}}
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        body.get("bitcoin")
            .and_then(|b| b.get(&self.currency))
            .and_then(|p| p.as_f64())
            .ok_or_else(|| {
                PortError::Unexpected(format!("price feed returned no {} price", self.currency))
            })
    }
}

//=========================================================================================
// `PriceService` Trait Implementation
//=========================================================================================

#[async_trait]
impl PriceService for HttpPriceAdapter {
    async fn btc_price(&self) -> PortResult<f64> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                return Ok(cached.price);
            }
        }

        match self.fetch_price().await {
            Ok(price) => {
                *cache = Some(CachedPrice {
                    fetched_at: Instant::now(),
                    price,
                });
                Ok(price)
            }
            // A warm cache outlives its TTL rather than failing the request.
            Err(e) => match cache.as_ref() {
                Some(stale) => {
                    warn!("Price fetch failed, serving stale price: {}", e);
                    Ok(stale.price)
                }
                None => Err(e),
            },
        }
    }
}
