//! CoinGecko market data client.
//!
//! Every public method is best-effort: failures are logged and collapse to
//! `None` or an empty vector so price display never takes the API down with
//! it. Symbols map to CoinGecko ids via a fixed table, falling back to the
//! lowercased symbol for anything unlisted.

use serde::Deserialize;
use shared::{ChartPoint, MarketPrice};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

const COINGECKO_API: &str = "https://api.coingecko.com/api/v3";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Symbol → CoinGecko id for the currencies the platform trades in.
fn coin_id(symbol: &str) -> String {
    match symbol.to_uppercase().as_str() {
        "BTC" => "bitcoin",
        "ETH" => "ethereum",
        "BNB" => "binancecoin",
        "TRX" => "tron",
        "SOL" => "solana",
        "USDT" => "tether",
        "USDC" => "usd-coin",
        "XRP" => "ripple",
        "ADA" => "cardano",
        "DOGE" => "dogecoin",
        _ => return symbol.to_lowercase(),
    }
    .to_string()
}

#[derive(Debug, Deserialize)]
struct SimplePriceEntry {
    usd: f64,
    usd_24h_change: Option<f64>,
    usd_24h_vol: Option<f64>,
    usd_market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct MarketChart {
    prices: Vec<(i64, f64)>,
}

#[derive(Debug, Deserialize)]
struct CoinMarket {
    symbol: String,
    current_price: f64,
    price_change_percentage_24h: Option<f64>,
    total_volume: Option<f64>,
    market_cap: Option<f64>,
}

#[derive(Clone)]
pub struct MarketDataClient {
    http: reqwest::Client,
    api_url: String,
}

impl MarketDataClient {
    pub fn new() -> Self {
        Self::with_api_url(COINGECKO_API)
    }

    pub fn with_api_url(api_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn get_current_price(&self, symbol: &str) -> Option<MarketPrice> {
        let id = coin_id(symbol);
        let url = format!(
            "{}/simple/price?ids={}&vs_currencies=usd&include_24hr_change=true\
             &include_24hr_vol=true&include_market_cap=true",
            self.api_url, id
        );

        let response = match self.http.get(&url).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!("[MARKET] price fetch for {} returned {}", symbol, r.status());
                return None;
            }
            Err(e) => {
                warn!("[MARKET] price fetch for {} failed: {}", symbol, e);
                return None;
            }
        };

        let mut body: HashMap<String, SimplePriceEntry> = match response.json().await {
            Ok(b) => b,
            Err(e) => {
                warn!("[MARKET] bad price response for {}: {}", symbol, e);
                return None;
            }
        };

        let entry = body.remove(&id)?;
        Some(MarketPrice {
            symbol: symbol.to_uppercase(),
            price: entry.usd,
            change_24h: entry.usd_24h_change.unwrap_or(0.0),
            volume_24h: entry.usd_24h_vol.unwrap_or(0.0),
            market_cap: entry.usd_market_cap.unwrap_or(0.0),
            timestamp: chrono::Utc::now().timestamp_millis(),
        })
    }

    /// Concurrent fan-out; symbols that fail to resolve are dropped.
    pub async fn get_multiple_prices(&self, symbols: &[&str]) -> Vec<MarketPrice> {
        let handles: Vec<_> = symbols
            .iter()
            .map(|symbol| {
                let client = self.clone();
                let symbol = symbol.to_string();
                tokio::spawn(async move { client.get_current_price(&symbol).await })
            })
            .collect();

        let mut prices = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(Some(price)) = handle.await {
                prices.push(price);
            }
        }
        prices
    }

    pub async fn get_historical_data(&self, symbol: &str, days: u32) -> Vec<ChartPoint> {
        let url = format!(
            "{}/coins/{}/market_chart?vs_currency=usd&days={}",
            self.api_url,
            coin_id(symbol),
            days
        );

        let chart = match self.http.get(&url).send().await {
            Ok(r) if r.status().is_success() => match r.json::<MarketChart>().await {
                Ok(c) => c,
                Err(e) => {
                    warn!("[MARKET] bad chart response for {}: {}", symbol, e);
                    return Vec::new();
                }
            },
            Ok(r) => {
                warn!("[MARKET] chart fetch for {} returned {}", symbol, r.status());
                return Vec::new();
            }
            Err(e) => {
                warn!("[MARKET] chart fetch for {} failed: {}", symbol, e);
                return Vec::new();
            }
        };

        chart
            .prices
            .into_iter()
            .map(|(timestamp, price)| {
                let date = chrono::DateTime::from_timestamp_millis(timestamp)
                    .map(|dt| dt.format("%Y-%m-%d").to_string())
                    .unwrap_or_default();
                ChartPoint {
                    timestamp,
                    price,
                    date,
                }
            })
            .collect()
    }

    pub async fn get_top_cryptocurrencies(&self, limit: u32) -> Vec<MarketPrice> {
        let url = format!(
            "{}/coins/markets?vs_currency=usd&order=market_cap_desc&per_page={}&page=1",
            self.api_url, limit
        );

        let markets = match self.http.get(&url).send().await {
            Ok(r) if r.status().is_success() => match r.json::<Vec<CoinMarket>>().await {
                Ok(m) => m,
                Err(e) => {
                    warn!("[MARKET] bad markets response: {}", e);
                    return Vec::new();
                }
            },
            Ok(r) => {
                warn!("[MARKET] markets fetch returned {}", r.status());
                return Vec::new();
            }
            Err(e) => {
                warn!("[MARKET] markets fetch failed: {}", e);
                return Vec::new();
            }
        };

        let now = chrono::Utc::now().timestamp_millis();
        markets
            .into_iter()
            .map(|m| MarketPrice {
                symbol: m.symbol.to_uppercase(),
                price: m.current_price,
                change_24h: m.price_change_percentage_24h.unwrap_or(0.0),
                volume_24h: m.total_volume.unwrap_or(0.0),
                market_cap: m.market_cap.unwrap_or(0.0),
                timestamp: now,
            })
            .collect()
    }

    /// Immediate fetch, then a fixed-interval refresh loop in a spawned
    /// task. Errors are already swallowed per call; the loop never exits.
    pub fn start_price_updates(self, symbols: &[&str], interval_secs: u64) {
        let symbols: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
            loop {
                ticker.tick().await;
                let refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
                let prices = self.get_multiple_prices(&refs).await;
                debug!(
                    "[MARKET] refreshed {}/{} symbols",
                    prices.len(),
                    symbols.len()
                );
                if prices.is_empty() {
                    info!("[MARKET] no prices resolved this cycle");
                }
            }
        });
    }
}

impl Default for MarketDataClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_symbols_map_to_coingecko_ids() {
        assert_eq!(coin_id("BTC"), "bitcoin");
        assert_eq!(coin_id("eth"), "ethereum");
        assert_eq!(coin_id("Trx"), "tron");
        assert_eq!(coin_id("USDT"), "tether");
    }

    #[test]
    fn unknown_symbols_fall_back_to_lowercase() {
        assert_eq!(coin_id("PEPE"), "pepe");
        assert_eq!(coin_id("NewCoin"), "newcoin");
    }

    /// Serves a price map that knows only bitcoin, on an ephemeral port.
    async fn spawn_price_stub() -> String {
        use axum::{routing::get, Json, Router};

        let app = Router::new().route(
            "/api/v3/simple/price",
            get(|| async {
                Json(serde_json::json!({
                    "bitcoin": {
                        "usd": 65_000.0,
                        "usd_24h_change": 1.2,
                        "usd_24h_vol": 3.0e10,
                        "usd_market_cap": 1.2e12,
                    }
                }))
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub server");
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/api/v3", addr)
    }

    #[tokio::test]
    async fn multiple_prices_drop_unresolvable_symbols() {
        let client = MarketDataClient::with_api_url(&spawn_price_stub().await);

        let prices = client.get_multiple_prices(&["BTC", "UNKNOWN"]).await;

        assert_eq!(prices.len(), 1);
        assert_eq!(prices[0].symbol, "BTC");
        assert_eq!(prices[0].price, 65_000.0);
    }

    #[tokio::test]
    async fn unreachable_api_degrades_to_none_and_empty() {
        // Nothing listens here; every call must fail soft.
        let client = MarketDataClient::with_api_url("http://127.0.0.1:1/api/v3");

        assert!(client.get_current_price("BTC").await.is_none());
        assert!(client.get_multiple_prices(&["BTC", "ETH"]).await.is_empty());
        assert!(client.get_historical_data("BTC", 7).await.is_empty());
        assert!(client.get_top_cryptocurrencies(10).await.is_empty());
    }
}
