//! # Market Data Transfer Objects
//!
//! Price snapshots and historical chart data fetched from the public
//! aggregator. A [`MarketPrice`] is recreated on every fetch; there is no
//! caching or staleness policy beyond the caller's own polling interval.

use serde::{Deserialize, Serialize};

/// A point-in-time price snapshot for one symbol.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MarketPrice {
    pub symbol: String,
    pub price: f64,
    pub change_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    /// Epoch milliseconds at fetch time.
    pub timestamp: i64,
}

/// A chart-ready historical sample with a preformatted date label.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChartPoint {
    pub timestamp: i64,
    pub price: f64,
    pub date: String,
}
