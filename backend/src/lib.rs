//! # FlashPay Backend
//!
//! REST backend for the flash transaction platform: multi-network wallet
//! and transfer dispatch (Bitcoin, Ethereum, BSC, Tron), CoinGecko market
//! data, and the SQLite-backed account/transaction/subscription store.

pub mod auth;
pub mod blockchain;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod server;
