//! # Shared Data Transfer Objects Library
//!
//! This library defines the contract between API consumers (dashboard, admin
//! tooling) and the backend. All DTOs use JSON serialization via `serde`.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects for API communication
//!   - **[`dto::auth`]**: Authentication and user management DTOs
//!   - **[`dto::blockchain`]**: Network tags, wallet and transaction DTOs
//!   - **[`dto::market`]**: Market data and price chart DTOs
//! - **[`utils`]**: Shared utility functions
//!
//! ## Wire Format
//!
//! All DTOs serialize to JSON using the default `serde` behavior:
//! - Field names use **snake_case** in Rust and in JSON
//! - Optional fields are omitted when `None`
//!   (using `#[serde(skip_serializing_if = "Option::is_none")]`)
//! - Network tags serialize as their canonical uppercase form (`"BTC"`,
//!   `"ETH"`, `"BSC"`, `"TRX"`); statuses serialize lowercase

pub mod dto;
pub mod utils;

// Re-export commonly used types for convenience
pub use dto::*;
pub use utils::*;
