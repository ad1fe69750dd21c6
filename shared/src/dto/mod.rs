//! # Data Transfer Objects (DTOs)
//!
//! All data structures used for communication with the REST API.
//!
//! - [`auth`] - Signup, login, and user info DTOs
//! - [`blockchain`] - Network tags, wallet creation, transaction results
//! - [`market`] - Market prices and historical chart data

pub mod auth;
pub mod blockchain;
pub mod market;

pub use auth::*;
pub use blockchain::*;
pub use market::*;
