//! # Storefront Shared
//!
//! Request and response bodies of the HTTP API. Kept free of server-side
//! crates so clients can depend on it directly.

pub mod dto;
pub mod response;

pub use response::{ApiResponse, ErrorResponse};
