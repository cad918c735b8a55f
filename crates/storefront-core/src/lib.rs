//! # Storefront Core
//!
//! The domain layer of the storefront backend.
//! This crate contains the business rules (token lifecycle, role checks,
//! purchasing) written against ports, with zero infrastructure dependencies.

pub mod domain;
pub mod error;
pub mod ports;
pub mod services;

pub use error::DomainError;
