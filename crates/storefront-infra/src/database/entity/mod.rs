//! SeaORM entities, one per table.

pub mod audit_log;
pub mod invoice;
pub mod item;
pub mod refresh_token;
pub mod user;
