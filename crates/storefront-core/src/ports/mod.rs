//! Ports - trait definitions for external dependencies.
//! These are the "interfaces" that infrastructure must implement.

mod auth;
mod cache;
mod pubsub;
mod repository;

pub use auth::{AuthError, PasswordService, SignedToken, TokenClaims, TokenKind, TokenService};
pub use cache::{Cache, CacheError, get_json, set_json};
pub use pubsub::{Message, Producer, Publisher, Subscriber, SubscriberError, topics};
pub use repository::{
    AuditLogRepository, InvoiceRepository, ItemRepository, RefreshTokenRepository,
    UserRepository,
};
