//! Storage ports, one per collection.

use async_trait::async_trait;

use crate::domain::{AuditLog, Invoice, Item, ItemPage, PriceRange, RefreshToken, Role, User};
use crate::error::RepoError;

/// User store keyed by email.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Insert a new user. Fails with `Constraint` when the email is taken.
    async fn insert(&self, user: User) -> Result<User, RepoError>;

    /// Replace the role set. Fails with `NotFound` when the user is absent.
    async fn update_roles(&self, email: &str, roles: &[Role]) -> Result<(), RepoError>;

    async fn set_active(&self, email: &str, active: bool) -> Result<(), RepoError>;

    /// Returns `false` when nothing was deleted.
    async fn delete(&self, email: &str) -> Result<bool, RepoError>;
}

/// Refresh token records. Uniqueness per user is not enforced.
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(&self, token: RefreshToken) -> Result<(), RepoError>;

    /// Most recently created token for the user.
    async fn find_latest(&self, user_email: &str) -> Result<Option<RefreshToken>, RepoError>;

    /// Flag every token of the user as revoked; returns how many changed.
    async fn revoke_all(&self, user_email: &str) -> Result<u64, RepoError>;
}

/// Append-only audit trail.
#[async_trait]
pub trait AuditLogRepository: Send + Sync {
    async fn append(&self, log: AuditLog) -> Result<(), RepoError>;

    /// Entries for a user, oldest first.
    async fn find_by_email(&self, user_email: &str) -> Result<Vec<AuditLog>, RepoError>;
}

/// Catalog store keyed by item name.
#[async_trait]
pub trait ItemRepository: Send + Sync {
    /// Fails with `Constraint` when the name is taken.
    async fn insert(&self, item: Item) -> Result<Item, RepoError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<Item>, RepoError>;

    /// Literal, case-sensitive substring match on the name.
    async fn search_by_name(&self, substring: &str) -> Result<Vec<Item>, RepoError>;

    async fn find_in_price_range(&self, range: PriceRange) -> Result<Vec<Item>, RepoError>;

    async fn find_page(&self, page: ItemPage) -> Result<Vec<Item>, RepoError>;

    async fn set_quantity(&self, name: &str, quantity: i64) -> Result<(), RepoError>;

    /// Atomically subtract `amount` if enough stock remains.
    ///
    /// Returns `false` (and changes nothing) when stock is insufficient,
    /// `NotFound` when the item is absent.
    async fn take_stock(&self, name: &str, amount: i64) -> Result<bool, RepoError>;

    /// Put back stock taken by [`ItemRepository::take_stock`].
    async fn restock(&self, name: &str, amount: i64) -> Result<(), RepoError>;
}

#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    async fn insert(&self, invoice: Invoice) -> Result<Invoice, RepoError>;

    async fn find_by_email(&self, user_email: &str) -> Result<Vec<Invoice>, RepoError>;
}
