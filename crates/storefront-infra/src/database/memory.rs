//! In-memory stores for tests and for running without a database.
//!
//! Each store keeps its rows behind one `RwLock`, so every trait method is
//! atomic with respect to the others.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use storefront_core::domain::{
    AuditLog, Invoice, Item, ItemPage, ItemSortKey, PriceRange, RefreshToken, Role, User,
};
use storefront_core::error::RepoError;
use storefront_core::ports::{
    AuditLogRepository, InvoiceRepository, ItemRepository, RefreshTokenRepository,
    UserRepository,
};

/// Users keyed by email.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.email) {
            return Err(RepoError::Constraint(format!(
                "email {} already registered",
                user.email
            )));
        }
        users.insert(user.email.clone(), user.clone());
        Ok(user)
    }

    async fn update_roles(&self, email: &str, roles: &[Role]) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(email).ok_or(RepoError::NotFound)?;
        user.roles = roles.to_vec();
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn set_active(&self, email: &str, active: bool) -> Result<(), RepoError> {
        let mut users = self.users.write().await;
        let user = users.get_mut(email).ok_or(RepoError::NotFound)?;
        user.is_active = active;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete(&self, email: &str) -> Result<bool, RepoError> {
        Ok(self.users.write().await.remove(email).is_some())
    }
}

/// Refresh tokens in insertion order.
#[derive(Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: RwLock<Vec<RefreshToken>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, token: RefreshToken) -> Result<(), RepoError> {
        self.tokens.write().await.push(token);
        Ok(())
    }

    async fn find_latest(&self, user_email: &str) -> Result<Option<RefreshToken>, RepoError> {
        // Later inserts win ties on created_at.
        Ok(self
            .tokens
            .read()
            .await
            .iter()
            .filter(|t| t.user_email == user_email)
            .max_by_key(|t| t.created_at)
            .cloned())
    }

    async fn revoke_all(&self, user_email: &str) -> Result<u64, RepoError> {
        let mut changed = 0;
        for token in self
            .tokens
            .write()
            .await
            .iter_mut()
            .filter(|t| t.user_email == user_email && !t.revoked)
        {
            token.revoked = true;
            changed += 1;
        }
        Ok(changed)
    }
}

#[derive(Default)]
pub struct InMemoryAuditLogRepository {
    logs: RwLock<Vec<AuditLog>>,
}

impl InMemoryAuditLogRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditLogRepository {
    async fn append(&self, log: AuditLog) -> Result<(), RepoError> {
        self.logs.write().await.push(log);
        Ok(())
    }

    async fn find_by_email(&self, user_email: &str) -> Result<Vec<AuditLog>, RepoError> {
        Ok(self
            .logs
            .read()
            .await
            .iter()
            .filter(|l| l.user_email == user_email)
            .cloned()
            .collect())
    }
}

/// Catalog keyed by item name.
#[derive(Default)]
pub struct InMemoryItemRepository {
    items: RwLock<HashMap<String, Item>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    async fn collect_sorted<F>(&self, keep: F) -> Vec<Item>
    where
        F: Fn(&Item) -> bool,
    {
        let mut found: Vec<Item> = self
            .items
            .read()
            .await
            .values()
            .filter(|i| keep(i))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn insert(&self, item: Item) -> Result<Item, RepoError> {
        let mut items = self.items.write().await;
        if items.contains_key(&item.name) {
            return Err(RepoError::Constraint(format!(
                "item {} already exists",
                item.name
            )));
        }
        items.insert(item.name.clone(), item.clone());
        Ok(item)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Item>, RepoError> {
        Ok(self.items.read().await.get(name).cloned())
    }

    async fn search_by_name(&self, substring: &str) -> Result<Vec<Item>, RepoError> {
        Ok(self.collect_sorted(|i| i.name.contains(substring)).await)
    }

    async fn find_in_price_range(&self, range: PriceRange) -> Result<Vec<Item>, RepoError> {
        let mut found = self.collect_sorted(|i| range.contains(i.price)).await;
        found.sort_by_key(|i| i.price);
        Ok(found)
    }

    async fn find_page(&self, page: ItemPage) -> Result<Vec<Item>, RepoError> {
        let mut all = self.collect_sorted(|_| true).await;
        // Stable sort keeps the name order for ties.
        match page.sort_by {
            ItemSortKey::Name => {}
            ItemSortKey::Price => all.sort_by_key(|i| i.price),
            ItemSortKey::Quantity => all.sort_by_key(|i| i.quantity),
        }
        if !page.ascending {
            all.reverse();
        }

        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.per_page).unwrap_or(usize::MAX);
        Ok(all.into_iter().skip(offset).take(limit).collect())
    }

    async fn set_quantity(&self, name: &str, quantity: i64) -> Result<(), RepoError> {
        let mut items = self.items.write().await;
        let item = items.get_mut(name).ok_or(RepoError::NotFound)?;
        item.quantity = quantity;
        Ok(())
    }

    async fn take_stock(&self, name: &str, amount: i64) -> Result<bool, RepoError> {
        let mut items = self.items.write().await;
        let item = items.get_mut(name).ok_or(RepoError::NotFound)?;
        if item.quantity < amount {
            return Ok(false);
        }
        item.quantity -= amount;
        Ok(true)
    }

    async fn restock(&self, name: &str, amount: i64) -> Result<(), RepoError> {
        let mut items = self.items.write().await;
        let item = items.get_mut(name).ok_or(RepoError::NotFound)?;
        item.quantity += amount;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    invoices: RwLock<Vec<Invoice>>,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn insert(&self, invoice: Invoice) -> Result<Invoice, RepoError> {
        self.invoices.write().await.push(invoice.clone());
        Ok(invoice)
    }

    async fn find_by_email(&self, user_email: &str) -> Result<Vec<Invoice>, RepoError> {
        Ok(self
            .invoices
            .read()
            .await
            .iter()
            .filter(|i| i.user_email == user_email)
            .cloned()
            .collect())
    }
}
