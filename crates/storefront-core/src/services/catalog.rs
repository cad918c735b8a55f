//! Catalog browsing, stock administration and purchasing.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{
    Invoice, InvoiceLine, Item, ItemPage, ItemQuantity, PriceRange, Role,
};
use crate::error::{DomainError, DomainResult};
use crate::ports::{InvoiceRepository, ItemRepository, UserRepository};
use crate::services::{Authorizer, mask_email};

/// Roles allowed to browse and buy.
pub const CATALOG_READERS: [Role; 3] = [Role::User, Role::Admin, Role::Moderator];

/// Roles allowed to change the catalog.
pub const CATALOG_WRITERS: [Role; 2] = [Role::Admin, Role::Moderator];

const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, Clone)]
pub struct NewItem {
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub review: String,
}

/// A purchase as submitted by the client.
#[derive(Debug, Clone)]
pub struct PurchaseRequest {
    pub user_email: String,
    pub items: Vec<InvoiceLine>,
    pub total_amount: i64,
}

pub struct CatalogService {
    items: Arc<dyn ItemRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    users: Arc<dyn UserRepository>,
    authorizer: Arc<Authorizer>,
}

impl CatalogService {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        users: Arc<dyn UserRepository>,
        authorizer: Arc<Authorizer>,
    ) -> Self {
        Self {
            items,
            invoices,
            users,
            authorizer,
        }
    }

    pub async fn list_items(&self, actor: &str, page: ItemPage) -> DomainResult<Vec<Item>> {
        self.authorizer.require_one_of(&CATALOG_READERS, actor).await?;
        if page.per_page == 0 || page.per_page > MAX_PAGE_SIZE {
            return Err(DomainError::Validation(format!(
                "num_per_page must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        Ok(self.items.find_page(page).await?)
    }

    pub async fn items_by_name(&self, actor: &str, substring: &str) -> DomainResult<Vec<Item>> {
        self.authorizer.require_one_of(&CATALOG_READERS, actor).await?;
        Ok(self.items.search_by_name(substring).await?)
    }

    pub async fn items_by_price_range(
        &self,
        actor: &str,
        range: PriceRange,
    ) -> DomainResult<Vec<Item>> {
        self.authorizer.require_one_of(&CATALOG_READERS, actor).await?;
        if range.lower > range.upper {
            return Err(DomainError::Validation(
                "lower_bound must not exceed upper_bound".to_string(),
            ));
        }
        Ok(self.items.find_in_price_range(range).await?)
    }

    pub async fn item_quantities(
        &self,
        actor: &str,
        substring: &str,
    ) -> DomainResult<Vec<ItemQuantity>> {
        let items = self.items_by_name(actor, substring).await?;
        Ok(items.iter().map(ItemQuantity::from).collect())
    }

    pub async fn create_item(&self, actor: &str, new: NewItem) -> DomainResult<Item> {
        self.authorizer.require_one_of(&CATALOG_WRITERS, actor).await?;
        if new.name.trim().is_empty() {
            return Err(DomainError::Validation("Item name is required".to_string()));
        }
        if new.price < 0 || new.quantity < 0 {
            return Err(DomainError::Validation(
                "Price and quantity must not be negative".to_string(),
            ));
        }

        let item = Item::new(new.name, new.price, new.quantity, new.review);
        let item = self.items.insert(item).await?;
        tracing::info!(item = %item.name, quantity = item.quantity, "Item created");
        Ok(item)
    }

    pub async fn set_item_quantity(&self, actor: &str, name: &str, quantity: i64) -> DomainResult<()> {
        self.authorizer.require_one_of(&CATALOG_WRITERS, actor).await?;
        if quantity < 0 {
            return Err(DomainError::Validation(
                "Quantity must not be negative".to_string(),
            ));
        }
        if self.items.find_by_name(name).await?.is_none() {
            return Err(DomainError::not_found("Item", name));
        }
        self.items.set_quantity(name, quantity).await?;
        tracing::info!(item = %name, quantity, "Item quantity set");
        Ok(())
    }

    /// Check stock and totals, take the stock and record a pending invoice.
    ///
    /// Nothing is changed unless every check passes. Stock taken before a
    /// concurrent buyer won the race is put back.
    pub async fn buy_items(&self, actor: &str, request: PurchaseRequest) -> DomainResult<Invoice> {
        if actor == request.user_email {
            self.authorizer.require_one_of(&CATALOG_READERS, actor).await?;
        } else {
            self.authorizer.require_one_of(&CATALOG_WRITERS, actor).await?;
        }

        if request.items.is_empty() {
            return Err(DomainError::Validation("No items to buy".to_string()));
        }
        if request.items.iter().any(|line| line.quantity <= 0) {
            return Err(DomainError::Validation(
                "Item quantities must be positive".to_string(),
            ));
        }
        if request.items.iter().any(|line| line.total < 0) {
            return Err(DomainError::Validation(
                "Line totals must not be negative".to_string(),
            ));
        }

        if self.users.find_by_email(&request.user_email).await?.is_none() {
            return Err(DomainError::not_found("User", &request.user_email));
        }

        let mut requested: BTreeMap<String, i64> = BTreeMap::new();
        for line in &request.items {
            let wanted = requested.entry(line.name.clone()).or_default();
            *wanted = wanted.checked_add(line.quantity).ok_or_else(|| {
                DomainError::Validation(format!("Requested quantity of {} is too large", line.name))
            })?;
        }
        for (name, wanted) in &requested {
            let item = self
                .items
                .find_by_name(name)
                .await?
                .ok_or_else(|| DomainError::not_found("Item", name.as_str()))?;
            if item.quantity < *wanted {
                return Err(DomainError::InsufficientStock {
                    item: item.name,
                    requested: *wanted,
                    available: item.quantity,
                });
            }
        }

        let computed = request
            .items
            .iter()
            .try_fold(0i64, |sum, line| sum.checked_add(line.total))
            .ok_or_else(|| DomainError::Validation("Purchase total is too large".to_string()))?;
        if computed != request.total_amount {
            return Err(DomainError::AmountMismatch {
                expected: computed,
                actual: request.total_amount,
            });
        }

        let mut taken: Vec<(String, i64)> = Vec::with_capacity(requested.len());
        for (name, wanted) in &requested {
            let ok = match self.items.take_stock(name, *wanted).await {
                Ok(ok) => ok,
                Err(e) => {
                    self.restock(&taken).await;
                    return Err(e.into());
                }
            };
            if !ok {
                self.restock(&taken).await;
                let available = self
                    .items
                    .find_by_name(name)
                    .await?
                    .map(|i| i.quantity)
                    .unwrap_or(0);
                return Err(DomainError::InsufficientStock {
                    item: name.clone(),
                    requested: *wanted,
                    available,
                });
            }
            taken.push((name.clone(), *wanted));
        }

        let invoice = Invoice::pending(request.user_email, request.items, request.total_amount);
        let invoice = match self.invoices.insert(invoice).await {
            Ok(invoice) => invoice,
            Err(e) => {
                self.restock(&taken).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            user = %mask_email(&invoice.user_email),
            invoice_id = %invoice.id,
            total = invoice.total_amount,
            "Purchase recorded"
        );
        Ok(invoice)
    }

    /// Invoices of `email`. Users see their own; admins and moderators see anyone's.
    pub async fn invoices_for(&self, actor: &str, email: &str) -> DomainResult<Vec<Invoice>> {
        if actor == email {
            self.authorizer.require_one_of(&CATALOG_READERS, actor).await?;
        } else {
            self.authorizer.require_one_of(&CATALOG_WRITERS, actor).await?;
        }
        Ok(self.invoices.find_by_email(email).await?)
    }

    async fn restock(&self, taken: &[(String, i64)]) {
        for (name, amount) in taken {
            if let Err(e) = self.items.restock(name, *amount).await {
                tracing::error!(item = %name, amount, error = %e, "Failed to restock item");
            }
        }
    }
}
