//! Application services - business flows written against the ports.

mod accounts;
mod authorization;
mod catalog;
mod tokens;

pub use accounts::{ACCOUNT_ADMINS, AccountService, NewAccount};
pub use authorization::{Authorizer, user_cache_key};
pub use catalog::{CATALOG_READERS, CATALOG_WRITERS, CatalogService, NewItem, PurchaseRequest};
pub use tokens::{TokenManager, TokenPair};

/// Mask an email for logging to avoid PII in logs: `alice@x.com` -> `a***@x.com`.
pub fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{}***", first),
                _ => "***".to_string(),
            };
            format!("{}{}", masked_local, domain)
        }
        None => "***".to_string(),
    }
}
