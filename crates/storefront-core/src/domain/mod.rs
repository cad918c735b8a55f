//! Domain entities - the core business objects.

mod audit_log;
mod invoice;
mod item;
mod refresh_token;
mod user;

pub use audit_log::{AuditLog, AuditStatus};
pub use invoice::{Invoice, InvoiceLine, InvoiceStatus};
pub use item::{Item, ItemPage, ItemQuantity, ItemSortKey, PriceRange};
pub use refresh_token::{RefreshToken, RefreshTokenStatus};
pub use user::{Role, UnknownRole, User, normalize_roles};
