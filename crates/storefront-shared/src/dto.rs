//! Data Transfer Objects - request/response types for the API.
//!
//! Roles travel as their names (`"Admin"`, `"User"`, ...).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---- auth ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    /// Defaults to `["Guest"]` when empty.
    #[serde(default)]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

/// A user as seen by clients. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<String>,
    pub is_active: bool,
    pub is_disabled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRolesRequest {
    pub email: String,
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddRoleRequest {
    pub email: String,
    pub role: String,
}

// ---- products ----

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemListQuery {
    #[serde(default)]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_true")]
    pub ascending: bool,
}

fn default_per_page() -> u64 {
    10
}

fn default_sort_by() -> String {
    "name".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemNameQuery {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceRangeQuery {
    #[serde(default)]
    pub lower: i64,
    #[serde(default = "default_upper_price")]
    pub upper: i64,
}

fn default_upper_price() -> i64 {
    100_000_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateItemRequest {
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    #[serde(default)]
    pub review: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetQuantityRequest {
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemResponse {
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub review: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemQuantityResponse {
    pub name: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseLine {
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// Buyer; defaults to the authenticated caller.
    #[serde(default)]
    pub user_email: Option<String>,
    pub items: Vec<PurchaseLine>,
    pub total_amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceResponse {
    pub id: Uuid,
    pub user_email: String,
    pub items: Vec<PurchaseLine>,
    pub total_amount: i64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_list_query_defaults() {
        let query: ItemListQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query.page, 0);
        assert_eq!(query.per_page, 10);
        assert_eq!(query.sort_by, "name");
        assert!(query.ascending);
    }

    #[test]
    fn test_price_range_defaults() {
        let query: PriceRangeQuery = serde_json::from_str(r#"{"lower": 50}"#).unwrap();
        assert_eq!(query.lower, 50);
        assert_eq!(query.upper, 100_000_000);
    }

    #[test]
    fn test_register_roles_are_optional() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@x.com","password":"secret1","full_name":"A"}"#,
        )
        .unwrap();
        assert!(req.roles.is_empty());
    }

    #[test]
    fn test_purchase_buyer_is_optional() {
        let req: PurchaseRequest = serde_json::from_str(
            r#"{"items":[{"name":"Laptop","price":900,"quantity":1,"total":900}],"total_amount":900}"#,
        )
        .unwrap();
        assert!(req.user_email.is_none());
        assert_eq!(req.items.len(), 1);
    }
}
