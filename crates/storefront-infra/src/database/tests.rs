use chrono::{TimeDelta, Utc};
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use serde_json::json;

use crate::database::entity::{item, refresh_token, user};
use crate::database::postgres_repo::{
    PostgresItemRepository, PostgresRefreshTokenRepository, PostgresUserRepository,
};
use storefront_core::domain::Role;
use storefront_core::error::RepoError;
use storefront_core::ports::{ItemRepository, RefreshTokenRepository, UserRepository};

fn user_row(roles: serde_json::Value) -> user::Model {
    let now = Utc::now();
    user::Model {
        id: uuid::Uuid::new_v4(),
        email: "alice@example.com".to_owned(),
        full_name: "Alice".to_owned(),
        password_hash: "$argon2id$stub".to_owned(),
        roles,
        is_active: true,
        is_disabled: false,
        created_at: now.into(),
        updated_at: now.into(),
    }
}

fn item_row(name: &str, quantity: i64) -> item::Model {
    item::Model {
        id: uuid::Uuid::new_v4(),
        name: name.to_owned(),
        price: 900,
        quantity,
        review: String::new(),
        created_at: Utc::now().into(),
    }
}

fn rows_affected(n: u64) -> MockExecResult {
    MockExecResult {
        last_insert_id: 0,
        rows_affected: n,
    }
}

#[tokio::test]
async fn test_find_user_by_email() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user_row(json!(["Admin", "User"]))]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let user = repo.find_by_email("alice@example.com").await.unwrap().unwrap();

    assert_eq!(user.full_name, "Alice");
    assert_eq!(user.roles, vec![Role::Admin, Role::User]);
    assert!(user.is_active);
}

#[tokio::test]
async fn test_corrupt_roles_surface_as_query_error() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![user_row(json!(["Root"]))]])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let err = repo.find_by_email("alice@example.com").await.unwrap_err();

    assert!(matches!(err, RepoError::Query(_)));
}

#[tokio::test]
async fn test_update_roles_of_missing_user() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![rows_affected(0)])
        .into_connection();

    let repo = PostgresUserRepository::new(db);
    let err = repo.update_roles("ghost@example.com", &[Role::User]).await.unwrap_err();

    assert!(matches!(err, RepoError::NotFound));
}

#[tokio::test]
async fn test_latest_refresh_token() {
    let now = Utc::now();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![refresh_token::Model {
            id: uuid::Uuid::new_v4(),
            user_email: "alice@example.com".to_owned(),
            token: "header.payload.signature".to_owned(),
            expires_at: (now + TimeDelta::days(7)).into(),
            revoked: false,
            created_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresRefreshTokenRepository::new(db);
    let token = repo.find_latest("alice@example.com").await.unwrap().unwrap();

    assert_eq!(token.token, "header.payload.signature");
    assert!(!token.revoked);
}

#[tokio::test]
async fn test_take_stock_succeeds_when_row_updated() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![rows_affected(1)])
        .into_connection();

    let repo = PostgresItemRepository::new(db);
    assert!(repo.take_stock("Laptop", 3).await.unwrap());
}

#[tokio::test]
async fn test_take_stock_reports_insufficient_stock() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![rows_affected(0)])
        .append_query_results(vec![vec![item_row("Laptop", 2)]])
        .into_connection();

    let repo = PostgresItemRepository::new(db);
    assert!(!repo.take_stock("Laptop", 3).await.unwrap());
}

#[tokio::test]
async fn test_take_stock_of_unknown_item() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results(vec![rows_affected(0)])
        .append_query_results(vec![Vec::<item::Model>::new()])
        .into_connection();

    let repo = PostgresItemRepository::new(db);
    let err = repo.take_stock("Chair", 1).await.unwrap_err();

    assert!(matches!(err, RepoError::NotFound));
}
