//! End-to-end flows over the in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use storefront_core::DomainError;
use storefront_core::domain::{
    AuditStatus, InvoiceLine, InvoiceStatus, Item, RefreshTokenStatus, Role, User,
};
use storefront_core::ports::{
    AuditLogRepository, ItemRepository, PasswordService, Producer, RefreshTokenRepository,
    UserRepository, topics,
};
use storefront_core::services::{
    AccountService, Authorizer, CatalogService, NewAccount, NewItem, PurchaseRequest,
    TokenManager,
};
use storefront_infra::pubsub::{AuditSubscriber, LoginMetricsSubscriber};
use storefront_infra::{
    Argon2PasswordService, InMemoryAuditLogRepository, InMemoryBroker, InMemoryCache,
    InMemoryInvoiceRepository, InMemoryItemRepository, InMemoryRefreshTokenRepository,
    InMemoryUserRepository, JwtConfig, JwtTokenService,
};

const PASSWORD: &str = "correct horse";

struct World {
    users: Arc<InMemoryUserRepository>,
    audit: Arc<InMemoryAuditLogRepository>,
    refresh_tokens: Arc<InMemoryRefreshTokenRepository>,
    items: Arc<InMemoryItemRepository>,
    broker: Arc<InMemoryBroker>,
    metrics: Arc<LoginMetricsSubscriber>,
    accounts: AccountService,
    catalog: CatalogService,
}

async fn world() -> World {
    let users = Arc::new(InMemoryUserRepository::new());
    let audit = Arc::new(InMemoryAuditLogRepository::new());
    let items = Arc::new(InMemoryItemRepository::new());
    let broker = Arc::new(InMemoryBroker::new());

    let signer = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "flow-test-secret".to_string(),
        ..JwtConfig::default()
    }));
    // Cheapest Argon2id parameters; hashing cost is not under test.
    let passwords = Arc::new(Argon2PasswordService::with_params(1024, 1, 1).unwrap());

    let refresh_tokens = Arc::new(InMemoryRefreshTokenRepository::new());
    let tokens = Arc::new(TokenManager::new(signer, refresh_tokens.clone()));
    let authorizer = Arc::new(Authorizer::new(
        users.clone(),
        Arc::new(InMemoryCache::new()),
        Some(Duration::from_secs(300)),
    ));

    let metrics = Arc::new(LoginMetricsSubscriber::new());
    broker.subscribe(topics::USER_LOGIN, metrics.clone()).await;
    broker
        .subscribe(topics::USER_LOGIN, Arc::new(AuditSubscriber::new(audit.clone())))
        .await;

    let accounts = AccountService::new(
        users.clone(),
        audit.clone(),
        passwords,
        tokens,
        authorizer.clone(),
        Producer::new("accounts", broker.clone()),
    );
    let catalog = CatalogService::new(
        items.clone(),
        Arc::new(InMemoryInvoiceRepository::new()),
        users.clone(),
        authorizer,
    );

    World {
        users,
        audit,
        refresh_tokens,
        items,
        broker,
        metrics,
        accounts,
        catalog,
    }
}

fn account(email: &str, roles: Vec<Role>) -> NewAccount {
    NewAccount {
        email: email.to_string(),
        password: PASSWORD.to_string(),
        full_name: "Test User".to_string(),
        roles,
    }
}

fn line(name: &str, price: i64, quantity: i64) -> InvoiceLine {
    InvoiceLine {
        name: name.to_string(),
        price,
        quantity,
        total: price * quantity,
    }
}

#[tokio::test]
async fn test_registration_and_login_are_audited_and_announced() {
    let w = world().await;
    let email = "alice@example.com";

    let user = w.accounts.register(account(email, vec![Role::User])).await.unwrap();
    assert_eq!(user.roles, vec![Role::User]);
    assert!(!user.is_active);

    let dup = w.accounts.register(account(email, vec![])).await.unwrap_err();
    assert!(matches!(dup, DomainError::Conflict(_)));

    let bad = w.accounts.login(email, "wrong password").await.unwrap_err();
    assert!(matches!(bad, DomainError::InvalidCredential));
    let unknown = w.accounts.login("bob@example.com", PASSWORD).await.unwrap_err();
    assert!(matches!(unknown, DomainError::InvalidCredential));

    let pair = w.accounts.login(email, PASSWORD).await.unwrap();
    assert_eq!(pair.token_type, "bearer");
    assert_eq!(pair.expires_in, 30 * 60);
    assert!(w.users.find_by_email(email).await.unwrap().unwrap().is_active);

    // The login event waits in the queue until the next drain.
    assert_eq!(w.metrics.succeeded(), 0);
    // One user_activity (registration, nobody listening) and one user_login.
    let report = w.broker.drain().await;
    assert_eq!(report.messages, 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.failures, 0);
    assert_eq!(w.metrics.succeeded(), 1);

    let trail: Vec<_> = w
        .accounts
        .audit_trail(email)
        .await
        .unwrap()
        .into_iter()
        .map(|l| (l.action, l.status))
        .collect();
    assert_eq!(
        trail,
        vec![
            ("register".to_string(), AuditStatus::Success),
            ("register".to_string(), AuditStatus::Failed),
            ("login".to_string(), AuditStatus::Failed),
            ("login".to_string(), AuditStatus::Success),
            ("user_login_event".to_string(), AuditStatus::Success),
        ]
    );
}

#[tokio::test]
async fn test_purchase_takes_stock_and_records_pending_invoice() {
    let w = world().await;
    let admin = "admin@example.com";
    let buyer = "buyer@example.com";
    w.accounts.register(account(admin, vec![Role::Admin])).await.unwrap();
    w.accounts.register(account(buyer, vec![Role::User])).await.unwrap();

    w.catalog
        .create_item(
            admin,
            NewItem {
                name: "Laptop".to_string(),
                price: 900,
                quantity: 5,
                review: "Fast".to_string(),
            },
        )
        .await
        .unwrap();

    let invoice = w
        .catalog
        .buy_items(
            buyer,
            PurchaseRequest {
                user_email: buyer.to_string(),
                items: vec![line("Laptop", 900, 3)],
                total_amount: 2700,
            },
        )
        .await
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Pending);
    assert_eq!(invoice.total_amount, 2700);
    assert_eq!(w.items.find_by_name("Laptop").await.unwrap().unwrap().quantity, 2);

    let too_many = w
        .catalog
        .buy_items(
            buyer,
            PurchaseRequest {
                user_email: buyer.to_string(),
                items: vec![line("Laptop", 900, 10)],
                total_amount: 9000,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        too_many,
        DomainError::InsufficientStock { requested: 10, available: 2, .. }
    ));

    let mismatch = w
        .catalog
        .buy_items(
            buyer,
            PurchaseRequest {
                user_email: buyer.to_string(),
                items: vec![line("Laptop", 900, 1)],
                total_amount: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        mismatch,
        DomainError::AmountMismatch { expected: 900, actual: 1 }
    ));

    assert_eq!(w.items.find_by_name("Laptop").await.unwrap().unwrap().quantity, 2);
    assert_eq!(w.catalog.invoices_for(buyer, buyer).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_split_lines_for_one_item_are_checked_together() {
    let w = world().await;
    let buyer = "buyer@example.com";
    w.accounts.register(account(buyer, vec![Role::User])).await.unwrap();
    w.items
        .insert(Item::new("Desk".into(), 300, 2, String::new()))
        .await
        .unwrap();

    let err = w
        .catalog
        .buy_items(
            buyer,
            PurchaseRequest {
                user_email: buyer.to_string(),
                items: vec![line("Desk", 300, 2), line("Desk", 300, 1)],
                total_amount: 900,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::InsufficientStock { requested: 3, .. }));
    assert_eq!(w.items.find_by_name("Desk").await.unwrap().unwrap().quantity, 2);
}

#[tokio::test]
async fn test_users_cannot_buy_on_behalf_of_others() {
    let w = world().await;
    let buyer = "buyer@example.com";
    let other = "other@example.com";
    w.accounts.register(account(buyer, vec![Role::User])).await.unwrap();
    w.accounts.register(account(other, vec![Role::User])).await.unwrap();
    w.items
        .insert(Item::new("Lamp".into(), 40, 3, String::new()))
        .await
        .unwrap();

    let err = w
        .catalog
        .buy_items(
            buyer,
            PurchaseRequest {
                user_email: other.to_string(),
                items: vec![line("Lamp", 40, 1)],
                total_amount: 40,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::Forbidden(_)));
    assert_eq!(w.items.find_by_name("Lamp").await.unwrap().unwrap().quantity, 3);
}

#[tokio::test]
async fn test_role_checks_read_the_live_store() {
    let w = world().await;
    let moderator = "mod@example.com";
    let user = "user@example.com";
    w.accounts.register(account(moderator, vec![Role::Moderator])).await.unwrap();
    w.accounts.register(account(user, vec![Role::User])).await.unwrap();

    let authorizer = w.accounts.authorizer();
    let staff = [Role::Admin, Role::Moderator];
    authorizer.require_one_of(&staff, moderator).await.unwrap();
    assert!(matches!(
        authorizer.require_one_of(&staff, user).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));
    assert!(matches!(
        authorizer.require_role(Role::User, "ghost@example.com").await.unwrap_err(),
        DomainError::NotFound { .. }
    ));

    // Promoted directly in the store: the very next check sees it.
    w.users.update_roles(user, &[Role::Admin]).await.unwrap();
    authorizer.require_one_of(&staff, user).await.unwrap();
}

#[tokio::test]
async fn test_refresh_keeps_the_refresh_token() {
    let w = world().await;
    let email = "alice@example.com";
    w.accounts.register(account(email, vec![Role::User])).await.unwrap();

    assert!(matches!(
        w.accounts.refresh(email).await.unwrap_err(),
        DomainError::NotFound { .. }
    ));

    let first = w.accounts.login(email, PASSWORD).await.unwrap();
    let second = w.accounts.refresh(email).await.unwrap();

    assert_eq!(second.refresh_token, first.refresh_token);
    let subject = w.accounts.tokens().verify_access_token(&second.access_token).unwrap();
    assert_eq!(subject, email);
    assert_eq!(
        w.accounts.tokens().refresh_token_status(email).await.unwrap(),
        RefreshTokenStatus::Active
    );
}

#[tokio::test]
async fn test_logout_revokes_refresh_but_not_access_tokens() {
    let w = world().await;
    let email = "alice@example.com";
    w.accounts.register(account(email, vec![Role::User])).await.unwrap();
    let pair = w.accounts.login(email, PASSWORD).await.unwrap();
    assert_eq!(w.accounts.authenticate(&pair.access_token).await.unwrap().email, email);

    w.accounts.logout(email).await.unwrap();

    let tokens = w.accounts.tokens();
    assert_eq!(
        tokens.refresh_token_status(email).await.unwrap(),
        RefreshTokenStatus::Revoked
    );
    // Access tokens are self-contained and stay valid until they expire.
    assert_eq!(tokens.verify_access_token(&pair.access_token).unwrap(), email);
    // The account itself is inactive, so requests are refused.
    assert!(matches!(
        w.accounts.authenticate(&pair.access_token).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));
    assert!(matches!(
        w.accounts.refresh(email).await.unwrap_err(),
        DomainError::InvalidCredential
    ));
    // A refresh token is not an access token.
    assert!(tokens.verify_access_token(&pair.refresh_token).is_err());
}

#[tokio::test]
async fn test_cached_user_follows_service_writes_only() {
    let w = world().await;
    let email = "alice@example.com";
    w.accounts.register(account(email, vec![Role::User])).await.unwrap();
    let authorizer = w.accounts.authorizer();

    let cached = authorizer.get_user_cached(email).await.unwrap().unwrap();
    assert_eq!(cached.roles, vec![Role::User]);

    authorizer.add_role(email, Role::Admin).await.unwrap();
    let cached = authorizer.get_user_cached(email).await.unwrap().unwrap();
    assert!(cached.has_role(Role::Admin));

    // Writes that bypass the services leave the cached copy stale until
    // it is invalidated or expires.
    w.users.update_roles(email, &[Role::Guest]).await.unwrap();
    let stale = authorizer.get_user_cached(email).await.unwrap().unwrap();
    assert!(stale.has_role(Role::Admin));

    authorizer.invalidate(email).await;
    let fresh = authorizer.get_user_cached(email).await.unwrap().unwrap();
    assert_eq!(fresh.roles, vec![Role::Guest]);

    assert!(authorizer.get_user_cached("ghost@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn test_only_moderators_change_roles() {
    let w = world().await;
    let admin = "admin@example.com";
    let moderator = "mod@example.com";
    let target = "target@example.com";
    for (email, role) in [(admin, Role::Admin), (moderator, Role::Moderator), (target, Role::User)] {
        w.accounts.register(account(email, vec![role])).await.unwrap();
    }

    assert!(matches!(
        w.accounts.add_user_role(admin, target, Role::Admin).await.unwrap_err(),
        DomainError::Forbidden(_)
    ));
    let updated = w.accounts.add_user_role(moderator, target, Role::Admin).await.unwrap();
    assert_eq!(updated.roles, vec![Role::User, Role::Admin]);

    assert!(matches!(
        w.accounts.update_user_roles(moderator, target, vec![]).await.unwrap_err(),
        DomainError::Validation(_)
    ));

    w.accounts.delete_user(admin, target).await.unwrap();
    assert!(matches!(
        w.accounts.delete_user(admin, target).await.unwrap_err(),
        DomainError::NotFound { .. }
    ));
}

#[tokio::test]
async fn test_disabled_user_cannot_log_in() {
    let w = world().await;
    let email = "gone@example.com";
    let hash = Argon2PasswordService::with_params(1024, 1, 1)
        .unwrap()
        .hash(PASSWORD)
        .unwrap();
    let mut user = User::new(email.to_string(), "Gone".to_string(), hash, vec![Role::User]);
    user.is_disabled = true;
    w.users.insert(user).await.unwrap();

    let err = w.accounts.login(email, PASSWORD).await.unwrap_err();

    assert!(matches!(err, DomainError::Forbidden(_)));
    assert!(w.refresh_tokens.find_latest(email).await.unwrap().is_none());
    assert!(!w.users.find_by_email(email).await.unwrap().unwrap().is_active);
    let trail = w.audit.find_by_email(email).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].action, "login");
    assert_eq!(trail[0].status, AuditStatus::Failed);
    assert_eq!(w.broker.pending().await, 0);
}

#[tokio::test]
async fn test_overflowing_purchase_is_rejected_without_touching_stock() {
    let w = world().await;
    let buyer = "buyer@example.com";
    w.accounts.register(account(buyer, vec![Role::User])).await.unwrap();
    w.items
        .insert(Item::new("Widget".into(), 1, 4, String::new()))
        .await
        .unwrap();

    let huge = InvoiceLine {
        name: "Widget".to_string(),
        price: 1,
        quantity: i64::MAX,
        total: 1,
    };
    let quantities = w
        .catalog
        .buy_items(
            buyer,
            PurchaseRequest {
                user_email: buyer.to_string(),
                items: vec![huge.clone(), huge],
                total_amount: 2,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(quantities, DomainError::Validation(_)));

    let pricey = InvoiceLine {
        name: "Widget".to_string(),
        price: 1,
        quantity: 1,
        total: i64::MAX,
    };
    let totals = w
        .catalog
        .buy_items(
            buyer,
            PurchaseRequest {
                user_email: buyer.to_string(),
                items: vec![pricey.clone(), pricey],
                total_amount: -2,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(totals, DomainError::Validation(_)));

    let negative = w
        .catalog
        .buy_items(
            buyer,
            PurchaseRequest {
                user_email: buyer.to_string(),
                items: vec![InvoiceLine {
                    total: -5,
                    ..line("Widget", 1, 1)
                }],
                total_amount: -5,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(negative, DomainError::Validation(_)));

    assert_eq!(w.items.find_by_name("Widget").await.unwrap().unwrap().quantity, 4);
    assert!(w.catalog.invoices_for(buyer, buyer).await.unwrap().is_empty());
}
