//! PostgreSQL store implementations.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, LikeExpr};
use sea_orm::{ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder, QuerySelect};

use storefront_core::domain::{
    AuditLog, Invoice, Item, ItemPage, ItemSortKey, PriceRange, RefreshToken, Role, User,
};
use storefront_core::error::RepoError;
use storefront_core::ports::{
    AuditLogRepository, InvoiceRepository, ItemRepository, RefreshTokenRepository,
    UserRepository,
};
use storefront_core::services::mask_email;

use super::entity::audit_log::{self, Entity as AuditLogEntity};
use super::entity::invoice::{self, Entity as InvoiceEntity};
use super::entity::item::{self, Entity as ItemEntity};
use super::entity::refresh_token::{self, Entity as RefreshTokenEntity};
use super::entity::user::{self, Entity as UserEntity, roles_to_json};
use super::postgres_base::{PostgresBaseRepository, map_db_err};

pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;
pub type PostgresRefreshTokenRepository = PostgresBaseRepository<RefreshTokenEntity>;
pub type PostgresAuditLogRepository = PostgresBaseRepository<AuditLogEntity>;
pub type PostgresItemRepository = PostgresBaseRepository<ItemEntity>;
pub type PostgresInvoiceRepository = PostgresBaseRepository<InvoiceEntity>;

/// Escape `LIKE` metacharacters so the pattern matches literally.
fn literal_like(substring: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(substring.len() + 2);
    pattern.push('%');
    for c in substring.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape('\\')
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(map_db_err)?
            .map(User::try_from)
            .transpose()
    }

    async fn insert(&self, user: User) -> Result<User, RepoError> {
        let model = self.insert_model(user.into()).await?;
        User::try_from(model)
    }

    async fn update_roles(&self, email: &str, roles: &[Role]) -> Result<(), RepoError> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::Roles, Expr::value(roles_to_json(roles)))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Email.eq(email))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn set_active(&self, email: &str, active: bool) -> Result<(), RepoError> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::IsActive, Expr::value(active))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Email.eq(email))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, email: &str) -> Result<bool, RepoError> {
        let result = UserEntity::delete_many()
            .filter(user::Column::Email.eq(email))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl RefreshTokenRepository for PostgresRefreshTokenRepository {
    async fn insert(&self, token: RefreshToken) -> Result<(), RepoError> {
        self.insert_model(token.into()).await?;
        Ok(())
    }

    async fn find_latest(&self, user_email: &str) -> Result<Option<RefreshToken>, RepoError> {
        let found = RefreshTokenEntity::find()
            .filter(refresh_token::Column::UserEmail.eq(user_email))
            .order_by_desc(refresh_token::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(found.map(Into::into))
    }

    async fn revoke_all(&self, user_email: &str) -> Result<u64, RepoError> {
        let result = RefreshTokenEntity::update_many()
            .col_expr(refresh_token::Column::Revoked, Expr::value(true))
            .filter(refresh_token::Column::UserEmail.eq(user_email))
            .filter(refresh_token::Column::Revoked.eq(false))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(result.rows_affected)
    }
}

#[async_trait]
impl AuditLogRepository for PostgresAuditLogRepository {
    async fn append(&self, log: AuditLog) -> Result<(), RepoError> {
        self.insert_model(log.into()).await?;
        Ok(())
    }

    async fn find_by_email(&self, user_email: &str) -> Result<Vec<AuditLog>, RepoError> {
        let rows = AuditLogEntity::find()
            .filter(audit_log::Column::UserEmail.eq(user_email))
            .order_by_asc(audit_log::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[async_trait]
impl ItemRepository for PostgresItemRepository {
    async fn insert(&self, item: Item) -> Result<Item, RepoError> {
        Ok(self.insert_model(item.into()).await?.into())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Item>, RepoError> {
        let found = ItemEntity::find()
            .filter(item::Column::Name.eq(name))
            .one(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(found.map(Into::into))
    }

    async fn search_by_name(&self, substring: &str) -> Result<Vec<Item>, RepoError> {
        let rows = ItemEntity::find()
            .filter(item::Column::Name.like(literal_like(substring)))
            .order_by_asc(item::Column::Name)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_in_price_range(&self, range: PriceRange) -> Result<Vec<Item>, RepoError> {
        let rows = ItemEntity::find()
            .filter(item::Column::Price.gt(range.lower))
            .filter(item::Column::Price.lt(range.upper))
            .order_by_asc(item::Column::Price)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn find_page(&self, page: ItemPage) -> Result<Vec<Item>, RepoError> {
        let column = match page.sort_by {
            ItemSortKey::Name => item::Column::Name,
            ItemSortKey::Price => item::Column::Price,
            ItemSortKey::Quantity => item::Column::Quantity,
        };
        let order = if page.ascending { Order::Asc } else { Order::Desc };

        let rows = ItemEntity::find()
            .order_by(column, order)
            // Name is unique, so ties on price/quantity still page deterministically.
            .order_by_asc(item::Column::Name)
            .offset(page.offset())
            .limit(page.per_page)
            .all(&self.db)
            .await
            .map_err(map_db_err)?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn set_quantity(&self, name: &str, quantity: i64) -> Result<(), RepoError> {
        let result = ItemEntity::update_many()
            .col_expr(item::Column::Quantity, Expr::value(quantity))
            .filter(item::Column::Name.eq(name))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    async fn take_stock(&self, name: &str, amount: i64) -> Result<bool, RepoError> {
        // Single conditional UPDATE; concurrent buyers cannot oversell.
        let result = ItemEntity::update_many()
            .col_expr(
                item::Column::Quantity,
                Expr::col(item::Column::Quantity).sub(amount),
            )
            .filter(item::Column::Name.eq(name))
            .filter(item::Column::Quantity.gte(amount))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected > 0 {
            return Ok(true);
        }
        match self.find_by_name(name).await? {
            Some(_) => Ok(false),
            None => Err(RepoError::NotFound),
        }
    }

    async fn restock(&self, name: &str, amount: i64) -> Result<(), RepoError> {
        let result = ItemEntity::update_many()
            .col_expr(
                item::Column::Quantity,
                Expr::col(item::Column::Quantity).add(amount),
            )
            .filter(item::Column::Name.eq(name))
            .exec(&self.db)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn insert(&self, invoice: Invoice) -> Result<Invoice, RepoError> {
        let model = self.insert_model(invoice::ActiveModel::try_from(invoice)?).await?;
        Invoice::try_from(model)
    }

    async fn find_by_email(&self, user_email: &str) -> Result<Vec<Invoice>, RepoError> {
        InvoiceEntity::find()
            .filter(invoice::Column::UserEmail.eq(user_email))
            .order_by_asc(invoice::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(map_db_err)?
            .into_iter()
            .map(Invoice::try_from)
            .collect()
    }
}
