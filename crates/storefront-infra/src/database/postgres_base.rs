use std::marker::PhantomData;

use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DbConn, DbErr, EntityTrait, IntoActiveModel, SqlErr,
};

use storefront_core::error::RepoError;

/// Shared plumbing for the PostgreSQL stores: one connection, one entity.
pub struct PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub(crate) db: DbConn,
    _entity: PhantomData<E>,
}

impl<E> PostgresBaseRepository<E>
where
    E: EntityTrait,
{
    pub fn new(db: DbConn) -> Self {
        Self {
            db,
            _entity: PhantomData,
        }
    }

    pub(crate) async fn insert_model(&self, model: E::ActiveModel) -> Result<E::Model, RepoError>
    where
        E::Model: IntoActiveModel<E::ActiveModel> + Send + Sync,
        E::ActiveModel: ActiveModelTrait<Entity = E> + ActiveModelBehavior + Send + Sync,
    {
        model.insert(&self.db).await.map_err(map_db_err)
    }
}

/// Translate a SeaORM error into the store error the ports speak.
pub(crate) fn map_db_err(e: DbErr) -> RepoError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = e.sql_err() {
        return RepoError::Constraint(detail);
    }
    match e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(e.to_string()),
        DbErr::RecordNotFound(_) => RepoError::NotFound,
        other => RepoError::Query(other.to_string()),
    }
}
