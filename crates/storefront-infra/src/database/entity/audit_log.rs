use sea_orm::Set;
use sea_orm::entity::prelude::*;

use storefront_core::domain::{AuditLog, AuditStatus};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub user_email: String,
    pub action: String,
    #[sea_orm(column_type = "Text")]
    pub detail: String,
    /// `success` or `failed`.
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for AuditLog {
    fn from(model: Model) -> Self {
        let status = if model.status == AuditStatus::Failed.as_str() {
            AuditStatus::Failed
        } else {
            AuditStatus::Success
        };
        Self {
            id: model.id,
            user_email: model.user_email,
            action: model.action,
            detail: model.detail,
            status,
            created_at: model.created_at.into(),
        }
    }
}

impl From<AuditLog> for ActiveModel {
    fn from(log: AuditLog) -> Self {
        Self {
            id: Set(log.id),
            user_email: Set(log.user_email),
            action: Set(log.action),
            detail: Set(log.detail),
            status: Set(log.status.as_str().to_string()),
            created_at: Set(log.created_at.into()),
        }
    }
}
