//! Invoice entity. Lines are embedded as a JSON array.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use storefront_core::domain::{Invoice, InvoiceStatus};
use storefront_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub user_email: String,
    pub items: Json,
    pub total_amount: i64,
    pub status: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Invoice {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let items = serde_json::from_value(model.items)
            .map_err(|e| RepoError::Query(format!("Corrupt invoice lines in {}: {}", model.id, e)))?;
        let status = InvoiceStatus::parse(&model.status).ok_or_else(|| {
            RepoError::Query(format!("Unknown invoice status: {}", model.status))
        })?;

        Ok(Self {
            id: model.id,
            user_email: model.user_email,
            items,
            total_amount: model.total_amount,
            status,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl TryFrom<Invoice> for ActiveModel {
    type Error = RepoError;

    fn try_from(invoice: Invoice) -> Result<Self, Self::Error> {
        let items = serde_json::to_value(&invoice.items)
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(Self {
            id: Set(invoice.id),
            user_email: Set(invoice.user_email),
            items: Set(items),
            total_amount: Set(invoice.total_amount),
            status: Set(invoice.status.as_str().to_string()),
            created_at: Set(invoice.created_at.into()),
            updated_at: Set(invoice.updated_at.into()),
        })
    }
}
