use sea_orm::Set;
use sea_orm::entity::prelude::*;

use storefront_core::domain::Item;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub name: String,
    pub price: i64,
    pub quantity: i64,
    #[sea_orm(column_type = "Text")]
    pub review: String,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Item {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            price: model.price,
            quantity: model.quantity,
            review: model.review,
            created_at: model.created_at.into(),
        }
    }
}

impl From<Item> for ActiveModel {
    fn from(item: Item) -> Self {
        Self {
            id: Set(item.id),
            name: Set(item.name),
            price: Set(item.price),
            quantity: Set(item.quantity),
            review: Set(item.review),
            created_at: Set(item.created_at.into()),
        }
    }
}
