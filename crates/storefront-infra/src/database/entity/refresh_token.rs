use sea_orm::Set;
use sea_orm::entity::prelude::*;

use storefront_core::domain::RefreshToken;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "refresh_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub user_email: String,
    #[sea_orm(column_type = "Text")]
    pub token: String,
    pub expires_at: DateTimeWithTimeZone,
    pub revoked: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for RefreshToken {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_email: model.user_email,
            token: model.token,
            expires_at: model.expires_at.into(),
            revoked: model.revoked,
            created_at: model.created_at.into(),
        }
    }
}

impl From<RefreshToken> for ActiveModel {
    fn from(token: RefreshToken) -> Self {
        Self {
            id: Set(token.id),
            user_email: Set(token.user_email),
            token: Set(token.token),
            expires_at: Set(token.expires_at.into()),
            revoked: Set(token.revoked),
            created_at: Set(token.created_at.into()),
        }
    }
}
