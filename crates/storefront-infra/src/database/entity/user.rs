//! User entity for SeaORM.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

use storefront_core::domain::{Role, User};
use storefront_core::error::RepoError;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    /// Role names as a JSON array, e.g. `["Admin","User"]`.
    pub roles: Json,
    pub is_active: bool,
    pub is_disabled: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub(crate) fn roles_to_json(roles: &[Role]) -> Json {
    Json::Array(
        roles
            .iter()
            .map(|r| Json::String(r.as_str().to_string()))
            .collect(),
    )
}

/// Rows written by hand may carry unknown role names; those fail the read.
impl TryFrom<Model> for User {
    type Error = RepoError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let roles: Vec<Role> = serde_json::from_value(model.roles)
            .map_err(|e| RepoError::Query(format!("Corrupt roles for {}: {}", model.email, e)))?;

        Ok(Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            password_hash: model.password_hash,
            roles,
            is_active: model.is_active,
            is_disabled: model.is_disabled,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}

impl From<User> for ActiveModel {
    fn from(user: User) -> Self {
        Self {
            id: Set(user.id),
            roles: Set(roles_to_json(&user.roles)),
            email: Set(user.email),
            full_name: Set(user.full_name),
            password_hash: Set(user.password_hash),
            is_active: Set(user.is_active),
            is_disabled: Set(user.is_disabled),
            created_at: Set(user.created_at.into()),
            updated_at: Set(user.updated_at.into()),
        }
    }
}
