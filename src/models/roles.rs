use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The kind of account a role acts as, stored as a lowercase string.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    #[sea_orm(string_value = "pro")]
    Pro,
    #[sea_orm(string_value = "home_owner")]
    HomeOwner,
    #[sea_orm(string_value = "admin")]
    Admin,
}

/// SeaORM entity for the `roles` table.
///
/// A user may hold several roles; requests always act as one of them.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: RoleKind,
    pub display_name: Option<String>,
    /// Customer id at the billing provider.
    pub billing_customer_id: Option<String>,
    pub subscription_payment_method_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::subscriptions::Entity")]
    Subscriptions,
}

impl Related<super::subscriptions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subscriptions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// A safe role representation for API responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: RoleKind,
    pub display_name: Option<String>,
}

impl From<Model> for RoleResponse {
    fn from(m: Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            display_name: m.display_name,
        }
    }
}
