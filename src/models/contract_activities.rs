use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of entry in a contract's activity log.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    #[sea_orm(string_value = "change_order_new")]
    ChangeOrderNew,
    #[sea_orm(string_value = "change_order_edited")]
    ChangeOrderEdited,
    #[sea_orm(string_value = "change_order_approved")]
    ChangeOrderApproved,
    #[sea_orm(string_value = "change_order_declined")]
    ChangeOrderDeclined,
    #[sea_orm(string_value = "task_new")]
    TaskNew,
    #[sea_orm(string_value = "task_edited")]
    TaskEdited,
    #[sea_orm(string_value = "task_decision_submit")]
    TaskDecisionSubmit,
    #[sea_orm(string_value = "task_decision_make")]
    TaskDecisionMake,
    #[sea_orm(string_value = "payout_requested")]
    PayoutRequested,
    #[sea_orm(string_value = "payout_approved")]
    PayoutApproved,
    #[sea_orm(string_value = "file_new")]
    FileNew,
}

/// SeaORM entity for the `contract_activities` table.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "contract_activities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub contract_id: Uuid,
    pub role_id: Option<Uuid>,
    pub activity_type: ActivityType,
    pub subject_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Query parameters for the activity feed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ActivityQuery {
    pub last_activity: Option<chrono::DateTime<chrono::Utc>>,
}
