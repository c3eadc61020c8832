use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::contract_activities::ActivityType;

/// Per-role "last seen" cursor for one activity type on one subject
/// (change order, decision, task or payment).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "activity_seen")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub role_id: Uuid,
    pub contract_id: Uuid,
    pub activity_type: ActivityType,
    pub subject_id: Uuid,
    pub seen_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

/// Request body for marking activity as seen. Exactly one field must be populated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeenActivityInput {
    pub change_orders: Option<Vec<Uuid>>,
    pub payments: Option<Vec<Uuid>>,
    pub decisions: Option<Vec<Uuid>>,
    pub task_id: Option<Uuid>,
}
