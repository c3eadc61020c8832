use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a task at a given version.
///
/// The lowest version is the task as originally agreed. When that first
/// version carries a `change_order_id`, the task itself was created by a
/// change order.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "task_versions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub task_id: Uuid,
    pub version: i32,
    pub change_order_id: Option<Uuid>,
    pub material_cost: i64,
    pub labor_cost: i64,
    pub other_cost: i64,
    pub markup_percent: i32,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn total(&self) -> i64 {
        super::tasks::cost_total(
            self.material_cost,
            self.labor_cost,
            self.other_cost,
            self.markup_percent,
        )
    }
}
