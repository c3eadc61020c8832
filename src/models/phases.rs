use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `phases` table.
///
/// `order` values within one contract always form a contiguous run.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "phases")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub contract_id: Uuid,
    pub name: String,
    pub order: i32,
    pub actual_material_cost: Option<i64>,
    pub actual_labor_cost: Option<i64>,
    pub actual_other_cost: Option<i64>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contracts::Entity",
        from = "Column::ContractId",
        to = "super::contracts::Column::Id"
    )]
    Contract,
    #[sea_orm(has_many = "super::tasks::Entity")]
    Tasks,
}

impl Related<super::contracts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contract.def()
    }
}

impl Related<super::tasks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tasks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// ── DTOs ──

#[derive(Debug, Clone, Deserialize)]
pub struct MovePhase {
    pub move_to: i32,
}

/// Actual costs reported by the pro, in cents.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PhaseCost {
    pub material: Option<i64>,
    pub labor: Option<i64>,
    pub other: Option<i64>,
}
