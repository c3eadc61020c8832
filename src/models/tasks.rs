use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[sea_orm(string_value = "todo")]
    Todo,
    #[sea_orm(string_value = "doing")]
    Doing,
    #[sea_orm(string_value = "done")]
    Done,
}

/// SeaORM entity for the `tasks` table. Costs are stored in cents.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tasks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub phase_id: Uuid,
    pub name: String,
    pub material_cost: i64,
    pub labor_cost: i64,
    pub other_cost: i64,
    pub markup_percent: i32,
    pub status: TaskStatus,
    pub start_date: DateTimeUtc,
    pub end_date: DateTimeUtc,
    pub payment_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::phases::Entity",
        from = "Column::PhaseId",
        to = "super::phases::Column::Id"
    )]
    Phase,
    #[sea_orm(
        belongs_to = "super::payments::Entity",
        from = "Column::PaymentId",
        to = "super::payments::Column::Id"
    )]
    Payment,
}

impl Related<super::phases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Phase.def()
    }
}

impl Related<super::payments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Payment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Total of a cost breakdown with markup applied, in cents.
pub fn cost_total(material: i64, labor: i64, other: i64, markup_percent: i32) -> i64 {
    let cost = material + labor + other;
    cost + cost * i64::from(markup_percent) / 100
}

impl Model {
    pub fn total(&self) -> i64 {
        cost_total(
            self.material_cost,
            self.labor_cost,
            self.other_cost,
            self.markup_percent,
        )
    }
}
