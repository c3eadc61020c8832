use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// SeaORM entity for the `payments` table. Each payment funds exactly one task.
///
/// `payout_requested_at` is written once: every claim filters on it being null.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub charge_id: Option<Uuid>,
    pub payout_id: Option<Uuid>,
    pub payout_requested_at: Option<DateTimeUtc>,
    pub esign_id: Option<Uuid>,
    /// Id of the `release-payout` job covering this payment.
    pub external_job_id: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::tasks::Entity")]
    Task,
}

impl Related<super::tasks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Task.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
