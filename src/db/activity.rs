use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::*;
use uuid::Uuid;

use crate::models::activity_seen;
use crate::models::contract_activities::ActivityType;
use crate::models::{change_orders, decisions, phases, tasks};

/// Distinct contracts owning the given change orders.
pub async fn contract_ids_for_change_orders<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> Result<Vec<Uuid>, DbErr> {
    change_orders::Entity::find()
        .select_only()
        .column(change_orders::Column::ContractId)
        .distinct()
        .filter(change_orders::Column::Id.is_in(ids))
        .into_tuple()
        .all(db)
        .await
}

/// Distinct contracts owning the given tasks.
pub async fn contract_ids_for_tasks<C: ConnectionTrait>(
    db: &C,
    task_ids: Vec<Uuid>,
) -> Result<Vec<Uuid>, DbErr> {
    phases::Entity::find()
        .select_only()
        .column(phases::Column::ContractId)
        .distinct()
        .inner_join(tasks::Entity)
        .filter(tasks::Column::Id.is_in(task_ids))
        .into_tuple()
        .all(db)
        .await
}

/// Distinct contracts owning the tasks funded by the given payments.
pub async fn contract_ids_for_payments<C: ConnectionTrait>(
    db: &C,
    payment_ids: Vec<Uuid>,
) -> Result<Vec<Uuid>, DbErr> {
    phases::Entity::find()
        .select_only()
        .column(phases::Column::ContractId)
        .distinct()
        .inner_join(tasks::Entity)
        .filter(tasks::Column::PaymentId.is_in(payment_ids))
        .into_tuple()
        .all(db)
        .await
}

/// Distinct contracts owning the tasks the given decisions belong to.
pub async fn contract_ids_for_decisions<C: ConnectionTrait>(
    db: &C,
    decision_ids: Vec<Uuid>,
) -> Result<Vec<Uuid>, DbErr> {
    let task_ids: Vec<Uuid> = decisions::Entity::find()
        .select_only()
        .column(decisions::Column::TaskId)
        .distinct()
        .filter(decisions::Column::Id.is_in(decision_ids))
        .into_tuple()
        .all(db)
        .await?;

    if task_ids.is_empty() {
        return Ok(Vec::new());
    }
    contract_ids_for_tasks(db, task_ids).await
}

/// Upsert one marker per subject and activity type, then return the stored rows.
pub async fn upsert_seen<C: ConnectionTrait>(
    db: &C,
    role_id: Uuid,
    contract_id: Uuid,
    subjects: &[Uuid],
    types: &[ActivityType],
    seen_at: DateTime<Utc>,
) -> Result<Vec<activity_seen::Model>, DbErr> {
    let rows: Vec<activity_seen::ActiveModel> = subjects
        .iter()
        .flat_map(|subject_id| {
            types.iter().map(move |activity_type| activity_seen::ActiveModel {
                id: Set(Uuid::new_v4()),
                role_id: Set(role_id),
                contract_id: Set(contract_id),
                activity_type: Set(*activity_type),
                subject_id: Set(*subject_id),
                seen_at: Set(seen_at),
            })
        })
        .collect();

    if rows.is_empty() {
        return Ok(Vec::new());
    }

    activity_seen::Entity::insert_many(rows)
        .on_conflict(
            OnConflict::columns([
                activity_seen::Column::RoleId,
                activity_seen::Column::ActivityType,
                activity_seen::Column::SubjectId,
            ])
            .update_column(activity_seen::Column::SeenAt)
            .to_owned(),
        )
        .exec(db)
        .await?;

    activity_seen::Entity::find()
        .filter(activity_seen::Column::RoleId.eq(role_id))
        .filter(activity_seen::Column::SubjectId.is_in(subjects.to_vec()))
        .filter(activity_seen::Column::ActivityType.is_in(types.to_vec()))
        .all(db)
        .await
}
