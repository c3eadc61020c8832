use chrono::{DateTime, Utc};
use sea_orm::*;
use uuid::Uuid;

use crate::models::{esigns, payment_operations, payments, phases, tasks};

/// Payments of every task in the contract that have not been paid out yet.
pub async fn get_unpaid_payments<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
) -> Result<Vec<payments::Model>, DbErr> {
    payments::Entity::find()
        .inner_join(tasks::Entity)
        .join(JoinType::InnerJoin, tasks::Relation::Phase.def())
        .filter(phases::Column::ContractId.eq(contract_id))
        .filter(payments::Column::PayoutId.is_null())
        .order_by_asc(payments::Column::CreatedAt)
        .all(db)
        .await
}

/// Claim payments for payout. Only rows with no previous request are touched,
/// so of two concurrent claims over the same rows exactly one gets them back.
pub async fn claim_for_payout<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
    esign_id: Uuid,
    requested_at: DateTime<Utc>,
) -> Result<Vec<payments::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    payments::Entity::update_many()
        .set(payments::ActiveModel {
            esign_id: Set(Some(esign_id)),
            payout_requested_at: Set(Some(requested_at)),
            ..Default::default()
        })
        .filter(payments::Column::Id.is_in(ids))
        .filter(payments::Column::PayoutRequestedAt.is_null())
        .exec_with_returning(db)
        .await
}

pub async fn set_external_job_id<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
    job_id: &str,
) -> Result<u64, DbErr> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = payments::Entity::update_many()
        .set(payments::ActiveModel {
            external_job_id: Set(Some(job_id.to_string())),
            ..Default::default()
        })
        .filter(payments::Column::Id.is_in(ids))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

/// Every payment already attached to one of `job_ids`.
pub async fn get_payments_by_job_ids<C: ConnectionTrait>(
    db: &C,
    job_ids: Vec<String>,
) -> Result<Vec<payments::Model>, DbErr> {
    if job_ids.is_empty() {
        return Ok(Vec::new());
    }

    payments::Entity::find()
        .filter(payments::Column::ExternalJobId.is_in(job_ids))
        .all(db)
        .await
}

pub async fn get_payments_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> Result<Vec<payments::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    payments::Entity::find()
        .filter(payments::Column::Id.is_in(ids))
        .all(db)
        .await
}

pub async fn insert_esign<C: ConnectionTrait>(
    db: &C,
    role_id: Uuid,
    signature: String,
) -> Result<esigns::Model, DbErr> {
    esigns::ActiveModel {
        id: Set(Uuid::new_v4()),
        role_id: Set(role_id),
        signature: Set(signature),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

pub async fn get_operations_by_ids<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> Result<Vec<payment_operations::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    payment_operations::Entity::find()
        .filter(payment_operations::Column::Id.is_in(ids))
        .all(db)
        .await
}
