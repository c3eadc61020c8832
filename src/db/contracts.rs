use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::*;
use uuid::Uuid;

use crate::models::contract_activities;
use crate::models::contract_archives;
use crate::models::contract_completions::{self, CompletionType};
use crate::models::contracts::{self, InviteRefusalReason, PaymentPlan, Status, UpdateContract};
use crate::models::{collaborators, roles};

/// Max entries returned by one activity feed page.
pub const ACTIVITY_PAGE_SIZE: u64 = 40;

/// Fetch a single contract by ID.
pub async fn get_contract_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<contracts::Model>, DbErr> {
    contracts::Entity::find_by_id(id).one(db).await
}

/// Write the partner's answer. Returns `None` when the contract is not
/// addressed to `partner_id`.
pub async fn record_invite_answer<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    partner_id: Uuid,
    status: Status,
    refusal_reason: Option<InviteRefusalReason>,
    refusal_message: Option<String>,
) -> Result<Option<contracts::Model>, DbErr> {
    let updated = contracts::Entity::update_many()
        .set(contracts::ActiveModel {
            status: Set(status),
            invite_refusal_reason: Set(refusal_reason),
            invite_refusal_message: Set(refusal_message),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(contracts::Column::Id.eq(contract_id))
        .filter(contracts::Column::PartnerId.eq(partner_id))
        .exec_with_returning(db)
        .await?;

    Ok(updated.into_iter().next())
}

pub async fn set_status<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    status: Status,
) -> Result<Option<contracts::Model>, DbErr> {
    let updated = contracts::Entity::update_many()
        .set(contracts::ActiveModel {
            status: Set(status),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(contracts::Column::Id.eq(contract_id))
        .exec_with_returning(db)
        .await?;

    Ok(updated.into_iter().next())
}

/// Mark the contract as paid through a subscription.
pub async fn set_subscription<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    subscription_id: Uuid,
) -> Result<(), DbErr> {
    contracts::Entity::update_many()
        .set(contracts::ActiveModel {
            paid: Set(true),
            subscription_id: Set(Some(subscription_id)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(contracts::Column::Id.eq(contract_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Update editable fields. Hired contracts are left untouched, in which case
/// `None` is returned.
pub async fn update_contract<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    input: UpdateContract,
) -> Result<Option<contracts::Model>, DbErr> {
    let mut changes = contracts::ActiveModel {
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    if let Some(name) = input.name {
        changes.name = Set(name);
    }
    if let Some(days) = input.auto_release_days {
        changes.auto_release_days = Set(Some(days));
    }
    if let Some(relative) = input.relative_dates {
        changes.relative_dates = Set(relative);
    }

    let updated = contracts::Entity::update_many()
        .set(changes)
        .filter(contracts::Column::Id.eq(contract_id))
        .filter(contracts::Column::Status.ne(Status::Hired))
        .exec_with_returning(db)
        .await?;

    Ok(updated.into_iter().next())
}

pub async fn set_payment_plan<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    plan: PaymentPlan,
) -> Result<Option<contracts::Model>, DbErr> {
    let updated = contracts::Entity::update_many()
        .set(contracts::ActiveModel {
            payment_plan: Set(Some(plan)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        })
        .filter(contracts::Column::Id.eq(contract_id))
        .exec_with_returning(db)
        .await?;

    Ok(updated.into_iter().next())
}

pub async fn increment_dismiss_review_dates<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
) -> Result<Option<contracts::Model>, DbErr> {
    let updated = contracts::Entity::update_many()
        .col_expr(
            contracts::Column::DismissReviewDates,
            Expr::cust(r#""dismiss_review_dates" + 1"#),
        )
        .col_expr(contracts::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(contracts::Column::Id.eq(contract_id))
        .exec_with_returning(db)
        .await?;

    Ok(updated.into_iter().next())
}

// ── Completions ──

pub async fn insert_completion<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    initiated_by_id: Option<Uuid>,
    reason: String,
    partial_payment: bool,
    completion_type: CompletionType,
) -> Result<contract_completions::Model, DbErr> {
    contract_completions::ActiveModel {
        id: Set(Uuid::new_v4()),
        contract_id: Set(contract_id),
        initiated_by_id: Set(initiated_by_id),
        reason: Set(reason),
        partial_payment: Set(partial_payment),
        completion_type: Set(completion_type),
        created_at: Set(Utc::now()),
    }
    .insert(db)
    .await
}

/// The active completion is the newest one.
pub async fn latest_completion<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
) -> Result<Option<contract_completions::Model>, DbErr> {
    contract_completions::Entity::find()
        .filter(contract_completions::Column::ContractId.eq(contract_id))
        .order_by_desc(contract_completions::Column::CreatedAt)
        .one(db)
        .await
}

pub async fn delete_completion<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<(), DbErr> {
    contract_completions::Entity::delete_by_id(id).exec(db).await?;
    Ok(())
}

// ── Archive markers ──

/// Insert the marker for `role_id`. Archiving twice is a no-op.
pub async fn archive<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    role_id: Uuid,
) -> Result<(), DbErr> {
    let marker = contract_archives::ActiveModel {
        id: Set(Uuid::new_v4()),
        contract_id: Set(contract_id),
        role_id: Set(role_id),
        created_at: Set(Utc::now()),
    };

    let result = contract_archives::Entity::insert(marker)
        .on_conflict(
            OnConflict::columns([
                contract_archives::Column::ContractId,
                contract_archives::Column::RoleId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec(db)
        .await;

    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

pub async fn unarchive<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    role_id: Uuid,
) -> Result<(), DbErr> {
    contract_archives::Entity::delete_many()
        .filter(contract_archives::Column::ContractId.eq(contract_id))
        .filter(contract_archives::Column::RoleId.eq(role_id))
        .exec(db)
        .await?;
    Ok(())
}

pub async fn archived_contract_ids<C: ConnectionTrait>(
    db: &C,
    role_id: Uuid,
) -> Result<Vec<Uuid>, DbErr> {
    let markers = contract_archives::Entity::find()
        .filter(contract_archives::Column::RoleId.eq(role_id))
        .all(db)
        .await?;
    Ok(markers.into_iter().map(|m| m.contract_id).collect())
}

// ── Membership ──

/// Collaborator grants held by `role_id`, across all contracts.
pub async fn grants_for_role<C: ConnectionTrait>(
    db: &C,
    role_id: Uuid,
) -> Result<Vec<collaborators::Model>, DbErr> {
    collaborators::Entity::find()
        .filter(collaborators::Column::RoleId.eq(role_id))
        .all(db)
        .await
}

/// Contracts where the role is owner, partner, or one of `extra_ids`.
pub async fn contracts_for_role<C: ConnectionTrait>(
    db: &C,
    role_id: Uuid,
    extra_ids: Vec<Uuid>,
) -> Result<Vec<contracts::Model>, DbErr> {
    let mut condition = Condition::any()
        .add(contracts::Column::OwnerId.eq(role_id))
        .add(contracts::Column::PartnerId.eq(role_id));
    if !extra_ids.is_empty() {
        condition = condition.add(contracts::Column::Id.is_in(extra_ids));
    }

    contracts::Entity::find()
        .filter(condition)
        .order_by_desc(contracts::Column::CreatedAt)
        .all(db)
        .await
}

pub async fn collaborators_of<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
) -> Result<Vec<collaborators::Model>, DbErr> {
    collaborators::Entity::find()
        .filter(collaborators::Column::ContractId.eq(contract_id))
        .all(db)
        .await
}

pub async fn get_role_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<roles::Model>, DbErr> {
    roles::Entity::find_by_id(id).one(db).await
}

pub async fn get_roles<C: ConnectionTrait>(
    db: &C,
    ids: Vec<Uuid>,
) -> Result<Vec<roles::Model>, DbErr> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    roles::Entity::find()
        .filter(roles::Column::Id.is_in(ids))
        .all(db)
        .await
}

// ── Activity feed ──

/// Newest activities first, optionally only those touched since `since`.
pub async fn get_activities<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    since: Option<DateTime<Utc>>,
) -> Result<Vec<contract_activities::Model>, DbErr> {
    let mut query = contract_activities::Entity::find()
        .filter(contract_activities::Column::ContractId.eq(contract_id));
    if let Some(since) = since {
        query = query.filter(contract_activities::Column::UpdatedAt.gte(since));
    }

    query
        .order_by_desc(contract_activities::Column::UpdatedAt)
        .limit(ACTIVITY_PAGE_SIZE)
        .all(db)
        .await
}
