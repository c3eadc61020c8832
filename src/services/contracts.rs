//! Contract lifecycle: invites, completion, reopening, archiving and the
//! smaller edits and queries around them.

use sea_orm::ConnectionTrait;
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;
use uuid::Uuid;

use crate::auth::access::{self, AccessOptions, ActingRole, ContractSnapshot};
use crate::billing::BillingClient;
use crate::db::contracts as contract_db;
use crate::errors::{ApiError, ForbiddenReason, Result};
use crate::events::AfterCommit;
use crate::jobs::{JobLookup, payloads, queues};
use crate::models::collaborators::Permission;
use crate::models::contract_activities::{self, ActivityQuery};
use crate::models::contract_completions::{self, CompletionType};
use crate::models::contracts::{
    self, AnswerInvite, EndContract, MemberQuery, PaymentPlan, Status, UpdateContract,
};
use crate::models::roles::{RoleKind, RoleResponse};
use crate::pubsub::protocol::ContractEvent;
use crate::services::{payouts, subscriptions};
use crate::tx::RequestTx;

/// Statuses past the invite stage. An invite can no longer be accepted once
/// the contract reached one of them.
pub const HIGHER_STATUSES: [Status; 4] = [
    Status::PreparingEstimate,
    Status::WaitingReview,
    Status::Hired,
    Status::Completed,
];

#[derive(Debug, Clone)]
pub struct ContractEnded {
    pub contract: contracts::Model,
    pub completion: contract_completions::Model,
    /// Payments whose payout this call requested.
    pub released: Vec<Uuid>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Member {
    pub role: RoleResponse,
    pub permission: Permission,
}

fn notify(
    kind: payloads::NotificationKind,
    contract_id: Uuid,
) -> core::result::Result<AfterCommit, serde_json::Error> {
    AfterCommit::enqueue(
        queues::NOTIFICATIONS,
        &payloads::Notification { kind, contract_id },
    )
}

fn contract_updated(contract: &contracts::Model) -> AfterCommit {
    AfterCommit::Publish(ContractEvent::ContractUpdated {
        contract: contract.clone(),
    })
}

// ── Invites ──

pub async fn answer_invite(
    tx: &mut RequestTx,
    actor: ActingRole,
    contract_id: Uuid,
    input: AnswerInvite,
) -> Result<contracts::Model> {
    if !input.accept && input.refusal_reason.is_none() {
        return Err(ApiError::validation("You must provide refusal reason"));
    }

    let status = if input.accept {
        Status::AcceptedInvite
    } else {
        Status::NotInterested
    };

    if input.accept {
        let current = contract_db::get_contract_by_id(tx.conn(), contract_id)
            .await?
            .ok_or_else(|| ApiError::not_found("contract"))?;
        if HIGHER_STATUSES.contains(&current.status) {
            return Err(ApiError::validation(
                "You cannot accept the invite because the contract has moved past it",
            ));
        }
    }

    let contract = contract_db::record_invite_answer(
        tx.conn(),
        contract_id,
        actor.id,
        status,
        input.refusal_reason,
        input.refusal_message,
    )
    .await?
    .ok_or_else(|| ApiError::not_found("contract"))?;

    info!(%contract_id, role_id = %actor.id, accept = input.accept, "invite answered");
    tx.defer(contract_updated(&contract));
    tx.defer(notify(
        payloads::NotificationKind::ProjectInviteAnswered,
        contract_id,
    )?);

    Ok(contract)
}

// ── Completion ──

/// Checks that need nothing but the request itself.
pub fn validate_end_request(actor: RoleKind, input: &EndContract) -> Result<()> {
    if !input.partial_payment {
        if input.esign.is_none() {
            return Err(ApiError::validation("Esign is invalid"));
        }
        if actor == RoleKind::Pro {
            return Err(ApiError::forbidden(
                ForbiddenReason::NotAllowed,
                "Pro can end contract only with partial payment",
            ));
        }
    }

    if let Some(esign) = &input.esign {
        if esign.signature.trim().is_empty() {
            return Err(ApiError::validation("Esign is invalid"));
        }
    }

    Ok(())
}

async fn mark_completed(tx: &mut RequestTx, contract_id: Uuid) -> Result<contracts::Model> {
    let contract = contract_db::set_status(tx.conn(), contract_id, Status::Completed)
        .await?
        .ok_or_else(|| ApiError::not_found("contract"))?;
    tx.defer(contract_updated(&contract));
    Ok(contract)
}

async fn record_completion(
    tx: &mut RequestTx,
    billing: &BillingClient,
    contract: &contracts::Model,
    initiated_by_id: Option<Uuid>,
    reason: String,
    partial_payment: bool,
    completion_type: CompletionType,
) -> Result<contract_completions::Model> {
    if contract.is_monthly_subscription() {
        subscriptions::disable_monthly_subscription(tx, billing, contract).await?;
    }

    let completion = contract_db::insert_completion(
        tx.conn(),
        contract.id,
        initiated_by_id,
        reason,
        partial_payment,
        completion_type,
    )
    .await?;

    tx.defer(notify(payloads::NotificationKind::ContractEnded, contract.id)?);
    tx.defer(AfterCommit::RefreshSummary {
        contract_id: contract.id,
    });

    info!(contract_id = %contract.id, ?completion_type, partial_payment, "contract ended");
    Ok(completion)
}

/// End the contract on behalf of a user. With full payment every unpaid
/// payment is requested for payout under the supplied signature.
pub async fn end_contract<J: JobLookup>(
    tx: &mut RequestTx,
    jobs: &J,
    billing: &BillingClient,
    actor: ActingRole,
    contract_id: Uuid,
    input: EndContract,
) -> Result<ContractEnded> {
    validate_end_request(actor.kind, &input)?;

    access::authorize(
        tx.conn(),
        contract_id,
        actor,
        AccessOptions::full().not_ended(),
    )
    .await?;

    let contract = mark_completed(tx, contract_id).await?;

    let released = match (input.partial_payment, input.esign) {
        (false, Some(esign)) => {
            payouts::release_payments(tx, jobs, contract.id, actor.id, esign.signature).await?
        }
        _ => Vec::new(),
    };

    let completion = record_completion(
        tx,
        billing,
        &contract,
        Some(actor.id),
        input.reason,
        input.partial_payment,
        CompletionType::User,
    )
    .await?;

    Ok(ContractEnded {
        contract,
        completion,
        released,
    })
}

/// End the contract from a scheduled process. No access check and no payout.
pub async fn end_contract_as_system(
    tx: &mut RequestTx,
    billing: &BillingClient,
    contract_id: Uuid,
    reason: String,
    partial_payment: bool,
) -> Result<ContractEnded> {
    let contract = mark_completed(tx, contract_id).await?;
    let completion = record_completion(
        tx,
        billing,
        &contract,
        None,
        reason,
        partial_payment,
        CompletionType::System,
    )
    .await?;

    Ok(ContractEnded {
        contract,
        completion,
        released: Vec::new(),
    })
}

/// Undo the latest completion and hire the partner again.
pub async fn reopen_contract(
    tx: &mut RequestTx,
    billing: &BillingClient,
    actor: ActingRole,
    contract_id: Uuid,
) -> Result<contracts::Model> {
    access::authorize(
        tx.conn(),
        contract_id,
        actor,
        AccessOptions::full().role(RoleKind::Pro),
    )
    .await?;

    let completion = contract_db::latest_completion(tx.conn(), contract_id)
        .await?
        .ok_or_else(|| ApiError::not_found("contract completions"))?;
    contract_db::delete_completion(tx.conn(), completion.id).await?;

    let mut contract = contract_db::set_status(tx.conn(), contract_id, Status::Hired)
        .await?
        .ok_or_else(|| ApiError::Conflict("contract not updated".to_string()))?;

    if contract.is_monthly_subscription() {
        subscriptions::reconcile_on_reopen(tx, billing, &contract).await?;
        contract = contract_db::get_contract_by_id(tx.conn(), contract_id)
            .await?
            .ok_or_else(|| ApiError::not_found("contract"))?;
    }

    info!(%contract_id, role_id = %actor.id, "contract reopened");
    tx.defer(contract_updated(&contract));
    tx.defer(AfterCommit::RefreshSummary { contract_id });

    Ok(contract)
}

// ── Archive ──

pub async fn archive_contract(
    tx: &mut RequestTx,
    billing: &BillingClient,
    actor: ActingRole,
    contract_id: Uuid,
) -> Result<contracts::Model> {
    let contract =
        access::authorize(tx.conn(), contract_id, actor, AccessOptions::read()).await?;

    contract_db::archive(tx.conn(), contract.id, actor.id).await?;
    if contract.is_monthly_subscription() {
        subscriptions::disable_monthly_subscription(tx, billing, &contract).await?;
    }

    tx.defer(contract_updated(&contract));
    Ok(contract)
}

pub async fn unarchive_contract(
    tx: &mut RequestTx,
    actor: ActingRole,
    contract_id: Uuid,
) -> Result<contracts::Model> {
    let contract =
        access::authorize(tx.conn(), contract_id, actor, AccessOptions::read()).await?;

    contract_db::unarchive(tx.conn(), contract.id, actor.id).await?;

    tx.defer(contract_updated(&contract));
    Ok(contract)
}

// ── Edits ──

pub async fn update_contract(
    tx: &mut RequestTx,
    actor: ActingRole,
    contract_id: Uuid,
    input: UpdateContract,
) -> Result<contracts::Model> {
    let mut options = AccessOptions::full().not_ended();
    if input.auto_release_days.is_some() {
        options = options.role(RoleKind::Pro);
    }
    access::authorize(tx.conn(), contract_id, actor, options).await?;

    let contract = contract_db::update_contract(tx.conn(), contract_id, input)
        .await?
        .ok_or_else(|| {
            ApiError::forbidden(
                ForbiddenReason::NotAllowed,
                "The contract cannot be edited while hired",
            )
        })?;

    tx.defer(contract_updated(&contract));
    Ok(contract)
}

pub async fn select_payment_plan(
    tx: &mut RequestTx,
    actor: ActingRole,
    contract_id: Uuid,
    plan: PaymentPlan,
) -> Result<contracts::Model> {
    let current = contract_db::get_contract_by_id(tx.conn(), contract_id)
        .await?
        .ok_or_else(|| ApiError::not_found("contract"))?;
    if current.status == Status::Hired {
        return Err(ApiError::validation(
            "Cannot select new payment plan for contract with status \"Hired\"",
        ));
    }

    access::authorize(
        tx.conn(),
        contract_id,
        actor,
        AccessOptions::full().role(RoleKind::Pro),
    )
    .await?;

    let contract = contract_db::set_payment_plan(tx.conn(), contract_id, plan)
        .await?
        .ok_or_else(|| ApiError::Conflict("contract not updated".to_string()))?;

    tx.defer(contract_updated(&contract));
    Ok(contract)
}

pub async fn dismiss_review_dates(
    tx: &mut RequestTx,
    actor: ActingRole,
    contract_id: Uuid,
) -> Result<contracts::Model> {
    access::authorize(
        tx.conn(),
        contract_id,
        actor,
        AccessOptions::full().role(RoleKind::Pro),
    )
    .await?;

    let contract = contract_db::increment_dismiss_review_dates(tx.conn(), contract_id)
        .await?
        .ok_or_else(|| ApiError::Conflict("contract not updated".to_string()))?;

    tx.defer(contract_updated(&contract));
    Ok(contract)
}

// ── Queries ──

pub async fn get_contract<C: ConnectionTrait>(
    db: &C,
    actor: ActingRole,
    contract_id: Uuid,
) -> Result<contracts::Model> {
    access::authorize(db, contract_id, actor, AccessOptions::read()).await
}

/// Contracts the role can read. Archived ones are listed only when asked for.
pub async fn list_contracts<C: ConnectionTrait>(
    db: &C,
    actor: ActingRole,
    archived: bool,
) -> Result<Vec<contracts::Model>> {
    let (readable, archived_ids) = readable_contracts(db, actor).await?;
    Ok(readable
        .into_iter()
        .filter(|contract| archived_ids.contains(&contract.id) == archived)
        .collect())
}

/// Hired and completed contracts the role has not archived. A contract named
/// by `force_fetch` is listed even when archived.
pub async fn get_manage_contracts<C: ConnectionTrait>(
    db: &C,
    actor: ActingRole,
    force_fetch: Option<Uuid>,
) -> Result<Vec<contracts::Model>> {
    let (readable, archived_ids) = readable_contracts(db, actor).await?;
    Ok(readable
        .into_iter()
        .filter(|contract| matches!(contract.status, Status::Hired | Status::Completed))
        .filter(|contract| {
            !archived_ids.contains(&contract.id) || force_fetch == Some(contract.id)
        })
        .collect())
}

/// Contracts the role may read, with the ids it archived.
async fn readable_contracts<C: ConnectionTrait>(
    db: &C,
    actor: ActingRole,
) -> Result<(Vec<contracts::Model>, Vec<Uuid>)> {
    let grants: HashMap<Uuid, Permission> = contract_db::grants_for_role(db, actor.id)
        .await?
        .into_iter()
        .map(|g| (g.contract_id, g.permission))
        .collect();
    let archived_ids = contract_db::archived_contract_ids(db, actor.id).await?;

    let candidates =
        contract_db::contracts_for_role(db, actor.id, grants.keys().copied().collect()).await?;

    let readable = candidates
        .into_iter()
        .filter(|contract| {
            let snapshot = ContractSnapshot {
                grant: grants.get(&contract.id).copied(),
                contract: Some(contract.clone()),
            };
            access::evaluate(&snapshot, actor, AccessOptions::read()).is_ok()
        })
        .collect();
    Ok((readable, archived_ids))
}

/// Owner, partner and collaborators with the permission each holds.
///
/// `query.role` keeps members of that role kind, `query.permission` keeps
/// members holding at least that permission.
pub async fn get_members<C: ConnectionTrait>(
    db: &C,
    actor: ActingRole,
    contract_id: Uuid,
    query: MemberQuery,
) -> Result<Vec<Member>> {
    let contract = access::authorize(db, contract_id, actor, AccessOptions::read()).await?;
    let collaborators = contract_db::collaborators_of(db, contract.id).await?;

    let mut role_ids = vec![contract.owner_id, contract.partner_id];
    role_ids.extend(collaborators.iter().map(|c| c.role_id));

    let roles = contract_db::get_roles(db, role_ids).await?;
    Ok(roles
        .into_iter()
        .filter_map(|role| {
            let grant = collaborators
                .iter()
                .find(|c| c.role_id == role.id)
                .map(|c| c.permission);
            let permission = access::effective_permission(&contract, grant, role.id)?;
            if query.role.is_some_and(|kind| kind != role.name)
                || query.permission.is_some_and(|min| permission < min)
            {
                return None;
            }
            Some(Member {
                role: RoleResponse::from(role),
                permission,
            })
        })
        .collect())
}

pub async fn get_activities<C: ConnectionTrait>(
    db: &C,
    actor: ActingRole,
    contract_id: Uuid,
    query: ActivityQuery,
) -> Result<Vec<contract_activities::Model>> {
    access::authorize(db, contract_id, actor, AccessOptions::read()).await?;
    Ok(contract_db::get_activities(db, contract_id, query.last_activity).await?)
}
