use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::middleware::CurrentRole;
use crate::billing::BillingClient;
use crate::errors::ApiError;
use crate::events::EventDispatcher;
use crate::handlers::finish;
use crate::jobs::JobQueue;
use crate::models::contract_activities::ActivityQuery;
use crate::models::contracts::{
    AnswerInvite, ContractListQuery, EndContract, ManageContractsQuery, MemberQuery,
    SelectPaymentPlan, UpdateContract,
};
use crate::services::{contracts as contract_service, summary as summary_service};
use crate::tx::RequestTx;

/// GET /api/contracts?archived=true: contracts the acting role can read.
pub async fn get_contracts(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    query: web::Query<ContractListQuery>,
) -> Result<HttpResponse, ApiError> {
    let archived = query.archived.unwrap_or(false);
    let contracts =
        contract_service::list_contracts(db.get_ref(), role.acting(), archived).await?;
    Ok(HttpResponse::Ok().json(contracts))
}

/// GET /api/contracts/manage?force_fetch_contract_id=<uuid>
pub async fn get_manage_contracts(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    query: web::Query<ManageContractsQuery>,
) -> Result<HttpResponse, ApiError> {
    let contracts = contract_service::get_manage_contracts(
        db.get_ref(),
        role.acting(),
        query.force_fetch_contract_id,
    )
    .await?;
    Ok(HttpResponse::Ok().json(contracts))
}

/// GET /api/contracts/{id}
pub async fn get_contract(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let contract =
        contract_service::get_contract(db.get_ref(), role.acting(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(contract))
}

/// PATCH /api/contracts/{id}: edit name, auto-release days or date mode.
pub async fn update_contract(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateContract>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let contract = contract_service::update_contract(
        &mut tx,
        role.acting(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(contract))
}

/// POST /api/contracts/{id}/invite: the invited pro accepts or declines.
pub async fn answer_invite(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    path: web::Path<Uuid>,
    body: web::Json<AnswerInvite>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let contract = contract_service::answer_invite(
        &mut tx,
        role.acting(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(contract))
}

/// POST /api/contracts/{id}/end
///
/// Ends the contract. Without `partial_payment` an esign is required, only
/// the homeowner side may do it, and every unpaid payment is requested for
/// payout.
pub async fn end_contract(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    jobs: web::Data<Arc<JobQueue>>,
    billing: web::Data<Arc<BillingClient>>,
    path: web::Path<Uuid>,
    body: web::Json<EndContract>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let ended = contract_service::end_contract(
        &mut tx,
        jobs.get_ref().as_ref(),
        billing.get_ref(),
        role.acting(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(ended.contract))
}

/// POST /api/contracts/{id}/reopen
pub async fn reopen_contract(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    billing: web::Data<Arc<BillingClient>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let contract = contract_service::reopen_contract(
        &mut tx,
        billing.get_ref(),
        role.acting(),
        path.into_inner(),
    )
    .await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(contract))
}

/// POST /api/contracts/{id}/archive: hide the contract for the acting role.
pub async fn archive_contract(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    billing: web::Data<Arc<BillingClient>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let contract = contract_service::archive_contract(
        &mut tx,
        billing.get_ref(),
        role.acting(),
        path.into_inner(),
    )
    .await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(contract))
}

/// DELETE /api/contracts/{id}/archive
pub async fn unarchive_contract(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let contract =
        contract_service::unarchive_contract(&mut tx, role.acting(), path.into_inner()).await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(contract))
}

/// PUT /api/contracts/{id}/payment-plan
pub async fn select_payment_plan(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    path: web::Path<Uuid>,
    body: web::Json<SelectPaymentPlan>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let contract = contract_service::select_payment_plan(
        &mut tx,
        role.acting(),
        path.into_inner(),
        body.plan,
    )
    .await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(contract))
}

/// POST /api/contracts/{id}/dismiss-review-dates
pub async fn dismiss_review_dates(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let contract =
        contract_service::dismiss_review_dates(&mut tx, role.acting(), path.into_inner()).await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(contract))
}

/// GET /api/contracts/{id}/members
pub async fn get_members(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    query: web::Query<MemberQuery>,
) -> Result<HttpResponse, ApiError> {
    let members = contract_service::get_members(
        db.get_ref(),
        role.acting(),
        path.into_inner(),
        query.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(members))
}

/// GET /api/contracts/{id}/activities?last_activity=<rfc3339>
pub async fn get_activities(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    query: web::Query<ActivityQuery>,
) -> Result<HttpResponse, ApiError> {
    let activities = contract_service::get_activities(
        db.get_ref(),
        role.acting(),
        path.into_inner(),
        query.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(activities))
}

/// GET /api/contracts/{id}/summary: always computed from the store.
pub async fn get_summary(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let summary =
        summary_service::get_summary(db.get_ref(), path.into_inner(), role.acting()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
