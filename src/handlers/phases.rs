use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::middleware::CurrentRole;
use crate::errors::ApiError;
use crate::events::EventDispatcher;
use crate::handlers::finish;
use crate::models::phases::{MovePhase, PhaseCost};
use crate::services::phases as phase_service;
use crate::tx::RequestTx;

/// GET /api/contracts/{id}/phases
pub async fn get_phases(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let phases = phase_service::get_phases(db.get_ref(), role.acting(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(phases))
}

/// PUT /api/phases/{id}/move: drag a phase to another position.
pub async fn move_phase(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    path: web::Path<Uuid>,
    body: web::Json<MovePhase>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let phases =
        phase_service::move_phase(&mut tx, role.acting(), path.into_inner(), body.move_to)
            .await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(phases))
}

/// PUT /api/phases/{id}/actual-cost
pub async fn update_actual_cost(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    path: web::Path<Uuid>,
    body: web::Json<PhaseCost>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let phase = phase_service::update_actual_cost(
        &mut tx,
        role.acting(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(phase))
}
