use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::middleware::CurrentRole;
use crate::errors::ApiError;
use crate::events::EventDispatcher;
use crate::handlers::finish;
use crate::models::files::{AttachFiles, ChangeFileAccess, FileFilter};
use crate::services::files as file_service;
use crate::tx::RequestTx;

/// GET /api/contracts/{id}/files?name=&mime=
pub async fn get_contract_files(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    query: web::Query<FileFilter>,
) -> Result<HttpResponse, ApiError> {
    let files = file_service::get_contract_files(
        db.get_ref(),
        role.acting(),
        path.into_inner(),
        query.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(files))
}

/// POST /api/contracts/{id}/files: attach already uploaded files.
pub async fn create_contract_files(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    path: web::Path<Uuid>,
    body: web::Json<AttachFiles>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let files = file_service::create_contract_files(
        &mut tx,
        role.acting(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Created().json(files))
}

/// PATCH /api/contracts/{id}/files/access
pub async fn change_file_access(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    path: web::Path<Uuid>,
    body: web::Json<ChangeFileAccess>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let files = file_service::change_file_access(
        &mut tx,
        role.acting(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(files))
}
