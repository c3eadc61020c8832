use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::auth::middleware::CurrentRole;
use crate::errors::ApiError;
use crate::events::EventDispatcher;
use crate::handlers::finish;
use crate::models::activity_seen::SeenActivityInput;
use crate::services::activity as activity_service;
use crate::tx::RequestTx;

/// POST /api/activity/seen
///
/// Body carries exactly one of `change_orders`, `payments`, `decisions` or
/// `task_id`.
pub async fn seen_activity(
    role: CurrentRole,
    db: web::Data<DatabaseConnection>,
    dispatcher: web::Data<Arc<EventDispatcher>>,
    body: web::Json<SeenActivityInput>,
) -> Result<HttpResponse, ApiError> {
    let mut tx = RequestTx::begin(db.get_ref()).await?;
    let seen = activity_service::seen_activity(&mut tx, role.acting(), body.into_inner()).await?;
    finish(tx, &dispatcher).await?;

    Ok(HttpResponse::Ok().json(seen))
}
