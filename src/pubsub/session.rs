use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use futures_util::StreamExt;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::access::{self, AccessOptions, ActingRole};
use crate::auth::jwt;
use crate::auth::middleware::JwtSecret;
use crate::cache::RedisCache;
use crate::db::contracts as contract_db;
use crate::errors::ApiError;
use crate::pubsub::hub::Hub;
use crate::pubsub::protocol::{ClientMessage, ContractEvent, ServerMessage};
use crate::services::summary;

/// Query params for the WebSocket handshake endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct WsQuery {
    pub token: String,
}

/// GET /api/contracts/{id}/subscribe?token=<jwt>
///
/// Upgrades to a WebSocket that streams the contract's events. Browsers cannot
/// set headers on the handshake, so the session token comes as a query param.
/// Any role with read access may subscribe.
pub async fn ws_connect(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<Uuid>,
    query: web::Query<WsQuery>,
    db: web::Data<DatabaseConnection>,
    secret: web::Data<JwtSecret>,
    cache: web::Data<Arc<RedisCache>>,
    hub: web::Data<Arc<Hub>>,
) -> Result<HttpResponse, actix_web::Error> {
    let contract_id = path.into_inner();

    let claims = jwt::validate_token(&query.token, &secret.0)
        .map_err(|e| actix_web::error::ErrorUnauthorized(format!("Invalid token: {e}")))?;
    let role_id = claims
        .role_id()
        .map_err(actix_web::error::ErrorUnauthorized)?;

    let role = contract_db::get_role_by_id(db.get_ref(), role_id)
        .await
        .map_err(ApiError::from)?
        .ok_or_else(|| actix_web::error::ErrorUnauthorized("Unknown role"))?;
    let actor = ActingRole::from(&role);

    access::authorize(db.get_ref(), contract_id, actor, AccessOptions::read()).await?;

    let (response, session, msg_stream) = actix_ws::handle(&req, stream)?;
    let rx = hub.join(contract_id, role_id).await;

    actix_web::rt::spawn(run_session(
        session,
        msg_stream,
        rx,
        contract_id,
        role_id,
        db.get_ref().clone(),
        cache.get_ref().clone(),
        hub.get_ref().clone(),
    ));

    Ok(response)
}

#[allow(clippy::too_many_arguments)]
async fn run_session(
    mut session: actix_ws::Session,
    mut msg_stream: actix_ws::MessageStream,
    mut rx: mpsc::UnboundedReceiver<ContractEvent>,
    contract_id: Uuid,
    role_id: Uuid,
    db: DatabaseConnection,
    cache: Arc<RedisCache>,
    hub: Arc<Hub>,
) {
    debug!(%contract_id, %role_id, "subscription opened");

    if send_summary(&mut session, &db, &cache, contract_id).await.is_ok() {
        loop {
            tokio::select! {
                Some(msg) = msg_stream.next() => {
                    match msg {
                        Ok(Message::Text(text)) => {
                            let reply = match serde_json::from_str::<ClientMessage>(&text) {
                                Ok(ClientMessage::GetSummary) => {
                                    send_summary(&mut session, &db, &cache, contract_id).await
                                }
                                Err(e) => {
                                    send(&mut session, &ServerMessage::Error {
                                        message: format!("Invalid message format: {e}"),
                                    })
                                    .await
                                }
                            };
                            if reply.is_err() {
                                break;
                            }
                        }
                        Ok(Message::Ping(bytes)) => {
                            if session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        Ok(Message::Close(_)) | Err(_) => break,
                        _ => {}
                    }
                }
                Some(event) = rx.recv() => {
                    let Ok(json) = serde_json::to_string(&event) else {
                        continue;
                    };
                    if session.text(json).await.is_err() {
                        break;
                    }
                }
                else => break,
            }
        }
    }

    let remaining = hub.leave(contract_id, role_id).await;
    let _ = session.close(None).await;
    debug!(%contract_id, %role_id, remaining, "subscription closed");
}

/// Serve the summary from cache, computing it on a miss.
async fn send_summary(
    session: &mut actix_ws::Session,
    db: &DatabaseConnection,
    cache: &RedisCache,
    contract_id: Uuid,
) -> Result<(), actix_ws::Closed> {
    let message = match summary::cached_summary(db, cache, contract_id).await {
        Ok(summary) => ServerMessage::Summary { summary },
        Err(e) => {
            warn!(%contract_id, "Failed to load contract summary: {}", e);
            ServerMessage::Error {
                message: "Failed to load contract summary".to_string(),
            }
        }
    };
    send(session, &message).await
}

async fn send(
    session: &mut actix_ws::Session,
    message: &ServerMessage,
) -> Result<(), actix_ws::Closed> {
    match serde_json::to_string(message) {
        Ok(json) => session.text(json).await,
        Err(_) => Ok(()),
    }
}
