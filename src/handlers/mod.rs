pub mod activity;
pub mod contracts;
pub mod files;
pub mod phases;

use actix_web::web;

use crate::errors::ApiError;
use crate::events::EventDispatcher;
use crate::pubsub::session;
use crate::tx::RequestTx;

/// Commit the request transaction, then run what it deferred.
pub(crate) async fn finish(tx: RequestTx, dispatcher: &EventDispatcher) -> Result<(), ApiError> {
    let events = tx.commit().await?;
    dispatcher.dispatch(events).await;
    Ok(())
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // ── Contract routes (all protected, the JWT selects the acting role) ──
    cfg.service(
        web::scope("/contracts")
            .route("", web::get().to(contracts::get_contracts))
            .route("/manage", web::get().to(contracts::get_manage_contracts))
            .route("/{id}", web::get().to(contracts::get_contract))
            .route("/{id}", web::patch().to(contracts::update_contract))
            .route("/{id}/invite", web::post().to(contracts::answer_invite))
            .route("/{id}/end", web::post().to(contracts::end_contract))
            .route("/{id}/reopen", web::post().to(contracts::reopen_contract))
            .route("/{id}/archive", web::post().to(contracts::archive_contract))
            .route("/{id}/archive", web::delete().to(contracts::unarchive_contract))
            .route("/{id}/payment-plan", web::put().to(contracts::select_payment_plan))
            .route(
                "/{id}/dismiss-review-dates",
                web::post().to(contracts::dismiss_review_dates),
            )
            .route("/{id}/members", web::get().to(contracts::get_members))
            .route("/{id}/activities", web::get().to(contracts::get_activities))
            .route("/{id}/summary", web::get().to(contracts::get_summary))
            .route("/{id}/phases", web::get().to(phases::get_phases))
            .route("/{id}/files", web::get().to(files::get_contract_files))
            .route("/{id}/files", web::post().to(files::create_contract_files))
            .route("/{id}/files/access", web::patch().to(files::change_file_access))
            // WebSocket upgrade; authenticates through the `token` query param.
            .route("/{id}/subscribe", web::get().to(session::ws_connect)),
    );

    // ── Phase routes ──
    cfg.service(
        web::scope("/phases")
            .route("/{id}/move", web::put().to(phases::move_phase))
            .route("/{id}/actual-cost", web::put().to(phases::update_actual_cost)),
    );

    cfg.service(
        web::resource("/activity/seen").route(web::post().to(activity::seen_activity)),
    );
}
