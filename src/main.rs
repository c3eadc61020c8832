use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use dotenv::dotenv;
use migration::{Migrator, MigratorTrait};
use sitework_backend::auth::middleware::JwtSecret;
use sitework_backend::billing::BillingClient;
use sitework_backend::cache::RedisCache;
use sitework_backend::config::AppConfig;
use sitework_backend::create_pool;
use sitework_backend::events::EventDispatcher;
use sitework_backend::handlers;
use sitework_backend::jobs::JobQueue;
use sitework_backend::pubsub::hub::Hub;
use std::io;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    let db = create_pool(&config.database_url)
        .await
        .map_err(io::Error::other)?;
    Migrator::up(&db, None).await.map_err(io::Error::other)?;
    tracing::info!("Database migrated");

    // Redis backs both the summary cache and the job queue.
    let redis_cache = Arc::new(
        RedisCache::new(&config.redis_url)
            .await
            .map_err(io::Error::other)?,
    );
    let jobs = Arc::new(JobQueue::new(redis_cache.connection()));
    tracing::info!("Connected to Redis");

    let billing = Arc::new(BillingClient::new(&config.billing));

    // Live contract rooms for WebSocket subscribers.
    let hub = Arc::new(Hub::new());

    let dispatcher = Arc::new(EventDispatcher::new(
        db.clone(),
        redis_cache.clone(),
        jobs.clone(),
        hub.clone(),
    ));

    let db_data = web::Data::new(db);
    let redis_data = web::Data::new(redis_cache);
    let jobs_data = web::Data::new(jobs);
    let billing_data = web::Data::new(billing);
    let hub_data = web::Data::new(hub);
    let dispatcher_data = web::Data::new(dispatcher);
    let secret_data = web::Data::new(JwtSecret(config.jwt_secret.clone()));

    let bind_addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("Server running at http://{bind_addr}");

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                actix_web::http::header::AUTHORIZATION,
                actix_web::http::header::CONTENT_TYPE,
                actix_web::http::header::ACCEPT,
            ])
            .max_age(3600);

        App::new()
            .wrap(cors)
            .app_data(db_data.clone())
            .app_data(redis_data.clone())
            .app_data(jobs_data.clone())
            .app_data(billing_data.clone())
            .app_data(hub_data.clone())
            .app_data(dispatcher_data.clone())
            .app_data(secret_data.clone())
            .service(web::scope("/api").configure(handlers::init_routes))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
