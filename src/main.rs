// src/main.rs
use actix_web::{App, HttpServer, middleware::Logger, web};
use moka::future::Cache;
use oil_insights::manager::ModelManager;
use oil_insights::store::ModelStore;
use oil_insights::{config, health, predictions, recommendations};
use sqlx::PgPool;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv::dotenv().ok();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");

    tracing::info!("Starting oil insights service");

    let config = config::Config::from_env().expect("Failed to load config from environment");

    let pool = PgPool::connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    let cache: Cache<String, serde_json::Value> = Cache::builder()
        .max_capacity(1000)
        .time_to_live(Duration::from_secs(config.popular_cache_ttl_secs))
        .build();

    let manager = web::Data::new(ModelManager::new(ModelStore::new(&config.model_path)));
    manager.load_models().await;
    tracing::info!(
        model_path = %config.model_path,
        trained = manager.is_trained(),
        "Models loaded"
    );

    let bind = (config.host.clone(), config.port);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(manager.clone())
            .app_data(web::Data::new(cache.clone()))
            .app_data(web::Data::new(config.clone()))
            .wrap(Logger::default())
            .configure(health::init_routes)
            .configure(predictions::init_routes)
            .configure(recommendations::init_routes)
    })
    .bind(bind)?
    .run()
    .await
}
