// src/health.rs
use crate::manager::ModelManager;
use actix_web::{HttpResponse, get, web};
use serde_json::json;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check);
}

#[get("/health")]
pub async fn health_check(manager: web::Data<ModelManager>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "oil-insights",
        "version": env!("CARGO_PKG_VERSION"),
        "models_loaded": manager.is_loaded(),
        "model_trained": manager.is_trained(),
    }))
}
