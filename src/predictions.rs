// src/predictions.rs
use crate::config::Config;
use crate::db;
use crate::error::ModelError;
use crate::manager::ModelManager;
use crate::ml::MIN_MODEL_HISTORY;
use crate::models::{DailyPrediction, PredictionRequest, PredictionResponse};
use actix_web::{HttpResponse, post, web};
use chrono::Utc;
use serde_json::json;
use sqlx::PgPool;
use std::collections::HashMap;

pub const MAX_DAYS_AHEAD: u32 = 90;
/// Fewer logs than this are rejected before forecasting.
pub const MIN_PREDICTION_LOGS: usize = 3;
pub const MIN_TRAINING_USERS: usize = 10;
/// ICMR guideline: one litre per person per month.
const ICMR_MONTHLY_ML_PER_PERSON: f64 = 1000.0;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(predict_consumption);
    cfg.service(train_model);
}

/// Advice strings comparing the forecast daily average with the ICMR guideline.
pub fn consumption_advice(predictions: &[DailyPrediction], family_size: u32) -> Vec<String> {
    if predictions.is_empty() {
        return Vec::new();
    }
    let avg_daily = predictions.iter().map(|p| p.predicted_amount).sum::<f64>()
        / predictions.len() as f64;
    let icmr_daily = ICMR_MONTHLY_ML_PER_PERSON / 30.0 / family_size.max(1) as f64;

    let advice: [&str; 2] = if avg_daily > icmr_daily * 1.5 {
        [
            "Your predicted consumption is 50% higher than recommended. Consider cooking methods that use less oil.",
            "Try air frying, steaming, or grilling instead of deep frying",
        ]
    } else if avg_daily > icmr_daily * 1.2 {
        [
            "Your consumption is slightly elevated. Small changes can make a big difference!",
            "Use spray bottles for oil distribution",
        ]
    } else {
        [
            "Great! Your predicted consumption is within healthy limits",
            "Keep up the good work!",
        ]
    };
    advice.iter().map(|s| s.to_string()).collect()
}

pub(crate) fn model_error_response(
    config: &Config,
    context: &str,
    error: &ModelError,
) -> HttpResponse {
    match error {
        ModelError::InsufficientData(message) => {
            HttpResponse::BadRequest().json(json!({"error": message}))
        }
        other => {
            tracing::error!("{}: {}", context, other);
            HttpResponse::InternalServerError()
                .json(json!({"error": config.failure_detail(context, other)}))
        }
    }
}

fn database_error_response(config: &Config, context: &str, error: &sqlx::Error) -> HttpResponse {
    tracing::error!("Database error during {}: {}", context, error);
    HttpResponse::InternalServerError().json(json!({"error": config.failure_detail(context, error)}))
}

#[post("/predictions/consumption")]
pub async fn predict_consumption(
    pool: web::Data<PgPool>,
    manager: web::Data<ModelManager>,
    config: web::Data<Config>,
    req: web::Json<PredictionRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    let req = req.into_inner();
    if req.user_id.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "userId is required"})));
    }
    if !(1..=MAX_DAYS_AHEAD).contains(&req.days_ahead) {
        return Ok(HttpResponse::BadRequest()
            .json(json!({"error": format!("days_ahead must be between 1 and {}", MAX_DAYS_AHEAD)})));
    }

    let profile = match db::get_user_profile(&pool, &req.user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return Ok(HttpResponse::NotFound().json(json!({"error": "User not found"}))),
        Err(e) => return Ok(database_error_response(&config, "Prediction failed", &e)),
    };

    let logs = match db::get_recent_oil_logs(&pool, &req.user_id, db::PREDICTION_LOG_WINDOW).await {
        Ok(logs) => logs,
        Err(e) => return Ok(database_error_response(&config, "Prediction failed", &e)),
    };

    if logs.len() < MIN_PREDICTION_LOGS {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": format!(
                "Insufficient data for prediction. Need at least {} days of oil logs.",
                MIN_PREDICTION_LOGS
            )
        })));
    }

    let forecast = match manager.predict_consumption(
        &req.user_id,
        &logs,
        &profile,
        req.days_ahead as usize,
    ) {
        Ok(forecast) => forecast,
        Err(e) => return Ok(model_error_response(&config, "Prediction failed", &e)),
    };

    let recommendations =
        consumption_advice(&forecast.predictions, profile.effective_family_size());

    Ok(HttpResponse::Ok().json(PredictionResponse {
        user_id: req.user_id,
        predictions: forecast.predictions,
        confidence: (forecast.confidence * 100.0).round() / 100.0,
        recommendations,
        generated_at: Utc::now(),
    }))
}

/// Retrains the shared model on every user with at least a week of logs.
#[post("/predictions/train")]
pub async fn train_model(
    pool: web::Data<PgPool>,
    manager: web::Data<ModelManager>,
    config: web::Data<Config>,
) -> Result<HttpResponse, actix_web::Error> {
    let profiles = match db::get_all_user_profiles(&pool).await {
        Ok(profiles) => profiles,
        Err(e) => return Ok(database_error_response(&config, "Training failed", &e)),
    };
    let logs_by_user = match db::get_oil_logs_by_user(&pool).await {
        Ok(logs) => logs,
        Err(e) => return Ok(database_error_response(&config, "Training failed", &e)),
    };

    let training_data: HashMap<_, _> = logs_by_user
        .into_iter()
        .filter(|(user_id, logs)| profiles.contains_key(user_id) && logs.len() >= MIN_MODEL_HISTORY)
        .collect();

    if training_data.len() < MIN_TRAINING_USERS {
        return Ok(HttpResponse::BadRequest().json(json!({
            "error": format!(
                "Insufficient training data. Need at least {} users with {}+ days of logs. Found: {}",
                MIN_TRAINING_USERS,
                MIN_MODEL_HISTORY,
                training_data.len()
            )
        })));
    }

    match manager.train_consumption_model(&training_data, &profiles).await {
        Ok(summary) => {
            tracing::info!(
                users = summary.users_count,
                samples = summary.training_samples,
                persisted = summary.persisted,
                "Consumption model trained"
            );
            Ok(HttpResponse::Ok().json(json!({
                "status": "success",
                "message": "Model trained successfully",
                "metrics": summary.metrics,
                "training_samples": summary.training_samples,
                "users_count": summary.users_count,
                "persisted": summary.persisted,
                "trained_at": Utc::now(),
            })))
        }
        Err(e) => Ok(model_error_response(&config, "Training failed", &e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn flat(amount: f64, days: u32) -> Vec<DailyPrediction> {
        (1..=days)
            .map(|d| DailyPrediction {
                date: NaiveDate::from_ymd_opt(2024, 5, d).unwrap(),
                predicted_amount: amount,
            })
            .collect()
    }

    #[test]
    fn advice_bands_follow_icmr_guideline() {
        // single person guideline is about 33.3 ml a day
        assert!(consumption_advice(&flat(60.0, 3), 1)[0].contains("50% higher"));
        assert!(consumption_advice(&flat(42.0, 3), 1)[0].contains("slightly elevated"));
        assert!(consumption_advice(&flat(30.0, 3), 1)[0].contains("within healthy limits"));
    }

    #[test]
    fn larger_families_lower_the_per_day_threshold() {
        assert!(consumption_advice(&flat(20.0, 3), 4)[0].contains("50% higher"));
    }

    #[test]
    fn no_predictions_no_advice() {
        assert!(consumption_advice(&[], 1).is_empty());
    }

    #[test]
    fn insufficient_data_maps_to_bad_request() {
        let config: Config = envy::from_iter(vec![(
            "DATABASE_URL".to_string(),
            "postgres://localhost/oil".to_string(),
        )])
        .unwrap();
        let response = model_error_response(
            &config,
            "Training failed",
            &ModelError::InsufficientData("No training data available".into()),
        );
        assert_eq!(response.status(), actix_web::http::StatusCode::BAD_REQUEST);

        let response = model_error_response(&config, "Training failed", &ModelError::Fit("x".into()));
        assert_eq!(
            response.status(),
            actix_web::http::StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
