// src/recommendations.rs
use crate::config::Config;
use crate::db;
use crate::manager::ModelManager;
use crate::models::{
    DietaryHabit, PopularQuery, RecommendationRequest, RecommendationResponse, UserProfile,
};
use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;
use moka::future::Cache;
use serde_json::json;
use sqlx::PgPool;

pub const MAX_LIMIT: usize = 50;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(recommend_recipes);
    cfg.service(popular_recipes);
}

/// Vegetarian and vegan users only see recipes carrying their own diet tag.
pub fn diet_tag(profile: &UserProfile) -> Option<&'static str> {
    match profile.dietary_habit {
        DietaryHabit::Vegetarian | DietaryHabit::Vegan => Some(profile.dietary_habit.as_str()),
        _ => None,
    }
}

pub fn recommendation_reason(profile: &UserProfile) -> String {
    let mut reason = String::from(
        "Personalized recommendations based on your dietary preferences, health goals, and cooking habits.",
    );
    if !profile.health_conditions.is_empty() {
        let conditions: Vec<&str> = profile.health_conditions.iter().map(String::as_str).collect();
        reason.push_str(&format!(" Optimized for: {}.", conditions.join(", ")));
    }
    reason
}

#[post("/recommendations/recipes")]
pub async fn recommend_recipes(
    pool: web::Data<PgPool>,
    manager: web::Data<ModelManager>,
    config: web::Data<Config>,
    req: web::Json<RecommendationRequest>,
) -> Result<HttpResponse, actix_web::Error> {
    let req = req.into_inner();
    if req.user_id.is_empty() {
        return Ok(HttpResponse::BadRequest().json(json!({"error": "userId is required"})));
    }
    if !(1..=MAX_LIMIT).contains(&req.limit) {
        return Ok(HttpResponse::BadRequest()
            .json(json!({"error": format!("limit must be between 1 and {}", MAX_LIMIT)})));
    }

    let profile = match db::get_user_profile(&pool, &req.user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return Ok(HttpResponse::NotFound().json(json!({"error": "User not found"}))),
        Err(e) => {
            tracing::error!("Database error fetching user profile: {}", e);
            return Ok(HttpResponse::InternalServerError()
                .json(json!({"error": config.failure_detail("Recommendation failed", &e)})));
        }
    };

    let filters = req.filters.unwrap_or_default();
    let recipes = match db::find_recipes(
        &pool,
        &filters,
        diet_tag(&profile),
        db::RECIPE_CANDIDATE_LIMIT,
    )
    .await
    {
        Ok(recipes) => recipes,
        Err(e) => {
            tracing::error!("Database error fetching recipes: {}", e);
            return Ok(HttpResponse::InternalServerError()
                .json(json!({"error": config.failure_detail("Recommendation failed", &e)})));
        }
    };

    if recipes.is_empty() {
        return Ok(HttpResponse::NotFound()
            .json(json!({"error": "No recipes found matching criteria"})));
    }

    let ranked = manager.recommend_recipes(&req.user_id, &profile, recipes, req.limit);

    Ok(HttpResponse::Ok().json(RecommendationResponse {
        user_id: req.user_id,
        recipes: ranked,
        reason: recommendation_reason(&profile),
        generated_at: Utc::now(),
    }))
}

#[get("/recommendations/popular")]
pub async fn popular_recipes(
    pool: web::Data<PgPool>,
    cache: web::Data<Cache<String, serde_json::Value>>,
    config: web::Data<Config>,
    query: web::Query<PopularQuery>,
) -> Result<HttpResponse, actix_web::Error> {
    let limit = query.limit.clamp(1, MAX_LIMIT);

    let cache_key = format!("popular_{}", limit);
    if let Some(cached_response) = cache.get(&cache_key).await {
        tracing::info!("Cache hit for key: {}", cache_key);
        return Ok(HttpResponse::Ok().json(cached_response));
    }

    let recipes = match db::get_popular_recipes(&pool, limit as i64).await {
        Ok(recipes) => recipes,
        Err(e) => {
            tracing::error!("Database error fetching popular recipes: {}", e);
            return Ok(HttpResponse::InternalServerError().json(
                json!({"error": config.failure_detail("Failed to fetch popular recipes", &e)}),
            ));
        }
    };

    if recipes.is_empty() {
        return Ok(HttpResponse::NotFound().json(json!({"error": "No recipes found"})));
    }

    let response = json!({ "recipes": recipes });
    cache.insert(cache_key.clone(), response.clone()).await;
    tracing::info!("Cached response for key: {}", cache_key);

    Ok(HttpResponse::Ok().json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_plant_based_diets_filter_by_tag() {
        let mut profile = UserProfile::default();
        assert_eq!(diet_tag(&profile), Some("vegetarian"));
        profile.dietary_habit = DietaryHabit::Vegan;
        assert_eq!(diet_tag(&profile), Some("vegan"));
        profile.dietary_habit = DietaryHabit::Eggetarian;
        assert_eq!(diet_tag(&profile), None);
    }

    #[test]
    fn reason_lists_health_conditions() {
        let mut profile = UserProfile::default();
        assert!(!recommendation_reason(&profile).contains("Optimized for"));
        profile.health_conditions.insert("diabetes".into());
        assert!(recommendation_reason(&profile).ends_with("Optimized for: diabetes."));
    }
}
