// src/db.rs
use crate::models::{
    DietaryHabit, Difficulty, OilLogEntry, OilType, PopularRecipe, Recipe, RecipeFilters,
    UserProfile,
};
use chrono::NaiveDate;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;

/// Most recent logs considered for a single forecast.
pub const PREDICTION_LOG_WINDOW: i64 = 90;
/// Candidate pool size for one recommendation request.
pub const RECIPE_CANDIDATE_LIMIT: i64 = 100;

#[derive(FromRow)]
struct UserRow {
    user_id: String,
    family_size: Option<i32>,
    age: Option<i32>,
    dietary_habit: Option<String>,
    health_conditions: Option<Vec<String>>,
    cuisine_preference: Option<Vec<String>>,
}

impl From<UserRow> for UserProfile {
    fn from(row: UserRow) -> Self {
        let defaults = UserProfile::default();
        UserProfile {
            family_size: row
                .family_size
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.family_size),
            age: row
                .age
                .and_then(|v| u32::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(defaults.age),
            dietary_habit: row
                .dietary_habit
                .as_deref()
                .map(DietaryHabit::parse)
                .unwrap_or_default(),
            health_conditions: row.health_conditions.unwrap_or_default().into_iter().collect(),
            cuisine_preference: row.cuisine_preference.unwrap_or_default(),
        }
    }
}

#[derive(FromRow)]
struct OilLogRow {
    user_id: String,
    amount: f64,
    date: NaiveDate,
    oil_type: Option<String>,
}

impl From<OilLogRow> for OilLogEntry {
    fn from(row: OilLogRow) -> Self {
        OilLogEntry {
            user_id: row.user_id,
            amount: row.amount,
            date: row.date,
            oil_type: row
                .oil_type
                .as_deref()
                .map(OilType::parse)
                .unwrap_or_default(),
        }
    }
}

#[derive(FromRow)]
struct RecipeRow {
    id: String,
    name: String,
    name_hindi: Option<String>,
    name_tamil: Option<String>,
    description: Option<String>,
    oil_amount: f64,
    cuisine: Option<String>,
    difficulty: Option<String>,
    cooking_time: Option<i32>,
    servings: Option<i32>,
    tags: Option<Vec<String>>,
    ingredients: Option<Vec<String>>,
    instructions: Option<Vec<String>>,
    nutrition_info: Option<Json<HashMap<String, f64>>>,
    image_url: Option<String>,
    view_count: Option<i64>,
}

impl RecipeRow {
    fn into_recipe(self) -> (Recipe, i64) {
        let recipe = Recipe {
            id: self.id,
            name: self.name,
            name_hindi: self.name_hindi,
            name_tamil: self.name_tamil,
            description: self.description.unwrap_or_default(),
            oil_amount: self.oil_amount,
            cuisine: self.cuisine.unwrap_or_default(),
            difficulty: self
                .difficulty
                .as_deref()
                .map(Difficulty::parse)
                .unwrap_or_default(),
            cooking_time: self
                .cooking_time
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(0),
            servings: self.servings.and_then(|v| u32::try_from(v).ok()).unwrap_or(0),
            tags: self.tags.unwrap_or_default().into_iter().collect(),
            ingredients: self.ingredients.unwrap_or_default(),
            instructions: self.instructions.unwrap_or_default(),
            nutrition_info: self.nutrition_info.map(|json| json.0).unwrap_or_default(),
            image_url: self.image_url,
        };
        (recipe, self.view_count.unwrap_or(0))
    }
}

const USER_COLUMNS: &str =
    "user_id, family_size, age, dietary_habit, health_conditions, cuisine_preference";

const RECIPE_COLUMNS: &str = "id, name, name_hindi, name_tamil, description, oil_amount, cuisine, difficulty, cooking_time, servings, tags, ingredients, instructions, nutrition_info, image_url, view_count";

pub async fn get_user_profile(
    pool: &PgPool,
    user_id: &str,
) -> Result<Option<UserProfile>, sqlx::Error> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {} FROM users WHERE user_id = $1",
        USER_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(UserProfile::from))
}

pub async fn get_all_user_profiles(
    pool: &PgPool,
) -> Result<HashMap<String, UserProfile>, sqlx::Error> {
    let rows = sqlx::query_as::<_, UserRow>(&format!("SELECT {} FROM users", USER_COLUMNS))
        .fetch_all(pool)
        .await?;
    Ok(rows
        .into_iter()
        .map(|row| (row.user_id.clone(), UserProfile::from(row)))
        .collect())
}

/// Latest logs for one user, newest first.
pub async fn get_recent_oil_logs(
    pool: &PgPool,
    user_id: &str,
    limit: i64,
) -> Result<Vec<OilLogEntry>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OilLogRow>(
        "SELECT user_id, amount, date, oil_type FROM oil_logs WHERE user_id = $1 ORDER BY date DESC LIMIT $2",
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(OilLogEntry::from).collect())
}

/// Every log grouped by user, oldest first within each user.
pub async fn get_oil_logs_by_user(
    pool: &PgPool,
) -> Result<HashMap<String, Vec<OilLogEntry>>, sqlx::Error> {
    let rows = sqlx::query_as::<_, OilLogRow>(
        "SELECT user_id, amount, date, oil_type FROM oil_logs ORDER BY user_id, date ASC",
    )
    .fetch_all(pool)
    .await?;

    let mut by_user: HashMap<String, Vec<OilLogEntry>> = HashMap::new();
    for row in rows {
        by_user
            .entry(row.user_id.clone())
            .or_default()
            .push(OilLogEntry::from(row));
    }
    Ok(by_user)
}

/// Candidate recipes matching the optional filters and, when given, carrying `diet_tag`.
pub async fn find_recipes(
    pool: &PgPool,
    filters: &RecipeFilters,
    diet_tag: Option<&str>,
    limit: i64,
) -> Result<Vec<Recipe>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        "SELECT {} FROM recipes \
         WHERE ($1::text IS NULL OR cuisine = $1) \
         AND ($2::text IS NULL OR difficulty = $2) \
         AND ($3::float8 IS NULL OR oil_amount <= $3) \
         AND ($4::text IS NULL OR $4 = ANY(tags)) \
         ORDER BY id LIMIT $5",
        RECIPE_COLUMNS
    ))
    .bind(filters.cuisine.as_deref())
    .bind(filters.difficulty.map(|d| d.as_str()))
    .bind(filters.max_oil_amount)
    .bind(diet_tag)
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(|row| row.into_recipe().0).collect())
}

/// Low-oil recipes (at most 40 ml) ordered by view count.
pub async fn get_popular_recipes(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<PopularRecipe>, sqlx::Error> {
    let rows = sqlx::query_as::<_, RecipeRow>(&format!(
        "SELECT {} FROM recipes WHERE oil_amount <= 40 ORDER BY view_count DESC NULLS LAST LIMIT $1",
        RECIPE_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows
        .into_iter()
        .map(|row| {
            let (recipe, view_count) = row.into_recipe();
            PopularRecipe { recipe, view_count }
        })
        .collect())
}
