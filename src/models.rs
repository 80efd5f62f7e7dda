// src/models.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Informational only; never used as a model feature.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(from = "String", into = "String")]
pub enum OilType {
    Sunflower,
    Coconut,
    Mustard,
    Olive,
    Groundnut,
    Sesame,
    RiceBran,
    Palm,
    #[default]
    Other,
}

impl OilType {
    pub fn parse(value: &str) -> Self {
        match value {
            "sunflower" => OilType::Sunflower,
            "coconut" => OilType::Coconut,
            "mustard" => OilType::Mustard,
            "olive" => OilType::Olive,
            "groundnut" => OilType::Groundnut,
            "sesame" => OilType::Sesame,
            "rice-bran" => OilType::RiceBran,
            "palm" => OilType::Palm,
            _ => OilType::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OilType::Sunflower => "sunflower",
            OilType::Coconut => "coconut",
            OilType::Mustard => "mustard",
            OilType::Olive => "olive",
            OilType::Groundnut => "groundnut",
            OilType::Sesame => "sesame",
            OilType::RiceBran => "rice-bran",
            OilType::Palm => "palm",
            OilType::Other => "other",
        }
    }
}

impl From<String> for OilType {
    fn from(value: String) -> Self {
        OilType::parse(&value)
    }
}

impl From<OilType> for String {
    fn from(value: OilType) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OilLogEntry {
    pub user_id: String,
    pub amount: f64, // ml
    pub date: NaiveDate,
    #[serde(default)]
    pub oil_type: OilType,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DietaryHabit {
    #[default]
    Vegetarian,
    NonVegetarian,
    Vegan,
    Eggetarian,
}

impl DietaryHabit {
    pub fn parse(value: &str) -> Self {
        match value {
            "non-vegetarian" => DietaryHabit::NonVegetarian,
            "vegan" => DietaryHabit::Vegan,
            "eggetarian" => DietaryHabit::Eggetarian,
            _ => DietaryHabit::Vegetarian,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DietaryHabit::Vegetarian => "vegetarian",
            DietaryHabit::NonVegetarian => "non-vegetarian",
            DietaryHabit::Vegan => "vegan",
            DietaryHabit::Eggetarian => "eggetarian",
        }
    }
}

fn default_family_size() -> u32 {
    1
}

fn default_age() -> u32 {
    30
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(default = "default_family_size")]
    pub family_size: u32,
    #[serde(default = "default_age")]
    pub age: u32,
    #[serde(default)]
    pub dietary_habit: DietaryHabit,
    #[serde(default)]
    pub health_conditions: BTreeSet<String>,
    #[serde(default)]
    pub cuisine_preference: Vec<String>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            family_size: default_family_size(),
            age: default_age(),
            dietary_habit: DietaryHabit::default(),
            health_conditions: BTreeSet::new(),
            cuisine_preference: Vec::new(),
        }
    }
}

impl UserProfile {
    /// Family size with zero mapped to the default of one person.
    pub fn effective_family_size(&self) -> u32 {
        if self.family_size == 0 {
            default_family_size()
        } else {
            self.family_size
        }
    }

    pub fn effective_age(&self) -> u32 {
        if self.age == 0 { default_age() } else { self.age }
    }

    pub fn has_condition(&self, condition: &str) -> bool {
        self.health_conditions.contains(condition)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn parse(value: &str) -> Self {
        match value {
            "medium" => Difficulty::Medium,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Easy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub name_hindi: Option<String>,
    #[serde(default)]
    pub name_tamil: Option<String>,
    #[serde(default)]
    pub description: String,
    pub oil_amount: f64, // ml
    #[serde(default)]
    pub cuisine: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub cooking_time: u32, // minutes
    #[serde(default)]
    pub servings: u32,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub nutrition_info: HashMap<String, f64>,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl Recipe {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// A recipe paired with the score it earned for one profile.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct ScoredRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub score: f64,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopularRecipe {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub view_count: i64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct DailyPrediction {
    pub date: NaiveDate,
    pub predicted_amount: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Forecast {
    pub predictions: Vec<DailyPrediction>,
    pub confidence: f64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct TrainingMetrics {
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrainingSummary {
    pub metrics: TrainingMetrics,
    pub training_samples: usize,
    pub users_count: usize,
    pub persisted: bool,
}

fn default_days_ahead() -> u32 {
    30
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub user_id: String,
    #[serde(default = "default_days_ahead", rename = "days_ahead")]
    pub days_ahead: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub user_id: String,
    pub predictions: Vec<DailyPrediction>,
    pub confidence: f64,
    pub recommendations: Vec<String>,
    #[serde(rename = "generated_at")]
    pub generated_at: DateTime<Utc>,
}

fn default_limit() -> usize {
    10
}

#[derive(Serialize, Deserialize, Clone, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct RecipeFilters {
    pub cuisine: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub max_oil_amount: Option<f64>,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub user_id: String,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub filters: Option<RecipeFilters>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationResponse {
    pub user_id: String,
    pub recipes: Vec<ScoredRecipe>,
    pub reason: String,
    #[serde(rename = "generated_at")]
    pub generated_at: DateTime<Utc>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PopularQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_defaults_fill_missing_fields() {
        let profile: UserProfile = serde_json::from_str("{}").unwrap();
        assert_eq!(profile.family_size, 1);
        assert_eq!(profile.age, 30);
        assert_eq!(profile.dietary_habit, DietaryHabit::Vegetarian);
        assert!(profile.health_conditions.is_empty());
    }

    #[test]
    fn zero_family_size_uses_default() {
        let profile = UserProfile {
            family_size: 0,
            age: 0,
            ..UserProfile::default()
        };
        assert_eq!(profile.effective_family_size(), 1);
        assert_eq!(profile.effective_age(), 30);
    }

    #[test]
    fn unknown_oil_type_maps_to_other() {
        assert_eq!(OilType::parse("rice-bran"), OilType::RiceBran);
        assert_eq!(OilType::parse("ghee"), OilType::Other);
    }

    #[test]
    fn dietary_habit_round_trips_through_wire_names() {
        let habit: DietaryHabit = serde_json::from_str("\"non-vegetarian\"").unwrap();
        assert_eq!(habit, DietaryHabit::NonVegetarian);
        assert_eq!(DietaryHabit::parse(habit.as_str()), habit);
    }
}
