// src/scoring.rs
use crate::models::{DietaryHabit, Difficulty, Recipe, ScoredRecipe, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Profile-independent facts about a recipe, cached across ranking calls.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct RecipeFeatures {
    pub oil_amount: f64,
    pub base_score: f64,
}

pub type RecipeFeatureCache = HashMap<String, RecipeFeatures>;

fn oil_points(oil_amount: f64) -> f64 {
    if oil_amount < 20.0 {
        30.0
    } else if oil_amount < 40.0 {
        20.0
    } else if oil_amount < 60.0 {
        10.0
    } else {
        0.0
    }
}

/// Points a recipe earns regardless of who is asking: oil band, low-calorie tag, easy difficulty.
pub fn base_score(recipe: &Recipe) -> f64 {
    let mut score = oil_points(recipe.oil_amount);
    if recipe.has_tag("low-calorie") {
        score += 10.0;
    }
    if recipe.difficulty == Difficulty::Easy {
        score += 5.0;
    }
    score
}

/// Content-based fit of a recipe to a profile. Rules stack additively with no upper bound.
pub fn score(profile: &UserProfile, recipe: &Recipe) -> f64 {
    let mut score = base_score(recipe);

    let diet = profile.dietary_habit;
    // independent rules: a vegan recipe tagged vegetarian earns both
    if matches!(diet, DietaryHabit::Vegetarian | DietaryHabit::Vegan)
        && recipe.has_tag("vegetarian")
    {
        score += 25.0;
    }
    if diet == DietaryHabit::Vegan && recipe.has_tag("vegan") {
        score += 30.0;
    }

    if profile
        .cuisine_preference
        .iter()
        .any(|cuisine| *cuisine == recipe.cuisine)
    {
        score += 20.0;
    }

    if profile.has_condition("diabetes") && recipe.has_tag("low-sugar") {
        score += 15.0;
    }
    if profile.has_condition("heart-disease") && recipe.has_tag("heart-healthy") {
        score += 15.0;
    }

    score
}

/// Scores every candidate and returns the best `limit`, highest first.
/// Equal scores keep their input order.
pub fn rank(profile: &UserProfile, recipes: Vec<Recipe>, limit: usize) -> Vec<ScoredRecipe> {
    let mut scored: Vec<ScoredRecipe> = recipes
        .into_iter()
        .map(|recipe| ScoredRecipe {
            score: score(profile, &recipe),
            recipe,
        })
        .collect();
    // sort_by is stable
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}

pub fn extract_features(recipes: &[Recipe]) -> RecipeFeatureCache {
    recipes
        .iter()
        .map(|recipe| {
            (
                recipe.id.clone(),
                RecipeFeatures {
                    oil_amount: recipe.oil_amount,
                    base_score: base_score(recipe),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe(id: &str, oil_amount: f64, tags: &[&str], difficulty: Difficulty) -> Recipe {
        Recipe {
            id: id.to_string(),
            name: id.to_string(),
            oil_amount,
            cuisine: "south-indian".to_string(),
            difficulty,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Recipe::default()
        }
    }

    #[test]
    fn oil_bands() {
        assert_eq!(oil_points(0.0), 30.0);
        assert_eq!(oil_points(19.9), 30.0);
        assert_eq!(oil_points(20.0), 20.0);
        assert_eq!(oil_points(40.0), 10.0);
        assert_eq!(oil_points(59.9), 10.0);
        assert_eq!(oil_points(60.0), 0.0);
    }

    #[test]
    fn vegetarian_low_calorie_easy_recipe() {
        let profile = UserProfile {
            dietary_habit: DietaryHabit::Vegetarian,
            ..UserProfile::default()
        };
        let r = recipe("a", 15.0, &["vegetarian", "low-calorie"], Difficulty::Easy);
        assert_eq!(score(&profile, &r), 70.0);
    }

    #[test]
    fn vegan_rules_stack() {
        let profile = UserProfile {
            dietary_habit: DietaryHabit::Vegan,
            ..UserProfile::default()
        };
        let r = recipe("v", 70.0, &["vegetarian", "vegan"], Difficulty::Hard);
        assert_eq!(score(&profile, &r), 55.0);
    }

    #[test]
    fn non_vegetarian_gets_no_diet_points() {
        let profile = UserProfile {
            dietary_habit: DietaryHabit::NonVegetarian,
            ..UserProfile::default()
        };
        let r = recipe("n", 70.0, &["vegetarian", "vegan"], Difficulty::Medium);
        assert_eq!(score(&profile, &r), 0.0);
    }

    #[test]
    fn cuisine_and_health_matches() {
        let profile = UserProfile {
            dietary_habit: DietaryHabit::Eggetarian,
            cuisine_preference: vec!["punjabi".into(), "south-indian".into()],
            health_conditions: ["diabetes".to_string(), "heart-disease".to_string()]
                .into_iter()
                .collect(),
            ..UserProfile::default()
        };
        let r = recipe("h", 45.0, &["low-sugar", "heart-healthy"], Difficulty::Medium);
        assert_eq!(score(&profile, &r), 10.0 + 20.0 + 15.0 + 15.0);
    }

    #[test]
    fn base_score_ignores_profile_rules() {
        let r = recipe("b", 25.0, &["vegetarian", "low-calorie"], Difficulty::Easy);
        assert_eq!(base_score(&r), 35.0);
        let cache = extract_features(std::slice::from_ref(&r));
        assert_eq!(cache["b"].base_score, 35.0);
        assert_eq!(cache["b"].oil_amount, 25.0);
    }
}
