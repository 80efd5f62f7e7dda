use oil_insights::models::{DietaryHabit, Difficulty, Recipe, UserProfile};
use oil_insights::scoring::{rank, score};

fn recipe(id: &str, oil_amount: f64, tags: &[&str], cuisine: &str, difficulty: Difficulty) -> Recipe {
    Recipe {
        id: id.to_string(),
        name: id.to_string(),
        oil_amount,
        cuisine: cuisine.to_string(),
        difficulty,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        ..Recipe::default()
    }
}

#[test]
fn worked_example_scores_seventy() {
    let profile = UserProfile {
        dietary_habit: DietaryHabit::Vegetarian,
        ..UserProfile::default()
    };
    let a = recipe("a", 15.0, &["vegetarian", "low-calorie"], "gujarati", Difficulty::Easy);
    assert_eq!(score(&profile, &a), 70.0);
    assert_eq!(score(&profile, &a), score(&profile, &a));
}

#[test]
fn ranking_is_descending_and_truncated() {
    let profile = UserProfile {
        cuisine_preference: vec!["bengali".into()],
        ..UserProfile::default()
    };
    let recipes = vec![
        recipe("fried", 90.0, &[], "punjabi", Difficulty::Hard),
        recipe("steamed", 5.0, &["vegetarian"], "bengali", Difficulty::Easy),
        recipe("grilled", 30.0, &[], "punjabi", Difficulty::Medium),
    ];

    let ranked = rank(&profile, recipes, 2);
    let ids: Vec<&str> = ranked.iter().map(|r| r.recipe.id.as_str()).collect();
    assert_eq!(ids, vec!["steamed", "grilled"]);
    assert_eq!(ranked[0].score, 30.0 + 25.0 + 20.0 + 5.0);
    assert_eq!(ranked[1].score, 20.0);
}

#[test]
fn ties_keep_input_order() {
    let profile = UserProfile::default();
    let recipes: Vec<Recipe> = ["first", "second", "third", "fourth"]
        .iter()
        .map(|id| recipe(id, 25.0, &[], "any", Difficulty::Medium))
        .collect();

    let ranked = rank(&profile, recipes, 10);
    let ids: Vec<&str> = ranked.iter().map(|r| r.recipe.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second", "third", "fourth"]);
}

#[test]
fn ties_below_a_higher_score_keep_order() {
    let profile = UserProfile::default();
    let recipes = vec![
        recipe("x", 50.0, &[], "any", Difficulty::Hard),
        recipe("y", 50.0, &[], "any", Difficulty::Hard),
        recipe("best", 1.0, &["low-calorie"], "any", Difficulty::Easy),
        recipe("z", 50.0, &[], "any", Difficulty::Hard),
    ];
    let ranked = rank(&profile, recipes, 4);
    let ids: Vec<&str> = ranked.iter().map(|r| r.recipe.id.as_str()).collect();
    assert_eq!(ids, vec!["best", "x", "y", "z"]);
}

#[test]
fn ranking_does_not_touch_recipe_fields() {
    let profile = UserProfile::default();
    let original = recipe("keep", 12.0, &["vegetarian"], "kerala", Difficulty::Easy);
    let ranked = rank(&profile, vec![original.clone()], 1);
    assert_eq!(ranked[0].recipe, original);
}
