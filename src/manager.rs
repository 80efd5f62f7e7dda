// src/manager.rs
use crate::error::ModelResult;
use crate::ml::ForecastModelState;
use crate::models::{Forecast, OilLogEntry, Recipe, ScoredRecipe, TrainingSummary, UserProfile};
use crate::scoring::{self, RecipeFeatureCache};
use crate::store::ModelStore;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

/// Owns the shared forecast model and the recipe feature cache.
///
/// Predictions clone the model under a read lock, so they always see a
/// scaler and regressor that were fitted together. Training runs are
/// serialized by `training` and swap the whole state in one write.
pub struct ModelManager {
    state: RwLock<ForecastModelState>,
    recipe_features: RwLock<Option<RecipeFeatureCache>>,
    store: ModelStore,
    training: tokio::sync::Mutex<()>,
    loaded: AtomicBool,
}

impl ModelManager {
    pub fn new(store: ModelStore) -> Self {
        Self {
            state: RwLock::new(ForecastModelState::default()),
            recipe_features: RwLock::new(None),
            store,
            training: tokio::sync::Mutex::new(()),
            loaded: AtomicBool::new(false),
        }
    }

    /// Loads persisted artifacts. Never fails; missing pieces start from defaults.
    pub async fn load_models(&self) {
        let artifacts = self.store.load().await;
        *self.state.write() = artifacts.state;
        *self.recipe_features.write() = artifacts.recipe_features;
        self.loaded.store(true, Ordering::Release);
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Acquire)
    }

    pub fn is_trained(&self) -> bool {
        self.state.read().trained
    }

    pub fn snapshot(&self) -> ForecastModelState {
        self.state.read().clone()
    }

    pub fn recipe_features(&self) -> Option<RecipeFeatureCache> {
        self.recipe_features.read().clone()
    }

    pub fn predict_consumption(
        &self,
        user_id: &str,
        logs: &[OilLogEntry],
        profile: &UserProfile,
        days_ahead: usize,
    ) -> ModelResult<Forecast> {
        let model = self.snapshot();
        model.forecast(user_id, logs, profile, days_ahead)
    }

    /// Fits a new model, installs it, then persists it.
    ///
    /// A fitting failure leaves the current model untouched. A persistence
    /// failure is logged and reported through `persisted = false`; the new
    /// model is already live at that point.
    pub async fn train_consumption_model(
        &self,
        training_data: &HashMap<String, Vec<OilLogEntry>>,
        profiles: &HashMap<String, UserProfile>,
    ) -> ModelResult<TrainingSummary> {
        let _guard = self.training.lock().await;

        let fitted = ForecastModelState::fit(training_data, profiles)?;
        *self.state.write() = fitted.state.clone();

        let cache = self.recipe_features();
        let persisted = match self.store.persist(&fitted.state, cache.as_ref()).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Error saving models, keeping in-memory model");
                false
            }
        };

        Ok(TrainingSummary {
            metrics: fitted.metrics,
            training_samples: fitted.training_samples,
            users_count: fitted.users_count,
            persisted,
        })
    }

    /// Ranks candidates for a profile and refreshes the cached recipe features.
    pub fn recommend_recipes(
        &self,
        user_id: &str,
        profile: &UserProfile,
        recipes: Vec<Recipe>,
        limit: usize,
    ) -> Vec<ScoredRecipe> {
        let features = scoring::extract_features(&recipes);
        self.recipe_features
            .write()
            .get_or_insert_with(RecipeFeatureCache::new)
            .extend(features);

        let ranked = scoring::rank(profile, recipes, limit);
        tracing::debug!(user_id, returned = ranked.len(), "Recipes ranked");
        ranked
    }
}
