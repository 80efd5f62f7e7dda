// src/store.rs
use crate::error::{ModelError, ModelResult};
use crate::ml::{FeatureScaler, ForecastModelState, RidgeRegressor};
use crate::scoring::RecipeFeatureCache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

pub const REGRESSOR_FILE: &str = "consumption_model.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const RECIPE_FEATURES_FILE: &str = "recipe_features.json";

/// Everything read back from the model directory.
#[derive(Clone, Debug, Default)]
pub struct LoadedArtifacts {
    pub state: ForecastModelState,
    pub recipe_features: Option<RecipeFeatureCache>,
}

/// Reads and writes model artifacts under one directory.
#[derive(Clone, Debug)]
pub struct ModelStore {
    dir: PathBuf,
}

impl ModelStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }

    /// Loads every artifact, substituting defaults for anything missing or unreadable.
    pub async fn load(&self) -> LoadedArtifacts {
        let regressor = match read_artifact::<RidgeRegressor>(&self.path(REGRESSOR_FILE))
            .await
            .filter(|regressor| well_formed(REGRESSOR_FILE, regressor.is_well_formed()))
        {
            Some(regressor) => {
                tracing::info!("Consumption prediction model loaded");
                regressor
            }
            None => {
                tracing::warn!("Consumption model unavailable, initializing new model");
                RidgeRegressor::default()
            }
        };

        let scaler = match read_artifact::<FeatureScaler>(&self.path(SCALER_FILE))
            .await
            .filter(|scaler| well_formed(SCALER_FILE, scaler.is_well_formed()))
        {
            Some(scaler) => {
                tracing::info!("Scaler loaded");
                scaler
            }
            None => {
                tracing::warn!("Scaler unavailable, initializing new scaler");
                FeatureScaler::default()
            }
        };

        let recipe_features =
            read_artifact::<RecipeFeatureCache>(&self.path(RECIPE_FEATURES_FILE)).await;
        match &recipe_features {
            Some(cache) => tracing::info!(recipes = cache.len(), "Recipe features loaded"),
            None => tracing::info!("Recipe features not found, will compute on demand"),
        }

        let state = if regressor.fitted != scaler.fitted {
            tracing::warn!(
                regressor_fitted = regressor.fitted,
                scaler_fitted = scaler.fitted,
                "Regressor and scaler artifacts do not match, starting untrained"
            );
            ForecastModelState::default()
        } else {
            ForecastModelState::from_parts(regressor, scaler)
        };

        LoadedArtifacts {
            state,
            recipe_features,
        }
    }

    /// Writes the regressor, the scaler and, when present, the recipe feature cache.
    pub async fn persist(
        &self,
        state: &ForecastModelState,
        recipe_features: Option<&RecipeFeatureCache>,
    ) -> ModelResult<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ModelError::Persistence {
                path: self.dir.clone(),
                source,
            })?;

        write_artifact(&self.path(REGRESSOR_FILE), &state.regressor).await?;
        write_artifact(&self.path(SCALER_FILE), &state.scaler).await?;
        if let Some(cache) = recipe_features {
            write_artifact(&self.path(RECIPE_FEATURES_FILE), cache).await?;
        }

        tracing::info!(dir = ?self.dir, "Models saved successfully");
        Ok(())
    }
}

async fn read_artifact<T: DeserializeOwned>(path: &Path) -> Option<T> {
    match tokio::fs::read_to_string(path).await {
        Ok(data) => match serde_json::from_str::<T>(&data) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Failed to parse model artifact, using defaults");
                None
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = ?path, "Model artifact not present");
            None
        }
        Err(e) => {
            tracing::warn!(path = ?path, error = %e, "Failed to read model artifact, using defaults");
            None
        }
    }
}

/// Parsed artifacts with the wrong dimensions or non-finite values count as corrupt.
fn well_formed(file: &str, ok: bool) -> bool {
    if !ok {
        tracing::warn!(file, "Model artifact has unexpected shape or values, using defaults");
    }
    ok
}

/// Writes through a temporary sibling and renames it into place.
async fn write_artifact<T: Serialize + ?Sized>(path: &Path, value: &T) -> ModelResult<()> {
    let data = serde_json::to_vec_pretty(value).map_err(|source| ModelError::Serialization {
        path: path.to_path_buf(),
        source,
    })?;

    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, data)
        .await
        .map_err(|source| ModelError::Persistence {
            path: tmp.clone(),
            source,
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|source| ModelError::Persistence {
            path: path.to_path_buf(),
            source,
        })
}
