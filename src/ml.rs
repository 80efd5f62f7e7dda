// src/ml.rs
use crate::error::{ModelError, ModelResult};
use crate::features::{self, DailyFeatures, FEATURE_COUNT, FeatureVector};
use crate::models::{
    DailyPrediction, Forecast, OilLogEntry, TrainingMetrics, UserProfile,
};
use chrono::{NaiveDate, Utc};
use linfa::prelude::*;
use linfa_elasticnet::ElasticNet;
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// L2 strength, in the `||y - Xw||² + alpha·||w||²` convention.
pub const RIDGE_ALPHA: f64 = 1.0;
/// Below this many logs the regressor is skipped.
pub const MIN_MODEL_HISTORY: usize = 7;
pub const SPARSE_CONFIDENCE: f64 = 0.3;
pub const DEFAULT_DAILY_AMOUNT: f64 = 50.0;
const MAX_CONFIDENCE: f64 = 0.9;
const BASE_CONFIDENCE: f64 = 0.5;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-feature standardization (zero mean, unit variance).
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FeatureScaler {
    pub mean: Array1<f64>,
    pub scale: Array1<f64>,
    pub fitted: bool,
}

impl Default for FeatureScaler {
    fn default() -> Self {
        Self {
            mean: Array1::zeros(FEATURE_COUNT),
            scale: Array1::ones(FEATURE_COUNT),
            fitted: false,
        }
    }
}

impl FeatureScaler {
    pub fn fit(records: &Array2<f64>) -> Self {
        let mean = records
            .mean_axis(Axis(0))
            .unwrap_or_else(|| Array1::zeros(records.ncols()));
        // constant columns keep unit scale
        let scale = records
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s > f64::EPSILON { s } else { 1.0 });
        Self {
            mean,
            scale,
            fitted: true,
        }
    }

    pub fn transform(&self, records: &Array2<f64>) -> Array2<f64> {
        (records - &self.mean) / &self.scale
    }

    /// One finite mean and one finite non-zero scale per feature.
    pub fn is_well_formed(&self) -> bool {
        self.mean.len() == FEATURE_COUNT
            && self.scale.len() == FEATURE_COUNT
            && self.mean.iter().all(|m| m.is_finite())
            && self.scale.iter().all(|s| s.is_finite() && *s != 0.0)
    }
}

/// Linear model over scaled features.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct RidgeRegressor {
    pub coefficients: Array1<f64>,
    pub intercept: f64,
    pub fitted: bool,
}

impl Default for RidgeRegressor {
    fn default() -> Self {
        Self {
            coefficients: Array1::zeros(FEATURE_COUNT),
            intercept: 0.0,
            fitted: false,
        }
    }
}

impl RidgeRegressor {
    pub fn fit(records: Array2<f64>, targets: Array1<f64>) -> ModelResult<Self> {
        let n_samples = records.nrows() as f64;
        let dataset = Dataset::new(records, targets);

        // elastic net scales the squared loss by 1/(2n), so divide alpha by n
        let model = ElasticNet::<f64>::params()
            .l1_ratio(0.0)
            .penalty(RIDGE_ALPHA / n_samples)
            .with_intercept(true)
            .tolerance(1e-8)
            .max_iterations(5_000)
            .fit(&dataset)
            .map_err(|e| ModelError::Fit(e.to_string()))?;

        Ok(Self {
            coefficients: model.hyperplane().clone(),
            intercept: model.intercept(),
            fitted: true,
        })
    }

    pub fn predict(&self, scaled: &Array2<f64>) -> Array1<f64> {
        scaled.dot(&self.coefficients) + self.intercept
    }

    pub fn is_well_formed(&self) -> bool {
        self.coefficients.len() == FEATURE_COUNT
            && self.coefficients.iter().all(|c| c.is_finite())
            && self.intercept.is_finite()
    }
}

/// Result of a successful fit, before the model is installed anywhere.
#[derive(Clone, Debug)]
pub struct FittedModel {
    pub state: ForecastModelState,
    pub metrics: TrainingMetrics,
    pub training_samples: usize,
    pub users_count: usize,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForecastModelState {
    pub regressor: RidgeRegressor,
    pub scaler: FeatureScaler,
    pub trained: bool,
}

impl ForecastModelState {
    /// Pairs a loaded regressor and scaler. Only two fitted halves count as trained.
    pub fn from_parts(regressor: RidgeRegressor, scaler: FeatureScaler) -> Self {
        let trained = regressor.fitted && scaler.fitted;
        Self {
            regressor,
            scaler,
            trained,
        }
    }

    /// Fits a fresh scaler and regressor on every user's history combined.
    ///
    /// Users are visited in id order so the same input always yields the same
    /// model. Users without a profile fall back to the default profile. The
    /// returned metrics are measured on the training set itself.
    pub fn fit(
        training_data: &HashMap<String, Vec<OilLogEntry>>,
        profiles: &HashMap<String, UserProfile>,
    ) -> ModelResult<FittedModel> {
        let mut user_ids: Vec<&String> = training_data.keys().collect();
        user_ids.sort();

        let default_profile = UserProfile::default();
        let mut rows: Vec<DailyFeatures> = Vec::new();
        let mut users_count = 0;
        for user_id in user_ids {
            let profile = profiles.get(user_id).unwrap_or(&default_profile);
            let user_rows = features::build_features(&training_data[user_id], profile);
            if !user_rows.is_empty() {
                users_count += 1;
                rows.extend(user_rows);
            }
        }

        if rows.is_empty() {
            return Err(ModelError::InsufficientData(
                "No training data available".to_string(),
            ));
        }

        let (records, targets) = features::to_dataset(&rows);
        let scaler = FeatureScaler::fit(&records);
        let scaled = scaler.transform(&records);
        let regressor = RidgeRegressor::fit(scaled.clone(), targets.clone())?;

        let fitted = regressor.predict(&scaled);
        let metrics = regression_metrics(&targets, &fitted);

        tracing::info!(
            samples = rows.len(),
            users = users_count,
            mae = metrics.mae,
            rmse = metrics.rmse,
            r2 = metrics.r2,
            "Consumption model fitted"
        );

        Ok(FittedModel {
            state: ForecastModelState {
                regressor,
                scaler,
                trained: true,
            },
            metrics,
            training_samples: rows.len(),
            users_count,
        })
    }

    pub fn predict_amount(&self, features: &FeatureVector) -> f64 {
        let row = features.to_array();
        let input = Array2::from_shape_fn((1, FEATURE_COUNT), |(_, j)| row[j]);
        let scaled = self.scaler.transform(&input);
        self.regressor.predict(&scaled)[0]
    }

    /// Forecasts `days_ahead` days after the latest log, with "today" as the
    /// anchor when there is no history at all.
    pub fn forecast(
        &self,
        user_id: &str,
        logs: &[OilLogEntry],
        profile: &UserProfile,
        days_ahead: usize,
    ) -> ModelResult<Forecast> {
        self.forecast_from(user_id, logs, profile, days_ahead, Utc::now().date_naive())
    }

    pub fn forecast_from(
        &self,
        user_id: &str,
        logs: &[OilLogEntry],
        profile: &UserProfile,
        days_ahead: usize,
        today: NaiveDate,
    ) -> ModelResult<Forecast> {
        if logs.len() < MIN_MODEL_HISTORY {
            tracing::debug!(
                user_id,
                logs = logs.len(),
                "Sparse history, using average-based forecast"
            );
            return Ok(sparse_forecast(logs, days_ahead, today));
        }

        let rows = features::build_features(logs, profile);
        let last = rows.last().ok_or_else(|| {
            ModelError::InsufficientData("Unable to prepare features".to_string())
        })?;

        if !self.trained {
            tracing::warn!(user_id, "Consumption model is untrained, forecasts will be zero");
        }

        let mut predictions: Vec<DailyPrediction> = Vec::with_capacity(days_ahead);
        for date in last.date.iter_days().skip(1).take(days_ahead) {
            let prev = predictions
                .last()
                .map(|p| p.predicted_amount)
                .unwrap_or(last.amount);
            // rolling means stay at their last observed values
            let step = FeatureVector::for_date(
                date,
                profile,
                prev,
                last.features.avg_7_day,
                last.features.avg_30_day,
            );
            let amount = self.predict_amount(&step);
            predictions.push(DailyPrediction {
                date,
                predicted_amount: round2(amount.max(0.0)),
            });
        }

        let confidence = MAX_CONFIDENCE.min(BASE_CONFIDENCE + logs.len() as f64 / 100.0);
        tracing::info!(user_id, days = predictions.len(), confidence, "Consumption forecast");

        Ok(Forecast {
            predictions,
            confidence,
        })
    }
}

fn sparse_forecast(logs: &[OilLogEntry], days_ahead: usize, today: NaiveDate) -> Forecast {
    let average = if logs.is_empty() {
        DEFAULT_DAILY_AMOUNT
    } else {
        logs.iter().map(|log| log.amount).sum::<f64>() / logs.len() as f64
    };
    let anchor = logs.iter().map(|log| log.date).max().unwrap_or(today);

    let predictions = anchor
        .iter_days()
        .skip(1)
        .take(days_ahead)
        .map(|date| DailyPrediction {
            date,
            predicted_amount: round2(average),
        })
        .collect();

    Forecast {
        predictions,
        confidence: SPARSE_CONFIDENCE,
    }
}

pub fn regression_metrics(targets: &Array1<f64>, predicted: &Array1<f64>) -> TrainingMetrics {
    let n = targets.len() as f64;
    let residuals = targets - predicted;
    let mae = residuals.mapv(f64::abs).sum() / n;
    let ss_res = residuals.mapv(|r| r * r).sum();
    let rmse = (ss_res / n).sqrt();

    let mean = targets.sum() / n;
    let ss_tot = targets.mapv(|t| (t - mean) * (t - mean)).sum();
    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    TrainingMetrics { mae, rmse, r2 }
}
