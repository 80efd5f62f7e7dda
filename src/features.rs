// src/features.rs
use crate::models::{OilLogEntry, UserProfile};
use chrono::{Datelike, NaiveDate, Weekday};
use ndarray::prelude::*;
use serde::{Deserialize, Serialize};

pub const FEATURE_COUNT: usize = 9;

/// Column order shared by training and inference.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "day_of_week",
    "day_of_month",
    "month",
    "family_size",
    "age",
    "is_weekend",
    "prev_day_consumption",
    "7_day_avg",
    "30_day_avg",
];

const SHORT_WINDOW: usize = 7;
const LONG_WINDOW: usize = 30;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct FeatureVector {
    pub day_of_week: f64,
    pub day_of_month: f64,
    pub month: f64,
    pub family_size: f64,
    pub age: f64,
    pub is_weekend: f64,
    pub prev_day_consumption: f64,
    pub avg_7_day: f64,
    pub avg_30_day: f64,
}

impl FeatureVector {
    /// Calendar and profile columns for `date`; history columns are supplied by the caller.
    pub fn for_date(
        date: NaiveDate,
        profile: &UserProfile,
        prev_day_consumption: f64,
        avg_7_day: f64,
        avg_30_day: f64,
    ) -> Self {
        let weekday = date.weekday();
        Self {
            day_of_week: weekday.num_days_from_monday() as f64,
            day_of_month: date.day() as f64,
            month: date.month() as f64,
            family_size: profile.effective_family_size() as f64,
            age: profile.effective_age() as f64,
            is_weekend: if matches!(weekday, Weekday::Sat | Weekday::Sun) {
                1.0
            } else {
                0.0
            },
            prev_day_consumption,
            avg_7_day,
            avg_30_day,
        }
    }

    pub fn to_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.day_of_week,
            self.day_of_month,
            self.month,
            self.family_size,
            self.age,
            self.is_weekend,
            self.prev_day_consumption,
            self.avg_7_day,
            self.avg_30_day,
        ]
    }
}

/// One feature row together with its date and the observed amount (the training target).
#[derive(Clone, Debug, PartialEq)]
pub struct DailyFeatures {
    pub date: NaiveDate,
    pub features: FeatureVector,
    pub amount: f64,
}

fn trailing_mean(amounts: &[f64], end: usize, window: usize) -> f64 {
    let start = (end + 1).saturating_sub(window);
    let slice = &amounts[start..=end];
    slice.iter().sum::<f64>() / slice.len() as f64
}

/// Builds one feature row per log entry, oldest first.
///
/// Entries are re-sorted by date. The first row's `prev_day_consumption` is the
/// mean of the whole series and the rolling means use expanding windows, so no
/// column is ever undefined. An empty input yields an empty result.
pub fn build_features(logs: &[OilLogEntry], profile: &UserProfile) -> Vec<DailyFeatures> {
    if logs.is_empty() {
        return Vec::new();
    }

    let mut sorted: Vec<&OilLogEntry> = logs.iter().collect();
    sorted.sort_by_key(|entry| entry.date);

    let amounts: Vec<f64> = sorted.iter().map(|entry| entry.amount).collect();
    let series_mean = amounts.iter().sum::<f64>() / amounts.len() as f64;

    sorted
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let prev = if i == 0 { series_mean } else { amounts[i - 1] };
            DailyFeatures {
                date: entry.date,
                features: FeatureVector::for_date(
                    entry.date,
                    profile,
                    prev,
                    trailing_mean(&amounts, i, SHORT_WINDOW),
                    trailing_mean(&amounts, i, LONG_WINDOW),
                ),
                amount: entry.amount,
            }
        })
        .collect()
}

/// Stacks feature rows into a design matrix and target vector.
pub fn to_dataset(rows: &[DailyFeatures]) -> (Array2<f64>, Array1<f64>) {
    let mut records = Array2::<f64>::zeros((rows.len(), FEATURE_COUNT));
    for (mut record, row) in records.outer_iter_mut().zip(rows) {
        record.assign(&aview1(&row.features.to_array()));
    }
    let targets = rows.iter().map(|row| row.amount).collect::<Array1<f64>>();
    (records, targets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OilType;

    fn entry(date: NaiveDate, amount: f64) -> OilLogEntry {
        OilLogEntry {
            user_id: "u1".into(),
            amount,
            date,
            oil_type: OilType::Mustard,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn empty_logs_produce_no_rows() {
        assert!(build_features(&[], &UserProfile::default()).is_empty());
    }

    #[test]
    fn single_entry_uses_its_own_amount_as_previous_day() {
        let rows = build_features(&[entry(day(4), 42.0)], &UserProfile::default());
        assert_eq!(rows.len(), 1);
        let f = rows[0].features;
        assert_eq!(f.prev_day_consumption, 42.0);
        assert_eq!(f.avg_7_day, 42.0);
        assert_eq!(f.avg_30_day, 42.0);
    }

    #[test]
    fn entries_are_sorted_before_lagging() {
        let logs = vec![entry(day(3), 30.0), entry(day(1), 10.0), entry(day(2), 20.0)];
        let rows = build_features(&logs, &UserProfile::default());

        let dates: Vec<_> = rows.iter().map(|r| r.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
        assert_eq!(rows[0].features.prev_day_consumption, 20.0);
        assert_eq!(rows[1].features.prev_day_consumption, 10.0);
        assert_eq!(rows[2].features.prev_day_consumption, 20.0);
        assert_eq!(rows[2].amount, 30.0);
    }

    #[test]
    fn rolling_windows_expand_then_slide() {
        let logs: Vec<_> = (1..=10).map(|d| entry(day(d), d as f64)).collect();
        let rows = build_features(&logs, &UserProfile::default());

        assert_eq!(rows[1].features.avg_7_day, 1.5);
        // days 4..=10
        assert_eq!(rows[9].features.avg_7_day, 7.0);
        assert_eq!(rows[9].features.avg_30_day, 5.5);
        assert!(rows
            .iter()
            .all(|r| r.features.avg_7_day.is_finite() && r.features.avg_30_day.is_finite()));
    }

    #[test]
    fn calendar_and_profile_columns() {
        let profile = UserProfile {
            family_size: 4,
            age: 52,
            ..UserProfile::default()
        };
        // 2024-03-02 is a Saturday
        let rows = build_features(&[entry(day(2), 12.0)], &profile);
        let f = rows[0].features;
        assert_eq!(f.day_of_week, 5.0);
        assert_eq!(f.day_of_month, 2.0);
        assert_eq!(f.month, 3.0);
        assert_eq!(f.is_weekend, 1.0);
        assert_eq!(f.family_size, 4.0);
        assert_eq!(f.age, 52.0);
    }

    #[test]
    fn dataset_keeps_feature_order() {
        let rows = build_features(&[entry(day(4), 8.0), entry(day(5), 9.0)], &UserProfile::default());
        let (records, targets) = to_dataset(&rows);
        assert_eq!(records.dim(), (2, FEATURE_COUNT));
        assert_eq!(records.row(1).to_vec(), rows[1].features.to_array().to_vec());
        assert_eq!(targets.to_vec(), vec![8.0, 9.0]);
    }
}
