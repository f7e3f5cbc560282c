//! Statistics service: daily diagnosis counts and the tier distribution.

use std::sync::Arc;

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::domain::RiskTier;
use crate::ports::Storage;
use crate::{CardioError, Result};

/// Days covered by [`StatisticsService::last_week`].
pub const WEEK_DAYS: u32 = 7;

/// Diagnoses recorded on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyCount {
    /// `dd-mm` label
    pub day: String,
    pub date: NaiveDate,
    #[serde(rename = "diagnosis")]
    pub count: usize,
}

/// Records per risk tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierCount {
    pub tier: RiskTier,
    pub label: String,
    pub count: usize,
}

pub struct StatisticsService<S>
where
    S: Storage,
{
    storage: Arc<S>,
}

impl<S> StatisticsService<S>
where
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Counts for the `days` days ending at `today`, oldest first.
    /// Days without diagnoses are reported as zero.
    ///
    /// # Errors
    /// Returns `CardioError::Validation` if the window starts before the
    /// earliest representable date, or an error if storage fails.
    pub fn daily_counts(&self, today: NaiveDate, days: u32) -> Result<Vec<DailyCount>> {
        if days == 0 {
            return Ok(Vec::new());
        }
        let start = today
            .checked_sub_days(Days::new(u64::from(days) - 1))
            .ok_or_else(|| {
                CardioError::Validation(vec![format!(
                    "A {days}-day window ending {today} is out of the supported date range"
                )])
            })?;

        let stored = self
            .storage
            .count_records_by_day(start, today)
            .map_err(|e| CardioError::Storage(e.into()))?;

        let counts: Vec<DailyCount> = start
            .iter_days()
            .take(days as usize)
            .map(|date| DailyCount {
                day: date.format("%d-%m").to_string(),
                date,
                count: stored
                    .iter()
                    .find(|(d, _)| *d == date)
                    .map_or(0, |(_, count)| *count),
            })
            .collect();

        tracing::debug!(
            "Daily counts from {} to {}: {} diagnoses",
            start,
            today,
            counts.iter().map(|c| c.count).sum::<usize>()
        );
        Ok(counts)
    }

    /// Seven-day window ending at `today`.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn last_week(&self, today: NaiveDate) -> Result<Vec<DailyCount>> {
        self.daily_counts(today, WEEK_DAYS)
    }

    /// Record count for every tier, zero-filled, lowest tier first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn tier_distribution(&self) -> Result<Vec<TierCount>> {
        let stored = self
            .storage
            .count_records_by_tier()
            .map_err(|e| CardioError::Storage(e.into()))?;

        Ok(RiskTier::ALL
            .into_iter()
            .map(|tier| TierCount {
                tier,
                label: tier.to_string(),
                count: stored
                    .iter()
                    .filter(|(t, _)| *t == tier)
                    .map(|(_, count)| *count)
                    .sum(),
            })
            .collect())
    }
}
