//! Storage port: Trait for persistent storage operations.
//!
//! This trait abstracts the storage backend (SQLite) from the application logic.
//! The store is append-only: records are never updated or deleted.

use chrono::NaiveDate;

use crate::domain::{DiagnosisRecord, RiskTier};

/// A page of records with pagination metadata.
#[derive(Debug, Clone)]
pub struct RecordPage {
    /// Records in this page, newest first
    pub items: Vec<DiagnosisRecord>,
    /// Total count of all records
    pub total_count: usize,
    pub offset: usize,
    pub limit: usize,
    /// Whether there are more pages
    pub has_more: bool,
}

impl RecordPage {
    /// Create a new record page.
    #[must_use]
    pub fn new(items: Vec<DiagnosisRecord>, total_count: usize, offset: usize, limit: usize) -> Self {
        let has_more = offset + items.len() < total_count;
        Self {
            items,
            total_count,
            offset,
            limit,
            has_more,
        }
    }

    /// Get the next page offset.
    #[must_use]
    pub fn next_offset(&self) -> Option<usize> {
        self.has_more.then_some(self.offset + self.limit)
    }

    /// Get the previous page offset.
    #[must_use]
    pub fn prev_offset(&self) -> Option<usize> {
        (self.offset > 0).then(|| self.offset.saturating_sub(self.limit))
    }
}

/// Trait for the append-only diagnosis record store.
pub trait Storage: Send + Sync {
    /// Error type for storage operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Append a record.
    ///
    /// # Errors
    /// Returns error if the id already exists or the write fails.
    fn append_record(&self, record: &DiagnosisRecord) -> Result<(), Self::Error>;

    /// Load one record by id.
    ///
    /// # Returns
    /// `None` if no record has this id.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_record(&self, id: &str) -> Result<Option<DiagnosisRecord>, Self::Error>;

    /// Load the newest records (up to `limit`).
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_recent_records(&self, limit: usize) -> Result<Vec<DiagnosisRecord>, Self::Error>;

    /// Load records with offset pagination, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn load_records_paginated(&self, offset: usize, limit: usize) -> Result<RecordPage, Self::Error>;

    /// Get the total count of records.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_records(&self) -> Result<usize, Self::Error>;

    /// Records per UTC calendar day within `[from, to]`, inclusive.
    /// Days without records are omitted.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_records_by_day(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, usize)>, Self::Error>;

    /// Records per risk tier. Tiers without records are omitted.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    fn count_records_by_tier(&self) -> Result<Vec<(RiskTier, usize)>, Self::Error>;
}
