//! Diagnosis service: validates requests, runs the engine and records results.

use std::sync::Arc;

use serde::Serialize;

use super::request::DiagnosisRequest;
use crate::domain::{DiagnosisRecord, PatientInput};
use crate::engine::{AggregatedOutput, Assessment, RuleFiring};
use crate::ports::{RecordPage, RiskEngine, Storage};
use crate::{CardioError, Result};

/// Outcome of one diagnosis request.
#[derive(Debug, Clone, Serialize)]
pub struct DiagnosisOutcome {
    pub record: DiagnosisRecord,
    /// Rules that fired, for inspection
    pub firings: Vec<RuleFiring>,
    pub aggregated: AggregatedOutput,
    /// Whether the record reached storage
    pub persisted: bool,
}

/// Service for running risk assessments.
pub struct DiagnosisService<E, S>
where
    E: RiskEngine,
    S: Storage,
{
    engine: Arc<E>,
    storage: Arc<S>,
}

impl<E, S> DiagnosisService<E, S>
where
    E: RiskEngine,
    S: Storage,
    S::Error: Into<crate::adapters::StorageError>,
{
    /// Create a new diagnosis service.
    pub fn new(engine: Arc<E>, storage: Arc<S>) -> Self {
        Self { engine, storage }
    }

    /// Assess a patient without recording anything.
    ///
    /// # Errors
    /// Returns `CardioError::Validation` if the patient is out of range.
    pub fn assess(&self, patient: &PatientInput) -> Result<Assessment> {
        patient.validate().map_err(CardioError::Validation)?;
        Ok(self.engine.assess(patient))
    }

    /// Validate, assess and record a request.
    ///
    /// A storage failure is logged and reported through
    /// [`DiagnosisOutcome::persisted`]; the caller still gets the result.
    ///
    /// # Errors
    /// Returns `CardioError::Validation` with every problem in the request.
    pub fn diagnose(&self, request: &DiagnosisRequest) -> Result<DiagnosisOutcome> {
        tracing::info!("Starting diagnosis with engine {}", self.engine.name());

        let patient = request.into_patient().map_err(|errors| {
            tracing::debug!("Rejected request with {} validation errors", errors.len());
            CardioError::Validation(errors)
        })?;

        let assessment = self.assess(&patient)?;
        let record = DiagnosisRecord::new(request.name.trim(), &patient, assessment.result);

        let persisted = match self.storage.append_record(&record) {
            Ok(()) => true,
            Err(e) => {
                let e: crate::adapters::StorageError = e.into();
                tracing::warn!("Failed to save diagnosis record: {}", e);
                false
            }
        };

        tracing::info!(
            "Diagnosis complete: score={:.2}, tier={}, rules={}",
            record.result.score,
            record.result.risk_tier,
            assessment.firings.len()
        );

        Ok(DiagnosisOutcome {
            record,
            firings: assessment.firings,
            aggregated: assessment.aggregated,
            persisted,
        })
    }

    /// Get recent records, newest first.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn recent_records(&self, limit: usize) -> Result<Vec<DiagnosisRecord>> {
        self.storage
            .load_recent_records(limit)
            .map_err(|e| CardioError::Storage(e.into()))
    }

    /// Get one page of records.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn records_page(&self, offset: usize, limit: usize) -> Result<RecordPage> {
        self.storage
            .load_records_paginated(offset, limit)
            .map_err(|e| CardioError::Storage(e.into()))
    }

    /// Get one record by id.
    ///
    /// # Errors
    /// Returns `CardioError::NotFound` if no record has this id.
    pub fn record(&self, id: &str) -> Result<DiagnosisRecord> {
        self.storage
            .load_record(id)
            .map_err(|e| CardioError::Storage(e.into()))?
            .ok_or_else(|| CardioError::NotFound(id.to_string()))
    }

    /// Get total record count.
    ///
    /// # Errors
    /// Returns error if storage operation fails.
    pub fn record_count(&self) -> Result<usize> {
        self.storage
            .count_records()
            .map_err(|e| CardioError::Storage(e.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::SqliteStorage;
    use crate::adapters::StorageError;
    use crate::domain::{DiagnosisLabel, Gender, RiskTier, Symptom};
    use crate::engine::FuzzyEngine;
    use chrono::NaiveDate;
    use serde_json::json;

    fn create_test_service() -> DiagnosisService<FuzzyEngine, SqliteStorage> {
        let engine = Arc::new(FuzzyEngine::default());
        let storage = Arc::new(SqliteStorage::in_memory().expect("Should create db"));
        DiagnosisService::new(engine, storage)
    }

    fn chest_pain_request() -> DiagnosisRequest {
        serde_json::from_value(json!({
            "nama": "Budi",
            "usia": 50,
            "gender": "male",
            "weight": 79.625,
            "height": 175,
            "gejala": {"nyeri_dada": "ya", "sesak_napas": "ya"},
            "sistolik": 135,
            "diastolik": 85
        }))
        .expect("Should deserialize")
    }

    #[test]
    fn test_diagnose_records_result() {
        let service = create_test_service();
        let outcome = service.diagnose(&chest_pain_request()).expect("Should diagnose");

        assert!(outcome.persisted);
        assert_eq!(outcome.record.result.risk_tier, RiskTier::High);
        assert_eq!(outcome.aggregated.high, 0.85);
        assert_eq!(
            outcome.record.active_symptoms,
            vec![Symptom::ChestPain, Symptom::ShortnessOfBreath]
        );
        assert!((outcome.record.height_cm - 175.0).abs() < 1e-9);

        assert_eq!(service.record_count().expect("Should count"), 1);
        let stored = service.record(&outcome.record.id).expect("Should load");
        assert_eq!(stored, outcome.record);
    }

    #[test]
    fn test_diagnose_rejects_invalid_request() {
        let service = create_test_service();
        let mut request = chest_pain_request();
        request.age = 130;

        let err = service.diagnose(&request).expect_err("Should reject");
        let messages = err.validation_messages().expect("Should be validation");
        assert!(messages.iter().any(|m| m.contains("Age")));
        assert_eq!(service.record_count().expect("Should count"), 0);
    }

    #[test]
    fn test_assess_is_idempotent() {
        let service = create_test_service();
        let patient = PatientInput::new(30, Gender::Male, 67.375, 1.75);
        let first = service.assess(&patient).expect("Should assess");
        let second = service.assess(&patient).expect("Should assess");
        assert_eq!(first.result, second.result);
        assert_eq!(first.result.diagnosis, DiagnosisLabel::NotDetected);
    }

    #[test]
    fn test_missing_record_is_not_found() {
        let service = create_test_service();
        assert!(matches!(service.record("nope"), Err(CardioError::NotFound(_))));
    }

    struct FailingStorage;

    impl Storage for FailingStorage {
        type Error = StorageError;

        fn append_record(&self, _record: &DiagnosisRecord) -> std::result::Result<(), StorageError> {
            Err(StorageError::LockPoisoned)
        }

        fn load_record(&self, _id: &str) -> std::result::Result<Option<DiagnosisRecord>, StorageError> {
            Ok(None)
        }

        fn load_recent_records(&self, _limit: usize) -> std::result::Result<Vec<DiagnosisRecord>, StorageError> {
            Ok(Vec::new())
        }

        fn load_records_paginated(
            &self,
            offset: usize,
            limit: usize,
        ) -> std::result::Result<RecordPage, StorageError> {
            Ok(RecordPage::new(Vec::new(), 0, offset, limit))
        }

        fn count_records(&self) -> std::result::Result<usize, StorageError> {
            Ok(0)
        }

        fn count_records_by_day(
            &self,
            _from: NaiveDate,
            _to: NaiveDate,
        ) -> std::result::Result<Vec<(NaiveDate, usize)>, StorageError> {
            Ok(Vec::new())
        }

        fn count_records_by_tier(&self) -> std::result::Result<Vec<(RiskTier, usize)>, StorageError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_storage_failure_is_not_fatal() {
        let service = DiagnosisService::new(Arc::new(FuzzyEngine::default()), Arc::new(FailingStorage));
        let outcome = service.diagnose(&chest_pain_request()).expect("Should still diagnose");
        assert!(!outcome.persisted);
        assert_eq!(outcome.record.result.risk_tier, RiskTier::High);
    }
}
