//! SQLite adapter: Implementation of Storage.
//!
//! Provides local, append-only persistence for diagnosis records. Triggers
//! reject every UPDATE and DELETE on the records table, so history cannot
//! be rewritten even through a raw connection.
//!
//! # Mutex Behavior
//!
//! The connection is protected by a `Mutex`. A poisoned mutex (from a panic
//! in another thread) surfaces as `StorageError::LockPoisoned` instead of
//! propagating the panic.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;

use crate::domain::{
    BmiCategory, DiagnosisLabel, DiagnosisRecord, DiagnosisResult, Gender, RiskTier,
};
use crate::ports::{RecordPage, Storage};

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned")]
    LockPoisoned,
}

const RECORD_COLUMNS: &str = r"
    id, patient_name, age, gender, weight_kg, height_cm, bmi, bmi_category,
    active_symptoms, score, diagnosis, risk_tier, advice, risk_factors,
    recommendations, created_at
";

/// SQLite storage adapter.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open (or create) the database at `path`.
    ///
    /// # Errors
    /// Returns error if database cannot be opened or initialized.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    /// Create an in-memory SQLite database (for testing).
    ///
    /// # Errors
    /// Returns error if database cannot be created.
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };
        storage.init_schema()?;
        Ok(storage)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::LockPoisoned)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<(), StorageError> {
        let conn = self.conn()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS diagnosis_records (
                id TEXT PRIMARY KEY,
                patient_name TEXT NOT NULL,
                age INTEGER NOT NULL,
                gender TEXT NOT NULL,
                weight_kg REAL NOT NULL,
                height_cm REAL NOT NULL,
                bmi REAL NOT NULL,
                bmi_category TEXT NOT NULL,
                active_symptoms TEXT NOT NULL,
                score REAL NOT NULL,
                diagnosis TEXT NOT NULL,
                risk_tier TEXT NOT NULL,
                advice TEXT NOT NULL,
                risk_factors TEXT NOT NULL,
                recommendations TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_diagnosis_records_created
                ON diagnosis_records(created_at DESC);

            CREATE TRIGGER IF NOT EXISTS diagnosis_records_no_update
                BEFORE UPDATE ON diagnosis_records
            BEGIN
                SELECT RAISE(ABORT, 'diagnosis records are append-only');
            END;

            CREATE TRIGGER IF NOT EXISTS diagnosis_records_no_delete
                BEFORE DELETE ON diagnosis_records
            BEGIN
                SELECT RAISE(ABORT, 'diagnosis records are append-only');
            END;
            ",
        )?;

        Ok(())
    }

    fn conversion_error(
        index: usize,
        err: impl std::error::Error + Send + Sync + 'static,
    ) -> rusqlite::Error {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
    }

    fn json_column<T: DeserializeOwned>(row: &Row<'_>, index: usize) -> rusqlite::Result<T> {
        let text: String = row.get(index)?;
        serde_json::from_str(&text).map_err(|e| Self::conversion_error(index, e))
    }

    fn row_to_record(row: &Row<'_>) -> rusqlite::Result<DiagnosisRecord> {
        let gender_str: String = row.get(3)?;
        let gender = Gender::from_token(&gender_str).ok_or_else(|| {
            rusqlite::Error::InvalidColumnType(3, format!("gender '{gender_str}'"), Type::Text)
        })?;
        let bmi_category: String = row.get(7)?;
        let diagnosis: String = row.get(10)?;
        let risk_tier: String = row.get(11)?;
        let created_at_str: String = row.get(15)?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| Self::conversion_error(15, e))?;

        Ok(DiagnosisRecord {
            id: row.get(0)?,
            patient_name: row.get(1)?,
            age: row.get(2)?,
            gender,
            weight_kg: row.get(4)?,
            height_cm: row.get(5)?,
            bmi: row.get(6)?,
            bmi_category: BmiCategory::from_str_lossy(&bmi_category),
            active_symptoms: Self::json_column(row, 8)?,
            result: DiagnosisResult {
                score: row.get(9)?,
                diagnosis: DiagnosisLabel::from_str_lossy(&diagnosis),
                risk_tier: RiskTier::from_str_lossy(&risk_tier),
                advice: row.get(12)?,
                risk_factors: Self::json_column(row, 13)?,
                recommendations: Self::json_column(row, 14)?,
            },
            created_at,
        })
    }

    fn timestamp(created_at: &DateTime<Utc>) -> String {
        // Fixed width so lexical order matches chronological order
        created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    }
}

impl Storage for SqliteStorage {
    type Error = StorageError;

    fn append_record(&self, record: &DiagnosisRecord) -> Result<(), Self::Error> {
        let active_symptoms = serde_json::to_string(&record.active_symptoms)?;
        let risk_factors = serde_json::to_string(&record.result.risk_factors)?;
        let recommendations = serde_json::to_string(&record.result.recommendations)?;

        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO diagnosis_records ({RECORD_COLUMNS}) VALUES \
                 (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)"
            ),
            params![
                record.id,
                record.patient_name,
                record.age,
                record.gender.as_str(),
                record.weight_kg,
                record.height_cm,
                record.bmi,
                record.bmi_category.as_str(),
                active_symptoms,
                record.result.score,
                record.result.diagnosis.as_str(),
                record.result.risk_tier.as_str(),
                record.result.advice,
                risk_factors,
                recommendations,
                Self::timestamp(&record.created_at),
            ],
        )?;

        tracing::debug!("Appended diagnosis record {}", record.id);
        Ok(())
    }

    fn load_record(&self, id: &str) -> Result<Option<DiagnosisRecord>, Self::Error> {
        let conn = self.conn()?;
        let record = conn
            .query_row(
                &format!("SELECT {RECORD_COLUMNS} FROM diagnosis_records WHERE id = ?1"),
                params![id],
                Self::row_to_record,
            )
            .optional()?;
        Ok(record)
    }

    fn load_recent_records(&self, limit: usize) -> Result<Vec<DiagnosisRecord>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM diagnosis_records \
             ORDER BY created_at DESC, rowid DESC LIMIT ?1"
        ))?;

        let records = stmt
            .query_map(params![limit as i64], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn load_records_paginated(&self, offset: usize, limit: usize) -> Result<RecordPage, Self::Error> {
        let conn = self.conn()?;

        let total_count: i64 =
            conn.query_row("SELECT COUNT(*) FROM diagnosis_records", [], |row| row.get(0))?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM diagnosis_records \
             ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        ))?;

        let records = stmt
            .query_map(params![limit as i64, offset as i64], Self::row_to_record)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RecordPage::new(records, total_count as usize, offset, limit))
    }

    fn count_records(&self) -> Result<usize, Self::Error> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM diagnosis_records", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    fn count_records_by_day(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<(NaiveDate, usize)>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            r"
            SELECT substr(created_at, 1, 10) AS day, COUNT(*)
            FROM diagnosis_records
            WHERE substr(created_at, 1, 10) BETWEEN ?1 AND ?2
            GROUP BY day
            ORDER BY day
            ",
        )?;

        let counts = stmt
            .query_map(
                params![from.format("%Y-%m-%d").to_string(), to.format("%Y-%m-%d").to_string()],
                |row| {
                    let day: String = row.get(0)?;
                    let count: i64 = row.get(1)?;
                    let day = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                        .map_err(|e| Self::conversion_error(0, e))?;
                    Ok((day, count as usize))
                },
            )?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(counts)
    }

    fn count_records_by_tier(&self) -> Result<Vec<(RiskTier, usize)>, Self::Error> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT risk_tier, COUNT(*) FROM diagnosis_records GROUP BY risk_tier",
        )?;

        let mut counts = stmt
            .query_map([], |row| {
                let tier: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((RiskTier::from_str_lossy(&tier), count as usize))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        counts.sort_by_key(|(tier, _)| RiskTier::ALL.iter().position(|t| t == tier));
        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::domain::{PatientInput, Symptom};

    fn record(name: &str, tier: RiskTier, created_at: DateTime<Utc>) -> DiagnosisRecord {
        let patient = PatientInput::new(45, Gender::Female, 62.0, 1.58)
            .with_symptom(Symptom::Palpitations)
            .with_symptom(Symptom::Fatigue);
        let result = DiagnosisResult {
            score: 42.21,
            diagnosis: DiagnosisLabel::for_tier(tier),
            risk_tier: tier,
            advice: "See a cardiologist".to_string(),
            risk_factors: vec!["Psychological distress".to_string()],
            recommendations: vec!["See a cardiologist within 1-2 weeks".to_string()],
        };
        let mut record = DiagnosisRecord::new(name, &patient, result);
        record.created_at = created_at;
        record
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0)
            .single()
            .expect("Should be a valid timestamp")
    }

    #[test]
    fn test_append_and_load() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        assert_eq!(storage.count_records().expect("Should count"), 0);

        let original = record("Rina", RiskTier::Medium, at(10, 9));
        storage.append_record(&original).expect("Should append");

        let loaded = storage
            .load_record(&original.id)
            .expect("Should load")
            .expect("Should exist");
        assert_eq!(loaded, original);
        assert_eq!(loaded.active_symptoms, vec![Symptom::Palpitations, Symptom::Fatigue]);
        assert!(storage.load_record("missing").expect("Should load").is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let original = record("Rina", RiskTier::Low, at(10, 9));
        storage.append_record(&original).expect("Should append");
        assert!(storage.append_record(&original).is_err());
        assert_eq!(storage.count_records().expect("Should count"), 1);
    }

    #[test]
    fn test_records_are_append_only() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let original = record("Rina", RiskTier::Low, at(10, 9));
        storage.append_record(&original).expect("Should append");

        let conn = storage.conn().expect("Should lock");
        let update = conn.execute(
            "UPDATE diagnosis_records SET score = 0 WHERE id = ?1",
            params![original.id],
        );
        assert!(update.is_err());
        let delete = conn.execute("DELETE FROM diagnosis_records", []);
        assert!(delete.is_err());
        drop(conn);

        assert_eq!(storage.count_records().expect("Should count"), 1);
    }

    #[test]
    fn test_recent_and_paginated_are_newest_first() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        for (i, day) in [3, 1, 5, 2, 4].into_iter().enumerate() {
            let r = record(&format!("patient-{i}"), RiskTier::Low, at(day, 8));
            storage.append_record(&r).expect("Should append");
        }

        let recent = storage.load_recent_records(2).expect("Should load");
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].created_at, at(5, 8));
        assert_eq!(recent[1].created_at, at(4, 8));

        let page = storage.load_records_paginated(2, 2).expect("Should load");
        assert_eq!(page.total_count, 5);
        assert_eq!(page.items[0].created_at, at(3, 8));
        assert!(page.has_more);
        assert_eq!(page.next_offset(), Some(4));
        assert_eq!(page.prev_offset(), Some(0));

        let last = storage.load_records_paginated(4, 2).expect("Should load");
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_more);
    }

    #[test]
    fn test_count_by_day_and_tier() {
        let storage = SqliteStorage::in_memory().expect("Should create db");
        let fixtures = [
            (1, RiskTier::High),
            (1, RiskTier::Low),
            (3, RiskTier::Low),
            (9, RiskTier::VeryLow),
        ];
        for (day, tier) in fixtures {
            storage
                .append_record(&record("x", tier, at(day, 23)))
                .expect("Should append");
        }

        let from = NaiveDate::from_ymd_opt(2026, 3, 1).expect("Should be a date");
        let to = NaiveDate::from_ymd_opt(2026, 3, 7).expect("Should be a date");
        let by_day = storage.count_records_by_day(from, to).expect("Should count");
        assert_eq!(
            by_day,
            vec![
                (from, 2),
                (NaiveDate::from_ymd_opt(2026, 3, 3).expect("Should be a date"), 1),
            ]
        );

        let by_tier = storage.count_records_by_tier().expect("Should count");
        assert_eq!(
            by_tier,
            vec![(RiskTier::VeryLow, 1), (RiskTier::Low, 2), (RiskTier::High, 1)]
        );
    }

    #[test]
    fn test_file_database_persists() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let path = dir.path().join("records.db");
        let original = record("Rina", RiskTier::High, at(12, 7));

        {
            let storage = SqliteStorage::new(&path).expect("Should create db");
            storage.append_record(&original).expect("Should append");
        }

        let reopened = SqliteStorage::new(&path).expect("Should reopen db");
        assert_eq!(reopened.count_records().expect("Should count"), 1);
        let loaded = reopened
            .load_record(&original.id)
            .expect("Should load")
            .expect("Should exist");
        assert_eq!(loaded.patient_name, "Rina");
    }
}
