//! Raw diagnosis requests and their conversion into engine input.
//!
//! Field names follow the screening form; the Indonesian names it was
//! first built with are accepted as aliases.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{
    is_affirmative, Gender, PatientInput, PsychologicalState, Symptom, SymptomAnswer, SymptomSet,
    DEFAULT_DIASTOLIC, DEFAULT_SYSTOLIC,
};

/// A diagnosis request as submitted by the form or the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosisRequest {
    #[serde(alias = "nama")]
    pub name: String,

    #[serde(alias = "usia")]
    pub age: i64,

    pub gender: String,

    /// Kilograms
    pub weight: f64,

    /// Centimeters
    pub height: f64,

    /// Object of symptom key to answer
    #[serde(alias = "gejala")]
    pub symptoms: Value,

    #[serde(default, alias = "sistolik")]
    pub systolic: Option<f64>,

    #[serde(default, alias = "diastolik")]
    pub diastolic: Option<f64>,

    #[serde(default, alias = "riwayat_penyakit")]
    pub disease_history: Option<Value>,

    #[serde(default, alias = "riwayat_merokok")]
    pub smoking_history: Option<Value>,

    #[serde(default, alias = "aspek_psikologis")]
    pub psychological_state: Option<String>,
}

/// Interpret a yes/no field that may arrive as a boolean, number or token.
fn flag(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64() == Some(1.0),
        Some(Value::String(s)) => is_affirmative(s),
        _ => false,
    }
}

fn symptom_answer(value: &Value) -> SymptomAnswer {
    match value {
        Value::Bool(b) => SymptomAnswer::from(*b),
        Value::Number(n) => match n.as_f64() {
            Some(v) if v == 1.0 => SymptomAnswer::Yes,
            Some(v) if v == 0.0 => SymptomAnswer::No,
            _ => SymptomAnswer::Unknown,
        },
        Value::String(s) => SymptomAnswer::from_token(s),
        _ => SymptomAnswer::Unknown,
    }
}

/// Parse the symptom object. Keys are case-folded and whitespace-normalized.
///
/// # Errors
/// Returns one message per unknown key, or a single message when the
/// value is not an object.
pub fn parse_symptoms(value: &Value) -> Result<SymptomSet, Vec<String>> {
    let Value::Object(map) = value else {
        return Err(vec!["Symptoms must be a JSON object".to_string()]);
    };

    let mut set = SymptomSet::new();
    let mut seen = [false; Symptom::COUNT];
    let mut errors = Vec::new();
    for (key, answer) in map {
        match Symptom::from_key(key) {
            Some(symptom) if seen[symptom.index()] => {
                errors.push(format!("Symptom '{}' given more than once", symptom.form_key()));
            }
            Some(symptom) => {
                seen[symptom.index()] = true;
                set.set(symptom, symptom_answer(answer));
            }
            None => errors.push(format!("Unknown symptom '{key}'")),
        }
    }

    if errors.is_empty() {
        Ok(set)
    } else {
        Err(errors)
    }
}

impl DiagnosisRequest {
    /// Validate the request and build the engine input.
    ///
    /// # Errors
    /// Returns every validation message found; no partial input is built.
    pub fn into_patient(&self) -> Result<PatientInput, Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        }

        let age = match u32::try_from(self.age) {
            Ok(age) => Some(age),
            Err(_) => {
                errors.push(format!("Age {} out of range (0, 120)", self.age));
                None
            }
        };

        let gender = Gender::from_token(&self.gender);
        if gender.is_none() {
            errors.push(format!("Unknown gender '{}'", self.gender));
        }

        let symptoms = match parse_symptoms(&self.symptoms) {
            Ok(symptoms) => Some(symptoms),
            Err(mut symptom_errors) => {
                errors.append(&mut symptom_errors);
                None
            }
        };

        let (Some(age), Some(gender), Some(symptoms)) = (age, gender, symptoms) else {
            return Err(errors);
        };

        let psychological_state = self
            .psychological_state
            .as_deref()
            .map(PsychologicalState::from_token)
            .unwrap_or_default();

        let patient = PatientInput::new(age, gender, self.weight, self.height / 100.0)
            .with_pressure(
                self.systolic.unwrap_or(DEFAULT_SYSTOLIC),
                self.diastolic.unwrap_or(DEFAULT_DIASTOLIC),
            )
            .with_disease_history(flag(self.disease_history.as_ref()))
            .with_smoking(flag(self.smoking_history.as_ref()))
            .with_psychological_state(psychological_state)
            .with_symptoms(symptoms);

        if let Err(mut range_errors) = patient.validate() {
            errors.append(&mut range_errors);
        }

        if errors.is_empty() {
            Ok(patient)
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> DiagnosisRequest {
        serde_json::from_value(value).expect("Should deserialize")
    }

    #[test]
    fn test_indonesian_aliases() {
        let req = request(json!({
            "nama": "Budi",
            "usia": 52,
            "gender": "Laki-laki",
            "weight": 80,
            "height": 170,
            "gejala": {"Nyeri Dada": "Ya", "pusing": "tidak"},
            "sistolik": 150,
            "diastolik": 95,
            "riwayat_penyakit": "ada",
            "riwayat_merokok": "tidak",
            "aspek_psikologis": "Cemas"
        }));

        let patient = req.into_patient().expect("Should convert");
        assert_eq!(patient.age, 52);
        assert_eq!(patient.gender, Gender::Male);
        assert!((patient.height_m - 1.7).abs() < 1e-12);
        assert_eq!(patient.systolic, 150.0);
        assert!(patient.disease_history);
        assert!(!patient.smoker);
        assert_eq!(patient.psychological_state, PsychologicalState::Anxiety);
        assert_eq!(patient.symptoms.present(), vec![Symptom::ChestPain]);
    }

    #[test]
    fn test_defaults_for_optional_fields() {
        let req = request(json!({
            "name": "Ani",
            "age": 30,
            "gender": "female",
            "weight": 55.5,
            "height": 160,
            "symptoms": {}
        }));

        let patient = req.into_patient().expect("Should convert");
        assert_eq!(patient.systolic, DEFAULT_SYSTOLIC);
        assert_eq!(patient.diastolic, DEFAULT_DIASTOLIC);
        assert!(!patient.disease_history);
        assert_eq!(patient.psychological_state, PsychologicalState::Calm);
        assert!(patient.symptoms.present().is_empty());
    }

    #[test]
    fn test_key_normalization_is_equivalent() {
        let spaced = parse_symptoms(&json!({"Nyeri Dada": "Ya"})).expect("Should parse");
        let snake = parse_symptoms(&json!({"nyeri_dada": "ya"})).expect("Should parse");
        assert_eq!(spaced, snake);
    }

    #[test]
    fn test_duplicate_symptom_keys_are_rejected() {
        let errors = parse_symptoms(&json!({
            "Nyeri Dada": "ya",
            "nyeri_dada": "tidak",
            "chest_pain": "ya"
        }))
        .expect_err("Should reject duplicates");
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.contains("'nyeri_dada' given more than once")));
    }

    #[test]
    fn test_symptom_answer_shapes() {
        let set = parse_symptoms(&json!({
            "chest_pain": true,
            "fatigue": 1,
            "dizziness": "maybe",
            "weakness": null
        }))
        .expect("Should parse");
        assert_eq!(set.answer(Symptom::ChestPain), SymptomAnswer::Yes);
        assert_eq!(set.answer(Symptom::Fatigue), SymptomAnswer::Yes);
        assert_eq!(set.answer(Symptom::Dizziness), SymptomAnswer::Unknown);
        assert_eq!(set.answer(Symptom::Weakness), SymptomAnswer::Unknown);
    }

    #[test]
    fn test_symptoms_must_be_object() {
        let errors = parse_symptoms(&json!(["nyeri_dada"])).expect_err("Should reject");
        assert_eq!(errors, vec!["Symptoms must be a JSON object".to_string()]);
    }

    #[test]
    fn test_all_errors_are_reported() {
        let req = request(json!({
            "name": " ",
            "age": -4,
            "gender": "x",
            "weight": 70,
            "height": 170,
            "symptoms": {"headache": "ya"}
        }));

        let errors = req.into_patient().expect_err("Should reject");
        assert_eq!(errors.len(), 4);
        assert!(errors.iter().any(|e| e.contains("Name")));
        assert!(errors.iter().any(|e| e.contains("Age")));
        assert!(errors.iter().any(|e| e.contains("gender")));
        assert!(errors.iter().any(|e| e.contains("headache")));
    }

    #[test]
    fn test_range_errors_from_patient_validation() {
        let req = request(json!({
            "name": "Dewi",
            "age": 40,
            "gender": "p",
            "weight": 60,
            "height": 158,
            "symptoms": {},
            "sistolik": 80,
            "diastolik": 90
        }));

        let errors = req.into_patient().expect_err("Should reject");
        assert!(errors.iter().any(|e| e.contains("must exceed")));
    }
}
