//! Patient input types for cardiovascular risk screening.
//!
//! These are the crisp inputs handed to the fuzzy engine. Height is carried
//! in meters; callers holding centimeters convert before building a
//! [`PatientInput`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Systolic pressure assumed when no reading is supplied (mmHg).
pub const DEFAULT_SYSTOLIC: f64 = 120.0;

/// Diastolic pressure assumed when no reading is supplied (mmHg).
pub const DEFAULT_DIASTOLIC: f64 = 80.0;

/// Tokens accepted as "yes" for history, smoking and symptom answers.
const AFFIRMATIVE_TOKENS: [&str; 6] = ["ya", "yes", "y", "ada", "true", "1"];

/// Tokens accepted as an explicit "no".
const NEGATIVE_TOKENS: [&str; 7] = ["tidak", "tidak_ada", "no", "n", "none", "false", "0"];

/// Case-fold a wire token and collapse whitespace runs into underscores.
///
/// `"Nyeri  Dada "` becomes `"nyeri_dada"`.
#[must_use]
pub fn normalize_token(token: &str) -> String {
    token
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Whether a free-text answer is one of the affirmative synonyms.
#[must_use]
pub fn is_affirmative(token: &str) -> bool {
    let token = normalize_token(token);
    AFFIRMATIVE_TOKENS.contains(&token.as_str())
}

/// Biological sex used for the pressure baselines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Parse a gender token (English or Indonesian).
    #[must_use]
    pub fn from_token(token: &str) -> Option<Self> {
        match normalize_token(token).as_str() {
            "male" | "m" | "man" | "laki-laki" | "laki_laki" | "pria" | "l" => Some(Self::Male),
            "female" | "f" | "woman" | "perempuan" | "wanita" | "p" | "w" => Some(Self::Female),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Self-reported psychological state.
///
/// Unknown tokens map to [`PsychologicalState::Unrecognized`], which carries
/// zero stress membership instead of failing the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PsychologicalState {
    #[default]
    Calm,
    Fear,
    Anger,
    Depression,
    Anxiety,
    SuicidalTendency,
    Unrecognized,
}

impl PsychologicalState {
    /// Parse a state token. Never fails.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match normalize_token(token).as_str() {
            "calm" | "tenang" | "normal" | "stabil" => Self::Calm,
            "fear" | "afraid" | "takut" => Self::Fear,
            "anger" | "angry" | "marah" => Self::Anger,
            "depression" | "depressed" | "depresi" => Self::Depression,
            "anxiety" | "anxious" | "cemas" => Self::Anxiety,
            "suicidal_tendency" | "suicidal" | "kecenderungan_bunuh_diri" => {
                Self::SuicidalTendency
            }
            other => {
                tracing::debug!("Unrecognized psychological state token: {:?}", other);
                Self::Unrecognized
            }
        }
    }
}

/// The fixed symptom vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    ChestPain,
    ShortnessOfBreath,
    Palpitations,
    ColdSweat,
    LegSwelling,
    Fatigue,
    Weakness,
    Dizziness,
}

impl Symptom {
    pub const COUNT: usize = 8;

    pub const ALL: [Symptom; Self::COUNT] = [
        Self::ChestPain,
        Self::ShortnessOfBreath,
        Self::Palpitations,
        Self::ColdSweat,
        Self::LegSwelling,
        Self::Fatigue,
        Self::Weakness,
        Self::Dizziness,
    ];

    /// Position in [`Symptom::ALL`], used to index membership arrays.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Canonical wire key as sent by the screening form.
    #[must_use]
    pub fn form_key(self) -> &'static str {
        match self {
            Self::ChestPain => "nyeri_dada",
            Self::ShortnessOfBreath => "sesak_napas",
            Self::Palpitations => "jantung_berdebar",
            Self::ColdSweat => "keringat_dingin",
            Self::LegSwelling => "bengkak_kaki",
            Self::Fatigue => "mudah_lelah",
            Self::Weakness => "lemas",
            Self::Dizziness => "pusing",
        }
    }

    /// English snake-case name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::ChestPain => "chest_pain",
            Self::ShortnessOfBreath => "shortness_of_breath",
            Self::Palpitations => "palpitations",
            Self::ColdSweat => "cold_sweat",
            Self::LegSwelling => "leg_swelling",
            Self::Fatigue => "fatigue",
            Self::Weakness => "weakness",
            Self::Dizziness => "dizziness",
        }
    }

    /// Resolve a raw symptom key (form key or English name, any case/spacing).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let key = normalize_token(key);
        Self::ALL
            .into_iter()
            .find(|s| s.form_key() == key || s.name() == key)
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name().replace('_', " "))
    }
}

/// Answer to a single symptom question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymptomAnswer {
    Yes,
    #[default]
    No,
    /// Anything that is neither an affirmative nor a negative token.
    Unknown,
}

impl SymptomAnswer {
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        let token = normalize_token(token);
        if AFFIRMATIVE_TOKENS.contains(&token.as_str()) {
            Self::Yes
        } else if NEGATIVE_TOKENS.contains(&token.as_str()) {
            Self::No
        } else {
            Self::Unknown
        }
    }

    #[must_use]
    pub fn is_yes(self) -> bool {
        self == Self::Yes
    }
}

impl From<bool> for SymptomAnswer {
    fn from(value: bool) -> Self {
        if value {
            Self::Yes
        } else {
            Self::No
        }
    }
}

/// Answers keyed by symptom. Missing symptoms count as [`SymptomAnswer::No`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymptomSet {
    answers: BTreeMap<Symptom, SymptomAnswer>,
}

impl SymptomSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every symptom answered "yes".
    #[must_use]
    pub fn all_present() -> Self {
        Symptom::ALL
            .into_iter()
            .map(|s| (s, SymptomAnswer::Yes))
            .collect()
    }

    pub fn set(&mut self, symptom: Symptom, answer: SymptomAnswer) {
        self.answers.insert(symptom, answer);
    }

    #[must_use]
    pub fn with(mut self, symptom: Symptom, answer: SymptomAnswer) -> Self {
        self.set(symptom, answer);
        self
    }

    #[must_use]
    pub fn answer(&self, symptom: Symptom) -> SymptomAnswer {
        self.answers.get(&symptom).copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_present(&self, symptom: Symptom) -> bool {
        self.answer(symptom).is_yes()
    }

    /// Symptoms answered "yes", in vocabulary order.
    #[must_use]
    pub fn present(&self) -> Vec<Symptom> {
        Symptom::ALL
            .into_iter()
            .filter(|s| self.is_present(*s))
            .collect()
    }
}

impl FromIterator<(Symptom, SymptomAnswer)> for SymptomSet {
    fn from_iter<T: IntoIterator<Item = (Symptom, SymptomAnswer)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

/// WHO adult BMI category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    #[must_use]
    pub fn from_bmi(bmi: f64) -> Self {
        if bmi < 18.5 {
            Self::Underweight
        } else if bmi < 25.0 {
            Self::Normal
        } else if bmi < 30.0 {
            Self::Overweight
        } else {
            Self::Obese
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Underweight => "underweight",
            Self::Normal => "normal",
            Self::Overweight => "overweight",
            Self::Obese => "obese",
        }
    }

    /// Lossy parse for stored values; unknown text reads as `Normal`.
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "underweight" => Self::Underweight,
            "overweight" => Self::Overweight,
            "obese" => Self::Obese,
            _ => Self::Normal,
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Underweight => write!(f, "Underweight"),
            Self::Normal => write!(f, "Normal"),
            Self::Overweight => write!(f, "Overweight"),
            Self::Obese => write!(f, "Obese"),
        }
    }
}

/// Body mass index from weight (kg) and height (m), rounded to 2 decimals.
#[must_use]
pub fn body_mass_index(weight_kg: f64, height_m: f64) -> f64 {
    let bmi = weight_kg / (height_m * height_m);
    (bmi * 100.0).round() / 100.0
}

/// Crisp patient attributes consumed by the fuzzy engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    /// Age in whole years
    pub age: u32,

    pub gender: Gender,

    /// Body weight in kilograms
    pub weight_kg: f64,

    /// Height in meters
    pub height_m: f64,

    /// Systolic pressure in mmHg
    pub systolic: f64,

    /// Diastolic pressure in mmHg
    pub diastolic: f64,

    /// Known cardiovascular disease history
    pub disease_history: bool,

    pub smoker: bool,

    pub psychological_state: PsychologicalState,

    pub symptoms: SymptomSet,
}

impl PatientInput {
    /// Create an input with clinically normal defaults: 120/80 mmHg, no
    /// history, non-smoker, calm, no symptoms.
    #[must_use]
    pub fn new(age: u32, gender: Gender, weight_kg: f64, height_m: f64) -> Self {
        Self {
            age,
            gender,
            weight_kg,
            height_m,
            systolic: DEFAULT_SYSTOLIC,
            diastolic: DEFAULT_DIASTOLIC,
            disease_history: false,
            smoker: false,
            psychological_state: PsychologicalState::Calm,
            symptoms: SymptomSet::new(),
        }
    }

    #[must_use]
    pub fn with_pressure(mut self, systolic: f64, diastolic: f64) -> Self {
        self.systolic = systolic;
        self.diastolic = diastolic;
        self
    }

    #[must_use]
    pub fn with_disease_history(mut self, present: bool) -> Self {
        self.disease_history = present;
        self
    }

    #[must_use]
    pub fn with_smoking(mut self, smoker: bool) -> Self {
        self.smoker = smoker;
        self
    }

    #[must_use]
    pub fn with_psychological_state(mut self, state: PsychologicalState) -> Self {
        self.psychological_state = state;
        self
    }

    #[must_use]
    pub fn with_symptom(mut self, symptom: Symptom) -> Self {
        self.symptoms.set(symptom, SymptomAnswer::Yes);
        self
    }

    #[must_use]
    pub fn with_symptoms(mut self, symptoms: SymptomSet) -> Self {
        self.symptoms = symptoms;
        self
    }

    #[must_use]
    pub fn bmi(&self) -> f64 {
        body_mass_index(self.weight_kg, self.height_m)
    }

    #[must_use]
    pub fn bmi_category(&self) -> BmiCategory {
        BmiCategory::from_bmi(self.bmi())
    }

    /// Validate that all attributes are within physiologic ranges.
    ///
    /// # Errors
    /// Returns validation errors as a vector of strings.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.age == 0 || self.age >= 120 {
            errors.push(format!("Age {} out of range (0, 120)", self.age));
        }
        if !self.weight_kg.is_finite() || self.weight_kg <= 0.0 {
            errors.push(format!("Weight {} kg must be positive", self.weight_kg));
        }
        if !self.height_m.is_finite() || self.height_m <= 0.0 {
            errors.push(format!("Height {} m must be positive", self.height_m));
        } else if self.height_m > 3.0 {
            errors.push(format!(
                "Height {} m is implausible; convert centimeters to meters",
                self.height_m
            ));
        }
        if errors.is_empty() {
            let bmi = self.bmi();
            if !(bmi > 0.0 && bmi < 60.0) {
                errors.push(format!("BMI {bmi} out of range (0, 60)"));
            }
        }
        if !(60.0..=260.0).contains(&self.systolic) {
            errors.push(format!(
                "Systolic pressure {} out of range [60, 260]",
                self.systolic
            ));
        }
        if !(30.0..=180.0).contains(&self.diastolic) {
            errors.push(format!(
                "Diastolic pressure {} out of range [30, 180]",
                self.diastolic
            ));
        }
        if self.systolic <= self.diastolic {
            errors.push(format!(
                "Systolic pressure {} must exceed diastolic pressure {}",
                self.systolic, self.diastolic
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
