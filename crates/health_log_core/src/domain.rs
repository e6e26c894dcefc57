//! crates/health_log_core/src/domain.rs
//!
//! Defines the core data structures for the application: user profiles,
//! the per-user-per-day `DailyLog` aggregate and the partial updates that are
//! merged into it.
//!
//! The types serialize with camelCase keys because the web client and the
//! JSONB documents in the store share this shape.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

//=========================================================================================
// User Profile
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    Light,
    #[default]
    Moderate,
    Active,
    VeryActive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthGoal {
    WeightLoss,
    WeightGain,
    MuscleGain,
    MaintainWeight,
    ImproveFitness,
    BetterSleep,
}

/// The physiological profile of a user, used for derived metrics and prompts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub user_id: Uuid,
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    /// Height in centimetres.
    pub height: Option<f64>,
    /// Weight in kilograms.
    pub weight: Option<f64>,
    #[serde(default)]
    pub activity_level: ActivityLevel,
    #[serde(default)]
    pub health_goals: Vec<HealthGoal>,
}

impl UserProfile {
    /// An empty profile for a user that has not filled anything in yet.
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            age: None,
            gender: None,
            height: None,
            weight: None,
            activity_level: ActivityLevel::default(),
            health_goals: Vec::new(),
        }
    }
}

/// The editable part of a profile, as submitted by the client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub age: Option<u32>,
    pub gender: Option<Gender>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub activity_level: Option<ActivityLevel>,
    pub health_goals: Option<Vec<HealthGoal>>,
}

//=========================================================================================
// Enumerations used by the daily log
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    #[default]
    Snack,
}

/// The kinds of exercise with a calorie table entry. Unknown kinds deserialize as `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseType {
    Walking,
    Running,
    Cycling,
    Swimming,
    Weightlifting,
    Yoga,
    Pilates,
    Dancing,
    Hiking,
    Basketball,
    Soccer,
    Tennis,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    #[default]
    Moderate,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    VerySad,
    Sad,
    Neutral,
    Happy,
    VeryHappy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessLevel {
    Poor,
    Fair,
    Average,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BloodPressureCategory {
    Optimal,
    Normal,
    HighNormal,
    #[serde(rename = "grade1_hypertension")]
    Grade1Hypertension,
    #[serde(rename = "grade2_hypertension")]
    Grade2Hypertension,
    #[serde(rename = "grade3_hypertension")]
    Grade3Hypertension,
    IsolatedSystolic,
}

//=========================================================================================
// Daily Log sections
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    pub name: String,
    #[serde(rename = "type")]
    pub meal_type: MealType,
    pub calories: u32,
    #[serde(default)]
    pub protein: u32,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    pub name: String,
    /// Duration in minutes, at least 1.
    pub duration: u32,
    #[serde(default)]
    pub intensity: Intensity,
    #[serde(default)]
    pub calories_burned: u32,
    pub notes: Option<String>,
    pub time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Steps {
    pub count: u32,
    pub goal: u32,
    pub calories_burned: u32,
}

impl Default for Steps {
    fn default() -> Self {
        Self {
            count: 0,
            goal: DEFAULT_STEPS_GOAL,
            calories_burned: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sleep {
    /// Hours slept, 0 to 24.
    pub duration: Option<f64>,
    pub quality: Option<SleepQuality>,
    pub bedtime: Option<DateTime<Utc>>,
    pub wake_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diet {
    pub meals: Vec<Meal>,
    /// Glasses of water.
    pub water_intake: u32,
    pub total_calories: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub activities: Vec<Activity>,
    pub total_duration: u32,
    pub total_calories_burned: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyComposition {
    pub body_fat_percentage: Option<f64>,
    pub muscle_mass: Option<f64>,
    pub bone_density: Option<f64>,
    pub bmi: Option<f64>,
    pub fitness_level: Option<FitnessLevel>,
    pub measurement_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPressure {
    pub systolic: Option<u32>,
    pub diastolic: Option<u32>,
    pub pulse: Option<u32>,
    pub category: Option<BloodPressureCategory>,
    pub measurement_time: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

pub const DEFAULT_STEPS_GOAL: u32 = 10_000;
pub const DEFAULT_ENERGY: u8 = 5;

fn default_energy() -> u8 {
    DEFAULT_ENERGY
}

//=========================================================================================
// DailyLog
//=========================================================================================

/// One health record per user per calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLog {
    pub id: Uuid,
    pub user_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub steps: Steps,
    #[serde(default)]
    pub sleep: Sleep,
    #[serde(default)]
    pub diet: Diet,
    #[serde(default)]
    pub exercise: Exercise,
    pub mood: Option<Mood>,
    #[serde(default = "default_energy")]
    pub energy: u8,
    pub weight: Option<f64>,
    pub body_composition: Option<BodyComposition>,
    pub blood_pressure: Option<BloodPressure>,
    /// Intake minus steps and exercise burn.
    #[serde(default)]
    pub calorie_balance: i64,
    pub notes: Option<String>,
    pub ai_summary: Option<String>,
    #[serde(default)]
    pub ai_recommendations: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DailyLog {
    /// A zero-valued record for `day`.
    pub fn empty(user_id: Uuid, day: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            date: day,
            steps: Steps::default(),
            sleep: Sleep::default(),
            diet: Diet::default(),
            exercise: Exercise::default(),
            mood: None,
            energy: DEFAULT_ENERGY,
            weight: None,
            body_composition: None,
            blood_pressure: None,
            calorie_balance: 0,
            notes: None,
            ai_summary: None,
            ai_recommendations: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

//=========================================================================================
// Partial updates
//=========================================================================================

/// A field of a partial update that distinguishes "not sent" from an explicit `null`.
///
/// Used with `#[serde(default)]`: a missing key stays `Absent`, `null` becomes `Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Presence<T> {
    Absent,
    Null,
    Value(T),
}

impl<T> Default for Presence<T> {
    fn default() -> Self {
        Presence::Absent
    }
}

impl<T> Presence<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Presence::Absent)
    }

    pub fn as_value(&self) -> Option<&T> {
        match self {
            Presence::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Writes the field into `slot` when it was sent; `null` clears it.
    pub fn apply_to(&self, slot: &mut Option<T>)
    where
        T: Clone,
    {
        match self {
            Presence::Absent => {}
            Presence::Null => *slot = None,
            Presence::Value(v) => *slot = Some(v.clone()),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Presence<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Presence::Value(value),
            None => Presence::Null,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsUpdate {
    pub count: Option<u32>,
    pub goal: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepUpdate {
    #[serde(default)]
    pub duration: Presence<f64>,
    pub quality: Option<SleepQuality>,
    #[serde(default)]
    pub bedtime: Presence<DateTime<Utc>>,
    #[serde(default)]
    pub wake_time: Presence<DateTime<Utc>>,
}

/// Meals are never replaced through this path; see `NewMeal`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietUpdate {
    pub water_intake: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyCompositionUpdate {
    #[serde(default)]
    pub body_fat_percentage: Presence<f64>,
    #[serde(default)]
    pub muscle_mass: Presence<f64>,
    #[serde(default)]
    pub bone_density: Presence<f64>,
    pub bmi: Option<f64>,
    pub fitness_level: Option<FitnessLevel>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BloodPressureUpdate {
    #[serde(default)]
    pub systolic: Presence<u32>,
    #[serde(default)]
    pub diastolic: Presence<u32>,
    #[serde(default)]
    pub pulse: Presence<u32>,
    pub notes: Option<String>,
}

/// A partial update of one day's log. Every section and scalar is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyLogUpdate {
    /// Target day; defaults to today. Accepts `2024-05-10` or a full RFC 3339 timestamp.
    #[serde(default, deserialize_with = "day_or_instant")]
    pub date: Option<NaiveDate>,
    pub steps: Option<StepsUpdate>,
    pub sleep: Option<SleepUpdate>,
    pub diet: Option<DietUpdate>,
    pub body_composition: Option<BodyCompositionUpdate>,
    pub blood_pressure: Option<BloodPressureUpdate>,
    #[serde(default)]
    pub mood: Presence<Mood>,
    pub energy: Option<u8>,
    #[serde(default)]
    pub weight: Presence<f64>,
    #[serde(default)]
    pub notes: Presence<String>,
}

/// Reads a calendar day, or the UTC day of a timestamp.
fn day_or_instant<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum DayOrInstant {
        Day(NaiveDate),
        Instant(DateTime<Utc>),
    }

    Ok(Option::<DayOrInstant>::deserialize(deserializer)?.map(|value| match value {
        DayOrInstant::Day(day) => day,
        DayOrInstant::Instant(instant) => instant.date_naive(),
    }))
}

/// A meal as submitted to the add-meal operation, before normalization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMeal {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub meal_type: Option<MealType>,
    pub calories: Option<f64>,
    pub protein: Option<f64>,
}

/// An exercise activity as submitted to the add-activity operation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewActivity {
    #[serde(rename = "type")]
    pub exercise_type: ExerciseType,
    pub name: Option<String>,
    pub duration: u32,
    #[serde(default)]
    pub intensity: Intensity,
    pub calories_burned: Option<u32>,
    pub notes: Option<String>,
}

//=========================================================================================
// Conversation
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// A single message exchanged with the AI assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }
}
