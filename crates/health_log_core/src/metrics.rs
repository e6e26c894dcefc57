//! crates/health_log_core/src/metrics.rs
//!
//! Pure calculators for the derived fields of a daily log: calories burned,
//! calorie balance, BMI, blood-pressure category and fitness level.

use crate::domain::{
    Activity, BloodPressureCategory, ExerciseType, FitnessLevel, Gender, Intensity, Meal,
};

/// Calories burned per step.
const CALORIES_PER_STEP: f64 = 0.04;

/// Body weight the calorie table is calibrated for.
pub const REFERENCE_WEIGHT_KG: f64 = 70.0;

/// Rounds half-way cases towards positive infinity, so `-2.5` becomes `-2`.
pub fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// Rounds to one decimal place using `round_half_up`.
pub fn round_to_tenth(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

pub fn round_to_hundredth(value: f64) -> f64 {
    round_half_up(value * 100.0) / 100.0
}

pub fn steps_calories_burned(count: u32) -> u32 {
    round_half_up(f64::from(count) * CALORIES_PER_STEP) as u32
}

/// Calories burned per minute by a 70 kg person, as `[low, moderate, high]`.
fn calories_per_minute(exercise: ExerciseType) -> [f64; 3] {
    match exercise {
        ExerciseType::Walking => [3.0, 4.0, 5.0],
        ExerciseType::Running => [8.0, 12.0, 16.0],
        ExerciseType::Cycling => [4.0, 8.0, 12.0],
        ExerciseType::Swimming => [6.0, 10.0, 14.0],
        ExerciseType::Weightlifting => [3.0, 5.0, 7.0],
        ExerciseType::Yoga => [2.0, 3.0, 4.0],
        ExerciseType::Pilates => [3.0, 4.0, 5.0],
        ExerciseType::Dancing => [3.0, 5.0, 7.0],
        ExerciseType::Hiking => [4.0, 6.0, 8.0],
        ExerciseType::Basketball => [6.0, 8.0, 10.0],
        ExerciseType::Soccer => [6.0, 9.0, 12.0],
        ExerciseType::Tennis => [5.0, 7.0, 9.0],
        ExerciseType::Other => [3.0, 5.0, 7.0],
    }
}

/// Estimates the calories burned by an exercise session, scaled by body weight.
pub fn exercise_calories_burned(
    exercise: ExerciseType,
    duration_minutes: u32,
    intensity: Intensity,
    weight_kg: Option<f64>,
) -> u32 {
    let row = calories_per_minute(exercise);
    let per_minute = match intensity {
        Intensity::Low => row[0],
        Intensity::Moderate => row[1],
        Intensity::High => row[2],
    };
    let weight_multiplier = weight_kg.unwrap_or(REFERENCE_WEIGHT_KG) / REFERENCE_WEIGHT_KG;
    round_half_up(per_minute * f64::from(duration_minutes) * weight_multiplier).max(0.0) as u32
}

/// Sums whole units, stopping at `u32::MAX` instead of wrapping.
fn saturating_total(values: impl Iterator<Item = u32>) -> u32 {
    values.fold(0, u32::saturating_add)
}

pub fn total_exercise_duration(activities: &[Activity]) -> u32 {
    saturating_total(activities.iter().map(|a| a.duration))
}

pub fn total_exercise_calories(activities: &[Activity]) -> u32 {
    saturating_total(activities.iter().map(|a| a.calories_burned))
}

pub fn total_diet_calories(meals: &[Meal]) -> u32 {
    saturating_total(meals.iter().map(|m| m.calories))
}

pub fn calorie_balance(total_intake: u32, total_burned: u32) -> i64 {
    i64::from(total_intake) - i64::from(total_burned)
}

pub fn bmi(weight_kg: f64, height_cm: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

/// Classifies a reading following the ESC/ESH grading.
///
/// Rules are evaluated in order and the first match wins. An elevated systolic
/// with a diastolic below 90 is isolated systolic hypertension unless the
/// systolic alone already reaches grade 3.
pub fn classify_blood_pressure(
    systolic: Option<u32>,
    diastolic: Option<u32>,
) -> BloodPressureCategory {
    let (Some(sys), Some(dia)) = (systolic, diastolic) else {
        return BloodPressureCategory::Normal;
    };

    if sys < 120 && dia < 80 {
        BloodPressureCategory::Optimal
    } else if sys < 130 && dia < 85 {
        BloodPressureCategory::Normal
    } else if sys < 140 && dia < 90 {
        BloodPressureCategory::HighNormal
    } else if sys >= 140 && sys < 180 && dia < 90 {
        BloodPressureCategory::IsolatedSystolic
    } else if sys < 160 && dia < 100 {
        BloodPressureCategory::Grade1Hypertension
    } else if sys < 180 && dia < 110 {
        BloodPressureCategory::Grade2Hypertension
    } else if sys >= 180 || dia >= 110 {
        BloodPressureCategory::Grade3Hypertension
    } else {
        BloodPressureCategory::Normal
    }
}

/// Upper bounds (exclusive) for body-fat scores 5, 4 and 3; anything above scores 2.
fn body_fat_thresholds(gender: Option<Gender>, age: u32) -> [f64; 3] {
    let male = gender == Some(Gender::Male);
    match (male, age) {
        (true, a) if a < 30 => [14.0, 18.0, 25.0],
        (true, a) if a < 50 => [17.0, 21.0, 28.0],
        (true, _) => [20.0, 25.0, 30.0],
        (false, a) if a < 30 => [21.0, 25.0, 32.0],
        (false, a) if a < 50 => [24.0, 28.0, 35.0],
        (false, _) => [27.0, 31.0, 38.0],
    }
}

fn body_fat_score(body_fat_pct: f64, gender: Option<Gender>, age: u32) -> u32 {
    let [excellent, good, average] = body_fat_thresholds(gender, age);
    if body_fat_pct < excellent {
        5
    } else if body_fat_pct < good {
        4
    } else if body_fat_pct < average {
        3
    } else {
        2
    }
}

fn muscle_mass_score(muscle_mass_kg: f64, gender: Option<Gender>) -> u32 {
    let baseline = if gender == Some(Gender::Male) { 35.0 } else { 28.0 };
    let ratio = muscle_mass_kg / baseline;
    if ratio > 1.2 {
        5
    } else if ratio > 1.0 {
        4
    } else if ratio > 0.8 {
        3
    } else {
        2
    }
}

/// Averages the body-fat and muscle-mass sub-scores and maps the result to a level.
/// Any gender other than male uses the female tables.
pub fn classify_fitness_level(
    body_fat_pct: f64,
    muscle_mass_kg: f64,
    gender: Option<Gender>,
    age: u32,
) -> FitnessLevel {
    let total =
        body_fat_score(body_fat_pct, gender, age) + muscle_mass_score(muscle_mass_kg, gender);
    let average = f64::from(total) / 2.0;

    if average >= 4.5 {
        FitnessLevel::Excellent
    } else if average >= 3.5 {
        FitnessLevel::Good
    } else if average >= 2.5 {
        FitnessLevel::Average
    } else if average >= 1.5 {
        FitnessLevel::Fair
    } else {
        FitnessLevel::Poor
    }
}

/// A human-facing description of a blood-pressure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct BloodPressureInterpretation {
    pub label: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

pub fn interpret_blood_pressure(category: BloodPressureCategory) -> BloodPressureInterpretation {
    let (label, color, description) = match category {
        BloodPressureCategory::Optimal => ("Optimal", "green", "Excellent blood pressure"),
        BloodPressureCategory::Normal => ("Normal", "green", "Good blood pressure"),
        BloodPressureCategory::HighNormal => ("High Normal", "yellow", "Monitor regularly"),
        BloodPressureCategory::Grade1Hypertension => {
            ("Grade 1 Hypertension", "orange", "Consult healthcare provider")
        }
        BloodPressureCategory::Grade2Hypertension => {
            ("Grade 2 Hypertension", "red", "Requires medical attention")
        }
        BloodPressureCategory::Grade3Hypertension => {
            ("Grade 3 Hypertension", "red", "Seek immediate medical care")
        }
        BloodPressureCategory::IsolatedSystolic => (
            "Isolated Systolic Hypertension",
            "orange",
            "Consult healthcare provider",
        ),
    };
    BloodPressureInterpretation {
        label,
        color,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MealType;

    #[test]
    fn steps_burn_four_calories_per_hundred_steps() {
        assert_eq!(steps_calories_burned(10_000), 400);
        assert_eq!(steps_calories_burned(0), 0);
        assert_eq!(steps_calories_burned(1_234), 49);
    }

    #[test]
    fn blood_pressure_cascade() {
        use BloodPressureCategory::*;
        assert_eq!(classify_blood_pressure(Some(115), Some(75)), Optimal);
        assert_eq!(classify_blood_pressure(Some(125), Some(82)), Normal);
        assert_eq!(classify_blood_pressure(Some(135), Some(88)), HighNormal);
        assert_eq!(classify_blood_pressure(Some(150), Some(95)), Grade1Hypertension);
        assert_eq!(classify_blood_pressure(Some(170), Some(105)), Grade2Hypertension);
        assert_eq!(classify_blood_pressure(Some(185), Some(95)), Grade3Hypertension);
        assert_eq!(classify_blood_pressure(Some(120), Some(115)), Grade3Hypertension);
        assert_eq!(classify_blood_pressure(None, Some(80)), Normal);
    }

    #[test]
    fn elevated_systolic_with_low_diastolic_is_isolated() {
        use BloodPressureCategory::*;
        assert_eq!(classify_blood_pressure(Some(145), Some(85)), IsolatedSystolic);
        assert_eq!(classify_blood_pressure(Some(165), Some(70)), IsolatedSystolic);
        assert_eq!(classify_blood_pressure(Some(145), Some(92)), Grade1Hypertension);
        assert_eq!(classify_blood_pressure(Some(190), Some(85)), Grade3Hypertension);
    }

    #[test]
    fn exercise_calories_scale_with_weight_and_intensity() {
        use ExerciseType::*;
        use Intensity::*;
        assert_eq!(exercise_calories_burned(Running, 30, Moderate, None), 360);
        assert_eq!(exercise_calories_burned(Yoga, 60, Low, Some(70.0)), 120);
        assert_eq!(exercise_calories_burned(Walking, 30, High, Some(84.0)), 180);
        assert_eq!(exercise_calories_burned(Other, 10, Moderate, None), 50);
    }

    #[test]
    fn bmi_uses_height_in_metres() {
        let value = bmi(70.0, 175.0);
        assert!((value - 22.857).abs() < 0.001);
    }

    #[test]
    fn fitness_level_combines_fat_and_muscle_scores() {
        // Young lean male with high muscle mass: 5 + 5.
        assert_eq!(
            classify_fitness_level(12.0, 45.0, Some(Gender::Male), 25),
            FitnessLevel::Excellent
        );
        // Male in his forties: fat 19 -> 4, muscle 36 -> 4.
        assert_eq!(classify_fitness_level(19.0, 36.0, Some(Gender::Male), 42), FitnessLevel::Good);
        // Female over fifty: fat 35 -> 3, muscle 20 -> 2, average 2.5.
        assert_eq!(
            classify_fitness_level(35.0, 20.0, Some(Gender::Female), 55),
            FitnessLevel::Average
        );
        // Unknown gender uses the female table: fat 40 -> 2, muscle 15 -> 2.
        assert_eq!(classify_fitness_level(40.0, 15.0, None, 20), FitnessLevel::Fair);
    }

    #[test]
    fn rounding_matches_half_up_semantics() {
        assert_eq!(round_half_up(2.5), 3.0);
        assert_eq!(round_half_up(-2.5), -2.0);
        assert_eq!(round_to_tenth(7.25), 7.3);
        assert_eq!(calorie_balance(1_800, 2_100), -300);
    }

    #[test]
    fn totals_stop_at_the_unit_ceiling() {
        let meal = |calories| Meal {
            name: String::new(),
            meal_type: MealType::Snack,
            calories,
            protein: 0,
            time: None,
        };
        let meals = [meal(3_000_000_000), meal(3_000_000_000), meal(5)];
        assert_eq!(total_diet_calories(&meals), u32::MAX);
        assert_eq!(total_diet_calories(&meals[2..]), 5);
        assert_eq!(calorie_balance(u32::MAX, 0), i64::from(u32::MAX));
    }

    #[test]
    fn interpretation_labels() {
        let grade3 = interpret_blood_pressure(BloodPressureCategory::Grade3Hypertension);
        assert_eq!(grade3.color, "red");
        assert_eq!(grade3.description, "Seek immediate medical care");
    }
}
