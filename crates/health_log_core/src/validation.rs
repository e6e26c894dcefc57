//! crates/health_log_core/src/validation.rs
//!
//! Range checks applied to client input before anything reaches the merge engine.

use crate::domain::{DailyLogUpdate, NewActivity, NewMeal, Presence, ProfileUpdate};
use crate::ports::{PortError, PortResult};

fn check_range<T>(field: &str, value: T, min: T, max: T, unit: &str) -> PortResult<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if value < min || value > max {
        return Err(PortError::validation(
            field,
            format!("should be between {min}-{max}{unit}, got {value}"),
        ));
    }
    Ok(())
}

fn check_present_range<T>(
    field: &str,
    value: &Presence<T>,
    min: T,
    max: T,
    unit: &str,
) -> PortResult<()>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    match value.as_value() {
        Some(v) => check_range(field, *v, min, max, unit),
        None => Ok(()),
    }
}

fn check_non_negative(field: &str, value: f64) -> PortResult<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(PortError::validation(field, "must be a non-negative number"));
    }
    Ok(())
}

/// Rejects the first out-of-range field of a daily-log update.
pub fn validate_update(update: &DailyLogUpdate) -> PortResult<()> {
    if let Some(steps) = &update.steps {
        if steps.goal == Some(0) {
            return Err(PortError::validation("steps.goal", "must be greater than 0"));
        }
    }

    if let Some(sleep) = &update.sleep {
        check_present_range("sleep.duration", &sleep.duration, 0.0, 24.0, " hours")?;
    }

    if let Some(energy) = update.energy {
        check_range("energy", energy, 1, 10, "")?;
    }

    if let Some(weight) = update.weight.as_value() {
        check_non_negative("weight", *weight)?;
    }

    if let Some(body) = &update.body_composition {
        check_present_range(
            "bodyComposition.bodyFatPercentage",
            &body.body_fat_percentage,
            3.0,
            50.0,
            "%",
        )?;
        check_present_range(
            "bodyComposition.muscleMass",
            &body.muscle_mass,
            10.0,
            200.0,
            " kg",
        )?;
        check_present_range(
            "bodyComposition.boneDensity",
            &body.bone_density,
            0.5,
            2.0,
            " g/cm²",
        )?;
        if let Some(bmi) = body.bmi {
            check_range("bodyComposition.bmi", bmi, 10.0, 50.0, "")?;
        }
    }

    if let Some(bp) = &update.blood_pressure {
        check_present_range("bloodPressure.systolic", &bp.systolic, 70, 250, " mmHg")?;
        check_present_range("bloodPressure.diastolic", &bp.diastolic, 40, 150, " mmHg")?;
        check_present_range("bloodPressure.pulse", &bp.pulse, 30, 200, " bpm")?;
    }

    Ok(())
}

pub fn validate_meal(meal: &NewMeal) -> PortResult<()> {
    if let Some(calories) = meal.calories {
        check_non_negative("meal.calories", calories)?;
    }
    if let Some(protein) = meal.protein {
        check_non_negative("meal.protein", protein)?;
    }
    Ok(())
}

/// Minutes in a day; no single activity can last longer.
const MAX_ACTIVITY_MINUTES: u32 = 24 * 60;

pub fn validate_activity(activity: &NewActivity) -> PortResult<()> {
    check_range(
        "activity.duration",
        activity.duration,
        1,
        MAX_ACTIVITY_MINUTES,
        " minutes",
    )
}

pub fn validate_profile(update: &ProfileUpdate) -> PortResult<()> {
    if let Some(age) = update.age {
        check_range("age", age, 1, 120, " years")?;
    }
    if let Some(height) = update.height {
        check_range("height", height, 50.0, 272.0, " cm")?;
    }
    if let Some(weight) = update.weight {
        check_range("weight", weight, 20.0, 500.0, " kg")?;
    }
    Ok(())
}
