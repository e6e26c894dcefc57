//! crates/health_log_core/src/merge.rs
//!
//! The daily log merge engine. Partial updates are folded into an existing
//! record field by field, then every derived field is recomputed from its inputs.

use chrono::{DateTime, Utc};

use crate::domain::{
    Activity, BloodPressure, BodyComposition, DailyLog, DailyLogUpdate, Meal, NewActivity,
    NewMeal, UserProfile,
};
use crate::metrics;

/// Merges `update` into `log`. Fields the update does not carry keep their stored values.
pub fn apply_update(
    log: &mut DailyLog,
    update: &DailyLogUpdate,
    profile: &UserProfile,
    now: DateTime<Utc>,
) {
    if let Some(steps) = &update.steps {
        if let Some(count) = steps.count {
            log.steps.count = count;
        }
        if let Some(goal) = steps.goal {
            log.steps.goal = goal;
        }
    }

    if let Some(sleep) = &update.sleep {
        sleep.duration.apply_to(&mut log.sleep.duration);
        if let Some(quality) = sleep.quality {
            log.sleep.quality = Some(quality);
        }
        sleep.bedtime.apply_to(&mut log.sleep.bedtime);
        sleep.wake_time.apply_to(&mut log.sleep.wake_time);
    }

    if let Some(diet) = &update.diet {
        if let Some(water) = diet.water_intake {
            log.diet.water_intake = water;
        }
    }

    update.mood.apply_to(&mut log.mood);
    if let Some(energy) = update.energy {
        log.energy = energy;
    }
    update.weight.apply_to(&mut log.weight);
    update.notes.apply_to(&mut log.notes);

    if let Some(body) = &update.body_composition {
        let section = log.body_composition.get_or_insert_with(BodyComposition::default);
        body.body_fat_percentage.apply_to(&mut section.body_fat_percentage);
        body.muscle_mass.apply_to(&mut section.muscle_mass);
        body.bone_density.apply_to(&mut section.bone_density);
        // Client-computed values are kept unless the server can derive its own.
        if let Some(bmi) = body.bmi {
            section.bmi = Some(bmi);
        }
        if let Some(level) = body.fitness_level {
            section.fitness_level = Some(level);
        }
        if let Some(notes) = &body.notes {
            section.notes = Some(notes.clone());
        }
        section.measurement_time = Some(now);
    }

    if let Some(bp) = &update.blood_pressure {
        let section = log.blood_pressure.get_or_insert_with(BloodPressure::default);
        bp.systolic.apply_to(&mut section.systolic);
        bp.diastolic.apply_to(&mut section.diastolic);
        bp.pulse.apply_to(&mut section.pulse);
        if let Some(notes) = &bp.notes {
            section.notes = Some(notes.clone());
        }
        section.measurement_time = Some(now);
    }

    recompute_derived(log, profile);
    log.updated_at = now;
}

/// Normalizes `meal` and appends it to the day's meals. Other sections are untouched
/// apart from the derived totals.
pub fn append_meal(
    log: &mut DailyLog,
    meal: &NewMeal,
    profile: &UserProfile,
    now: DateTime<Utc>,
) {
    log.diet.meals.push(Meal {
        name: meal.name.clone().unwrap_or_default(),
        meal_type: meal.meal_type.unwrap_or_default(),
        calories: whole_units(meal.calories),
        protein: whole_units(meal.protein),
        time: Some(now),
    });
    recompute_derived(log, profile);
    log.updated_at = now;
}

/// Appends an exercise activity, estimating its calories from the profile weight
/// when the client did not send a burn figure.
pub fn append_activity(
    log: &mut DailyLog,
    activity: &NewActivity,
    profile: &UserProfile,
    now: DateTime<Utc>,
) {
    let calories_burned = match activity.calories_burned {
        Some(calories) if calories > 0 => calories,
        _ => metrics::exercise_calories_burned(
            activity.exercise_type,
            activity.duration,
            activity.intensity,
            log.weight.or(profile.weight),
        ),
    };

    log.exercise.activities.push(Activity {
        exercise_type: activity.exercise_type,
        name: activity
            .name
            .clone()
            .unwrap_or_else(|| format!("{:?}", activity.exercise_type).to_lowercase()),
        duration: activity.duration,
        intensity: activity.intensity,
        calories_burned,
        notes: activity.notes.clone(),
        time: Some(now),
    });
    recompute_derived(log, profile);
    log.updated_at = now;
}

/// Recomputes every derived field of `log` from its inputs.
pub fn recompute_derived(log: &mut DailyLog, profile: &UserProfile) {
    log.steps.calories_burned = metrics::steps_calories_burned(log.steps.count);

    log.exercise.total_duration = metrics::total_exercise_duration(&log.exercise.activities);
    log.exercise.total_calories_burned = metrics::total_exercise_calories(&log.exercise.activities);

    log.diet.total_calories = metrics::total_diet_calories(&log.diet.meals);

    log.calorie_balance = metrics::calorie_balance(
        log.diet.total_calories,
        log.steps
            .calories_burned
            .saturating_add(log.exercise.total_calories_burned),
    );

    let weight = log.weight.or(profile.weight);
    if let (Some(section), Some(height), Some(weight)) =
        (log.body_composition.as_mut(), profile.height, weight)
    {
        section.bmi = Some(metrics::bmi(weight, height));
        if let (Some(fat), Some(muscle), Some(age)) =
            (section.body_fat_percentage, section.muscle_mass, profile.age)
        {
            section.fitness_level =
                Some(metrics::classify_fitness_level(fat, muscle, profile.gender, age));
        }
    }

    if let Some(bp) = log.blood_pressure.as_mut() {
        if bp.systolic.is_some() && bp.diastolic.is_some() {
            bp.category = Some(metrics::classify_blood_pressure(bp.systolic, bp.diastolic));
        }
    }
}

/// Truncates a client number to whole units, treating missing or negative input as zero.
fn whole_units(value: Option<f64>) -> u32 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v.trunc().min(f64::from(u32::MAX)) as u32,
        _ => 0,
    }
}
