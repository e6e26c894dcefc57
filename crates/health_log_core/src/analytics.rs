//! crates/health_log_core/src/analytics.rs
//!
//! Roll-ups over a window of daily logs: averages, time series, categorical
//! distributions, the calorie-balance report and simple trend directions.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{BloodPressureCategory, DailyLog, FitnessLevel, Mood};
use crate::metrics::{round_half_up, round_to_hundredth, round_to_tenth};

/// Number of days compared at each end of a series by `trend_direction`.
const TREND_SPAN: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

/// Averages and series over a window of logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub days: u32,
    pub average_steps: i64,
    pub average_sleep: f64,
    pub average_calories: i64,
    pub average_energy: f64,
    pub steps_trend: Vec<TrendPoint>,
    pub sleep_trend: Vec<TrendPoint>,
    pub calories_trend: Vec<TrendPoint>,
    pub energy_trend: Vec<TrendPoint>,
    pub mood_distribution: BTreeMap<Mood, u32>,
    pub total_workouts: u32,
    pub body_fat_trend: Vec<TrendPoint>,
    pub muscle_mass_trend: Vec<TrendPoint>,
    pub bone_density_trend: Vec<TrendPoint>,
    pub average_body_fat: f64,
    pub average_muscle_mass: f64,
    pub average_bone_density: f64,
    pub fitness_level_counts: BTreeMap<FitnessLevel, u32>,
    #[serde(rename = "bloodPressureSystolicTrend")]
    pub systolic_trend: Vec<TrendPoint>,
    #[serde(rename = "bloodPressureDiastolicTrend")]
    pub diastolic_trend: Vec<TrendPoint>,
    #[serde(rename = "averageSystolicBP")]
    pub average_systolic: i64,
    #[serde(rename = "averageDiastolicBP")]
    pub average_diastolic: i64,
    #[serde(rename = "bpCategoryCounts")]
    pub blood_pressure_category_counts: BTreeMap<BloodPressureCategory, u32>,
}

/// A running sum for metrics only some logs carry.
#[derive(Default)]
struct Accumulator {
    total: f64,
    count: u32,
}

impl Accumulator {
    fn push(&mut self, value: f64) {
        self.total += value;
        self.count += 1;
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.total / f64::from(self.count))
    }
}

/// Number of workouts a log contributes to `total_workouts`.
///
/// A day's exercise section is a record, not a list of workouts, and the count has
/// always been taken as that record's length, so every day contributes nothing.
/// Kept as is until the intended meaning (activities per day, or days with any
/// activity) is settled.
fn workout_entries(_log: &DailyLog) -> u32 {
    0
}

/// Aggregates `logs` (ordered by date, oldest first) into an `AnalyticsReport`.
pub fn aggregate(logs: &[DailyLog], window_days: u32) -> AnalyticsReport {
    let mut report = AnalyticsReport {
        days: window_days,
        ..AnalyticsReport::default()
    };
    if logs.is_empty() {
        return report;
    }

    let mut steps = 0.0;
    let mut sleep = 0.0;
    let mut calories = 0.0;
    let mut energy = 0.0;
    let mut body_fat = Accumulator::default();
    let mut muscle = Accumulator::default();
    let mut bone = Accumulator::default();
    let mut systolic = Accumulator::default();
    let mut diastolic = Accumulator::default();

    for log in logs {
        let point = |value: f64| TrendPoint { date: log.date, value };

        let day_steps = f64::from(log.steps.count);
        let day_sleep = log.sleep.duration.unwrap_or(0.0);
        let day_calories = f64::from(log.diet.total_calories);
        let day_energy = f64::from(log.energy);

        steps += day_steps;
        sleep += day_sleep;
        calories += day_calories;
        energy += day_energy;

        report.steps_trend.push(point(day_steps));
        report.sleep_trend.push(point(day_sleep));
        report.calories_trend.push(point(day_calories));
        report.energy_trend.push(point(day_energy));

        if let Some(mood) = log.mood {
            *report.mood_distribution.entry(mood).or_insert(0) += 1;
        }

        report.total_workouts += workout_entries(log);

        if let Some(body) = &log.body_composition {
            if let Some(v) = body.body_fat_percentage {
                report.body_fat_trend.push(point(v));
                body_fat.push(v);
            }
            if let Some(v) = body.muscle_mass {
                report.muscle_mass_trend.push(point(v));
                muscle.push(v);
            }
            if let Some(v) = body.bone_density {
                report.bone_density_trend.push(point(v));
                bone.push(v);
            }
            if let Some(level) = body.fitness_level {
                *report.fitness_level_counts.entry(level).or_insert(0) += 1;
            }
        }

        if let Some(bp) = &log.blood_pressure {
            if let Some(v) = bp.systolic {
                report.systolic_trend.push(point(f64::from(v)));
                systolic.push(f64::from(v));
            }
            if let Some(v) = bp.diastolic {
                report.diastolic_trend.push(point(f64::from(v)));
                diastolic.push(f64::from(v));
            }
            if let Some(category) = bp.category {
                *report.blood_pressure_category_counts.entry(category).or_insert(0) += 1;
            }
        }
    }

    let n = logs.len() as f64;
    report.average_steps = round_half_up(steps / n) as i64;
    report.average_sleep = round_to_tenth(sleep / n);
    report.average_calories = round_half_up(calories / n) as i64;
    report.average_energy = round_to_tenth(energy / n);
    report.average_body_fat = body_fat.mean().map(round_to_tenth).unwrap_or(0.0);
    report.average_muscle_mass = muscle.mean().map(round_to_tenth).unwrap_or(0.0);
    report.average_bone_density = bone.mean().map(round_to_hundredth).unwrap_or(0.0);
    report.average_systolic = systolic.mean().map(|m| round_half_up(m) as i64).unwrap_or(0);
    report.average_diastolic = diastolic.mean().map(|m| round_half_up(m) as i64).unwrap_or(0);

    report
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Compares the mean of the last three values with the mean of the first three.
/// Returns `None` for fewer than three values.
pub fn trend_direction(values: &[f64]) -> Option<TrendDirection> {
    if values.len() < TREND_SPAN {
        return None;
    }
    let earlier = mean(&values[..TREND_SPAN]);
    let recent = mean(&values[values.len() - TREND_SPAN..]);

    Some(if recent > earlier {
        TrendDirection::Improving
    } else if recent < earlier {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    })
}

/// Step and sleep directions over a run of daily logs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendSignals {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<TrendDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sleep: Option<TrendDirection>,
}

pub fn trend_signals(logs: &[DailyLog]) -> TrendSignals {
    let steps: Vec<f64> = logs.iter().map(|l| f64::from(l.steps.count)).collect();
    let sleep: Vec<f64> = logs.iter().map(|l| l.sleep.duration.unwrap_or(0.0)).collect();
    TrendSignals {
        steps: trend_direction(&steps),
        sleep: trend_direction(&sleep),
    }
}

//=========================================================================================
// Calorie balance
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyBalance {
    pub date: NaiveDate,
    pub intake: u32,
    pub burned: u32,
    pub balance: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalorieBalanceReport {
    pub average_calorie_intake: i64,
    pub average_calories_burned: i64,
    pub average_calorie_balance: i64,
    pub daily_balances: Vec<DailyBalance>,
    pub total_exercise_minutes: u32,
    /// Percentage of days with at least one exercise activity.
    pub exercise_frequency: u32,
    pub recommendation: String,
}

const SURPLUS_HIGH: &str = "You're consuming significantly more calories than you're \
    burning. Consider increasing your exercise duration or reducing calorie intake for better \
    balance.";
const SURPLUS_MODERATE: &str = "Your calorie intake is moderately higher than what you're \
    burning. Adding 20-30 minutes more exercise daily could help achieve better balance.";
const DEFICIT: &str = "You're burning more calories than you're consuming. Make sure you're \
    eating enough to fuel your activities and recovery.";
const BALANCED: &str =
    "Great job! Your calorie intake and burn are well balanced. Keep up the good work!";

pub fn balance_recommendation(average_balance: i64) -> &'static str {
    if average_balance > 500 {
        SURPLUS_HIGH
    } else if average_balance > 200 {
        SURPLUS_MODERATE
    } else if average_balance < -200 {
        DEFICIT
    } else {
        BALANCED
    }
}

/// Intake against step burn per day. Exercise calories are left out of `burned` here,
/// unlike the per-log `calorie_balance`.
pub fn calorie_balance_report(logs: &[DailyLog]) -> CalorieBalanceReport {
    let mut report = CalorieBalanceReport::default();
    if logs.is_empty() {
        return report;
    }

    let mut total_intake = 0.0;
    let mut total_burned = 0.0;
    let mut total_balance = 0.0;
    let mut days_with_exercise = 0u32;

    for log in logs {
        let intake = log.diet.total_calories;
        let burned = log.steps.calories_burned;
        let balance = i64::from(intake) - i64::from(burned);

        total_intake += f64::from(intake);
        total_burned += f64::from(burned);
        total_balance += balance as f64;
        report.total_exercise_minutes = report
            .total_exercise_minutes
            .saturating_add(log.exercise.total_duration);
        if !log.exercise.activities.is_empty() {
            days_with_exercise += 1;
        }

        report.daily_balances.push(DailyBalance {
            date: log.date,
            intake,
            burned,
            balance,
        });
    }

    let n = logs.len() as f64;
    report.average_calorie_intake = round_half_up(total_intake / n) as i64;
    report.average_calories_burned = round_half_up(total_burned / n) as i64;
    report.average_calorie_balance = round_half_up(total_balance / n) as i64;
    report.exercise_frequency = round_half_up(f64::from(days_with_exercise) * 100.0 / n) as u32;
    report.recommendation = balance_recommendation(report.average_calorie_balance).to_string();

    report
}
