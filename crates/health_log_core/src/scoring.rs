//! crates/health_log_core/src/scoring.rs
//!
//! Health scores (0-100) for a single day. Two strategies exist because two
//! clients ask different questions: the AI daily summary scores four lifestyle
//! factors, the dashboard also weighs body composition and blood pressure.
//! Both renormalize over the factors that actually have data.

use serde::Serialize;

use crate::domain::{BloodPressureCategory, DailyLog};
use crate::metrics::round_half_up;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringStrategy {
    /// Steps, sleep, energy and exercise at 25 points each.
    DailySummary,
    /// Steps, sleep, energy and exercise at 20, body fat and blood pressure at 10.
    Dashboard,
}

/// Points earned against the points available for the factors that were present.
#[derive(Default)]
struct Tally {
    earned: f64,
    available: f64,
}

impl Tally {
    fn add(&mut self, earned: f64, weight: f64) {
        self.earned += earned;
        self.available += weight;
    }

    fn percent(&self) -> u32 {
        if self.available <= 0.0 {
            return 0;
        }
        round_half_up(self.earned / self.available * 100.0) as u32
    }
}

impl ScoringStrategy {
    pub fn score(self, log: &DailyLog) -> u32 {
        match self {
            ScoringStrategy::DailySummary => {
                lifestyle_tally(log, 25.0, [25.0, 20.0, 15.0]).percent()
            }
            ScoringStrategy::Dashboard => {
                let mut tally = lifestyle_tally(log, 20.0, [20.0, 15.0, 10.0]);
                let body_fat = log
                    .body_composition
                    .as_ref()
                    .and_then(|b| b.body_fat_percentage);
                if let Some(fat) = body_fat {
                    tally.add(body_fat_points(fat), 10.0);
                }
                if let Some(bp) = &log.blood_pressure {
                    if bp.systolic.is_some() && bp.diastolic.is_some() {
                        tally.add(blood_pressure_points(bp.category), 10.0);
                    }
                }
                tally.percent()
            }
        }
    }
}

/// Scores the four factors both strategies share. `sleep_points` holds the points
/// for 7-9 hours, 6-10 hours and anything else.
fn lifestyle_tally(log: &DailyLog, weight: f64, sleep_points: [f64; 3]) -> Tally {
    let mut tally = Tally::default();

    if log.steps.count > 0 {
        let ratio = if log.steps.goal > 0 {
            f64::from(log.steps.count) / f64::from(log.steps.goal)
        } else {
            1.0
        };
        tally.add((ratio * weight).min(weight), weight);
    }

    if let Some(hours) = log.sleep.duration.filter(|h| *h > 0.0) {
        let points = if (7.0..=9.0).contains(&hours) {
            sleep_points[0]
        } else if (6.0..=10.0).contains(&hours) {
            sleep_points[1]
        } else {
            sleep_points[2]
        };
        tally.add(points, weight);
    }

    if log.energy > 0 {
        tally.add(f64::from(log.energy) / 10.0 * weight, weight);
    }

    if !log.exercise.activities.is_empty() {
        tally.add(weight, weight);
    }

    tally
}

fn body_fat_points(body_fat_pct: f64) -> f64 {
    if body_fat_pct <= 15.0 {
        10.0
    } else if body_fat_pct <= 20.0 {
        8.0
    } else if body_fat_pct <= 25.0 {
        6.0
    } else {
        4.0
    }
}

fn blood_pressure_points(category: Option<BloodPressureCategory>) -> f64 {
    match category {
        Some(BloodPressureCategory::Optimal) => 10.0,
        Some(BloodPressureCategory::Normal) => 8.0,
        Some(BloodPressureCategory::HighNormal) => 6.0,
        _ => 4.0,
    }
}
