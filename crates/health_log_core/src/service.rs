//! crates/health_log_core/src/service.rs
//!
//! `HealthService` ties the pure modules to the ports. Every write goes through
//! `DatabaseService::mutate_day`, so merges for the same user and day never race.

use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::advisor::{self, AdvisorSettings, PredictionReport};
use crate::analytics::{self, AnalyticsReport, CalorieBalanceReport, TrendSignals};
use crate::domain::{
    ChatMessage, DailyLog, DailyLogUpdate, NewActivity, NewMeal, ProfileUpdate, UserProfile,
};
use crate::merge;
use crate::metrics::{self, BloodPressureInterpretation};
use crate::ports::{
    CompletionRequest, CompletionService, DatabaseService, DayMutation, PortError, PortResult,
};
use crate::scoring::ScoringStrategy;
use crate::validation;

/// Default number of logs returned by `list_logs`.
pub const DEFAULT_LIST_LIMIT: usize = 30;
/// Days of history before the target day included in a daily summary.
const SUMMARY_HISTORY_DAYS: u32 = 7;
/// Earliest day a look-back window reaches, inside the range every store can hold.
const EARLIEST_WINDOW_YEAR: i32 = 1;

/// The day `days` before `day`, clamped to the first day of `EARLIEST_WINDOW_YEAR`.
fn days_before(day: NaiveDate, days: u32) -> NaiveDate {
    let floor = NaiveDate::from_yo_opt(EARLIEST_WINDOW_YEAR, 1).unwrap_or(NaiveDate::MIN);
    day.checked_sub_days(Days::new(u64::from(days)))
        .map_or(floor, |start| start.max(floor))
}

#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub summary: String,
    pub recommendations: Vec<String>,
    pub health_score: u32,
    pub trends: TrendSignals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthScores {
    pub date: NaiveDate,
    pub summary_score: u32,
    pub dashboard_score: u32,
    /// Present when today's log has a classified blood pressure reading.
    pub blood_pressure: Option<BloodPressureInterpretation>,
}

/// Wraps an edit that cannot fail as a `DayMutation`.
fn infallible<F>(edit: F) -> DayMutation
where
    F: Fn(&mut DailyLog) + Send + Sync + 'static,
{
    Box::new(move |log: &mut DailyLog| -> PortResult<()> {
        edit(log);
        Ok(())
    })
}

/// The application's use cases, shared by every request handler.
pub struct HealthService {
    db: Arc<dyn DatabaseService>,
    completion: Arc<dyn CompletionService>,
    settings: AdvisorSettings,
}

impl HealthService {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        completion: Arc<dyn CompletionService>,
        settings: AdvisorSettings,
    ) -> Self {
        Self {
            db,
            completion,
            settings,
        }
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }

    // --- Profiles ---

    pub async fn profile(&self, user_id: Uuid) -> PortResult<UserProfile> {
        self.db.get_or_create_profile(user_id).await
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: ProfileUpdate,
    ) -> PortResult<UserProfile> {
        validation::validate_profile(&update)?;
        let mut profile = self.db.get_or_create_profile(user_id).await?;
        if update.age.is_some() {
            profile.age = update.age;
        }
        if update.gender.is_some() {
            profile.gender = update.gender;
        }
        if update.height.is_some() {
            profile.height = update.height;
        }
        if update.weight.is_some() {
            profile.weight = update.weight;
        }
        if let Some(level) = update.activity_level {
            profile.activity_level = level;
        }
        if let Some(goals) = update.health_goals {
            profile.health_goals = goals;
        }
        self.db.save_profile(&profile).await
    }

    // --- Daily log writes ---

    /// Returns today's log, creating the zero-valued record on first access.
    pub async fn today_log(&self, user_id: Uuid) -> PortResult<DailyLog> {
        let profile = self.db.get_or_create_profile(user_id).await?;
        self.db
            .mutate_day(
                user_id,
                Self::today(),
                infallible(move |log| merge::recompute_derived(log, &profile)),
            )
            .await
    }

    /// Validates `update` and merges it into the log for its day (today by default).
    pub async fn merge_update(
        &self,
        user_id: Uuid,
        update: DailyLogUpdate,
    ) -> PortResult<DailyLog> {
        validation::validate_update(&update)?;
        let profile = self.db.get_or_create_profile(user_id).await?;
        let day = update.date.unwrap_or_else(Self::today);
        debug!(%user_id, %day, "merging daily log update");

        let log = self
            .db
            .mutate_day(
                user_id,
                day,
                infallible(move |log| merge::apply_update(log, &update, &profile, Utc::now())),
            )
            .await?;
        info!(%user_id, %day, "daily log updated");
        Ok(log)
    }

    pub async fn add_meal(&self, user_id: Uuid, meal: NewMeal) -> PortResult<DailyLog> {
        validation::validate_meal(&meal)?;
        let profile = self.db.get_or_create_profile(user_id).await?;
        let log = self
            .db
            .mutate_day(
                user_id,
                Self::today(),
                infallible(move |log| merge::append_meal(log, &meal, &profile, Utc::now())),
            )
            .await?;
        info!(
            %user_id,
            meals = log.diet.meals.len(),
            total_calories = log.diet.total_calories,
            "meal added"
        );
        Ok(log)
    }

    pub async fn add_activity(&self, user_id: Uuid, activity: NewActivity) -> PortResult<DailyLog> {
        validation::validate_activity(&activity)?;
        let profile = self.db.get_or_create_profile(user_id).await?;
        let log = self
            .db
            .mutate_day(
                user_id,
                Self::today(),
                infallible(move |log| merge::append_activity(log, &activity, &profile, Utc::now())),
            )
            .await?;
        info!(%user_id, activities = log.exercise.activities.len(), "activity added");
        Ok(log)
    }

    // --- Reads and analytics ---

    pub async fn list_logs(&self, user_id: Uuid, query: LogQuery) -> PortResult<Vec<DailyLog>> {
        let range = match (query.start, query.end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        };
        self.db
            .list_logs(user_id, range, query.limit.unwrap_or(DEFAULT_LIST_LIMIT))
            .await
    }

    /// Logs of the last `days` days. A window reaching past the calendar's start
    /// covers all history.
    async fn window(&self, user_id: Uuid, days: u32) -> PortResult<Vec<DailyLog>> {
        let start = days_before(Self::today(), days);
        self.db.logs_since(user_id, start).await
    }

    pub async fn analytics(&self, user_id: Uuid, days: u32) -> PortResult<AnalyticsReport> {
        let logs = self.window(user_id, days).await?;
        Ok(analytics::aggregate(&logs, days))
    }

    pub async fn calorie_balance(
        &self,
        user_id: Uuid,
        days: u32,
    ) -> PortResult<CalorieBalanceReport> {
        let logs = self.window(user_id, days).await?;
        Ok(analytics::calorie_balance_report(&logs))
    }

    /// Both health-score strategies for today's log, with the blood pressure reading
    /// explained when there is one.
    pub async fn health_scores(&self, user_id: Uuid) -> PortResult<HealthScores> {
        let log = self.today_log(user_id).await?;
        Ok(HealthScores {
            date: log.date,
            summary_score: ScoringStrategy::DailySummary.score(&log),
            dashboard_score: ScoringStrategy::Dashboard.score(&log),
            blood_pressure: log
                .blood_pressure
                .as_ref()
                .and_then(|bp| bp.category)
                .map(metrics::interpret_blood_pressure),
        })
    }

    // --- AI assistant ---

    /// Sends `messages` to the completion service. Failures become the fallback text;
    /// the flag tells whether the model actually answered.
    async fn ask(
        &self,
        messages: Vec<ChatMessage>,
        max_tokens: u32,
        temperature: f32,
    ) -> (String, bool) {
        let request = CompletionRequest {
            messages,
            max_tokens,
            temperature,
        };
        match self.completion.complete(&request).await {
            Ok(reply) => {
                let text = advisor::reply_text(&reply, &self.settings.fallback_text);
                let answered = text != self.settings.fallback_text;
                (advisor::truncate_words(text, self.settings.max_words), answered)
            }
            Err(e) => {
                warn!("AI completion failed, using fallback text: {}", e);
                (
                    advisor::truncate_words(&self.settings.fallback_text, self.settings.max_words),
                    false,
                )
            }
        }
    }

    /// Summarizes the log of `date` (today by default) and caches the result on it.
    pub async fn daily_summary(
        &self,
        user_id: Uuid,
        date: Option<NaiveDate>,
    ) -> PortResult<DailySummary> {
        let day = date.unwrap_or_else(Self::today);
        let profile = self.db.get_or_create_profile(user_id).await?;
        let log = self
            .db
            .find_log(user_id, day)
            .await?
            .ok_or_else(|| PortError::NotFound(format!("No health data found for {day}")))?;

        let start = days_before(day, SUMMARY_HISTORY_DAYS);
        let mut week = self.db.list_logs(user_id, Some((start, day)), usize::MAX).await?;
        week.reverse();

        let prompt = advisor::daily_summary_prompt(&profile, &log, &week);
        let (summary, answered) = self
            .ask(
                vec![ChatMessage::user(prompt)],
                self.settings.summary_max_tokens,
                self.settings.summary_temperature,
            )
            .await;
        let recommendations =
            advisor::extract_recommendations(&summary, self.settings.max_recommendations);

        if answered {
            let cached_summary = summary.clone();
            let cached_recommendations = recommendations.clone();
            self.db
                .mutate_day(
                    user_id,
                    day,
                    infallible(move |log| {
                        log.ai_summary = Some(cached_summary.clone());
                        log.ai_recommendations = cached_recommendations.clone();
                    }),
                )
                .await?;
        }

        Ok(DailySummary {
            summary,
            recommendations,
            health_score: ScoringStrategy::DailySummary.score(&log),
            trends: analytics::trend_signals(&week),
        })
    }

    /// Answers a chat message using the latest log and up to the last few prior turns.
    pub async fn chat(
        &self,
        user_id: Uuid,
        message: &str,
        history: &[ChatMessage],
    ) -> PortResult<ChatReply> {
        if message.trim().is_empty() {
            return Err(PortError::validation("message", "must not be empty"));
        }
        let profile = self.db.get_or_create_profile(user_id).await?;
        let recent = self.db.latest_log(user_id).await?;

        let system = advisor::chat_system_prompt(&profile, recent.as_ref());
        let messages =
            advisor::chat_messages(system, history, message, self.settings.chat_history_turns);
        let (response, _) = self
            .ask(messages, self.settings.chat_max_tokens, self.settings.chat_temperature)
            .await;

        Ok(ChatReply {
            response,
            timestamp: Utc::now(),
        })
    }

    pub async fn predictions(&self, user_id: Uuid, days: u32) -> PortResult<PredictionReport> {
        let logs = self.window(user_id, days).await?;
        Ok(advisor::predict(&logs))
    }

    // --- Administration ---

    pub async fn clear_all_logs(&self) -> PortResult<u64> {
        let deleted = self.db.clear_all_logs().await?;
        warn!(deleted, "all daily logs cleared");
        Ok(deleted)
    }
}
