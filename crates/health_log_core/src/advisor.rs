//! crates/health_log_core/src/advisor.rs
//!
//! Turns profiles and daily logs into prompts for the AI assistant, and turns the
//! assistant's free text back into something the UI can show. Also holds the
//! rule-based predictions, which need no model call.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, ChatRole, DailyLog, UserProfile};
use crate::ports::CompletionReply;

const SUMMARY_INSTRUCTIONS: &str = r#"Please provide:
1. A brief summary of today's health metrics
2. 3-5 specific, actionable recommendations based on the data and trends
3. Identification of any concerning patterns
4. Positive reinforcement for good habits
5. Tomorrow's focus areas

Keep the response concise but insightful, focusing on practical advice."#;

const CHAT_PERSONA: &str = "You are HealthMate AI, a knowledgeable and supportive health \
    assistant. You help users with:
- Nutrition advice and meal planning
- Exercise recommendations and workout plans
- Sleep optimization tips
- General wellness guidance
- Motivation and encouragement";

const CHAT_CLOSING: &str = "Provide helpful, personalized advice. Be encouraging and \
    supportive. If asked about serious medical conditions, remind the user to consult \
    healthcare professionals.";

pub const SERVICE_UNAVAILABLE: &str =
    "Sorry, the AI service is temporarily unavailable. Please try again later.";

/// Tunables for the assistant, supplied by the host at construction time.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorSettings {
    pub max_words: usize,
    pub max_recommendations: usize,
    pub chat_history_turns: usize,
    pub summary_max_tokens: u32,
    pub summary_temperature: f32,
    pub chat_max_tokens: u32,
    pub chat_temperature: f32,
    pub fallback_text: String,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            max_words: 100,
            max_recommendations: 5,
            chat_history_turns: 5,
            summary_max_tokens: 500,
            summary_temperature: 0.7,
            chat_max_tokens: 300,
            chat_temperature: 0.8,
            fallback_text: SERVICE_UNAVAILABLE.to_string(),
        }
    }
}

//=========================================================================================
// Prompt building
//=========================================================================================

fn or_unspecified<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "Not specified".to_string())
}

/// Renders a snake_case serde name ("very_active") for display.
fn label<T: Serialize>(value: &T) -> String {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(s)) => s,
        _ => String::new(),
    }
}

fn profile_lines(profile: &UserProfile) -> String {
    let goals = if profile.health_goals.is_empty() {
        "Not specified".to_string()
    } else {
        profile.health_goals.iter().map(label).collect::<Vec<_>>().join(", ")
    };
    format!(
        "- Age: {}\n- Gender: {}\n- Height: {}cm\n- Weight: {}kg\n\
         - Activity Level: {}\n- Health Goals: {}",
        or_unspecified(profile.age),
        or_unspecified(profile.gender.as_ref().map(label)),
        or_unspecified(profile.height),
        or_unspecified(profile.weight),
        label(&profile.activity_level),
        goals,
    )
}

fn weekly_line(log: &DailyLog) -> String {
    format!(
        "{}: {} steps, {}h sleep, {} cal, mood: {}, energy: {}",
        log.date.format("%a %b %d %Y"),
        log.steps.count,
        log.sleep.duration.unwrap_or(0.0),
        log.diet.total_calories,
        log.mood.as_ref().map(label).unwrap_or_else(|| "N/A".to_string()),
        log.energy,
    )
}

/// The prompt asking for a daily summary of `today`, with `week` as trend context.
pub fn daily_summary_prompt(profile: &UserProfile, today: &DailyLog, week: &[DailyLog]) -> String {
    let sleep = today
        .sleep
        .duration
        .map(|h| h.to_string())
        .unwrap_or_else(|| "Not recorded".to_string());
    let quality = today
        .sleep
        .quality
        .as_ref()
        .map(label)
        .unwrap_or_else(|| "Not recorded".to_string());
    let mood = today.mood.as_ref().map(label).unwrap_or_else(|| "Not recorded".to_string());
    let trend = week.iter().map(weekly_line).collect::<Vec<_>>().join("\n");

    format!(
        "As a health AI assistant, analyze this user's health data and provide a \
         comprehensive daily summary with personalized recommendations.\n\n\
User Profile:\n{profile}\n\n\
Today's Data:\n\
- Steps: {steps} (Goal: {goal})\n\
- Sleep: {sleep} hours\n\
- Sleep Quality: {quality}\n\
- Total Calories: {calories}\n\
- Water Intake: {water} glasses\n\
- Workouts: {workouts} ({minutes} minutes)\n\
- Mood: {mood}\n\
- Energy Level: {energy}/10\n\n\
Weekly Trends:\n{trend}\n\n{SUMMARY_INSTRUCTIONS}",
        profile = profile_lines(profile),
        steps = today.steps.count,
        goal = today.steps.goal,
        calories = today.diet.total_calories,
        water = today.diet.water_intake,
        workouts = today.exercise.activities.len(),
        minutes = today.exercise.total_duration,
        energy = today.energy,
    )
}

/// The system prompt for a chat turn, grounded in the latest known log.
pub fn chat_system_prompt(profile: &UserProfile, recent: Option<&DailyLog>) -> String {
    let not_recorded = || "Not recorded".to_string();
    let steps = recent.map(|l| l.steps.count.to_string()).unwrap_or_else(not_recorded);
    let sleep = recent
        .and_then(|l| l.sleep.duration)
        .map(|h| h.to_string())
        .unwrap_or_else(not_recorded);
    let mood = recent
        .and_then(|l| l.mood.as_ref())
        .map(label)
        .unwrap_or_else(not_recorded);
    let energy = recent.map(|l| l.energy.to_string()).unwrap_or_else(not_recorded);

    format!(
        "{CHAT_PERSONA}\n\nUser Context:\n{}\n\nRecent Activity:\n\
- Recent Steps: {steps}\n- Recent Sleep: {sleep} hours\n\
- Recent Mood: {mood}\n- Recent Energy: {energy}/10\n\n{CHAT_CLOSING}",
        profile_lines(profile),
    )
}

/// System prompt, then at most `history_turns` prior turns, then the new message.
/// System messages in `history` are dropped.
pub fn chat_messages(
    system_prompt: String,
    history: &[ChatMessage],
    message: &str,
    history_turns: usize,
) -> Vec<ChatMessage> {
    let prior: Vec<&ChatMessage> = history.iter().filter(|m| m.role != ChatRole::System).collect();
    let skip = prior.len().saturating_sub(history_turns);

    let mut messages = Vec::with_capacity(history_turns + 2);
    messages.push(ChatMessage::system(system_prompt));
    messages.extend(prior.into_iter().skip(skip).cloned());
    messages.push(ChatMessage::user(message));
    messages
}

//=========================================================================================
// Response handling
//=========================================================================================

fn non_blank(text: &Option<String>) -> Option<&str> {
    text.as_deref().filter(|t| !t.trim().is_empty())
}

/// Picks the text to show: content, else reasoning, else the reasoning summary,
/// else `fallback`.
pub fn reply_text<'a>(reply: &'a CompletionReply, fallback: &'a str) -> &'a str {
    non_blank(&reply.content)
        .or_else(|| non_blank(&reply.reasoning))
        .or_else(|| non_blank(&reply.reasoning_summary))
        .unwrap_or(fallback)
}

/// Keeps the first `max_words` whitespace-separated words, appending `...` when cut.
pub fn truncate_words(text: &str, max_words: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() > max_words {
        format!("{}...", words[..max_words].join(" "))
    } else {
        text.to_string()
    }
}

fn list_marker() -> &'static Regex {
    static MARKER: OnceLock<Regex> = OnceLock::new();
    MARKER.get_or_init(|| {
        Regex::new(r"^\s*(?:[•\-*]|\d+[.)])\s+").expect("list marker pattern is valid")
    })
}

/// Lines of `text` that look like bullet or numbered list items, in order.
pub fn extract_recommendations(text: &str, limit: usize) -> Vec<String> {
    text.lines()
        .filter(|line| list_marker().is_match(line))
        .map(|line| line.trim().to_string())
        .take(limit)
        .collect()
}

//=========================================================================================
// Predictions
//=========================================================================================

/// Days of history needed before predictions are made.
pub const MIN_PREDICTION_DAYS: usize = 7;

const RECENT_DAYS: usize = 3;
const SHORT_SLEEP_HOURS: f64 = 6.0;
const ACTIVITY_DROP_RATIO: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionKind {
    Sleep,
    Activity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    #[serde(rename = "type")]
    pub kind: PredictionKind,
    pub message: String,
    pub severity: Severity,
    pub recommendation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionReport {
    pub sufficient_data: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub predictions: Vec<Prediction>,
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn recent_mean(values: &[f64]) -> f64 {
    mean(&values[values.len().saturating_sub(RECENT_DAYS)..])
}

/// Rule-based outlook from `logs` (oldest first).
pub fn predict(logs: &[DailyLog]) -> PredictionReport {
    if logs.len() < MIN_PREDICTION_DAYS {
        return PredictionReport {
            sufficient_data: false,
            message: Some(format!(
                "Need at least {MIN_PREDICTION_DAYS} days of data for predictions"
            )),
            predictions: Vec::new(),
        };
    }

    let mut predictions = Vec::new();

    // Only nights that were actually recorded count towards sleep.
    let sleep: Vec<f64> = logs
        .iter()
        .filter_map(|l| l.sleep.duration)
        .filter(|h| *h > 0.0)
        .collect();
    if sleep.len() >= MIN_PREDICTION_DAYS {
        let recent = recent_mean(&sleep);
        if recent < SHORT_SLEEP_HOURS {
            predictions.push(Prediction {
                kind: PredictionKind::Sleep,
                message: format!(
                    "You've averaged {recent:.1} hours of sleep recently. Expect lower energy \
                     and focus if this pattern continues."
                ),
                severity: Severity::High,
                recommendation: "Try to get 7-9 hours of sleep tonight for better \
                                 performance tomorrow."
                    .to_string(),
            });
        }
    }

    let steps: Vec<f64> = logs.iter().map(|l| f64::from(l.steps.count)).collect();
    if recent_mean(&steps) < mean(&steps) * ACTIVITY_DROP_RATIO {
        predictions.push(Prediction {
            kind: PredictionKind::Activity,
            message: "Your activity level has decreased significantly. This may impact your \
                      energy and mood."
                .to_string(),
            severity: Severity::Medium,
            recommendation: "Consider scheduling a 20-30 minute walk or workout today.".to_string(),
        });
    }

    PredictionReport {
        sufficient_data: true,
        message: None,
        predictions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HealthGoal, Mood};
    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    fn log_on(day: u32, steps: u32, sleep: f64) -> DailyLog {
        let date = NaiveDate::from_ymd_opt(2024, 2, day).unwrap();
        let mut log = DailyLog::empty(Uuid::nil(), date, Utc::now());
        log.steps.count = steps;
        log.sleep.duration = Some(sleep);
        log
    }

    #[test]
    fn reply_text_follows_priority_chain() {
        let reply = CompletionReply {
            content: Some("  ".into()),
            reasoning: None,
            reasoning_summary: Some("summary".into()),
        };
        assert_eq!(reply_text(&reply, "fallback"), "summary");

        let reply = CompletionReply {
            content: Some("answer".into()),
            reasoning: Some("thinking".into()),
            reasoning_summary: None,
        };
        assert_eq!(reply_text(&reply, "fallback"), "answer");
        assert_eq!(reply_text(&CompletionReply::default(), "fallback"), "fallback");
    }

    #[test]
    fn truncation_appends_ellipsis_only_when_cut() {
        let long = (0..120).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let cut = truncate_words(&long, 100);
        assert_eq!(cut.split_whitespace().count(), 100);
        assert!(cut.ends_with("w99..."));
        assert_eq!(truncate_words("short answer", 100), "short answer");
    }

    #[test]
    fn recommendations_keep_list_items_in_order() {
        let text = "Great day overall.\n1. Drink more water\n- Walk after lunch\n\
                    Sleep was fine.\n• Stretch\n2) Eat protein\n* Go to bed early\n\
                    3. Extra item";
        let recs = extract_recommendations(text, 5);
        assert_eq!(
            recs,
            vec![
                "1. Drink more water",
                "- Walk after lunch",
                "• Stretch",
                "2) Eat protein",
                "* Go to bed early",
            ]
        );
    }

    #[test]
    fn markers_need_a_space_before_the_item() {
        let text = "**Recommendations:**\n7.5 hours is fine\n-5% body fat\n\
                    1.Walk\n  - Stretch daily\n3) Rest";
        let recs = extract_recommendations(text, 5);
        assert_eq!(recs, vec!["- Stretch daily", "3) Rest"]);
    }

    #[test]
    fn chat_keeps_the_last_five_turns() {
        let history: Vec<ChatMessage> =
            (0..8).map(|i| ChatMessage::user(format!("m{i}"))).collect();
        let messages = chat_messages("sys".into(), &history, "now", 5);
        assert_eq!(messages.len(), 7);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[1].content, "m3");
        assert_eq!(messages[6].content, "now");
    }

    #[test]
    fn prompts_embed_profile_and_snapshot() {
        let mut profile = UserProfile::new(Uuid::nil());
        profile.age = Some(34);
        profile.health_goals = vec![HealthGoal::BetterSleep, HealthGoal::WeightLoss];
        let mut today = log_on(9, 6_500, 6.5);
        today.mood = Some(Mood::VeryHappy);

        let prompt = daily_summary_prompt(&profile, &today, std::slice::from_ref(&today));
        assert!(prompt.contains("- Age: 34"));
        assert!(prompt.contains("- Health Goals: better_sleep, weight_loss"));
        assert!(prompt.contains("- Steps: 6500 (Goal: 10000)"));
        assert!(prompt.contains("6500 steps, 6.5h sleep"));
        assert!(prompt.contains("mood: very_happy"));

        let system = chat_system_prompt(&profile, None);
        assert!(system.contains("- Recent Steps: Not recorded"));
        assert!(system.contains("- Activity Level: moderate"));
    }

    #[test]
    fn predictions_need_a_week_of_history() {
        let logs: Vec<_> = (1..=6).map(|d| log_on(d, 8_000, 7.0)).collect();
        let report = predict(&logs);
        assert!(!report.sufficient_data);
        assert!(report.predictions.is_empty());
        assert!(report.message.is_some());
    }

    #[test]
    fn short_sleep_and_falling_steps_are_flagged() {
        let mut logs: Vec<_> = (1..=4).map(|d| log_on(d, 10_000, 7.0)).collect();
        logs.extend((5..=7).map(|d| log_on(d, 2_000, 5.0)));
        let report = predict(&logs);

        assert!(report.sufficient_data);
        let kinds: Vec<_> = report.predictions.iter().map(|p| p.kind).collect();
        assert_eq!(kinds, vec![PredictionKind::Sleep, PredictionKind::Activity]);
        assert_eq!(report.predictions[0].severity, Severity::High);
        assert!(report.predictions[0].message.contains("5.0 hours"));
    }

    #[test]
    fn steady_history_predicts_nothing() {
        let logs: Vec<_> = (1..=10).map(|d| log_on(d, 9_000, 7.5)).collect();
        assert!(predict(&logs).predictions.is_empty());
    }
}
