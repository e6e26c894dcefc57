pub mod advisor;
pub mod analytics;
pub mod domain;
pub mod merge;
pub mod metrics;
pub mod ports;
pub mod scoring;
pub mod service;
pub mod validation;

pub use advisor::{AdvisorSettings, Prediction, PredictionReport};
pub use analytics::{AnalyticsReport, CalorieBalanceReport, TrendDirection, TrendSignals};
pub use domain::{
    ChatMessage, ChatRole, DailyLog, DailyLogUpdate, NewActivity, NewMeal, ProfileUpdate,
    UserProfile,
};
pub use ports::{
    CompletionReply, CompletionRequest, CompletionService, DatabaseService, DayMutation,
    PortError, PortResult,
};
pub use scoring::ScoringStrategy;
pub use service::{ChatReply, DailySummary, HealthScores, HealthService, LogQuery};
