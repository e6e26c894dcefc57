//! crates/health_log_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{ChatMessage, DailyLog, UserProfile};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port and core operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Invalid value for {field}: {message}")]
    Validation { field: String, message: String },
    /// A concurrent write on the same record won the race; the write may be retried.
    #[error("Conflicting concurrent update: {0}")]
    Conflict(String),
    #[error("External service failure: {0}")]
    External(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        PortError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

/// A change applied to one day's log while the store holds that record exclusively.
///
/// It may be invoked more than once when the store retries after a conflict.
pub type DayMutation = Box<dyn Fn(&mut DailyLog) -> PortResult<()> + Send + Sync>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- User Profiles ---
    async fn get_or_create_profile(&self, user_id: Uuid) -> PortResult<UserProfile>;

    async fn save_profile(&self, profile: &UserProfile) -> PortResult<UserProfile>;

    // --- Daily Logs ---
    async fn find_log(&self, user_id: Uuid, day: NaiveDate) -> PortResult<Option<DailyLog>>;

    /// Finds or creates the log for (`user_id`, `day`), applies `mutation` and persists
    /// the result as one atomic step. Concurrent calls for the same key must serialize.
    async fn mutate_day(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        mutation: DayMutation,
    ) -> PortResult<DailyLog>;

    /// Logs with `date >= start`, oldest first.
    async fn logs_since(&self, user_id: Uuid, start: NaiveDate) -> PortResult<Vec<DailyLog>>;

    /// Logs with `start <= date <= end` when a range is given, newest first, at most `limit`.
    async fn list_logs(
        &self,
        user_id: Uuid,
        range: Option<(NaiveDate, NaiveDate)>,
        limit: usize,
    ) -> PortResult<Vec<DailyLog>>;

    async fn latest_log(&self, user_id: Uuid) -> PortResult<Option<DailyLog>>;

    /// Removes every daily log of every user. Returns the number of deleted logs.
    async fn clear_all_logs(&self) -> PortResult<u64>;
}

/// The raw reply of a chat completion, before the core picks the text to show.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionReply {
    pub content: Option<String>,
    pub reasoning: Option<String>,
    /// Summary of the first reasoning detail, when the provider returns one.
    pub reasoning_summary: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Sends the conversation to the language model and returns its raw reply.
    async fn complete(&self, request: &CompletionRequest) -> PortResult<CompletionReply>;
}
