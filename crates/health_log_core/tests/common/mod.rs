//! In-memory implementations of the core ports for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use health_log_core::{
    AdvisorSettings, CompletionReply, CompletionRequest, CompletionService, DailyLog,
    DatabaseService, DayMutation, HealthService, PortError, PortResult, UserProfile,
};
use uuid::Uuid;

/// Keeps profiles and logs in maps. `mutate_day` holds the log map lock for the
/// whole read-modify-write, which is what makes it atomic.
#[derive(Default)]
pub struct MemoryStore {
    profiles: Mutex<HashMap<Uuid, UserProfile>>,
    logs: Mutex<HashMap<(Uuid, NaiveDate), DailyLog>>,
}

impl MemoryStore {
    pub fn log_count(&self) -> usize {
        self.logs.lock().unwrap().len()
    }
}

#[async_trait]
impl DatabaseService for MemoryStore {
    async fn get_or_create_profile(&self, user_id: Uuid) -> PortResult<UserProfile> {
        let mut profiles = self.profiles.lock().unwrap();
        Ok(profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::new(user_id))
            .clone())
    }

    async fn save_profile(&self, profile: &UserProfile) -> PortResult<UserProfile> {
        self.profiles
            .lock()
            .unwrap()
            .insert(profile.user_id, profile.clone());
        Ok(profile.clone())
    }

    async fn find_log(&self, user_id: Uuid, day: NaiveDate) -> PortResult<Option<DailyLog>> {
        Ok(self.logs.lock().unwrap().get(&(user_id, day)).cloned())
    }

    async fn mutate_day(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        mutation: DayMutation,
    ) -> PortResult<DailyLog> {
        let mut logs = self.logs.lock().unwrap();
        let mut log = logs
            .get(&(user_id, day))
            .cloned()
            .unwrap_or_else(|| DailyLog::empty(user_id, day, Utc::now()));
        mutation(&mut log)?;
        logs.insert((user_id, day), log.clone());
        Ok(log)
    }

    async fn logs_since(&self, user_id: Uuid, start: NaiveDate) -> PortResult<Vec<DailyLog>> {
        let mut found: Vec<DailyLog> = self
            .logs
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.user_id == user_id && l.date >= start)
            .cloned()
            .collect();
        found.sort_by_key(|l| l.date);
        Ok(found)
    }

    async fn list_logs(
        &self,
        user_id: Uuid,
        range: Option<(NaiveDate, NaiveDate)>,
        limit: usize,
    ) -> PortResult<Vec<DailyLog>> {
        let mut found: Vec<DailyLog> = self
            .logs
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.user_id == user_id)
            .filter(|l| range.map_or(true, |(start, end)| l.date >= start && l.date <= end))
            .cloned()
            .collect();
        found.sort_by(|a, b| b.date.cmp(&a.date));
        found.truncate(limit);
        Ok(found)
    }

    async fn latest_log(&self, user_id: Uuid) -> PortResult<Option<DailyLog>> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .values()
            .filter(|l| l.user_id == user_id)
            .max_by_key(|l| l.date)
            .cloned())
    }

    async fn clear_all_logs(&self) -> PortResult<u64> {
        let mut logs = self.logs.lock().unwrap();
        let count = logs.len() as u64;
        logs.clear();
        Ok(count)
    }
}

/// Replays a fixed reply and records every request it receives.
pub struct ScriptedCompletion {
    reply: PortResult<CompletionReply>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedCompletion {
    pub fn answering(text: &str) -> Self {
        Self {
            reply: Ok(CompletionReply {
                content: Some(text.to_string()),
                ..CompletionReply::default()
            }),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: Err(PortError::External("connection refused".to_string())),
            requests: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CompletionService for ScriptedCompletion {
    async fn complete(&self, request: &CompletionRequest) -> PortResult<CompletionReply> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply.clone()
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub completion: Arc<ScriptedCompletion>,
    pub service: Arc<HealthService>,
}

pub fn harness(completion: ScriptedCompletion) -> Harness {
    let store = Arc::new(MemoryStore::default());
    let completion = Arc::new(completion);
    let service = Arc::new(HealthService::new(
        store.clone(),
        completion.clone(),
        AdvisorSettings::default(),
    ));
    Harness {
        store,
        completion,
        service,
    }
}
