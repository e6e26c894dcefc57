//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. Profiles and daily logs are
//! kept as JSONB documents in PostgreSQL, one log row per user and day.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use health_log_core::domain::{DailyLog, UserProfile};
use health_log_core::ports::{DatabaseService, DayMutation, PortError, PortResult};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, warn};
use uuid::Uuid;

/// How many times a day mutation is attempted before a conflict is reported.
const MAX_WRITE_ATTEMPTS: u32 = 3;

/// SQLSTATE codes that mean "try the transaction again".
const RETRYABLE_CODES: [&str; 3] = [
    "40001", // serialization_failure
    "40P01", // deadlock_detected
    "23505", // unique_violation
];

/// Creates the user row with a fresh profile unless it already exists.
const INSERT_USER: &str = "INSERT INTO users (user_id, profile) VALUES ($1, $2) \
                           ON CONFLICT (user_id) DO NOTHING";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    /// One find-or-create, mutate and write cycle inside a single transaction.
    /// The row lock taken by `FOR UPDATE` serializes writers of the same day.
    async fn mutate_day_once(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        mutation: &DayMutation,
    ) -> PortResult<DailyLog> {
        let mut tx = self.pool.begin().await.map_err(to_port_error)?;

        ensure_user(&mut tx, user_id).await?;

        let fresh = DailyLog::empty(user_id, day, Utc::now());
        sqlx::query(
            "INSERT INTO daily_logs (id, user_id, log_date, data) VALUES ($1, $2, $3, $4) \
             ON CONFLICT (user_id, log_date) DO NOTHING",
        )
        .bind(fresh.id)
        .bind(user_id)
        .bind(day)
        .bind(Json(&fresh))
        .execute(&mut *tx)
        .await
        .map_err(to_port_error)?;

        let record: LogRecord = sqlx::query_as(
            "SELECT data FROM daily_logs WHERE user_id = $1 AND log_date = $2 FOR UPDATE",
        )
        .bind(user_id)
        .bind(day)
        .fetch_one(&mut *tx)
        .await
        .map_err(to_port_error)?;

        let mut log = record.to_domain();
        // An error here drops `tx`, which rolls the insert back as well.
        mutation(&mut log)?;

        sqlx::query(
            "UPDATE daily_logs SET data = $3, updated_at = NOW() \
             WHERE user_id = $1 AND log_date = $2",
        )
        .bind(user_id)
        .bind(day)
        .bind(Json(&log))
        .execute(&mut *tx)
        .await
        .map_err(to_port_error)?;

        tx.commit().await.map_err(to_port_error)?;
        Ok(log)
    }
}

//=========================================================================================
// Helpers
//=========================================================================================

/// Maps retryable SQLSTATEs to `PortError::Conflict`, everything else to `Unexpected`.
fn to_port_error(e: sqlx::Error) -> PortError {
    if let sqlx::Error::Database(db_err) = &e {
        let retryable = db_err
            .code()
            .map_or(false, |code| RETRYABLE_CODES.iter().any(|c| code == *c));
        if retryable {
            return PortError::Conflict(db_err.message().to_string());
        }
    }
    PortError::Unexpected(e.to_string())
}

async fn ensure_user(tx: &mut Transaction<'_, Postgres>, user_id: Uuid) -> PortResult<()> {
    sqlx::query(INSERT_USER)
        .bind(user_id)
        .bind(Json(UserProfile::new(user_id)))
        .execute(&mut **tx)
        .await
        .map_err(to_port_error)?;
    Ok(())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ProfileRecord {
    profile: Json<UserProfile>,
}
impl ProfileRecord {
    fn to_domain(self) -> UserProfile {
        self.profile.0
    }
}

#[derive(FromRow)]
struct LogRecord {
    data: Json<DailyLog>,
}
impl LogRecord {
    fn to_domain(self) -> DailyLog {
        self.data.0
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn get_or_create_profile(&self, user_id: Uuid) -> PortResult<UserProfile> {
        sqlx::query(INSERT_USER)
            .bind(user_id)
            .bind(Json(UserProfile::new(user_id)))
            .execute(&self.pool)
            .await
            .map_err(to_port_error)?;

        let record: ProfileRecord = sqlx::query_as("SELECT profile FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(to_port_error)?;

        Ok(record.to_domain())
    }

    async fn save_profile(&self, profile: &UserProfile) -> PortResult<UserProfile> {
        let record: ProfileRecord = sqlx::query_as(
            "INSERT INTO users (user_id, profile) VALUES ($1, $2) \
             ON CONFLICT (user_id) DO UPDATE SET profile = EXCLUDED.profile, updated_at = NOW() \
             RETURNING profile",
        )
        .bind(profile.user_id)
        .bind(Json(profile))
        .fetch_one(&self.pool)
        .await
        .map_err(to_port_error)?;

        Ok(record.to_domain())
    }

    async fn find_log(&self, user_id: Uuid, day: NaiveDate) -> PortResult<Option<DailyLog>> {
        let record: Option<LogRecord> =
            sqlx::query_as("SELECT data FROM daily_logs WHERE user_id = $1 AND log_date = $2")
                .bind(user_id)
                .bind(day)
                .fetch_optional(&self.pool)
                .await
                .map_err(to_port_error)?;

        Ok(record.map(LogRecord::to_domain))
    }

    async fn mutate_day(
        &self,
        user_id: Uuid,
        day: NaiveDate,
        mutation: DayMutation,
    ) -> PortResult<DailyLog> {
        let mut attempt = 1;
        loop {
            match self.mutate_day_once(user_id, day, &mutation).await {
                Err(PortError::Conflict(reason)) if attempt < MAX_WRITE_ATTEMPTS => {
                    warn!(
                        %user_id,
                        %day,
                        attempt,
                        "retrying daily log write after conflict: {}",
                        reason
                    );
                    attempt += 1;
                }
                result => {
                    debug!(
                        %user_id,
                        %day,
                        attempt,
                        ok = result.is_ok(),
                        "daily log write finished"
                    );
                    return result;
                }
            }
        }
    }

    async fn logs_since(&self, user_id: Uuid, start: NaiveDate) -> PortResult<Vec<DailyLog>> {
        let records: Vec<LogRecord> = sqlx::query_as(
            "SELECT data FROM daily_logs WHERE user_id = $1 AND log_date >= $2 \
             ORDER BY log_date ASC",
        )
        .bind(user_id)
        .bind(start)
        .fetch_all(&self.pool)
        .await
        .map_err(to_port_error)?;

        Ok(records.into_iter().map(LogRecord::to_domain).collect())
    }

    async fn list_logs(
        &self,
        user_id: Uuid,
        range: Option<(NaiveDate, NaiveDate)>,
        limit: usize,
    ) -> PortResult<Vec<DailyLog>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records: Vec<LogRecord> = match range {
            Some((start, end)) => sqlx::query_as(
                "SELECT data FROM daily_logs \
                 WHERE user_id = $1 AND log_date >= $2 AND log_date <= $3 \
                 ORDER BY log_date DESC LIMIT $4",
            )
            .bind(user_id)
            .bind(start)
            .bind(end)
            .bind(limit)
            .fetch_all(&self.pool)
            .await,
            None => sqlx::query_as(
                "SELECT data FROM daily_logs WHERE user_id = $1 ORDER BY log_date DESC LIMIT $2",
            )
            .bind(user_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await,
        }
        .map_err(to_port_error)?;

        Ok(records.into_iter().map(LogRecord::to_domain).collect())
    }

    async fn latest_log(&self, user_id: Uuid) -> PortResult<Option<DailyLog>> {
        let record: Option<LogRecord> = sqlx::query_as(
            "SELECT data FROM daily_logs WHERE user_id = $1 ORDER BY log_date DESC LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(to_port_error)?;

        Ok(record.map(LogRecord::to_domain))
    }

    async fn clear_all_logs(&self) -> PortResult<u64> {
        let result = sqlx::query("DELETE FROM daily_logs")
            .execute(&self.pool)
            .await
            .map_err(to_port_error)?;
        Ok(result.rows_affected())
    }
}
