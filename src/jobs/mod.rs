//! Redis-backed named job queues.
//!
//! Workers live in a separate service; this side only adds jobs and nudges
//! existing ones. A job is a JSON record at `jobs:<queue>:<id>`; waiting ids
//! sit in the `jobs:<queue>:waiting` list (workers pop from the right),
//! delayed ids in the `jobs:<queue>:delayed` sorted set and failed ids in the
//! `jobs:<queue>:failed` set.

pub mod payloads;

use chrono::{DateTime, Utc};
use redis::{RedisResult, aio::ConnectionManager};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub mod queues {
    pub const RELEASE_PAYOUT: &str = "release-payout";
    pub const CHECK_SUBSCRIPTION_PAID: &str = "check-subscription-paid";
    pub const CREATE_CONTRACT_ACTIVITY: &str = "create-contract-activity";
    pub const FILE_CREATED: &str = "file-created";
    pub const NOTIFICATIONS: &str = "notifications";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Waiting,
    Delayed,
    Active,
    Completed,
    Failed,
}

/// What to do with an existing job when its batch is requested again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    Promote,
    Retry,
}

/// Pending jobs are pushed to the front, failed jobs are retried, running or
/// finished jobs are left alone.
pub fn reconcile_action(state: JobState) -> Option<JobAction> {
    match state {
        JobState::Waiting | JobState::Delayed => Some(JobAction::Promote),
        JobState::Failed => Some(JobAction::Retry),
        JobState::Active | JobState::Completed => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub queue: String,
    pub state: JobState,
    pub payload: serde_json::Value,
    pub attempts: u32,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone)]
pub struct JobQueue {
    connection: ConnectionManager,
}

fn job_key(queue: &str, id: &str) -> String {
    format!("jobs:{queue}:{id}")
}

fn waiting_key(queue: &str) -> String {
    format!("jobs:{queue}:waiting")
}

fn delayed_key(queue: &str) -> String {
    format!("jobs:{queue}:delayed")
}

fn failed_key(queue: &str) -> String {
    format!("jobs:{queue}:failed")
}

impl JobQueue {
    pub fn new(connection: ConnectionManager) -> Self {
        Self { connection }
    }

    /// Allocate a fresh job id. Ids are chosen by the caller so they can be
    /// persisted before the job is enqueued.
    pub fn next_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub async fn add<T: Serialize>(&self, queue: &str, payload: &T) -> RedisResult<JobRecord> {
        self.add_with_id(queue, &Self::next_id(), payload).await
    }

    /// Enqueue under a known id. Adding an id that already exists returns the
    /// existing job untouched.
    pub async fn add_with_id<T: Serialize>(
        &self,
        queue: &str,
        id: &str,
        payload: &T,
    ) -> RedisResult<JobRecord> {
        let payload = serde_json::to_value(payload).map_err(|e| {
            redis::RedisError::from((
                redis::ErrorKind::TypeError,
                "Serialization error",
                e.to_string(),
            ))
        })?;

        let record = JobRecord {
            id: id.to_string(),
            queue: queue.to_string(),
            state: JobState::Waiting,
            payload,
            attempts: 0,
            created_at: Utc::now(),
        };

        let created: Option<String> = redis::cmd("SET")
            .arg(job_key(queue, id))
            .arg(encode(&record)?)
            .arg("NX")
            .query_async(&mut self.connection.clone())
            .await?;

        if created.is_none() {
            return match self.get(queue, id).await? {
                Some(existing) => Ok(existing),
                None => Ok(record),
            };
        }

        let _: () = redis::cmd("LPUSH")
            .arg(waiting_key(queue))
            .arg(id)
            .query_async(&mut self.connection.clone())
            .await?;

        info!(queue, job_id = id, "job enqueued");
        Ok(record)
    }

    pub async fn get(&self, queue: &str, id: &str) -> RedisResult<Option<JobRecord>> {
        let value: Option<String> = redis::cmd("GET")
            .arg(job_key(queue, id))
            .query_async(&mut self.connection.clone())
            .await?;

        value.map(|v| decode(&v)).transpose()
    }

    pub async fn state(&self, queue: &str, id: &str) -> RedisResult<Option<JobState>> {
        Ok(self.get(queue, id).await?.map(|job| job.state))
    }

    /// Move a waiting or delayed job to the front of the waiting list.
    pub async fn promote(&self, queue: &str, id: &str) -> RedisResult<bool> {
        let Some(mut record) = self.get(queue, id).await? else {
            return Ok(false);
        };
        if !matches!(record.state, JobState::Waiting | JobState::Delayed) {
            return Ok(false);
        }

        record.state = JobState::Waiting;
        let _: () = redis::pipe()
            .atomic()
            .cmd("ZREM")
            .arg(delayed_key(queue))
            .arg(id)
            .ignore()
            .cmd("LREM")
            .arg(waiting_key(queue))
            .arg(0)
            .arg(id)
            .ignore()
            .cmd("RPUSH")
            .arg(waiting_key(queue))
            .arg(id)
            .ignore()
            .cmd("SET")
            .arg(job_key(queue, id))
            .arg(encode(&record)?)
            .ignore()
            .query_async(&mut self.connection.clone())
            .await?;

        info!(queue, job_id = id, "job promoted");
        Ok(true)
    }

    /// Put a failed job back in the waiting list.
    pub async fn retry(&self, queue: &str, id: &str) -> RedisResult<bool> {
        let Some(mut record) = self.get(queue, id).await? else {
            return Ok(false);
        };
        if record.state != JobState::Failed {
            return Ok(false);
        }

        record.state = JobState::Waiting;
        record.attempts += 1;
        let _: () = redis::pipe()
            .atomic()
            .cmd("SREM")
            .arg(failed_key(queue))
            .arg(id)
            .ignore()
            .cmd("LPUSH")
            .arg(waiting_key(queue))
            .arg(id)
            .ignore()
            .cmd("SET")
            .arg(job_key(queue, id))
            .arg(encode(&record)?)
            .ignore()
            .query_async(&mut self.connection.clone())
            .await?;

        info!(queue, job_id = id, attempts = record.attempts, "job retried");
        Ok(true)
    }
}

fn encode(record: &JobRecord) -> RedisResult<String> {
    serde_json::to_string(record).map_err(|e| {
        redis::RedisError::from((
            redis::ErrorKind::TypeError,
            "Serialization error",
            e.to_string(),
        ))
    })
}

fn decode(value: &str) -> RedisResult<JobRecord> {
    serde_json::from_str(value).map_err(|e| {
        redis::RedisError::from((
            redis::ErrorKind::TypeError,
            "Deserialization error",
            e.to_string(),
        ))
    })
}

/// Job state lookups made while a request transaction is still open.
#[allow(async_fn_in_trait)]
pub trait JobLookup {
    async fn job_state(&self, queue: &str, id: &str) -> RedisResult<Option<JobState>>;
}

impl JobLookup for JobQueue {
    async fn job_state(&self, queue: &str, id: &str) -> RedisResult<Option<JobState>> {
        self.state(queue, id).await
    }
}

/// Wrapper type for Actix-web app data
pub type JobQueueData = Arc<JobQueue>;
