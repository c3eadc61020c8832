//! Side effects that may only happen after a transaction has committed.

use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::cache::RedisCache;
use crate::jobs::JobQueue;
use crate::pubsub::hub::Hub;
use crate::pubsub::protocol::ContractEvent;
use crate::services::summary;

#[derive(Debug, Clone, PartialEq)]
pub enum AfterCommit {
    /// Fan an event out to the contract's subscribers.
    Publish(ContractEvent),
    /// Add a job. With an id the job is only added if that id is free.
    Enqueue {
        queue: &'static str,
        job_id: Option<String>,
        payload: serde_json::Value,
    },
    PromoteJob {
        queue: &'static str,
        job_id: String,
    },
    RetryJob {
        queue: &'static str,
        job_id: String,
    },
    /// Recompute the cached summary and publish it.
    RefreshSummary { contract_id: Uuid },
}

impl AfterCommit {
    pub fn enqueue<T: Serialize>(
        queue: &'static str,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(AfterCommit::Enqueue {
            queue,
            job_id: None,
            payload: serde_json::to_value(payload)?,
        })
    }

    pub fn enqueue_with_id<T: Serialize>(
        queue: &'static str,
        job_id: impl Into<String>,
        payload: &T,
    ) -> Result<Self, serde_json::Error> {
        Ok(AfterCommit::Enqueue {
            queue,
            job_id: Some(job_id.into()),
            payload: serde_json::to_value(payload)?,
        })
    }
}

/// Runs committed events. The request has already succeeded at this point, so
/// failures are logged and never surface to the caller.
pub struct EventDispatcher {
    db: DatabaseConnection,
    cache: Arc<RedisCache>,
    jobs: Arc<JobQueue>,
    hub: Arc<Hub>,
}

impl EventDispatcher {
    pub fn new(
        db: DatabaseConnection,
        cache: Arc<RedisCache>,
        jobs: Arc<JobQueue>,
        hub: Arc<Hub>,
    ) -> Self {
        Self {
            db,
            cache,
            jobs,
            hub,
        }
    }

    /// Run events in order. Summary refreshes are coalesced per contract and
    /// run last.
    pub async fn dispatch(&self, events: Vec<AfterCommit>) {
        let mut refresh: Vec<Uuid> = Vec::new();

        for event in events {
            match event {
                AfterCommit::Publish(event) => {
                    self.hub.publish(event).await;
                }
                AfterCommit::Enqueue {
                    queue,
                    job_id,
                    payload,
                } => {
                    let result = match job_id {
                        Some(id) => self.jobs.add_with_id(queue, &id, &payload).await,
                        None => self.jobs.add(queue, &payload).await,
                    };
                    if let Err(e) = result {
                        error!(queue, "Failed to enqueue job: {}", e);
                    }
                }
                AfterCommit::PromoteJob { queue, job_id } => {
                    if let Err(e) = self.jobs.promote(queue, &job_id).await {
                        error!(queue, job_id, "Failed to promote job: {}", e);
                    }
                }
                AfterCommit::RetryJob { queue, job_id } => {
                    if let Err(e) = self.jobs.retry(queue, &job_id).await {
                        error!(queue, job_id, "Failed to retry job: {}", e);
                    }
                }
                AfterCommit::RefreshSummary { contract_id } => {
                    if !refresh.contains(&contract_id) {
                        refresh.push(contract_id);
                    }
                }
            }
        }

        for contract_id in refresh {
            match summary::refresh(&self.db, &self.cache, contract_id).await {
                Ok(Some(summary)) => {
                    let delivered = self
                        .hub
                        .publish(ContractEvent::SummaryUpdated { summary })
                        .await;
                    info!(%contract_id, delivered, "contract summary refreshed");
                }
                Ok(None) => {}
                Err(e) => error!(%contract_id, "Failed to refresh contract summary: {}", e),
            }
        }
    }
}
