//! Payout requests raised when a contract ends with full payment.
//!
//! A batch of unpaid payments is released by exactly one `release-payout`
//! job. The job id is written onto every payment of the batch before the job
//! exists, so a retried or concurrent request finds the job through the
//! payments instead of adding a second one.

use chrono::Utc;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::payments as payment_db;
use crate::errors::{ApiError, Result};
use crate::events::AfterCommit;
use crate::jobs::{JobAction, JobLookup, JobQueue, JobState, payloads, queues, reconcile_action};
use crate::models::payments;
use crate::pubsub::protocol::ContractEvent;
use crate::tx::RequestTx;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleasePlan {
    /// Every payment is already paid out.
    Nothing,
    /// No job covers the batch yet.
    NewJob { payments: Vec<Uuid> },
    /// Some payments already point at these jobs.
    Reconcile {
        payments: Vec<Uuid>,
        job_ids: Vec<String>,
    },
}

/// Decide how to release `unpaid`.
pub fn plan_release(unpaid: &[payments::Model]) -> ReleasePlan {
    if unpaid.is_empty() {
        return ReleasePlan::Nothing;
    }

    let payments: Vec<Uuid> = unpaid.iter().map(|p| p.id).collect();
    let job_ids: BTreeSet<&str> = unpaid
        .iter()
        .filter_map(|p| p.external_job_id.as_deref())
        .collect();

    if job_ids.is_empty() {
        ReleasePlan::NewJob { payments }
    } else {
        ReleasePlan::Reconcile {
            payments,
            job_ids: job_ids.into_iter().map(str::to_string).collect(),
        }
    }
}

/// A batch may not straddle two release jobs: the payments attached to the
/// existing jobs must be exactly the requested ones.
pub fn check_batch(requested: &[Uuid], attached: &[Uuid]) -> Result<()> {
    let requested: HashSet<&Uuid> = requested.iter().collect();
    let attached: HashSet<&Uuid> = attached.iter().collect();

    if requested == attached {
        Ok(())
    } else {
        Err(ApiError::validation("You must release only requested tasks"))
    }
}

/// Follow-up for an existing job of the batch. A job that vanished from the
/// queue is added again under its id.
pub fn reconcile_event(
    job_id: &str,
    state: Option<JobState>,
    payments: Vec<Uuid>,
) -> Result<Option<AfterCommit>> {
    let Some(state) = state else {
        let event = AfterCommit::enqueue_with_id(
            queues::RELEASE_PAYOUT,
            job_id,
            &payloads::ReleasePayout { payments },
        )?;
        return Ok(Some(event));
    };

    Ok(reconcile_action(state).map(|action| match action {
        JobAction::Promote => AfterCommit::PromoteJob {
            queue: queues::RELEASE_PAYOUT,
            job_id: job_id.to_string(),
        },
        JobAction::Retry => AfterCommit::RetryJob {
            queue: queues::RELEASE_PAYOUT,
            job_id: job_id.to_string(),
        },
    }))
}

/// Request payout of every unpaid payment of the contract, signed by
/// `role_id`. Returns the payments this call claimed.
pub async fn release_payments<J: JobLookup>(
    tx: &mut RequestTx,
    jobs: &J,
    contract_id: Uuid,
    role_id: Uuid,
    signature: String,
) -> Result<Vec<Uuid>> {
    let unpaid = payment_db::get_unpaid_payments(tx.conn(), contract_id).await?;
    let plan = plan_release(&unpaid);
    if plan == ReleasePlan::Nothing {
        debug!(%contract_id, "no unpaid payments to release");
        return Ok(Vec::new());
    }

    let requested: Vec<Uuid> = unpaid.iter().map(|p| p.id).collect();
    let esign = payment_db::insert_esign(tx.conn(), role_id, signature).await?;
    let claimed: Vec<Uuid> =
        payment_db::claim_for_payout(tx.conn(), requested.clone(), esign.id, Utc::now())
            .await?
            .into_iter()
            .map(|p| p.id)
            .collect();

    for payment_id in &claimed {
        tx.defer(AfterCommit::Publish(ContractEvent::PaymentsUpdated {
            contract_id,
            payment_id: *payment_id,
        }));
    }

    match plan {
        ReleasePlan::Nothing => {}
        ReleasePlan::NewJob { payments } => {
            let job_id = JobQueue::next_id();
            payment_db::set_external_job_id(tx.conn(), payments.clone(), &job_id).await?;

            info!(%contract_id, job_id, payments = payments.len(), "payout job requested");
            tx.defer(AfterCommit::enqueue_with_id(
                queues::RELEASE_PAYOUT,
                job_id,
                &payloads::ReleasePayout { payments },
            )?);
        }
        ReleasePlan::Reconcile { payments, job_ids } => {
            let attached = payment_db::get_payments_by_job_ids(tx.conn(), job_ids.clone()).await?;
            let attached_ids: Vec<Uuid> = attached.iter().map(|p| p.id).collect();
            check_batch(&payments, &attached_ids)?;

            for job_id in job_ids {
                let state = jobs.job_state(queues::RELEASE_PAYOUT, &job_id).await?;
                let job_payments = attached
                    .iter()
                    .filter(|p| p.external_job_id.as_deref() == Some(job_id.as_str()))
                    .map(|p| p.id)
                    .collect();

                debug!(%contract_id, job_id, ?state, "reconciling payout job");
                if let Some(event) = reconcile_event(&job_id, state, job_payments)? {
                    tx.defer(event);
                }
            }
        }
    }

    tx.defer(AfterCommit::RefreshSummary { contract_id });
    Ok(claimed)
}
