//! Payout release planning and the full-payment end of a contract, run against
//! a mock Postgres connection.
mod common;

use redis::RedisResult;
use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult, Statement, Value};
use uuid::Uuid;

use sitework_backend::billing::BillingClient;
use sitework_backend::config::BillingConfig;
use sitework_backend::errors::ApiError;
use sitework_backend::events::AfterCommit;
use sitework_backend::jobs::{JobLookup, JobState, payloads::ReleasePayout, queues};
use sitework_backend::models::contracts::{EndContract, EsignInput, Status};
use sitework_backend::pubsub::protocol::ContractEvent;
use sitework_backend::services::contracts::end_contract;
use sitework_backend::services::payouts::{
    ReleasePlan, check_batch, plan_release, reconcile_event,
};
use sitework_backend::tx::RequestTx;

use common::{completion, contract, esign, home_owner, payment, pro};

/// Job store answering every lookup with one fixed state.
struct FixedJobs(Option<JobState>);

impl JobLookup for FixedJobs {
    async fn job_state(&self, _queue: &str, _id: &str) -> RedisResult<Option<JobState>> {
        Ok(self.0)
    }
}

fn billing() -> BillingClient {
    BillingClient::new(&BillingConfig {
        secret_key: "sk_test".to_string(),
        monthly_price_id: "price_test".to_string(),
        api_base: "http://127.0.0.1:1".to_string(),
    })
}

fn full_payment() -> EndContract {
    EndContract {
        esign: Some(EsignInput {
            signature: "J. Doe".to_string(),
        }),
        reason: "Work is done".to_string(),
        partial_payment: false,
    }
}

#[test]
fn test_plan_nothing_when_all_paid() {
    assert_eq!(plan_release(&[]), ReleasePlan::Nothing);
}

#[test]
fn test_plan_new_job_without_existing_jobs() {
    let (a, b) = (payment(), payment());
    assert_eq!(
        plan_release(&[a.clone(), b.clone()]),
        ReleasePlan::NewJob {
            payments: vec![a.id, b.id]
        }
    );
}

#[test]
fn test_plan_reconcile_collects_distinct_jobs() {
    let mut a = payment();
    a.external_job_id = Some("job-1".to_string());
    let mut b = payment();
    b.external_job_id = Some("job-1".to_string());
    let c = payment();

    assert_eq!(
        plan_release(&[a.clone(), b.clone(), c.clone()]),
        ReleasePlan::Reconcile {
            payments: vec![a.id, b.id, c.id],
            job_ids: vec!["job-1".to_string()],
        }
    );
}

#[test]
fn test_batch_must_match_exactly() {
    let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());

    assert!(check_batch(&[a, b], &[b, a]).is_ok());
    assert!(matches!(
        check_batch(&[a, b], &[a, b, c]),
        Err(ApiError::Validation(_))
    ));
    assert!(matches!(
        check_batch(&[a, b, c], &[a, b]),
        Err(ApiError::Validation(_))
    ));
}

#[test]
fn test_reconcile_event_per_job_state() {
    let payments = vec![Uuid::new_v4()];

    for state in [JobState::Waiting, JobState::Delayed] {
        assert_eq!(
            reconcile_event("job-1", Some(state), payments.clone()).unwrap(),
            Some(AfterCommit::PromoteJob {
                queue: queues::RELEASE_PAYOUT,
                job_id: "job-1".to_string(),
            })
        );
    }
    assert_eq!(
        reconcile_event("job-1", Some(JobState::Failed), payments.clone()).unwrap(),
        Some(AfterCommit::RetryJob {
            queue: queues::RELEASE_PAYOUT,
            job_id: "job-1".to_string(),
        })
    );
    for state in [JobState::Active, JobState::Completed] {
        assert_eq!(
            reconcile_event("job-1", Some(state), payments.clone()).unwrap(),
            None
        );
    }
}

#[test]
fn test_vanished_job_is_added_again_under_its_id() {
    let payments = vec![Uuid::new_v4()];

    match reconcile_event("job-1", None, payments.clone()).unwrap() {
        Some(AfterCommit::Enqueue {
            queue,
            job_id,
            payload,
        }) => {
            assert_eq!(queue, queues::RELEASE_PAYOUT);
            assert_eq!(job_id.as_deref(), Some("job-1"));
            let payload: ReleasePayout = serde_json::from_value(payload).unwrap();
            assert_eq!(payload.payments, payments);
        }
        other => panic!("expected enqueue, got {other:?}"),
    }
}

#[tokio::test]
async fn test_full_payment_end_enqueues_one_job_for_all_payments() {
    let owner = home_owner();
    let partner = pro();
    let hired = contract(&owner, &partner, Status::Hired);
    let mut ended = hired.clone();
    ended.status = Status::Completed;

    let (pm1, pm2) = (payment(), payment());
    let signature = esign(owner.id);
    let claimed: Vec<_> = [&pm1, &pm2]
        .into_iter()
        .map(|p| {
            let mut p = p.clone();
            p.esign_id = Some(signature.id);
            p.payout_requested_at = Some(signature.created_at);
            p
        })
        .collect();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![hired.clone()]])
        .append_query_results([vec![ended.clone()]])
        .append_query_results([vec![pm1.clone(), pm2.clone()]])
        .append_query_results([vec![signature.clone()]])
        .append_query_results([claimed])
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 2,
        }])
        .append_query_results([vec![completion(hired.id, Some(owner.id))]])
        .into_connection();

    let mut tx = RequestTx::begin(&db).await.unwrap();
    let result = end_contract(
        &mut tx,
        &FixedJobs(None),
        &billing(),
        owner,
        hired.id,
        full_payment(),
    )
    .await
    .expect("owner can end with full payment");

    assert_eq!(result.contract.status, Status::Completed);
    assert_eq!(result.released, vec![pm1.id, pm2.id]);

    let jobs: Vec<_> = tx
        .pending()
        .iter()
        .filter_map(|event| match event {
            AfterCommit::Enqueue {
                queue,
                job_id,
                payload,
            } if *queue == queues::RELEASE_PAYOUT => Some((job_id.clone(), payload.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(jobs.len(), 1, "exactly one release job");

    let (job_id, payload) = &jobs[0];
    assert!(job_id.is_some(), "job id is chosen before enqueueing");
    let payload: ReleasePayout = serde_json::from_value(payload.clone()).unwrap();
    assert_eq!(payload.payments, vec![pm1.id, pm2.id]);

    let published: Vec<_> = tx
        .pending()
        .iter()
        .filter_map(|event| match event {
            AfterCommit::Publish(ContractEvent::PaymentsUpdated { payment_id, .. }) => {
                Some(*payment_id)
            }
            _ => None,
        })
        .collect();
    assert_eq!(published, vec![pm1.id, pm2.id]);
    assert!(tx.pending().contains(&AfterCommit::RefreshSummary {
        contract_id: hired.id
    }));
    tx.commit().await.unwrap();

    let log = db.into_transaction_log();
    let statements: Vec<&Statement> = log.iter().flat_map(|t| t.statements()).collect();
    let values = |stmt: &Statement| stmt.values.clone().map(|v| v.0).unwrap_or_default();

    let claim = statements
        .iter()
        .find(|s| s.sql.starts_with(r#"UPDATE "payments""#) && s.sql.contains("IS NULL"))
        .expect("conditional claim");
    assert!(claim.sql.contains(r#""payout_requested_at" IS NULL"#));
    assert!(claim.sql.contains("RETURNING"));

    let insert = statements
        .iter()
        .find(|s| s.sql.starts_with(r#"INSERT INTO "contract_completions""#))
        .expect("completion row");
    let inserted = values(*insert);
    assert!(inserted.contains(&Value::String(Some("user".to_string()))));
    assert!(inserted.contains(&Value::Bool(Some(false))));
    assert!(inserted.contains(&hired.id.into()));
    assert!(inserted.contains(&owner.id.into()));
}

#[tokio::test]
async fn test_repeated_end_retries_the_failed_job() {
    let owner = home_owner();
    let partner = pro();
    let hired = contract(&owner, &partner, Status::Hired);
    let mut ended = hired.clone();
    ended.status = Status::Completed;

    let mut pm1 = payment();
    pm1.external_job_id = Some("job-1".to_string());
    pm1.payout_requested_at = Some(common::day(10));
    let mut pm2 = pm1.clone();
    pm2.id = Uuid::new_v4();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![hired.clone()]])
        .append_query_results([vec![ended]])
        .append_query_results([vec![pm1.clone(), pm2.clone()]])
        .append_query_results([vec![esign(owner.id)]])
        // Both payments were claimed by the earlier request.
        .append_query_results([Vec::<sitework_backend::models::payments::Model>::new()])
        .append_query_results([vec![pm1.clone(), pm2.clone()]])
        .append_query_results([vec![completion(hired.id, Some(owner.id))]])
        .into_connection();

    let mut tx = RequestTx::begin(&db).await.unwrap();
    let result = end_contract(
        &mut tx,
        &FixedJobs(Some(JobState::Failed)),
        &billing(),
        owner,
        hired.id,
        full_payment(),
    )
    .await
    .expect("reconciles the existing job");

    assert!(result.released.is_empty());
    assert!(tx.pending().contains(&AfterCommit::RetryJob {
        queue: queues::RELEASE_PAYOUT,
        job_id: "job-1".to_string(),
    }));
    assert!(!tx.pending().iter().any(|event| matches!(
        event,
        AfterCommit::Enqueue { queue, .. } if *queue == queues::RELEASE_PAYOUT
    )));
}

#[tokio::test]
async fn test_batch_straddling_jobs_is_rejected() {
    let owner = home_owner();
    let partner = pro();
    let hired = contract(&owner, &partner, Status::Hired);
    let mut ended = hired.clone();
    ended.status = Status::Completed;

    let mut pm1 = payment();
    pm1.external_job_id = Some("job-1".to_string());
    let pm2 = payment();
    // A payment of another batch shares the job.
    let mut stray = payment();
    stray.external_job_id = Some("job-1".to_string());

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![hired.clone()]])
        .append_query_results([vec![ended]])
        .append_query_results([vec![pm1.clone(), pm2.clone()]])
        .append_query_results([vec![esign(owner.id)]])
        .append_query_results([vec![pm2.clone()]])
        .append_query_results([vec![pm1.clone(), stray]])
        .into_connection();

    let mut tx = RequestTx::begin(&db).await.unwrap();
    let result = end_contract(
        &mut tx,
        &FixedJobs(Some(JobState::Waiting)),
        &billing(),
        owner,
        hired.id,
        full_payment(),
    )
    .await;

    match result {
        Err(ApiError::Validation(message)) => {
            assert_eq!(message, "You must release only requested tasks")
        }
        other => panic!("expected validation error, got {:?}", other.map(|e| e.contract.id)),
    }
}

#[tokio::test]
async fn test_pro_cannot_end_with_full_payment() {
    // Refused before the contract is even loaded.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let mut tx = RequestTx::begin(&db).await.unwrap();

    let result = end_contract(
        &mut tx,
        &FixedJobs(None),
        &billing(),
        pro(),
        Uuid::new_v4(),
        full_payment(),
    )
    .await;

    assert!(matches!(result, Err(ApiError::Forbidden { .. })));
}
