//! Contract summary: money, dates and progress rolled up from phases and tasks.
//!
//! [`fold_summary`] is pure; the loaders below only gather its input.

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, DbErr};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

use crate::auth::access::{self, AccessOptions, ActingRole};
use crate::cache::{RedisCache, keys};
use crate::db::{contracts as contract_db, payments as payment_db, phases as phase_db};
use crate::db::summary as summary_db;
use crate::errors::Result;
use crate::models::change_orders::{self, ChangeOrderStatus};
use crate::models::tasks::TaskStatus;
use crate::models::{
    contracts, payment_operations, payments, phases, task_versions, tasks, view_points,
};

/// Where the money for a task (or a whole phase) stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    None,
    Funded,
    Requested,
    Released,
}

impl PaymentStatus {
    pub fn of(payment: Option<&payments::Model>) -> Self {
        match payment {
            None => PaymentStatus::None,
            Some(p) if p.payout_id.is_some() => PaymentStatus::Released,
            Some(p) if p.payout_requested_at.is_some() => PaymentStatus::Requested,
            Some(_) => PaymentStatus::Funded,
        }
    }
}

/// A task with what the fold needs about it.
#[derive(Debug, Clone)]
pub struct TaskRow {
    pub task: tasks::Model,
    pub first_version: Option<task_versions::Model>,
    pub payment: Option<payments::Model>,
    /// Charge operation that funded the payment, if any.
    pub charge: Option<payment_operations::Model>,
}

impl TaskRow {
    pub fn created_by_change_order(&self) -> bool {
        self.first_version
            .as_ref()
            .is_some_and(|v| v.change_order_id.is_some())
    }

    /// Total as originally agreed; zero for tasks a change order added.
    pub fn initial_total(&self) -> i64 {
        if self.created_by_change_order() {
            return 0;
        }
        self.first_version
            .as_ref()
            .map_or_else(|| self.task.total(), task_versions::Model::total)
    }

    pub fn initial_end_date(&self) -> DateTime<Utc> {
        self.first_version
            .as_ref()
            .map_or(self.task.end_date, |v| v.end_date)
    }

    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::of(self.payment.as_ref())
    }

    pub fn funded_amount(&self) -> i64 {
        self.charge
            .as_ref()
            .filter(|op| op.succeeded())
            .map_or(0, |op| op.amount)
    }
}

#[derive(Debug, Clone)]
pub struct SummaryInput {
    pub contract: contracts::Model,
    pub phases: Vec<phases::Model>,
    pub tasks: Vec<TaskRow>,
    pub change_orders: Vec<change_orders::Model>,
    pub view_points: Vec<view_points::Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: Uuid,
    pub name: String,
    pub status: TaskStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub total: i64,
    pub initial_total: i64,
    pub payment_status: PaymentStatus,
}

impl From<&TaskRow> for TaskSummary {
    fn from(row: &TaskRow) -> Self {
        Self {
            id: row.task.id,
            name: row.task.name.clone(),
            status: row.task.status,
            start_date: row.task.start_date,
            end_date: row.task.end_date,
            total: row.task.total(),
            initial_total: row.initial_total(),
            payment_status: row.payment_status(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSummary {
    pub id: Uuid,
    pub name: String,
    pub order: i32,
    pub total: i64,
    pub initial_total: i64,
    pub actual_cost: Option<i64>,
    pub funded: i64,
    pub todo: u32,
    pub doing: u32,
    pub done: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub tasks: Vec<TaskSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenPage {
    pub role_id: Uuid,
    pub view_point: String,
    pub seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractSummary {
    pub contract_id: Uuid,
    pub owner_id: Uuid,
    pub partner_id: Uuid,
    pub total: i64,
    pub initial_total: i64,
    pub funded: i64,
    pub target_start_date: Option<DateTime<Utc>>,
    pub target_end_date: Option<DateTime<Utc>>,
    pub initial_end_date: Option<DateTime<Utc>>,
    pub open_change_orders: u32,
    pub approved_change_orders: u32,
    pub phases: Vec<PhaseSummary>,
    pub seen_pages: Vec<SeenPage>,
}

/// Roll one phase up. Phases without tasks have no summary.
fn fold_phase(phase: &phases::Model, rows: &[&TaskRow]) -> Option<PhaseSummary> {
    let start_date = rows.iter().map(|r| r.task.start_date).min()?;
    let end_date = rows.iter().map(|r| r.task.end_date).max()?;

    let count = |status: TaskStatus| rows.iter().filter(|r| r.task.status == status).count() as u32;

    let first = rows.first().map(|r| r.payment_status())?;
    let payment_status = if first != PaymentStatus::None
        && rows.iter().all(|r| r.payment_status() == first)
    {
        first
    } else {
        PaymentStatus::None
    };

    let actual_cost = match (
        phase.actual_material_cost,
        phase.actual_labor_cost,
        phase.actual_other_cost,
    ) {
        (None, None, None) => None,
        (material, labor, other) => {
            Some(material.unwrap_or(0) + labor.unwrap_or(0) + other.unwrap_or(0))
        }
    };

    let tasks: Vec<TaskSummary> = rows.iter().map(|r| TaskSummary::from(*r)).collect();

    Some(PhaseSummary {
        id: phase.id,
        name: phase.name.clone(),
        order: phase.order,
        total: tasks.iter().map(|t| t.total).sum(),
        initial_total: tasks.iter().map(|t| t.initial_total).sum(),
        actual_cost,
        funded: rows.iter().map(|r| r.funded_amount()).sum(),
        todo: count(TaskStatus::Todo),
        doing: count(TaskStatus::Doing),
        done: count(TaskStatus::Done),
        start_date,
        end_date,
        payment_status,
        tasks,
    })
}

pub fn fold_summary(input: &SummaryInput) -> ContractSummary {
    let mut by_phase: HashMap<Uuid, Vec<&TaskRow>> = HashMap::new();
    for row in &input.tasks {
        by_phase.entry(row.task.phase_id).or_default().push(row);
    }

    let mut ordered: Vec<&phases::Model> = input.phases.iter().collect();
    ordered.sort_by_key(|p| p.order);

    let phases: Vec<PhaseSummary> = ordered
        .into_iter()
        .filter_map(|phase| {
            let rows = by_phase.get(&phase.id)?;
            fold_phase(phase, rows)
        })
        .collect();

    let count_orders = |status: ChangeOrderStatus| {
        input
            .change_orders
            .iter()
            .filter(|co| co.status == status)
            .count() as u32
    };

    ContractSummary {
        contract_id: input.contract.id,
        owner_id: input.contract.owner_id,
        partner_id: input.contract.partner_id,
        total: phases.iter().map(|p| p.total).sum(),
        initial_total: phases.iter().map(|p| p.initial_total).sum(),
        funded: phases.iter().map(|p| p.funded).sum(),
        target_start_date: phases.iter().map(|p| p.start_date).max(),
        target_end_date: phases.iter().map(|p| p.end_date).min(),
        initial_end_date: input
            .tasks
            .iter()
            .filter(|r| !r.created_by_change_order())
            .map(TaskRow::initial_end_date)
            .max(),
        open_change_orders: count_orders(ChangeOrderStatus::Open),
        approved_change_orders: count_orders(ChangeOrderStatus::Approved),
        seen_pages: input
            .view_points
            .iter()
            .map(|vp| SeenPage {
                role_id: vp.role_id,
                view_point: vp.view_point.clone(),
                seen_at: vp.seen_at,
            })
            .collect(),
        phases,
    }
}

/// Gather every row the summary of `contract` depends on.
pub async fn load_input<C: ConnectionTrait>(
    db: &C,
    contract: contracts::Model,
) -> core::result::Result<SummaryInput, DbErr> {
    let phases = phase_db::get_phases(db, contract.id).await?;
    let tasks =
        phase_db::get_tasks_by_phases(db, phases.iter().map(|p| p.id).collect()).await?;

    let mut first_versions: HashMap<Uuid, task_versions::Model> = HashMap::new();
    for version in phase_db::get_task_versions(db, tasks.iter().map(|t| t.id).collect()).await? {
        first_versions.entry(version.task_id).or_insert(version);
    }

    let mut payments: HashMap<Uuid, payments::Model> =
        payment_db::get_payments_by_ids(db, tasks.iter().filter_map(|t| t.payment_id).collect())
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

    let mut charges: HashMap<Uuid, payment_operations::Model> = payment_db::get_operations_by_ids(
        db,
        payments.values().filter_map(|p| p.charge_id).collect(),
    )
    .await?
    .into_iter()
    .map(|op| (op.id, op))
    .collect();

    let tasks = tasks
        .into_iter()
        .map(|task| {
            let payment = task.payment_id.and_then(|id| payments.remove(&id));
            let charge = payment
                .as_ref()
                .and_then(|p| p.charge_id)
                .and_then(|id| charges.remove(&id));
            TaskRow {
                first_version: first_versions.remove(&task.id),
                payment,
                charge,
                task,
            }
        })
        .collect();

    Ok(SummaryInput {
        change_orders: summary_db::get_change_orders(db, contract.id).await?,
        view_points: summary_db::get_view_points(db, contract.id).await?,
        contract,
        phases,
        tasks,
    })
}

/// Compute the summary from the store. `None` when the contract is gone.
pub async fn calculate<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
) -> core::result::Result<Option<ContractSummary>, DbErr> {
    let Some(contract) = contract_db::get_contract_by_id(db, contract_id).await? else {
        return Ok(None);
    };
    let input = load_input(db, contract).await?;
    Ok(Some(fold_summary(&input)))
}

/// Live summary for a member of the contract.
pub async fn get_summary<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    actor: ActingRole,
) -> Result<ContractSummary> {
    let contract = access::authorize(db, contract_id, actor, AccessOptions::read()).await?;
    let input = load_input(db, contract).await?;
    Ok(fold_summary(&input))
}

/// Cached summary; computed and stored on a miss. Cache failures fall back
/// to the store.
pub async fn cached_summary<C: ConnectionTrait>(
    db: &C,
    cache: &RedisCache,
    contract_id: Uuid,
) -> Result<Option<ContractSummary>> {
    let key = keys::contract_summary(contract_id);

    match cache.get::<ContractSummary>(&key).await {
        Ok(Some(summary)) => return Ok(Some(summary)),
        Ok(None) => {}
        Err(e) => warn!(%contract_id, "Cache error: {}", e),
    }

    let Some(summary) = calculate(db, contract_id).await? else {
        return Ok(None);
    };
    if let Err(e) = cache.set(&key, &summary).await {
        warn!(%contract_id, "Failed to cache contract summary: {}", e);
    }
    Ok(Some(summary))
}

/// Drop the cached entry, recompute it and store the fresh value.
pub async fn refresh<C: ConnectionTrait>(
    db: &C,
    cache: &RedisCache,
    contract_id: Uuid,
) -> Result<Option<ContractSummary>> {
    let key = keys::contract_summary(contract_id);
    cache.delete(&key).await?;

    let Some(summary) = calculate(db, contract_id).await? else {
        return Ok(None);
    };
    cache.set(&key, &summary).await?;
    Ok(Some(summary))
}
