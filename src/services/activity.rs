//! "Seen" markers for contract activity.

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::auth::access::{self, AccessOptions, ActingRole};
use crate::db::activity as activity_db;
use crate::errors::{ApiError, Result};
use crate::models::activity_seen::{self, SeenActivityInput};
use crate::models::contract_activities::ActivityType;
use crate::tx::RequestTx;

/// The one kind of subject a seen request marks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeenCategory {
    ChangeOrders(Vec<Uuid>),
    Payments(Vec<Uuid>),
    Decisions(Vec<Uuid>),
    Task(Uuid),
}

impl SeenCategory {
    /// Exactly one field of the input must be set and non-empty.
    pub fn classify(input: SeenActivityInput) -> Result<Self> {
        let present = [
            input.change_orders.is_some(),
            input.payments.is_some(),
            input.decisions.is_some(),
            input.task_id.is_some(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count();

        let has_data = input.change_orders.as_ref().is_some_and(|v| !v.is_empty())
            || input.payments.as_ref().is_some_and(|v| !v.is_empty())
            || input.decisions.as_ref().is_some_and(|v| !v.is_empty())
            || input.task_id.is_some();

        if !has_data {
            return Err(ApiError::validation("No provided data to update"));
        }
        if present > 1 {
            return Err(ApiError::validation("Too many arguments"));
        }

        match input {
            SeenActivityInput {
                change_orders: Some(ids),
                ..
            } => Ok(SeenCategory::ChangeOrders(ids)),
            SeenActivityInput {
                payments: Some(ids), ..
            } => Ok(SeenCategory::Payments(ids)),
            SeenActivityInput {
                decisions: Some(ids),
                ..
            } => Ok(SeenCategory::Decisions(ids)),
            SeenActivityInput {
                task_id: Some(id), ..
            } => Ok(SeenCategory::Task(id)),
            _ => Err(ApiError::validation("No provided data to update")),
        }
    }

    /// Activity types marked for every subject of the category.
    pub fn activity_types(&self) -> &'static [ActivityType] {
        match self {
            SeenCategory::ChangeOrders(_) => &[
                ActivityType::ChangeOrderNew,
                ActivityType::ChangeOrderEdited,
                ActivityType::ChangeOrderApproved,
                ActivityType::ChangeOrderDeclined,
            ],
            SeenCategory::Payments(_) => {
                &[ActivityType::PayoutRequested, ActivityType::PayoutApproved]
            }
            SeenCategory::Decisions(_) => &[
                ActivityType::TaskDecisionSubmit,
                ActivityType::TaskDecisionMake,
            ],
            SeenCategory::Task(_) => &[ActivityType::TaskNew, ActivityType::TaskEdited],
        }
    }

    pub fn subjects(&self) -> Vec<Uuid> {
        match self {
            SeenCategory::ChangeOrders(ids)
            | SeenCategory::Payments(ids)
            | SeenCategory::Decisions(ids) => ids.clone(),
            SeenCategory::Task(id) => vec![*id],
        }
    }

    fn entity(&self) -> &'static str {
        match self {
            SeenCategory::ChangeOrders(_) => "change orders",
            SeenCategory::Payments(_) => "payments",
            SeenCategory::Decisions(_) => "decisions",
            SeenCategory::Task(_) => "task",
        }
    }
}

/// The single contract every referenced subject belongs to.
fn single_contract(category: &SeenCategory, contract_ids: Vec<Uuid>) -> Result<Uuid> {
    match contract_ids.as_slice() {
        [] => Err(ApiError::not_found(category.entity())),
        [contract_id] => Ok(*contract_id),
        _ => Err(ApiError::validation(format!(
            "All {} must be related to single contract",
            category.entity()
        ))),
    }
}

/// Mark the referenced activity as seen by the acting role.
pub async fn seen_activity(
    tx: &mut RequestTx,
    actor: ActingRole,
    input: SeenActivityInput,
) -> Result<Vec<activity_seen::Model>> {
    let category = SeenCategory::classify(input)?;
    let subjects = category.subjects();

    let contract_ids = match &category {
        SeenCategory::ChangeOrders(ids) => {
            activity_db::contract_ids_for_change_orders(tx.conn(), ids.clone()).await?
        }
        SeenCategory::Payments(ids) => {
            activity_db::contract_ids_for_payments(tx.conn(), ids.clone()).await?
        }
        SeenCategory::Decisions(ids) => {
            activity_db::contract_ids_for_decisions(tx.conn(), ids.clone()).await?
        }
        SeenCategory::Task(id) => activity_db::contract_ids_for_tasks(tx.conn(), vec![*id]).await?,
    };
    let contract_id = single_contract(&category, contract_ids)?;

    access::authorize(tx.conn(), contract_id, actor, AccessOptions::read()).await?;

    let seen = activity_db::upsert_seen(
        tx.conn(),
        actor.id,
        contract_id,
        &subjects,
        category.activity_types(),
        Utc::now(),
    )
    .await?;

    debug!(%contract_id, role_id = %actor.id, markers = seen.len(), "activity marked as seen");
    Ok(seen)
}
