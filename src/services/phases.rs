use sea_orm::ConnectionTrait;
use tracing::info;
use uuid::Uuid;

use crate::auth::access::{self, AccessOptions, ActingRole};
use crate::db::phases as phase_db;
use crate::errors::{ApiError, Result};
use crate::events::AfterCommit;
use crate::models::phases::{self, PhaseCost};
use crate::models::roles::RoleKind;
use crate::pubsub::protocol::ContractEvent;
use crate::tx::RequestTx;

/// How a drag-reorder rewrites phase orders: every phase in `from..=to`
/// moves one step (up when `up`), then the dragged phase takes `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReorderPlan {
    pub from: i32,
    pub to: i32,
    pub up: bool,
    pub target: i32,
}

impl ReorderPlan {
    /// `None` when the phase stays where it is.
    pub fn new(current: i32, move_to: i32) -> Option<Self> {
        if current == move_to {
            return None;
        }
        Some(Self {
            from: current.min(move_to),
            to: current.max(move_to),
            up: move_to < current,
            target: move_to,
        })
    }

    /// Order a phase ends up with. `moving` marks the dragged phase.
    pub fn apply(&self, order: i32, moving: bool) -> i32 {
        if moving {
            self.target
        } else if (self.from..=self.to).contains(&order) {
            if self.up { order + 1 } else { order - 1 }
        } else {
            order
        }
    }
}

async fn authorize_phase<C: ConnectionTrait>(
    db: &C,
    actor: ActingRole,
    phase_id: Uuid,
    options: AccessOptions,
) -> Result<phases::Model> {
    let phase = phase_db::get_phase_by_id(db, phase_id)
        .await?
        .ok_or_else(|| ApiError::not_found("phase"))?;
    access::authorize(db, phase.contract_id, actor, options).await?;
    Ok(phase)
}

/// Move a phase to `move_to` and return the contract's phases in their new order.
pub async fn move_phase(
    tx: &mut RequestTx,
    actor: ActingRole,
    phase_id: Uuid,
    move_to: i32,
) -> Result<Vec<phases::Model>> {
    let phase = authorize_phase(
        tx.conn(),
        actor,
        phase_id,
        AccessOptions::full().role(RoleKind::Pro).not_ended(),
    )
    .await?;

    let siblings = phase_db::get_phases(tx.conn(), phase.contract_id).await?;
    let min = siblings.iter().map(|p| p.order).min().unwrap_or(phase.order);
    let max = siblings.iter().map(|p| p.order).max().unwrap_or(phase.order);
    if move_to < min || move_to > max {
        return Err(ApiError::validation(format!(
            "Phase order must be between {min} and {max}"
        )));
    }

    let Some(plan) = ReorderPlan::new(phase.order, move_to) else {
        return Ok(siblings);
    };

    phase_db::shift_orders(tx.conn(), phase.contract_id, plan.from, plan.to, plan.up).await?;
    phase_db::set_order(tx.conn(), phase.id, plan.target).await?;

    let phases = phase_db::get_phases(tx.conn(), phase.contract_id).await?;
    info!(contract_id = %phase.contract_id, %phase_id, from = phase.order, to = move_to, "phase moved");

    tx.defer(AfterCommit::Publish(ContractEvent::PhasesUpdated {
        contract_id: phase.contract_id,
        phases: phases.clone(),
    }));
    tx.defer(AfterCommit::RefreshSummary {
        contract_id: phase.contract_id,
    });

    Ok(phases)
}

pub async fn update_actual_cost(
    tx: &mut RequestTx,
    actor: ActingRole,
    phase_id: Uuid,
    cost: PhaseCost,
) -> Result<phases::Model> {
    let phase = authorize_phase(
        tx.conn(),
        actor,
        phase_id,
        AccessOptions::full().role(RoleKind::Pro),
    )
    .await?;

    let updated = phase_db::update_actual_cost(tx.conn(), phase.id, cost)
        .await?
        .ok_or_else(|| ApiError::not_found("phase"))?;

    tx.defer(AfterCommit::RefreshSummary {
        contract_id: updated.contract_id,
    });
    Ok(updated)
}

pub async fn get_phases<C: ConnectionTrait>(
    db: &C,
    actor: ActingRole,
    contract_id: Uuid,
) -> Result<Vec<phases::Model>> {
    access::authorize(db, contract_id, actor, AccessOptions::write()).await?;
    Ok(phase_db::get_phases(db, contract_id).await?)
}
