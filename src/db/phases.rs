use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::models::phases::{self, PhaseCost};
use crate::models::{task_versions, tasks};

/// Phases of a contract in display order.
pub async fn get_phases<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
) -> Result<Vec<phases::Model>, DbErr> {
    phases::Entity::find()
        .filter(phases::Column::ContractId.eq(contract_id))
        .order_by_asc(phases::Column::Order)
        .all(db)
        .await
}

pub async fn get_phase_by_id<C: ConnectionTrait>(
    db: &C,
    id: Uuid,
) -> Result<Option<phases::Model>, DbErr> {
    phases::Entity::find_by_id(id).one(db).await
}

/// Shift every phase of the contract whose order lies in `[from, to]` by one
/// step, up when `up` is set and down otherwise.
pub async fn shift_orders<C: ConnectionTrait>(
    db: &C,
    contract_id: Uuid,
    from: i32,
    to: i32,
    up: bool,
) -> Result<u64, DbErr> {
    let step = if up {
        r#""order" + 1"#
    } else {
        r#""order" - 1"#
    };

    let result = phases::Entity::update_many()
        .col_expr(phases::Column::Order, Expr::cust(step))
        .filter(phases::Column::ContractId.eq(contract_id))
        .filter(phases::Column::Order.between(from, to))
        .exec(db)
        .await?;
    Ok(result.rows_affected)
}

pub async fn set_order<C: ConnectionTrait>(
    db: &C,
    phase_id: Uuid,
    order: i32,
) -> Result<(), DbErr> {
    phases::Entity::update_many()
        .set(phases::ActiveModel {
            order: Set(order),
            ..Default::default()
        })
        .filter(phases::Column::Id.eq(phase_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Overwrite the reported actual costs. Omitted fields keep their value.
pub async fn update_actual_cost<C: ConnectionTrait>(
    db: &C,
    phase_id: Uuid,
    cost: PhaseCost,
) -> Result<Option<phases::Model>, DbErr> {
    let mut changes = <phases::ActiveModel as Default>::default();
    if let Some(material) = cost.material {
        changes.actual_material_cost = Set(Some(material));
    }
    if let Some(labor) = cost.labor {
        changes.actual_labor_cost = Set(Some(labor));
    }
    if let Some(other) = cost.other {
        changes.actual_other_cost = Set(Some(other));
    }
    if !changes.is_changed() {
        return get_phase_by_id(db, phase_id).await;
    }

    let updated = phases::Entity::update_many()
        .set(changes)
        .filter(phases::Column::Id.eq(phase_id))
        .exec_with_returning(db)
        .await?;
    Ok(updated.into_iter().next())
}

pub async fn get_tasks_by_phases<C: ConnectionTrait>(
    db: &C,
    phase_ids: Vec<Uuid>,
) -> Result<Vec<tasks::Model>, DbErr> {
    if phase_ids.is_empty() {
        return Ok(Vec::new());
    }

    tasks::Entity::find()
        .filter(tasks::Column::PhaseId.is_in(phase_ids))
        .order_by_asc(tasks::Column::StartDate)
        .all(db)
        .await
}

/// Task versions, oldest first.
pub async fn get_task_versions<C: ConnectionTrait>(
    db: &C,
    task_ids: Vec<Uuid>,
) -> Result<Vec<task_versions::Model>, DbErr> {
    if task_ids.is_empty() {
        return Ok(Vec::new());
    }

    task_versions::Entity::find()
        .filter(task_versions::Column::TaskId.is_in(task_ids))
        .order_by_asc(task_versions::Column::Version)
        .all(db)
        .await
}
