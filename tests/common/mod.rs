//! Row builders shared by the integration tests.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use uuid::Uuid;

use sitework_backend::auth::access::ActingRole;
use sitework_backend::models::contracts::{PaymentPlan, Status};
use sitework_backend::models::roles::RoleKind;
use sitework_backend::models::tasks::TaskStatus;
use sitework_backend::models::{
    contract_completions, contracts, esigns, payments, phases, task_versions, tasks,
};

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, d, 9, 0, 0).unwrap()
}

pub fn home_owner() -> ActingRole {
    ActingRole {
        id: Uuid::new_v4(),
        kind: RoleKind::HomeOwner,
    }
}

pub fn pro() -> ActingRole {
    ActingRole {
        id: Uuid::new_v4(),
        kind: RoleKind::Pro,
    }
}

pub fn contract(owner: &ActingRole, partner: &ActingRole, status: Status) -> contracts::Model {
    contracts::Model {
        id: Uuid::new_v4(),
        name: "Kitchen remodel".to_string(),
        owner_id: owner.id,
        partner_id: partner.id,
        status,
        payment_plan: Some(PaymentPlan::Transaction),
        paid: true,
        subscription_id: None,
        invite_refusal_reason: None,
        invite_refusal_message: None,
        auto_release_days: None,
        relative_dates: false,
        dismiss_review_dates: 0,
        created_at: day(1),
        updated_at: day(1),
    }
}

pub fn payment() -> payments::Model {
    payments::Model {
        id: Uuid::new_v4(),
        charge_id: Some(Uuid::new_v4()),
        payout_id: None,
        payout_requested_at: None,
        esign_id: None,
        external_job_id: None,
        created_at: day(2),
    }
}

pub fn esign(role_id: Uuid) -> esigns::Model {
    esigns::Model {
        id: Uuid::new_v4(),
        role_id,
        signature: "J. Doe".to_string(),
        created_at: day(20),
    }
}

pub fn completion(contract_id: Uuid, initiated_by_id: Option<Uuid>) -> contract_completions::Model {
    contract_completions::Model {
        id: Uuid::new_v4(),
        contract_id,
        initiated_by_id,
        reason: "Work is done".to_string(),
        partial_payment: false,
        completion_type: contract_completions::CompletionType::User,
        created_at: day(20),
    }
}

pub fn phase(contract_id: Uuid, name: &str, order: i32) -> phases::Model {
    phases::Model {
        id: Uuid::new_v4(),
        contract_id,
        name: name.to_string(),
        order,
        actual_material_cost: None,
        actual_labor_cost: None,
        actual_other_cost: None,
        created_at: day(1),
    }
}

/// Task with a 10_000 cent material cost and no markup unless changed.
pub fn task(phase_id: Uuid, start: u32, end: u32) -> tasks::Model {
    tasks::Model {
        id: Uuid::new_v4(),
        phase_id,
        name: "Task".to_string(),
        material_cost: 10_000,
        labor_cost: 0,
        other_cost: 0,
        markup_percent: 0,
        status: TaskStatus::Todo,
        start_date: day(start),
        end_date: day(end),
        payment_id: None,
        created_at: day(1),
    }
}

pub fn version(task: &tasks::Model, change_order_id: Option<Uuid>) -> task_versions::Model {
    task_versions::Model {
        id: Uuid::new_v4(),
        task_id: task.id,
        version: 1,
        change_order_id,
        material_cost: task.material_cost,
        labor_cost: task.labor_cost,
        other_cost: task.other_cost,
        markup_percent: task.markup_percent,
        start_date: task.start_date,
        end_date: task.end_date,
        created_at: day(1),
    }
}
