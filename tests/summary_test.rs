//! Contract summary fold over hand-built rows.
mod common;

use chrono::Utc;
use uuid::Uuid;

use sitework_backend::models::change_orders::{self, ChangeOrderStatus};
use sitework_backend::models::contracts::Status;
use sitework_backend::models::payment_operations;
use sitework_backend::models::tasks::TaskStatus;
use sitework_backend::services::summary::{PaymentStatus, SummaryInput, TaskRow, fold_summary};

use common::{contract, day, home_owner, payment, phase, pro, task, version};

fn row(task: sitework_backend::models::tasks::Model) -> TaskRow {
    TaskRow {
        first_version: Some(version(&task, None)),
        payment: None,
        charge: None,
        task,
    }
}

fn change_order(contract_id: Uuid, status: ChangeOrderStatus) -> change_orders::Model {
    change_orders::Model {
        id: Uuid::new_v4(),
        contract_id,
        status,
        created_at: Utc::now(),
    }
}

fn input() -> SummaryInput {
    let c = contract(&home_owner(), &pro(), Status::Hired);
    SummaryInput {
        phases: Vec::new(),
        tasks: Vec::new(),
        change_orders: Vec::new(),
        view_points: Vec::new(),
        contract: c,
    }
}

#[test]
fn test_target_dates_fold_across_phases() {
    let mut input = input();
    let demo = phase(input.contract.id, "Demolition", 1);
    let build = phase(input.contract.id, "Build", 2);

    // Demolition spans 2..10, Build spans 5..20.
    input.tasks = vec![
        row(task(demo.id, 2, 6)),
        row(task(demo.id, 4, 10)),
        row(task(build.id, 5, 12)),
        row(task(build.id, 8, 20)),
    ];
    input.phases = vec![build.clone(), demo.clone()];

    let summary = fold_summary(&input);

    assert_eq!(summary.phases.len(), 2);
    assert_eq!(summary.phases[0].id, demo.id, "phases come out in order");
    assert_eq!(summary.phases[0].start_date, day(2));
    assert_eq!(summary.phases[0].end_date, day(10));
    assert_eq!(summary.phases[1].start_date, day(5));
    assert_eq!(summary.phases[1].end_date, day(20));

    // Latest per-phase start and earliest per-phase end.
    assert_eq!(summary.target_start_date, Some(day(5)));
    assert_eq!(summary.target_end_date, Some(day(10)));
}

#[test]
fn test_totals_apply_markup_and_initial_versions() {
    let mut input = input();
    let p = phase(input.contract.id, "Build", 1);

    let mut marked_up = task(p.id, 2, 4);
    marked_up.markup_percent = 10;

    // Current cost grew after the first version was agreed.
    let mut grown = task(p.id, 2, 4);
    let first = version(&grown, None);
    grown.material_cost = 15_000;

    input.phases = vec![p];
    input.tasks = vec![
        row(marked_up),
        TaskRow {
            first_version: Some(first),
            payment: None,
            charge: None,
            task: grown,
        },
    ];

    let summary = fold_summary(&input);

    assert_eq!(summary.total, 11_000 + 15_000);
    assert_eq!(summary.initial_total, 11_000 + 10_000);
    assert_eq!(summary.phases[0].total, summary.total);
}

#[test]
fn test_change_order_tasks_are_not_initial() {
    let mut input = input();
    let p = phase(input.contract.id, "Build", 1);

    let original = task(p.id, 2, 6);
    let added = task(p.id, 3, 25);
    let added_version = version(&added, Some(Uuid::new_v4()));

    input.phases = vec![p];
    input.tasks = vec![
        row(original),
        TaskRow {
            first_version: Some(added_version),
            payment: None,
            charge: None,
            task: added,
        },
    ];

    let summary = fold_summary(&input);

    assert_eq!(summary.total, 20_000);
    assert_eq!(summary.initial_total, 10_000);
    assert_eq!(summary.initial_end_date, Some(day(6)));
    assert_eq!(summary.target_end_date, Some(day(25)));
}

#[test]
fn test_phase_without_tasks_is_skipped() {
    let mut input = input();
    let empty = phase(input.contract.id, "Empty", 1);
    let busy = phase(input.contract.id, "Busy", 2);
    input.tasks = vec![row(task(busy.id, 1, 3))];
    input.phases = vec![empty, busy.clone()];

    let summary = fold_summary(&input);

    assert_eq!(summary.phases.len(), 1);
    assert_eq!(summary.phases[0].id, busy.id);
}

#[test]
fn test_no_tasks_means_no_dates() {
    let summary = fold_summary(&input());

    assert_eq!(summary.total, 0);
    assert!(summary.phases.is_empty());
    assert_eq!(summary.target_start_date, None);
    assert_eq!(summary.target_end_date, None);
    assert_eq!(summary.initial_end_date, None);
}

#[test]
fn test_payment_status_precedence() {
    assert_eq!(PaymentStatus::of(None), PaymentStatus::None);

    let mut p = payment();
    assert_eq!(PaymentStatus::of(Some(&p)), PaymentStatus::Funded);

    p.payout_requested_at = Some(day(10));
    assert_eq!(PaymentStatus::of(Some(&p)), PaymentStatus::Requested);

    p.payout_id = Some(Uuid::new_v4());
    assert_eq!(PaymentStatus::of(Some(&p)), PaymentStatus::Released);
}

#[test]
fn test_phase_payment_status_needs_every_task() {
    let mut input = input();
    let p = phase(input.contract.id, "Build", 1);

    let mut requested = payment();
    requested.payout_requested_at = Some(day(10));

    let mut paid_task = task(p.id, 1, 3);
    paid_task.payment_id = Some(requested.id);
    let unpaid_task = task(p.id, 1, 3);

    input.phases = vec![p];
    input.tasks = vec![
        TaskRow {
            first_version: None,
            payment: Some(requested.clone()),
            charge: None,
            task: paid_task.clone(),
        },
        row(unpaid_task),
    ];
    assert_eq!(fold_summary(&input).phases[0].payment_status, PaymentStatus::None);

    input.tasks.truncate(1);
    assert_eq!(
        fold_summary(&input).phases[0].payment_status,
        PaymentStatus::Requested
    );
}

#[test]
fn test_funded_counts_succeeded_charges_only() {
    let mut input = input();
    let p = phase(input.contract.id, "Build", 1);

    let charge = |status: &str| payment_operations::Model {
        id: Uuid::new_v4(),
        amount: 10_000,
        status: status.to_string(),
        created_at: day(3),
    };

    input.phases = vec![p.clone()];
    input.tasks = vec![
        TaskRow {
            first_version: None,
            payment: Some(payment()),
            charge: Some(charge("succeeded")),
            task: task(p.id, 1, 3),
        },
        TaskRow {
            first_version: None,
            payment: Some(payment()),
            charge: Some(charge("pending")),
            task: task(p.id, 1, 3),
        },
    ];

    let summary = fold_summary(&input);
    assert_eq!(summary.phases[0].funded, 10_000);
    assert_eq!(summary.funded, 10_000);
}

#[test]
fn test_counts_and_change_orders() {
    let mut input = input();
    let p = phase(input.contract.id, "Build", 1);

    let mut doing = task(p.id, 1, 3);
    doing.status = TaskStatus::Doing;
    let mut done = task(p.id, 1, 3);
    done.status = TaskStatus::Done;

    input.phases = vec![p];
    input.tasks = vec![row(task(input.phases[0].id, 1, 3)), row(doing), row(done)];
    input.change_orders = vec![
        change_order(input.contract.id, ChangeOrderStatus::Open),
        change_order(input.contract.id, ChangeOrderStatus::Open),
        change_order(input.contract.id, ChangeOrderStatus::Approved),
        change_order(input.contract.id, ChangeOrderStatus::Declined),
    ];

    let summary = fold_summary(&input);

    assert_eq!(
        (summary.phases[0].todo, summary.phases[0].doing, summary.phases[0].done),
        (1, 1, 1)
    );
    assert_eq!(summary.open_change_orders, 2);
    assert_eq!(summary.approved_change_orders, 1);
    assert_eq!(summary.owner_id, input.contract.owner_id);
}

#[test]
fn test_phases_list_their_tasks() {
    let mut input = input();
    let demo = phase(input.contract.id, "Demolition", 1);
    let build = phase(input.contract.id, "Build", 2);

    let mut marked_up = task(build.id, 3, 9);
    marked_up.markup_percent = 20;
    marked_up.name = "Framing".to_string();
    let added = task(build.id, 4, 12);
    let added_version = version(&added, Some(Uuid::new_v4()));

    let mut released = payment();
    released.payout_id = Some(Uuid::new_v4());
    let mut paid = task(demo.id, 1, 2);
    paid.payment_id = Some(released.id);

    input.phases = vec![demo.clone(), build.clone()];
    input.tasks = vec![
        TaskRow {
            first_version: None,
            payment: Some(released),
            charge: None,
            task: paid.clone(),
        },
        row(marked_up.clone()),
        TaskRow {
            first_version: Some(added_version),
            payment: None,
            charge: None,
            task: added.clone(),
        },
    ];

    let summary = fold_summary(&input);

    let framing = &summary.phases[1].tasks[0];
    assert_eq!(framing.id, marked_up.id);
    assert_eq!(framing.name, "Framing");
    assert_eq!(framing.status, TaskStatus::Todo);
    assert_eq!((framing.start_date, framing.end_date), (day(3), day(9)));
    assert_eq!(framing.total, 12_000);
    assert_eq!(framing.initial_total, 12_000);

    let added_summary = &summary.phases[1].tasks[1];
    assert_eq!(added_summary.id, added.id);
    assert_eq!(added_summary.initial_total, 0);
    assert_eq!(added_summary.payment_status, PaymentStatus::None);

    assert_eq!(summary.phases[0].tasks[0].id, paid.id);
    assert_eq!(summary.phases[0].tasks[0].payment_status, PaymentStatus::Released);

    for phase in &summary.phases {
        assert_eq!(phase.total, phase.tasks.iter().map(|t| t.total).sum::<i64>());
        assert_eq!(
            phase.initial_total,
            phase.tasks.iter().map(|t| t.initial_total).sum::<i64>()
        );
    }
    let task_total: i64 = summary
        .phases
        .iter()
        .flat_map(|p| &p.tasks)
        .map(|t| t.total)
        .sum();
    assert_eq!(summary.total, task_total);
    assert_eq!(summary.total, 10_000 + 12_000 + 10_000);

    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["phases"][1]["tasks"][1]["payment_status"], "none");
}
