//! Classification of "seen" requests.
mod common;

use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

use sitework_backend::errors::ApiError;
use sitework_backend::models::activity_seen::SeenActivityInput;
use sitework_backend::models::contract_activities::ActivityType;
use sitework_backend::services::activity::{SeenCategory, seen_activity};
use sitework_backend::tx::RequestTx;

fn assert_validation(result: Result<SeenCategory, ApiError>, expected: &str) {
    match result {
        Err(ApiError::Validation(message)) => assert_eq!(message, expected),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn test_empty_input_is_rejected() {
    assert_validation(
        SeenCategory::classify(SeenActivityInput::default()),
        "No provided data to update",
    );
}

#[test]
fn test_empty_lists_count_as_no_data() {
    let input = SeenActivityInput {
        change_orders: Some(Vec::new()),
        ..Default::default()
    };
    assert_validation(SeenCategory::classify(input), "No provided data to update");
}

#[test]
fn test_two_categories_are_rejected() {
    let input = SeenActivityInput {
        change_orders: Some(vec![Uuid::new_v4()]),
        task_id: Some(Uuid::new_v4()),
        ..Default::default()
    };
    assert_validation(SeenCategory::classify(input), "Too many arguments");
}

#[test]
fn test_single_category_is_classified() {
    let ids = vec![Uuid::new_v4(), Uuid::new_v4()];
    let input = SeenActivityInput {
        payments: Some(ids.clone()),
        ..Default::default()
    };

    let category = SeenCategory::classify(input).expect("one category");
    assert_eq!(category, SeenCategory::Payments(ids.clone()));
    assert_eq!(category.subjects(), ids);
    assert_eq!(
        category.activity_types(),
        &[ActivityType::PayoutRequested, ActivityType::PayoutApproved]
    );
}

#[test]
fn test_task_marks_task_activity() {
    let task_id = Uuid::new_v4();
    let input = SeenActivityInput {
        task_id: Some(task_id),
        ..Default::default()
    };

    let category = SeenCategory::classify(input).unwrap();
    assert_eq!(category.subjects(), vec![task_id]);
    assert!(category.activity_types().contains(&ActivityType::TaskNew));
    assert!(category.activity_types().contains(&ActivityType::TaskEdited));
}

#[tokio::test]
async fn test_invalid_input_fails_before_any_query() {
    // No results are queued, so any query would surface as a database error.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let mut tx = RequestTx::begin(&db).await.unwrap();

    let input = SeenActivityInput {
        decisions: Some(vec![Uuid::new_v4()]),
        payments: Some(vec![Uuid::new_v4()]),
        ..Default::default()
    };
    let result = seen_activity(&mut tx, common::home_owner(), input).await;

    assert!(matches!(result, Err(ApiError::Validation(_))));
    assert!(tx.pending().is_empty());
}
