//! Contract files: who sees them and what attaching one writes.
mod common;

use sea_orm::{DatabaseBackend, MockDatabase, Statement, Value};
use uuid::Uuid;

use sitework_backend::auth::access::ActingRole;
use sitework_backend::events::AfterCommit;
use sitework_backend::models::collaborators::{self, Permission};
use sitework_backend::models::contracts::{self, Status};
use sitework_backend::models::files::{self, AttachFiles, FileFilter, WhoCanSeeFiles};
use sitework_backend::models::file_assignees;
use sitework_backend::models::roles::RoleKind;
use sitework_backend::pubsub::protocol::ContractEvent;
use sitework_backend::services::files::{create_contract_files, get_contract_files};
use sitework_backend::tx::RequestTx;

use common::{contract, day, home_owner, pro};

fn file(role_id: Uuid, contract_id: Uuid, name: &str, restricted: bool) -> files::Model {
    files::Model {
        id: Uuid::new_v4(),
        role_id,
        contract_id: Some(contract_id),
        name: name.to_string(),
        mime: "application/pdf".to_string(),
        restricted,
        created_at: day(4),
    }
}

fn collaborator(c: &contracts::Model, permission: Permission) -> (ActingRole, collaborators::Model) {
    let actor = ActingRole {
        id: Uuid::new_v4(),
        kind: RoleKind::Pro,
    };
    let row = collaborators::Model {
        id: Uuid::new_v4(),
        contract_id: c.id,
        role_id: actor.id,
        permission,
        created_at: day(2),
    };
    (actor, row)
}

fn statements(db: sea_orm::DatabaseConnection) -> Vec<Statement> {
    db.into_transaction_log()
        .iter()
        .flat_map(|t| t.statements().to_vec())
        .collect()
}

fn has_value(stmt: &Statement, value: Value) -> bool {
    stmt.values.as_ref().is_some_and(|v| v.0.contains(&value))
}

#[test]
fn test_attach_defaults_to_everyone() {
    let body: AttachFiles =
        serde_json::from_value(serde_json::json!({ "files": [Uuid::new_v4()] })).unwrap();
    assert_eq!(body.who_can_see, WhoCanSeeFiles::All);

    let body: AttachFiles = serde_json::from_value(serde_json::json!({
        "files": [],
        "who_can_see": "only_me",
    }))
    .unwrap();
    assert_eq!(body.who_can_see, WhoCanSeeFiles::OnlyMe);
}

#[tokio::test]
async fn test_owner_lists_every_file() {
    let owner = home_owner();
    let c = contract(&owner, &pro(), Status::Hired);
    let listed = vec![
        file(owner.id, c.id, "Plans.pdf", true),
        file(c.partner_id, c.id, "Quote.pdf", false),
    ];

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![c.clone()]])
        .append_query_results([listed.clone()])
        .into_connection();

    let result = get_contract_files(&db, owner, c.id, FileFilter::default())
        .await
        .unwrap();
    assert_eq!(result, listed);

    let log = statements(db);
    let query = log.last().expect("files query");
    assert!(query.sql.starts_with(r#"SELECT "files"."#));
    assert!(!query.sql.contains(r#""restricted""#));
    assert!(query.sql.contains(r#"ORDER BY "files"."created_at" DESC"#));
}

#[tokio::test]
async fn test_collaborator_sees_open_and_assigned_files() {
    let c = contract(&home_owner(), &pro(), Status::Hired);
    let (actor, grant) = collaborator(&c, Permission::Read);
    let assigned = file(c.partner_id, c.id, "Invoice.pdf", true);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![c.clone()]])
        .append_query_results([vec![grant.clone()]])
        .append_query_results([vec![grant.clone()]])
        .append_query_results([vec![file_assignees::Model {
            id: Uuid::new_v4(),
            file_id: assigned.id,
            collaborator_id: grant.id,
        }]])
        .append_query_results([vec![assigned.clone()]])
        .into_connection();

    let result = get_contract_files(&db, actor, c.id, FileFilter::default())
        .await
        .unwrap();
    assert_eq!(result, vec![assigned.clone()]);

    let log = statements(db);
    let query = log.last().expect("files query");
    assert!(query.sql.contains(r#""files"."restricted" = "#));
    assert!(query.sql.contains(" OR "));
    assert!(has_value(query, Value::Bool(Some(false))));
    assert!(has_value(query, assigned.id.into()));
    assert!(has_value(query, c.id.into()));
}

#[tokio::test]
async fn test_collaborator_without_assignments_sees_open_files_only() {
    let c = contract(&home_owner(), &pro(), Status::Hired);
    let (actor, grant) = collaborator(&c, Permission::Read);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![c.clone()]])
        .append_query_results([vec![grant.clone()]])
        .append_query_results([vec![grant.clone()]])
        .append_query_results([Vec::<file_assignees::Model>::new()])
        .append_query_results([Vec::<files::Model>::new()])
        .into_connection();

    get_contract_files(&db, actor, c.id, FileFilter::default())
        .await
        .unwrap();

    let log = statements(db);
    let query = log.last().expect("files query");
    assert!(query.sql.contains(r#""files"."restricted" = "#));
    assert!(!query.sql.contains(r#""files"."id" IN"#));
}

#[tokio::test]
async fn test_filters_match_name_and_mime() {
    let owner = home_owner();
    let c = contract(&owner, &pro(), Status::Hired);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![c.clone()]])
        .append_query_results([Vec::<files::Model>::new()])
        .into_connection();

    let filter = FileFilter {
        name: Some("plan".to_string()),
        mime: Some("image/png".to_string()),
    };
    get_contract_files(&db, owner, c.id, filter).await.unwrap();

    let log = statements(db);
    let query = log.last().expect("files query");
    assert!(query.sql.contains("ILIKE"));
    assert!(has_value(query, Value::from("%plan%")));
    assert!(has_value(query, Value::from("image/png")));
}

#[tokio::test]
async fn test_only_me_assigns_the_uploading_collaborator() {
    let c = contract(&home_owner(), &pro(), Status::Hired);
    let (actor, grant) = collaborator(&c, Permission::Write);
    let uploaded = file(actor.id, c.id, "Photo.jpg", true);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![c.clone()]])
        .append_query_results([vec![grant.clone()]])
        .append_query_results([vec![uploaded.clone()]])
        .append_query_results([vec![grant.clone()]])
        .append_query_results([vec![file_assignees::Model {
            id: Uuid::new_v4(),
            file_id: uploaded.id,
            collaborator_id: grant.id,
        }]])
        .into_connection();

    let input = AttachFiles {
        files: vec![uploaded.id],
        who_can_see: WhoCanSeeFiles::OnlyMe,
    };
    let mut tx = RequestTx::begin(&db).await.unwrap();
    let attached = create_contract_files(&mut tx, actor, c.id, input)
        .await
        .unwrap();
    assert_eq!(attached, vec![uploaded.clone()]);
    assert!(tx.pending().contains(&AfterCommit::Publish(ContractEvent::FileUpdated {
        contract_id: c.id,
        file: uploaded.clone(),
    })));
    tx.commit().await.unwrap();

    let log = statements(db);
    let attach = log
        .iter()
        .find(|s| s.sql.starts_with(r#"UPDATE "files""#))
        .expect("attach statement");
    assert!(has_value(attach, Value::Bool(Some(true))));

    let assign = log
        .iter()
        .find(|s| s.sql.starts_with(r#"INSERT INTO "file_assignees""#))
        .expect("assignment for the uploader");
    assert!(has_value(assign, uploaded.id.into()));
    assert!(has_value(assign, grant.id.into()));
}

#[tokio::test]
async fn test_partner_upload_for_everyone_assigns_nobody() {
    let partner = pro();
    let c = contract(&home_owner(), &partner, Status::Hired);
    let uploaded = file(partner.id, c.id, "Estimate.pdf", false);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![c.clone()]])
        .append_query_results([vec![uploaded.clone()]])
        .into_connection();

    let input = AttachFiles {
        files: vec![uploaded.id],
        who_can_see: WhoCanSeeFiles::All,
    };
    let mut tx = RequestTx::begin(&db).await.unwrap();
    create_contract_files(&mut tx, partner, c.id, input)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    let log = statements(db);
    let attach = log
        .iter()
        .find(|s| s.sql.starts_with(r#"UPDATE "files""#))
        .expect("attach statement");
    assert!(has_value(attach, Value::Bool(Some(false))));
    assert!(!log.iter().any(|s| s.sql.contains("file_assignees")));
}
